//! LaTeX escaping and markup entity handling.
//!
//! These are pure string functions. None of them is idempotent, so each is
//! applied exactly once at a fixed point of the render pipeline:
//!
//! - [`escape_latex_reserved`] runs on every text slot of the document tree.
//! - [`normalize_typographic_markup`] and [`decode_markup_entities`] run once
//!   over the rendered text, before any other post-processing pass.
//! - [`unescape_latex_reserved`] runs on the contents of math spans.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters escaped with a backslash in LaTeX text.
const LATEX_RESERVED: [char; 3] = ['%', '&', '#'];

/// Quote entities left without a partner, as quote ligatures or escaped
/// text.
const UNPAIRED_QUOTES: [(&str, &str); 6] = [
    ("&ldquo;", "``"),
    ("&rdquo;", "''"),
    ("&lsquo;", "`"),
    ("&rsquo;", "'"),
    ("&laquo;", "\\&laquo;"),
    ("&raquo;", "\\&raquo;"),
];

/// Entities that [`normalize_typographic_markup`] turns into LaTeX.
const TYPOGRAPHIC_ENTITIES: [&str; 9] = [
    "&ldquo;", "&rdquo;", "&lsquo;", "&rsquo;", "&laquo;", "&raquo;", "&hellip;", "&ndash;",
    "&mdash;",
];

static OPENING_SINGLE_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(^|\s|")'"#).expect("opening single quote regex"));
static OPENING_DOUBLE_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(^|\s|'|`)""#).expect("opening double quote regex"));
static CLOSING_DOUBLE_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(,|\.|\s|$)"#).expect("closing double quote regex"));

/// Decode the four standard markup entities.
///
/// `&amp;` is decoded first, so `&amp;lt;` ends up as `<`.
pub fn decode_markup_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
}

/// Escape LaTeX-reserved characters in a text slot.
///
/// Markup entities are decoded first, then `%`, `&` and `#` get a backslash
/// and straight quotes become LaTeX quote ligatures. `$`, `{` and `}` are
/// left alone: dollars are math delimiters, and braces are the author's
/// business because they appear inside math.
///
/// # Examples
///
/// ```
/// use markdown_latex::escape::escape_latex_reserved;
///
/// assert_eq!(escape_latex_reserved("50% & #1"), "50\\% \\& \\#1");
/// assert_eq!(escape_latex_reserved("say \"hi\""), "say ``hi''");
/// ```
pub fn escape_latex_reserved(text: &str) -> String {
    let decoded = decode_markup_entities(text);
    let mut out = String::with_capacity(decoded.len() + decoded.len() / 8);

    for (i, c) in decoded.char_indices() {
        match c {
            // typographic entities must survive until the normalization pass
            '&' if starts_typographic_entity(&decoded[i..]) => out.push(c),
            c if LATEX_RESERVED.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }

    let out = OPENING_SINGLE_QUOTE.replace_all(&out, "${1}`");
    let out = OPENING_DOUBLE_QUOTE.replace_all(&out, "${1}``");
    let out = CLOSING_DOUBLE_QUOTE.replace_all(&out, "''${1}");
    out.into_owned()
}

/// Undo the backslash escaping of `%`, `&` and `#`.
///
/// Used on math spans, whose contents must carry the raw characters.
pub fn unescape_latex_reserved(text: &str) -> String {
    let mut out = text.to_string();
    for c in LATEX_RESERVED {
        out = out.replace(&format!("\\{}", c), &c.to_string());
    }
    out
}

/// Replace typographic entities with their LaTeX equivalents.
///
/// Each quote pair is rewritten into `\enquote{...}` only when an opening
/// entity is followed somewhere later by its closing entity. Quote entities
/// still left over become quote ligatures, guillemets become `\&laquo;` and
/// `\&raquo;`.
pub fn normalize_typographic_markup(text: &str) -> String {
    let mut out = text.to_string();

    if has_pair(text, "&ldquo;", "&rdquo;") {
        out = out.replace("&ldquo;", "\\enquote{").replace("&rdquo;", "}");
    }
    if has_pair(text, "&lsquo;", "&rsquo;") {
        out = out.replace("&lsquo;", "\\enquote{").replace("&rsquo;", "}");
    }
    // Some upstream smart-quote filters encode both ends as opening quotes.
    if has_pair(text, "&ldquo;", "&ldquo;") {
        out = out
            .replacen("&ldquo;", "\\enquote{", 1)
            .replacen("&ldquo;", "}", 1);
    }
    if has_pair(text, "&laquo;", "&raquo;") {
        out = out.replace("&laquo;", "\\enquote{").replace("&raquo;", "}");
    }
    for (entity, latex) in UNPAIRED_QUOTES {
        out = out.replace(entity, latex);
    }

    out.replace("...", "\\dots")
        .replace("&hellip;", "\\dots")
        .replace("&ndash;", "--")
        .replace("&mdash;", "---")
        // pipes escaped for table cells
        .replace("\\|", "|")
}

fn has_pair(text: &str, open: &str, close: &str) -> bool {
    text.find(open)
        .map(|start| text[start + open.len()..].contains(close))
        .unwrap_or(false)
}

fn starts_typographic_entity(text: &str) -> bool {
    TYPOGRAPHIC_ENTITIES
        .iter()
        .any(|entity| text.starts_with(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_markup_entities() {
        assert_eq!(
            decode_markup_entities("This &amp; is &lt; a &quot;test&quot; string."),
            "This & is < a \"test\" string."
        );
    }

    #[test]
    fn test_escape_latex_reserved() {
        assert_eq!(
            escape_latex_reserved("This & is % a # test string."),
            "This \\& is \\% a \\# test string."
        );
        assert_eq!(escape_latex_reserved("A &amp; B"), "A \\& B");
        assert_eq!(escape_latex_reserved("costs $5 {x}"), "costs $5 {x}");
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(
            escape_latex_reserved("\"quoted\" text"),
            "``quoted'' text"
        );
        assert_eq!(escape_latex_reserved("'single' and don't"), "`single' and don't");
        assert_eq!(escape_latex_reserved("he said \"no\"."), "he said ``no''.");
        assert_eq!(escape_latex_reserved("&quot;x&quot;"), "``x''");
    }

    #[test]
    fn test_escape_keeps_typographic_entities() {
        assert_eq!(
            escape_latex_reserved("&ldquo;A&rdquo; & B"),
            "&ldquo;A&rdquo; \\& B"
        );
    }

    #[test]
    fn test_unescape_latex_reserved() {
        assert_eq!(
            unescape_latex_reserved("This \\& is a test string."),
            "This & is a test string."
        );
    }

    #[test]
    fn test_reserved_round_trip() {
        let text = "a%b&c#d";
        let decoded = decode_markup_entities(text);
        let round = unescape_latex_reserved(&escape_latex_reserved(&decoded));
        assert_eq!(round, "a%b&c#d");

        let entity_text = "x &amp; y";
        let round = unescape_latex_reserved(&escape_latex_reserved(&decode_markup_entities(
            entity_text,
        )));
        assert_eq!(round, "x & y");
    }

    #[test]
    fn test_normalize_typographic_markup() {
        let input = "&ldquo;Sample text&rdquo; &lsquo;Another text&rsquo; &laquo;Yet another text&raquo; ...";
        assert_eq!(
            normalize_typographic_markup(input),
            "\\enquote{Sample text} \\enquote{Another text} \\enquote{Yet another text} \\dots"
        );
    }

    #[test]
    fn test_quote_pairs_span_lines() {
        assert_eq!(
            normalize_typographic_markup("&ldquo;first\nsecond&rdquo;"),
            "\\enquote{first\nsecond}"
        );
        assert_eq!(normalize_typographic_markup("&lsquo;Y&rsquo;"), "\\enquote{Y}");
    }

    #[test]
    fn test_unmatched_quotes_become_ligatures() {
        assert_eq!(normalize_typographic_markup("only &ldquo;open"), "only ``open");
        assert_eq!(
            normalize_typographic_markup("&rdquo; before &ldquo;"),
            "'' before ``"
        );
        assert_eq!(normalize_typographic_markup("don&rsquo;t"), "don't");
        assert_eq!(
            normalize_typographic_markup("&laquo;left alone"),
            "\\&laquo;left alone"
        );
    }

    #[test]
    fn test_doubled_opening_quotes() {
        assert_eq!(
            normalize_typographic_markup("&ldquo;odd&ldquo; rest"),
            "\\enquote{odd} rest"
        );
    }

    #[test]
    fn test_dashes_and_pipes() {
        assert_eq!(
            normalize_typographic_markup("a&ndash;b&mdash;c&hellip; x \\| y"),
            "a--b---c\\dots x | y"
        );
    }
}
