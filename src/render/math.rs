//! Math pass: `$$...$$` and `$...$` spans become LaTeX math delimiters.

use super::TextPass;
use crate::error::Result;
use crate::escape::unescape_latex_reserved;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DISPLAY_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$([^$]*)\$\$").expect("display math regex"));
static INLINE_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([^$]*)\$").expect("inline math regex"));
static LESS_THAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\lt\b").expect("\\lt regex"));
static PARTIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\del\b").expect("\\del regex"));
static VERBATIM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\begin\{verbatim\}.*?\\end\{verbatim\}").expect("verbatim regex")
});

/// Convert math spans and escape the dollars left over. `verbatim`
/// environments are copied unchanged.
pub fn convert_math(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for block in VERBATIM.find_iter(input) {
        out.push_str(&convert_prose(&input[last..block.start()]));
        out.push_str(block.as_str());
        last = block.end();
    }
    out.push_str(&convert_prose(&input[last..]));
    out
}

fn convert_prose(input: &str) -> String {
    let out = DISPLAY_MATH.replace_all(input, |caps: &Captures| {
        format!("\\[{}\\]", normalize_math(&caps[1]))
    });
    let out = INLINE_MATH.replace_all(&out, |caps: &Captures| {
        format!("\\({}\\)", normalize_math(&caps[1]))
    });
    out.replace('$', "\\$")
}

/// Undo text escaping inside a span and rewrite the AsciiMath-style
/// shorthands `\lt`, ` * ` and `\del`.
fn normalize_math(span: &str) -> String {
    let span = unescape_latex_reserved(span);
    let span = LESS_THAN.replace_all(&span, "<");
    let span = span.replace(" * ", " \\cdot ");
    PARTIAL.replace_all(&span, r"\partial").into_owned()
}

/// Pipeline stage wrapping [`convert_math`].
pub struct MathPass;

impl TextPass for MathPass {
    fn name(&self) -> &'static str {
        "math"
    }

    fn run(&self, input: &str) -> Result<String> {
        Ok(convert_math(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_and_inline() {
        assert_eq!(convert_math("$$a$$ and $b$"), "\\[a\\] and \\(b\\)");
        assert_eq!(convert_math("Hello $World$"), "Hello \\(World\\)");
    }

    #[test]
    fn test_stray_dollars() {
        assert_eq!(convert_math("$10 only"), "\\$10 only");
        assert_eq!(
            convert_math("Some mathematics inline, $$X$$, $Y$, a $100 million, a \\%tage"),
            "Some mathematics inline, \\[X\\], \\(Y\\), a \\$100 million, a \\%tage"
        );
    }

    #[test]
    fn test_span_contents_unescaped() {
        assert_eq!(convert_math("$50\\% \\& 3 \\# x$"), "\\(50% & 3 # x\\)");
    }

    #[test]
    fn test_shorthands() {
        assert_eq!(
            convert_math("$$ \\sum_{i}^{\\infty} x^{n} + y^{n} = \\alpha +  \\beta * z^{n} $$"),
            "\\[ \\sum_{i}^{\\infty} x^{n} + y^{n} = \\alpha +  \\beta \\cdot z^{n} \\]"
        );
        assert_eq!(convert_math("$a \\lt b$"), "\\(a < b\\)");
        assert_eq!(convert_math("$\\del f$"), "\\(\\partial f\\)");
    }

    #[test]
    fn test_longer_commands_survive() {
        assert_eq!(
            convert_math("$\\delta \\ltimes x$"),
            "\\(\\delta \\ltimes x\\)"
        );
    }

    #[test]
    fn test_prose_star_untouched() {
        assert_eq!(convert_math("2 * 3"), "2 * 3");
    }

    #[test]
    fn test_verbatim_untouched() {
        assert_eq!(
            convert_math("$a$\n\\begin{verbatim}\necho $HOME $x$\n\\end{verbatim}\n$b$"),
            "\\(a\\)\n\\begin{verbatim}\necho $HOME $x$\n\\end{verbatim}\n\\(b\\)"
        );
    }

    #[test]
    fn test_multiline_display() {
        assert_eq!(
            convert_math("$$\nx = 1\n$$"),
            "\\[\nx = 1\n\\]"
        );
    }
}
