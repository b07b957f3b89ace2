//! Inline-level parsing for Markdown.
//!
//! Inline content is appended to a parent node: text goes into the parent's
//! `text` or the last child's `tail`, elements become children.

use super::lexer::{
    autolink, display_math, emphasis, footnote_ref, hard_break, inline_code, inline_math, strong,
    Token,
};
use super::markup::parse_leading_element;
use super::ParseContext;
use crate::ast::{Node, Tag};
use crate::error::Result;

/// A parsed inline construct.
enum Piece {
    Text(String),
    Element(Node),
}

/// Parse inline content and append it to `parent`.
pub fn parse_inlines_into(parent: &mut Node, input: &str, ctx: &mut ParseContext) -> Result<()> {
    let mut remaining = input;

    while !remaining.is_empty() {
        if let Some((piece, rest)) = try_parse_inline(remaining, ctx)? {
            match piece {
                Piece::Text(text) => parent.push_text(&text),
                Piece::Element(node) => parent.push(node),
            }
            remaining = rest;
            continue;
        }

        let (text, rest) = consume_text(remaining);
        if text.is_empty() {
            // No construct matched at a special character: take it literally
            let Some(c) = remaining.chars().next() else {
                break;
            };
            parent.push_text(&remaining[..c.len_utf8()]);
            remaining = &remaining[c.len_utf8()..];
        } else {
            parent.push_text(text);
            remaining = rest;
        }
    }

    Ok(())
}

fn try_parse_inline<'a>(
    input: &'a str,
    ctx: &mut ParseContext,
) -> Result<Option<(Piece, &'a str)>> {
    // Order matters - try more specific patterns first

    // Backslash escapes
    if let Some(after) = input.strip_prefix('\\') {
        if let Some(c) = after.chars().next().filter(|c| matches!(c, '*' | '_' | '`')) {
            return Ok(Some((Piece::Text(c.to_string()), &after[1..])));
        }
    }

    // Math is kept verbatim for the math pass
    if input.starts_with("$$") {
        if let Ok((rest, Token::DisplayMath(content))) = display_math(input) {
            return Ok(Some((Piece::Text(format!("$${}$$", content)), rest)));
        }
    } else if input.starts_with('$') {
        if let Ok((rest, Token::InlineMath(content))) = inline_math(input) {
            return Ok(Some((Piece::Text(format!("${}$", content)), rest)));
        }
    }

    // Strong (**...** or __...__)
    if input.starts_with("**") || input.starts_with("__") {
        if let Ok((rest, Token::Strong(content))) = strong(input) {
            let mut node = Node::new(Tag::Strong);
            parse_inlines_into(&mut node, content, ctx)?;
            return Ok(Some((Piece::Element(node), rest)));
        }
    }

    // Emphasis (*...* or _..._)
    if input.starts_with('*') || input.starts_with('_') {
        if let Ok((rest, Token::Emphasis(content))) = emphasis(input) {
            let mut node = Node::new(Tag::Em);
            parse_inlines_into(&mut node, content, ctx)?;
            return Ok(Some((Piece::Element(node), rest)));
        }
    }

    // Inline code (`...`)
    if input.starts_with('`') {
        if let Ok((rest, Token::InlineCode(content))) = inline_code(input) {
            let node = Node::new(Tag::Code).with_text(content);
            return Ok(Some((Piece::Element(node), rest)));
        }
    }

    // Footnote reference ([^...])
    if input.starts_with("[^") && ctx.footnotes_enabled() {
        if let Ok((rest, Token::FootnoteRef(id))) = footnote_ref(input) {
            if let Some(node) = ctx.footnote_node(id)? {
                return Ok(Some((Piece::Element(node), rest)));
            }
        }
    }

    // Image (![alt](src "title"))
    if input.starts_with("![") {
        if let Some((node, rest)) = try_parse_image(input) {
            return Ok(Some((Piece::Element(node), rest)));
        }
    }

    // Link ([text](href "title"))
    if input.starts_with('[') {
        if let Some((node, rest)) = try_parse_link(input, ctx)? {
            return Ok(Some((Piece::Element(node), rest)));
        }
    }

    // Autolink (<https://...>), then inline markup (<a href="...">, <img>, <br>)
    if input.starts_with('<') {
        if let Ok((rest, Token::Autolink(url))) = autolink(input) {
            let node = Node::new(Tag::A).with_attr("href", url).with_text(url);
            return Ok(Some((Piece::Element(node), rest)));
        }
        if let Some((node, rest)) = parse_leading_element(input) {
            if matches!(node.tag, Tag::A | Tag::Img | Tag::Br) {
                return Ok(Some((Piece::Element(node), rest)));
            }
        }
    }

    // Hard line break (two trailing spaces)
    if input.starts_with("  ") {
        if let Ok((rest, Token::HardBreak)) = hard_break(input) {
            return Ok(Some((Piece::Element(Node::new(Tag::Br)), rest)));
        }
    }

    Ok(None)
}

fn try_parse_link<'a>(input: &'a str, ctx: &mut ParseContext) -> Result<Option<(Node, &'a str)>> {
    let Some((text, target, rest)) = split_bracketed(input, 1) else {
        return Ok(None);
    };

    let (href, title) = parse_url_and_title(target);
    let mut node = Node::new(Tag::A).with_attr("href", href);
    if let Some(title) = title {
        node = node.with_attr("title", title);
    }
    parse_inlines_into(&mut node, text, ctx)?;

    Ok(Some((node, rest)))
}

fn try_parse_image(input: &str) -> Option<(Node, &str)> {
    let (alt, target, rest) = split_bracketed(input, 2)?;

    let (src, title) = parse_url_and_title(target);
    let mut node = Node::new(Tag::Img)
        .with_attr("src", src)
        .with_attr("alt", alt);
    if let Some(title) = title {
        node = node.with_attr("title", title);
    }

    Some((node, rest))
}

/// Split `[text](target)rest`, where the text starts at byte `open`.
/// Brackets and parentheses may nest.
fn split_bracketed(input: &str, open: usize) -> Option<(&str, &str, &str)> {
    let text_end = open + matching_close(&input[open - 1..], '[', ']')? - 1;
    let after_text = &input[text_end + 1..];
    if !after_text.starts_with('(') {
        return None;
    }
    let target_end = matching_close(after_text, '(', ')')?;

    Some((
        &input[open..text_end],
        &after_text[1..target_end],
        &after_text[target_end + 1..],
    ))
}

/// Byte offset of the delimiter closing the one at the start of `input`.
fn matching_close(input: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn parse_url_and_title(input: &str) -> (&str, Option<&str>) {
    let input = input.trim();

    for quote in ['"', '\''] {
        if let Some(quote_start) = input.find(quote) {
            if let Some(quote_end) = input[quote_start + 1..].find(quote) {
                let url = input[..quote_start].trim();
                let title = &input[quote_start + 1..quote_start + 1 + quote_end];
                return (url, Some(title));
            }
        }
    }

    (input.trim_start_matches('<').trim_end_matches('>'), None)
}

/// Consume plain text up to the next character that may start a construct.
fn consume_text(input: &str) -> (&str, &str) {
    const SPECIAL: &[char] = &['\\', '$', '*', '_', '`', '[', '!', '<', ' '];

    let mut prev: Option<char> = None;
    for (i, c) in input.char_indices() {
        if SPECIAL.contains(&c) && may_start_construct(c, prev, &input[i..]) {
            return (&input[..i], &input[i..]);
        }
        prev = Some(c);
    }

    (input, "")
}

fn may_start_construct(c: char, prev: Option<char>, at: &str) -> bool {
    let next = at[c.len_utf8()..].chars().next();
    match c {
        // Emphasis needs a non-space after the marker, and `_` never opens
        // inside a word
        '*' => next.map_or(false, |n| !n.is_whitespace()),
        '_' => {
            next.map_or(false, |n| !n.is_whitespace())
                && !prev.map_or(false, char::is_alphanumeric)
        }
        '!' => next == Some('['),
        '<' => next.map_or(false, |n| n.is_ascii_alphabetic()),
        ' ' => at.trim_start_matches(' ').starts_with('\n') && at.starts_with("  "),
        _ => true,
    }
}
