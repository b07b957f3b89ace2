//! Token recognizers for Markdown source.
//!
//! Each function recognizes one construct at the start of its input and
//! returns the remaining input with the token. Block recognizers expect a
//! line with its indentation already removed.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1, take_while_m_n},
    character::complete::{char, not_line_ending, space0, space1},
    combinator::{eof, map, not, opt, peek, recognize, value},
    multi::many0,
    sequence::{delimited, pair, tuple},
    IResult,
};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    // Block-level tokens
    Heading(u8, &'a str), // Level, content
    FencedCodeStart(&'a str, &'a str), // Fence, language
    ThematicBreak,
    BlockQuoteMarker,
    ListItemMarker(ListMarker),
    FootnoteDefinition(&'a str, &'a str), // Id, first line of the body

    // Inline tokens
    Emphasis(&'a str),
    Strong(&'a str),
    InlineCode(&'a str),
    InlineMath(&'a str),
    DisplayMath(&'a str),
    FootnoteRef(&'a str),
    Autolink(&'a str),
    HardBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Unordered,
    Ordered(u32),
}

/// Parse an ATX heading (`## Heading ##`).
pub fn heading(input: &str) -> IResult<&str, Token> {
    let (input, hashes) = take_while_m_n(1, 6, |c: char| c == '#')(input)?;
    let (input, _) = alt((space1, eof))(input)?;
    let (input, content) = not_line_ending(input)?;
    Ok((input, Token::Heading(hashes.len() as u8, strip_closing_hashes(content))))
}

/// Drop an optional closing `#` sequence. It only counts when separated from
/// the content by a space, so `C#` keeps its hash.
fn strip_closing_hashes(content: &str) -> &str {
    let content = content.trim();
    let without = content.trim_end_matches('#');
    if without.len() == content.len() {
        content
    } else if without.is_empty() || without.ends_with(' ') {
        without.trim_end()
    } else {
        content
    }
}

/// Parse a thematic break (`---`, `***`, `___`, optionally spaced).
pub fn thematic_break(input: &str) -> IResult<&str, Token> {
    let (input, _) = alt((rule_of('-'), rule_of('*'), rule_of('_')))(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = eof(input)?;
    Ok((input, Token::ThematicBreak))
}

fn rule_of<'a>(c: char) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    recognize(tuple((
        char(c),
        space0,
        char(c),
        space0,
        char(c),
        many0(pair(space0, char(c))),
    )))
}

/// Parse a fenced code block start.
pub fn fenced_code_start(input: &str) -> IResult<&str, Token> {
    let (input, fence) = alt((tag("```"), tag("~~~")))(input)?;
    let (input, _) = space0(input)?;
    let (input, lang) =
        opt(take_while1(|c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '+')))(input)?;
    let (input, _) = not_line_ending(input)?;
    Ok((input, Token::FencedCodeStart(fence, lang.unwrap_or(""))))
}

/// Whether a line closes the fence opened with `fence`.
pub fn is_fence_end(line: &str, fence: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(fence) && trimmed.chars().all(|c| c == fence.as_bytes()[0] as char)
}

/// Parse a block quote marker.
pub fn block_quote_marker(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('>')(input)?;
    let (input, _) = opt(char(' '))(input)?;
    Ok((input, Token::BlockQuoteMarker))
}

/// Parse a list item marker, including the spaces after it.
pub fn list_item_marker(input: &str) -> IResult<&str, Token> {
    alt((
        map(
            pair(alt((char('-'), char('*'), char('+'))), marker_end),
            |_| Token::ListItemMarker(ListMarker::Unordered),
        ),
        map(
            tuple((
                take_while_m_n(1, 9, |c: char| c.is_ascii_digit()),
                alt((char('.'), char(')'))),
                marker_end,
            )),
            |(num, _, _): (&str, _, _)| {
                Token::ListItemMarker(ListMarker::Ordered(num.parse().unwrap_or(1)))
            },
        ),
    ))(input)
}

fn marker_end(input: &str) -> IResult<&str, &str> {
    alt((space1, eof))(input)
}

/// Parse a footnote definition line (`[^id]: body`), allowing up to three
/// leading spaces.
pub fn footnote_definition(input: &str) -> IResult<&str, Token> {
    let (input, _) = take_while_m_n(0, 3, |c: char| c == ' ')(input)?;
    let (input, id) = delimited(tag("[^"), footnote_id, tag("]:"))(input)?;
    let (input, _) = space0(input)?;
    let (input, body) = not_line_ending(input)?;
    Ok((input, Token::FootnoteDefinition(id, body)))
}

/// Parse a footnote reference (`[^id]`).
pub fn footnote_ref(input: &str) -> IResult<&str, Token> {
    let (input, id) = delimited(tag("[^"), footnote_id, char(']'))(input)?;
    Ok((input, Token::FootnoteRef(id)))
}

fn footnote_id(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !matches!(c, ']' | '[') && !c.is_whitespace())(input)
}

/// Parse inline math (`$...$`).
pub fn inline_math(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('$')(input)?;
    let (input, _) = peek(not(char('$')))(input)?; // Not display math
    let (input, content) = take_until("$")(input)?;
    let (input, _) = char('$')(input)?;
    Ok((input, Token::InlineMath(content)))
}

/// Parse display math (`$$...$$`).
pub fn display_math(input: &str) -> IResult<&str, Token> {
    let (input, content) = delimited(tag("$$"), take_until("$$"), tag("$$"))(input)?;
    Ok((input, Token::DisplayMath(content)))
}

/// Parse inline code (`` `code` ``).
pub fn inline_code(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('`')(input)?;
    let (input, _) = peek(not(char('`')))(input)?; // Not fenced code
    let (input, content) = take_until("`")(input)?;
    let (input, _) = char('`')(input)?;
    Ok((input, Token::InlineCode(content)))
}

/// Parse emphasis (`*text*` or `_text_`).
pub fn emphasis(input: &str) -> IResult<&str, Token> {
    alt((delimited_by('*'), delimited_by('_')))(input)
}

fn delimited_by<'a>(c: char) -> impl FnMut(&'a str) -> IResult<&'a str, Token<'a>> {
    delimited(
        pair(char(c), peek(not(alt((char(c), char(' ')))))),
        map(take_while1(move |ch: char| ch != c), Token::Emphasis),
        char(c),
    )
}

/// Parse strong (`**text**` or `__text__`).
pub fn strong(input: &str) -> IResult<&str, Token> {
    alt((
        delimited(tag("**"), map(take_until("**"), Token::Strong), tag("**")),
        delimited(tag("__"), map(take_until("__"), Token::Strong), tag("__")),
    ))(input)
}

/// Parse an autolink (`<https://example.com>`).
pub fn autolink(input: &str) -> IResult<&str, Token> {
    let (input, url) = delimited(
        char('<'),
        recognize(pair(
            alt((
                recognize(tuple((url_scheme, tag("//")))),
                tag("mailto:"),
            )),
            take_while(|c: char| c != '>' && c != '<' && !c.is_whitespace()),
        )),
        char('>'),
    )(input)?;
    Ok((input, Token::Autolink(url)))
}

/// Parse an RFC 3986 URL scheme with its trailing colon (`https:`).
pub fn url_scheme(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        take_while_m_n(1, 1, |c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        char(':'),
    )))(input)
}

/// Parse a hard line break: two or more spaces before a newline.
pub fn hard_break(input: &str) -> IResult<&str, Token> {
    value(
        Token::HardBreak,
        tuple((take_while_m_n(2, usize::MAX, |c: char| c == ' '), char('\n'))),
    )(input)
}
