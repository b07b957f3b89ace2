//! Structural parser for literal markup islands.
//!
//! The tree renderer leaves tables, images and links in the output as literal
//! tags. The post-processing passes read them back with this parser. It is
//! deliberately tolerant about text: cell contents carry LaTeX escapes such as
//! `\&`, so text runs are taken verbatim and a `<` only opens a tag when a
//! letter or `/` follows it.
//!
//! Renderers writing islands encode `<` in text and `"`, `<`, `>` in
//! attribute values as numeric character references with [`encode_text`] and
//! [`encode_attribute`]. Those references survive the entity decoding that
//! runs before the island passes, and this parser decodes them again.

use crate::ast::{Node, Tag};
use crate::error::{ParseError, Result};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{cut, map, opt},
    error::ErrorKind,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use std::borrow::Cow;
use std::collections::HashMap;

const CHAR_REFS: [(char, &str); 3] = [('"', "&#34;"), ('<', "&#60;"), ('>', "&#62;")];

/// Encode island text so that no `<` can open a tag.
pub fn encode_text(text: &str) -> String {
    text.replace('<', "&#60;")
}

/// Encode a value for a double-quoted island attribute.
pub fn encode_attribute(value: &str) -> String {
    CHAR_REFS
        .iter()
        .fold(value.to_string(), |out, (c, reference)| {
            out.replace(*c, reference)
        })
}

fn decode_char_refs(text: &str) -> Cow<'_, str> {
    if !text.contains("&#") {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        CHAR_REFS
            .iter()
            .fold(text.to_string(), |out, (c, reference)| {
                out.replace(reference, &c.to_string())
            }),
    )
}

/// Parse a fragment holding exactly one element, surrounded by optional
/// whitespace.
pub fn parse_fragment(input: &str) -> Result<Node> {
    let fragment = input.trim();
    match element(fragment) {
        Ok((rest, node)) if rest.trim().is_empty() => Ok(node),
        Ok((rest, _)) => Err(markup_error(
            fragment,
            rest,
            "unexpected content after the closing tag",
        )),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(markup_error(fragment, e.input, &e.message))
        }
        Err(nom::Err::Incomplete(_)) => Err(markup_error(fragment, "", "incomplete input")),
    }
}

/// Parse one element at the start of `input`, returning it with the rest of
/// the input. Used for markup written inline in prose.
pub fn parse_leading_element(input: &str) -> Option<(Node, &str)> {
    element(input).ok().map(|(rest, node)| (node, rest))
}

fn markup_error(fragment: &str, rest: &str, message: &str) -> crate::error::Error {
    ParseError::Markup {
        offset: fragment.len() - rest.len(),
        message: message.to_string(),
    }
    .into()
}

/// Parse error carrying a readable message.
#[derive(Debug, PartialEq)]
struct MarkupError<'a> {
    input: &'a str,
    message: String,
}

impl<'a> MarkupError<'a> {
    fn failure(input: &'a str, message: impl Into<String>) -> nom::Err<Self> {
        nom::Err::Failure(Self {
            input,
            message: message.into(),
        })
    }
}

impl<'a> nom::error::ParseError<&'a str> for MarkupError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self {
            input,
            message: format!("expected {}", kind.description().to_lowercase()),
        }
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &'a str, c: char) -> Self {
        Self {
            input,
            message: format!("expected `{}`", c),
        }
    }
}

type MarkupResult<'a, T> = IResult<&'a str, T, MarkupError<'a>>;

/// Elements that never have content or a closing tag.
fn is_void(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "img" | "br" | "hr" | "input" | "meta" | "link"
    )
}

fn element(input: &str) -> MarkupResult<'_, Node> {
    let (mut input, (name, attributes, self_closing)) = open_tag(input)?;

    let mut node = Node::new(Tag::from_name(name));
    node.attributes = attributes;
    if self_closing || is_void(name) {
        return Ok((input, node));
    }

    loop {
        if input.is_empty() {
            return Err(MarkupError::failure(
                input,
                format!("unclosed element <{}>", name),
            ));
        }
        if input.starts_with("</") {
            let (rest, closing) = close_tag(input)?;
            if !closing.eq_ignore_ascii_case(name) {
                return Err(MarkupError::failure(
                    input,
                    format!("mismatched closing tag </{}>, expected </{}>", closing, name),
                ));
            }
            return Ok((rest, node));
        }
        if starts_tag(input) {
            let (rest, child) = element(input)?;
            node.push(child);
            input = rest;
            continue;
        }
        let (rest, text) = text_run(input)?;
        node.push_text(&decode_char_refs(text));
        input = rest;
    }
}

/// `<name attr="value" ...>` or `<name .../>`.
fn open_tag(input: &str) -> MarkupResult<'_, (&str, HashMap<String, String>, bool)> {
    let (input, name) = preceded(char('<'), tag_name)(input)?;
    cut(map(
        tuple((
            many0(preceded(multispace1, attribute)),
            multispace0,
            opt(char('/')),
            char('>'),
        )),
        move |(attributes, _, slash, _)| {
            (
                name,
                attributes.into_iter().collect::<HashMap<_, _>>(),
                slash.is_some(),
            )
        },
    ))(input)
}

/// `</name>`
fn close_tag(input: &str) -> MarkupResult<'_, &str> {
    preceded(
        pair(char('<'), char('/')),
        cut(terminated(tag_name, pair(multispace0, char('>')))),
    )(input)
}

fn tag_name(input: &str) -> MarkupResult<'_, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-')(input)
}

/// `name="value"`, `name='value'`, `name=value` or a bare `name`.
fn attribute(input: &str) -> MarkupResult<'_, (String, String)> {
    let (input, name) =
        take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))(input)?;
    let (input, value) = opt(preceded(
        tuple((multispace0, char('='), multispace0)),
        attribute_value,
    ))(input)?;
    Ok((
        input,
        (
            name.to_ascii_lowercase(),
            decode_char_refs(value.unwrap_or("")).into_owned(),
        ),
    ))
}

fn attribute_value(input: &str) -> MarkupResult<'_, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        take_while1(|c: char| !c.is_whitespace() && !matches!(c, '>' | '"' | '\'')),
    ))(input)
}

/// A `<` opens a tag only when followed by a letter or `/`.
fn starts_tag(input: &str) -> bool {
    let mut chars = input.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '/')
}

/// Verbatim text up to the next tag.
fn text_run(input: &str) -> MarkupResult<'_, &str> {
    let end = input
        .char_indices()
        .skip(1)
        .find(|&(i, _)| starts_tag(&input[i..]))
        .map_or(input.len(), |(i, _)| i);
    Ok((&input[end..], &input[..end]))
}
