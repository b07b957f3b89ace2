//! Footnote definitions and their lifting into the tree.
//!
//! Definitions are cut out of the source before block parsing. Their usages
//! are numbered in order of first appearance, and each usage becomes a `Sup`
//! node during inline parsing.

use super::lexer::{footnote_definition, footnote_ref, Token};
use super::{parse_blocks, ParseContext};
use crate::ast::{Node, Tag};
use crate::error::{ResolutionError, Result};
use std::collections::{HashMap, HashSet};

/// Footnote bodies and numbering for one document.
#[derive(Debug, Default, Clone)]
pub struct FootnoteTable {
    definitions: HashMap<String, String>,
    numbers: HashMap<String, usize>,
    emitted: HashSet<String>,
}

impl FootnoteTable {
    /// Remove footnote definitions from `input` and number the usages that
    /// remain. Each definition is replaced by a blank line.
    pub fn extract(input: &str) -> (String, Self) {
        let mut table = Self::default();
        let lines: Vec<&str> = input.lines().collect();
        let mut kept = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            if let Ok((_, Token::FootnoteDefinition(id, first))) = footnote_definition(lines[i]) {
                let (continuation, consumed) = indented_continuation(&lines[i + 1..]);
                let mut body = first.to_string();
                for line in continuation {
                    body.push('\n');
                    body.push_str(line);
                }
                table
                    .definitions
                    .insert(id.to_string(), body.trim_end().to_string());
                kept.push("");
                i += 1 + consumed;
            } else {
                kept.push(lines[i]);
                i += 1;
            }
        }

        let source = kept.join("\n");
        for (pos, _) in source.match_indices("[^") {
            if let Ok((_, Token::FootnoteRef(id))) = footnote_ref(&source[pos..]) {
                table.number_for(id);
            }
        }

        (source, table)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definitions were collected.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Body of a definition.
    pub fn definition(&self, id: &str) -> Option<&str> {
        self.definitions.get(id).map(String::as_str)
    }

    /// Number assigned to a footnote id.
    pub fn number(&self, id: &str) -> Option<usize> {
        self.numbers.get(id).copied()
    }

    /// Existing number for `id`, or the next free one.
    fn number_for(&mut self, id: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(id.to_string()).or_insert(next)
    }
}

/// De-indented lines continuing a definition body, and the number of source
/// lines they span. A blank line belongs to the body only when an indented
/// line follows it.
fn indented_continuation<'a>(lines: &[&'a str]) -> (Vec<&'a str>, usize) {
    let mut body = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            match lines.get(i).and_then(|next| strip_indent(next)) {
                Some(_) => body.push(""),
                None => break,
            }
        } else if let Some(rest) = strip_indent(line) {
            body.push(rest);
            i += 1;
        } else {
            break;
        }
    }

    (body, i)
}

fn strip_indent(line: &str) -> Option<&str> {
    line.strip_prefix("    ")
        .or_else(|| line.strip_prefix('\t'))
        .filter(|rest| !rest.trim().is_empty())
}

impl ParseContext {
    /// The node for a usage of footnote `id`, or `None` when the marker
    /// should stay literal text.
    pub(crate) fn footnote_node(&mut self, id: &str) -> Result<Option<Node>> {
        let Some(table) = self.footnotes.as_mut() else {
            return Ok(None);
        };

        let Some(body) = table.definition(id).map(str::to_string) else {
            if self.strict_footnotes {
                return Err(ResolutionError::UndefinedFootnote(id.to_string()).into());
            }
            log::warn!("Footnote [^{}] is not defined; keeping it as text", id);
            return Ok(None);
        };

        if self.active_footnotes.iter().any(|active| active == id) {
            log::warn!("Footnote [^{}] references itself; keeping it as text", id);
            return Ok(None);
        }

        let number = table.number_for(id).to_string();
        if !table.emitted.insert(id.to_string()) {
            return Ok(Some(Node::new(Tag::Sup).with_attr("footnote-ref", number)));
        }

        self.active_footnotes.push(id.to_string());
        let children = parse_blocks(&body, self);
        self.active_footnotes.pop();

        let mut sup = Node::new(Tag::Sup).with_attr("footnote", number);
        sup.children = children?;
        Ok(Some(sup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_definitions() {
        let input = "First[^b] then[^a].\n\n[^a]: Alpha.\n[^b]: Beta\n    continued.\n\n    Second paragraph.\n\nAfter.";
        let (source, table) = FootnoteTable::extract(input);

        assert_eq!(source, "First[^b] then[^a].\n\n\n\nAfter.");
        assert_eq!(table.len(), 2);
        assert_eq!(table.definition("a"), Some("Alpha."));
        assert_eq!(
            table.definition("b"),
            Some("Beta\ncontinued.\n\nSecond paragraph.")
        );
        assert_eq!(table.number("b"), Some(1));
        assert_eq!(table.number("a"), Some(2));
    }

    #[test]
    fn test_tab_continuation() {
        let (_, table) = FootnoteTable::extract("x[^n]\n\n[^n]: one\n\ttwo");
        assert_eq!(table.definition("n"), Some("one\ntwo"));
    }

    #[test]
    fn test_repeated_usage() {
        let (_, table) = FootnoteTable::extract("a[^x] b[^x]\n\n[^x]: Note.");
        let mut ctx = ParseContext::with_footnotes(table, false);

        let first = ctx.footnote_node("x").unwrap().unwrap();
        assert_eq!(first.get("footnote"), Some("1"));
        assert_eq!(first.children[0].tag, Tag::P);

        let second = ctx.footnote_node("x").unwrap().unwrap();
        assert_eq!(second.get("footnote-ref"), Some("1"));
        assert!(second.children.is_empty());
    }

    #[test]
    fn test_undefined_footnote() {
        let mut ctx = ParseContext::with_footnotes(FootnoteTable::default(), false);
        assert!(ctx.footnote_node("missing").unwrap().is_none());

        let mut strict = ParseContext::with_footnotes(FootnoteTable::default(), true);
        assert!(matches!(
            strict.footnote_node("missing"),
            Err(crate::error::Error::Resolution(
                ResolutionError::UndefinedFootnote(_)
            ))
        ));
    }

    #[test]
    fn test_cyclic_footnote() {
        let (_, table) = FootnoteTable::extract("a[^x]\n\n[^x]: See[^x].");
        let mut ctx = ParseContext::with_footnotes(table, false);

        let sup = ctx.footnote_node("x").unwrap().unwrap();
        assert_eq!(sup.inner_text(), "See[^x].");
    }
}
