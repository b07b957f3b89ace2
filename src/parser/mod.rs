//! Markdown front-end producing the document tree.

mod block;
mod footnotes;
mod inline;
mod lexer;
pub mod markup;

pub use block::parse_blocks;
pub use footnotes::FootnoteTable;
pub use inline::parse_inlines_into;
pub use lexer::url_scheme;

use crate::ast::{Node, Tag};
use crate::config::LatexConfig;
use crate::error::Result;
use std::borrow::Cow;

/// Per-document parsing state.
#[derive(Debug, Default)]
pub struct ParseContext {
    footnotes: Option<FootnoteTable>,
    strict_footnotes: bool,
    /// Footnotes whose bodies are being parsed, innermost last.
    active_footnotes: Vec<String>,
}

impl ParseContext {
    /// Context with the footnote subsystem enabled for `table`.
    pub fn with_footnotes(table: FootnoteTable, strict: bool) -> Self {
        Self {
            footnotes: Some(table),
            strict_footnotes: strict,
            active_footnotes: Vec::new(),
        }
    }

    /// Whether `[^id]` markers are lifted into footnotes.
    pub fn footnotes_enabled(&self) -> bool {
        self.footnotes.is_some()
    }
}

/// Parse markdown with the default configuration.
pub fn parse(input: &str) -> Result<Node> {
    parse_with(input, &LatexConfig::default())
}

/// Parse markdown into a `Root` node.
pub fn parse_with(input: &str, config: &LatexConfig) -> Result<Node> {
    let (source, mut ctx) = if config.footnotes {
        let (source, table) = FootnoteTable::extract(input);
        log::debug!("collected {} footnote definitions", table.len());
        (
            Cow::Owned(source),
            ParseContext::with_footnotes(table, config.strict_footnotes),
        )
    } else {
        (Cow::Borrowed(input), ParseContext::default())
    };

    let mut root = Node::new(Tag::Root);
    root.children = parse_blocks(&source, &mut ctx)?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let doc = parse("# Title\n\nSome *text*.").unwrap();
        assert_eq!(doc.tag, Tag::Root);
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].tag, Tag::H1);
        assert_eq!(doc.children[1].tag, Tag::P);
        assert_eq!(doc.children[1].children[0].tag, Tag::Em);
    }

    #[test]
    fn test_footnotes_disabled_by_default() {
        let doc = parse("Text[^1].\n\n[^1]: Note.").unwrap();
        assert!(doc.find(&Tag::Sup).is_none());
        assert_eq!(doc.children.len(), 2);
    }

    #[test]
    fn test_footnotes_enabled() {
        let config = LatexConfig {
            footnotes: true,
            ..Default::default()
        };
        let doc = parse_with("Text[^1].\n\n[^1]: Note.", &config).unwrap();
        assert_eq!(doc.children.len(), 1);
        let sup = doc.find(&Tag::Sup).unwrap();
        assert_eq!(sup.get("footnote"), Some("1"));
        assert_eq!(sup.inner_text(), "Note.");
    }
}
