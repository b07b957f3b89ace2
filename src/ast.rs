//! Document tree definitions.
//!
//! The tree follows the element model used by HTML-ish markup: every node owns
//! the text that precedes its first child (`text`) and the text that follows its
//! own closing tag (`tail`). The tail belongs to the parent's content stream.

use std::collections::HashMap;

/// Element tags understood by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Tag {
    /// Synthetic document container
    #[default]
    Root,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    /// Paragraph
    P,
    /// Thematic break
    Hr,
    /// Hard line break
    Br,
    /// Unordered list
    Ul,
    /// Ordered list (honours a `start` attribute)
    Ol,
    /// List item
    Li,
    BlockQuote,
    /// Preformatted block; code blocks are `Pre` > `Code`
    Pre,
    Code,
    /// Inline quotation
    Q,
    /// Superscript, also the carrier for lifted footnotes
    Sup,
    Strong,
    Em,
    Table,
    Caption,
    THead,
    TBody,
    Tr,
    Th,
    Td,
    Img,
    /// Anchor
    A,
    /// Any tag outside the closed set; rendered transparently
    Other(String),
}

impl Tag {
    /// Map a markup tag name to a tag. Matching is case-insensitive.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "root" => Self::Root,
            "h1" => Self::H1,
            "h2" => Self::H2,
            "h3" => Self::H3,
            "h4" => Self::H4,
            "h5" => Self::H5,
            "h6" => Self::H6,
            "p" => Self::P,
            "hr" => Self::Hr,
            "br" => Self::Br,
            "ul" => Self::Ul,
            "ol" => Self::Ol,
            "li" => Self::Li,
            "blockquote" => Self::BlockQuote,
            "pre" => Self::Pre,
            "code" => Self::Code,
            "q" => Self::Q,
            "sup" => Self::Sup,
            "strong" | "b" => Self::Strong,
            "em" | "i" => Self::Em,
            "table" => Self::Table,
            "caption" => Self::Caption,
            "thead" => Self::THead,
            "tbody" => Self::TBody,
            "tr" => Self::Tr,
            "th" => Self::Th,
            "td" => Self::Td,
            "img" => Self::Img,
            "a" => Self::A,
            other => Self::Other(other.to_string()),
        }
    }

    /// The markup name of this tag.
    pub fn name(&self) -> &str {
        match self {
            Self::Root => "root",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::P => "p",
            Self::Hr => "hr",
            Self::Br => "br",
            Self::Ul => "ul",
            Self::Ol => "ol",
            Self::Li => "li",
            Self::BlockQuote => "blockquote",
            Self::Pre => "pre",
            Self::Code => "code",
            Self::Q => "q",
            Self::Sup => "sup",
            Self::Strong => "strong",
            Self::Em => "em",
            Self::Table => "table",
            Self::Caption => "caption",
            Self::THead => "thead",
            Self::TBody => "tbody",
            Self::Tr => "tr",
            Self::Th => "th",
            Self::Td => "td",
            Self::Img => "img",
            Self::A => "a",
            Self::Other(name) => name,
        }
    }

    /// Heading tag for a level, clamped to 1..=6.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => Self::H1,
            2 => Self::H2,
            3 => Self::H3,
            4 => Self::H4,
            5 => Self::H5,
            _ => Self::H6,
        }
    }

    /// Whether this tag is a table cell.
    pub fn is_cell(&self) -> bool {
        matches!(self, Self::Th | Self::Td)
    }
}

/// A document tree element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub tag: Tag,
    /// Text before the first child
    pub text: String,
    /// Text after this node's closing, owned by the parent's stream
    pub tail: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty node.
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    /// Builder: set the leading text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder: set the tail text.
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    /// Builder: set an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: append a child.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Append text to the content stream of this node.
    ///
    /// Text lands in `text` while the node has no children, and in the tail
    /// of the last child afterwards.
    pub fn push_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.push_str(text),
            None => self.text.push_str(text),
        }
    }

    /// Append a child element.
    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Depth-first search for the first descendant (or self) with the tag.
    pub fn find(&self, tag: &Tag) -> Option<&Node> {
        if &self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(tag))
    }

    /// Concatenated text of this node and its descendants, excluding this
    /// node's own tail.
    pub fn inner_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.inner_text());
            out.push_str(&child.tail);
        }
        out
    }
}
