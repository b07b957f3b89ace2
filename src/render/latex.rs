//! Tree renderer: one LaTeX template per tag.
//!
//! Tables, images and links are emitted as literal markup islands and
//! converted by the later passes, which see the whole structure at once.
//! Text and attribute values inside an island are encoded so the island
//! always parses on its own.

use crate::ast::{Node, Tag};
use crate::escape::escape_latex_reserved;
use crate::parser::markup::{encode_attribute, encode_text};

const MAKETITLE: &str = "\n% ----------------------------------------------------------------\n\\maketitle\n% ----------------------------------------------------------------\n";

/// Render a node and its subtree, followed by its escaped tail.
pub fn render_node(node: &Node) -> String {
    render(node, false)
}

fn render(node: &Node, in_island: bool) -> String {
    let mut out = match node.tag {
        Tag::Pre => render_verbatim(node),
        _ => {
            let content = render_content(node, in_island || opens_island(&node.tag));
            render_tag(node, &content)
        }
    };
    push_escaped(&mut out, &node.tail, in_island);
    out
}

fn opens_island(tag: &Tag) -> bool {
    matches!(tag, Tag::Table | Tag::Img | Tag::A)
}

/// Escaped own text followed by every rendered child.
fn render_content(node: &Node, in_island: bool) -> String {
    let mut content = String::new();
    push_escaped(&mut content, &node.text, in_island);
    for child in &node.children {
        content.push_str(&render(child, in_island));
    }
    content
}

fn push_escaped(out: &mut String, text: &str, in_island: bool) {
    if text.is_empty() {
        return;
    }
    let escaped = escape_latex_reserved(text);
    if in_island {
        out.push_str(&encode_text(&escaped));
    } else {
        out.push_str(&escaped);
    }
}

fn render_tag(node: &Node, content: &str) -> String {
    match &node.tag {
        Tag::H1 => format!("\n\\title{{{}}}\n{}", content, MAKETITLE),
        Tag::H2 => format!("\n\n\\section{{{}}}\n", content),
        Tag::H3 => format!("\n\n\\subsection{{{}}}\n", content),
        Tag::H4 => format!("\n\\subsubsection{{{}}}\n", content),
        Tag::H5 => format!("\n\\paragraph{{{}}}\n", content),
        Tag::H6 => format!("\n\\subparagraph{{{}}}\n", content),
        Tag::Hr => "\n\\noindent\\makebox[\\linewidth]{\\rule{\\linewidth}{0.4pt}}\n".to_string(),
        Tag::Br => "\\\\\n".to_string(),
        Tag::Ul => format!("\n\\begin{{itemize}}{}\n\\end{{itemize}}\n", content),
        Tag::Ol => render_enumerate(node, content),
        Tag::Li => format!("\n  \\item {}", content.trim()),
        Tag::BlockQuote => render_quotation(content),
        Tag::Q => format!("`{}'", content.trim()),
        Tag::P => format!("\n{}\n", content.trim()),
        Tag::Sup => match node.get("footnote-ref") {
            Some(number) => format!("\\footnotemark[{}]", number),
            None => format!("\\footnote{{{}}}", content.trim()),
        },
        Tag::Strong => format!("\\textbf{{{}}}", content.trim()),
        Tag::Em => format!("\\emph{{{}}}", content.trim()),
        Tag::Table => format!("\n\n<table>{}</table>\n\n", content),
        Tag::Caption | Tag::THead | Tag::TBody | Tag::Tr => {
            format!("<{0}>{1}</{0}>", node.tag.name(), content)
        }
        Tag::Th | Tag::Td => match node.get("colspan") {
            Some(span) => format!(
                "<{0} colspan=\"{1}\">{2}</{0}>",
                node.tag.name(),
                encode_attribute(span),
                content
            ),
            None => format!("<{0}>{1}</{0}>", node.tag.name(), content),
        },
        Tag::Img => format!(
            "<img src=\"{}\" alt=\"{}\" />",
            encode_attribute(node.get("src").unwrap_or_default()),
            encode_attribute(node.get("alt").unwrap_or_default())
        ),
        Tag::A => format!(
            "<a href=\"{}\">{}</a>",
            encode_attribute(&escape_latex_reserved(node.get("href").unwrap_or_default())),
            content
        ),
        Tag::Root | Tag::Pre | Tag::Code | Tag::Other(_) => content.to_string(),
    }
}

/// Islands at either end keep a blank line so the passes still see them as
/// blocks of their own.
fn render_quotation(content: &str) -> String {
    let body = content.trim();
    let open = if body.starts_with('<') { "\n\n" } else { "\n" };
    let close = if body.ends_with('>') { "\n\n" } else { "\n" };
    format!(
        "\n\\begin{{quotation}}{}{}{}\\end{{quotation}}\n",
        open, body, close
    )
}

fn render_enumerate(node: &Node, content: &str) -> String {
    let mut out = String::from("\n\\begin{enumerate}");
    if let Some(start) = node.get("start") {
        match start.trim().parse::<i64>() {
            Ok(start) => out.push_str(&format!("\\setcounter{{enumi}}{{{}}}", start - 1)),
            Err(_) => log::warn!("Ignoring non-numeric list start {:?}", start),
        }
    }
    out.push_str(&format!("\n{}\n\\end{{enumerate}}\n", content));
    out
}

/// Code keeps its raw text; only the surrounding blank lines are trimmed.
fn render_verbatim(node: &Node) -> String {
    let code = node.inner_text();
    format!(
        "\n\\begin{{verbatim}}\n{}\n\\end{{verbatim}}\n",
        code.trim_matches(|c: char| c == '\n' || c == '\r')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_headings() {
        assert_eq!(
            render_node(&Node::new(Tag::H2).with_text("Title")),
            "\n\n\\section{Title}\n"
        );
        assert_eq!(
            render_node(&Node::new(Tag::H3).with_text("Sub")),
            "\n\n\\subsection{Sub}\n"
        );
        assert!(render_node(&Node::new(Tag::H1).with_text("Doc"))
            .starts_with("\n\\title{Doc}\n\n% ---"));
    }

    #[test]
    fn test_text_and_tail_escaped() {
        let p = Node::new(Tag::P)
            .with_text("50% off ")
            .with_child(Node::new(Tag::Strong).with_text("A & B").with_tail(" #1"));
        assert_eq!(render_node(&p), "\n50\\% off \\textbf{A \\& B} \\#1\n");
    }

    #[test]
    fn test_ordered_list_start() {
        let list = Node::new(Tag::Ol)
            .with_attr("start", "3")
            .with_child(Node::new(Tag::Li).with_text(" Three "));
        assert_eq!(
            render_node(&list),
            "\n\\begin{enumerate}\\setcounter{enumi}{2}\n\n  \\item Three\n\\end{enumerate}\n"
        );
    }

    #[test]
    fn test_non_numeric_start_ignored() {
        let list = Node::new(Tag::Ol).with_attr("start", "iv");
        assert_eq!(
            render_node(&list),
            "\n\\begin{enumerate}\n\n\\end{enumerate}\n"
        );
    }

    #[test]
    fn test_pre_is_raw() {
        let pre = Node::new(Tag::Pre)
            .with_child(Node::new(Tag::Code).with_text("\n  50% & \"x\"\n"));
        assert_eq!(
            render_node(&pre),
            "\n\\begin{verbatim}\n  50% & \"x\"\n\\end{verbatim}\n"
        );
    }

    #[test]
    fn test_footnotes() {
        let sup = Node::new(Tag::Sup)
            .with_attr("footnote", "1")
            .with_child(Node::new(Tag::P).with_text("Note."));
        assert_eq!(render_node(&sup), "\\footnote{Note.}");

        let mark = Node::new(Tag::Sup).with_attr("footnote-ref", "1");
        assert_eq!(render_node(&mark), "\\footnotemark[1]");
    }

    #[test]
    fn test_islands() {
        let img = Node::new(Tag::Img).with_attr("src", "a.png").with_attr("alt", "A");
        assert_eq!(render_node(&img), "<img src=\"a.png\" alt=\"A\" />");

        let link = Node::new(Tag::A)
            .with_attr("href", "https://example.com/#top")
            .with_text("here");
        assert_eq!(
            render_node(&link),
            "<a href=\"https://example.com/\\#top\">here</a>"
        );

        let cell = Node::new(Tag::Td).with_attr("colspan", "2").with_text("x");
        assert_eq!(render_node(&cell), "<td colspan=\"2\">x</td>");
    }

    #[test]
    fn test_unknown_tags_pass_through() {
        let span = Node::new(Tag::Other("span".into()))
            .with_text("inner")
            .with_tail(" & after");
        assert_eq!(render_node(&span), "inner \\& after");
    }

    #[test]
    fn test_quote_and_rule() {
        assert_eq!(render_node(&Node::new(Tag::Q).with_text(" x ")), "`x'");
        assert_eq!(
            render_node(&Node::new(Tag::Hr)),
            "\n\\noindent\\makebox[\\linewidth]{\\rule{\\linewidth}{0.4pt}}\n"
        );
    }

    #[test]
    fn test_rule_then_image_are_separate_blocks() {
        let root = Node::new(Tag::Root)
            .with_child(Node::new(Tag::Hr))
            .with_child(
                Node::new(Tag::P)
                    .with_child(Node::new(Tag::Img).with_attr("src", "a.png").with_attr("alt", "A")),
            );
        let out = render_node(&root);
        assert!(out
            .split("\n\n")
            .any(|block| block.trim() == "<img src=\"a.png\" alt=\"A\" />"));
    }

    #[test]
    fn test_block_quote_trimmed() {
        let quote = Node::new(Tag::BlockQuote)
            .with_child(Node::new(Tag::P).with_text("a"))
            .with_child(Node::new(Tag::P).with_text("b"));
        assert_eq!(
            render_node(&quote),
            "\n\\begin{quotation}\na\n\nb\n\\end{quotation}\n"
        );

        let figure = Node::new(Tag::BlockQuote).with_child(
            Node::new(Tag::P)
                .with_child(Node::new(Tag::Img).with_attr("src", "a.png").with_attr("alt", "A")),
        );
        assert_eq!(
            render_node(&figure),
            "\n\\begin{quotation}\n\n<img src=\"a.png\" alt=\"A\" />\n\n\\end{quotation}\n"
        );
    }

    #[test]
    fn test_island_text_encoded() {
        let cell = Node::new(Tag::Td).with_text("x<y");
        let table = Node::new(Tag::Table).with_child(Node::new(Tag::Tr).with_child(cell));
        assert_eq!(
            render_node(&table),
            "\n\n<table><tr><td>x&#60;y</td></tr></table>\n\n"
        );

        let img = Node::new(Tag::Img)
            .with_attr("src", "a.png")
            .with_attr("alt", "say \"hi\"");
        assert_eq!(
            render_node(&img),
            "<img src=\"a.png\" alt=\"say &#34;hi&#34;\" />"
        );

        // prose outside islands keeps its characters
        let p = Node::new(Tag::P).with_text("x<y");
        assert_eq!(render_node(&p), "\nx<y\n");
    }
}
