//! Table pass: literal `<table>` islands become `tabular` environments.

use super::TextPass;
use crate::ast::{Node, Tag};
use crate::error::{RenderError, Result};
use crate::parser::markup::{encode_attribute, encode_text, parse_fragment};

/// Replace every table island in `input`.
pub fn convert_tables(input: &str) -> Result<String> {
    let blocks = input
        .split("\n\n")
        .map(|block| {
            let stripped = block.trim();
            if stripped.starts_with("<table") && stripped.ends_with("</table>") {
                log::debug!("converting table island");
                let table = parse_fragment(stripped)?;
                TableConverter::default().convert(&table)
            } else {
                Ok(block.to_string())
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(blocks.join("\n\n"))
}

/// Converts one table tree. Column counters are per table.
#[derive(Debug, Default)]
pub struct TableConverter {
    columns: usize,
    max_columns: usize,
}

impl TableConverter {
    /// Render a `Table` node as a LaTeX `table` float.
    pub fn convert(&mut self, table: &Node) -> Result<String> {
        let rows = self.rows(table)?;
        let caption = table.find(&Tag::Caption).map(cell_text).unwrap_or_default();

        Ok(format!(
            "\\begin{{table}}[h]\n\\begin{{tabular}}{{{}}}\n{}\n\\hline\n\\end{{tabular}}\n\\\\[5pt]\n\\caption{{{}}}\n\\end{{table}}",
            self.column_format(),
            rows.trim(),
            caption
        ))
    }

    /// `|l` for each column of the widest row, closed with `|`.
    pub fn column_format(&self) -> String {
        format!("{}|", "|l".repeat(self.max_columns))
    }

    fn rows(&mut self, node: &Node) -> Result<String> {
        let mut content = String::new();

        for (i, child) in node.children.iter().enumerate() {
            let text = if child.tag.is_cell() {
                let is_last = !node.children[i + 1..]
                    .iter()
                    .any(|sibling| sibling.tag.is_cell());
                self.cell(child, is_last)?
            } else {
                self.rows(child)?
            };
            if !text.trim().is_empty() {
                content.push_str(&text);
            }
        }

        Ok(match node.tag {
            Tag::Caption => String::new(),
            Tag::Tr => {
                self.max_columns = self.max_columns.max(self.columns);
                self.columns = 0;
                format!("\n\\hline\n{} \\\\", content.trim())
            }
            _ => content,
        })
    }

    fn cell(&mut self, cell: &Node, is_last: bool) -> Result<String> {
        let mut content = cell_text(cell);
        if cell.tag == Tag::Th {
            content = format!("\\textbf{{{}}}", content);
        }

        let span = match cell.get("colspan") {
            Some(value) => Some(parse_colspan(cell, value)?),
            None => None,
        };

        let mut out = match span {
            Some(span) => format!(" \\multicolumn{{{}}}{{|c|}}{{{}}}", span, content),
            None => format!(" {}", content),
        };
        if !is_last {
            out.push_str(" &");
        }

        self.columns += span.unwrap_or(1);
        Ok(out)
    }
}

fn parse_colspan(cell: &Node, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(span) if span > 0 => Ok(span),
        _ => Err(RenderError::InvalidAttribute {
            tag: cell.tag.name().to_string(),
            name: "colspan".to_string(),
            value: value.to_string(),
        }
        .into()),
    }
}

/// Text of a cell with blank runs dropped. Anchors are written back as
/// literal markup so the link pass still converts them.
fn cell_text(node: &Node) -> String {
    let mut out = String::new();
    push_non_blank(&mut out, &node.text);
    for child in &node.children {
        if child.tag == Tag::A {
            out.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                encode_attribute(child.get("href").unwrap_or_default()),
                encode_text(&child.inner_text())
            ));
        } else {
            out.push_str(&cell_text(child));
        }
        push_non_blank(&mut out, &child.tail);
    }
    out.trim().to_string()
}

fn push_non_blank(out: &mut String, text: &str) {
    if !text.trim().is_empty() {
        out.push_str(text);
    }
}

/// Pipeline stage wrapping [`convert_tables`].
pub struct TablePass;

impl TextPass for TablePass {
    fn name(&self) -> &'static str {
        "table"
    }

    fn run(&self, input: &str) -> Result<String> {
        convert_tables(input)
    }
}
