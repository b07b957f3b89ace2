//! Block-level parsing for Markdown.

use super::inline::parse_inlines_into;
use super::lexer::{
    block_quote_marker, fenced_code_start, heading, is_fence_end, list_item_marker,
    thematic_break, ListMarker, Token,
};
use super::markup::parse_fragment;
use super::ParseContext;
use crate::ast::{Node, Tag};
use crate::error::Result;

/// Parse all blocks from content.
pub fn parse_blocks(input: &str, ctx: &mut ParseContext) -> Result<Vec<Node>> {
    let mut blocks = Vec::new();
    let lines: Vec<&str> = input.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        // Skip blank lines
        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some((block, consumed)) = try_parse_indented_code(&lines[i..]) {
            blocks.push(block);
            i += consumed;
        } else if let Some((block, consumed)) = try_parse_heading(line, ctx)? {
            blocks.push(block);
            i += consumed;
        } else if let Some((block, consumed)) = try_parse_thematic_break(line) {
            // Checked before lists: `* * *` is a rule, not an item
            blocks.push(block);
            i += consumed;
        } else if let Some((block, consumed)) = try_parse_fenced_code(&lines[i..]) {
            blocks.push(block);
            i += consumed;
        } else if let Some((block, consumed)) = try_parse_html_block(&lines[i..]) {
            blocks.push(block);
            i += consumed;
        } else if let Some((block, consumed)) = try_parse_block_quote(&lines[i..], ctx)? {
            blocks.push(block);
            i += consumed;
        } else if let Some((block, consumed)) = try_parse_list(&lines[i..], ctx)? {
            blocks.push(block);
            i += consumed;
        } else if let Some((block, consumed)) = try_parse_table(&lines[i..], ctx)? {
            blocks.push(block);
            i += consumed;
        } else {
            // Default: paragraph
            let (block, consumed) = parse_paragraph(&lines[i..], ctx)?;
            blocks.push(block);
            i += consumed;
        }
    }

    Ok(blocks)
}

fn try_parse_heading(line: &str, ctx: &mut ParseContext) -> Result<Option<(Node, usize)>> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return Ok(None);
    }

    match heading(trimmed) {
        Ok((_, Token::Heading(level, content))) => {
            let mut node = Node::new(Tag::heading(level));
            parse_inlines_into(&mut node, content, ctx)?;
            Ok(Some((node, 1)))
        }
        _ => Ok(None),
    }
}

fn try_parse_thematic_break(line: &str) -> Option<(Node, usize)> {
    thematic_break(line.trim())
        .ok()
        .map(|_| (Node::new(Tag::Hr), 1))
}

fn try_parse_fenced_code(lines: &[&str]) -> Option<(Node, usize)> {
    let Ok((_, Token::FencedCodeStart(fence, lang))) = fenced_code_start(lines[0].trim_start())
    else {
        return None;
    };

    let mut content = Vec::new();
    let mut i = 1;
    while i < lines.len() && !is_fence_end(lines[i], fence) {
        content.push(lines[i]);
        i += 1;
    }

    // An unclosed fence runs to the end of the input
    let consumed = (i + 1).min(lines.len());
    Some((code_block(&content.join("\n"), lang), consumed))
}

fn try_parse_indented_code(lines: &[&str]) -> Option<(Node, usize)> {
    strip_code_indent(lines[0])?;

    let mut content = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if let Some(code) = strip_code_indent(lines[i]) {
            content.push(code);
        } else if lines[i].trim().is_empty() {
            content.push("");
        } else {
            break;
        }
        i += 1;
    }

    // Trailing blank lines separate blocks, they are not code
    while content.last().map_or(false, |line| line.trim().is_empty()) {
        content.pop();
    }

    Some((code_block(&content.join("\n"), ""), i))
}

fn strip_code_indent(line: &str) -> Option<&str> {
    if line.trim().is_empty() {
        return None;
    }
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

fn code_block(content: &str, lang: &str) -> Node {
    let mut code = Node::new(Tag::Code).with_text(content);
    if !lang.is_empty() {
        code = code.with_attr("class", format!("language-{}", lang));
    }
    Node::new(Tag::Pre).with_child(code)
}

/// Literal `<table>`, `<img>` and `<a>` blocks written in the source.
fn try_parse_html_block(lines: &[&str]) -> Option<(Node, usize)> {
    let first = lines[0].trim_start().to_ascii_lowercase();

    let (raw, consumed) = if first.starts_with("<table") {
        let end = lines
            .iter()
            .position(|line| line.to_ascii_lowercase().contains("</table>"))?;
        (lines[..=end].join("\n"), end + 1)
    } else if first.starts_with("<img") || first.starts_with("<a ") {
        let end = lines
            .iter()
            .position(|line| line.trim().is_empty())
            .unwrap_or(lines.len());
        (lines[..end].join("\n"), end)
    } else {
        return None;
    };

    match parse_fragment(&raw) {
        Ok(mut node) if node.tag == Tag::Table => {
            prune_layout_whitespace(&mut node);
            Some((node, consumed))
        }
        Ok(node) if matches!(node.tag, Tag::Img | Tag::A) => {
            Some((Node::new(Tag::P).with_child(node), consumed))
        }
        Ok(_) => None,
        Err(e) => {
            log::debug!("Treating markup block as a paragraph: {}", e);
            None
        }
    }
}

/// Drop whitespace-only text between the structural tags of a table, so the
/// rendered table stays a single block.
fn prune_layout_whitespace(node: &mut Node) {
    if node.text.trim().is_empty() {
        node.text.clear();
    }
    for child in &mut node.children {
        if child.tail.trim().is_empty() {
            child.tail.clear();
        }
        if !child.tag.is_cell() && child.tag != Tag::Caption {
            prune_layout_whitespace(child);
        }
    }
}

fn try_parse_block_quote(lines: &[&str], ctx: &mut ParseContext) -> Result<Option<(Node, usize)>> {
    if !lines[0].trim_start().starts_with('>') {
        return Ok(None);
    }

    let mut quote_lines = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim_start();

        if let Ok((content, Token::BlockQuoteMarker)) = block_quote_marker(trimmed) {
            quote_lines.push(content);
            i += 1;
        } else if trimmed.is_empty()
            && i + 1 < lines.len()
            && lines[i + 1].trim_start().starts_with('>')
        {
            // Blank line within quote
            quote_lines.push("");
            i += 1;
        } else {
            break;
        }
    }

    let mut quote = Node::new(Tag::BlockQuote);
    quote.children = parse_blocks(&quote_lines.join("\n"), ctx)?;
    Ok(Some((quote, i)))
}

fn try_parse_list(lines: &[&str], ctx: &mut ParseContext) -> Result<Option<(Node, usize)>> {
    let indent = indent_of(lines[0]);
    let Ok((_, Token::ListItemMarker(marker))) = list_item_marker(lines[0].trim_start()) else {
        return Ok(None);
    };

    let mut list = match marker {
        ListMarker::Ordered(start) if start != 1 => {
            Node::new(Tag::Ol).with_attr("start", start.to_string())
        }
        ListMarker::Ordered(_) => Node::new(Tag::Ol),
        ListMarker::Unordered => Node::new(Tag::Ul),
    };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();

        // Blank lines between items keep the list going
        if trimmed.is_empty() {
            let next = next_non_blank(lines, i);
            if next < lines.len() && is_sibling_item(lines[next], indent, marker) {
                i = next;
                continue;
            }
            break;
        }

        let Ok((rest, Token::ListItemMarker(_))) = list_item_marker(trimmed) else {
            break;
        };
        if !is_sibling_item(line, indent, marker) {
            break;
        }

        let content_indent = indent + (trimmed.len() - rest.len());
        let mut item_lines = vec![rest];
        let mut tight = true;
        i += 1;

        while i < lines.len() {
            let next_line = lines[i];
            let next_trimmed = next_line.trim_start();
            let next_indent = indent_of(next_line);

            if next_trimmed.is_empty() {
                // A blank line continues the item only when indented content follows
                let next = next_non_blank(lines, i);
                if next < lines.len() && indent_of(lines[next]) >= content_indent {
                    item_lines.extend(std::iter::repeat("").take(next - i));
                    tight = false;
                    i = next;
                    continue;
                }
                break;
            }

            if next_indent <= indent
                && (list_item_marker(next_trimmed).is_ok() || is_block_start(next_trimmed))
            {
                break;
            }

            item_lines.push(strip_columns(next_line, content_indent));
            i += 1;
        }

        list.push(parse_list_item(&item_lines.join("\n"), tight, ctx)?);
    }

    Ok(Some((list, i)))
}

fn parse_list_item(content: &str, tight: bool, ctx: &mut ParseContext) -> Result<Node> {
    let mut item = Node::new(Tag::Li);
    let mut blocks = parse_blocks(content, ctx)?;

    // A tight item holds its first paragraph's inline content directly
    if tight && blocks.first().map_or(false, |block| block.tag == Tag::P) {
        let paragraph = blocks.remove(0);
        item.text = paragraph.text;
        item.children = paragraph.children;
    }
    item.children.extend(blocks);

    Ok(item)
}

fn is_sibling_item(line: &str, indent: usize, marker: ListMarker) -> bool {
    let current_indent = indent_of(line);
    match list_item_marker(line.trim_start()) {
        Ok((_, Token::ListItemMarker(m))) => {
            current_indent <= indent
                && matches!(
                    (marker, m),
                    (ListMarker::Ordered(_), ListMarker::Ordered(_))
                        | (ListMarker::Unordered, ListMarker::Unordered)
                )
        }
        _ => false,
    }
}

fn next_non_blank(lines: &[&str], from: usize) -> usize {
    let mut j = from;
    while j < lines.len() && lines[j].trim().is_empty() {
        j += 1;
    }
    j
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Remove up to `columns` columns of leading whitespace.
fn strip_columns(line: &str, columns: usize) -> &str {
    let mut width = 0;
    for (i, c) in line.char_indices() {
        if width >= columns || !c.is_whitespace() {
            return &line[i..];
        }
        width += if c == '\t' { 4 } else { 1 };
    }
    ""
}

fn try_parse_table(lines: &[&str], ctx: &mut ParseContext) -> Result<Option<(Node, usize)>> {
    // Need at least header row and delimiter row
    if lines.len() < 2 || !lines[0].contains('|') || !is_table_delimiter(lines[1]) {
        return Ok(None);
    }

    let header = split_row(lines[0]);
    let columns = header.len();

    let mut head_row = Node::new(Tag::Tr);
    for cell in header {
        head_row.push(parse_cell(Tag::Th, cell, ctx)?);
    }

    let mut body = Node::new(Tag::TBody);
    let mut i = 2;
    while i < lines.len() && lines[i].contains('|') && !lines[i].trim().is_empty() {
        let mut cells = split_row(lines[i]);
        cells.resize(columns, "");

        let mut row = Node::new(Tag::Tr);
        for cell in cells {
            row.push(parse_cell(Tag::Td, cell, ctx)?);
        }
        body.push(row);
        i += 1;
    }

    let mut table = Node::new(Tag::Table);

    // Check for caption after table, optionally one blank line below it
    let caption_at = match lines.get(i) {
        Some(line) if line.trim().is_empty() => i + 1,
        _ => i,
    };
    if let Some(caption) = lines
        .get(caption_at)
        .and_then(|line| line.trim().strip_prefix("Table:"))
    {
        let mut node = Node::new(Tag::Caption);
        parse_inlines_into(&mut node, caption.trim(), ctx)?;
        table.push(node);
        i = caption_at + 1;
    }

    table.push(Node::new(Tag::THead).with_child(head_row));
    table.push(body);

    Ok(Some((table, i)))
}

fn parse_cell(tag: Tag, content: &str, ctx: &mut ParseContext) -> Result<Node> {
    let mut cell = Node::new(tag);
    parse_inlines_into(&mut cell, &content.trim().replace("\\|", "|"), ctx)?;
    Ok(cell)
}

fn is_table_delimiter(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.contains('|') || !trimmed.contains('-') {
        return false;
    }

    // Remove leading/trailing pipes
    let inner = trimmed.trim_matches('|');

    // Check each cell is a valid delimiter
    inner.split('|').all(|cell| {
        let cell = cell.trim();
        !cell.is_empty()
            && cell.chars().all(|c| c == '-' || c == ':')
            && cell.contains('-')
    })
}

/// Split a table row on unescaped pipes. Escaped pipes stay in the cell
/// as `\|` until [`parse_cell`] unescapes them.
fn split_row(line: &str) -> Vec<&str> {
    let mut row = line.trim();
    row = row.strip_prefix('|').unwrap_or(row);
    if row.ends_with('|') && !row.ends_with("\\|") {
        row = &row[..row.len() - 1];
    }

    let mut cells = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in row.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '|' if !escaped => {
                cells.push(&row[start..i]);
                start = i + 1;
            }
            _ => escaped = false,
        }
        if c == '|' {
            escaped = false;
        }
    }
    cells.push(&row[start..]);
    cells
}

/// Whether a line opens a block that interrupts a paragraph.
fn is_block_start(trimmed: &str) -> bool {
    heading(trimmed).is_ok()
        || thematic_break(trimmed).is_ok()
        || fenced_code_start(trimmed).is_ok()
        || trimmed.starts_with('>')
        || trimmed.to_ascii_lowercase().starts_with("<table")
}

fn parse_paragraph(lines: &[&str], ctx: &mut ParseContext) -> Result<(Node, usize)> {
    let mut para_lines = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim_start();

        // End paragraph on blank line
        if trimmed.trim().is_empty() {
            break;
        }

        // End paragraph on block-level element
        if i > 0
            && (is_block_start(trimmed)
                || list_item_marker(trimmed).is_ok()
                || (trimmed.contains('|') && lines.get(i + 1).map_or(false, |l| is_table_delimiter(l))))
        {
            break;
        }

        para_lines.push(trimmed);
        i += 1;
    }

    let mut paragraph = Node::new(Tag::P);
    parse_inlines_into(&mut paragraph, &para_lines.join("\n"), ctx)?;

    Ok((paragraph, i.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Node> {
        parse_blocks(input, &mut ParseContext::default()).unwrap()
    }

    #[test]
    fn test_parse_heading() {
        let blocks = parse("## A first section ##");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].tag, Tag::H2);
        assert_eq!(blocks[0].text, "A first section");
    }

    #[test]
    fn test_parse_code_block() {
        let blocks = parse("```rust\nfn main() {\n    0\n}\n```\nAfter");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].tag, Tag::Pre);
        let code = &blocks[0].children[0];
        assert_eq!(code.get("class"), Some("language-rust"));
        assert_eq!(code.text, "fn main() {\n    0\n}");
    }

    #[test]
    fn test_indented_code() {
        let blocks = parse("Para.\n\n    let x = 1;\n\n    x + 1\n\nNext.");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].tag, Tag::Pre);
        assert_eq!(blocks[1].children[0].text, "let x = 1;\n\nx + 1");
    }

    #[test]
    fn test_ordered_list() {
        let blocks = parse("A simple list:\n\n  1. Item 1\n  2. Item 2");
        assert_eq!(blocks.len(), 2);
        let list = &blocks[1];
        assert_eq!(list.tag, Tag::Ol);
        assert_eq!(list.get("start"), None);
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[0].text, "Item 1");
        assert!(list.children[0].children.is_empty());
    }

    #[test]
    fn test_list_start_and_nesting() {
        let blocks = parse("3. three\n4. four\n   - nested\n");
        let list = &blocks[0];
        assert_eq!(list.get("start"), Some("3"));
        assert_eq!(list.children.len(), 2);
        let second = &list.children[1];
        assert_eq!(second.text, "four");
        assert_eq!(second.children[0].tag, Tag::Ul);
    }

    #[test]
    fn test_loose_list_item() {
        let blocks = parse("- one\n\n  more\n- two");
        let list = &blocks[0];
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[0].children[0].tag, Tag::P);
        assert_eq!(list.children[0].children[1].tag, Tag::P);
        assert_eq!(list.children[1].text, "two");
    }

    #[test]
    fn test_rule_is_not_list() {
        let blocks = parse("* * *\n- item");
        assert_eq!(blocks[0].tag, Tag::Hr);
        assert_eq!(blocks[1].tag, Tag::Ul);
    }

    #[test]
    fn test_block_quote() {
        let blocks = parse("> quoted\n>\n> second");
        assert_eq!(blocks[0].tag, Tag::BlockQuote);
        assert_eq!(blocks[0].children.len(), 2);
    }

    #[test]
    fn test_pipe_table() {
        let blocks = parse("| A | B \\| C |\n|---|:---:|\n| 1 | 2 |\n| 3 |\nTable: Numbers");
        assert_eq!(blocks.len(), 1);
        let table = &blocks[0];
        assert_eq!(table.tag, Tag::Table);
        assert_eq!(table.children[0].tag, Tag::Caption);
        assert_eq!(table.children[0].text, "Numbers");

        let head = &table.children[1].children[0];
        assert_eq!(head.children[1].tag, Tag::Th);
        assert_eq!(head.children[1].text, "B | C");

        let body = &table.children[2];
        assert_eq!(body.children.len(), 2);
        assert_eq!(body.children[1].children.len(), 2);
        assert_eq!(body.children[1].children[1].text, "");
    }

    #[test]
    fn test_table_delimiter() {
        assert!(is_table_delimiter("| --- | :---: | ---: |"));
        assert!(is_table_delimiter("|---|:---:|---:|"));
        assert!(!is_table_delimiter("| not | a | delimiter |"));
    }

    #[test]
    fn test_raw_html_table() {
        let blocks = parse("<table>\n  <tr>\n    <td colspan=\"2\">wide</td>\n  </tr>\n</table>\n\nAfter.");
        assert_eq!(blocks.len(), 2);
        let table = &blocks[0];
        assert_eq!(table.tag, Tag::Table);
        assert_eq!(table.text, "");
        let row = &table.children[0];
        assert_eq!(row.tail, "");
        assert_eq!(row.children[0].get("colspan"), Some("2"));
    }

    #[test]
    fn test_malformed_html_falls_back_to_paragraph() {
        let blocks = parse("<table><tr></td></table>");
        assert_eq!(blocks[0].tag, Tag::P);
    }

    #[test]
    fn test_paragraph_lines() {
        let blocks = parse("Multiple\nLines\n# Heading");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Multiple\nLines");
    }
}
