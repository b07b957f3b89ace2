//! Link pass: `<a href>` islands become `\href` or `\url`.

use super::TextPass;
use crate::error::Result;
use crate::parser::markup::parse_fragment;
use once_cell::sync::Lazy;
use regex::Regex;

static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a\b[^>]*>[^<]+</a>").expect("anchor regex"));

/// Replace every anchor in `input`, left to right.
pub fn convert_links(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for found in ANCHOR.find_iter(input) {
        out.push_str(&input[last..found.start()]);
        out.push_str(&link(found.as_str())?);
        last = found.end();
    }
    out.push_str(&input[last..]);

    Ok(out)
}

fn link(island: &str) -> Result<String> {
    let anchor = parse_fragment(island)?;
    let href = anchor.get("href").unwrap_or_default();
    let text = anchor.inner_text();

    Ok(if text == href {
        format!("\\url{{{}}}", href)
    } else {
        format!("\\href{{{}}}{{{}}}", href, text)
    })
}

/// Pipeline stage wrapping [`convert_links`].
pub struct LinkPass;

impl TextPass for LinkPass {
    fn name(&self) -> &'static str {
        "link"
    }

    fn run(&self, input: &str) -> Result<String> {
        convert_links(input)
    }
}
