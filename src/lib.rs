//! # markdown-latex
//!
//! Convert Markdown documents to LaTeX: sections, lists, quotations, code,
//! math, tables, figures, links, and footnotes.
//!
//! ## Quick Start
//!
//! ```rust
//! use markdown_latex::markdown_to_latex;
//!
//! let latex = markdown_to_latex("## Results\n\nThe sum is $a + b$.", None).unwrap();
//! assert_eq!(latex, "\\section{Results}\n\nThe sum is \\(a + b\\).");
//! ```
//!
//! ## Pipeline
//!
//! Conversion runs in two phases:
//!
//! 1. **Tree rendering**: the parsed [`Node`] tree is walked and each tag is
//!    rendered with its LaTeX template. Text is escaped on the way.
//! 2. **Post-processing**: a fixed chain of text passes. Tables, images and
//!    links are left by the tree renderer as literal markup and converted
//!    here, once the complete structure of each is visible:
//!
//!    unescape → math → image → table → link → root-strip
//!
//! ## Syntax Reference
//!
//! ### Math
//!
//! - Inline: `$E = mc^2$` becomes `\(E = mc^2\)`
//! - Display: `$$\int_0^1 x dx$$` becomes `\[\int_0^1 x dx\]`
//! - Inside math, `\lt` is `<`, ` * ` is `\cdot` and `\del` is `\partial`.
//! - A dollar sign outside a math span is escaped.
//!
//! ### Tables
//!
//! Pipe tables, with an optional caption line after the table:
//!
//! ```text
//! | Name | Value |
//! | ---- | ----- |
//! | a    | 1     |
//!
//! Table: Measurements
//! ```
//!
//! Literal `<table>` markup is accepted too and may use `colspan`.
//!
//! ### Images
//!
//! `![Caption](figure.png)` on its own line becomes a centered `figure` with
//! the alt text as caption. Images with a URL source are downloaded to a
//! temporary directory when the `remote-images` feature is enabled.
//!
//! ### Footnotes
//!
//! `Some text[^1].` with `[^1]: Footnote content.` defined anywhere in the
//! document. Footnotes are off by default; see [`LatexConfig::footnotes`].
//!
//! ## Configuration
//!
//! [`LatexConfig`] can be built in code or read from TOML:
//!
//! ```toml
//! footnotes = true
//! fetch_remote_images = false
//! ```
//!
//! ## FFI
//!
//! The library provides a C-compatible FFI. See the `ffi` module
//! documentation for details.
//!
//! ## Features
//!
//! - `remote-images` (default): download absolute image URLs with `reqwest`

pub mod ast;
pub mod config;
pub mod error;
pub mod escape;
pub mod parser;
pub mod render;
pub mod template;

// FFI module (always compiled for cdylib)
pub mod ffi;

// Convenience re-exports
pub use ast::{Node, Tag};
pub use config::LatexConfig;
pub use error::{Error, ParseError, RenderError, ResolutionError, Result};
pub use escape::{
    decode_markup_entities, escape_latex_reserved, normalize_typographic_markup,
    unescape_latex_reserved,
};
pub use parser::{parse, parse_with};
pub use render::{render_document, ImageResolver, LatexRenderer, NoRemoteImages};
pub use template::{apply_template, apply_template_file};

/// Parse and render Markdown to LaTeX in one step.
///
/// The result is trimmed of surrounding whitespace.
///
/// # Example
///
/// ```rust
/// use markdown_latex::markdown_to_latex;
///
/// let latex = markdown_to_latex("**bold**", None).unwrap();
/// assert_eq!(latex, "\\textbf{bold}");
/// ```
pub fn markdown_to_latex(input: &str, config: Option<&LatexConfig>) -> Result<String> {
    let default = LatexConfig::default();
    let config = config.unwrap_or(&default);

    let doc = parse_with(input, config)?;
    let latex = render_document(&doc, config)?;
    Ok(latex.trim().to_string())
}
