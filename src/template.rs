//! Insertion of rendered LaTeX into a document template.

use crate::error::{RenderError, Result};
use std::path::Path;

/// Replace the first `marker` in `template` with `latex`.
///
/// # Examples
///
/// ```
/// use markdown_latex::apply_template;
///
/// let doc = apply_template("\\begin{document}\nBODY\n\\end{document}", "Hi", "BODY").unwrap();
/// assert_eq!(doc, "\\begin{document}\nHi\n\\end{document}");
/// ```
pub fn apply_template(template: &str, latex: &str, marker: &str) -> Result<String> {
    if marker.is_empty() || !template.contains(marker) {
        return Err(RenderError::Template(format!(
            "template does not contain the marker {:?}",
            marker
        ))
        .into());
    }
    Ok(template.replacen(marker, latex, 1))
}

/// Read a template file and insert `latex` at `marker`.
pub fn apply_template_file(path: impl AsRef<Path>, latex: &str, marker: &str) -> Result<String> {
    let template = std::fs::read_to_string(path)?;
    apply_template(&template, latex, marker)
}
