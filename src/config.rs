//! Conversion configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! footnotes = true
//! image_timeout_secs = 10
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Placeholder replaced by the rendered document in a LaTeX template.
pub const DEFAULT_TEMPLATE_MARKER: &str = "INSERT-TEXT-HERE";

/// Options for parsing and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatexConfig {
    /// Lift `[^id]` footnotes into `\footnote{...}`.
    pub footnotes: bool,
    /// Treat a reference to an undefined footnote as an error.
    pub strict_footnotes: bool,
    /// Download images with an absolute URL source.
    pub fetch_remote_images: bool,
    /// Timeout for each image request, in seconds.
    pub image_timeout_secs: u64,
    /// Placeholder searched for by [`crate::apply_template`].
    pub template_marker: String,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            footnotes: false,
            strict_footnotes: false,
            fetch_remote_images: true,
            image_timeout_secs: 30,
            template_marker: DEFAULT_TEMPLATE_MARKER.to_string(),
        }
    }
}

impl LatexConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Per-request timeout for remote images.
    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}
