//! Error types for the markdown-latex library.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while parsing Markdown source or literal markup islands.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A literal table, image, or link fragment that is not balanced markup.
    #[error("Malformed markup at byte {offset}: {message}")]
    Markup { offset: usize, message: String },
}

/// Errors that occur while resolving document-level references.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Undefined footnote: {0}")]
    UndefinedFootnote(String),
}

/// Errors that occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid value {value:?} for attribute `{name}` on <{tag}>")]
    InvalidAttribute {
        tag: String,
        name: String,
        value: String,
    },

    #[error("Template error: {0}")]
    Template(String),
}
