//! Error types for rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering or packaging a document.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No placeholder planned for field '{0}'")]
    MissingPlaceholder(String),

    #[error("Image not readable at {path}: {message}")]
    Image { path: PathBuf, message: String },

    #[error("Document snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Packaging error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
