//! Error types for control resolution.

use formgen_render::RenderError;
use thiserror::Error;

/// Result type alias for control operations.
pub type ControlsResult<T> = Result<T, ControlsError>;

/// Errors that can occur while resolving markers.
#[derive(Error, Debug)]
pub enum ControlsError {
    #[error("Document automation is not available: {0}")]
    Unavailable(String),

    #[error("Automation call failed: {0}")]
    Automation(String),

    #[error("Not all markers could be resolved:\n{}", .0.join("\n"))]
    UnresolvedMarkers(Vec<String>),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ControlsError {
    /// Whether the failure means no automation host could be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
