//! Error types for the core module.

use std::path::PathBuf;

use formgen_controls::ControlsError;
use formgen_render::RenderError;
use formgen_spec::{SpecError, SpecValidationError};
use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while generating a form.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Logo not found. Requested: '{requested}'. Checked paths: {}", format_paths(.checked))]
    LogoNotFound {
        requested: String,
        checked: Vec<PathBuf>,
    },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: String, message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigValue { key: String, message: String },

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Controls(#[from] ControlsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SpecValidationError> for CoreError {
    fn from(err: SpecValidationError) -> Self {
        Self::Spec(SpecError::Validation(err))
    }
}

impl CoreError {
    /// Whether the error points at a bug rather than bad input or a
    /// missing resource.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Render(RenderError::MissingPlaceholder(_) | RenderError::Snapshot(_))
                | Self::Controls(ControlsError::Json(_))
        )
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
