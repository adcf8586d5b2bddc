//! Error types for the spec module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Every violation found in one validation pass.
///
/// The validator never stops at the first problem, so this error carries the
/// complete list and displays it one violation per line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .errors.join("\n"))]
pub struct SpecValidationError {
    errors: Vec<String>,
}

impl SpecValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    /// The individual violation messages, in discovery order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Errors that can occur during spec operations.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Spec file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },

    #[error("Spec validation failed:\n{0}")]
    Validation(#[from] SpecValidationError),

    #[error("Spec does not match the form model: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_one_violation_per_line() {
        let err = SpecValidationError::new(vec![
            "Missing top-level key: 'metadata'.".to_string(),
            "Duplicate field id: 'name'.".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing top-level key: 'metadata'.\nDuplicate field id: 'name'."
        );

        let wrapped = SpecError::from(err);
        assert!(wrapped.to_string().starts_with("Spec validation failed:\nMissing"));
        let source = std::error::Error::source(&wrapped).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("Missing top-level key: 'metadata'.\nDuplicate field id: 'name'."));
    }
}
