//! Spec file reading utilities.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{SpecError, SpecResult};
use crate::models::FormSpecification;
use crate::validator::SpecValidator;

/// Reader for spec files.
pub struct SpecReader;

impl SpecReader {
    /// Read and parse a spec file without validating it.
    pub fn load(path: impl AsRef<Path>) -> SpecResult<Value> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SpecError::NotFound(path.to_path_buf()));
        }
        debug!("Reading spec from {:?}", path);

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SpecError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read, validate and convert a spec file into the typed model.
    pub fn load_validated(path: impl AsRef<Path>) -> SpecResult<FormSpecification> {
        let value = Self::load(path)?;
        Self::from_value(value)
    }

    /// Validate an already parsed document and convert it.
    pub fn from_value(value: Value) -> SpecResult<FormSpecification> {
        let report = SpecValidator::validate(&value)?;
        for warning in &report.warnings {
            warn!("{}", warning);
        }
        FormSpecification::from_value(value)
    }
}
