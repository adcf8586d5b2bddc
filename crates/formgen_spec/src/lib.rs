//! # formgen_spec
//!
//! Form specification loading, validation and placeholder planning.
//!
//! A form specification is a JSON document describing the branding, layout
//! and sections of an intake form. This crate:
//!
//! - **Validates** the untyped document and reports every violation at once
//! - **Models** the validated document with typed field kinds
//! - **Plans** one placeholder marker per fillable unit of the form
//!
//! ## Example
//!
//! ```rust,no_run
//! use formgen_spec::{PlaceholderPlanner, SpecReader};
//!
//! let spec = SpecReader::load_validated("forms/intake.json").unwrap();
//! for placeholder in PlaceholderPlanner::plan(&spec) {
//!     println!("{} -> {}", placeholder.marker, placeholder.control);
//! }
//! ```

pub mod error;
pub mod models;
pub mod placeholder;
pub mod reader;
pub mod validator;

pub use error::{SpecError, SpecResult, SpecValidationError};
pub use models::*;
pub use placeholder::{
    field_id_from_marker, is_marker_safe_id, marker_for, ControlKind, Placeholder,
    PlaceholderPlanner,
};
pub use reader::SpecReader;
pub use validator::{is_hex_color, SpecValidator, ValidationReport};
