//! # formgen_core
//!
//! Generation pipeline for formgen.
//!
//! Ties the specification, rendering and control crates together into a
//! single run: one specification in, one `.docx` out.
//!
//! # Architecture
//!
//! - **Config**: TOML configuration with defaults for every key
//! - **Logo**: lookup of the branding logo relative to the spec
//! - **Pipeline**: the [`Generator`] and its outcomes
//!
//! # Example
//!
//! ```rust,no_run
//! use formgen_core::{GenerationRequest, Generator, GeneratorConfig};
//! use std::path::Path;
//!
//! let config = GeneratorConfig::load(Path::new("."), None).unwrap();
//! let generator = Generator::new(config, ".");
//! let request = GenerationRequest::new("forms/intake.json", "output/intake.docx");
//! let outcome = generator.run(&request).unwrap();
//! println!("{:?}", outcome);
//! ```

pub mod config;
pub mod error;
pub mod logo;
pub mod pipeline;

pub use config::{AutomationConfig, Engine, GeneratorConfig, TextConfig};
pub use error::{CoreError, CoreResult};
pub use logo::resolve_logo_path;
pub use pipeline::{
    connector_for, FallbackReason, GenerationOutcome, GenerationRequest, Generator,
};
