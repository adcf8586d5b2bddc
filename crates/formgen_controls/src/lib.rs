//! # formgen_controls
//!
//! Turns the placeholder markers of a rendered form into its final fields.
//!
//! # Features
//!
//! - **Control Resolver**: replaces each marker with a native Word form
//!   control and fails on missing or repeated markers
//! - **Automation Channels**: in-process ([`NativeAutomation`]), helper
//!   process ([`BridgeAutomation`]) and [`MockAutomation`] for tests
//! - **Fallback Formatter**: static glyphs when no automation is available
//!
//! # Example
//!
//! ```rust,no_run
//! use formgen_controls::{ControlResolver, NativeAutomation};
//! use formgen_spec::{PlaceholderPlanner, SpecReader};
//! use std::path::Path;
//!
//! let spec = SpecReader::load_validated("forms/intake.json").unwrap();
//! let placeholders = PlaceholderPlanner::plan(&spec);
//!
//! let mut channel = NativeAutomation::new();
//! ControlResolver::default()
//!     .resolve(
//!         &mut channel,
//!         Path::new("work/base.json"),
//!         Path::new("output/intake.docx"),
//!         &placeholders,
//!     )
//!     .unwrap();
//! ```

pub mod automation;
pub mod bridge;
pub mod error;
pub mod fallback;
pub mod mock;
pub mod native;
pub mod resolver;

pub use automation::{
    AutomationChannel, AutomationConnector, ControlRequest, DocumentFormat, DocumentHandle,
    TextRange,
};
pub use bridge::BridgeAutomation;
pub use error::{ControlsError, ControlsResult};
pub use fallback::{FallbackFormatter, FallbackGlyphs, FallbackReport};
pub use mock::{CapturedCall, MockAutomation, MockControl, MockDocument};
pub use native::NativeAutomation;
pub use resolver::{ControlResolver, ControlText, Replacement, ResolveReport};
