//! # formgen_render
//!
//! Renders a validated form specification into a branded document.
//!
//! - [`DocumentRenderer`] builds the static [`FormDocument`], printing one
//!   placeholder marker per fillable unit
//! - [`FormDocument`] is a small WordprocessingML-shaped model that can be
//!   edited in place and stored as a JSON snapshot
//! - [`DocxWriter`] packages the model as a `.docx` file
//!
//! ## Example
//!
//! ```rust,no_run
//! use formgen_render::{DocumentRenderer, DocxWriter};
//! use formgen_spec::{PlaceholderPlanner, SpecReader};
//! use std::path::Path;
//!
//! let spec = SpecReader::load_validated("forms/intake.json").unwrap();
//! let placeholders = PlaceholderPlanner::plan(&spec);
//! let document = DocumentRenderer::default()
//!     .render(&spec, Path::new("forms/assets/logo.png"), &placeholders)
//!     .unwrap();
//! DocxWriter::write(&document, Path::new("output/base.docx")).unwrap();
//! ```

pub mod color;
pub mod document;
pub mod docx;
pub mod error;
pub mod image;
pub mod renderer;

pub use color::HexColor;
pub use document::{
    Alignment, Block, ContentControl, ControlProperties, DocumentProperties, FormDocument,
    ImageRef, Inline, ListEntry, MediaFile, PageSetup, Paragraph, Run, RunStyle, Table, TableCell,
    TableRow,
};
pub use docx::{locale_tag, DocxWriter};
pub use error::{RenderError, RenderResult};
pub use renderer::{DocumentRenderer, RenderText};
