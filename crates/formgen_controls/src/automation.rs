//! Automation channel trait and types.
//!
//! A channel drives a word processor (or an in-process stand-in) through
//! a small, synchronous command set: open a document, search literal text,
//! edit found ranges, save and tear down.

use std::fmt;
use std::path::Path;

use formgen_render::ControlProperties;
use serde::{Deserialize, Serialize};

use crate::error::ControlsResult;

/// Opaque identifier of a document opened through a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(pub u32);

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open range of character offsets in a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Intermediate document format a channel opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// JSON snapshot of the document model.
    Snapshot,
    /// WordprocessingML package.
    Docx,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Snapshot => "json",
            Self::Docx => "docx",
        }
    }
}

/// A form control to insert in place of a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    /// Shown as the control's title.
    pub title: String,
    /// Machine-readable tag, the owning field or option id.
    pub tag: String,
    pub properties: ControlProperties,
    pub placeholder_text: String,
}

/// Synchronous document automation.
///
/// Offsets are only meaningful for the handle and document state they were
/// returned for; an edit may shift everything after it.
pub trait AutomationChannel {
    /// Format of the documents this channel can open.
    fn document_format(&self) -> DocumentFormat;

    /// Open a document.
    fn open(&mut self, path: &Path) -> ControlsResult<DocumentHandle>;

    /// Find the first literal occurrence of `text` at or after `from`.
    /// Never wraps around to the start.
    fn search(
        &mut self,
        handle: DocumentHandle,
        text: &str,
        from: usize,
    ) -> ControlsResult<Option<TextRange>>;

    /// Replace the text in `range` with plain text.
    fn replace_text(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        text: &str,
    ) -> ControlsResult<()>;

    /// Delete the text in `range` and insert a form control in its place.
    fn insert_control(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        request: &ControlRequest,
    ) -> ControlsResult<()>;

    /// Save the document under a new path.
    fn save_as(&mut self, handle: DocumentHandle, path: &Path) -> ControlsResult<()>;

    /// Close the document without saving.
    fn close(&mut self, handle: DocumentHandle) -> ControlsResult<()>;

    /// Shut down the automation host.
    fn quit(&mut self) -> ControlsResult<()>;
}

/// Builds a connected [`AutomationChannel`].
pub trait AutomationConnector {
    /// Connect to the automation host. Fails with
    /// [`ControlsError::Unavailable`](crate::ControlsError::Unavailable) when
    /// there is none.
    fn connect(&self) -> ControlsResult<Box<dyn AutomationChannel>>;
}

impl<F> AutomationConnector for F
where
    F: Fn() -> ControlsResult<Box<dyn AutomationChannel>>,
{
    fn connect(&self) -> ControlsResult<Box<dyn AutomationChannel>> {
        self()
    }
}
