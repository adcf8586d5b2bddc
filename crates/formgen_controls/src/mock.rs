//! Mock automation channel for testing.
//!
//! Documents are plain strings. Every call is captured, inserted controls
//! are recorded with their position, and any method can be made to fail.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use formgen_render::FormDocument;
use parking_lot::RwLock;

use crate::automation::{
    AutomationChannel, ControlRequest, DocumentFormat, DocumentHandle, TextRange,
};
use crate::error::{ControlsError, ControlsResult};

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCall {
    pub method: String,
    pub handle: Option<DocumentHandle>,
    pub text: Option<String>,
    pub path: Option<PathBuf>,
}

impl CapturedCall {
    fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            handle: None,
            text: None,
            path: None,
        }
    }

    fn handle(mut self, handle: DocumentHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

/// A control the mock inserted, at the offset where the marker was.
#[derive(Debug, Clone, PartialEq)]
pub struct MockControl {
    pub offset: usize,
    pub request: ControlRequest,
}

/// State of a mock document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockDocument {
    pub text: String,
    pub controls: Vec<MockControl>,
}

/// Mock automation channel.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the code under test owns another.
#[derive(Clone)]
pub struct MockAutomation {
    format: DocumentFormat,
    /// Seeded document text by path.
    sources: Arc<RwLock<HashMap<PathBuf, String>>>,
    open: Arc<RwLock<HashMap<DocumentHandle, MockDocument>>>,
    saved: Arc<RwLock<HashMap<PathBuf, MockDocument>>>,
    next_handle: Arc<AtomicU32>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Method name and message of a simulated failure.
    fail_on: Arc<RwLock<Option<(String, String)>>>,
}

impl Default for MockAutomation {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAutomation {
    pub fn new() -> Self {
        Self {
            format: DocumentFormat::Snapshot,
            sources: Arc::new(RwLock::new(HashMap::new())),
            open: Arc::new(RwLock::new(HashMap::new())),
            saved: Arc::new(RwLock::new(HashMap::new())),
            next_handle: Arc::new(AtomicU32::new(1)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            fail_on: Arc::new(RwLock::new(None)),
        }
    }

    /// Report a different intermediate format.
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    /// Serve `text` when `path` is opened.
    ///
    /// Paths without seeded text are read as document snapshots, with
    /// paragraphs joined by `\n`.
    pub fn with_document(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.sources.write().insert(path.into(), text.into());
        self
    }

    /// Make every call to `method` fail with `message`.
    pub fn simulate_failure(self, method: &str, message: impl Into<String>) -> Self {
        *self.fail_on.write() = Some((method.to_string(), message.into()));
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls.read().iter().any(|c| c.method == method)
    }

    /// Document saved under `path`, if any.
    pub fn saved_document(&self, path: &Path) -> Option<MockDocument> {
        self.saved.read().get(path).cloned()
    }

    /// Number of documents opened and not yet closed.
    pub fn open_documents(&self) -> usize {
        self.open.read().len()
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn check_failure(&self, method: &str) -> ControlsResult<()> {
        match self.fail_on.read().as_ref() {
            Some((failing, message)) if failing == method => {
                Err(ControlsError::Automation(message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn with_open<T>(
        &self,
        handle: DocumentHandle,
        f: impl FnOnce(&mut MockDocument) -> ControlsResult<T>,
    ) -> ControlsResult<T> {
        let mut open = self.open.write();
        let document = open
            .get_mut(&handle)
            .ok_or_else(|| ControlsError::Automation(format!("unknown document handle {}", handle)))?;
        f(document)
    }

    fn load_source(&self, path: &Path) -> ControlsResult<String> {
        if let Some(text) = self.sources.read().get(path) {
            return Ok(text.clone());
        }
        let document = FormDocument::load_snapshot(path)?;
        Ok(document
            .paragraphs()
            .iter()
            .map(|paragraph| paragraph.text())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn checked_range(document: &MockDocument, range: TextRange) -> ControlsResult<()> {
    let valid = range.start <= range.end
        && document.text.is_char_boundary(range.start)
        && document.text.is_char_boundary(range.end)
        && range.end <= document.text.len();
    if valid {
        Ok(())
    } else {
        Err(ControlsError::Automation(format!(
            "range {}..{} is outside the document",
            range.start, range.end
        )))
    }
}

impl AutomationChannel for MockAutomation {
    fn document_format(&self) -> DocumentFormat {
        self.format
    }

    fn open(&mut self, path: &Path) -> ControlsResult<DocumentHandle> {
        self.record_call(CapturedCall::new("open").path(path));
        self.check_failure("open")?;

        let text = self.load_source(path)?;
        let handle = DocumentHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.open.write().insert(
            handle,
            MockDocument {
                text,
                controls: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn search(
        &mut self,
        handle: DocumentHandle,
        text: &str,
        from: usize,
    ) -> ControlsResult<Option<TextRange>> {
        self.record_call(CapturedCall::new("search").handle(handle).text(text));
        self.check_failure("search")?;

        self.with_open(handle, |document| {
            Ok(document
                .text
                .get(from..)
                .and_then(|rest| rest.find(text))
                .map(|offset| TextRange::new(from + offset, from + offset + text.len())))
        })
    }

    fn replace_text(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        text: &str,
    ) -> ControlsResult<()> {
        self.record_call(CapturedCall::new("replace_text").handle(handle).text(text));
        self.check_failure("replace_text")?;

        self.with_open(handle, |document| {
            checked_range(document, range)?;
            document.text.replace_range(range.start..range.end, text);
            Ok(())
        })
    }

    fn insert_control(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        request: &ControlRequest,
    ) -> ControlsResult<()> {
        self.record_call(
            CapturedCall::new("insert_control")
                .handle(handle)
                .text(request.tag.clone()),
        );
        self.check_failure("insert_control")?;

        self.with_open(handle, |document| {
            checked_range(document, range)?;
            document.text.replace_range(range.start..range.end, "");
            document.controls.push(MockControl {
                offset: range.start,
                request: request.clone(),
            });
            Ok(())
        })
    }

    fn save_as(&mut self, handle: DocumentHandle, path: &Path) -> ControlsResult<()> {
        self.record_call(CapturedCall::new("save_as").handle(handle).path(path));
        self.check_failure("save_as")?;

        let document = self.with_open(handle, |document| Ok(document.clone()))?;
        self.saved.write().insert(path.to_path_buf(), document);
        Ok(())
    }

    fn close(&mut self, handle: DocumentHandle) -> ControlsResult<()> {
        self.record_call(CapturedCall::new("close").handle(handle));
        self.check_failure("close")?;

        self.open
            .write()
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| ControlsError::Automation(format!("unknown document handle {}", handle)))
    }

    fn quit(&mut self) -> ControlsResult<()> {
        self.record_call(CapturedCall::new("quit"));
        self.check_failure("quit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgen_render::ControlProperties;

    #[test]
    fn test_mock_edits_text() {
        let mut mock = MockAutomation::new().with_document("base.json", "a [[FIELD:x]] b");
        let handle = mock.open(Path::new("base.json")).unwrap();

        let range = mock.search(handle, "[[FIELD:x]]", 0).unwrap().unwrap();
        mock.insert_control(
            handle,
            range,
            &ControlRequest {
                title: "X".to_string(),
                tag: "x".to_string(),
                properties: ControlProperties::RichText,
                placeholder_text: String::new(),
            },
        )
        .unwrap();
        mock.save_as(handle, Path::new("out.docx")).unwrap();

        let saved = mock.saved_document(Path::new("out.docx")).unwrap();
        assert_eq!(saved.text, "a  b");
        assert_eq!(saved.controls[0].offset, 2);
        assert_eq!(mock.get_method_calls("search").len(), 1);
    }

    #[test]
    fn test_simulated_failure_is_captured() {
        let mut mock = MockAutomation::new()
            .with_document("base.json", "text")
            .simulate_failure("open", "word crashed");

        let error = mock.open(Path::new("base.json")).unwrap_err();
        assert_eq!(error.to_string(), "Automation call failed: word crashed");
        assert!(mock.was_called("open"));
        assert_eq!(mock.open_documents(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let observer = MockAutomation::new().with_document("base.json", "text");
        let mut channel = observer.clone();

        let handle = channel.open(Path::new("base.json")).unwrap();
        channel.close(handle).unwrap();

        assert_eq!(observer.get_calls().len(), 2);
        assert!(channel.replace_text(handle, TextRange::new(0, 1), "x").is_err());
    }
}
