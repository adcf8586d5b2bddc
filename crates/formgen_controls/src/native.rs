//! In-process automation over the document model.
//!
//! Opens JSON snapshots written by the renderer and edits them directly.
//! The searchable text is every paragraph's text in reading order joined
//! with `\n`, so a match never spans two paragraphs. Saving to a `.docx`
//! path emits real structured document tags.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use formgen_render::{ContentControl, DocxWriter, FormDocument, Inline, Paragraph, Run};
use tracing::{debug, info};

use crate::automation::{
    AutomationChannel, ControlRequest, DocumentFormat, DocumentHandle, TextRange,
};
use crate::error::{ControlsError, ControlsResult};

/// Automation channel that needs no external host.
#[derive(Debug, Default)]
pub struct NativeAutomation {
    documents: HashMap<DocumentHandle, FormDocument>,
    next_handle: u32,
}

impl NativeAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently open.
    pub fn open_documents(&self) -> usize {
        self.documents.len()
    }

    fn document(&mut self, handle: DocumentHandle) -> ControlsResult<&mut FormDocument> {
        self.documents
            .get_mut(&handle)
            .ok_or_else(|| ControlsError::Automation(format!("unknown document handle {}", handle)))
    }
}

/// Searchable text of a document.
fn document_text(document: &FormDocument) -> String {
    document
        .paragraphs()
        .iter()
        .map(|paragraph| paragraph.text())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The paragraph containing `range`, and the range relative to it.
fn locate(
    document: &mut FormDocument,
    range: TextRange,
) -> ControlsResult<(&mut Paragraph, Range<usize>)> {
    let mut start = 0;
    for paragraph in document.paragraphs_mut() {
        let len = paragraph.text().len();
        if range.start >= start && range.end <= start + len && range.start <= range.end {
            return Ok((paragraph, range.start - start..range.end - start));
        }
        start += len + 1;
    }
    Err(ControlsError::Automation(format!(
        "range {}..{} does not lie within a single paragraph",
        range.start, range.end
    )))
}

fn next_control_id(document: &FormDocument) -> u32 {
    document
        .controls()
        .iter()
        .map(|control| control.id)
        .max()
        .unwrap_or(0)
        + 1
}

impl AutomationChannel for NativeAutomation {
    fn document_format(&self) -> DocumentFormat {
        DocumentFormat::Snapshot
    }

    fn open(&mut self, path: &Path) -> ControlsResult<DocumentHandle> {
        let document = FormDocument::load_snapshot(path)?;
        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.documents.insert(handle, document);
        debug!("Opened {:?} as {}", path, handle);
        Ok(handle)
    }

    fn search(
        &mut self,
        handle: DocumentHandle,
        text: &str,
        from: usize,
    ) -> ControlsResult<Option<TextRange>> {
        let haystack = document_text(self.document(handle)?);
        let found = haystack
            .get(from..)
            .and_then(|rest| rest.find(text))
            .map(|offset| TextRange::new(from + offset, from + offset + text.len()));
        Ok(found)
    }

    fn replace_text(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        text: &str,
    ) -> ControlsResult<()> {
        let (paragraph, local) = locate(self.document(handle)?, range)?;
        let style = paragraph.style_at(local.start);
        paragraph.splice(local, vec![Inline::Run(Run::new(text, style))]);
        Ok(())
    }

    fn insert_control(
        &mut self,
        handle: DocumentHandle,
        range: TextRange,
        request: &ControlRequest,
    ) -> ControlsResult<()> {
        let document = self.document(handle)?;
        let id = next_control_id(document);
        let (paragraph, local) = locate(document, range)?;
        let style = paragraph.style_at(local.start);

        paragraph.splice(
            local,
            vec![Inline::Control(ContentControl {
                id,
                title: request.title.clone(),
                tag: request.tag.clone(),
                properties: request.properties.clone(),
                placeholder_text: request.placeholder_text.clone(),
                style,
            })],
        );
        debug!("Inserted control {} for '{}'", id, request.tag);
        Ok(())
    }

    fn save_as(&mut self, handle: DocumentHandle, path: &Path) -> ControlsResult<()> {
        let document = self.document(handle)?;
        let is_snapshot = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(DocumentFormat::Snapshot.extension()))
            .unwrap_or(false);

        if is_snapshot {
            document.save_snapshot(path)?;
        } else {
            DocxWriter::write(document, path)?;
        }
        info!("Saved {} to {:?}", handle, path);
        Ok(())
    }

    fn close(&mut self, handle: DocumentHandle) -> ControlsResult<()> {
        self.documents
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| ControlsError::Automation(format!("unknown document handle {}", handle)))
    }

    fn quit(&mut self) -> ControlsResult<()> {
        self.documents.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgen_render::{
        ControlProperties, DocumentProperties, PageSetup, RunStyle, Table, TableCell, TableRow,
    };
    use tempfile::tempdir;

    fn snapshot(dir: &Path) -> std::path::PathBuf {
        let mut document = FormDocument::new(
            DocumentProperties::default(),
            PageSetup { margin_cm: 2.0 },
            RunStyle::default(),
        );
        document.add_paragraph(Paragraph::new().run("Intake", RunStyle::default().bold()));
        document.add_table(Table {
            rows: vec![TableRow {
                cells: vec![TableCell {
                    shading: None,
                    paragraphs: vec![
                        Paragraph::new().run("[[FIELD:name]]", RunStyle::default().italic()),
                        Paragraph::new().run("[[FIELD:pain]] Pain", RunStyle::default()),
                    ],
                }],
            }],
        });

        let path = dir.join("base.json");
        document.save_snapshot(&path).unwrap();
        path
    }

    fn checkbox(tag: &str) -> ControlRequest {
        ControlRequest {
            title: tag.to_string(),
            tag: tag.to_string(),
            properties: ControlProperties::Checkbox { checked: false },
            placeholder_text: String::new(),
        }
    }

    #[test]
    fn test_search_is_forward_only() {
        let temp = tempdir().unwrap();
        let mut channel = NativeAutomation::new();
        let handle = channel.open(&snapshot(temp.path())).unwrap();

        let first = channel.search(handle, "[[FIELD:name]]", 0).unwrap().unwrap();
        assert_eq!(first, TextRange::new(7, 21));
        assert!(channel.search(handle, "[[FIELD:name]]", first.end).unwrap().is_none());
        assert!(channel.search(handle, "Intake", 1).unwrap().is_none());
        assert!(channel.search(handle, "x", 10_000).unwrap().is_none());
    }

    #[test]
    fn test_insert_control_replaces_marker() {
        let temp = tempdir().unwrap();
        let mut channel = NativeAutomation::new();
        let handle = channel.open(&snapshot(temp.path())).unwrap();

        let range = channel.search(handle, "[[FIELD:pain]]", 0).unwrap().unwrap();
        channel.insert_control(handle, range, &checkbox("pain")).unwrap();

        let document = channel.document(handle).unwrap();
        let controls = document.controls();
        assert_eq!(controls.len(), 1);
        assert_eq!(controls[0].tag, "pain");
        assert_eq!(controls[0].id, 1);
        assert!(document_text(document).ends_with("\n Pain"));
    }

    #[test]
    fn test_replace_text_keeps_style() {
        let temp = tempdir().unwrap();
        let mut channel = NativeAutomation::new();
        let handle = channel.open(&snapshot(temp.path())).unwrap();

        let range = channel.search(handle, "[[FIELD:name]]", 0).unwrap().unwrap();
        channel.replace_text(handle, range, "____").unwrap();

        let document = channel.document(handle).unwrap();
        let paragraph = document.paragraphs()[1];
        assert_eq!(paragraph.text(), "____");
        assert!(paragraph.first_run_style().italic);
    }

    #[test]
    fn test_range_across_paragraphs_rejected() {
        let temp = tempdir().unwrap();
        let mut channel = NativeAutomation::new();
        let handle = channel.open(&snapshot(temp.path())).unwrap();

        let result = channel.replace_text(handle, TextRange::new(3, 12), "x");
        assert!(matches!(result, Err(ControlsError::Automation(_))));
    }

    #[test]
    fn test_save_and_close() {
        let temp = tempdir().unwrap();
        let mut channel = NativeAutomation::new();
        let handle = channel.open(&snapshot(temp.path())).unwrap();

        let out = temp.path().join("out").join("form.docx");
        channel.save_as(handle, &out).unwrap();
        assert!(out.is_file());

        channel.close(handle).unwrap();
        assert_eq!(channel.open_documents(), 0);
        assert!(channel.close(handle).is_err());
    }

    #[test]
    fn test_open_missing_snapshot() {
        let temp = tempdir().unwrap();
        let mut channel = NativeAutomation::new();
        assert!(channel.open(&temp.path().join("missing.json")).is_err());
    }
}
