//! Marker resolution into interactive form controls.
//!
//! Each planned placeholder must occur exactly once in the base document.
//! Unique markers are replaced as they are found; every marker that is
//! missing or repeated is collected, and the run fails with all of them
//! before anything is saved.

use std::fs;
use std::path::Path;

use formgen_render::{ControlProperties, ListEntry};
use formgen_spec::{ControlKind, Placeholder};
use tracing::{debug, info, warn};

use crate::automation::{AutomationChannel, ControlRequest, DocumentHandle, TextRange};
use crate::error::{ControlsError, ControlsResult};

/// Document wording used for controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlText {
    /// First, non-answer entry of every dropdown.
    pub dropdown_prompt: String,
    /// Printed in place of a signature marker.
    pub signature_line: String,
    pub text_prompt: String,
    pub date_prompt: String,
    pub date_format: String,
    /// Windows locale id of the date picker.
    pub date_locale: u32,
}

impl Default for ControlText {
    fn default() -> Self {
        Self {
            dropdown_prompt: "Kies een optie".to_string(),
            signature_line: "______________________________ (Handtekening)".to_string(),
            text_prompt: "Klik of tik om tekst in te voeren.".to_string(),
            date_prompt: "Klik of tik om een datum in te voeren.".to_string(),
            date_format: "dd-MM-yyyy".to_string(),
            date_locale: 1043,
        }
    }
}

/// What a successful resolution did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub controls_inserted: usize,
    pub text_replaced: usize,
}

/// Edit performed for one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    Control(ControlRequest),
    Text(String),
}

/// Closes the document and quits the host however resolution ends.
struct Session<'a> {
    channel: &'a mut dyn AutomationChannel,
    handle: Option<DocumentHandle>,
}

impl<'a> Session<'a> {
    fn open(channel: &'a mut dyn AutomationChannel, path: &Path) -> ControlsResult<Self> {
        let mut session = Self {
            channel,
            handle: None,
        };
        // on failure the guard still quits the host
        session.handle = Some(session.channel.open(path)?);
        Ok(session)
    }

    fn handle(&self) -> ControlsResult<DocumentHandle> {
        self.handle
            .ok_or_else(|| ControlsError::Automation("no document open".to_string()))
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.channel.close(handle) {
                warn!("Failed to close document {}: {}", handle, e);
            }
        }
        if let Err(e) = self.channel.quit() {
            warn!("Failed to quit automation host: {}", e);
        }
    }
}

/// Replaces planned markers with Word form controls.
#[derive(Debug, Clone, Default)]
pub struct ControlResolver {
    text: ControlText,
}

impl ControlResolver {
    pub fn new(text: ControlText) -> Self {
        Self { text }
    }

    /// The edit a placeholder's marker is resolved into.
    pub fn replacement_for(&self, placeholder: &Placeholder) -> Replacement {
        let properties = match &placeholder.control {
            ControlKind::SignatureLine => {
                return Replacement::Text(self.text.signature_line.clone());
            }
            ControlKind::TextShort => ControlProperties::PlainText { multiline: false },
            ControlKind::TextLong => ControlProperties::RichText,
            ControlKind::Checkbox => ControlProperties::Checkbox { checked: false },
            ControlKind::Dropdown { options } => ControlProperties::DropdownList {
                entries: self.dropdown_entries(&placeholder.field_id, options),
            },
            ControlKind::Date => ControlProperties::Date {
                format: self.text.date_format.clone(),
                locale_id: self.text.date_locale,
            },
        };

        let placeholder_text = match &placeholder.control {
            ControlKind::Dropdown { .. } => self.text.dropdown_prompt.clone(),
            ControlKind::Date => self.text.date_prompt.clone(),
            ControlKind::Checkbox => String::new(),
            _ => self.text.text_prompt.clone(),
        };

        Replacement::Control(ControlRequest {
            title: placeholder.label.clone(),
            tag: placeholder.field_id.clone(),
            properties,
            placeholder_text,
        })
    }

    /// Prompt keyed `<id>_0`, then the options keyed from `<id>_2` upward.
    fn dropdown_entries(&self, field_id: &str, options: &[String]) -> Vec<ListEntry> {
        let prompt = ListEntry {
            text: self.text.dropdown_prompt.clone(),
            value: format!("{}_0", field_id),
        };
        std::iter::once(prompt)
            .chain(options.iter().enumerate().map(|(index, option)| ListEntry {
                text: option.clone(),
                value: format!("{}_{}", field_id, index + 2),
            }))
            .collect()
    }

    /// Open `source`, resolve every placeholder and save to `output`.
    ///
    /// The document is closed and the host quit on every path. Nothing is
    /// saved when any marker is missing or repeated.
    pub fn resolve(
        &self,
        channel: &mut dyn AutomationChannel,
        source: &Path,
        output: &Path,
        placeholders: &[Placeholder],
    ) -> ControlsResult<ResolveReport> {
        let session = Session::open(channel, source)?;
        let handle = session.handle()?;
        let mut report = ResolveReport::default();
        let mut errors = Vec::new();

        for placeholder in placeholders {
            let matches = find_all(session.channel, handle, &placeholder.marker)?;
            match matches.as_slice() {
                [] => errors.push(format!("marker not found: {}", placeholder.marker)),
                [range] => {
                    self.apply(session.channel, handle, *range, placeholder, &mut report)?;
                }
                many => errors.push(format!(
                    "marker occurred {} times: {}",
                    many.len(),
                    placeholder.marker
                )),
            }
        }

        if !errors.is_empty() {
            return Err(ControlsError::UnresolvedMarkers(errors));
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        session.channel.save_as(handle, output)?;
        info!(
            "Resolved {} controls and {} text replacements into {:?}",
            report.controls_inserted, report.text_replaced, output
        );
        Ok(report)
    }

    fn apply(
        &self,
        channel: &mut dyn AutomationChannel,
        handle: DocumentHandle,
        range: TextRange,
        placeholder: &Placeholder,
        report: &mut ResolveReport,
    ) -> ControlsResult<()> {
        match self.replacement_for(placeholder) {
            Replacement::Control(request) => {
                channel.insert_control(handle, range, &request)?;
                report.controls_inserted += 1;
            }
            Replacement::Text(text) => {
                channel.replace_text(handle, range, &text)?;
                report.text_replaced += 1;
            }
        }
        debug!("Resolved {} as {}", placeholder.marker, placeholder.control);
        Ok(())
    }
}

/// Every occurrence of `marker`, scanning forward without wrapping.
fn find_all(
    channel: &mut dyn AutomationChannel,
    handle: DocumentHandle,
    marker: &str,
) -> ControlsResult<Vec<TextRange>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(range) = channel.search(handle, marker, cursor)? {
        cursor = range.end.max(cursor + 1);
        found.push(range);
    }
    Ok(found)
}
