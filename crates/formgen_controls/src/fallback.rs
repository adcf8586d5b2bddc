//! Plain-text fallback for documents without automation.
//!
//! Markers are swapped for static glyphs in every paragraph, table cells
//! included. There is no uniqueness check: every occurrence is replaced
//! and absent markers are ignored.

use formgen_render::{FormDocument, Inline, Run};
use formgen_spec::{ControlKind, Placeholder};
use tracing::{debug, info};

/// Static stand-ins per control kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackGlyphs {
    pub checkbox: String,
    pub date: String,
    pub dropdown: String,
    pub signature: String,
    pub long_blank: String,
    pub short_blank: String,
}

impl Default for FallbackGlyphs {
    fn default() -> Self {
        Self {
            checkbox: "[ ]".to_string(),
            date: "__-__-____".to_string(),
            dropdown: "[Kies een optie]".to_string(),
            signature: "______________________________ (Handtekening)".to_string(),
            long_blank: "_".repeat(44),
            short_blank: "_".repeat(28),
        }
    }
}

impl FallbackGlyphs {
    pub fn for_control(&self, control: &ControlKind) -> &str {
        match control {
            ControlKind::Checkbox => &self.checkbox,
            ControlKind::Date => &self.date,
            ControlKind::Dropdown { .. } => &self.dropdown,
            ControlKind::SignatureLine => &self.signature,
            ControlKind::TextLong => &self.long_blank,
            ControlKind::TextShort => &self.short_blank,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackReport {
    /// Marker occurrences replaced.
    pub replacements: usize,
    pub paragraphs_changed: usize,
}

/// Replaces markers with [`FallbackGlyphs`].
#[derive(Debug, Clone, Default)]
pub struct FallbackFormatter {
    glyphs: FallbackGlyphs,
}

impl FallbackFormatter {
    pub fn new(glyphs: FallbackGlyphs) -> Self {
        Self { glyphs }
    }

    /// Substitute glyphs in place.
    ///
    /// A paragraph whose text changes is rewritten as a single run in the
    /// style of its first run.
    pub fn apply(&self, document: &mut FormDocument, placeholders: &[Placeholder]) -> FallbackReport {
        let replacements: Vec<(&str, &str)> = placeholders
            .iter()
            .map(|p| (p.marker.as_str(), self.glyphs.for_control(&p.control)))
            .collect();

        let mut report = FallbackReport::default();
        for paragraph in document.paragraphs_mut() {
            let original = paragraph.text();
            let mut updated = original.clone();
            for (marker, glyph) in &replacements {
                let count = updated.matches(marker).count();
                if count > 0 {
                    updated = updated.replace(marker, glyph);
                    report.replacements += count;
                }
            }

            if updated != original {
                let style = paragraph.first_run_style();
                paragraph.inlines = vec![Inline::Run(Run::new(updated, style))];
                report.paragraphs_changed += 1;
            }
        }

        debug!("Fallback changed {} paragraphs", report.paragraphs_changed);
        info!("Replaced {} markers with static text", report.replacements);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgen_render::{
        DocumentProperties, PageSetup, Paragraph, RunStyle, Table, TableCell, TableRow,
    };

    fn document(texts: &[&str]) -> FormDocument {
        let mut document = FormDocument::new(
            DocumentProperties::default(),
            PageSetup { margin_cm: 2.0 },
            RunStyle::default(),
        );
        document.add_table(Table {
            rows: texts
                .iter()
                .map(|text| TableRow {
                    cells: vec![TableCell {
                        shading: None,
                        paragraphs: vec![Paragraph::new()
                            .run(&text[..2], RunStyle::default().bold())
                            .run(&text[2..], RunStyle::default())],
                    }],
                })
                .collect(),
        });
        document
    }

    fn placeholders() -> Vec<Placeholder> {
        vec![
            Placeholder::new("when", "When", true, ControlKind::Date),
            Placeholder::new("pick", "Pick", false, ControlKind::Dropdown { options: vec![] }),
            Placeholder::new("notes", "Notes", false, ControlKind::TextLong),
        ]
    }

    #[test]
    fn test_glyphs_per_kind() {
        let mut doc = document(&["[[FIELD:when]]", "[[FIELD:pick]] and [[FIELD:notes]]"]);
        let report = FallbackFormatter::default().apply(&mut doc, &placeholders());

        let texts: Vec<String> = doc.paragraphs().iter().map(|p| p.text()).collect();
        assert_eq!(texts[0], "__-__-____");
        assert_eq!(texts[1], format!("[Kies een optie] and {}", "_".repeat(44)));
        assert_eq!(report.replacements, 3);
        assert_eq!(report.paragraphs_changed, 2);
    }

    #[test]
    fn test_rewritten_paragraph_keeps_first_run_style() {
        let mut doc = document(&["[[FIELD:when]] date"]);
        FallbackFormatter::default().apply(&mut doc, &placeholders());

        let paragraph = doc.paragraphs()[0];
        assert_eq!(paragraph.inlines.len(), 1);
        assert!(paragraph.first_run_style().bold);
    }

    #[test]
    fn test_duplicates_and_absent_markers_are_fine() {
        let mut doc = document(&["[[FIELD:when]] [[FIELD:when]]", "nothing here"]);
        let report = FallbackFormatter::default().apply(&mut doc, &placeholders());

        assert_eq!(report.replacements, 2);
        assert_eq!(doc.paragraphs()[1].text(), "nothing here");
        assert_eq!(doc.paragraphs()[1].inlines.len(), 2);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let mut doc = document(&["[[FIELD:when]]", "[[FIELD:notes]]"]);
        let formatter = FallbackFormatter::default();

        formatter.apply(&mut doc, &placeholders());
        let once = doc.clone();
        let report = formatter.apply(&mut doc, &placeholders());

        assert_eq!(report, FallbackReport::default());
        assert_eq!(doc, once);
    }
}
