//! Static form rendering.
//!
//! Builds the branded base document: a header block followed by one table
//! per section. Every fillable unit is printed as its placeholder marker so
//! a later pass can turn it into a control or a static blank.

use std::collections::HashMap;
use std::path::Path;

use formgen_spec::{Branding, Field, FieldKind, FormSpecification, Placeholder, Section};
use tracing::{debug, info};

use crate::color::HexColor;
use crate::document::{
    DocumentProperties, FormDocument, ImageRef, Inline, PageSetup, Paragraph, RunStyle, Table,
    TableCell, TableRow,
};
use crate::error::{RenderError, RenderResult};
use crate::image;

const BODY_SIZE_PT: f64 = 10.5;
const LOGO_WIDTH_CM: f64 = 3.0;
const OPTION_INDENT_CM: f64 = 0.35;
const DIVIDER_WIDTH: usize = 72;

/// Fixed document wording that is not part of the form specification.
#[derive(Debug, Clone)]
pub struct RenderText {
    /// Label of the row holding a single checkbox's help text.
    pub explanation_title: String,
    /// Italic notice printed under the practice details.
    pub confidential_note: String,
}

impl Default for RenderText {
    fn default() -> Self {
        Self {
            explanation_title: "Toelichting".to_string(),
            confidential_note:
                "Dit formulier is vertrouwelijk en bedoeld voor intake en veilige behandelaanpassing."
                    .to_string(),
        }
    }
}

/// Resolved branding palette, with the renderer's fallback colors applied.
struct Palette {
    primary: HexColor,
    secondary: HexColor,
    accent: HexColor,
    surface: HexColor,
    text: HexColor,
    heading_font: String,
    body_font: String,
}

impl Palette {
    fn from_branding(branding: &Branding) -> Self {
        Self {
            primary: HexColor::or(&branding.primary_color, "#17372c"),
            secondary: HexColor::or(&branding.secondary_color, "#2d5647"),
            accent: HexColor::or(&branding.accent_color, "#c99642"),
            surface: HexColor::or(&branding.surface_color, "#ffffff"),
            text: HexColor::or(&branding.text_color, "#1f332c"),
            heading_font: branding.heading_font.clone(),
            body_font: branding.body_font.clone(),
        }
    }

    fn body(&self, size_pt: f64) -> RunStyle {
        RunStyle::new(&self.body_font, size_pt)
    }

    fn heading(&self, size_pt: f64) -> RunStyle {
        RunStyle::new(&self.heading_font, size_pt)
    }
}

/// Renders a validated specification into a [`FormDocument`].
pub struct DocumentRenderer {
    text: RenderText,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(RenderText::default())
    }
}

impl DocumentRenderer {
    pub fn new(text: RenderText) -> Self {
        Self { text }
    }

    /// Render the base document.
    ///
    /// Each placeholder's marker is written exactly once. A fillable field
    /// without a planned placeholder is an error.
    pub fn render(
        &self,
        spec: &FormSpecification,
        logo_path: &Path,
        placeholders: &[Placeholder],
    ) -> RenderResult<FormDocument> {
        let palette = Palette::from_branding(&spec.branding);
        let markers: HashMap<&str, &str> = placeholders
            .iter()
            .map(|p| (p.field_id.as_str(), p.marker.as_str()))
            .collect();

        let mut document = FormDocument::new(
            DocumentProperties {
                title: spec.metadata.title.clone(),
                subject: spec.metadata.subtitle.clone(),
                creator: spec.metadata.practitioner.clone(),
            },
            PageSetup {
                margin_cm: spec.document_layout.margin_cm,
            },
            palette.body(BODY_SIZE_PT).color(palette.text.clone()),
        );

        self.add_header(&mut document, spec, &palette, logo_path)?;

        for section in &spec.sections {
            let table = self.section_table(section, &palette, &markers)?;
            document.add_table(table);
            document.add_paragraph(Paragraph::new().space_after(spec.document_layout.section_spacing_pt));
        }

        info!(
            "Rendered {} sections with {} markers",
            spec.sections.len(),
            placeholders.len()
        );
        Ok(document)
    }

    fn add_header(
        &self,
        document: &mut FormDocument,
        spec: &FormSpecification,
        palette: &Palette,
        logo_path: &Path,
    ) -> RenderResult<()> {
        let metadata = &spec.metadata;

        let (width_px, height_px) = image::dimensions(logo_path)?;
        let media_index = document.add_media(logo_path);
        let mut logo = Paragraph::new().centered();
        logo.push(Inline::Image(ImageRef {
            media_index,
            width_cm: LOGO_WIDTH_CM,
            height_cm: LOGO_WIDTH_CM * height_px as f64 / width_px.max(1) as f64,
        }));
        document.add_paragraph(logo);

        document.add_paragraph(Paragraph::new().centered().run(
            &metadata.title,
            palette.heading(24.0).bold().color(palette.primary.clone()),
        ));
        document.add_paragraph(Paragraph::new().centered().run(
            &metadata.subtitle,
            palette.body(11.0).italic().color(palette.secondary.clone()),
        ));
        document.add_paragraph(Paragraph::new().centered().run(
            metadata.contact_line(),
            palette.body(10.0).color(palette.text.clone()),
        ));
        document.add_paragraph(Paragraph::new().centered().run(
            &self.text.confidential_note,
            palette.body(9.5).italic().color(palette.accent.clone()),
        ));
        document.add_paragraph(Paragraph::new().centered().run(
            "_".repeat(DIVIDER_WIDTH),
            palette.body(9.0).color(palette.secondary.clone()),
        ));
        document.add_paragraph(Paragraph::new());
        Ok(())
    }

    fn section_table(
        &self,
        section: &Section,
        palette: &Palette,
        markers: &HashMap<&str, &str>,
    ) -> RenderResult<Table> {
        let mut rows = Vec::new();

        let mut title = TableCell::shaded(palette.primary.clone());
        title.paragraphs.push(
            Paragraph::new()
                .spacing(3.0, 3.0)
                .run(&section.title, palette.heading(13.0).bold().color(HexColor::white())),
        );
        rows.push(title);

        if let Some(description) = section.description.as_deref().filter(|d| !d.is_empty()) {
            let mut cell = TableCell::shaded(palette.surface.clone());
            cell.paragraphs.push(
                Paragraph::new()
                    .spacing(2.0, 2.0)
                    .run(description, palette.body(10.0).italic().color(palette.secondary.clone())),
            );
            rows.push(cell);
        }

        for field in &section.fields {
            self.field_rows(field, palette, markers, &mut rows)?;
        }

        debug!("Section '{}' rendered as {} rows", section.id, rows.len());
        Ok(Table {
            rows: rows
                .into_iter()
                .map(|cell| TableRow { cells: vec![cell] })
                .collect(),
        })
    }

    fn field_rows(
        &self,
        field: &Field,
        palette: &Palette,
        markers: &HashMap<&str, &str>,
        rows: &mut Vec<TableCell>,
    ) -> RenderResult<()> {
        let marker_of = |id: &str| -> RenderResult<String> {
            markers
                .get(id)
                .map(|marker| marker.to_string())
                .ok_or_else(|| RenderError::MissingPlaceholder(id.to_string()))
        };

        match &field.kind {
            FieldKind::InfoBlock => {
                rows.push(label_cell(&field.label, false, &field.help_text, palette));
            }
            FieldKind::CheckboxGroup { options } => {
                rows.push(label_cell(&field.label, field.required, &field.help_text, palette));
                for option in options {
                    let text = format!("{} {}", marker_of(&option.id)?, option.label);
                    rows.push(marker_cell(text, palette, Some(OPTION_INDENT_CM)));
                }
            }
            FieldKind::Checkbox => {
                let required = if field.required { " *" } else { "" };
                let text = format!("{} {}{}", marker_of(&field.id)?, field.label, required);
                rows.push(marker_cell(text, palette, None));
                if !field.help_text.is_empty() {
                    rows.push(label_cell(
                        &self.text.explanation_title,
                        false,
                        &field.help_text,
                        palette,
                    ));
                }
            }
            _ => {
                rows.push(label_cell(&field.label, field.required, &field.help_text, palette));
                rows.push(marker_cell(marker_of(&field.id)?, palette, None));
            }
        }
        Ok(())
    }
}

fn label_cell(label: &str, required: bool, help_text: &str, palette: &Palette) -> TableCell {
    let mut paragraph = Paragraph::new()
        .spacing(2.0, 1.0)
        .run(label, palette.body(BODY_SIZE_PT).bold().color(palette.text.clone()));

    if required {
        paragraph = paragraph.run(" *", palette.body(BODY_SIZE_PT).bold().color(palette.accent.clone()));
    }
    if !help_text.is_empty() {
        paragraph = paragraph.run(
            format!("\n{}", help_text),
            palette.body(9.0).italic().color(palette.secondary.clone()),
        );
    }

    let mut cell = TableCell::shaded(palette.surface.clone());
    cell.paragraphs.push(paragraph);
    cell
}

fn marker_cell(text: String, palette: &Palette, indent_cm: Option<f64>) -> TableCell {
    let mut paragraph = Paragraph::new()
        .spacing(1.0, 4.0)
        .run(text, palette.body(BODY_SIZE_PT).color(palette.text.clone()));
    if let Some(indent) = indent_cm {
        paragraph = paragraph.indent(indent);
    }

    let mut cell = TableCell::shaded(HexColor::white());
    cell.paragraphs.push(paragraph);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgen_spec::{CheckOption, DocumentLayout, Metadata, PlaceholderPlanner};
    use std::fs;
    use tempfile::tempdir;

    pub(crate) fn tiny_png(path: &Path) {
        // 1x1 transparent PNG
        let bytes: [u8; 67] = [
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ];
        fs::write(path, bytes).unwrap();
    }

    fn spec() -> FormSpecification {
        FormSpecification {
            metadata: Metadata {
                title: "Intake".to_string(),
                subtitle: "Anamnesis".to_string(),
                practice_name: "Practice".to_string(),
                ..Default::default()
            },
            branding: Branding {
                primary_color: "#17372c".to_string(),
                secondary_color: "#2d5647".to_string(),
                accent_color: "#c99642".to_string(),
                surface_color: "#f4f1ea".to_string(),
                text_color: "#1f332c".to_string(),
                heading_font: "Georgia".to_string(),
                body_font: "Calibri".to_string(),
                logo_path: "logo.png".to_string(),
            },
            document_layout: DocumentLayout::default(),
            sections: vec![Section {
                id: "main".to_string(),
                title: "Main".to_string(),
                description: Some("About you".to_string()),
                fields: vec![
                    Field {
                        id: "intro".to_string(),
                        label: "Welcome".to_string(),
                        required: true,
                        help_text: "Please read".to_string(),
                        kind: FieldKind::InfoBlock,
                    },
                    Field {
                        id: "name".to_string(),
                        label: "Name".to_string(),
                        required: true,
                        help_text: String::new(),
                        kind: FieldKind::TextShort,
                    },
                    Field {
                        id: "consent".to_string(),
                        label: "I agree".to_string(),
                        required: true,
                        help_text: "Needed for treatment".to_string(),
                        kind: FieldKind::Checkbox,
                    },
                    Field {
                        id: "symptoms".to_string(),
                        label: "Symptoms".to_string(),
                        required: false,
                        help_text: String::new(),
                        kind: FieldKind::CheckboxGroup {
                            options: vec![
                                CheckOption { id: "pain".to_string(), label: "Pain".to_string() },
                                CheckOption { id: "fatigue".to_string(), label: "Fatigue".to_string() },
                            ],
                        },
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_every_marker_rendered_once() {
        let temp = tempdir().unwrap();
        let logo = temp.path().join("logo.png");
        tiny_png(&logo);

        let spec = spec();
        let placeholders = PlaceholderPlanner::plan(&spec);
        let document = DocumentRenderer::default()
            .render(&spec, &logo, &placeholders)
            .unwrap();

        let all_text: String = document
            .paragraphs()
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n");

        for placeholder in &placeholders {
            assert_eq!(
                all_text.matches(&placeholder.marker).count(),
                1,
                "{}",
                placeholder.marker
            );
        }
        assert!(all_text.contains("[[FIELD:consent]] I agree *"));
        assert!(all_text.contains("[[FIELD:pain]] Pain"));
        assert!(all_text.contains("Toelichting"));
        assert!(!all_text.contains("[[FIELD:intro]]"));
        assert!(!all_text.contains("[[FIELD:symptoms]]"));
    }

    #[test]
    fn test_info_block_label_never_required() {
        let temp = tempdir().unwrap();
        let logo = temp.path().join("logo.png");
        tiny_png(&logo);

        let spec = spec();
        let document = DocumentRenderer::default()
            .render(&spec, &logo, &PlaceholderPlanner::plan(&spec))
            .unwrap();

        let intro = document
            .paragraphs()
            .into_iter()
            .find(|p| p.text().starts_with("Welcome"))
            .unwrap()
            .text();
        assert_eq!(intro, "Welcome\nPlease read");
    }

    #[test]
    fn test_missing_placeholder_is_an_error() {
        let temp = tempdir().unwrap();
        let logo = temp.path().join("logo.png");
        tiny_png(&logo);

        let err = DocumentRenderer::default()
            .render(&spec(), &logo, &[])
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingPlaceholder(id) if id == "name"));
    }
}
