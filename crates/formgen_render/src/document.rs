//! In-memory document model.
//!
//! The renderer produces a [`FormDocument`], the fallback formatter and the
//! native automation session edit it, and the `.docx` writer serializes it.
//! The model also round-trips through JSON so a rendered document can be
//! handed between pipeline stages as a file.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::HexColor;
use crate::error::RenderResult;

/// A complete form document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
    pub properties: DocumentProperties,
    pub page: PageSetup,
    pub defaults: RunStyle,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub media: Vec<MediaFile>,
}

/// Core properties written to `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentProperties {
    pub title: String,
    pub subject: String,
    pub creator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub margin_cm: f64,
}

/// Top-level body content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub alignment: Alignment,
    pub space_before_pt: Option<f64>,
    pub space_after_pt: Option<f64>,
    pub indent_left_cm: Option<f64>,
    pub inlines: Vec<Inline>,
}

/// Content inside a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "inline", rename_all = "snake_case")]
pub enum Inline {
    Run(Run),
    Image(ImageRef),
    Control(ContentControl),
}

/// A run of uniformly styled text. `\n` becomes a line break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub style: RunStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    pub font: Option<String>,
    pub size_pt: Option<f64>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    pub color: Option<HexColor>,
}

/// Reference to a picture stored in [`FormDocument::media`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub media_index: usize,
    pub width_cm: f64,
    pub height_cm: f64,
}

/// A binary part copied into `word/media/` when packaging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub file_name: String,
    pub source: PathBuf,
}

impl MediaFile {
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// A structured document tag, Word's native form control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentControl {
    pub id: u32,
    pub title: String,
    pub tag: String,
    pub properties: ControlProperties,
    /// Text shown inside the control before the user fills it in.
    pub placeholder_text: String,
    #[serde(default)]
    pub style: RunStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlProperties {
    PlainText { multiline: bool },
    RichText,
    Checkbox { checked: bool },
    DropdownList { entries: Vec<ListEntry> },
    Date { format: String, locale_id: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub shading: Option<HexColor>,
    pub paragraphs: Vec<Paragraph>,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

impl RunStyle {
    pub fn new(font: &str, size_pt: f64) -> Self {
        Self {
            font: Some(font.to_string()),
            size_pt: Some(size_pt),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: HexColor) -> Self {
        self.color = Some(color);
        self
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn centered(mut self) -> Self {
        self.alignment = Alignment::Center;
        self
    }

    pub fn spacing(mut self, before_pt: f64, after_pt: f64) -> Self {
        self.space_before_pt = Some(before_pt);
        self.space_after_pt = Some(after_pt);
        self
    }

    pub fn space_after(mut self, after_pt: f64) -> Self {
        self.space_after_pt = Some(after_pt);
        self
    }

    pub fn indent(mut self, left_cm: f64) -> Self {
        self.indent_left_cm = Some(left_cm);
        self
    }

    pub fn run(mut self, text: impl Into<String>, style: RunStyle) -> Self {
        self.inlines.push(Inline::Run(Run::new(text, style)));
        self
    }

    pub fn push(&mut self, inline: Inline) {
        self.inlines.push(inline);
    }

    /// Visible text of the paragraph. Images and controls contribute nothing.
    pub fn text(&self) -> String {
        self.inlines
            .iter()
            .filter_map(|inline| match inline {
                Inline::Run(run) => Some(run.text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Style of the run covering byte `offset` of [`Paragraph::text`].
    pub fn style_at(&self, offset: usize) -> RunStyle {
        let mut start = 0;
        for inline in &self.inlines {
            if let Inline::Run(run) = inline {
                let end = start + run.text.len();
                if offset >= start && offset < end {
                    return run.style.clone();
                }
                start = end;
            }
        }
        self.first_run_style()
    }

    pub fn first_run_style(&self) -> RunStyle {
        self.inlines
            .iter()
            .find_map(|inline| match inline {
                Inline::Run(run) => Some(run.style.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Replace a byte range of [`Paragraph::text`] with new inlines.
    ///
    /// Runs overlapping the range are split so that text outside it keeps
    /// its formatting. Images and controls are never removed.
    pub fn splice(&mut self, range: Range<usize>, replacement: Vec<Inline>) {
        let mut replacement = Some(replacement);
        let mut result = Vec::with_capacity(self.inlines.len() + 2);
        let mut offset = 0;

        for inline in self.inlines.drain(..) {
            let Inline::Run(run) = inline else {
                result.push(inline);
                continue;
            };

            let start = offset;
            let end = start + run.text.len();
            offset = end;

            if end <= range.start || start >= range.end {
                if start >= range.end {
                    if let Some(pending) = replacement.take() {
                        result.extend(pending);
                    }
                }
                result.push(Inline::Run(run));
                continue;
            }

            let local_start = range.start.saturating_sub(start);
            let local_end = (range.end - start).min(run.text.len());

            if local_start > 0 {
                result.push(Inline::Run(Run::new(&run.text[..local_start], run.style.clone())));
            }
            if let Some(pending) = replacement.take() {
                result.extend(pending);
            }
            if local_end < run.text.len() {
                result.push(Inline::Run(Run::new(&run.text[local_end..], run.style)));
            }
        }

        if let Some(pending) = replacement.take() {
            result.extend(pending);
        }
        self.inlines = result;
    }
}

impl TableCell {
    pub fn shaded(color: HexColor) -> Self {
        Self {
            shading: Some(color),
            paragraphs: Vec::new(),
        }
    }
}

impl FormDocument {
    pub fn new(properties: DocumentProperties, page: PageSetup, defaults: RunStyle) -> Self {
        Self {
            properties,
            page,
            defaults,
            blocks: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    pub fn add_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Register a picture and return its media index.
    pub fn add_media(&mut self, source: impl Into<PathBuf>) -> usize {
        let source = source.into();
        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "png".to_string());
        let index = self.media.len();
        self.media.push(MediaFile {
            file_name: format!("image{}.{}", index + 1, extension),
            source,
        });
        index
    }

    /// Every paragraph in reading order, including those in table cells.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut paragraphs = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(paragraph) => paragraphs.push(paragraph),
                Block::Table(table) => {
                    for row in &table.rows {
                        for cell in &row.cells {
                            paragraphs.extend(cell.paragraphs.iter());
                        }
                    }
                }
            }
        }
        paragraphs
    }

    /// Mutable counterpart of [`FormDocument::paragraphs`], same order.
    pub fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut paragraphs = Vec::new();
        for block in &mut self.blocks {
            match block {
                Block::Paragraph(paragraph) => paragraphs.push(paragraph),
                Block::Table(table) => {
                    for row in &mut table.rows {
                        for cell in &mut row.cells {
                            paragraphs.extend(cell.paragraphs.iter_mut());
                        }
                    }
                }
            }
        }
        paragraphs
    }

    /// Every content control in reading order.
    pub fn controls(&self) -> Vec<&ContentControl> {
        self.paragraphs()
            .into_iter()
            .flat_map(|paragraph| paragraph.inlines.iter())
            .filter_map(|inline| match inline {
                Inline::Control(control) => Some(control),
                _ => None,
            })
            .collect()
    }

    /// Write the model as a JSON snapshot.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec(self)?)?;
        debug!("Wrote document snapshot to {:?}", path);
        Ok(())
    }

    /// Read a model written by [`FormDocument::save_snapshot`].
    pub fn load_snapshot(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&content)?)
    }
}
