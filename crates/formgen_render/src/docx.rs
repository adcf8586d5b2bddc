//! WordprocessingML packaging.
//!
//! Serializes a [`FormDocument`] into a `.docx` package. Content controls
//! become structured document tags (`w:sdt`), so the written file carries
//! real Word form controls.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::{
    Alignment, Block, ContentControl, ControlProperties, FormDocument, ImageRef, Inline, Paragraph,
    Run, RunStyle, Table,
};
use crate::error::{RenderError, RenderResult};
use crate::image;

const NS_DECLARATIONS: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" "#,
    r#"xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" "#,
    r#"mc:Ignorable="w14""#
);

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
    r#"</Relationships>"#
);

const APP_PROPERTIES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
    r#"<Application>formgen</Application>"#,
    r#"</Properties>"#
);

// A4 in twentieths of a point
const PAGE_WIDTH_TWIPS: i64 = 11906;
const PAGE_HEIGHT_TWIPS: i64 = 16838;

const CHECKBOX_FONT: &str = "MS Gothic";
const CHECKED_GLYPH: &str = "\u{2612}";
const UNCHECKED_GLYPH: &str = "\u{2610}";

fn twips_from_cm(cm: f64) -> i64 {
    (cm * 1440.0 / 2.54).round() as i64
}

fn twips_from_pt(pt: f64) -> i64 {
    (pt * 20.0).round() as i64
}

fn half_points(pt: f64) -> i64 {
    (pt * 2.0).round() as i64
}

fn emu_from_cm(cm: f64) -> i64 {
    (cm * 360_000.0).round() as i64
}

/// BCP 47 tag for the Windows locale ids Word's date pickers use.
pub fn locale_tag(locale_id: u32) -> &'static str {
    match locale_id {
        1031 => "de-DE",
        1036 => "fr-FR",
        1043 => "nl-NL",
        2057 => "en-GB",
        2067 => "nl-BE",
        _ => "en-US",
    }
}

/// Writes [`FormDocument`]s as `.docx` packages.
pub struct DocxWriter;

impl DocxWriter {
    /// Package `document` at `path`, creating parent directories.
    pub fn write(document: &FormDocument, path: &Path) -> RenderResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut zip = ZipWriter::new(File::create(path)?);
        let parts = [
            ("[Content_Types].xml", Self::content_types(document)),
            ("_rels/.rels", ROOT_RELS.to_string()),
            ("docProps/core.xml", Self::core_properties(document, Utc::now())),
            ("docProps/app.xml", APP_PROPERTIES.to_string()),
            ("word/document.xml", Self::document_xml(document)),
            ("word/styles.xml", Self::styles_xml(document)),
            ("word/_rels/document.xml.rels", Self::document_rels(document)),
        ];

        for (name, xml) in parts {
            zip.start_file(name, part_options())?;
            zip.write_all(xml.as_bytes())?;
        }

        for media in &document.media {
            let bytes = fs::read(&media.source).map_err(|e| RenderError::Image {
                path: media.source.clone(),
                message: e.to_string(),
            })?;
            zip.start_file(format!("word/media/{}", media.file_name), part_options())?;
            zip.write_all(&bytes)?;
            debug!("Embedded {:?} as {}", media.source, media.file_name);
        }

        zip.finish()?;
        info!("Wrote document to {:?}", path);
        Ok(())
    }

    pub fn content_types(document: &FormDocument) -> String {
        let extensions: BTreeSet<String> = document.media.iter().map(|m| m.extension()).collect();

        let mut xml = String::from(XML_HEADER);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        for extension in extensions {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(extension.as_str()),
                image::content_type(&extension)
            ));
        }
        xml.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
        xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
        xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
        xml.push_str("</Types>");
        xml
    }

    pub fn core_properties(document: &FormDocument, timestamp: DateTime<Utc>) -> String {
        let stamp = timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let properties = &document.properties;

        let mut xml = String::from(XML_HEADER);
        xml.push_str(concat!(
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
        ));
        xml.push_str(&format!("<dc:title>{}</dc:title>", escape(properties.title.as_str())));
        xml.push_str(&format!("<dc:subject>{}</dc:subject>", escape(properties.subject.as_str())));
        xml.push_str(&format!("<dc:creator>{}</dc:creator>", escape(properties.creator.as_str())));
        xml.push_str(&format!(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{0}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{0}</dcterms:modified>"#,
            stamp
        ));
        xml.push_str("</cp:coreProperties>");
        xml
    }

    pub fn document_rels(document: &FormDocument) -> String {
        let mut xml = String::from(XML_HEADER);
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        xml.push_str(r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
        for (index, media) in document.media.iter().enumerate() {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
                image_rel_id(index),
                escape(media.file_name.as_str())
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    pub fn styles_xml(document: &FormDocument) -> String {
        let border = |side: &str| {
            format!(
                r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
                side
            )
        };

        let mut xml = String::from(XML_HEADER);
        xml.push_str(r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#);
        xml.push_str("<w:docDefaults><w:rPrDefault>");
        xml.push_str(&run_properties(&document.defaults));
        xml.push_str(r#"</w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults>"#);
        xml.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#);
        xml.push_str(concat!(
            r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/>"#,
            r#"<w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/>"#,
            r#"<w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/>"#,
            r#"</w:tblCellMar></w:tblPr></w:style>"#
        ));
        xml.push_str(r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:tblPr><w:tblBorders>"#);
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            xml.push_str(&border(side));
        }
        xml.push_str("</w:tblBorders></w:tblPr></w:style></w:styles>");
        xml
    }

    /// The main document part.
    pub fn document_xml(document: &FormDocument) -> String {
        let margin = twips_from_cm(document.page.margin_cm);
        let mut body = BodyWriter {
            text_width: PAGE_WIDTH_TWIPS - 2 * margin,
            ..Default::default()
        };
        for block in &document.blocks {
            match block {
                Block::Paragraph(paragraph) => body.paragraph(paragraph),
                Block::Table(table) => body.table(table),
            }
        }

        let mut xml = String::from(XML_HEADER);
        xml.push_str(&format!("<w:document {}><w:body>", NS_DECLARATIONS));
        xml.push_str(&body.out);
        xml.push_str(&format!(
            r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#,
            PAGE_WIDTH_TWIPS,
            PAGE_HEIGHT_TWIPS,
            m = margin
        ));
        xml.push_str("</w:body></w:document>");
        xml
    }
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn image_rel_id(media_index: usize) -> String {
    format!("rIdImage{}", media_index + 1)
}

fn run_properties(style: &RunStyle) -> String {
    let mut xml = String::from("<w:rPr>");
    if let Some(font) = &style.font {
        let font = escape(font.as_str());
        xml.push_str(&format!(
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{0}" w:cs="{0}"/>"#,
            font
        ));
    }
    if style.bold {
        xml.push_str("<w:b/>");
    }
    if style.italic {
        xml.push_str("<w:i/>");
    }
    if let Some(color) = &style.color {
        xml.push_str(&format!(r#"<w:color w:val="{}"/>"#, color.as_str()));
    }
    if let Some(size) = style.size_pt {
        let size = half_points(size);
        xml.push_str(&format!(r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, size));
    }
    xml.push_str("</w:rPr>");
    xml
}

/// Accumulates body XML; tracks drawing ids, which must be unique.
#[derive(Default)]
struct BodyWriter {
    out: String,
    next_drawing_id: u32,
    text_width: i64,
}

impl BodyWriter {
    fn paragraph(&mut self, paragraph: &Paragraph) {
        self.out.push_str("<w:p>");

        let mut properties = String::new();
        if paragraph.space_before_pt.is_some() || paragraph.space_after_pt.is_some() {
            properties.push_str("<w:spacing");
            if let Some(before) = paragraph.space_before_pt {
                properties.push_str(&format!(r#" w:before="{}""#, twips_from_pt(before)));
            }
            if let Some(after) = paragraph.space_after_pt {
                properties.push_str(&format!(r#" w:after="{}""#, twips_from_pt(after)));
            }
            properties.push_str("/>");
        }
        if let Some(indent) = paragraph.indent_left_cm {
            properties.push_str(&format!(r#"<w:ind w:left="{}"/>"#, twips_from_cm(indent)));
        }
        if paragraph.alignment == Alignment::Center {
            properties.push_str(r#"<w:jc w:val="center"/>"#);
        }
        if !properties.is_empty() {
            self.out.push_str(&format!("<w:pPr>{}</w:pPr>", properties));
        }

        for inline in &paragraph.inlines {
            match inline {
                Inline::Run(run) => self.run(run),
                Inline::Image(image) => self.image(image),
                Inline::Control(control) => self.control(control),
            }
        }
        self.out.push_str("</w:p>");
    }

    fn run(&mut self, run: &Run) {
        self.out.push_str("<w:r>");
        self.out.push_str(&run_properties(&run.style));
        for (index, line) in run.text.split('\n').enumerate() {
            if index > 0 {
                self.out.push_str("<w:br/>");
            }
            if !line.is_empty() {
                self.out.push_str(&format!(
                    r#"<w:t xml:space="preserve">{}</w:t>"#,
                    escape(line)
                ));
            }
        }
        self.out.push_str("</w:r>");
    }

    fn image(&mut self, image: &ImageRef) {
        self.next_drawing_id += 1;
        let id = self.next_drawing_id;
        let cx = emu_from_cm(image.width_cm);
        let cy = emu_from_cm(image.height_cm);
        let rel = image_rel_id(image.media_index);

        self.out.push_str(&format!(
            concat!(
                r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="Picture {id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
            ),
            cx = cx,
            cy = cy,
            id = id,
            rel = rel
        ));
    }

    fn control(&mut self, control: &ContentControl) {
        self.out.push_str("<w:sdt><w:sdtPr>");
        self.out.push_str(&run_properties(&control.style));
        self.out.push_str(&format!(
            r#"<w:alias w:val="{}"/><w:tag w:val="{}"/><w:id w:val="{}"/>"#,
            escape(control.title.as_str()),
            escape(control.tag.as_str()),
            control.id
        ));

        let checked = match &control.properties {
            ControlProperties::Checkbox { checked } => Some(*checked),
            _ => None,
        };
        if checked.is_none() {
            self.out.push_str("<w:showingPlcHdr/>");
        }

        match &control.properties {
            ControlProperties::PlainText { multiline } => {
                if *multiline {
                    self.out.push_str(r#"<w:text w:multiLine="1"/>"#);
                } else {
                    self.out.push_str("<w:text/>");
                }
            }
            ControlProperties::RichText => self.out.push_str("<w:richText/>"),
            ControlProperties::Checkbox { checked } => {
                self.out.push_str(&format!(
                    concat!(
                        r#"<w14:checkbox><w14:checked w14:val="{}"/>"#,
                        r#"<w14:checkedState w14:val="2612" w14:font="{font}"/>"#,
                        r#"<w14:uncheckedState w14:val="2610" w14:font="{font}"/></w14:checkbox>"#
                    ),
                    u8::from(*checked),
                    font = CHECKBOX_FONT
                ));
            }
            ControlProperties::DropdownList { entries } => {
                self.out.push_str("<w:dropDownList>");
                for entry in entries {
                    self.out.push_str(&format!(
                        r#"<w:listItem w:displayText="{}" w:value="{}"/>"#,
                        escape(entry.text.as_str()),
                        escape(entry.value.as_str())
                    ));
                }
                self.out.push_str("</w:dropDownList>");
            }
            ControlProperties::Date { format, locale_id } => {
                self.out.push_str(&format!(
                    concat!(
                        r#"<w:date><w:dateFormat w:val="{}"/><w:lid w:val="{}"/>"#,
                        r#"<w:storeMappedDataAs w:val="dateTime"/><w:calendar w:val="gregorian"/></w:date>"#
                    ),
                    escape(format.as_str()),
                    locale_tag(*locale_id)
                ));
            }
        }
        self.out.push_str("</w:sdtPr><w:sdtContent>");

        match checked {
            Some(checked) => {
                let mut style = control.style.clone();
                style.font = Some(CHECKBOX_FONT.to_string());
                let glyph = if checked { CHECKED_GLYPH } else { UNCHECKED_GLYPH };
                self.run(&Run::new(glyph, style));
            }
            None => self.run(&Run::new(control.placeholder_text.clone(), control.style.clone())),
        }
        self.out.push_str("</w:sdtContent></w:sdt>");
    }

    fn table(&mut self, table: &Table) {
        let columns = table.rows.iter().map(|row| row.cells.len()).max().unwrap_or(1).max(1);
        let column_width = self.text_width / columns as i64;

        self.out.push_str(concat!(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="5000" w:type="pct"/>"#,
            r#"<w:tblLayout w:type="autofit"/></w:tblPr><w:tblGrid>"#
        ));
        for _ in 0..columns {
            self.out.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, column_width));
        }
        self.out.push_str("</w:tblGrid>");

        for row in &table.rows {
            self.out.push_str("<w:tr>");
            for cell in &row.cells {
                self.out.push_str("<w:tc><w:tcPr>");
                self.out.push_str(&format!(r#"<w:tcW w:w="{}" w:type="dxa"/>"#, column_width));
                if let Some(fill) = &cell.shading {
                    self.out.push_str(&format!(
                        r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                        fill.as_str()
                    ));
                }
                self.out.push_str("</w:tcPr>");
                if cell.paragraphs.is_empty() {
                    self.out.push_str("<w:p/>");
                }
                for paragraph in &cell.paragraphs {
                    self.paragraph(paragraph);
                }
                self.out.push_str("</w:tc>");
            }
            self.out.push_str("</w:tr>");
        }
        self.out.push_str("</w:tbl>");
    }
}
