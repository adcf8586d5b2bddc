//! Data models for form specifications.
//!
//! These types are only built from documents that already passed
//! [`SpecValidator`](crate::validator::SpecValidator); the validator works on
//! the untyped JSON tree so it can report every problem at once.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{SpecError, SpecResult};

/// Root keys every specification must declare.
pub const TOP_LEVEL_REQUIRED_KEYS: [&str; 4] = ["metadata", "branding", "document_layout", "sections"];

/// Keys every field object must declare.
pub const FIELD_REQUIRED_KEYS: [&str; 5] = ["id", "label", "type", "required", "help_text"];

/// Keys every section object must declare.
pub const SECTION_REQUIRED_KEYS: [&str; 3] = ["id", "title", "fields"];

/// Branding keys holding hex colors.
pub const BRANDING_COLOR_KEYS: [&str; 5] = [
    "primary_color",
    "secondary_color",
    "accent_color",
    "surface_color",
    "text_color",
];

/// Branding keys holding non-empty strings.
pub const BRANDING_STRING_KEYS: [&str; 3] = ["heading_font", "body_font", "logo_path"];

pub const DEFAULT_MARGIN_CM: f64 = 2.0;
pub const DEFAULT_SECTION_SPACING_PT: f64 = 18.0;

/// Root form specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormSpecification {
    pub metadata: Metadata,
    pub branding: Branding,
    pub document_layout: DocumentLayout,
    pub sections: Vec<Section>,
}

impl FormSpecification {
    /// Build the typed model from a validated JSON tree.
    pub fn from_value(value: Value) -> SpecResult<Self> {
        serde_json::from_value(value).map_err(|e| SpecError::InvalidFormat(e.to_string()))
    }

    /// Iterate over every field of every section in reading order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }
}

/// Document title block and practice identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    pub subtitle: String,
    pub practice_name: String,
    pub practitioner: String,
    pub phone: String,
    pub email: String,
}

impl Metadata {
    /// The `practice | practitioner | phone | email` line. Blank parts keep
    /// their slot.
    pub fn contact_line(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.practice_name, self.practitioner, self.phone, self.email
        )
    }
}

/// Colors, fonts and logo used to style the generated document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branding {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub surface_color: String,
    pub text_color: String,
    pub heading_font: String,
    pub body_font: String,
    pub logo_path: String,
}

/// Page layout settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentLayout {
    #[serde(default = "default_margin_cm")]
    pub margin_cm: f64,
    #[serde(default = "default_section_spacing_pt")]
    pub section_spacing_pt: f64,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            margin_cm: DEFAULT_MARGIN_CM,
            section_spacing_pt: DEFAULT_SECTION_SPACING_PT,
        }
    }
}

fn default_margin_cm() -> f64 {
    DEFAULT_MARGIN_CM
}

fn default_section_spacing_pt() -> f64 {
    DEFAULT_SECTION_SPACING_PT
}

/// A titled group of fields, rendered as one table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

/// A single form field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub id: String,
    pub label: String,
    pub required: bool,
    #[serde(default)]
    pub help_text: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Field type, carrying only the data that type needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    TextShort,
    TextLong,
    Checkbox,
    CheckboxGroup { options: Vec<CheckOption> },
    Dropdown { options: Vec<String> },
    Date,
    SignatureLine,
    InfoBlock,
}

impl FieldKind {
    /// Every type name accepted in the `type` key.
    pub const NAMES: [&'static str; 8] = [
        "text_short",
        "text_long",
        "checkbox",
        "checkbox_group",
        "dropdown",
        "date",
        "signature_line",
        "info_block",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextShort => "text_short",
            Self::TextLong => "text_long",
            Self::Checkbox => "checkbox",
            Self::CheckboxGroup { .. } => "checkbox_group",
            Self::Dropdown { .. } => "dropdown",
            Self::Date => "date",
            Self::SignatureLine => "signature_line",
            Self::InfoBlock => "info_block",
        }
    }

    /// Whether the `options` key means anything for this type name.
    pub fn accepts_options(type_name: &str) -> bool {
        matches!(type_name, "dropdown" | "checkbox_group")
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One choice inside a checkbox group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckOption {
    pub id: String,
    pub label: String,
}

/// Accept any JSON value for free-text keys, stringifying non-strings.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
