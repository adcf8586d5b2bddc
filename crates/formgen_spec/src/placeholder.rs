//! Placeholder planning.
//!
//! Every fillable unit of a form gets a textual marker that the renderer
//! prints into the static document and the control resolver later swaps for
//! a real control.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{FieldKind, FormSpecification};

const MARKER_PREFIX: &str = "[[FIELD:";
const MARKER_SUFFIX: &str = "]]";

/// Marker text for a field or option id.
pub fn marker_for(id: &str) -> String {
    format!("{}{}{}", MARKER_PREFIX, id, MARKER_SUFFIX)
}

/// Recover the id a marker was built from.
pub fn field_id_from_marker(marker: &str) -> Option<&str> {
    marker
        .strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)
}

/// Whether `id` can be embedded in a marker without one marker ever
/// containing another.
///
/// Any bracket is refused: `a]` would give `[[FIELD:a]]]`, which contains
/// the marker of `a`.
pub fn is_marker_safe_id(id: &str) -> bool {
    !id.trim().is_empty() && !id.contains(['[', ']'])
}

/// The control a placeholder resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlKind {
    TextShort,
    TextLong,
    Checkbox,
    Dropdown { options: Vec<String> },
    Date,
    SignatureLine,
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextShort => "text_short",
            Self::TextLong => "text_long",
            Self::Checkbox => "checkbox",
            Self::Dropdown { .. } => "dropdown",
            Self::Date => "date",
            Self::SignatureLine => "signature_line",
        }
    }
}

impl std::fmt::Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One fillable unit of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub marker: String,
    pub field_id: String,
    pub label: String,
    pub required: bool,
    pub control: ControlKind,
}

impl Placeholder {
    pub fn new(
        field_id: impl Into<String>,
        label: impl Into<String>,
        required: bool,
        control: ControlKind,
    ) -> Self {
        let field_id = field_id.into();
        Self {
            marker: marker_for(&field_id),
            field_id,
            label: label.into(),
            required,
            control,
        }
    }
}

/// Walks a validated specification and plans its placeholders.
pub struct PlaceholderPlanner;

impl PlaceholderPlanner {
    /// Plan placeholders in reading order: sections, fields, then options.
    pub fn plan(spec: &FormSpecification) -> Vec<Placeholder> {
        let mut placeholders = Vec::new();

        for field in spec.fields() {
            let control = match &field.kind {
                FieldKind::InfoBlock => continue,
                FieldKind::CheckboxGroup { options } => {
                    // The group's own `required` applies to each option.
                    placeholders.extend(options.iter().map(|option| {
                        Placeholder::new(
                            &option.id,
                            &option.label,
                            field.required,
                            ControlKind::Checkbox,
                        )
                    }));
                    continue;
                }
                FieldKind::TextShort => ControlKind::TextShort,
                FieldKind::TextLong => ControlKind::TextLong,
                FieldKind::Checkbox => ControlKind::Checkbox,
                FieldKind::Dropdown { options } => ControlKind::Dropdown {
                    options: options.clone(),
                },
                FieldKind::Date => ControlKind::Date,
                FieldKind::SignatureLine => ControlKind::SignatureLine,
            };
            placeholders.push(Placeholder::new(&field.id, &field.label, field.required, control));
        }

        debug!("Planned {} placeholders", placeholders.len());
        placeholders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Branding, CheckOption, DocumentLayout, Field, Metadata, Section};

    fn field(id: &str, required: bool, kind: FieldKind) -> Field {
        Field {
            id: id.to_string(),
            label: format!("Label {}", id),
            required,
            help_text: String::new(),
            kind,
        }
    }

    fn spec_with(fields: Vec<Field>) -> FormSpecification {
        FormSpecification {
            metadata: Metadata::default(),
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
                id: "s".to_string(),
                title: "Section".to_string(),
                description: None,
                fields,
            }],
        }
    }

    #[test]
    fn test_marker_round_trip() {
        assert_eq!(marker_for("name"), "[[FIELD:name]]");
        assert_eq!(field_id_from_marker("[[FIELD:name]]"), Some("name"));
        assert_eq!(field_id_from_marker("FIELD:name"), None);
    }

    #[test]
    fn test_checkbox_group_expands_per_option() {
        let group = field(
            "symptoms",
            true,
            FieldKind::CheckboxGroup {
                options: vec![
                    CheckOption { id: "pain".to_string(), label: "Pain".to_string() },
                    CheckOption { id: "fatigue".to_string(), label: "Fatigue".to_string() },
                    CheckOption { id: "stress".to_string(), label: "Stress".to_string() },
                ],
            },
        );

        let placeholders = PlaceholderPlanner::plan(&spec_with(vec![group]));

        assert_eq!(placeholders.len(), 3);
        assert!(placeholders
            .iter()
            .all(|p| p.control == ControlKind::Checkbox && p.required));
        assert_eq!(placeholders[1].field_id, "fatigue");
        assert_eq!(placeholders[1].label, "Fatigue");
    }

    #[test]
    fn test_info_block_has_no_placeholder() {
        let placeholders = PlaceholderPlanner::plan(&spec_with(vec![
            field("intro", false, FieldKind::InfoBlock),
            field("birth", false, FieldKind::Date),
        ]));

        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].marker, "[[FIELD:birth]]");
    }

    #[test]
    fn test_only_dropdown_carries_options() {
        let placeholders = PlaceholderPlanner::plan(&spec_with(vec![field(
            "reason",
            false,
            FieldKind::Dropdown {
                options: vec!["A".to_string(), "B".to_string()],
            },
        )]));

        assert_eq!(
            placeholders[0].control,
            ControlKind::Dropdown {
                options: vec!["A".to_string(), "B".to_string()]
            }
        );
    }
}
