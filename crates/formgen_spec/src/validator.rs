//! Spec validation.
//!
//! Validation runs on the untyped JSON tree so that every structural and
//! semantic problem can be collected in a single pass.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SpecValidationError;
use crate::models::{
    FieldKind, BRANDING_COLOR_KEYS, BRANDING_STRING_KEYS, DEFAULT_MARGIN_CM, FIELD_REQUIRED_KEYS,
    SECTION_REQUIRED_KEYS, TOP_LEVEL_REQUIRED_KEYS,
};
use crate::placeholder::is_marker_safe_id;

/// Validation outcome with details.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Turn collected errors into a single aggregated failure.
    pub fn into_result(self) -> Result<ValidationReport, SpecValidationError> {
        if self.valid {
            Ok(self)
        } else {
            Err(SpecValidationError::new(self.errors))
        }
    }
}

/// Check whether a string is a six digit hex color, `#` optional.
pub fn is_hex_color(value: &str) -> bool {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    HEX_COLOR
        .get_or_init(|| Regex::new(r"^#?[0-9a-fA-F]{6}$").expect("hex color pattern is valid"))
        .is_match(value.trim())
}

fn is_non_empty_string(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .map_or(false, |text| !text.trim().is_empty())
}

/// Validator for form specifications.
pub struct SpecValidator;

impl SpecValidator {
    /// Validate a parsed specification document.
    ///
    /// Returns the report (possibly carrying warnings) when the document is
    /// usable, or every violation found when it is not. Missing top-level
    /// keys short-circuit: without the containers nothing deeper is checked.
    pub fn validate(spec: &Value) -> Result<ValidationReport, SpecValidationError> {
        let mut report = ValidationReport::new();

        let Some(root) = spec.as_object() else {
            report.add_error("Spec root must be a JSON object.");
            return report.into_result();
        };

        for key in TOP_LEVEL_REQUIRED_KEYS {
            if !root.contains_key(key) {
                report.add_error(format!("Missing top-level key: '{}'.", key));
            }
        }
        if !report.valid {
            return report.into_result();
        }

        let layout = &root["document_layout"];
        let branding = &root["branding"];
        let sections = &root["sections"];

        if !root["metadata"].is_object() {
            report.add_error("'metadata' must be an object.");
        }
        if !branding.is_object() {
            report.add_error("'branding' must be an object.");
        }
        if !layout.is_object() {
            report.add_error("'document_layout' must be an object.");
        }
        if !sections.as_array().map_or(false, |list| !list.is_empty()) {
            report.add_error("'sections' must be a non-empty list.");
        }

        if let Some(layout) = layout.as_object() {
            Self::validate_layout(layout, &mut report);
        }
        if let Some(branding) = branding.as_object() {
            Self::validate_branding(branding, &mut report);
        }

        let mut seen_ids = HashSet::new();
        if let Some(sections) = sections.as_array() {
            for (index, section) in sections.iter().enumerate() {
                Self::validate_section(index + 1, section, &mut seen_ids, &mut report);
            }
        }

        debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            unique_ids = seen_ids.len(),
            "Spec validation finished"
        );

        report.into_result()
    }

    fn validate_layout(layout: &Map<String, Value>, report: &mut ValidationReport) {
        let margin_ok = match layout.get("margin_cm") {
            None => {
                debug!("document_layout.margin_cm absent, using {}", DEFAULT_MARGIN_CM);
                true
            }
            Some(value) => value.as_f64().map_or(false, |margin| margin > 0.0),
        };
        if !margin_ok {
            report.add_error("'document_layout.margin_cm' must be a positive number.");
        }
    }

    fn validate_branding(branding: &Map<String, Value>, report: &mut ValidationReport) {
        for key in BRANDING_COLOR_KEYS {
            let valid = branding
                .get(key)
                .and_then(Value::as_str)
                .map_or(false, is_hex_color);
            if !valid {
                report.add_error(format!(
                    "'branding.{}' must be a hex color, e.g. #17372c.",
                    key
                ));
            }
        }

        for key in BRANDING_STRING_KEYS {
            if !is_non_empty_string(branding.get(key)) {
                report.add_error(format!("'branding.{}' must be a non-empty string.", key));
            }
        }
    }

    fn validate_section(
        index: usize,
        section: &Value,
        seen_ids: &mut HashSet<String>,
        report: &mut ValidationReport,
    ) {
        let prefix = format!("sections[{}]", index);
        let Some(section) = section.as_object() else {
            report.add_error(format!("{} must be an object.", prefix));
            return;
        };

        for key in SECTION_REQUIRED_KEYS {
            if !section.contains_key(key) {
                report.add_error(format!("{}: missing key '{}'.", prefix, key));
            }
        }

        for key in ["id", "title"] {
            if section.contains_key(key) && !is_non_empty_string(section.get(key)) {
                report.add_error(format!("{}.{} must be a non-empty string.", prefix, key));
            }
        }

        if let Some(description) = section.get("description") {
            if !description.is_string() && !description.is_null() {
                report.add_warning(format!(
                    "{}.description is not a string and will be rendered as {}.",
                    prefix, description
                ));
            }
        }

        let Some(fields) = section.get("fields") else {
            return;
        };
        let fields = match fields.as_array() {
            Some(list) if !list.is_empty() => list,
            _ => {
                report.add_error(format!("{}.fields must be a non-empty list.", prefix));
                return;
            }
        };

        for (field_index, field) in fields.iter().enumerate() {
            let field_prefix = format!("{}.fields[{}]", prefix, field_index + 1);
            Self::validate_field(&field_prefix, field, seen_ids, report);
        }
    }

    fn validate_field(
        prefix: &str,
        field: &Value,
        seen_ids: &mut HashSet<String>,
        report: &mut ValidationReport,
    ) {
        let Some(field) = field.as_object() else {
            report.add_error(format!("{} must be an object.", prefix));
            return;
        };

        let missing: Vec<&str> = FIELD_REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !field.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            for key in missing {
                report.add_error(format!("{}: missing key '{}'.", prefix, key));
            }
            return;
        }

        let field_id = match field["id"].as_str() {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                report.add_error(format!("{}.id must be a non-empty string.", prefix));
                return;
            }
        };
        if !is_marker_safe_id(field_id) {
            report.add_error(format!(
                "{}.id '{}' may not contain '[' or ']'.",
                prefix, field_id
            ));
            return;
        }

        if !seen_ids.insert(field_id.to_string()) {
            report.add_error(format!("Duplicate field id: '{}'.", field_id));
        }

        let type_value = &field["type"];
        let field_type = type_value.as_str().filter(|name| FieldKind::NAMES.contains(name));
        if field_type.is_none() {
            let mut allowed = FieldKind::NAMES.to_vec();
            allowed.sort_unstable();
            let shown = type_value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| type_value.to_string());
            report.add_error(format!(
                "{}.type '{}' is not valid. Allowed: {:?}.",
                prefix, shown, allowed
            ));
        }

        if !field["required"].is_boolean() {
            report.add_error(format!("{}.required must be true or false.", prefix));
        }

        if !is_non_empty_string(field.get("label")) {
            report.add_error(format!("{}.label must be a non-empty string.", prefix));
        }

        if !field["help_text"].is_string() {
            report.add_error(format!(
                "{}.help_text must be a string (empty is allowed).",
                prefix
            ));
        }

        match field_type {
            Some("dropdown") => Self::validate_dropdown_options(prefix, field.get("options"), report),
            Some("checkbox_group") => {
                Self::validate_group_options(prefix, field.get("options"), seen_ids, report)
            }
            Some(other) if field.contains_key("options") && !FieldKind::accepts_options(other) => {
                report.add_warning(format!(
                    "{}.options is ignored for type '{}'.",
                    prefix, other
                ));
            }
            _ => {}
        }
    }

    fn validate_dropdown_options(prefix: &str, options: Option<&Value>, report: &mut ValidationReport) {
        let options = match options.and_then(Value::as_array) {
            Some(list) if !list.is_empty() => list,
            _ => {
                report.add_error(format!(
                    "{}.options must be a non-empty list for dropdown.",
                    prefix
                ));
                return;
            }
        };

        if !options.iter().all(|option| is_non_empty_string(Some(option))) {
            report.add_error(format!(
                "{}.options may only contain non-empty strings.",
                prefix
            ));
        }
    }

    fn validate_group_options(
        prefix: &str,
        options: Option<&Value>,
        seen_ids: &mut HashSet<String>,
        report: &mut ValidationReport,
    ) {
        let options = match options.and_then(Value::as_array) {
            Some(list) if !list.is_empty() => list,
            _ => {
                report.add_error(format!(
                    "{}.options must be a non-empty list for checkbox_group.",
                    prefix
                ));
                return;
            }
        };

        for (index, option) in options.iter().enumerate() {
            let option_prefix = format!("{}.options[{}]", prefix, index + 1);
            let Some(option) = option.as_object() else {
                report.add_error(format!("{} must be an object.", option_prefix));
                continue;
            };

            if !option.contains_key("id") || !option.contains_key("label") {
                report.add_error(format!("{} is missing 'id' and/or 'label'.", option_prefix));
                continue;
            }

            let option_id = match option["id"].as_str() {
                Some(id) if !id.trim().is_empty() => id,
                _ => {
                    report.add_error(format!("{}.id must be a non-empty string.", option_prefix));
                    continue;
                }
            };
            if !is_marker_safe_id(option_id) {
                report.add_error(format!(
                    "{}.id '{}' may not contain '[' or ']'.",
                    option_prefix, option_id
                ));
                continue;
            }

            if !seen_ids.insert(option_id.to_string()) {
                report.add_error(format!("Duplicate option id: '{}'.", option_id));
            }

            if !is_non_empty_string(option.get("label")) {
                report.add_error(format!("{}.label must be a non-empty string.", option_prefix));
            }
        }
    }
}
