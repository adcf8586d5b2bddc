//! Generator configuration.
//!
//! Resolution order (highest priority first):
//! 1. File given with `--config`
//! 2. `formgen.toml` in the working directory
//! 3. Compiled defaults
//!
//! Only one file is read; keys it omits keep their defaults.

use std::fs;
use std::path::Path;

use formgen_controls::{ControlText, FallbackGlyphs};
use formgen_render::RenderText;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};

/// Automation engine used for the interactive path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// In-process, writes structured document tags itself.
    #[default]
    Native,
    /// External helper driving a word processor.
    Bridge,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub engine: Engine,
    pub bridge_command: Option<String>,
    pub bridge_args: Vec<String>,
    /// Produce a plain-text document instead of failing when the
    /// automation host cannot be reached.
    pub fallback_on_unavailable: bool,
}

/// Wording printed into generated documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub dropdown_prompt: String,
    pub signature_line: String,
    pub explanation_title: String,
    pub confidential_note: String,
    pub text_prompt: String,
    pub date_prompt: String,
    pub date_format: String,
    pub date_locale: u32,
    pub short_blank: String,
    pub long_blank: String,
    pub date_mask: String,
    pub checkbox_glyph: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        let controls = ControlText::default();
        let glyphs = FallbackGlyphs::default();
        let render = RenderText::default();
        Self {
            dropdown_prompt: controls.dropdown_prompt,
            signature_line: controls.signature_line,
            explanation_title: render.explanation_title,
            confidential_note: render.confidential_note,
            text_prompt: controls.text_prompt,
            date_prompt: controls.date_prompt,
            date_format: controls.date_format,
            date_locale: controls.date_locale,
            short_blank: glyphs.short_blank,
            long_blank: glyphs.long_blank,
            date_mask: glyphs.date,
            checkbox_glyph: glyphs.checkbox,
        }
    }
}

impl TextConfig {
    pub fn control_text(&self) -> ControlText {
        ControlText {
            dropdown_prompt: self.dropdown_prompt.clone(),
            signature_line: self.signature_line.clone(),
            text_prompt: self.text_prompt.clone(),
            date_prompt: self.date_prompt.clone(),
            date_format: self.date_format.clone(),
            date_locale: self.date_locale,
        }
    }

    pub fn fallback_glyphs(&self) -> FallbackGlyphs {
        FallbackGlyphs {
            checkbox: self.checkbox_glyph.clone(),
            date: self.date_mask.clone(),
            dropdown: format!("[{}]", self.dropdown_prompt),
            signature: self.signature_line.clone(),
            long_blank: self.long_blank.clone(),
            short_blank: self.short_blank.clone(),
        }
    }

    pub fn render_text(&self) -> RenderText {
        RenderText {
            explanation_title: self.explanation_title.clone(),
            confidential_note: self.confidential_note.clone(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub automation: AutomationConfig,
    pub text: TextConfig,
}

impl GeneratorConfig {
    /// Name of the file picked up from the working directory.
    pub const FILE_NAME: &'static str = "formgen.toml";

    /// Load the configuration for a run in `working_dir`.
    ///
    /// An explicit path must exist; the implicit `formgen.toml` is optional.
    pub fn load(working_dir: &Path, explicit: Option<&Path>) -> CoreResult<Self> {
        let config = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(CoreError::Config {
                        path: path.display().to_string(),
                        message: "file not found".to_string(),
                    });
                }
                Self::from_file(path)?
            }
            None => {
                let implicit = working_dir.join(Self::FILE_NAME);
                if implicit.is_file() {
                    Self::from_file(&implicit)?
                } else {
                    debug!("No {} found, using defaults", Self::FILE_NAME);
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> CoreResult<Self> {
        info!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CoreError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| CoreError::Config {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |key: &str, message: &str| CoreError::ConfigValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.automation.engine == Engine::Bridge
            && self
                .automation
                .bridge_command
                .as_deref()
                .map_or(true, |command| command.trim().is_empty())
        {
            return Err(invalid(
                "automation.bridge_command",
                "required when engine = \"bridge\"",
            ));
        }

        let blanks = [
            ("text.short_blank", &self.text.short_blank),
            ("text.long_blank", &self.text.long_blank),
            ("text.date_mask", &self.text.date_mask),
            ("text.checkbox_glyph", &self.text.checkbox_glyph),
            ("text.signature_line", &self.text.signature_line),
            ("text.dropdown_prompt", &self.text.dropdown_prompt),
        ];
        for (field, value) in blanks {
            if value.is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
            if value.contains("[[FIELD:") {
                return Err(invalid(field, "must not contain a field marker"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.automation.engine, Engine::Native);
        assert!(!config.automation.fallback_on_unavailable);
        assert_eq!(config.text.date_locale, 1043);
        assert_eq!(config.text.fallback_glyphs().dropdown, "[Kies een optie]");
        assert_eq!(config.text.short_blank.len(), 28);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = GeneratorConfig::from_toml(
            r#"
            [automation]
            engine = "bridge"
            bridge_command = "word-bridge"
            bridge_args = ["--visible=false"]

            [text]
            dropdown_prompt = "Choose an option"
            "#,
        )
        .unwrap();

        assert_eq!(config.automation.engine, Engine::Bridge);
        assert_eq!(config.automation.bridge_args, vec!["--visible=false"]);
        assert_eq!(config.text.control_text().dropdown_prompt, "Choose an option");
        assert_eq!(config.text.fallback_glyphs().dropdown, "[Choose an option]");
        assert_eq!(config.text.date_format, "dd-MM-yyyy");
    }

    #[test]
    fn test_bridge_needs_command() {
        let error = GeneratorConfig::from_toml("[automation]\nengine = \"bridge\"\n").unwrap_err();
        assert!(matches!(
            error,
            CoreError::ConfigValue { ref key, .. } if key == "automation.bridge_command"
        ));
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for automation.bridge_command: required when engine = \"bridge\""
        );
    }

    #[test]
    fn test_glyph_may_not_be_marker() {
        let error =
            GeneratorConfig::from_toml("[text]\ncheckbox_glyph = \"[[FIELD:x]]\"\n").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for text.checkbox_glyph: must not contain a field marker"
        );
    }

    #[test]
    fn test_unknown_engine_rejected() {
        assert!(GeneratorConfig::from_toml("[automation]\nengine = \"com\"\n").is_err());
    }

    #[test]
    fn test_load_implicit_and_explicit() {
        let temp = tempdir().unwrap();
        assert_eq!(
            GeneratorConfig::load(temp.path(), None).unwrap(),
            GeneratorConfig::default()
        );

        fs::write(
            temp.path().join(GeneratorConfig::FILE_NAME),
            "[automation]\nfallback_on_unavailable = true\n",
        )
        .unwrap();
        assert!(
            GeneratorConfig::load(temp.path(), None)
                .unwrap()
                .automation
                .fallback_on_unavailable
        );

        let missing = temp.path().join("other.toml");
        assert!(matches!(
            GeneratorConfig::load(temp.path(), Some(&missing)),
            Err(CoreError::Config { .. })
        ));
    }
}
