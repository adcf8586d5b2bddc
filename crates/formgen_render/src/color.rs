//! Hex colors as used by the branding section and WordprocessingML.

use std::fmt;

use formgen_spec::is_hex_color;
use serde::{Deserialize, Serialize};

/// A six digit RGB color, stored upper-case without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> Option<Self> {
        if !is_hex_color(value) {
            return None;
        }
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        Some(Self(digits.to_ascii_uppercase()))
    }

    /// Parse `value`, or fall back to `fallback` when it is not a hex color.
    pub fn or(value: &str, fallback: &str) -> Self {
        Self::parse(value)
            .or_else(|| Self::parse(fallback))
            .unwrap_or_else(Self::black)
    }

    pub fn white() -> Self {
        Self("FFFFFF".to_string())
    }

    pub fn black() -> Self {
        Self("000000".to_string())
    }

    /// The value WordprocessingML expects in `w:val` and `w:fill`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
