//! Keyboard layout codes accepted by the encoder and the text dialects.

use crate::error::{ForgeError, Result};
use std::fmt;

/// Layout codes understood by the stock encoder
pub const DEFAULT_LAYOUTS: &[&str] = &[
    "be", "br", "ca", "ch", "de", "dk", "es", "fi", "fr", "gb", "hr", "it", "no", "pt", "ru",
    "si", "sv", "tr", "us",
];

/// Allow-list of layout codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutAllowList {
    codes: Vec<String>,
}

impl Default for LayoutAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_LAYOUTS.iter().map(|code| code.to_string()))
    }
}

impl LayoutAllowList {
    pub fn new(codes: impl IntoIterator<Item = String>) -> Self {
        Self {
            codes: codes.into_iter().map(|code| code.to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|allowed| allowed == code)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Validate `code` (case-insensitive) into a `KeyboardLayout`.
    pub fn validate(&self, code: &str) -> Result<KeyboardLayout> {
        let normalized = code.trim().to_lowercase();
        if self.contains(&normalized) {
            Ok(KeyboardLayout(normalized))
        } else {
            Err(ForgeError::InvalidLayout {
                layout: code.to_string(),
            })
        }
    }
}

/// A layout code that passed allow-list validation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyboardLayout(String);

impl KeyboardLayout {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyboardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
