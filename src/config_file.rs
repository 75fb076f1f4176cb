//! Configuration file handling for argument defaults and generator settings.
//!
//! The file is JSON. Every section is optional and falls back to its default:
//!
//! ```json
//! {
//!   "arguments": {
//!     "os":  { "default": "windows", "values": { "windows": "GUI r", "linux": "CTRL ALT t" } },
//!     "url": { "default": "https://example.com" }
//!   },
//!   "humanize": { "average_delay": 0, "offset": 0 },
//!   "layouts": ["us", "gb", "de"],
//!   "encoder": { "program": "java", "args": ["-jar", "encoder.jar"] }
//! }
//! ```

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::arguments::{EnumerationMap, EnumerationTable};
use crate::encoder::EncoderCommand;
use crate::humanize::HumanizationConfig;
use crate::layout::LayoutAllowList;

/// Default value (and optional enumeration table) for one placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDefault {
    #[serde(default)]
    pub default: String,
    /// When present the argument is enumerated and `default` is one of its keys
    #[serde(default)]
    pub values: Option<EnumerationTable>,
}

/// Defaults and generator settings that can be saved/loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub arguments: IndexMap<String, ArgumentDefault>,
    #[serde(default)]
    pub humanize: HumanizationConfig,
    /// Overrides the built-in layout allow-list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layouts: Option<Vec<String>>,
    #[serde(default)]
    pub encoder: EncoderCommand,
}

impl ForgeConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Load `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, argument) in &self.arguments {
            if name.trim().is_empty() {
                anyhow::bail!("Argument names must not be empty");
            }
            if let Some(values) = &argument.values {
                if values.is_empty() {
                    anyhow::bail!("Argument {} has an empty value table", name);
                }
                if !values.contains_key(&argument.default) {
                    anyhow::bail!(
                        "Default '{}' of argument {} is not one of its values",
                        argument.default,
                        name
                    );
                }
            }
        }

        if let Some(layouts) = &self.layouts {
            if layouts.is_empty() {
                anyhow::bail!("Layout list must not be empty");
            }
        }

        if self.encoder.program.trim().is_empty() {
            anyhow::bail!("Encoder program must be specified");
        }

        Ok(())
    }

    /// Enumeration tables keyed by placeholder name
    pub fn enumerations(&self) -> EnumerationMap {
        self.arguments
            .iter()
            .filter_map(|(name, argument)| {
                argument
                    .values
                    .as_ref()
                    .map(|values| (name.clone(), values.clone()))
            })
            .collect()
    }

    /// Layout allow-list, from the file or built in
    pub fn layout_allow_list(&self) -> LayoutAllowList {
        match &self.layouts {
            Some(codes) => LayoutAllowList::new(codes.iter().cloned()),
            None => LayoutAllowList::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "arguments": {
            "os": { "default": "windows", "values": { "windows": "GUI r", "linux": "CTRL ALT t" } },
            "url": { "default": "https://example.com" }
        },
        "humanize": { "average_delay": 100, "offset": 20 },
        "layouts": ["us", "de"]
    }"#;

    #[test]
    fn test_parse_sample() {
        let config: ForgeConfig = serde_json::from_str(SAMPLE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.humanize, HumanizationConfig::new(100, 20));
        assert_eq!(config.encoder, EncoderCommand::default());

        let enums = config.enumerations();
        assert_eq!(enums.len(), 1);
        assert_eq!(enums["os"]["linux"], "CTRL ALT t");

        let allow = config.layout_allow_list();
        assert!(allow.contains("de"));
        assert!(!allow.contains("fr"));
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: ForgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ForgeConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_delay_rejected_by_type() {
        let result: std::result::Result<ForgeConfig, _> =
            serde_json::from_str(r#"{ "humanize": { "average_delay": -5 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_enum_default_must_be_a_key() {
        let config: ForgeConfig = serde_json::from_str(
            r#"{ "arguments": { "os": { "default": "beos", "values": { "linux": "x" } } } }"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duckforge.json");
        let config: ForgeConfig = serde_json::from_str(SAMPLE).unwrap();

        config.save_to_file(&path).unwrap();
        let loaded = ForgeConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
