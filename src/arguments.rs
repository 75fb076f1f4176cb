//! Typed payload arguments.
//!
//! Each placeholder of a template gets exactly one `ArgumentValue`. Enumerated
//! arguments store a key into their table; the resolver maps the key to the
//! concrete script text, so the stored value is never the final substitution.

use crate::config_file::ArgumentDefault;
use crate::error::{ForgeError, Result};
use crate::template::ScriptTemplate;
use indexmap::IndexMap;
use std::fmt;

/// Key → literal substitution table for one enumerated placeholder
pub type EnumerationTable = IndexMap<String, String>;

/// Enumeration tables by placeholder name
pub type EnumerationMap = IndexMap<String, EnumerationTable>;

/// Value held for a single placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    /// Substituted verbatim
    Literal(String),
    /// Key into the placeholder's enumeration table
    EnumKey(String),
}

impl ArgumentValue {
    /// The raw stored string (the key for enumerated values)
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(value) | Self::EnumKey(value) => value,
        }
    }

    /// Same tag, new contents
    fn with_value(&self, value: String) -> Self {
        match self {
            Self::Literal(_) => Self::Literal(value),
            Self::EnumKey(_) => Self::EnumKey(value),
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered argument values for one template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSet {
    entries: IndexMap<String, ArgumentValue>,
    defaults: IndexMap<String, ArgumentValue>,
}

impl ArgumentSet {
    /// Empty set, filled with [`ArgumentSet::insert`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one entry per template placeholder from the configured defaults.
    ///
    /// Placeholders without a configured default start as an empty literal.
    /// Placeholders whose default carries a `values` table are enum keys.
    pub fn from_template(
        template: &ScriptTemplate,
        defaults: &IndexMap<String, ArgumentDefault>,
    ) -> Self {
        let mut entries = IndexMap::new();
        for name in template.placeholders() {
            let value = match defaults.get(name) {
                Some(default) if default.values.is_some() => {
                    ArgumentValue::EnumKey(default.default.clone())
                }
                Some(default) => ArgumentValue::Literal(default.default.clone()),
                None => ArgumentValue::Literal(String::new()),
            };
            entries.insert(name.to_string(), value);
        }
        log::debug!("Seeded {} argument(s) from template", entries.len());

        Self {
            defaults: entries.clone(),
            entries,
        }
    }

    /// Add or replace an entry, tag included.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgumentValue) {
        self.entries.insert(name.into(), value);
    }

    /// Change the value of a declared argument, keeping its tag.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| ForgeError::UnknownArgument {
                name: name.to_string(),
            })?;
        *entry = entry.with_value(value.into());
        Ok(())
    }

    /// Restore the values the set was seeded with.
    pub fn reset(&mut self) {
        self.entries = self.defaults.clone();
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
