//! Template resolution: arguments in, device-ready lines out.

use crate::arguments::{ArgumentSet, ArgumentValue, EnumerationMap};
use crate::error::{ForgeError, Result};
use crate::template::ScriptTemplate;
use crate::types::COMMENT_PREFIX;
use indexmap::IndexMap;

/// Resolve `template` against `args` and return its non-comment lines.
///
/// Enum keys are mapped through `enum_map` before substitution. Fails with
/// `UnresolvedPlaceholder`, `InvalidEnumKey`, or `EmptyPayload`.
pub fn resolve(
    template: &ScriptTemplate,
    args: &ArgumentSet,
    enum_map: &EnumerationMap,
) -> Result<Vec<String>> {
    let mut values = IndexMap::new();

    for name in template.placeholders() {
        let value = match args.get(name) {
            Some(ArgumentValue::Literal(text)) => text.clone(),
            Some(ArgumentValue::EnumKey(key)) => lookup_enum(name, key, enum_map)?,
            None => {
                return Err(ForgeError::UnresolvedPlaceholder {
                    name: name.to_string(),
                });
            }
        };
        values.insert(name.to_string(), value);
    }

    let text = template.render(&values)?;

    let mut dropped = 0usize;
    let lines: Vec<String> = text
        .lines()
        .filter(|line| {
            let comment = line.starts_with(COMMENT_PREFIX);
            dropped += usize::from(comment);
            !comment
        })
        .map(str::to_string)
        .collect();

    log::debug!(
        "Resolved {} placeholder(s), kept {} line(s), dropped {} comment(s)",
        values.len(),
        lines.len(),
        dropped
    );

    if lines.is_empty() {
        return Err(ForgeError::EmptyPayload);
    }
    Ok(lines)
}

fn lookup_enum(name: &str, key: &str, enum_map: &EnumerationMap) -> Result<String> {
    let table = enum_map.get(name);
    match table.and_then(|table| table.get(key)) {
        Some(literal) => {
            log::debug!("Mapped {}={} through its enumeration", name, key);
            Ok(literal.clone())
        }
        None => Err(ForgeError::InvalidEnumKey {
            name: name.to_string(),
            key: key.to_string(),
            allowed: table
                .map(|table| table.keys().cloned().collect())
                .unwrap_or_default(),
        }),
    }
}
