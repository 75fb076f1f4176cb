//! Payload script templates.
//!
//! A template is the raw text of an injection script with `{name}` placeholders.
//! Braces follow format-string rules: `{{` and `}}` stand for literal braces,
//! anything else must form a well-formed `{identifier}`.

use crate::error::{ForgeError, Result};
use crate::types::COMMENT_PREFIX;
use indexmap::{IndexMap, IndexSet};
use std::fs;
use std::path::Path;

/// One parsed piece of template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim (escaped braces already unescaped)
    Literal(String),
    /// A named substitution site
    Placeholder(String),
}

/// Immutable script template, parsed once at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl ScriptTemplate {
    /// Parse template text.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let segments = parse_segments(&source)?;
        Ok(Self { source, segments })
    }

    /// Read and parse a UTF-8 template file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded template {:?} ({} bytes)", path.as_ref(), source.len());
        Self::parse(source)
    }

    /// Raw template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed segments in source order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct placeholder names in first-seen order.
    pub fn placeholders(&self) -> IndexSet<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Description taken from the first line when it is a comment.
    pub fn description(&self) -> Option<&str> {
        self.source
            .lines()
            .next()
            .and_then(|line| line.strip_prefix(COMMENT_PREFIX))
            .map(str::trim)
    }

    /// Substitute `values` into the template text.
    ///
    /// Every placeholder must have an entry; values are inserted literally.
    pub fn render(&self, values: &IndexMap<String, String>) -> Result<String> {
        let mut output = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| ForgeError::UnresolvedPlaceholder { name: name.clone() })?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_segments(source: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' | '\n' => break,
                        other => name.push(other),
                    }
                }

                if !closed {
                    return Err(ForgeError::malformed(format!(
                        "unclosed '{{' at byte {}",
                        offset
                    )));
                }
                if !is_identifier(&name) {
                    return Err(ForgeError::malformed(format!(
                        "invalid placeholder name '{}' at byte {}",
                        name, offset
                    )));
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name));
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    literal.push('}');
                } else {
                    return Err(ForgeError::malformed(format!(
                        "single '}}' encountered at byte {}",
                        offset
                    )));
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_in_first_seen_order() {
        let template = ScriptTemplate::parse("STRING {b} {a}\nSTRING {b}").unwrap();
        let names: Vec<_> = template.placeholders().into_iter().collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_no_placeholders() {
        let template = ScriptTemplate::parse("ENTER\n").unwrap();
        assert!(template.placeholders().is_empty());
        assert_eq!(
            template.segments(),
            &[Segment::Literal("ENTER\n".to_string())]
        );
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        let template = ScriptTemplate::parse("STRING function {{ {body} }}").unwrap();
        assert_eq!(template.placeholders().len(), 1);

        let mut values = IndexMap::new();
        values.insert("body".to_string(), "x".to_string());
        assert_eq!(template.render(&values).unwrap(), "STRING function { x }");
    }

    #[test]
    fn test_unbalanced_braces_rejected() {
        assert!(matches!(
            ScriptTemplate::parse("STRING {oops"),
            Err(ForgeError::MalformedTemplate { .. })
        ));
        assert!(matches!(
            ScriptTemplate::parse("STRING oops}"),
            Err(ForgeError::MalformedTemplate { .. })
        ));
        assert!(matches!(
            ScriptTemplate::parse("STRING {}"),
            Err(ForgeError::MalformedTemplate { .. })
        ));
        assert!(matches!(
            ScriptTemplate::parse("STRING {not valid}"),
            Err(ForgeError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn test_render_missing_value() {
        let template = ScriptTemplate::parse("STRING {host}").unwrap();
        let err = template.render(&IndexMap::new()).unwrap_err();
        assert!(matches!(err, ForgeError::UnresolvedPlaceholder { name } if name == "host"));
    }

    #[test]
    fn test_description() {
        let template = ScriptTemplate::parse("REM Opens a terminal\nGUI r").unwrap();
        assert_eq!(template.description(), Some("Opens a terminal"));

        let template = ScriptTemplate::parse("GUI r\nREM late comment").unwrap();
        assert_eq!(template.description(), None);
    }
}
