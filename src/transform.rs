//! Dialect transformation of resolved lines.
//!
//! Pure functions over an already-resolved, non-empty line sequence. The only
//! side channel is `TransformWarning`, returned next to the lines.

use crate::types::{
    is_delay_line, language_line, DeviceFormat, BRACKETED_END, BRACKETED_PREFIX, BRACKETED_START,
};
use std::fmt;

/// Non-fatal conditions noticed while transforming
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformWarning {
    /// No leading delay, so typing may begin before the layout switch applies
    LayoutTagWithoutDelay,
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayoutTagWithoutDelay => write!(
                f,
                "payload does not start with a delay; keystrokes may be sent before the layout is applied"
            ),
        }
    }
}

/// Lines after transformation plus any warnings raised
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    pub lines: Vec<String>,
    pub warnings: Vec<TransformWarning>,
}

/// Rewrite `lines` into the dialect of `format`.
pub fn transform(lines: Vec<String>, format: DeviceFormat, layout: &str) -> Transformed {
    let transformed = match format {
        DeviceFormat::Plain => Transformed {
            lines,
            warnings: Vec::new(),
        },
        DeviceFormat::Bracketed => bracketed(lines, layout),
        DeviceFormat::DelayedTag => delayed_tag(lines, layout),
    };

    log::debug!(
        "Transformed payload for {} ({} line(s))",
        format,
        transformed.lines.len()
    );
    for warning in &transformed.warnings {
        log::warn!("{}", warning);
    }
    transformed
}

fn bracketed(lines: Vec<String>, layout: &str) -> Transformed {
    let mut output = Vec::with_capacity(lines.len() + 3);
    output.push(BRACKETED_START.to_string());
    output.push(language_line(layout));
    output.extend(
        lines
            .into_iter()
            .map(|line| format!("{} {}", BRACKETED_PREFIX, line)),
    );
    output.push(BRACKETED_END.to_string());

    Transformed {
        lines: output,
        warnings: Vec::new(),
    }
}

fn delayed_tag(mut lines: Vec<String>, layout: &str) -> Transformed {
    let mut warnings = Vec::new();
    let starts_with_delay = lines.first().is_some_and(|line| is_delay_line(line));

    if starts_with_delay {
        lines.insert(1, language_line(layout));
    } else {
        lines.insert(0, language_line(layout));
        warnings.push(TransformWarning::LayoutTagWithoutDelay);
    }

    Transformed { lines, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_is_identity() {
        let input = lines(&["STRING Hello World", "ENTER"]);
        let out = transform(input.clone(), DeviceFormat::Plain, "us");
        assert_eq!(out.lines, input);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_bracketed_shape() {
        let out = transform(lines(&["GUI r", "STRING cmd"]), DeviceFormat::Bracketed, "de");
        assert_eq!(
            out.lines,
            lines(&[
                "ATTACKMODE HID",
                "DUCKY_LANG de",
                "QUACK GUI r",
                "QUACK STRING cmd",
                "LED FINISH",
            ])
        );
    }

    #[test]
    fn test_delayed_tag_after_leading_delay() {
        let out = transform(lines(&["DELAY 1000", "GUI r"]), DeviceFormat::DelayedTag, "us");
        assert_eq!(out.lines, lines(&["DELAY 1000", "DUCKY_LANG us", "GUI r"]));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_delayed_tag_without_delay_warns() {
        let out = transform(lines(&["GUI r", "DELAY 10"]), DeviceFormat::DelayedTag, "fr");
        assert_eq!(out.lines, lines(&["DUCKY_LANG fr", "GUI r", "DELAY 10"]));
        assert_eq!(out.warnings, vec![TransformWarning::LayoutTagWithoutDelay]);
    }
}
