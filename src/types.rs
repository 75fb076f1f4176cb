//! Type-safe device dialect types
//!
//! Each injection device family consumes its own script dialect. This module
//! replaces string tags ("ducky", "bunny", "omg") with a closed enum so every
//! dialect-specific rule is an exhaustive match.

use strum::{Display, EnumIter, EnumString};

/// Command token for typing a literal string
pub const STRING_COMMAND: &str = "STRING";
/// Command token for a timing pause
pub const DELAY_COMMAND: &str = "DELAY";
/// Dedicated token for pressing the space bar
pub const SPACE_COMMAND: &str = "SPACE";
/// Comment marker; lines starting with it never reach a device
pub const COMMENT_PREFIX: &str = "REM ";

/// Command prefix used by the bracketed dialect
pub const BRACKETED_PREFIX: &str = "QUACK";
/// First line of a bracketed payload
pub const BRACKETED_START: &str = "ATTACKMODE HID";
/// Last line of a bracketed payload
pub const BRACKETED_END: &str = "LED FINISH";
/// Keyword that selects the keyboard layout in text dialects
pub const LANGUAGE_COMMAND: &str = "DUCKY_LANG";

/// Script dialect of the target device family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Display, EnumString, EnumIter)]
pub enum DeviceFormat {
    /// Pass-through script, compiled to a binary by the external encoder
    #[default]
    #[strum(to_string = "plain", serialize = "ducky")]
    Plain,
    /// Every command wrapped in a prefix between start/end marker lines
    #[strum(to_string = "bracketed", serialize = "bunny")]
    Bracketed,
    /// Language tag placed after the initial delay
    #[strum(to_string = "delayed-tag", serialize = "omg")]
    DelayedTag,
}

impl DeviceFormat {
    /// Whether the final artifact must be produced by the external encoder
    pub fn requires_encoding(&self) -> bool {
        match self {
            Self::Plain => true,
            Self::Bracketed | Self::DelayedTag => false,
        }
    }

    /// Default artifact filename for this dialect
    pub fn default_output(&self) -> &'static str {
        match self {
            Self::Plain => "inject.bin",
            Self::Bracketed => "payload.txt",
            Self::DelayedTag => "payload.txt",
        }
    }
}

/// Language-selection line for a layout code
pub fn language_line(layout: &str) -> String {
    format!("{} {}", LANGUAGE_COMMAND, layout)
}

/// Split an instruction line into its command token and the remainder.
///
/// `"STRING Hello"` gives `("STRING", "Hello")`, `"ENTER"` gives `("ENTER", "")`.
pub fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((command, rest)) => (command, rest),
        None => (line, ""),
    }
}

/// Whether a line is a timing-delay instruction
pub fn is_delay_line(line: &str) -> bool {
    let (command, _) = split_command(line.trim_start());
    matches!(command, "DELAY" | "DEFAULT_DELAY" | "DEFAULTDELAY")
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_format_parses_legacy_names() {
        assert_eq!("ducky".parse::<DeviceFormat>().unwrap(), DeviceFormat::Plain);
        assert_eq!("bunny".parse::<DeviceFormat>().unwrap(), DeviceFormat::Bracketed);
        assert_eq!("omg".parse::<DeviceFormat>().unwrap(), DeviceFormat::DelayedTag);
        assert!("teensy".parse::<DeviceFormat>().is_err());
    }

    #[test]
    fn test_format_display_uses_canonical_name() {
        assert_eq!(DeviceFormat::Plain.to_string(), "plain");
        assert_eq!(DeviceFormat::DelayedTag.to_string(), "delayed-tag");
    }

    #[test]
    fn test_only_plain_requires_encoding() {
        let encoded: Vec<_> = DeviceFormat::iter()
            .filter(|f| f.requires_encoding())
            .collect();
        assert_eq!(encoded, vec![DeviceFormat::Plain]);
    }

    #[test]
    fn test_delay_detection() {
        assert!(is_delay_line("DELAY 500"));
        assert!(is_delay_line("DEFAULT_DELAY 20"));
        assert!(!is_delay_line("DELAYED"));
        assert!(!is_delay_line("STRING DELAY 5"));
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("STRING a b"), ("STRING", "a b"));
        assert_eq!(split_command("ENTER"), ("ENTER", ""));
    }
}
