//! Keystroke humanization.
//!
//! Expands `STRING` lines into one keystroke per character, each followed by a
//! random `DELAY` drawn from `[min_delay, max_delay]`. This is the only stage
//! that uses randomness; callers pass the RNG in so output can be reproduced
//! with a seeded generator.

use crate::error::{ForgeError, Result};
use crate::types::{split_command, BRACKETED_PREFIX, DELAY_COMMAND, SPACE_COMMAND, STRING_COMMAND};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Typing-delay settings in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanizationConfig {
    #[serde(rename = "average_delay", default)]
    pub average_delay_ms: u32,
    #[serde(rename = "offset", default)]
    pub offset_ms: u32,
}

impl HumanizationConfig {
    pub fn new(average_delay_ms: u32, offset_ms: u32) -> Self {
        Self {
            average_delay_ms,
            offset_ms,
        }
    }

    /// Build from string settings, rejecting anything that is not a
    /// non-negative integer.
    pub fn from_settings(average: &str, offset: &str) -> Result<Self> {
        Ok(Self {
            average_delay_ms: parse_setting("TYPING_DELAY", average)?,
            offset_ms: parse_setting("TYPING_DELAY_OFFSET", offset)?,
        })
    }

    pub fn min_delay(&self) -> u32 {
        self.average_delay_ms.saturating_sub(self.offset_ms)
    }

    pub fn max_delay(&self) -> u32 {
        self.average_delay_ms.saturating_add(self.offset_ms)
    }

    /// Humanization runs only with a positive average and upper bound.
    pub fn is_active(&self) -> bool {
        self.average_delay_ms > 0 && self.max_delay() > 0
    }
}

/// Parse one typing-delay setting.
pub fn parse_setting(name: &str, value: &str) -> Result<u32> {
    let value = value.trim();
    match value.parse::<i64>() {
        Ok(n) if n < 0 => Err(ForgeError::setting(name, value, "must be 0 or higher")),
        Ok(n) => u32::try_from(n).map_err(|_| ForgeError::setting(name, value, "too large")),
        Err(_) => Err(ForgeError::setting(name, value, "must be a number")),
    }
}

/// Split an optional bracketed-dialect prefix off a line.
fn split_prefix(line: &str) -> (Option<&str>, &str) {
    match line.split_once(' ') {
        Some((BRACKETED_PREFIX, rest)) => (Some(BRACKETED_PREFIX), rest),
        _ => (None, line),
    }
}

/// Expand literal-string lines into per-character keystrokes and delays.
///
/// Identity when `config` is inactive.
pub fn humanize<R: Rng + ?Sized>(
    lines: Vec<String>,
    config: &HumanizationConfig,
    rng: &mut R,
) -> Vec<String> {
    if !config.is_active() {
        return lines;
    }

    let (min, max) = (config.min_delay(), config.max_delay());
    let mut output = Vec::with_capacity(lines.len());
    let mut expanded = 0usize;

    for line in lines {
        let (prefix, instruction) = split_prefix(&line);
        let (command, text) = split_command(instruction);
        if command != STRING_COMMAND || text.is_empty() {
            output.push(line);
            continue;
        }

        let emit = |body: String| match prefix {
            Some(prefix) => format!("{} {}", prefix, body),
            None => body,
        };

        for c in text.chars() {
            if c == ' ' {
                output.push(emit(SPACE_COMMAND.to_string()));
            } else {
                output.push(emit(format!("{} {}", STRING_COMMAND, c)));
            }
            let delay = rng.random_range(min..=max);
            output.push(emit(format!("{} {}", DELAY_COMMAND, delay)));
        }
        expanded += 1;
    }

    log::debug!(
        "Humanized {} STRING line(s) with delays in [{}, {}] ms",
        expanded,
        min,
        max
    );
    output
}
