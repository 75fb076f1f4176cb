//! Error handling module for duckforge
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every pipeline stage reports failures through `ForgeError`; the binary wraps
//! them with `anyhow` context where it loads files or dispatches commands.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the payload pipeline
#[derive(Error, Debug)]
pub enum ForgeError {
    /// The resolved template has no lines left after comment stripping
    #[error("payload is empty after resolution")]
    EmptyPayload,

    /// The template references a name the argument set does not provide
    #[error("unresolved placeholder: {{{name}}}")]
    UnresolvedPlaceholder { name: String },

    /// An enumerated argument holds a key its table does not define
    #[error("invalid value '{key}' for {name} (expected one of: {})", .allowed.join(", "))]
    InvalidEnumKey {
        name: String,
        key: String,
        allowed: Vec<String>,
    },

    /// Keyboard layout is not in the allow-list
    #[error("unsupported keyboard layout: {layout}")]
    InvalidLayout { layout: String },

    /// The output path could not be cleared or written
    #[error("unable to write output {}: {source}", .path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external encoder did not produce a clean artifact
    #[error("encoder failed to produce {}: {detail}", .path.display())]
    EncodingFailure { path: PathBuf, detail: String },

    /// Unbalanced braces in a template
    #[error("malformed template: {detail}")]
    MalformedTemplate { detail: String },

    /// Attempt to set an argument the template does not declare
    #[error("{name} is not a valid argument")]
    UnknownArgument { name: String },

    /// A numeric setting failed type validation
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidSetting {
        name: String,
        value: String,
        reason: String,
    },

    /// IO errors (template reads, payload discovery, scratch files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ForgeError>;

// Convenient error constructors
impl ForgeError {
    /// Create a malformed-template error
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedTemplate {
            detail: detail.into(),
        }
    }

    /// Create an encoding failure for `path`
    pub fn encoding(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::EncodingFailure {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create an invalid-setting error
    pub fn setting(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
