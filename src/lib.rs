//! duckforge library
//!
//! Prepares keystroke-injection payloads: resolves template arguments,
//! reshapes the script for a device dialect, optionally humanizes typing
//! cadence, and produces the final artifact.

pub mod arguments;
pub mod catalog;
pub mod cli;
pub mod config_file;
pub mod encoder;
pub mod error;
pub mod humanize;
pub mod layout;
pub mod pipeline;
pub mod process_guard;
pub mod resolver;
pub mod sanity;
pub mod template;
pub mod transform;
pub mod types;

// Re-export main types for convenience
pub use arguments::{ArgumentSet, ArgumentValue, EnumerationMap, EnumerationTable};
pub use catalog::{PayloadCatalog, PayloadEntry};
pub use config_file::{ArgumentDefault, ForgeConfig};
pub use encoder::{invoke, CompiledArtifact, EncoderCommand, ProcessResult};
pub use error::{ForgeError, Result};
pub use humanize::{humanize, HumanizationConfig};
pub use layout::{KeyboardLayout, LayoutAllowList};
pub use pipeline::{compile, render, Compilation, PipelineConfig, Rendered};
pub use process_guard::{CommandProcessGroup, EncoderGuard, EncoderSlot};
pub use resolver::resolve;
pub use template::ScriptTemplate;
pub use transform::{transform, TransformWarning, Transformed};
pub use types::DeviceFormat;
