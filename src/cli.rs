use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::DeviceFormat;

/// duckforge - prepare keystroke-injection payloads for HID devices
#[derive(Parser, Debug)]
#[command(name = "duckforge")]
#[command(about = "Resolve, reshape, humanize and encode keystroke-injection payloads")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG still overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults/settings file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available payload templates
    List {
        /// Directory holding payload templates
        #[arg(short, long, default_value = "payloads")]
        payloads: PathBuf,
    },
    /// Show the arguments of a payload and the generator settings
    Options {
        /// Payload name as shown by `list`
        payload: String,
        /// Directory holding payload templates
        #[arg(short, long, default_value = "payloads")]
        payloads: PathBuf,
    },
    /// Generate a payload artifact
    Generate {
        /// Payload name as shown by `list`
        payload: String,
        /// Directory holding payload templates
        #[arg(short, long, default_value = "payloads")]
        payloads: PathBuf,
        /// Argument override, NAME=VALUE (repeatable)
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// Target device dialect (plain/ducky, bracketed/bunny, delayed-tag/omg)
        #[arg(short, long, default_value = "plain")]
        format: DeviceFormat,
        /// Keyboard layout code
        #[arg(short, long, default_value = "us")]
        layout: String,
        /// Average typing delay in ms (0 disables humanization)
        #[arg(long, value_name = "MS")]
        delay: Option<String>,
        /// Maximum deviation from the average delay in ms
        #[arg(long, value_name = "MS")]
        offset: Option<String>,
        /// Seed for reproducible typing delays
        #[arg(long)]
        seed: Option<u64>,
        /// Output path (defaults to inject.bin or payload.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the final script instead of writing an artifact
        #[arg(long, conflicts_with = "output")]
        print: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// Check that the encoder runtime is available
    Check,
}

/// Split `NAME=VALUE`; the value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
