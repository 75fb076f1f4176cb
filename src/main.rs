//! duckforge - main entry point
//!
//! Thin command dispatch over the library pipeline.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::path::Path;

use duckforge::cli::{Cli, Commands};
use duckforge::humanize::parse_setting;
use duckforge::pipeline::{self, PipelineConfig};
use duckforge::sanity::verify_environment;
use duckforge::{process_guard, ArgumentSet, DeviceFormat, ForgeConfig, PayloadCatalog, ScriptTemplate};

/// Initialize the logger with appropriate settings
fn init_logger(verbose: bool) {
    use env_logger::Builder;
    use std::io::Write;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Main application entry point
fn main() {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed");

    // Encoders get cleaned up if we are interrupted mid-compile
    if let Err(e) = process_guard::init_signal_handlers() {
        log::warn!("Failed to initialize signal handlers: {}", e);
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ForgeConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::List { payloads } => list_payloads(&payloads),
        Commands::Options { payload, payloads } => show_options(&config, &payloads, &payload),
        Commands::Generate {
            payload,
            payloads,
            set,
            format,
            layout,
            delay,
            offset,
            seed,
            output,
            print,
        } => {
            config.validate()?;
            // Reject a bad layout before touching the payload directory
            config.layout_allow_list().validate(&layout)?;
            let template = load_payload(&payloads, &payload)?;

            let mut args = ArgumentSet::from_template(&template, &config.arguments);
            for (name, value) in &set {
                args.set(name, value.as_str())?;
            }

            let mut humanization = config.humanize;
            if let Some(delay) = delay {
                humanization.average_delay_ms = parse_setting("TYPING_DELAY", &delay)?;
            }
            if let Some(offset) = offset {
                humanization.offset_ms = parse_setting("TYPING_DELAY_OFFSET", &offset)?;
            }

            let pipeline_config = PipelineConfig {
                format,
                layout,
                allowed_layouts: config.layout_allow_list(),
                humanization,
                seed,
                output: output.unwrap_or_else(|| format.default_output().into()),
                encoder: config.encoder.clone(),
            };

            if print {
                let rendered = pipeline::render(
                    &template,
                    &args,
                    &config.enumerations(),
                    &pipeline_config,
                )?;
                println!("\n{}", rendered.lines.join("\n"));
                return Ok(());
            }

            if format == DeviceFormat::Plain {
                let check = verify_environment(&pipeline_config.encoder);
                if !check.is_ok() {
                    anyhow::bail!(
                        "unable to locate: {}",
                        check.missing_binaries.join(", ")
                    );
                }
            }

            let compilation =
                pipeline::compile(&template, &args, &config.enumerations(), pipeline_config)?;
            for warning in &compilation.warnings {
                println!("! {}", warning);
            }
            println!("✓ Payload written to {}", compilation.artifact.path().display());
            Ok(())
        }
        Commands::Validate { config } => {
            info!("Validating configuration file: {:?}", config);
            let loaded = ForgeConfig::load_from_file(&config)?;
            loaded.validate()?;
            println!("✓ Configuration file is valid: {}", config.display());
            Ok(())
        }
        Commands::Check => {
            let check = verify_environment(&config.encoder);
            if check.is_ok() {
                println!("✓ Encoder runtime found: {}", config.encoder.program);
                Ok(())
            } else {
                anyhow::bail!("unable to locate: {}", check.missing_binaries.join(", "))
            }
        }
    }
}

fn load_payload(payloads: &Path, name: &str) -> Result<ScriptTemplate> {
    let catalog = PayloadCatalog::scan(payloads)
        .with_context(|| format!("Failed to read payload directory {:?}", payloads))?;
    let entry = catalog
        .get(name)
        .with_context(|| format!("invalid payload: {}", name))?;
    info!("Using payload: {}", entry.name);
    Ok(ScriptTemplate::load(&entry.path)?)
}

fn print_table(headers: (&str, &str), rows: &[(String, String)]) {
    let width = rows
        .iter()
        .map(|(left, _)| left.chars().count())
        .chain(std::iter::once(headers.0.len()))
        .max()
        .unwrap_or(0);

    println!("{:<width$}  {}", headers.0, headers.1, width = width);
    println!("{:<width$}  {}", "-".repeat(width), "-".repeat(headers.1.len()), width = width);
    for (left, right) in rows {
        println!("{:<width$}  {}", left, right, width = width);
    }
}

fn list_payloads(payloads: &Path) -> Result<()> {
    let catalog = PayloadCatalog::scan(payloads)
        .with_context(|| format!("Failed to read payload directory {:?}", payloads))?;

    let rows: Vec<(String, String)> = catalog
        .entries()
        .iter()
        .map(|entry| {
            (
                entry.name.clone(),
                entry.description.clone().unwrap_or_default(),
            )
        })
        .collect();

    println!();
    print_table(("Payload", "Description"), &rows);
    Ok(())
}

fn show_options(config: &ForgeConfig, payloads: &Path, name: &str) -> Result<()> {
    let template = load_payload(payloads, name)?;
    let args = ArgumentSet::from_template(&template, &config.arguments);
    let enums = config.enumerations();

    println!("\n Payload: {}\n", name);

    let generator = vec![
        (
            "TYPING_DELAY".to_string(),
            config.humanize.average_delay_ms.to_string(),
        ),
        (
            "TYPING_DELAY_OFFSET".to_string(),
            config.humanize.offset_ms.to_string(),
        ),
    ];
    print_table(("Generator arguments", "Value"), &generator);
    println!();

    let rows: Vec<(String, String)> = args
        .iter()
        .map(|(arg, value)| {
            let shown = match enums.get(arg) {
                Some(table) => format!(
                    "{} [{}]",
                    value,
                    table.keys().cloned().collect::<Vec<_>>().join("|")
                ),
                None => value.to_string(),
            };
            (arg.to_string(), shown)
        })
        .collect();
    print_table(("Payload arguments", "Value"), &rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use duckforge::ForgeError;

    #[test]
    fn test_generate_rejects_layout_before_reading_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-payloads-here");
        let output = dir.path().join("payload.txt");

        let cli = Cli::try_parse_from([
            "duckforge",
            "generate",
            "hello.txt",
            "--payloads",
            missing.to_str().unwrap(),
            "--format",
            "bracketed",
            "--layout",
            "qwertz-xx",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let err = run(cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForgeError>(),
            Some(ForgeError::InvalidLayout { .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_generate_with_valid_layout_reads_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-payloads-here");

        let cli = Cli::try_parse_from([
            "duckforge",
            "generate",
            "hello.txt",
            "--payloads",
            missing.to_str().unwrap(),
            "--layout",
            "us",
            "--print",
        ])
        .unwrap();

        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("Failed to read payload directory"));
    }
}
