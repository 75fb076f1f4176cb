//! Encode invoker
//!
//! Writes the final lines to a private scratch file, clears the output path,
//! then either runs the external encoder (binary dialects) or promotes the
//! scratch file itself (text dialects).
//!
//! # Limitations
//!
//! - The encoder runs synchronously with no timeout; a hung encoder hangs the
//!   caller.
//! - Deleting an existing output and writing the new one is not atomic.
//! - The encoder is never retried.

use crate::error::{ForgeError, Result};
use crate::layout::KeyboardLayout;
use crate::process_guard::{CommandProcessGroup, EncoderSlot};
use crate::types::DeviceFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How to launch the external encoder.
///
/// The final command line is `program args... -i <input> -o <output> -l <layout>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EncoderCommand {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec!["-jar".to_string(), "encoder.jar".to_string()],
        }
    }
}

impl EncoderCommand {
    fn command(&self, input: &Path, output: &Path, layout: &KeyboardLayout) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg("-l")
            .arg(layout.as_str());
        cmd
    }
}

/// Outcome of one encoder run
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Exit code (None if terminated by signal). Informational only.
    pub exit_code: Option<i32>,
    /// Everything the encoder wrote to stderr
    pub stderr: String,
    /// Whether the output path exists as a file after the run
    pub artifact_exists: bool,
}

impl ProcessResult {
    /// Success means silence on stderr and an output file on disk.
    pub fn is_success(&self) -> bool {
        self.stderr.is_empty() && self.artifact_exists
    }

    /// Turn a failed run into `EncodingFailure` for `path`.
    pub fn ensure_success(&self, path: &Path) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }

        let mut problems = Vec::new();
        if !self.stderr.is_empty() {
            problems.push(format!("encoder reported: {}", self.stderr.trim()));
        }
        if !self.artifact_exists {
            problems.push("no output file was created".to_string());
        }
        if let Some(code) = self.exit_code {
            problems.push(format!("exit code {}", code));
        }
        Err(ForgeError::encoding(path, problems.join("; ")))
    }
}

/// Final artifact written to the caller's output path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledArtifact {
    /// Transformed script text
    Text(PathBuf),
    /// Binary produced by the encoder
    Binary(PathBuf),
}

impl CompiledArtifact {
    pub fn path(&self) -> &Path {
        match self {
            Self::Text(path) | Self::Binary(path) => path,
        }
    }
}

/// Produce the artifact for `lines` at `output`.
pub fn invoke(
    lines: &[String],
    format: DeviceFormat,
    layout: &KeyboardLayout,
    output: &Path,
    encoder: &EncoderCommand,
) -> Result<CompiledArtifact> {
    let scratch_dir = tempfile::Builder::new().prefix("duckforge-").tempdir()?;
    let scratch = scratch_dir.path().join("payload.txt");
    fs::write(&scratch, lines.join("\n"))?;
    log::debug!("Wrote {} line(s) to scratch file {:?}", lines.len(), scratch);

    clear_output(output)?;

    match format {
        DeviceFormat::Plain => {
            let result = run_encoder(encoder, &scratch, output, layout)?;
            if let Err(e) = result.ensure_success(output) {
                discard_rejected_output(output);
                return Err(e);
            }
            log::info!("Injection compiled successfully -> {}", output.display());
            Ok(CompiledArtifact::Binary(output.to_path_buf()))
        }
        DeviceFormat::Bracketed | DeviceFormat::DelayedTag => {
            promote(&scratch, output)?;
            log::info!("Payload written -> {}", output.display());
            Ok(CompiledArtifact::Text(output.to_path_buf()))
        }
    }
}

/// Delete a pre-existing output; failure aborts before any encoding.
fn clear_output(output: &Path) -> Result<()> {
    if fs::symlink_metadata(output).is_err() {
        return Ok(());
    }

    log::warn!("Overwriting existing {}", output.display());
    fs::remove_file(output).map_err(|source| ForgeError::OutputUnwritable {
        path: output.to_path_buf(),
        source,
    })
}

/// An encoder that complained may still have written something; never leave
/// that behind as if it were a valid artifact.
fn discard_rejected_output(output: &Path) {
    if !output.is_file() {
        return;
    }
    log::warn!("Removing rejected encoder output {}", output.display());
    if let Err(e) = fs::remove_file(output) {
        log::error!("Failed to remove {}: {}", output.display(), e);
    }
}

/// Move the scratch file into place, copying when a rename cannot cross
/// filesystems.
fn promote(scratch: &Path, output: &Path) -> Result<()> {
    let unwritable = |source| ForgeError::OutputUnwritable {
        path: output.to_path_buf(),
        source,
    };

    if let Err(e) = fs::rename(scratch, output) {
        log::debug!("Rename of scratch file failed ({}), copying instead", e);
        fs::copy(scratch, output).map_err(unwritable)?;
    }
    Ok(())
}

fn run_encoder(
    encoder: &EncoderCommand,
    input: &Path,
    output: &Path,
    layout: &KeyboardLayout,
) -> Result<ProcessResult> {
    let mut cmd = encoder.command(input, output, layout);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group();

    log::info!("Running encoder: {:?}", cmd);

    let child = cmd.spawn().map_err(|e| {
        ForgeError::encoding(output, format!("failed to start '{}': {}", encoder.program, e))
    })?;
    let waited = {
        let _tracked = EncoderSlot::global().track(child.id());
        child.wait_with_output()
    };

    let process = waited.map_err(|e| {
        ForgeError::encoding(output, format!("failed waiting for encoder: {}", e))
    })?;

    let result = ProcessResult {
        exit_code: process.status.code(),
        stderr: String::from_utf8_lossy(&process.stderr).to_string(),
        artifact_exists: output.is_file(),
    };
    log::debug!(
        "Encoder exited with {:?}, stderr {} byte(s), artifact present: {}",
        result.exit_code,
        result.stderr.len(),
        result.artifact_exists
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_result_success() {
        let result = ProcessResult {
            exit_code: Some(0),
            stderr: String::new(),
            artifact_exists: true,
        };
        assert!(result.is_success());
        assert!(result.ensure_success(Path::new("inject.bin")).is_ok());
    }

    #[test]
    fn test_stderr_output_is_failure_even_with_artifact() {
        let result = ProcessResult {
            exit_code: Some(0),
            stderr: "Exception in thread main".to_string(),
            artifact_exists: true,
        };
        assert!(!result.is_success());
        let err = result.ensure_success(Path::new("inject.bin")).unwrap_err();
        assert!(err.to_string().contains("Exception"));
    }

    #[test]
    fn test_missing_artifact_is_failure_even_when_silent() {
        let result = ProcessResult {
            exit_code: Some(0),
            stderr: String::new(),
            artifact_exists: false,
        };
        match result.ensure_success(Path::new("out/inject.bin")) {
            Err(ForgeError::EncodingFailure { path, detail }) => {
                assert_eq!(path, PathBuf::from("out/inject.bin"));
                assert!(detail.contains("no output file"));
            }
            other => panic!("expected EncodingFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_command_line_shape() {
        let encoder = EncoderCommand::default();
        let layout = crate::layout::LayoutAllowList::default()
            .validate("us")
            .unwrap();
        let cmd = encoder.command(Path::new("/tmp/in"), Path::new("/tmp/out"), &layout);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(cmd.get_program(), "java");
        assert_eq!(
            args,
            vec!["-jar", "encoder.jar", "-i", "/tmp/in", "-o", "/tmp/out", "-l", "us"]
        );
    }
}
