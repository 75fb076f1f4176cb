//! Pre-flight checks for the encoder runtime
//!
//! Binary payloads need the external encoder. This verifies its program can be
//! found before a compilation starts, so a missing runtime is reported as such
//! rather than as an encoding failure.

use crate::encoder::EncoderCommand;
use std::path::Path;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty()
    }
}

/// Check if an executable is available (explicit path or any PATH entry)
fn binary_exists(name: &str) -> bool {
    match which::which(name) {
        Ok(path) => {
            log::debug!("Found {} at {:?}", name, path);
            true
        }
        Err(e) => {
            log::debug!("{} not usable: {}", name, e);
            false
        }
    }
}

/// Verify the programs the encoder command depends on
pub fn verify_environment(encoder: &EncoderCommand) -> SanityCheckResult {
    let mut missing = Vec::new();

    if !binary_exists(&encoder.program) {
        missing.push(encoder.program.clone());
    }

    // `java -jar <file>`: the jar itself must exist too
    if let Some(pos) = encoder.args.iter().position(|arg| arg == "-jar") {
        match encoder.args.get(pos + 1) {
            Some(jar) if Path::new(jar).is_file() => {}
            Some(jar) => missing.push(jar.clone()),
            None => log::debug!("'-jar' given without a file argument"),
        }
    }

    SanityCheckResult {
        missing_binaries: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sh_is_found() {
        let encoder = EncoderCommand {
            program: "sh".to_string(),
            args: Vec::new(),
        };
        assert!(verify_environment(&encoder).is_ok());
    }

    #[test]
    fn test_non_executable_program_is_missing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("fakejava");
        std::fs::write(&program, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o644)).unwrap();

        let encoder = EncoderCommand {
            program: program.to_string_lossy().to_string(),
            args: Vec::new(),
        };
        assert!(!verify_environment(&encoder).is_ok());

        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(verify_environment(&encoder).is_ok());
    }

    #[test]
    fn test_missing_program_and_jar_reported() {
        let encoder = EncoderCommand {
            program: "definitely-not-a-real-encoder-binary".to_string(),
            args: vec!["-jar".to_string(), "/nonexistent/encoder.jar".to_string()],
        };
        let result = verify_environment(&encoder);
        assert!(!result.is_ok());
        assert_eq!(
            result.missing_binaries,
            vec![
                "definitely-not-a-real-encoder-binary".to_string(),
                "/nonexistent/encoder.jar".to_string()
            ]
        );
    }
}
