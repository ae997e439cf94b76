//! External `javascript-obfuscator` invocation

use std::fs;
use std::process::Command;

use tempfile::TempDir;
use tracing::debug;

use super::{ObfuscateError, ObfuscationOptions, Obfuscator};

const INPUT_FILE: &str = "input.js";
const OUTPUT_FILE: &str = "output.js";
const OPTIONS_FILE: &str = "options.json";

/// Runs the obfuscator CLI inside a scratch directory.
///
/// The program is invoked as
/// `<command...> input.js --output output.js --config options.json`
/// with the scratch directory as working directory.
#[derive(Debug, Clone)]
pub struct JavaScriptObfuscatorCli {
    command: Vec<String>,
    options: ObfuscationOptions,
}

impl JavaScriptObfuscatorCli {
    pub fn new(command: Vec<String>, options: ObfuscationOptions) -> Self {
        Self { command, options }
    }

    pub fn options(&self) -> &ObfuscationOptions {
        &self.options
    }
}

impl Obfuscator for JavaScriptObfuscatorCli {
    fn obfuscate(&self, source: &str) -> Result<String, ObfuscateError> {
        let (program, leading_args) = self
            .command
            .split_first()
            .ok_or(ObfuscateError::EmptyCommand)?;

        let scratch = TempDir::new().map_err(ObfuscateError::Io)?;
        let dir = scratch.path();
        fs::write(dir.join(INPUT_FILE), source).map_err(ObfuscateError::Io)?;
        let options = serde_json::to_vec_pretty(&self.options.to_obfuscator_json())
            .map_err(|e| ObfuscateError::Options(e.to_string()))?;
        fs::write(dir.join(OPTIONS_FILE), options).map_err(ObfuscateError::Io)?;

        debug!(program = %program, dir = %dir.display(), "running obfuscator");

        let output = Command::new(program)
            .args(leading_args)
            .args([INPUT_FILE, "--output", OUTPUT_FILE, "--config", OPTIONS_FILE])
            .current_dir(dir)
            .output()
            .map_err(|e| ObfuscateError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ObfuscateError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let out_path = dir.join(OUTPUT_FILE);
        if !out_path.exists() {
            return Err(ObfuscateError::MissingOutput);
        }
        fs::read_to_string(&out_path).map_err(ObfuscateError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_is_error() {
        let cli = JavaScriptObfuscatorCli::new(Vec::new(), ObfuscationOptions::default());
        let err = cli.obfuscate("var a = 1;").unwrap_err();
        assert!(matches!(err, ObfuscateError::EmptyCommand));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let cli = JavaScriptObfuscatorCli::new(
            vec!["ez-splice-no-such-obfuscator".to_string()],
            ObfuscationOptions::default(),
        );
        let err = cli.obfuscate("var a = 1;").unwrap_err();
        assert!(matches!(err, ObfuscateError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_that_writes_nothing_is_missing_output() {
        // `true` ignores its arguments and exits 0
        let cli =
            JavaScriptObfuscatorCli::new(vec!["true".to_string()], ObfuscationOptions::default());
        let err = cli.obfuscate("var a = 1;").unwrap_err();
        assert!(matches!(err, ObfuscateError::MissingOutput));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_failure() {
        let cli =
            JavaScriptObfuscatorCli::new(vec!["false".to_string()], ObfuscationOptions::default());
        let err = cli.obfuscate("var a = 1;").unwrap_err();
        assert!(matches!(err, ObfuscateError::Failed { status: Some(1), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_output_is_returned() {
        // sh -c '<script>' input.js --output output.js ... binds $0=input.js, $2=output.js
        let cli = JavaScriptObfuscatorCli::new(
            vec![
                "sh".to_string(),
                "-c".to_string(),
                "tr a-z A-Z < \"$0\" > \"$2\"".to_string(),
            ],
            ObfuscationOptions::default(),
        );
        let out = cli.obfuscate("window.ez_config = 1").unwrap();
        assert_eq!(out, "WINDOW.EZ_CONFIG = 1");
    }
}
