//! Post-splice obfuscation
//!
//! The spliced script can be passed through an external obfuscator before it
//! is written. [`Passthrough`] is used when obfuscation is disabled.

mod cli;
mod options;

pub use cli::JavaScriptObfuscatorCli;
pub use options::ObfuscationOptions;

/// Transforms a script into an equivalent, harder to read one.
pub trait Obfuscator {
    fn obfuscate(&self, source: &str) -> Result<String, ObfuscateError>;
}

/// Identity obfuscator
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Obfuscator for Passthrough {
    fn obfuscate(&self, source: &str) -> Result<String, ObfuscateError> {
        Ok(source.to_string())
    }
}

/// Obfuscation errors
#[derive(Debug, thiserror::Error)]
pub enum ObfuscateError {
    #[error("obfuscator command is empty")]
    EmptyCommand,

    #[error("failed to start obfuscator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("obfuscator exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error("obfuscator produced no output file")]
    MissingOutput,

    #[error("invalid obfuscator options: {0}")]
    Options(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_is_identity() {
        let src = "window.EZ_CONFIG = { v: 1 };";
        assert_eq!(Passthrough.obfuscate(src).unwrap(), src);
    }
}
