//! Splice report
//!
//! Optional JSON record of one emit, written next to the build output for
//! auditing which inputs produced which config script.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use ez_module::Violation;
use serde::{Deserialize, Serialize};

use crate::emit::{EmitSummary, InputDigest};
use crate::filename::OutputFilename;
use crate::template::script_tag;

/// Schema version for splice reports
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "ez-splice/report@1";

/// Emitted script digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDigest {
    pub sha256: String,
    pub size: u64,
}

/// Record of one emitted config script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpliceReport {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When the script was emitted
    pub created_at: DateTime<Utc>,

    pub filename: OutputFilename,

    pub output: OutputDigest,

    pub obfuscated: bool,

    /// Config and constants modules, in that order
    pub inputs: Vec<InputDigest>,

    /// Markup injected into the HTML template
    pub script_tag: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Violation>,
}

impl SpliceReport {
    pub fn from_summary(summary: &EmitSummary) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            filename: summary.filename.clone(),
            output: OutputDigest {
                sha256: summary.sha256.clone(),
                size: summary.size,
            },
            obfuscated: summary.obfuscated,
            inputs: vec![summary.config_module.clone(), summary.constants_module.clone()],
            script_tag: script_tag(&summary.filename),
            warnings: summary.warnings.clone(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }

    /// Load from file
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))
    }
}
