//! After-emit step: splice, obfuscate and write the config script
//!
//! Runs once per production build, after the bundler has written its output.
//! Failures are best-effort by default: they are logged as warnings and the
//! build carries on without the external config script.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ez_module::{splice, SpliceError, Violation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{BuildFlags, Settings};
use crate::filename::OutputFilename;
use crate::obfuscate::{JavaScriptObfuscatorCli, ObfuscateError, Obfuscator, Passthrough};
use crate::template::{ConfigDelivery, TemplateParameters};

/// Gating decision for one build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    /// Production build with split config enabled
    pub enabled: bool,
    /// Obfuscate the emitted script
    pub obfuscate: bool,
    pub filename: Option<OutputFilename>,
    pub template_parameters: TemplateParameters,
}

impl BuildPlan {
    /// Decide gating from the build flags. `filename` is used only when enabled.
    pub fn new(build: BuildFlags, filename: OutputFilename) -> Self {
        let enabled = build.production && build.split_config;
        let delivery = if enabled {
            ConfigDelivery::External(filename)
        } else {
            ConfigDelivery::Inline
        };
        Self::for_delivery(&delivery, enabled && build.obfuscate)
    }

    fn for_delivery(delivery: &ConfigDelivery, obfuscate: bool) -> Self {
        Self {
            enabled: delivery.filename().is_some(),
            obfuscate,
            filename: delivery.filename().cloned(),
            template_parameters: delivery.template_parameters(),
        }
    }

    pub fn delivery(&self) -> ConfigDelivery {
        match &self.filename {
            Some(name) if self.enabled => ConfigDelivery::External(name.clone()),
            _ => ConfigDelivery::Inline,
        }
    }
}

/// Digest of one input module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDigest {
    pub path: PathBuf,
    pub sha256: String,
}

/// Result of a successful emit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitSummary {
    pub filename: OutputFilename,
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
    pub obfuscated: bool,
    pub config_module: InputDigest,
    pub constants_module: InputDigest,
    /// Stale config scripts removed before writing
    pub pruned: Vec<PathBuf>,
    /// Lenient-mode contract violations
    pub warnings: Vec<Violation>,
}

/// Emit errors
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("splice failed: {0}")]
    Splice(#[from] SpliceError),

    #[error("obfuscation failed: {0}")]
    Obfuscate(#[from] ObfuscateError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EmitError {
    /// Process exit code for `fail_on_error` mode
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::Read { .. } => 2,
            Self::Splice(_) => 10,
            Self::Obfuscate(_) => 20,
            Self::Write { .. } => 30,
        }
    }
}

/// Obfuscator selected by the plan
pub fn obfuscator_for(plan: &BuildPlan, settings: &Settings) -> Box<dyn Obfuscator> {
    if plan.obfuscate {
        Box::new(JavaScriptObfuscatorCli::new(
            settings.obfuscator.command.clone(),
            settings.obfuscator.options.clone(),
        ))
    } else {
        Box::new(Passthrough)
    }
}

/// Read, splice and (optionally) obfuscate. Returns `None` when the build is
/// not gated in.
pub fn emit(
    project_root: &Path,
    settings: &Settings,
    plan: &BuildPlan,
    obfuscator: &dyn Obfuscator,
) -> Result<Option<EmitSummary>, EmitError> {
    let filename = match plan.delivery() {
        ConfigDelivery::Inline => {
            debug!("split config disabled; nothing to emit");
            return Ok(None);
        }
        ConfigDelivery::External(name) => name,
    };

    let paths = settings.resolve_paths(project_root);
    let (config_src, config_digest) = read_input(&paths.config_module)?;
    let (constants_src, constants_digest) = read_input(&paths.constants_module)?;

    let spliced = splice(&config_src, &constants_src, &settings.splice_options())?;
    for warning in &spliced.warnings {
        warn!(violation = %warning, "splice contract violation ignored");
    }

    let text = if plan.obfuscate {
        obfuscator.obfuscate(&spliced.text)?
    } else {
        spliced.text
    };

    fs::create_dir_all(&paths.output_dir).map_err(|e| EmitError::Write {
        path: paths.output_dir.clone(),
        source: e,
    })?;

    let pruned = if settings.prune_stale {
        prune_stale(&paths.output_dir, Some(&filename))?
    } else {
        Vec::new()
    };

    let path = paths.output_dir.join(filename.as_str());
    write_atomic(&path, text.as_bytes())?;
    info!(path = %path.display(), obfuscated = plan.obfuscate, "wrote config script");

    Ok(Some(EmitSummary {
        filename,
        path,
        sha256: sha256_hex(text.as_bytes()),
        size: text.len() as u64,
        obfuscated: plan.obfuscate,
        config_module: InputDigest {
            path: paths.config_module,
            sha256: config_digest,
        },
        constants_module: InputDigest {
            path: paths.constants_module,
            sha256: constants_digest,
        },
        pruned,
        warnings: spliced.warnings,
    }))
}

/// [`emit`] with the catch-and-warn handling: unless `fail_on_error` is set,
/// any failure is logged and reported as "nothing emitted".
pub fn emit_best_effort(
    project_root: &Path,
    settings: &Settings,
    plan: &BuildPlan,
    obfuscator: &dyn Obfuscator,
) -> Result<Option<EmitSummary>, EmitError> {
    match emit(project_root, settings, plan, obfuscator) {
        Ok(summary) => Ok(summary),
        Err(e) if settings.fail_on_error => Err(e),
        Err(e) => {
            warn!(error = %e, "config script not emitted; build continues");
            Ok(None)
        }
    }
}

/// Remove config scripts left by earlier builds, keeping `keep`.
pub fn prune_stale(
    output_dir: &Path,
    keep: Option<&OutputFilename>,
) -> Result<Vec<PathBuf>, EmitError> {
    let mut removed = Vec::new();
    for entry in WalkDir::new(output_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| EmitError::Write {
            path: output_dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !OutputFilename::is_match(&name) || keep.is_some_and(|k| k.as_str() == name) {
            continue;
        }
        fs::remove_file(entry.path()).map_err(|e| EmitError::Write {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        debug!(path = %entry.path().display(), "pruned stale config script");
        removed.push(entry.path().to_path_buf());
    }
    removed.sort();
    Ok(removed)
}

fn read_input(path: &Path) -> Result<(String, String), EmitError> {
    let bytes = fs::read(path).map_err(|e| EmitError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let digest = sha256_hex(&bytes);
    let text = String::from_utf8(bytes).map_err(|e| EmitError::Read {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;
    Ok((text, digest))
}

/// Write via a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), EmitError> {
    let write_err = |e: io::Error| EmitError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
