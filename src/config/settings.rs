//! Typed view of the merged configuration.

use std::path::{Path, PathBuf};

use ez_module::{AssignDirective, SpliceOptions};
use serde::{Deserialize, Serialize};

use crate::obfuscate::ObfuscationOptions;

/// Runtime global the config is assigned to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub namespace: String,
    pub name: String,
    /// Name of the exported config binding in the config module
    pub export: String,
}

/// Build mode flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFlags {
    pub production: bool,
    pub split_config: bool,
    pub obfuscate: bool,
}

/// External obfuscator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObfuscatorSettings {
    /// Program and leading arguments
    pub command: Vec<String>,
    pub options: ObfuscationOptions,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub config_module: PathBuf,
    pub constants_module: PathBuf,
    pub constants_import: String,
    pub output_dir: PathBuf,
    pub strict: bool,
    pub prune_stale: bool,
    pub fail_on_error: bool,
    pub global: GlobalSettings,
    pub build: BuildFlags,
    pub obfuscator: ObfuscatorSettings,
}

impl Settings {
    /// Splice options for the module renderer
    pub fn splice_options(&self) -> SpliceOptions {
        SpliceOptions {
            constants_path: self.constants_import.clone(),
            directive: AssignDirective {
                namespace: self.global.namespace.clone(),
                global_name: self.global.name.clone(),
                export_name: self.global.export.clone(),
            },
            strict: self.strict,
        }
    }

    /// Resolve the input and output paths against the project root
    pub fn resolve_paths(&self, project_root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            config_module: project_root.join(&self.config_module),
            constants_module: project_root.join(&self.constants_module),
            output_dir: project_root.join(&self.output_dir),
        }
    }
}

/// Absolute (root-joined) paths for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub config_module: PathBuf,
    pub constants_module: PathBuf,
    pub output_dir: PathBuf,
}
