//! Built-in splice defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use serde::{Deserialize, Serialize};

use crate::obfuscate::ObfuscationOptions;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Config module path, relative to the project root
    pub config_module: String,

    /// Constants module path, relative to the project root
    pub constants_module: String,

    /// Module path the config module imports the constants from
    pub constants_import: String,

    /// Bundler output directory, relative to the project root
    pub output_dir: String,

    /// Treat splice contract violations as errors (default: true)
    pub strict: bool,

    /// Remove previously emitted config scripts before writing (default: true)
    pub prune_stale: bool,

    /// Fail the build when the config script cannot be produced (default: false)
    pub fail_on_error: bool,

    /// Global namespace object (default: "window")
    pub global_namespace: String,

    /// Global property the app reads its config from (default: "EZ_CONFIG")
    pub global_name: String,

    /// Exported config binding (default: "config")
    pub export_name: String,

    /// Obfuscator command line (default: npx javascript-obfuscator)
    pub obfuscator_command: Vec<String>,

    /// Obfuscation transform settings
    pub obfuscation: ObfuscationOptions,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            config_module: "src/config/index.js".to_string(),
            constants_module: "src/config/constant.js".to_string(),
            constants_import: "@/config/constant".to_string(),
            output_dir: "dist".to_string(),
            strict: true,
            prune_stale: true,
            fail_on_error: false,
            global_namespace: "window".to_string(),
            global_name: "EZ_CONFIG".to_string(),
            export_name: "config".to_string(),
            obfuscator_command: vec!["npx".to_string(), "javascript-obfuscator".to_string()],
            obfuscation: ObfuscationOptions::default(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "config_module": self.config_module,
            "constants_module": self.constants_module,
            "constants_import": self.constants_import,
            "output_dir": self.output_dir,
            "strict": self.strict,
            "prune_stale": self.prune_stale,
            "fail_on_error": self.fail_on_error,
            "global": {
                "namespace": self.global_namespace,
                "name": self.global_name,
                "export": self.export_name
            },
            "build": {
                "production": false,
                "split_config": false,
                "obfuscate": false
            },
            "obfuscator": {
                "command": self.obfuscator_command,
                "options": self.obfuscation
            }
        })
    }
}
