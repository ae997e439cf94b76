//! Effective configuration with full provenance
//!
//! The effective config captures the merged configuration plus
//! information about where each value came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::env::BuildEnv;
use super::merge::merge_layers;
use super::settings::Settings;

/// Schema version for effective config output
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "ez-splice/effective_config@1";

/// Default project config file name
pub const PROJECT_CONFIG_FILE: &str = "ez-splice.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Project,
    Env,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (project layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (project layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build effective config from layers
    pub fn build(
        project_config_path: Option<&Path>,
        build_env: &BuildEnv,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: Project config (optional file)
        if let Some(path) = project_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Project,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        // Layer 3: Build environment flags
        if !build_env.is_empty() {
            layers.push(build_env.to_value());
            sources.push(ConfigSource {
                origin: ConfigOrigin::Env,
                path: None,
                digest: None,
            });
        }

        // Layer 4: CLI overrides
        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        Self::validate_config(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Validate configuration values
    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        for key in ["namespace", "name", "export"] {
            let path = format!("global.{}", key);
            let value = config
                .pointer(&format!("/global/{}", key))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if !is_identifier(value) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a JavaScript identifier, got '{}'",
                    path, value
                )));
            }
        }

        for key in ["control_flow_flattening_threshold", "string_array_threshold"] {
            if let Some(t) = config
                .pointer(&format!("/obfuscator/options/{}", key))
                .and_then(|v| v.as_f64())
            {
                if !(0.0..=1.0).contains(&t) {
                    return Err(ConfigError::ValidationError(format!(
                        "obfuscator.options.{} must be in [0, 1]",
                        key
                    )));
                }
            }
        }

        let command_ok = config
            .pointer("/obfuscator/command")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty());
        if !command_ok {
            return Err(ConfigError::ValidationError(
                "obfuscator.command must name a program".to_string(),
            ));
        }

        for key in ["config_module", "constants_module", "constants_import", "output_dir"] {
            let ok = config
                .get(key)
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.trim().is_empty());
            if !ok {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a non-empty string",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Typed settings from the merged value
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::ParseError(format!("invalid settings: {}", e)))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Get a config value as string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    /// Get a config value as bool
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }
}

/// True if `s` is a plain ASCII JavaScript identifier.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, &BuildEnv::default(), None).unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.get_str("output_dir"), Some("dist"));
        assert_eq!(config.get_bool("build.production"), Some(false));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_env_layer_overrides_defaults() {
        let env = BuildEnv::from_vars([("NODE_ENV", "production"), ("VUE_APP_CONFIGJS", "true")]);
        let config = EffectiveConfig::build(None, &env, None).unwrap();

        assert_eq!(config.get_bool("build.production"), Some(true));
        assert_eq!(config.get_bool("build.split_config"), Some(true));
        assert_eq!(config.get_bool("build.obfuscate"), Some(false));
        assert_eq!(config.sources[1].origin, ConfigOrigin::Env);
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = BuildEnv::from_vars([("VUE_APP_OBFUSCATION", "true")]);
        let cli = serde_json::json!({"build": {"obfuscate": false}, "strict": false});
        let config = EffectiveConfig::build(None, &env, Some(cli)).unwrap();

        assert_eq!(config.get_bool("build.obfuscate"), Some(false));
        assert_eq!(config.get_bool("strict"), Some(false));
    }

    #[test]
    fn test_project_file_layer() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "output_dir = \"public/dist\"").unwrap();
        writeln!(temp, "[global]").unwrap();
        writeln!(temp, "name = \"SHOP_CONFIG\"").unwrap();
        writeln!(temp, "[obfuscator.options]").unwrap();
        writeln!(temp, "string_array_threshold = 0.5").unwrap();

        let config = EffectiveConfig::build(Some(temp.path()), &BuildEnv::default(), None).unwrap();

        assert_eq!(config.get_str("output_dir"), Some("public/dist"));
        assert_eq!(config.get_str("global.name"), Some("SHOP_CONFIG"));
        assert_eq!(config.get_str("global.namespace"), Some("window"));
        assert_eq!(config.sources[1].origin, ConfigOrigin::Project);
        assert_eq!(config.sources[1].digest.as_ref().unwrap().len(), 64);

        let settings = config.settings().unwrap();
        assert_eq!(settings.obfuscator.options.string_array_threshold, 0.5);
        assert_eq!(settings.obfuscator.options.control_flow_flattening_threshold, 0.75);
    }

    #[test]
    fn test_missing_project_file_is_skipped() {
        let config = EffectiveConfig::build(
            Some(Path::new("/nonexistent/ez-splice.toml")),
            &BuildEnv::default(),
            None,
        )
        .unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "output_dir = ").unwrap();
        let err =
            EffectiveConfig::build(Some(temp.path()), &BuildEnv::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation_identifier() {
        let cli = serde_json::json!({"global": {"name": "EZ-CONFIG"}});
        let err = EffectiveConfig::build(None, &BuildEnv::default(), Some(cli)).unwrap_err();
        assert!(err.to_string().contains("global.name"));
    }

    #[test]
    fn test_validation_threshold() {
        let cli = serde_json::json!({"obfuscator": {"options": {"string_array_threshold": 1.5}}});
        let err = EffectiveConfig::build(None, &BuildEnv::default(), Some(cli)).unwrap_err();
        assert!(err.to_string().contains("string_array_threshold"));
    }

    #[test]
    fn test_validation_empty_command() {
        let cli = serde_json::json!({"obfuscator": {"command": []}});
        let err = EffectiveConfig::build(None, &BuildEnv::default(), Some(cli)).unwrap_err();
        assert!(err.to_string().contains("obfuscator.command"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("EZ_CONFIG"));
        assert!(is_identifier("$cfg"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }
}
