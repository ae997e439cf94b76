//! Build environment flags (layer 3)
//!
//! The host build passes its mode through the process environment:
//! `NODE_ENV=production`, `VUE_APP_CONFIGJS=true`, `VUE_APP_OBFUSCATION=true`.
//! Only the exact string `true` enables a boolean flag.

use std::env;

use serde_json::{Map, Value};

/// Production-mode variable
pub const NODE_ENV: &str = "NODE_ENV";

/// Split-config feature flag
pub const SPLIT_CONFIG_VAR: &str = "VUE_APP_CONFIGJS";

/// Obfuscation feature flag
pub const OBFUSCATION_VAR: &str = "VUE_APP_OBFUSCATION";

/// Flags read from the build environment. `None` means the variable was unset
/// and the layer leaves lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    pub production: Option<bool>,
    pub split_config: Option<bool>,
    pub obfuscate: Option<bool>,
}

impl BuildEnv {
    /// Read the flags from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Read the flags from an explicit set of variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut build_env = Self::default();
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                NODE_ENV => build_env.production = Some(value == "production"),
                SPLIT_CONFIG_VAR => build_env.split_config = Some(value == "true"),
                OBFUSCATION_VAR => build_env.obfuscate = Some(value == "true"),
                _ => {}
            }
        }
        build_env
    }

    /// True if no flag was present.
    pub fn is_empty(&self) -> bool {
        self.production.is_none() && self.split_config.is_none() && self.obfuscate.is_none()
    }

    /// Convert to a merge layer containing only the flags that were set.
    pub fn to_value(&self) -> Value {
        let mut build = Map::new();
        if let Some(v) = self.production {
            build.insert("production".to_string(), Value::Bool(v));
        }
        if let Some(v) = self.split_config {
            build.insert("split_config".to_string(), Value::Bool(v));
        }
        if let Some(v) = self.obfuscate {
            build.insert("obfuscate".to_string(), Value::Bool(v));
        }
        serde_json::json!({ "build": build })
    }
}
