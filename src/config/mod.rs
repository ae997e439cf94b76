//! Configuration merge system
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in defaults
//! 2. Project config (ez-splice.toml)
//! 3. Build environment flags (NODE_ENV, VUE_APP_CONFIGJS, VUE_APP_OBFUSCATION)
//! 4. CLI flags

mod defaults;
mod effective;
mod env;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, PROJECT_CONFIG_FILE};
pub use env::{BuildEnv, NODE_ENV, OBFUSCATION_VAR, SPLIT_CONFIG_VAR};
pub use merge::{deep_merge, merge_layers, parse_assignment, value_at_path};
pub use settings::{BuildFlags, GlobalSettings, ObfuscatorSettings, ResolvedPaths, Settings};
