//! EZ Config Splice - build-time runtime-config emitter
//!
//! Splices the application's constants module into its config module and
//! emits the result as a standalone, optionally obfuscated script that the
//! entry HTML loads through its own `<script>` tag. Config updates then no
//! longer require a new application bundle.

pub mod config;
pub mod emit;
pub mod filename;
pub mod logging;
pub mod obfuscate;
mod patterns;
pub mod report;
pub mod template;

pub use config::{BuildEnv, ConfigError, EffectiveConfig, Settings};
pub use emit::{emit, emit_best_effort, prune_stale, BuildPlan, EmitError, EmitSummary};
pub use filename::OutputFilename;
pub use obfuscate::{JavaScriptObfuscatorCli, ObfuscationOptions, Obfuscator, Passthrough};
pub use report::SpliceReport;
pub use template::{inject_file, inject_into_html, ConfigDelivery, TemplateParameters};
