//! Logging setup and CLI flags.
//!
//! Events go to stderr so `plan`/`splice`/`config` output on stdout stays
//! machine readable.

use std::env;

use clap::Args;
use tracing_subscriber::EnvFilter;

/// Logging controls for the CLI.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Set log level to trace (our crates only)
    #[arg(long, global = true, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set log level to debug (our crates only)
    #[arg(long, global = true, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single log level for our crates (error|warn|info|debug|trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    /// e.g. "ez_config_splice=debug,ez_module=trace"
    #[arg(long, global = true)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Filter spec for these flags.
    pub fn spec(&self) -> String {
        compute_spec(
            self.trace,
            self.debug,
            self.log_level.as_deref(),
            self.log_filter.as_deref(),
        )
    }
}

/// Crate targets that constitute "our" logs.
pub fn our_crates() -> &'static [&'static str] {
    &["ez_splice", "ez_config_splice", "ez_module"]
}

/// Build a filter directive string that sets the same `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|t| format!("{}={}", t, lvl))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    env::var("RUST_LOG").unwrap_or_else(|_| level_spec_for("info"))
}

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(args: &LogArgs) {
    let filter = EnvFilter::new(args.spec());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_wins() {
        assert_eq!(
            compute_spec(true, false, Some("warn"), Some("ez_module=trace")),
            "ez_module=trace"
        );
    }

    #[test]
    fn test_trace_before_level() {
        let spec = compute_spec(true, false, Some("warn"), None);
        assert!(spec.contains("ez_config_splice=trace"));
        assert!(!spec.contains("warn"));
    }

    #[test]
    fn test_level_is_crate_scoped() {
        assert_eq!(
            compute_spec(false, false, Some("WARN"), None),
            "ez_splice=warn,ez_config_splice=warn,ez_module=warn"
        );
    }

    #[test]
    fn test_args_spec() {
        let args = LogArgs {
            debug: true,
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), level_spec_for("debug"));
    }
}
