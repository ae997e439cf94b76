//! EZ Config Splice CLI
//!
//! Entry point for the `ez-splice` command-line tool.

use clap::{Args, Parser, Subcommand};
use ez_config_splice::config::{
    merge_layers, parse_assignment, BuildEnv, ConfigError, EffectiveConfig, Settings,
    PROJECT_CONFIG_FILE,
};
use ez_config_splice::emit::{emit_best_effort, obfuscator_for, BuildPlan, EmitError};
use ez_config_splice::logging::{self, LogArgs};
use ez_config_splice::{inject_file, ConfigDelivery, OutputFilename, SpliceReport};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ez-splice")]
#[command(about = "Emit the runtime config as a standalone script", version)]
struct Cli {
    /// Project root (inputs and output dir are relative to it)
    #[arg(long, global = true, default_value = ".")]
    project_root: PathBuf,

    /// Path to project config file (default: <project-root>/ez-splice.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

/// CLI config layer
#[derive(Debug, Clone, Args)]
struct ConfigOverrides {
    /// Override the output directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Report splice contract violations as warnings instead of errors
    #[arg(long, global = true)]
    lenient: bool,

    /// Fail with a non-zero exit code when the script cannot be emitted
    #[arg(long, global = true)]
    fail_on_error: bool,

    /// Set any config key, e.g. --set global.name=APP_CONFIG
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,
}

impl ConfigOverrides {
    fn to_value(&self) -> Result<Option<Value>, ConfigError> {
        let mut layers = Vec::new();
        if let Some(dir) = &self.output_dir {
            layers.push(serde_json::json!({ "output_dir": dir.to_string_lossy() }));
        }
        if self.lenient {
            layers.push(serde_json::json!({ "strict": false }));
        }
        if self.fail_on_error {
            layers.push(serde_json::json!({ "fail_on_error": true }));
        }
        for assignment in &self.set {
            let layer = parse_assignment(assignment).ok_or_else(|| {
                ConfigError::ParseError(format!(
                    "invalid --set '{}', expected KEY=VALUE",
                    assignment
                ))
            })?;
            layers.push(layer);
        }
        Ok((!layers.is_empty()).then(|| merge_layers(layers)))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decide gating for this build and print the template parameters
    Plan {
        /// Use this filename instead of generating one
        #[arg(long)]
        filename: Option<OutputFilename>,
    },

    /// Splice, obfuscate and write the config script (after-emit step)
    Emit {
        /// Use this filename instead of generating one
        #[arg(long)]
        filename: Option<OutputFilename>,

        /// Write a splice report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Inject the script tag into this emitted HTML file
        #[arg(long)]
        inject_html: Option<PathBuf>,

        /// Print the emit summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the spliced (never obfuscated) script
    Splice {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Inject the config script tag into an HTML file
    Inject {
        /// HTML file containing the <%= injectCustomScript %> placeholder
        html: PathBuf,

        /// Config script filename (omit to remove the placeholder)
        #[arg(long)]
        filename: Option<OutputFilename>,
    },

    /// Print the effective configuration with provenance
    Config,
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let code = match &cli.command {
        Commands::Plan { filename } => run_plan(&cli, filename.clone()),
        Commands::Emit {
            filename,
            report,
            inject_html,
            json,
        } => run_emit(&cli, filename.clone(), report.as_ref(), inject_html.as_ref(), *json),
        Commands::Splice { out } => run_splice(&cli, out.as_ref()),
        Commands::Inject { html, filename } => run_inject(html, filename.clone()),
        Commands::Config => run_config(&cli),
    };
    process::exit(code);
}

fn load_config(cli: &Cli) -> Result<EffectiveConfig, ConfigError> {
    let path = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(ConfigError::IoError(format!("{}: not found", path.display())));
        }
        Some(path) => path.clone(),
        None => cli.project_root.join(PROJECT_CONFIG_FILE),
    };
    EffectiveConfig::build(Some(&path), &BuildEnv::from_env(), cli.overrides.to_value()?)
}

fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    load_config(cli)?.settings()
}

fn run_plan(cli: &Cli, filename: Option<OutputFilename>) -> i32 {
    let settings = match load_settings(cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return 1;
        }
    };
    let plan = BuildPlan::new(settings.build, filename.unwrap_or_else(OutputFilename::random));
    print_json(&plan)
}

fn run_emit(
    cli: &Cli,
    filename: Option<OutputFilename>,
    report: Option<&PathBuf>,
    inject_html: Option<&PathBuf>,
    json: bool,
) -> i32 {
    let settings = match load_settings(cli) {
        Ok(s) => s,
        Err(e) => return emit_failed(EmitError::Config(e.to_string()), cli.overrides.fail_on_error),
    };
    let plan = BuildPlan::new(settings.build, filename.unwrap_or_else(OutputFilename::random));
    let obfuscator = obfuscator_for(&plan, &settings);

    let summary = match emit_best_effort(&cli.project_root, &settings, &plan, obfuscator.as_ref()) {
        Ok(summary) => summary,
        Err(e) => return emit_failed(e, true),
    };

    if let (Some(path), Some(summary)) = (report, &summary) {
        let result = SpliceReport::from_summary(summary).write_to_file(path);
        if let Err(e) = result {
            let err = EmitError::Write {
                path: path.clone(),
                source: e,
            };
            return emit_failed(err, settings.fail_on_error);
        }
        info!(path = %path.display(), "wrote splice report");
    }

    if let Some(html) = inject_html {
        if let Err(e) = inject_file(html, &plan.template_parameters) {
            if settings.fail_on_error {
                eprintln!("Error injecting script tag: {}", e);
                return 1;
            }
            warn!(error = %e, html = %html.display(), "script tag not injected");
        }
    }

    if json {
        let value = serde_json::json!({
            "plan": plan,
            "emitted": summary,
        });
        return print_json(&value);
    }
    0
}

/// Best-effort exit: warn and succeed unless `fail` is set.
fn emit_failed(err: EmitError, fail: bool) -> i32 {
    if fail {
        eprintln!("Error: {}", err);
        err.exit_code()
    } else {
        warn!(error = %err, "config script not emitted; build continues");
        0
    }
}

fn run_splice(cli: &Cli, out: Option<&PathBuf>) -> i32 {
    let settings = match load_settings(cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return 1;
        }
    };
    let paths = settings.resolve_paths(&cli.project_root);

    let read = |path: &PathBuf| {
        fs::read_to_string(path).map_err(|e| EmitError::Read {
            path: path.clone(),
            source: e,
        })
    };
    let result = read(&paths.config_module).and_then(|config| {
        let constants = read(&paths.constants_module)?;
        Ok(ez_module::splice(&config, &constants, &settings.splice_options())?)
    });

    let spliced = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return e.exit_code();
        }
    };
    for warning in &spliced.warnings {
        warn!(violation = %warning, "splice contract violation ignored");
    }

    match out {
        Some(path) => {
            if let Err(e) = fs::write(path, &spliced.text) {
                eprintln!("Error writing {}: {}", path.display(), e);
                return 30;
            }
        }
        None => println!("{}", spliced.text),
    }
    0
}

fn run_inject(html: &PathBuf, filename: Option<OutputFilename>) -> i32 {
    let delivery = match filename {
        Some(name) => ConfigDelivery::External(name),
        None => ConfigDelivery::Inline,
    };
    match inject_file(html, &delivery.template_parameters()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn run_config(cli: &Cli) -> i32 {
    match load_config(cli) {
        Ok(config) => print_json(&config),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            1
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            1
        }
    }
}
