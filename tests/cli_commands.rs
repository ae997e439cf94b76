//! CLI Command Tests
//!
//! Drives the `ez-splice` binary against a temp copy of the `shop` fixture,
//! with the build environment controlled per invocation.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/shop");

fn shop_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    for rel in ["src/config/constant.js", "src/config/index.js", "public/index.html"] {
        let dest = dir.path().join(rel);
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::copy(Path::new(FIXTURE).join(rel), dest).unwrap();
    }
    dir
}

/// Run the binary with only the given build variables set
fn ez_splice(root: &Path, env: &[(&str, &str)], args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ez-splice"));
    cmd.arg("--project-root")
        .arg(root)
        .args(args)
        .env_remove("NODE_ENV")
        .env_remove("VUE_APP_CONFIGJS")
        .env_remove("VUE_APP_OBFUSCATION")
        .env_remove("RUST_LOG");
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

const PRODUCTION_SPLIT: &[(&str, &str)] =
    &[("NODE_ENV", "production"), ("VUE_APP_CONFIGJS", "true")];

// =============================================================================
// plan
// =============================================================================

#[test]
fn test_plan_enabled() {
    let project = shop_project();
    let output = ez_splice(project.path(), PRODUCTION_SPLIT, &["plan"]);

    assert!(output.status.success());
    let plan = stdout_json(&output);
    assert_eq!(plan["enabled"], true);
    assert_eq!(plan["obfuscate"], false);
    let filename = plan["filename"].as_str().unwrap();
    assert_eq!(filename.len(), 15);
    assert_eq!(
        plan["templateParameters"]["injectCustomScript"],
        format!("<script src=\"./{}\"></script>", filename)
    );
}

#[test]
fn test_plan_disabled_without_flag() {
    let project = shop_project();
    let output = ez_splice(project.path(), &[("NODE_ENV", "production")], &["plan"]);

    let plan = stdout_json(&output);
    assert_eq!(plan["enabled"], false);
    assert!(plan["filename"].is_null());
    assert_eq!(plan["templateParameters"]["injectCustomScript"], "");
}

#[test]
fn test_plan_rejects_bad_filename() {
    let project = shop_project();
    let output = ez_splice(project.path(), PRODUCTION_SPLIT, &["plan", "--filename", "config.js"]);
    assert!(!output.status.success());
}

// =============================================================================
// emit
// =============================================================================

#[test]
fn test_emit_writes_script_report_and_html() {
    let project = shop_project();
    let html = project.path().join("public/index.html");
    let report = project.path().join("report.json");
    let output = ez_splice(
        project.path(),
        PRODUCTION_SPLIT,
        &[
            "emit",
            "--filename",
            "077.abcd1234.js",
            "--report",
            report.to_str().unwrap(),
            "--inject-html",
            html.to_str().unwrap(),
            "--json",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let result = stdout_json(&output);
    assert_eq!(result["plan"]["filename"], "077.abcd1234.js");
    assert_eq!(result["emitted"]["filename"], "077.abcd1234.js");

    let script = fs::read_to_string(project.path().join("dist/077.abcd1234.js")).unwrap();
    assert!(script.contains("window.EZ_CONFIG = {"));

    let report: Value = serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(report["schema_id"], "ez-splice/report@1");

    let html = fs::read_to_string(html).unwrap();
    assert!(html.contains("<script src=\"./077.abcd1234.js\"></script>"));
}

#[test]
fn test_emit_disabled_is_noop() {
    let project = shop_project();
    let output = ez_splice(project.path(), &[], &["emit", "--json"]);

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert!(result["emitted"].is_null());
    assert!(!project.path().join("dist").exists());
}

#[test]
fn test_emit_failure_warns_and_exits_zero() {
    let project = shop_project();
    fs::remove_file(project.path().join("src/config/index.js")).unwrap();

    let output = ez_splice(project.path(), PRODUCTION_SPLIT, &["emit"]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config script not emitted"), "{}", stderr);
}

#[test]
fn test_emit_fail_on_error_exit_code() {
    let project = shop_project();
    fs::remove_file(project.path().join("src/config/index.js")).unwrap();

    let output = ez_splice(project.path(), PRODUCTION_SPLIT, &["--fail-on-error", "emit"]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_emit_with_failing_obfuscator_writes_nothing() {
    let project = shop_project();
    let env = [
        ("NODE_ENV", "production"),
        ("VUE_APP_CONFIGJS", "true"),
        ("VUE_APP_OBFUSCATION", "true"),
    ];
    let output = ez_splice(
        project.path(),
        &env,
        &[
            "--set",
            "obfuscator.command=[\"ez-splice-missing-obfuscator\"]",
            "--fail-on-error",
            "emit",
            "--filename",
            "077.abcd1234.js",
        ],
    );

    assert_eq!(output.status.code(), Some(20));
    assert!(!project.path().join("dist/077.abcd1234.js").exists());
}

// =============================================================================
// splice / inject / config
// =============================================================================

#[test]
fn test_splice_prints_text() {
    let project = shop_project();
    let output = ez_splice(project.path(), &[], &["splice"]);

    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("const API_BASE = 'https://api.shop.example.com/v2'"));
    assert!(!text.contains("import "));
}

#[test]
fn test_splice_contract_violation_exits_non_zero() {
    let project = shop_project();
    fs::write(project.path().join("src/config/index.js"), "export default {}\n").unwrap();

    let output = ez_splice(project.path(), &[], &["splice"]);

    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn test_inject_without_filename_clears_placeholder() {
    let project = shop_project();
    let html = project.path().join("public/index.html");
    let output = ez_splice(project.path(), &[], &["inject", html.to_str().unwrap()]);

    assert!(output.status.success());
    let html = fs::read_to_string(html).unwrap();
    assert!(!html.contains("<%="));
    assert!(!html.contains("<script"));
}

#[test]
fn test_config_shows_provenance() {
    let project = shop_project();
    fs::write(project.path().join("ez-splice.toml"), "[global]\nname = \"SHOP_CONFIG\"\n").unwrap();

    let output = ez_splice(
        project.path(),
        &[("VUE_APP_OBFUSCATION", "true")],
        &["--lenient", "config"],
    );

    assert!(output.status.success());
    let config = stdout_json(&output);
    let origins: Vec<&str> = config["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["origin"].as_str().unwrap())
        .collect();
    assert_eq!(origins, vec!["builtin", "project", "env", "cli"]);
    assert_eq!(config["config"]["global"]["name"], "SHOP_CONFIG");
    assert_eq!(config["config"]["build"]["obfuscate"], true);
    assert_eq!(config["config"]["strict"], false);
}

#[test]
fn test_config_missing_explicit_file_fails() {
    let project = shop_project();
    let args = ["--config", "/nonexistent/ez-splice.toml", "config"];
    let output = ez_splice(project.path(), &[], &args);
    assert_eq!(output.status.code(), Some(1));
}
