//! Integration tests for `efsml config` command.
//!
//! All filesystem-touching tests set `EFSML_CONFIG` to a temp path so they
//! never read or write `~/.efsml/config.yaml`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::helpers::Sandbox;

// ---------------------------------------------------------------------------
// Subcommand registration
// ---------------------------------------------------------------------------

#[test]
fn test_config_help_shows_show_and_set_subcommands() {
    Sandbox::new()
        .efsml()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"));
}

// ---------------------------------------------------------------------------
// `efsml config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_show_no_config_file_uses_defaults() {
    Sandbox::new()
        .efsml()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stack.prefix"))
        .stdout(predicate::str::contains("efsml"))
        .stdout(predicate::str::contains("dev"))
        .stdout(predicate::str::contains("synth.out"));
}

#[test]
fn test_config_show_displays_env_var_labels() {
    Sandbox::new()
        .efsml()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EFSML_CONFIG"))
        .stdout(predicate::str::contains("EFSML_STAGE"));
}

#[test]
fn test_config_show_does_not_create_file() {
    let sandbox = Sandbox::new();
    sandbox.efsml().args(["config", "show"]).assert().success();
    assert!(
        !sandbox.config_path().exists(),
        "show must not create the config file"
    );
}

#[test]
fn test_config_show_json() {
    let sandbox = Sandbox::new();
    let value = sandbox.json(&["config", "show", "--json"]);
    assert_eq!(value["config"]["stack"]["prefix"], "efsml");
    assert_eq!(value["config"]["stack"]["stage"], "dev");
    assert!(value["config"]["stack"]["install_packages"].is_null());
    assert_eq!(value["config"]["synth"]["out_dir"], "synth.out");
    assert!(
        value["path"]
            .as_str()
            .unwrap()
            .ends_with("config.yaml")
    );
}

// ---------------------------------------------------------------------------
// `efsml config set` happy paths
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_stage_succeeds() {
    Sandbox::new()
        .efsml()
        .args(["config", "set", "stack.stage", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set stack.stage = prod"));
}

#[test]
fn test_config_set_creates_file_at_env_path() {
    let sandbox = Sandbox::new();
    sandbox
        .efsml()
        .args(["config", "set", "stack.prefix", "vision"])
        .assert()
        .success();
    assert!(
        sandbox.config_path().exists(),
        "config file should be created at EFSML_CONFIG path"
    );
}

#[test]
fn test_config_set_json_echoes_setting() {
    let sandbox = Sandbox::new();
    let value = sandbox.json(&[
        "config",
        "set",
        "stack.install_packages",
        "tensorflow==2.4.1",
        "--json",
    ]);
    assert_eq!(value["key"], "stack.install_packages");
    assert_eq!(value["value"], "tensorflow==2.4.1");
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_unknown_key_returns_error_with_valid_keys() {
    Sandbox::new()
        .efsml()
        .args(["config", "set", "stack.region", "eu-west-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack.prefix"));
}

#[test]
fn test_config_set_invalid_stage_returns_error() {
    let sandbox = Sandbox::new();
    sandbox
        .efsml()
        .args(["config", "set", "stack.stage", "prod_1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack.stage"));
    assert!(!sandbox.config_path().exists());
}

#[test]
fn test_config_set_accepts_requirement_specifiers() {
    let sandbox = Sandbox::new();
    sandbox
        .efsml()
        .args(["config", "set", "stack.install_packages", "torch>=1.7 pillow<9"])
        .assert()
        .success();
    let value = sandbox.json(&["config", "show", "--json"]);
    assert_eq!(value["config"]["stack"]["install_packages"], "torch>=1.7 pillow<9");
}

// ---------------------------------------------------------------------------
// Round-trip: set then show
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_persists_value_readable_by_show() {
    let sandbox = Sandbox::new();
    sandbox
        .efsml()
        .args(["config", "set", "stack.stage", "staging"])
        .assert()
        .success();
    sandbox
        .efsml()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("staging"));
}

// ---------------------------------------------------------------------------
// File permissions
// ---------------------------------------------------------------------------

#[test]
#[cfg(unix)]
fn test_config_set_creates_file_with_0o600_permissions() {
    use std::os::unix::fs::PermissionsExt;
    let sandbox = Sandbox::new();
    sandbox
        .efsml()
        .args(["config", "set", "stack.stage", "prod"])
        .assert()
        .success();
    let mode = std::fs::metadata(sandbox.config_path())
        .expect("file should exist")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600, "expected 0o600, got {mode:o}");
}

// ---------------------------------------------------------------------------
// Corrupt YAML handling
// ---------------------------------------------------------------------------

fn write_corrupt_config(sandbox: &Sandbox) {
    let path = sandbox.config_path();
    std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
    std::fs::write(&path, b"{ not: valid: yaml: [[[").expect("write");
}

#[test]
fn test_config_show_corrupt_yaml_returns_error() {
    let sandbox = Sandbox::new();
    write_corrupt_config(&sandbox);
    sandbox
        .efsml()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot parse"));
}

#[test]
fn test_config_set_corrupt_yaml_returns_error() {
    let sandbox = Sandbox::new();
    write_corrupt_config(&sandbox);
    sandbox
        .efsml()
        .args(["config", "set", "stack.stage", "prod"])
        .assert()
        .failure();
}
