//! Integration tests for `efsml validate` and `efsml plan`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use serde_json::Value;

use crate::helpers::Sandbox;

/// Synthesize into the sandbox and return the template path.
fn synth_template(sandbox: &Sandbox) -> std::path::PathBuf {
    sandbox.efsml().arg("synth").assert().success();
    sandbox
        .path()
        .join("synth.out")
        .join("efsml-dev-stack.template.json")
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn test_validate_declared_stack_passes() {
    Sandbox::new()
        .efsml()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("efs.ingress"))
        .stdout(predicate::str::contains("All 6 checks passed"));
}

#[test]
fn test_validate_json_report() {
    let sandbox = Sandbox::new();
    let value = sandbox.json(&["validate", "--json"]);
    assert_eq!(value["passed"], true);
    let names: Vec<&str> = value["checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "graph.acyclic",
            "efs.ingress",
            "function.efs-client-policy",
            "build.filesystem-mount",
            "ordering.access-point",
            "output.function-name",
        ]
    );
}

#[test]
fn test_validate_rendered_template_passes() {
    let sandbox = Sandbox::new().with_code_dir();
    let path = synth_template(&sandbox);
    sandbox
        .efsml()
        .arg("validate")
        .arg("--template")
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_validate_tampered_template_exits_one() {
    let sandbox = Sandbox::new().with_code_dir();
    let path = synth_template(&sandbox);

    let mut template: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    template.as_object_mut().unwrap().remove("Outputs");
    std::fs::write(&path, serde_json::to_string(&template).unwrap()).unwrap();

    sandbox
        .efsml()
        .arg("validate")
        .arg("--template")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("output.function-name"))
        .stderr(predicate::str::contains("1 of 6 checks failed"));
}

#[test]
fn test_validate_missing_template_is_an_error() {
    Sandbox::new()
        .efsml()
        .args(["validate", "--template", "nope.template.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.template.json"));
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[test]
fn test_plan_lists_waves() {
    Sandbox::new()
        .efsml()
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deployment order for efsml-dev-stack"))
        .stdout(predicate::str::contains("Wave 1"))
        .stdout(predicate::str::contains("AWS::EC2::VPC"));
}

#[test]
fn test_plan_json_orders_dependencies_first() {
    let sandbox = Sandbox::new();
    let value = sandbox.json(&["plan", "--json"]);
    assert_eq!(value["resource_count"], 42);

    let mut seen = std::collections::BTreeSet::new();
    for wave in value["waves"].as_array().unwrap() {
        for resource in wave.as_array().unwrap() {
            for dep in resource["depends_on"].as_array().unwrap() {
                assert!(seen.contains(dep.as_str().unwrap()), "{resource}");
            }
        }
        for resource in wave.as_array().unwrap() {
            seen.insert(resource["logical_id"].as_str().unwrap().to_string());
        }
    }
    assert_eq!(seen.len(), 42);
}

#[test]
fn test_plan_from_yaml_template_uses_file_stem() {
    let sandbox = Sandbox::new().with_code_dir();
    sandbox
        .efsml()
        .args(["synth", "--format", "yaml", "--stage", "prod"])
        .assert()
        .success();
    let path = sandbox
        .path()
        .join("synth.out")
        .join("efsml-prod-stack.template.yaml");
    let output = sandbox
        .efsml()
        .args(["plan", "--json", "--template"])
        .arg(&path)
        .output()
        .expect("run efsml");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["stack_name"], "efsml-prod-stack");
    assert_eq!(value["resource_count"], 42);
}
