//! Structural checks over a rendered template.
//!
//! The checks locate resources by shape rather than by logical id, so they
//! apply equally to a freshly synthesized stack and to a template read back
//! from disk.

use std::collections::BTreeSet;

use efsml_common::intrinsic::{reference, references};
use efsml_common::{Resource, Template};
use serde::Serialize;
use serde_json::Value;

use crate::domain::graph::ResourceGraph;
use crate::domain::stack::OUTPUT_FUNCTION_NAME;
use crate::domain::stack::iam::{EFS_CLIENT_FULL_ACCESS, is_managed_policy};
use crate::domain::stack::security::NFS_PORT;

const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
const BUILD_PROJECT: &str = "AWS::CodeBuild::Project";
const MOUNT_TARGET: &str = "AWS::EFS::MountTarget";
const INGRESS: &str = "AWS::EC2::SecurityGroupIngress";
const SECURITY_GROUP: &str = "AWS::EC2::SecurityGroup";

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Run every check, in a fixed order.
#[must_use]
pub fn run_checks(template: &Template) -> Vec<CheckResult> {
    vec![
        check_graph(template),
        check_efs_ingress(template),
        check_function_client_policy(template),
        check_build_mount(template),
        check_access_point_ordering(template),
        check_output(template),
    ]
}

/// Whether every result passed.
#[must_use]
pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.passed)
}

// ── Resource lookup ───────────────────────────────────────────────────────────

/// The function that mounts a file system.
fn mounting_function(template: &Template) -> Option<(&String, &Resource)> {
    template
        .resources_of_type(LAMBDA_FUNCTION)
        .find(|(_, r)| r.property("FileSystemConfigs").is_some())
}

fn single_project(template: &Template) -> Result<(&String, &Resource), String> {
    let projects: Vec<_> = template.resources_of_type(BUILD_PROJECT).collect();
    match projects.as_slice() {
        [one] => Ok(*one),
        [] => Err("no build project".to_string()),
        many => Err(format!("{} build projects", many.len())),
    }
}

/// Logical ids referenced by `resource.properties[key]`.
fn referenced_by(resource: &Resource, key: &str) -> BTreeSet<String> {
    resource.property(key).map(references).unwrap_or_default()
}

fn vpc_groups(resource: &Resource) -> BTreeSet<String> {
    resource
        .property("VpcConfig")
        .and_then(|v| v.get("SecurityGroupIds"))
        .map(references)
        .unwrap_or_default()
}

// ── Checks ────────────────────────────────────────────────────────────────────

fn check_graph(template: &Template) -> CheckResult {
    const NAME: &str = "graph.acyclic";
    match ResourceGraph::from_template(template).and_then(|g| g.deployment_order()) {
        Ok(waves) => CheckResult::pass(
            NAME,
            format!("{} resources in {} waves", template.resources.len(), waves.len()),
        ),
        Err(e) => CheckResult::fail(NAME, e.to_string()),
    }
}

fn check_efs_ingress(template: &Template) -> CheckResult {
    const NAME: &str = "efs.ingress";

    let efs_groups: BTreeSet<String> = template
        .resources_of_type(MOUNT_TARGET)
        .flat_map(|(_, r)| referenced_by(r, "SecurityGroups"))
        .collect();
    if efs_groups.is_empty() {
        return CheckResult::fail(NAME, "no mount target security group found");
    }

    let mut expected = BTreeSet::new();
    if let Some((_, function)) = mounting_function(template) {
        expected.extend(vpc_groups(function));
    }
    if let Ok((_, project)) = single_project(template) {
        expected.extend(vpc_groups(project));
    }

    for group in &efs_groups {
        if let Some(inline) = template
            .resource(group)
            .filter(|r| r.resource_type == SECURITY_GROUP)
            .and_then(|r| r.property("SecurityGroupIngress"))
        {
            if inline.as_array().is_some_and(|rules| !rules.is_empty()) {
                return CheckResult::fail(NAME, format!("{group} has inline ingress rules"));
            }
        }
    }

    let mut sources = BTreeSet::new();
    for (id, rule) in template.resources_of_type(INGRESS) {
        if referenced_by(rule, "GroupId").is_disjoint(&efs_groups) {
            continue;
        }
        let port = Value::from(NFS_PORT);
        let tcp = rule.property("IpProtocol") == Some(&Value::from("tcp"));
        if !tcp
            || rule.property("FromPort") != Some(&port)
            || rule.property("ToPort") != Some(&port)
        {
            return CheckResult::fail(NAME, format!("{id} is not TCP {NFS_PORT}"));
        }
        let source = referenced_by(rule, "SourceSecurityGroupId");
        if source.is_empty() {
            return CheckResult::fail(NAME, format!("{id} has no source group"));
        }
        sources.extend(source);
    }

    if sources == expected {
        CheckResult::pass(
            NAME,
            format!("{} source groups on TCP {NFS_PORT}", sources.len()),
        )
    } else {
        let render = |s: &BTreeSet<String>| s.iter().cloned().collect::<Vec<_>>().join(", ");
        CheckResult::fail(
            NAME,
            format!(
                "sources [{}] differ from build and function groups [{}]",
                render(&sources),
                render(&expected)
            ),
        )
    }
}

fn check_function_client_policy(template: &Template) -> CheckResult {
    const NAME: &str = "function.efs-client-policy";
    let Some((id, function)) = mounting_function(template) else {
        return CheckResult::fail(NAME, "no function mounts a file system");
    };
    let roles = referenced_by(function, "Role");
    let has_policy = roles.iter().filter_map(|r| template.resource(r)).any(|role| {
        role.property("ManagedPolicyArns")
            .and_then(Value::as_array)
            .is_some_and(|arns| arns.iter().any(|a| is_managed_policy(a, EFS_CLIENT_FULL_ACCESS)))
    });
    if has_policy {
        CheckResult::pass(NAME, format!("{id} role carries {EFS_CLIENT_FULL_ACCESS}"))
    } else {
        CheckResult::fail(NAME, format!("{id} role lacks {EFS_CLIENT_FULL_ACCESS}"))
    }
}

fn check_build_mount(template: &Template) -> CheckResult {
    const NAME: &str = "build.filesystem-mount";
    let (id, project) = match single_project(template) {
        Ok(p) => p,
        Err(e) => return CheckResult::fail(NAME, e),
    };
    let locations = project
        .property("FileSystemLocations")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if locations != 1 {
        return CheckResult::fail(NAME, format!("{id} has {locations} file system locations"));
    }
    let logs = project
        .property("LogsConfig")
        .and_then(|l| l.pointer("/CloudWatchLogs/Status"))
        .and_then(Value::as_str);
    if logs != Some("ENABLED") {
        return CheckResult::fail(NAME, format!("{id} does not send logs to CloudWatch"));
    }
    CheckResult::pass(NAME, format!("{id} mounts one file system, logs enabled"))
}

fn check_access_point_ordering(template: &Template) -> CheckResult {
    const NAME: &str = "ordering.access-point";
    let Some((function_id, function)) = mounting_function(template) else {
        return CheckResult::fail(NAME, "no function mounts a file system");
    };
    let access_points = referenced_by(function, "FileSystemConfigs");
    let Some(access_point) = access_points.iter().next() else {
        return CheckResult::fail(NAME, format!("{function_id} mounts a literal access point"));
    };
    let (project_id, project) = match single_project(template) {
        Ok(p) => p,
        Err(e) => return CheckResult::fail(NAME, e),
    };

    let missing: Vec<&str> = [(function_id, function), (project_id, project)]
        .into_iter()
        .filter(|(_, r)| !r.depends_on.contains(access_point))
        .map(|(id, _)| id.as_str())
        .collect();
    if missing.is_empty() {
        CheckResult::pass(NAME, format!("function and build project wait for {access_point}"))
    } else {
        CheckResult::fail(
            NAME,
            format!("{} missing DependsOn {access_point}", missing.join(", ")),
        )
    }
}

fn check_output(template: &Template) -> CheckResult {
    const NAME: &str = "output.function-name";
    let Some(output) = template.outputs.get(OUTPUT_FUNCTION_NAME) else {
        return CheckResult::fail(NAME, format!("output {OUTPUT_FUNCTION_NAME} missing"));
    };
    match mounting_function(template) {
        Some((id, _)) if output.value == reference(id) => {
            CheckResult::pass(NAME, format!("{OUTPUT_FUNCTION_NAME} = Ref {id}"))
        }
        Some((id, _)) => CheckResult::fail(NAME, format!("{OUTPUT_FUNCTION_NAME} does not reference {id}")),
        None => CheckResult::fail(NAME, "no function mounts a file system"),
    }
}
