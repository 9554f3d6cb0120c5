//! IAM building blocks: service roles, inline policies and statements.

use efsml_common::Resource;
use efsml_common::intrinsic::{ACCOUNT_ID, PARTITION, REGION, join, reference};
use serde_json::{Value, json};

pub const POLICY_VERSION: &str = "2012-10-17";

pub const LAMBDA_BASIC_EXECUTION: &str = "service-role/AWSLambdaBasicExecutionRole";
pub const LAMBDA_VPC_ACCESS: &str = "service-role/AWSLambdaVPCAccessExecutionRole";
pub const EFS_CLIENT_FULL_ACCESS: &str = "AmazonElasticFileSystemClientFullAccess";

/// `arn:${Partition}:iam::aws:policy/{name}`
#[must_use]
pub fn managed_policy_arn(name: &str) -> Value {
    join(
        "",
        vec![
            json!("arn:"),
            reference(PARTITION),
            json!(format!(":iam::aws:policy/{name}")),
        ],
    )
}

/// `arn:${Partition}:{service}:${Region}:${AccountId}:{resource}`
#[must_use]
pub fn regional_arn(service: &str, resource: &str) -> Value {
    join(
        "",
        vec![
            json!("arn:"),
            reference(PARTITION),
            json!(format!(":{service}:")),
            reference(REGION),
            json!(":"),
            reference(ACCOUNT_ID),
            json!(format!(":{resource}")),
        ],
    )
}

/// A role assumable by `service` (e.g. `lambda.amazonaws.com`).
#[must_use]
pub fn service_role(service: &str, managed_policies: &[&str]) -> Resource {
    let role = Resource::new("AWS::IAM::Role").with_property(
        "AssumeRolePolicyDocument",
        json!({
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": { "Service": service }
            }],
            "Version": POLICY_VERSION
        }),
    );
    if managed_policies.is_empty() {
        return role;
    }
    role.with_property(
        "ManagedPolicyArns",
        Value::Array(managed_policies.iter().map(|p| managed_policy_arn(p)).collect()),
    )
}

/// An `Allow` statement.
#[must_use]
pub fn allow(actions: &[&str], resource: Value) -> Value {
    let action = match actions {
        [single] => json!(single),
        many => json!(many),
    };
    json!({ "Action": action, "Effect": "Allow", "Resource": resource })
}

/// An `Allow` statement with a condition block.
#[must_use]
pub fn allow_if(actions: &[&str], resource: Value, condition: Value) -> Value {
    let mut statement = allow(actions, resource);
    statement["Condition"] = condition;
    statement
}

/// An inline policy attached to the given roles.
#[must_use]
pub fn policy(policy_name: &str, role_ids: &[&str], statements: Vec<Value>) -> Resource {
    Resource::new("AWS::IAM::Policy")
        .with_property(
            "PolicyDocument",
            json!({ "Statement": statements, "Version": POLICY_VERSION }),
        )
        .with_property("PolicyName", json!(policy_name))
        .with_property(
            "Roles",
            Value::Array(role_ids.iter().map(|r| reference(r)).collect()),
        )
}

/// Whether a `ManagedPolicyArns` entry names `policy`.
#[must_use]
pub fn is_managed_policy(arn: &Value, policy: &str) -> bool {
    let suffix = format!(":iam::aws:policy/{policy}");
    match arn {
        Value::String(s) => s.ends_with(&suffix),
        other => other
            .get("Fn::Join")
            .and_then(|j| j.get(1))
            .and_then(Value::as_array)
            .and_then(|parts| parts.last())
            .and_then(Value::as_str)
            .is_some_and(|last| last == suffix),
    }
}
