//! The inference function: Python in the private subnets with the shared
//! file system mounted through the access point.

use efsml_common::Resource;
use efsml_common::intrinsic::get_att;
use serde_json::json;

use crate::domain::error::StackError;
use crate::domain::naming::logical_id;
use crate::domain::stack::asset::CodeAsset;
use crate::domain::stack::{AccessPointRef, FileSystem, Network, SecurityGroups, StackScope, iam};

pub const RUNTIME: &str = "python3.8";
pub const HANDLER: &str = "main.lambda_handler";
pub const MEMORY_MB: u32 = 4096;
pub const TIMEOUT_SECS: u32 = 120;
pub const RESERVED_CONCURRENCY: u32 = 10;
pub const MOUNT_PATH: &str = "/mnt/python";

#[derive(Debug, Clone)]
pub struct Function {
    pub id: String,
    pub role: String,
    pub default_policy: String,
    /// Physical function name, `{prefix}-{stage}-Lambda`.
    pub name: String,
}

/// Declare the function, its execution role and the role's default policy.
///
/// # Errors
///
/// Returns an error if a derived logical id collides.
pub fn declare(
    scope: &mut StackScope,
    network: &Network,
    groups: &SecurityGroups,
    file_system: &FileSystem,
    access_point: &AccessPointRef,
    code: &CodeAsset,
) -> Result<Function, StackError> {
    let name = scope.name("Lambda");
    let c = name.as_str();

    let role = scope.add(
        &[c, "ServiceRole", "Resource"],
        iam::service_role(
            "lambda.amazonaws.com",
            &[
                iam::LAMBDA_BASIC_EXECUTION,
                iam::LAMBDA_VPC_ACCESS,
                iam::EFS_CLIENT_FULL_ACCESS,
            ],
        ),
    )?;

    let policy_path = [c, "ServiceRole", "DefaultPolicy", "Resource"];
    let default_policy = scope.add(
        &policy_path,
        iam::policy(
            &logical_id(&policy_path),
            &[&role],
            vec![iam::allow_if(
                &["elasticfilesystem:ClientMount", "elasticfilesystem:ClientWrite"],
                json!("*"),
                json!({
                    "StringEquals": {
                        "elasticfilesystem:AccessPointArn": access_point.arn
                    }
                }),
            )],
        ),
    )?;

    let mut function = Resource::new("AWS::Lambda::Function")
        .with_property("Code", code.code_property())
        .with_property("Role", get_att(&role, "Arn"))
        .with_property("FunctionName", json!(name))
        .with_property("Handler", json!(HANDLER))
        .with_property("Runtime", json!(RUNTIME))
        .with_property("MemorySize", json!(MEMORY_MB))
        .with_property("Timeout", json!(TIMEOUT_SECS))
        .with_property("ReservedConcurrentExecutions", json!(RESERVED_CONCURRENCY))
        .with_property(
            "VpcConfig",
            json!({
                "SecurityGroupIds": [get_att(&groups.function, "GroupId")],
                "SubnetIds": network.private_subnet_refs(),
            }),
        )
        .with_property(
            "FileSystemConfigs",
            json!([{ "Arn": access_point.arn, "LocalMountPath": MOUNT_PATH }]),
        )
        .with_dependency(&role)
        .with_dependency(&default_policy);
    // The mount fails unless every mount target is available.
    for target in &file_system.mount_targets {
        function.add_dependency(target);
    }
    if let Some((key, value)) = code.metadata() {
        function = function.with_metadata(key, value);
    }

    let id = scope.add(&[c, "Resource"], function)?;
    Ok(Function {
        id,
        role,
        default_policy,
        name,
    })
}
