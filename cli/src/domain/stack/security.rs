//! Security groups for the build compute, the function and the file system.
//!
//! Only the build and function groups may reach the file system group, and
//! only on the NFS port.

use efsml_common::Resource;
use efsml_common::intrinsic::{get_att, reference};
use serde_json::json;

use crate::domain::error::StackError;
use crate::domain::stack::{Network, StackScope};

/// NFS, the only port the file system group accepts.
pub const NFS_PORT: u16 = 2049;

#[derive(Debug, Clone)]
pub struct SecurityGroups {
    pub build: String,
    pub function: String,
    pub file_system: String,
}

/// Declare the three groups and the two ingress rules into the file system
/// group.
///
/// # Errors
///
/// Returns an error if a derived logical id collides.
pub fn declare(scope: &mut StackScope, network: &Network) -> Result<SecurityGroups, StackError> {
    let build_construct = scope.name("EC2-SG");
    let function_construct = scope.name("Lambda-SG");
    let efs_construct = scope.name("Efs-SG");

    let efs_group_name = scope.name("EFS-SG");

    let build = security_group(scope, &build_construct, &build_construct, &network.vpc)?;
    let function =
        security_group(scope, &function_construct, &function_construct, &network.vpc)?;
    let file_system = security_group(scope, &efs_construct, &efs_group_name, &network.vpc)?;

    allow_to(scope, (&build_construct, &build), (&efs_construct, &file_system), NFS_PORT)?;
    allow_to(
        scope,
        (&function_construct, &function),
        (&efs_construct, &file_system),
        NFS_PORT,
    )?;

    Ok(SecurityGroups {
        build,
        function,
        file_system,
    })
}

fn security_group(
    scope: &mut StackScope,
    construct: &str,
    group_name: &str,
    vpc: &str,
) -> Result<String, StackError> {
    scope.add(
        &[construct, "Resource"],
        Resource::new("AWS::EC2::SecurityGroup")
            .with_property("GroupDescription", json!(scope.path_label(&[construct])))
            .with_property("GroupName", json!(group_name))
            .with_property(
                "SecurityGroupEgress",
                json!([{
                    "CidrIp": "0.0.0.0/0",
                    "Description": "Allow all outbound traffic by default",
                    "IpProtocol": "-1"
                }]),
            )
            .with_property("VpcId", reference(vpc)),
    )
}

/// Allow TCP `port` from the `from` group into the `to` group. Each side is
/// `(construct id, logical id)`; the rule lives under the target construct.
///
/// # Errors
///
/// Returns an error if a derived logical id collides.
pub fn allow_to(
    scope: &mut StackScope,
    from: (&str, &str),
    to: (&str, &str),
    port: u16,
) -> Result<String, StackError> {
    let description = format!("from {}:{port}", from.0);
    scope.add(
        &[to.0, &description],
        Resource::new("AWS::EC2::SecurityGroupIngress")
            .with_property("IpProtocol", json!("tcp"))
            .with_property("Description", json!(description))
            .with_property("FromPort", json!(port))
            .with_property("ToPort", json!(port))
            .with_property("GroupId", get_att(to.1, "GroupId"))
            .with_property("SourceSecurityGroupId", get_att(from.1, "GroupId")),
    )
}
