//! Shared EFS file system with provisioned throughput.
//!
//! Throughput is capped low to keep cost down, and the file system is
//! deleted with the stack. That removal policy is not suitable for
//! production data.

use efsml_common::intrinsic::{get_att, reference};
use efsml_common::{DeletionPolicy, Resource};
use serde_json::json;

use crate::domain::error::StackError;
use crate::domain::stack::network::name_tag;
use crate::domain::stack::{Network, SecurityGroups, StackScope};

pub const PROVISIONED_THROUGHPUT_MIBPS: u32 = 10;

#[derive(Debug, Clone)]
pub struct FileSystem {
    pub id: String,
    /// One per private subnet; consumers mounting the file system wait for
    /// all of them.
    pub mount_targets: Vec<String>,
}

/// Declare the file system and its mount targets.
///
/// # Errors
///
/// Returns an error if a derived logical id collides.
pub fn declare(
    scope: &mut StackScope,
    network: &Network,
    groups: &SecurityGroups,
) -> Result<FileSystem, StackError> {
    let construct = scope.name("EFS");
    let c = construct.as_str();

    let id = scope.add(
        &[c, "Resource"],
        Resource::new("AWS::EFS::FileSystem")
            .with_property("FileSystemTags", name_tag(&construct))
            .with_property("ThroughputMode", json!("provisioned"))
            .with_property(
                "ProvisionedThroughputInMibps",
                json!(PROVISIONED_THROUGHPUT_MIBPS),
            )
            .with_removal_policy(DeletionPolicy::Delete),
    )?;

    let mut mount_targets = Vec::with_capacity(network.private_subnets.len());
    for (i, subnet) in network.private_subnets.iter().enumerate() {
        let target = scope.add(
            &[c, &format!("EfsMountTarget{}", i + 1)],
            Resource::new("AWS::EFS::MountTarget")
                .with_property("FileSystemId", reference(&id))
                .with_property("SecurityGroups", json!([get_att(&groups.file_system, "GroupId")]))
                .with_property("SubnetId", reference(subnet)),
        )?;
        mount_targets.push(target);
    }

    Ok(FileSystem { id, mount_targets })
}
