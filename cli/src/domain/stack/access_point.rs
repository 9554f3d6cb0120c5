//! EFS access point, created through an SDK-call custom resource and then
//! imported by ARN.

use efsml_common::intrinsic::{get_att, reference};
use serde_json::{Value, json};

use crate::domain::error::StackError;
use crate::domain::stack::custom_resource::{self, AwsCustomResource, PhysicalResourceId, SdkCall};
use crate::domain::stack::network::name_tag;
use crate::domain::stack::{FileSystem, StackScope};

pub const ROOT_PATH: &str = "/lambda";
pub const POSIX_ID: u32 = 1000;
pub const ROOT_PERMISSIONS: &str = "777";

/// The response field carrying the access point ARN.
pub const ARN_ATTRIBUTE: &str = "AccessPointArn";

/// An access point known only by the custom resource that created it.
#[derive(Debug, Clone)]
pub struct AccessPointRef {
    /// Logical id of the creating custom resource.
    pub custom_resource: String,
    pub policy: String,
    /// `Fn::GetAtt [custom_resource, AccessPointArn]`
    pub arn: Value,
}

/// Declare `EfsAccessPoint{prefix}-{stage}-Common`.
///
/// # Errors
///
/// Returns an error if a derived logical id collides.
pub fn declare(scope: &mut StackScope, file_system: &FileSystem) -> Result<AccessPointRef, StackError> {
    let common = scope.name("Common");
    let construct = format!("EfsAccessPoint{common}");

    let create = SdkCall {
        service: "EFS".to_string(),
        action: "createAccessPoint".to_string(),
        parameters: json!({
            "FileSystemId": reference(&file_system.id),
            "PosixUser": { "Gid": POSIX_ID, "Uid": POSIX_ID },
            "RootDirectory": {
                "CreationInfo": {
                    "OwnerGid": POSIX_ID,
                    "OwnerUid": POSIX_ID,
                    "Permissions": ROOT_PERMISSIONS
                },
                "Path": ROOT_PATH
            },
            "Tags": name_tag(&common)
        }),
        physical_resource_id: PhysicalResourceId::FromResponse(ARN_ATTRIBUTE.to_string()),
    };

    // Create is covered by the update call.
    let declared = custom_resource::declare(
        scope,
        &construct,
        &AwsCustomResource {
            on_create: None,
            on_update: Some(create),
        },
    )?;

    Ok(AccessPointRef {
        arn: get_att(&declared.id, ARN_ATTRIBUTE),
        custom_resource: declared.id,
        policy: declared.policy,
    })
}
