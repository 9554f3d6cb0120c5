//! One-shot trigger that starts the install build when the stack is created.
//!
//! The build is started on create only and its completion is not awaited:
//! the function may be invoked before the file system is populated, and a
//! redeploy never re-runs the build.

use efsml_common::intrinsic::reference;
use serde_json::json;

use crate::domain::error::StackError;
use crate::domain::stack::custom_resource::{self, AwsCustomResource, PhysicalResourceId, SdkCall};
use crate::domain::stack::{BuildProject, StackScope};

/// Declare `{prefix}-{stage}-Trigger-CodeBuild` and return its logical id.
///
/// # Errors
///
/// Returns an error if a derived logical id collides.
pub fn declare(scope: &mut StackScope, project: &BuildProject) -> Result<String, StackError> {
    let construct = scope.name("Trigger-CodeBuild");
    let start_build = SdkCall {
        service: "CodeBuild".to_string(),
        action: "startBuild".to_string(),
        parameters: json!({ "projectName": reference(&project.id) }),
        physical_resource_id: PhysicalResourceId::FromResponse("build.id".to_string()),
    };
    let declared = custom_resource::declare(
        scope,
        &construct,
        &AwsCustomResource {
            on_create: Some(start_build),
            on_update: None,
        },
    )?;
    Ok(declared.id)
}
