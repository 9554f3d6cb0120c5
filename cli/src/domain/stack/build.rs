//! CodeBuild project that installs the virtualenv and model onto the file
//! system, plus the low-level patch that mounts the file system into it.

use efsml_common::Resource;
use efsml_common::intrinsic::{ACCOUNT_ID, PARTITION, REGION, get_att, join, reference};
use serde_json::{Value, json};

use crate::domain::buildspec::BuildSpec;
use crate::domain::config::StackProps;
use crate::domain::error::StackError;
use crate::domain::naming::logical_id;
use crate::domain::stack::{FileSystem, Network, SecurityGroups, StackScope, iam};

pub const DESCRIPTION: &str = "Installs Python libraries to EFS.";
pub const BUILD_IMAGE: &str = "lambci/lambda:build-python3.8";
pub const COMPUTE_TYPE: &str = "BUILD_GENERAL1_LARGE";
pub const TIMEOUT_MINUTES: u32 = 30;

pub const MOUNT_IDENTIFIER: &str = "efs1";
pub const MOUNT_POINT: &str = "/mnt/python";
pub const MOUNT_OPTIONS: &str = "nfsvers=4.1,rsize=1048576,wsize=1048576,hard,timeo=600,retrans=2";

#[derive(Debug, Clone)]
pub struct BuildProject {
    pub id: String,
    pub role: String,
    /// Physical project name, `{prefix}-{stage}-EFS-CodeBuild-Project`.
    pub name: String,
}

/// Declare `{prefix}-{stage}-EFS-CodeBuild-Project` and its role.
///
/// Role policies name the project literally rather than through `Ref` so
/// that the project can depend on them.
///
/// # Errors
///
/// Returns an error if a derived logical id collides or the build spec
/// cannot be rendered.
pub fn declare(
    scope: &mut StackScope,
    props: &StackProps,
    network: &Network,
    groups: &SecurityGroups,
) -> Result<BuildProject, StackError> {
    let name = scope.name("EFS-CodeBuild-Project");
    let c = name.as_str();

    let role = scope.add(
        &[c, "Role", "Resource"],
        iam::service_role("codebuild.amazonaws.com", &[]),
    )?;

    let log_group = format!("log-group:/aws/codebuild/{name}");
    let default_policy_path = [c, "Role", "DefaultPolicy", "Resource"];
    let default_policy = scope.add(
        &default_policy_path,
        iam::policy(
            &logical_id(&default_policy_path),
            &[&role],
            vec![
                iam::allow(
                    &["logs:CreateLogGroup", "logs:CreateLogStream", "logs:PutLogEvents"],
                    json!([
                        iam::regional_arn("logs", &log_group),
                        iam::regional_arn("logs", &format!("{log_group}:*")),
                    ]),
                ),
                iam::allow(
                    &[
                        "codebuild:BatchPutCodeCoverages",
                        "codebuild:BatchPutTestCases",
                        "codebuild:CreateReport",
                        "codebuild:CreateReportGroup",
                        "codebuild:UpdateReport",
                    ],
                    iam::regional_arn("codebuild", &format!("report-group/{name}-*")),
                ),
                iam::allow(
                    &[
                        "ec2:CreateNetworkInterface",
                        "ec2:DeleteNetworkInterface",
                        "ec2:DescribeDhcpOptions",
                        "ec2:DescribeNetworkInterfaces",
                        "ec2:DescribeSecurityGroups",
                        "ec2:DescribeSubnets",
                        "ec2:DescribeVpcs",
                    ],
                    json!("*"),
                ),
            ],
        ),
    )?;

    let subnet_arns: Vec<Value> = network.private_subnets.iter().map(|s| subnet_arn(s)).collect();
    let vpc_policy_path = [c, "PolicyDocument", "Resource"];
    let vpc_policy = scope.add(
        &vpc_policy_path,
        iam::policy(
            &logical_id(&vpc_policy_path),
            &[&role],
            vec![iam::allow_if(
                &["ec2:CreateNetworkInterfacePermission"],
                iam::regional_arn("ec2", "network-interface/*"),
                json!({
                    "StringEquals": {
                        "ec2:Subnet": subnet_arns,
                        "ec2:AuthorizedService": "codebuild.amazonaws.com"
                    }
                }),
            )],
        ),
    )?;

    let build_spec = BuildSpec::install(props.install_packages()).to_source()?;

    let id = scope.add(
        &[c, "Resource"],
        Resource::new("AWS::CodeBuild::Project")
            .with_property("Name", json!(name))
            .with_property("Description", json!(DESCRIPTION))
            .with_property("Source", json!({ "Type": "NO_SOURCE", "BuildSpec": build_spec }))
            .with_property("Artifacts", json!({ "Type": "NO_ARTIFACTS" }))
            .with_property(
                "Environment",
                json!({
                    "Type": "LINUX_CONTAINER",
                    "Image": BUILD_IMAGE,
                    "ComputeType": COMPUTE_TYPE,
                    "PrivilegedMode": true,
                    "ImagePullCredentialsType": "SERVICE_ROLE"
                }),
            )
            .with_property("ServiceRole", get_att(&role, "Arn"))
            .with_property("EncryptionKey", json!("alias/aws/s3"))
            .with_property("TimeoutInMinutes", json!(TIMEOUT_MINUTES))
            .with_property(
                "VpcConfig",
                json!({
                    "VpcId": reference(&network.vpc),
                    "Subnets": network.private_subnet_refs(),
                    "SecurityGroupIds": [get_att(&groups.build, "GroupId")],
                }),
            )
            .with_dependency(&default_policy)
            .with_dependency(&vpc_policy),
    )?;

    Ok(BuildProject { id, role, name })
}

/// Patch the project to mount the file system at [`MOUNT_POINT`] and send
/// build logs to CloudWatch. Replaces any previous locations.
pub fn attach_file_system(scope: &mut StackScope, project: &BuildProject, file_system: &FileSystem) {
    let Some(resource) = scope.resource_mut(&project.id) else {
        return;
    };
    resource.set_property(
        "FileSystemLocations",
        json!([{
            "Identifier": MOUNT_IDENTIFIER,
            "Location": join(
                "",
                vec![
                    reference(&file_system.id),
                    json!(".efs."),
                    reference(REGION),
                    json!(".amazonaws.com:/"),
                ],
            ),
            "MountOptions": MOUNT_OPTIONS,
            "MountPoint": MOUNT_POINT,
            "Type": "EFS"
        }]),
    );
    resource.set_property(
        "LogsConfig",
        json!({ "CloudWatchLogs": { "Status": "ENABLED" } }),
    );
}

fn subnet_arn(subnet: &str) -> Value {
    join(
        "",
        vec![
            json!("arn:"),
            reference(PARTITION),
            json!(":ec2:"),
            reference(REGION),
            json!(":"),
            reference(ACCOUNT_ID),
            json!(":subnet/"),
            reference(subnet),
        ],
    )
}
