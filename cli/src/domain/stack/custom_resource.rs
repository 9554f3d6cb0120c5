//! SDK-call custom resources.
//!
//! A custom resource here is a `Custom::AWS` node whose create/update
//! handlers are single AWS SDK calls executed by a shared provider function.
//! There is no retry or polling: the provider issues the call once and
//! reports the response back to CloudFormation.

use efsml_common::intrinsic::{get_att, stringify};
use efsml_common::{DeletionPolicy, Resource};
use serde_json::{Value, json};

use crate::domain::error::StackError;
use crate::domain::stack::asset::CodeAsset;
use crate::domain::stack::{StackScope, iam};

/// Construct id of the singleton provider function.
pub const PROVIDER_ID: &str = "AWS679f53fac002430cb0da5b7982bd2287";
pub const PROVIDER_RUNTIME: &str = "nodejs12.x";
pub const PROVIDER_TIMEOUT_SECS: u32 = 120;
pub const RESOURCE_TYPE: &str = "Custom::AWS";

/// The shared provider, declared on first use.
#[derive(Debug, Clone)]
pub struct Provider {
    pub function: String,
    pub role: String,
}

/// Where the physical resource id comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicalResourceId {
    /// A dotted path into the SDK response, e.g. `build.id`.
    FromResponse(String),
    /// A fixed id.
    Literal(String),
}

/// One AWS SDK call.
#[derive(Debug, Clone)]
pub struct SdkCall {
    /// SDK service class name, e.g. `EFS` or `CodeBuild`.
    pub service: String,
    /// SDK method name, e.g. `createAccessPoint`.
    pub action: String,
    pub parameters: Value,
    pub physical_resource_id: PhysicalResourceId,
}

impl SdkCall {
    /// The IAM action the call needs, e.g. `elasticfilesystem:CreateAccessPoint`.
    #[must_use]
    pub fn iam_action(&self) -> String {
        let prefix = match self.service.as_str() {
            "EFS" => "elasticfilesystem".to_string(),
            other => other.to_lowercase(),
        };
        let mut chars = self.action.chars();
        let action: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("{prefix}:{action}")
    }

    fn to_value(&self) -> Value {
        let physical = match &self.physical_resource_id {
            PhysicalResourceId::FromResponse(path) => json!({ "responsePath": path }),
            PhysicalResourceId::Literal(id) => json!({ "id": id }),
        };
        json!({
            "service": self.service,
            "action": self.action,
            "parameters": self.parameters,
            "physicalResourceId": physical,
        })
    }
}

/// A custom resource backed by SDK calls.
#[derive(Debug, Clone)]
pub struct AwsCustomResource {
    /// Runs on create; falls back to `on_update` when absent.
    pub on_create: Option<SdkCall>,
    /// Runs on update. Without it, updates are no-ops.
    pub on_update: Option<SdkCall>,
}

impl AwsCustomResource {
    fn calls(&self) -> impl Iterator<Item = &SdkCall> {
        self.on_create.iter().chain(self.on_update.iter())
    }
}

/// Handles to a declared custom resource.
#[derive(Debug, Clone)]
pub struct DeclaredCustomResource {
    pub id: String,
    pub policy: String,
}

/// Declare a custom resource under `construct` together with the inline
/// policy granting the provider the actions it calls.
///
/// # Errors
///
/// Returns an error if a derived logical id collides, or if neither an
/// `on_create` nor an `on_update` call is given.
pub fn declare(
    scope: &mut StackScope,
    construct: &str,
    resource: &AwsCustomResource,
) -> Result<DeclaredCustomResource, StackError> {
    let create = resource
        .on_create
        .as_ref()
        .or(resource.on_update.as_ref())
        .ok_or_else(|| StackError::EmptyCustomResource(construct.to_string()))?;

    let provider = ensure_provider(scope)?;

    let mut actions: Vec<String> = resource.calls().map(SdkCall::iam_action).collect();
    actions.sort();
    actions.dedup();
    let action_refs: Vec<&str> = actions.iter().map(String::as_str).collect();

    let policy_id = crate::domain::naming::logical_id(&[construct, "CustomResourcePolicy", "Resource"]);
    let policy = scope.add(
        &[construct, "CustomResourcePolicy", "Resource"],
        iam::policy(
            &policy_id,
            &[&provider.role],
            vec![iam::allow(&action_refs, json!("*"))],
        ),
    )?;

    let mut node = Resource::new(RESOURCE_TYPE)
        .with_property("ServiceToken", get_att(&provider.function, "Arn"))
        .with_property("Create", stringify(&create.to_value()))
        .with_property("InstallLatestAwsSdk", json!(true))
        .with_dependency(&policy)
        .with_removal_policy(DeletionPolicy::Delete);
    if let Some(update) = &resource.on_update {
        node.set_property("Update", stringify(&update.to_value()));
    }
    let id = scope.add(&[construct, "Resource", "Default"], node)?;

    Ok(DeclaredCustomResource { id, policy })
}

/// Declare the singleton provider once per stack.
fn ensure_provider(scope: &mut StackScope) -> Result<Provider, StackError> {
    if let Some(provider) = &scope.provider {
        return Ok(provider.clone());
    }

    let code = CodeAsset::declare(
        scope,
        "CustomResourceProviderCode",
        "custom resource provider code",
        None,
    )?;

    let role = scope.add(
        &[PROVIDER_ID, "ServiceRole", "Resource"],
        iam::service_role("lambda.amazonaws.com", &[iam::LAMBDA_BASIC_EXECUTION]),
    )?;
    let function = scope.add(
        &[PROVIDER_ID],
        Resource::new("AWS::Lambda::Function")
            .with_property("Code", code.code_property())
            .with_property("Role", get_att(&role, "Arn"))
            .with_property("Handler", json!("index.handler"))
            .with_property("Runtime", json!(PROVIDER_RUNTIME))
            .with_property("Timeout", json!(PROVIDER_TIMEOUT_SECS))
            .with_dependency(&role),
    )?;

    let provider = Provider { function, role };
    scope.provider = Some(provider.clone());
    Ok(provider)
}
