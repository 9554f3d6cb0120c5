//! Stack definition — declares every resource of the inference stack.
//!
//! Constructs are declared in dependency order into a [`StackScope`], which
//! owns the template being assembled and derives logical ids from construct
//! paths. Nothing here performs I/O; the result is a [`Template`] value.

pub mod access_point;
pub mod asset;
pub mod build;
pub mod custom_resource;
pub mod function;
pub mod iam;
pub mod network;
pub mod security;
pub mod storage;
pub mod trigger;

use efsml_common::intrinsic::reference;
use efsml_common::{Output, Parameter, Resource, Template};

use crate::domain::config::StackProps;
use crate::domain::error::StackError;
use crate::domain::naming::logical_id;

pub use access_point::AccessPointRef;
pub use build::BuildProject;
pub use function::Function;
pub use network::Network;
pub use security::SecurityGroups;
pub use storage::FileSystem;

/// Name of the output exposing the deployed function name.
pub const OUTPUT_FUNCTION_NAME: &str = "LambdaFunctionName";

/// Inputs to synthesis that do not come from stack props.
#[derive(Debug, Clone, Default)]
pub struct SynthOptions {
    /// SHA-256 fingerprint of the function code directory, if known.
    pub code_fingerprint: Option<String>,
}

/// Template under construction plus naming context.
pub struct StackScope {
    stack_name: String,
    base: String,
    template: Template,
    provider: Option<custom_resource::Provider>,
}

impl StackScope {
    #[must_use]
    pub fn new(props: &StackProps) -> Self {
        let base = props.name_base();
        Self {
            stack_name: props.stack_name(),
            template: Template::new(format!(
                "Serverless deep learning inference with Lambda and EFS ({base})"
            )),
            base,
            provider: None,
        }
    }

    #[must_use]
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// `{prefix}-{stage}-{suffix}`, the convention for construct ids and
    /// physical names.
    #[must_use]
    pub fn name(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.base)
    }

    /// `{stack}/{path...}`, used for `Name` tags and descriptions.
    #[must_use]
    pub fn path_label(&self, path: &[&str]) -> String {
        let mut label = self.stack_name.clone();
        for component in path {
            label.push('/');
            label.push_str(component);
        }
        label
    }

    /// Declare a resource at `path` and return its logical id.
    ///
    /// # Errors
    ///
    /// Returns an error if the derived logical id is already taken.
    pub fn add(&mut self, path: &[&str], resource: Resource) -> Result<String, StackError> {
        let id = logical_id(path);
        tracing::debug!(logical_id = %id, resource_type = %resource.resource_type, "declare");
        self.template.add_resource(id.clone(), resource)?;
        Ok(id)
    }

    /// Declare a string parameter under a fixed logical id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already taken.
    pub fn add_parameter(&mut self, id: &str, description: &str) -> Result<(), StackError> {
        self.template
            .add_parameter(id, Parameter::string(description))
            .map_err(StackError::from)
    }

    /// Add an explicit ordering edge: `dependent` is created after `dependency`.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        if let Some(resource) = self.template.resource_mut(dependent) {
            resource.add_dependency(dependency);
        }
    }

    /// Low-level access to a declared resource.
    pub fn resource_mut(&mut self, logical_id: &str) -> Option<&mut Resource> {
        self.template.resource_mut(logical_id)
    }

    #[must_use]
    pub fn into_template(self) -> Template {
        self.template
    }
}

/// Handles to the main constructs of a synthesized stack.
#[derive(Debug, Clone)]
pub struct StackResources {
    pub network: Network,
    pub security_groups: SecurityGroups,
    pub file_system: FileSystem,
    pub access_point: AccessPointRef,
    pub function: Function,
    pub build_project: BuildProject,
    pub trigger: String,
}

/// A rendered stack.
#[derive(Debug, Clone)]
pub struct SynthesizedStack {
    pub stack_name: String,
    pub template: Template,
    pub resources: StackResources,
}

/// Declare the whole stack.
///
/// # Errors
///
/// Returns an error if two constructs derive the same logical id.
pub fn synthesize(props: &StackProps, options: &SynthOptions) -> Result<SynthesizedStack, StackError> {
    let mut scope = StackScope::new(props);

    let network = network::declare(&mut scope)?;
    let security_groups = security::declare(&mut scope, &network)?;
    let file_system = storage::declare(&mut scope, &network, &security_groups)?;
    let access_point = access_point::declare(&mut scope, &file_system)?;

    let code = asset::CodeAsset::declare(
        &mut scope,
        "InferenceCode",
        "inference function code",
        options.code_fingerprint.clone(),
    )?;
    let function = function::declare(
        &mut scope,
        &network,
        &security_groups,
        &file_system,
        &access_point,
        &code,
    )?;

    let build_project = build::declare(&mut scope, props, &network, &security_groups)?;
    build::attach_file_system(&mut scope, &build_project, &file_system);

    let trigger = trigger::declare(&mut scope, &build_project)?;

    // The access point ARN is a late-bound response field; make the
    // ordering explicit for both consumers.
    scope.add_dependency(&function.id, &access_point.custom_resource);
    scope.add_dependency(&build_project.id, &access_point.custom_resource);

    let stack_name = scope.stack_name().to_string();
    let mut template = scope.into_template();
    template.add_output(
        OUTPUT_FUNCTION_NAME,
        Output::new(reference(&function.id)),
    )?;

    tracing::info!(
        stack = %stack_name,
        resources = template.resources.len(),
        "stack synthesized"
    );

    Ok(SynthesizedStack {
        stack_name,
        template,
        resources: StackResources {
            network,
            security_groups,
            file_system,
            access_point,
            function,
            build_project,
            trigger,
        },
    })
}
