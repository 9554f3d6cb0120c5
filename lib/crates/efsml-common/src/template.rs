//! CloudFormation template document model.
//!
//! Only the parts of the template anatomy that efsml renders are modelled:
//! parameters, resources (with `DependsOn`, retention policies and metadata)
//! and outputs. Property bags stay as `serde_json` maps so intrinsic
//! functions can be embedded anywhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The only template format version CloudFormation accepts.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// Errors raised while assembling a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("duplicate logical id '{0}'")]
    DuplicateLogicalId(String),

    #[error("logical id '{0}' must be 1-255 alphanumeric characters")]
    InvalidLogicalId(String),
}

/// A complete CloudFormation template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,

    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: None,
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }
}

impl Template {
    /// Create an empty template with a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Add a resource under `logical_id`.
    ///
    /// Logical ids share one namespace across parameters and resources, so a
    /// clash with either is rejected.
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        resource: Resource,
    ) -> Result<(), TemplateError> {
        let id = self.claim(logical_id.into())?;
        self.resources.insert(id, resource);
        Ok(())
    }

    /// Add a parameter under `logical_id`.
    pub fn add_parameter(
        &mut self,
        logical_id: impl Into<String>,
        parameter: Parameter,
    ) -> Result<(), TemplateError> {
        let id = self.claim(logical_id.into())?;
        self.parameters.insert(id, parameter);
        Ok(())
    }

    /// Add an output under `logical_id`.
    pub fn add_output(
        &mut self,
        logical_id: impl Into<String>,
        output: Output,
    ) -> Result<(), TemplateError> {
        let id = logical_id.into();
        validate_logical_id(&id)?;
        if self.outputs.contains_key(&id) {
            return Err(TemplateError::DuplicateLogicalId(id));
        }
        self.outputs.insert(id, output);
        Ok(())
    }

    /// Look up a resource by logical id.
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Mutable access to a resource, used for low-level property overrides.
    pub fn resource_mut(&mut self, logical_id: &str) -> Option<&mut Resource> {
        self.resources.get_mut(logical_id)
    }

    /// Iterate over every resource of the given CloudFormation type.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    fn claim(&self, id: String) -> Result<String, TemplateError> {
        validate_logical_id(&id)?;
        if self.resources.contains_key(&id) || self.parameters.contains_key(&id) {
            return Err(TemplateError::DuplicateLogicalId(id));
        }
        Ok(id)
    }
}

fn validate_logical_id(id: &str) -> Result<(), TemplateError> {
    if id.is_empty() || id.len() > 255 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TemplateError::InvalidLogicalId(id.to_string()));
    }
    Ok(())
}

/// What CloudFormation does with a resource when it leaves the stack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
}

/// One resource declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Explicit ordering edges, kept sorted and free of duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<DeletionPolicy>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Resource {
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Map::new(),
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
            metadata: Map::new(),
        }
    }

    /// Set a property, replacing any previous value.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: Value) -> Self {
        self.set_property(key, value);
        self
    }

    /// Add an explicit dependency on another logical id.
    #[must_use]
    pub fn with_dependency(mut self, logical_id: &str) -> Self {
        self.add_dependency(logical_id);
        self
    }

    /// Apply `policy` both on stack deletion and on replacement.
    #[must_use]
    pub fn with_removal_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn set_property(&mut self, key: &str, value: Value) {
        self.properties.insert(key.to_string(), value);
    }

    pub fn add_dependency(&mut self, logical_id: &str) {
        if let Err(pos) = self.depends_on.binary_search_by(|d| d.as_str().cmp(logical_id)) {
            self.depends_on.insert(pos, logical_id.to_string());
        }
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A template input parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub parameter_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    /// A `String` parameter with a description.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            parameter_type: "String".to_string(),
            description: Some(description.into()),
        }
    }
}

/// A named stack output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
        }
    }
}
