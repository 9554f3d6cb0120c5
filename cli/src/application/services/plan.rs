//! Application service — deployment order of a template.

use anyhow::Result;
use efsml_common::Template;
use serde::Serialize;

use crate::domain::config::StackProps;
use crate::domain::graph::ResourceGraph;
use crate::domain::stack::{SynthOptions, synthesize};

/// One resource in a deployment wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedResource {
    pub logical_id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Direct dependencies, sorted.
    pub depends_on: Vec<String>,
}

/// Resources grouped into waves that can be created in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub stack_name: String,
    pub resource_count: usize,
    pub waves: Vec<Vec<PlannedResource>>,
}

/// Order the resources of `template`.
///
/// # Errors
///
/// Returns an error if the template has a dangling reference or a cycle.
pub fn plan(stack_name: &str, template: &Template) -> Result<Plan> {
    let graph = ResourceGraph::from_template(template)?;
    let order = graph.deployment_order()?;

    let waves: Vec<Vec<PlannedResource>> = order
        .into_iter()
        .map(|wave| {
            wave.into_iter()
                .map(|id| PlannedResource {
                    resource_type: template
                        .resource(&id)
                        .map(|r| r.resource_type.clone())
                        .unwrap_or_default(),
                    depends_on: graph
                        .dependencies_of(&id)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    logical_id: id,
                })
                .collect()
        })
        .collect();

    tracing::debug!(
        resources = graph.len(),
        edges = graph.edge_count(),
        waves = waves.len(),
        "deployment order computed"
    );

    Ok(Plan {
        stack_name: stack_name.to_string(),
        resource_count: template.resources.len(),
        waves,
    })
}

/// Declare the stack for `props` and order its resources.
///
/// # Errors
///
/// Returns an error if the stack cannot be declared or ordered.
pub fn plan_stack(props: &StackProps) -> Result<Plan> {
    let stack = synthesize(props, &SynthOptions::default())?;
    plan(&stack.stack_name, &stack.template)
}
