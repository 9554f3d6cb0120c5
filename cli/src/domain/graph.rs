//! Resource dependency graph of a rendered template.
//!
//! A resource depends on every resource it names through `Ref` or
//! `Fn::GetAtt` in its properties, and on every entry of its `DependsOn`.
//! References to template parameters and pseudo parameters are not edges.

use std::collections::{BTreeMap, BTreeSet};

use efsml_common::Template;
use efsml_common::intrinsic::references;
use serde_json::Value;

use crate::domain::error::GraphError;

/// Dependency graph keyed by logical id.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    /// id -> ids it depends on.
    dependencies: BTreeMap<String, BTreeSet<String>>,
    /// id -> ids that depend on it.
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl ResourceGraph {
    /// Build the graph of `template`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] if a resource names a
    /// logical id that is neither a resource nor a parameter.
    pub fn from_template(template: &Template) -> Result<Self, GraphError> {
        let mut graph = Self::default();
        for id in template.resources.keys() {
            graph.dependencies.insert(id.clone(), BTreeSet::new());
            graph.dependents.insert(id.clone(), BTreeSet::new());
        }

        for (id, resource) in &template.resources {
            let mut targets = references(&Value::Object(resource.properties.clone()));
            targets.extend(resource.depends_on.iter().cloned());

            for target in targets {
                if template.parameters.contains_key(&target) {
                    continue;
                }
                if !template.resources.contains_key(&target) {
                    return Err(GraphError::DanglingReference {
                        from: id.clone(),
                        to: target,
                    });
                }
                graph.add_edge(id, &target);
            }
        }
        Ok(graph)
    }

    fn add_edge(&mut self, dependent: &str, dependency: &str) {
        self.dependencies
            .entry(dependent.to_string())
            .or_default()
            .insert(dependency.to_string());
        self.dependents
            .entry(dependency.to_string())
            .or_default()
            .insert(dependent.to_string());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Direct dependencies of `id`, sorted.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.dependencies
            .get(id)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Direct dependents of `id`, sorted.
    #[must_use]
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.dependents
            .get(id)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether `dependent` directly depends on `dependency`.
    #[must_use]
    pub fn depends_on(&self, dependent: &str, dependency: &str) -> bool {
        self.dependencies
            .get(dependent)
            .is_some_and(|set| set.contains(dependency))
    }

    /// Whether `dependent` depends on `dependency` through any path.
    #[must_use]
    pub fn reaches(&self, dependent: &str, dependency: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![dependent];
        while let Some(current) = stack.pop() {
            let Some(next) = self.dependencies.get(current) else {
                continue;
            };
            for id in next {
                if id == dependency {
                    return true;
                }
                if seen.insert(id.as_str()) {
                    stack.push(id);
                }
            }
        }
        false
    }

    /// Deployment waves: every resource appears after all of its
    /// dependencies, resources within a wave are independent, and each wave
    /// is sorted by logical id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] with the unresolved ids if the graph
    /// is not acyclic.
    pub fn deployment_order(&self) -> Result<Vec<Vec<String>>, GraphError> {
        let mut pending: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut waves = Vec::new();
        let mut ready: Vec<&str> = pending
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(id, _)| *id)
            .collect();

        while !ready.is_empty() {
            for id in &ready {
                pending.remove(id);
            }
            let mut next = BTreeSet::new();
            for id in &ready {
                for dependent in self.dependents_of(id) {
                    if let Some(count) = pending.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            next.insert(dependent);
                        }
                    }
                }
            }
            waves.push(ready.iter().map(|id| (*id).to_string()).collect());
            ready = next.into_iter().collect();
        }

        if !pending.is_empty() {
            return Err(GraphError::Cycle {
                remaining: pending.keys().map(|id| (*id).to_string()).collect(),
            });
        }
        Ok(waves)
    }
}
