//! Resource dependency graph and provisioning order.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use openinfra_types::{Dependency, Specification};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("resource '{resource}' cannot depend on itself")]
    SelfDependency { resource: String },

    #[error("cycle detected in resource dependencies involving: {}", .members.join(", "))]
    Cycle { members: Vec<String> },
}

/// Maps each resource name to the ordered list of resources it depends on.
///
/// Declarations use map semantics: a later declaration for the same resource
/// replaces the earlier one. Names are not validated against the resource
/// table, so a dependency may point at a resource the document never defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: IndexSet<String>,
    edges: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph from a specification.
    ///
    /// Every declared resource becomes a node. Top-level declarations are
    /// applied first, followed by the lists embedded in each resource (in
    /// resource order), so an embedded declaration overrides a top-level one
    /// for the same resource.
    pub fn from_specification(specification: &Specification) -> Self {
        let mut graph = Self::default();
        for name in specification.resources.keys() {
            graph.nodes.insert(name.clone());
        }
        for dependency in &specification.dependencies {
            graph.declare(dependency);
        }
        for resource in specification.resources.values() {
            for dependency in &resource.dependencies {
                graph.declare(dependency);
            }
        }
        graph
    }

    /// Builds the graph from declarations alone.
    pub fn from_dependencies<'a>(dependencies: impl IntoIterator<Item = &'a Dependency>) -> Self {
        let mut graph = Self::default();
        for dependency in dependencies {
            graph.declare(dependency);
        }
        graph
    }

    fn declare(&mut self, dependency: &Dependency) {
        self.nodes.insert(dependency.resource.clone());
        for target in &dependency.depends_on {
            self.nodes.insert(target.clone());
        }
        self.edges.insert(dependency.resource.clone(), dependency.depends_on.clone());
    }

    /// Direct dependencies of `resource`.
    ///
    /// A resource without declared dependencies, including one the graph has
    /// never heard of, yields an empty slice rather than an error.
    pub fn dependencies_of(&self, resource: &str) -> &[String] {
        self.edges.get(resource).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resources that directly depend on `resource`, in declaration order.
    pub fn dependents_of(&self, resource: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, targets)| targets.iter().any(|target| target == resource))
            .map(|(source, _)| source.as_str())
            .collect()
    }

    /// True when `resource` is declared or referenced anywhere in the graph.
    pub fn contains(&self, resource: &str) -> bool {
        self.nodes.contains(resource)
    }

    /// All known names: declared resources first, then names only referenced
    /// by dependency declarations.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Orders every node so each resource follows all of its dependencies.
    ///
    /// Ties are broken by node order, which keeps the result deterministic for
    /// a given document. Repeated entries in a dependency list count once.
    pub fn provisioning_order(&self) -> Result<Vec<String>, GraphError> {
        let mut in_degrees: HashMap<&str, usize> = self.nodes.iter().map(|name| (name.as_str(), 0)).collect();
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

        for (source, targets) in &self.edges {
            let mut seen_targets = HashSet::new();
            for target in targets {
                if target == source {
                    return Err(GraphError::SelfDependency { resource: source.clone() });
                }
                if !seen_targets.insert(target.as_str()) {
                    continue;
                }
                if let Some(degree) = in_degrees.get_mut(source.as_str()) {
                    *degree += 1;
                }
                adjacency.entry(target.as_str()).or_default().push(source.as_str());
            }
        }

        let mut queue: VecDeque<&str> = self
            .nodes
            .iter()
            .map(String::as_str)
            .filter(|name| in_degrees.get(name).copied().unwrap_or(0) == 0)
            .collect();

        let mut ordered = Vec::with_capacity(self.nodes.len());
        while let Some(name) = queue.pop_front() {
            ordered.push(name.to_string());
            if let Some(children) = adjacency.get(name) {
                for child in children {
                    if let Some(degree) = in_degrees.get_mut(child) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(*child);
                        }
                    }
                }
            }
        }

        if ordered.len() != self.nodes.len() {
            let mut members: Vec<String> = in_degrees
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(name, _)| name.to_string())
                .collect();
            members.sort();
            return Err(GraphError::Cycle { members });
        }

        Ok(ordered)
    }
}

impl From<&Specification> for DependencyGraph {
    fn from(specification: &Specification) -> Self {
        Self::from_specification(specification)
    }
}
