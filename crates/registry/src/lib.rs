//! Loading and indexing of OpenInfra specification documents.
//!
//! The crate turns a document into a [`Specification`], then offers two
//! read-only views over it: a [`ProviderRegistry`] for provider and capability
//! lookups and a [`DependencyGraph`] for resource ordering. Both views borrow
//! nothing from the loader and can be shared freely across threads.

pub mod generator;
pub mod graph;
pub mod loader;
pub mod registry;

pub use generator::{resource_to_yaml, to_yaml};
pub use graph::{DependencyGraph, GraphError};
pub use loader::{FileSource, InlineSource, ParseError, SpecSource, load_spec, load_spec_file, parse};
pub use openinfra_types::{
    Authentication, Capability, Connection, Dependency, LookupError, Parameter, Provider, Resource, ResourceKind,
    Specification,
};
pub use registry::ProviderRegistry;
