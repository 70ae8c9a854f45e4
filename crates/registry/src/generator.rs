//! YAML rendering of the in-memory model.
//!
//! Output uses the on-disk document layout, so [`to_yaml`] followed by
//! [`crate::parse`] reproduces an equal [`Specification`].

use openinfra_types::{ResourceKind, SpecDocument, Specification};
use tracing::debug;

/// Renders the whole specification back into a document.
pub fn to_yaml(specification: &Specification) -> Result<String, serde_yaml::Error> {
    let document = SpecDocument::from(specification);
    let rendered = serde_yaml::to_string(&document)?;
    debug!(byte_count = rendered.len(), "specification rendered");
    Ok(rendered)
}

/// Renders one canonical resource record.
pub fn resource_to_yaml(resource: &ResourceKind) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(resource)
}
