//! Provider registry.
//!
//! A read-only index over the provider table of a [`Specification`]. Providers
//! are stored behind `Arc` so later phases (executor binding) can share the
//! descriptors without copying or mutating them.

use std::sync::Arc;

use indexmap::IndexMap;
use openinfra_types::{Capability, LookupError, Provider, Specification};

/// Immutable provider descriptors keyed by name in document order.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<Provider>>,
}

impl ProviderRegistry {
    /// Builds the registry from a parsed specification.
    pub fn from_specification(specification: &Specification) -> Self {
        Self::from_providers(specification.providers.values().cloned())
    }

    /// Builds the registry from providers in order; a repeated name replaces
    /// the earlier descriptor.
    pub fn from_providers(providers: impl IntoIterator<Item = Provider>) -> Self {
        let mut table = IndexMap::new();
        for provider in providers {
            table.insert(provider.name.clone(), Arc::new(provider));
        }
        Self { providers: table }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Provider, LookupError> {
        self.providers
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| LookupError::provider_not_found(name))
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Providers whose type tag equals `provider_type`, in document order.
    /// `None` applies no type constraint and lists every provider.
    pub fn list_by_type(&self, provider_type: Option<&str>) -> Vec<&Provider> {
        self.providers
            .values()
            .map(Arc::as_ref)
            .filter(|provider| provider_type.is_none_or(|wanted| provider.r#type == wanted))
            .collect()
    }

    /// Provider names in document order.
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn list_capabilities(&self, provider_name: &str) -> Result<&[Capability], LookupError> {
        self.get_by_name(provider_name).map(|provider| provider.capabilities.as_slice())
    }

    /// Every capability of every provider, grouped by provider in document order.
    pub fn all_capabilities(&self) -> Vec<&Capability> {
        self.providers
            .values()
            .flat_map(|provider| provider.capabilities.iter())
            .collect()
    }

    /// Providers exposing at least one capability named `capability_name`.
    pub fn find_providers_exposing(&self, capability_name: &str) -> Vec<&Provider> {
        self.providers
            .values()
            .map(Arc::as_ref)
            .filter(|provider| provider.exposes(capability_name))
            .collect()
    }

    pub fn get_capability(&self, provider_name: &str, capability_name: &str) -> Result<&Capability, LookupError> {
        self.get_by_name(provider_name)?
            .capability(capability_name)
            .ok_or_else(|| LookupError::capability_not_found(provider_name, capability_name))
    }

    /// Shared handles to the descriptors, used when binding executors.
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers.values()
    }
}

impl From<&Specification> for ProviderRegistry {
    fn from(specification: &Specification) -> Self {
        Self::from_specification(specification)
    }
}
