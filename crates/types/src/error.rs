//! Lookup failures over the immutable specification tables.

use thiserror::Error;

/// Errors raised when a named provider, capability, or resource is absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("provider '{name}' not found")]
    ProviderNotFound { name: String },

    #[error("capability '{capability}' not found for provider '{provider}'")]
    CapabilityNotFound { provider: String, capability: String },

    #[error("resource '{name}' not found")]
    ResourceNotFound { name: String },

    #[error("action '{action}' not supported for resource '{resource}'")]
    ActionNotSupported { resource: String, action: String },
}

impl LookupError {
    pub fn provider_not_found(name: impl Into<String>) -> Self {
        Self::ProviderNotFound { name: name.into() }
    }

    pub fn capability_not_found(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::CapabilityNotFound {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    pub fn resource_not_found(name: impl Into<String>) -> Self {
        Self::ResourceNotFound { name: name.into() }
    }

    pub fn action_not_supported(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::ActionNotSupported {
            resource: resource.into(),
            action: action.into(),
        }
    }
}
