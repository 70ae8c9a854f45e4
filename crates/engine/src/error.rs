//! Error types raised by capability invocation and engine configuration.

use std::time::Duration;

use openinfra_types::LookupError;
use thiserror::Error;

/// Failure of a single capability invocation.
///
/// Every variant except [`InvocationError::Transport`] and
/// [`InvocationError::Timeout`] is raised before any request leaves the
/// process.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("capability '{capability}' not found for provider '{provider}'")]
    CapabilityNotFound { provider: String, capability: String },

    #[error("missing required parameter '{parameter}'")]
    MissingParameter { parameter: String },

    #[error("capability '{capability}' declares invalid HTTP method '{method}'")]
    InvalidMethod { capability: String, method: String },

    #[error("authentication method '{method}' requires '{field}'")]
    MissingCredential { method: String, field: &'static str },

    #[error("credentials for authentication method '{method}' cannot be sent as a header")]
    InvalidCredential { method: String },

    #[error("transport failure: {cause}")]
    Transport { cause: String },

    #[error("request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },
}

impl InvocationError {
    pub fn capability_not_found(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::CapabilityNotFound {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    pub fn missing_parameter(parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
        }
    }

    pub fn invalid_method(capability: impl Into<String>, method: impl Into<String>) -> Self {
        Self::InvalidMethod {
            capability: capability.into(),
            method: method.into(),
        }
    }

    pub fn missing_credential(method: impl Into<String>, field: &'static str) -> Self {
        Self::MissingCredential {
            method: method.into(),
            field,
        }
    }

    pub fn transport(cause: impl ToString) -> Self {
        Self::Transport { cause: cause.to_string() }
    }

    /// True when the failure happened before a request was handed to the transport.
    pub fn is_preflight(&self) -> bool {
        !matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Error surfaced when reading or writing engine configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
