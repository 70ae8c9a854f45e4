//! Capability invocation.
//!
//! Turning a capability call into HTTP happens in two steps. [`CapabilityInvoker::prepare`]
//! is pure: it validates arguments, resolves the endpoint template, and
//! attaches authentication. [`CapabilityInvoker::invoke`] then hands the
//! prepared request to the transport. Everything that can be rejected locally
//! is rejected before the transport is reached.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use openinfra_types::{AUTH_METHOD_API_KEY, AUTH_METHOD_PASSWORD, Authentication, Provider};
use openinfra_util::{path_value_from_argument, redact_sensitive, resolve_path, unresolved_placeholders};
use reqwest::{
    Method,
    header::{self, HeaderMap, HeaderValue},
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{ConfigError, EngineConfig, HttpTransport, InvocationError, PreparedRequest, ReqwestTransport};

/// Executes provider capabilities over HTTP.
#[derive(Clone)]
pub struct CapabilityInvoker {
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for CapabilityInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityInvoker").finish_non_exhaustive()
    }
}

impl CapabilityInvoker {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Builds an invoker over a [`ReqwestTransport`] configured from `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Resolves a capability call into a request without sending it.
    ///
    /// The endpoint template is appended to the connection base URL and only
    /// required parameters are substituted, anywhere in the resulting URL. A
    /// JSON `null` argument counts as supplied and renders as `null`.
    ///
    /// # Errors
    ///
    /// [`InvocationError::CapabilityNotFound`], [`InvocationError::MissingParameter`],
    /// [`InvocationError::InvalidMethod`], [`InvocationError::MissingCredential`], or
    /// [`InvocationError::InvalidCredential`].
    pub fn prepare(
        &self,
        provider: &Provider,
        capability_name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<PreparedRequest, InvocationError> {
        let capability = provider
            .capability(capability_name)
            .ok_or_else(|| InvocationError::capability_not_found(&provider.name, capability_name))?;

        let mut substitutions = Vec::new();
        for parameter in capability.required_parameters() {
            let value = arguments
                .get(&parameter.name)
                .ok_or_else(|| InvocationError::missing_parameter(&parameter.name))?;
            substitutions.push((parameter.name.as_str(), path_value_from_argument(value)));
        }

        let template = format!("{}{}", provider.connection.base_url(), capability.endpoint);
        let url = resolve_path(&template, substitutions);
        let leftover = unresolved_placeholders(&url);
        if !leftover.is_empty() {
            debug!(
                provider = %provider.name,
                capability = %capability.name,
                placeholders = ?leftover,
                "url keeps placeholders for optional parameters"
            );
        }

        let method = Method::from_bytes(capability.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| InvocationError::invalid_method(&capability.name, &capability.method))?;

        let mut headers = HeaderMap::new();
        if let Some(value) = authorization_header(&provider.connection.authentication)? {
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(PreparedRequest { method, url, headers })
    }

    /// Prepares and sends a capability call, returning the raw response body.
    ///
    /// The response status is logged but not inspected: a 4xx or 5xx body is
    /// returned like any other.
    pub async fn invoke(
        &self,
        provider: &Provider,
        capability_name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<u8>, InvocationError> {
        let request = self.prepare(provider, capability_name, arguments)?;
        info!(
            provider = %provider.name,
            capability = %capability_name,
            method = %request.method,
            url = %redact_sensitive(&request.url),
            "invoking capability"
        );

        let start = Instant::now();
        let body = self.transport.send(request).await?;
        debug!(
            provider = %provider.name,
            capability = %capability_name,
            body_len = body.len(),
            duration_ms = start.elapsed().as_millis(),
            "capability invocation finished"
        );
        Ok(body)
    }

    /// Same as [`Self::invoke`] but fails with [`InvocationError::Timeout`]
    /// when no response arrives within `deadline`.
    pub async fn invoke_with_deadline(
        &self,
        provider: &Provider,
        capability_name: &str,
        arguments: &Map<String, Value>,
        deadline: Duration,
    ) -> Result<Vec<u8>, InvocationError> {
        tokio::time::timeout(deadline, self.invoke(provider, capability_name, arguments))
            .await
            .map_err(|_| InvocationError::Timeout { after: deadline })?
    }
}

fn authorization_header(authentication: &Authentication) -> Result<Option<HeaderValue>, InvocationError> {
    let method = authentication.method.as_str();
    let credential = match method {
        AUTH_METHOD_API_KEY => {
            let token = non_empty(authentication.api_key.as_deref())
                .ok_or_else(|| InvocationError::missing_credential(method, "api_key"))?;
            format!("Bearer {token}")
        }
        AUTH_METHOD_PASSWORD => {
            let username = non_empty(authentication.username.as_deref())
                .ok_or_else(|| InvocationError::missing_credential(method, "username"))?;
            let password = authentication
                .password
                .as_deref()
                .ok_or_else(|| InvocationError::missing_credential(method, "password"))?;
            format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
        }
        _ => return Ok(None),
    };

    let mut value = HeaderValue::from_str(&credential).map_err(|_| InvocationError::InvalidCredential {
        method: method.to_string(),
    })?;
    value.set_sensitive(true);
    Ok(Some(value))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
