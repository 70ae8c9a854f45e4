//! Provider executors and the bound registry.
//!
//! Descriptors come from the registry as plain data. Executors are attached in
//! a separate step: an [`ExecutorFactory`] maps provider type tags to
//! executors and [`ExecutorFactory::bind`] produces a [`BoundRegistry`] that
//! pairs every descriptor with the executor serving it. The descriptors are
//! shared, never copied or mutated.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use indexmap::IndexMap;
use openinfra_registry::ProviderRegistry;
use openinfra_types::{LookupError, Provider};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{CapabilityInvoker, InvocationError};

/// Executes capabilities on behalf of a provider.
#[async_trait]
pub trait ProviderExecutor: Send + Sync {
    /// Short label used in logs.
    fn label(&self) -> &'static str;

    async fn execute(
        &self,
        provider: &Provider,
        capability: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<u8>, InvocationError>;
}

/// Default executor: capabilities are HTTP calls described by the document.
#[derive(Debug, Clone)]
pub struct HttpCapabilityExecutor {
    invoker: CapabilityInvoker,
}

impl HttpCapabilityExecutor {
    pub fn new(invoker: CapabilityInvoker) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &CapabilityInvoker {
        &self.invoker
    }
}

#[async_trait]
impl ProviderExecutor for HttpCapabilityExecutor {
    fn label(&self) -> &'static str {
        "http"
    }

    async fn execute(
        &self,
        provider: &Provider,
        capability: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<u8>, InvocationError> {
        self.invoker.invoke(provider, capability, arguments).await
    }
}

/// Chooses an executor per provider type, falling back to a default.
#[derive(Clone)]
pub struct ExecutorFactory {
    fallback: Arc<dyn ProviderExecutor>,
    by_type: HashMap<String, Arc<dyn ProviderExecutor>>,
}

impl ExecutorFactory {
    pub fn new(fallback: Arc<dyn ProviderExecutor>) -> Self {
        Self {
            fallback,
            by_type: HashMap::new(),
        }
    }

    /// Serves every provider whose type tag equals `provider_type` with `executor`.
    pub fn register(&mut self, provider_type: impl Into<String>, executor: Arc<dyn ProviderExecutor>) -> &mut Self {
        self.by_type.insert(provider_type.into(), executor);
        self
    }

    pub fn executor_for(&self, provider_type: &str) -> Arc<dyn ProviderExecutor> {
        self.by_type
            .get(provider_type)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Pairs every provider in `registry` with its executor.
    pub fn bind(&self, registry: &ProviderRegistry) -> BoundRegistry {
        let mut providers = IndexMap::with_capacity(registry.len());
        for descriptor in registry.descriptors() {
            let executor = self.executor_for(&descriptor.r#type);
            debug!(
                provider = %descriptor.name,
                provider_type = %descriptor.r#type,
                executor = executor.label(),
                "provider bound"
            );
            providers.insert(
                descriptor.name.clone(),
                BoundProvider {
                    descriptor: Arc::clone(descriptor),
                    executor,
                },
            );
        }
        BoundRegistry { providers }
    }
}

/// A descriptor paired with the executor that serves it.
#[derive(Clone)]
pub struct BoundProvider {
    descriptor: Arc<Provider>,
    executor: Arc<dyn ProviderExecutor>,
}

impl BoundProvider {
    pub fn descriptor(&self) -> &Provider {
        &self.descriptor
    }

    pub fn executor_label(&self) -> &'static str {
        self.executor.label()
    }

    pub async fn invoke(&self, capability: &str, arguments: &Map<String, Value>) -> Result<Vec<u8>, InvocationError> {
        self.executor.execute(&self.descriptor, capability, arguments).await
    }
}

/// Immutable set of bound providers in document order.
#[derive(Clone, Default)]
pub struct BoundRegistry {
    providers: IndexMap<String, BoundProvider>,
}

impl BoundRegistry {
    pub fn get(&self, name: &str) -> Result<&BoundProvider, LookupError> {
        self.providers.get(name).ok_or_else(|| LookupError::provider_not_found(name))
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Resolves `provider_name` and delegates to its executor.
    pub async fn invoke(
        &self,
        provider_name: &str,
        capability: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<u8>, InvocationError> {
        self.get(provider_name)?.invoke(capability, arguments).await
    }
}
