//! # OpenInfra Engine
//!
//! Turns capability calls described in an OpenInfra document into HTTP
//! requests and sends them.
//!
//! ## Usage
//!
//! ```rust
//! use openinfra_engine::{CapabilityInvoker, EngineConfig};
//! use serde_json::{Map, Value};
//!
//! let specification = openinfra_registry::parse(br#"
//! openinfra: 1.0.0
//! providers:
//!   - name: cloud
//!     type: aws
//!     connection:
//!       endpoint: https://api.example.com
//!       authentication:
//!         method: api_key
//!         api_key: token
//!     capabilities:
//!       - name: start_instance
//!         method: POST
//!         endpoint: /instances/{instance_id}/start
//!         parameters:
//!           - name: instance_id
//!             required: true
//! "#)?;
//!
//! let invoker = CapabilityInvoker::from_config(&EngineConfig::default())?;
//! let mut arguments = Map::new();
//! arguments.insert("instance_id".into(), Value::from("i-42"));
//!
//! let request = invoker.prepare(&specification.providers["cloud"], "start_instance", &arguments)?;
//! assert_eq!(request.url, "https://api.example.com/instances/i-42/start");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`invoker`**: request preparation and invocation
//! - **`transport`**: the HTTP seam and its `reqwest` implementation
//! - **`executor`**: per-provider-type executors bound to a registry
//! - **`config`**: timeouts and user agent, persisted as JSON

pub mod config;
pub mod error;
pub mod executor;
pub mod invoker;
pub mod transport;

pub use config::{EngineConfig, default_config_path};
pub use error::{ConfigError, InvocationError};
pub use executor::{BoundProvider, BoundRegistry, ExecutorFactory, HttpCapabilityExecutor, ProviderExecutor};
pub use invoker::CapabilityInvoker;
pub use transport::{HttpTransport, PreparedRequest, ReqwestTransport};

/// Builds a factory whose fallback executor sends capabilities over HTTP.
pub fn http_executor_factory(config: &EngineConfig) -> Result<ExecutorFactory, ConfigError> {
    let invoker = CapabilityInvoker::from_config(config)?;
    Ok(ExecutorFactory::new(std::sync::Arc::new(HttpCapabilityExecutor::new(invoker))))
}
