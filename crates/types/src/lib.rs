//! Shared type definitions for the OpenInfra specification model.
//!
//! A specification document is deserialized into [`SpecDocument`], which keeps
//! the list-shaped layout of the source file, and then normalized into a
//! [`Specification`] whose provider and resource tables are keyed by name while
//! preserving document order. Everything in this crate is plain data: values are
//! built once at load time and only read afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub mod error;
pub mod resource;

pub use error::LookupError;
pub use resource::{InfraResource, NetworkResource, ResourceKind, VirtualMachine, coerce_int, coerce_string};

/// Authentication method tag that selects bearer token authentication.
pub const AUTH_METHOD_API_KEY: &str = "api_key";
/// Authentication method tag that selects HTTP basic authentication.
pub const AUTH_METHOD_PASSWORD: &str = "password";

/// Treats an explicit YAML/JSON `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts any YAML scalar for version-like fields so `1.0` and `"1.0"` agree.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Unsigned(u64),
        Float(f64),
        Flag(bool),
    }

    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Text(text)) => text,
        Some(Scalar::Integer(number)) => number.to_string(),
        Some(Scalar::Unsigned(number)) => number.to_string(),
        Some(Scalar::Float(number)) => format!("{number:?}"),
        Some(Scalar::Flag(flag)) => flag.to_string(),
        None => String::new(),
    })
}

/// Reads an action list whose entries are either bare names or mappings
/// carrying a `name` key. Only the names are kept.
fn action_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ActionEntry {
        Name(String),
        Described { name: String },
    }

    let entries = Option::<Vec<ActionEntry>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            ActionEntry::Name(name) | ActionEntry::Described { name } => name,
        })
        .collect())
}

/// Raw document layout as authored on disk.
///
/// `openinfra` and `providers` are mandatory; every other top-level key
/// defaults to empty when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    /// Schema version of the document (for example `1.0.0`).
    #[serde(deserialize_with = "scalar_as_string")]
    pub openinfra: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: Info,
    pub providers: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<Resource>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<Dependency>,
}

/// General information about the specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact: Contact,
    #[serde(default, deserialize_with = "null_as_default")]
    pub license: License,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A named external system that resources reference but do not own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique provider name used as the registry key.
    pub name: String,
    /// Free-form discriminator such as `aws` or `virtualbox`.
    #[serde(default)]
    pub r#type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connection: Connection,
    /// Callable operations in declaration order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: Vec<Capability>,
}

impl Provider {
    /// Finds a capability by name.
    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|capability| capability.name == name)
    }

    /// Returns true when any capability carries the given name.
    pub fn exposes(&self, capability_name: &str) -> bool {
        self.capability(capability_name).is_some()
    }
}

/// How to reach a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authentication: Authentication,
}

impl Connection {
    /// Base URL for capability requests.
    ///
    /// A non-empty `endpoint` always wins over `host`. When neither is set the
    /// base is empty and the capability template is used on its own.
    pub fn base_url(&self) -> &str {
        match self.endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => endpoint,
            _ => self.host.as_deref().unwrap_or_default(),
        }
    }
}

/// Credentials for a provider connection.
///
/// Only the fields relevant to `method` are expected to be populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// A declaratively described operation exposed by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// HTTP method (GET, POST, DELETE, ...).
    #[serde(default)]
    pub method: String,
    /// Endpoint template appended to the connection base URL, e.g. `/vms/{vm_id}/start`.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<Parameter>,
}

impl Capability {
    /// Parameters flagged as required, in declaration order.
    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|parameter| parameter.required)
    }
}

/// A capability parameter. The type tag is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub required: bool,
}

/// A named infrastructure entity declared under `components`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource type tag such as `virtual_machine` or `network`.
    #[serde(default)]
    pub r#type: String,
    /// Name of the provider this resource is provisioned through.
    #[serde(default)]
    pub provider: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Map<String, Value>,
    /// Named operations the resource exposes (distinct from provider capabilities).
    #[serde(default, deserialize_with = "action_names")]
    pub actions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl Resource {
    /// Confirms that the resource declares `action`.
    pub fn ensure_action(&self, action: &str) -> Result<(), LookupError> {
        if self.actions.iter().any(|declared| declared == action) {
            Ok(())
        } else {
            Err(LookupError::action_not_supported(&self.name, action))
        }
    }
}

/// Declares that `resource` must be provisioned after everything in `depends_on`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub resource: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub depends_on: Vec<String>,
}

/// Fully parsed, immutable specification.
///
/// Provider and resource tables are keyed by name in document order. When a
/// name appears more than once the later definition replaces the earlier one
/// and keeps the position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Specification {
    pub version: String,
    pub info: Info,
    pub providers: IndexMap<String, Provider>,
    pub resources: IndexMap<String, Resource>,
    /// Top-level dependency declarations in document order. Names are not validated.
    pub dependencies: Vec<Dependency>,
}

impl Specification {
    /// Looks up a resource by name.
    pub fn get_resource(&self, name: &str) -> Result<&Resource, LookupError> {
        self.resources.get(name).ok_or_else(|| LookupError::resource_not_found(name))
    }

    /// Resources whose `provider` back-reference names the given provider.
    pub fn resources_for_provider<'a>(&'a self, provider_name: &'a str) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources.values().filter(move |resource| resource.provider == provider_name)
    }
}

impl From<SpecDocument> for Specification {
    fn from(document: SpecDocument) -> Self {
        let mut providers = IndexMap::with_capacity(document.providers.len());
        for provider in document.providers {
            providers.insert(provider.name.clone(), provider);
        }

        let mut resources = IndexMap::with_capacity(document.components.len());
        for resource in document.components {
            resources.insert(resource.name.clone(), resource);
        }

        Specification {
            version: document.openinfra,
            info: document.info,
            providers,
            resources,
            dependencies: document.dependencies,
        }
    }
}

impl From<&Specification> for SpecDocument {
    fn from(specification: &Specification) -> Self {
        SpecDocument {
            openinfra: specification.version.clone(),
            info: specification.info.clone(),
            providers: specification.providers.values().cloned().collect(),
            components: specification.resources.values().cloned().collect(),
            dependencies: specification.dependencies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(host: Option<&str>, endpoint: Option<&str>) -> Connection {
        Connection {
            protocol: "https".into(),
            host: host.map(str::to_string),
            port: None,
            endpoint: endpoint.map(str::to_string),
            authentication: Authentication::default(),
        }
    }

    #[test]
    fn endpoint_wins_over_host() {
        let both = connection(Some("http://10.0.0.1"), Some("https://api.example.com"));
        assert_eq!(both.base_url(), "https://api.example.com");

        let host_only = connection(Some("http://10.0.0.1"), None);
        assert_eq!(host_only.base_url(), "http://10.0.0.1");

        let empty_endpoint = connection(Some("http://10.0.0.1"), Some(""));
        assert_eq!(empty_endpoint.base_url(), "http://10.0.0.1");

        assert_eq!(connection(None, None).base_url(), "");
    }

    #[test]
    fn duplicate_names_keep_the_last_definition() {
        let yaml = r#"
openinfra: 1.0.0
providers:
  - name: shared
    type: aws
  - name: shared
    type: virtualbox
components:
  - name: vm
    type: virtual_machine
    properties:
      cpu: 1
  - name: net
    type: network
  - name: vm
    type: virtual_machine
    properties:
      cpu: 4
"#;
        let document: SpecDocument = serde_yaml::from_str(yaml).expect("deserialize document");
        let specification = Specification::from(document);

        assert_eq!(specification.providers.len(), 1);
        assert_eq!(specification.providers["shared"].r#type, "virtualbox");
        let names: Vec<&str> = specification.resources.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["vm", "net"]);
        assert_eq!(specification.resources["vm"].properties["cpu"], Value::from(4));
    }

    #[test]
    fn resources_for_provider_follows_back_references() {
        let yaml = r#"
openinfra: 1.0.0
providers:
  - name: cloud
  - name: lab
components:
  - name: web
    provider: cloud
  - name: bench
    provider: lab
  - name: db
    provider: cloud
  - name: orphan
"#;
        let document: SpecDocument = serde_yaml::from_str(yaml).expect("deserialize document");
        let specification = Specification::from(document);

        let names: Vec<&str> = specification
            .resources_for_provider("cloud")
            .map(|resource| resource.name.as_str())
            .collect();
        assert_eq!(names, vec!["web", "db"]);
        assert_eq!(specification.resources_for_provider("lab").count(), 1);
        assert_eq!(specification.resources_for_provider("missing").count(), 0);
    }

    #[test]
    fn null_collections_default_to_empty() {
        let yaml = r#"
openinfra: 1.0.0
info:
providers:
  - name: bare
    capabilities:
components:
  - name: empty
    properties:
    actions:
dependencies:
"#;
        let document: SpecDocument = serde_yaml::from_str(yaml).expect("deserialize document");
        assert!(document.providers[0].capabilities.is_empty());
        assert!(document.components[0].properties.is_empty());
        assert!(document.components[0].actions.is_empty());
        assert!(document.dependencies.is_empty());
        assert_eq!(document.info, Info::default());
    }

    #[test]
    fn numeric_versions_are_read_as_text() {
        let yaml = "openinfra: 1.0\ninfo:\n  version: 2\nproviders: []\n";
        let document: SpecDocument = serde_yaml::from_str(yaml).expect("deserialize document");
        assert_eq!(document.openinfra, "1.0");
        assert_eq!(document.info.version, "2");
    }

    #[test]
    fn described_actions_keep_only_their_names() {
        let yaml = r#"
type: virtual_machine
name: local_vm
actions:
  - start
  - name: stop
    method: POST
    endpoint: /vms/{vm_id}/stop
"#;
        let resource: Resource = serde_yaml::from_str(yaml).expect("deserialize resource");
        assert_eq!(resource.actions, vec!["start".to_string(), "stop".to_string()]);
    }

    #[test]
    fn ensure_action_reports_unsupported_actions() {
        let resource = Resource {
            r#type: "virtual_machine".into(),
            provider: "local".into(),
            name: "web".into(),
            properties: Map::new(),
            actions: vec!["start".into(), "stop".into()],
            dependencies: Vec::new(),
        };

        assert!(resource.ensure_action("start").is_ok());
        let error = resource.ensure_action("explode").expect_err("undeclared action");
        assert!(matches!(error, LookupError::ActionNotSupported { .. }));
        assert!(error.to_string().contains("explode"));
    }

    #[test]
    fn required_parameters_skip_optional_ones() {
        let capability: Capability = serde_json::from_value(serde_json::json!({
            "name": "create_vm",
            "method": "POST",
            "endpoint": "/vms",
            "parameters": [
                {"name": "name", "type": "string", "required": true},
                {"name": "tag", "type": "string"},
                {"name": "cpu", "type": "integer", "required": true}
            ]
        }))
        .expect("deserialize capability");

        let required: Vec<&str> = capability.required_parameters().map(|parameter| parameter.name.as_str()).collect();
        assert_eq!(required, vec!["name", "cpu"]);
    }
}
