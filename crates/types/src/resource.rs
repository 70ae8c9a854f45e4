//! Canonical resource records derived from loosely typed property bags.
//!
//! Documents are authored by hand, so numeric properties may arrive as
//! integers, floats, or quoted strings. Coercion here never fails: values that
//! cannot be interpreted fall back to zero or the empty string so callers that
//! tolerate partially typed documents keep working.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::Resource;

/// Type tag for virtual machine resources.
pub const VIRTUAL_MACHINE: &str = "virtual_machine";
/// Type tag for network resources.
pub const NETWORK: &str = "network";

/// Common view over every resource kind.
pub trait InfraResource {
    fn name(&self) -> &str;
    fn resource_type(&self) -> &str;
    /// Canonical property map for this kind.
    fn properties(&self) -> Map<String, Value>;
    fn actions(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualMachine {
    pub name: String,
    /// Provider that hosts the machine.
    #[serde(rename = "provider")]
    pub hypervisor: String,
    pub cpu: i64,
    pub memory: String,
    pub disk_size: String,
    pub os: String,
    pub network: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkResource {
    pub name: String,
    pub cidr: String,
    pub gateway: String,
    pub dns_servers: Vec<String>,
    pub actions: Vec<String>,
}

/// Tagged variant over the known resource kinds.
///
/// New kinds are added as variants here; unknown type tags are carried
/// through untouched as [`ResourceKind::Generic`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceKind {
    VirtualMachine(VirtualMachine),
    Network(NetworkResource),
    Generic(Resource),
}

impl ResourceKind {
    /// Builds the canonical record for a declared resource.
    pub fn from_resource(resource: &Resource) -> Self {
        let properties = &resource.properties;
        match resource.r#type.as_str() {
            VIRTUAL_MACHINE => ResourceKind::VirtualMachine(VirtualMachine {
                name: resource.name.clone(),
                hypervisor: resource.provider.clone(),
                cpu: coerce_int(properties.get("cpu")),
                memory: coerce_string(properties.get("memory")),
                disk_size: coerce_string(properties.get("disk_size")),
                os: coerce_string(properties.get("os")),
                network: coerce_string(properties.get("network")),
                actions: resource.actions.clone(),
            }),
            NETWORK => ResourceKind::Network(NetworkResource {
                name: resource.name.clone(),
                cidr: coerce_string(properties.get("cidr")),
                gateway: coerce_string(properties.get("gateway")),
                dns_servers: coerce_string_list(properties.get("dns_servers")),
                actions: resource.actions.clone(),
            }),
            _ => ResourceKind::Generic(resource.clone()),
        }
    }
}

impl From<&Resource> for ResourceKind {
    fn from(resource: &Resource) -> Self {
        ResourceKind::from_resource(resource)
    }
}

impl InfraResource for VirtualMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        VIRTUAL_MACHINE
    }

    fn properties(&self) -> Map<String, Value> {
        Map::from_iter([
            ("provider".to_string(), Value::from(self.hypervisor.clone())),
            ("cpu".to_string(), Value::from(self.cpu)),
            ("memory".to_string(), Value::from(self.memory.clone())),
            ("disk_size".to_string(), Value::from(self.disk_size.clone())),
            ("os".to_string(), Value::from(self.os.clone())),
            ("network".to_string(), Value::from(self.network.clone())),
        ])
    }

    fn actions(&self) -> &[String] {
        &self.actions
    }
}

impl InfraResource for NetworkResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        NETWORK
    }

    fn properties(&self) -> Map<String, Value> {
        Map::from_iter([
            ("cidr".to_string(), Value::from(self.cidr.clone())),
            ("gateway".to_string(), Value::from(self.gateway.clone())),
            ("dns_servers".to_string(), Value::from(self.dns_servers.clone())),
        ])
    }

    fn actions(&self) -> &[String] {
        &self.actions
    }
}

impl InfraResource for Resource {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        &self.r#type
    }

    fn properties(&self) -> Map<String, Value> {
        self.properties.clone()
    }

    fn actions(&self) -> &[String] {
        &self.actions
    }
}

impl InfraResource for ResourceKind {
    fn name(&self) -> &str {
        match self {
            ResourceKind::VirtualMachine(vm) => vm.name(),
            ResourceKind::Network(network) => network.name(),
            ResourceKind::Generic(resource) => InfraResource::name(resource),
        }
    }

    fn resource_type(&self) -> &str {
        match self {
            ResourceKind::VirtualMachine(vm) => vm.resource_type(),
            ResourceKind::Network(network) => network.resource_type(),
            ResourceKind::Generic(resource) => resource.resource_type(),
        }
    }

    fn properties(&self) -> Map<String, Value> {
        match self {
            ResourceKind::VirtualMachine(vm) => vm.properties(),
            ResourceKind::Network(network) => network.properties(),
            ResourceKind::Generic(resource) => InfraResource::properties(resource),
        }
    }

    fn actions(&self) -> &[String] {
        match self {
            ResourceKind::VirtualMachine(vm) => vm.actions(),
            ResourceKind::Network(network) => network.actions(),
            ResourceKind::Generic(resource) => InfraResource::actions(resource),
        }
    }
}

/// Coerces a property into an integer.
///
/// Integers pass through, floats are truncated toward zero, and numeric
/// strings are parsed. Anything else, including a missing value, yields `0`.
pub fn coerce_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|unsigned| i64::try_from(unsigned).unwrap_or(i64::MAX)))
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|float| float.is_finite()).map(|float| float as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Coerces a property into a string. Scalars are rendered; other shapes become empty.
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(resource_type: &str, properties: Value) -> Resource {
        Resource {
            r#type: resource_type.into(),
            provider: "local_virtualbox".into(),
            name: "local_vm".into(),
            properties: properties.as_object().cloned().unwrap_or_default(),
            actions: vec!["start".into(), "stop".into()],
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn coerce_int_accepts_integer_and_float_representations() {
        assert_eq!(coerce_int(Some(&json!(2))), 2);
        assert_eq!(coerce_int(Some(&json!(2.0))), 2);
        assert_eq!(coerce_int(Some(&json!(3.9))), 3);
        assert_eq!(coerce_int(Some(&json!("8"))), 8);
    }

    #[test]
    fn coerce_int_falls_back_to_zero() {
        assert_eq!(coerce_int(Some(&json!("two"))), 0);
        assert_eq!(coerce_int(Some(&json!(true))), 0);
        assert_eq!(coerce_int(Some(&json!(["1"]))), 0);
        assert_eq!(coerce_int(None), 0);
    }

    #[test]
    fn virtual_machine_record_is_built_leniently() {
        let source = resource(
            VIRTUAL_MACHINE,
            json!({ "cpu": 2.0, "memory": "4GB", "disk_size": "50GB", "os": "ubuntu-22.04" }),
        );

        let ResourceKind::VirtualMachine(vm) = ResourceKind::from_resource(&source) else {
            panic!("expected a virtual machine");
        };
        assert_eq!(vm.cpu, 2);
        assert_eq!(vm.hypervisor, "local_virtualbox");
        assert_eq!(vm.memory, "4GB");
        assert_eq!(vm.network, "", "missing properties become empty strings");
        assert_eq!(vm.actions, vec!["start".to_string(), "stop".to_string()]);
    }

    #[test]
    fn non_numeric_cpu_coerces_to_zero() {
        let source = resource(VIRTUAL_MACHINE, json!({ "cpu": "lots" }));
        let kind = ResourceKind::from_resource(&source);
        assert_eq!(kind.properties()["cpu"], json!(0));
    }

    #[test]
    fn network_record_keeps_only_string_dns_servers() {
        let source = resource(
            NETWORK,
            json!({ "cidr": "192.168.1.0/24", "gateway": "192.168.1.1", "dns_servers": ["8.8.8.8", 53, "8.8.4.4"] }),
        );

        let kind = ResourceKind::from_resource(&source);
        assert_eq!(kind.resource_type(), NETWORK);
        let ResourceKind::Network(network) = kind else {
            panic!("expected a network");
        };
        assert_eq!(network.dns_servers, vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()]);
        assert_eq!(network.cidr, "192.168.1.0/24");
    }

    #[test]
    fn unknown_types_pass_through() {
        let source = resource("load_balancer", json!({ "listeners": 2 }));
        let kind = ResourceKind::from_resource(&source);
        assert!(matches!(kind, ResourceKind::Generic(_)));
        assert_eq!(kind.resource_type(), "load_balancer");
        assert_eq!(kind.properties()["listeners"], json!(2));
    }
}
