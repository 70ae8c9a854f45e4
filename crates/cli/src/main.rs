use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use openinfra_engine::{CapabilityInvoker, EngineConfig, InvocationError, http_executor_factory};
use openinfra_registry::{
    DependencyGraph, ProviderRegistry, ResourceKind, Specification, load_spec_file, resource_to_yaml, to_yaml,
};
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "openinfra", version, about = "Inspect OpenInfra documents and invoke provider capabilities")]
struct Cli {
    /// OpenInfra document to load.
    #[arg(short, long, global = true, default_value = "openinfra.yaml")]
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List providers, optionally restricted to one type.
    Providers {
        #[arg(long = "type")]
        provider_type: Option<String>,
    },
    /// List the capabilities of a provider.
    Capabilities { provider: String },
    /// List providers exposing a capability.
    Find { capability: String },
    /// Print the direct dependencies of a resource, or of every known resource.
    Deps { resource: Option<String> },
    /// Print every resource in provisioning order.
    Order,
    /// Print the canonical form of a resource.
    Resource { name: String },
    /// Invoke a provider capability.
    Invoke {
        provider: String,
        capability: String,
        /// Capability argument as KEY=VALUE. VALUE is read as JSON when it parses, else as text.
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_argument)]
        arguments: Vec<(String, Value)>,
        /// Print the request instead of sending it.
        #[arg(long)]
        dry_run: bool,
        /// Per-call deadline in seconds.
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
    /// Render the loaded document back to YAML.
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let specification =
        load_spec_file(&cli.file).with_context(|| format!("failed to load {}", cli.file.display()))?;
    debug!(
        file = %cli.file.display(),
        providers = specification.providers.len(),
        resources = specification.resources.len(),
        "document loaded"
    );

    run(cli.command, &specification).await
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(command: Command, specification: &Specification) -> Result<()> {
    let registry = ProviderRegistry::from_specification(specification);

    match command {
        Command::Providers { provider_type } => {
            for provider in registry.list_by_type(provider_type.as_deref()) {
                let resources = specification.resources_for_provider(&provider.name).count();
                println!(
                    "{}\t{}\t{}\t{resources}",
                    provider.name,
                    provider.r#type,
                    provider.connection.base_url()
                );
            }
        }
        Command::Capabilities { provider } => {
            for capability in registry.list_capabilities(&provider)? {
                println!(
                    "{}\t{} {}\t{}",
                    capability.name, capability.method, capability.endpoint, capability.description
                );
            }
        }
        Command::Find { capability } => {
            for provider in registry.find_providers_exposing(&capability) {
                println!("{}", provider.name);
            }
        }
        Command::Deps { resource } => {
            let graph = DependencyGraph::from_specification(specification);
            match resource {
                Some(resource) => {
                    for dependency in graph.dependencies_of(&resource) {
                        println!("{dependency}");
                    }
                }
                None => {
                    for node in graph.nodes() {
                        println!("{node}\t{}", graph.dependencies_of(node).join(","));
                    }
                }
            }
        }
        Command::Order => {
            let graph = DependencyGraph::from_specification(specification);
            for resource in graph.provisioning_order()? {
                println!("{resource}");
            }
        }
        Command::Resource { name } => {
            let resource = ResourceKind::from_resource(specification.get_resource(&name)?);
            print!("{}", resource_to_yaml(&resource)?);
        }
        Command::Invoke {
            provider,
            capability,
            arguments,
            dry_run,
            timeout,
        } => {
            let arguments: Map<String, Value> = arguments.into_iter().collect();
            invoke(&registry, &provider, &capability, &arguments, dry_run, timeout).await?;
        }
        Command::Export => {
            print!("{}", to_yaml(specification)?);
        }
    }
    Ok(())
}

async fn invoke(
    registry: &ProviderRegistry,
    provider: &str,
    capability: &str,
    arguments: &Map<String, Value>,
    dry_run: bool,
    timeout: Option<u64>,
) -> Result<()> {
    let config = EngineConfig::load().context("failed to load engine configuration")?;

    if dry_run {
        let invoker = CapabilityInvoker::from_config(&config)?;
        let request = invoker.prepare(registry.get_by_name(provider)?, capability, arguments)?;
        println!("{}", serde_json::to_string_pretty(&request.describe())?);
        return Ok(());
    }

    let bound = http_executor_factory(&config)?.bind(registry);
    let call = bound.invoke(provider, capability, arguments);
    let body = match timeout.map(Duration::from_secs) {
        Some(deadline) => tokio::time::timeout(deadline, call)
            .await
            .map_err(|_| InvocationError::Timeout { after: deadline })?,
        None => call.await,
    }
    .with_context(|| format!("{provider}.{capability} failed"))?;

    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}

fn parse_argument(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(anyhow!("argument name is empty in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn arguments_prefer_json_values() {
        assert_eq!(parse_argument("vm_id=vm-123").expect("text"), ("vm_id".into(), Value::from("vm-123")));
        assert_eq!(parse_argument("cpu=2").expect("number"), ("cpu".into(), Value::from(2)));
        assert_eq!(parse_argument("note=a=b").expect("split once"), ("note".into(), Value::from("a=b")));
        assert!(parse_argument("novalue").is_err());
        assert!(parse_argument("=x").is_err());
    }

    #[test]
    fn deps_resource_is_optional() {
        let all = Cli::try_parse_from(["openinfra", "deps"]).expect("parse");
        assert!(matches!(all.command, Command::Deps { resource: None }));

        let one = Cli::try_parse_from(["openinfra", "deps", "web"]).expect("parse");
        assert!(matches!(one.command, Command::Deps { resource: Some(ref name) } if name == "web"));
    }

    #[test]
    fn invoke_collects_repeated_arguments() {
        let cli = Cli::try_parse_from([
            "openinfra",
            "--file",
            "infra.yaml",
            "invoke",
            "local_virtualbox",
            "create_vm",
            "--arg",
            "name=web",
            "--arg",
            "cpu=2",
            "--dry-run",
        ])
        .expect("parse");

        let Command::Invoke { arguments, dry_run, .. } = cli.command else {
            panic!("expected invoke");
        };
        assert!(dry_run);
        assert_eq!(arguments.len(), 2);
        assert_eq!(cli.file, PathBuf::from("infra.yaml"));
    }
}
