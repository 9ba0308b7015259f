pub mod api;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod executor;
pub mod host;
pub mod machine;
pub mod persist;
pub mod provisioners;

pub use error::RsmachineError;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::CommandFactory;
use tracing::{debug, info, warn};
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::api::{ClientFactory, FileStoreFactory};
use crate::config::{Node, ProfileStore};
use crate::executor::CommandExecutor;
use crate::host::Host;
use crate::machine::{Machine, MachineLoader};
use crate::provisioners::ProvisionerSelector;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(filter).finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Returns the host of a machine that passes the validity check.
fn valid_host<'m>(machine: &'m Machine, name: &str) -> Result<&'m Host> {
    match machine.host() {
        Some(host) if machine.is_valid() => Ok(host),
        _ => Err(RsmachineError::InvalidMachine(name.to_string()).into()),
    }
}

pub fn run_provision(opts: &cli::ProvisionArgs, executor: Arc<dyn CommandExecutor>) -> Result<()> {
    let settings = config::load_settings(&opts.store).context("failed to load settings")?;
    let factory: Arc<dyn ClientFactory> = Arc::new(FileStoreFactory::new(opts.store.clone()));

    let machine = MachineLoader::new(factory.clone())
        .load(&opts.machine)
        .with_context(|| format!("failed to load machine '{}'", opts.machine))?;
    let host = valid_host(&machine, &opts.machine)?;

    let selector = ProvisionerSelector::new(settings.drivers.classifier(), executor);
    coordinator::provision_docker_machine(&selector, host)?;

    let store = ProfileStore::new(opts.store.clone());
    let profile = opts.profile.as_deref().unwrap_or(&host.name);
    let mut cfg = store
        .load_or_new(profile, &host.driver_name)
        .with_context(|| format!("failed to load profile '{}'", profile))?;
    let node_name = opts.node.as_deref().unwrap_or(&host.name);
    let mut node = cfg
        .node(node_name)
        .cloned()
        .unwrap_or_else(|| Node::new(node_name));

    let api = factory.new_client()?;
    persist::save_host(api.as_ref(), host, &mut cfg, &mut node, &store)?;

    match crate::host::docker_url(&node.ip) {
        Ok(url) => info!("docker endpoint: {}", url),
        Err(e) => warn!("{}", e),
    }
    info!("machine '{}' provisioned successfully", host.name);
    Ok(())
}

pub fn run_validate(opts: &cli::ValidateArgs) -> Result<()> {
    let settings = config::load_settings(&opts.store).context("failed to load settings")?;
    let factory: Arc<dyn ClientFactory> = Arc::new(FileStoreFactory::new(opts.store.clone()));

    let machine = MachineLoader::new(factory)
        .load(&opts.machine)
        .with_context(|| format!("failed to load machine '{}'", opts.machine))?;
    let host = valid_host(&machine, &opts.machine)?;

    let kind = settings.drivers.classifier().classify(&host.driver_name);
    info!(
        "validation successful: machine '{}' (driver: {}, class: {})",
        host.name, host.driver_name, kind
    );

    match host.require_driver()?.ip() {
        Ok(ip) => info!("docker endpoint: {}", crate::host::docker_url(&ip)?),
        Err(e) => debug!("no address recorded: {:#}", e),
    }
    Ok(())
}

pub fn run_completions(opts: &cli::CompletionsArgs, out: &mut dyn std::io::Write) {
    let mut cmd = cli::Cli::command();
    clap_complete::generate(opts.shell, &mut cmd, env!("CARGO_PKG_NAME"), out);
}
