//! Persistence of a provisioned host and its node address.

use anyhow::{Context, Result};
use tracing::info;

use crate::api::Api;
use crate::config::{ClusterConfig, ConfigStore, Node};
use crate::host::Host;

/// Saves the host record, then records the machine's IP on the node.
///
/// The two saves are not atomic. If the host save succeeds and reading
/// the IP fails, the error is returned with the node left unchanged and
/// the cluster configuration not written. Both saves replace their target
/// wholesale, so calling this again after any failure is safe.
///
/// The new IP is reported with `info!`, so it is only shown when the log
/// level is `info` or more verbose.
pub fn save_host(
    api: &dyn Api,
    host: &Host,
    cfg: &mut ClusterConfig,
    node: &mut Node,
    store: &dyn ConfigStore,
) -> Result<()> {
    api.save(host).context("save")?;

    let ip = host.require_driver()?.ip()?;
    node.ip = ip;
    info!("saving new IP for node '{}': {}", node.name, node.ip);
    store.save_node(cfg, node)
}
