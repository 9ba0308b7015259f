//! Provisioning of a loaded machine.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use crate::host::Host;
use crate::provisioners::ProvisionerSelector;

/// Selects and runs the provisioner for a host.
///
/// The caller is expected to have checked [`crate::machine::Machine::is_valid`];
/// validity is not re-checked here. A host lacking a driver or host options
/// fails with [`crate::RsmachineError::IncompleteHost`].
///
/// Selection failures are reported under the "fast detect" context;
/// provisioning failures are returned unchanged and may leave the machine
/// partially configured.
pub fn provision_docker_machine(selector: &ProvisionerSelector, host: &Host) -> Result<()> {
    info!("provisioning docker machine ...");
    let start = Instant::now();

    let result = (|| -> Result<()> {
        let driver = host.require_driver()?;
        let options = host.require_host_options()?;
        let strategy = selector.select(driver).context("fast detect")?;
        info!(
            "using {} provisioner for {} machine '{}'",
            strategy.as_provisioner().name(),
            strategy.kind(),
            host.name
        );
        strategy
            .as_provisioner()
            .provision(&options.swarm, &options.auth, &options.engine)
    })();

    info!("provisioned docker machine in {:?}", start.elapsed());
    result
}
