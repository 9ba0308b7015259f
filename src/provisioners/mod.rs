//! Provisioners configure the docker engine on a reachable machine.
//!
//! This module provides the [`Provisioner`] trait, the [`Strategy`] chosen
//! for a driver by [`ProvisionerSelector`], and the systemd-based
//! implementation shared by every supported OS family.

use anyhow::Result;

use crate::driver::DriverKind;
use crate::host::{AuthOptions, EngineOptions, SwarmOptions};

pub mod detect;
pub mod family;
pub mod select;
pub mod ssh;
pub mod systemd;

pub use detect::{OsRelease, detect_provisioner};
pub use family::OsFamily;
pub use select::ProvisionerSelector;
pub use ssh::SshRunner;
pub use systemd::SystemdProvisioner;

/// Trait for provisioner implementations.
///
/// A provisioner applies swarm, auth and engine settings to a running
/// machine. Applying is not idempotent in general: a failure may leave
/// the node partially configured.
pub trait Provisioner {
    /// Returns the provisioner name (e.g., "ubuntu", "buildroot").
    fn name(&self) -> &str;

    /// Configures the machine with the given options.
    fn provision(
        &self,
        swarm: &SwarmOptions,
        auth: &AuthOptions,
        engine: &EngineOptions,
    ) -> Result<()>;
}

/// Provisioning strategy chosen for a driver.
///
/// One variant per driver class; see [`ProvisionerSelector::select`].
pub enum Strategy<'a> {
    /// Fixed Ubuntu provisioner for container-backed machines.
    Container(SystemdProvisioner<'a>),
    /// Provisioner matching the OS detected on a bare-metal machine.
    Detected(Box<dyn Provisioner + 'a>),
    /// Fixed buildroot provisioner for virtual machines.
    Buildroot(SystemdProvisioner<'a>),
}

impl<'a> Strategy<'a> {
    /// Returns the driver class this strategy was chosen for.
    pub fn kind(&self) -> DriverKind {
        match self {
            Strategy::Container(_) => DriverKind::Container,
            Strategy::Detected(_) => DriverKind::BareMetal,
            Strategy::Buildroot(_) => DriverKind::VirtualMachine,
        }
    }

    /// Returns a reference to the underlying provisioner as a trait object.
    pub fn as_provisioner(&self) -> &dyn Provisioner {
        match self {
            Strategy::Container(p) => p,
            Strategy::Detected(p) => p.as_ref(),
            Strategy::Buildroot(p) => p,
        }
    }
}

impl std::fmt::Debug for Strategy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("kind", &self.kind())
            .field("provisioner", &self.as_provisioner().name())
            .finish()
    }
}
