//! Driver capability and driver classification.
//!
//! A driver owns the VM, container or physical host behind a machine.
//! rsmachine never creates or destroys machines; it only asks a loaded
//! driver for its name, its network address and how to reach it over SSH.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

pub mod stored;

pub use stored::StoredDriver;

/// Address and credentials used to open an SSH session to a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub hostname: String,
    pub port: u16,
    pub user: String,
    pub key_path: Option<Utf8PathBuf>,
}

/// Capability exposed by a machine driver.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Returns the driver identifier (e.g., "docker", "kvm2", "none").
    fn driver_name(&self) -> &str;

    /// Returns the name of the machine this driver controls.
    fn machine_name(&self) -> &str;

    /// Returns the network address currently assigned to the machine.
    fn ip(&self) -> Result<String>;

    /// Returns the SSH endpoint of the machine.
    fn ssh_target(&self) -> Result<SshTarget>;

    /// Serializes the driver state back into its raw, stored form.
    fn to_raw(&self) -> Result<serde_yaml::Value>;
}

/// Driver identifiers this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum KnownDriver {
    Docker,
    Podman,
    None,
    Mock,
    Ssh,
    Kvm2,
    Qemu2,
    Virtualbox,
    Vmware,
    Hyperkit,
    Hyperv,
    Parallels,
    Vfkit,
}

/// Class of machine technology behind a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DriverKind {
    /// The machine is a container running a fixed, known guest image.
    Container,
    /// The machine is a physical host with an arbitrary operating system.
    BareMetal,
    /// The machine is a virtual machine; also the fallback for unknown drivers.
    VirtualMachine,
}

/// Normalizes a driver identifier for classification.
///
/// Trims whitespace, lowercases, and strips the `docker-machine-driver-`
/// plugin prefix and a trailing `-driver`, so that `docker-driver` and
/// `docker-machine-driver-kvm2` classify as `docker` and `kvm2`.
pub fn canonical_driver_name(id: &str) -> String {
    let lower = id.trim().to_ascii_lowercase();
    let name = lower.strip_prefix("docker-machine-driver-").unwrap_or(&lower);
    let name = name.strip_suffix("-driver").unwrap_or(name);
    name.to_string()
}

/// Extra driver names, as read from `settings.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverRules {
    /// Additional container-backed driver names
    pub container: Vec<String>,
    /// Additional bare-metal driver names
    pub bare_metal: Vec<String>,
}

impl DriverRules {
    /// Builds a classifier from the built-in rules extended by these names.
    pub fn classifier(&self) -> DriverClassifier {
        let mut classifier = DriverClassifier::default();
        classifier
            .container
            .extend(self.container.iter().map(|n| canonical_driver_name(n)));
        classifier
            .bare_metal
            .extend(self.bare_metal.iter().map(|n| canonical_driver_name(n)));
        classifier
    }
}

/// Total, ordered classification of driver identifiers.
///
/// The container rule is checked before the bare-metal rule, so a name
/// listed in both classifies as [`DriverKind::Container`]. Anything that
/// matches neither is a [`DriverKind::VirtualMachine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverClassifier {
    container: BTreeSet<String>,
    bare_metal: BTreeSet<String>,
}

impl Default for DriverClassifier {
    fn default() -> Self {
        let names = |drivers: &[KnownDriver]| -> BTreeSet<String> {
            drivers.iter().map(|d| d.to_string()).collect()
        };
        Self {
            container: names(&[KnownDriver::Docker, KnownDriver::Podman]),
            bare_metal: names(&[KnownDriver::None, KnownDriver::Mock]),
        }
    }
}

impl DriverClassifier {
    /// Returns true if the identifier names a container-backed driver.
    pub fn is_container(&self, driver_id: &str) -> bool {
        self.container.contains(&canonical_driver_name(driver_id))
    }

    /// Returns true if the identifier names a bare-metal driver.
    pub fn is_bare_metal(&self, driver_id: &str) -> bool {
        self.bare_metal.contains(&canonical_driver_name(driver_id))
    }

    pub fn classify(&self, driver_id: &str) -> DriverKind {
        if self.is_container(driver_id) {
            DriverKind::Container
        } else if self.is_bare_metal(driver_id) {
            DriverKind::BareMetal
        } else {
            DriverKind::VirtualMachine
        }
    }
}

/// Looks up a driver identifier among the known drivers.
pub fn known_driver(driver_id: &str) -> Option<KnownDriver> {
    KnownDriver::from_str(&canonical_driver_name(driver_id)).ok()
}

/// Builds a driver from its raw stored state.
///
/// Every driver technology shares the [`StoredDriver`] state layout;
/// unknown driver names are accepted and treated as virtual machines
/// by the classifier.
pub fn from_raw(driver_name: &str, raw: &serde_yaml::Value) -> Result<Box<dyn Driver>> {
    if known_driver(driver_name).is_none() {
        tracing::debug!("driver '{}' is not a built-in driver", driver_name);
    }
    Ok(Box::new(StoredDriver::from_raw(driver_name, raw)?))
}
