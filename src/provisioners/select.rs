//! Choice of provisioning strategy from a driver identifier.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use super::detect::detect_provisioner;
use super::family::OsFamily;
use super::systemd::SystemdProvisioner;
use super::Strategy;
use crate::driver::{Driver, DriverClassifier, DriverKind};
use crate::executor::CommandExecutor;

/// Selects the provisioning strategy for a machine's driver.
#[derive(Clone)]
pub struct ProvisionerSelector {
    classifier: DriverClassifier,
    executor: Arc<dyn CommandExecutor>,
}

impl ProvisionerSelector {
    pub fn new(classifier: DriverClassifier, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            classifier,
            executor,
        }
    }

    pub fn classifier(&self) -> &DriverClassifier {
        &self.classifier
    }

    /// Selects a strategy for the driver, first match wins:
    ///
    /// 1. container drivers get the Ubuntu provisioner without probing the
    ///    machine, as container images are known in advance;
    /// 2. bare-metal drivers get the provisioner matching the OS detected
    ///    on the live machine, or an error if none matches;
    /// 3. every other driver is a virtual machine running a buildroot
    ///    image and gets the buildroot provisioner.
    ///
    /// Only the bare-metal path can fail.
    pub fn select<'a>(&self, driver: &'a dyn Driver) -> Result<Strategy<'a>> {
        let kind = self.classifier.classify(driver.driver_name());
        debug!("driver '{}' classified as {}", driver.driver_name(), kind);
        match kind {
            DriverKind::Container => Ok(Strategy::Container(SystemdProvisioner::new(
                OsFamily::Ubuntu,
                driver,
                self.executor.clone(),
            ))),
            DriverKind::BareMetal => {
                detect_provisioner(driver, self.executor.clone()).map(Strategy::Detected)
            }
            DriverKind::VirtualMachine => Ok(Strategy::Buildroot(SystemdProvisioner::new(
                OsFamily::Buildroot,
                driver,
                self.executor.clone(),
            ))),
        }
    }
}
