//! Machine handles and the machine loader.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::api::ClientFactory;
use crate::error::RsmachineError;
use crate::host::Host;

/// A loaded host record together with its structural validity check.
///
/// Callers must check [`Machine::is_valid`] before handing the host to
/// any operation that reaches into its driver or host options.
#[derive(Debug, Default)]
pub struct Machine {
    host: Option<Host>,
}

impl Machine {
    pub fn new(host: Host) -> Self {
        Self { host: Some(host) }
    }

    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> Option<&mut Host> {
        self.host.as_mut()
    }

    pub fn into_host(self) -> Option<Host> {
        self.host
    }

    /// Returns the machine name, or an empty string when there is no host.
    pub fn name(&self) -> &str {
        self.host.as_ref().map_or("", |h| h.name.as_str())
    }

    /// Returns true if the machine has everything provisioning needs:
    /// a host record with a name, a driver, host options and raw driver state.
    pub fn is_valid(&self) -> bool {
        let Some(host) = &self.host else {
            return false;
        };
        if host.name.is_empty() {
            return false;
        }
        if host.driver.is_none() {
            return false;
        }
        if host.host_options.is_none() {
            return false;
        }
        if host.raw_driver.is_none() {
            return false;
        }
        true
    }
}

/// Validity check accepting an absent machine, which is never valid.
pub fn is_valid(machine: Option<&Machine>) -> bool {
    machine.is_some_and(Machine::is_valid)
}

/// Loads machines through an injected API client factory.
#[derive(Clone)]
pub struct MachineLoader {
    factory: Arc<dyn ClientFactory>,
}

impl MachineLoader {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }

    /// Loads the named machine.
    ///
    /// Client and lookup failures are returned as-is. A lookup that finds
    /// no record fails with [`RsmachineError::HostNotFound`]. A loaded
    /// machine may still be invalid; see [`Machine::is_valid`].
    pub fn load(&self, name: &str) -> Result<Machine> {
        let api = self.factory.new_client()?;
        let Some(host) = api.load(name)? else {
            return Err(RsmachineError::HostNotFound(name.to_string()).into());
        };
        debug!("loaded machine '{}' (driver: {})", host.name, host.driver_name);
        Ok(Machine::new(host))
    }
}
