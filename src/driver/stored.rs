//! Driver backed by the state recorded in a host record.

use anyhow::Result;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::{Driver, SshTarget};
use crate::error::RsmachineError;

fn default_ssh_user() -> String {
    "docker".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

/// Driver state as written by the driver that created the machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredDriver {
    #[serde(skip)]
    name: String,

    /// Name of the machine
    pub machine_name: String,

    /// Last address the driver reported for the machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// SSH host, when it differs from `ip_address` (e.g., a forwarded port on 127.0.0.1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_hostname: Option<String>,

    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<Utf8PathBuf>,
}

impl StoredDriver {
    /// Creates driver state for a machine with default SSH settings.
    pub fn new(driver_name: impl Into<String>, machine_name: impl Into<String>) -> Self {
        Self {
            name: driver_name.into(),
            machine_name: machine_name.into(),
            ip_address: None,
            ssh_hostname: None,
            ssh_user: default_ssh_user(),
            ssh_port: default_ssh_port(),
            ssh_key_path: None,
        }
    }

    /// Decodes driver state from a raw host record value.
    pub fn from_raw(driver_name: &str, raw: &serde_yaml::Value) -> Result<Self, RsmachineError> {
        let mut driver: StoredDriver = serde_yaml::from_value(raw.clone()).map_err(|e| {
            RsmachineError::Config(format!("invalid '{}' driver state: {}", driver_name, e))
        })?;
        driver.name = driver_name.to_string();
        Ok(driver)
    }
}

impl Driver for StoredDriver {
    fn driver_name(&self) -> &str {
        &self.name
    }

    fn machine_name(&self) -> &str {
        &self.machine_name
    }

    fn ip(&self) -> Result<String> {
        match self.ip_address.as_deref().map(str::trim) {
            Some(ip) if !ip.is_empty() => Ok(ip.to_string()),
            _ => Err(RsmachineError::Driver(format!(
                "{} driver has no IP address for machine '{}'",
                self.name, self.machine_name
            ))
            .into()),
        }
    }

    fn ssh_target(&self) -> Result<SshTarget> {
        let hostname = match &self.ssh_hostname {
            Some(host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => self.ip()?,
        };
        Ok(SshTarget {
            hostname,
            port: self.ssh_port,
            user: self.ssh_user.clone(),
            key_path: self.ssh_key_path.clone(),
        })
    }

    fn to_raw(&self) -> Result<serde_yaml::Value> {
        serde_yaml::to_value(self).map_err(|e| {
            RsmachineError::Config(format!("failed to encode '{}' driver state: {}", self.name, e))
                .into()
        })
    }
}
