//! Host records: the persisted description of a machine.
//!
//! A [`Host`] is the in-memory form, holding a live [`Driver`] built from
//! the raw driver state. [`HostFile`] is the YAML document stored in the
//! machine store; conversion between the two lives here.

use anyhow::Result;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::driver::{self, Driver};
use crate::error::RsmachineError;

/// Port the docker engine listens on for TLS connections.
pub const DOCKER_PORT: u16 = 2376;

/// Current version of the on-disk host record layout.
pub const HOST_CONFIG_VERSION: u32 = 3;

/// Docker engine settings applied by provisioners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Flags passed verbatim to dockerd, without the leading `--`
    pub arbitrary_flags: Vec<String>,
    /// `KEY=value` environment entries for the docker service
    pub env: Vec<String>,
    pub insecure_registry: Vec<String>,
    pub labels: Vec<String>,
    pub registry_mirror: Vec<String>,
    pub storage_driver: Option<String>,
}

/// Swarm settings. Carried through to provisioners unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SwarmOptions {
    pub is_swarm: bool,
    pub master: bool,
    pub discovery: Option<String>,
    pub host: Option<String>,
}

/// Locations of the TLS material for the docker engine.
///
/// rsmachine never creates or copies certificates; provisioners only point
/// the engine at the remote paths given here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthOptions {
    pub cert_dir: Option<Utf8PathBuf>,
    pub ca_cert_remote_path: Option<Utf8PathBuf>,
    pub server_cert_remote_path: Option<Utf8PathBuf>,
    pub server_key_remote_path: Option<Utf8PathBuf>,
}

impl AuthOptions {
    /// Returns the remote CA, certificate and key paths when all three are set.
    pub fn remote_tls_paths(&self) -> Option<(&Utf8PathBuf, &Utf8PathBuf, &Utf8PathBuf)> {
        match (
            &self.ca_cert_remote_path,
            &self.server_cert_remote_path,
            &self.server_key_remote_path,
        ) {
            (Some(ca), Some(cert), Some(key)) => Some((ca, cert, key)),
            _ => None,
        }
    }
}

/// Bundle of engine, swarm and auth settings for a host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostOptions {
    pub engine: EngineOptions,
    pub swarm: SwarmOptions,
    pub auth: AuthOptions,
}

/// On-disk layout of a host record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HostFile {
    #[serde(default)]
    pub config_version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub driver_name: String,
    /// Opaque driver state, decoded by the driver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_options: Option<HostOptions>,
}

/// A loaded host record.
#[derive(Debug)]
pub struct Host {
    pub config_version: u32,
    pub name: String,
    pub driver_name: String,
    pub driver: Option<Box<dyn Driver>>,
    pub host_options: Option<HostOptions>,
    pub raw_driver: Option<serde_yaml::Value>,
}

impl Host {
    /// Builds a host from its stored form.
    ///
    /// The driver is only constructed when both a driver name and raw
    /// driver state are present; otherwise it is left empty and the
    /// record fails the machine validity check rather than loading.
    pub fn from_file(file: HostFile) -> Result<Self> {
        let raw_driver = file.driver.filter(|raw| !raw.is_null());
        let driver = match &raw_driver {
            Some(raw) if !file.driver_name.is_empty() => {
                Some(driver::from_raw(&file.driver_name, raw)?)
            }
            _ => None,
        };
        Ok(Self {
            config_version: file.config_version,
            name: file.name,
            driver_name: file.driver_name,
            driver,
            host_options: file.host_options,
            raw_driver,
        })
    }

    /// Converts the host into its stored form.
    ///
    /// The raw driver state is re-read from the live driver when there is
    /// one, so state the driver picked up since loading is persisted.
    pub fn to_file(&self) -> Result<HostFile> {
        let driver = match &self.driver {
            Some(d) => Some(d.to_raw()?),
            None => self.raw_driver.clone(),
        };
        Ok(HostFile {
            config_version: HOST_CONFIG_VERSION,
            name: self.name.clone(),
            driver_name: self.driver_name.clone(),
            driver,
            host_options: self.host_options.clone(),
        })
    }

    /// Returns the live driver, or an error naming the host if there is none.
    pub fn require_driver(&self) -> Result<&dyn Driver, RsmachineError> {
        self.driver
            .as_deref()
            .ok_or_else(|| RsmachineError::IncompleteHost {
                name: self.name.clone(),
                field: "driver",
            })
    }

    /// Returns the host options, or an error naming the host if there are none.
    pub fn require_host_options(&self) -> Result<&HostOptions, RsmachineError> {
        self.host_options
            .as_ref()
            .ok_or_else(|| RsmachineError::IncompleteHost {
                name: self.name.clone(),
                field: "host options",
            })
    }
}

/// Builds the docker engine endpoint URL for a node address.
pub fn docker_url(ip: &str) -> Result<Url, RsmachineError> {
    let host = if ip.contains(':') {
        format!("[{}]", ip)
    } else {
        ip.to_string()
    };
    Url::parse(&format!("tcp://{}:{}", host, DOCKER_PORT))
        .map_err(|e| RsmachineError::Validation(format!("invalid node address '{}': {}", ip, e)))
}
