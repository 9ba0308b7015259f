//! Cluster configuration, settings and YAML file helpers.
//!
//! Everything rsmachine keeps on disk lives under one store directory:
//!
//! ```text
//! <store>/settings.yaml                 optional, see [`Settings`]
//! <store>/machines/<name>/config.yaml   host records, see [`crate::api`]
//! <store>/profiles/<name>/config.yaml   cluster configs, see [`ProfileStore`]
//! ```
//!
//! Files are replaced atomically so that every save can be repeated
//! safely after a partial failure.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::driver::DriverRules;
use crate::error::RsmachineError;

/// File name used for every record in the store.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default API server port of a node.
pub const DEFAULT_NODE_PORT: u16 = 8443;

fn default_node_port() -> u16 {
    DEFAULT_NODE_PORT
}

fn default_true() -> bool {
    true
}

/// Validates a machine or profile name used as a directory in the store.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<(), RsmachineError> {
    if name.trim().is_empty() {
        return Err(RsmachineError::Validation(format!("{} name must not be empty", kind)));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(RsmachineError::Validation(format!(
            "{} name '{}' must not contain path separators or be a relative path component",
            kind, name
        )));
    }
    Ok(())
}

/// Reads and decodes a YAML file.
pub(crate) fn read_yaml<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, RsmachineError> {
    let file = File::open(path).map_err(|e| RsmachineError::io(path.as_str(), e))?;
    serde_yaml::from_reader(BufReader::new(file))
        .map_err(|e| RsmachineError::Config(format!("YAML parse error in {}: {}", path, e)))
}

/// Encodes a value as YAML and atomically replaces `path` with it.
pub(crate) fn write_yaml<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), RsmachineError> {
    let contents = serde_yaml::to_string(value)
        .map_err(|e| RsmachineError::Config(format!("failed to encode {}: {}", path, e)))?;
    write_atomic(path, contents.as_bytes())
}

/// Atomically replaces `path` with `contents`.
///
/// Writes a uniquely named sibling file, syncs it, renames it over the
/// target and syncs the parent directory. Readers see either the old or
/// the new contents, never a mix.
pub(crate) fn write_atomic(path: &Utf8Path, contents: &[u8]) -> Result<(), RsmachineError> {
    let dir = path.parent().ok_or_else(|| {
        RsmachineError::Validation(format!("path has no parent directory: {}", path))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| RsmachineError::Validation(format!("path has no file name: {}", path)))?;

    fs::create_dir_all(dir)
        .map_err(|e| RsmachineError::io(format!("failed to create directory: {}", dir), e))?;

    let tmp = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));
    let result = (|| -> Result<(), RsmachineError> {
        let mut file = File::create(&tmp).map_err(|e| RsmachineError::io(tmp.as_str(), e))?;
        file.write_all(contents)
            .map_err(|e| RsmachineError::io(format!("failed to write: {}", tmp), e))?;
        rustix::fs::fsync(&file)
            .map_err(|e| RsmachineError::io(format!("failed to sync: {}", tmp), e.into()))?;
        drop(file);

        fs::rename(&tmp, path).map_err(|e| {
            RsmachineError::io(format!("failed to rename {} to {}", tmp, path), e)
        })?;

        let dir_handle = File::open(dir).map_err(|e| RsmachineError::io(dir.as_str(), e))?;
        rustix::fs::fsync(&dir_handle)
            .map_err(|e| RsmachineError::io(format!("failed to sync: {}", dir), e.into()))?;
        Ok(())
    })();

    if result.is_err()
        && let Err(e) = fs::remove_file(&tmp)
        && e.kind() != io::ErrorKind::NotFound
    {
        tracing::warn!("failed to remove temporary file {}: {}", tmp, e);
    }
    result
}

/// A node entry of a cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Node {
    pub name: String,
    /// Network address of the machine backing this node, empty until known
    #[serde(default)]
    pub ip: String,
    #[serde(default = "default_node_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub control_plane: bool,
    #[serde(default = "default_true")]
    pub worker: bool,
}

impl Node {
    /// Creates a control-plane and worker node with no address yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: String::new(),
            port: DEFAULT_NODE_PORT,
            control_plane: true,
            worker: true,
        }
    }
}

/// Configuration of a local cluster ("profile").
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl ClusterConfig {
    /// Creates an empty configuration for the named cluster.
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            kubernetes_version: None,
            nodes: Vec::new(),
        }
    }

    /// Returns the node with the given name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Replaces the node with the same name, or appends it.
    pub fn upsert_node(&mut self, node: &Node) {
        match self.nodes.iter_mut().find(|n| n.name == node.name) {
            Some(existing) => *existing = node.clone(),
            None => self.nodes.push(node.clone()),
        }
    }
}

/// Persistence of cluster configurations.
pub trait ConfigStore {
    /// Records `node` in `cfg` and durably saves `cfg`.
    ///
    /// Must be idempotent: saving the same node twice leaves one entry.
    fn save_node(&self, cfg: &mut ClusterConfig, node: &Node) -> Result<()>;
}

/// [`ConfigStore`] keeping one YAML file per profile under `<store>/profiles`.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: Utf8PathBuf,
}

impl ProfileStore {
    pub fn new(store_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: store_dir.into().join("profiles"),
        }
    }

    /// Returns the path of a profile's configuration file.
    pub fn profile_path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name).join(CONFIG_FILE_NAME)
    }

    /// Returns true if a configuration exists for the profile.
    pub fn exists(&self, name: &str) -> bool {
        self.profile_path(name).is_file()
    }

    /// Loads a profile's configuration.
    pub fn load(&self, name: &str) -> Result<ClusterConfig, RsmachineError> {
        validate_name("profile", name)?;
        let cfg: ClusterConfig = read_yaml(&self.profile_path(name))?;
        if cfg.name != name {
            return Err(RsmachineError::Config(format!(
                "profile {} declares name '{}'",
                self.profile_path(name),
                cfg.name
            )));
        }
        Ok(cfg)
    }

    /// Loads a profile's configuration, or starts an empty one if none exists.
    pub fn load_or_new(&self, name: &str, driver: &str) -> Result<ClusterConfig, RsmachineError> {
        if self.exists(name) {
            self.load(name)
        } else {
            info!("creating new cluster config for profile '{}'", name);
            Ok(ClusterConfig::new(name, driver))
        }
    }

    /// Saves a profile's configuration.
    pub fn save(&self, cfg: &ClusterConfig) -> Result<(), RsmachineError> {
        validate_name("profile", &cfg.name)?;
        let path = self.profile_path(&cfg.name);
        debug!("saving cluster config: {}", path);
        write_yaml(&path, cfg)
    }
}

impl ConfigStore for ProfileStore {
    fn save_node(&self, cfg: &mut ClusterConfig, node: &Node) -> Result<()> {
        cfg.upsert_node(node);
        self.save(cfg)?;
        Ok(())
    }
}

/// Optional store-wide settings read from `<store>/settings.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Extra driver names for provisioner selection
    pub drivers: DriverRules,
}

/// Loads store settings, falling back to defaults when the file is absent.
pub fn load_settings(store_dir: &Utf8Path) -> Result<Settings, RsmachineError> {
    let path = store_dir.join("settings.yaml");
    if !path.exists() {
        debug!("no settings file at {}, using defaults", path);
        return Ok(Settings::default());
    }
    read_yaml(&path)
}
