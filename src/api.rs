//! Management API client for host records.
//!
//! [`Api`] is the seam between rsmachine and wherever host records live.
//! [`ClientFactory`] lets callers inject how a client is obtained, so the
//! machine loader can be exercised with a fake store in tests.

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::config::{CONFIG_FILE_NAME, read_yaml, validate_name, write_yaml};
use crate::error::RsmachineError;
use crate::host::{Host, HostFile};

/// Access to persisted host records.
pub trait Api {
    /// Returns true if a record exists for the machine.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Resolves a host record by machine name.
    ///
    /// Returns `Ok(None)` when no record exists; `Err` is reserved for
    /// failures to read or decode a record.
    fn load(&self, name: &str) -> Result<Option<Host>>;

    /// Durably saves a host record, replacing any previous version.
    fn save(&self, host: &Host) -> Result<()>;
}

/// Produces [`Api`] clients.
pub trait ClientFactory: Send + Sync {
    fn new_client(&self) -> Result<Box<dyn Api>>;
}

/// [`Api`] storing one YAML file per machine under `<store>/machines`.
#[derive(Debug, Clone)]
pub struct FileStoreApi {
    root: Utf8PathBuf,
}

impl FileStoreApi {
    /// Opens the machine store under `store_dir`, creating it if needed.
    pub fn open(store_dir: &Utf8Path) -> Result<Self, RsmachineError> {
        let root = store_dir.join("machines");
        std::fs::create_dir_all(&root).map_err(|e| {
            RsmachineError::io(format!("failed to create machine store: {}", root), e)
        })?;
        Ok(Self { root })
    }

    /// Returns the path of a machine's host record.
    pub fn host_path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name).join(CONFIG_FILE_NAME)
    }
}

impl Api for FileStoreApi {
    fn exists(&self, name: &str) -> Result<bool> {
        validate_name("machine", name)?;
        Ok(self.host_path(name).is_file())
    }

    fn load(&self, name: &str) -> Result<Option<Host>> {
        if !self.exists(name)? {
            debug!("no host record for machine '{}'", name);
            return Ok(None);
        }
        let path = self.host_path(name);
        let file: HostFile = read_yaml(&path)?;
        if !file.name.is_empty() && file.name != name {
            return Err(RsmachineError::Config(format!(
                "host record {} declares name '{}'",
                path, file.name
            ))
            .into());
        }
        Ok(Some(Host::from_file(file)?))
    }

    fn save(&self, host: &Host) -> Result<()> {
        validate_name("machine", &host.name)?;
        let path = self.host_path(&host.name);
        debug!("saving host record: {}", path);
        write_yaml(&path, &host.to_file()?)?;
        Ok(())
    }
}

/// [`ClientFactory`] opening a [`FileStoreApi`] on each call.
#[derive(Debug, Clone)]
pub struct FileStoreFactory {
    store_dir: Utf8PathBuf,
}

impl FileStoreFactory {
    pub fn new(store_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }
}

impl ClientFactory for FileStoreFactory {
    fn new_client(&self) -> Result<Box<dyn Api>> {
        Ok(Box::new(FileStoreApi::open(&self.store_dir)?))
    }
}
