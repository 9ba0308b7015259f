use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use rsmachine::RsmachineError;
use rsmachine::api::{Api, ClientFactory};
use rsmachine::config::{ClusterConfig, ConfigStore, Node};
use rsmachine::driver::{Driver, SshTarget};
use rsmachine::executor::{CommandExecutor, CommandSpec, ExecutionResult};
use rsmachine::host::{Host, HostFile, HostOptions};

#[allow(dead_code)]
pub const UBUNTU_OS_RELEASE: &str =
    "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\nID_LIKE=debian\n";

#[allow(dead_code)]
pub const ROCKY_OS_RELEASE: &str =
    "NAME=\"Rocky Linux\"\nID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\nVERSION_ID=\"9.3\"\n";

#[allow(dead_code)]
pub const ALPINE_OS_RELEASE: &str =
    "NAME=\"Alpine Linux\"\nID=alpine\nPRETTY_NAME=\"Alpine Linux v3.19\"\n";

/// Driver double with a fixed identity and an optional address.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct FakeDriver {
    pub name: String,
    pub machine: String,
    pub ip: Option<String>,
}

impl FakeDriver {
    #[allow(dead_code)]
    pub fn new(name: &str, machine: &str, ip: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            machine: machine.to_string(),
            ip: ip.map(str::to_string),
        }
    }
}

impl Driver for FakeDriver {
    fn driver_name(&self) -> &str {
        &self.name
    }

    fn machine_name(&self) -> &str {
        &self.machine
    }

    fn ip(&self) -> Result<String> {
        match &self.ip {
            Some(ip) => Ok(ip.clone()),
            None => {
                Err(RsmachineError::Driver(format!("no IP for machine '{}'", self.machine)).into())
            }
        }
    }

    fn ssh_target(&self) -> Result<SshTarget> {
        Ok(SshTarget {
            hostname: self.ip.clone().unwrap_or_else(|| "127.0.0.1".to_string()),
            port: 22,
            user: "docker".to_string(),
            key_path: None,
        })
    }

    fn to_raw(&self) -> Result<serde_yaml::Value> {
        let mut map = serde_yaml::Mapping::new();
        map.insert("machine_name".into(), self.machine.clone().into());
        if let Some(ip) = &self.ip {
            map.insert("ip_address".into(), ip.clone().into());
        }
        Ok(serde_yaml::Value::Mapping(map))
    }
}

/// Builds a host that passes the validity check.
#[allow(dead_code)]
pub fn valid_host(driver_name: &str, machine: &str, ip: Option<&str>) -> Host {
    let driver = FakeDriver::new(driver_name, machine, ip);
    let raw = driver.to_raw().unwrap();
    Host {
        config_version: 3,
        name: machine.to_string(),
        driver_name: driver_name.to_string(),
        driver: Some(Box::new(driver)),
        host_options: Some(HostOptions::default()),
        raw_driver: Some(raw),
    }
}

/// Builds a stored host record that loads into a valid host.
#[allow(dead_code)]
pub fn host_file(driver_name: &str, machine: &str, ip: &str) -> HostFile {
    let yaml = format!("machine_name: {}\nip_address: {}\n", machine, ip);
    HostFile {
        config_version: 3,
        name: machine.to_string(),
        driver_name: driver_name.to_string(),
        driver: Some(serde_yaml::from_str(&yaml).unwrap()),
        host_options: Some(HostOptions::default()),
    }
}

/// Records executed commands in order, answering os-release probes.
#[allow(dead_code)]
pub struct MockExecutor {
    calls: Mutex<Vec<CommandSpec>>,
    os_release: String,
    /// If set, the Nth call (0-indexed) will return an error.
    fail_on_call: Option<usize>,
}

#[allow(dead_code)]
impl MockExecutor {
    pub fn new() -> Self {
        Self::with_os_release(UBUNTU_OS_RELEASE)
    }

    pub fn with_os_release(content: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            os_release: content.to_string(),
            fail_on_call: None,
        }
    }

    pub fn failing_on(mut self, call_index: usize) -> Self {
        self.fail_on_call = Some(call_index);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the remote shell command of every call.
    pub fn remote_commands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|spec| spec.args.last().cloned().unwrap_or_default())
            .collect()
    }
}

impl CommandExecutor for MockExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(spec.clone());
        drop(calls);

        if self.fail_on_call == Some(index) {
            anyhow::bail!("simulated failure on call {}", index);
        }
        let stdout = if spec.args.last().is_some_and(|c| c == "cat /etc/os-release") {
            self.os_release.clone()
        } else {
            String::new()
        };
        Ok(ExecutionResult {
            status: None,
            stdout,
        })
    }
}

#[allow(dead_code)]
#[derive(Default)]
struct FakeApiState {
    records: HashMap<String, HostFile>,
    saved: Vec<String>,
    fail_load: bool,
    fail_save: bool,
}

/// In-memory [`Api`]; clones share the same records.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeApiState>>,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, file: HostFile) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .insert(file.name.clone(), file);
        self
    }

    pub fn failing_load(self) -> Self {
        self.state.lock().unwrap().fail_load = true;
        self
    }

    pub fn failing_save(self) -> Self {
        self.state.lock().unwrap().fail_save = true;
        self
    }

    /// Names of the hosts saved so far, in order.
    pub fn saved(&self) -> Vec<String> {
        self.state.lock().unwrap().saved.clone()
    }

    pub fn record(&self, name: &str) -> Option<HostFile> {
        self.state.lock().unwrap().records.get(name).cloned()
    }
}

impl Api for FakeApi {
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().records.contains_key(name))
    }

    fn load(&self, name: &str) -> Result<Option<Host>> {
        let state = self.state.lock().unwrap();
        if state.fail_load {
            anyhow::bail!("simulated lookup failure");
        }
        match state.records.get(name) {
            Some(file) => Ok(Some(Host::from_file(file.clone())?)),
            None => Ok(None),
        }
    }

    fn save(&self, host: &Host) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_save {
            anyhow::bail!("simulated save failure");
        }
        state.saved.push(host.name.clone());
        let file = host.to_file()?;
        state.records.insert(host.name.clone(), file);
        Ok(())
    }
}

/// Factory handing out clients of a shared [`FakeApi`].
#[allow(dead_code)]
pub struct FakeFactory {
    pub api: FakeApi,
}

impl ClientFactory for FakeFactory {
    fn new_client(&self) -> Result<Box<dyn Api>> {
        Ok(Box::new(self.api.clone()))
    }
}

/// Factory that cannot produce a client.
#[allow(dead_code)]
pub struct FailingFactory;

impl ClientFactory for FailingFactory {
    fn new_client(&self) -> Result<Box<dyn Api>> {
        Err(RsmachineError::Config("cannot reach machine store".to_string()).into())
    }
}

/// Records every configuration it is asked to save.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingConfigStore {
    saved: Mutex<Vec<ClusterConfig>>,
}

#[allow(dead_code)]
impl RecordingConfigStore {
    pub fn saved(&self) -> Vec<ClusterConfig> {
        self.saved.lock().unwrap().clone()
    }
}

impl ConfigStore for RecordingConfigStore {
    fn save_node(&self, cfg: &mut ClusterConfig, node: &Node) -> Result<()> {
        cfg.upsert_node(node);
        self.saved.lock().unwrap().push(cfg.clone());
        Ok(())
    }
}
