//! Systemd-based provisioner shared by all OS families.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::family::OsFamily;
use super::ssh::{SshRunner, shell_quote};
use super::Provisioner;
use crate::driver::Driver;
use crate::executor::CommandExecutor;
use crate::host::{AuthOptions, DOCKER_PORT, EngineOptions, SwarmOptions};

/// Directory holding the docker service drop-in.
pub const DOCKER_DROPIN_DIR: &str = "/etc/systemd/system/docker.service.d";

/// Drop-in file written by the provisioner.
pub const DOCKER_DROPIN_FILE: &str = "/etc/systemd/system/docker.service.d/10-machine.conf";

const DOCKERD_PATH: &str = "/usr/bin/dockerd";

/// Quotes one `ExecStart=` argument.
///
/// Words containing whitespace, quotes, backslashes or a lone `;` are
/// wrapped in double quotes with `\` and `"` escaped. `%` specifiers and
/// `$` variable references are always escaped so the word reaches dockerd
/// unchanged.
fn exec_word(word: &str) -> String {
    let escaped = word.replace('%', "%%").replace('$', "$$");
    let needs_quotes = word.is_empty()
        || word == ";"
        || word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\'));
    if needs_quotes {
        format!("\"{}\"", escaped.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        escaped
    }
}

/// Quotes the value of an `Environment=` assignment.
fn environment_value(assignment: &str) -> String {
    let escaped = assignment
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('%', "%%");
    format!("\"{}\"", escaped)
}

fn push_option(exec: &mut Vec<String>, flag: &str, value: &str) {
    exec.push(flag.to_string());
    exec.push(value.to_string());
}

/// Renders the docker service drop-in for the given options.
///
/// The empty `ExecStart=` line clears the command of the packaged unit
/// before the new one is set.
pub fn render_docker_unit(driver_name: &str, engine: &EngineOptions, auth: &AuthOptions) -> String {
    let mut exec: Vec<String> = vec![
        DOCKERD_PATH.to_string(),
        "-H".to_string(),
        format!("tcp://0.0.0.0:{}", DOCKER_PORT),
        "-H".to_string(),
        "unix:///var/run/docker.sock".to_string(),
        "--default-ulimit=nofile=1048576:1048576".to_string(),
    ];

    if let Some((ca, cert, key)) = auth.remote_tls_paths() {
        exec.push("--tlsverify".to_string());
        push_option(&mut exec, "--tlscacert", ca.as_str());
        push_option(&mut exec, "--tlscert", cert.as_str());
        push_option(&mut exec, "--tlskey", key.as_str());
    }

    push_option(&mut exec, "--label", &format!("provider={}", driver_name));
    for label in &engine.labels {
        push_option(&mut exec, "--label", label);
    }
    for registry in &engine.insecure_registry {
        push_option(&mut exec, "--insecure-registry", registry);
    }
    for mirror in &engine.registry_mirror {
        push_option(&mut exec, "--registry-mirror", mirror);
    }
    if let Some(storage) = engine.storage_driver.as_deref().filter(|s| !s.is_empty()) {
        push_option(&mut exec, "--storage-driver", storage);
    }
    exec.extend(engine.arbitrary_flags.iter().map(|flag| {
        if flag.starts_with("--") {
            flag.clone()
        } else {
            format!("--{}", flag)
        }
    }));

    let mut unit = String::from("[Service]\n");
    for env in &engine.env {
        unit.push_str(&format!("Environment={}\n", environment_value(env)));
    }
    unit.push_str("ExecStart=\n");
    let words: Vec<String> = exec.iter().map(|w| exec_word(w)).collect();
    unit.push_str(&format!("ExecStart={}\n", words.join(" ")));
    unit
}

/// Provisioner configuring docker through systemd over SSH.
pub struct SystemdProvisioner<'a> {
    family: OsFamily,
    driver: &'a dyn Driver,
    executor: Arc<dyn CommandExecutor>,
}

impl<'a> SystemdProvisioner<'a> {
    pub fn new(
        family: OsFamily,
        driver: &'a dyn Driver,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            family,
            driver,
            executor,
        }
    }

    pub fn family(&self) -> OsFamily {
        self.family
    }

    fn set_hostname(&self, runner: &SshRunner) -> Result<()> {
        let hostname = shell_quote(self.driver.machine_name());
        info!("setting hostname to {}", hostname);
        runner
            .run(&format!(
                "sudo hostname {0} && echo {0} | sudo tee /etc/hostname >/dev/null",
                hostname
            ))
            .context("failed to set hostname")?;
        Ok(())
    }

    fn ensure_docker(&self, runner: &SshRunner) -> Result<()> {
        let Some(install) = self.family.install_docker_command() else {
            return Ok(());
        };
        debug!("ensuring docker is installed on {} machine", self.family);
        runner
            .run(&format!("command -v docker >/dev/null 2>&1 || {{ {}; }}", install))
            .context("failed to install docker")?;
        Ok(())
    }

    fn configure_engine(
        &self,
        runner: &SshRunner,
        engine: &EngineOptions,
        auth: &AuthOptions,
    ) -> Result<()> {
        let unit = render_docker_unit(self.driver.driver_name(), engine, auth);
        debug!("docker drop-in:\n{}", unit);
        runner
            .run_with_stdin(
                &format!(
                    "sudo mkdir -p {} && sudo tee {} >/dev/null",
                    DOCKER_DROPIN_DIR, DOCKER_DROPIN_FILE
                ),
                &unit,
            )
            .context("failed to write docker service configuration")?;
        runner
            .run(
                "sudo systemctl daemon-reload && sudo systemctl -f enable docker \
                 && sudo systemctl -f restart docker",
            )
            .context("failed to restart docker")?;
        Ok(())
    }
}

impl Provisioner for SystemdProvisioner<'_> {
    fn name(&self) -> &str {
        let name: &'static str = self.family.into();
        name
    }

    fn provision(
        &self,
        swarm: &SwarmOptions,
        auth: &AuthOptions,
        engine: &EngineOptions,
    ) -> Result<()> {
        info!(
            "running {} provisioner for machine '{}'",
            self.family,
            self.driver.machine_name()
        );
        if swarm.is_swarm {
            warn!("swarm options are set but swarm configuration is not applied");
        }

        let runner = SshRunner::new(self.driver.ssh_target()?, self.executor.clone());
        self.set_hostname(&runner)?;
        self.ensure_docker(&runner)?;
        self.configure_engine(&runner, engine, auth)?;

        info!("{} provisioner completed successfully", self.family);
        Ok(())
    }
}
