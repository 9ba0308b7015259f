//! Remote OS detection for machines whose operating system is not known
//! in advance.

use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use regex::Regex;
use strum::IntoEnumIterator;
use tracing::info;

use super::family::OsFamily;
use super::ssh::SshRunner;
use super::systemd::SystemdProvisioner;
use super::Provisioner;
use crate::driver::Driver;
use crate::error::RsmachineError;
use crate::executor::CommandExecutor;

static OS_RELEASE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_]+)\s*=\s*(.*?)\s*$").expect("os-release pattern is valid")
});

/// Removes surrounding quotes and shell escapes from an os-release value.
fn unquote(raw: &str) -> String {
    let inner = match raw.as_bytes() {
        [b'"', .., b'"'] | [b'\'', .., b'\''] if raw.len() >= 2 => &raw[1..raw.len() - 1],
        _ => raw,
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(next) = chars.next()
        {
            out.push(next);
        } else {
            out.push(c);
        }
    }
    out
}

/// Fields of `/etc/os-release` used for detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub id_like: Vec<String>,
    pub name: String,
    pub version_id: String,
    pub pretty_name: String,
}

impl OsRelease {
    /// Parses the `KEY=value` lines of an os-release file.
    ///
    /// Comments, blank lines and unknown keys are ignored.
    pub fn parse(content: &str) -> Self {
        let mut release = OsRelease::default();
        for line in content.lines() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            let Some(caps) = OS_RELEASE_LINE.captures(line) else {
                continue;
            };
            let value = unquote(&caps[2]);
            match &caps[1] {
                "ID" => release.id = value.to_ascii_lowercase(),
                "ID_LIKE" => {
                    release.id_like = value
                        .split_whitespace()
                        .map(|s| s.to_ascii_lowercase())
                        .collect()
                }
                "NAME" => release.name = value,
                "VERSION_ID" => release.version_id = value,
                "PRETTY_NAME" => release.pretty_name = value,
                _ => {}
            }
        }
        release
    }

    /// Returns the most descriptive name available.
    pub fn display_name(&self) -> &str {
        [&self.pretty_name, &self.name, &self.id]
            .into_iter()
            .find(|s| !s.is_empty())
            .map_or("unknown", |s| s.as_str())
    }

    /// Returns the detectable OS family for this release.
    ///
    /// An exact `ID` match wins; otherwise `ID_LIKE` entries are tried in
    /// the order they are listed.
    pub fn family(&self) -> Option<OsFamily> {
        let by_id = |id: &str| {
            OsFamily::iter()
                .filter(OsFamily::is_detectable)
                .find(|f| f.os_ids().contains(&id))
        };
        by_id(self.id.as_str())
            .or_else(|| self.id_like.iter().find_map(|like| by_id(like.as_str())))
    }
}

/// Probes a live machine and returns the provisioner for its OS family.
///
/// Fails with [`RsmachineError::DetectionFailed`] if the machine runs an
/// OS no provisioner supports.
pub fn detect_provisioner<'a>(
    driver: &'a dyn Driver,
    executor: Arc<dyn CommandExecutor>,
) -> Result<Box<dyn Provisioner + 'a>> {
    info!("detecting operating system of machine '{}'", driver.machine_name());
    let runner = SshRunner::new(driver.ssh_target()?, executor.clone());
    let content = runner
        .run("cat /etc/os-release")
        .context("failed to read /etc/os-release")?;

    let release = OsRelease::parse(&content);
    let Some(family) = release.family() else {
        return Err(RsmachineError::DetectionFailed(release.display_name().to_string()).into());
    };
    info!("detected {} ({} family)", release.display_name(), family);
    Ok(Box::new(SystemdProvisioner::new(family, driver, executor)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU: &str = r#"PRETTY_NAME="Ubuntu 22.04.4 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
ID=ubuntu
ID_LIKE=debian
"#;

    #[test]
    fn test_parse_ubuntu() {
        let release = OsRelease::parse(UBUNTU);
        assert_eq!(release.id, "ubuntu");
        assert_eq!(release.id_like, ["debian"]);
        assert_eq!(release.version_id, "22.04");
        assert_eq!(release.display_name(), "Ubuntu 22.04.4 LTS");
        assert_eq!(release.family(), Some(OsFamily::Ubuntu));
    }

    #[test]
    fn test_id_like_fallback_in_order() {
        let release = OsRelease::parse("ID=linuxmint\nID_LIKE=\"ubuntu debian\"\n");
        assert_eq!(release.family(), Some(OsFamily::Ubuntu));

        let release = OsRelease::parse("ID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\n");
        assert_eq!(release.family(), Some(OsFamily::Redhat));
    }

    #[test]
    fn test_buildroot_is_never_detected() {
        let release = OsRelease::parse("NAME=Buildroot\nID=buildroot\n");
        assert_eq!(release.family(), None);
        assert_eq!(release.display_name(), "Buildroot");
    }

    #[test]
    fn test_parse_ignores_comments_and_garbage() {
        let release = OsRelease::parse("# comment\n\nnot a pair\nID='debian'\n");
        assert_eq!(release.id, "debian");
        assert_eq!(release.family(), Some(OsFamily::Debian));
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""a \"b\"""#), r#"a "b""#);
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(OsRelease::default().display_name(), "unknown");
        assert_eq!(OsRelease::parse("ID=gentoo\n").display_name(), "gentoo");
    }
}
