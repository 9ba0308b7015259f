//! Operating system families supported by the provisioners.

use strum::{Display, EnumIter, IntoStaticStr};

/// OS family of a machine, as far as provisioning is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum OsFamily {
    Ubuntu,
    Debian,
    /// RHEL and its rebuilds, CentOS and Fedora
    Redhat,
    /// Minimal buildroot guest images used for virtual machines
    Buildroot,
}

impl OsFamily {
    /// Returns the `/etc/os-release` `ID` values belonging to this family.
    pub fn os_ids(&self) -> &'static [&'static str] {
        match self {
            Self::Ubuntu => &["ubuntu"],
            Self::Debian => &["debian"],
            Self::Redhat => &["rhel", "centos", "fedora", "rocky", "almalinux"],
            Self::Buildroot => &["buildroot"],
        }
    }

    /// Returns true if remote detection may select this family.
    ///
    /// Buildroot images only ever run as virtual machines, which are
    /// provisioned without detection.
    pub fn is_detectable(&self) -> bool {
        !matches!(self, Self::Buildroot)
    }

    /// Returns the shell command installing docker, for families whose
    /// images do not ship it.
    pub fn install_docker_command(&self) -> Option<&'static str> {
        match self {
            Self::Ubuntu | Self::Debian => Some(
                "sudo DEBIAN_FRONTEND=noninteractive apt-get update && \
                 sudo DEBIAN_FRONTEND=noninteractive apt-get install -y docker.io",
            ),
            Self::Redhat => Some("sudo yum install -y docker"),
            Self::Buildroot => None,
        }
    }
}
