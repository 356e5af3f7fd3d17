//! The ordered steps of preparing an entity for installation.

use std::fmt;

use crate::config::BaseEntityConfig;

/// One step of the preparation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparationStep {
    /// Log a snapshot of the resolved configuration.
    LogConfiguration,
    /// Have the node controller log its configuration.
    LogControllerConfiguration,
    /// Fetch the boot image before any node boots.
    DownloadImage,
    /// Tell the node manager the boot image is in place.
    NotifyIsoReady,
    /// Start every node.
    StartNodes { check_ips: bool },
    /// Block until enough hosts registered with the installer service.
    WaitForDiscovery { allow_insufficient: bool },
}

impl fmt::Display for PreparationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogConfiguration => f.write_str("log entity configuration"),
            Self::LogControllerConfiguration => f.write_str("log node controller configuration"),
            Self::DownloadImage => f.write_str("download boot image"),
            Self::NotifyIsoReady => f.write_str("notify nodes that the boot image is ready"),
            Self::StartNodes { check_ips: true } => f.write_str("start all nodes, waiting for IPs"),
            Self::StartNodes { check_ips: false } => {
                f.write_str("start all nodes without IP checks (static IPv6)")
            }
            Self::WaitForDiscovery {
                allow_insufficient: true,
            } => f.write_str("wait for host discovery, accepting insufficient hosts"),
            Self::WaitForDiscovery {
                allow_insufficient: false,
            } => f.write_str("wait for host discovery"),
        }
    }
}

/// Preparation decisions derived from a configuration.
///
/// Computed after overrides are applied, so it reflects the values the
/// sequence will actually see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparationPlan {
    pub download_image: bool,
    /// False only for static IPv6 addressing, which nodes cannot confirm
    /// while booting.
    pub check_ips: bool,
    pub allow_insufficient: bool,
}

impl PreparationPlan {
    pub fn for_config(config: &BaseEntityConfig) -> Self {
        Self {
            download_image: config.download_image,
            check_ips: !(config.is_static_ip && config.is_ipv6),
            allow_insufficient: true,
        }
    }

    /// The steps to run, in order.
    pub fn steps(&self) -> Vec<PreparationStep> {
        let mut steps = vec![
            PreparationStep::LogConfiguration,
            PreparationStep::LogControllerConfiguration,
        ];
        if self.download_image {
            steps.push(PreparationStep::DownloadImage);
        }
        steps.push(PreparationStep::NotifyIsoReady);
        steps.push(PreparationStep::StartNodes {
            check_ips: self.check_ips,
        });
        steps.push(PreparationStep::WaitForDiscovery {
            allow_insufficient: self.allow_insufficient,
        });
        steps
    }
}

impl fmt::Display for PreparationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps().iter().enumerate() {
            writeln!(f, "{}. {}", index + 1, step)?;
        }
        Ok(())
    }
}
