//! Cluster configuration record.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::record::impl_config_record;
use super::{BaseEntityConfig, EntityConfig};
use crate::id::EntityId;

/// Control plane topology requested for a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum HighAvailabilityMode {
    /// Three control plane nodes.
    #[default]
    Full,
    /// Single node.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Set to adopt an existing cluster instead of creating one.
    #[serde(default)]
    pub cluster_id: Option<EntityId>,
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
    #[serde(default = "default_base_dns_domain")]
    pub base_dns_domain: String,
    #[serde(default)]
    pub high_availability_mode: HighAvailabilityMode,
    #[serde(flatten)]
    pub entity: BaseEntityConfig,
}

fn default_cluster_name() -> String {
    "test-infra-cluster".to_string()
}

fn default_base_dns_domain() -> String {
    "redhat.com".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_id: None,
            cluster_name: default_cluster_name(),
            base_dns_domain: default_base_dns_domain(),
            high_availability_mode: HighAvailabilityMode::default(),
            entity: BaseEntityConfig::default(),
        }
    }
}

impl_config_record!(
    ClusterConfig {
        cluster_id,
        cluster_name,
        base_dns_domain,
        high_availability_mode,
    }
    flatten entity: BaseEntityConfig
);

impl EntityConfig for ClusterConfig {
    fn base(&self) -> &BaseEntityConfig {
        &self.entity
    }

    fn entity_id(&self) -> Option<EntityId> {
        self.cluster_id
    }

    fn set_entity_id(&mut self, id: EntityId) {
        self.cluster_id = Some(id);
    }
}
