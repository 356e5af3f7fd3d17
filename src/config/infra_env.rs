//! Infra-env configuration record.

use serde::{Deserialize, Serialize};

use super::record::impl_config_record;
use super::{BaseEntityConfig, EntityConfig};
use crate::id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraEnvConfig {
    /// Set to adopt an existing infra-env instead of registering one.
    #[serde(default)]
    pub infra_env_id: Option<EntityId>,
    #[serde(default = "default_infra_env_name")]
    pub infra_env_name: String,
    /// Cluster the discovered hosts are bound to, if any.
    #[serde(default)]
    pub cluster_id: Option<EntityId>,
    #[serde(flatten)]
    pub entity: BaseEntityConfig,
}

fn default_infra_env_name() -> String {
    "test-infra-infra-env".to_string()
}

impl Default for InfraEnvConfig {
    fn default() -> Self {
        Self {
            infra_env_id: None,
            infra_env_name: default_infra_env_name(),
            cluster_id: None,
            entity: BaseEntityConfig::default(),
        }
    }
}

impl_config_record!(
    InfraEnvConfig {
        infra_env_id,
        infra_env_name,
        cluster_id,
    }
    flatten entity: BaseEntityConfig
);

impl EntityConfig for InfraEnvConfig {
    fn base(&self) -> &BaseEntityConfig {
        &self.entity
    }

    fn entity_id(&self) -> Option<EntityId> {
        self.infra_env_id
    }

    fn set_entity_id(&mut self, id: EntityId) {
        self.infra_env_id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use super::*;
    use crate::config::ConfigRecord;

    #[test]
    fn test_entity_id_is_infra_env_id_not_cluster_id() {
        let mut cfg = InfraEnvConfig::default();
        let cluster = EntityId::random();
        cfg.cluster_id = Some(cluster);
        assert_eq!(cfg.entity_id(), None);

        let own = EntityId::random();
        cfg.set_entity_id(own);
        assert_eq!(cfg.entity_id(), Some(own));
        assert_eq!(cfg.cluster_id, Some(cluster));
    }

    #[test]
    fn test_nested_field_is_settable() {
        let mut cfg = InfraEnvConfig::default();
        cfg.set_field("is_ipv6", Value::Bool(true)).unwrap();
        assert!(cfg.entity.is_ipv6);
        assert_eq!(cfg.get_field("is_ipv6"), Some(Value::Bool(true)));
    }
}
