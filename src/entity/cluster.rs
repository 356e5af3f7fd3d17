//! Cluster entity.
//!
//! A cluster has no boot image of its own: hosts boot from an infra-env bound
//! to the cluster, which the cluster registers the first time it needs an
//! image.

use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use super::{Entity, EntityCore, InfraEnv, wait_for_hosts};
use crate::client::{ClusterCreateParams, ClusterDetails, Host, HostStatus, InventoryClient};
use crate::config::{ClusterConfig, InfraEnvConfig};
use crate::id::EntityId;
use crate::nodes::NodeManager;
use crate::wait::WaitPolicy;

const ENTITY_NAME: &str = "cluster";

pub struct Cluster {
    core: EntityCore<ClusterConfig>,
    infra_env: Option<InfraEnv>,
}

impl Cluster {
    /// Creates a new cluster, or adopts the one named by `config.cluster_id`.
    pub fn new(
        client: Arc<dyn InventoryClient>,
        config: ClusterConfig,
        nodes: Option<Arc<dyn NodeManager>>,
    ) -> Result<Self> {
        let mut cluster = Self {
            core: EntityCore::new(client, config, nodes),
            infra_env: None,
        };
        cluster.resolve()?;
        Ok(cluster)
    }

    /// The infra-env this cluster's hosts boot from, once registered.
    pub fn infra_env(&self) -> Option<&InfraEnv> {
        self.infra_env.as_ref()
    }

    fn create_params(&self) -> ClusterCreateParams {
        let config = self.core.config();
        ClusterCreateParams {
            name: config.cluster_name.clone(),
            openshift_version: config.entity.openshift_version.clone(),
            cpu_architecture: config.entity.cpu_architecture.clone(),
            base_dns_domain: config.base_dns_domain.clone(),
            high_availability_mode: config.high_availability_mode,
            pull_secret: config.entity.pull_secret.clone(),
            ssh_public_key: config.entity.ssh_public_key.clone(),
        }
    }

    /// Returns the bound infra-env, registering one on first use.
    ///
    /// The infra-env takes a snapshot of the cluster's base configuration when
    /// it is registered. Later overrides on the cluster (image type, SSH key,
    /// version) do not reach it, and there is no lookup of an infra-env that
    /// already exists for an adopted cluster: each `Cluster` registers its own.
    fn ensure_infra_env(&mut self) -> Result<&mut InfraEnv> {
        let cluster_id = self.core.require_id(ENTITY_NAME)?;
        if self.infra_env.is_none() {
            let config = self.core.config();
            let infra_env_config = InfraEnvConfig {
                infra_env_id: None,
                infra_env_name: format!("{}_infra-env", config.cluster_name),
                cluster_id: Some(cluster_id),
                entity: config.entity.clone(),
            };
            let infra_env = InfraEnv::new(
                Arc::clone(self.core.shared_client()),
                infra_env_config,
                self.core.nodes().cloned(),
            )
            .with_context(|| format!("failed to register infra-env for cluster {}", cluster_id))?;
            self.infra_env = Some(infra_env);
        }
        self.infra_env
            .as_mut()
            .context("infra-env missing after registration")
    }
}

impl Entity for Cluster {
    type Config = ClusterConfig;
    type Details = ClusterDetails;

    fn core(&self) -> &EntityCore<ClusterConfig> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore<ClusterConfig> {
        &mut self.core
    }

    fn entity_name(&self) -> &'static str {
        ENTITY_NAME
    }

    fn create(&mut self) -> Result<EntityId> {
        let params = self.create_params();
        let details = self.core.client().create_cluster(&params)?;
        info!("created cluster {} ({})", details.name, details.id);
        Ok(details.id)
    }

    fn update_existing(&mut self, id: EntityId) -> Result<EntityId> {
        let details = self.core.client().get_cluster(&id)?;
        let config = self.core.config_mut();
        config.cluster_name = details.name;
        config.base_dns_domain = details.base_dns_domain;
        config.entity.openshift_version = details.openshift_version;
        Ok(details.id)
    }

    fn download_image(&mut self, iso_download_path: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
        let dest = self.core.iso_download_path(ENTITY_NAME, iso_download_path)?;
        self.ensure_infra_env()?.download_image(Some(dest.as_path()))
    }

    fn get_details(&self) -> Result<ClusterDetails> {
        let id = self.core.require_id(ENTITY_NAME)?;
        self.core.client().get_cluster(&id)
    }

    fn wait_until_hosts_are_discovered(
        &self,
        nodes_count: Option<usize>,
        allow_insufficient: bool,
    ) -> Result<Vec<Host>> {
        let id = self.core.require_id(ENTITY_NAME)?;
        let expected = self.core.expected_nodes_count(nodes_count);
        let policy = WaitPolicy::discovery(&self.core.config().entity);
        let mut statuses = vec![HostStatus::Known];
        if allow_insufficient {
            statuses.push(HostStatus::Insufficient);
            statuses.push(HostStatus::PendingForInput);
        }
        wait_for_hosts(ENTITY_NAME, &policy, expected, &statuses, || {
            self.core.client().list_cluster_hosts(&id)
        })
    }
}
