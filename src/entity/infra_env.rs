//! Infra-env entity: the discovery image hosts boot from and register through.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use super::{Entity, EntityCore, wait_for_hosts};
use crate::client::{Host, HostStatus, InfraEnvCreateParams, InfraEnvDetails, InventoryClient};
use crate::config::InfraEnvConfig;
use crate::error::HarnessError;
use crate::id::EntityId;
use crate::nodes::NodeManager;
use crate::wait::WaitPolicy;

const ENTITY_NAME: &str = "infraenv";

pub struct InfraEnv {
    core: EntityCore<InfraEnvConfig>,
}

impl InfraEnv {
    /// Registers a new infra-env, or adopts the one named by
    /// `config.infra_env_id`.
    pub fn new(
        client: Arc<dyn InventoryClient>,
        config: InfraEnvConfig,
        nodes: Option<Arc<dyn NodeManager>>,
    ) -> Result<Self> {
        let mut infra_env = Self {
            core: EntityCore::new(client, config, nodes),
        };
        infra_env.resolve()?;
        Ok(infra_env)
    }

    fn create_params(&self) -> InfraEnvCreateParams {
        let config = self.core.config();
        InfraEnvCreateParams {
            name: config.infra_env_name.clone(),
            openshift_version: config.entity.openshift_version.clone(),
            cpu_architecture: config.entity.cpu_architecture.clone(),
            image_type: config.entity.iso_image_type,
            pull_secret: config.entity.pull_secret.clone(),
            ssh_public_key: config.entity.ssh_public_key.clone(),
            cluster_id: config.cluster_id,
        }
    }

    /// Host statuses that count as discovered.
    ///
    /// Unbound hosts always count; hosts already bound to the infra-env's
    /// cluster report the cluster-side statuses instead.
    fn discovered_statuses(&self, allow_insufficient: bool) -> Vec<HostStatus> {
        let mut statuses = vec![HostStatus::KnownUnbound];
        if allow_insufficient {
            statuses.push(HostStatus::InsufficientUnbound);
        }
        if self.core.config().cluster_id.is_some() {
            statuses.push(HostStatus::Known);
            if allow_insufficient {
                statuses.push(HostStatus::Insufficient);
                statuses.push(HostStatus::PendingForInput);
            }
        }
        statuses
    }
}

impl Entity for InfraEnv {
    type Config = InfraEnvConfig;
    type Details = InfraEnvDetails;

    fn core(&self) -> &EntityCore<InfraEnvConfig> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore<InfraEnvConfig> {
        &mut self.core
    }

    fn entity_name(&self) -> &'static str {
        ENTITY_NAME
    }

    fn create(&mut self) -> Result<EntityId> {
        let params = self.create_params();
        let details = self.core.client().create_infra_env(&params)?;
        info!("registered infra-env {} ({})", details.name, details.id);
        Ok(details.id)
    }

    fn update_existing(&mut self, id: EntityId) -> Result<EntityId> {
        let details = self.core.client().get_infra_env(&id)?;
        let config = self.core.config_mut();
        config.infra_env_name = details.name;
        config.entity.openshift_version = details.openshift_version;
        config.entity.iso_image_type = details.image_type;
        config.cluster_id = details.cluster_id;
        Ok(details.id)
    }

    fn download_image(&mut self, iso_download_path: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
        let id = self.core.require_id(ENTITY_NAME)?;
        let dest = self.core.iso_download_path(ENTITY_NAME, iso_download_path)?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                HarnessError::io(format!("failed to create directory: {}", parent), e)
            })?;
        }

        info!("downloading infra-env {} image to {}", id, dest);
        self.core
            .client()
            .download_infra_env_image(&id, &dest)
            .with_context(|| format!("failed to download image for infra-env {}", id))?;
        Ok(dest)
    }

    fn get_details(&self) -> Result<InfraEnvDetails> {
        let id = self.core.require_id(ENTITY_NAME)?;
        self.core.client().get_infra_env(&id)
    }

    fn wait_until_hosts_are_discovered(
        &self,
        nodes_count: Option<usize>,
        allow_insufficient: bool,
    ) -> Result<Vec<Host>> {
        let id = self.core.require_id(ENTITY_NAME)?;
        let expected = self.core.expected_nodes_count(nodes_count);
        let policy = WaitPolicy::discovery(&self.core.config().entity);
        let statuses = self.discovered_statuses(allow_insufficient);
        wait_for_hosts(ENTITY_NAME, &policy, expected, &statuses, || {
            self.core.client().list_infra_env_hosts(&id)
        })
    }
}
