//! Lifecycle handles for remote installable resources.
//!
//! An [`Entity`] is bound to exactly one remote resource. Construction either
//! creates the resource or adopts an existing one, overrides may then be
//! applied to its configuration, and [`Entity::prepare_for_installation`]
//! brings up the nodes and waits for them to register.
//!
//! The shared orchestration lives in provided trait methods and in
//! [`EntityCore`]; each resource kind ([`Cluster`], [`InfraEnv`]) supplies the
//! service calls.

pub mod cluster;
pub mod infra_env;
mod plan;

use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

pub use cluster::Cluster;
pub use infra_env::InfraEnv;
pub use plan::{PreparationPlan, PreparationStep};

use crate::client::{Host, HostStatus, InventoryClient};
use crate::config::{ConfigOverrides, EntityConfig};
use crate::error::HarnessError;
use crate::id::EntityId;
use crate::nodes::NodeManager;
use crate::wait::{Probe, WaitOutcome, WaitPolicy, wait_until};

/// State every entity kind carries: the bound identifier, the exclusively
/// owned configuration, and the shared collaborators.
pub struct EntityCore<C> {
    id: Option<EntityId>,
    config: C,
    client: Arc<dyn InventoryClient>,
    nodes: Option<Arc<dyn NodeManager>>,
}

impl<C: EntityConfig> EntityCore<C> {
    /// Creates an unbound core. Entities call [`Entity::resolve`] before
    /// handing themselves out.
    pub fn new(
        client: Arc<dyn InventoryClient>,
        config: C,
        nodes: Option<Arc<dyn NodeManager>>,
    ) -> Self {
        Self {
            id: None,
            config,
            client,
            nodes,
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn client(&self) -> &dyn InventoryClient {
        self.client.as_ref()
    }

    pub fn shared_client(&self) -> &Arc<dyn InventoryClient> {
        &self.client
    }

    pub fn nodes(&self) -> Option<&Arc<dyn NodeManager>> {
        self.nodes.as_ref()
    }

    /// Returns the bound identifier or a `Resolution` error.
    pub fn require_id(&self, entity: &str) -> Result<EntityId, HarnessError> {
        self.id.ok_or_else(|| HarnessError::Resolution {
            entity: entity.to_string(),
            message: "no identifier has been bound".to_string(),
        })
    }

    pub fn require_nodes(&self, entity: &str) -> Result<Arc<dyn NodeManager>, HarnessError> {
        self.nodes.clone().ok_or_else(|| HarnessError::MissingNodes {
            entity: entity.to_string(),
        })
    }

    /// Binds the resolved identifier and records it in the configuration.
    ///
    /// The identifier is immutable once bound: binding a different one fails.
    pub fn bind_id(&mut self, entity: &str, id: EntityId) -> Result<(), HarnessError> {
        match self.id {
            Some(bound) if bound != id => Err(HarnessError::Resolution {
                entity: entity.to_string(),
                message: format!("already bound to {}, refusing to rebind to {}", bound, id),
            }),
            _ => {
                self.id = Some(id);
                self.config.set_entity_id(id);
                Ok(())
            }
        }
    }

    /// Applies overrides to the configuration, all or nothing.
    ///
    /// Overrides may not move a bound entity to a different identifier.
    pub fn update_config(
        &mut self,
        entity: &str,
        overrides: &ConfigOverrides,
    ) -> Result<(), HarnessError> {
        let mut staged = self.config.clone();
        overrides.apply_to(&mut staged)?;
        if let Some(bound) = self.id
            && staged.entity_id() != Some(bound)
        {
            return Err(HarnessError::Resolution {
                entity: entity.to_string(),
                message: format!("identifier {} cannot be changed by a config override", bound),
            });
        }
        self.config = staged;
        Ok(())
    }

    /// Mutable access for kind-specific reconciliation with the remote record.
    pub(crate) fn config_mut(&mut self) -> &mut C {
        &mut self.config
    }

    /// Number of hosts a discovery wait expects.
    ///
    /// An explicit count wins, then a non-zero `nodes_count` in the config,
    /// then the node manager's count.
    pub fn expected_nodes_count(&self, requested: Option<usize>) -> usize {
        requested
            .or_else(|| Some(self.config.base().nodes_count).filter(|count| *count > 0))
            .or_else(|| self.nodes.as_ref().map(|nodes| nodes.nodes_count()))
            .unwrap_or(0)
    }

    /// Resolves where a boot image should be written.
    pub fn iso_download_path(
        &self,
        entity: &str,
        requested: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, HarnessError> {
        requested
            .map(Utf8Path::to_path_buf)
            .or_else(|| self.config.base().iso_download_path.clone())
            .ok_or_else(|| {
                HarnessError::Config(format!("no iso_download_path configured for {}", entity))
            })
    }
}

/// A lifecycle-managed handle to one remote installable resource.
///
/// Implementors supply the service calls for their resource kind; the
/// create-or-adopt decision, config overrides and the preparation sequence
/// are provided.
pub trait Entity {
    type Config: EntityConfig;
    type Details;

    fn core(&self) -> &EntityCore<Self::Config>;

    fn core_mut(&mut self) -> &mut EntityCore<Self::Config>;

    /// Lowercase kind name used in diagnostics (e.g., `cluster`).
    fn entity_name(&self) -> &'static str;

    /// Creates the remote resource from the configuration and returns its id.
    fn create(&mut self) -> Result<EntityId>;

    /// Reconciles local state with the existing remote resource `id`.
    fn update_existing(&mut self, id: EntityId) -> Result<EntityId>;

    /// Fetches the boot image to `iso_download_path` (or the configured path)
    /// and returns where it was written.
    fn download_image(&mut self, iso_download_path: Option<&Utf8Path>) -> Result<Utf8PathBuf>;

    /// The resource as currently known to the installer service.
    fn get_details(&self) -> Result<Self::Details>;

    /// Blocks until `nodes_count` hosts (default: the expected node count) have
    /// registered, accepting insufficient hosts when `allow_insufficient` is set.
    fn wait_until_hosts_are_discovered(
        &self,
        nodes_count: Option<usize>,
        allow_insufficient: bool,
    ) -> Result<Vec<Host>>;

    fn id(&self) -> Option<EntityId> {
        self.core().id()
    }

    fn config(&self) -> &Self::Config {
        self.core().config()
    }

    /// Creates the remote resource, or adopts it when the configuration
    /// already names one. Exactly one of the two paths runs.
    ///
    /// Adoption failures are final; there is no fallback to creation.
    fn resolve(&mut self) -> Result<EntityId> {
        let name = self.entity_name();
        if let Some(id) = self.id() {
            return Err(HarnessError::Resolution {
                entity: name.to_string(),
                message: format!("already resolved to {}", id),
            }
            .into());
        }

        let id = match self.config().entity_id() {
            Some(existing) => {
                info!("adopting existing {} {}", name, existing);
                self.update_existing(existing)
                    .with_context(|| format!("failed to adopt {} {}", name, existing))?
            }
            None => {
                info!("creating new {}", name);
                self.create().with_context(|| format!("failed to create {}", name))?
            }
        };

        self.core_mut().bind_id(name, id)?;
        info!("{} resolved to {}", name, id);
        Ok(id)
    }

    /// Overwrites configuration fields by name.
    ///
    /// # Errors
    ///
    /// `HarnessError::UnknownConfigKey` if any key is not a field of the
    /// configuration; nothing is applied in that case.
    fn update_config(&mut self, overrides: &ConfigOverrides) -> Result<(), HarnessError> {
        let name = self.entity_name();
        info!("Updating {} configurations to {}", name, overrides);
        self.core_mut().update_config(name, overrides)
    }

    /// Runs the preparation sequence: overrides, diagnostics, image download,
    /// node start, and the discovery wait.
    ///
    /// Each step completes before the next begins and nothing is retried. A
    /// failure leaves whatever the failing step left behind (nodes may already
    /// be booting), so callers should tear down rather than resume.
    fn prepare_for_installation(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        self.update_config(overrides)?;

        let name = self.entity_name();
        let plan = PreparationPlan::for_config(self.config().base());
        let nodes = self.core().require_nodes(name)?;
        let steps = plan.steps();

        for (index, step) in steps.iter().enumerate() {
            debug!("{} preparation step {}/{}: {}", name, index + 1, steps.len(), step);
            match *step {
                PreparationStep::LogConfiguration => {
                    info!(
                        "Preparing for installation with {} configurations: {}_config={:?}",
                        name,
                        name,
                        self.config()
                    );
                }
                PreparationStep::LogControllerConfiguration => {
                    nodes.controller().log_configuration();
                }
                PreparationStep::DownloadImage => {
                    let path = self.download_image(None)?;
                    info!("{} image downloaded to {}", name, path);
                }
                PreparationStep::NotifyIsoReady => {
                    nodes.notify_iso_ready().context("failed to notify nodes of iso")?;
                }
                PreparationStep::StartNodes { check_ips } => {
                    nodes
                        .start_all(check_ips)
                        .with_context(|| format!("failed to start {} nodes", name))?;
                }
                PreparationStep::WaitForDiscovery { allow_insufficient } => {
                    self.wait_until_hosts_are_discovered(None, allow_insufficient)?;
                }
            }
        }

        Ok(())
    }
}

/// Polls `list_hosts` until at least `expected` hosts are in an `accepted`
/// status.
pub(crate) fn wait_for_hosts<F>(
    entity: &str,
    policy: &WaitPolicy,
    expected: usize,
    accepted: &[HostStatus],
    mut list_hosts: F,
) -> Result<Vec<Host>>
where
    F: FnMut() -> Result<Vec<Host>>,
{
    let statuses = accepted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    info!("waiting for {} {} host(s) in status [{}]", expected, entity, statuses);

    let outcome = wait_until(policy, &format!("{} host discovery", entity), || {
        let hosts: Vec<Host> = list_hosts()?
            .into_iter()
            .filter(|host| accepted.contains(&host.status))
            .collect();
        debug!("{}/{} {} host(s) discovered", hosts.len(), expected, entity);
        if hosts.len() >= expected {
            Ok(Probe::Ready(hosts))
        } else {
            Ok(Probe::Pending(hosts))
        }
    })?;

    match outcome {
        WaitOutcome::Ready(hosts) => {
            info!("{} {} host(s) discovered", hosts.len(), entity);
            Ok(hosts)
        }
        WaitOutcome::TimedOut(hosts) => Err(HarnessError::DiscoveryTimeout {
            entity: entity.to_string(),
            expected,
            discovered: hosts.len(),
            timeout_secs: policy.timeout.as_secs(),
        }
        .into()),
    }
}
