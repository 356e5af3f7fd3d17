//! Recording mock collaborators shared by the integration tests.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use assisted_harness::EntityId;
use assisted_harness::client::{
    ClusterCreateParams, ClusterDetails, Host, HostStatus, InfraEnvCreateParams, InfraEnvDetails,
    InventoryClient,
};
use assisted_harness::config::{ClusterConfig, InfraEnvConfig};
use assisted_harness::nodes::{NodeController, NodeManager};
use camino::Utf8Path;

/// Ordered log of every collaborator call, shared by the client and node mocks.
pub type EventLog = Arc<Mutex<Vec<String>>>;

#[allow(dead_code)]
pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// In-memory installer service.
#[allow(dead_code)]
pub struct MockInventory {
    events: EventLog,
    clusters: Mutex<HashMap<EntityId, ClusterDetails>>,
    infra_envs: Mutex<HashMap<EntityId, InfraEnvDetails>>,
    hosts: Mutex<Vec<Host>>,
    pub fail_create: bool,
    pub fail_download: bool,
}

#[allow(dead_code)]
impl MockInventory {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            clusters: Mutex::new(HashMap::new()),
            infra_envs: Mutex::new(HashMap::new()),
            hosts: Mutex::new(Vec::new()),
            fail_create: false,
            fail_download: false,
        }
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    /// Seeds a cluster that already exists on the service.
    pub fn seed_cluster(&self, name: &str) -> EntityId {
        let id = EntityId::random();
        self.clusters.lock().unwrap().insert(
            id,
            ClusterDetails {
                id,
                name: name.to_string(),
                openshift_version: "4.15".to_string(),
                base_dns_domain: "example.com".to_string(),
                status: "insufficient".to_string(),
            },
        );
        id
    }

    /// Seeds an infra-env that already exists on the service.
    pub fn seed_infra_env(&self, name: &str, cluster_id: Option<EntityId>) -> EntityId {
        let id = EntityId::random();
        self.infra_envs.lock().unwrap().insert(
            id,
            InfraEnvDetails {
                id,
                name: name.to_string(),
                openshift_version: "4.16".to_string(),
                cluster_id,
                image_type: Default::default(),
                download_url: None,
            },
        );
        id
    }

    /// Registers `count` hosts in `status`.
    pub fn register_hosts(
        &self,
        count: usize,
        status: HostStatus,
        infra_env_id: EntityId,
        cluster_id: Option<EntityId>,
    ) {
        let mut hosts = self.hosts.lock().unwrap();
        for _ in 0..count {
            let index = hosts.len();
            hosts.push(Host {
                id: EntityId::random(),
                hostname: format!("node-{}", index),
                status: status.clone(),
                infra_env_id,
                cluster_id,
            });
        }
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.lock().unwrap().len()
    }

    pub fn infra_env_count(&self) -> usize {
        self.infra_envs.lock().unwrap().len()
    }
}

impl InventoryClient for MockInventory {
    fn create_cluster(&self, params: &ClusterCreateParams) -> Result<ClusterDetails> {
        self.record(format!("create_cluster({})", params.name));
        if self.fail_create {
            anyhow::bail!("simulated create failure");
        }
        let details = ClusterDetails {
            id: EntityId::random(),
            name: params.name.clone(),
            openshift_version: params.openshift_version.clone(),
            base_dns_domain: params.base_dns_domain.clone(),
            status: "pending-for-input".to_string(),
        };
        self.clusters
            .lock()
            .unwrap()
            .insert(details.id, details.clone());
        Ok(details)
    }

    fn get_cluster(&self, id: &EntityId) -> Result<ClusterDetails> {
        self.record("get_cluster");
        self.clusters
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("cluster {} not found", id))
    }

    fn create_infra_env(&self, params: &InfraEnvCreateParams) -> Result<InfraEnvDetails> {
        self.record(format!("create_infra_env({})", params.name));
        if self.fail_create {
            anyhow::bail!("simulated create failure");
        }
        let details = InfraEnvDetails {
            id: EntityId::random(),
            name: params.name.clone(),
            openshift_version: params.openshift_version.clone(),
            cluster_id: params.cluster_id,
            image_type: params.image_type,
            download_url: None,
        };
        self.infra_envs
            .lock()
            .unwrap()
            .insert(details.id, details.clone());
        Ok(details)
    }

    fn get_infra_env(&self, id: &EntityId) -> Result<InfraEnvDetails> {
        self.record("get_infra_env");
        self.infra_envs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("infra-env {} not found", id))
    }

    fn download_infra_env_image(&self, id: &EntityId, dest: &Utf8Path) -> Result<()> {
        self.record("download_infra_env_image");
        if self.fail_download {
            anyhow::bail!("simulated download failure");
        }
        if !self.infra_envs.lock().unwrap().contains_key(id) {
            anyhow::bail!("infra-env {} not found", id);
        }
        fs::write(dest, b"ISO")?;
        Ok(())
    }

    fn list_cluster_hosts(&self, cluster_id: &EntityId) -> Result<Vec<Host>> {
        self.record("list_cluster_hosts");
        Ok(self
            .hosts
            .lock()
            .unwrap()
            .iter()
            .filter(|host| host.cluster_id.as_ref() == Some(cluster_id))
            .cloned()
            .collect())
    }

    fn list_infra_env_hosts(&self, infra_env_id: &EntityId) -> Result<Vec<Host>> {
        self.record("list_infra_env_hosts");
        Ok(self
            .hosts
            .lock()
            .unwrap()
            .iter()
            .filter(|host| &host.infra_env_id == infra_env_id)
            .cloned()
            .collect())
    }
}

#[allow(dead_code)]
pub struct MockController {
    events: EventLog,
}

impl NodeController for MockController {
    fn log_configuration(&self) {
        self.events
            .lock()
            .unwrap()
            .push("log_configuration".to_string());
    }
}

/// Node manager that records calls and optionally fails `start_all`.
#[allow(dead_code)]
pub struct MockNodes {
    events: EventLog,
    controller: MockController,
    count: usize,
    pub fail_start: bool,
}

#[allow(dead_code)]
impl MockNodes {
    pub fn new(events: EventLog, count: usize) -> Self {
        Self {
            controller: MockController {
                events: Arc::clone(&events),
            },
            events,
            count,
            fail_start: false,
        }
    }
}

impl NodeManager for MockNodes {
    fn controller(&self) -> &dyn NodeController {
        &self.controller
    }

    fn notify_iso_ready(&self) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push("notify_iso_ready".to_string());
        Ok(())
    }

    fn start_all(&self, check_ips: bool) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("start_all(check_ips={})", check_ips));
        if self.fail_start {
            anyhow::bail!("simulated node start failure");
        }
        Ok(())
    }

    fn nodes_count(&self) -> usize {
        self.count
    }
}

/// Cluster config that polls once and writes images under `dir`.
#[allow(dead_code)]
pub fn cluster_config(dir: &Utf8Path) -> ClusterConfig {
    let mut config = ClusterConfig::default();
    config.entity.iso_download_path = Some(dir.join("images/cluster.iso"));
    config.entity.discovery_timeout_secs = 0;
    config.entity.discovery_poll_interval_secs = 0;
    config
}

/// Infra-env config that polls once and writes images under `dir`.
#[allow(dead_code)]
pub fn infra_env_config(dir: &Utf8Path) -> InfraEnvConfig {
    let mut config = InfraEnvConfig::default();
    config.entity.iso_download_path = Some(dir.join("infra-env.iso"));
    config.entity.discovery_timeout_secs = 0;
    config.entity.discovery_poll_interval_secs = 0;
    config
}

/// Returns a snapshot of the recorded events.
#[allow(dead_code)]
pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Creates a UTF-8 temporary directory.
#[allow(dead_code)]
pub fn utf8_tempdir() -> (tempfile::TempDir, camino::Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .expect("tempdir path is not UTF-8");
    (dir, path)
}
