//! Boundary of the installer service API client.
//!
//! This module provides:
//! - [`InventoryClient`]: Trait for the create/read calls entities make
//! - Request parameters ([`ClusterCreateParams`], [`InfraEnvCreateParams`])
//! - Detail records returned by the service ([`ClusterDetails`],
//!   [`InfraEnvDetails`], [`Host`])
//!
//! The wire protocol lives behind the trait. Retry and backoff for transient
//! failures are the implementation's concern; errors it returns are final.

use anyhow::Result;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::config::{HighAvailabilityMode, IsoImageType};
use crate::id::EntityId;

/// Parameters for registering a new cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterCreateParams {
    pub name: String,
    pub openshift_version: String,
    pub cpu_architecture: String,
    pub base_dns_domain: String,
    pub high_availability_mode: HighAvailabilityMode,
    pub pull_secret: String,
    pub ssh_public_key: String,
}

/// Parameters for registering a new infra-env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfraEnvCreateParams {
    pub name: String,
    pub openshift_version: String,
    pub cpu_architecture: String,
    pub image_type: IsoImageType,
    pub pull_secret: String,
    pub ssh_public_key: String,
    /// Cluster the infra-env's hosts are bound to on registration.
    pub cluster_id: Option<EntityId>,
}

/// A cluster as currently known to the installer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDetails {
    pub id: EntityId,
    pub name: String,
    pub openshift_version: String,
    pub base_dns_domain: String,
    pub status: String,
}

/// An infra-env as currently known to the installer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraEnvDetails {
    pub id: EntityId,
    pub name: String,
    pub openshift_version: String,
    pub cluster_id: Option<EntityId>,
    pub image_type: IsoImageType,
    /// Where the service serves the boot image, once generated.
    pub download_url: Option<Url>,
}

/// Host registration state reported by the installer service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum HostStatus {
    Discovering,
    Known,
    KnownUnbound,
    Insufficient,
    InsufficientUnbound,
    PendingForInput,
    Disconnected,
    DisconnectedUnbound,
    Installing,
    Installed,
    Error,
    /// Any state this crate does not name.
    #[strum(default)]
    Other(String),
}

/// A host registered with the installer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub id: EntityId,
    pub hostname: String,
    pub status: HostStatus,
    pub infra_env_id: EntityId,
    pub cluster_id: Option<EntityId>,
}

/// Client for the installer service.
///
/// Implementations must be `Send + Sync`: a single client is shared by every
/// entity in a test run through `Arc<dyn InventoryClient>`.
pub trait InventoryClient: Send + Sync {
    fn create_cluster(&self, params: &ClusterCreateParams) -> Result<ClusterDetails>;

    fn get_cluster(&self, id: &EntityId) -> Result<ClusterDetails>;

    fn create_infra_env(&self, params: &InfraEnvCreateParams) -> Result<InfraEnvDetails>;

    fn get_infra_env(&self, id: &EntityId) -> Result<InfraEnvDetails>;

    /// Downloads the infra-env's boot image to `dest`.
    fn download_infra_env_image(&self, id: &EntityId, dest: &Utf8Path) -> Result<()>;

    /// Hosts bound to the cluster.
    fn list_cluster_hosts(&self, cluster_id: &EntityId) -> Result<Vec<Host>>;

    /// Hosts registered through the infra-env, bound or not.
    fn list_infra_env_hosts(&self, infra_env_id: &EntityId) -> Result<Vec<Host>>;
}
