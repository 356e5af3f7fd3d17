//! Entity configuration records and profile loading.
//!
//! A profile is a YAML document naming the entity kind and its fields:
//!
//! ```yaml
//! kind: cluster
//! cluster_name: test-infra-cluster
//! openshift_version: "4.15"
//! download_image: true
//! ```
//!
//! The fields shared by every kind live in [`BaseEntityConfig`], which is
//! flattened into [`ClusterConfig`] and [`InfraEnvConfig`].

mod cluster;
mod infra_env;
mod record;

use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use strum::{Display, EnumString};
use tracing::debug;

pub use cluster::{ClusterConfig, HighAvailabilityMode};
pub use infra_env::InfraEnvConfig;
pub use record::{ConfigOverrides, ConfigRecord};

use self::record::impl_config_record;
use crate::error::HarnessError;
use crate::id::EntityId;

/// Boot image flavour requested from the installer service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum IsoImageType {
    #[default]
    FullIso,
    MinimalIso,
}

/// Fields shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEntityConfig {
    #[serde(default)]
    pub openshift_version: String,
    #[serde(default = "default_cpu_architecture")]
    pub cpu_architecture: String,
    #[serde(default)]
    pub pull_secret: String,
    #[serde(default)]
    pub ssh_public_key: String,
    /// Whether preparation fetches the boot image before nodes are started.
    #[serde(default = "default_true")]
    pub download_image: bool,
    #[serde(default)]
    pub iso_download_path: Option<Utf8PathBuf>,
    #[serde(default)]
    pub iso_image_type: IsoImageType,
    #[serde(default)]
    pub is_static_ip: bool,
    #[serde(default = "default_true")]
    pub is_ipv4: bool,
    #[serde(default)]
    pub is_ipv6: bool,
    /// Number of hosts discovery waits for; 0 asks the node manager.
    #[serde(default)]
    pub nodes_count: usize,
    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,
    #[serde(default = "default_discovery_poll_interval_secs")]
    pub discovery_poll_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_cpu_architecture() -> String {
    "x86_64".to_string()
}

fn default_discovery_timeout_secs() -> u64 {
    20 * 60
}

fn default_discovery_poll_interval_secs() -> u64 {
    10
}

impl Default for BaseEntityConfig {
    fn default() -> Self {
        Self {
            openshift_version: String::new(),
            cpu_architecture: default_cpu_architecture(),
            pull_secret: String::new(),
            ssh_public_key: String::new(),
            download_image: true,
            iso_download_path: None,
            iso_image_type: IsoImageType::default(),
            is_static_ip: false,
            is_ipv4: true,
            is_ipv6: false,
            nodes_count: 0,
            discovery_timeout_secs: default_discovery_timeout_secs(),
            discovery_poll_interval_secs: default_discovery_poll_interval_secs(),
        }
    }
}

impl_config_record!(BaseEntityConfig {
    openshift_version,
    cpu_architecture,
    pull_secret,
    ssh_public_key,
    download_image,
    iso_download_path,
    iso_image_type,
    is_static_ip,
    is_ipv4,
    is_ipv6,
    nodes_count,
    discovery_timeout_secs,
    discovery_poll_interval_secs,
});

/// Behaviour every entity configuration exposes to the lifecycle code.
pub trait EntityConfig: ConfigRecord + Serialize {
    fn base(&self) -> &BaseEntityConfig;

    /// The identifier of the remote resource this config refers to, if any.
    fn entity_id(&self) -> Option<EntityId>;

    /// Records the identifier resolved for this config.
    fn set_entity_id(&mut self, id: EntityId);
}

/// Entity kind named by a profile's `kind` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    Cluster,
    InfraEnv,
}

/// A loaded profile: one entity configuration of a known kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityProfile {
    Cluster(ClusterConfig),
    InfraEnv(InfraEnvConfig),
}

impl EntityProfile {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Cluster(_) => EntityKind::Cluster,
            Self::InfraEnv(_) => EntityKind::InfraEnv,
        }
    }

    pub fn base(&self) -> &BaseEntityConfig {
        match self {
            Self::Cluster(cfg) => cfg.base(),
            Self::InfraEnv(cfg) => cfg.base(),
        }
    }

    /// Applies overrides to the contained configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), HarnessError> {
        match self {
            Self::Cluster(cfg) => overrides.apply_to(cfg),
            Self::InfraEnv(cfg) => overrides.apply_to(cfg),
        }
    }

    /// Renders the profile back to YAML, `kind` first.
    pub fn to_yaml(&self) -> Result<String, HarnessError> {
        let body = match self {
            Self::Cluster(cfg) => serde_yaml::to_value(cfg),
            Self::InfraEnv(cfg) => serde_yaml::to_value(cfg),
        }
        .map_err(|e| HarnessError::Config(format!("failed to serialize profile: {}", e)))?;

        let mut document = serde_yaml::Mapping::new();
        document.insert(Value::from("kind"), Value::from(self.kind().to_string()));
        if let Value::Mapping(fields) = body {
            document.extend(fields);
        }
        serde_yaml::to_string(&document)
            .map_err(|e| HarnessError::Config(format!("failed to serialize profile: {}", e)))
    }
}

impl fmt::Display for EntityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_yaml() {
            Ok(yaml) => f.write_str(&yaml),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

/// Loads an entity profile from a YAML file.
///
/// Every key other than `kind` must be a field of the selected configuration
/// record; unknown keys are rejected with the same error an override would get.
pub fn load_profile(path: &Utf8Path) -> Result<EntityProfile, HarnessError> {
    let content =
        fs::read_to_string(path).map_err(|e| HarnessError::io(path.to_string(), e))?;
    debug!("loaded profile {} ({} bytes)", path, content.len());
    parse_profile(&content).map_err(|e| match e {
        HarnessError::Config(msg) => HarnessError::Config(format!("{}: {}", path, msg)),
        other => other,
    })
}

/// Parses an entity profile from YAML text.
pub fn parse_profile(content: &str) -> Result<EntityProfile, HarnessError> {
    let document: Value = serde_yaml::from_str(content)
        .map_err(|e| HarnessError::Config(format!("failed to parse yaml: {}", e)))?;
    let Value::Mapping(mut fields) = document else {
        return Err(HarnessError::Config("profile must be a YAML mapping".to_string()));
    };

    let kind = match fields.remove("kind") {
        Some(Value::String(kind)) => kind.parse::<EntityKind>().map_err(|_| {
            HarnessError::Config(format!(
                "unknown entity kind '{}', expected 'cluster' or 'infra-env'",
                kind
            ))
        })?,
        Some(_) => return Err(HarnessError::Config("'kind' must be a string".to_string())),
        None => return Err(HarnessError::Config("missing required field 'kind'".to_string())),
    };

    match kind {
        EntityKind::Cluster => parse_record::<ClusterConfig>(fields).map(EntityProfile::Cluster),
        EntityKind::InfraEnv => {
            parse_record::<InfraEnvConfig>(fields).map(EntityProfile::InfraEnv)
        }
    }
}

fn parse_record<C>(fields: serde_yaml::Mapping) -> Result<C, HarnessError>
where
    C: ConfigRecord + serde::de::DeserializeOwned,
{
    for key in fields.keys() {
        let Value::String(key) = key else {
            return Err(HarnessError::Config(format!("non-string key in profile: {:?}", key)));
        };
        if !C::has_field(key) {
            return Err(HarnessError::UnknownConfigKey {
                key: key.clone(),
                config_type: C::TYPE_NAME,
            });
        }
    }
    serde_yaml::from_value(Value::Mapping(fields)).map_err(|e| {
        HarnessError::Config(format!("invalid {}: {}", C::TYPE_NAME, e))
    })
}
