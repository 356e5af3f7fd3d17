//! Domain-specific error types for assisted-harness.
//!
//! This module defines `HarnessError`, a `thiserror`-based enum that
//! provides typed error variants for the failure modes of an entity's
//! lifecycle. Typed modules (configuration, overrides, polling) return
//! `Result<T, HarnessError>`, while the collaborator and entity trait
//! boundaries use `anyhow::Result`.
//!
//! `HarnessError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at those boundaries, and callers can recover the
//! typed variant with `downcast_ref::<HarnessError>()`.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Common kinds get a fixed wording (e.g., "I/O error: not found"); anything
/// else falls back to the OS-level message.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for assisted-harness.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HarnessError {
    /// An override named a field the configuration record does not have.
    #[error("The key {key} is not present in {config_type}")]
    UnknownConfigKey {
        /// The offending override key.
        key: String,
        /// Type name of the configuration record (e.g., `ClusterConfig`).
        config_type: &'static str,
    },

    /// An override value could not be stored in the named field without coercion.
    #[error("invalid value for {config_type}.{key}: {message}")]
    InvalidConfigValue {
        key: String,
        config_type: &'static str,
        message: String,
    },

    /// A profile could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// A file path or an operation description with a path.
        context: String,
        /// Derived from [`io_error_kind_message`].
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Create-or-adopt did not leave the entity with a usable identifier.
    #[error("failed to resolve {entity}: {message}")]
    Resolution { entity: String, message: String },

    /// Preparation needs a node manager but the entity was built without one.
    #[error("{entity} has no node manager attached")]
    MissingNodes { entity: String },

    /// Not enough hosts registered before the discovery deadline.
    #[error(
        "timed out after {timeout_secs}s waiting for {entity} hosts: \
        {discovered}/{expected} discovered"
    )]
    DiscoveryTimeout {
        entity: String,
        expected: usize,
        discovered: usize,
        timeout_secs: u64,
    },
}

impl HarnessError {
    /// Creates an `Io` variant with the `message` field derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_config_key_display() {
        let err = HarnessError::UnknownConfigKey {
            key: "nonexistent_field".to_string(),
            config_type: "ClusterConfig",
        };
        assert_eq!(err.to_string(), "The key nonexistent_field is not present in ClusterConfig");
    }

    #[test]
    fn test_invalid_config_value_display() {
        let err = HarnessError::InvalidConfigValue {
            key: "download_image".to_string(),
            config_type: "InfraEnvConfig",
            message: "invalid type: string \"yes\", expected a boolean".to_string(),
        };
        assert!(err.to_string().starts_with("invalid value for InfraEnvConfig.download_image:"));
    }

    #[test]
    fn test_discovery_timeout_display() {
        let err = HarnessError::DiscoveryTimeout {
            entity: "cluster".to_string(),
            expected: 5,
            discovered: 3,
            timeout_secs: 1200,
        };
        assert_eq!(
            err.to_string(),
            "timed out after 1200s waiting for cluster hosts: 3/5 discovered"
        );
    }

    #[test]
    fn test_io_display() {
        let source = io::Error::new(io::ErrorKind::NotFound, "entity not found");
        let err = HarnessError::io("/path/to/profile.yml", source);
        assert_eq!(err.to_string(), "/path/to/profile.yml: I/O error: not found");
    }

    #[test]
    fn test_io_source_preserved() {
        let err = HarnessError::io(
            "/etc/shadow",
            io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        );
        match &err {
            HarnessError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_io_error_kind_message_other() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        assert!(io_error_kind_message(&err).starts_with("I/O error: "));
    }

    #[test]
    fn test_into_anyhow_error() {
        let err = HarnessError::MissingNodes {
            entity: "cluster".to_string(),
        };
        let anyhow_err: anyhow::Error = err.into();
        let downcast = anyhow_err.downcast_ref::<HarnessError>();
        assert!(matches!(downcast, Some(HarnessError::MissingNodes { .. })));
    }
}
