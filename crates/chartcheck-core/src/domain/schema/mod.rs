//! Per-role configuration schemas and the decoder that applies them.
//!
//! Decoding is tolerant: unknown keys are skipped, but a key the schema
//! knows must carry a value of the right type, and the text must be valid
//! TOML.

pub mod pd;
pub mod tidb;

use tracing::{debug, info};

use crate::domain::{error::DomainError, value_objects::ComponentRole};

pub use pd::PdConfig;
pub use tidb::TidbConfig;

/// A successfully decoded role configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedConfig {
    Tidb(Box<TidbConfig>),
    Pd(Box<PdConfig>),
}

impl DecodedConfig {
    pub fn role(&self) -> ComponentRole {
        match self {
            Self::Tidb(_) => ComponentRole::DatabaseNode,
            Self::Pd(_) => ComponentRole::PlacementDriver,
        }
    }

    pub fn as_tidb(&self) -> Option<&TidbConfig> {
        match self {
            Self::Tidb(cfg) => Some(&**cfg),
            Self::Pd(_) => None,
        }
    }

    pub fn as_pd(&self) -> Option<&PdConfig> {
        match self {
            Self::Pd(cfg) => Some(&**cfg),
            Self::Tidb(_) => None,
        }
    }
}

/// Decodes raw config text against the role's schema.
pub struct ConfigDecoder;

impl ConfigDecoder {
    /// Emit `raw` for inspection, then decode it.
    ///
    /// Returns `Ok(None)` for roles without a schema (the storage node): their
    /// text is only logged.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] for syntax or type errors.
    pub fn decode(role: ComponentRole, raw: &str) -> Result<Option<DecodedConfig>, DomainError> {
        info!(role = %role, "{role} config: {raw}");

        let decoded = match role {
            ComponentRole::DatabaseNode => {
                DecodedConfig::Tidb(Box::new(parse_toml::<TidbConfig>(role, raw)?))
            }
            ComponentRole::PlacementDriver => {
                DecodedConfig::Pd(Box::new(parse_toml::<PdConfig>(role, raw)?))
            }
            ComponentRole::StorageNode => return Ok(None),
        };

        debug!(role = %role, "config decoded");
        Ok(Some(decoded))
    }
}

fn parse_toml<T: serde::de::DeserializeOwned>(
    role: ComponentRole,
    raw: &str,
) -> Result<T, DomainError> {
    toml::from_str(raw).map_err(|e| DomainError::InvalidConfig {
        role,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIDB_TOML: &str = r#"
lease = "45s"
token-limit = 1000
enable-streaming = false
some-future-key = "ignored"

[log]
level = "info"
slow-threshold = 300

[log.file]
max-size = 300

[performance]
max-procs = 0
feedback-probability = 0.05

[prepared-plan-cache]
enabled = false

[tikv-client]
grpc-connection-count = 16

[txn-local-latches]
enabled = false
capacity = 10240000

[unknown-section]
whatever = [1, 2, 3]
"#;

    const PD_TOML: &str = r#"
lease = 3
enable-prevote = true

[log]
level = "info"

[schedule]
max-merge-region-size = 20
leader-schedule-limit = 4
tolerant-size-ratio = 5.0

[[schedule.schedulers-v2]]
type = "balance-region"

[[schedule.schedulers-v2]]
type = "hot-region"
args = []

[replication]
max-replicas = 3
location-labels = ["zone", "rack", "host"]

[namespace.ns1]
max-replicas = 5
"#;

    #[test]
    fn decodes_tidb_with_unknown_keys() {
        let decoded = ConfigDecoder::decode(ComponentRole::DatabaseNode, TIDB_TOML)
            .unwrap()
            .unwrap();
        let cfg = decoded.as_tidb().unwrap();
        assert_eq!(cfg.lease.as_deref(), Some("45s"));
        assert_eq!(cfg.token_limit, Some(1000));
        assert_eq!(cfg.log.level.as_deref(), Some("info"));
        assert_eq!(cfg.log.file.max_size, Some(300));
        assert_eq!(cfg.tikv_client.grpc_connection_count, Some(16));
        assert_eq!(cfg.txn_local_latches.capacity, Some(10_240_000));
        assert_eq!(decoded.role(), ComponentRole::DatabaseNode);
    }

    #[test]
    fn decodes_pd_schedulers_and_replication() {
        let decoded = ConfigDecoder::decode(ComponentRole::PlacementDriver, PD_TOML)
            .unwrap()
            .unwrap();
        let cfg = decoded.as_pd().unwrap();
        assert_eq!(cfg.lease, Some(3));
        assert_eq!(cfg.schedule.schedulers.len(), 2);
        assert_eq!(cfg.schedule.schedulers[1].kind, "hot-region");
        assert_eq!(cfg.replication.max_replicas, Some(3));
        assert_eq!(
            cfg.replication.location_labels.as_deref(),
            Some(&["zone".to_string(), "rack".into(), "host".into()][..])
        );
        assert_eq!(cfg.namespace["ns1"].max_replicas, Some(5));
        assert!(decoded.as_tidb().is_none());
    }

    #[test]
    fn empty_text_decodes_to_defaults() {
        let decoded = ConfigDecoder::decode(ComponentRole::DatabaseNode, "")
            .unwrap()
            .unwrap();
        assert_eq!(decoded.as_tidb(), Some(&TidbConfig::default()));
    }

    #[test]
    fn unterminated_structure_fails() {
        for raw in ["[log\nlevel = \"info\"", "lease = \"45s", "labels = [\"a\", "] {
            let err = ConfigDecoder::decode(ComponentRole::DatabaseNode, raw).unwrap_err();
            assert!(matches!(
                err,
                DomainError::InvalidConfig {
                    role: ComponentRole::DatabaseNode,
                    ..
                }
            ));
        }
    }

    #[test]
    fn wrong_value_type_fails() {
        let err = ConfigDecoder::decode(ComponentRole::PlacementDriver, "lease = \"three\"")
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig { .. }));

        let err =
            ConfigDecoder::decode(ComponentRole::DatabaseNode, "[log]\nlevel = 3").unwrap_err();
        assert!(err.to_string().contains("TiDB"));
    }

    #[test]
    fn storage_node_is_logged_not_decoded() {
        // Not even valid TOML; the storage node is never decoded.
        let decoded = ConfigDecoder::decode(ComponentRole::StorageNode, "[[[").unwrap();
        assert!(decoded.is_none());
    }
}
