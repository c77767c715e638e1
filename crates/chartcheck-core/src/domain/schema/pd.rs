//! PD server configuration (`pd.toml`).

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PdConfig {
    pub client_urls: Option<String>,
    pub peer_urls: Option<String>,
    pub advertise_client_urls: Option<String>,
    pub advertise_peer_urls: Option<String>,
    pub name: Option<String>,
    pub data_dir: Option<String>,
    pub initial_cluster: Option<String>,
    pub initial_cluster_state: Option<String>,
    pub join: Option<String>,
    pub lease: Option<i64>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub tso_save_interval: Option<String>,
    pub cluster_version: Option<String>,
    pub quota_backend_bytes: Option<String>,
    pub auto_compaction_mode: Option<String>,
    pub auto_compaction_retention: Option<String>,
    pub tick_interval: Option<String>,
    pub election_interval: Option<String>,
    pub enable_prevote: Option<bool>,
    pub namespace_classifier: Option<String>,
    pub log: Log,
    pub metric: Metric,
    pub schedule: Schedule,
    pub replication: Replication,
    pub namespace: BTreeMap<String, NamespaceConfig>,
    pub pd_server: PdServer,
    pub security: Security,
    pub label_property: BTreeMap<String, Vec<LabelProperty>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Log {
    pub level: Option<String>,
    pub format: Option<String>,
    pub disable_timestamp: Option<bool>,
    pub file: LogFile,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LogFile {
    pub filename: Option<String>,
    pub max_size: Option<u64>,
    pub max_days: Option<u64>,
    pub max_backups: Option<u64>,
    pub log_rotate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Metric {
    pub job: Option<String>,
    pub address: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Schedule {
    pub max_snapshot_count: Option<u64>,
    pub max_pending_peer_count: Option<u64>,
    pub max_merge_region_size: Option<u64>,
    pub max_merge_region_keys: Option<u64>,
    pub split_merge_interval: Option<String>,
    pub patrol_region_interval: Option<String>,
    pub max_store_down_time: Option<String>,
    pub leader_schedule_limit: Option<u64>,
    pub region_schedule_limit: Option<u64>,
    pub replica_schedule_limit: Option<u64>,
    pub merge_schedule_limit: Option<u64>,
    pub tolerant_size_ratio: Option<f64>,
    pub low_space_ratio: Option<f64>,
    pub high_space_ratio: Option<f64>,
    pub disable_raft_learner: Option<bool>,
    pub disable_remove_down_replica: Option<bool>,
    pub disable_replace_offline_replica: Option<bool>,
    pub disable_make_up_replica: Option<bool>,
    pub disable_remove_extra_replica: Option<bool>,
    pub disable_location_replacement: Option<bool>,
    pub disable_namespace_relocation: Option<bool>,
    #[serde(rename = "schedulers-v2")]
    pub schedulers: Vec<SchedulerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SchedulerConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub args: Vec<String>,
    pub disable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Replication {
    pub max_replicas: Option<u64>,
    pub location_labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NamespaceConfig {
    pub leader_schedule_limit: Option<u64>,
    pub region_schedule_limit: Option<u64>,
    pub replica_schedule_limit: Option<u64>,
    pub merge_schedule_limit: Option<u64>,
    pub max_replicas: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PdServer {
    pub use_region_storage: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Security {
    pub cacert_path: Option<String>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelProperty {
    pub key: String,
    pub value: String,
}
