//! TiDB server configuration (`tidb.toml`).
//!
//! Keys the chart may render. Anything not listed is ignored on decode;
//! listed keys must have the right TOML type.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TidbConfig {
    pub host: Option<String>,
    pub advertise_address: Option<String>,
    pub port: Option<u32>,
    pub cors: Option<String>,
    pub store: Option<String>,
    pub path: Option<String>,
    pub socket: Option<String>,
    pub lease: Option<String>,
    pub run_ddl: Option<bool>,
    pub split_table: Option<bool>,
    pub token_limit: Option<u32>,
    pub oom_action: Option<String>,
    pub mem_quota_query: Option<i64>,
    pub enable_streaming: Option<bool>,
    pub lower_case_table_names: Option<i32>,
    pub compatible_kill_query: Option<bool>,
    pub check_mb4_value_in_utf8: Option<bool>,
    pub treat_old_version_utf8_as_utf8mb4: Option<bool>,
    pub txn_local_latches: TxnLocalLatches,
    pub log: Log,
    pub security: Security,
    pub status: Status,
    pub performance: Performance,
    pub prepared_plan_cache: PreparedPlanCache,
    pub opentracing: OpenTracing,
    pub proxy_protocol: ProxyProtocol,
    pub tikv_client: TikvClient,
    pub binlog: Binlog,
    pub plugin: Plugin,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TxnLocalLatches {
    pub enabled: Option<bool>,
    pub capacity: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Log {
    pub level: Option<String>,
    pub format: Option<String>,
    pub disable_timestamp: Option<bool>,
    pub slow_query_file: Option<String>,
    pub slow_threshold: Option<u64>,
    pub expensive_threshold: Option<u64>,
    pub query_log_max_len: Option<u64>,
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
pub struct Security {
    pub skip_grant_table: Option<bool>,
    pub ssl_ca: Option<String>,
    pub ssl_cert: Option<String>,
    pub ssl_key: Option<String>,
    pub cluster_ssl_ca: Option<String>,
    pub cluster_ssl_cert: Option<String>,
    pub cluster_ssl_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Status {
    pub report_status: Option<bool>,
    pub status_port: Option<u32>,
    pub metrics_addr: Option<String>,
    pub metrics_interval: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Performance {
    pub max_procs: Option<u32>,
    pub tcp_keep_alive: Option<bool>,
    pub cross_join: Option<bool>,
    pub stats_lease: Option<String>,
    pub run_auto_analyze: Option<bool>,
    pub stmt_count_limit: Option<u32>,
    pub feedback_probability: Option<f64>,
    pub query_feedback_limit: Option<u32>,
    pub pseudo_estimate_ratio: Option<f64>,
    pub force_priority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PreparedPlanCache {
    pub enabled: Option<bool>,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OpenTracing {
    pub enable: Option<bool>,
    pub rpc_metrics: Option<bool>,
    pub sampler: OpenTracingSampler,
    pub reporter: OpenTracingReporter,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OpenTracingSampler {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub param: Option<f64>,
    pub sampling_server_url: Option<String>,
    pub max_operations: Option<u32>,
    pub sampling_refresh_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OpenTracingReporter {
    pub queue_size: Option<u32>,
    pub buffer_flush_interval: Option<String>,
    pub log_spans: Option<bool>,
    pub local_agent_host_port: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProxyProtocol {
    pub networks: Option<String>,
    pub header_timeout: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TikvClient {
    pub grpc_connection_count: Option<u32>,
    pub grpc_keepalive_time: Option<u32>,
    pub grpc_keepalive_timeout: Option<u32>,
    pub commit_timeout: Option<String>,
    pub max_txn_time_use: Option<u32>,
    pub max_batch_size: Option<u32>,
    pub overload_threshold: Option<u32>,
    pub max_batch_wait_time: Option<u64>,
    pub batch_wait_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Binlog {
    pub enable: Option<bool>,
    pub write_timeout: Option<String>,
    pub ignore_error: Option<bool>,
    pub binlog_socket: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Plugin {
    pub dir: Option<String>,
    pub load: Option<String>,
}
