//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, help
//! text and value enums. No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser};

use chartcheck_core::application::{
    CheckRequest,
    services::{
        DEFAULT_CHART, DEFAULT_CHART_VERSION, DEFAULT_NAMESPACE, DEFAULT_RELEASE_NAME,
        DEFAULT_VALUES_FILE,
    },
};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

use crate::config::AppConfig;

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name     = "chartcheck",
    bin_name = "chartcheck",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Check that a TiDB cluster chart renders valid component configs",
    long_about = "chartcheck renders a TiDB cluster chart with your values file, \
                  extracts the TiDB, TiKV and PD configuration files from the \
                  rendered ConfigMaps and decodes the TiDB and PD ones against \
                  their schemas.",
    after_help = "EXAMPLES:\n\
        \x20 chartcheck --chart ./charts/tidb-cluster --values my-values.yaml\n\
        \x20 chartcheck --chart tidb-cluster --namespace tidb -v\n\
        \x20 chartcheck --values prod.yaml --output-format json",
)]
pub struct Cli {
    /// Output and logging flags.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// What to check.
    #[command(flatten)]
    pub check: CheckArgs,
}

/// Arguments for a check run.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Chart to render: a chart directory, or a name under `charts_dir`.
    #[arg(long, value_name = "CHART", default_value = DEFAULT_CHART)]
    pub chart: String,

    /// Values file handed to the chart verbatim.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_VALUES_FILE)]
    pub values: PathBuf,

    /// Release name.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_RELEASE_NAME)]
    pub name: String,

    /// Release namespace.
    #[arg(long, value_name = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Chart version (recorded, not validated).
    #[arg(long = "chart-version", value_name = "VERSION", default_value = DEFAULT_CHART_VERSION)]
    pub chart_version: String,
}

impl CheckArgs {
    /// Freeze the flags into a request; the platform version comes from config.
    pub fn into_request(self, config: &AppConfig) -> CheckRequest {
        CheckRequest {
            chart: self.chart,
            values: self.values,
            release_name: self.name,
            namespace: self.namespace,
            chart_version: self.chart_version,
            platform_version: config.platform_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("chartcheck").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_documented_interface() {
        let cli = parse(&[]);
        assert_eq!(cli.check.chart, "pingcap/tidb-cluster");
        assert_eq!(cli.check.values, PathBuf::from("values.yaml"));
        assert_eq!(cli.check.name, "tidb-cluster");
        assert_eq!(cli.check.namespace, "default");
        assert_eq!(cli.check.chart_version, "v1.0.0");
        assert_eq!(cli.global.output_format, OutputFormat::Auto);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--chart",
            "./charts/tidb-cluster",
            "--values",
            "prod.yaml",
            "--name",
            "demo",
            "--namespace",
            "tidb",
            "--chart-version",
            "v1.1.0",
            "-vv",
        ]);
        assert_eq!(cli.check.chart, "./charts/tidb-cluster");
        assert_eq!(cli.check.values, PathBuf::from("prod.yaml"));
        assert_eq!(cli.check.name, "demo");
        assert_eq!(cli.check.namespace, "tidb");
        assert_eq!(cli.check.chart_version, "v1.1.0");
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn request_takes_platform_version_from_config() {
        let config = AppConfig {
            platform_version: "v1.13.0".into(),
            ..AppConfig::default()
        };
        let request = parse(&["--name", "demo"]).check.into_request(&config);
        assert_eq!(request.release_name, "demo");
        assert_eq!(request.platform_version, "v1.13.0");
        assert_eq!(request.chart, DEFAULT_CHART);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let err = Cli::try_parse_from(["chartcheck", "-q", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn single_dash_long_flags_are_rejected() {
        assert!(Cli::try_parse_from(["chartcheck", "-chart", "x"]).is_err());
    }
}
