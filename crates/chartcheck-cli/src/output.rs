//! Output management and formatting.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use chartcheck_core::{
    application::CheckRequest,
    domain::{RoleStatus, ValidationVerdict},
};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

/// JSON shape of a passing run.
#[derive(Debug, Serialize)]
struct VerdictReport<'a> {
    chart: &'a str,
    release: &'a str,
    namespace: &'a str,
    #[serde(flatten)]
    verdict: &'a ValidationVerdict,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        // Auto resolves to Human on a TTY, Plain otherwise.
        let resolved_format = if args.output_format == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            args.output_format
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    /// Print the verdict of a passing run.
    pub fn verdict(&self, request: &CheckRequest, verdict: &ValidationVerdict) -> io::Result<()> {
        if self.resolved_format == OutputFormat::Json {
            let report = VerdictReport {
                chart: &request.chart,
                release: &request.release_name,
                namespace: &request.namespace,
                verdict,
            };
            return self.json(&report);
        }

        if self.quiet {
            return Ok(());
        }

        self.header(&format!(
            "{} ({}/{})",
            request.chart, request.namespace, request.release_name
        ))?;
        for line in verdict_lines(verdict) {
            self.term.write_line(&self.paint(&line.0, line.1))?;
        }
        self.success(&format!("configuration check {}", verdict.state()))
    }

    /// Write any serializable value as pretty JSON. Never suppressed.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    fn paint(&self, line: &str, status: RoleStatus) -> String {
        if self.no_color {
            return line.to_owned();
        }
        match status {
            RoleStatus::Decoded => line.green().to_string(),
            RoleStatus::Logged => line.blue().to_string(),
            RoleStatus::Absent | RoleStatus::NoConfig => line.dimmed().to_string(),
        }
    }

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

/// One `  <component>  <status>` line per role, in pipeline order.
fn verdict_lines(verdict: &ValidationVerdict) -> Vec<(String, RoleStatus)> {
    verdict
        .roles()
        .map(|(role, status)| (format!("  {:<6}{status}", role.component_name()), status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chartcheck_core::domain::{
        ComponentRole, ConfigDecoder, ValidationReporter, ValidationState,
    };

    fn make_manager(format: OutputFormat, no_color: bool) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color,
            config: None,
            output_format: format,
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    fn passing_verdict() -> ValidationVerdict {
        let mut reporter = ValidationReporter::new();
        reporter.advance(ValidationState::Rendering);
        reporter.advance(ValidationState::Extracting);
        reporter.advance(ValidationState::Decoding);
        for role in [ComponentRole::DatabaseNode, ComponentRole::PlacementDriver] {
            let decoded = ConfigDecoder::decode(role, "").unwrap().unwrap();
            reporter.record_decoded(decoded);
        }
        reporter.record(ComponentRole::StorageNode, RoleStatus::Logged);
        reporter.finish().unwrap()
    }

    #[test]
    fn verdict_lines_follow_pipeline_order() {
        let lines: Vec<String> = verdict_lines(&passing_verdict())
            .into_iter()
            .map(|(line, _)| line)
            .collect();
        assert_eq!(
            lines,
            ["  TiDB  decoded", "  TiKV  logged", "  PD    decoded"]
        );
    }

    #[test]
    fn json_report_flattens_verdict() {
        let verdict = passing_verdict();
        let request = CheckRequest::default();
        let report = VerdictReport {
            chart: &request.chart,
            release: &request.release_name,
            namespace: &request.namespace,
            verdict: &verdict,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["chart"], "pingcap/tidb-cluster");
        assert_eq!(value["state"], "passed");
        assert_eq!(value["roles"]["database-node"], "decoded");
        assert_eq!(value["roles"]["storage-node"], "logged");
    }

    #[test]
    fn non_human_formats_disable_color() {
        assert!(!make_manager(OutputFormat::Plain, false).supports_color());
        assert!(!make_manager(OutputFormat::Json, false).supports_color());
        assert!(make_manager(OutputFormat::Human, false).supports_color());
        assert!(!make_manager(OutputFormat::Human, true).supports_color());
    }

    #[test]
    fn format_accessor_returns_resolved() {
        assert_eq!(
            make_manager(OutputFormat::Json, false).format(),
            OutputFormat::Json
        );
    }
}
