//! Pipeline state machine and terminal verdict.
//!
//! ```text
//! Pending → Rendering → Extracting → Decoding → Passed
//!     └──────────┴────────────┴───────────┴────→ Failed
//! ```
//!
//! Every failure is terminal. There is no retry and no partial result.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::domain::{error::DomainError, schema::DecodedConfig, value_objects::ComponentRole};

/// Where the pipeline is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationState {
    Pending,
    Rendering,
    Extracting,
    Decoding,
    Passed,
    Failed,
}

impl ValidationState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Rendering => "rendering",
            Self::Extracting => "extracting",
            Self::Decoding => "decoding",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleStatus {
    /// No artifact rendered for the role.
    Absent,
    /// Artifact rendered, but it has no config field.
    NoConfig,
    /// Raw config surfaced for inspection, not decoded.
    Logged,
    /// Raw config decoded against the role schema.
    Decoded,
}

impl RoleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::NoConfig => "no-config",
            Self::Logged => "logged",
            Self::Decoded => "decoded",
        }
    }
}

impl fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a passing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationVerdict {
    state: ValidationState,
    roles: BTreeMap<ComponentRole, RoleStatus>,
    #[serde(skip)]
    configs: BTreeMap<ComponentRole, DecodedConfig>,
}

impl ValidationVerdict {
    pub fn state(&self) -> ValidationState {
        self.state
    }

    pub fn passed(&self) -> bool {
        self.state == ValidationState::Passed
    }

    pub fn status(&self, role: ComponentRole) -> RoleStatus {
        self.roles.get(&role).copied().unwrap_or(RoleStatus::Absent)
    }

    pub fn roles(&self) -> impl Iterator<Item = (ComponentRole, RoleStatus)> + '_ {
        self.roles.iter().map(|(role, status)| (*role, *status))
    }

    pub fn config(&self, role: ComponentRole) -> Option<&DecodedConfig> {
        self.configs.get(&role)
    }
}

/// Accumulates per-role outcomes and drives the state machine.
#[derive(Debug)]
pub struct ValidationReporter {
    state: ValidationState,
    roles: BTreeMap<ComponentRole, RoleStatus>,
    configs: BTreeMap<ComponentRole, DecodedConfig>,
}

impl ValidationReporter {
    pub fn new() -> Self {
        Self {
            state: ValidationState::Pending,
            roles: ComponentRole::ALL
                .into_iter()
                .map(|role| (role, RoleStatus::Absent))
                .collect(),
            configs: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Move to the next non-terminal stage.
    ///
    /// Stages only move forward; terminal states are reached through
    /// [`Self::fail`] and [`Self::finish`].
    pub fn advance(&mut self, next: ValidationState) {
        debug_assert!(!next.is_terminal(), "terminal states are set by finish/fail");
        debug_assert!(next > self.state, "stages only move forward");
        debug!(from = %self.state, to = %next, "pipeline stage");
        self.state = next;
    }

    pub fn record(&mut self, role: ComponentRole, status: RoleStatus) {
        self.roles.insert(role, status);
    }

    pub fn record_decoded(&mut self, config: DecodedConfig) {
        let role = config.role();
        self.roles.insert(role, RoleStatus::Decoded);
        self.configs.insert(role, config);
    }

    /// Mark the run failed. Returns the stage that was running.
    pub fn fail(&mut self) -> ValidationState {
        let stage = self.state;
        debug!(stage = %stage, "validation failed");
        self.state = ValidationState::Failed;
        stage
    }

    /// Apply the required-role policy and close the run.
    ///
    /// # Errors
    ///
    /// [`DomainError::MissingConfig`] for the first required role (in
    /// [`ComponentRole::ALL`] order) that has no decoded configuration.
    pub fn finish(mut self) -> Result<ValidationVerdict, DomainError> {
        let missing = ComponentRole::ALL
            .into_iter()
            .filter(ComponentRole::is_required)
            .find(|role| !self.configs.contains_key(role));

        if let Some(role) = missing {
            self.fail();
            return Err(DomainError::MissingConfig { role });
        }

        self.state = ValidationState::Passed;
        debug!("validation passed");
        Ok(ValidationVerdict {
            state: self.state,
            roles: self.roles,
            configs: self.configs,
        })
    }
}

impl Default for ValidationReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{PdConfig, TidbConfig};

    fn tidb() -> DecodedConfig {
        DecodedConfig::Tidb(Box::default())
    }

    fn pd() -> DecodedConfig {
        DecodedConfig::Pd(Box::new(PdConfig::default()))
    }

    #[test]
    fn passes_with_both_required_roles() {
        let mut reporter = ValidationReporter::new();
        reporter.advance(ValidationState::Rendering);
        reporter.advance(ValidationState::Extracting);
        reporter.advance(ValidationState::Decoding);
        reporter.record_decoded(tidb());
        reporter.record_decoded(pd());

        let verdict = reporter.finish().unwrap();
        assert!(verdict.passed());
        assert_eq!(verdict.status(ComponentRole::StorageNode), RoleStatus::Absent);
        assert_eq!(
            verdict.config(ComponentRole::DatabaseNode).and_then(DecodedConfig::as_tidb),
            Some(&TidbConfig::default())
        );
    }

    #[test]
    fn storage_node_status_does_not_matter() {
        let mut reporter = ValidationReporter::new();
        reporter.record(ComponentRole::StorageNode, RoleStatus::NoConfig);
        reporter.record_decoded(pd());
        reporter.record_decoded(tidb());
        let verdict = reporter.finish().unwrap();
        assert_eq!(
            verdict.status(ComponentRole::StorageNode),
            RoleStatus::NoConfig
        );
    }

    #[test]
    fn missing_tidb_is_reported_before_pd() {
        let reporter = ValidationReporter::new();
        assert_eq!(
            reporter.finish().unwrap_err(),
            DomainError::MissingConfig {
                role: ComponentRole::DatabaseNode
            }
        );
    }

    #[test]
    fn missing_pd_fails() {
        let mut reporter = ValidationReporter::new();
        reporter.record_decoded(tidb());
        reporter.record(ComponentRole::PlacementDriver, RoleStatus::NoConfig);
        assert_eq!(
            reporter.finish().unwrap_err(),
            DomainError::MissingConfig {
                role: ComponentRole::PlacementDriver
            }
        );
    }

    #[test]
    fn fail_reports_running_stage() {
        let mut reporter = ValidationReporter::new();
        reporter.advance(ValidationState::Rendering);
        reporter.advance(ValidationState::Extracting);
        assert_eq!(reporter.fail(), ValidationState::Extracting);
        assert_eq!(reporter.state(), ValidationState::Failed);
    }

    #[test]
    fn roles_iterate_in_pipeline_order() {
        let mut reporter = ValidationReporter::new();
        reporter.record_decoded(tidb());
        reporter.record_decoded(pd());
        reporter.record(ComponentRole::StorageNode, RoleStatus::Logged);
        let verdict = reporter.finish().unwrap();

        let roles: Vec<_> = verdict.roles().collect();
        assert_eq!(
            roles,
            vec![
                (ComponentRole::DatabaseNode, RoleStatus::Decoded),
                (ComponentRole::StorageNode, RoleStatus::Logged),
                (ComponentRole::PlacementDriver, RoleStatus::Decoded),
            ]
        );
    }
}
