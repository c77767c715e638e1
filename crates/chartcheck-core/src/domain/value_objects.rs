//! Domain value objects: ComponentRole, PlatformVersion.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. The
//! per-role policy (which file carries it, which data key holds the raw
//! config, whether it is required) lives on [`ComponentRole`] so that the
//! classifier, extractor and reporter all read it from one place.
//!
//! # Adding New Roles
//!
//! 1. Add the enum variant here
//! 2. Add the arms to `artifact_filename`, `component_name`, `is_required`
//! 3. If required, add a schema in `schema/` and an arm in `ConfigDecoder`

use crate::domain::error::DomainError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Target Kubernetes version the chart is rendered against.
pub const DEFAULT_PLATFORM_VERSION: &str = "v1.12.8";

/// Data key that carries the embedded configuration text of every role.
pub const CONFIG_FIELD: &str = "config-file";

// ── ComponentRole ────────────────────────────────────────────────────────────

/// A cluster component whose configuration the chart renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentRole {
    /// TiDB, the SQL layer.
    DatabaseNode,
    /// TiKV, the storage layer. Logged only.
    StorageNode,
    /// PD, the placement driver.
    PlacementDriver,
}

impl ComponentRole {
    /// Every role, in the order the pipeline visits them.
    pub const ALL: [ComponentRole; 3] = [
        ComponentRole::DatabaseNode,
        ComponentRole::StorageNode,
        ComponentRole::PlacementDriver,
    ];

    pub const fn component_name(&self) -> &'static str {
        match self {
            Self::DatabaseNode => "TiDB",
            Self::StorageNode => "TiKV",
            Self::PlacementDriver => "PD",
        }
    }

    /// Base file name of the config map template rendering this role.
    pub const fn artifact_filename(&self) -> &'static str {
        match self {
            Self::DatabaseNode => "tidb-configmap.yaml",
            Self::StorageNode => "tikv-configmap.yaml",
            Self::PlacementDriver => "pd-configmap.yaml",
        }
    }

    pub const fn config_field(&self) -> &'static str {
        CONFIG_FIELD
    }

    /// Whether a missing configuration for this role fails the check.
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::DatabaseNode | Self::PlacementDriver)
    }

    /// Match an artifact base file name (case-sensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.artifact_filename() == filename)
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.component_name())
    }
}

// ── PlatformVersion ──────────────────────────────────────────────────────────

/// The Kubernetes version triple exposed to templates.
///
/// Only major and minor survive resolution; `git_version` is always
/// synthesized as `v{major}.{minor}.0` so that patch levels and pre-release
/// tags of the input never reach the render context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformVersion {
    major: u64,
    minor: u64,
    git_version: String,
}

impl PlatformVersion {
    /// Parse a semantic version, with or without a leading `v`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::VersionParse`] if the input does not follow
    /// `MAJOR.MINOR.PATCH[-pre][+build]`.
    pub fn resolve(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let parsed = semver::Version::parse(bare).map_err(|e| DomainError::VersionParse {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(parsed.major, parsed.minor))
    }

    pub fn new(major: u64, minor: u64) -> Self {
        Self {
            major,
            minor,
            git_version: format!("v{major}.{minor}.0"),
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn git_version(&self) -> &str {
        &self.git_version
    }
}

impl Default for PlatformVersion {
    fn default() -> Self {
        // The constant is a literal the parser accepts.
        Self::new(1, 12)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.git_version)
    }
}

impl FromStr for PlatformVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_major_minor_and_synthesizes_git_version() {
        let v = PlatformVersion::resolve("v1.12.8").unwrap();
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 12);
        assert_eq!(v.git_version(), "v1.12.0");
    }

    #[test]
    fn default_constant_resolves_to_default() {
        assert_eq!(
            PlatformVersion::resolve(DEFAULT_PLATFORM_VERSION).unwrap(),
            PlatformVersion::default()
        );
    }

    #[test]
    fn prefix_is_optional() {
        let v: PlatformVersion = "1.14.3".parse().unwrap();
        assert_eq!(v.git_version(), "v1.14.0");
    }

    #[test]
    fn prerelease_and_build_do_not_leak() {
        let v = PlatformVersion::resolve("v1.15.0-beta.2+abc123").unwrap();
        assert_eq!(v.git_version(), "v1.15.0");
        assert_eq!(v.to_string(), "v1.15.0");
    }

    #[test]
    fn malformed_versions_are_rejected() {
        for input in ["not-a-version", "", "v1", "v1.12", "1.x.3", "vv1.2.3"] {
            let err = PlatformVersion::resolve(input).unwrap_err();
            assert!(
                matches!(err, DomainError::VersionParse { .. }),
                "expected parse error for {input:?}"
            );
        }
    }

    #[test]
    fn roles_match_filenames_case_sensitively() {
        assert_eq!(
            ComponentRole::from_filename("tidb-configmap.yaml"),
            Some(ComponentRole::DatabaseNode)
        );
        assert_eq!(
            ComponentRole::from_filename("pd-configmap.yaml"),
            Some(ComponentRole::PlacementDriver)
        );
        assert_eq!(ComponentRole::from_filename("TiDB-configmap.yaml"), None);
        assert_eq!(ComponentRole::from_filename("tidb-service.yaml"), None);
    }

    #[test]
    fn only_storage_node_is_optional() {
        assert!(ComponentRole::DatabaseNode.is_required());
        assert!(ComponentRole::PlacementDriver.is_required());
        assert!(!ComponentRole::StorageNode.is_required());
    }
}
