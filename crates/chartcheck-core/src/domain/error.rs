// ============================================================================
// domain/error.rs - DOMAIN FAILURES
// ============================================================================

use thiserror::Error;

use crate::domain::value_objects::ComponentRole;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (verdicts and reports keep a copy)
/// - Classifiable (see [`crate::error::FailureKind`])
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Version resolution
    // ========================================================================
    #[error("could not parse platform version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    // ========================================================================
    // Artifact extraction
    // ========================================================================
    #[error("failed to unmarshal {role} configmap '{path}': {reason}")]
    MalformedArtifact {
        role: ComponentRole,
        path: String,
        reason: String,
    },

    #[error("{role} configmap rendered more than once: '{first}' and '{second}'")]
    DuplicateArtifact {
        role: ComponentRole,
        first: String,
        second: String,
    },

    // ========================================================================
    // Config decoding
    // ========================================================================
    #[error("failed to decode {role} config: {reason}")]
    InvalidConfig { role: ComponentRole, reason: String },

    #[error("{role} configuration is empty")]
    MissingConfig { role: ComponentRole },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::VersionParse { input, .. } => vec![
                format!("'{input}' is not a semantic version"),
                "Use the form vMAJOR.MINOR.PATCH, e.g. v1.12.8".into(),
            ],
            Self::MalformedArtifact { path, .. } => vec![
                format!("The template producing '{path}' renders invalid YAML"),
                "Check indentation of embedded blocks (indent / nindent)".into(),
            ],
            Self::DuplicateArtifact { first, second, .. } => vec![
                format!("Both '{first}' and '{second}' carry the same file name"),
                "Rename one of the templates so each role renders exactly once".into(),
            ],
            Self::InvalidConfig { role, .. } => vec![
                format!("The {role} `config-file` entry is not valid TOML for {role}"),
                "Check value types and unterminated strings or tables".into(),
            ],
            Self::MissingConfig { role } => vec![
                format!(
                    "Render the '{}' data key in {}",
                    role.config_field(),
                    role.artifact_filename()
                ),
                "Check the values that toggle the config template".into(),
            ],
        }
    }
}
