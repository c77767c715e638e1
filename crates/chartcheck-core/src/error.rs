//! Unified error handling for chartcheck core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, classifies them into the failure taxonomy, and locates the
//! pipeline stage they stop.

use std::fmt;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, ValidationState};

/// Root error type for chartcheck core operations.
///
/// Every variant is terminal: the pipeline stops at the first one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    /// Errors from the domain layer (version, artifact, config decoding).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Errors from the application layer (loading, reading, rendering).
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl CheckError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
        }
    }

    /// Classify into the failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Application(ApplicationError::BundleLoad { .. }) => FailureKind::Load,
            Self::Application(ApplicationError::ParameterFile { .. }) => FailureKind::Io,
            Self::Application(ApplicationError::RenderingFailed { .. }) => FailureKind::Render,
            Self::Domain(DomainError::VersionParse { .. }) => FailureKind::VersionParse,
            Self::Domain(
                DomainError::MalformedArtifact { .. }
                | DomainError::DuplicateArtifact { .. }
                | DomainError::InvalidConfig { .. },
            ) => FailureKind::Decode,
            Self::Domain(DomainError::MissingConfig { .. }) => FailureKind::MissingConfig,
        }
    }

    /// The pipeline stage this error stops.
    pub fn stage(&self) -> ValidationState {
        match self {
            Self::Application(_) | Self::Domain(DomainError::VersionParse { .. }) => {
                ValidationState::Rendering
            }
            Self::Domain(
                DomainError::MalformedArtifact { .. } | DomainError::DuplicateArtifact { .. },
            ) => ValidationState::Extracting,
            Self::Domain(DomainError::InvalidConfig { .. } | DomainError::MissingConfig { .. }) => {
                ValidationState::Decoding
            }
        }
    }
}

/// The failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Chart not found or invalid.
    Load,
    /// Values file unreadable.
    Io,
    /// Malformed platform version.
    VersionParse,
    /// Template evaluation failed.
    Render,
    /// Malformed document or schema-incompatible config text.
    Decode,
    /// A required role produced no configuration.
    MissingConfig,
}

impl FailureKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "LoadError",
            Self::Io => "IOError",
            Self::VersionParse => "VersionParseError",
            Self::Render => "RenderError",
            Self::Decode => "DecodeError",
            Self::MissingConfig => "MissingConfigError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convenient result type alias.
pub type CheckResult<T> = Result<T, CheckError>;
