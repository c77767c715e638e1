//! Application layer errors.
//!
//! These errors represent failures at the edges of the pipeline (loading,
//! reading, rendering), not decoding logic. Decoding errors are
//! `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that occur while preparing and running the render.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// Chart could not be found or is not a valid chart.
    #[error("failed to load chart {identifier}: {reason}")]
    BundleLoad { identifier: String, reason: String },

    /// Values file could not be opened or fully read.
    #[error("failed to read values file {path}: {reason}")]
    ParameterFile { path: PathBuf, reason: String },

    /// Template evaluation failed.
    #[error("failed to render chart {chart}: {reason}")]
    RenderingFailed { chart: String, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::BundleLoad { identifier, .. } => vec![
                format!("Chart '{identifier}' must be a directory containing Chart.yaml"),
                "Pass a path with --chart or set charts_dir in the config file".into(),
            ],
            Self::ParameterFile { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Pass the values file explicitly with --values".into(),
                "Check that you have read permissions".into(),
            ],
            Self::RenderingFailed { .. } => vec![
                "A template references a value or function that is not available".into(),
                "Check the values file against the chart's values.yaml".into(),
            ],
        }
    }
}
