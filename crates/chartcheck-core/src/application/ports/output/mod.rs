//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `chartcheck-adapters` crate provides implementations.

use crate::domain::{ArtifactSet, Bundle, EvaluationContext};
use crate::error::CheckResult;

/// Port for loading a chart bundle.
///
/// Implemented by:
/// - `chartcheck_adapters::DirectoryBundleLoader` (chart directory on disk)
#[cfg_attr(test, mockall::automock)]
pub trait BundleLoader: Send + Sync {
    /// Load the bundle named by `identifier` (a path or a name resolved by
    /// the adapter).
    fn load(&self, identifier: &str) -> CheckResult<Bundle>;
}

/// Port for template rendering.
///
/// Implemented by:
/// - `chartcheck_adapters::SimpleRenderer` (Go-template subset)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Render every template of `bundle` into artifact path → text.
    ///
    /// # Arguments
    ///
    /// * `bundle` - The chart to render
    /// * `context` - Release, capabilities and raw parameters
    fn render(&self, bundle: &Bundle, context: &EvaluationContext) -> CheckResult<ArtifactSet>;
}
