//! Check Service - main application orchestrator.
//!
//! This service coordinates the entire validation workflow:
//! 1. Load the chart and read the values file
//! 2. Resolve the platform version and build the evaluation context
//! 3. Render the chart
//! 4. Classify artifacts and extract raw config text
//! 5. Decode each role's config and apply the required-role policy
//!
//! The first failure ends the run; nothing is retried.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{BundleLoader, TemplateRenderer},
    },
    domain::{
        Capabilities, ComponentRole, ConfigDecoder, DEFAULT_PLATFORM_VERSION, EvaluationContext,
        ParameterPayload, PlatformVersion, RoleStatus, ValidationReporter, ValidationState,
        ValidationVerdict, extract_config,
    },
    error::CheckResult,
};

pub const DEFAULT_CHART: &str = "pingcap/tidb-cluster";
pub const DEFAULT_VALUES_FILE: &str = "values.yaml";
pub const DEFAULT_RELEASE_NAME: &str = "tidb-cluster";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_CHART_VERSION: &str = "v1.0.0";

/// Inputs of one check run. Built once by the caller and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// Chart identifier handed to the [`BundleLoader`].
    pub chart: String,
    /// Values file; must exist.
    pub values: PathBuf,
    pub release_name: String,
    pub namespace: String,
    /// Accepted for the record; not validated.
    pub chart_version: String,
    /// Target Kubernetes version.
    pub platform_version: String,
}

impl Default for CheckRequest {
    fn default() -> Self {
        Self {
            chart: DEFAULT_CHART.into(),
            values: PathBuf::from(DEFAULT_VALUES_FILE),
            release_name: DEFAULT_RELEASE_NAME.into(),
            namespace: DEFAULT_NAMESPACE.into(),
            chart_version: DEFAULT_CHART_VERSION.into(),
            platform_version: DEFAULT_PLATFORM_VERSION.into(),
        }
    }
}

/// Main validation service.
///
/// Orchestrates the render, extract and decode workflow.
pub struct CheckService {
    loader: Box<dyn BundleLoader>,
    renderer: Box<dyn TemplateRenderer>,
}

impl CheckService {
    /// Create a new check service with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use chartcheck_core::application::{CheckRequest, CheckService};
    /// # fn demo(
    /// #     loader: Box<dyn chartcheck_core::application::ports::BundleLoader>,
    /// #     renderer: Box<dyn chartcheck_core::application::ports::TemplateRenderer>,
    /// # ) {
    /// let service = CheckService::new(loader, renderer);
    /// let verdict = service.check(&CheckRequest::default()).unwrap();
    /// assert!(verdict.passed());
    /// # }
    /// ```
    pub fn new(loader: Box<dyn BundleLoader>, renderer: Box<dyn TemplateRenderer>) -> Self {
        Self { loader, renderer }
    }

    /// Run the full check.
    ///
    /// Returns a verdict only when both required roles decoded; every other
    /// outcome is an error naming its stage (see
    /// [`CheckError::stage`](crate::error::CheckError::stage)).
    #[instrument(
        skip_all,
        fields(
            chart = %request.chart,
            release = %request.release_name,
            namespace = %request.namespace
        )
    )]
    pub fn check(&self, request: &CheckRequest) -> CheckResult<ValidationVerdict> {
        let mut reporter = ValidationReporter::new();

        if let Err(e) = self.run(request, &mut reporter) {
            reporter.fail();
            return Err(e);
        }

        let verdict = reporter.finish()?;
        info!("Chart configuration check passed");
        Ok(verdict)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn run(&self, request: &CheckRequest, reporter: &mut ValidationReporter) -> CheckResult<()> {
        // 1. Render
        reporter.advance(ValidationState::Rendering);
        debug!(chart_version = %request.chart_version, "chart version requested");

        let bundle = self.loader.load(&request.chart)?;
        info!(
            chart = %bundle.name(),
            version = %bundle.metadata.version,
            templates = bundle.templates.len(),
            "Chart loaded"
        );

        let raw = read_parameter_file(&request.values)?;
        let kube_version = PlatformVersion::resolve(&request.platform_version)?;
        debug!(kube_version = %kube_version, "Platform version resolved");

        let context = EvaluationContext::builder(&request.release_name, &request.namespace)
            .capabilities(Capabilities::new(kube_version))
            .parameters(ParameterPayload::verbatim(raw))
            .build();

        let artifacts = self.renderer.render(&bundle, &context)?;
        info!(artifacts = artifacts.len(), "Chart rendered");

        // 2. Extract
        reporter.advance(ValidationState::Extracting);
        let classified = artifacts.classify()?;

        let mut raw_configs = Vec::new();
        for role in ComponentRole::ALL {
            let Some(artifact) = classified.get(role) else {
                debug!(role = %role, "no artifact rendered");
                continue;
            };
            match extract_config(role, artifact)? {
                Some(text) => raw_configs.push((role, text)),
                None => {
                    debug!(role = %role, path = %artifact.path, "no config field");
                    reporter.record(role, RoleStatus::NoConfig);
                }
            }
        }

        // 3. Decode
        reporter.advance(ValidationState::Decoding);
        for (role, raw) in raw_configs {
            match ConfigDecoder::decode(role, &raw)? {
                Some(config) => reporter.record_decoded(config),
                None => reporter.record(role, RoleStatus::Logged),
            }
        }

        Ok(())
    }
}

/// Read the whole values file as UTF-8 text.
///
/// The handle is dropped on every path out of this function.
fn read_parameter_file(path: &Path) -> Result<String, ApplicationError> {
    let io_error = |e: std::io::Error| ApplicationError::ParameterFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut file = File::open(path).map_err(io_error)?;
    let mut raw = String::new();
    file.read_to_string(&mut raw).map_err(io_error)?;

    debug!(path = %path.display(), bytes = raw.len(), "Values file read");
    Ok(raw)
}
