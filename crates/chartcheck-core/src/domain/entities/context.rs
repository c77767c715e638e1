//! Evaluation context handed to the template renderer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  EvaluationContext (built once, read-only)                  │
//! │  ├── ReleaseOptions   name, namespace, render timestamp     │
//! │  ├── Capabilities     API versions, KubeVersion, tool ver.  │
//! │  └── ParameterPayload raw values text, verbatim             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The raw parameter text is never parsed here. Interpreting it is the
//! renderer's job.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::domain::value_objects::PlatformVersion;

/// API group versions advertised to templates when nothing more specific is
/// known about the target cluster.
pub const DEFAULT_API_VERSIONS: &[&str] = &[
    "v1",
    "admissionregistration.k8s.io/v1beta1",
    "apiextensions.k8s.io/v1beta1",
    "apps/v1",
    "apps/v1beta1",
    "apps/v1beta2",
    "autoscaling/v1",
    "autoscaling/v2beta1",
    "batch/v1",
    "batch/v1beta1",
    "extensions/v1beta1",
    "networking.k8s.io/v1",
    "policy/v1beta1",
    "rbac.authorization.k8s.io/v1",
    "rbac.authorization.k8s.io/v1beta1",
    "storage.k8s.io/v1",
    "storage.k8s.io/v1beta1",
];

/// Release name, namespace and render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub name: String,
    pub namespace: String,
    pub time: DateTime<Utc>,
}

/// What the target platform is assumed to support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    api_versions: BTreeSet<String>,
    kube_version: PlatformVersion,
    tool_version: String,
}

impl Capabilities {
    /// Default API set and this tool's version, with `kube_version` in place
    /// of the baseline platform version.
    pub fn new(kube_version: PlatformVersion) -> Self {
        Self {
            api_versions: DEFAULT_API_VERSIONS.iter().map(|v| v.to_string()).collect(),
            kube_version,
            tool_version: format!("v{}", crate::VERSION),
        }
    }

    pub fn has_api_version(&self, version: &str) -> bool {
        self.api_versions.contains(version)
    }

    pub fn api_versions(&self) -> impl Iterator<Item = &str> {
        self.api_versions.iter().map(String::as_str)
    }

    pub fn kube_version(&self) -> &PlatformVersion {
        &self.kube_version
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new(PlatformVersion::default())
    }
}

/// User parameters, passed through unparsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPayload {
    raw: String,
}

impl ParameterPayload {
    /// Wrap parameter text verbatim.
    pub fn verbatim(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Everything the renderer may read. Immutable after [`RenderContextBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    release: ReleaseOptions,
    capabilities: Capabilities,
    parameters: ParameterPayload,
}

impl EvaluationContext {
    pub fn builder(
        release_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> RenderContextBuilder {
        RenderContextBuilder::new(release_name, namespace)
    }

    pub fn release(&self) -> &ReleaseOptions {
        &self.release
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn parameters(&self) -> &ParameterPayload {
        &self.parameters
    }
}

/// Assembles an [`EvaluationContext`].
///
/// The render timestamp defaults to the moment `build` is called.
#[derive(Debug, Clone)]
pub struct RenderContextBuilder {
    name: String,
    namespace: String,
    time: Option<DateTime<Utc>>,
    capabilities: Capabilities,
    parameters: ParameterPayload,
}

impl RenderContextBuilder {
    pub fn new(release_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: release_name.into(),
            namespace: namespace.into(),
            time: None,
            capabilities: Capabilities::default(),
            parameters: ParameterPayload::default(),
        }
    }

    pub fn rendered_at(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn parameters(mut self, parameters: ParameterPayload) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn build(self) -> EvaluationContext {
        EvaluationContext {
            release: ReleaseOptions {
                name: self.name,
                namespace: self.namespace,
                time: self.time.unwrap_or_else(Utc::now),
            },
            capabilities: self.capabilities,
            parameters: self.parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builder_carries_release_and_resolved_version() {
        let at = Utc.with_ymd_and_hms(2019, 6, 1, 12, 0, 0).unwrap();
        let ctx = EvaluationContext::builder("demo", "tidb")
            .rendered_at(at)
            .capabilities(Capabilities::new(PlatformVersion::new(1, 14)))
            .parameters(ParameterPayload::verbatim("pd:\n  replicas: 3\n"))
            .build();

        assert_eq!(ctx.release().name, "demo");
        assert_eq!(ctx.release().namespace, "tidb");
        assert_eq!(ctx.release().time, at);
        assert_eq!(ctx.capabilities().kube_version().git_version(), "v1.14.0");
        assert_eq!(ctx.parameters().raw(), "pd:\n  replicas: 3\n");
    }

    #[test]
    fn default_capabilities_advertise_core_apis() {
        let caps = Capabilities::default();
        assert!(caps.has_api_version("v1"));
        assert!(caps.has_api_version("apps/v1"));
        assert!(!caps.has_api_version("pingcap.com/v1alpha1"));
        assert!(caps.tool_version().starts_with('v'));
    }

    #[test]
    fn empty_payload_is_valid() {
        let ctx = RenderContextBuilder::new("r", "default")
            .parameters(ParameterPayload::verbatim(""))
            .build();
        assert_eq!(ctx.parameters().raw(), "");
    }
}
