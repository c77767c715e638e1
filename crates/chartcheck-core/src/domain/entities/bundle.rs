//! The chart bundle handed from the loader to the renderer.
//!
//! The core never looks inside templates; it only carries them from the
//! [`BundleLoader`](crate::application::ports::BundleLoader) port to the
//! [`TemplateRenderer`](crate::application::ports::TemplateRenderer) port.

use serde::Deserialize;

/// `Chart.yaml` contents relevant to rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ChartMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            app_version: None,
            description: None,
        }
    }
}

/// One file of a bundle, addressed relative to the chart root with `/`
/// separators (e.g. `templates/tidb-configmap.yaml`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub path: String,
    pub content: String,
}

impl BundleFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A loaded chart: metadata, default values, templates and auxiliary files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub metadata: ChartMetadata,
    /// Raw `values.yaml` of the chart; empty if the chart ships none.
    pub default_values: String,
    pub templates: Vec<BundleFile>,
    /// Non-template files, reachable from templates via `.Files.Get`.
    pub files: Vec<BundleFile>,
}

impl Bundle {
    pub fn new(metadata: ChartMetadata) -> Self {
        Self {
            metadata,
            default_values: String::new(),
            templates: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn with_default_values(mut self, values: impl Into<String>) -> Self {
        self.default_values = values.into();
        self
    }

    pub fn with_template(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.push(BundleFile::new(path, source));
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push(BundleFile::new(path, content));
        self
    }

    /// Content of a non-template file by its chart-relative path.
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_str())
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
