//! Filesystem-based chart loader.
//!
//! Reads an unpacked chart directory into a domain [`Bundle`].
//!
//! # Directory layout expected
//!
//! ```text
//! tidb-cluster/
//! ├── Chart.yaml               ← metadata (required)
//! ├── values.yaml              ← default values (optional)
//! ├── config/
//! │   ├── _tidb-config.tpl     ← reachable via .Files.Get
//! │   └── _pd-config.tpl
//! └── templates/
//!     ├── tidb-configmap.yaml  ← rendered
//!     ├── pd-configmap.yaml
//!     └── _helpers.tpl         ← partial, not rendered
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use chartcheck_core::{
    application::{ApplicationError, ports::BundleLoader},
    domain::{Bundle, ChartMetadata},
    error::CheckResult,
};

const CHART_FILE: &str = "Chart.yaml";
const VALUES_FILE: &str = "values.yaml";
const TEMPLATES_DIR: &str = "templates/";

/// Loads a [`Bundle`] from a chart directory.
///
/// The identifier is tried as a path first. When it does not exist and a
/// search root is configured, it is looked up under that root.
///
/// # Example
///
/// ```no_run
/// use chartcheck_adapters::DirectoryBundleLoader;
/// use chartcheck_core::application::ports::BundleLoader;
///
/// let loader = DirectoryBundleLoader::new().with_search_root("./charts");
/// let bundle = loader.load("tidb-cluster")?;
/// println!("Loaded {} templates", bundle.templates.len());
/// # Ok::<(), chartcheck_core::error::CheckError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DirectoryBundleLoader {
    search_root: Option<PathBuf>,
}

impl DirectoryBundleLoader {
    /// Create a loader that resolves identifiers as paths only.
    pub fn new() -> Self {
        Self { search_root: None }
    }

    /// Also resolve identifiers relative to `root`.
    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_root = Some(root.into());
        self
    }

    fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        let direct = PathBuf::from(identifier);
        if direct.is_dir() {
            return Some(direct);
        }
        self.search_root
            .as_ref()
            .map(|root| root.join(identifier))
            .filter(|candidate| candidate.is_dir())
    }

    fn load_from_dir(&self, dir: &Path) -> Result<Bundle, String> {
        let chart_path = dir.join(CHART_FILE);
        if !chart_path.is_file() {
            return Err(format!("missing {CHART_FILE} in '{}'", dir.display()));
        }

        let raw = fs::read_to_string(&chart_path)
            .map_err(|e| format!("failed to read '{}': {e}", chart_path.display()))?;
        let metadata: ChartMetadata = serde_yaml::from_str(&raw)
            .map_err(|e| format!("failed to parse '{}': {e}", chart_path.display()))?;

        let mut bundle = Bundle::new(metadata);

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = entry.map_err(|e| format!("directory walk error: {e}"))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = entry.path().strip_prefix(dir).map_err(|_| {
                format!(
                    "failed to relativise '{}' against '{}'",
                    entry.path().display(),
                    dir.display()
                )
            })?;
            let rel = normalize_path(&rel.to_string_lossy());

            if rel == CHART_FILE {
                continue;
            }

            let content = match fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) if rel.starts_with(TEMPLATES_DIR) || rel == VALUES_FILE => {
                    return Err(format!("failed to read '{rel}': {e}"));
                }
                Err(e) => {
                    warn!(file = %rel, error = %e, "skipping unreadable chart file");
                    continue;
                }
            };

            bundle = if rel == VALUES_FILE {
                bundle.with_default_values(content)
            } else if rel.starts_with(TEMPLATES_DIR) {
                bundle.with_template(rel, content)
            } else {
                bundle.with_file(rel, content)
            };
        }

        Ok(bundle)
    }
}

impl BundleLoader for DirectoryBundleLoader {
    #[instrument(skip(self))]
    fn load(&self, identifier: &str) -> CheckResult<Bundle> {
        let load_error = |reason: String| ApplicationError::BundleLoad {
            identifier: identifier.to_string(),
            reason,
        };

        let dir = self.resolve(identifier).ok_or_else(|| {
            let searched = match &self.search_root {
                Some(root) => format!(" (also searched {})", root.display()),
                None => String::new(),
            };
            load_error(format!("no chart directory found{searched}"))
        })?;

        let bundle = self.load_from_dir(&dir).map_err(load_error)?;

        debug!(
            chart = %bundle.name(),
            version = %bundle.metadata.version,
            templates = bundle.templates.len(),
            files = bundle.files.len(),
            "loaded chart"
        );
        Ok(bundle)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Normalise a filesystem path to forward slashes so Windows and Unix paths
/// compare identically.
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
