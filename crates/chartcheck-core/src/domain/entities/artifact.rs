//! Rendered artifacts and their classification by component role.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::trace;

use crate::domain::{error::DomainError, value_objects::ComponentRole};

/// Output of one render: artifact path → rendered text.
///
/// Ordered by path so that classification and error reporting are stable
/// across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: BTreeMap<String, String>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact, returning the previous text if the path repeats.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) -> Option<String> {
        self.artifacts.insert(path.into(), text.into())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.artifacts.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.artifacts
            .iter()
            .map(|(path, text)| (path.as_str(), text.as_str()))
    }

    /// Pick out the artifacts that belong to a known role.
    ///
    /// Matching uses only the last path component, so
    /// `chart/templates/nested/tidb-configmap.yaml` is still the TiDB config
    /// map. Everything else is ignored.
    ///
    /// # Errors
    ///
    /// [`DomainError::DuplicateArtifact`] if two paths share a role file name.
    pub fn classify(&self) -> Result<ClassifiedArtifacts, DomainError> {
        let mut by_role = BTreeMap::new();

        for (path, text) in self.iter() {
            let Some(role) = ComponentRole::from_filename(base_name(path)) else {
                trace!(path, "ignoring unrelated artifact");
                continue;
            };

            match by_role.entry(role) {
                Entry::Vacant(slot) => {
                    slot.insert(ClassifiedArtifact {
                        path: path.to_string(),
                        text: text.to_string(),
                    });
                }
                Entry::Occupied(existing) => {
                    return Err(DomainError::DuplicateArtifact {
                        role,
                        first: existing.get().path.clone(),
                        second: path.to_string(),
                    });
                }
            }
        }

        Ok(ClassifiedArtifacts { by_role })
    }
}

impl<P, T> FromIterator<(P, T)> for ArtifactSet
where
    P: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        Self {
            artifacts: iter
                .into_iter()
                .map(|(p, t)| (p.into(), t.into()))
                .collect(),
        }
    }
}

/// An artifact matched to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedArtifact {
    pub path: String,
    pub text: String,
}

/// At most one artifact per role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedArtifacts {
    by_role: BTreeMap<ComponentRole, ClassifiedArtifact>,
}

impl ClassifiedArtifacts {
    pub fn get(&self, role: ComponentRole) -> Option<&ClassifiedArtifact> {
        self.by_role.get(&role)
    }

    pub fn len(&self) -> usize {
        self.by_role.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_role.is_empty()
    }
}

/// Last `/`-separated component, ignoring trailing separators.
fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
