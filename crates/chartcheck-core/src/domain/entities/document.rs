//! Config map documents and extraction of embedded config text.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::{
    entities::artifact::ClassifiedArtifact, error::DomainError, value_objects::ComponentRole,
};

/// Object metadata of a config map. Only informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// A decoded `ConfigMap`-shaped document.
///
/// Unknown top-level keys are accepted; a missing `data` section is an empty
/// one. Every `data` value must be a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapDocument {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl ConfigMapDocument {
    /// Decode the first YAML document of rendered text.
    ///
    /// Later documents are ignored, so a render ending in `---` is fine.
    /// Blank text decodes to an empty document, which is what a template
    /// wrapped entirely in a false conditional renders to.
    pub fn decode(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let Some(first) = serde_yaml::Deserializer::from_str(text).next() else {
            return Ok(Self::default());
        };
        // An explicit null document (`---` alone, `~`) is empty too.
        let doc = Option::<Self>::deserialize(first)?;
        Ok(doc.unwrap_or_default())
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// Decode a classified artifact and pull out the role's raw config text.
///
/// `Ok(None)` means the document is well-formed but carries no config
/// field; the required/optional policy is applied later.
///
/// # Errors
///
/// [`DomainError::MalformedArtifact`] when the text is not a config map.
pub fn extract_config(
    role: ComponentRole,
    artifact: &ClassifiedArtifact,
) -> Result<Option<String>, DomainError> {
    let document =
        ConfigMapDocument::decode(&artifact.text).map_err(|e| DomainError::MalformedArtifact {
            role,
            path: artifact.path.clone(),
            reason: e.to_string(),
        })?;

    Ok(document.field(role.config_field()).map(str::to_string))
}
