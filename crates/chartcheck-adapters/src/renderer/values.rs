//! Chart values: parsing and deep merge over `serde_yaml::Value`.

use serde_yaml::{Mapping, Value};

use super::engine::TemplateError;

/// Parse a values document. Blank or `null` documents are an empty mapping;
/// anything other than a mapping at the top level is rejected.
pub fn parse(text: &str, source: &str) -> Result<Value, TemplateError> {
    if text.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }

    let value: Value = serde_yaml::from_str(text).map_err(|e| TemplateError::Values {
        origin: source.to_string(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(value),
        other => Err(TemplateError::Values {
            origin: source.to_string(),
            reason: format!("expected a mapping at the top level, found {}", kind(&other)),
        }),
    }
}

/// Merge `overlay` into `base`. Mappings merge key by key; any other value in
/// `overlay` replaces the one in `base`.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        parse(text, "test").unwrap()
    }

    #[test]
    fn blank_and_null_documents_are_empty_mappings() {
        assert_eq!(yaml(""), Value::Mapping(Mapping::new()));
        assert_eq!(yaml("  \n"), Value::Mapping(Mapping::new()));
        assert_eq!(yaml("~"), Value::Mapping(Mapping::new()));
    }

    #[test]
    fn top_level_scalar_is_rejected() {
        let err = parse("- a\n- b\n", "values.yaml").unwrap_err();
        assert!(err.to_string().contains("values.yaml"));
        assert!(err.to_string().contains("sequence"));
    }

    #[test]
    fn merge_is_deep_and_overlay_wins() {
        let mut base = yaml("tidb:\n  replicas: 2\n  image: pingcap/tidb\npd:\n  replicas: 3\n");
        merge(
            &mut base,
            yaml("tidb:\n  replicas: 5\n  config: {}\ntikv:\n  replicas: 1\n"),
        );

        assert_eq!(base["tidb"]["replicas"], Value::from(5));
        assert_eq!(base["tidb"]["image"], Value::from("pingcap/tidb"));
        assert_eq!(base["pd"]["replicas"], Value::from(3));
        assert_eq!(base["tikv"]["replicas"], Value::from(1));
    }

    #[test]
    fn overlay_scalar_replaces_mapping() {
        let mut base = yaml("tidb:\n  config:\n    lease: 45s\n");
        merge(&mut base, yaml("tidb:\n  config: \"lease = 10\"\n"));
        assert_eq!(base["tidb"]["config"], Value::from("lease = 10"));
    }
}
