//! Layer merging
//!
//! Tables merge key by key; any other value in a later layer replaces the
//! earlier one outright, arrays included.

use serde_json::Value;

/// Apply `layer` on top of `base` in place.
pub fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Fold layers in precedence order; the last layer wins.
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Value::Null;
    for layer in layers {
        overlay(&mut merged, layer);
    }
    merged
}

/// Convert a parsed TOML document into JSON for merging.
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_tables_merge_by_key() {
        let mut base = json!({"index": {"url": "a", "results_per_page": 100}});
        overlay(&mut base, json!({"index": {"url": "b"}}));
        assert_eq!(base["index"]["url"], "b");
        assert_eq!(base["index"]["results_per_page"], 100);
    }

    #[test]
    fn test_arrays_and_scalars_replace() {
        let merged = merge_layers([
            json!({"peers": ["a", "b"], "network": "mainnet"}),
            json!({"peers": ["c"], "network": "testnet"}),
        ]);
        assert_eq!(merged["peers"], json!(["c"]));
        assert_eq!(merged["network"], "testnet");
    }

    #[test]
    fn test_empty_layers() {
        assert_eq!(merge_layers(Vec::new()), Value::Null);
    }

    #[test]
    fn test_toml_conversion() {
        let parsed: toml::Value = toml::from_str("a = 1\n[b]\nc = [true, 1.5]").unwrap();
        assert_eq!(toml_to_json(parsed), json!({"a": 1, "b": {"c": [true, 1.5]}}));
    }
}
