//! Configuration merge logic
//!
//! Layers merge with:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins), so an obfuscator command is never spliced
//!   together from two layers
//! - Scalars: override (last wins)

use serde_json::{Map, Value};

/// Deep merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Object(Map::new()), deep_merge)
}

/// Build a nested object from a dotted path, e.g. `build.obfuscate`.
pub fn value_at_path(path: &str, value: Value) -> Value {
    path.rsplit('.').fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert(key.to_string(), inner);
        Value::Object(map)
    })
}

/// Parse a `KEY=VALUE` override into a merge layer. The value is read as JSON
/// when it parses (`true`, `0.5`, `["node", "obf.js"]`), else as a string.
pub fn parse_assignment(assignment: &str) -> Option<Value> {
    let (path, raw) = assignment.split_once('=')?;
    let path = path.trim();
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return None;
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Some(value_at_path(path, value))
}
