//! Obfuscation transform settings

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Transforms applied by the obfuscator.
///
/// Stored in config with snake_case keys; [`to_obfuscator_json`] renders the
/// camelCase option file the obfuscator reads.
///
/// [`to_obfuscator_json`]: ObfuscationOptions::to_obfuscator_json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObfuscationOptions {
    pub compact: bool,
    pub control_flow_flattening: bool,
    pub control_flow_flattening_threshold: f64,
    pub numbers_to_expressions: bool,
    pub simplify: bool,
    pub string_array: bool,
    pub string_array_encoding: Vec<String>,
    pub string_array_threshold: f64,
    pub transform_object_keys: bool,
    pub unicode_escape_sequence: bool,
}

impl Default for ObfuscationOptions {
    fn default() -> Self {
        Self {
            compact: true,
            control_flow_flattening: true,
            control_flow_flattening_threshold: 0.75,
            numbers_to_expressions: true,
            simplify: true,
            string_array: true,
            string_array_encoding: vec!["rc4".to_string()],
            string_array_threshold: 0.75,
            transform_object_keys: true,
            unicode_escape_sequence: true,
        }
    }
}

impl ObfuscationOptions {
    /// Option file contents in the obfuscator's own key names
    pub fn to_obfuscator_json(&self) -> Value {
        json!({
            "compact": self.compact,
            "controlFlowFlattening": self.control_flow_flattening,
            "controlFlowFlatteningThreshold": self.control_flow_flattening_threshold,
            "numbersToExpressions": self.numbers_to_expressions,
            "simplify": self.simplify,
            "stringArray": self.string_array,
            "stringArrayEncoding": self.string_array_encoding,
            "stringArrayThreshold": self.string_array_threshold,
            "transformObjectKeys": self.transform_object_keys,
            "unicodeEscapeSequence": self.unicode_escape_sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ObfuscationOptions::default();
        assert!(options.compact);
        assert_eq!(options.control_flow_flattening_threshold, 0.75);
        assert_eq!(options.string_array_encoding, vec!["rc4"]);
    }

    #[test]
    fn test_obfuscator_json_uses_camel_case() {
        let value = ObfuscationOptions::default().to_obfuscator_json();
        assert_eq!(value["controlFlowFlatteningThreshold"], 0.75);
        assert_eq!(value["stringArrayEncoding"][0], "rc4");
        assert_eq!(value["unicodeEscapeSequence"], true);
        assert!(value.get("string_array").is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let value = json!({"simplify": false, "string_array_threshold": 0.2});
        let options: ObfuscationOptions = serde_json::from_value(value).unwrap();
        assert!(!options.simplify);
        assert_eq!(options.string_array_threshold, 0.2);
        assert!(options.transform_object_keys);
    }
}
