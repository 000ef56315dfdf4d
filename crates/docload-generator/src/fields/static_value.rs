//! YAML literal to [`Value`] conversion.

use docload_core::Value;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;

/// Convert a YAML literal from a benchmark file into a field value.
///
/// Integers that fit 32 bits become `Int32`, wider ones `Int64`.
pub fn yaml_to_value(yaml: &YamlValue) -> Value {
    match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Value::Int64(i), Value::Int32)
            } else if let Some(f) = n.as_f64() {
                Value::Double(f)
            } else {
                Value::String(n.to_string())
            }
        }
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(arr) => Value::Array(arr.iter().map(yaml_to_value).collect()),
        YamlValue::Mapping(map) => {
            let values: BTreeMap<String, Value> = map
                .iter()
                .filter_map(|(k, v)| Some((k.as_str()?.to_string(), yaml_to_value(v))))
                .collect();
            Value::Object(values)
        }
        YamlValue::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_scalars() {
        assert_eq!(yaml_to_value(&YamlValue::Null), Value::Null);
        assert_eq!(yaml_to_value(&YamlValue::Bool(true)), Value::Bool(true));
        assert_eq!(yaml_to_value(&serde_yaml::from_str("42").unwrap()), Value::Int32(42));
        assert_eq!(
            yaml_to_value(&serde_yaml::from_str("10000000000").unwrap()),
            Value::Int64(10_000_000_000)
        );
        assert_eq!(yaml_to_value(&serde_yaml::from_str("2.5").unwrap()), Value::Double(2.5));
        assert_eq!(yaml_to_value(&serde_yaml::from_str("hi").unwrap()), Value::from("hi"));
    }

    #[test]
    fn test_yaml_nested() {
        let yaml: YamlValue = serde_yaml::from_str("{tags: [a, b], size: {w: 1}}").unwrap();
        let Value::Object(map) = yaml_to_value(&yaml) else {
            panic!("Expected object");
        };
        assert_eq!(map["tags"], Value::from(vec!["a", "b"]));
        assert_eq!(
            map["size"],
            Value::Object(BTreeMap::from([("w".to_string(), Value::Int32(1))]))
        );
    }
}
