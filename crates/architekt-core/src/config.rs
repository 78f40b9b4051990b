use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// A node's configuration: parameter id → value. Keys absent from the map are "unset".
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A single configuration value.
///
/// Enum parameters carry `Text` values constrained by the parameter's options.
/// On the wire the value is untagged, so `{"ttl": 60, "policy": "LRU"}` round-trips.
/// Any other JSON shape (booleans, null, arrays, objects) lands in `Other` and is kept
/// verbatim; no parameter kind accepts it.
#[derive(Debug, Clone, PartialEq, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

// Largest integer an f64 represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT => {
                serializer.serialize_i64(*n as i64)
            }
            ConfigValue::Number(n) => serializer.serialize_f64(*n),
            ConfigValue::Text(s) => serializer.serialize_str(s),
            ConfigValue::Other(v) => v.serialize(serializer),
        }
    }
}

impl ConfigValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Number(n) => write!(f, "{n}"),
            ConfigValue::Text(s) => f.write_str(s),
            ConfigValue::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(n: f64) -> Self {
        ConfigValue::Number(n)
    }
}

impl From<i32> for ConfigValue {
    fn from(n: i32) -> Self {
        ConfigValue::Number(f64::from(n))
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

/// The declared type of a configuration parameter.
///
/// Serialized as the `type` discriminator of `ConfigParameter`, with `options` alongside
/// for enums, matching the catalog's JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamKind {
    #[serde(rename = "string")]
    Text,
    Number,
    Enum { options: Vec<String> },
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Text => "string",
            ParamKind::Number => "number",
            ParamKind::Enum { .. } => "enum",
        }
    }

    /// Check that `value` is acceptable for a parameter of this kind.
    pub fn check(&self, key: &str, value: &ConfigValue) -> Result<(), ConfigError> {
        match (self, value) {
            (ParamKind::Text, ConfigValue::Text(_)) => Ok(()),
            (ParamKind::Number, ConfigValue::Number(n)) if n.is_finite() => Ok(()),
            (ParamKind::Number, ConfigValue::Number(n)) => Err(ConfigError::InvalidNumber {
                key: key.to_string(),
                input: n.to_string(),
            }),
            (ParamKind::Enum { options }, ConfigValue::Text(s)) => {
                if options.iter().any(|o| o == s) {
                    Ok(())
                } else {
                    Err(ConfigError::NotAnOption {
                        key: key.to_string(),
                        value: s.clone(),
                        options: options.clone(),
                    })
                }
            }
            (kind, _) => Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: kind.name(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no configuration available for component type '{component}'")]
    UnknownComponent { component: String },

    #[error("'{key}' is not a parameter of '{component}'")]
    UnknownParameter { component: String, key: String },

    #[error("'{key}' expects a {expected} value")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("'{value}' is not a valid option for '{key}' (expected one of: {})", options.join(", "))]
    NotAnOption {
        key: String,
        value: String,
        options: Vec<String>,
    },

    #[error("'{input}' is not a valid number for '{key}'")]
    InvalidNumber { key: String, input: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_serialize_as_integers() {
        let mut config = ConfigMap::new();
        config.insert("ttl".into(), ConfigValue::from(60));
        config.insert("ratio".into(), ConfigValue::from(0.5));
        config.insert("policy".into(), ConfigValue::from("LRU"));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"policy":"LRU","ratio":0.5,"ttl":60}"#);

        let back: ConfigMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn enum_kind_rejects_values_outside_options() {
        let kind = ParamKind::Enum {
            options: vec!["LRU".into(), "LFU".into()],
        };
        assert!(kind.check("policy", &"LFU".into()).is_ok());
        let err = kind.check("policy", &"MRU".into()).unwrap_err();
        assert!(err.to_string().contains("LRU, LFU"));
        assert!(matches!(
            kind.check("policy", &ConfigValue::from(3)),
            Err(ConfigError::TypeMismatch { expected: "enum", .. })
        ));
    }

    #[test]
    fn number_kind_rejects_text_and_non_finite() {
        assert!(ParamKind::Number.check("ttl", &ConfigValue::from(1)).is_ok());
        assert!(ParamKind::Number.check("ttl", &"60".into()).is_err());
        assert!(ParamKind::Number
            .check("ttl", &ConfigValue::Number(f64::NAN))
            .is_err());
    }

    #[test]
    fn other_json_shapes_are_kept_but_never_valid() {
        let config: ConfigMap =
            serde_json::from_str(r#"{"ttl": null, "flag": true, "ports": [80]}"#).unwrap();
        assert_eq!(config["flag"], ConfigValue::Other(serde_json::Value::Bool(true)));
        assert_eq!(config["flag"].as_text(), None);
        assert_eq!(config["ttl"].to_string(), "null");
        assert_eq!(
            serde_json::to_string(&config).unwrap(),
            r#"{"flag":true,"ports":[80],"ttl":null}"#
        );

        assert!(matches!(
            ParamKind::Number.check("ttl", &config["ttl"]),
            Err(ConfigError::TypeMismatch { expected: "number", .. })
        ));
        assert!(ParamKind::Text.check("flag", &config["flag"]).is_err());
    }
}
