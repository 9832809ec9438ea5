//! Canonical configuration tree.
//!
//! Raw configuration documents are converted exactly once into [`Value`].
//! The decoder only ever sees this tree, never a JSON library type, so the
//! parsing library can change without touching the schema or the coercions.

use std::collections::BTreeMap;

use thiserror::Error;

/// String-keyed mapping node. Key order carries no meaning.
pub type Mapping = BTreeMap<String, Value>;

/// One node of the canonical tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

/// Leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

/// Numeric leaf. Integers keep their exact value; everything else is a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    PosInt(u64),
    NegInt(i64),
    Float(f64),
}

/// Errors raised while turning raw bytes into a canonical mapping.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The document is not well-formed JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed, but its root is not an object.
    #[error("configuration document must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Value::Scalar(Scalar::Bool(value))
    }

    /// Sequence of string scalars.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Sequence(items.into_iter().map(Value::string).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(Scalar::Bool(_)) => "boolean",
            Value::Scalar(Scalar::Number(_)) => "number",
            Value::Scalar(Scalar::String(_)) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl From<serde_json::Number> for Number {
    fn from(number: serde_json::Number) -> Self {
        if let Some(n) = number.as_u64() {
            Number::PosInt(n)
        } else if let Some(n) = number.as_i64() {
            Number::NegInt(n)
        } else {
            Number::Float(number.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            Json::Number(n) => Value::Scalar(Scalar::Number(n.into())),
            Json::String(s) => Value::Scalar(Scalar::String(s)),
            Json::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Json::Object(members) => Value::Mapping(
                members
                    .into_iter()
                    .map(|(key, member)| (key, Value::from(member)))
                    .collect(),
            ),
        }
    }
}

/// Parse a JSON document and convert it into a top-level canonical mapping.
///
/// Duplicate object keys resolve to the last occurrence.
pub fn from_json_slice(bytes: &[u8]) -> Result<Mapping, ConvertError> {
    let document: serde_json::Value = serde_json::from_slice(bytes)?;
    match Value::from(document) {
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(ConvertError::NotAnObject(other.kind())),
    }
}

/// Replace entries of `base` with every entry of `overlay`.
///
/// Replacement is per top-level key; nested mappings are not merged.
pub fn overlay(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_document_converts() {
        let doc = br#"{
            "proxy_prefix": "/auth",
            "reverse_proxy": true,
            "cookie_expire": "1h",
            "providers": [{"clientID": "abc", "oidcConfig": {"audienceClaims": ["aud", "azp"]}}],
            "nothing": null,
            "ratio": -1.5,
            "port": 8080
        }"#;

        let mapping = from_json_slice(doc).unwrap();
        assert_eq!(mapping["proxy_prefix"], Value::string("/auth"));
        assert_eq!(mapping["reverse_proxy"], Value::bool(true));
        assert_eq!(mapping["nothing"], Value::Null);
        assert_eq!(mapping["ratio"], Value::Scalar(Scalar::Number(Number::Float(-1.5))));
        assert_eq!(mapping["port"], Value::Scalar(Scalar::Number(Number::PosInt(8080))));

        let Value::Sequence(providers) = &mapping["providers"] else {
            panic!("providers should be a sequence");
        };
        let Value::Mapping(provider) = &providers[0] else {
            panic!("provider should be a mapping");
        };
        assert_eq!(provider["clientID"], Value::string("abc"));
        let Value::Mapping(oidc) = &provider["oidcConfig"] else {
            panic!("oidcConfig should be a mapping");
        };
        assert_eq!(oidc["audienceClaims"], Value::strings(["aud", "azp"]));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let mapping = from_json_slice(br#"{"cookie_name": "first", "cookie_name": "second"}"#).unwrap();
        assert_eq!(mapping["cookie_name"], Value::string("second"));
    }

    #[test]
    fn test_malformed_json_fails() {
        let err = from_json_slice(br#"{"cookie_name": "#).unwrap_err();
        assert!(matches!(err, ConvertError::Json(_)));
    }

    #[test]
    fn test_non_object_root_rejected() {
        let err = from_json_slice(b"[1, 2]").unwrap_err();
        assert!(matches!(err, ConvertError::NotAnObject("sequence")));
    }

    #[test]
    fn test_overlay_replaces_top_level_keys() {
        let mut base = from_json_slice(br#"{"a": "1", "b": ["x"]}"#).unwrap();
        let mut top = Mapping::new();
        top.insert("b".into(), Value::strings(["y", "z"]));
        top.insert("c".into(), Value::bool(false));

        overlay(&mut base, top);
        assert_eq!(base["a"], Value::string("1"));
        assert_eq!(base["b"], Value::strings(["y", "z"]));
        assert_eq!(base["c"], Value::bool(false));
    }
}
