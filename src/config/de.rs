//! serde support for the canonical tree.
//!
//! [`Value`] implements [`serde::Deserializer`] so nested records (providers,
//! their OIDC settings) can be decoded with derived `Deserialize` impls.
//! Errors are annotated with the path of the field that failed on their way
//! back up, e.g. `providers[0].oidcConfig.audienceClaims[1]`.

use std::collections::btree_map;
use std::fmt;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Unexpected,
    Visitor,
};
use thiserror::Error;

use crate::config::canonical::{Mapping, Number, Scalar, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Structural decode failure.
///
/// Always fatal: the configuration could not even be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.path, .message))]
pub struct DecodeError {
    path: Vec<Segment>,
    message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// Record that the error happened below `key`.
    pub(crate) fn at_key(mut self, key: &str) -> Self {
        self.path.insert(0, Segment::Key(key.to_owned()));
        self
    }

    /// Record that the error happened below sequence element `index`.
    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.path.insert(0, Segment::Index(index));
        self
    }

    /// Dotted path of the offending field; empty for the document root.
    pub fn path(&self) -> String {
        dotted(&self.path)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn dotted(path: &[Segment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            Segment::Key(key) if out.is_empty() => out.push_str(key),
            Segment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            Segment::Index(index) => out.push_str(&format!("[{index}]")),
        }
    }
    out
}

fn render(path: &[Segment], message: &str) -> String {
    if path.is_empty() {
        message.to_owned()
    } else {
        format!("field `{}`: {message}", dotted(path))
    }
}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::new(msg.to_string())
    }
}

/// Decode any `Deserialize` type from a canonical value.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    T::deserialize(value)
}

impl Value {
    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Null => Unexpected::Unit,
            Value::Scalar(Scalar::Bool(b)) => Unexpected::Bool(*b),
            Value::Scalar(Scalar::Number(Number::PosInt(n))) => Unexpected::Unsigned(*n),
            Value::Scalar(Scalar::Number(Number::NegInt(n))) => Unexpected::Signed(*n),
            Value::Scalar(Scalar::Number(Number::Float(n))) => Unexpected::Float(*n),
            Value::Scalar(Scalar::String(s)) => Unexpected::Str(s),
            Value::Sequence(_) => Unexpected::Seq,
            Value::Mapping(_) => Unexpected::Map,
        }
    }
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Scalar(Scalar::Bool(b)) => visitor.visit_bool(b),
            Value::Scalar(Scalar::Number(Number::PosInt(n))) => visitor.visit_u64(n),
            Value::Scalar(Scalar::Number(Number::NegInt(n))) => visitor.visit_i64(n),
            Value::Scalar(Scalar::Number(Number::Float(n))) => visitor.visit_f64(n),
            Value::Scalar(Scalar::String(s)) => visitor.visit_string(s),
            Value::Sequence(items) => visit_sequence(items, visitor),
            Value::Mapping(members) => visit_mapping(members, visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    // Only unit variants spelled as strings are supported.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self {
            Value::Scalar(Scalar::String(variant)) => {
                visitor.visit_enum(IntoDeserializer::<DecodeError>::into_deserializer(variant))
            }
            other => Err(de::Error::invalid_type(other.unexpected(), &"a variant name")),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

fn visit_sequence<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> Result<V::Value, DecodeError> {
    let len = items.len();
    let mut access = SeqDeserializer {
        iter: items.into_iter(),
        index: 0,
    };
    let out = visitor.visit_seq(&mut access)?;
    if access.iter.len() == 0 {
        Ok(out)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in sequence"))
    }
}

fn visit_mapping<'de, V: Visitor<'de>>(members: Mapping, visitor: V) -> Result<V::Value, DecodeError> {
    let mut access = MapDeserializer {
        iter: members.into_iter(),
        pending: None,
    };
    visitor.visit_map(&mut access)
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
    index: usize,
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        let Some(value) = self.iter.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(value)
            .map(Some)
            .map_err(|e| e.at_index(index))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: btree_map::IntoIter<String, Value>,
    pending: Option<(String, Value)>,
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        let decoded = seed
            .deserialize(IntoDeserializer::<DecodeError>::into_deserializer(key.as_str()))
            .map_err(|e| e.at_key(&key))?;
        self.pending = Some((key, value));
        Ok(Some(decoded))
    }

    fn next_value_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<T::Value, DecodeError> {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| DecodeError::new("mapping value requested before its key"))?;
        seed.deserialize(value).map_err(|e| e.at_key(&key))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Default)]
    #[serde(default)]
    struct Inner {
        enabled: bool,
        weight: u32,
        labels: Vec<String>,
    }

    #[derive(Debug, Deserialize, PartialEq, Default)]
    #[serde(default)]
    struct Outer {
        name: String,
        inner: Inner,
        items: Vec<Inner>,
        limit: Option<u64>,
    }

    fn doc(json: &str) -> Value {
        Value::Mapping(crate::config::canonical::from_json_slice(json.as_bytes()).unwrap())
    }

    #[test]
    fn test_decodes_nested_records() {
        let outer: Outer = from_value(doc(
            r#"{"name": "edge", "inner": {"enabled": true, "weight": 3, "labels": ["a"]}, "limit": 9, "extra": 1}"#,
        ))
        .unwrap();

        assert_eq!(outer.name, "edge");
        assert!(outer.inner.enabled);
        assert_eq!(outer.inner.weight, 3);
        assert_eq!(outer.inner.labels, vec!["a".to_string()]);
        assert_eq!(outer.limit, Some(9));
        assert!(outer.items.is_empty());
    }

    #[test]
    fn test_null_option_is_none() {
        let outer: Outer = from_value(doc(r#"{"limit": null}"#)).unwrap();
        assert_eq!(outer.limit, None);
    }

    #[test]
    fn test_error_names_nested_field() {
        let err = from_value::<Outer>(doc(r#"{"items": [{}, {"weight": "heavy"}]}"#)).unwrap_err();
        assert_eq!(err.path(), "items[1].weight");
        assert!(err.message().contains("invalid type: string \"heavy\""), "{err}");
        assert!(err.message().contains("expected u32"), "{err}");
        assert!(err.to_string().starts_with("field `items[1].weight`: "));
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        let err = from_value::<Outer>(doc(r#"{"inner": {"weight": -4}}"#)).unwrap_err();
        assert_eq!(err.path(), "inner.weight");
    }

    #[test]
    fn test_root_error_renders_bare_message() {
        let err = from_value::<Outer>(Value::bool(true)).unwrap_err();
        assert_eq!(err.path(), "");
        assert_eq!(err.to_string(), err.message());

        let nested = DecodeError::new("boom").at_index(2).at_key("providers");
        assert_eq!(nested.to_string(), "field `providers[2]`: boom");
    }

    #[test]
    fn test_unit_enum_from_string() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "lowercase")]
        enum Mode {
            Lax,
            Strict,
        }

        assert_eq!(from_value::<Mode>(Value::string("strict")).unwrap(), Mode::Strict);
        assert!(from_value::<Mode>(Value::bool(true)).is_err());
        assert!(from_value::<Mode>(Value::string("loose")).is_err());
    }
}
