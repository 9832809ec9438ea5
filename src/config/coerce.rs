//! Type-directed coercions applied while decoding.
//!
//! Each helper is a `deserialize_with` function. Because [`Value`] is itself
//! a deserializer, the same functions decode top-level keys directly
//! (`coerce::duration(value)`) and nested fields through serde attributes.
//!
//! [`Value`]: crate::config::canonical::Value

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer, SeqAccess, Visitor};

use crate::config::duration::parse_duration;

/// Split a flag-style comma-joined value. The empty string is the empty list.
pub fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(',').map(str::to_owned).collect()
    }
}

/// Sequence of strings, also accepting a single comma-joined string.
pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    struct StringList;

    impl<'de> Visitor<'de> for StringList {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a sequence of strings or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(split_list(v))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(item) = seq.next_element::<String>()? {
                items.push(item);
            }
            Ok(items)
        }
    }

    deserializer.deserialize_any(StringList)
}

/// Elapsed time written as a duration literal (`"1h30m"`).
pub fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    struct DurationLiteral;

    impl<'de> Visitor<'de> for DurationLiteral {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a duration literal such as \"1h30m\"")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_duration(v).map_err(|err| E::custom(format!("invalid duration {v:?}: {err}")))
        }
    }

    deserializer.deserialize_any(DurationLiteral)
}
