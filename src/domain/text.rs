//! Serde adapters for optional strings where the empty string means "absent".

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Deserializer, Serializer};

/// Converts a string into `Some` only when it has content.
pub fn non_empty(value: impl Into<String>) -> Option<NonEmptyString> {
    NonEmptyString::new(value.into()).ok()
}

pub mod optional {
    use super::{Deserialize, Deserializer, NonEmptyString, Serializer, non_empty};

    pub fn serialize<S>(value: &Option<NonEmptyString>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_some(value.as_str()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NonEmptyString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.and_then(non_empty))
    }
}
