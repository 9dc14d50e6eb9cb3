use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

///
/// EntityMarker
///
/// Zero-sized tag implemented by the entity families a `Key` can identify.
///

pub trait EntityMarker {}

///
/// Product
///

pub enum Product {}

impl EntityMarker for Product {}

///
/// Attribute
///

pub enum Attribute {}

impl EntityMarker for Attribute {}

/// Canonicalize a JSON id value (string or integer) to its string form.
#[must_use]
pub fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Typed key for a product row.
pub type ProductKey = Key<Product>;

/// Typed key for a shared attribute definition.
pub type AttributeKey = Key<Attribute>;

///
/// Key
///
/// Canonical string-form entity identity.
///
/// Backend payloads carry ids as either strings or numbers depending on the
/// code path; every ingress normalizes to the string form here, so equality
/// and map keying never depend on the wire representation.
///

pub struct Key<E: EntityMarker> {
    value: String,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EntityMarker> Key<E> {
    /// Construct a key from an already-canonical string form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// Canonicalize a JSON id value (string or integer) into a key.
    ///
    /// Returns `None` for nulls and non-scalar shapes; callers at ingress
    /// boundaries decide whether absence is structural or ignorable.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::new(s.as_str())),
            Value::Number(n) => Some(Self::new(n.to_string())),
            _ => None,
        }
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<E: EntityMarker> Clone for Key<E> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<E: EntityMarker> fmt::Debug for Key<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.value).finish()
    }
}

impl<E: EntityMarker> fmt::Display for Key<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<E: EntityMarker> Eq for Key<E> {}

impl<E: EntityMarker> PartialEq for Key<E> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<E: EntityMarker> Ord for Key<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<E: EntityMarker> PartialOrd for Key<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: EntityMarker> Hash for Key<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<E: EntityMarker> From<&str> for Key<E> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<E: EntityMarker> From<String> for Key<E> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<E: EntityMarker> From<u64> for Key<E> {
    fn from(value: u64) -> Self {
        Self::new(value.to_string())
    }
}

impl<E: EntityMarker> From<i64> for Key<E> {
    fn from(value: i64) -> Self {
        Self::new(value.to_string())
    }
}

impl<E: EntityMarker> Serialize for Key<E> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, E: EntityMarker> Deserialize<'de> for Key<E> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor<E: EntityMarker>(PhantomData<fn() -> E>);

        impl<E: EntityMarker> serde::de::Visitor<'_> for KeyVisitor<E> {
            type Value = Key<E>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer id")
            }

            fn visit_str<Err: serde::de::Error>(self, v: &str) -> Result<Self::Value, Err> {
                Ok(Key::new(v))
            }

            fn visit_u64<Err: serde::de::Error>(self, v: u64) -> Result<Self::Value, Err> {
                Ok(Key::from(v))
            }

            fn visit_i64<Err: serde::de::Error>(self, v: i64) -> Result<Self::Value, Err> {
                Ok(Key::from(v))
            }
        }

        deserializer.deserialize_any(KeyVisitor(PhantomData))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_and_numeric_ids_canonicalize_equal() {
        let from_str = ProductKey::from_json(&json!("7")).unwrap();
        let from_num = ProductKey::from_json(&json!(7)).unwrap();
        assert_eq!(from_str, from_num);
        assert_eq!(from_str.as_str(), "7");
    }

    #[test]
    fn null_and_empty_ids_are_rejected() {
        assert!(ProductKey::from_json(&json!(null)).is_none());
        assert!(ProductKey::from_json(&json!("")).is_none());
        assert!(ProductKey::from_json(&json!([1])).is_none());
    }

    #[test]
    fn deserializes_from_number_or_string() {
        let a: AttributeKey = serde_json::from_value(json!(3)).unwrap();
        let b: AttributeKey = serde_json::from_value(json!("3")).unwrap();
        assert_eq!(a, b);
    }
}
