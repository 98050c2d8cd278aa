//! Typed access to shapes and values.
//!
//! [`Describe`] ties a Rust type to its [`Shape`] and converts between the type
//! and the dynamic [`Value`] the decoder works with. Primitive, container and
//! JSON passthrough types are covered here; structs get their implementation
//! from the [`describe!`](crate::describe) macro or by hand.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::{ScalarType, Shape, Value, ValueError};

/// A Rust type with a static shape.
pub trait Describe: Sized {
    /// The shape decoded into and encoded from.
    const SHAPE: &'static Shape;

    /// Seals a decoded value into the Rust type.
    fn from_value(value: Value) -> Result<Self, ValueError>;

    /// Converts the Rust value into its dynamic form.
    fn to_value(&self) -> Value;
}

/// Returns `T::SHAPE`. Usable wherever a [`ShapeRef`](crate::ShapeRef) is expected.
pub fn shape_of<T: Describe>() -> &'static Shape {
    T::SHAPE
}

/// Types usable as map keys. Keys always travel as JSON strings.
pub trait MapKey: Describe {
    /// Parses a key from its JSON string form.
    fn from_key(key: &str) -> Option<Self>;

    /// Renders the key in its JSON string form.
    fn to_key(&self) -> String;
}

macro_rules! scalar {
    ($ty:ty, $ident:literal, $scalar:ident, $variant:ident) => {
        impl Describe for $ty {
            const SHAPE: &'static Shape = &const { Shape::scalar($ident, ScalarType::$scalar) };

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(ValueError::mismatch(Self::SHAPE, &other)),
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }
    };
}

scalar!(String, "String", String, String);
scalar!(bool, "bool", Bool, Bool);
scalar!(Decimal, "Decimal", Decimal, Decimal);

impl Describe for i32 {
    const SHAPE: &'static Shape = &const { Shape::scalar("i32", ScalarType::I32) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::I32(v) => Ok(v),
            Value::I64(v) => i32::try_from(v).map_err(|_| ValueError::mismatch(Self::SHAPE, &value)),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::I32(*self)
    }
}

impl Describe for i64 {
    const SHAPE: &'static Shape = &const { Shape::scalar("i64", ScalarType::I64) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::I64(v) => Ok(v),
            Value::I32(v) => Ok(v.into()),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::I64(*self)
    }
}

impl Describe for f32 {
    const SHAPE: &'static Shape = &const { Shape::scalar("f32", ScalarType::F32) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::F32(v) => Ok(v),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::F32(*self)
    }
}

impl Describe for f64 {
    const SHAPE: &'static Shape = &const { Shape::scalar("f64", ScalarType::F64) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::F64(v) => Ok(v),
            Value::F32(v) => Ok(v.into()),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::F64(*self)
    }
}

impl Describe for serde_json::Value {
    const SHAPE: &'static Shape = &const { Shape::scalar("JsonValue", ScalarType::JsonValue) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl Describe for serde_json::Map<String, serde_json::Value> {
    const SHAPE: &'static Shape = &const { Shape::scalar("JsonObject", ScalarType::JsonObject) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(serde_json::Value::Object(map)) => Ok(map),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Json(serde_json::Value::Object(self.clone()))
    }
}

/// An opaque JSON array, captured verbatim.
///
/// Unlike `Vec<serde_json::Value>`, which is decoded element by element, this
/// type keeps the array as one untyped tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonArray(pub Vec<serde_json::Value>);

impl Describe for JsonArray {
    const SHAPE: &'static Shape = &const { Shape::scalar("JsonArray", ScalarType::JsonArray) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(serde_json::Value::Array(items)) => Ok(JsonArray(items)),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Json(serde_json::Value::Array(self.0.clone()))
    }
}

impl<T: Describe> Describe for Option<T> {
    const SHAPE: &'static Shape = &const { Shape::option(shape_of::<T>) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: Describe> Describe for Vec<T> {
    const SHAPE: &'static Shape = &const { Shape::list("Vec", shape_of::<T>) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::mismatch(Self::SHAPE, &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Describe::to_value).collect())
    }
}

fn map_entries<K: MapKey, V: Describe>(
    shape: &'static Shape,
    value: Value,
) -> Result<impl Iterator<Item = Result<(K, V), ValueError>>, ValueError> {
    let Value::Map(entries) = value else {
        return Err(ValueError::mismatch(shape, &value));
    };
    Ok(entries.into_iter().map(move |(key, value)| {
        let parsed = K::from_key(&key).ok_or_else(|| ValueError {
            expected: K::SHAPE.to_string(),
            found: "string",
            context: None,
        })?;
        Ok((parsed, V::from_value(value)?))
    }))
}

impl<K, V, S> Describe for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Describe,
    S: BuildHasher + Default,
{
    const SHAPE: &'static Shape = &const { Shape::map("HashMap", shape_of::<K>, shape_of::<V>) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(Self::SHAPE, value)?.collect()
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_key(), v.to_value())).collect())
    }
}

impl<K, V> Describe for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Describe,
{
    const SHAPE: &'static Shape = &const { Shape::map("BTreeMap", shape_of::<K>, shape_of::<V>) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(Self::SHAPE, value)?.collect()
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_key(), v.to_value())).collect())
    }
}

impl<K, V, S> Describe for IndexMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Describe,
    S: BuildHasher + Default,
{
    const SHAPE: &'static Shape = &const { Shape::map("IndexMap", shape_of::<K>, shape_of::<V>) };

    fn from_value(value: Value) -> Result<Self, ValueError> {
        map_entries(Self::SHAPE, value)?.collect()
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_key(), v.to_value())).collect())
    }
}

impl MapKey for String {
    fn from_key(key: &str) -> Option<Self> {
        Some(key.to_owned())
    }

    fn to_key(&self) -> String {
        self.clone()
    }
}

impl MapKey for i32 {
    fn from_key(key: &str) -> Option<Self> {
        key.trim().parse().ok()
    }

    fn to_key(&self) -> String {
        self.to_string()
    }
}

impl MapKey for i64 {
    fn from_key(key: &str) -> Option<Self> {
        key.trim().parse().ok()
    }

    fn to_key(&self) -> String {
        self.to_string()
    }
}

impl MapKey for bool {
    fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn to_key(&self) -> String {
        self.to_string()
    }
}

/// Takes the next field slot while sealing a struct. Used by [`describe!`](crate::describe).
#[doc(hidden)]
pub fn take_field<T: Describe>(
    slots: &mut impl Iterator<Item = Value>,
    name: &'static str,
) -> Result<T, ValueError> {
    let value = slots.next().unwrap_or(Value::Null);
    T::from_value(value).map_err(|e| e.in_field(name))
}

/// Takes the next constructor argument. Used by [`describe!`](crate::describe).
#[doc(hidden)]
pub fn take_arg<T: Describe>(
    args: &mut impl Iterator<Item = Value>,
    name: &'static str,
) -> Result<T, String> {
    take_field(args, name).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_conversions() {
        assert_eq!(i64::from_value(Value::I32(-4)), Ok(-4));
        assert_eq!(f64::from_value(Value::F32(1.5)), Ok(1.5));
        assert_eq!(i32::from_value(Value::I64(7)), Ok(7));
        assert!(i32::from_value(Value::I64(i64::MAX)).is_err());
    }

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(<Option<String>>::from_value(Value::Null), Ok(None));
        assert_eq!(
            <Option<String>>::from_value(Value::String("x".into())),
            Ok(Some("x".to_string()))
        );
        assert_eq!(None::<i32>.to_value(), Value::Null);
    }

    #[test]
    fn map_keys_are_parsed_from_strings() {
        let mut entries = IndexMap::new();
        entries.insert("1".to_string(), Value::String("one".into()));
        entries.insert("2".to_string(), Value::String("two".into()));
        let map = BTreeMap::<i32, String>::from_value(Value::Map(entries)).unwrap();
        assert_eq!(map.get(&2).map(String::as_str), Some("two"));

        let round = map.to_value();
        assert_eq!(round.as_map().map(|m| m.len()), Some(2));
    }

    #[test]
    fn bad_map_key_is_an_error() {
        let mut entries = IndexMap::new();
        entries.insert("x".to_string(), Value::I32(1));
        let err = HashMap::<i64, i32>::from_value(Value::Map(entries)).unwrap_err();
        assert_eq!(err.expected, "i64");
    }
}
