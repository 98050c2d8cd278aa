//! Dynamic instances produced by the decoder.

use core::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::{Def, Shape, ValueError};

/// An instance of some [`Shape`], as a tree of owned values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value of a nullable shape.
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// Arbitrary-precision decimal.
    Decimal(Decimal),
    /// UTF-8 string.
    String(String),
    /// Opaque JSON captured verbatim.
    Json(serde_json::Value),
    /// Ordered collection.
    List(Vec<Value>),
    /// Map with JSON-string keys, in document order.
    Map(IndexMap<String, Value>),
    /// Struct with one slot per declared field.
    Struct(StructValue),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Json(_) => "json",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the list, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrows the map, if this is a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Borrows the struct, if this is a struct.
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Unwraps a struct of the given shape into its field slots.
    pub fn into_struct_fields(self, shape: &'static Shape) -> Result<Vec<Value>, ValueError> {
        let Def::Struct(def) = &shape.def else {
            return Err(ValueError::mismatch(shape, &self));
        };
        match self {
            Value::Struct(s) if s.fields.len() == def.fields.len() => Ok(s.fields),
            other => Err(ValueError::mismatch(shape, &other)),
        }
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

/// A struct instance: the shape it belongs to and one value per field.
#[derive(Clone)]
pub struct StructValue {
    shape: &'static Shape,
    fields: Vec<Value>,
}

impl StructValue {
    /// Creates a struct value. `fields` must follow declaration order.
    pub fn new(shape: &'static Shape, fields: Vec<Value>) -> Self {
        Self { shape, fields }
    }

    /// The shape this instance belongs to.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Field slots in declaration order.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Consumes the instance, returning its field slots.
    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    /// Looks up a field by declared name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.shape.as_struct()?.field_index(name)?;
        self.fields.get(index)
    }

    /// Replaces the slot at `index`.
    ///
    /// Returns the previous value, or `None` if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: Value) -> Option<Value> {
        let slot = self.fields.get_mut(index)?;
        Some(core::mem::replace(slot, value))
    }

    /// Whether this instance has one slot per declared field of its shape.
    pub fn is_complete(&self) -> bool {
        self.shape
            .as_struct()
            .is_some_and(|def| def.fields.len() == self.fields.len())
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.shape.type_identifier == other.shape.type_identifier && self.fields == other.fields
    }
}

impl fmt::Debug for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.shape.type_identifier);
        match self.shape.as_struct() {
            Some(def) => {
                for (field, value) in def.fields.iter().zip(&self.fields) {
                    s.field(field.name, value);
                }
            }
            None => {
                s.field("fields", &self.fields);
            }
        }
        s.finish()
    }
}
