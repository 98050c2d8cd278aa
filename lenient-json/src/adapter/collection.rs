//! Lists, maps and nullable wrappers.
//!
//! Every element is decoded on its own: a faulty element is reported with its
//! index or key and replaced by the element default, and the rest of the
//! container is still read.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use indexmap::IndexMap;
use lenient_core::{Def, FaultSite, ScalarType, Shape, TokenKind, Value, ValueError};

use super::scalar::coerce;
use super::{Decoded, TypeAdapter};
use crate::{DecodeContext, DecodeError, EncodeContext, EncodeError, Token};

/// Adapter for list shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListAdapter;

impl TypeAdapter for ListAdapter {
    fn read(&self, cx: &mut DecodeContext<'_, '_>, shape: &'static Shape) -> Result<Decoded, DecodeError> {
        let Def::List(list) = shape.def else {
            return Err(cx.custom_error(format_args!("`{shape}` is not a list")));
        };

        match cx.reader().peek()? {
            TokenKind::BeginArray => {}
            TokenKind::Null => {
                cx.reader().next_null()?;
                return Ok(Decoded::Value(Value::List(Vec::new())));
            }
            other => {
                cx.report(shape, other);
                cx.reader().skip_value()?;
                return Ok(Decoded::Value(Value::List(Vec::new())));
            }
        }

        let item = list.item();
        let field = cx.current_field();
        let mut items = Vec::new();

        cx.reader().begin_array()?;
        while cx.reader().has_next()? {
            let site = FaultSite::ListItem { index: items.len() };
            let decoded = cx.with_site(shape, field, site, |cx| cx.read_value(item))?;
            let value = match decoded {
                Decoded::Value(value) => value,
                Decoded::Null | Decoded::Faulted => cx.default_for(item)?,
            };
            items.push(value);
        }
        cx.reader().end_array()?;

        Ok(Decoded::Value(Value::List(items)))
    }

    fn write(
        &self,
        cx: &mut EncodeContext<'_>,
        shape: &'static Shape,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let Def::List(list) = shape.def else {
            return Err(ValueError::mismatch(shape, value).into());
        };
        match value {
            Value::List(items) => {
                let item = list.item();
                cx.writer().begin_array();
                for value in items {
                    cx.write_value(item, value)?;
                }
                cx.writer().end_array();
                Ok(())
            }
            Value::Null => {
                cx.writer().null();
                Ok(())
            }
            other => Err(ValueError::mismatch(shape, other).into()),
        }
    }
}

/// Adapter for map shapes. Keys travel as JSON property names.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapAdapter;

impl TypeAdapter for MapAdapter {
    fn read(&self, cx: &mut DecodeContext<'_, '_>, shape: &'static Shape) -> Result<Decoded, DecodeError> {
        let Def::Map(map) = shape.def else {
            return Err(cx.custom_error(format_args!("`{shape}` is not a map")));
        };

        match cx.reader().peek()? {
            TokenKind::BeginObject => {}
            TokenKind::Null => {
                cx.reader().next_null()?;
                return Ok(Decoded::Value(Value::Map(IndexMap::new())));
            }
            other => {
                cx.report(shape, other);
                cx.reader().skip_value()?;
                return Ok(Decoded::Value(Value::Map(IndexMap::new())));
            }
        }

        let (key_shape, value_shape) = (map.key(), map.value());
        let field = cx.current_field();
        let mut entries = IndexMap::new();

        cx.reader().begin_object()?;
        while cx.reader().has_next()? {
            let raw = cx.reader().next_name()?;
            let site = FaultSite::MapEntry {
                key: raw.to_string(),
            };

            let Some(key) = canonical_key(key_shape, &raw) else {
                cx.with_site(shape, field, site, |cx| {
                    cx.report(key_shape, TokenKind::Name);
                    Ok(())
                })?;
                cx.reader().skip_value()?;
                continue;
            };

            let decoded = cx.with_site(shape, field, site, |cx| cx.read_value(value_shape))?;
            let value = match decoded {
                Decoded::Value(value) => value,
                Decoded::Null | Decoded::Faulted => cx.default_for(value_shape)?,
            };
            entries.insert(key, value);
        }
        cx.reader().end_object()?;

        Ok(Decoded::Value(Value::Map(entries)))
    }

    fn write(
        &self,
        cx: &mut EncodeContext<'_>,
        shape: &'static Shape,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let Def::Map(map) = shape.def else {
            return Err(ValueError::mismatch(shape, value).into());
        };
        match value {
            Value::Map(entries) => {
                let value_shape = map.value();
                cx.writer().begin_object();
                for (key, value) in entries {
                    cx.writer().name(key);
                    cx.write_value(value_shape, value)?;
                }
                cx.writer().end_object();
                Ok(())
            }
            Value::Null => {
                cx.writer().null();
                Ok(())
            }
            other => Err(ValueError::mismatch(shape, other).into()),
        }
    }
}

/// Normalizes a JSON property name into the key form of `key_shape`.
///
/// `"1"` becomes `"true"` for boolean keys and `" 7"` becomes `"7"` for
/// integer keys. Returns `None` if the name cannot be coerced.
fn canonical_key(key_shape: &Shape, raw: &str) -> Option<String> {
    let scalar = match key_shape.as_scalar() {
        None | Some(ScalarType::String) => return Some(raw.to_string()),
        Some(scalar) => scalar,
    };
    match coerce(scalar, Token::String(Cow::Borrowed(raw)))? {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::I32(n) => Some(n.to_string()),
        Value::I64(n) => Some(n.to_string()),
        Value::F32(f) => Some(f.to_string()),
        Value::F64(f) => Some(f.to_string()),
        Value::Decimal(d) => Some(d.to_string()),
        _ => None,
    }
}

/// Adapter for `Option<T>`: `null` is `None`, anything else is read as `T`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionAdapter;

impl TypeAdapter for OptionAdapter {
    fn read(&self, cx: &mut DecodeContext<'_, '_>, shape: &'static Shape) -> Result<Decoded, DecodeError> {
        let Def::Option(option) = shape.def else {
            return Err(cx.custom_error(format_args!("`{shape}` is not an option")));
        };

        if cx.reader().peek()? == TokenKind::Null {
            cx.reader().next_null()?;
            return Ok(Decoded::Value(Value::Null));
        }
        cx.read_value(option.inner())
    }

    fn write(
        &self,
        cx: &mut EncodeContext<'_>,
        shape: &'static Shape,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let Def::Option(option) = shape.def else {
            return Err(ValueError::mismatch(shape, value).into());
        };
        match value {
            Value::Null => {
                cx.writer().null();
                Ok(())
            }
            other => cx.write_value(option.inner(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lenient_core::Describe;

    #[test]
    fn keys_are_normalized_per_shape() {
        assert_eq!(canonical_key(String::SHAPE, " a "), Some(" a ".to_string()));
        assert_eq!(canonical_key(i32::SHAPE, " 7"), Some("7".to_string()));
        assert_eq!(canonical_key(i32::SHAPE, "seven"), None);
        assert_eq!(canonical_key(bool::SHAPE, "1"), Some("true".to_string()));
        assert_eq!(canonical_key(bool::SHAPE, "FALSE"), Some("false".to_string()));
        assert_eq!(canonical_key(i64::SHAPE, "1.5"), None);
    }
}
