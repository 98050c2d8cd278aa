//! Opaque JSON captured as an untyped [`serde_json::Value`] tree.

use lenient_core::{ScalarType, Shape, TokenKind, Value, ValueError};

use super::{Decoded, TypeAdapter};
use crate::{DecodeContext, DecodeError, EncodeContext, EncodeError, JsonReader, ReadError, Token};

/// Adapter for `JsonValue`, `JsonObject` and `JsonArray` shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAdapter;

impl TypeAdapter for PassthroughAdapter {
    fn read(&self, cx: &mut DecodeContext<'_, '_>, shape: &'static Shape) -> Result<Decoded, DecodeError> {
        let accepted = match shape.as_scalar() {
            Some(ScalarType::JsonValue) => None,
            Some(ScalarType::JsonObject) => Some(TokenKind::BeginObject),
            Some(ScalarType::JsonArray) => Some(TokenKind::BeginArray),
            _ => return Err(cx.custom_error(format_args!("`{shape}` is not opaque JSON"))),
        };

        let kind = cx.reader().peek()?;
        match accepted {
            Some(_) if kind == TokenKind::Null => {
                cx.reader().next_null()?;
                Ok(Decoded::Null)
            }
            Some(accepted) if kind != accepted => {
                cx.report(shape, kind);
                cx.reader().skip_value()?;
                Ok(Decoded::Faulted)
            }
            _ => {
                let captured = read_json_value(cx.reader())?;
                Ok(Decoded::Value(Value::Json(captured)))
            }
        }
    }

    fn write(
        &self,
        cx: &mut EncodeContext<'_>,
        shape: &'static Shape,
        value: &Value,
    ) -> Result<(), EncodeError> {
        match value {
            Value::Json(json) => cx.writer().json_value(json),
            Value::Null => cx.writer().null(),
            other => return Err(ValueError::mismatch(shape, other).into()),
        }
        Ok(())
    }
}

/// Reads one complete value as an untyped tree.
///
/// Numbers keep their literal precision where `serde_json` can represent it.
pub fn read_json_value(reader: &mut JsonReader<'_>) -> Result<serde_json::Value, ReadError> {
    Ok(match reader.next_token()? {
        Token::Null => serde_json::Value::Null,
        Token::Bool(b) => serde_json::Value::Bool(b),
        Token::String(s) => serde_json::Value::String(s.into_owned()),
        Token::Number(n) => match n.parse::<serde_json::Number>() {
            Ok(number) => serde_json::Value::Number(number),
            Err(_) => serde_json::Value::String(n.to_owned()),
        },
        Token::BeginArray => {
            let mut items = Vec::new();
            while reader.has_next()? {
                items.push(read_json_value(reader)?);
            }
            reader.end_array()?;
            serde_json::Value::Array(items)
        }
        Token::BeginObject => {
            let mut map = serde_json::Map::new();
            while reader.has_next()? {
                let name = reader.next_name()?.into_owned();
                let value = read_json_value(reader)?;
                map.insert(name, value);
            }
            reader.end_object()?;
            serde_json::Value::Object(map)
        }
        other @ (Token::Name(_) | Token::EndObject | Token::EndArray | Token::EndDocument) => {
            return Err(reader.unexpected("a value", other.kind()));
        }
    })
}
