use lenient_core::{FaultSite, Shape, StructValue, TokenKind, Value, ValueError};

use super::{Decoded, TypeAdapter};
use crate::{DecodeContext, DecodeError, EncodeContext, EncodeError};

/// Adapter for struct shapes.
///
/// Reading starts from a fully populated instance and overwrites the slots of
/// the fields present in the document. Unknown properties are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectAdapter;

impl TypeAdapter for ObjectAdapter {
    fn read(&self, cx: &mut DecodeContext<'_, '_>, shape: &'static Shape) -> Result<Decoded, DecodeError> {
        match cx.reader().peek()? {
            TokenKind::BeginObject => {}
            TokenKind::Null => {
                cx.reader().next_null()?;
                return Ok(Decoded::Null);
            }
            other => {
                cx.report(shape, other);
                cx.reader().skip_value()?;
                return Ok(Decoded::Faulted);
            }
        }

        let instance = cx.obtain_instance(shape)?;
        let instance = read_fields(cx, shape, instance)?;
        Ok(Decoded::Value(Value::Struct(instance)))
    }

    fn write(
        &self,
        cx: &mut EncodeContext<'_>,
        shape: &'static Shape,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let instance = match value {
            Value::Struct(instance) => instance,
            Value::Null => {
                cx.writer().null();
                return Ok(());
            }
            other => return Err(ValueError::mismatch(shape, other).into()),
        };

        let binding = cx.binding(shape)?;
        let serialize_nulls = cx.serialize_nulls();

        cx.writer().begin_object();
        for bound in binding.writable() {
            let value = instance.fields().get(bound.index).unwrap_or(&Value::Null);
            if value.is_null() && !serialize_nulls {
                continue;
            }
            cx.writer().name(&bound.wire_name);
            cx.write_value(bound.field.shape(), value)?;
        }
        cx.writer().end_object();
        Ok(())
    }
}

/// Reads the object at the reader position into `instance`.
///
/// The reader must be positioned on `{`.
pub(crate) fn read_fields(
    cx: &mut DecodeContext<'_, '_>,
    shape: &'static Shape,
    mut instance: StructValue,
) -> Result<StructValue, DecodeError> {
    let binding = cx.binding(shape)?;

    cx.reader().begin_object()?;
    while cx.reader().has_next()? {
        let name = cx.reader().next_name()?;
        let Some(bound) = binding.lookup(&name).filter(|bound| bound.read) else {
            tracing::trace!(shape = %shape, name = %name, "skipping unknown property");
            cx.reader().skip_value()?;
            continue;
        };

        let field = bound.field;
        let decoded = cx.with_site(shape, Some(field.name), FaultSite::Field, |cx| {
            cx.read_value(field.shape())
        })?;
        if let Decoded::Value(value) = decoded {
            instance.set(bound.index, value);
        }
    }
    cx.reader().end_object()?;

    Ok(instance)
}
