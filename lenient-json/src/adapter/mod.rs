//! Type adapters: the per-shape read and write logic.
//!
//! Built-in adapters cover every [`Def`] variant. A [`TypeAdapter`] registered
//! on the configuration for a type identifier replaces the built-in one.

use lenient_core::{Def, Shape, Value};

use crate::{DecodeContext, DecodeError, EncodeContext, EncodeError};

mod collection;
pub use collection::{ListAdapter, MapAdapter, OptionAdapter};

mod object;
pub use object::ObjectAdapter;
pub(crate) use object::read_fields;

mod passthrough;
pub use passthrough::{PassthroughAdapter, read_json_value};

mod scalar;
pub use scalar::ScalarAdapter;

/// Outcome of reading one JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A value of the requested shape.
    Value(Value),
    /// JSON `null` on a shape with no null value. Nothing was reported.
    Null,
    /// The value could not be coerced. The fault was reported and the value
    /// consumed; the caller keeps its default.
    Faulted,
}

/// Reads and writes values of a shape.
///
/// `read` must consume exactly one JSON value. Coercion problems are reported
/// through [`DecodeContext::report`] and answered with [`Decoded::Faulted`];
/// an `Err` aborts the whole decode.
pub trait TypeAdapter: Send + Sync {
    /// Reads one value of `shape`.
    fn read(&self, cx: &mut DecodeContext<'_, '_>, shape: &'static Shape) -> Result<Decoded, DecodeError>;

    /// Writes `value` as `shape`.
    fn write(
        &self,
        cx: &mut EncodeContext<'_>,
        shape: &'static Shape,
        value: &Value,
    ) -> Result<(), EncodeError>;
}

/// The built-in adapter for `shape`.
pub fn builtin_adapter(shape: &Shape) -> &'static dyn TypeAdapter {
    match shape.def {
        Def::Scalar(scalar) if scalar.is_passthrough() => &PassthroughAdapter,
        Def::Scalar(_) => &ScalarAdapter,
        Def::Struct(_) => &ObjectAdapter,
        Def::List(_) => &ListAdapter,
        Def::Map(_) => &MapAdapter,
        Def::Option(_) => &OptionAdapter,
    }
}
