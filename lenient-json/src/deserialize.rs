//! Decoding: the state threaded through adapters and the root entry point.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use lenient_core::{
    CoercionFault, FaultSite, Instantiator, Shape, StructValue, TokenKind, Value,
};

use crate::adapter::{Decoded, builtin_adapter, read_fields};
use crate::{DecodeError, DecodeErrorKind, JsonReader, Lenient, StructBinding};

#[derive(Clone)]
struct Frame {
    owner: &'static Shape,
    field: Option<&'static str>,
    site: FaultSite,
}

/// State of one decode: the reader, the configuration and the position
/// inside the target type used to attribute faults.
pub struct DecodeContext<'a, 'input> {
    config: &'a Lenient,
    reader: &'a mut JsonReader<'input>,
    instantiator: Instantiator<'a>,
    frames: Vec<Frame>,
}

impl<'a, 'input> DecodeContext<'a, 'input> {
    pub(crate) fn new(config: &'a Lenient, reader: &'a mut JsonReader<'input>) -> Self {
        Self {
            config,
            reader,
            instantiator: Instantiator::new(config.instance_creators()),
            frames: Vec::new(),
        }
    }

    /// The configuration driving this decode.
    pub fn config(&self) -> &'a Lenient {
        self.config
    }

    /// The underlying token reader.
    pub fn reader(&mut self) -> &mut JsonReader<'input> {
        self.reader
    }

    /// Reports a coercion fault at the current position.
    ///
    /// `expected` is the shape the value should have had and `token` the kind
    /// of token that was found instead. The caller is responsible for
    /// consuming the offending value.
    pub fn report(&mut self, expected: &'static Shape, token: TokenKind) {
        let (owner, field, site) = match self.frames.last() {
            Some(frame) => (frame.owner, frame.field, frame.site.clone()),
            None => (expected, None, FaultSite::Field),
        };
        let fault = CoercionFault {
            owner,
            field,
            site,
            expected,
            token,
            path: self.reader.path(),
        };
        tracing::trace!(%fault, "coercion fault");
        self.config.fault_callback().dispatch(&fault);
    }

    /// Reads one value of `shape` through its registered or built-in adapter.
    pub fn read_value(&mut self, shape: &'static Shape) -> Result<Decoded, DecodeError> {
        let config = self.config;
        match config.adapter_for(shape) {
            Some(adapter) => {
                tracing::trace!(shape = %shape, "reading through registered adapter");
                adapter.read(self, shape)
            }
            None => builtin_adapter(shape).read(self, shape),
        }
    }

    /// Runs `f` with faults attributed to `site` inside `owner`.
    pub fn with_site<R>(
        &mut self,
        owner: &'static Shape,
        field: Option<&'static str>,
        site: FaultSite,
        f: impl FnOnce(&mut Self) -> Result<R, DecodeError>,
    ) -> Result<R, DecodeError> {
        self.frames.push(Frame { owner, field, site });
        let result = f(self);
        self.frames.pop();
        result
    }

    /// The struct field enclosing the current position, if any.
    pub fn current_field(&self) -> Option<&'static str> {
        self.frames.last().and_then(|frame| frame.field)
    }

    /// The default value of `shape`: zero scalars, empty containers, `null`
    /// options and freshly obtained struct instances.
    pub fn default_for(&mut self, shape: &'static Shape) -> Result<Value, DecodeError> {
        let result = self.instantiator.default_value(shape);
        result.map_err(|e| self.error(DecodeErrorKind::Construct(e)))
    }

    /// A fully populated initial instance of the struct `shape`.
    pub fn obtain_instance(&mut self, shape: &'static Shape) -> Result<StructValue, DecodeError> {
        let result = self.instantiator.obtain_instance(shape);
        result.map_err(|e| self.error(DecodeErrorKind::Construct(e)))
    }

    /// The field table of the struct `shape` under this configuration.
    pub fn binding(&self, shape: &'static Shape) -> Result<Arc<StructBinding>, DecodeError> {
        self.config
            .binding(shape)
            .map_err(|e| self.error(DecodeErrorKind::Binding(e)))
    }

    /// A fatal error at the current reader position.
    pub fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.reader.path())
    }

    /// A [`DecodeErrorKind::Custom`] error at the current reader position.
    pub fn custom_error(&self, message: impl fmt::Display) -> DecodeError {
        DecodeError::custom(message, self.reader.path())
    }
}

/// Decodes the next value of `reader` as `shape`.
///
/// A struct root must be an object or `null`; anything else is a
/// [`DecodeErrorKind::RootMismatch`]. Other roots follow the usual coercion
/// rules and fall back to the shape's default.
pub(crate) fn decode_value(
    config: &Lenient,
    reader: &mut JsonReader<'_>,
    shape: &'static Shape,
) -> Result<Value, DecodeError> {
    tracing::trace!(shape = %shape, "decoding");
    let mut cx = DecodeContext::new(config, reader);

    if shape.as_struct().is_some() && config.adapter_for(shape).is_none() {
        return match cx.reader().peek()? {
            TokenKind::BeginObject => {
                let instance = cx.obtain_instance(shape)?;
                read_fields(&mut cx, shape, instance).map(Value::Struct)
            }
            TokenKind::Null => {
                cx.reader().next_null()?;
                cx.obtain_instance(shape).map(Value::Struct)
            }
            found => Err(cx.error(DecodeErrorKind::RootMismatch {
                expected: shape,
                found,
            })),
        };
    }

    match cx.read_value(shape)? {
        Decoded::Value(value) => Ok(value),
        Decoded::Null | Decoded::Faulted => cx.default_for(shape),
    }
}
