//! Encoding values back to JSON text.

use alloc::sync::Arc;

use lenient_core::{Shape, Value};

use crate::adapter::builtin_adapter;
use crate::{EncodeError, JsonWriter, Lenient, StructBinding};

/// State of one encode.
pub struct EncodeContext<'a> {
    config: &'a Lenient,
    writer: &'a mut JsonWriter,
}

impl<'a> EncodeContext<'a> {
    pub(crate) fn new(config: &'a Lenient, writer: &'a mut JsonWriter) -> Self {
        Self { config, writer }
    }

    /// The configuration driving this encode.
    pub fn config(&self) -> &'a Lenient {
        self.config
    }

    /// The underlying writer.
    pub fn writer(&mut self) -> &mut JsonWriter {
        self.writer
    }

    /// Whether `null` struct fields are written.
    pub fn serialize_nulls(&self) -> bool {
        self.config.serializes_nulls()
    }

    /// Writes `value` as `shape` through its registered or built-in adapter.
    pub fn write_value(&mut self, shape: &'static Shape, value: &Value) -> Result<(), EncodeError> {
        let config = self.config;
        match config.adapter_for(shape) {
            Some(adapter) => adapter.write(self, shape, value),
            None => builtin_adapter(shape).write(self, shape, value),
        }
    }

    /// The field table of the struct `shape` under this configuration.
    pub fn binding(&self, shape: &'static Shape) -> Result<Arc<StructBinding>, EncodeError> {
        Ok(self.config.binding(shape)?)
    }
}

pub(crate) fn encode_value(
    config: &Lenient,
    value: &Value,
    shape: &'static Shape,
    writer: &mut JsonWriter,
) -> Result<(), EncodeError> {
    tracing::trace!(shape = %shape, "encoding");
    EncodeContext::new(config, writer).write_value(shape, value)
}
