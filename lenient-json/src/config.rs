//! The immutable decoding and encoding configuration.

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use std::collections::HashMap;

use lenient_core::{
    Describe, FaultCallback, Field, IgnoreFaults, InstanceCreator, InstanceCreators, Shape,
    ShapeKey, Value,
};
use parking_lot::RwLock;

use crate::adapter::TypeAdapter;
use crate::deserialize::decode_value;
use crate::serialize::encode_value;
use crate::{
    BindingError, DecodeError, DecodeErrorKind, EncodeError, ExcludeFn, FieldNamingPolicy,
    DEFAULT_MAX_DEPTH, JsonReader, JsonWriter, ReadError, StructBinding, Token,
};

/// A decoding and encoding configuration.
///
/// Built once through [`Lenient::builder`] and shared freely: it is `Send` and
/// `Sync`, and its only interior state is a cache of struct bindings.
///
/// ```
/// use lenient_json::{FieldNamingPolicy, Lenient};
///
/// struct Point {
///     x_pos: i32,
///     y_pos: i32,
/// }
///
/// lenient_core::describe! {
///     Point { x_pos: i32, y_pos: i32 }
/// }
///
/// let lenient = Lenient::builder()
///     .naming(FieldNamingPolicy::LowerCamelCase)
///     .build();
/// let point: Point = lenient.from_str(r#"{"xPos": "3", "yPos": 4.8}"#).unwrap();
/// assert_eq!((point.x_pos, point.y_pos), (3, 4));
/// ```
pub struct Lenient {
    naming: FieldNamingPolicy,
    exclude: Option<Arc<ExcludeFn>>,
    callback: Arc<dyn FaultCallback>,
    creators: InstanceCreators,
    adapters: HashMap<&'static str, Arc<dyn TypeAdapter>>,
    serialize_nulls: bool,
    pretty: bool,
    max_depth: usize,
    bindings: RwLock<HashMap<ShapeKey, Arc<StructBinding>>>,
}

impl Lenient {
    /// Starts a configuration with every option at its default.
    pub fn builder() -> LenientBuilder {
        LenientBuilder::default()
    }

    /// Decodes the next value of `reader` as `shape`.
    ///
    /// Coercion faults are reported to the fault callback and never fail the
    /// decode. The reader is left after the value; trailing input is not
    /// checked.
    pub fn decode(
        &self,
        reader: &mut JsonReader<'_>,
        shape: &'static Shape,
    ) -> Result<Value, DecodeError> {
        decode_value(self, reader, shape)
    }

    /// Writes `value` as `shape`.
    pub fn encode(
        &self,
        value: &Value,
        shape: &'static Shape,
        writer: &mut JsonWriter,
    ) -> Result<(), EncodeError> {
        encode_value(self, value, shape, writer)
    }

    /// Decodes a complete JSON document into `T`.
    pub fn from_str<T: Describe>(&self, json: &str) -> Result<T, DecodeError> {
        let mut reader = JsonReader::new(json).with_max_depth(self.max_depth);
        let value = self.decode(&mut reader, T::SHAPE)?;
        expect_end(&mut reader)?;
        Ok(T::from_value(value)?)
    }

    /// Encodes `value` as a JSON document, pretty-printed if configured.
    pub fn to_string<T: Describe>(&self, value: &T) -> Result<String, EncodeError> {
        let mut writer = if self.pretty {
            JsonWriter::pretty()
        } else {
            JsonWriter::new()
        };
        self.encode(&value.to_value(), T::SHAPE, &mut writer)?;
        Ok(writer.into_string())
    }

    /// The field table of the struct `shape`, computed on first use.
    pub fn binding(&self, shape: &'static Shape) -> Result<Arc<StructBinding>, BindingError> {
        let key = shape.key();
        if let Some(binding) = self.bindings.read().get(&key) {
            return Ok(Arc::clone(binding));
        }

        let binding = Arc::new(StructBinding::new(
            shape,
            &self.naming,
            self.exclude.as_deref(),
        )?);

        let mut bindings = self.bindings.write();
        Ok(Arc::clone(bindings.entry(key).or_insert(binding)))
    }

    /// The observer receiving coercion faults.
    pub fn fault_callback(&self) -> &dyn FaultCallback {
        &*self.callback
    }

    /// Registered instance creators.
    pub fn instance_creators(&self) -> &InstanceCreators {
        &self.creators
    }

    /// The adapter registered for the type of `shape`, if any.
    pub fn adapter_for(&self, shape: &Shape) -> Option<&Arc<dyn TypeAdapter>> {
        if self.adapters.is_empty() {
            return None;
        }
        self.adapters.get(shape.type_identifier)
    }

    /// The field naming policy.
    pub fn naming(&self) -> &FieldNamingPolicy {
        &self.naming
    }

    /// Whether `null` struct fields are written.
    pub fn serializes_nulls(&self) -> bool {
        self.serialize_nulls
    }

    /// Whether [`Lenient::to_string`] pretty-prints.
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// How deeply [`Lenient::from_str`] lets objects and arrays nest.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for Lenient {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Lenient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adapters: Vec<_> = self.adapters.keys().collect();
        adapters.sort();
        f.debug_struct("Lenient")
            .field("naming", &self.naming)
            .field("exclude", &self.exclude.is_some())
            .field("creators", &self.creators)
            .field("adapters", &adapters)
            .field("serialize_nulls", &self.serialize_nulls)
            .field("pretty", &self.pretty)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

fn expect_end(reader: &mut JsonReader<'_>) -> Result<(), DecodeError> {
    match reader.next_token()? {
        Token::EndDocument => Ok(()),
        other => {
            let err: ReadError = reader.unexpected("END_DOCUMENT", other.kind());
            Err(DecodeError::new(DecodeErrorKind::Syntax(err), reader.path()))
        }
    }
}

/// Builder for [`Lenient`].
pub struct LenientBuilder {
    naming: FieldNamingPolicy,
    exclude: Option<Arc<ExcludeFn>>,
    callback: Arc<dyn FaultCallback>,
    creators: InstanceCreators,
    adapters: HashMap<&'static str, Arc<dyn TypeAdapter>>,
    serialize_nulls: bool,
    pretty: bool,
    max_depth: usize,
}

impl Default for LenientBuilder {
    fn default() -> Self {
        Self {
            naming: FieldNamingPolicy::default(),
            exclude: None,
            callback: Arc::new(IgnoreFaults),
            creators: InstanceCreators::new(),
            adapters: HashMap::new(),
            serialize_nulls: false,
            pretty: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl LenientBuilder {
    /// Sets the policy turning field names into JSON property names.
    pub fn naming(mut self, naming: FieldNamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Excludes every field for which `predicate` returns `true`, in both
    /// directions.
    pub fn exclude_fields<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Field) -> bool + Send + Sync + 'static,
    {
        self.exclude = Some(Arc::new(predicate));
        self
    }

    /// Sets the observer notified of coercion faults.
    pub fn fault_callback(mut self, callback: Arc<dyn FaultCallback>) -> Self {
        self.callback = callback;
        self
    }

    /// Builds instances of the type named `type_identifier` with `creator`
    /// instead of its construction plan.
    pub fn register_instance_creator(
        mut self,
        type_identifier: &'static str,
        creator: Arc<dyn InstanceCreator>,
    ) -> Self {
        self.creators.register(type_identifier, creator);
        self
    }

    /// Reads and writes the type named `type_identifier` with `adapter`.
    pub fn register_adapter(
        mut self,
        type_identifier: &'static str,
        adapter: Arc<dyn TypeAdapter>,
    ) -> Self {
        self.adapters.insert(type_identifier, adapter);
        self
    }

    /// Writes `null` struct fields instead of omitting them.
    pub fn serialize_nulls(mut self, serialize_nulls: bool) -> Self {
        self.serialize_nulls = serialize_nulls;
        self
    }

    /// Makes [`Lenient::to_string`] indent its output.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Rejects documents whose objects and arrays nest deeper than
    /// `max_depth` with a syntax error.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> Lenient {
        Lenient {
            naming: self.naming,
            exclude: self.exclude,
            callback: self.callback,
            creators: self.creators,
            adapters: self.adapters,
            serialize_nulls: self.serialize_nulls,
            pretty: self.pretty,
            max_depth: self.max_depth,
            bindings: RwLock::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_are_cached() {
        static POINT: Shape = Shape::structure(
            "Point",
            lenient_core::StructDef::new(&const { [
                Field::new("x", lenient_core::shape_of::<i32>),
            ] }),
        );

        let lenient = Lenient::default();
        let first = lenient.binding(&POINT).unwrap();
        let second = lenient.binding(&POINT).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = Lenient::default().from_str::<i32>("1 2").unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::Syntax(_)), "{err}");
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Lenient>();
    }
}
