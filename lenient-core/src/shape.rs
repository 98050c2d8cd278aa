//! Static type descriptors.
//!
//! A [`Shape`] is the ahead-of-time description of a target type: what kind of
//! value it holds and, for containers, the shapes of its type arguments. Shapes
//! are `'static` and const-constructible so they can live in associated
//! constants (see [`Describe`](crate::Describe)) or in plain `static` items.

use core::fmt;

use crate::Value;

/// Lazily resolved reference to another shape.
///
/// The indirection allows recursive type definitions.
pub type ShapeRef = fn() -> &'static Shape;

/// Produces a zero-argument instance of a struct (usually `Default::default`).
pub type DefaultFn = fn() -> Result<Value, String>;

/// Invokes a constructor with one value per declared parameter.
pub type ConstructFn = fn(Vec<Value>) -> Result<Value, String>;

/// Produces the declared default value of a constructor parameter.
pub type ParamDefaultFn = fn() -> Value;

/// Describes a type the decoder can produce.
#[derive(Clone, Copy)]
pub struct Shape {
    /// Name of the type, without generic arguments (`Vec`, `User`, `i32`).
    pub type_identifier: &'static str,

    /// Structural definition.
    pub def: Def,
}

impl Shape {
    /// A scalar shape.
    pub const fn scalar(type_identifier: &'static str, scalar: ScalarType) -> Self {
        Self {
            type_identifier,
            def: Def::Scalar(scalar),
        }
    }

    /// A struct shape.
    pub const fn structure(type_identifier: &'static str, def: StructDef) -> Self {
        Self {
            type_identifier,
            def: Def::Struct(def),
        }
    }

    /// An ordered collection of `item`.
    pub const fn list(type_identifier: &'static str, item: ShapeRef) -> Self {
        Self {
            type_identifier,
            def: Def::List(ListDef { item }),
        }
    }

    /// A string-keyed map.
    pub const fn map(type_identifier: &'static str, key: ShapeRef, value: ShapeRef) -> Self {
        Self {
            type_identifier,
            def: Def::Map(MapDef { key, value }),
        }
    }

    /// A nullable wrapper around `inner`.
    pub const fn option(inner: ShapeRef) -> Self {
        Self {
            type_identifier: "Option",
            def: Def::Option(OptionDef { inner }),
        }
    }

    /// Returns the struct definition, if this is a struct shape.
    pub const fn as_struct(&self) -> Option<&StructDef> {
        match &self.def {
            Def::Struct(def) => Some(def),
            _ => None,
        }
    }

    /// Returns the scalar type, if this is a scalar shape.
    pub const fn as_scalar(&self) -> Option<ScalarType> {
        match self.def {
            Def::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Whether JSON `null` is a legitimate value of this shape.
    pub const fn is_nullable(&self) -> bool {
        matches!(self.def, Def::Option(_))
    }

    /// Key used by caches. Shapes are compared by address.
    pub fn key(&'static self) -> ShapeKey {
        ShapeKey(self as *const Shape as usize)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.def {
            Def::Scalar(_) | Def::Struct(_) => f.write_str(self.type_identifier),
            Def::List(list) => write!(f, "{}<{}>", self.type_identifier, list.item()),
            Def::Map(map) => write!(
                f,
                "{}<{}, {}>",
                self.type_identifier,
                map.key(),
                map.value()
            ),
            Def::Option(option) => write!(f, "{}<{}>", self.type_identifier, option.inner()),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({self})")
    }
}

/// Address-based identity of a `'static` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeKey(usize);

/// The structural definition of a shape.
#[derive(Clone, Copy)]
pub enum Def {
    /// A primitive value.
    Scalar(ScalarType),
    /// A struct with named fields.
    Struct(StructDef),
    /// An ordered collection.
    List(ListDef),
    /// A map with JSON-string keys.
    Map(MapDef),
    /// A nullable wrapper.
    Option(OptionDef),
}

/// Primitive kinds with a dedicated coercion adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// UTF-8 string.
    String,
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Opaque JSON object, captured verbatim.
    JsonObject,
    /// Opaque JSON array, captured verbatim.
    JsonArray,
    /// Any JSON value, captured verbatim.
    JsonValue,
}

impl ScalarType {
    /// Whether values of this type are captured as untyped JSON.
    pub const fn is_passthrough(self) -> bool {
        matches!(
            self,
            ScalarType::JsonObject | ScalarType::JsonArray | ScalarType::JsonValue
        )
    }

    /// The value held by a field of this type before anything is assigned.
    pub fn zero_value(self) -> Value {
        match self {
            ScalarType::String => Value::String(String::new()),
            ScalarType::Bool => Value::Bool(false),
            ScalarType::I32 => Value::I32(0),
            ScalarType::I64 => Value::I64(0),
            ScalarType::F32 => Value::F32(0.0),
            ScalarType::F64 => Value::F64(0.0),
            ScalarType::Decimal => Value::Decimal(rust_decimal::Decimal::ZERO),
            ScalarType::JsonObject => Value::Json(serde_json::Value::Object(Default::default())),
            ScalarType::JsonArray => Value::Json(serde_json::Value::Array(Vec::new())),
            ScalarType::JsonValue => Value::Json(serde_json::Value::Null),
        }
    }
}

/// Fields and construction entry points of a struct.
#[derive(Clone, Copy)]
pub struct StructDef {
    /// Declared fields, in declaration order.
    pub fields: &'static [Field],

    /// Zero-argument entry point, if the type has one.
    pub default_fn: Option<DefaultFn>,

    /// Constructors taking parameters.
    pub constructors: &'static [Constructor],
}

impl StructDef {
    /// A struct with the given fields and no construction entry point.
    pub const fn new(fields: &'static [Field]) -> Self {
        Self {
            fields,
            default_fn: None,
            constructors: &[],
        }
    }

    /// Sets the zero-argument entry point.
    pub const fn with_default(mut self, default_fn: DefaultFn) -> Self {
        self.default_fn = Some(default_fn);
        self
    }

    /// Sets the declared constructors.
    pub const fn with_constructors(mut self, constructors: &'static [Constructor]) -> Self {
        self.constructors = constructors;
        self
    }

    /// Looks up a field index by its declared name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A constructor and the parameters it expects.
#[derive(Clone, Copy)]
pub struct Constructor {
    /// Parameters, in call order.
    pub params: &'static [Param],

    /// The constructor itself.
    pub call: ConstructFn,
}

impl Constructor {
    /// Creates a constructor description.
    pub const fn new(params: &'static [Param], call: ConstructFn) -> Self {
        Self { params, call }
    }
}

/// One constructor parameter.
#[derive(Clone, Copy)]
pub struct Param {
    /// Parameter name (diagnostics only).
    pub name: &'static str,

    /// Shape of the parameter.
    pub shape: ShapeRef,

    /// Declared default, used instead of the shape's zero value.
    pub default: Option<ParamDefaultFn>,
}

impl Param {
    /// A parameter without a declared default.
    pub const fn new(name: &'static str, shape: ShapeRef) -> Self {
        Self {
            name,
            shape,
            default: None,
        }
    }

    /// Declares a default value for this parameter.
    pub const fn with_default(mut self, default: ParamDefaultFn) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns the shape of the parameter.
    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }
}

/// Element type of a list.
#[derive(Clone, Copy)]
pub struct ListDef {
    /// Shape of the elements.
    pub item: ShapeRef,
}

impl ListDef {
    /// Returns the element shape.
    pub fn item(&self) -> &'static Shape {
        (self.item)()
    }
}

/// Key and value types of a map.
#[derive(Clone, Copy)]
pub struct MapDef {
    /// Shape of the keys. Keys travel as JSON strings.
    pub key: ShapeRef,

    /// Shape of the values.
    pub value: ShapeRef,
}

impl MapDef {
    /// Returns the key shape.
    pub fn key(&self) -> &'static Shape {
        (self.key)()
    }

    /// Returns the value shape.
    pub fn value(&self) -> &'static Shape {
        (self.value)()
    }
}

/// Inner type of a nullable wrapper.
#[derive(Clone, Copy)]
pub struct OptionDef {
    /// Shape of the wrapped value.
    pub inner: ShapeRef,
}

impl OptionDef {
    /// Returns the wrapped shape.
    pub fn inner(&self) -> &'static Shape {
        (self.inner)()
    }
}

/// Exclusion flags of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags(u8);

impl FieldFlags {
    /// No flags.
    pub const EMPTY: Self = Self(0);
    /// Excluded from both directions.
    pub const SKIP: Self = Self(0b001);
    /// Never written.
    pub const SKIP_SERIALIZING: Self = Self(0b010);
    /// Never read; the field keeps its construction-time value.
    pub const SKIP_DESERIALIZING: Self = Self(0b100);

    /// Union of two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every flag of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Describes one declared field of a struct.
#[derive(Clone, Copy)]
pub struct Field {
    /// Declared name of the field.
    pub name: &'static str,

    /// Shape of the field's type.
    pub shape: ShapeRef,

    /// Explicit wire name, bypassing the naming policy.
    pub rename: Option<&'static str>,

    /// Additional wire names accepted when reading.
    pub aliases: &'static [&'static str],

    /// Exclusion flags.
    pub flags: FieldFlags,

    /// Free-form markers, available to custom naming and exclusion policies.
    pub attributes: &'static [&'static str],
}

impl Field {
    /// A field with no rename, aliases, flags or attributes.
    pub const fn new(name: &'static str, shape: ShapeRef) -> Self {
        Self {
            name,
            shape,
            rename: None,
            aliases: &[],
            flags: FieldFlags::EMPTY,
            attributes: &[],
        }
    }

    /// Sets the explicit wire name.
    pub const fn rename(mut self, wire_name: &'static str) -> Self {
        self.rename = Some(wire_name);
        self
    }

    /// Sets the alternate wire names.
    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Adds exclusion flags.
    pub const fn flags(mut self, flags: FieldFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    /// Sets the marker attributes.
    pub const fn attributes(mut self, attributes: &'static [&'static str]) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns the shape of the field's type.
    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }

    /// Whether the field carries the given marker attribute.
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(&attribute)
    }

    /// Whether the field is skipped when writing.
    pub const fn should_skip_serializing(&self) -> bool {
        self.flags.contains(FieldFlags::SKIP) || self.flags.contains(FieldFlags::SKIP_SERIALIZING)
    }

    /// Whether the field is skipped when reading.
    pub const fn should_skip_deserializing(&self) -> bool {
        self.flags.contains(FieldFlags::SKIP)
            || self.flags.contains(FieldFlags::SKIP_DESERIALIZING)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("shape", &self.shape().to_string())
            .field("rename", &self.rename)
            .field("flags", &self.flags)
            .finish()
    }
}
