//! Mapping declared field names to wire names.

use alloc::borrow::Cow;
use alloc::string::String;
use core::fmt;

use heck::{AsKebabCase, AsLowerCamelCase, AsShoutySnakeCase, AsSnakeCase, AsUpperCamelCase};
use lenient_core::Field;

/// How a field's declared name becomes its JSON property name.
///
/// An explicit `rename` on the field always wins over the policy.
#[derive(Clone, Copy, Default)]
pub enum FieldNamingPolicy {
    /// The declared name, unchanged.
    #[default]
    Identity,
    /// `someFieldName`
    LowerCamelCase,
    /// `SomeFieldName`
    UpperCamelCase,
    /// `some_field_name`
    LowerCaseWithUnderscores,
    /// `some-field-name`
    LowerCaseWithDashes,
    /// `some.field.name`
    LowerCaseWithDots,
    /// `SOME_FIELD_NAME`
    UpperCaseWithUnderscores,
    /// Any function of the field, for example one driven by its marker
    /// attributes.
    Custom(fn(&Field) -> String),
}

impl FieldNamingPolicy {
    /// Returns the wire name of `field`.
    pub fn translate(&self, field: &Field) -> Cow<'static, str> {
        if let Some(rename) = field.rename {
            return Cow::Borrowed(rename);
        }
        let name = field.name;
        let converted = match self {
            FieldNamingPolicy::Identity => return Cow::Borrowed(name),
            FieldNamingPolicy::LowerCamelCase => format!("{}", AsLowerCamelCase(name)),
            FieldNamingPolicy::UpperCamelCase => format!("{}", AsUpperCamelCase(name)),
            FieldNamingPolicy::LowerCaseWithUnderscores => format!("{}", AsSnakeCase(name)),
            FieldNamingPolicy::LowerCaseWithDashes => format!("{}", AsKebabCase(name)),
            FieldNamingPolicy::LowerCaseWithDots => format!("{}", AsSnakeCase(name)).replace('_', "."),
            FieldNamingPolicy::UpperCaseWithUnderscores => format!("{}", AsShoutySnakeCase(name)),
            FieldNamingPolicy::Custom(f) => f(field),
        };
        if converted == name {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(converted)
        }
    }
}

impl fmt::Debug for FieldNamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldNamingPolicy::Identity => "Identity",
            FieldNamingPolicy::LowerCamelCase => "LowerCamelCase",
            FieldNamingPolicy::UpperCamelCase => "UpperCamelCase",
            FieldNamingPolicy::LowerCaseWithUnderscores => "LowerCaseWithUnderscores",
            FieldNamingPolicy::LowerCaseWithDashes => "LowerCaseWithDashes",
            FieldNamingPolicy::LowerCaseWithDots => "LowerCaseWithDots",
            FieldNamingPolicy::UpperCaseWithUnderscores => "UpperCaseWithUnderscores",
            FieldNamingPolicy::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}
