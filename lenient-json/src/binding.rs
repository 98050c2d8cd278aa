//! Per-configuration field tables for struct shapes.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use std::collections::HashMap;

use lenient_core::{Field, Shape};

use crate::{BindingError, FieldNamingPolicy};

/// Predicate excluding fields from both reading and writing.
pub type ExcludeFn = dyn Fn(&Field) -> bool + Send + Sync;

/// One declared field, as seen by a particular configuration.
#[derive(Debug, Clone)]
pub struct BoundField {
    /// Position of the field in its struct.
    pub index: usize,
    /// The declared field.
    pub field: &'static Field,
    /// Name written to and primarily read from JSON.
    pub wire_name: Cow<'static, str>,
    /// Whether the field is read when decoding.
    pub read: bool,
    /// Whether the field is written when encoding.
    pub write: bool,
}

/// Wire-name index of a struct shape under one naming and exclusion policy.
#[derive(Debug)]
pub struct StructBinding {
    shape: &'static Shape,
    fields: Vec<BoundField>,
    by_wire_name: HashMap<String, usize>,
}

impl StructBinding {
    /// Binds every field of the struct `shape`.
    ///
    /// Fails if two readable fields (counting aliases) or two writable fields
    /// end up with the same wire name.
    pub fn new(
        shape: &'static Shape,
        naming: &FieldNamingPolicy,
        exclude: Option<&ExcludeFn>,
    ) -> Result<Self, BindingError> {
        let declared: &'static [Field] = shape.as_struct().map_or(&[], |def| def.fields);

        let mut fields = Vec::with_capacity(declared.len());
        let mut by_wire_name: HashMap<String, usize> = HashMap::new();
        let mut written: HashMap<Cow<'static, str>, &'static str> = HashMap::new();

        for (index, field) in declared.iter().enumerate() {
            let excluded = exclude.is_some_and(|exclude| exclude(field));
            let bound = BoundField {
                index,
                field,
                wire_name: naming.translate(field),
                read: !excluded && !field.should_skip_deserializing(),
                write: !excluded && !field.should_skip_serializing(),
            };

            if bound.read {
                let names = core::iter::once(bound.wire_name.as_ref()).chain(field.aliases.iter().copied());
                for name in names {
                    match by_wire_name.get(name) {
                        Some(&other) if other != index => {
                            return Err(BindingError {
                                shape,
                                wire_name: name.into(),
                                first: declared[other].name,
                                second: field.name,
                            });
                        }
                        Some(_) => {}
                        None => {
                            by_wire_name.insert(name.into(), index);
                        }
                    }
                }
            }

            if bound.write {
                if let Some(first) = written.insert(bound.wire_name.clone(), field.name) {
                    return Err(BindingError {
                        shape,
                        wire_name: bound.wire_name.into_owned(),
                        first,
                        second: field.name,
                    });
                }
            }

            fields.push(bound);
        }

        tracing::debug!(shape = %shape, fields = fields.len(), "bound struct fields");

        Ok(Self {
            shape,
            fields,
            by_wire_name,
        })
    }

    /// The struct this binding belongs to.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// All fields, in declaration order.
    pub fn fields(&self) -> &[BoundField] {
        &self.fields
    }

    /// Finds the readable field for a JSON property name.
    pub fn lookup(&self, wire_name: &str) -> Option<&BoundField> {
        self.by_wire_name
            .get(wire_name)
            .and_then(|&index| self.fields.get(index))
    }

    /// Fields written when encoding, in declaration order.
    pub fn writable(&self) -> impl Iterator<Item = &BoundField> {
        self.fields.iter().filter(|f| f.write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lenient_core::{FieldFlags, StructDef, shape_of};

    static ACCOUNT: Shape = Shape::structure(
        "Account",
        StructDef::new(&const { [
            Field::new("user_name", shape_of::<String>).aliases(&["login"]),
            Field::new("password", shape_of::<String>).flags(FieldFlags::SKIP_SERIALIZING),
            Field::new("cache", shape_of::<i32>).flags(FieldFlags::SKIP),
        ] }),
    );

    static CLASH: Shape = Shape::structure(
        "Clash",
        StructDef::new(&const { [
            Field::new("user_name", shape_of::<String>),
            Field::new("userName", shape_of::<String>),
        ] }),
    );

    #[test]
    fn lookup_uses_policy_and_aliases() {
        let binding = StructBinding::new(&ACCOUNT, &FieldNamingPolicy::LowerCamelCase, None).unwrap();
        assert_eq!(binding.lookup("userName").map(|f| f.index), Some(0));
        assert_eq!(binding.lookup("login").map(|f| f.index), Some(0));
        assert_eq!(binding.lookup("password").map(|f| f.index), Some(1));
        assert!(binding.lookup("cache").is_none());
        assert!(binding.lookup("user_name").is_none());

        let written: Vec<_> = binding.writable().map(|f| f.wire_name.as_ref()).collect();
        assert_eq!(written, ["userName"]);
    }

    #[test]
    fn exclusion_predicate_hides_fields() {
        let exclude = |field: &Field| field.name == "password";
        let binding =
            StructBinding::new(&ACCOUNT, &FieldNamingPolicy::Identity, Some(&exclude)).unwrap();
        assert!(binding.lookup("password").is_none());
        assert!(binding.lookup("user_name").is_some());
    }

    #[test]
    fn colliding_wire_names_are_rejected() {
        assert!(StructBinding::new(&CLASH, &FieldNamingPolicy::Identity, None).is_ok());

        let err = StructBinding::new(&CLASH, &FieldNamingPolicy::LowerCamelCase, None).unwrap_err();
        assert_eq!(err.wire_name, "userName");
        assert_eq!((err.first, err.second), ("user_name", "userName"));
    }
}
