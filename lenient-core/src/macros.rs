/// Implements [`Describe`](crate::Describe) for a plain struct.
///
/// Every field of the struct must be listed, in declaration order. A field can
/// carry an explicit wire name with `as "name"`. The optional `construct`
/// clause declares how instances are built before decoding:
///
/// - `construct = default` uses `Default::default()`,
/// - `construct = new(a: A, b: B = expr)` calls `Self::new` with one argument
///   per listed parameter; `= expr` declares a default for that parameter,
/// - without the clause the instance starts as a zeroed shell.
///
/// ```
/// use lenient_core::{describe, Describe};
///
/// struct Account {
///     id: i64,
///     owner: String,
///     tags: Vec<String>,
/// }
///
/// impl Account {
///     fn new(id: i64, owner: String) -> Self {
///         Self { id, owner, tags: Vec::new() }
///     }
/// }
///
/// describe! {
///     Account {
///         id: i64,
///         owner: String as "ownerName",
///         tags: Vec<String>,
///     }
///     construct = new(id: i64, owner: String = "nobody".to_string())
/// }
///
/// assert_eq!(Account::SHAPE.to_string(), "Account");
/// ```
#[macro_export]
macro_rules! describe {
    (@field $field:ident : $fty:ty) => {
        $crate::Field::new(::core::stringify!($field), $crate::shape_of::<$fty>)
    };
    (@field $field:ident : $fty:ty as $wire:literal) => {
        $crate::Field::new(::core::stringify!($field), $crate::shape_of::<$fty>).rename($wire)
    };

    (@param $param:ident : $pty:ty) => {
        $crate::Param::new(::core::stringify!($param), $crate::shape_of::<$pty>)
    };
    (@param $param:ident : $pty:ty = $pdef:expr) => {
        $crate::Param::new(::core::stringify!($param), $crate::shape_of::<$pty>).with_default({
            fn param_default() -> $crate::Value {
                let value: $pty = $pdef;
                $crate::Describe::to_value(&value)
            }
            param_default
        })
    };

    (@impl $name:ident { $( $field:ident : $fty:ty $(as $wire:literal)? ),* } [ $($builder:tt)* ]) => {
        impl $crate::Describe for $name {
            const SHAPE: &'static $crate::Shape = &const {
                $crate::Shape::structure(
                    ::core::stringify!($name),
                    $crate::StructDef::new(&const { [
                        $( $crate::describe!(@field $field : $fty $(as $wire)?) ),*
                    ] })
                    $($builder)*
                )
            };

            fn from_value(
                value: $crate::Value,
            ) -> ::core::result::Result<Self, $crate::ValueError> {
                #[allow(unused_mut, unused_variables)]
                let mut slots = value.into_struct_fields(Self::SHAPE)?.into_iter();
                ::core::result::Result::Ok(Self {
                    $( $field: $crate::take_field(&mut slots, ::core::stringify!($field))?, )*
                })
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Struct($crate::StructValue::new(
                    Self::SHAPE,
                    ::std::vec![$( $crate::Describe::to_value(&self.$field) ),*],
                ))
            }
        }
    };

    (
        $name:ident { $( $field:ident : $fty:ty $(as $wire:literal)? ),* $(,)? }
    ) => {
        $crate::describe!(@impl $name { $( $field : $fty $(as $wire)? ),* } []);
    };

    (
        $name:ident { $( $field:ident : $fty:ty $(as $wire:literal)? ),* $(,)? }
        construct = default
    ) => {
        $crate::describe!(@impl $name { $( $field : $fty $(as $wire)? ),* } [
            .with_default({
                fn default_instance() -> ::core::result::Result<$crate::Value, ::std::string::String> {
                    ::core::result::Result::Ok($crate::Describe::to_value(
                        &<$name as ::core::default::Default>::default(),
                    ))
                }
                default_instance
            })
        ]);
    };

    (
        $name:ident { $( $field:ident : $fty:ty $(as $wire:literal)? ),* $(,)? }
        construct = $ctor:ident ( $( $param:ident : $pty:ty $(= $pdef:expr)? ),* $(,)? )
    ) => {
        $crate::describe!(@impl $name { $( $field : $fty $(as $wire)? ),* } [
            .with_constructors(&const { [
                $crate::Constructor::new(
                    &const { [ $( $crate::describe!(@param $param : $pty $(= $pdef)?) ),* ] },
                    {
                        fn call(
                            args: ::std::vec::Vec<$crate::Value>,
                        ) -> ::core::result::Result<$crate::Value, ::std::string::String> {
                            #[allow(unused_mut, unused_variables)]
                            let mut args = args.into_iter();
                            $( let $param: $pty = $crate::take_arg(&mut args, ::core::stringify!($param))?; )*
                            ::core::result::Result::Ok($crate::Describe::to_value(
                                &<$name>::$ctor($($param),*),
                            ))
                        }
                        call
                    },
                )
            ] })
        ]);
    };
}

#[cfg(test)]
mod tests {
    use crate::{
        ConstructionPlan, Describe, InstanceCreators, Instantiator, Value, plan_for,
    };

    #[derive(Debug, PartialEq)]
    struct Labeled {
        id: i32,
        label: String,
    }

    impl Labeled {
        fn new(id: i32, label: String) -> Self {
            Self { id, label }
        }
    }

    crate::describe! {
        Labeled { id: i32, label: String }
        construct = new(id: i32, label: String)
    }

    #[derive(Debug, PartialEq)]
    struct Profile {
        name: String,
        age: i32,
    }

    impl Profile {
        fn create(name: String, age: i32) -> Self {
            Self { name, age }
        }
    }

    crate::describe! {
        Profile { name: String as "displayName", age: i32 }
        construct = create(name: String, age: i32 = 20)
    }

    #[derive(Debug, Default, PartialEq)]
    struct Settings {
        verbose: bool,
        retries: Option<i64>,
    }

    crate::describe! {
        Settings { verbose: bool, retries: Option<i64> }
        construct = default
    }

    #[test]
    fn shape_lists_fields_and_wire_names() {
        let def = Profile::SHAPE.as_struct().unwrap();
        let names: Vec<_> = def.fields.iter().map(|f| (f.name, f.rename)).collect();
        assert_eq!(names, [("name", Some("displayName")), ("age", None)]);
    }

    #[test]
    fn only_constructor_is_synthesized() {
        assert!(matches!(
            plan_for(Labeled::SHAPE),
            Some(ConstructionPlan::SynthesizeDefaults(_))
        ));
        let creators = InstanceCreators::new();
        let instance = Instantiator::new(&creators)
            .obtain_instance(Labeled::SHAPE)
            .unwrap();
        let labeled = Labeled::from_value(Value::Struct(instance)).unwrap();
        assert_eq!(labeled, Labeled::new(0, String::new()));
    }

    #[test]
    fn parameter_default_is_used() {
        let creators = InstanceCreators::new();
        let instance = Instantiator::new(&creators)
            .obtain_instance(Profile::SHAPE)
            .unwrap();
        let profile = Profile::from_value(instance.into()).unwrap();
        assert_eq!(profile.age, 20);
    }

    #[test]
    fn default_entry_point_is_direct() {
        assert!(matches!(
            plan_for(Settings::SHAPE),
            Some(ConstructionPlan::DirectConstruct(_))
        ));
        let settings = Settings {
            verbose: true,
            retries: Some(3),
        };
        assert_eq!(Settings::from_value(settings.to_value()).unwrap(), settings);
    }
}
