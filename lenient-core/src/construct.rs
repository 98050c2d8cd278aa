//! Obtaining an initial instance of a struct before its fields are read.
//!
//! Every struct decode starts from a fully populated instance. The strategy
//! used to build it is chosen once per shape:
//!
//! 1. [`ConstructionPlan::SynthesizeDefaults`]: the type has no zero-argument
//!    entry point but exactly one constructor whose parameters can all be
//!    defaulted. The constructor runs with declared parameter defaults, or the
//!    parameter type's zero value.
//! 2. [`ConstructionPlan::DirectConstruct`]: the zero-argument entry point runs.
//! 3. [`ConstructionPlan::ZeroedShell`]: every slot gets its type's zero value
//!    and no constructor code runs at all.
//!
//! An [`InstanceCreator`] registered for a type bypasses the plan entirely.

use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::{Constructor, Def, DefaultFn, Shape, ShapeKey, StructDef, StructValue, Value};

/// A zero-argument entry point.
#[derive(Clone, Copy)]
pub enum ZeroArg {
    /// A default function.
    Default(DefaultFn),
    /// A constructor declared with no parameters.
    Constructor(&'static Constructor),
}

/// The strategy selected to build the initial instance of a struct.
#[derive(Clone, Copy)]
pub enum ConstructionPlan {
    /// Call the only constructor with a default for every parameter.
    SynthesizeDefaults(&'static Constructor),
    /// Call the zero-argument entry point.
    DirectConstruct(ZeroArg),
    /// Fill every slot with its zero value without running constructor code.
    ZeroedShell,
}

impl ConstructionPlan {
    /// Short name of the strategy, for diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            ConstructionPlan::SynthesizeDefaults(_) => "synthesize-defaults",
            ConstructionPlan::DirectConstruct(_) => "direct-construct",
            ConstructionPlan::ZeroedShell => "zeroed-shell",
        }
    }
}

impl fmt::Debug for ConstructionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Longest chain of structs built inside one another.
const MAX_NESTING: usize = 64;

/// Process-wide plan cache. Shapes never change, so entries are never evicted.
static PLANS: LazyLock<RwLock<HashMap<ShapeKey, ConstructionPlan>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns the construction plan for a struct shape, probing it on first use.
///
/// Returns `None` for non-struct shapes.
pub fn plan_for(shape: &'static Shape) -> Option<ConstructionPlan> {
    let def = shape.as_struct()?;
    let key = shape.key();

    if let Some(plan) = PLANS.read().get(&key) {
        return Some(*plan);
    }

    let plan = probe(shape, def, &mut Vec::new());
    tracing::debug!(shape = %shape, plan = plan.name(), "selected construction plan");

    let mut plans = PLANS.write();
    Some(*plans.entry(key).or_insert(plan))
}

fn probe(
    shape: &'static Shape,
    def: &'static StructDef,
    stack: &mut Vec<&'static Shape>,
) -> ConstructionPlan {
    let zero_arg = def
        .default_fn
        .map(ZeroArg::Default)
        .or_else(|| {
            def.constructors
                .iter()
                .find(|c| c.params.is_empty())
                .map(ZeroArg::Constructor)
        });

    if zero_arg.is_none() {
        if let [only] = def.constructors {
            stack.push(shape);
            let defaultable = only
                .params
                .iter()
                .all(|p| p.default.is_some() || can_default(p.shape(), stack));
            stack.pop();
            if defaultable {
                return ConstructionPlan::SynthesizeDefaults(only);
            }
        }
    }

    match zero_arg {
        Some(zero_arg) => ConstructionPlan::DirectConstruct(zero_arg),
        None => ConstructionPlan::ZeroedShell,
    }
}

fn can_default(shape: &'static Shape, stack: &mut Vec<&'static Shape>) -> bool {
    match &shape.def {
        Def::Struct(def) => {
            if stack.len() >= MAX_NESTING || stack.iter().any(|s| same_type(*s, shape)) {
                return false;
            }
            // A struct parameter is defaultable when its own plan does not
            // need to loop back into a type being resolved.
            stack.push(shape);
            let ok = match probe(shape, def, stack) {
                ConstructionPlan::SynthesizeDefaults(_) | ConstructionPlan::DirectConstruct(_) => true,
                ConstructionPlan::ZeroedShell => def
                    .fields
                    .iter()
                    .all(|f| can_default(f.shape(), stack)),
            };
            stack.pop();
            ok
        }
        Def::Scalar(_) | Def::List(_) | Def::Map(_) | Def::Option(_) => true,
    }
}

/// Whether two struct shapes describe the same type.
///
/// A descriptor may be emitted at more than one address, so identity falls
/// back to the type identifier and field names.
fn same_type(a: &'static Shape, b: &'static Shape) -> bool {
    if a.key() == b.key() {
        return true;
    }
    match (a.as_struct(), b.as_struct()) {
        (Some(x), Some(y)) => {
            a.type_identifier == b.type_identifier
                && x.fields.len() == y.fields.len()
                && x.fields.iter().zip(y.fields).all(|(f, g)| f.name == g.name)
        }
        _ => false,
    }
}

/// Builds instances of a specific type, replacing the construction plan.
pub trait InstanceCreator: Send + Sync {
    /// Returns a fully populated instance of `shape`.
    fn create_instance(&self, shape: &'static Shape) -> Result<StructValue, String>;
}

impl<F> InstanceCreator for F
where
    F: Fn(&'static Shape) -> Result<StructValue, String> + Send + Sync,
{
    fn create_instance(&self, shape: &'static Shape) -> Result<StructValue, String> {
        self(shape)
    }
}

/// Registered instance creators, keyed by type identifier.
#[derive(Clone, Default)]
pub struct InstanceCreators {
    creators: HashMap<&'static str, Arc<dyn InstanceCreator>>,
}

impl InstanceCreators {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `creator` for the type named `type_identifier`, replacing any
    /// previous registration.
    pub fn register(&mut self, type_identifier: &'static str, creator: Arc<dyn InstanceCreator>) {
        self.creators.insert(type_identifier, creator);
    }

    /// Looks up the creator for a shape.
    pub fn get(&self, shape: &Shape) -> Option<&Arc<dyn InstanceCreator>> {
        self.creators.get(shape.type_identifier)
    }

    /// Whether no creator is registered.
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl fmt::Debug for InstanceCreators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.creators.keys()).finish()
    }
}

/// Which step produced a [`ConstructError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructStrategy {
    /// A registered [`InstanceCreator`].
    InstanceCreator,
    /// A [`ConstructionPlan`].
    Plan(&'static str),
}

impl fmt::Display for ConstructStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructStrategy::InstanceCreator => f.write_str("instance-creator"),
            ConstructStrategy::Plan(name) => f.write_str(name),
        }
    }
}

/// The selected construction strategy failed. Never downgraded to a fallback.
#[derive(Debug, Clone)]
pub struct ConstructError {
    /// The type being built.
    pub shape: &'static Shape,
    /// The strategy that failed.
    pub strategy: ConstructStrategy,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot construct `{}` ({}): {}",
            self.shape, self.strategy, self.message
        )
    }
}

impl std::error::Error for ConstructError {}

/// Produces initial instances and default values.
///
/// Tracks the structs currently being built so that self-referential shapes
/// terminate: a struct requested while it is already being built defaults to
/// [`Value::Null`].
pub struct Instantiator<'a> {
    creators: &'a InstanceCreators,
    in_progress: Vec<&'static Shape>,
}

impl<'a> Instantiator<'a> {
    /// Creates an instantiator consulting `creators` before any plan.
    pub fn new(creators: &'a InstanceCreators) -> Self {
        Self {
            creators,
            in_progress: Vec::new(),
        }
    }

    /// Returns a fully populated instance of the struct `shape`.
    pub fn obtain_instance(&mut self, shape: &'static Shape) -> Result<StructValue, ConstructError> {
        let fail = |strategy, message: String| ConstructError {
            shape,
            strategy,
            message,
        };

        if let Some(creator) = self.creators.get(shape) {
            let instance = creator
                .create_instance(shape)
                .map_err(|e| fail(ConstructStrategy::InstanceCreator, e))?;
            return check_instance(shape, instance)
                .map_err(|e| fail(ConstructStrategy::InstanceCreator, e));
        }

        let Some(plan) = plan_for(shape) else {
            return Err(fail(
                ConstructStrategy::Plan("none"),
                "not a struct shape".to_string(),
            ));
        };
        let strategy = ConstructStrategy::Plan(plan.name());
        if self.in_progress.len() >= MAX_NESTING {
            return Err(fail(
                strategy,
                format!("structs nested deeper than {MAX_NESTING} levels"),
            ));
        }

        self.in_progress.push(shape);
        let result = self.run_plan(shape, plan);
        self.in_progress.pop();

        let value = result.map_err(|e| fail(strategy, e))?;
        match value {
            Value::Struct(instance) => {
                check_instance(shape, instance).map_err(|e| fail(strategy, e))
            }
            other => Err(fail(
                strategy,
                format!("entry point returned {} instead of a struct", other.kind()),
            )),
        }
    }

    fn run_plan(&mut self, shape: &'static Shape, plan: ConstructionPlan) -> Result<Value, String> {
        match plan {
            ConstructionPlan::SynthesizeDefaults(constructor) => {
                let mut args = Vec::with_capacity(constructor.params.len());
                for param in constructor.params {
                    let arg = match param.default {
                        Some(default) => default(),
                        None => self.default_value(param.shape()).map_err(|e| e.to_string())?,
                    };
                    args.push(arg);
                }
                (constructor.call)(args)
            }
            ConstructionPlan::DirectConstruct(ZeroArg::Default(default_fn)) => default_fn(),
            ConstructionPlan::DirectConstruct(ZeroArg::Constructor(constructor)) => {
                (constructor.call)(Vec::new())
            }
            ConstructionPlan::ZeroedShell => {
                let def = shape.as_struct().ok_or("not a struct shape")?;
                let mut slots = Vec::with_capacity(def.fields.len());
                for field in def.fields {
                    slots.push(self.default_value(field.shape()).map_err(|e| e.to_string())?);
                }
                Ok(Value::Struct(StructValue::new(shape, slots)))
            }
        }
    }

    /// The value a slot of type `shape` holds when nothing else is known.
    ///
    /// Scalars get their zero value, options `Null`, containers are empty and
    /// structs are obtained through [`Self::obtain_instance`].
    pub fn default_value(&mut self, shape: &'static Shape) -> Result<Value, ConstructError> {
        Ok(match &shape.def {
            Def::Scalar(scalar) => scalar.zero_value(),
            Def::Option(_) => Value::Null,
            Def::List(_) => Value::List(Vec::new()),
            Def::Map(_) => Value::Map(IndexMap::new()),
            Def::Struct(_) => {
                if self.in_progress.iter().any(|s| same_type(*s, shape)) {
                    Value::Null
                } else {
                    Value::Struct(self.obtain_instance(shape)?)
                }
            }
        })
    }
}

fn check_instance(shape: &'static Shape, instance: StructValue) -> Result<StructValue, String> {
    if instance.shape().type_identifier != shape.type_identifier {
        return Err(format!(
            "produced an instance of `{}`",
            instance.shape().type_identifier
        ));
    }
    if !instance.is_complete() {
        return Err(format!(
            "produced {} of {} field slots",
            instance.fields().len(),
            shape.as_struct().map_or(0, |def| def.fields.len())
        ));
    }
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, Param, shape_of};

    fn label_ctor(args: Vec<Value>) -> Result<Value, String> {
        Ok(Value::Struct(StructValue::new(&LABELED, args)))
    }

    static LABELED_CTORS: [Constructor; 1] = [Constructor::new(
        &const { [
            Param::new("id", shape_of::<i32>),
            Param::new("label", shape_of::<String>),
        ] },
        label_ctor,
    )];

    static LABELED: Shape = Shape::structure(
        "Labeled",
        StructDef::new(&const { [
            Field::new("id", shape_of::<i32>),
            Field::new("label", shape_of::<String>),
        ] })
        .with_constructors(&LABELED_CTORS),
    );

    fn aged_ctor(args: Vec<Value>) -> Result<Value, String> {
        Ok(Value::Struct(StructValue::new(&AGED, args)))
    }

    fn twenty() -> Value {
        Value::I32(20)
    }

    static AGED_CTORS: [Constructor; 1] = [Constructor::new(
        &const { [
            Param::new("name", shape_of::<String>),
            Param::new("age", shape_of::<i32>).with_default(twenty),
            Param::new("tags", shape_of::<Vec<String>>),
        ] },
        aged_ctor,
    )];

    static AGED: Shape = Shape::structure(
        "Aged",
        StructDef::new(&const { [
            Field::new("name", shape_of::<String>),
            Field::new("age", shape_of::<i32>),
            Field::new("tags", shape_of::<Vec<String>>),
        ] })
        .with_constructors(&AGED_CTORS),
    );

    fn labeled() -> &'static Shape {
        &LABELED
    }

    static BARE: Shape = Shape::structure(
        "Bare",
        StructDef::new(&const { [
            Field::new("inner", labeled),
            Field::new("maybe", shape_of::<Option<i64>>),
        ] }),
    );

    fn failing_default() -> Result<Value, String> {
        Err("boom".to_string())
    }

    static BROKEN: Shape = Shape::structure(
        "Broken",
        StructDef::new(&const { [Field::new("x", shape_of::<i32>)] }).with_default(failing_default),
    );

    fn wrong_arity() -> Result<Value, String> {
        Ok(Value::Struct(StructValue::new(&SHORT, Vec::new())))
    }

    static SHORT: Shape = Shape::structure(
        "Short",
        StructDef::new(&const { [Field::new("x", shape_of::<i32>)] }).with_default(wrong_arity),
    );

    #[test]
    fn synthesizes_zero_values_for_only_constructor() {
        let creators = InstanceCreators::new();
        let instance = Instantiator::new(&creators).obtain_instance(&LABELED).unwrap();
        assert_eq!(instance.get("id"), Some(&Value::I32(0)));
        assert_eq!(instance.get("label"), Some(&Value::String(String::new())));
        assert!(matches!(
            plan_for(&LABELED),
            Some(ConstructionPlan::SynthesizeDefaults(_))
        ));
    }

    #[test]
    fn declared_parameter_defaults_win() {
        let creators = InstanceCreators::new();
        let instance = Instantiator::new(&creators).obtain_instance(&AGED).unwrap();
        assert_eq!(instance.get("age"), Some(&Value::I32(20)));
        assert_eq!(instance.get("tags"), Some(&Value::List(Vec::new())));
    }

    #[test]
    fn zeroed_shell_fills_nested_structs() {
        let creators = InstanceCreators::new();
        let instance = Instantiator::new(&creators).obtain_instance(&BARE).unwrap();
        assert!(matches!(plan_for(&BARE), Some(ConstructionPlan::ZeroedShell)));
        let inner = instance.get("inner").and_then(Value::as_struct).unwrap();
        assert_eq!(inner.get("id"), Some(&Value::I32(0)));
        assert_eq!(instance.get("maybe"), Some(&Value::Null));
    }

    #[test]
    fn failing_entry_point_is_fatal() {
        let creators = InstanceCreators::new();
        let err = Instantiator::new(&creators)
            .obtain_instance(&BROKEN)
            .unwrap_err();
        assert_eq!(err.strategy, ConstructStrategy::Plan("direct-construct"));
        assert_eq!(
            err.to_string(),
            "cannot construct `Broken` (direct-construct): boom"
        );
    }

    #[test]
    fn incomplete_instance_is_rejected() {
        let creators = InstanceCreators::new();
        let err = Instantiator::new(&creators).obtain_instance(&SHORT).unwrap_err();
        assert_eq!(err.message, "produced 0 of 1 field slots");
    }

    #[test]
    fn instance_creator_takes_precedence() {
        let mut creators = InstanceCreators::new();
        creators.register(
            "Labeled",
            Arc::new(|shape: &'static Shape| {
                Ok(StructValue::new(
                    shape,
                    vec![Value::I32(7), Value::String("custom".into())],
                ))
            }),
        );
        let instance = Instantiator::new(&creators).obtain_instance(&LABELED).unwrap();
        assert_eq!(instance.get("id"), Some(&Value::I32(7)));
    }

    /// A fresh descriptor of the same self-referential type on every call.
    fn relinked() -> &'static Shape {
        Box::leak(Box::new(Shape::structure(
            "Node",
            StructDef::new(&const { [Field::new("next", relinked)] }),
        )))
    }

    #[test]
    fn cycles_are_found_across_duplicate_descriptors() {
        let creators = InstanceCreators::new();
        let instance = Instantiator::new(&creators)
            .obtain_instance(relinked())
            .unwrap();
        assert_eq!(instance.fields(), [Value::Null]);
    }

    /// A new, differently named struct type on every call.
    fn ever_deeper() -> &'static Shape {
        static LEVEL: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        let n = LEVEL.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Box::leak(Box::new(Shape::structure(
            Box::leak(format!("Level{n}").into_boxed_str()),
            StructDef::new(&const { [Field::new("inner", ever_deeper)] }),
        )))
    }

    #[test]
    fn unbounded_struct_chains_are_fatal() {
        let creators = InstanceCreators::new();
        let err = Instantiator::new(&creators)
            .obtain_instance(ever_deeper())
            .unwrap_err();
        assert!(err.message.contains("nested deeper than 64 levels"), "{err}");
    }
}
