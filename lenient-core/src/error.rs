use core::fmt;

use crate::{Shape, Value};

/// A [`Value`] did not have the layout a typed conversion expected.
///
/// Values produced by the decoder always match their shape, so this only
/// surfaces for hand-built values or custom adapters that return the wrong
/// variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    /// Rendered target shape.
    pub expected: String,
    /// Variant that was found instead.
    pub found: &'static str,
    /// Field or parameter the value belonged to, if known.
    pub context: Option<&'static str>,
}

impl ValueError {
    /// A mismatch between `shape` and `found`.
    pub fn mismatch(shape: &Shape, found: &Value) -> Self {
        Self {
            expected: shape.to_string(),
            found: found.kind(),
            context: None,
        }
    }

    /// Attaches the field or parameter name.
    pub fn in_field(mut self, name: &'static str) -> Self {
        self.context.get_or_insert(name);
        self
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected `{}`, found {}", self.expected, self.found)?;
        if let Some(context) = self.context {
            write!(f, " (in `{context}`)")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValueError {}
