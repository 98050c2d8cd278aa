use alloc::string::String;
use core::fmt;

use lenient_core::{ConstructError, Shape, TokenKind, ValueError};

use crate::ReadError;

/// Two fields of one struct resolve to the same wire name.
#[derive(Debug, Clone)]
pub struct BindingError {
    /// The struct whose fields collide.
    pub shape: &'static Shape,
    /// The contested wire name.
    pub wire_name: String,
    /// The field that claimed the name first.
    pub first: &'static str,
    /// The field that claimed it again.
    pub second: &'static str,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` declares multiple JSON fields named {:?} (`{}` and `{}`)",
            self.shape, self.wire_name, self.first, self.second
        )
    }
}

impl std::error::Error for BindingError {}

/// Why decoding stopped.
#[derive(Debug, Clone)]
pub enum DecodeErrorKind {
    /// The input is not well-formed JSON.
    Syntax(ReadError),
    /// The top-level value cannot be read as the requested struct.
    RootMismatch {
        /// The requested type.
        expected: &'static Shape,
        /// The token found at the root.
        found: TokenKind,
    },
    /// The selected construction strategy failed.
    Construct(ConstructError),
    /// A struct binding is ambiguous.
    Binding(BindingError),
    /// The decoded value could not be sealed into the Rust type.
    Value(ValueError),
    /// A custom adapter gave up.
    Custom(String),
}

/// A fatal decoding failure. Coercion faults never end up here.
#[derive(Debug, Clone)]
pub struct DecodeError {
    /// What went wrong.
    pub kind: DecodeErrorKind,
    /// Document path where it went wrong.
    pub path: String,
}

impl DecodeError {
    /// Creates an error at `path`.
    pub fn new(kind: DecodeErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// A custom adapter failure.
    pub fn custom(message: impl fmt::Display, path: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::Custom(message.to_string()), path)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            // Syntax errors carry their own position.
            DecodeErrorKind::Syntax(e) => return write!(f, "{e}"),
            DecodeErrorKind::RootMismatch { expected, found } => {
                write!(f, "expected `{expected}` at the document root, found {found}")?
            }
            DecodeErrorKind::Construct(e) => write!(f, "{e}")?,
            DecodeErrorKind::Binding(e) => write!(f, "{e}")?,
            DecodeErrorKind::Value(e) => write!(f, "{e}")?,
            DecodeErrorKind::Custom(msg) => f.write_str(msg)?,
        }
        write!(f, " at {}", self.path)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::Syntax(e) => Some(e),
            DecodeErrorKind::Construct(e) => Some(e),
            DecodeErrorKind::Binding(e) => Some(e),
            DecodeErrorKind::Value(e) => Some(e),
            DecodeErrorKind::RootMismatch { .. } | DecodeErrorKind::Custom(_) => None,
        }
    }
}

impl From<ReadError> for DecodeError {
    fn from(err: ReadError) -> Self {
        let path = err.path.clone();
        Self::new(DecodeErrorKind::Syntax(err), path)
    }
}

impl From<ValueError> for DecodeError {
    fn from(err: ValueError) -> Self {
        Self::new(DecodeErrorKind::Value(err), "$")
    }
}

/// A fatal encoding failure.
#[derive(Debug, Clone)]
pub enum EncodeError {
    /// A value does not match the shape it is written as.
    Mismatch(ValueError),
    /// A struct binding is ambiguous.
    Binding(BindingError),
    /// A custom adapter gave up.
    Custom(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Mismatch(e) => write!(f, "cannot encode value: {e}"),
            EncodeError::Binding(e) => write!(f, "{e}"),
            EncodeError::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<ValueError> for EncodeError {
    fn from(err: ValueError) -> Self {
        EncodeError::Mismatch(err)
    }
}

impl From<BindingError> for EncodeError {
    fn from(err: BindingError) -> Self {
        EncodeError::Binding(err)
    }
}
