#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

use alloc::string::String;
use std::sync::LazyLock;

use lenient_core::Describe;

pub mod adapter;
pub use adapter::{Decoded, TypeAdapter};

mod binding;
pub use binding::*;

mod config;
pub use config::*;

mod deserialize;
pub use deserialize::DecodeContext;

mod error;
pub use error::*;

mod naming;
pub use naming::*;

mod reader;
pub use reader::*;

mod serialize;
pub use serialize::EncodeContext;

mod writer;
pub use writer::*;

pub use lenient_core;

static DEFAULT: LazyLock<Lenient> = LazyLock::new(Lenient::default);

/// Decodes a JSON document into `T` with the default configuration.
///
/// Coercion faults are silently repaired. Use a [`Lenient`] with a fault
/// callback to observe them.
pub fn from_str<T: Describe>(json: &str) -> Result<T, DecodeError> {
    DEFAULT.from_str(json)
}

/// Encodes `value` as compact JSON with the default configuration.
pub fn to_string<T: Describe>(value: &T) -> Result<String, EncodeError> {
    DEFAULT.to_string(value)
}

/// Encodes `value` as JSON indented by two spaces, with the default
/// configuration.
pub fn to_string_pretty<T: Describe>(value: &T) -> Result<String, EncodeError> {
    let mut writer = JsonWriter::pretty();
    DEFAULT.encode(&value.to_value(), T::SHAPE, &mut writer)?;
    Ok(writer.into_string())
}
