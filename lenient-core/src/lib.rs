#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod construct;
pub use construct::*;

mod describe;
pub use describe::*;

mod error;
pub use error::*;

mod fault;
pub use fault::*;

mod macros;

mod shape;
pub use shape::*;

mod value;
pub use value::*;
