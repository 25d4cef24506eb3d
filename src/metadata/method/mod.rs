//! CIL method bodies: headers, code framing and exception handling sections.
//!
//! # Key Components
//!
//! - [`MethodBody`] - a decoded, editable method body
//! - [`RawMethodBody`] - a framed body whose instructions are still raw bytes
//! - [`MethodBodyHeader`] - the tiny and fat header formats
//! - [`ExceptionHandler`] - one exception handling clause
//! - [`decode_method_bodies`] - parallel decoding of independent bodies
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Common Intermediate Language Physical Layout

mod body;
mod exceptions;
mod types;

pub use body::*;
pub use exceptions::*;
pub use types::*;
