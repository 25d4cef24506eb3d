//! Byte-level reading and writing.
//!
//! Everything the codecs in [`crate::metadata`] and [`crate::assembly`] read goes through a
//! [`crate::file::parser::Parser`], and everything they produce goes through a
//! [`crate::file::writer::Writer`]. Both are built on the little-endian primitives in
//! [`crate::file::io`].
//!
//! # Key Components
//!
//! - [`crate::file::io`] - `CilIO` and the free `read_le_at` / `write_le_at` functions
//! - [`crate::file::parser::Parser`] - bounds-checked read cursor
//! - [`crate::file::writer::Writer`] - growable little-endian output buffer
//!
//! # Error Handling
//!
//! Reading past the end of the data fails with [`crate::Error::TruncatedStream`]; the error
//! carries the position of the attempted read so callers can report where input ran out.

pub mod io;
pub mod parser;
pub mod writer;

pub use parser::Parser;
pub use writer::Writer;
