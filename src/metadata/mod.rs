//! ECMA-335 metadata primitives and the PE import side.
//!
//! # Key Components
//!
//! - [`token`] - metadata tokens and their table/row split
//! - [`tables`] - table ids, coded indices and per-image index widths
//! - [`streams`] - heap index widths selected by the `HeapSizes` flags
//! - [`method`] - method body headers, code framing and exception handling sections
//! - [`imports`] - import lookup thunks and hint/name entries
//!
//! # Examples
//!
//! ```rust
//! use dotcil::metadata::{tables::TableId, token::Token};
//!
//! let token = Token::from_parts(TableId::MethodDef, 1);
//! assert_eq!(token.value(), 0x0600_0001);
//! assert_eq!(token.table_id()?, TableId::MethodDef);
//! # Ok::<(), dotcil::Error>(())
//! ```

pub mod imports;
pub mod method;
pub mod streams;
pub mod tables;
pub mod token;
