// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dotcil
//!
//! A codec for the binary encodings inside .NET PE images: CIL method bodies, the instruction
//! stream they carry, metadata tokens, coded indices, heap indices and PE import lookup thunks.
//!
//! `dotcil` decodes bytes into an editable form and encodes that form back into bytes. For
//! canonical input the round trip is byte for byte identical; after editing, branch offsets,
//! header formats and section layouts are recomputed on encode.
//!
//! ## Features
//!
//! - **Complete opcode table** - all ECMA-335 opcodes with operand shapes and flow classification
//! - **Index-based labels** - branch targets survive inserting and removing instructions
//! - **Pluggable operands** - members, strings, locals and arguments resolve through traits, so
//!   the codec works with raw tokens or with any object model
//! - **Method body framing** - tiny/fat header selection and exception handling sections
//! - **Metadata indices** - tokens, coded indices and heap indices with per-image widths
//! - **PE imports** - 32- and 64-bit import lookup thunks and hint/name entries
//!
//! ## Quick Start
//!
//! ```rust
//! use dotcil::prelude::*;
//!
//! // Tiny body: ldstr 0x70000001; ret
//! let bytes = [0x1A, 0x72, 0x01, 0x00, 0x00, 0x70, 0x2A];
//! let mut body = MethodBody::decode(&bytes, &RawOperands)?;
//! assert_eq!(body.code.len(), 2);
//!
//! // Insert a nop in front; the body is re-framed on encode
//! body.code.insert(0, CilInstruction::new(opcodes::NOP, Operand::None));
//! let encoded = body.encode(&RawOperands)?;
//! assert_eq!(encoded, [0x1E, 0x00, 0x72, 0x01, 0x00, 0x00, 0x70, 0x2A]);
//! # Ok::<(), dotcil::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`assembly`] - opcodes, instructions, labels and the instruction stream codec
//! - [`metadata`] - tokens, tables, heaps, method bodies and imports
//! - [`file`] - the [`Parser`] read cursor and [`Writer`] output buffer
//! - [`config`] - decoder tolerance via [`CodecConfig`]
//! - [`prelude`] - the commonly used types in one import
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result`]. Decode errors carry the byte offset at which the
//! input went wrong; encode errors name the instruction or value that can not be represented.
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: `debug` for tolerated
//! irregularities such as oversized headers or skipped data sections, `warn` when a lenient
//! configuration drops malformed input.

#[macro_use]
pub(crate) mod error;

pub mod assembly;
pub mod config;
pub mod file;
pub mod metadata;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotcil::prelude::*;
///
/// let code: CilCode<RawModel> = CilCode::new();
/// assert!(MethodBody::new(code).encode(&RawOperands)?.len() == 1);
/// # Ok::<(), dotcil::Error>(())
/// ```
pub mod prelude;

/// `dotcil` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotcil` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// Decoder tolerance settings
pub use config::CodecConfig;

/// Bounds-checked read cursor and little-endian output buffer
pub use file::{Parser, Writer};
