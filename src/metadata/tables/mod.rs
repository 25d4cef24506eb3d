//! Metadata table identifiers, coded indices and per-image reference widths.
//!
//! The instruction stream only ever refers to metadata through tokens, but the widths of
//! table-to-table references (coded indices) and heap references are what every row reader
//! needs. This module provides both halves:
//!
//! - [`crate::metadata::tables::TableId`] - table numbers as used in tokens
//! - [`crate::metadata::tables::CodedIndexType`] / [`crate::metadata::tables::CodedIndex`] -
//!   tag/row packing over a fixed candidate list
//! - [`crate::metadata::tables::TokenSpace`] - row counts and heap flags of one image
//! - [`crate::metadata::tables::TableInfo`] - a `TokenSpace` that caches all coded index widths
//!
//! # Examples
//!
//! ```rust
//! use dotcil::metadata::{
//!     streams::HeapSizes,
//!     tables::{CodedIndexType, TableId, TableInfo, TokenSpace},
//! };
//!
//! let info = TableInfo::new(&[(TableId::TypeRef, 70000)], HeapSizes::empty());
//! assert_eq!(info.coded_index_width(CodedIndexType::MemberRefParent), 4);
//! assert_eq!(info.coded_index_width(CodedIndexType::MethodDefOrRef), 2);
//! ```

mod codedindex;
mod tableid;
mod tableinfo;

pub use codedindex::{coded_index_width, row_bits, CodedIndex, CodedIndexType};
pub use tableid::TableId;
pub use tableinfo::{TableInfo, TokenSpace};
