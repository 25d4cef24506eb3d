//! PE import lookup tables and hint/name entries.
//!
//! Every imported DLL has an Import Lookup Table: an array of thunks terminated by a null
//! entry. A thunk is a 32-bit (PE32) or 64-bit (PE32+) integer whose top bit selects between an
//! import by ordinal and an import by name. For named imports the remaining bits hold the RVA
//! of a hint/name entry.
//!
//! ```text
//! Import Lookup Table              Hint/Name Table
//! ├── 0x8000_0078  (ordinal 120)
//! ├── 0x0000_3040  ─────────────▶  ├── hint: u16
//! └── 0x0000_0000  (end)           ├── name: ASCII, NUL terminated
//!                                  └── pad to even length
//! ```
//!
//! # Examples
//!
//! ```rust
//! use dotcil::metadata::imports::{ImportLookupEntry, ThunkWidth};
//!
//! let entry = ImportLookupEntry::ByOrdinal(5);
//! let raw = entry.encode(ThunkWidth::Pe32Plus)?;
//! assert_eq!(raw, 0x8000_0000_0000_0005);
//! assert_eq!(ImportLookupEntry::decode(raw, ThunkWidth::Pe32Plus)?, Some(entry));
//! # Ok::<(), dotcil::Error>(())
//! ```
//!
//! # References
//! - Microsoft PE/COFF Specification, Import Lookup Table and Hint/Name Table

mod hintname;
mod lookup;

pub use hintname::HintName;
pub use lookup::{read_lookup_table, write_lookup_table, ImportLookupEntry, ThunkWidth};
