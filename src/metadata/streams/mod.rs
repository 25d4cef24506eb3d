//! Metadata heap references.
//!
//! Rows of the metadata tables reference the `#Strings`, `#GUID` and `#Blob` heaps by offset.
//! Each of the three kinds of reference is stored in 2 or 4 bytes for the whole image, as
//! selected by the `HeapSizes` byte of the tables stream header.
//!
//! # Key Components
//!
//! - [`crate::metadata::streams::HeapSizes`] - the heap size flag byte
//! - [`crate::metadata::streams::heap_index_width`] - 2 or 4 byte selection
//! - [`crate::metadata::streams::read_heap_index`] / [`crate::metadata::streams::write_heap_index`]

mod heapindex;

pub use heapindex::{heap_index_width, read_heap_index, write_heap_index, HeapKind, HeapSizes};
