use bitflags::bitflags;

use crate::{
    file::{Parser, Writer},
    Result,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    /// The `HeapSizes` byte of the tables stream header
    pub struct HeapSizes: u8 {
        /// `#Strings` references are 4 bytes wide
        const STRING = 0x01;
        /// `#GUID` references are 4 bytes wide
        const GUID = 0x02;
        /// `#Blob` references are 4 bytes wide
        const BLOB = 0x04;
    }
}

/// The heaps a table row can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapKind {
    /// `#Strings`
    String,
    /// `#GUID`
    Guid,
    /// `#Blob`
    Blob,
}

impl HeapKind {
    fn flag(self) -> HeapSizes {
        match self {
            HeapKind::String => HeapSizes::STRING,
            HeapKind::Guid => HeapSizes::GUID,
            HeapKind::Blob => HeapSizes::BLOB,
        }
    }
}

/// Width in bytes (2 or 4) of references into `heap`
#[must_use]
pub fn heap_index_width(flags: HeapSizes, heap: HeapKind) -> usize {
    if flags.contains(heap.flag()) {
        4
    } else {
        2
    }
}

/// Read a heap reference of `width` bytes.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if the data ends.
pub fn read_heap_index(parser: &mut Parser, width: usize) -> Result<u32> {
    parser.read_le_dyn(width == 4)
}

/// Write a heap reference of `width` bytes.
///
/// The offset is not checked against the heap, only against the width.
///
/// # Errors
/// Returns [`crate::Error::IndexOutOfRange`] if `value` does not fit in 2 bytes and `width` is 2.
/// Nothing is written on error.
pub fn write_heap_index(writer: &mut Writer, value: u32, width: usize) -> Result<()> {
    let is_large = width == 4;
    if !is_large && value > u32::from(u16::MAX) {
        return Err(crate::Error::IndexOutOfRange {
            kind: "heap",
            index: value,
            offset: writer.pos(),
        });
    }

    writer.write_le_dyn(value, is_large);
    Ok(())
}
