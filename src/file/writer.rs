//! Growable output buffer used by every encoder in this crate.
//!
//! [`crate::file::writer::Writer`] is the encode-side counterpart of
//! [`crate::file::parser::Parser`]: little-endian primitive writes, raw byte runs and zero
//! padding to an alignment boundary.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::Writer;
//!
//! let mut writer = Writer::new();
//! writer.write_le(0x2Au8);
//! writer.align(4);
//! writer.write_le(0x0403_0201u32);
//! assert_eq!(writer.into_inner(), vec![0x2A, 0, 0, 0, 0x01, 0x02, 0x03, 0x04]);
//! ```

use crate::file::io::CilIO;

/// A little-endian byte sink backed by a `Vec<u8>`.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    data: Vec<u8>,
}

impl Writer {
    /// Create an empty writer
    #[must_use]
    pub fn new() -> Self {
        Writer { data: Vec::new() }
    }

    /// Create an empty writer with room for `capacity` bytes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Writer {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far, which is also the position of the next write
    #[must_use]
    pub fn pos(&self) -> usize {
        self.data.len()
    }

    /// Append a value in little-endian order
    pub fn write_le<T: CilIO>(&mut self, value: T) {
        self.data.extend_from_slice(value.to_le_bytes().as_ref());
    }

    /// Append `value` as 4 bytes if `is_large`, otherwise as 2 bytes
    pub fn write_le_dyn(&mut self, value: u32, is_large: bool) {
        if is_large {
            self.write_le(value);
        } else {
            self.write_le(value as u16);
        }
    }

    /// Append a run of raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Pad with zero bytes up to the next multiple of `alignment`
    pub fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.data.len() % alignment)) % alignment;
        self.data.resize(self.data.len() + padding, 0);
    }

    /// Borrow everything written so far
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the writer and return the written bytes
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mixed_widths() {
        let mut writer = Writer::with_capacity(16);
        writer.write_le(0x01u8);
        writer.write_le(-2i16);
        writer.write_le_dyn(0x1234, false);
        writer.write_le_dyn(0x1234, true);

        assert_eq!(
            writer.as_slice(),
            &[0x01, 0xFE, 0xFF, 0x34, 0x12, 0x34, 0x12, 0x00, 0x00]
        );
        assert_eq!(writer.pos(), 9);
    }

    #[test]
    fn align_pads_with_zero() {
        let mut writer = Writer::new();
        writer.align(4);
        assert_eq!(writer.pos(), 0);

        writer.write_bytes(&[0xFF; 5]);
        writer.align(4);
        assert_eq!(writer.into_inner(), vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0]);
    }
}
