//! Cursor over a byte slice used by every decoder in this crate.
//!
//! [`crate::file::parser::Parser`] keeps a position into borrowed data and offers bounds-checked
//! little-endian reads. Offsets reported in errors are positions within the slice the parser was
//! created over, so a parser built over a whole method body reports body-relative offsets even
//! while decoding its instruction stream.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u32>()?, 0x0403_0201);
//! parser.seek(6)?;
//! assert_eq!(parser.read_le::<u16>()?, 0x0807);
//! assert!(!parser.has_more_data());
//! # Ok::<(), dotcil::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, read_le_at_dyn, CilIO},
    Result,
};

/// A bounds-checked read cursor over borrowed bytes.
///
/// All reads advance the cursor on success and leave it untouched on failure.
#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the first byte of `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the underlying data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True while the cursor has not reached the end of the data
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to `pos`.
    ///
    /// Seeking to exactly the end of the data is allowed; nothing can be read from there.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if `pos` lies beyond the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(truncated_error!(self.position, pos - self.data.len()));
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if fewer than `step` bytes remain.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self.calc_end_position(step)?;
        self.position = end;
        Ok(())
    }

    /// Current cursor position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying data, independent of the cursor position
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read the byte at the cursor without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        match self.data.get(self.position) {
            Some(byte) => Ok(*byte),
            None => Err(truncated_error!(self.position, 1)),
        }
    }

    /// Read a value at the cursor without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if not enough bytes remain.
    pub fn peek_le<T: CilIO>(&self) -> Result<T> {
        let mut temp_position = self.position;
        read_le_at::<T>(self.data, &mut temp_position)
    }

    /// Advance the cursor to the next multiple of `alignment`.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the padding would cross the end of the data.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read a little-endian value and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if not enough bytes remain.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a 4 byte value if `is_large`, otherwise a 2 byte value.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if not enough bytes remain.
    pub fn read_le_dyn(&mut self, is_large: bool) -> Result<u32> {
        read_le_at_dyn(self.data, &mut self.position, is_large)
    }

    /// Number of bytes between the cursor and the end of the data
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check that at least `needed` bytes remain.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if fewer bytes remain.
    pub fn ensure_remaining(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(truncated_error!(self.position, needed));
        }
        Ok(())
    }

    /// Position that lies `length` bytes after the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if that position is beyond the data.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        match self.position.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(end),
            _ => Err(truncated_error!(self.position, length)),
        }
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}
