use crate::{
    file::{Parser, Writer},
    Error, Result,
};

/// An entry of the Hint/Name Table.
///
/// Stored as a little-endian `u16` hint, the ASCII name, a NUL terminator and one padding byte
/// when needed to keep the entry at an even length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HintName {
    /// Index into the export name pointer table of the exporting DLL, tried first
    pub hint: u16,
    /// The exported name
    pub name: String,
}

impl HintName {
    /// Create a new entry
    #[must_use]
    pub fn new(hint: u16, name: impl Into<String>) -> Self {
        HintName {
            hint,
            name: name.into(),
        }
    }

    /// Read an entry, including its padding byte if one is present.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the name is not terminated and
    /// [`crate::Error::InvalidImport`] if it is not ASCII.
    pub fn read(parser: &mut Parser) -> Result<HintName> {
        let start = parser.pos();
        let hint = parser.read_le::<u16>()?;

        let rest = &parser.data()[parser.pos()..];
        let Some(length) = rest.iter().position(|byte| *byte == 0) else {
            return Err(truncated_error!(parser.pos(), rest.len() + 1));
        };

        let bytes = parser.read_bytes(length)?;
        if !bytes.is_ascii() {
            return Err(Error::InvalidImport(format!(
                "Import name at 0x{start:X} is not ASCII"
            )));
        }
        let name = String::from_utf8_lossy(bytes).into_owned();
        parser.advance_by(1)?;

        if (parser.pos() - start) % 2 != 0 && matches!(parser.peek_byte(), Ok(0)) {
            parser.advance_by(1)?;
        }

        Ok(HintName { hint, name })
    }

    /// Write the entry with its terminator and padding.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidImport`] if the name is not ASCII or contains a NUL.
    pub fn write(&self, writer: &mut Writer) -> Result<()> {
        if !self.name.is_ascii() || self.name.contains('\0') {
            return Err(Error::InvalidImport(format!(
                "Import name '{}' can not be stored",
                self.name.escape_default()
            )));
        }

        writer.write_le::<u16>(self.hint);
        writer.write_bytes(self.name.as_bytes());
        writer.write_le::<u8>(0);
        if self.size() > 2 + self.name.len() + 1 {
            writer.write_le::<u8>(0);
        }
        Ok(())
    }

    /// Size of the encoded entry in bytes, including padding
    #[must_use]
    pub fn size(&self) -> usize {
        (2 + self.name.len() + 1).next_multiple_of(2)
    }
}
