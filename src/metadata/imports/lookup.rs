use crate::{
    file::{Parser, Writer},
    Error, Result,
};

/// Width of an import thunk, determined by the optional header magic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThunkWidth {
    /// 32-bit thunks, ordinal flag in bit 31
    Pe32,
    /// 64-bit thunks, ordinal flag in bit 63
    Pe32Plus,
}

impl ThunkWidth {
    /// Size of one thunk in bytes
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            ThunkWidth::Pe32 => 4,
            ThunkWidth::Pe32Plus => 8,
        }
    }

    /// The ordinal flag
    #[must_use]
    pub fn ordinal_flag(self) -> u64 {
        match self {
            ThunkWidth::Pe32 => 0x8000_0000,
            ThunkWidth::Pe32Plus => 0x8000_0000_0000_0000,
        }
    }

    fn value_mask(self) -> u64 {
        self.ordinal_flag() - 1
    }
}

/// One non-null entry of an Import Lookup Table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportLookupEntry {
    /// Import by ordinal
    ByOrdinal(u16),
    /// Import by name, through a hint/name entry
    ByName {
        /// RVA of the [`crate::metadata::imports::HintName`] entry
        hint_name_rva: u32,
    },
}

impl ImportLookupEntry {
    /// Decode a thunk. Returns `None` for the null entry that terminates a table.
    ///
    /// The tag bit is masked off before the RVA is interpreted, and only the low 16 bits of an
    /// ordinal thunk are significant.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidImport`] if `raw` does not fit a PE32 thunk or a PE32+
    /// name RVA does not fit 32 bits.
    pub fn decode(raw: u64, width: ThunkWidth) -> Result<Option<ImportLookupEntry>> {
        if width == ThunkWidth::Pe32 && raw > u64::from(u32::MAX) {
            return Err(Error::InvalidImport(format!(
                "0x{raw:X} does not fit a 32-bit thunk"
            )));
        }

        if raw == 0 {
            return Ok(None);
        }

        if raw & width.ordinal_flag() != 0 {
            let value = raw & width.value_mask();
            if value > 0xFFFF {
                log::debug!("Ignoring reserved bits of ordinal thunk 0x{:X}", raw);
            }

            #[allow(clippy::cast_possible_truncation)]
            return Ok(Some(ImportLookupEntry::ByOrdinal((value & 0xFFFF) as u16)));
        }

        let rva = raw & width.value_mask();
        let hint_name_rva = u32::try_from(rva)
            .map_err(|_| Error::InvalidImport(format!("Hint/name RVA 0x{rva:X} exceeds 32 bits")))?;

        Ok(Some(ImportLookupEntry::ByName { hint_name_rva }))
    }

    /// Encode the entry as a thunk of `width`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidImport`] if a name RVA has bit 31 set, which would collide
    /// with the ordinal flag of a 32-bit thunk, or if a name RVA is zero.
    pub fn encode(&self, width: ThunkWidth) -> Result<u64> {
        match *self {
            ImportLookupEntry::ByOrdinal(ordinal) => Ok(width.ordinal_flag() | u64::from(ordinal)),
            ImportLookupEntry::ByName { hint_name_rva } => {
                if hint_name_rva & 0x8000_0000 != 0 {
                    return Err(Error::InvalidImport(format!(
                        "Hint/name RVA 0x{hint_name_rva:08X} has the ordinal flag set"
                    )));
                }
                if hint_name_rva == 0 {
                    return Err(Error::InvalidImport(
                        "Hint/name RVA 0 encodes the table terminator".to_string(),
                    ));
                }
                Ok(u64::from(hint_name_rva))
            }
        }
    }

    /// Read one thunk. Returns `None` for the terminating null entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the thunk is cut short.
    pub fn read(parser: &mut Parser, width: ThunkWidth) -> Result<Option<ImportLookupEntry>> {
        let raw = match width {
            ThunkWidth::Pe32 => u64::from(parser.read_le::<u32>()?),
            ThunkWidth::Pe32Plus => parser.read_le::<u64>()?,
        };
        Self::decode(raw, width)
    }

    /// Write one thunk.
    ///
    /// # Errors
    /// See [`ImportLookupEntry::encode`].
    pub fn write(&self, writer: &mut Writer, width: ThunkWidth) -> Result<()> {
        write_thunk(writer, self.encode(width)?, width);
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_thunk(writer: &mut Writer, raw: u64, width: ThunkWidth) {
    match width {
        ThunkWidth::Pe32 => writer.write_le::<u32>(raw as u32),
        ThunkWidth::Pe32Plus => writer.write_le::<u64>(raw),
    }
}

/// Read an Import Lookup Table up to and including its null terminator.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if the data ends before the terminator and
/// [`crate::Error::InvalidImport`] for undecodable thunks.
pub fn read_lookup_table(parser: &mut Parser, width: ThunkWidth) -> Result<Vec<ImportLookupEntry>> {
    let mut entries = Vec::new();
    while let Some(entry) = ImportLookupEntry::read(parser, width)? {
        entries.push(entry);
    }
    Ok(entries)
}

/// Write `entries` followed by the null terminator.
///
/// # Errors
/// See [`ImportLookupEntry::encode`].
pub fn write_lookup_table(
    writer: &mut Writer,
    entries: &[ImportLookupEntry],
    width: ThunkWidth,
) -> Result<()> {
    for entry in entries {
        entry.write(writer, width)?;
    }
    write_thunk(writer, 0, width);
    Ok(())
}
