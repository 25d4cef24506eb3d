//! Exception handler clauses and the method data sections that carry them.
//!
//! Clauses are stored in extra data sections behind the code of a fat method body, each section
//! 4-byte aligned relative to the start of the body. A section uses one of two layouts:
//!
//! | Layout | Header                          | Clause   | Offsets | Lengths |
//! |--------|---------------------------------|----------|---------|---------|
//! | Small  | flags, 1-byte size, 2 reserved  | 12 bytes | 2 bytes | 1 byte  |
//! | Fat    | flags, 3-byte size              | 24 bytes | 4 bytes | 4 bytes |
//!
//! The size field counts the section header as well as the clauses. When writing, a single
//! section is emitted and all clauses use the fat layout as soon as one of them needs it.
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4.5 - Method Data Section
//! - ECMA-335 6th Edition, Partition II, Section 25.4.6 - Exception Handling Clauses

use bitflags::bitflags;

use crate::{
    config::CodecConfig,
    file::{Parser, Writer},
    metadata::{
        method::{SectionFlags, SECTION_HEADER_SIZE},
        token::Token,
    },
    Result,
};

/// Size of a clause in the small layout
pub const SMALL_CLAUSE_SIZE: usize = 12;
/// Size of a clause in the fat layout
pub const FAT_CLAUSE_SIZE: usize = 24;
/// Largest data size the 1-byte size field of a small section can hold
const SMALL_SECTION_MAX_SIZE: usize = 0xFF;
/// Largest data size the 3-byte size field of a fat section can hold
const FAT_SECTION_MAX_SIZE: usize = 0x00FF_FFFF;

bitflags! {
    /// Exception handler flags defining the type of exception handling clause.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExceptionHandlerFlags: u16 {
        /// A typed exception clause.
        ///
        /// The token field contains the metadata token of the exception type that this
        /// handler catches.
        const EXCEPTION = 0x0000;

        /// An exception filter and handler clause.
        ///
        /// The token field contains the offset of the filter code.
        const FILTER = 0x0001;

        /// A finally clause.
        const FINALLY = 0x0002;

        /// A fault clause (finally that executes only on exception).
        const FAULT = 0x0004;
    }
}

/// The kind of an exception handling clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionHandlerKind {
    /// `catch (Type)`
    Catch,
    /// `catch when (filter)`
    Filter,
    /// `finally`
    Finally,
    /// `fault`
    Fault,
}

impl ExceptionHandlerKind {
    /// Kind described by the raw clause flags, `None` for undefined values
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        let flags = ExceptionHandlerFlags::from_bits(u16::try_from(raw).ok()?)?;
        if flags == ExceptionHandlerFlags::EXCEPTION {
            Some(ExceptionHandlerKind::Catch)
        } else if flags == ExceptionHandlerFlags::FILTER {
            Some(ExceptionHandlerKind::Filter)
        } else if flags == ExceptionHandlerFlags::FINALLY {
            Some(ExceptionHandlerKind::Finally)
        } else if flags == ExceptionHandlerFlags::FAULT {
            Some(ExceptionHandlerKind::Fault)
        } else {
            None
        }
    }

    /// The clause flags of this kind
    #[must_use]
    pub fn flags(self) -> ExceptionHandlerFlags {
        match self {
            ExceptionHandlerKind::Catch => ExceptionHandlerFlags::EXCEPTION,
            ExceptionHandlerKind::Filter => ExceptionHandlerFlags::FILTER,
            ExceptionHandlerKind::Finally => ExceptionHandlerFlags::FINALLY,
            ExceptionHandlerKind::Fault => ExceptionHandlerFlags::FAULT,
        }
    }
}

/// Exception handler defining one try/handler region pair within a method.
///
/// Offsets are byte offsets from the start of the code.
///
/// # Layout in IL
///
/// ```text
/// try {
///     // try_offset -> try_offset + try_length
/// }
/// catch (ExceptionType) {
///     // handler_offset -> handler_offset + handler_length
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExceptionHandler {
    /// Kind of the clause
    pub kind: ExceptionHandlerKind,
    /// Offset in bytes of the try block
    pub try_offset: u32,
    /// Length in bytes of the try block
    pub try_length: u32,
    /// Offset in bytes of the handler
    pub handler_offset: u32,
    /// Length in bytes of the handler
    pub handler_length: u32,
    /// Type token for `Catch`, filter offset for `Filter`, stored verbatim for the other kinds
    pub class_token_or_filter_offset: u32,
}

impl ExceptionHandler {
    /// The caught type of a `Catch` clause
    #[must_use]
    pub fn class_token(&self) -> Option<Token> {
        (self.kind == ExceptionHandlerKind::Catch)
            .then(|| Token::new(self.class_token_or_filter_offset))
    }

    /// The filter offset of a `Filter` clause
    #[must_use]
    pub fn filter_offset(&self) -> Option<u32> {
        (self.kind == ExceptionHandlerKind::Filter).then_some(self.class_token_or_filter_offset)
    }

    /// True if the clause does not fit the small layout
    #[must_use]
    pub fn requires_fat(&self) -> bool {
        self.try_offset > u32::from(u16::MAX)
            || self.handler_offset > u32::from(u16::MAX)
            || self.try_length > u32::from(u8::MAX)
            || self.handler_length > u32::from(u8::MAX)
    }

    fn read(parser: &mut Parser, is_fat: bool) -> Result<ExceptionHandler> {
        let offset = parser.pos();

        let (raw_flags, try_offset, try_length, handler_offset, handler_length) = if is_fat {
            (
                parser.read_le::<u32>()?,
                parser.read_le::<u32>()?,
                parser.read_le::<u32>()?,
                parser.read_le::<u32>()?,
                parser.read_le::<u32>()?,
            )
        } else {
            (
                u32::from(parser.read_le::<u16>()?),
                u32::from(parser.read_le::<u16>()?),
                u32::from(parser.read_le::<u8>()?),
                u32::from(parser.read_le::<u16>()?),
                u32::from(parser.read_le::<u8>()?),
            )
        };
        let class_token_or_filter_offset = parser.read_le::<u32>()?;

        let Some(kind) = ExceptionHandlerKind::from_raw(raw_flags) else {
            return Err(malformed_error!(
                offset,
                "Unknown exception clause flags 0x{:X}",
                raw_flags
            ));
        };

        Ok(ExceptionHandler {
            kind,
            try_offset,
            try_length,
            handler_offset,
            handler_length,
            class_token_or_filter_offset,
        })
    }

    // Callers guarantee the small layout is only used when `requires_fat` is false
    #[allow(clippy::cast_possible_truncation)]
    fn write(&self, writer: &mut Writer, is_fat: bool) {
        let flags = self.kind.flags().bits();

        if is_fat {
            writer.write_le::<u32>(u32::from(flags));
            writer.write_le::<u32>(self.try_offset);
            writer.write_le::<u32>(self.try_length);
            writer.write_le::<u32>(self.handler_offset);
            writer.write_le::<u32>(self.handler_length);
        } else {
            writer.write_le::<u16>(flags);
            writer.write_le::<u16>(self.try_offset as u16);
            writer.write_le::<u8>(self.try_length as u8);
            writer.write_le::<u16>(self.handler_offset as u16);
            writer.write_le::<u8>(self.handler_length as u8);
        }
        writer.write_le::<u32>(self.class_token_or_filter_offset);
    }
}

/// True if `handlers` must be written in the fat layout.
///
/// That is the case when any clause needs wide fields, or when the clauses together exceed the
/// 1-byte size field of a small section.
#[must_use]
pub fn is_fat_required(handlers: &[ExceptionHandler]) -> bool {
    SECTION_HEADER_SIZE + handlers.len() * SMALL_CLAUSE_SIZE > SMALL_SECTION_MAX_SIZE
        || handlers.iter().any(ExceptionHandler::requires_fat)
}

/// Encoded size of the section holding `handlers`, `0` if there are none
#[must_use]
pub fn section_size(handlers: &[ExceptionHandler]) -> usize {
    if handlers.is_empty() {
        return 0;
    }

    let clause_size = if is_fat_required(handlers) {
        FAT_CLAUSE_SIZE
    } else {
        SMALL_CLAUSE_SIZE
    };
    SECTION_HEADER_SIZE + handlers.len() * clause_size
}

/// Read the data sections following the code of a fat method body.
///
/// The parser must be positioned directly behind the code, with position 0 being the start of
/// the method body. Sections that do not carry exception handling data are skipped.
///
/// With `config.lenient_exception_sections` a malformed section ends the section list and the
/// clauses of all previous sections are returned.
///
/// # Errors
/// Returns [`crate::Error::TruncatedStream`] if a section runs past the data and
/// [`crate::Error::MalformedHeader`] if its size is not a whole number of clauses or a clause has
/// undefined flags.
pub fn read_sections(parser: &mut Parser, config: &CodecConfig) -> Result<Vec<ExceptionHandler>> {
    let mut handlers = Vec::new();

    loop {
        match read_section(parser) {
            Ok((clauses, more_sections)) => {
                handlers.extend(clauses);
                if !more_sections {
                    break;
                }
            }
            Err(error) if config.lenient_exception_sections => {
                log::warn!(
                    "Dropping malformed method data section, keeping {} clause(s): {}",
                    handlers.len(),
                    error
                );
                break;
            }
            Err(error) => return Err(error),
        }
    }

    Ok(handlers)
}

fn read_section(parser: &mut Parser) -> Result<(Vec<ExceptionHandler>, bool)> {
    parser.align(4)?;

    let start = parser.pos();
    let header = parser.read_le::<u32>()?;
    let flags = SectionFlags::from_bits_retain((header & 0xFF) as u8);
    let is_fat = flags.contains(SectionFlags::FAT_FORMAT);
    let data_size = if is_fat {
        (header >> 8) as usize
    } else {
        ((header >> 8) & 0xFF) as usize
    };

    if data_size < SECTION_HEADER_SIZE {
        return Err(malformed_error!(
            start,
            "Method data section size {} is smaller than its header",
            data_size
        ));
    }

    let payload = data_size - SECTION_HEADER_SIZE;
    let more_sections = flags.contains(SectionFlags::MORE_SECTS);

    if !flags.contains(SectionFlags::EHTABLE) {
        log::debug!(
            "Skipping method data section with flags 0x{:02X} ({} bytes)",
            flags.bits(),
            data_size
        );
        parser.advance_by(payload)?;
        return Ok((Vec::new(), more_sections));
    }

    let clause_size = if is_fat {
        FAT_CLAUSE_SIZE
    } else {
        SMALL_CLAUSE_SIZE
    };
    if payload % clause_size != 0 {
        return Err(malformed_error!(
            start,
            "Exception section of {} bytes is not a whole number of {} byte clauses",
            data_size,
            clause_size
        ));
    }
    parser.ensure_remaining(payload)?;

    let mut clauses = Vec::with_capacity(payload / clause_size);
    for _ in 0..payload / clause_size {
        clauses.push(ExceptionHandler::read(parser, is_fat)?);
    }

    Ok((clauses, more_sections))
}

/// Check that `handlers` fit a single exception handling section.
///
/// # Errors
/// Returns [`crate::Error::MalformedHeader`] at `offset` if the clauses exceed the 3-byte size
/// field of a fat section.
pub fn check_section(handlers: &[ExceptionHandler], offset: usize) -> Result<()> {
    if section_size(handlers) > FAT_SECTION_MAX_SIZE {
        return Err(malformed_error!(
            offset,
            "{} exception clauses exceed the section size limit",
            handlers.len()
        ));
    }
    Ok(())
}

/// Write `handlers` as a single exception handling section.
///
/// Padding up to the next 4-byte boundary relative to `body_start` is written first. Nothing is
/// written for an empty list.
///
/// # Errors
/// Returns [`crate::Error::MalformedHeader`] if the clauses exceed the 3-byte size field of a
/// fat section.
pub fn write_section(
    writer: &mut Writer,
    body_start: usize,
    handlers: &[ExceptionHandler],
) -> Result<()> {
    if handlers.is_empty() {
        return Ok(());
    }

    check_section(handlers, writer.pos())?;
    let is_fat = is_fat_required(handlers);
    let data_size = section_size(handlers);

    let padding = (4 - (writer.pos() - body_start) % 4) % 4;
    writer.write_bytes(&[0u8; 3][..padding]);

    let mut flags = SectionFlags::EHTABLE;
    if is_fat {
        flags |= SectionFlags::FAT_FORMAT;
    }
    writer.write_le::<u32>(u32::from(flags.bits()) | ((data_size as u32) << 8));

    for handler in handlers {
        handler.write(writer, is_fat);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn clause(kind: ExceptionHandlerKind, try_length: u32) -> ExceptionHandler {
        ExceptionHandler {
            kind,
            try_offset: 0,
            try_length,
            handler_offset: 0x10,
            handler_length: 4,
            class_token_or_filter_offset: 0,
        }
    }

    fn write(handlers: &[ExceptionHandler]) -> Vec<u8> {
        let mut writer = Writer::new();
        write_section(&mut writer, 0, handlers).unwrap();
        writer.into_inner()
    }

    #[test]
    fn kinds_from_flags() {
        assert_eq!(ExceptionHandlerKind::from_raw(0), Some(ExceptionHandlerKind::Catch));
        assert_eq!(ExceptionHandlerKind::from_raw(1), Some(ExceptionHandlerKind::Filter));
        assert_eq!(ExceptionHandlerKind::from_raw(2), Some(ExceptionHandlerKind::Finally));
        assert_eq!(ExceptionHandlerKind::from_raw(4), Some(ExceptionHandlerKind::Fault));
        assert_eq!(ExceptionHandlerKind::from_raw(3), None);
        assert_eq!(ExceptionHandlerKind::from_raw(0x1_0000), None);
    }

    #[test]
    fn read_small_section() {
        // From a finally region: try 0x08+0x1B, handler 0x23+0x0A
        let data = [
            0x01, 0x10, 0x00, 0x00, // EHTABLE, 16 bytes
            0x02, 0x00, 0x08, 0x00, 0x1B, 0x23, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut parser = Parser::new(&data);
        let handlers = read_sections(&mut parser, &CodecConfig::default()).unwrap();

        assert_eq!(
            handlers,
            [ExceptionHandler {
                kind: ExceptionHandlerKind::Finally,
                try_offset: 0x08,
                try_length: 0x1B,
                handler_offset: 0x23,
                handler_length: 0x0A,
                class_token_or_filter_offset: 0,
            }]
        );
        assert_eq!(parser.pos(), data.len());
        assert_eq!(write(&handlers), data);
    }

    #[test]
    fn read_fat_section() {
        let mut data = vec![0x41, 0x1C, 0x00, 0x00];
        for value in [0u32, 0, 0x1_0000, 0x1_0000, 3, 0x0100_001D] {
            data.extend_from_slice(&value.to_le_bytes());
        }

        let mut parser = Parser::new(&data);
        let handlers = read_sections(&mut parser, &CodecConfig::default()).unwrap();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].kind, ExceptionHandlerKind::Catch);
        assert_eq!(handlers[0].try_length, 0x1_0000);
        assert_eq!(handlers[0].class_token(), Some(Token::new(0x0100_001D)));
        assert_eq!(handlers[0].filter_offset(), None);
        assert_eq!(write(&handlers), data);
    }

    #[test]
    fn read_chained_sections() {
        let data = [
            0x80, 0x08, 0x00, 0x00, 0xAA, 0xBB, 0xCC, 0xDD, // non-EH section, more follow
            0x01, 0x10, 0x00, 0x00, // EH section
            0x04, 0x00, 0x00, 0x00, 0x02, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut parser = Parser::new(&data);
        let handlers = read_sections(&mut parser, &CodecConfig::default()).unwrap();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].kind, ExceptionHandlerKind::Fault);
        assert_eq!(handlers[0].handler_offset, 2);
    }

    #[test]
    fn reject_partial_clause() {
        // 4 + 13 bytes is not a whole number of small clauses
        let mut data = vec![0x01, 0x11, 0x00, 0x00];
        data.extend_from_slice(&[0u8; 13]);
        let mut parser = Parser::new(&data);
        assert!(matches!(
            read_sections(&mut parser, &CodecConfig::default()),
            Err(Error::MalformedHeader { offset: 0, .. })
        ));

        // Size below the header size
        let data = [0x01, 0x02, 0x00, 0x00];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            read_sections(&mut parser, &CodecConfig::default()),
            Err(Error::MalformedHeader { offset: 0, .. })
        ));
    }

    #[test]
    fn reject_truncated_section() {
        let data = [0x01, 0x1C, 0x00, 0x00, 0x00, 0x00];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            read_sections(&mut parser, &CodecConfig::default()),
            Err(Error::TruncatedStream { offset: 4, .. })
        ));
    }

    #[test]
    fn lenient_keeps_previous_sections() {
        let mut data = vec![
            0x81, 0x10, 0x00, 0x00, // EH section, more follow
            0x02, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        // Second section has undefined clause flags
        data.extend_from_slice(&[0x01, 0x10, 0x00, 0x00, 0x07, 0x00]);
        data.extend_from_slice(&[0u8; 10]);

        let mut parser = Parser::new(&data);
        assert!(matches!(
            read_sections(&mut parser, &CodecConfig::default()),
            Err(Error::MalformedHeader { offset: 20, .. })
        ));

        let mut parser = Parser::new(&data);
        let handlers = read_sections(&mut parser, &CodecConfig::lenient()).unwrap();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].kind, ExceptionHandlerKind::Finally);
    }

    #[test]
    fn escalate_all_clauses_to_fat() {
        let handlers = [
            clause(ExceptionHandlerKind::Catch, 2),
            clause(ExceptionHandlerKind::Finally, 0x1_0000),
            clause(ExceptionHandlerKind::Fault, 3),
        ];
        assert!(is_fat_required(&handlers));
        assert_eq!(section_size(&handlers), 4 + 3 * 24);

        let bytes = write(&handlers);
        assert_eq!(bytes.len(), 4 + 3 * 24);
        assert_eq!(bytes[..4], [0x41, 0x4C, 0x00, 0x00]);
        // Every clause uses 4-byte fields
        assert_eq!(bytes[4..8], 0u32.to_le_bytes());
        assert_eq!(bytes[28..32], 2u32.to_le_bytes());
        assert_eq!(bytes[52..56], 4u32.to_le_bytes());
        assert_eq!(bytes[36..40], 0x1_0000u32.to_le_bytes());

        let mut parser = Parser::new(&bytes);
        let read = read_sections(&mut parser, &CodecConfig::default()).unwrap();
        assert_eq!(read, handlers);
    }

    #[test]
    fn escalate_on_clause_count() {
        let small: Vec<_> = (0..20).map(|_| clause(ExceptionHandlerKind::Catch, 1)).collect();
        assert!(!is_fat_required(&small));
        assert_eq!(section_size(&small), 4 + 20 * 12);

        let many: Vec<_> = (0..21).map(|_| clause(ExceptionHandlerKind::Catch, 1)).collect();
        assert!(is_fat_required(&many));
        assert_eq!(section_size(&many), 4 + 21 * 24);
    }

    #[test]
    fn write_aligns_relative_to_body() {
        let mut writer = Writer::new();
        writer.write_bytes(&[0xEE; 7]);
        write_section(&mut writer, 1, &[clause(ExceptionHandlerKind::Catch, 1)]).unwrap();

        let bytes = writer.into_inner();
        assert_eq!(bytes[7..10], [0x00, 0x00, 0x01]);
        assert_eq!(bytes.len(), 9 + 16);
        assert_eq!(section_size(&[]), 0);
    }
}
