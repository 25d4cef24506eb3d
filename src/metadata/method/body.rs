//! Representation, parsing and writing of CIL method bodies.
//!
//! A method body is a tiny or fat header, the CIL code and, for fat bodies, optional data
//! sections carrying exception handling clauses. Decoding happens in two phases:
//!
//! 1. [`RawMethodBody::read`] frames the body: header, code bytes and exception clauses. No
//!    instruction is decoded and no resolver is involved.
//! 2. [`RawMethodBody::resolve`] decodes the instructions through an
//!    [`crate::assembly::OperandResolver`] into a [`MethodBody`].
//!
//! [`MethodBody::decode`] runs both phases in one go. Encoding recomputes the header from the
//! current state of the body, picking the tiny format whenever it can describe the body.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::{assembly::RawOperands, metadata::method::MethodBody};
//!
//! // Tiny header for 2 code bytes, then ldarg.0; ret
//! let bytes = [0x0A, 0x02, 0x2A];
//! let body = MethodBody::decode(&bytes, &RawOperands)?;
//!
//! assert!(!body.is_fat());
//! assert_eq!(body.max_stack, 8);
//! assert_eq!(body.code.len(), 2);
//! assert_eq!(body.encode(&RawOperands)?, bytes);
//! # Ok::<(), dotcil::Error>(())
//! ```
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Common Intermediate Language Physical Layout

use std::fmt;

use rayon::prelude::*;

use crate::{
    assembly::{
        decode_stream, encode_stream, CilCode, OperandBuilder, OperandModel, OperandResolver,
    },
    config::CodecConfig,
    file::{Parser, Writer},
    metadata::{
        method::{
            check_section, read_sections, section_size, write_section, ExceptionHandler,
            MethodBodyFlags, FAT_HEADER_SIZE, METHOD_BODY_FLAGS_MASK, METHOD_BODY_FORMAT_MASK,
            TINY_MAX_CODE_SIZE, TINY_MAX_STACK,
        },
        token::Token,
    },
    Result,
};

/// The header of a method body as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodBodyHeader {
    /// One byte: format bits and a 6-bit code size
    Tiny {
        /// Size of the code in bytes (at most 63)
        code_size: u32,
    },
    /// Twelve bytes: flags, header size, stack depth, code size and locals signature
    Fat {
        /// Flag bits of the first header word, including the format bits
        flags: MethodBodyFlags,
        /// Maximum number of items on the operand stack
        max_stack: u16,
        /// Size of the code in bytes
        code_size: u32,
        /// `StandAloneSig` token of the local variable signature, null if there are no locals
        local_var_sig_token: Token,
    },
}

impl MethodBodyHeader {
    /// Read a header, leaving the parser on the first code byte.
    ///
    /// Fat headers that declare more than 12 bytes are accepted and the extra bytes skipped.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] if the format bits are neither tiny nor fat or
    /// a fat header declares less than 12 bytes, and [`crate::Error::TruncatedStream`] if the
    /// header is cut short.
    pub fn read(parser: &mut Parser) -> Result<MethodBodyHeader> {
        let start = parser.pos();
        let first_byte = parser.peek_byte()?;

        match u16::from(first_byte & METHOD_BODY_FORMAT_MASK) {
            format if format == MethodBodyFlags::TINY_FORMAT.bits() => {
                parser.advance_by(1)?;
                Ok(MethodBodyHeader::Tiny {
                    code_size: u32::from(first_byte >> 2),
                })
            }
            format if format == MethodBodyFlags::FAT_FORMAT.bits() => {
                parser.ensure_remaining(FAT_HEADER_SIZE)?;

                let first_duo = parser.read_le::<u16>()?;
                let max_stack = parser.read_le::<u16>()?;
                let code_size = parser.read_le::<u32>()?;
                let local_var_sig_token = Token::new(parser.read_le::<u32>()?);

                let header_size = usize::from(first_duo >> 12) * 4;
                if header_size < FAT_HEADER_SIZE {
                    return Err(malformed_error!(
                        start,
                        "Fat method header declares {} bytes",
                        header_size
                    ));
                }
                if header_size > FAT_HEADER_SIZE {
                    log::debug!(
                        "Skipping {} extra bytes of fat method header",
                        header_size - FAT_HEADER_SIZE
                    );
                    parser.advance_by(header_size - FAT_HEADER_SIZE)?;
                }

                Ok(MethodBodyHeader::Fat {
                    flags: MethodBodyFlags::from_bits_retain(first_duo & METHOD_BODY_FLAGS_MASK),
                    max_stack,
                    code_size,
                    local_var_sig_token,
                })
            }
            _ => Err(malformed_error!(
                start,
                "Method header is neither fat nor tiny - 0x{:02X}",
                first_byte
            )),
        }
    }

    /// Write the header.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] if a tiny header carries a code size above 63.
    /// Nothing is written on error.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write(&self, writer: &mut Writer) -> Result<()> {
        match *self {
            MethodBodyHeader::Tiny { code_size } => {
                if code_size as usize > TINY_MAX_CODE_SIZE {
                    return Err(malformed_error!(
                        writer.pos(),
                        "Code size {} does not fit a tiny header",
                        code_size
                    ));
                }

                let format = MethodBodyFlags::TINY_FORMAT.bits() as u8;
                writer.write_le::<u8>(((code_size as u8) << 2) | format);
            }
            MethodBodyHeader::Fat {
                flags,
                max_stack,
                code_size,
                local_var_sig_token,
            } => {
                let size_nibble = (FAT_HEADER_SIZE / 4) as u16;
                let first_duo = (flags.bits() & METHOD_BODY_FLAGS_MASK) | (size_nibble << 12);
                writer.write_le::<u16>(first_duo);
                writer.write_le::<u16>(max_stack);
                writer.write_le::<u32>(code_size);
                writer.write_le::<u32>(local_var_sig_token.value());
            }
        }
        Ok(())
    }

    /// True for the fat format
    #[must_use]
    pub fn is_fat(&self) -> bool {
        matches!(self, MethodBodyHeader::Fat { .. })
    }

    /// Size of the code in bytes
    #[must_use]
    pub fn code_size(&self) -> usize {
        match *self {
            MethodBodyHeader::Tiny { code_size } | MethodBodyHeader::Fat { code_size, .. } => {
                code_size as usize
            }
        }
    }

    /// Maximum stack depth, 8 for tiny headers
    #[must_use]
    pub fn max_stack(&self) -> u16 {
        match *self {
            MethodBodyHeader::Tiny { .. } => TINY_MAX_STACK,
            MethodBodyHeader::Fat { max_stack, .. } => max_stack,
        }
    }

    /// Local variable signature token, null for tiny headers
    #[must_use]
    pub fn local_var_sig_token(&self) -> Token {
        match *self {
            MethodBodyHeader::Tiny { .. } => Token::new(0),
            MethodBodyHeader::Fat {
                local_var_sig_token,
                ..
            } => local_var_sig_token,
        }
    }

    /// True if locals are zero-initialised
    #[must_use]
    pub fn init_locals(&self) -> bool {
        match self {
            MethodBodyHeader::Tiny { .. } => false,
            MethodBodyHeader::Fat { flags, .. } => flags.contains(MethodBodyFlags::INIT_LOCALS),
        }
    }

    /// True if data sections follow the code
    #[must_use]
    pub fn has_sections(&self) -> bool {
        match self {
            MethodBodyHeader::Tiny { .. } => false,
            MethodBodyHeader::Fat { flags, .. } => flags.contains(MethodBodyFlags::MORE_SECTS),
        }
    }
}

/// A framed method body whose instructions have not been decoded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMethodBody<'a> {
    /// The header
    pub header: MethodBodyHeader,
    /// Size of the header in bytes
    pub header_size: usize,
    /// The code bytes
    pub code: &'a [u8],
    /// Exception handling clauses of all sections
    pub exception_handlers: Vec<ExceptionHandler>,
    /// Number of bytes the body occupies, including section padding
    pub size: usize,
    data: &'a [u8],
}

impl<'a> RawMethodBody<'a> {
    /// Frame the method body at the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] for invalid headers or sections and
    /// [`crate::Error::TruncatedStream`] if the header, the code or a section runs past `data`.
    pub fn read(data: &'a [u8], config: &CodecConfig) -> Result<RawMethodBody<'a>> {
        let mut parser = Parser::new(data);

        let header = MethodBodyHeader::read(&mut parser)?;
        let header_size = parser.pos();
        let code = parser.read_bytes(header.code_size())?;

        // Exception Handling -> II.25.4.6
        let exception_handlers = if header.has_sections() {
            read_sections(&mut parser, config)?
        } else {
            Vec::new()
        };

        let size = parser.pos();
        Ok(RawMethodBody {
            header,
            header_size,
            code,
            exception_handlers,
            size,
            data: &data[..size],
        })
    }

    /// Decode the instructions through `resolver`.
    ///
    /// A non-null local variable signature token is resolved first, and the resulting locals
    /// are used for every local variable operand.
    ///
    /// # Errors
    /// Returns any error of [`crate::assembly::decode_stream`] or of the resolver. Error offsets
    /// are relative to the start of the method body.
    pub fn resolve<R>(&self, resolver: &R, config: &CodecConfig) -> Result<MethodBody<R::Model>>
    where
        R: OperandResolver + ?Sized,
    {
        let local_var_sig_token = self.header.local_var_sig_token();
        let local_variables = if local_var_sig_token.is_null() {
            Vec::new()
        } else {
            resolver.resolve_local_signature(local_var_sig_token)?
        };

        let mut parser = Parser::new(self.data);
        parser.seek(self.header_size)?;
        let code = decode_stream(
            &mut parser,
            self.code.len(),
            resolver,
            &local_variables,
            config,
        )?;

        Ok(MethodBody {
            max_stack: self.header.max_stack(),
            init_locals: self.header.init_locals(),
            local_var_sig_token,
            local_variables,
            code,
            exception_handlers: self.exception_handlers.clone(),
        })
    }
}

/// Describes one method that has been compiled to CIL bytecode.
///
/// The header format is not stored. It is derived from the fields every time the body is
/// encoded or measured.
pub struct MethodBody<M: OperandModel> {
    /// Maximum number of items on the operand stack
    pub max_stack: u16,
    /// Call the default constructor on all local variables
    pub init_locals: bool,
    /// `StandAloneSig` token for the local variable signature, null if there is none
    pub local_var_sig_token: Token,
    /// The resolved local variables
    pub local_variables: Vec<M::Local>,
    /// The instructions
    pub code: CilCode<M>,
    /// The exception handling clauses
    pub exception_handlers: Vec<ExceptionHandler>,
}

impl<M: OperandModel> Clone for MethodBody<M> {
    fn clone(&self) -> Self {
        MethodBody {
            max_stack: self.max_stack,
            init_locals: self.init_locals,
            local_var_sig_token: self.local_var_sig_token,
            local_variables: self.local_variables.clone(),
            code: self.code.clone(),
            exception_handlers: self.exception_handlers.clone(),
        }
    }
}

impl<M: OperandModel> PartialEq for MethodBody<M> {
    fn eq(&self, other: &Self) -> bool {
        self.max_stack == other.max_stack
            && self.init_locals == other.init_locals
            && self.local_var_sig_token == other.local_var_sig_token
            && self.local_variables == other.local_variables
            && self.code == other.code
            && self.exception_handlers == other.exception_handlers
    }
}

impl<M: OperandModel> fmt::Debug for MethodBody<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBody")
            .field("max_stack", &self.max_stack)
            .field("init_locals", &self.init_locals)
            .field("local_var_sig_token", &self.local_var_sig_token)
            .field("local_variables", &self.local_variables)
            .field("code", &self.code)
            .field("exception_handlers", &self.exception_handlers)
            .finish()
    }
}

impl<M: OperandModel> MethodBody<M> {
    /// Create a body around `code`, without locals or handlers and the tiny stack depth
    #[must_use]
    pub fn new(code: CilCode<M>) -> Self {
        MethodBody {
            max_stack: TINY_MAX_STACK,
            init_locals: false,
            local_var_sig_token: Token::new(0),
            local_variables: Vec::new(),
            code,
            exception_handlers: Vec::new(),
        }
    }

    /// Decode the method body at the start of `data` with the default configuration.
    ///
    /// # Errors
    /// See [`RawMethodBody::read`] and [`RawMethodBody::resolve`].
    pub fn decode<R>(data: &[u8], resolver: &R) -> Result<Self>
    where
        R: OperandResolver<Model = M> + ?Sized,
    {
        Self::decode_with(data, resolver, &CodecConfig::default())
    }

    /// Decode the method body at the start of `data`.
    ///
    /// # Errors
    /// See [`RawMethodBody::read`] and [`RawMethodBody::resolve`].
    pub fn decode_with<R>(data: &[u8], resolver: &R, config: &CodecConfig) -> Result<Self>
    where
        R: OperandResolver<Model = M> + ?Sized,
    {
        RawMethodBody::read(data, config)?.resolve(resolver, config)
    }

    /// True if the body needs a fat header.
    ///
    /// That is the case when the stack depth exceeds 8, the code is 64 bytes or longer, the
    /// body has locals or a locals signature, requests zero-initialised locals, or has
    /// exception handlers.
    #[must_use]
    pub fn is_fat(&self) -> bool {
        self.needs_fat(self.code.code_size())
    }

    fn needs_fat(&self, code_size: usize) -> bool {
        self.max_stack > TINY_MAX_STACK
            || code_size > TINY_MAX_CODE_SIZE
            || !self.local_variables.is_empty()
            || !self.local_var_sig_token.is_null()
            || self.init_locals
            || !self.exception_handlers.is_empty()
    }

    /// The header this body is written with, for `code_size` bytes of code.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] if the code does not fit a 32-bit size.
    pub fn header(&self, code_size: usize) -> Result<MethodBodyHeader> {
        let code_size_u32 = u32::try_from(code_size)
            .map_err(|_| malformed_error!(0, "Code size {} exceeds the header field", code_size))?;

        if !self.needs_fat(code_size) {
            return Ok(MethodBodyHeader::Tiny {
                code_size: code_size_u32,
            });
        }

        let mut flags = MethodBodyFlags::FAT_FORMAT;
        if self.init_locals {
            flags |= MethodBodyFlags::INIT_LOCALS;
        }
        if !self.exception_handlers.is_empty() {
            flags |= MethodBodyFlags::MORE_SECTS;
        }

        Ok(MethodBodyHeader::Fat {
            flags,
            max_stack: self.max_stack,
            code_size: code_size_u32,
            local_var_sig_token: self.local_var_sig_token,
        })
    }

    /// Number of bytes the encoded body occupies: header, code, padding and exception section
    #[must_use]
    pub fn size(&self) -> usize {
        let code_size = self.code.code_size();
        let header_size = if self.needs_fat(code_size) {
            FAT_HEADER_SIZE
        } else {
            1
        };

        let mut size = header_size + code_size;
        if !self.exception_handlers.is_empty() {
            size = size.next_multiple_of(4) + section_size(&self.exception_handlers);
        }
        size
    }

    /// Encode the body into a new buffer.
    ///
    /// # Errors
    /// See [`MethodBody::encode_into`].
    pub fn encode<B>(&self, builder: &B) -> Result<Vec<u8>>
    where
        B: OperandBuilder<Model = M> + ?Sized,
    {
        let mut writer = Writer::with_capacity(self.size());
        self.encode_into(builder, &mut writer)?;
        Ok(writer.into_inner())
    }

    /// Encode the body at the current writer position.
    ///
    /// Section alignment is computed relative to the position the body starts at. Nothing is
    /// written to `writer` unless the whole body can be encoded.
    ///
    /// # Errors
    /// Returns any error of [`crate::assembly::encode_stream`] or of the builder, and
    /// [`crate::Error::MalformedHeader`] if the exception clauses do not fit a section.
    pub fn encode_into<B>(&self, builder: &B, writer: &mut Writer) -> Result<()>
    where
        B: OperandBuilder<Model = M> + ?Sized,
    {
        let body_start = writer.pos();

        let mut code = Writer::with_capacity(self.code.code_size());
        encode_stream(&self.code, builder, &mut code)?;
        let code = code.into_inner();

        let header = self.header(code.len())?;
        log::debug!(
            "Framing method body as {} ({} code bytes, {} handler(s))",
            if header.is_fat() { "fat" } else { "tiny" },
            code.len(),
            self.exception_handlers.len()
        );

        check_section(&self.exception_handlers, body_start)?;

        header.write(writer)?;
        writer.write_bytes(&code);
        write_section(writer, body_start, &self.exception_handlers)
    }
}

/// Decode independent method bodies in parallel.
///
/// Results are returned in input order; a failing body does not affect the others.
pub fn decode_method_bodies<R>(
    bodies: &[&[u8]],
    resolver: &R,
    config: &CodecConfig,
) -> Vec<Result<MethodBody<R::Model>>>
where
    R: OperandResolver + Sync + ?Sized,
{
    bodies
        .par_iter()
        .map(|data| RawMethodBody::read(data, config)?.resolve(resolver, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::{opcodes, CilInstruction, Label, Operand, RawModel, RawOperands},
        metadata::method::ExceptionHandlerKind,
        Error,
    };

    fn nops(count: usize) -> CilCode<RawModel> {
        let mut code = CilCode::new();
        for _ in 0..count.saturating_sub(1) {
            code.push(CilInstruction::new(opcodes::NOP, Operand::None));
        }
        code.push(CilInstruction::new(opcodes::RET, Operand::None));
        code
    }

    #[test]
    fn tiny() {
        let mut data = vec![(3 << 2) | 0x02, 0x00, 0x00, 0x2A];
        data.extend_from_slice(&[0xCC; 4]);

        let raw = RawMethodBody::read(&data, &CodecConfig::default()).unwrap();
        assert_eq!(raw.header, MethodBodyHeader::Tiny { code_size: 3 });
        assert_eq!(raw.header_size, 1);
        assert_eq!(raw.code, [0x00, 0x00, 0x2A]);
        assert_eq!(raw.size, 4);

        let body = raw.resolve(&RawOperands, &CodecConfig::default()).unwrap();
        assert_eq!(body.max_stack, 8);
        assert!(!body.init_locals);
        assert!(body.local_var_sig_token.is_null());
        assert_eq!(body.code.len(), 3);
        assert_eq!(body.size(), 4);
        assert_eq!(body.encode(&RawOperands).unwrap(), data[..4]);
    }

    #[test]
    fn fat_with_locals() {
        let mut data = vec![
            0x13, 0x30, // FAT | INIT_LOCALS, header size 3 * 4
            0x05, 0x00, // max stack
            0x02, 0x00, 0x00, 0x00, // code size
            0x59, 0x00, 0x00, 0x11, // local sig token
        ];
        data.extend_from_slice(&[0x06, 0x2A]);

        let body = MethodBody::decode(&data, &RawOperands).unwrap();
        assert!(body.is_fat());
        assert!(body.init_locals);
        assert_eq!(body.max_stack, 5);
        assert_eq!(body.local_var_sig_token, Token::new(0x1100_0059));
        assert_eq!(body.size(), 14);
        assert_eq!(body.encode(&RawOperands).unwrap(), data);
    }

    #[test]
    fn fat_with_exceptions() {
        let mut data = vec![
            0x1B, 0x30, // FAT | MORE_SECTS | INIT_LOCALS
            0x01, 0x00, // max stack
            0x05, 0x00, 0x00, 0x00, // code size
            0x03, 0x00, 0x00, 0x11, // local sig token
            0x00, 0xDE, 0x01, 0x00, 0x2A, // nop; leave.s +1; nop; ret
            0x00, 0x00, 0x00, // padding
            0x01, 0x10, 0x00, 0x00, // small EH section, 16 bytes
            0x02, 0x00, 0x00, 0x00, 0x03, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];

        let body = MethodBody::decode(&data, &RawOperands).unwrap();
        assert_eq!(body.exception_handlers.len(), 1);
        assert_eq!(body.exception_handlers[0].kind, ExceptionHandlerKind::Finally);
        assert_eq!(body.exception_handlers[0].handler_offset, 3);
        assert_eq!(
            body.code.instructions()[1].operand,
            Operand::Target(Label::Instruction(3))
        );
        assert_eq!(body.size(), data.len());
        assert_eq!(body.encode(&RawOperands).unwrap(), data);

        // Trailing bytes behind the section are not part of the body
        data.extend_from_slice(&[0xFF; 8]);
        let raw = RawMethodBody::read(&data, &CodecConfig::default()).unwrap();
        assert_eq!(raw.size, 36);
    }

    #[test]
    fn tiny_fat_boundary() {
        let body = MethodBody::new(nops(63));
        assert!(!body.is_fat());
        let bytes = body.encode(&RawOperands).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(bytes[0], (63 << 2) | 0x02);

        let body = MethodBody::new(nops(64));
        assert!(body.is_fat());
        let bytes = body.encode(&RawOperands).unwrap();
        assert_eq!(bytes.len(), 12 + 64);
        assert_eq!(bytes[..2], [0x03, 0x30]);
        assert_eq!(bytes[4..8], 64u32.to_le_bytes());

        let mut body = MethodBody::new(nops(10));
        body.max_stack = 8;
        assert!(!body.is_fat());
        body.max_stack = 9;
        assert!(body.is_fat());
        let bytes = body.encode(&RawOperands).unwrap();
        assert_eq!(bytes[2..4], 9u16.to_le_bytes());

        let decoded = MethodBody::decode(&bytes, &RawOperands).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn fat_when_locals_or_handlers() {
        let mut body = MethodBody::new(nops(2));
        body.local_variables.push(0);
        assert!(body.is_fat());

        let mut body = MethodBody::new(nops(2));
        body.exception_handlers.push(ExceptionHandler {
            kind: ExceptionHandlerKind::Fault,
            try_offset: 0,
            try_length: 1,
            handler_offset: 1,
            handler_length: 1,
            class_token_or_filter_offset: 0,
        });
        assert!(body.is_fat());
        // 12 + 2 code bytes, 2 padding, 4 + 12 section
        assert_eq!(body.size(), 32);
        assert_eq!(body.encode(&RawOperands).unwrap().len(), 32);
    }

    #[test]
    fn malformed_headers() {
        assert!(matches!(
            RawMethodBody::read(&[0x01, 0x00], &CodecConfig::default()),
            Err(Error::MalformedHeader { offset: 0, .. })
        ));
        assert!(matches!(
            RawMethodBody::read(&[0x00], &CodecConfig::default()),
            Err(Error::MalformedHeader { offset: 0, .. })
        ));
        assert!(matches!(
            RawMethodBody::read(&[0x03, 0x30, 0x08, 0x00, 0x01], &CodecConfig::default()),
            Err(Error::TruncatedStream { offset: 0, needed: 12 })
        ));
        assert!(matches!(
            RawMethodBody::read(&[], &CodecConfig::default()),
            Err(Error::TruncatedStream { offset: 0, .. })
        ));

        // Header size nibble of 2 (8 bytes)
        let data = [0x03, 0x20, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            RawMethodBody::read(&data, &CodecConfig::default()),
            Err(Error::MalformedHeader { offset: 0, .. })
        ));

        // Code size beyond the data
        assert!(matches!(
            RawMethodBody::read(&[(4 << 2) | 0x02, 0x00, 0x2A], &CodecConfig::default()),
            Err(Error::TruncatedStream { offset: 1, needed: 4 })
        ));
    }

    #[test]
    fn oversized_fat_header() {
        let data = [
            0x03, 0x40, 0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // fat header
            0xEE, 0xEE, 0xEE, 0xEE, // extra header bytes
            0x2A,
        ];
        let raw = RawMethodBody::read(&data, &CodecConfig::default()).unwrap();
        assert_eq!(raw.header_size, 16);
        assert_eq!(raw.code, [0x2A]);
    }

    #[test]
    fn error_offsets_are_body_relative() {
        // Fat body whose code holds an unknown opcode at code offset 1
        let data = [
            0x03, 0x30, 0x08, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x24,
        ];
        assert!(matches!(
            MethodBody::decode(&data, &RawOperands),
            Err(Error::UnknownOpcode { opcode: 0x24, offset: 13, .. })
        ));
    }

    #[test]
    fn parallel_decode() {
        let tiny = [0x06, 0x2A];
        let broken = [0x01];
        let fat = {
            let body = MethodBody::new(nops(70));
            body.encode(&RawOperands).unwrap()
        };

        let bodies: Vec<&[u8]> = vec![&tiny, &broken, &fat];
        let results = decode_method_bodies(&bodies, &RawOperands, &CodecConfig::default());

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().code.len(), 1);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().code.len(), 70);
    }

    #[test]
    fn tiny_header_code_size_limit() {
        let mut writer = Writer::new();
        MethodBodyHeader::Tiny { code_size: 63 }.write(&mut writer).unwrap();
        assert!(matches!(
            MethodBodyHeader::Tiny { code_size: 64 }.write(&mut writer),
            Err(Error::MalformedHeader { offset: 1, .. })
        ));
        assert_eq!(writer.into_inner(), [(63 << 2) | 0x02]);
    }

    #[test]
    fn oversized_section_writes_nothing() {
        let mut body = MethodBody::new(nops(2));
        // 4 + 699_051 * 24 bytes is just past the 24-bit section size
        body.exception_handlers = vec![
            ExceptionHandler {
                kind: ExceptionHandlerKind::Finally,
                try_offset: 0,
                try_length: 1,
                handler_offset: 1,
                handler_length: 1,
                class_token_or_filter_offset: 0,
            };
            699_051
        ];

        let mut writer = Writer::new();
        writer.write_bytes(&[0xCC]);
        assert!(matches!(
            body.encode_into(&RawOperands, &mut writer),
            Err(Error::MalformedHeader { offset: 1, .. })
        ));
        assert_eq!(writer.into_inner(), [0xCC]);

        body.exception_handlers.truncate(699_050);
        assert!(body.encode(&RawOperands).is_ok());
    }
}
