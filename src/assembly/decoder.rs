//! CIL instruction stream decoding.
//!
//! [`decode_stream`] turns the code bytes of a method body into a [`CilCode`] list. Decoding is a
//! single forward pass over the bytes followed by a label binding pass:
//!
//! 1. Every instruction is decoded with its operand resolved through the supplied
//!    [`OperandResolver`]. Branch and switch targets are computed as byte offsets relative to
//!    the start of the code and stored as detached labels.
//! 2. Once all instruction offsets are known, each target that lands on an instruction boundary
//!    (or on the end of the code) is bound to that instruction. Targets inside an instruction
//!    stay detached, or fail the decode in strict mode.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::{assembly::{decode_stream, Label, Operand, RawOperands}, CodecConfig, Parser};
//!
//! // br.s +1; nop; ret
//! let bytes = [0x2B, 0x01, 0x00, 0x2A];
//! let mut parser = Parser::new(&bytes);
//! let code = decode_stream(&mut parser, bytes.len(), &RawOperands, &[], &CodecConfig::default())?;
//!
//! assert_eq!(code.len(), 3);
//! assert_eq!(code.instructions()[0].operand, Operand::Target(Label::Instruction(2)));
//! # Ok::<(), dotcil::Error>(())
//! ```

use crate::{
    assembly::{
        code::label_for_offset,
        opcodes::{lookup, FE_PREFIX},
        CilCode, CilInstruction, Immediate, Label, Operand, OperandKind, OperandModel,
        OperandResolver,
    },
    config::CodecConfig,
    file::Parser,
    metadata::token::{Token, USER_STRING_TAG},
    Error, Result,
};

/// Decode `code_size` bytes of CIL starting at the parser position.
///
/// On success the parser is positioned directly behind the code. Error offsets are positions in
/// the parser's data, so a parser created over a whole method body reports body-relative
/// offsets, while instruction offsets in the result are relative to the first code byte.
///
/// `locals` is handed to [`OperandResolver::resolve_local`] for every local variable operand.
///
/// # Errors
/// - [`crate::Error::TruncatedStream`] if the code or an operand runs past the available bytes
/// - [`crate::Error::UnknownOpcode`] for undefined opcodes
/// - [`crate::Error::MalformedHeader`] for a switch table above `config.max_switch_targets`
/// - [`crate::Error::IndexOutOfRange`], [`crate::Error::UnresolvedMember`] or
///   [`crate::Error::UnresolvedString`] if the resolver rejects an operand
/// - [`crate::Error::InvalidBranchTarget`] for targets off instruction boundaries when
///   `config.strict_branch_targets` is set
pub fn decode_stream<R>(
    parser: &mut Parser,
    code_size: usize,
    resolver: &R,
    locals: &[<R::Model as OperandModel>::Local],
    config: &CodecConfig,
) -> Result<CilCode<R::Model>>
where
    R: OperandResolver + ?Sized,
{
    let code_start = parser.pos();
    let code_end = parser.calc_end_position(code_size)?;

    let mut code_parser = Parser::new(&parser.data()[..code_end]);
    code_parser.seek(code_start)?;

    let mut instructions = Vec::new();
    while code_parser.has_more_data() {
        instructions.push(decode_instruction(
            &mut code_parser,
            code_start,
            resolver,
            locals,
            config,
        )?);
    }

    bind_labels(&mut instructions, code_start, code_size, config)?;

    parser.seek(code_end)?;
    Ok(CilCode::from_instructions(instructions))
}

/// Decode one instruction; targets are left as detached code offsets
fn decode_instruction<R>(
    parser: &mut Parser,
    code_start: usize,
    resolver: &R,
    locals: &[<R::Model as OperandModel>::Local],
    config: &CodecConfig,
) -> Result<CilInstruction<R::Model>>
where
    R: OperandResolver + ?Sized,
{
    let start = parser.pos();
    let first_byte = parser.read_le::<u8>()?;

    let opcode = if first_byte == FE_PREFIX {
        let second_byte = parser.read_le::<u8>()?;
        lookup(FE_PREFIX, Some(second_byte)).ok_or(Error::UnknownOpcode {
            prefix: FE_PREFIX,
            opcode: second_byte,
            offset: start,
        })?
    } else {
        lookup(first_byte, None).ok_or(Error::UnknownOpcode {
            prefix: 0,
            opcode: first_byte,
            offset: start,
        })?
    };

    let operand_offset = parser.pos();
    let operand = match opcode.operand_kind {
        OperandKind::None => Operand::None,
        OperandKind::ImmediateI1 => Operand::Immediate(Immediate::Int8(parser.read_le::<i8>()?)),
        OperandKind::ImmediateI4 => Operand::Immediate(Immediate::Int32(parser.read_le::<i32>()?)),
        OperandKind::ImmediateI8 => Operand::Immediate(Immediate::Int64(parser.read_le::<i64>()?)),
        OperandKind::ImmediateR4 => {
            Operand::Immediate(Immediate::Float32(parser.read_le::<f32>()?))
        }
        OperandKind::ImmediateR8 => {
            Operand::Immediate(Immediate::Float64(parser.read_le::<f64>()?))
        }
        OperandKind::LocalIndexShort | OperandKind::LocalIndexLong => {
            let index = read_index(parser, opcode.operand_kind)?;
            let local = resolver
                .resolve_local(index, locals)
                .ok_or(Error::IndexOutOfRange {
                    kind: "local",
                    index: u32::from(index),
                    offset: operand_offset,
                })?;
            Operand::Local(local)
        }
        OperandKind::ArgumentIndexShort | OperandKind::ArgumentIndexLong => {
            let index = read_index(parser, opcode.operand_kind)?;
            let argument = resolver
                .resolve_argument(index)
                .ok_or(Error::IndexOutOfRange {
                    kind: "argument",
                    index: u32::from(index),
                    offset: operand_offset,
                })?;
            Operand::Argument(argument)
        }
        OperandKind::BranchTargetShort => {
            let delta = i64::from(parser.read_le::<i8>()?);
            Operand::Target(Label::Detached((parser.pos() - code_start) as i64 + delta))
        }
        OperandKind::BranchTargetLong => {
            let delta = i64::from(parser.read_le::<i32>()?);
            Operand::Target(Label::Detached((parser.pos() - code_start) as i64 + delta))
        }
        OperandKind::SwitchTable => {
            let count = parser.read_le::<u32>()?;
            let table_size = (count as usize).checked_mul(4).unwrap_or(usize::MAX);
            parser.ensure_remaining(table_size)?;
            if count > config.max_switch_targets {
                return Err(malformed_error!(
                    operand_offset,
                    "Switch table with {} targets exceeds the limit of {}",
                    count,
                    config.max_switch_targets
                ));
            }

            let base = (parser.pos() + table_size - code_start) as i64;
            let mut targets = Vec::with_capacity(count as usize);
            for _ in 0..count {
                targets.push(Label::Detached(base + i64::from(parser.read_le::<i32>()?)));
            }
            Operand::Switch(targets)
        }
        OperandKind::StringToken => {
            let token = Token::new(parser.read_le::<u32>()?);
            if token.table() != USER_STRING_TAG {
                log::debug!(
                    "ldstr at offset {} carries token {} without the user string tag",
                    start,
                    token
                );
            }

            let index = token.row();
            let string = resolver
                .resolve_string(index)
                .ok_or(Error::UnresolvedString {
                    index,
                    offset: operand_offset,
                })?;
            Operand::String(string)
        }
        OperandKind::MemberToken(kind) => {
            let token = Token::new(parser.read_le::<u32>()?);
            if !kind.accepts(token) {
                log::debug!(
                    "{} at offset {} references {} outside the usual {:?} tables",
                    opcode.mnemonic,
                    start,
                    token,
                    kind
                );
            }

            let member = resolver
                .resolve_member(token)
                .ok_or(Error::UnresolvedMember {
                    token,
                    offset: operand_offset,
                })?;
            Operand::Member(member)
        }
    };

    Ok(CilInstruction {
        offset: (start - code_start) as u32,
        opcode,
        operand,
    })
}

fn read_index(parser: &mut Parser, kind: OperandKind) -> Result<u16> {
    match kind {
        OperandKind::LocalIndexShort | OperandKind::ArgumentIndexShort => {
            Ok(u16::from(parser.read_le::<u8>()?))
        }
        _ => parser.read_le::<u16>(),
    }
}

/// Bind detached targets that land on instruction boundaries
fn bind_labels<M: OperandModel>(
    instructions: &mut [CilInstruction<M>],
    code_start: usize,
    code_size: usize,
    config: &CodecConfig,
) -> Result<()> {
    let offsets: Vec<u32> = instructions.iter().map(|i| i.offset).collect();

    for instruction in instructions.iter_mut() {
        let origin = instruction.offset;
        for label in instruction.labels_mut() {
            let Label::Detached(target) = *label else {
                continue;
            };

            *label = label_for_offset(&offsets, code_size, target);
            if let Label::Detached(target) = *label {
                if config.strict_branch_targets {
                    return Err(Error::InvalidBranchTarget {
                        offset: code_start + origin as usize,
                        target,
                    });
                }

                log::debug!(
                    "Branch at code offset {} targets {}, which is not an instruction boundary",
                    origin,
                    target
                );
            }
        }
    }

    Ok(())
}
