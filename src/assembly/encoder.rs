//! CIL instruction stream encoding.
//!
//! [`encode_stream`] writes a [`CilCode`] list back to bytes in two passes. The first pass lays
//! out every instruction from its encoded size, which depends only on the opcode and the switch
//! table length. The second pass writes opcodes and operands, computing each branch delta from
//! the laid out offsets as `target - end of instruction`.
//!
//! Branch forms are never changed: a short branch whose delta does not fit a signed byte fails
//! with [`crate::Error::BranchOutOfRange`] instead of being widened.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::{
//!     assembly::{
//!         encode_stream, opcodes, CilCode, CilInstruction, Label, Operand, RawModel, RawOperands,
//!     },
//!     Writer,
//! };
//!
//! let mut code: CilCode<RawModel> = CilCode::new();
//! code.push(CilInstruction::new(opcodes::BR_S, Operand::Target(Label::Instruction(2))));
//! code.push(CilInstruction::new(opcodes::NOP, Operand::None));
//! code.push(CilInstruction::new(opcodes::RET, Operand::None));
//!
//! let mut writer = Writer::new();
//! encode_stream(&code, &RawOperands, &mut writer)?;
//! assert_eq!(writer.as_slice(), [0x2B, 0x01, 0x00, 0x2A]);
//! # Ok::<(), dotcil::Error>(())
//! ```

use crate::{
    assembly::{
        CilCode, CilInstruction, Immediate, Label, Operand, OperandBuilder, OperandKind,
        OperandModel,
    },
    file::Writer,
    metadata::token::USER_STRING_TAG,
    Error, Result,
};

/// Largest user string heap offset a `ldstr` token can carry
const MAX_USER_STRING_OFFSET: u32 = 0x00FF_FFFF;

/// Encode `code` into `writer`.
///
/// Instruction offsets are recomputed from sizes, the `offset` fields of the instructions are
/// not consulted. Error offsets are positions relative to the start of the code.
///
/// # Errors
/// - [`crate::Error::OperandTypeMismatch`] if an operand does not have its opcode's shape
/// - [`crate::Error::BranchOutOfRange`] if a delta does not fit the branch operand
/// - [`crate::Error::InvalidBranchTarget`] if a label points past the end of the code
/// - [`crate::Error::IndexOutOfRange`] if a local or argument index does not fit a short form,
///   or a string offset does not fit a user string token
/// - any error returned by the builder
pub fn encode_stream<B>(code: &CilCode<B::Model>, builder: &B, writer: &mut Writer) -> Result<()>
where
    B: OperandBuilder + ?Sized,
{
    let offsets = layout(code)?;

    for (instruction, offset) in code.iter().zip(&offsets) {
        let end = i64::from(*offset) + instruction.size() as i64;
        encode_instruction(instruction, *offset as usize, end, &offsets, builder, writer)?;
    }

    Ok(())
}

/// Offsets of all instructions, followed by the offset of the end of the code
fn layout<M: OperandModel>(code: &CilCode<M>) -> Result<Vec<u32>> {
    let mut offsets = Vec::with_capacity(code.len() + 1);
    let mut offset = 0usize;

    for instruction in code {
        let start = u32::try_from(offset)
            .map_err(|_| malformed_error!(offset, "Code exceeds the 4 GiB limit"))?;
        offsets.push(start);
        offset += instruction.size();
    }

    offsets.push(
        u32::try_from(offset)
            .map_err(|_| malformed_error!(offset, "Code exceeds the 4 GiB limit"))?,
    );

    Ok(offsets)
}

fn encode_instruction<B>(
    instruction: &CilInstruction<B::Model>,
    offset: usize,
    end: i64,
    offsets: &[u32],
    builder: &B,
    writer: &mut Writer,
) -> Result<()>
where
    B: OperandBuilder + ?Sized,
{
    let opcode = instruction.opcode;
    let kind = opcode.operand_kind;

    if !instruction.operand.fits(kind) {
        return Err(Error::OperandTypeMismatch {
            mnemonic: opcode.mnemonic,
            expected: kind.describe(),
            offset,
        });
    }

    if opcode.is_two_byte {
        writer.write_le::<u8>(opcode.byte1);
        writer.write_le::<u8>(opcode.byte2);
    } else {
        writer.write_le::<u8>(opcode.byte1);
    }

    match &instruction.operand {
        Operand::None => {}
        Operand::Immediate(value) => match value {
            Immediate::Int8(value) => writer.write_le::<i8>(*value),
            Immediate::Int32(value) => writer.write_le::<i32>(*value),
            Immediate::Int64(value) => writer.write_le::<i64>(*value),
            Immediate::Float32(value) => writer.write_le::<f32>(*value),
            Immediate::Float64(value) => writer.write_le::<f64>(*value),
        },
        Operand::Local(local) => {
            let index = builder.get_local_index(local)?;
            write_index(writer, kind, index, "local", offset)?;
        }
        Operand::Argument(argument) => {
            let index = builder.get_argument_index(argument)?;
            write_index(writer, kind, index, "argument", offset)?;
        }
        Operand::Target(label) => {
            let delta = resolve_label(label, offsets, offset)? - end;
            if kind == OperandKind::BranchTargetShort {
                let delta = i8::try_from(delta).map_err(|_| Error::BranchOutOfRange {
                    mnemonic: opcode.mnemonic,
                    delta,
                    offset,
                })?;
                writer.write_le::<i8>(delta);
            } else {
                writer.write_le::<i32>(long_delta(delta, opcode.mnemonic, offset)?);
            }
        }
        Operand::Switch(labels) => {
            let count = u32::try_from(labels.len())
                .map_err(|_| malformed_error!(offset, "Switch table too large"))?;
            writer.write_le::<u32>(count);
            for label in labels {
                let delta = resolve_label(label, offsets, offset)? - end;
                writer.write_le::<i32>(long_delta(delta, opcode.mnemonic, offset)?);
            }
        }
        Operand::String(string) => {
            let index = builder.get_string_offset(string)?;
            if index > MAX_USER_STRING_OFFSET {
                return Err(Error::IndexOutOfRange {
                    kind: "user string",
                    index,
                    offset,
                });
            }
            writer.write_le::<u32>((u32::from(USER_STRING_TAG) << 24) | index);
        }
        Operand::Member(member) => {
            let token = builder.get_member_token(member)?;
            writer.write_le::<u32>(token.value());
        }
    }

    Ok(())
}

fn write_index(
    writer: &mut Writer,
    kind: OperandKind,
    index: u16,
    name: &'static str,
    offset: usize,
) -> Result<()> {
    match kind {
        OperandKind::LocalIndexShort | OperandKind::ArgumentIndexShort => {
            let short = u8::try_from(index).map_err(|_| Error::IndexOutOfRange {
                kind: name,
                index: u32::from(index),
                offset,
            })?;
            writer.write_le::<u8>(short);
        }
        _ => writer.write_le::<u16>(index),
    }

    Ok(())
}

fn resolve_label(label: &Label, offsets: &[u32], offset: usize) -> Result<i64> {
    match *label {
        Label::Instruction(index) => offsets
            .get(index)
            .map(|target| i64::from(*target))
            .ok_or(Error::InvalidBranchTarget {
                offset,
                target: index as i64,
            }),
        Label::Detached(target) => Ok(target),
    }
}

fn long_delta(delta: i64, mnemonic: &'static str, offset: usize) -> Result<i32> {
    i32::try_from(delta).map_err(|_| Error::BranchOutOfRange {
        mnemonic,
        delta,
        offset,
    })
}
