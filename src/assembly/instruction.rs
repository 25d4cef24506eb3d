//! CIL instruction model.
//!
//! This module defines how a decoded instruction is represented: the shape of operand an opcode
//! takes ([`OperandKind`]), the operand value itself ([`Operand`]), branch targets ([`Label`])
//! and the instruction ([`CilInstruction`]).
//!
//! Operands that reference metadata are generic over an [`crate::assembly::OperandModel`]:
//! with [`crate::assembly::RawModel`] they stay raw tokens and indices, while an object model
//! can plug in its own field, method, string and local types.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::assembly::{opcodes, CilInstruction, Immediate, Operand, RawModel};
//!
//! let ldc: CilInstruction<RawModel> =
//!     CilInstruction::new(opcodes::LDC_I4_S, Operand::Immediate(Immediate::Int8(42)));
//! assert_eq!(ldc.mnemonic(), "ldc.i4.s");
//! assert_eq!(ldc.size(), 2);
//! ```

use std::fmt;

use crate::{
    assembly::{opcodes::lookup_mnemonic, CilOpCode, OperandModel},
    metadata::{tables::TableId, token::Token},
    Result,
};

/// The kind of metadata a token operand is expected to reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// `ldfld`, `stsfld`, ...
    Field,
    /// `call`, `newobj`, `ldftn`, ...
    Method,
    /// `calli`
    Signature,
    /// `ldtoken`
    Token,
    /// `box`, `castclass`, `sizeof`, ...
    Type,
}

impl MemberKind {
    /// Tables a token of this kind usually points into
    #[must_use]
    pub fn tables(&self) -> &'static [TableId] {
        match self {
            MemberKind::Field => &[TableId::Field, TableId::MemberRef],
            MemberKind::Method => &[TableId::MethodDef, TableId::MemberRef, TableId::MethodSpec],
            MemberKind::Signature => &[TableId::StandAloneSig],
            MemberKind::Token => &[
                TableId::TypeDef,
                TableId::TypeRef,
                TableId::TypeSpec,
                TableId::Field,
                TableId::MethodDef,
                TableId::MemberRef,
                TableId::MethodSpec,
            ],
            MemberKind::Type => &[TableId::TypeDef, TableId::TypeRef, TableId::TypeSpec],
        }
    }

    /// True if `token` points into one of [`MemberKind::tables`]
    #[must_use]
    pub fn accepts(&self, token: Token) -> bool {
        token
            .table_id()
            .is_ok_and(|table| self.tables().contains(&table))
    }
}

/// The operand shape an opcode takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// No operand
    None,
    /// Signed 8-bit immediate
    ImmediateI1,
    /// Signed 32-bit immediate
    ImmediateI4,
    /// Signed 64-bit immediate
    ImmediateI8,
    /// 32-bit float immediate
    ImmediateR4,
    /// 64-bit float immediate
    ImmediateR8,
    /// Unsigned 8-bit local variable index
    LocalIndexShort,
    /// Unsigned 16-bit local variable index
    LocalIndexLong,
    /// Unsigned 8-bit argument index
    ArgumentIndexShort,
    /// Unsigned 16-bit argument index
    ArgumentIndexLong,
    /// Signed 8-bit branch delta
    BranchTargetShort,
    /// Signed 32-bit branch delta
    BranchTargetLong,
    /// 32-bit count followed by that many signed 32-bit deltas
    SwitchTable,
    /// User-string token (`0x70` tag)
    StringToken,
    /// Metadata token of the given kind
    MemberToken(MemberKind),
}

impl OperandKind {
    /// Encoded operand size in bytes, `None` for the variable-size switch table
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            OperandKind::None => Some(0),
            OperandKind::ImmediateI1
            | OperandKind::LocalIndexShort
            | OperandKind::ArgumentIndexShort
            | OperandKind::BranchTargetShort => Some(1),
            OperandKind::LocalIndexLong | OperandKind::ArgumentIndexLong => Some(2),
            OperandKind::ImmediateI4
            | OperandKind::ImmediateR4
            | OperandKind::BranchTargetLong
            | OperandKind::StringToken
            | OperandKind::MemberToken(_) => Some(4),
            OperandKind::ImmediateI8 | OperandKind::ImmediateR8 => Some(8),
            OperandKind::SwitchTable => None,
        }
    }

    /// Human readable name of the operand shape, used in error messages
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            OperandKind::None => "no operand",
            OperandKind::ImmediateI1 => "int8 immediate",
            OperandKind::ImmediateI4 => "int32 immediate",
            OperandKind::ImmediateI8 => "int64 immediate",
            OperandKind::ImmediateR4 => "float32 immediate",
            OperandKind::ImmediateR8 => "float64 immediate",
            OperandKind::LocalIndexShort | OperandKind::LocalIndexLong => "local variable",
            OperandKind::ArgumentIndexShort | OperandKind::ArgumentIndexLong => "argument",
            OperandKind::BranchTargetShort | OperandKind::BranchTargetLong => "branch label",
            OperandKind::SwitchTable => "switch label list",
            OperandKind::StringToken => "user string",
            OperandKind::MemberToken(_) => "member reference",
        }
    }

    /// True for branch and switch operands
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            OperandKind::BranchTargetShort
                | OperandKind::BranchTargetLong
                | OperandKind::SwitchTable
        )
    }
}

/// Control flow behaviour of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Conditional branch to another location
    ConditionalBranch,
    /// Always branches to another location (unconditional jump)
    UnconditionalBranch,
    /// Call to another method
    Call,
    /// Returns from current method or filter
    Return,
    /// Multi-way branch (switch statement)
    Switch,
    /// Exception throwing
    Throw,
    /// End of finally block
    EndFinally,
    /// Leave protected region (try/catch/finally)
    Leave,
    /// Prefix that modifies the following instruction
    Meta,
}

/// Immediate operand values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit integer
    Int8(i8),
    /// Signed 32-bit integer
    Int32(i32),
    /// Signed 64-bit integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(value) => write!(f, "{value}"),
            Immediate::Int32(value) => write!(f, "{value}"),
            Immediate::Int64(value) => write!(f, "{value}"),
            Immediate::Float32(value) => write!(f, "{value}"),
            Immediate::Float64(value) => write!(f, "{value}"),
        }
    }
}

/// A branch target.
///
/// Targets are bound to instructions rather than byte offsets, so they stay valid while
/// instructions are inserted or removed. Byte offsets are only computed when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// The instruction at this index. The index equal to the instruction count denotes the end
    /// of the code.
    Instruction(usize),
    /// A byte offset that is not an instruction boundary, kept verbatim
    Detached(i64),
}

/// Operand values, one shape per [`OperandKind`]
///
/// `Clone`, `Debug` and `PartialEq` only need the bounds [`OperandModel`] already places on its
/// associated types, not on the model marker itself.
pub enum Operand<M: OperandModel> {
    /// No operand
    None,
    /// Integer or floating point immediate
    Immediate(Immediate),
    /// Local variable
    Local(M::Local),
    /// Method argument
    Argument(M::Argument),
    /// Branch target
    Target(Label),
    /// Switch targets, in case order
    Switch(Vec<Label>),
    /// User string
    String(M::UserString),
    /// Field, method, type, signature or token reference
    Member(M::Member),
}

impl<M: OperandModel> Clone for Operand<M> {
    fn clone(&self) -> Self {
        match self {
            Operand::None => Operand::None,
            Operand::Immediate(value) => Operand::Immediate(*value),
            Operand::Local(local) => Operand::Local(local.clone()),
            Operand::Argument(argument) => Operand::Argument(argument.clone()),
            Operand::Target(label) => Operand::Target(*label),
            Operand::Switch(labels) => Operand::Switch(labels.clone()),
            Operand::String(string) => Operand::String(string.clone()),
            Operand::Member(member) => Operand::Member(member.clone()),
        }
    }
}

impl<M: OperandModel> PartialEq for Operand<M> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::None, Operand::None) => true,
            (Operand::Immediate(a), Operand::Immediate(b)) => a == b,
            (Operand::Local(a), Operand::Local(b)) => a == b,
            (Operand::Argument(a), Operand::Argument(b)) => a == b,
            (Operand::Target(a), Operand::Target(b)) => a == b,
            (Operand::Switch(a), Operand::Switch(b)) => a == b,
            (Operand::String(a), Operand::String(b)) => a == b,
            (Operand::Member(a), Operand::Member(b)) => a == b,
            _ => false,
        }
    }
}

impl<M: OperandModel> fmt::Debug for Operand<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => f.write_str("None"),
            Operand::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Operand::Local(local) => f.debug_tuple("Local").field(local).finish(),
            Operand::Argument(argument) => f.debug_tuple("Argument").field(argument).finish(),
            Operand::Target(label) => f.debug_tuple("Target").field(label).finish(),
            Operand::Switch(labels) => f.debug_tuple("Switch").field(labels).finish(),
            Operand::String(string) => f.debug_tuple("String").field(string).finish(),
            Operand::Member(member) => f.debug_tuple("Member").field(member).finish(),
        }
    }
}

impl<M: OperandModel> Operand<M> {
    /// True if this value has the shape `kind` requires
    #[must_use]
    pub fn fits(&self, kind: OperandKind) -> bool {
        matches!(
            (kind, self),
            (OperandKind::None, Operand::None)
                | (OperandKind::ImmediateI1, Operand::Immediate(Immediate::Int8(_)))
                | (OperandKind::ImmediateI4, Operand::Immediate(Immediate::Int32(_)))
                | (OperandKind::ImmediateI8, Operand::Immediate(Immediate::Int64(_)))
                | (OperandKind::ImmediateR4, Operand::Immediate(Immediate::Float32(_)))
                | (OperandKind::ImmediateR8, Operand::Immediate(Immediate::Float64(_)))
                | (
                    OperandKind::LocalIndexShort | OperandKind::LocalIndexLong,
                    Operand::Local(_)
                )
                | (
                    OperandKind::ArgumentIndexShort | OperandKind::ArgumentIndexLong,
                    Operand::Argument(_)
                )
                | (
                    OperandKind::BranchTargetShort | OperandKind::BranchTargetLong,
                    Operand::Target(_)
                )
                | (OperandKind::SwitchTable, Operand::Switch(_))
                | (OperandKind::StringToken, Operand::String(_))
                | (OperandKind::MemberToken(_), Operand::Member(_))
        )
    }
}

/// A single CIL instruction.
///
/// `offset` is derived from the sizes of the preceding instructions. It is maintained by
/// [`crate::assembly::CilCode`] and never read back when encoding.
pub struct CilInstruction<M: OperandModel> {
    /// Byte offset from the start of the code
    pub offset: u32,
    /// The opcode
    pub opcode: CilOpCode,
    /// The operand, shaped according to `opcode.operand_kind`
    pub operand: Operand<M>,
}

impl<M: OperandModel> Clone for CilInstruction<M> {
    fn clone(&self) -> Self {
        CilInstruction {
            offset: self.offset,
            opcode: self.opcode,
            operand: self.operand.clone(),
        }
    }
}

impl<M: OperandModel> PartialEq for CilInstruction<M> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
            && self.opcode == other.opcode
            && self.operand == other.operand
    }
}

impl<M: OperandModel> fmt::Debug for CilInstruction<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CilInstruction")
            .field("offset", &self.offset)
            .field("opcode", &self.opcode)
            .field("operand", &self.operand)
            .finish()
    }
}

impl<M: OperandModel> CilInstruction<M> {
    /// Create an instruction at offset 0
    #[must_use]
    pub fn new(opcode: CilOpCode, operand: Operand<M>) -> Self {
        CilInstruction {
            offset: 0,
            opcode,
            operand,
        }
    }

    /// Create an instruction by mnemonic.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidMnemonic`] for unknown mnemonics.
    pub fn from_mnemonic(mnemonic: &str, operand: Operand<M>) -> Result<Self> {
        Ok(CilInstruction::new(lookup_mnemonic(mnemonic)?, operand))
    }

    /// The mnemonic of the opcode
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic
    }

    /// Encoded size in bytes: opcode, operand and, for `switch`, the whole jump table
    #[must_use]
    pub fn size(&self) -> usize {
        let operand = match (self.opcode.operand_kind.size(), &self.operand) {
            (Some(size), _) => size,
            (None, Operand::Switch(targets)) => 4 + 4 * targets.len(),
            (None, _) => 4,
        };

        self.opcode.size() + operand
    }

    /// True for branch and switch instructions
    #[must_use]
    pub fn is_branch(&self) -> bool {
        self.opcode.operand_kind.is_branch()
    }

    /// Labels referenced by the operand
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        let slice: &[Label] = match &self.operand {
            Operand::Target(label) => std::slice::from_ref(label),
            Operand::Switch(labels) => labels,
            _ => &[],
        };
        slice.iter()
    }

    /// Mutable access to the labels referenced by the operand
    pub fn labels_mut(&mut self) -> impl Iterator<Item = &mut Label> {
        let slice: &mut [Label] = match &mut self.operand {
            Operand::Target(label) => std::slice::from_mut(label),
            Operand::Switch(labels) => labels,
            _ => &mut [],
        };
        slice.iter_mut()
    }
}
