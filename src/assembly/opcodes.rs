//! The CIL opcode table (ECMA-335 Partition III).
//!
//! Every opcode is available as a named constant (e.g. [`CALL`], [`BR_S`], [`CEQ`]) carrying its
//! encoding, operand shape, mnemonic and control flow behaviour. Single-byte opcodes use
//! `byte1` alone; two-byte opcodes have `byte1 == 0xFE` ([`FE_PREFIX`]) and the distinguishing
//! second byte in `byte2`.
//!
//! Lookups by encoding ([`lookup`]) and by mnemonic ([`lookup_mnemonic`]) go through tables that
//! are built once on first use and shared read-only afterwards.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::assembly::opcodes::{self, lookup, lookup_mnemonic};
//!
//! assert_eq!(lookup(0x2A, None), Some(opcodes::RET));
//! assert_eq!(lookup(0xFE, Some(0x01)), Some(opcodes::CEQ));
//! assert_eq!(lookup_mnemonic("br.s")?, opcodes::BR_S);
//! # Ok::<(), dotcil::Error>(())
//! ```

use std::{collections::HashMap, sync::OnceLock};

use crate::{
    assembly::instruction::{FlowType, MemberKind, OperandKind},
    Error, Result,
};

/// First byte of every two-byte opcode
pub const FE_PREFIX: u8 = 0xFE;

/// A static opcode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CilOpCode {
    /// The opcode byte, or [`FE_PREFIX`] for two-byte opcodes
    pub byte1: u8,
    /// Second byte of a two-byte opcode, `0` otherwise
    pub byte2: u8,
    /// True if the opcode is encoded as `0xFE byte2`
    pub is_two_byte: bool,
    /// Shape of the operand following the opcode
    pub operand_kind: OperandKind,
    /// Textual mnemonic, e.g. `ldc.i4.s`
    pub mnemonic: &'static str,
    /// Control flow behaviour
    pub flow: FlowType,
}

impl CilOpCode {
    const fn new(
        byte1: u8,
        byte2: u8,
        mnemonic: &'static str,
        operand_kind: OperandKind,
        flow: FlowType,
    ) -> Self {
        CilOpCode {
            byte1,
            byte2,
            is_two_byte: byte1 == FE_PREFIX,
            operand_kind,
            mnemonic,
            flow,
        }
    }

    /// Encoded size of the opcode itself (1 or 2 bytes)
    #[must_use]
    pub fn size(&self) -> usize {
        if self.is_two_byte {
            2
        } else {
            1
        }
    }

    /// True for the prefix opcodes (`unaligned.`, `volatile.`, `tail.`, `constrained.`,
    /// `readonly.`, `no.`)
    #[must_use]
    pub fn is_prefix(&self) -> bool {
        self.flow == FlowType::Meta
    }
}

macro_rules! opcodes {
    ($( $name:ident = $b1:literal $b2:literal $mnemonic:literal
        $kind:ident $(($member:ident))? $flow:ident; )*) => {
        $(
            #[doc = concat!("`", $mnemonic, "`")]
            pub const $name: CilOpCode = CilOpCode::new(
                $b1,
                $b2,
                $mnemonic,
                OperandKind::$kind $((MemberKind::$member))?,
                FlowType::$flow,
            );
        )*

        /// Every defined opcode, single-byte opcodes first, each group in encoding order
        pub static OPCODES: &[CilOpCode] = &[$($name),*];
    };
}

opcodes! {
    // ── Single-byte opcodes (0x00 – 0xE0) ──────────────────────────────────────

    // Misc
    NOP = 0x00 0x00 "nop" None Sequential;
    BREAK = 0x01 0x00 "break" None Sequential;

    // Load/store argument and local shorthand
    LDARG_0 = 0x02 0x00 "ldarg.0" None Sequential;
    LDARG_1 = 0x03 0x00 "ldarg.1" None Sequential;
    LDARG_2 = 0x04 0x00 "ldarg.2" None Sequential;
    LDARG_3 = 0x05 0x00 "ldarg.3" None Sequential;
    LDLOC_0 = 0x06 0x00 "ldloc.0" None Sequential;
    LDLOC_1 = 0x07 0x00 "ldloc.1" None Sequential;
    LDLOC_2 = 0x08 0x00 "ldloc.2" None Sequential;
    LDLOC_3 = 0x09 0x00 "ldloc.3" None Sequential;
    STLOC_0 = 0x0A 0x00 "stloc.0" None Sequential;
    STLOC_1 = 0x0B 0x00 "stloc.1" None Sequential;
    STLOC_2 = 0x0C 0x00 "stloc.2" None Sequential;
    STLOC_3 = 0x0D 0x00 "stloc.3" None Sequential;

    // Load/store argument/local (short form)
    LDARG_S = 0x0E 0x00 "ldarg.s" ArgumentIndexShort Sequential;
    LDARGA_S = 0x0F 0x00 "ldarga.s" ArgumentIndexShort Sequential;
    STARG_S = 0x10 0x00 "starg.s" ArgumentIndexShort Sequential;
    LDLOC_S = 0x11 0x00 "ldloc.s" LocalIndexShort Sequential;
    LDLOCA_S = 0x12 0x00 "ldloca.s" LocalIndexShort Sequential;
    STLOC_S = 0x13 0x00 "stloc.s" LocalIndexShort Sequential;

    // Null / constant loaders
    LDNULL = 0x14 0x00 "ldnull" None Sequential;
    LDC_I4_M1 = 0x15 0x00 "ldc.i4.m1" None Sequential;
    LDC_I4_0 = 0x16 0x00 "ldc.i4.0" None Sequential;
    LDC_I4_1 = 0x17 0x00 "ldc.i4.1" None Sequential;
    LDC_I4_2 = 0x18 0x00 "ldc.i4.2" None Sequential;
    LDC_I4_3 = 0x19 0x00 "ldc.i4.3" None Sequential;
    LDC_I4_4 = 0x1A 0x00 "ldc.i4.4" None Sequential;
    LDC_I4_5 = 0x1B 0x00 "ldc.i4.5" None Sequential;
    LDC_I4_6 = 0x1C 0x00 "ldc.i4.6" None Sequential;
    LDC_I4_7 = 0x1D 0x00 "ldc.i4.7" None Sequential;
    LDC_I4_8 = 0x1E 0x00 "ldc.i4.8" None Sequential;
    LDC_I4_S = 0x1F 0x00 "ldc.i4.s" ImmediateI1 Sequential;
    LDC_I4 = 0x20 0x00 "ldc.i4" ImmediateI4 Sequential;
    LDC_I8 = 0x21 0x00 "ldc.i8" ImmediateI8 Sequential;
    LDC_R4 = 0x22 0x00 "ldc.r4" ImmediateR4 Sequential;
    LDC_R8 = 0x23 0x00 "ldc.r8" ImmediateR8 Sequential;

    // Stack manipulation
    DUP = 0x25 0x00 "dup" None Sequential;
    POP = 0x26 0x00 "pop" None Sequential;

    // Call / return
    JMP = 0x27 0x00 "jmp" MemberToken(Method) Call;
    CALL = 0x28 0x00 "call" MemberToken(Method) Call;
    CALLI = 0x29 0x00 "calli" MemberToken(Signature) Call;
    RET = 0x2A 0x00 "ret" None Return;

    // Branch (short form)
    BR_S = 0x2B 0x00 "br.s" BranchTargetShort UnconditionalBranch;
    BRFALSE_S = 0x2C 0x00 "brfalse.s" BranchTargetShort ConditionalBranch;
    BRTRUE_S = 0x2D 0x00 "brtrue.s" BranchTargetShort ConditionalBranch;
    BEQ_S = 0x2E 0x00 "beq.s" BranchTargetShort ConditionalBranch;
    BGE_S = 0x2F 0x00 "bge.s" BranchTargetShort ConditionalBranch;
    BGT_S = 0x30 0x00 "bgt.s" BranchTargetShort ConditionalBranch;
    BLE_S = 0x31 0x00 "ble.s" BranchTargetShort ConditionalBranch;
    BLT_S = 0x32 0x00 "blt.s" BranchTargetShort ConditionalBranch;
    BNE_UN_S = 0x33 0x00 "bne.un.s" BranchTargetShort ConditionalBranch;
    BGE_UN_S = 0x34 0x00 "bge.un.s" BranchTargetShort ConditionalBranch;
    BGT_UN_S = 0x35 0x00 "bgt.un.s" BranchTargetShort ConditionalBranch;
    BLE_UN_S = 0x36 0x00 "ble.un.s" BranchTargetShort ConditionalBranch;
    BLT_UN_S = 0x37 0x00 "blt.un.s" BranchTargetShort ConditionalBranch;

    // Branch (long form)
    BR = 0x38 0x00 "br" BranchTargetLong UnconditionalBranch;
    BRFALSE = 0x39 0x00 "brfalse" BranchTargetLong ConditionalBranch;
    BRTRUE = 0x3A 0x00 "brtrue" BranchTargetLong ConditionalBranch;
    BEQ = 0x3B 0x00 "beq" BranchTargetLong ConditionalBranch;
    BGE = 0x3C 0x00 "bge" BranchTargetLong ConditionalBranch;
    BGT = 0x3D 0x00 "bgt" BranchTargetLong ConditionalBranch;
    BLE = 0x3E 0x00 "ble" BranchTargetLong ConditionalBranch;
    BLT = 0x3F 0x00 "blt" BranchTargetLong ConditionalBranch;
    BNE_UN = 0x40 0x00 "bne.un" BranchTargetLong ConditionalBranch;
    BGE_UN = 0x41 0x00 "bge.un" BranchTargetLong ConditionalBranch;
    BGT_UN = 0x42 0x00 "bgt.un" BranchTargetLong ConditionalBranch;
    BLE_UN = 0x43 0x00 "ble.un" BranchTargetLong ConditionalBranch;
    BLT_UN = 0x44 0x00 "blt.un" BranchTargetLong ConditionalBranch;

    // Switch
    SWITCH = 0x45 0x00 "switch" SwitchTable Switch;

    // Indirect load (ldind.*)
    LDIND_I1 = 0x46 0x00 "ldind.i1" None Sequential;
    LDIND_U1 = 0x47 0x00 "ldind.u1" None Sequential;
    LDIND_I2 = 0x48 0x00 "ldind.i2" None Sequential;
    LDIND_U2 = 0x49 0x00 "ldind.u2" None Sequential;
    LDIND_I4 = 0x4A 0x00 "ldind.i4" None Sequential;
    LDIND_U4 = 0x4B 0x00 "ldind.u4" None Sequential;
    LDIND_I8 = 0x4C 0x00 "ldind.i8" None Sequential;
    LDIND_I = 0x4D 0x00 "ldind.i" None Sequential;
    LDIND_R4 = 0x4E 0x00 "ldind.r4" None Sequential;
    LDIND_R8 = 0x4F 0x00 "ldind.r8" None Sequential;
    LDIND_REF = 0x50 0x00 "ldind.ref" None Sequential;

    // Indirect store (stind.*)
    STIND_REF = 0x51 0x00 "stind.ref" None Sequential;
    STIND_I1 = 0x52 0x00 "stind.i1" None Sequential;
    STIND_I2 = 0x53 0x00 "stind.i2" None Sequential;
    STIND_I4 = 0x54 0x00 "stind.i4" None Sequential;
    STIND_I8 = 0x55 0x00 "stind.i8" None Sequential;
    STIND_R4 = 0x56 0x00 "stind.r4" None Sequential;
    STIND_R8 = 0x57 0x00 "stind.r8" None Sequential;

    // Arithmetic and bitwise
    ADD = 0x58 0x00 "add" None Sequential;
    SUB = 0x59 0x00 "sub" None Sequential;
    MUL = 0x5A 0x00 "mul" None Sequential;
    DIV = 0x5B 0x00 "div" None Sequential;
    DIV_UN = 0x5C 0x00 "div.un" None Sequential;
    REM = 0x5D 0x00 "rem" None Sequential;
    REM_UN = 0x5E 0x00 "rem.un" None Sequential;
    AND = 0x5F 0x00 "and" None Sequential;
    OR = 0x60 0x00 "or" None Sequential;
    XOR = 0x61 0x00 "xor" None Sequential;
    SHL = 0x62 0x00 "shl" None Sequential;
    SHR = 0x63 0x00 "shr" None Sequential;
    SHR_UN = 0x64 0x00 "shr.un" None Sequential;
    NEG = 0x65 0x00 "neg" None Sequential;
    NOT = 0x66 0x00 "not" None Sequential;

    // Conversion
    CONV_I1 = 0x67 0x00 "conv.i1" None Sequential;
    CONV_I2 = 0x68 0x00 "conv.i2" None Sequential;
    CONV_I4 = 0x69 0x00 "conv.i4" None Sequential;
    CONV_I8 = 0x6A 0x00 "conv.i8" None Sequential;
    CONV_R4 = 0x6B 0x00 "conv.r4" None Sequential;
    CONV_R8 = 0x6C 0x00 "conv.r8" None Sequential;
    CONV_U4 = 0x6D 0x00 "conv.u4" None Sequential;
    CONV_U8 = 0x6E 0x00 "conv.u8" None Sequential;

    // Object model
    CALLVIRT = 0x6F 0x00 "callvirt" MemberToken(Method) Call;
    CPOBJ = 0x70 0x00 "cpobj" MemberToken(Type) Sequential;
    LDOBJ = 0x71 0x00 "ldobj" MemberToken(Type) Sequential;
    LDSTR = 0x72 0x00 "ldstr" StringToken Sequential;
    NEWOBJ = 0x73 0x00 "newobj" MemberToken(Method) Call;
    CASTCLASS = 0x74 0x00 "castclass" MemberToken(Type) Sequential;
    ISINST = 0x75 0x00 "isinst" MemberToken(Type) Sequential;
    CONV_R_UN = 0x76 0x00 "conv.r.un" None Sequential;
    UNBOX = 0x79 0x00 "unbox" MemberToken(Type) Sequential;
    THROW = 0x7A 0x00 "throw" None Throw;

    // Field access
    LDFLD = 0x7B 0x00 "ldfld" MemberToken(Field) Sequential;
    LDFLDA = 0x7C 0x00 "ldflda" MemberToken(Field) Sequential;
    STFLD = 0x7D 0x00 "stfld" MemberToken(Field) Sequential;
    LDSFLD = 0x7E 0x00 "ldsfld" MemberToken(Field) Sequential;
    LDSFLDA = 0x7F 0x00 "ldsflda" MemberToken(Field) Sequential;
    STSFLD = 0x80 0x00 "stsfld" MemberToken(Field) Sequential;
    STOBJ = 0x81 0x00 "stobj" MemberToken(Type) Sequential;

    // Overflow-checked unsigned conversion
    CONV_OVF_I1_UN = 0x82 0x00 "conv.ovf.i1.un" None Sequential;
    CONV_OVF_I2_UN = 0x83 0x00 "conv.ovf.i2.un" None Sequential;
    CONV_OVF_I4_UN = 0x84 0x00 "conv.ovf.i4.un" None Sequential;
    CONV_OVF_I8_UN = 0x85 0x00 "conv.ovf.i8.un" None Sequential;
    CONV_OVF_U1_UN = 0x86 0x00 "conv.ovf.u1.un" None Sequential;
    CONV_OVF_U2_UN = 0x87 0x00 "conv.ovf.u2.un" None Sequential;
    CONV_OVF_U4_UN = 0x88 0x00 "conv.ovf.u4.un" None Sequential;
    CONV_OVF_U8_UN = 0x89 0x00 "conv.ovf.u8.un" None Sequential;
    CONV_OVF_I_UN = 0x8A 0x00 "conv.ovf.i.un" None Sequential;
    CONV_OVF_U_UN = 0x8B 0x00 "conv.ovf.u.un" None Sequential;

    // Boxing and arrays
    BOX = 0x8C 0x00 "box" MemberToken(Type) Sequential;
    NEWARR = 0x8D 0x00 "newarr" MemberToken(Type) Sequential;
    LDLEN = 0x8E 0x00 "ldlen" None Sequential;
    LDELEMA = 0x8F 0x00 "ldelema" MemberToken(Type) Sequential;
    LDELEM_I1 = 0x90 0x00 "ldelem.i1" None Sequential;
    LDELEM_U1 = 0x91 0x00 "ldelem.u1" None Sequential;
    LDELEM_I2 = 0x92 0x00 "ldelem.i2" None Sequential;
    LDELEM_U2 = 0x93 0x00 "ldelem.u2" None Sequential;
    LDELEM_I4 = 0x94 0x00 "ldelem.i4" None Sequential;
    LDELEM_U4 = 0x95 0x00 "ldelem.u4" None Sequential;
    LDELEM_I8 = 0x96 0x00 "ldelem.i8" None Sequential;
    LDELEM_I = 0x97 0x00 "ldelem.i" None Sequential;
    LDELEM_R4 = 0x98 0x00 "ldelem.r4" None Sequential;
    LDELEM_R8 = 0x99 0x00 "ldelem.r8" None Sequential;
    LDELEM_REF = 0x9A 0x00 "ldelem.ref" None Sequential;
    STELEM_I = 0x9B 0x00 "stelem.i" None Sequential;
    STELEM_I1 = 0x9C 0x00 "stelem.i1" None Sequential;
    STELEM_I2 = 0x9D 0x00 "stelem.i2" None Sequential;
    STELEM_I4 = 0x9E 0x00 "stelem.i4" None Sequential;
    STELEM_I8 = 0x9F 0x00 "stelem.i8" None Sequential;
    STELEM_R4 = 0xA0 0x00 "stelem.r4" None Sequential;
    STELEM_R8 = 0xA1 0x00 "stelem.r8" None Sequential;
    STELEM_REF = 0xA2 0x00 "stelem.ref" None Sequential;
    LDELEM = 0xA3 0x00 "ldelem" MemberToken(Type) Sequential;
    STELEM = 0xA4 0x00 "stelem" MemberToken(Type) Sequential;
    UNBOX_ANY = 0xA5 0x00 "unbox.any" MemberToken(Type) Sequential;

    // Overflow-checked conversion
    CONV_OVF_I1 = 0xB3 0x00 "conv.ovf.i1" None Sequential;
    CONV_OVF_U1 = 0xB4 0x00 "conv.ovf.u1" None Sequential;
    CONV_OVF_I2 = 0xB5 0x00 "conv.ovf.i2" None Sequential;
    CONV_OVF_U2 = 0xB6 0x00 "conv.ovf.u2" None Sequential;
    CONV_OVF_I4 = 0xB7 0x00 "conv.ovf.i4" None Sequential;
    CONV_OVF_U4 = 0xB8 0x00 "conv.ovf.u4" None Sequential;
    CONV_OVF_I8 = 0xB9 0x00 "conv.ovf.i8" None Sequential;
    CONV_OVF_U8 = 0xBA 0x00 "conv.ovf.u8" None Sequential;

    // Typed references
    REFANYVAL = 0xC2 0x00 "refanyval" MemberToken(Type) Sequential;
    CKFINITE = 0xC3 0x00 "ckfinite" None Sequential;
    MKREFANY = 0xC6 0x00 "mkrefany" MemberToken(Type) Sequential;

    // Tokens and remaining conversions
    LDTOKEN = 0xD0 0x00 "ldtoken" MemberToken(Token) Sequential;
    CONV_U2 = 0xD1 0x00 "conv.u2" None Sequential;
    CONV_U1 = 0xD2 0x00 "conv.u1" None Sequential;
    CONV_I = 0xD3 0x00 "conv.i" None Sequential;
    CONV_OVF_I = 0xD4 0x00 "conv.ovf.i" None Sequential;
    CONV_OVF_U = 0xD5 0x00 "conv.ovf.u" None Sequential;
    ADD_OVF = 0xD6 0x00 "add.ovf" None Sequential;
    ADD_OVF_UN = 0xD7 0x00 "add.ovf.un" None Sequential;
    MUL_OVF = 0xD8 0x00 "mul.ovf" None Sequential;
    MUL_OVF_UN = 0xD9 0x00 "mul.ovf.un" None Sequential;
    SUB_OVF = 0xDA 0x00 "sub.ovf" None Sequential;
    SUB_OVF_UN = 0xDB 0x00 "sub.ovf.un" None Sequential;

    // Exception handling
    ENDFINALLY = 0xDC 0x00 "endfinally" None EndFinally;
    LEAVE = 0xDD 0x00 "leave" BranchTargetLong Leave;
    LEAVE_S = 0xDE 0x00 "leave.s" BranchTargetShort Leave;
    STIND_I = 0xDF 0x00 "stind.i" None Sequential;
    CONV_U = 0xE0 0x00 "conv.u" None Sequential;

    // ── Two-byte opcodes (0xFE 0x00 – 0xFE 0x1E) ───────────────────────────────

    ARGLIST = 0xFE 0x00 "arglist" None Sequential;
    CEQ = 0xFE 0x01 "ceq" None Sequential;
    CGT = 0xFE 0x02 "cgt" None Sequential;
    CGT_UN = 0xFE 0x03 "cgt.un" None Sequential;
    CLT = 0xFE 0x04 "clt" None Sequential;
    CLT_UN = 0xFE 0x05 "clt.un" None Sequential;
    LDFTN = 0xFE 0x06 "ldftn" MemberToken(Method) Sequential;
    LDVIRTFTN = 0xFE 0x07 "ldvirtftn" MemberToken(Method) Sequential;
    LDARG = 0xFE 0x09 "ldarg" ArgumentIndexLong Sequential;
    LDARGA = 0xFE 0x0A "ldarga" ArgumentIndexLong Sequential;
    STARG = 0xFE 0x0B "starg" ArgumentIndexLong Sequential;
    LDLOC = 0xFE 0x0C "ldloc" LocalIndexLong Sequential;
    LDLOCA = 0xFE 0x0D "ldloca" LocalIndexLong Sequential;
    STLOC = 0xFE 0x0E "stloc" LocalIndexLong Sequential;
    LOCALLOC = 0xFE 0x0F "localloc" None Sequential;
    ENDFILTER = 0xFE 0x11 "endfilter" None Return;
    UNALIGNED = 0xFE 0x12 "unaligned." ImmediateI1 Meta;
    VOLATILE = 0xFE 0x13 "volatile." None Meta;
    TAIL = 0xFE 0x14 "tail." None Meta;
    INITOBJ = 0xFE 0x15 "initobj" MemberToken(Type) Sequential;
    CONSTRAINED = 0xFE 0x16 "constrained." MemberToken(Type) Meta;
    CPBLK = 0xFE 0x17 "cpblk" None Sequential;
    INITBLK = 0xFE 0x18 "initblk" None Sequential;
    NO = 0xFE 0x19 "no." ImmediateI1 Meta;
    RETHROW = 0xFE 0x1A "rethrow" None Throw;
    SIZEOF = 0xFE 0x1C "sizeof" MemberToken(Type) Sequential;
    REFANYTYPE = 0xFE 0x1D "refanytype" None Sequential;
    READONLY = 0xFE 0x1E "readonly." None Meta;
}

struct OpCodeTables {
    single: [Option<CilOpCode>; 256],
    double: [Option<CilOpCode>; 256],
    mnemonics: HashMap<&'static str, CilOpCode>,
}

static OPCODE_TABLES: OnceLock<OpCodeTables> = OnceLock::new();

fn tables() -> &'static OpCodeTables {
    OPCODE_TABLES.get_or_init(|| {
        let mut tables = OpCodeTables {
            single: [None; 256],
            double: [None; 256],
            mnemonics: HashMap::with_capacity(OPCODES.len()),
        };

        for opcode in OPCODES {
            if opcode.is_two_byte {
                tables.double[usize::from(opcode.byte2)] = Some(*opcode);
            } else {
                tables.single[usize::from(opcode.byte1)] = Some(*opcode);
            }
            tables.mnemonics.insert(opcode.mnemonic, *opcode);
        }

        tables
    })
}

/// Look up an opcode by its encoding.
///
/// Pass `second = Some(byte)` for two-byte opcodes (`first == 0xFE`); the prefix byte on its
/// own is not an opcode.
#[must_use]
pub fn lookup(first: u8, second: Option<u8>) -> Option<CilOpCode> {
    match (first, second) {
        (FE_PREFIX, Some(second)) => tables().double[usize::from(second)],
        (FE_PREFIX, None) | (_, Some(_)) => None,
        (first, None) => tables().single[usize::from(first)],
    }
}

/// Look up an opcode by its mnemonic, e.g. `"ldc.i4.s"` or `"tail."`.
///
/// # Errors
/// Returns [`crate::Error::InvalidMnemonic`] if no opcode has this mnemonic.
pub fn lookup_mnemonic(mnemonic: &str) -> Result<CilOpCode> {
    tables()
        .mnemonics
        .get(mnemonic)
        .copied()
        .ok_or_else(|| Error::InvalidMnemonic(mnemonic.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_is_complete() {
        let single = OPCODES.iter().filter(|op| !op.is_two_byte).count();
        let double = OPCODES.iter().filter(|op| op.is_two_byte).count();
        assert_eq!(single, 191);
        assert_eq!(double, 28);
    }

    #[test]
    fn encodings_and_mnemonics_are_unique() {
        let mut encodings = HashSet::new();
        let mut mnemonics = HashSet::new();
        for opcode in OPCODES {
            assert!(encodings.insert((opcode.byte1, opcode.byte2)), "{}", opcode.mnemonic);
            assert!(mnemonics.insert(opcode.mnemonic), "{}", opcode.mnemonic);
        }

        let entries: HashSet<CilOpCode> = OPCODES.iter().copied().collect();
        assert_eq!(entries.len(), OPCODES.len());
    }

    #[test]
    fn lookup_round_trip() {
        for opcode in OPCODES {
            let second = opcode.is_two_byte.then_some(opcode.byte2);
            assert_eq!(lookup(opcode.byte1, second), Some(*opcode));
            assert_eq!(lookup_mnemonic(opcode.mnemonic).unwrap(), *opcode);
        }
    }

    #[test]
    fn undefined_encodings() {
        assert_eq!(lookup(0x24, None), None);
        assert_eq!(lookup(0x77, None), None);
        assert_eq!(lookup(0xA6, None), None);
        assert_eq!(lookup(0xE1, None), None);
        assert_eq!(lookup(0xFF, None), None);
        assert_eq!(lookup(0xFE, None), None);
        assert_eq!(lookup(0xFE, Some(0x08)), None);
        assert_eq!(lookup(0xFE, Some(0x1B)), None);
        assert_eq!(lookup(0xFE, Some(0x1F)), None);
        assert_eq!(lookup(0x2A, Some(0x00)), None);
    }

    #[test]
    fn operand_kinds() {
        assert_eq!(LDC_I4_S.operand_kind, OperandKind::ImmediateI1);
        assert_eq!(LDSTR.operand_kind, OperandKind::StringToken);
        assert_eq!(CALLI.operand_kind, OperandKind::MemberToken(MemberKind::Signature));
        assert_eq!(LDTOKEN.operand_kind, OperandKind::MemberToken(MemberKind::Token));
        assert_eq!(LEAVE_S.operand_kind, OperandKind::BranchTargetShort);
        assert_eq!(LDARG.operand_kind, OperandKind::ArgumentIndexLong);
        assert_eq!(STLOC_S.operand_kind, OperandKind::LocalIndexShort);
        assert_eq!(SWITCH.operand_kind, OperandKind::SwitchTable);
    }

    #[test]
    fn prefixes() {
        let prefixes: Vec<_> = OPCODES
            .iter()
            .filter(|op| op.is_prefix())
            .map(|op| op.mnemonic)
            .collect();
        assert_eq!(
            prefixes,
            ["unaligned.", "volatile.", "tail.", "constrained.", "no.", "readonly."]
        );
    }

    #[test]
    fn invalid_mnemonic() {
        assert!(matches!(
            lookup_mnemonic("ldc.i4.9"),
            Err(Error::InvalidMnemonic(m)) if m == "ldc.i4.9"
        ));
    }
}
