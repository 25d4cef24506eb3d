//! # dotcil Prelude
//!
//! The most commonly used types and traits of the crate in one glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotcil operations
pub use crate::Error;

/// The result type used throughout dotcil
pub use crate::Result;

/// Decoder tolerance settings
pub use crate::CodecConfig;

/// Byte-level reading and writing
pub use crate::{Parser, Writer};

// ================================================================================================
// Instructions
// ================================================================================================

/// Opcode table and named opcode constants
pub use crate::assembly::opcodes;

/// Instruction list, instructions and operands
pub use crate::assembly::{
    CilCode, CilInstruction, CilOpCode, FlowType, Immediate, Label, MemberKind, Operand,
    OperandKind,
};

/// Instruction stream codec
pub use crate::assembly::{decode_stream, encode_stream};

/// Operand resolution and the raw token model
pub use crate::assembly::{OperandBuilder, OperandModel, OperandResolver, RawModel, RawOperands};

// ================================================================================================
// Method Bodies
// ================================================================================================

/// Method bodies, headers and exception handling clauses
pub use crate::metadata::method::{
    decode_method_bodies, ExceptionHandler, ExceptionHandlerKind, MethodBody, MethodBodyHeader,
    RawMethodBody,
};

// ================================================================================================
// Metadata
// ================================================================================================

/// Tokens
pub use crate::metadata::token::Token;

/// Tables and coded indices
pub use crate::metadata::tables::{CodedIndex, CodedIndexType, TableId, TableInfo, TokenSpace};

/// Heap index widths
pub use crate::metadata::streams::{HeapKind, HeapSizes};

/// PE import lookup entries
pub use crate::metadata::imports::{HintName, ImportLookupEntry, ThunkWidth};
