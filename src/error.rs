use thiserror::Error;

use crate::metadata::{
    tables::{CodedIndexType, TableId},
    token::Token,
};

macro_rules! malformed_error {
    // Single string version
    ($offset:expr, $msg:expr) => {
        crate::Error::MalformedHeader {
            message: $msg.to_string(),
            offset: $offset,
        }
    };

    // Format string with arguments version
    ($offset:expr, $fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedHeader {
            message: format!($fmt, $($arg)*),
            offset: $offset,
        }
    };
}

macro_rules! truncated_error {
    ($offset:expr, $needed:expr) => {
        crate::Error::TruncatedStream {
            offset: $offset,
            needed: $needed,
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Decode-time errors are final for the method body being processed: no partial result is
/// returned and no repair is attempted. Every decode error carries the byte offset, relative to
/// the buffer handed to the decoder, at which the problem was detected.
///
/// Encode-time errors ([`Error::OperandTypeMismatch`], [`Error::UnsupportedTable`],
/// [`Error::BranchOutOfRange`]) signal that the caller built an instruction or reference that
/// cannot be expressed in the binary format. They are never produced by decoding.
///
/// # Examples
///
/// ```rust
/// use dotcil::{metadata::method::RawMethodBody, CodecConfig, Error};
///
/// // Low bits `01` are neither a tiny nor a fat header
/// match RawMethodBody::read(&[0x01], &CodecConfig::default()) {
///     Err(Error::MalformedHeader { offset, .. }) => assert_eq!(offset, 0),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A method body, section or table header does not follow the format.
    ///
    /// Raised for an invalid tiny/fat selector, an exception section whose byte length is
    /// not a whole number of clauses, and similar structural violations.
    #[error("Malformed header at offset {offset}: {message}")]
    MalformedHeader {
        /// Description of what was malformed
        message: String,
        /// Byte offset at which the malformation was detected
        offset: usize,
    },

    /// The declared length runs past the end of the available bytes.
    #[error("Truncated stream at offset {offset}, {needed} more byte(s) required")]
    TruncatedStream {
        /// Byte offset at which the read was attempted
        offset: usize,
        /// Number of bytes the read needed
        needed: usize,
    },

    /// A byte (or `0xFE`-prefixed byte pair) does not map to a defined opcode.
    #[error("Unknown opcode {prefix:02X} {opcode:02X} at offset {offset}")]
    UnknownOpcode {
        /// `0xFE` for two-byte opcodes, `0x00` otherwise
        prefix: u8,
        /// The opcode byte that failed the lookup
        opcode: u8,
        /// Byte offset of the opcode
        offset: usize,
    },

    /// An instruction's operand does not have the shape its opcode requires.
    ///
    /// This is a contract violation by the code that constructed the instruction.
    #[error("Operand of '{mnemonic}' at offset {offset} does not match the expected {expected}")]
    OperandTypeMismatch {
        /// Mnemonic of the offending instruction
        mnemonic: &'static str,
        /// Description of the operand shape the opcode requires
        expected: &'static str,
        /// Computed offset of the offending instruction
        offset: usize,
    },

    /// A local or argument index was rejected by the resolver or does not fit the short
    /// operand form, or a coded or heap index does not fit its column.
    #[error("{kind} index {index} at offset {offset} is out of range")]
    IndexOutOfRange {
        /// `"local"`, `"argument"`, `"user string"`, `"coded"` or `"heap"`
        kind: &'static str,
        /// The offending index
        index: u32,
        /// Byte offset of the operand
        offset: usize,
    },

    /// The resolver could not map a member token.
    #[error("Unresolved member {token} at offset {offset}")]
    UnresolvedMember {
        /// The raw token read from the stream
        token: Token,
        /// Byte offset of the operand
        offset: usize,
    },

    /// The resolver could not map a user-string heap offset.
    #[error("Unresolved user string 0x{index:06X} at offset {offset}")]
    UnresolvedString {
        /// User-string heap offset (token with the `0x70` tag masked off)
        index: u32,
        /// Byte offset of the operand
        offset: usize,
    },

    /// A coded index carried a tag outside its candidate table list.
    #[error("Invalid tag {tag} for coded index {kind:?}")]
    InvalidTag {
        /// The extracted tag
        tag: u32,
        /// The coded index kind that was decoded
        kind: CodedIndexType,
    },

    /// The high byte of a metadata token does not name a known table.
    #[error("Invalid table id 0x{0:02X}")]
    InvalidTableId(u8),

    /// A coded index was asked to reference a table outside its candidate list.
    #[error("Table {table:?} can not be referenced through coded index {kind:?}")]
    UnsupportedTable {
        /// The requested table
        table: TableId,
        /// The coded index kind
        kind: CodedIndexType,
    },

    /// A short branch delta does not fit into a signed byte.
    #[error("Branch '{mnemonic}' at offset {offset} needs delta {delta}, which its operand can not hold")]
    BranchOutOfRange {
        /// Mnemonic of the branch
        mnemonic: &'static str,
        /// The computed delta
        delta: i64,
        /// Computed offset of the branch instruction
        offset: usize,
    },

    /// A branch target does not land on an instruction boundary, or a label points past the
    /// end of the code.
    #[error("Branch at offset {offset} targets {target}, which is not an instruction boundary")]
    InvalidBranchTarget {
        /// Byte offset of the branch instruction
        offset: usize,
        /// The computed target offset
        target: i64,
    },

    /// A mnemonic does not name a known opcode.
    #[error("Invalid mnemonic '{0}'")]
    InvalidMnemonic(String),

    /// An import lookup entry can not be decoded or encoded.
    #[error("Invalid import: {0}")]
    InvalidImport(String),
}
