//! CIL instruction processing.
//!
//! This module covers everything between the raw code bytes of a method body and an editable
//! instruction list:
//!
//! - [`opcodes`] - the static opcode table with lookup by encoding and by mnemonic
//! - [`instruction`] - operand shapes, operand values, labels and instructions
//! - [`resolver`] - the traits that connect operands to an object model
//! - [`code`] - the instruction list with index-based labels
//! - [`decoder`] / [`encoder`] - the byte stream codec
//!
//! # Examples
//!
//! ```rust
//! use dotcil::{
//!     assembly::{decode_stream, encode_stream, RawOperands},
//!     CodecConfig, Parser, Writer,
//! };
//!
//! // ldarg.0; brtrue.s +1; nop; ret
//! let bytes = [0x02, 0x2D, 0x01, 0x00, 0x2A];
//! let code = decode_stream(
//!     &mut Parser::new(&bytes),
//!     bytes.len(),
//!     &RawOperands,
//!     &[],
//!     &CodecConfig::default(),
//! )?;
//! println!("{code}");
//!
//! let mut writer = Writer::new();
//! encode_stream(&code, &RawOperands, &mut writer)?;
//! assert_eq!(writer.as_slice(), bytes);
//! # Ok::<(), dotcil::Error>(())
//! ```

pub mod code;
pub mod decoder;
pub mod encoder;
pub mod instruction;
pub mod opcodes;
pub mod resolver;

pub use code::CilCode;
pub use decoder::decode_stream;
pub use encoder::encode_stream;
pub use instruction::{
    CilInstruction, FlowType, Immediate, Label, MemberKind, Operand, OperandKind,
};
pub use opcodes::CilOpCode;
pub use resolver::{OperandBuilder, OperandModel, OperandResolver, RawModel, RawOperands};
