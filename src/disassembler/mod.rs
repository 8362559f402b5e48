//! x86/x86-64 instruction decoding cursor and classification engine.
//!
//! This module walks machine code one instruction at a time and answers the questions a
//! linear analysis asks about each instruction: what it is, what its operands are, where
//! control goes next and which addresses it references.
//!
//! # Key Types
//! - [`Decoder`] - Cursor over a borrowed code buffer
//! - [`Instruction`] - A decoded instruction with classification queries
//! - [`FlowControl`] - How instructions affect control flow
//! - [`Operand`] / [`OperandKind`] / [`OperandType`] - The operand model
//!
//! # Main Functions
//! - [`decode_stream`] - Decode a whole buffer
//! - [`simplify`] / [`size_bytes`] - Total lookups over raw operand-kind codes
//!
//! # Example
//! ```rust
//! use codecursor::disassembler::{Decoder, FlowControl};
//! let code = [0x90, 0xC3]; // nop, ret
//! let mut decoder = Decoder::new(&code, 0x1000);
//! let instruction = decoder.decode()?;
//! assert_eq!(instruction.flow_control(), FlowControl::Next);
//! # Ok::<(), codecursor::Error>(())
//! ```

mod decoder;
mod instruction;
mod operand;

pub use decoder::{decode_stream, DecodeMode, Decoder, DecoderConfig};
pub use instruction::{FlowControl, Instruction};
pub use operand::{simplify, size_bytes, Operand, OperandKind, OperandType};
