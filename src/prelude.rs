//! # codecursor Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! codecursor library. Import this module to get quick access to the cursor, the instruction
//! model and error handling.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all codecursor operations
pub use crate::Error;

/// The result type used throughout codecursor
pub use crate::Result;

// ================================================================================================
// Decoding
// ================================================================================================

/// The decoding cursor and its configuration
pub use crate::disassembler::{decode_stream, DecodeMode, Decoder, DecoderConfig};

// ================================================================================================
// Instruction Model
// ================================================================================================

/// Decoded instructions and their classification
pub use crate::disassembler::{FlowControl, Instruction};

/// Operand model
pub use crate::disassembler::{simplify, size_bytes, Operand, OperandKind, OperandType};

/// Register and mnemonic identifiers of the decoding backend
pub use iced_x86::{Mnemonic, Register};

// ================================================================================================
// Raw Decoding
// ================================================================================================

/// Raw-decode primitive contract
pub use crate::raw::{Attributes, RawDecodeFn, RawInstructionFacts, RawOutput};
