//! Raw-decode primitive contract.
//!
//! A raw-decode primitive turns a window of at most [`MAX_INSTRUCTION_LEN`] bytes into the
//! facts of exactly one instruction. The [`crate::Decoder`] calls it as a black box through a
//! [`RawDecodeFn`] function pointer and never inspects the bytes itself.
//!
//! # Key Components
//!
//! - [`RawInstructionFacts`] - Fixed-layout record filled by the primitive
//! - [`RawOutput`] - Facts plus the optional rendered text
//! - [`InstructionText`] - Owned or foreign-allocated text with exactly-once release
//! - [`Attributes`] - Prefix/attribute bitmask
//! - [`decode_fast`] / [`decode_text`] - The shipped `iced-x86` primitives
//!
//! # Contract
//!
//! - The primitive returns `0` when it accepted the input and a negative status when it
//!   rejected it (empty window, unsupported bitness). The status alone is not a success
//!   discriminator; use [`RawInstructionFacts::is_success`].
//! - `length` never exceeds the window handed to the primitive.
//! - RIP/EIP-relative memory and near-branch operands store the displacement relative to the
//!   end of the instruction, so targets are recomputed from the cursor address.
//!
//! # Examples
//!
//! ```rust
//! use codecursor::raw::{decode_fast, RawOutput, STATUS_SUCCESS};
//!
//! let mut out = RawOutput::default();
//! let status = decode_fast(&[0xC3], 64, &mut out);
//!
//! assert_eq!(status, STATUS_SUCCESS);
//! assert!(out.facts.is_success());
//! assert_eq!(out.facts.length, 1);
//! ```

mod iced;
mod text;

pub use iced::{decode_fast, decode_text};
pub use text::InstructionText;

use bitflags::bitflags;
use std::mem::{offset_of, size_of};

/// Maximum encoded length of a single x86/x86-64 instruction in bytes.
pub const MAX_INSTRUCTION_LEN: usize = 15;

/// Mnemonic code of an undecodable instruction.
pub const MNEMONIC_INVALID: u16 = 0;

/// Status returned by a primitive that accepted its input.
pub const STATUS_SUCCESS: i32 = 0;

/// Status returned by a primitive that rejected its input.
pub const STATUS_REJECTED: i32 = -1;

/// Signature of a raw-decode primitive.
///
/// `code` is the decode window (never longer than [`MAX_INSTRUCTION_LEN`] when called by the
/// cursor), `bitness` is 16, 32 or 64. The primitive overwrites `out` completely.
pub type RawDecodeFn = fn(code: &[u8], bitness: u32, out: &mut RawOutput) -> i32;

bitflags! {
    /// Prefix and encoding attributes of an instruction
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        /// `REP`/`REPE` prefix present
        const REP = 1 << 0;
        /// `REPNE` prefix present
        const REPNE = 1 << 1;
        /// `LOCK` prefix present
        const LOCK = 1 << 2;
        /// Explicit segment override prefix present
        const SEGMENT_OVERRIDE = 1 << 3;
        /// EVEX embedded broadcast
        const BROADCAST = 1 << 4;
    }
}

/// Facts about one decoded instruction, as produced by a raw-decode primitive.
///
/// The layout is `#[repr(C)]` and matches the record exchanged over the C ABI byte for byte
/// (asserted at compile time below). Bytes 17..24 are alignment filler.
/// The rendered text is not part of this record; see [`RawOutput::text`] and
/// [`crate::ffi::FfiInstruction`] for the wire form that carries a text pointer at offset 40.
///
/// Register codes are in `iced_x86::Register` code space, the mnemonic in
/// `iced_x86::Mnemonic` code space and operand types are [`crate::disassembler::OperandType`]
/// codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawInstructionFacts {
    /// Mnemonic code, [`MNEMONIC_INVALID`] when undecodable
    pub mnemonic: u16,
    /// Memory base register code
    pub mem_base: u8,
    /// Memory index register code
    pub mem_index: u8,
    /// Memory index scale (1, 2, 4, 8)
    pub mem_scale: u8,
    /// Implicit stack pointer delta in bytes, saturated to `i8`
    pub stack_growth: i8,
    /// Register codes of operands 0..4 (`0` when the operand is not a register)
    pub regs: [u8; 4],
    /// Raw operand-kind codes of operands 0..4
    pub types: [u8; 4],
    /// [`Attributes`] bits
    pub attributes: u8,
    /// Encoded length in bytes
    pub length: u8,
    /// Number of visible operands
    pub operand_count_visible: u8,
    /// Primary immediate, sign-extended
    pub immediate: u64,
    /// Memory/branch displacement, or the secondary immediate for instructions without memory
    /// or branch operands
    pub mem_disp: u64,
}

const _: () = assert!(offset_of!(RawInstructionFacts, mnemonic) == 0, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, mem_base) == 2, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, mem_index) == 3, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, mem_scale) == 4, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, stack_growth) == 5, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, regs) == 6, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, types) == 10, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, attributes) == 14, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, length) == 15, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, operand_count_visible) == 16, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, immediate) == 24, "invalid offset");
const _: () = assert!(offset_of!(RawInstructionFacts, mem_disp) == 32, "invalid offset");
const _: () = assert!(size_of::<RawInstructionFacts>() == 40, "invalid size");

impl RawInstructionFacts {
    /// `true` if the primitive produced a real instruction: a known mnemonic with a non-zero
    /// length.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.mnemonic != MNEMONIC_INVALID && self.length > 0
    }

    /// The attribute bits as [`Attributes`]; unknown bits are dropped.
    #[must_use]
    pub fn attributes(&self) -> Attributes {
        Attributes::from_bits_truncate(self.attributes)
    }

    /// The displacement view of the shared 64-bit field.
    #[must_use]
    pub fn displacement(&self) -> u64 {
        self.mem_disp
    }

    /// The secondary-immediate view of the shared 64-bit field.
    #[must_use]
    pub fn immediate2(&self) -> u64 {
        self.mem_disp
    }
}

/// Everything a primitive produces for one instruction.
///
/// Moving a `RawOutput` moves ownership of the text; dropping it releases the text exactly once.
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    /// The fixed-layout facts
    pub facts: RawInstructionFacts,
    /// Rendered text, only produced by text-annotated primitives
    pub text: Option<InstructionText>,
}

impl RawOutput {
    /// Split into facts and text.
    #[must_use]
    pub fn into_parts(self) -> (RawInstructionFacts, Option<InstructionText>) {
        (self.facts, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_mnemonic_and_length() {
        let mut facts = RawInstructionFacts::default();
        assert!(!facts.is_success());

        facts.length = 1;
        assert!(!facts.is_success());

        facts.mnemonic = iced_x86::Mnemonic::Nop as u16;
        assert!(facts.is_success());

        facts.length = 0;
        assert!(!facts.is_success());
    }

    #[test]
    fn attributes_truncate_unknown_bits() {
        let facts = RawInstructionFacts {
            attributes: 0b1110_0101,
            ..Default::default()
        };
        assert_eq!(facts.attributes(), Attributes::REP | Attributes::LOCK);
    }

    #[test]
    fn shared_field_views() {
        let facts = RawInstructionFacts {
            mem_disp: 0x40,
            ..Default::default()
        };
        assert_eq!(facts.displacement(), 0x40);
        assert_eq!(facts.immediate2(), 0x40);
    }
}
