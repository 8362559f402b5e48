//! Operand model: raw operand-kind codes, their simplified categories and sizes.
//!
//! The raw-decode primitive describes every operand with a one-byte kind code (see
//! [`OperandType`]). Analysis code rarely cares about the exact width of a register or memory
//! reference, so the codes are folded into a handful of [`OperandKind`] categories. Both the
//! folding and the byte-size of an operand are answered by fixed 256-entry tables, so every
//! possible code, including reserved ones, maps to a defined value.
//!
//! # Key Components
//!
//! - [`OperandType`] - Known raw operand-kind codes
//! - [`OperandKind`] - Simplified operand category
//! - [`Operand`] - Tagged operand value produced by [`crate::Instruction::operand`]
//! - [`simplify`] / [`size_bytes`] - Total lookups over raw codes
//!
//! # Examples
//!
//! ```rust
//! use codecursor::disassembler::{simplify, size_bytes, OperandKind, OperandType};
//!
//! assert_eq!(simplify(OperandType::Memory32.code()), OperandKind::Memory);
//! assert_eq!(size_bytes(OperandType::Register128.code()), 16);
//!
//! // Codes the primitive never produces are still answered
//! assert_eq!(simplify(0xFF), OperandKind::Invalid);
//! assert_eq!(size_bytes(0xFF), 0);
//! ```

use iced_x86::Register;
use strum::{AsRefStr, Display, EnumCount, EnumIter};

/// Raw operand-kind codes as written into [`crate::raw::RawInstructionFacts::types`].
///
/// The numbering is part of the wire contract with the raw-decode primitive and must not be
/// reordered. Adding a new code only requires a new table row in [`simplify`] and
/// [`size_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum OperandType {
    /// No operand, or an operand the primitive could not describe
    Invalid = 0,
    /// 8-bit register
    Register8 = 1,
    /// 16-bit register
    Register16 = 2,
    /// 32-bit register
    Register32 = 3,
    /// 64-bit register
    Register64 = 4,
    /// 128-bit vector register
    Register128 = 5,
    /// 256-bit vector register
    Register256 = 6,
    /// 512-bit vector register
    Register512 = 7,
    /// 8-bit memory reference
    Memory8 = 8,
    /// 16-bit memory reference
    Memory16 = 9,
    /// 32-bit memory reference
    Memory32 = 10,
    /// 64-bit memory reference
    Memory64 = 11,
    /// 128-bit memory reference
    Memory128 = 12,
    /// 256-bit memory reference
    Memory256 = 13,
    /// 512-bit memory reference
    Memory512 = 14,
    /// 8-bit immediate (including sign-extended forms)
    Immediate8 = 15,
    /// Second 8-bit immediate (`enter imm16, imm8`)
    Immediate8_2nd = 16,
    /// 16-bit immediate
    Immediate16 = 17,
    /// 32-bit immediate (including sign-extended forms)
    Immediate32 = 18,
    /// 64-bit immediate
    Immediate64 = 19,
    /// Relative near branch target
    NearBranch = 20,
    /// Far branch target (`selector:offset`)
    FarBranch = 21,
}

/// Simplified operand category.
///
/// Every raw [`OperandType`] belongs to exactly one category. Comparisons between the two are
/// available in both directions:
///
/// ```rust
/// use codecursor::disassembler::{OperandKind, OperandType};
///
/// assert!(OperandType::Register64 == OperandKind::Register);
/// assert!(OperandKind::Register == OperandType::Register64);
/// assert!(OperandKind::Memory != OperandType::Immediate8);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, EnumCount, Display, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum OperandKind {
    /// Register operand
    Register,
    /// Memory operand
    Memory,
    /// Immediate operand
    Immediate,
    /// Relative near branch target
    NearBranch,
    /// Far branch target
    FarBranch,
    /// Missing or unknown operand
    #[default]
    Invalid,
}

const KIND_TABLE: [OperandKind; 256] = build_kind_table();
const SIZE_TABLE: [u8; 256] = build_size_table();

const fn build_kind_table() -> [OperandKind; 256] {
    let mut table = [OperandKind::Invalid; 256];
    let mut code = 1;
    while code <= 7 {
        table[code] = OperandKind::Register;
        code += 1;
    }
    while code <= 14 {
        table[code] = OperandKind::Memory;
        code += 1;
    }
    while code <= 19 {
        table[code] = OperandKind::Immediate;
        code += 1;
    }
    table[OperandType::NearBranch as usize] = OperandKind::NearBranch;
    table[OperandType::FarBranch as usize] = OperandKind::FarBranch;
    table
}

const fn build_size_table() -> [u8; 256] {
    let mut table = [0u8; 256];

    table[OperandType::Register8 as usize] = 1;
    table[OperandType::Register16 as usize] = 2;
    table[OperandType::Register32 as usize] = 4;
    table[OperandType::Register64 as usize] = 8;
    table[OperandType::Register128 as usize] = 16;
    table[OperandType::Register256 as usize] = 32;
    table[OperandType::Register512 as usize] = 64;

    table[OperandType::Memory8 as usize] = 1;
    table[OperandType::Memory16 as usize] = 2;
    table[OperandType::Memory32 as usize] = 4;
    table[OperandType::Memory64 as usize] = 8;
    table[OperandType::Memory128 as usize] = 16;
    table[OperandType::Memory256 as usize] = 32;
    table[OperandType::Memory512 as usize] = 64;

    table[OperandType::Immediate8 as usize] = 1;
    table[OperandType::Immediate8_2nd as usize] = 1;
    table[OperandType::Immediate16 as usize] = 2;
    table[OperandType::Immediate32 as usize] = 4;
    table[OperandType::Immediate64 as usize] = 8;

    // rel8/rel32 are sign-extended to the full instruction pointer
    table[OperandType::NearBranch as usize] = 8;
    // ptr16:32
    table[OperandType::FarBranch as usize] = 6;

    table
}

/// Fold a raw operand-kind code into its [`OperandKind`].
///
/// Total over `u8`: unknown codes yield [`OperandKind::Invalid`].
#[must_use]
#[inline]
pub const fn simplify(code: u8) -> OperandKind {
    KIND_TABLE[code as usize]
}

/// Size in bytes of an operand with the given raw kind code (`0..=64`).
///
/// Total over `u8`: unknown codes yield `0`.
#[must_use]
#[inline]
pub const fn size_bytes(code: u8) -> u8 {
    SIZE_TABLE[code as usize]
}

impl OperandType {
    /// Look up a known raw code; `None` for codes outside the contract.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        use strum::IntoEnumIterator;
        OperandType::iter().find(|t| *t as u8 == code)
    }

    /// The raw wire code of this operand type.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Simplified category of this operand type.
    #[must_use]
    pub const fn kind(self) -> OperandKind {
        simplify(self as u8)
    }

    /// Size in bytes of this operand type.
    #[must_use]
    pub const fn size(self) -> u8 {
        size_bytes(self as u8)
    }
}

impl PartialEq<OperandKind> for OperandType {
    fn eq(&self, other: &OperandKind) -> bool {
        self.kind() == *other
    }
}

impl PartialEq<OperandType> for OperandKind {
    fn eq(&self, other: &OperandType) -> bool {
        *self == other.kind()
    }
}

/// A decoded operand.
///
/// Produced on demand by [`crate::Instruction::operand`] from the raw facts; only the fields
/// that are meaningful for the operand's kind exist on each variant.
///
/// # Examples
///
/// ```rust
/// use codecursor::{Decoder, disassembler::Operand};
/// use iced_x86::Register;
///
/// let code = [0x48, 0x89, 0xE5]; // mov rbp, rsp
/// let mut decoder = Decoder::new(&code, 0);
/// let instruction = decoder.decode()?;
///
/// assert_eq!(
///     instruction.operand(0),
///     Operand::Register { register: Register::RBP, size: 8 }
/// );
/// # Ok::<(), codecursor::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Register operand
    Register {
        /// The register
        register: Register,
        /// Operand width in bytes
        size: u8,
    },
    /// Memory operand
    Memory {
        /// Base register (`Register::None` if absent)
        base: Register,
        /// Index register (`Register::None` if absent)
        index: Register,
        /// Index scale factor
        scale: u8,
        /// Access width in bytes
        size: u8,
    },
    /// Immediate operand
    Immediate {
        /// Sign-extended immediate value
        value: u64,
        /// Encoded immediate width in bytes
        size: u8,
    },
    /// Relative near branch target; resolve with [`crate::Instruction::branch_target`]
    NearBranch {
        /// Target width in bytes
        size: u8,
    },
    /// Far branch target; resolve with [`crate::Instruction::branch_target`]
    FarBranch {
        /// Target width in bytes
        size: u8,
    },
    /// Missing or unknown operand
    Invalid,
}

impl Operand {
    /// The simplified category of this operand.
    #[must_use]
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Register { .. } => OperandKind::Register,
            Operand::Memory { .. } => OperandKind::Memory,
            Operand::Immediate { .. } => OperandKind::Immediate,
            Operand::NearBranch { .. } => OperandKind::NearBranch,
            Operand::FarBranch { .. } => OperandKind::FarBranch,
            Operand::Invalid => OperandKind::Invalid,
        }
    }

    /// Width of this operand in bytes, `0` for [`Operand::Invalid`].
    #[must_use]
    pub fn size(&self) -> u8 {
        match self {
            Operand::Register { size, .. }
            | Operand::Memory { size, .. }
            | Operand::Immediate { size, .. }
            | Operand::NearBranch { size }
            | Operand::FarBranch { size } => *size,
            Operand::Invalid => 0,
        }
    }
}
