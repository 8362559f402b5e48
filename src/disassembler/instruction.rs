//! Decoded x86 instruction and its classification queries.
//!
//! An [`Instruction`] is a thin view over the [`RawInstructionFacts`] a primitive produced for
//! one decode step, plus the address the instruction was decoded at. Everything else (operand
//! tagging, flow-control class, resolved memory and branch targets) is derived on demand from
//! those facts, so all queries are cheap, total and never fail.
//!
//! # Key Components
//!
//! - [`Instruction`] - One decoded instruction
//! - [`FlowControl`] - How an instruction affects the next-executed address
//!
//! # Target Resolution
//!
//! The primitive stores address-relative quantities relative to the end of the instruction, so
//! resolved targets follow a single formula, `ip + len + displacement`, computed with wrapping
//! arithmetic. Targets that cannot be known statically (register-indirect branches, memory
//! operands with a general-purpose base) resolve to `0`.
//!
//! # Examples
//!
//! ```rust
//! use codecursor::{Decoder, FlowControl};
//!
//! let code = [0xE8, 0x10, 0x00, 0x00, 0x00]; // call +0x10
//! let mut decoder = Decoder::new(&code, 0x1000);
//! let call = decoder.decode()?;
//!
//! assert!(call.is_call());
//! assert_eq!(call.flow_control(), FlowControl::Call);
//! assert_eq!(call.branch_target(), 0x1015);
//! # Ok::<(), codecursor::Error>(())
//! ```

use std::fmt;

use iced_x86::{Mnemonic, Register};
use strum::{AsRefStr, Display, EnumCount, EnumIter};

use crate::{
    disassembler::{simplify, size_bytes, Operand, OperandKind, OperandType},
    raw::{Attributes, InstructionText, RawInstructionFacts, RawOutput},
};

/// Control-flow class of an instruction.
///
/// The classes mirror the flow-control categories of `iced-x86`, computed here from the
/// mnemonic and the first operand only.
///
/// # Thread Safety
///
/// [`FlowControl`] is [`std::marker::Send`] and [`std::marker::Sync`] as it only contains unit variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, Display, AsRefStr)]
pub enum FlowControl {
    /// Execution continues with the next instruction
    Next,
    /// Direct unconditional jump
    UnconditionalBranch,
    /// Jump through a register or memory operand
    IndirectBranch,
    /// Conditional jump, including `loop` and `jcxz` forms
    ConditionalBranch,
    /// Return from a procedure, interrupt or system call
    Return,
    /// Direct call, system call or VM entry
    Call,
    /// Call through a register or memory operand
    IndirectCall,
    /// Software interrupt
    Interrupt,
    /// Transactional memory begin/abort/end
    XbeginXabortXend,
    /// Undefined or undecodable instruction
    Exception,
}

/// One decoded x86/x86-64 instruction.
///
/// Owns its facts and its rendered text (if the decoding mode produced any). Cloning deep-copies
/// the text, so a clone can outlive the decoder and the original independently.
///
/// # Thread Safety
///
/// [`Instruction`] is [`std::marker::Send`] and [`std::marker::Sync`]; all queries take `&self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    ip: u64,
    facts: RawInstructionFacts,
    text: Option<InstructionText>,
}

impl Instruction {
    /// Wrap the output of a raw-decode primitive as an instruction located at `ip`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use codecursor::{raw::{decode_fast, RawOutput}, Instruction};
    ///
    /// let mut out = RawOutput::default();
    /// decode_fast(&[0xC3], 64, &mut out);
    ///
    /// let ret = Instruction::from_raw(0x401000, out);
    /// assert!(ret.is_return());
    /// assert_eq!(ret.next_ip(), 0x401001);
    /// ```
    #[must_use]
    pub fn from_raw(ip: u64, output: RawOutput) -> Self {
        let (facts, text) = output.into_parts();
        Instruction { ip, facts, text }
    }

    /// Address this instruction was decoded at.
    #[must_use]
    pub fn ip(&self) -> u64 {
        self.ip
    }

    /// Encoded length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.facts.length)
    }

    /// `true` for a zero-length result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.length == 0
    }

    /// Address of the following instruction.
    #[must_use]
    pub fn next_ip(&self) -> u64 {
        self.ip.wrapping_add(u64::from(self.facts.length))
    }

    /// The underlying facts record.
    #[must_use]
    pub fn facts(&self) -> &RawInstructionFacts {
        &self.facts
    }

    /// Rendered text, only present for text-annotated decoding.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().map(InstructionText::as_str)
    }

    /// The mnemonic; codes unknown to `iced-x86` read as `Mnemonic::INVALID`.
    #[must_use]
    pub fn mnemonic(&self) -> Mnemonic {
        Mnemonic::try_from(usize::from(self.facts.mnemonic)).unwrap_or(Mnemonic::INVALID)
    }

    /// The raw mnemonic code.
    #[must_use]
    pub fn mnemonic_code(&self) -> u16 {
        self.facts.mnemonic
    }

    /// `true` unless the bytes were undecodable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.mnemonic() != Mnemonic::INVALID
    }

    /// Number of visible operands (at most 4).
    #[must_use]
    pub fn operand_count(&self) -> usize {
        usize::from(self.facts.operand_count_visible).min(self.facts.types.len())
    }

    fn type_code(&self, index: usize) -> u8 {
        if index < self.operand_count() {
            self.facts.types[index]
        } else {
            OperandType::Invalid.code()
        }
    }

    /// Raw operand type of operand `index`, `None` if absent or unknown.
    #[must_use]
    pub fn op_type(&self, index: usize) -> Option<OperandType> {
        OperandType::from_code(self.type_code(index))
    }

    /// Simplified kind of operand `index`, [`OperandKind::Invalid`] if absent.
    #[must_use]
    pub fn op_kind(&self, index: usize) -> OperandKind {
        simplify(self.type_code(index))
    }

    /// Size in bytes of operand `index`, `0` if absent.
    #[must_use]
    pub fn op_size(&self, index: usize) -> u8 {
        size_bytes(self.type_code(index))
    }

    /// Register of operand `index`, `Register::None` if it is not a register operand.
    #[must_use]
    pub fn op_register(&self, index: usize) -> Register {
        if self.op_kind(index) == OperandKind::Register {
            register_from_code(self.facts.regs[index])
        } else {
            Register::None
        }
    }

    /// Tagged view of operand `index`; [`Operand::Invalid`] for `index >= operand_count()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use codecursor::{Decoder, disassembler::Operand};
    ///
    /// let code = [0xC8, 0x20, 0x00, 0x01]; // enter 0x20, 1
    /// let mut decoder = Decoder::new(&code, 0);
    /// let enter = decoder.decode()?;
    ///
    /// assert_eq!(enter.operand(0), Operand::Immediate { value: 0x20, size: 2 });
    /// assert_eq!(enter.operand(1), Operand::Immediate { value: 1, size: 1 });
    /// assert_eq!(enter.operand(2), Operand::Invalid);
    /// # Ok::<(), codecursor::Error>(())
    /// ```
    #[must_use]
    pub fn operand(&self, index: usize) -> Operand {
        let code = self.type_code(index);
        let size = size_bytes(code);

        match simplify(code) {
            OperandKind::Register => Operand::Register {
                register: register_from_code(self.facts.regs[index]),
                size,
            },
            OperandKind::Memory => Operand::Memory {
                base: self.memory_base(),
                index: self.memory_index(),
                scale: self.memory_scale(),
                size,
            },
            OperandKind::Immediate => Operand::Immediate {
                value: if code == OperandType::Immediate8_2nd.code() {
                    self.immediate2()
                } else {
                    self.immediate()
                },
                size,
            },
            OperandKind::NearBranch => Operand::NearBranch { size },
            OperandKind::FarBranch => Operand::FarBranch { size },
            OperandKind::Invalid => Operand::Invalid,
        }
    }

    /// All visible operands in order.
    pub fn operands(&self) -> impl Iterator<Item = Operand> + '_ {
        (0..self.operand_count()).map(|index| self.operand(index))
    }

    /// Primary immediate, sign-extended.
    #[must_use]
    pub fn immediate(&self) -> u64 {
        self.facts.immediate
    }

    /// Secondary immediate; shares storage with [`Instruction::displacement`].
    #[must_use]
    pub fn immediate2(&self) -> u64 {
        self.facts.immediate2()
    }

    /// Memory or branch displacement, relative to the end of the instruction for
    /// IP-relative forms.
    #[must_use]
    pub fn displacement(&self) -> u64 {
        self.facts.displacement()
    }

    /// Base register of the memory operand.
    #[must_use]
    pub fn memory_base(&self) -> Register {
        register_from_code(self.facts.mem_base)
    }

    /// Index register of the memory operand.
    #[must_use]
    pub fn memory_index(&self) -> Register {
        register_from_code(self.facts.mem_index)
    }

    /// Index scale of the memory operand.
    #[must_use]
    pub fn memory_scale(&self) -> u8 {
        self.facts.mem_scale
    }

    /// Implicit stack pointer delta in bytes (`push rbp` is `-8`, `ret` is `8`).
    #[must_use]
    pub fn stack_growth(&self) -> i8 {
        self.facts.stack_growth
    }

    /// Prefix and encoding attributes.
    #[must_use]
    pub fn attributes(&self) -> Attributes {
        self.facts.attributes()
    }

    /// `LOCK` prefix present.
    #[must_use]
    pub fn has_lock_prefix(&self) -> bool {
        self.attributes().contains(Attributes::LOCK)
    }

    /// `REP`/`REPE` prefix present.
    #[must_use]
    pub fn has_rep_prefix(&self) -> bool {
        self.attributes().contains(Attributes::REP)
    }

    /// `REPNE` prefix present.
    #[must_use]
    pub fn has_repne_prefix(&self) -> bool {
        self.attributes().contains(Attributes::REPNE)
    }

    /// Explicit segment override prefix present.
    #[must_use]
    pub fn has_segment_override(&self) -> bool {
        self.attributes().contains(Attributes::SEGMENT_OVERRIDE)
    }

    /// EVEX embedded broadcast.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.attributes().contains(Attributes::BROADCAST)
    }

    /// Any `call`.
    #[must_use]
    pub fn is_call(&self) -> bool {
        self.mnemonic() == Mnemonic::Call
    }

    /// Any unconditional jump.
    #[must_use]
    pub fn is_jmp(&self) -> bool {
        matches!(self.mnemonic(), Mnemonic::Jmp | Mnemonic::Jmpe)
    }

    /// Conditional jumps, including the `loop` and `jcxz` families.
    #[must_use]
    pub fn is_conditional_branch(&self) -> bool {
        matches!(
            self.mnemonic(),
            Mnemonic::Jo
                | Mnemonic::Jno
                | Mnemonic::Jb
                | Mnemonic::Jae
                | Mnemonic::Je
                | Mnemonic::Jne
                | Mnemonic::Jbe
                | Mnemonic::Ja
                | Mnemonic::Js
                | Mnemonic::Jns
                | Mnemonic::Jp
                | Mnemonic::Jnp
                | Mnemonic::Jl
                | Mnemonic::Jge
                | Mnemonic::Jle
                | Mnemonic::Jg
                | Mnemonic::Jcxz
                | Mnemonic::Jecxz
                | Mnemonic::Jrcxz
                | Mnemonic::Loop
                | Mnemonic::Loope
                | Mnemonic::Loopne
        )
    }

    /// Returns from procedures, interrupts, system calls and SMM.
    #[must_use]
    pub fn is_return(&self) -> bool {
        matches!(
            self.mnemonic(),
            Mnemonic::Ret
                | Mnemonic::Retf
                | Mnemonic::Iret
                | Mnemonic::Iretd
                | Mnemonic::Iretq
                | Mnemonic::Sysret
                | Mnemonic::Sysretq
                | Mnemonic::Sysexit
                | Mnemonic::Sysexitq
                | Mnemonic::Uiret
                | Mnemonic::Eretu
                | Mnemonic::Erets
                | Mnemonic::Rsm
        )
    }

    fn targets_register_or_memory(&self) -> bool {
        matches!(
            self.op_kind(0),
            OperandKind::Register | OperandKind::Memory
        )
    }

    /// `call` through a register or memory operand.
    #[must_use]
    pub fn is_indirect_call(&self) -> bool {
        self.is_call() && self.targets_register_or_memory()
    }

    /// Jump through a register or memory operand.
    #[must_use]
    pub fn is_indirect_jmp(&self) -> bool {
        self.is_jmp() && self.targets_register_or_memory()
    }

    /// `nop` only; multi-byte `nop` forms included.
    #[must_use]
    pub fn is_nop(&self) -> bool {
        self.mnemonic() == Mnemonic::Nop
    }

    /// `int3` only.
    #[must_use]
    pub fn is_breakpoint(&self) -> bool {
        self.mnemonic() == Mnemonic::Int3
    }

    /// Software interrupts.
    #[must_use]
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self.mnemonic(),
            Mnemonic::Int | Mnemonic::Int1 | Mnemonic::Int3 | Mnemonic::Into
        )
    }

    /// `syscall` and `sysenter`.
    #[must_use]
    pub fn is_system_call(&self) -> bool {
        matches!(self.mnemonic(), Mnemonic::Syscall | Mnemonic::Sysenter)
    }

    /// Instructions that transfer control into a hypervisor or guest.
    #[must_use]
    pub fn is_vm_enter(&self) -> bool {
        matches!(
            self.mnemonic(),
            Mnemonic::Vmlaunch
                | Mnemonic::Vmresume
                | Mnemonic::Vmcall
                | Mnemonic::Vmmcall
                | Mnemonic::Vmrun
                | Mnemonic::Vmgexit
                | Mnemonic::Tdcall
                | Mnemonic::Seamcall
        )
    }

    /// TSX `xbegin`, `xabort` and `xend`.
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        matches!(
            self.mnemonic(),
            Mnemonic::Xbegin | Mnemonic::Xabort | Mnemonic::Xend
        )
    }

    /// `ud0`, `ud1` and `ud2`.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(
            self.mnemonic(),
            Mnemonic::Ud0 | Mnemonic::Ud1 | Mnemonic::Ud2
        )
    }

    /// Control-flow class of this instruction.
    ///
    /// Checked in order: conditional branch, jump, return, call, then system transfers
    /// (system calls and VM entries are calls, undefined and undecodable instructions are
    /// exceptions). Everything else falls through to [`FlowControl::Next`].
    #[must_use]
    pub fn flow_control(&self) -> FlowControl {
        if self.is_conditional_branch() {
            return FlowControl::ConditionalBranch;
        }
        if self.is_jmp() {
            return if self.targets_register_or_memory() {
                FlowControl::IndirectBranch
            } else {
                FlowControl::UnconditionalBranch
            };
        }
        if self.is_return() {
            return FlowControl::Return;
        }
        if self.is_call() {
            return if self.targets_register_or_memory() {
                FlowControl::IndirectCall
            } else {
                FlowControl::Call
            };
        }

        if self.is_system_call() || self.is_vm_enter() {
            FlowControl::Call
        } else if self.is_transactional() {
            FlowControl::XbeginXabortXend
        } else if self.is_interrupt() {
            FlowControl::Interrupt
        } else if self.is_undefined() || !self.is_valid() {
            FlowControl::Exception
        } else {
            FlowControl::Next
        }
    }

    fn relative_target(&self) -> u64 {
        self.next_ip().wrapping_add(self.displacement())
    }

    /// Statically known address of the memory operand, `0` if it depends on register state.
    ///
    /// RIP/EIP-relative operands resolve against this instruction's address; absolute operands
    /// (no base, no index) resolve to the displacement itself.
    #[must_use]
    pub fn memory_address(&self) -> u64 {
        match self.memory_base() {
            Register::RIP | Register::EIP => self.relative_target(),
            Register::None if self.memory_index() == Register::None => self.displacement(),
            _ => 0,
        }
    }

    /// Statically known target of a branch-like first operand, `0` if unresolvable.
    ///
    /// Far branches resolve through the same `ip + len + displacement` rule as near ones, so
    /// the result equals the encoded offset only when the instruction was decoded at ip `0`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use codecursor::Decoder;
    ///
    /// let code = [0xFF, 0x25, 0x10, 0x00, 0x00, 0x00]; // jmp [rip+0x10]
    /// let mut decoder = Decoder::new(&code, 0x1000);
    /// let jmp = decoder.decode()?;
    ///
    /// assert!(jmp.is_indirect_jmp());
    /// assert_eq!(jmp.branch_target(), 0x1016);
    /// # Ok::<(), codecursor::Error>(())
    /// ```
    #[must_use]
    pub fn branch_target(&self) -> u64 {
        match self.op_kind(0) {
            OperandKind::Immediate => match self.immediate2() {
                0 => self.immediate(),
                second => second,
            },
            OperandKind::Memory => self.memory_address(),
            OperandKind::NearBranch | OperandKind::FarBranch => self.relative_target(),
            OperandKind::Register | OperandKind::Invalid => 0,
        }
    }
}

fn register_from_code(code: u8) -> Register {
    Register::try_from(usize::from(code)).unwrap_or(Register::None)
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => f.write_str(text.as_str()),
            None => f.write_str(&format!("{:?}", self.mnemonic()).to_lowercase()),
        }
    }
}
