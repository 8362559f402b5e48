//! Raw-decode primitives backed by `iced-x86`.
//!
//! Both variants decode exactly one instruction at address `0` and describe it with
//! [`RawInstructionFacts`]. Because the primitive never learns the real address, every
//! address-relative quantity is stored relative to the end of the instruction and the cursor
//! recomputes absolute targets from its own `ip`. The text variant additionally renders the
//! instruction with the Intel formatter; branch targets in that text are relative to `0`.

use std::cell::RefCell;

use iced_x86::{
    Decoder, DecoderOptions, Formatter, Instruction, IntelFormatter, OpKind, Register,
};

use crate::{
    disassembler::{OperandKind, OperandType},
    raw::{
        Attributes, InstructionText, RawInstructionFacts, RawOutput, STATUS_REJECTED,
        STATUS_SUCCESS,
    },
};

thread_local! {
    static FORMATTER: RefCell<(IntelFormatter, String)> =
        RefCell::new((IntelFormatter::new(), String::with_capacity(64)));
}

/// Decode one instruction without rendering text.
///
/// Returns [`STATUS_REJECTED`] for an empty window or a bitness other than 16, 32 or 64, in
/// which case `out` is reset to an invalid, zero-length instruction.
pub fn decode_fast(code: &[u8], bitness: u32, out: &mut RawOutput) -> i32 {
    *out = RawOutput::default();

    let Some(instr) = decode_one(code, bitness) else {
        return STATUS_REJECTED;
    };

    out.facts = collect_facts(&instr);
    STATUS_SUCCESS
}

/// Decode one instruction and render its Intel-syntax text.
///
/// Same contract as [`decode_fast`]; undecodable bytes produce no text.
pub fn decode_text(code: &[u8], bitness: u32, out: &mut RawOutput) -> i32 {
    *out = RawOutput::default();

    let Some(instr) = decode_one(code, bitness) else {
        return STATUS_REJECTED;
    };

    out.facts = collect_facts(&instr);
    if !instr.is_invalid() {
        out.text = Some(FORMATTER.with(|cell| {
            let (formatter, buffer) = &mut *cell.borrow_mut();
            buffer.clear();
            formatter.format(&instr, buffer);
            InstructionText::new(buffer.as_str())
        }));
    }

    STATUS_SUCCESS
}

fn decode_one(code: &[u8], bitness: u32) -> Option<Instruction> {
    if code.is_empty() || !matches!(bitness, 16 | 32 | 64) {
        return None;
    }

    let mut decoder = Decoder::with_ip(bitness, code, 0, DecoderOptions::NONE);
    Some(decoder.decode())
}

#[allow(clippy::cast_possible_truncation)]
fn collect_facts(instr: &Instruction) -> RawInstructionFacts {
    let length = instr.len() as u8;
    let operand_count = instr.op_count().min(4) as u8;

    let mut facts = RawInstructionFacts {
        mnemonic: instr.mnemonic() as u16,
        mem_base: instr.memory_base() as u8,
        mem_index: instr.memory_index() as u8,
        mem_scale: instr.memory_index_scale() as u8,
        stack_growth: saturate_i8(instr.stack_pointer_increment()),
        attributes: collect_attributes(instr).bits(),
        length,
        operand_count_visible: operand_count,
        ..Default::default()
    };

    let mut immediate = None;
    let mut immediate2 = None;
    let mut branch_disp = None;
    let mut has_memory = false;

    for index in 0..u32::from(operand_count) {
        let slot = index as usize;
        let kind = instr.op_kind(index);
        let operand_type = convert_operand_type(instr, index);

        facts.types[slot] = operand_type.code();
        if kind == OpKind::Register {
            facts.regs[slot] = instr.op_register(index) as u8;
        }

        match operand_type {
            OperandType::Immediate8_2nd => immediate2 = Some(instr.immediate(index)),
            OperandType::Immediate8
            | OperandType::Immediate16
            | OperandType::Immediate32
            | OperandType::Immediate64 => {
                immediate.get_or_insert(instr.immediate(index));
            }
            OperandType::NearBranch => branch_disp = Some(near_branch_displacement(instr, kind)),
            OperandType::FarBranch => {
                let offset = match kind {
                    OpKind::FarBranch16 => u64::from(instr.far_branch16()),
                    _ => u64::from(instr.far_branch32()),
                };
                immediate = Some(u64::from(instr.far_branch_selector()));
                branch_disp = Some(offset.wrapping_sub(u64::from(length)));
            }
            _ => {}
        }

        if operand_type == OperandKind::Memory {
            has_memory = true;
        }
    }

    facts.immediate = immediate.unwrap_or(0);
    facts.mem_disp = if let Some(disp) = branch_disp {
        disp
    } else if has_memory {
        memory_displacement(instr)
    } else {
        immediate2.unwrap_or(0)
    };

    facts
}

/// Displacement of the memory operand; IP-relative forms are rebased to the instruction end.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn memory_displacement(instr: &Instruction) -> u64 {
    let length = instr.len() as u32;

    match instr.memory_base() {
        Register::RIP => instr
            .memory_displacement64()
            .wrapping_sub(u64::from(length)),
        Register::EIP => instr.memory_displacement32().wrapping_sub(length) as i32 as i64 as u64,
        _ => instr.memory_displacement64(),
    }
}

/// Signed distance from the end of the instruction to the branch target.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn near_branch_displacement(instr: &Instruction, kind: OpKind) -> u64 {
    let target = instr.near_branch_target();
    let length = instr.len() as u64;

    match kind {
        OpKind::NearBranch16 => (target as u16).wrapping_sub(length as u16) as i16 as i64 as u64,
        OpKind::NearBranch32 => (target as u32).wrapping_sub(length as u32) as i32 as i64 as u64,
        _ => target.wrapping_sub(length),
    }
}

fn collect_attributes(instr: &Instruction) -> Attributes {
    let mut flags = Attributes::empty();
    if instr.has_rep_prefix() {
        flags |= Attributes::REP;
    }
    if instr.has_repne_prefix() {
        flags |= Attributes::REPNE;
    }
    if instr.has_lock_prefix() {
        flags |= Attributes::LOCK;
    }
    if instr.segment_prefix() != Register::None {
        flags |= Attributes::SEGMENT_OVERRIDE;
    }
    if instr.is_broadcast() {
        flags |= Attributes::BROADCAST;
    }
    flags
}

#[allow(clippy::cast_possible_truncation)]
fn saturate_i8(value: i32) -> i8 {
    value.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

fn convert_operand_type(instr: &Instruction, index: u32) -> OperandType {
    match instr.op_kind(index) {
        OpKind::Register => match instr.op_register(index).size() {
            1 => OperandType::Register8,
            2 => OperandType::Register16,
            4 => OperandType::Register32,
            16 => OperandType::Register128,
            32 => OperandType::Register256,
            64 => OperandType::Register512,
            _ => OperandType::Register64,
        },
        OpKind::Memory => match instr.memory_size().size() {
            1 => OperandType::Memory8,
            2 => OperandType::Memory16,
            4 => OperandType::Memory32,
            16 => OperandType::Memory128,
            32 => OperandType::Memory256,
            64 => OperandType::Memory512,
            _ => OperandType::Memory64,
        },
        OpKind::MemorySegSI | OpKind::MemorySegDI => OperandType::Memory8,
        OpKind::MemoryESDI => OperandType::Memory16,
        OpKind::MemoryESEDI | OpKind::MemorySegESI | OpKind::MemorySegEDI => OperandType::Memory32,
        OpKind::MemoryESRDI | OpKind::MemorySegRSI | OpKind::MemorySegRDI => OperandType::Memory64,
        OpKind::Immediate8
        | OpKind::Immediate8to16
        | OpKind::Immediate8to32
        | OpKind::Immediate8to64 => OperandType::Immediate8,
        OpKind::Immediate8_2nd => OperandType::Immediate8_2nd,
        OpKind::Immediate16 => OperandType::Immediate16,
        OpKind::Immediate32 | OpKind::Immediate32to64 => OperandType::Immediate32,
        OpKind::Immediate64 => OperandType::Immediate64,
        OpKind::NearBranch16 | OpKind::NearBranch32 | OpKind::NearBranch64 => {
            OperandType::NearBranch
        }
        OpKind::FarBranch16 | OpKind::FarBranch32 => OperandType::FarBranch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{MAX_INSTRUCTION_LEN, MNEMONIC_INVALID};
    use iced_x86::Mnemonic;

    fn fast(code: &[u8]) -> RawInstructionFacts {
        let mut out = RawOutput::default();
        assert_eq!(decode_fast(code, 64, &mut out), STATUS_SUCCESS);
        assert!(out.text.is_none());
        out.facts
    }

    #[test]
    fn rejects_empty_window_and_bad_bitness() {
        let mut out = RawOutput::default();
        assert_eq!(decode_fast(&[], 64, &mut out), STATUS_REJECTED);
        assert_eq!(out.facts, RawInstructionFacts::default());
        assert_eq!(decode_text(&[0x90], 8, &mut out), STATUS_REJECTED);
        assert!(out.text.is_none());
    }

    #[test]
    fn register_operands() {
        // mov rbp, rsp
        let facts = fast(&[0x48, 0x89, 0xE5]);
        assert_eq!(facts.mnemonic, Mnemonic::Mov as u16);
        assert_eq!(facts.length, 3);
        assert_eq!(facts.operand_count_visible, 2);
        assert_eq!(facts.types[0], OperandType::Register64.code());
        assert_eq!(facts.types[1], OperandType::Register64.code());
        assert_eq!(facts.regs[0], Register::RBP as u8);
        assert_eq!(facts.regs[1], Register::RSP as u8);
        assert_eq!(facts.types[2], OperandType::Invalid.code());
    }

    #[test]
    fn sign_extended_immediate() {
        // sub rsp, 0x10
        let facts = fast(&[0x48, 0x83, 0xEC, 0x10]);
        assert_eq!(facts.mnemonic, Mnemonic::Sub as u16);
        assert_eq!(facts.types[1], OperandType::Immediate8.code());
        assert_eq!(facts.immediate, 0x10);

        // add rax, -1
        let facts = fast(&[0x48, 0x83, 0xC0, 0xFF]);
        assert_eq!(facts.immediate, u64::MAX);
    }

    #[test]
    fn rip_relative_displacement_is_rebased() {
        // lea rax, [rip+0x100]
        let facts = fast(&[0x48, 0x8D, 0x05, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(facts.mem_base, Register::RIP as u8);
        assert_eq!(facts.mem_disp, 0x100);

        // lea rax, [rip-0x10]
        let facts = fast(&[0x48, 0x8D, 0x05, 0xF0, 0xFF, 0xFF, 0xFF]);
        assert_eq!(facts.mem_disp as i64, -0x10);
    }

    #[test]
    fn near_branch_displacement_is_relative() {
        // call +0x20
        let facts = fast(&[0xE8, 0x20, 0x00, 0x00, 0x00]);
        assert_eq!(facts.mnemonic, Mnemonic::Call as u16);
        assert_eq!(facts.types[0], OperandType::NearBranch.code());
        assert_eq!(facts.mem_disp, 0x20);

        // jmp short -2 (self loop)
        let facts = fast(&[0xEB, 0xFE]);
        assert_eq!(facts.mem_disp as i64, -2);
    }

    #[test]
    fn near_branch_in_32bit_mode() {
        let mut out = RawOutput::default();
        // jmp short -2
        assert_eq!(decode_fast(&[0xEB, 0xFE], 32, &mut out), STATUS_SUCCESS);
        assert_eq!(out.facts.mem_disp as i64, -2);
    }

    #[test]
    fn second_immediate() {
        // enter 0x20, 1
        let facts = fast(&[0xC8, 0x20, 0x00, 0x01]);
        assert_eq!(facts.mnemonic, Mnemonic::Enter as u16);
        assert_eq!(facts.types[0], OperandType::Immediate16.code());
        assert_eq!(facts.types[1], OperandType::Immediate8_2nd.code());
        assert_eq!(facts.immediate, 0x20);
        assert_eq!(facts.immediate2(), 1);
    }

    #[test]
    fn prefixes() {
        // lock add [rax], ecx
        assert_eq!(fast(&[0xF0, 0x01, 0x08]).attributes(), Attributes::LOCK);
        // rep movsb
        assert!(fast(&[0xF3, 0xA4]).attributes().contains(Attributes::REP));
        // mov rax, fs:[0x28]
        let facts = fast(&[0x64, 0x48, 0x8B, 0x04, 0x25, 0x28, 0x00, 0x00, 0x00]);
        assert!(facts.attributes().contains(Attributes::SEGMENT_OVERRIDE));
        assert_eq!(facts.mem_disp, 0x28);
    }

    #[test]
    fn string_and_far_operand_kinds() {
        // movsb
        let facts = fast(&[0xA4]);
        assert_eq!(facts.types[0], OperandType::Memory64.code());
        assert_eq!(facts.types[1], OperandType::Memory64.code());

        // jmp 0x1234:0x12345678
        let mut out = RawOutput::default();
        decode_fast(&[0xEA, 0x78, 0x56, 0x34, 0x12, 0x34, 0x12], 32, &mut out);
        assert_eq!(out.facts.types[0], OperandType::FarBranch.code());
    }

    #[test]
    fn stack_growth() {
        assert_eq!(fast(&[0x55]).stack_growth, -8);
        assert_eq!(fast(&[0xC3]).stack_growth, 8);
        assert_eq!(fast(&[0x90]).stack_growth, 0);
    }

    #[test]
    fn invalid_bytes() {
        // push es does not exist in 64-bit mode
        let facts = fast(&[0x06]);
        assert_eq!(facts.mnemonic, MNEMONIC_INVALID);
        assert!(!facts.is_success());
        assert!(usize::from(facts.length) <= MAX_INSTRUCTION_LEN);
    }

    #[test]
    fn text_variant_renders() {
        let mut out = RawOutput::default();
        assert_eq!(decode_text(&[0x55], 64, &mut out), STATUS_SUCCESS);
        assert_eq!(out.text.as_ref().map(InstructionText::as_str), Some("push rbp"));

        assert_eq!(decode_text(&[0x06], 64, &mut out), STATUS_SUCCESS);
        assert!(out.text.is_none());
    }
}
