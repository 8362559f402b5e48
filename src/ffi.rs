//! C ABI surface of the raw-decode primitive.
//!
//! Native consumers link against three entry points that decode a single 64-bit instruction
//! into an [`FfiInstruction`] record:
//!
//! - [`disas`] - Facts only, `text` is null
//! - [`disas2`] - Facts plus a heap-allocated, NUL-terminated Intel-syntax string
//! - [`disas_free_text`] - The only legal way to release a string returned by [`disas2`]
//!
//! [`decode_abi`] closes the loop on the Rust side: it is a [`crate::raw::RawDecodeFn`] that
//! goes through [`disas2`] and wraps the returned string as foreign [`InstructionText`], so the
//! text is released through [`disas_free_text`] when the instruction is dropped.
//!
//! # Examples
//!
//! ```rust
//! use codecursor::{ffi::decode_abi, Decoder};
//!
//! let code = [0x55, 0xC3];
//! let mut decoder = Decoder::with_primitive(&code, 0, decode_abi);
//!
//! let push = decoder.decode()?;
//! assert_eq!(push.text(), Some("push rbp"));
//! # Ok::<(), codecursor::Error>(())
//! ```

use std::{
    ffi::{c_char, CString},
    mem::offset_of,
    ptr, slice,
};

use crate::raw::{
    decode_fast, decode_text, InstructionText, RawDecodeFn, RawInstructionFacts, RawOutput,
    MAX_INSTRUCTION_LEN, STATUS_REJECTED, STATUS_SUCCESS,
};

/// Bitness of every instruction decoded through the C ABI.
pub const FFI_BITNESS: u32 = 64;

/// Wire record exchanged over the C ABI.
///
/// The first 40 bytes are exactly [`RawInstructionFacts`]; the text pointer follows at offset
/// 40 and is null unless the record was produced by [`disas2`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiInstruction {
    /// Instruction facts
    pub facts: RawInstructionFacts,
    /// NUL-terminated text owned by the caller until passed to [`disas_free_text`]
    pub text: *mut c_char,
}

const _: () = assert!(offset_of!(FfiInstruction, facts) == 0, "invalid offset");
const _: () = assert!(offset_of!(FfiInstruction, text) == 40, "invalid offset");

impl Default for FfiInstruction {
    fn default() -> Self {
        FfiInstruction {
            facts: RawInstructionFacts::default(),
            text: ptr::null_mut(),
        }
    }
}

/// Validate the raw arguments and decode into a [`RawOutput`].
///
/// # Safety
///
/// `code` must be valid for reads of `len` bytes if non-null.
unsafe fn decode_raw(
    code: *const u8,
    len: usize,
    primitive: RawDecodeFn,
) -> Option<RawOutput> {
    if code.is_null() || len == 0 {
        return None;
    }

    let window = slice::from_raw_parts(code, len.min(MAX_INSTRUCTION_LEN));
    let mut output = RawOutput::default();
    if primitive(window, FFI_BITNESS, &mut output) < STATUS_SUCCESS {
        return None;
    }
    Some(output)
}

/// Decode one 64-bit instruction without text.
///
/// Returns `0` on success and `-1` for a null pointer or an empty buffer, in which case `out`
/// is not written. At most 15 bytes are read.
///
/// # Safety
///
/// `out` must be valid for writes of one [`FfiInstruction`] and `code` must be valid for reads
/// of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn disas(out: *mut FfiInstruction, code: *const u8, len: usize) -> i32 {
    if out.is_null() {
        return STATUS_REJECTED;
    }
    let Some(output) = decode_raw(code, len, decode_fast) else {
        return STATUS_REJECTED;
    };

    out.write(FfiInstruction {
        facts: output.facts,
        text: ptr::null_mut(),
    });
    STATUS_SUCCESS
}

/// Decode one 64-bit instruction and render its text.
///
/// Same contract as [`disas`]. On success `text` is either null (undecodable bytes) or a
/// string the caller owns and must release with [`disas_free_text`].
///
/// # Safety
///
/// Same requirements as [`disas`].
#[no_mangle]
pub unsafe extern "C" fn disas2(out: *mut FfiInstruction, code: *const u8, len: usize) -> i32 {
    if out.is_null() {
        return STATUS_REJECTED;
    }
    let Some(output) = decode_raw(code, len, decode_text) else {
        return STATUS_REJECTED;
    };

    let (facts, text) = output.into_parts();
    let text = text
        .and_then(|text| CString::new(text.as_str()).ok())
        .map_or(ptr::null_mut(), CString::into_raw);

    out.write(FfiInstruction { facts, text });
    STATUS_SUCCESS
}

/// Release a string returned by [`disas2`]. Null is ignored.
///
/// # Safety
///
/// `text` must be null or a pointer obtained from [`disas2`] that has not been released yet.
#[no_mangle]
pub unsafe extern "C" fn disas_free_text(text: *mut c_char) {
    if !text.is_null() {
        drop(CString::from_raw(text));
    }
}

/// Raw-decode primitive that decodes through the C ABI.
///
/// Only 64-bit decoding is available over the ABI; any other bitness is rejected.
pub fn decode_abi(code: &[u8], bitness: u32, out: &mut RawOutput) -> i32 {
    *out = RawOutput::default();
    if bitness != FFI_BITNESS {
        return STATUS_REJECTED;
    }

    let mut record = FfiInstruction::default();
    // SAFETY: `record` is a live local and `code` is a valid slice.
    let status = unsafe { disas2(&mut record, code.as_ptr(), code.len()) };
    if status < STATUS_SUCCESS {
        return status;
    }

    out.facts = record.facts;
    // SAFETY: the pointer was just produced by `disas2` and ownership moves to the text handle.
    out.text = unsafe { InstructionText::from_foreign(record.text, disas_free_text) };
    STATUS_SUCCESS
}
