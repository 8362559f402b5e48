//! Cursor-based x86 instruction decoding.
//!
//! This module provides the [`Decoder`] cursor, which walks a borrowed byte buffer one
//! instruction at a time, and [`decode_stream`], a convenience walk over a whole buffer. The
//! cursor never inspects instruction bytes itself: each step hands a window of at most
//! [`MAX_INSTRUCTION_LEN`] bytes to a raw-decode primitive (see [`crate::raw`]) and wraps the
//! resulting facts as an [`Instruction`] located at the cursor address.
//!
//! # Cursor Model
//!
//! A cursor covers the address window `base_address..base_address + data.len()`. It is either
//! *Ready* (`can_decode()`), or *Exhausted* once every byte has been consumed. Every decode step
//! advances by at least one byte and never past the end of the buffer, so walking a buffer
//! always terminates, even over garbage or with a primitive that reports zero-length results.
//!
//! # Example: Decoding a Single Instruction
//!
//! ```rust
//! use codecursor::Decoder;
//!
//! let code = [0xC3]; // ret
//! let mut decoder = Decoder::new(&code, 0x1000);
//! let instr = decoder.decode()?;
//! assert!(instr.is_return());
//! assert!(!decoder.can_decode());
//! # Ok::<(), codecursor::Error>(())
//! ```
//!
//! # Example: Decoding a Stream of Instructions
//!
//! ```rust
//! use codecursor::disassembler::{decode_stream, DecodeMode, DecoderConfig};
//!
//! let code = [0x90, 0xC3]; // nop, ret
//! let config = DecoderConfig::default().with_mode(DecodeMode::Text);
//! let instrs = decode_stream(&code, 0x1000, config)?;
//! assert_eq!(instrs.len(), 2);
//! assert_eq!(instrs[1].to_string(), "ret");
//! # Ok::<(), codecursor::Error>(())
//! ```

use std::fmt;

use strum::{AsRefStr, Display, EnumCount, EnumIter};

use crate::{
    disassembler::Instruction,
    raw::{decode_fast, decode_text, RawDecodeFn, RawOutput, MAX_INSTRUCTION_LEN},
    Error, Result,
};

/// Selects the raw-decode primitive a [`Decoder`] calls.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, EnumCount, Display, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum DecodeMode {
    /// Facts only, no rendered text
    #[default]
    Fast,
    /// Facts plus Intel-syntax text
    Text,
    /// A caller-supplied primitive installed with [`Decoder::with_primitive`]
    Custom,
}

impl DecodeMode {
    fn primitive(self, custom: Option<RawDecodeFn>) -> RawDecodeFn {
        match self {
            DecodeMode::Fast => decode_fast,
            DecodeMode::Text => decode_text,
            DecodeMode::Custom => custom.unwrap_or(decode_fast),
        }
    }
}

/// Construction-time settings of a [`Decoder`].
///
/// # Examples
///
/// ```rust
/// use codecursor::disassembler::{DecodeMode, DecoderConfig};
///
/// let config = DecoderConfig::default()
///     .with_bitness(32)
///     .with_mode(DecodeMode::Text);
///
/// assert_eq!(config.bitness, 32);
/// assert!(config.validate().is_ok());
/// assert!(config.with_bitness(8).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Decoding bitness: 16, 32 or 64
    pub bitness: u32,
    /// Which primitive to call
    pub mode: DecodeMode,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            bitness: 64,
            mode: DecodeMode::Fast,
        }
    }
}

impl DecoderConfig {
    /// Set the decoding bitness.
    #[must_use]
    pub fn with_bitness(mut self, bitness: u32) -> Self {
        self.bitness = bitness;
        self
    }

    /// Set the decode mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check that the configuration can be used to decode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBitness`] for a bitness other than 16, 32 or 64.
    pub fn validate(&self) -> Result<()> {
        validate_bitness(self.bitness)
    }
}

fn validate_bitness(bitness: u32) -> Result<()> {
    if matches!(bitness, 16 | 32 | 64) {
        Ok(())
    } else {
        Err(Error::UnsupportedBitness(bitness))
    }
}

/// A decoding cursor over a borrowed code buffer.
///
/// The cursor tracks the address of the next instruction (`ip`) and the matching offset into
/// the buffer; `offset == ip - base_address` holds at all times. The instruction returned by
/// [`Decoder::decode`] borrows the cursor and stays available through [`Decoder::current`]
/// until the next decode step.
///
/// # Examples
///
/// ```rust
/// use codecursor::Decoder;
///
/// let code = [0x55, 0x48, 0x89, 0xE5, 0x5D, 0xC3]; // push rbp; mov rbp, rsp; pop rbp; ret
/// let mut decoder = Decoder::new(&code, 0x401000);
///
/// while decoder.can_decode() {
///     let instr = decoder.decode()?;
///     println!("0x{:x}: {}", instr.ip(), instr);
/// }
///
/// assert_eq!(decoder.ip(), 0x401006);
/// assert_eq!(decoder.last_successful_ip(), 0x401005);
/// # Ok::<(), codecursor::Error>(())
/// ```
///
/// # Thread Safety
///
/// [`Decoder`] is [`std::marker::Send`] but requires `&mut self` to decode. Independent cursors
/// over the same read-only buffer can run on different threads.
#[derive(Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    base_address: u64,
    ip: u64,
    offset: usize,

    bitness: u32,
    mode: DecodeMode,
    custom: Option<RawDecodeFn>,

    current: Option<Instruction>,
    last_successful_ip: u64,
    last_successful_length: usize,
}

impl<'a> Decoder<'a> {
    /// Create a 64-bit, fast-mode cursor at `base_address`.
    #[must_use]
    pub fn new(data: &'a [u8], base_address: u64) -> Self {
        Decoder {
            data,
            base_address,
            ip: base_address,
            offset: 0,
            bitness: 64,
            mode: DecodeMode::Fast,
            custom: None,
            current: None,
            last_successful_ip: 0,
            last_successful_length: 0,
        }
    }

    /// Create a cursor from a [`DecoderConfig`].
    ///
    /// [`DecodeMode::Custom`] without an installed primitive decodes like [`DecodeMode::Fast`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBitness`] if the configuration is invalid.
    pub fn with_config(data: &'a [u8], base_address: u64, config: DecoderConfig) -> Result<Self> {
        config.validate()?;

        let mut decoder = Decoder::new(data, base_address);
        decoder.bitness = config.bitness;
        decoder.mode = config.mode;
        Ok(decoder)
    }

    /// Create a 64-bit cursor that calls a caller-supplied raw-decode primitive.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use codecursor::{raw::{decode_fast, RawOutput}, disassembler::DecodeMode, Decoder};
    ///
    /// fn counting(code: &[u8], bitness: u32, out: &mut RawOutput) -> i32 {
    ///     decode_fast(code, bitness, out)
    /// }
    ///
    /// let code = [0x90];
    /// let mut decoder = Decoder::with_primitive(&code, 0, counting);
    /// assert_eq!(decoder.mode(), DecodeMode::Custom);
    /// assert!(decoder.decode()?.is_nop());
    /// # Ok::<(), codecursor::Error>(())
    /// ```
    #[must_use]
    pub fn with_primitive(data: &'a [u8], base_address: u64, primitive: RawDecodeFn) -> Self {
        let mut decoder = Decoder::new(data, base_address);
        decoder.custom = Some(primitive);
        decoder.mode = DecodeMode::Custom;
        decoder
    }

    /// Address of the next instruction to decode.
    #[must_use]
    pub fn ip(&self) -> u64 {
        self.ip
    }

    /// Offset of the next instruction into the buffer.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Address of the first byte of the buffer.
    #[must_use]
    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    /// Total size of the buffer in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` for an empty buffer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// `true` while at least one byte is left to decode.
    #[must_use]
    pub fn can_decode(&self) -> bool {
        self.offset < self.data.len()
    }

    /// Decoding bitness.
    #[must_use]
    pub fn bitness(&self) -> u32 {
        self.bitness
    }

    /// Active decode mode.
    #[must_use]
    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Address of the most recently decoded instruction.
    #[must_use]
    pub fn last_successful_ip(&self) -> u64 {
        self.last_successful_ip
    }

    /// Number of bytes the most recent decode step advanced by.
    #[must_use]
    pub fn last_successful_length(&self) -> usize {
        self.last_successful_length
    }

    /// The instruction produced by the most recent [`Decoder::decode`], if any.
    #[must_use]
    pub fn current(&self) -> Option<&Instruction> {
        self.current.as_ref()
    }

    /// Switch between primitives, keeping the cursor position.
    pub fn set_mode(&mut self, mode: DecodeMode) {
        self.mode = mode;
    }

    /// Change the decoding bitness, keeping the cursor position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBitness`] for a bitness other than 16, 32 or 64; the cursor
    /// is left untouched.
    pub fn set_bitness(&mut self, bitness: u32) -> Result<()> {
        validate_bitness(bitness)?;
        self.bitness = bitness;
        Ok(())
    }

    /// Reposition the cursor to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] unless `base_address <= address < base_address + len()`;
    /// the cursor is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use codecursor::Decoder;
    ///
    /// let code = [0x90, 0x90, 0xC3];
    /// let mut decoder = Decoder::new(&code, 0x1000);
    ///
    /// decoder.set_ip(0x1002)?;
    /// assert_eq!(decoder.offset(), 2);
    /// assert!(decoder.decode()?.is_return());
    ///
    /// assert!(decoder.set_ip(0x1003).is_err());
    /// # Ok::<(), codecursor::Error>(())
    /// ```
    pub fn set_ip(&mut self, address: u64) -> Result<()> {
        let offset = address
            .checked_sub(self.base_address)
            .and_then(|delta| usize::try_from(delta).ok())
            .filter(|offset| *offset < self.data.len())
            .ok_or(Error::OutOfBounds {
                address,
                base: self.base_address,
                size: self.data.len(),
            })?;

        log::trace!("repositioning decoder from 0x{:x} to 0x{address:x}", self.ip);
        self.ip = address;
        self.offset = offset;
        Ok(())
    }

    /// Point the cursor at a new buffer and rewind it to `base_address`.
    ///
    /// Mode, bitness and any installed primitive are kept; the current instruction and the
    /// last-successful bookkeeping are cleared.
    pub fn reconfigure(&mut self, data: &'a [u8], base_address: u64) {
        log::trace!(
            "reconfiguring decoder for {} bytes at 0x{base_address:x}",
            data.len()
        );
        self.data = data;
        self.base_address = base_address;
        self.reset();
    }

    /// Rewind the cursor to the start of its buffer.
    pub fn reset(&mut self) {
        self.ip = self.base_address;
        self.offset = 0;
        self.current = None;
        self.last_successful_ip = 0;
        self.last_successful_length = 0;
    }

    /// Decode the instruction at the cursor and advance past it.
    ///
    /// The advance is the reported length clamped to `1..=remaining()`, so undecodable bytes
    /// and zero-length results still make progress.
    ///
    /// # Errors
    ///
    /// - [`Error::Exhausted`] if no bytes are left; nothing is modified
    /// - [`Error::Malformed`] if the primitive reports a length beyond the window it was given
    pub fn decode(&mut self) -> Result<&Instruction> {
        let instruction = self.step()?;
        Ok(&*self.current.insert(instruction))
    }

    /// Decode the instruction at the cursor without advancing or touching any state.
    ///
    /// # Errors
    ///
    /// Same as [`Decoder::decode`].
    pub fn peek(&self) -> Result<Instruction> {
        self.decode_at_cursor().map(|(instruction, _)| instruction)
    }

    fn step(&mut self) -> Result<Instruction> {
        let (instruction, advance) = self.decode_at_cursor()?;

        self.last_successful_ip = self.ip;
        self.last_successful_length = advance;
        self.offset += advance;
        self.ip = self.ip.wrapping_add(advance as u64);

        Ok(instruction)
    }

    fn decode_at_cursor(&self) -> Result<(Instruction, usize)> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Err(Error::Exhausted);
        }

        let window = &self.data[self.offset..self.offset + remaining.min(MAX_INSTRUCTION_LEN)];
        let primitive = self.mode.primitive(self.custom);

        let mut output = RawOutput::default();
        let status = primitive(window, self.bitness, &mut output);

        let length = usize::from(output.facts.length);
        if length > window.len() {
            return Err(malformed_error!(
                "Primitive reported {} bytes at 0x{:x} for a window of {} bytes",
                length,
                self.ip,
                window.len()
            ));
        }

        if length == 0 {
            log::warn!(
                "Zero-length decode at 0x{:x} (status {status}), advancing by one byte",
                self.ip
            );
        } else if !output.facts.is_success() {
            log::debug!("Undecodable bytes at 0x{:x}", self.ip);
        }

        let advance = length.clamp(1, remaining);
        Ok((Instruction::from_raw(self.ip, output), advance))
    }
}

impl fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("base_address", &self.base_address)
            .field("size", &self.data.len())
            .field("ip", &self.ip)
            .field("offset", &self.offset)
            .field("bitness", &self.bitness)
            .field("mode", &self.mode)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Iterator for Decoder<'_> {
    type Item = Instruction;

    /// Decode the next instruction and hand over ownership of it.
    ///
    /// The cursor keeps no current instruction for iterator steps. Iteration stops when the
    /// buffer is exhausted or the primitive breaks its contract.
    fn next(&mut self) -> Option<Self::Item> {
        self.current = None;
        self.step().ok()
    }
}

/// Decode every instruction in `data`, starting at `base_address`.
///
/// # Arguments
///
/// * `data` - The code buffer
/// * `base_address` - Address of the first byte of `data`
/// * `config` - Bitness and mode of the walk
///
/// # Errors
///
/// Returns [`Error::UnsupportedBitness`] for an invalid configuration and [`Error::Malformed`]
/// if the primitive breaks its contract. Undecodable bytes produce invalid instructions and
/// the walk continues.
pub fn decode_stream(
    data: &[u8],
    base_address: u64,
    config: DecoderConfig,
) -> Result<Vec<Instruction>> {
    let mut decoder = Decoder::with_config(data, base_address, config)?;
    let mut instructions = Vec::new();

    while decoder.can_decode() {
        instructions.push(decoder.step()?);
    }

    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disassembler::FlowControl,
        raw::{RawInstructionFacts, STATUS_SUCCESS},
    };
    use iced_x86::Mnemonic;

    fn zero_length(_code: &[u8], _bitness: u32, out: &mut RawOutput) -> i32 {
        *out = RawOutput::default();
        STATUS_SUCCESS
    }

    fn overlong(code: &[u8], _bitness: u32, out: &mut RawOutput) -> i32 {
        *out = RawOutput {
            facts: RawInstructionFacts {
                mnemonic: Mnemonic::Nop as u16,
                length: (code.len() + 1) as u8,
                ..Default::default()
            },
            text: None,
        };
        STATUS_SUCCESS
    }

    #[test]
    fn decode_advances_cursor() {
        let code = [0x55, 0x48, 0x89, 0xE5];
        let mut decoder = Decoder::new(&code, 0x1000);

        let push = decoder.decode().unwrap();
        assert_eq!(push.mnemonic(), Mnemonic::Push);
        assert_eq!(push.ip(), 0x1000);

        assert_eq!(decoder.ip(), 0x1001);
        assert_eq!(decoder.offset(), 1);
        assert_eq!(decoder.last_successful_ip(), 0x1000);
        assert_eq!(decoder.last_successful_length(), 1);
        assert_eq!(decoder.current().map(Instruction::mnemonic), Some(Mnemonic::Push));

        let mov = decoder.decode().unwrap();
        assert_eq!(mov.mnemonic(), Mnemonic::Mov);
        assert_eq!(mov.len(), 3);
        assert!(!decoder.can_decode());
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn exhausted_decode_fails_without_mutation() {
        let code = [0xC3];
        let mut decoder = Decoder::new(&code, 0x1000);
        decoder.decode().unwrap();

        assert!(matches!(decoder.decode(), Err(Error::Exhausted)));
        assert!(matches!(decoder.peek(), Err(Error::Exhausted)));
        assert_eq!(decoder.ip(), 0x1001);
        assert_eq!(decoder.last_successful_ip(), 0x1000);
        assert!(decoder.current().is_some_and(Instruction::is_return));

        let mut empty = Decoder::new(&[], 0);
        assert!(empty.is_empty());
        assert!(!empty.can_decode());
        assert!(matches!(empty.decode(), Err(Error::Exhausted)));
    }

    #[test]
    fn peek_does_not_mutate() {
        let code = [0x90, 0xC3];
        let mut decoder = Decoder::new(&code, 0x1000);

        let peeked = decoder.peek().unwrap();
        assert!(peeked.is_nop());
        assert_eq!(decoder.ip(), 0x1000);
        assert!(decoder.current().is_none());

        let decoded = decoder.decode().unwrap();
        assert_eq!(*decoded, peeked);
    }

    #[test]
    fn set_ip_window() {
        let code = [0x90; 4];
        let mut decoder = Decoder::new(&code, 0x1000);

        decoder.set_ip(0x1003).unwrap();
        assert_eq!(decoder.offset(), 3);
        assert_eq!(decoder.ip(), 0x1003);

        for address in [0x0FFF, 0x1004, 0, u64::MAX] {
            match decoder.set_ip(address) {
                Err(Error::OutOfBounds {
                    address: rejected,
                    base,
                    size,
                }) => {
                    assert_eq!(rejected, address);
                    assert_eq!(base, 0x1000);
                    assert_eq!(size, 4);
                }
                other => panic!("Expected Error::OutOfBounds, got {other:?}"),
            }
            assert_eq!(decoder.ip(), 0x1003);
            assert_eq!(decoder.offset(), 3);
        }

        decoder.decode().unwrap();
        assert!(!decoder.can_decode());
        decoder.set_ip(0x1000).unwrap();
        assert_eq!(decoder.offset(), 0);
        assert_eq!(decoder.ip(), 0x1000);
        assert_eq!(decoder.remaining(), 4);
    }

    #[test]
    fn truncated_instruction_is_bounded() {
        // mov rax, imm64 cut short
        let code = [0x48, 0xB8, 0x01, 0x02];
        let mut decoder = Decoder::new(&code, 0);

        let instr = decoder.decode().unwrap();
        assert!(!instr.is_valid());
        assert!(decoder.offset() <= code.len());
        assert!(decoder.last_successful_length() >= 1);
    }

    #[test]
    fn invalid_bytes_still_progress() {
        let code = [0x06, 0x06, 0x90];
        let instrs: Vec<_> = Decoder::new(&code, 0).collect();

        assert_eq!(instrs.len(), 3);
        assert!(!instrs[0].is_valid());
        assert_eq!(instrs[0].flow_control(), FlowControl::Exception);
        assert!(instrs[2].is_nop());
    }

    #[test]
    fn zero_length_primitive_terminates() {
        let code = [0x90; 5];
        let mut decoder = Decoder::with_primitive(&code, 0x10, zero_length);

        let mut steps = 0;
        while decoder.can_decode() {
            let instr = decoder.decode().unwrap();
            assert!(instr.is_empty());
            assert_eq!(decoder.last_successful_length(), 1);
            steps += 1;
        }

        assert_eq!(steps, 5);
        assert_eq!(decoder.ip(), 0x15);
    }

    #[test]
    fn overlong_primitive_is_malformed() {
        let code = [0x90; 3];
        let mut decoder = Decoder::with_primitive(&code, 0, overlong);

        assert!(matches!(decoder.decode(), Err(Error::Malformed { .. })));
        assert_eq!(decoder.ip(), 0);
        assert!(decoder.current().is_none());
    }

    #[test]
    fn mode_toggle_keeps_position() {
        let code = [0x90, 0x55, 0xC3];
        let mut decoder = Decoder::new(&code, 0);

        assert_eq!(decoder.decode().unwrap().text(), None);
        decoder.set_mode(DecodeMode::Text);
        assert_eq!(decoder.ip(), 1);
        assert_eq!(decoder.decode().unwrap().text(), Some("push rbp"));

        decoder.set_mode(DecodeMode::Fast);
        assert_eq!(decoder.decode().unwrap().text(), None);
    }

    #[test]
    fn custom_mode_without_primitive_is_fast() {
        let code = [0x55];
        let config = DecoderConfig::default().with_mode(DecodeMode::Custom);
        let mut decoder = Decoder::with_config(&code, 0, config).unwrap();

        let push = decoder.decode().unwrap();
        assert_eq!(push.mnemonic(), Mnemonic::Push);
        assert_eq!(push.text(), None);
    }

    #[test]
    fn reconfigure_and_reset() {
        let first = [0x90, 0x90];
        let second = [0xC3];
        let mut decoder = Decoder::new(&first, 0x1000);
        decoder.set_mode(DecodeMode::Text);
        decoder.decode().unwrap();

        decoder.reconfigure(&second, 0x2000);
        assert_eq!(decoder.ip(), 0x2000);
        assert_eq!(decoder.offset(), 0);
        assert_eq!(decoder.len(), 1);
        assert_eq!(decoder.last_successful_ip(), 0);
        assert_eq!(decoder.last_successful_length(), 0);
        assert!(decoder.current().is_none());
        assert_eq!(decoder.mode(), DecodeMode::Text);
        assert_eq!(decoder.decode().unwrap().to_string(), "ret");

        decoder.reset();
        assert!(decoder.can_decode());
        assert_eq!(decoder.ip(), 0x2000);
    }

    #[test]
    fn bitness() {
        // inc eax in 32-bit mode, REX prefix in 64-bit mode
        let code = [0x40, 0x90];

        let mut legacy = Decoder::with_config(&code, 0, DecoderConfig::default().with_bitness(32))
            .unwrap();
        assert_eq!(legacy.decode().unwrap().mnemonic(), Mnemonic::Inc);

        let mut long = Decoder::new(&code, 0);
        let nop = long.decode().unwrap();
        assert!(nop.is_nop());
        assert_eq!(nop.len(), 2);

        assert!(matches!(
            long.set_bitness(8),
            Err(Error::UnsupportedBitness(8))
        ));
        assert_eq!(long.bitness(), 64);
        assert!(matches!(
            Decoder::with_config(&code, 0, DecoderConfig::default().with_bitness(128)),
            Err(Error::UnsupportedBitness(128))
        ));
    }

    #[test]
    fn iterator_hands_over_ownership() {
        let code = [0x90, 0xC3];
        let mut decoder = Decoder::new(&code, 0x1000);
        decoder.decode().unwrap();

        let rest: Vec<_> = decoder.by_ref().collect();
        assert_eq!(rest.len(), 1);
        assert!(rest[0].is_return());
        assert!(decoder.current().is_none());
        assert_eq!(decoder.last_successful_ip(), 0x1001);
    }

    #[test]
    fn decode_stream_walks_everything() {
        let code = [0x90, 0x06, 0xC3];
        let instrs = decode_stream(&code, 0x1000, DecoderConfig::default()).unwrap();

        let ips: Vec<_> = instrs.iter().map(Instruction::ip).collect();
        assert_eq!(ips, vec![0x1000, 0x1001, 0x1002]);

        assert!(decode_stream(&[], 0, DecoderConfig::default())
            .unwrap()
            .is_empty());
        assert!(decode_stream(&code, 0, DecoderConfig::default().with_bitness(0)).is_err());
    }

    #[test]
    fn mode_names() {
        assert_eq!(DecodeMode::Fast.to_string(), "fast");
        assert_eq!(DecodeMode::Custom.as_ref(), "custom");
        assert_eq!(DecodeMode::default(), DecodeMode::Fast);
    }
}
