// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'raw/text.rs' releases foreign-allocated text through its paired free function
// - 'ffi.rs' exposes the C ABI entry points over raw pointers

//! # codecursor
//!
//! A cursor-based decoder and classifier for x86/x86-64 machine code. `codecursor` walks a
//! borrowed byte buffer one instruction at a time and produces structured instruction records
//! (mnemonic, operands, length, control-flow class, resolved branch and memory targets) for
//! disassemblers, emulators and static analyzers that process code linearly.
//!
//! ## Features
//!
//! - **Zero-copy cursor** - Borrows the code buffer, never copies it
//! - **Always makes progress** - Undecodable bytes become invalid instructions, never errors
//! - **Target resolution** - RIP/EIP-relative, absolute and branch targets from the cursor address
//! - **Pluggable primitive** - Fast, text-annotated or caller-supplied raw decoding
//! - **C ABI** - `disas`/`disas2`/`disas_free_text` with a fixed wire layout
//!
//! ## Quick Start
//!
//! ```rust
//! use codecursor::prelude::*;
//!
//! // push rbp; mov rbp, rsp; pop rbp; ret
//! let code = [0x55, 0x48, 0x89, 0xE5, 0x5D, 0xC3];
//! let mut decoder = Decoder::new(&code, 0x140001000);
//!
//! while decoder.can_decode() {
//!     let instr = decoder.decode()?;
//!     if instr.flow_control() == FlowControl::Return {
//!         println!("function ends at 0x{:x}", instr.next_ip());
//!     }
//! }
//! # Ok::<(), codecursor::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`disassembler`] - The [`Decoder`] cursor, [`Instruction`] classification and the operand model
//! - [`raw`] - The raw-decode primitive contract and the shipped `iced-x86` primitives
//! - [`ffi`] - C ABI entry points over the raw-decode primitive
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! The crate reports through the [`log`](https://docs.rs/log) facade and never installs a
//! logger. Zero-length decode results are logged at `warn`, undecodable bytes at `debug` and
//! cursor repositioning at `trace`.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use codecursor::prelude::*;
///
/// let code = [0x90];
/// let instrs = decode_stream(&code, 0, DecoderConfig::default())?;
/// assert!(instrs[0].is_nop());
/// # Ok::<(), codecursor::Error>(())
/// ```
pub mod prelude;

/// x86 instruction decoding and classification.
///
/// # Key Types
///
/// - [`disassembler::Decoder`] - Cursor over a code buffer
/// - [`disassembler::Instruction`] - One decoded instruction
/// - [`disassembler::FlowControl`] - How an instruction affects control flow
/// - [`disassembler::Operand`] - Tagged operand view
///
/// # Main Functions
///
/// - [`disassembler::decode_stream`] - Decode a whole buffer
/// - [`disassembler::simplify`] / [`disassembler::size_bytes`] - Operand-kind lookups
pub mod disassembler;

/// Raw-decode primitive contract and the default `iced-x86` primitives.
pub mod raw;

/// C ABI surface.
pub mod ffi;

/// `codecursor` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `codecursor` Error type
///
/// The error type for all fallible operations in this crate: cursor positioning, decoder
/// configuration and raw-decode primitives that break their contract.
pub use error::Error;

/// Main entry points: the decoding cursor and the instruction it produces.
///
/// # Example
///
/// ```rust
/// use codecursor::{Decoder, FlowControl};
///
/// let code = [0x74, 0x05]; // je +5
/// let mut decoder = Decoder::new(&code, 0x400000);
/// let je = decoder.decode()?;
///
/// assert_eq!(je.flow_control(), FlowControl::ConditionalBranch);
/// assert_eq!(je.branch_target(), 0x400007);
/// # Ok::<(), codecursor::Error>(())
/// ```
pub use disassembler::{Decoder, FlowControl, Instruction};
