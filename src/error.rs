use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only cursor positioning, configuration and contract violations of a raw-decode primitive
/// are reported through this type. Undecodable bytes are never an error: they surface as an
/// [`crate::Instruction`] carrying the `INVALID` mnemonic, and statically unresolvable targets
/// are reported as `0` by the classification queries.
///
/// # Error Categories
///
/// ## Cursor Errors
/// - [`Error::OutOfBounds`] - Repositioning outside of the decode window
/// - [`Error::Exhausted`] - Decoding past the end of the buffer
///
/// ## Configuration Errors
/// - [`Error::UnsupportedBitness`] - Decoder configured with a bitness other than 16, 32 or 64
///
/// ## Primitive Errors
/// - [`Error::Malformed`] - A raw-decode primitive broke its output contract
///
/// # Examples
///
/// ```rust
/// use codecursor::{Decoder, Error};
///
/// let code = [0x90];
/// let mut decoder = Decoder::new(&code, 0x1000);
///
/// match decoder.set_ip(0x2000) {
///     Ok(()) => println!("repositioned"),
///     Err(Error::OutOfBounds { address, .. }) => println!("0x{address:x} is outside the buffer"),
///     Err(e) => println!("Error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An address outside of the decode window was requested.
    ///
    /// The valid window of a cursor is `base..base + size`. Repositioning requests outside of it
    /// are rejected and leave the cursor untouched.
    #[error("Address 0x{address:x} is outside of the decode window 0x{base:x}+0x{size:x}")]
    OutOfBounds {
        /// The requested address
        address: u64,
        /// Base address of the cursor window
        base: u64,
        /// Size of the cursor window in bytes
        size: usize,
    },

    /// The cursor has no bytes left to decode.
    ///
    /// Callers are expected to check [`crate::Decoder::can_decode`] before decoding; this error
    /// is returned instead of touching any cursor state.
    #[error("The decoder has no bytes left to decode")]
    Exhausted,

    /// The requested decoding bitness is not supported.
    #[error("Unsupported bitness {0}, must be 16, 32 or 64")]
    UnsupportedBitness(u32),

    /// A raw-decode primitive returned facts that violate its contract.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message() {
        let err = Error::OutOfBounds {
            address: 0x2000,
            base: 0x1000,
            size: 0x10,
        };
        assert_eq!(
            err.to_string(),
            "Address 0x2000 is outside of the decode window 0x1000+0x10"
        );
    }

    #[test]
    fn malformed_macro_captures_location() {
        let err = malformed_error!("length {} exceeds window {}", 16, 15);
        match err {
            Error::Malformed {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "length 16 exceeds window 15");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            _ => panic!("Expected Error::Malformed"),
        }
    }
}
