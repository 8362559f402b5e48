//! Rendered instruction text with scoped ownership.
//!
//! Text produced by the shipped primitives is an ordinary Rust string. Text that comes from a
//! foreign raw-decode binary was allocated by that binary's allocator and must be handed back
//! to its paired release function. [`InstructionText`] covers both: the foreign pointer is
//! released exactly once when the value is dropped, and cloning always produces an owned deep
//! copy so a foreign handle is never shared.

use std::{
    ffi::{c_char, CStr},
    fmt,
    ptr::NonNull,
};

/// Release function paired with a foreign text allocation.
pub type ForeignFreeFn = unsafe extern "C" fn(*mut c_char);

enum Repr {
    Owned(Box<str>),
    Foreign {
        ptr: NonNull<c_char>,
        free: ForeignFreeFn,
    },
}

/// Rendered text of one instruction.
///
/// # Examples
///
/// ```rust
/// use codecursor::raw::InstructionText;
///
/// let text = InstructionText::new("push rbp");
/// assert_eq!(text.as_str(), "push rbp");
/// assert!(!text.is_foreign());
/// ```
pub struct InstructionText {
    repr: Repr,
}

// SAFETY: a foreign handle is exclusively owned by this value and only read through `&self`;
// the paired release function is called once, from whichever thread drops the value.
unsafe impl Send for InstructionText {}
// SAFETY: shared access only reads the NUL-terminated buffer, which is never mutated.
unsafe impl Sync for InstructionText {}

impl InstructionText {
    /// Create owned text.
    #[must_use]
    pub fn new(text: impl Into<Box<str>>) -> Self {
        InstructionText {
            repr: Repr::Owned(text.into()),
        }
    }

    /// Take ownership of a NUL-terminated string allocated by a foreign primitive.
    ///
    /// Returns `None` for a null pointer, in which case nothing is released.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a valid NUL-terminated string that stays valid until `free` is
    /// called on it, and `free` must be the release function paired with the allocator that
    /// produced `ptr`. Ownership transfers to the returned value: the caller must not release
    /// `ptr` itself or wrap it a second time.
    #[must_use]
    pub unsafe fn from_foreign(ptr: *mut c_char, free: ForeignFreeFn) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| InstructionText {
            repr: Repr::Foreign { ptr, free },
        })
    }

    /// The text as a string slice. Foreign text that is not valid UTF-8 reads as `""`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Owned(text) => text,
            // SAFETY: validity until drop is guaranteed by the `from_foreign` contract.
            Repr::Foreign { ptr, .. } => unsafe { CStr::from_ptr(ptr.as_ptr()) }
                .to_str()
                .unwrap_or_default(),
        }
    }

    /// `true` if the text is still owned by a foreign allocator.
    #[must_use]
    pub fn is_foreign(&self) -> bool {
        matches!(self.repr, Repr::Foreign { .. })
    }
}

impl Drop for InstructionText {
    fn drop(&mut self) {
        if let Repr::Foreign { ptr, free } = self.repr {
            // SAFETY: `from_foreign` transferred exclusive ownership; drop runs once.
            unsafe { free(ptr.as_ptr()) };
        }
    }
}

impl Clone for InstructionText {
    fn clone(&self) -> Self {
        InstructionText::new(self.as_str())
    }
}

impl fmt::Debug for InstructionText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionText")
            .field("text", &self.as_str())
            .field("foreign", &self.is_foreign())
            .finish()
    }
}

impl fmt::Display for InstructionText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for InstructionText {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for InstructionText {}
