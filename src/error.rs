//! Error taxonomy for sort orchestration.

use thiserror::Error;

/// Failure reported by a sort call.
///
/// Unless a variant says otherwise, the caller's buffers hold unspecified
/// contents once an error is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    /// A temporary buffer could not be obtained.
    ///
    /// Allocation always happens before the caller's buffers are written, so
    /// the caller's data is still intact when this is reported.
    #[error("failed to allocate {bytes} bytes of temporary storage (alignment {align})")]
    AllocationFailure { bytes: usize, align: usize },

    /// The sort kernel reported a nonzero status.
    #[error("{operation}: {category} error {code}")]
    DeviceSortFailure {
        code: i32,
        category: &'static str,
        operation: &'static str,
    },

    /// Keys and values disagree on length.
    #[error("key sequence has {keys} elements but value sequence has {values}")]
    LengthMismatch { keys: usize, values: usize },

    /// The element count does not fit the kernel's 32-bit element count.
    #[error("cannot sort {len} elements, the kernel supports at most {max}")]
    TooManyElements { len: usize, max: usize },
}
