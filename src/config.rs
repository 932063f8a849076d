//! Tunables for the sort drivers.

use crate::error::SortError;

/// Widest arithmetic value type, in bytes, that travels through the kernel
/// next to the keys by default.
///
/// Anything wider is sorted through an index permutation instead. Override
/// with [`SortConfig::with_direct_value_max_bytes`].
pub const DIRECT_VALUE_MAX_BYTES: usize = 8;

/// Configuration shared by every sort entry point.
///
/// # Examples
///
/// ```
/// use duosort::SortConfig;
///
/// let config = SortConfig::default()
///     .with_direct_value_max_bytes(16)
///     .with_temp_bytes_limit(1 << 30);
///
/// assert_eq!(config.direct_value_max_bytes(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    direct_value_max_bytes: usize,
    temp_bytes_limit: Option<usize>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            direct_value_max_bytes: DIRECT_VALUE_MAX_BYTES,
            temp_bytes_limit: None,
        }
    }
}

impl SortConfig {
    /// Sets the widest arithmetic value type eligible for the direct strategy.
    pub fn with_direct_value_max_bytes(mut self, bytes: usize) -> Self {
        self.direct_value_max_bytes = bytes;
        self
    }

    /// Caps the size of any single temporary allocation.
    ///
    /// Requests above the cap fail with [`SortError::AllocationFailure`], the
    /// same way an exhausted device allocator would.
    pub fn with_temp_bytes_limit(mut self, bytes: usize) -> Self {
        self.temp_bytes_limit = Some(bytes);
        self
    }

    pub fn direct_value_max_bytes(&self) -> usize {
        self.direct_value_max_bytes
    }

    /// Checks a temporary allocation request against the configured cap.
    pub(crate) fn admit(&self, bytes: usize, align: usize) -> Result<(), SortError> {
        match self.temp_bytes_limit {
            Some(limit) if bytes > limit => Err(SortError::AllocationFailure { bytes, align }),
            _ => Ok(()),
        }
    }
}
