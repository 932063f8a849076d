//! Host reference implementation of the [`SortKernel`] capability.
//!
//! [`HostRadixKernel`] is a least-significant-digit radix sort over 8-bit
//! digits. Each executed pass scatters from the current slot into the
//! alternate slot and flips the selector, the same ping-pong a device
//! enactor performs. Passes where every key shares the digit are skipped, so
//! whether the result ends up in the caller's slot or the scratch slot
//! depends on the keys.

use crate::core::{DeviceStatus, DoubleBuffer, RadixKey, SortKernel, Slots};
use bytemuck::Pod;
use cuneiform::cuneiform;

const RADIX_BITS: usize = 8;

/// Number of buckets per pass (256 for byte-wise).
const RADIX_BUCKETS: usize = 1 << RADIX_BITS;

/// Status reported when the element count exceeds the kernel's `u32` range.
pub const STATUS_INVALID_VALUE: DeviceStatus = DeviceStatus(1);

// Cache-aligned digit histogram.
#[cuneiform]
struct DigitCounts {
    data: [usize; RADIX_BUCKETS],
}

/// Stable LSD radix sort running on the host.
#[derive(Debug, Clone, Copy)]
pub struct HostRadixKernel {
    skip_uniform_digits: bool,
}

impl Default for HostRadixKernel {
    fn default() -> Self {
        Self {
            skip_uniform_digits: true,
        }
    }
}

impl HostRadixKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether passes whose digit is identical for every key are skipped.
    ///
    /// With skipping disabled every key width performs an even number of
    /// passes and the result always lands back in the starting slot.
    pub fn with_skip_uniform_digits(mut self, skip: bool) -> Self {
        self.skip_uniform_digits = skip;
        self
    }
}

impl SortKernel for HostRadixKernel {
    fn sort<K: RadixKey, V: Pod>(&mut self, buffer: &mut DoubleBuffer<'_, K, V>) -> DeviceStatus {
        let len = buffer.len();
        if u32::try_from(len).is_err() {
            return STATUS_INVALID_VALUE;
        }

        for pass in 0..K::BYTES {
            let shift = pass * RADIX_BITS;
            let executed = scatter_pass(buffer.slots_mut(), shift, self.skip_uniform_digits);
            if executed {
                buffer.flip();
            }
            tracing::trace!(pass, executed, selector = buffer.selector(), "radix pass");
        }

        DeviceStatus::SUCCESS
    }

    fn category(&self) -> &'static str {
        "host"
    }
}

#[inline(always)]
fn digit<K: RadixKey>(key: K, shift: usize) -> usize {
    ((key.radix_bits() >> shift) as usize) & (RADIX_BUCKETS - 1)
}

/// Counting-sort pass on one digit, current slot to alternate slot.
///
/// Returns `false` without moving anything when the pass is skipped.
fn scatter_pass<K: RadixKey, V: Pod>(
    slots: Slots<'_, K, V>,
    shift: usize,
    skip_uniform: bool,
) -> bool {
    let Slots {
        keys,
        alternate_keys,
        values,
        mut alternate_values,
    } = slots;

    // 1. Histogram
    let mut counts = DigitCounts {
        data: [0; RADIX_BUCKETS],
    };
    let counts = &mut counts.data;
    keys.iter().for_each(|&k| counts[digit(k, shift)] += 1);

    if skip_uniform && counts.iter().any(|&c| c == keys.len()) {
        return false;
    }

    // 2. Exclusive prefix sum
    let mut offsets = [0usize; RADIX_BUCKETS];
    let mut sum = 0;
    offsets
        .iter_mut()
        .zip(counts.iter())
        .for_each(|(offset, &count)| {
            *offset = sum;
            sum += count;
        });

    // 3. Stable scatter, values follow their keys
    keys.iter().enumerate().for_each(|(i, &k)| {
        let d = digit(k, shift);
        let pos = offsets[d];
        offsets[d] += 1;
        alternate_keys[pos] = k;
        if let (Some(src), Some(dst)) = (values.as_deref(), alternate_values.as_deref_mut()) {
            dst[pos] = src[i];
        }
    });

    true
}
