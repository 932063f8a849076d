//! Host-side sort drivers.
//!
//! Every call flows through up to three layers:
//! - **Value strategy**: by-key sorts either hand small arithmetic values to
//!   the kernel directly or sort a `u32` index permutation and gather the
//!   values afterwards. The choice depends on the value type, its storage kind
//!   and the [`SortConfig`], never on the data.
//! - **Alignment guard**: a buffer not starting on a multiple of twice its
//!   element size is copied into an [`AlignedBuffer`], sorted there, and
//!   copied back. Keys and values are realigned independently.
//! - **Double-buffer driver**: pairs each buffer with a scratch buffer, runs
//!   the kernel, and copies the scratch slot back only if the kernel flipped
//!   the selector.
//!
//! The main entry points are [`stable_radix_sort`] and [`stable_radix_sort_by_key`].

use crate::buffer::{self, AlignedBuffer, gather, is_aligned, pair_alignment};
use crate::config::SortConfig;
use crate::core::{DoubleBuffer, Lanes, RadixKey, SortKernel, SortValue, ValueSequence};
use crate::error::SortError;
use crate::kernel::HostRadixKernel;
use bytemuck::Pod;
use tracing::debug;

const KEYS_ONLY: &str = "stable_radix_sort";
const BY_KEY: &str = "stable_radix_sort_by_key";

/// How a by-key sort moves its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStrategy {
    /// Values travel through the kernel next to the keys.
    Direct,
    /// An index permutation travels through the kernel; values are gathered afterwards.
    Indirect,
}

/// Picks the value strategy for sequences of type `Q`.
///
/// Direct requires contiguous storage and an arithmetic item type no wider
/// than [`SortConfig::direct_value_max_bytes`].
///
/// ```
/// use duosort::{SortConfig, ValueStrategy, value_strategy};
/// use std::collections::VecDeque;
///
/// let config = SortConfig::default();
/// assert_eq!(value_strategy::<[f32]>(&config), ValueStrategy::Direct);
/// assert_eq!(value_strategy::<[u128]>(&config), ValueStrategy::Indirect);
/// assert_eq!(value_strategy::<VecDeque<u32>>(&config), ValueStrategy::Indirect);
/// assert_eq!(value_strategy::<Vec<String>>(&config), ValueStrategy::Indirect);
/// ```
pub fn value_strategy<Q: ValueSequence + ?Sized>(config: &SortConfig) -> ValueStrategy {
    match <Q::Item as SortValue>::ARITHMETIC_WIDTH {
        Some(width) if Q::CONTIGUOUS && width <= config.direct_value_max_bytes() => {
            ValueStrategy::Direct
        }
        _ => ValueStrategy::Indirect,
    }
}

/// Sorts `keys` in place, ascending.
///
/// # Errors
///
/// [`SortError::AllocationFailure`] if scratch space cannot be obtained,
/// [`SortError::DeviceSortFailure`] if the kernel reports a failure,
/// [`SortError::TooManyElements`] past `u32::MAX` elements.
///
/// # Examples
///
/// ```
/// use duosort::{HostRadixKernel, SortConfig, stable_radix_sort};
///
/// let mut keys = vec![5u32, 3, 9, 1];
/// stable_radix_sort(&mut HostRadixKernel::new(), &mut keys, &SortConfig::default()).unwrap();
///
/// assert_eq!(keys, vec![1, 3, 5, 9]);
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(len = keys.len()))]
pub fn stable_radix_sort<K, S>(
    kernel: &mut S,
    keys: &mut [K],
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    S: SortKernel,
{
    if keys.is_empty() {
        return Ok(());
    }
    check_count(keys.len())?;
    sort_keys(kernel, keys, config)
}

/// Stably sorts `keys` and reorders `values` along with them.
///
/// The value strategy is chosen by [`value_strategy`].
///
/// # Errors
///
/// As [`stable_radix_sort`], plus [`SortError::LengthMismatch`] if `values`
/// does not have one element per key.
///
/// # Examples
///
/// ```
/// use duosort::{HostRadixKernel, SortConfig, stable_radix_sort_by_key};
///
/// let mut keys = vec![5u32, 3, 3, 1];
/// let mut values = vec!["e", "c1", "c2", "a"];
/// stable_radix_sort_by_key(
///     &mut HostRadixKernel::new(),
///     &mut keys,
///     &mut values,
///     &SortConfig::default(),
/// )
/// .unwrap();
///
/// assert_eq!(keys, vec![1, 3, 3, 5]);
/// assert_eq!(values, vec!["a", "c1", "c2", "e"]);
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(len = keys.len()))]
pub fn stable_radix_sort_by_key<K, Q, S>(
    kernel: &mut S,
    keys: &mut [K],
    values: &mut Q,
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    Q: ValueSequence + ?Sized,
    S: SortKernel,
{
    check_lengths(keys.len(), values.len())?;
    if keys.is_empty() {
        return Ok(());
    }
    check_count(keys.len())?;

    let strategy = value_strategy::<Q>(config);
    debug!(?strategy, "selected value strategy");

    match strategy {
        ValueStrategy::Direct => match values.as_contiguous_mut() {
            Some(slice) => sort_direct(kernel, keys, slice, config),
            None => sort_permuted(kernel, keys, values, config),
        },
        ValueStrategy::Indirect => sort_permuted(kernel, keys, values, config),
    }
}

/// Sorts keys and values together through the kernel.
///
/// This is the direct strategy without the width cutoff. Values without a
/// lane view (records, arrays, strings) still fall back to the permutation.
///
/// ```
/// use duosort::{HostRadixKernel, SortConfig, stable_radix_sort_by_key_direct};
///
/// let mut keys = [2u8, 1];
/// let mut values = [0.5f64, -1.5];
/// stable_radix_sort_by_key_direct(
///     &mut HostRadixKernel::new(),
///     &mut keys,
///     &mut values,
///     &SortConfig::default(),
/// )
/// .unwrap();
///
/// assert_eq!(values, [-1.5, 0.5]);
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(len = keys.len()))]
pub fn stable_radix_sort_by_key_direct<K, V, S>(
    kernel: &mut S,
    keys: &mut [K],
    values: &mut [V],
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    V: SortValue,
    S: SortKernel,
{
    check_lengths(keys.len(), values.len())?;
    if keys.is_empty() {
        return Ok(());
    }
    check_count(keys.len())?;
    sort_direct(kernel, keys, values, config)
}

/// Sorts keys against an index permutation, then gathers the values.
///
/// This is the indirect strategy regardless of what [`value_strategy`] would
/// pick. Only `u32` indices pass through the kernel; each value is cloned
/// into scratch once and moved back into place.
#[tracing::instrument(level = "debug", skip_all, fields(len = keys.len()))]
pub fn stable_radix_sort_by_key_indirect<K, Q, S>(
    kernel: &mut S,
    keys: &mut [K],
    values: &mut Q,
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    Q: ValueSequence + ?Sized,
    S: SortKernel,
{
    check_lengths(keys.len(), values.len())?;
    if keys.is_empty() {
        return Ok(());
    }
    check_count(keys.len())?;
    sort_permuted(kernel, keys, values, config)
}

fn check_lengths(keys: usize, values: usize) -> Result<(), SortError> {
    if keys == values {
        Ok(())
    } else {
        Err(SortError::LengthMismatch { keys, values })
    }
}

fn check_count(len: usize) -> Result<(), SortError> {
    match u32::try_from(len) {
        Ok(_) => Ok(()),
        Err(_) => Err(SortError::TooManyElements {
            len,
            max: u32::MAX as usize,
        }),
    }
}

/// Alignment guard for keys-only sorts.
fn sort_keys<K, S>(kernel: &mut S, keys: &mut [K], config: &SortConfig) -> Result<(), SortError>
where
    K: RadixKey,
    S: SortKernel,
{
    if !is_aligned(keys, pair_alignment::<K>()) {
        debug!(align = pair_alignment::<K>(), "realigning keys");
        let mut aligned = AlignedBuffer::from_slice(keys, config)?;
        debug_assert!(is_aligned(&aligned[..], pair_alignment::<K>()));
        sort_keys(kernel, &mut aligned[..], config)?;
        keys.copy_from_slice(&aligned);
        return Ok(());
    }

    drive_keys(kernel, keys, config)
}

/// Double-buffer driver for keys-only sorts. `keys` must be aligned.
fn drive_keys<K, S>(kernel: &mut S, keys: &mut [K], config: &SortConfig) -> Result<(), SortError>
where
    K: RadixKey,
    S: SortKernel,
{
    let mut temp_keys = AlignedBuffer::<K>::zeroed(keys.len(), config)?;

    let flipped = {
        let mut buffer = DoubleBuffer::new(&mut *keys, &mut temp_keys[..]);
        run_kernel(kernel, &mut buffer, KEYS_ONLY)?
    };

    // The kernel sometimes leaves its output in the scratch slot.
    if flipped {
        debug!("copying keys back from scratch slot");
        keys.copy_from_slice(&temp_keys);
    }
    Ok(())
}

/// Alignment guard for key-value sorts. Keys and values are realigned one at a time.
fn sort_pairs<K, V, S>(
    kernel: &mut S,
    keys: &mut [K],
    values: &mut [V],
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    V: Pod,
    S: SortKernel,
{
    if !is_aligned(keys, pair_alignment::<K>()) {
        debug!(align = pair_alignment::<K>(), "realigning keys");
        let mut aligned_keys = AlignedBuffer::from_slice(keys, config)?;
        sort_pairs(kernel, &mut aligned_keys[..], values, config)?;
        keys.copy_from_slice(&aligned_keys);
        return Ok(());
    }
    if !is_aligned(values, pair_alignment::<V>()) {
        debug!(align = pair_alignment::<V>(), "realigning values");
        let mut aligned_values = AlignedBuffer::from_slice(values, config)?;
        sort_pairs(kernel, keys, &mut aligned_values[..], config)?;
        values.copy_from_slice(&aligned_values);
        return Ok(());
    }

    drive_pairs(kernel, keys, values, config)
}

/// Double-buffer driver for key-value sorts. Both buffers must be aligned.
fn drive_pairs<K, V, S>(
    kernel: &mut S,
    keys: &mut [K],
    values: &mut [V],
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    V: Pod,
    S: SortKernel,
{
    let len = keys.len();
    let mut temp_keys = AlignedBuffer::<K>::zeroed(len, config)?;
    let mut temp_values = AlignedBuffer::<V>::zeroed(len, config)?;

    let flipped = {
        let mut buffer = DoubleBuffer::with_values(
            &mut *keys,
            &mut temp_keys[..],
            &mut *values,
            &mut temp_values[..],
        );
        run_kernel(kernel, &mut buffer, BY_KEY)?
    };

    // Keys and values share the selector, so they come back together or not at all.
    if flipped {
        debug!("copying keys and values back from scratch slot");
        keys.copy_from_slice(&temp_keys);
        values.copy_from_slice(&temp_values);
    }
    Ok(())
}

/// Runs the kernel to completion and reports whether the selector moved.
fn run_kernel<K, V, S>(
    kernel: &mut S,
    buffer: &mut DoubleBuffer<'_, K, V>,
    operation: &'static str,
) -> Result<bool, SortError>
where
    K: RadixKey,
    V: Pod,
    S: SortKernel,
{
    let initial_selector = buffer.selector();

    kernel.sort(buffer).into_result(kernel.category(), operation)?;
    kernel.synchronize().into_result(kernel.category(), operation)?;

    Ok(buffer.selector() != initial_selector)
}

fn sort_direct<K, V, S>(
    kernel: &mut S,
    keys: &mut [K],
    values: &mut [V],
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    V: SortValue,
    S: SortKernel,
{
    match V::as_lanes(values) {
        Some(lanes) => sort_lanes(kernel, keys, lanes, config),
        None => sort_permuted(kernel, keys, values, config),
    }
}

fn sort_lanes<K, S>(
    kernel: &mut S,
    keys: &mut [K],
    lanes: Lanes<'_>,
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    S: SortKernel,
{
    match lanes {
        Lanes::W8(values) => sort_pairs(kernel, keys, values, config),
        Lanes::W16(values) => sort_pairs(kernel, keys, values, config),
        Lanes::W32(values) => sort_pairs(kernel, keys, values, config),
        Lanes::W64(values) => sort_pairs(kernel, keys, values, config),
        Lanes::W128(values) => sort_pairs(kernel, keys, values, config),
    }
}

fn sort_permuted<K, Q, S>(
    kernel: &mut S,
    keys: &mut [K],
    values: &mut Q,
    config: &SortConfig,
) -> Result<(), SortError>
where
    K: RadixKey,
    Q: ValueSequence + ?Sized,
    S: SortKernel,
{
    let len = keys.len();

    // Reserve everything up front so an allocation failure leaves keys untouched.
    let mut permutation = AlignedBuffer::identity(len, config)?;
    let mut temp_values = buffer::scratch::<Option<Q::Item>>(len, config)?;

    sort_pairs(kernel, keys, &mut permutation[..], config)?;

    temp_values.extend((0..len).map(|i| Some(values.get(i).clone())));
    gather(&permutation[..], &mut temp_values[..], values);
    Ok(())
}

/// A kernel bundled with its configuration.
///
/// # Examples
///
/// ```
/// use duosort::RadixSorter;
/// use std::collections::VecDeque;
///
/// let mut sorter = RadixSorter::host();
/// let mut keys = [3i64, -1, 2];
/// let mut names: VecDeque<String> = ["c", "a", "b"].iter().map(|s| s.to_string()).collect();
/// sorter.sort_by_key(&mut keys, &mut names).unwrap();
///
/// assert_eq!(keys, [-1, 2, 3]);
/// assert_eq!(names, ["a", "b", "c"]);
/// ```
#[derive(Debug, Clone)]
pub struct RadixSorter<S: SortKernel> {
    kernel: S,
    config: SortConfig,
}

impl RadixSorter<HostRadixKernel> {
    /// A sorter running the host reference kernel with default configuration.
    pub fn host() -> Self {
        Self::new(HostRadixKernel::default())
    }
}

impl<S: SortKernel> RadixSorter<S> {
    pub fn new(kernel: S) -> Self {
        Self::with_config(kernel, SortConfig::default())
    }

    pub fn with_config(kernel: S, config: SortConfig) -> Self {
        Self { kernel, config }
    }

    /// See [`stable_radix_sort`].
    pub fn sort<K: RadixKey>(&mut self, keys: &mut [K]) -> Result<(), SortError> {
        stable_radix_sort(&mut self.kernel, keys, &self.config)
    }

    /// See [`stable_radix_sort_by_key`].
    pub fn sort_by_key<K, Q>(&mut self, keys: &mut [K], values: &mut Q) -> Result<(), SortError>
    where
        K: RadixKey,
        Q: ValueSequence + ?Sized,
    {
        stable_radix_sort_by_key(&mut self.kernel, keys, values, &self.config)
    }
}
