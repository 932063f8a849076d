//! Temporary storage and the small data-movement primitives the drivers use.
//!
//! The sort kernel requires every buffer to start on a multiple of twice its
//! element size. [`AlignedBuffer`] always satisfies that, so a buffer that
//! was realigned once never needs realigning again.

use crate::config::SortConfig;
use crate::core::ValueSequence;
use crate::error::SortError;
use bytemuck::Pod;
use std::alloc::{self, Layout};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Alignment the kernel expects for a buffer of `T`.
#[inline(always)]
pub const fn pair_alignment<T>() -> usize {
    let pair = 2 * mem::size_of::<T>();
    let natural = mem::align_of::<T>();
    if pair > natural { pair } else { natural }
}

/// Returns `true` if `slice` starts on a multiple of `alignment` bytes.
#[inline(always)]
pub fn is_aligned<T>(slice: &[T], alignment: usize) -> bool {
    (slice.as_ptr() as usize) % alignment == 0
}

/// A zero-initialised, uniquely owned buffer aligned to [`pair_alignment`].
///
/// Released when dropped, so every early return frees it.
pub struct AlignedBuffer<T: Pod> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
}

impl<T: Pod> AlignedBuffer<T> {
    /// Allocates `len` zeroed elements.
    pub fn zeroed(len: usize, config: &SortConfig) -> Result<Self, SortError> {
        let align = pair_alignment::<T>();
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or(SortError::AllocationFailure {
                bytes: usize::MAX,
                align,
            })?;
        config.admit(bytes, align)?;
        let layout = Layout::from_size_align(bytes, align)
            .map_err(|_| SortError::AllocationFailure { bytes, align })?;

        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len,
                layout,
            });
        }

        // Safety: layout has a nonzero size; all-zero bytes are a valid `T: Pod`.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<T>())
            .ok_or(SortError::AllocationFailure { bytes, align })?;
        Ok(Self { ptr, len, layout })
    }

    /// Allocates a buffer holding a copy of `source`.
    pub fn from_slice(source: &[T], config: &SortConfig) -> Result<Self, SortError> {
        let mut buffer = Self::zeroed(source.len(), config)?;
        buffer.copy_from_slice(source);
        Ok(buffer)
    }
}

impl AlignedBuffer<u32> {
    /// Allocates the identity permutation `0, 1, .., len - 1`.
    pub fn identity(len: usize, config: &SortConfig) -> Result<Self, SortError> {
        let mut buffer = Self::zeroed(len, config)?;
        sequence(&mut buffer);
        Ok(buffer)
    }
}

impl<T: Pod> Deref for AlignedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // Safety: ptr is valid for len initialised elements (or dangling with len * size 0).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Pod> DerefMut for AlignedBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // Safety: as in `deref`, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Pod> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // Safety: allocated in `zeroed` with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) }
        }
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// Safety: the buffer uniquely owns its allocation, like a `Box<[T]>`.
unsafe impl<T: Pod + Send> Send for AlignedBuffer<T> {}
unsafe impl<T: Pod + Sync> Sync for AlignedBuffer<T> {}

/// Reserves scratch space for `len` values of `T` without initialising it.
pub fn scratch<T>(len: usize, config: &SortConfig) -> Result<Vec<T>, SortError> {
    let align = mem::align_of::<T>();
    let bytes = len.saturating_mul(mem::size_of::<T>());
    config.admit(bytes, align)?;
    let mut scratch = Vec::new();
    scratch
        .try_reserve_exact(len)
        .map_err(|_| SortError::AllocationFailure { bytes, align })?;
    Ok(scratch)
}

/// Fills `dest` with `0, 1, .., dest.len() - 1`.
pub fn sequence(dest: &mut [u32]) {
    dest.iter_mut().zip(0u32..).for_each(|(slot, i)| *slot = i);
}

/// Moves `source[indices[i]]` into `dest[i]` for every `i`.
///
/// `indices` must be a permutation; each source slot is taken exactly once.
pub fn gather<Q>(indices: &[u32], source: &mut [Option<Q::Item>], dest: &mut Q)
where
    Q: ValueSequence + ?Sized,
{
    for (i, &from) in indices.iter().enumerate() {
        if let Some(value) = source[from as usize].take() {
            dest.set(i, value);
        }
    }
}
