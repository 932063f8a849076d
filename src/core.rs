//! Core traits and types for duosort.
//!
//! This module defines:
//! - [`RadixKey`]: fixed-width keys the kernel can sort.
//! - [`SortValue`] and [`ValueSequence`]: what a payload is and how it is stored.
//!   Together they decide which value strategy a by-key sort takes.
//! - [`DoubleBuffer`]: the two-slot descriptor handed to the kernel.
//! - [`SortKernel`]: the opaque device sort capability.

use crate::error::SortError;
use bytemuck::Pod;
use std::collections::VecDeque;
use std::fmt::Debug;

/// A fixed-width key the sort kernel can order.
///
/// `radix_bits` maps the key onto an unsigned integer whose natural order is
/// the key order. Signed integers flip the sign bit. Floats use the IEEE
/// total-order transform, so keys end up ordered like [`f64::total_cmp`].
pub trait RadixKey: Pod + PartialOrd + Debug {
    /// Width of the key in bytes, i.e. the number of 8-bit digits.
    const BYTES: usize = std::mem::size_of::<Self>();

    /// Order-preserving unsigned image of the key.
    fn radix_bits(self) -> u64;
}

macro_rules! unsigned_key {
    ($($t:ty),*) => {
        $(
            impl RadixKey for $t {
                #[inline(always)]
                fn radix_bits(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

macro_rules! signed_key {
    ($($t:ty => $u:ty),*) => {
        $(
            impl RadixKey for $t {
                #[inline(always)]
                fn radix_bits(self) -> u64 {
                    ((self as $u) ^ (1 << (<$u>::BITS - 1))) as u64
                }
            }
        )*
    };
}

macro_rules! float_key {
    ($($t:ty => $u:ty),*) => {
        $(
            impl RadixKey for $t {
                #[inline(always)]
                fn radix_bits(self) -> u64 {
                    let bits = self.to_bits();
                    let sign: $u = 1 << (<$u>::BITS - 1);
                    let mask = if bits & sign != 0 { !0 } else { sign };
                    (bits ^ mask) as u64
                }
            }
        )*
    };
}

unsigned_key!(u8, u16, u32, u64, usize);
signed_key!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize);
float_key!(f32 => u32, f64 => u64);

/// A value slice reinterpreted as same-width unsigned integers.
///
/// The kernel never inspects values, it only moves them, so any arithmetic
/// payload of a given width can travel as that width's unsigned lane type.
#[derive(Debug)]
pub enum Lanes<'a> {
    W8(&'a mut [u8]),
    W16(&'a mut [u16]),
    W32(&'a mut [u32]),
    W64(&'a mut [u64]),
    W128(&'a mut [u128]),
}

/// A payload associated with a key.
///
/// Fixed-width arithmetic scalars report their width and can be viewed as
/// [`Lanes`]; everything else keeps the defaults and is always rearranged
/// through an index permutation. Implement it for your own payload types with
/// [`indirect_value!`](crate::indirect_value).
///
/// `ARITHMETIC_WIDTH` and `as_lanes` must agree: a type reporting a width has
/// to return `Some` from `as_lanes`.
pub trait SortValue: Clone {
    /// Byte width when the type is a fixed-width arithmetic scalar.
    const ARITHMETIC_WIDTH: Option<usize> = None;

    /// Reinterprets a contiguous run of values as unsigned lanes.
    fn as_lanes(_values: &mut [Self]) -> Option<Lanes<'_>> {
        None
    }
}

macro_rules! arithmetic_value {
    ($($t:ty => $variant:ident($lane:ty)),* $(,)?) => {
        $(
            impl SortValue for $t {
                const ARITHMETIC_WIDTH: Option<usize> = Some(std::mem::size_of::<$t>());

                fn as_lanes(values: &mut [Self]) -> Option<Lanes<'_>> {
                    Some(Lanes::$variant(bytemuck::cast_slice_mut::<$t, $lane>(values)))
                }
            }
        )*
    };
}

arithmetic_value!(
    u8 => W8(u8),
    i8 => W8(u8),
    u16 => W16(u16),
    i16 => W16(u16),
    u32 => W32(u32),
    i32 => W32(u32),
    f32 => W32(u32),
    u64 => W64(u64),
    i64 => W64(u64),
    f64 => W64(u64),
    u128 => W128(u128),
    i128 => W128(u128),
);

#[cfg(target_pointer_width = "64")]
arithmetic_value!(usize => W64(u64), isize => W64(u64));

#[cfg(target_pointer_width = "32")]
arithmetic_value!(usize => W32(u32), isize => W32(u32));

/// Implements [`SortValue`] for payload types that are always sorted
/// indirectly.
///
/// ```
/// #[derive(Clone)]
/// struct Record {
///     name: String,
///     score: f64,
/// }
///
/// duosort::indirect_value!(Record);
/// ```
#[macro_export]
macro_rules! indirect_value {
    ($($t:ty),* $(,)?) => {
        $(impl $crate::core::SortValue for $t {})*
    };
}

indirect_value!(bool, char, String);

impl SortValue for &str {}
impl<T: Clone> SortValue for Vec<T> {}
impl<T: Clone> SortValue for Box<T> {}
impl<T: Clone> SortValue for Option<T> {}
impl<A: Clone, B: Clone> SortValue for (A, B) {}
impl<T: Clone, const N: usize> SortValue for [T; N] {}

/// Random-access storage for a value sequence.
///
/// `CONTIGUOUS` is the storage-kind half of the strategy decision: only
/// plain contiguous arrays can hand their memory straight to the kernel.
pub trait ValueSequence {
    type Item: SortValue;

    /// Whether the storage is one plain contiguous array.
    const CONTIGUOUS: bool;

    /// Returns the number of values.
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> &Self::Item;

    fn set(&mut self, index: usize, value: Self::Item);

    /// The backing memory, when `CONTIGUOUS` holds.
    fn as_contiguous_mut(&mut self) -> Option<&mut [Self::Item]>;
}

impl<T: SortValue> ValueSequence for [T] {
    type Item = T;
    const CONTIGUOUS: bool = true;

    fn len(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> &T {
        &self[index]
    }

    fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    fn as_contiguous_mut(&mut self) -> Option<&mut [T]> {
        Some(self)
    }
}

impl<T: SortValue> ValueSequence for Vec<T> {
    type Item = T;
    const CONTIGUOUS: bool = true;

    fn len(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> &T {
        &self[index]
    }

    fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    fn as_contiguous_mut(&mut self) -> Option<&mut [T]> {
        Some(self.as_mut_slice())
    }
}

// A ring buffer may wrap around its allocation, so it never counts as contiguous.
impl<T: SortValue> ValueSequence for VecDeque<T> {
    type Item = T;
    const CONTIGUOUS: bool = false;

    fn len(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> &T {
        &self[index]
    }

    fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    fn as_contiguous_mut(&mut self) -> Option<&mut [T]> {
        None
    }
}

/// Every `stride`-th element of a slice, starting at `offset`.
///
/// Useful when values are one field of an interleaved record layout.
///
/// ```
/// use duosort::Strided;
/// use duosort::core::ValueSequence;
///
/// let mut interleaved = [10, 1, 20, 2, 30, 3];
/// let odd = Strided::new(&mut interleaved, 1, 2);
/// assert_eq!(odd.len(), 3);
/// assert_eq!(*odd.get(2), 3);
/// ```
#[derive(Debug)]
pub struct Strided<'a, T> {
    data: &'a mut [T],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a, T> Strided<'a, T> {
    /// # Panics
    ///
    /// Panics if `stride` is zero.
    pub fn new(data: &'a mut [T], offset: usize, stride: usize) -> Self {
        assert!(stride > 0, "stride must be nonzero");
        let len = data.len().saturating_sub(offset).div_ceil(stride);
        Self {
            data,
            offset,
            stride,
            len,
        }
    }

    #[inline(always)]
    fn position(&self, index: usize) -> usize {
        assert!(index < self.len, "index {index} out of range for length {}", self.len);
        self.offset + index * self.stride
    }
}

impl<T: SortValue> ValueSequence for Strided<'_, T> {
    type Item = T;
    const CONTIGUOUS: bool = false;

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> &T {
        &self.data[self.position(index)]
    }

    fn set(&mut self, index: usize, value: T) {
        let position = self.position(index);
        self.data[position] = value;
    }

    fn as_contiguous_mut(&mut self) -> Option<&mut [T]> {
        None
    }
}

/// Two-slot buffer descriptor handed to a [`SortKernel`].
///
/// Slot `selector` holds the valid data; the other slot is scratch space.
/// Keys and values share the one selector, so flipping it always moves both
/// pairs together.
#[derive(Debug)]
pub struct DoubleBuffer<'a, K, V = ()> {
    keys: [&'a mut [K]; 2],
    values: Option<[&'a mut [V]; 2]>,
    selector: usize,
}

/// Current and alternate views of a [`DoubleBuffer`], split for a kernel pass.
#[derive(Debug)]
pub struct Slots<'b, K, V> {
    pub keys: &'b mut [K],
    pub alternate_keys: &'b mut [K],
    pub values: Option<&'b mut [V]>,
    pub alternate_values: Option<&'b mut [V]>,
}

impl<'a, K> DoubleBuffer<'a, K> {
    /// Keys-only descriptor with `keys` in slot 0.
    ///
    /// # Panics
    ///
    /// Panics if the slots differ in length.
    pub fn new(keys: &'a mut [K], alternate_keys: &'a mut [K]) -> Self {
        assert_eq!(keys.len(), alternate_keys.len(), "key slots must have equal length");
        Self {
            keys: [keys, alternate_keys],
            values: None,
            selector: 0,
        }
    }
}

impl<'a, K, V> DoubleBuffer<'a, K, V> {
    /// Key-value descriptor with `keys` and `values` in slot 0.
    ///
    /// # Panics
    ///
    /// Panics if any of the four slots differ in length.
    pub fn with_values(
        keys: &'a mut [K],
        alternate_keys: &'a mut [K],
        values: &'a mut [V],
        alternate_values: &'a mut [V],
    ) -> Self {
        let len = keys.len();
        assert_eq!(len, alternate_keys.len(), "key slots must have equal length");
        assert_eq!(len, values.len(), "value slots must match key slots");
        assert_eq!(len, alternate_values.len(), "value slots must match key slots");
        Self {
            keys: [keys, alternate_keys],
            values: Some([values, alternate_values]),
            selector: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.keys[0].len()
    }

    /// Index of the slot holding the valid data.
    pub fn selector(&self) -> usize {
        self.selector
    }

    /// Swaps which slot is current, for keys and values alike.
    pub fn flip(&mut self) {
        self.selector ^= 1;
    }

    /// Keys in the current slot.
    pub fn keys(&self) -> &[K] {
        &*self.keys[self.selector]
    }

    /// Values in the current slot, if the descriptor carries values.
    pub fn values(&self) -> Option<&[V]> {
        self.values.as_ref().map(|slots| &*slots[self.selector])
    }

    /// Splits the descriptor into current and alternate slots.
    pub fn slots_mut(&mut self) -> Slots<'_, K, V> {
        let current = self.selector;
        let [k0, k1] = &mut self.keys;
        let (keys, alternate_keys) = if current == 0 {
            (&mut **k0, &mut **k1)
        } else {
            (&mut **k1, &mut **k0)
        };
        let (values, alternate_values) = match &mut self.values {
            Some([v0, v1]) => {
                if current == 0 {
                    (Some(&mut **v0), Some(&mut **v1))
                } else {
                    (Some(&mut **v1), Some(&mut **v0))
                }
            }
            None => (None, None),
        };
        Slots {
            keys,
            alternate_keys,
            values,
            alternate_values,
        }
    }
}

/// Status code reported by a kernel; zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceStatus(pub i32);

impl DeviceStatus {
    pub const SUCCESS: Self = Self(0);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Converts a failing status into [`SortError::DeviceSortFailure`].
    pub fn into_result(
        self,
        category: &'static str,
        operation: &'static str,
    ) -> Result<(), SortError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SortError::DeviceSortFailure {
                code: self.0,
                category,
                operation,
            })
        }
    }
}

/// The device sort capability.
///
/// `sort` performs a full stable sort of the descriptor's current slot. It
/// may leave the result in either slot and reports where by flipping the
/// descriptor's selector, so callers must never assume a fixed output slot.
/// Keys and values in the alternate slot are scratch on entry.
pub trait SortKernel {
    fn sort<K: RadixKey, V: Pod>(&mut self, buffer: &mut DoubleBuffer<'_, K, V>) -> DeviceStatus;

    /// Blocks until all work queued on the device has completed.
    fn synchronize(&mut self) -> DeviceStatus {
        DeviceStatus::SUCCESS
    }

    /// Human-readable error domain attached to failing statuses.
    fn category(&self) -> &'static str {
        "device"
    }
}
