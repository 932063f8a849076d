//! # Duosort
//!
//! `duosort` is the host-side half of a stable radix sort that runs on an
//! accelerator. The kernel doing the digit passes is an opaque capability
//! behind the [`SortKernel`] trait; this crate prepares its buffers, invokes
//! it, and puts the results where the caller expects them.
//!
//! ## Key Features
//!
//! - **Alignment Guard**: The kernel requires buffers aligned to twice their
//!   element size. Misaligned input is transparently copied into an aligned
//!   [`AlignedBuffer`], sorted there and copied back; aligned input costs no
//!   extra copies.
//! - **Double Buffering**: Each buffer is paired with a scratch buffer in a
//!   [`DoubleBuffer`]. The kernel may finish in either slot; the driver copies
//!   back only when the selector moved.
//! - **Value Strategies**: Small arithmetic values in contiguous storage ride
//!   through the kernel next to the keys. Anything else (strings, records,
//!   [`VecDeque`](std::collections::VecDeque)s, [`Strided`] views) is sorted
//!   through a `u32` index permutation and gathered once afterwards.
//! - **Host Reference Kernel**: [`HostRadixKernel`] implements the kernel
//!   contract on the CPU.
//!
//! ## Usage
//!
//! ### Keys only
//!
//! ```rust
//! use duosort::RadixSorter;
//!
//! let mut sorter = RadixSorter::host();
//! let mut keys = vec![42u64, 7, 19, 7];
//! sorter.sort(&mut keys).unwrap();
//!
//! assert_eq!(keys, vec![7, 7, 19, 42]);
//! ```
//!
//! ### Keys and values
//!
//! ```rust
//! use duosort::prelude::*;
//!
//! let mut keys = vec![5u32, 3, 3, 1];
//! let mut values = vec!["e".to_string(), "c1".into(), "c2".into(), "a".into()];
//!
//! stable_radix_sort_by_key(
//!     &mut HostRadixKernel::new(),
//!     &mut keys,
//!     &mut values,
//!     &SortConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(keys, vec![1, 3, 3, 5]);
//! assert_eq!(values, vec!["a", "c1", "c2", "e"]);
//! ```
//!
//! ### Custom kernels
//!
//! A device backend implements [`SortKernel`]: sort the descriptor's current
//! slot, flip the selector whenever the output moves to the other slot, and
//! report a nonzero [`DeviceStatus`] on failure.
//!
//! ## Memory Overhead
//!
//! - Keys only: one scratch buffer the size of the keys.
//! - Direct values: scratch for keys and values.
//! - Indirect values: a `u32` permutation plus its scratch, and one copy of the values.
//! - Misaligned input: one more copy of the misaligned buffer.

pub mod algo;
pub mod buffer;
pub mod config;
pub mod core;
pub mod error;
pub mod kernel;

pub use algo::{
    RadixSorter, ValueStrategy, stable_radix_sort, stable_radix_sort_by_key,
    stable_radix_sort_by_key_direct, stable_radix_sort_by_key_indirect, value_strategy,
};
pub use buffer::AlignedBuffer;
pub use config::{DIRECT_VALUE_MAX_BYTES, SortConfig};
pub use crate::core::{
    DeviceStatus, DoubleBuffer, Lanes, RadixKey, SortKernel, SortValue, Strided, ValueSequence,
};
pub use error::SortError;
pub use kernel::HostRadixKernel;

pub mod prelude {
    pub use crate::algo::{
        RadixSorter, stable_radix_sort, stable_radix_sort_by_key, stable_radix_sort_by_key_direct,
        stable_radix_sort_by_key_indirect,
    };
    pub use crate::config::SortConfig;
    pub use crate::core::{
        DeviceStatus, DoubleBuffer, RadixKey, SortKernel, SortValue, Strided, ValueSequence,
    };
    pub use crate::error::SortError;
    pub use crate::kernel::HostRadixKernel;
}
