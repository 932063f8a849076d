#![allow(dead_code)]

use bytemuck::Pod;
use duosort::buffer::{is_aligned, pair_alignment};
use duosort::core::{DeviceStatus, DoubleBuffer, RadixKey, Slots, SortKernel};
use duosort::{AlignedBuffer, SortConfig};
use std::marker::PhantomData;

/// Kernel double with scripted behaviour.
///
/// Sorts the current slot with a stable reference sort, then moves the
/// result to the other slot `flips` times, flipping the selector each time.
/// Whatever slot is left inactive afterwards is overwritten with `0xA5`
/// bytes so a driver reading the wrong slot gets garbage.
#[derive(Debug, Default)]
pub struct ScriptedKernel {
    pub flips: usize,
    pub sort_status: i32,
    pub sync_status: i32,
    pub calls: usize,
    pub syncs: usize,
    pub misaligned_slots: usize,
}

impl ScriptedKernel {
    pub fn flipping(flips: usize) -> Self {
        Self {
            flips,
            ..Self::default()
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            sort_status: code,
            ..Self::default()
        }
    }

    pub fn failing_sync(code: i32) -> Self {
        Self {
            sync_status: code,
            ..Self::default()
        }
    }
}

impl SortKernel for ScriptedKernel {
    fn sort<K: RadixKey, V: Pod>(&mut self, buffer: &mut DoubleBuffer<'_, K, V>) -> DeviceStatus {
        self.calls += 1;
        self.misaligned_slots += count_misaligned(buffer.slots_mut());

        if self.sort_status != 0 {
            return DeviceStatus(self.sort_status);
        }

        {
            let Slots { keys, values, .. } = buffer.slots_mut();
            let mut order: Vec<usize> = (0..keys.len()).collect();
            order.sort_by_key(|&i| keys[i].radix_bits());

            let sorted_keys: Vec<K> = order.iter().map(|&i| keys[i]).collect();
            keys.copy_from_slice(&sorted_keys);
            if let Some(values) = values {
                let sorted_values: Vec<V> = order.iter().map(|&i| values[i]).collect();
                values.copy_from_slice(&sorted_values);
            }
        }

        for _ in 0..self.flips {
            let Slots {
                keys,
                alternate_keys,
                values,
                alternate_values,
            } = buffer.slots_mut();
            alternate_keys.copy_from_slice(keys);
            if let (Some(src), Some(dst)) = (values, alternate_values) {
                dst.copy_from_slice(src);
            }
            buffer.flip();
        }

        let Slots {
            alternate_keys,
            alternate_values,
            ..
        } = buffer.slots_mut();
        alternate_keys.iter_mut().for_each(poison);
        if let Some(values) = alternate_values {
            values.iter_mut().for_each(poison);
        }

        DeviceStatus::SUCCESS
    }

    fn synchronize(&mut self) -> DeviceStatus {
        self.syncs += 1;
        DeviceStatus(self.sync_status)
    }

    fn category(&self) -> &'static str {
        "scripted"
    }
}

fn count_misaligned<K: Pod, V: Pod>(slots: Slots<'_, K, V>) -> usize {
    let mut misaligned = 0;
    for keys in [&*slots.keys, &*slots.alternate_keys] {
        if !is_aligned(keys, pair_alignment::<K>()) {
            misaligned += 1;
        }
    }
    for values in [slots.values.as_deref(), slots.alternate_values.as_deref()]
        .into_iter()
        .flatten()
    {
        if !is_aligned(values, pair_alignment::<V>()) {
            misaligned += 1;
        }
    }
    misaligned
}

fn poison<T: Pod>(slot: &mut T) {
    bytemuck::bytes_of_mut(slot).fill(0xA5);
}

/// Storage whose first element sits one element past a 32-byte boundary,
/// so it is never aligned to twice the element size.
pub struct Misaligned<T> {
    storage: AlignedBuffer<u128>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> Misaligned<T> {
    pub fn new(data: &[T]) -> Self {
        let per_word = 16 / std::mem::size_of::<T>();
        let words = (data.len() + 1).div_ceil(per_word);
        let storage = AlignedBuffer::<u128>::zeroed(words, &SortConfig::default()).unwrap();
        let mut misaligned = Self {
            storage,
            len: data.len(),
            _marker: PhantomData,
        };
        misaligned.as_mut_slice().copy_from_slice(data);
        assert!(!is_aligned(misaligned.as_slice(), pair_alignment::<T>()));
        misaligned
    }

    pub fn as_slice(&self) -> &[T] {
        &bytemuck::cast_slice::<u128, T>(&self.storage)[1..=self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut bytemuck::cast_slice_mut::<u128, T>(&mut self.storage)[1..=self.len]
    }
}

/// Reference result: keys and values stably sorted by key order.
pub fn reference_sort_by_key<K: RadixKey, V: Clone>(keys: &[K], values: &[V]) -> (Vec<K>, Vec<V>) {
    let mut pairs: Vec<(K, V)> = keys.iter().copied().zip(values.iter().cloned()).collect();
    pairs.sort_by_key(|(k, _)| k.radix_bits());
    pairs.into_iter().unzip()
}
