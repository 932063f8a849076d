mod common;

use common::reference_sort_by_key;
use duosort::prelude::*;
use duosort::{Strided, ValueStrategy, value_strategy};
use rand::Rng;
use std::collections::VecDeque;

#[test]
fn test_basic_sort_keys() {
    let mut keys = vec![5u32, 3, 9, 1, 7];
    stable_radix_sort(&mut HostRadixKernel::new(), &mut keys, &SortConfig::default()).unwrap();
    assert_eq!(keys, vec![1, 3, 5, 7, 9]);
}

#[test]
fn test_duplicate_keys_keep_value_order() {
    let mut keys = vec![5u32, 3, 3, 1];
    let mut values = vec!["e", "c1", "c2", "a"];

    RadixSorter::host().sort_by_key(&mut keys, &mut values).unwrap();

    assert_eq!(keys, vec![1, 3, 3, 5]);
    assert_eq!(values, vec!["a", "c1", "c2", "e"]);
}

#[test]
fn test_zero_length() {
    let mut kernel = common::ScriptedKernel::flipping(1);
    let config = SortConfig::default().with_temp_bytes_limit(0);

    let mut keys: Vec<u64> = vec![];
    let mut values: Vec<String> = vec![];
    stable_radix_sort(&mut kernel, &mut keys, &config).unwrap();
    stable_radix_sort_by_key(&mut kernel, &mut keys, &mut values, &config).unwrap();

    assert!(keys.is_empty());
    assert!(values.is_empty());
    // Nothing reached the kernel, nothing was allocated.
    assert_eq!(kernel.calls, 0);
}

#[test]
fn test_single_element() {
    let mut keys = [42i16];
    let mut values = [String::from("only")];
    RadixSorter::host().sort_by_key(&mut keys, &mut values[..]).unwrap();
    assert_eq!(keys, [42]);
    assert_eq!(values, ["only"]);
}

#[test]
fn test_all_duplicates() {
    let mut keys = vec![7u64; 500];
    let mut values: Vec<u32> = (0..500).collect();
    RadixSorter::host().sort_by_key(&mut keys, &mut values).unwrap();
    assert!(keys.iter().all(|&k| k == 7));
    assert_eq!(values, (0..500).collect::<Vec<u32>>());
}

#[test]
fn test_signed_keys() {
    let mut keys = vec![3i32, -1, i32::MIN, 0, i32::MAX, -200, 5];
    RadixSorter::host().sort(&mut keys).unwrap();
    assert_eq!(keys, vec![i32::MIN, -200, -1, 0, 3, 5, i32::MAX]);
}

#[test]
fn test_float_keys_follow_total_order() {
    let mut keys = vec![2.5f64, -0.0, 0.0, -3.25, f64::INFINITY, 1e-300, f64::NEG_INFINITY];
    let mut expected = keys.clone();
    expected.sort_by(f64::total_cmp);

    RadixSorter::host().sort(&mut keys).unwrap();

    let bits: Vec<u64> = keys.iter().map(|k| k.to_bits()).collect();
    let expected_bits: Vec<u64> = expected.iter().map(|k| k.to_bits()).collect();
    assert_eq!(bits, expected_bits);
}

#[test]
fn test_length_mismatch() {
    let mut keys = vec![1u8, 2, 3];
    let mut values = vec![1.0f32, 2.0];
    let err = RadixSorter::host()
        .sort_by_key(&mut keys, &mut values)
        .unwrap_err();
    assert_eq!(err, SortError::LengthMismatch { keys: 3, values: 2 });
    assert_eq!(keys, vec![1, 2, 3]);
}

#[test]
fn test_strategy_selection() {
    let config = SortConfig::default();
    assert_eq!(value_strategy::<[u8]>(&config), ValueStrategy::Direct);
    assert_eq!(value_strategy::<Vec<i64>>(&config), ValueStrategy::Direct);
    assert_eq!(value_strategy::<[f64]>(&config), ValueStrategy::Direct);
    assert_eq!(value_strategy::<[u128]>(&config), ValueStrategy::Indirect);
    assert_eq!(value_strategy::<[bool]>(&config), ValueStrategy::Indirect);
    assert_eq!(value_strategy::<Vec<(u8, u8)>>(&config), ValueStrategy::Indirect);
    assert_eq!(value_strategy::<VecDeque<u32>>(&config), ValueStrategy::Indirect);
    assert_eq!(value_strategy::<Strided<'static, u32>>(&config), ValueStrategy::Indirect);

    let wide = SortConfig::default().with_direct_value_max_bytes(16);
    assert_eq!(value_strategy::<[u128]>(&wide), ValueStrategy::Direct);

    let narrow = SortConfig::default().with_direct_value_max_bytes(2);
    assert_eq!(value_strategy::<[u32]>(&narrow), ValueStrategy::Indirect);
    assert_eq!(value_strategy::<[u16]>(&narrow), ValueStrategy::Direct);
}

#[test]
fn test_wide_values_direct_when_configured() {
    let mut keys = vec![3u16, 1, 2, 1];
    let mut values = vec![u128::MAX, 10, 20, 11];
    let mut sorter = RadixSorter::with_config(
        HostRadixKernel::new(),
        SortConfig::default().with_direct_value_max_bytes(16),
    );
    sorter.sort_by_key(&mut keys, &mut values).unwrap();
    assert_eq!(keys, vec![1, 1, 2, 3]);
    assert_eq!(values, vec![10, 11, 20, u128::MAX]);
}

#[test]
fn test_float_values_move_bit_exact() {
    let mut keys = vec![2u32, 0, 1];
    let mut values = vec![f32::NAN, -0.0, 1.5];
    RadixSorter::host().sort_by_key(&mut keys, &mut values).unwrap();
    assert_eq!(keys, vec![0, 1, 2]);
    assert_eq!(values[0].to_bits(), (-0.0f32).to_bits());
    assert_eq!(values[1], 1.5);
    assert!(values[2].is_nan());
}

#[test]
fn test_vecdeque_values() {
    let mut keys = vec![30u32, 10, 20, 10];
    let mut values: VecDeque<u32> = VecDeque::with_capacity(4);
    // Force the ring buffer to wrap.
    values.push_back(0);
    values.push_back(0);
    values.pop_front();
    values.pop_front();
    values.extend([300, 100, 200, 101]);

    RadixSorter::host().sort_by_key(&mut keys, &mut values).unwrap();

    assert_eq!(keys, vec![10, 10, 20, 30]);
    assert_eq!(values, [100, 101, 200, 300]);
}

#[test]
fn test_strided_values() {
    // Interleaved (tag, payload) records; sort the payload column by key.
    let mut records = [0u32, 30, 1, 10, 2, 20];
    let mut keys = [3u8, 1, 2];

    let mut payloads = Strided::new(&mut records, 1, 2);
    RadixSorter::host().sort_by_key(&mut keys, &mut payloads).unwrap();

    assert_eq!(keys, [1, 2, 3]);
    assert_eq!(records, [0, 10, 1, 20, 2, 30]);
}

#[derive(Clone, Debug, PartialEq)]
struct Record {
    name: String,
    score: f64,
}

duosort::indirect_value!(Record);

#[test]
fn test_custom_value_type() {
    let mut keys = vec![2u64, 1, 2, 0];
    let mut values: Vec<Record> = ["b", "a", "c", "z"]
        .iter()
        .enumerate()
        .map(|(i, name)| Record {
            name: name.to_string(),
            score: i as f64,
        })
        .collect();

    RadixSorter::host().sort_by_key(&mut keys, &mut values).unwrap();

    let names: Vec<&str> = values.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(keys, vec![0, 1, 2, 2]);
    assert_eq!(names, vec!["z", "a", "b", "c"]);
    assert_eq!(values[2].score, 0.0);
}

#[test]
fn test_direct_and_indirect_agree() {
    let mut rng = rand::rng();
    let keys: Vec<u32> = (0..5_000).map(|_| rng.random_range(0..64)).collect();
    let values: Vec<i64> = (0..5_000).map(|_| rng.random()).collect();
    let config = SortConfig::default();

    let (mut direct_keys, mut direct_values) = (keys.clone(), values.clone());
    stable_radix_sort_by_key_direct(
        &mut HostRadixKernel::new(),
        &mut direct_keys,
        &mut direct_values,
        &config,
    )
    .unwrap();

    let (mut indirect_keys, mut indirect_values) = (keys.clone(), values.clone());
    stable_radix_sort_by_key_indirect(
        &mut HostRadixKernel::new(),
        &mut indirect_keys,
        &mut indirect_values,
        &config,
    )
    .unwrap();

    assert_eq!(direct_keys, indirect_keys);
    assert_eq!(direct_values, indirect_values);
    assert_eq!((direct_keys, direct_values), reference_sort_by_key(&keys, &values));
}

#[test]
fn test_fuzz_random_keys() {
    let mut rng = rand::rng();

    for _ in 0..200 {
        let len = rng.random_range(0..2_000);
        let mut keys: Vec<u64> = (0..len).map(|_| rng.random()).collect();
        let mut expected = keys.clone();
        expected.sort();

        RadixSorter::host().sort(&mut keys).unwrap();
        assert_eq!(keys, expected);
    }
}

#[test]
fn test_fuzz_random_pairs() {
    let mut rng = rand::rng();
    let mut sorter = RadixSorter::host();

    for _ in 0..200 {
        let len = rng.random_range(0..1_000);
        let keys: Vec<i16> = (0..len).map(|_| rng.random_range(-50..50)).collect();
        let values: Vec<String> = (0..len).map(|i| format!("v{i}")).collect();

        let (mut actual_keys, mut actual_values) = (keys.clone(), values.clone());
        sorter.sort_by_key(&mut actual_keys, &mut actual_values).unwrap();

        let (expected_keys, expected_values) = reference_sort_by_key(&keys, &values);
        assert_eq!(actual_keys, expected_keys);
        assert_eq!(actual_values, expected_values);
    }
}
