use std::collections::BTreeSet;
use std::u32;

use proptest::prelude::*;
use roaring_core::container::ValueConsumer;
use roaring_core::{Bitmap, Portable};

// borrowed and adapted from https://github.com/Nemo157/roaring-rs/blob/5089f180ca7e17db25f5c58023f4460d973e747f/tests/lib.rs#L7-L37
#[test]
fn smoke1() {
    let mut bitmap = Bitmap::new();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.remove(0);
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.add(1);
    assert!(bitmap.contains(1));
    assert_eq!(bitmap.cardinality(), 1);
    assert!(!bitmap.is_empty());
    bitmap.add(u32::MAX - 2);
    assert!(bitmap.contains(u32::MAX - 2));
    assert_eq!(bitmap.cardinality(), 2);
    bitmap.add(u32::MAX);
    assert!(bitmap.contains(u32::MAX));
    assert_eq!(bitmap.cardinality(), 3);
    bitmap.add(2);
    assert!(bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 4);
    bitmap.remove(2);
    assert!(!bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 3);
    assert!(!bitmap.contains(0));
    assert!(bitmap.contains(1));
    assert!(!bitmap.contains(100));
    assert!(bitmap.contains(u32::MAX - 2));
    assert!(!bitmap.contains(u32::MAX - 1));
    assert!(bitmap.contains(u32::MAX));
    bitmap.clear();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
}

// borrowed and adapted from https://github.com/RoaringBitmap/gocroaring/blob/4a2fc02f79b1c36b904301e7d052f7f0017b6973/gocroaring_test.go#L24-L64
#[test]
fn smoke2() {
    let mut rb1 = Bitmap::new();
    rb1.add(1);
    rb1.add(2);
    rb1.add(3);
    rb1.add(4);
    rb1.add(5);
    rb1.add(100);
    rb1.add(1000);
    rb1.run_optimize();

    let mut rb2 = Bitmap::new();
    rb2.add(3);
    rb2.add(4);
    rb2.add(1000);
    rb2.run_optimize();

    let mut rb3 = Bitmap::new();

    assert_eq!(rb1.cardinality(), 7);
    assert!(rb1.contains(3));

    rb1.and_inplace(&rb2);
    assert_eq!(rb1.to_vec(), [3, 4, 1000]);
    rb3.add(5);
    rb3.or_inplace(&rb1);
    assert_eq!(rb3.to_vec(), [3, 4, 5, 1000]);

    let rb4 = Bitmap::fast_or(&[&rb1, &rb2, &rb3]);
    assert_eq!(rb4, rb3);
    assert_eq!(format!("{:?}", rb4), "Bitmap<[3, 4, 5, 1000]>");
}

#[test]
fn run_optimize_changes_serialized_size_only() {
    let mut initial = Bitmap::new();
    initial.add_range(1..=5);
    initial.add_range(100..2000);
    initial.remove_run_compression();
    let unoptimized = initial.get_serialized_size_in_bytes::<Portable>();

    let mut optimized = initial.clone();
    assert!(optimized.run_optimize());
    assert!(optimized.get_serialized_size_in_bytes::<Portable>() < unoptimized);
    assert_eq!(optimized, initial);

    assert!(optimized.remove_run_compression());
    assert_eq!(optimized.get_serialized_size_in_bytes::<Portable>(), unoptimized);
    assert_eq!(optimized, initial);
}

#[test]
fn ranges_across_chunks() {
    let mut bitmap = Bitmap::new();
    bitmap.add_range(65_000..200_000);
    assert_eq!(bitmap.cardinality(), 135_000);
    assert!(bitmap.contains_range(65_000..200_000));
    assert!(!bitmap.contains_range(64_999..200_000));

    bitmap.remove_range(70_000..=130_000);
    assert_eq!(bitmap.cardinality(), 135_000 - 60_001);
    assert_eq!(bitmap.range_cardinality(..100_000), 5_000);
    assert_eq!(bitmap.rank(69_999), 5_000);
    assert_eq!(bitmap.select(5_000), Some(130_001));
    assert_eq!(bitmap.minimum(), Some(65_000));
    assert_eq!(bitmap.maximum(), Some(199_999));
}

#[test]
fn intersection_with_runs_keeps_every_run() {
    let dense: Bitmap = (0..10_000).collect();
    let mut runs = Bitmap::new();
    runs.add_range(0..20);
    runs.add_range(30..50);
    assert!(runs.run_optimize());

    let expected: Vec<u32> = (0..20).chain(30..50).collect();
    assert_eq!(dense.and(&runs).to_vec(), expected);
    assert_eq!((&runs & &dense).to_vec(), expected);
    assert_eq!(dense.and_cardinality(&runs), 40);

    let mut in_place = dense.clone();
    in_place &= &runs;
    assert_eq!(in_place.to_vec(), expected);
}

#[test]
fn range_consumption_reports_offsets_from_query_start() {
    let mut bitmap = Bitmap::of(&[65_540, 131_075]);
    bitmap.add_range(70_000..70_010);

    let mut positions = Vec::new();
    let mut consumer = ValueConsumer::new(0, |pos| positions.push(pos));
    bitmap.for_all_in_range(65_536, 70_000, &mut consumer);

    let expected: Vec<u32> = [4].into_iter().chain(4_464..4_474).chain([65_539]).collect();
    assert_eq!(positions, expected);
}

/// A bitmap mixing scattered values and ranges, optionally run-optimized, with its
/// expected contents
fn operand() -> impl Strategy<Value = (Bitmap, BTreeSet<u32>)> {
    (
        prop::collection::vec(0u32..200_000, 0..6000),
        prop::collection::vec((0u32..200_000, 0u32..20_000), 0..4),
        any::<bool>(),
    )
        .prop_map(|(values, ranges, optimize)| {
            let mut bitmap = Bitmap::of(&values);
            let mut expected: BTreeSet<u32> = values.into_iter().collect();
            for (start, len) in ranges {
                bitmap.add_range(start..start + len);
                expected.extend(start..start + len);
            }
            if optimize {
                bitmap.run_optimize();
            }
            (bitmap, expected)
        })
}

proptest! {
    #[test]
    fn bitmap_cardinality_roundtrip(
        indices in prop::collection::vec(proptest::num::u32::ANY, 1..3000)
    ) {
        let original = Bitmap::of(&indices);
        let mut a = indices;
        a.sort_unstable();
        a.dedup();
        prop_assert_eq!(a.len(), original.cardinality() as usize);
    }

    #[test]
    fn test_bitmap_serialization_roundtrip(
        indices in prop::collection::vec(0u32..300_000, 1..3000),
        ranges in prop::collection::vec((0u32..300_000, 0u32..70_000), 0..4)
    ) {
        let mut original = Bitmap::of(&indices);
        for (start, len) in ranges {
            original.add_range(start..start + len);
        }
        original.run_optimize();

        let buffer = original.serialize::<Portable>().unwrap();
        prop_assert_eq!(buffer.len(), original.get_serialized_size_in_bytes::<Portable>());

        let deserialized = Bitmap::try_deserialize::<Portable>(&buffer).unwrap();

        prop_assert_eq!(original , deserialized);
    }

    #[test]
    fn set_operations_match_btreeset(
        (a, sa) in operand(),
        (b, sb) in operand(),
    ) {
        prop_assert!(a.and(&b).iter().eq(sa.intersection(&sb).copied()));
        prop_assert!(a.or(&b).iter().eq(sa.union(&sb).copied()));
        prop_assert!(a.xor(&b).iter().eq(sa.symmetric_difference(&sb).copied()));
        prop_assert!(a.andnot(&b).iter().eq(sa.difference(&sb).copied()));
        prop_assert_eq!(a.and_cardinality(&b), sa.intersection(&sb).count() as u64);
        prop_assert_eq!(a.intersect(&b), !sa.is_disjoint(&sb));
        prop_assert_eq!(a.is_subset(&b), sa.is_subset(&sb));

        let mut in_place = a.clone();
        in_place &= &b;
        prop_assert!(in_place.iter().eq(sa.intersection(&sb).copied()));
        let mut in_place = a.clone();
        in_place ^= &b;
        prop_assert!(in_place.iter().eq(sa.symmetric_difference(&sb).copied()));
    }

    #[test]
    fn lazy_batch_matches_or_inplace(
        parts in prop::collection::vec(prop::collection::vec(0u32..150_000, 0..5000), 1..6)
    ) {
        let bitmaps: Vec<Bitmap> = parts.iter().map(|values| Bitmap::of(values)).collect();
        let mut lazy = Bitmap::new();
        lazy.lazy_batch(|batch| {
            for bitmap in &bitmaps {
                batch.or_inplace(bitmap);
            }
        });
        let mut eager = Bitmap::new();
        for bitmap in &bitmaps {
            eager.or_inplace(bitmap);
        }
        prop_assert_eq!(lazy.cardinality(), eager.cardinality());
        prop_assert_eq!(lazy, eager);
    }

    #[test]
    fn flip_and_neighbours_match_btreeset(
        (bitmap, expected) in operand(),
        start in 0u32..250_000,
        len in 0u32..100_000,
        points in prop::collection::vec(0u32..250_000, 1..20),
    ) {
        let mut flipped_expected = expected.clone();
        for value in start..start + len {
            if !flipped_expected.remove(&value) {
                flipped_expected.insert(value);
            }
        }
        let flipped = bitmap.flip(start..start + len);
        prop_assert_eq!(flipped.cardinality(), flipped_expected.len() as u64);
        prop_assert!(flipped.iter().eq(flipped_expected.iter().copied()));

        prop_assert!(bitmap.reverse_iter().eq(expected.iter().rev().copied()));
        for point in points {
            let next = expected.range(point..).next().copied();
            let previous = expected.range(..=point).next_back().copied();
            let next_absent = (point..).find(|v| !expected.contains(v));
            let previous_absent = (0..=point).rev().find(|v| !expected.contains(v));
            prop_assert_eq!(bitmap.next_value(point), next);
            prop_assert_eq!(bitmap.previous_value(point), previous);
            prop_assert_eq!(bitmap.next_absent_value(point), next_absent);
            prop_assert_eq!(bitmap.previous_absent_value(point), previous_absent);
        }
    }
}
