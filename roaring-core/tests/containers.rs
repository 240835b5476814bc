use std::collections::BTreeSet;
use std::ops::Range;

use proptest::prelude::*;
use roaring_core::container::{
    ArrayContainer, BitmapContainer, Container, ContainerKind, ContainerOps, Interval,
    PeekableIterator, RelativeRangeConsumer, RunContainer,
};

/// Records every reported position, marking each one present or absent
#[derive(Default)]
struct Coverage {
    positions: Vec<(u32, bool)>,
}

impl RelativeRangeConsumer for Coverage {
    fn accept_present(&mut self, pos: u32) {
        self.positions.push((pos, true));
    }

    fn accept_absent(&mut self, pos: u32) {
        self.positions.push((pos, false));
    }

    fn accept_all_present(&mut self, from: u32, to: u32) {
        self.positions.extend((from..to).map(|pos| (pos, true)));
    }

    fn accept_all_absent(&mut self, from: u32, to: u32) {
        self.positions.extend((from..to).map(|pos| (pos, false)));
    }
}

fn encodings(values: &BTreeSet<u16>) -> [Container; 3] {
    let mut array = ArrayContainer::new();
    let mut bitmap = BitmapContainer::new();
    let mut run = RunContainer::new();
    for &value in values {
        array.add(value);
        bitmap.add(value);
        run.add(value);
    }
    [
        Container::Array(array),
        Container::Bitmap(bitmap),
        Container::Run(run),
    ]
}

fn drain_batches(container: &Container, key: u32, size: usize) -> Vec<u32> {
    let mut batches = container.batch_iter();
    let mut buf = vec![0u32; size];
    let mut values = Vec::new();
    loop {
        let n = batches.next_batch(key, &mut buf);
        if n == 0 {
            break;
        }
        values.extend_from_slice(&buf[..n]);
    }
    values
}

fn value_set() -> impl Strategy<Value = BTreeSet<u16>> {
    prop_oneof![
        prop::collection::btree_set(any::<u16>(), 0..200),
        prop::collection::btree_set(any::<u16>(), 4000..6000),
        prop::collection::vec((any::<u16>(), 1u16..400), 0..20).prop_map(|runs| {
            runs.into_iter()
                .flat_map(|(start, len)| start..start.saturating_add(len))
                .collect()
        }),
    ]
}

#[test]
fn range_then_remove_batches_under_key() {
    let mut container = Container::new();
    container.add_range(0..5000);
    container.remove(2500);
    assert_eq!(container.cardinality(), 4999);
    assert!(!container.contains(2500));

    let key = 0x0001_0000;
    let mut batches = container.batch_iter();
    let mut buf = [0u32; 1000];
    let mut counts = Vec::new();
    let mut values = Vec::new();
    loop {
        let n = batches.next_batch(key, &mut buf);
        if n == 0 {
            break;
        }
        counts.push(n);
        values.extend_from_slice(&buf[..n]);
    }
    assert_eq!(counts, [1000, 1000, 1000, 1000, 999]);
    let expected: Vec<u32> = (0x0001_0000..0x0001_1388)
        .filter(|&v| v != 0x0001_09C4)
        .collect();
    assert_eq!(values, expected);
}

#[test]
fn adjacent_runs_canonicalize() {
    let run = RunContainer::from_ranges([10..20, 20..30]);
    assert_eq!(run.runs(), &[Interval::new(10, 29)]);

    let mut merged = RunContainer::from_ranges([10..20]);
    merged.add_range(20..30);
    assert_eq!(merged.runs(), &[Interval::new(10, 29)]);

    let mut container = Container::Run(RunContainer::from_ranges([20..30]));
    container.or_inplace(&Container::Run(RunContainer::from_ranges([10..20])));
    container = container.into_kind(ContainerKind::Run);
    assert_eq!(container.number_of_runs(), 1);
    assert_eq!(container.cardinality(), 20);
}

#[test]
fn exhausted_iterators_return_none() {
    let container: Container = [7u16].into_iter().collect();
    let mut iter = container.iter();
    assert_eq!(iter.next(), Some(7));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next(), None);
    assert_eq!(iter.peek_next(), None);
    assert!(!iter.has_next());
}

proptest! {
    #[test]
    fn encodings_are_equivalent(values in value_set()) {
        let expected: Vec<u16> = values.iter().copied().collect();
        for container in encodings(&values) {
            prop_assert_eq!(container.cardinality() as usize, expected.len());
            prop_assert_eq!(container.iter().collect::<Vec<_>>(), expected.clone());
        }
    }

    #[test]
    fn batches_match_single_values(values in value_set(), key in any::<u16>()) {
        let base = u32::from(key) << 16;
        for container in encodings(&values) {
            let single: Vec<u32> = container.iter().map(|v| base | u32::from(v)).collect();
            for size in [1, 7, 65536] {
                prop_assert_eq!(drain_batches(&container, base, size), single.clone());
            }
        }
    }

    #[test]
    fn range_consumption_covers_range(
        values in value_set(),
        a in 0u32..=65536,
        b in 0u32..=65536,
    ) {
        let Range { start, end } = a.min(b)..a.max(b);
        for container in encodings(&values) {
            let mut coverage = Coverage::default();
            container.for_all_in_range(start, end, &mut coverage);
            let positions: Vec<u32> = coverage.positions.iter().map(|&(pos, _)| pos).collect();
            let expected: Vec<u32> = (0..end - start).collect();
            prop_assert_eq!(positions, expected);
            for &(pos, present) in &coverage.positions {
                prop_assert_eq!(present, values.contains(&((start + pos) as u16)));
            }
        }
    }

    #[test]
    fn advance_if_needed_finds_next_present(
        values in value_set(),
        targets in prop::collection::vec(any::<u16>(), 1..10),
    ) {
        for container in encodings(&values) {
            let mut iter = container.iter();
            for &target in &targets {
                let before = iter.peek_next();
                iter.advance_if_needed(target);
                match before {
                    Some(peek) if peek >= target => prop_assert_eq!(iter.peek_next(), Some(peek)),
                    Some(_) => {
                        let expected = values.range(target..).next().copied();
                        prop_assert_eq!(iter.peek_next(), expected);
                    }
                    None => prop_assert_eq!(iter.peek_next(), None),
                }
            }
        }
    }

    #[test]
    fn conversions_preserve_values(values in value_set()) {
        let expected: Vec<u16> = values.iter().copied().collect();
        let cycles = [
            [ContainerKind::Bitmap, ContainerKind::Array, ContainerKind::Run],
            [ContainerKind::Run, ContainerKind::Bitmap, ContainerKind::Array],
        ];
        for container in encodings(&values) {
            for cycle in cycles {
                let mut current = container.clone();
                for kind in cycle {
                    current = current.into_kind(kind);
                    prop_assert_eq!(current.kind(), kind);
                    prop_assert_eq!(current.cardinality() as usize, expected.len());
                    prop_assert_eq!(current.iter().collect::<Vec<_>>(), expected.clone());
                }
            }
        }
    }

    #[test]
    fn neighbours_and_reverse_agree_across_encodings(
        values in value_set(),
        points in prop::collection::vec(any::<u16>(), 1..10),
    ) {
        let descending: Vec<u16> = values.iter().rev().copied().collect();
        for container in encodings(&values) {
            prop_assert_eq!(container.reverse_iter().collect::<Vec<_>>(), descending.clone());
            for &point in &points {
                let next = values.range(point..).next().copied();
                let previous = values.range(..=point).next_back().copied();
                let next_absent = (point..=u16::MAX).find(|v| !values.contains(v));
                let previous_absent = (0..=point).rev().find(|v| !values.contains(v));
                prop_assert_eq!(container.next_value(point), next);
                prop_assert_eq!(container.previous_value(point), previous);
                prop_assert_eq!(container.next_absent_value(point), next_absent);
                prop_assert_eq!(container.previous_absent_value(point), previous_absent);
            }
        }
    }

    #[test]
    fn flip_and_intersection_size_agree_across_encodings(
        left in value_set(),
        right in value_set(),
        a in 0u32..=65536,
        b in 0u32..=65536,
    ) {
        let range = a.min(b)..a.max(b);
        let flipped: Vec<u16> = (0..=u16::MAX)
            .filter(|&v| left.contains(&v) != range.contains(&u32::from(v)))
            .collect();
        let shared = left.intersection(&right).count() as u32;
        for l in encodings(&left) {
            let not = l.not(range.clone());
            prop_assert_eq!(not.cardinality() as usize, flipped.len());
            prop_assert_eq!(not.iter().collect::<Vec<_>>(), flipped.clone());
            for r in encodings(&right) {
                prop_assert_eq!(l.and_cardinality(&r), shared);
            }
        }
    }
}
