#![no_main]

use crate::arbitrary_ops::*;
use bitvec::prelude::*;
use libfuzzer_sys::arbitrary;
use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use roaring_core::container::{PeekableIterator, RelativeRangeConsumer};
use roaring_core::{Bitmap, Portable};

mod arbitrary_ops;

fuzz_target!(|input: FuzzInput| {
    let mut lhs = Bitmap::new();
    let mut rhs = Bitmap::new();

    let mut lhs_check = bitvec![0; MAX_NUM as usize];
    let mut rhs_check = bitvec![0; MAX_NUM as usize];

    for op in input.lhs_ops {
        op.on_roaring(&mut lhs);
        op.on_bitvec(&mut lhs_check);
        check_equal(&lhs, &lhs_check);
    }
    for op in input.rhs_ops {
        op.on_roaring(&mut rhs);
        op.on_bitvec(&mut rhs_check);
        check_equal(&rhs, &rhs_check);
    }

    for op in &input.comp_ops {
        op.on_roaring(&mut lhs, &rhs);
        op.on_bitvec(&mut lhs_check, &rhs);
        check_equal(&lhs, &lhs_check);
    }

    for op in &input.view_ops {
        op.on_both(&rhs, &rhs_check);
        op.on_both(&lhs, &lhs_check);
    }
});

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    lhs_ops: Vec<MutableBitmapOperation>,
    rhs_ops: Vec<MutableBitmapOperation>,
    comp_ops: Vec<BitmapCompOperation>,
    view_ops: Vec<ReadBitmapOp>,
}

/// Marks reported positions in a dense copy of the queried range
struct Marks {
    seen: BitVec,
    present: BitVec,
}

impl Marks {
    fn mark(&mut self, pos: u32, present: bool) {
        let pos = pos as usize;
        assert!(!self.seen[pos], "position {pos} reported twice");
        self.seen.set(pos, true);
        self.present.set(pos, present);
    }
}

impl RelativeRangeConsumer for Marks {
    fn accept_present(&mut self, pos: u32) {
        self.mark(pos, true);
    }

    fn accept_absent(&mut self, pos: u32) {
        self.mark(pos, false);
    }
}

impl ReadBitmapOp {
    fn on_both(&self, b: &Bitmap, v: &BitSlice) {
        match *self {
            ReadBitmapOp::ContainsRange(ref r) => {
                assert_eq!(
                    v[r.start().0 as usize..=r.end().0 as usize].all(),
                    b.contains_range(r.start().0..=r.end().0)
                );
            }
            ReadBitmapOp::Contains(i) => {
                assert_eq!(v[i.0 as usize], b.contains(i.0));
            }
            ReadBitmapOp::RangeCardinality(ref r) => {
                assert_eq!(
                    v[r.start().0 as usize..=r.end().0 as usize].count_ones() as u64,
                    b.range_cardinality(r.start().0..=r.end().0)
                );
            }
            ReadBitmapOp::Cardinality => {
                assert_eq!(v.count_ones() as u64, b.cardinality());
            }
            ReadBitmapOp::ToVec => {
                let vec_iter = b.to_vec();
                assert!(vec_iter.into_iter().eq(v.iter_ones().map(|i| i as u32)));
            }
            ReadBitmapOp::GetPortableSerializedSizeInBytes => {
                let size = b.get_serialized_size_in_bytes::<Portable>();
                let serialized = b.serialize::<Portable>().unwrap();
                assert_eq!(size, serialized.len());
                assert_eq!(Bitmap::try_deserialize::<Portable>(&serialized).unwrap(), *b);
            }
            ReadBitmapOp::IsEmpty => {
                assert_eq!(v.not_any(), b.is_empty());
            }
            ReadBitmapOp::Minimum => {
                assert_eq!(v.first_one().map(|i| i as u32), b.minimum());
            }
            ReadBitmapOp::Maximum => {
                assert_eq!(v.last_one().map(|i| i as u32), b.maximum());
            }
            ReadBitmapOp::Rank(i) => {
                assert_eq!(
                    v.iter_ones().take_while(|&n| n <= i.0 as usize).count() as u64,
                    b.rank(i.0),
                );
            }
            ReadBitmapOp::Select(i) => {
                assert_eq!(
                    v.iter_ones().nth(i.0 as usize).map(|n| n as u32),
                    b.select(i.0),
                );
            }
            ReadBitmapOp::ForAllInRange { start, length } => {
                let length = length % (2 * MAX_NUM);
                let mut marks = Marks {
                    seen: bitvec![0; length as usize],
                    present: bitvec![0; length as usize],
                };
                b.for_all_in_range(start.0, length, &mut marks);
                assert!(marks.seen.all());
                for pos in 0..length as usize {
                    let value = start.0 as usize + pos;
                    let expected = value < v.len() && v[value];
                    assert_eq!(marks.present[pos], expected, "position {pos}");
                }
            }
            ReadBitmapOp::BatchIter(size) => {
                let mut buf = vec![0; usize::from(size).max(1)];
                let mut batches = b.batch_iter();
                let mut values = Vec::new();
                loop {
                    let n = batches.next_batch(&mut buf);
                    if n == 0 {
                        break;
                    }
                    values.extend_from_slice(&buf[..n]);
                }
                assert!(values.into_iter().eq(v.iter_ones().map(|i| i as u32)));
            }
            ReadBitmapOp::NextValue(i) => {
                let expected = v[i.0 as usize..].first_one().map(|n| n as u32 + i.0);
                assert_eq!(b.next_value(i.0), expected);
            }
            ReadBitmapOp::PreviousValue(i) => {
                let expected = v[..=i.0 as usize].last_one().map(|n| n as u32);
                assert_eq!(b.previous_value(i.0), expected);
            }
            ReadBitmapOp::NextAbsentValue(i) => {
                let expected = v[i.0 as usize..]
                    .first_zero()
                    .map_or(MAX_NUM, |n| n as u32 + i.0);
                assert_eq!(b.next_absent_value(i.0), Some(expected));
            }
            ReadBitmapOp::PreviousAbsentValue(i) => {
                let expected = v[..=i.0 as usize].last_zero().map(|n| n as u32);
                assert_eq!(b.previous_absent_value(i.0), expected);
            }
            ReadBitmapOp::ReverseIter => {
                assert!(b.reverse_iter().eq(v.iter_ones().rev().map(|i| i as u32)));
            }
            ReadBitmapOp::Clone => {
                assert_eq!(b.clone(), *b);
            }
            ReadBitmapOp::Debug => {
                use std::io::Write;
                write!(std::io::sink(), "{:?}", b).unwrap();
            }
            ReadBitmapOp::WithIter(ref iter_ops) => {
                let mut iter = b.iter();
                for op in iter_ops {
                    match *op {
                        IterOperation::ResetAtOrAfter(i) => {
                            iter.reset_at_or_after(i);
                            let expected = v.iter_ones().map(|n| n as u32).find(|&n| n >= i);
                            assert_eq!(iter.peek_next(), expected);
                        }
                        IterOperation::AdvanceIfNeeded(i) => {
                            let before = iter.peek_next();
                            iter.advance_if_needed(i);
                            match before {
                                Some(peek) if peek < i => {
                                    let expected =
                                        v.iter_ones().map(|n| n as u32).find(|&n| n >= i);
                                    assert_eq!(iter.peek_next(), expected);
                                }
                                _ => assert_eq!(iter.peek_next(), before),
                            }
                        }
                        IterOperation::ReadNext => {
                            let peek = iter.peek_next();
                            assert_eq!(iter.next(), peek);
                        }
                        IterOperation::NextMany(n) => {
                            let mut v = vec![0; n as usize];
                            assert!(iter.next_many(&mut v) <= n as usize);
                        }
                    }
                }
            }
        }
    }
}

impl MutableBitmapOperation {
    fn on_bitvec(&self, b: &mut BitSlice) {
        match *self {
            MutableBitmapOperation::Add(i) | MutableBitmapOperation::AddChecked(i) => {
                b.set(i.0 as usize, true);
            }
            MutableBitmapOperation::AddMany(ref items) => {
                for i in items {
                    b.set(i.0 as usize, true);
                }
            }
            MutableBitmapOperation::AddRange(ref r) => {
                if r.start() <= r.end() {
                    b[r.start().0 as usize..=r.end().0 as usize].fill(true);
                }
            }
            MutableBitmapOperation::RemoveRange(ref r) => {
                if r.start() <= r.end() {
                    b[r.start().0 as usize..=r.end().0 as usize].fill(false);
                }
            }
            MutableBitmapOperation::Flip(ref r) => {
                if r.start() <= r.end() {
                    let flipped = !b[r.start().0 as usize..=r.end().0 as usize].to_bitvec();
                    b[r.start().0 as usize..=r.end().0 as usize].copy_from_bitslice(&flipped);
                }
            }
            MutableBitmapOperation::Clear => {
                b.fill(false);
            }
            MutableBitmapOperation::Remove(i) | MutableBitmapOperation::RemoveChecked(i) => {
                b.set(i.0 as usize, false);
            }
            MutableBitmapOperation::ShrinkToFit
            | MutableBitmapOperation::RunOptimize
            | MutableBitmapOperation::RemoveRunCompression => {}
            MutableBitmapOperation::MakeBitmap { key } => {
                if key < (MAX_NUM / 0x1_0000) as u16 {
                    let key = usize::from(key);
                    let start = key * 0x1_0000;
                    let end = start + 9 * 1024;
                    for i in (start..end).step_by(2) {
                        b.set(i, true);
                    }
                }
            }
            MutableBitmapOperation::MakeRange { key } => {
                if key < (MAX_NUM / 0x1_0000) as u16 {
                    let key = usize::from(key);
                    let start = key * 0x1_0000;
                    let end = start + 0x0_FFFF;
                    b[start..=end].fill(true);
                }
            }
        }
    }
}

impl BitmapCompOperation {
    fn on_bitvec(&self, lhs: &mut BitSlice, rhs: &Bitmap) {
        match *self {
            BitmapCompOperation::Eq
            | BitmapCompOperation::IsSubset
            | BitmapCompOperation::Intersect
            | BitmapCompOperation::AndCardinality => {}
            BitmapCompOperation::And => {
                let tmp = to_bitvec(rhs, lhs.len());
                *lhs &= &tmp;
            }
            BitmapCompOperation::Or | BitmapCompOperation::LazyOr => {
                for i in rhs.iter() {
                    let i = i as usize;
                    if i >= lhs.len() {
                        break;
                    }
                    lhs.set(i, true);
                }
            }
            BitmapCompOperation::Xor => {
                for i in rhs.iter() {
                    let i = i as usize;
                    if i >= lhs.len() {
                        break;
                    }
                    let old_val = lhs[i];
                    lhs.set(i, !old_val);
                }
            }
            BitmapCompOperation::AndNot => {
                for i in rhs.iter() {
                    let i = i as usize;
                    if i >= lhs.len() {
                        break;
                    }
                    lhs.set(i, false);
                }
            }
        }
    }
}

fn to_bitvec(b: &Bitmap, max: usize) -> BitVec {
    let mut res = bitvec![0; max];
    for i in b.iter() {
        let i = i as usize;
        if i >= max {
            break;
        }
        res.set(i, true);
    }
    res
}

fn check_equal(b: &Bitmap, v: &BitSlice) {
    let lhs = b.iter().take_while(|&i| i < v.len() as u32);
    let rhs = v.iter_ones().map(|i| i as u32);

    assert!(lhs.eq(rhs), "{b:?}")
}
