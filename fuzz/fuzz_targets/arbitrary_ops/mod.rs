use libfuzzer_sys::arbitrary::{self, Arbitrary, Unstructured};
use roaring_core::Bitmap;
use std::ops::RangeInclusive;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Num(pub u32);

pub const MAX_NUM: u32 = 0x1_0000 * 4;

impl<'a> Arbitrary<'a> for Num {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self(u.int_in_range(0..=(MAX_NUM - 1))?))
    }
}

#[derive(Arbitrary, Debug)]
pub enum MutableBitmapOperation {
    Add(Num),
    AddChecked(Num),
    AddMany(Vec<Num>),
    AddRange(RangeInclusive<Num>),
    RemoveRange(RangeInclusive<Num>),
    Flip(RangeInclusive<Num>),
    Clear,
    Remove(Num),
    RemoveChecked(Num),
    ShrinkToFit,
    RunOptimize,
    RemoveRunCompression,
    // Probably turn it into a bitmap
    MakeBitmap { key: u16 },
    MakeRange { key: u16 },
}

#[derive(Arbitrary, Debug)]
pub enum ReadBitmapOp {
    ContainsRange(RangeInclusive<Num>),
    Contains(Num),
    RangeCardinality(RangeInclusive<Num>),
    Cardinality,
    ToVec,
    GetPortableSerializedSizeInBytes,
    IsEmpty,
    Minimum,
    Maximum,
    Rank(Num),
    Select(Num),
    ForAllInRange { start: Num, length: u32 },
    BatchIter(u16),
    NextValue(Num),
    PreviousValue(Num),
    NextAbsentValue(Num),
    PreviousAbsentValue(Num),
    ReverseIter,
    Clone,
    Debug,
    WithIter(Vec<IterOperation>),
}

#[derive(Arbitrary, Debug)]
pub enum BitmapCompOperation {
    Eq,
    IsSubset,
    Intersect,
    AndCardinality,
    And,
    Or,
    LazyOr,
    Xor,
    AndNot,
}

#[derive(Arbitrary, Debug)]
pub enum IterOperation {
    ResetAtOrAfter(u32),
    AdvanceIfNeeded(u32),
    ReadNext,
    NextMany(u16),
}

impl MutableBitmapOperation {
    pub fn on_roaring(&self, b: &mut Bitmap) {
        match *self {
            MutableBitmapOperation::Add(i) => {
                b.add(i.0);
            }
            MutableBitmapOperation::AddChecked(i) => {
                b.add_checked(i.0);
            }
            MutableBitmapOperation::AddMany(ref items) => {
                let items: Vec<u32> = items.iter().map(|n| n.0).collect();
                b.add_many(&items);
            }
            MutableBitmapOperation::AddRange(ref r) => {
                b.add_range(r.start().0..=r.end().0);
            }
            MutableBitmapOperation::RemoveRange(ref r) => {
                b.remove_range(r.start().0..=r.end().0);
            }
            MutableBitmapOperation::Flip(ref r) => {
                b.flip_inplace(r.start().0..=r.end().0);
            }
            MutableBitmapOperation::Clear => {
                b.clear();
            }
            MutableBitmapOperation::Remove(i) => {
                b.remove(i.0);
            }
            MutableBitmapOperation::RemoveChecked(i) => {
                b.remove_checked(i.0);
            }
            MutableBitmapOperation::ShrinkToFit => {
                b.shrink_to_fit();
            }
            MutableBitmapOperation::RunOptimize => {
                b.run_optimize();
            }
            MutableBitmapOperation::RemoveRunCompression => {
                b.remove_run_compression();
            }
            MutableBitmapOperation::MakeBitmap { key } => {
                let key = u32::from(key);
                let start = key * 0x1_0000;
                let end = start + 9 * 1024;
                for i in (start..end).step_by(2) {
                    b.add(i);
                }
            }
            MutableBitmapOperation::MakeRange { key } => {
                let key = u32::from(key);
                let start = key * 0x1_0000;
                let end = start + 0x0_FFFF;
                b.add_range(start..=end)
            }
        }
        b.remove_range(MAX_NUM..);
    }
}

impl BitmapCompOperation {
    pub fn on_roaring(&self, lhs: &mut Bitmap, rhs: &Bitmap) {
        match *self {
            BitmapCompOperation::Eq => {
                drop(lhs == rhs);
                assert_eq!(lhs, lhs);
            }
            BitmapCompOperation::IsSubset => {
                lhs.is_subset(rhs);
                assert!(lhs.is_subset(lhs));
            }
            BitmapCompOperation::Intersect => {
                lhs.intersect(rhs);
                assert!(lhs.is_empty() || lhs.intersect(lhs));
            }
            BitmapCompOperation::AndCardinality => {
                let and = lhs.and(rhs);
                assert_eq!(lhs.and_cardinality(rhs), and.cardinality());
                assert_eq!(lhs.and_cardinality(lhs), lhs.cardinality());
                assert_eq!(
                    lhs.xor_cardinality(rhs),
                    lhs.or_cardinality(rhs) - and.cardinality()
                );
            }
            BitmapCompOperation::And => {
                assert_eq!(lhs.and(lhs), *lhs);

                let res = lhs.and(rhs);
                lhs.and_inplace(rhs);
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::Or => {
                assert_eq!(lhs.or(lhs), *lhs);

                let res = lhs.or(rhs);
                assert_eq!(res, Bitmap::fast_or(&[lhs, rhs]));

                lhs.or_inplace(rhs);
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::LazyOr => {
                let res = lhs.or(rhs);
                lhs.lazy_batch(|lazy| {
                    lazy.or_inplace(rhs);
                    lazy.or_inplace(rhs);
                });
                assert_eq!(*lhs, res);
                assert_eq!(lhs.cardinality(), lhs.iter().count() as u64);
            }
            BitmapCompOperation::Xor => {
                assert!(lhs.xor(lhs).is_empty());

                let res = lhs.xor(rhs);
                lhs.xor_inplace(rhs);
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::AndNot => {
                assert!(lhs.andnot(lhs).is_empty());

                let res = lhs.andnot(rhs);
                lhs.andnot_inplace(rhs);
                assert_eq!(*lhs, res);
            }
        }
    }
}
