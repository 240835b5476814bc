//! Containers: compressed encodings of one 2^16-value chunk of the universe.
//!
//! A chunk is identified by its owner through a 16-bit key. The container itself never
//! knows that key; every operation that produces absolute values takes the chunk base
//! (`u32::from(key) << 16`) as an argument.
//!
//! Three encodings are available:
//!
//! * [`ArrayContainer`]: sorted `u16` values, for sparse chunks
//! * [`BitmapContainer`]: 65536 bits with a cached cardinality, for dense chunks
//! * [`RunContainer`]: sorted, non-touching intervals, for clustered chunks
//!
//! [`Container`] is the tagged union of the three. Representation changes never mutate a
//! variant in place: a new variant is built and stored over the old one.
//!
//! # Tuning constants
//!
//! * [`ARRAY_MAX_SIZE`]: an array holding more than this many values becomes a bitmap,
//!   and a bitmap at or below it becomes an array.
//! * Size estimates used to pick encodings: array `2 * cardinality` bytes, bitmap
//!   `8192` bytes, run `2 + 4 * runs` bytes.
//!
//! These constants affect memory use and speed only, never the set of values stored.

use std::fmt;
use std::mem;
use std::ops::Range;

mod array;
mod batch;
mod bitmap;
mod convert;
mod iter;
pub(crate) mod lazy;
mod ops;
mod range;
mod run;

pub use self::array::ArrayContainer;
pub use self::batch::BatchIterator;
pub use self::bitmap::{BitmapContainer, BITMAP_WORDS};
pub use self::convert::ContainerKind;
pub use self::iter::{ContainerIter, ContainerRankIter, PeekableIterator, ReverseContainerIter};
pub use self::range::{RelativeRangeConsumer, ValueConsumer};
pub use self::run::{Interval, RunContainer};

/// Largest cardinality kept in array form
pub const ARRAY_MAX_SIZE: usize = 4096;

/// Number of distinct values a single container can hold
pub const MAX_CARDINALITY: u32 = 1 << 16;

/// Operations shared by every container encoding.
///
/// Ranges are half-open, in container-local coordinates, with `range.end <= 65536`.
/// Implementations restore their canonical form before returning from any mutator.
pub trait ContainerOps {
    /// Number of values present
    fn cardinality(&self) -> u32;

    /// Returns true if `value` is present
    fn contains(&self, value: u16) -> bool;

    /// Adds `value`, returning true if it was not already present
    fn add(&mut self, value: u16) -> bool;

    /// Removes `value`, returning true if it was present
    fn remove(&mut self, value: u16) -> bool;

    /// Adds every value in `range`
    fn add_range(&mut self, range: Range<u32>);

    /// Removes every value in `range`
    fn remove_range(&mut self, range: Range<u32>);

    /// Smallest value present
    fn minimum(&self) -> Option<u16>;

    /// Largest value present
    fn maximum(&self) -> Option<u16>;

    /// Number of values smaller than or equal to `value`
    fn rank(&self, value: u16) -> u32;

    /// The value with `rank` values smaller than it, if there are enough values
    fn select(&self, rank: u32) -> Option<u16>;

    /// Number of maximal runs of consecutive values
    fn number_of_runs(&self) -> u32;

    /// Number of values present in `range`
    fn range_cardinality(&self, range: Range<u32>) -> u32;

    /// Estimated encoded size in bytes, used to choose between encodings
    fn size_in_bytes(&self) -> usize;

    /// Smallest value present that is at least `from`
    fn next_value(&self, from: u16) -> Option<u16>;

    /// Largest value present that is at most `from`
    fn previous_value(&self, from: u16) -> Option<u16>;

    /// Smallest value absent that is at least `from`
    fn next_absent_value(&self, from: u16) -> Option<u16>;

    /// Largest value absent that is at most `from`
    fn previous_absent_value(&self, from: u16) -> Option<u16>;

    /// Ascending iterator over the values present
    fn iter(&self) -> ContainerIter<'_>;

    /// Descending iterator over the values present
    fn reverse_iter(&self) -> ReverseContainerIter<'_>;

    /// Reports every value in `from..to` to `consumer` as present or absent, as offsets
    /// from `from`.
    ///
    /// See [`RelativeRangeConsumer`] for the event contract.
    fn for_all_in_range<C>(&self, from: u32, to: u32, consumer: &mut C)
    where
        C: RelativeRangeConsumer + ?Sized;

    #[inline]
    fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.cardinality() == MAX_CARDINALITY
    }
}

/// A chunk of up to 2^16 values in one of the three encodings
#[derive(Clone)]
pub enum Container {
    Array(ArrayContainer),
    Bitmap(BitmapContainer),
    Run(RunContainer),
}

macro_rules! dispatch {
    ($container:expr, $inner:ident => $body:expr) => {
        match $container {
            Container::Array($inner) => $body,
            Container::Bitmap($inner) => $body,
            Container::Run($inner) => $body,
        }
    };
}

impl Container {
    /// An empty container, in array form
    #[inline]
    pub const fn new() -> Self {
        Container::Array(ArrayContainer::new())
    }

    /// A container holding exactly the values in `range`
    ///
    /// Ranges of more than two values are stored as a single run.
    pub fn from_range(range: Range<u32>) -> Self {
        debug_assert!(range.end <= MAX_CARDINALITY);
        if range.len() <= 2 {
            Container::Array(ArrayContainer::from_range(range))
        } else {
            Container::Run(RunContainer::from_range(range))
        }
    }

    /// A container holding every value of the chunk
    #[inline]
    pub fn full() -> Self {
        Container::Run(RunContainer::from_range(0..MAX_CARDINALITY))
    }

    /// An ascending iterator that also reports the rank of its next value
    #[inline]
    pub fn rank_iter(&self) -> ContainerRankIter<'_> {
        ContainerRankIter::new(self)
    }

    /// A reusable batch iterator wrapping this container
    #[inline]
    pub fn batch_iter(&self) -> BatchIterator<'_> {
        let mut batch = BatchIterator::new();
        batch.wrap(self);
        batch
    }

    /// Replaces `self` with the result of `f`, which receives the current value by move
    #[inline]
    pub(crate) fn replace_with(&mut self, f: impl FnOnce(Container) -> Container) {
        let current = mem::take(self);
        *self = f(current);
    }
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerOps for Container {
    #[inline]
    fn cardinality(&self) -> u32 {
        dispatch!(self, c => c.cardinality())
    }

    #[inline]
    fn contains(&self, value: u16) -> bool {
        dispatch!(self, c => c.contains(value))
    }

    fn add(&mut self, value: u16) -> bool {
        match self {
            Container::Array(array) => {
                if array.cardinality() as usize >= ARRAY_MAX_SIZE && !array.contains(value) {
                    let mut bitmap = BitmapContainer::from(&*array);
                    bitmap.add(value);
                    *self = Container::Bitmap(bitmap);
                    true
                } else {
                    array.add(value)
                }
            }
            Container::Bitmap(bitmap) => bitmap.add(value),
            Container::Run(run) => run.add(value),
        }
    }

    fn remove(&mut self, value: u16) -> bool {
        match self {
            Container::Array(array) => array.remove(value),
            Container::Bitmap(bitmap) => {
                let removed = bitmap.remove(value);
                if removed && bitmap.cardinality() as usize <= ARRAY_MAX_SIZE {
                    *self = Container::Array(ArrayContainer::from(&*bitmap));
                }
                removed
            }
            Container::Run(run) => run.remove(value),
        }
    }

    fn add_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        match self {
            Container::Array(array) => {
                let added = range.len() as u32 - array.range_cardinality(range.clone());
                if (array.cardinality() + added) as usize > ARRAY_MAX_SIZE {
                    let mut bitmap = BitmapContainer::from(&*array);
                    bitmap.add_range(range);
                    *self = Container::Bitmap(bitmap);
                } else {
                    array.add_range(range);
                }
            }
            Container::Bitmap(bitmap) => bitmap.add_range(range),
            Container::Run(run) => run.add_range(range),
        }
    }

    fn remove_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        match self {
            Container::Array(array) => array.remove_range(range),
            Container::Bitmap(bitmap) => {
                bitmap.remove_range(range);
                if bitmap.cardinality() as usize <= ARRAY_MAX_SIZE {
                    *self = Container::Array(ArrayContainer::from(&*bitmap));
                }
            }
            Container::Run(run) => run.remove_range(range),
        }
    }

    #[inline]
    fn minimum(&self) -> Option<u16> {
        dispatch!(self, c => c.minimum())
    }

    #[inline]
    fn maximum(&self) -> Option<u16> {
        dispatch!(self, c => c.maximum())
    }

    #[inline]
    fn rank(&self, value: u16) -> u32 {
        dispatch!(self, c => c.rank(value))
    }

    #[inline]
    fn select(&self, rank: u32) -> Option<u16> {
        dispatch!(self, c => c.select(rank))
    }

    #[inline]
    fn number_of_runs(&self) -> u32 {
        dispatch!(self, c => c.number_of_runs())
    }

    #[inline]
    fn range_cardinality(&self, range: Range<u32>) -> u32 {
        dispatch!(self, c => c.range_cardinality(range))
    }

    #[inline]
    fn size_in_bytes(&self) -> usize {
        dispatch!(self, c => c.size_in_bytes())
    }

    #[inline]
    fn next_value(&self, from: u16) -> Option<u16> {
        dispatch!(self, c => c.next_value(from))
    }

    #[inline]
    fn previous_value(&self, from: u16) -> Option<u16> {
        dispatch!(self, c => c.previous_value(from))
    }

    #[inline]
    fn next_absent_value(&self, from: u16) -> Option<u16> {
        dispatch!(self, c => c.next_absent_value(from))
    }

    #[inline]
    fn previous_absent_value(&self, from: u16) -> Option<u16> {
        dispatch!(self, c => c.previous_absent_value(from))
    }

    #[inline]
    fn iter(&self) -> ContainerIter<'_> {
        dispatch!(self, c => c.iter())
    }

    #[inline]
    fn reverse_iter(&self) -> ReverseContainerIter<'_> {
        dispatch!(self, c => c.reverse_iter())
    }

    #[inline]
    fn for_all_in_range<C>(&self, from: u32, to: u32, consumer: &mut C)
    where
        C: RelativeRangeConsumer + ?Sized,
    {
        dispatch!(self, c => c.for_all_in_range(from, to, consumer))
    }
}

impl PartialEq for Container {
    /// Containers are equal when they hold the same values, whatever their encoding
    fn eq(&self, other: &Container) -> bool {
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => a == b,
            (Container::Bitmap(a), Container::Bitmap(b)) => a == b,
            (Container::Run(a), Container::Run(b)) => a == b,
            _ => self.cardinality() == other.cardinality() && self.iter().eq(other.iter()),
        }
    }
}

impl Eq for Container {}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, c => fmt::Debug::fmt(c, f))
    }
}

impl FromIterator<u16> for Container {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut container = Container::new();
        container.extend(iter);
        container
    }
}

impl Extend<u16> for Container {
    fn extend<I: IntoIterator<Item = u16>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}
