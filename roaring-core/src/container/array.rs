use std::fmt;
use std::ops::Range;

use super::{ContainerIter, ContainerOps, RelativeRangeConsumer, ReverseContainerIter};

/// Sorted, duplicate-free list of the values present in a sparse chunk
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ArrayContainer {
    values: Vec<u16>,
}

impl ArrayContainer {
    /// Creates an empty array container
    ///
    /// Does not allocate
    #[inline]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Creates an empty array container with room for `capacity` values
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Creates an array container holding every value of `range`
    pub fn from_range(range: Range<u32>) -> Self {
        debug_assert!(range.end <= super::MAX_CARDINALITY);
        Self {
            values: range.map(|v| v as u16).collect(),
        }
    }

    /// Wraps values already known to be strictly increasing
    #[inline]
    pub(crate) fn from_sorted_unchecked(values: Vec<u16>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        Self { values }
    }

    /// The values present, in ascending order
    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.values
    }

    /// Number of values the container can hold without reallocating
    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Releases unused capacity
    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
    }

    /// Indexes of the first value `>= range.start` and the first value `>= range.end`
    #[inline]
    fn bounds(&self, range: &Range<u32>) -> (usize, usize) {
        let start = self.values.partition_point(|&v| u32::from(v) < range.start);
        let end = start + self.values[start..].partition_point(|&v| u32::from(v) < range.end);
        (start, end)
    }
}

impl ContainerOps for ArrayContainer {
    #[inline]
    fn cardinality(&self) -> u32 {
        self.values.len() as u32
    }

    #[inline]
    fn contains(&self, value: u16) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    #[inline]
    fn add(&mut self, value: u16) -> bool {
        // Appending in order is the common case when building from sorted input
        if self.values.last().map_or(true, |&last| last < value) {
            self.values.push(value);
            return true;
        }
        match self.values.binary_search(&value) {
            Ok(_) => false,
            Err(index) => {
                self.values.insert(index, value);
                true
            }
        }
    }

    #[inline]
    fn remove(&mut self, value: u16) -> bool {
        match self.values.binary_search(&value) {
            Ok(index) => {
                self.values.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    fn add_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        debug_assert!(range.end <= super::MAX_CARDINALITY);
        let (start, end) = self.bounds(&range);
        self.values.splice(start..end, range.map(|v| v as u16));
    }

    fn remove_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        let (start, end) = self.bounds(&range);
        self.values.drain(start..end);
    }

    #[inline]
    fn minimum(&self) -> Option<u16> {
        self.values.first().copied()
    }

    #[inline]
    fn maximum(&self) -> Option<u16> {
        self.values.last().copied()
    }

    #[inline]
    fn rank(&self, value: u16) -> u32 {
        self.values.partition_point(|&v| v <= value) as u32
    }

    #[inline]
    fn select(&self, rank: u32) -> Option<u16> {
        self.values.get(rank as usize).copied()
    }

    fn number_of_runs(&self) -> u32 {
        if self.values.is_empty() {
            return 0;
        }
        let breaks = self
            .values
            .windows(2)
            .filter(|w| u32::from(w[0]) + 1 != u32::from(w[1]))
            .count();
        breaks as u32 + 1
    }

    #[inline]
    fn range_cardinality(&self, range: Range<u32>) -> u32 {
        if range.is_empty() {
            return 0;
        }
        let (start, end) = self.bounds(&range);
        (end - start) as u32
    }

    #[inline]
    fn size_in_bytes(&self) -> usize {
        super::convert::array_size_in_bytes(self.values.len())
    }

    fn next_value(&self, from: u16) -> Option<u16> {
        let index = self.values.partition_point(|&v| v < from);
        self.values.get(index).copied()
    }

    fn previous_value(&self, from: u16) -> Option<u16> {
        let index = self.values.partition_point(|&v| v <= from);
        index.checked_sub(1).map(|index| self.values[index])
    }

    fn next_absent_value(&self, from: u16) -> Option<u16> {
        let index = self.values.partition_point(|&v| v < from);
        let present = ascending_run(&self.values[index..], from);
        let absent = u32::from(from) + present as u32;
        (absent < super::MAX_CARDINALITY).then(|| absent as u16)
    }

    fn previous_absent_value(&self, from: u16) -> Option<u16> {
        let index = self.values.partition_point(|&v| v <= from);
        let present = descending_run(&self.values[..index], from);
        u32::from(from)
            .checked_sub(present as u32)
            .map(|absent| absent as u16)
    }

    #[inline]
    fn iter(&self) -> ContainerIter<'_> {
        ContainerIter::array(&self.values)
    }

    #[inline]
    fn reverse_iter(&self) -> ReverseContainerIter<'_> {
        ReverseContainerIter::array(&self.values)
    }

    #[inline]
    fn for_all_in_range<C>(&self, from: u32, to: u32, consumer: &mut C)
    where
        C: RelativeRangeConsumer + ?Sized,
    {
        super::range::array_for_all(&self.values, from, to, consumer);
    }
}

/// Length of the prefix of `tail` holding `first, first + 1, ...`
///
/// `tail` must be strictly increasing with no value below `first`.
fn ascending_run(tail: &[u16], first: u16) -> usize {
    let (mut lo, mut hi) = (0, tail.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if usize::from(tail[mid]) == usize::from(first) + mid {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Length of the suffix of `head` holding `..., last - 1, last`
///
/// `head` must be strictly increasing with no value above `last`.
fn descending_run(head: &[u16], last: u16) -> usize {
    let (mut lo, mut hi) = (0, head.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if usize::from(head[head.len() - 1 - mid]) + mid == usize::from(last) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

impl fmt::Debug for ArrayContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayContainer<{:?}>", self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_range_merges_with_existing_values() {
        let mut array = ArrayContainer::new();
        array.add(1);
        array.add(5);
        array.add(20);
        array.add_range(3..8);
        assert_eq!(array.as_slice(), &[1, 3, 4, 5, 6, 7, 20]);
        assert_eq!(array.number_of_runs(), 3);
    }

    #[test]
    fn remove_range_at_the_edge() {
        let mut array = ArrayContainer::from_range(65530..65536);
        array.remove_range(65534..65536);
        assert_eq!(array.as_slice(), &[65530, 65531, 65532, 65533]);
        assert_eq!(array.range_cardinality(0..65536), 4);
    }

    #[test]
    fn rank_and_select() {
        let array = ArrayContainer::from_sorted_unchecked(vec![2, 4, 8, 16]);
        assert_eq!(array.rank(1), 0);
        assert_eq!(array.rank(8), 3);
        assert_eq!(array.rank(u16::MAX), 4);
        assert_eq!(array.select(3), Some(16));
        assert_eq!(array.select(4), None);
    }

    #[test]
    fn neighbouring_values() {
        let array = ArrayContainer::from_sorted_unchecked(vec![0, 1, 2, 10, 11, 65534, 65535]);
        assert_eq!(array.next_value(3), Some(10));
        assert_eq!(array.next_value(11), Some(11));
        assert_eq!(array.previous_value(9), Some(2));
        assert_eq!(array.previous_value(65533), Some(11));
        assert_eq!(array.next_absent_value(0), Some(3));
        assert_eq!(array.next_absent_value(10), Some(12));
        assert_eq!(array.next_absent_value(65534), None);
        assert_eq!(array.previous_absent_value(11), Some(9));
        assert_eq!(array.previous_absent_value(2), None);
        assert_eq!(array.previous_absent_value(65535), Some(65533));
    }
}
