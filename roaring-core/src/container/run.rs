use std::cmp;
use std::fmt;
use std::ops::Range;

use super::{
    ContainerIter, ContainerOps, RelativeRangeConsumer, ReverseContainerIter, MAX_CARDINALITY,
};

/// A run of consecutive values, `start..=last`
///
/// The bounds are stored inclusively so that a run covering the whole chunk fits in
/// two `u16`s; [`Interval::range`] exposes the equivalent half-open range.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    start: u16,
    last: u16,
}

impl Interval {
    /// Creates the run `start..=last`
    #[inline]
    pub fn new(start: u16, last: u16) -> Self {
        debug_assert!(start <= last);
        Self { start, last }
    }

    /// Creates the run covering the non-empty half-open `range`
    #[inline]
    pub(crate) fn from_range(range: Range<u32>) -> Self {
        debug_assert!(range.start < range.end && range.end <= MAX_CARDINALITY);
        Self::new(range.start as u16, (range.end - 1) as u16)
    }

    /// First value of the run
    #[inline]
    pub fn start(self) -> u16 {
        self.start
    }

    /// Last value of the run (inclusive)
    #[inline]
    pub fn last(self) -> u16 {
        self.last
    }

    /// One past the last value of the run
    #[inline]
    pub fn end(self) -> u32 {
        u32::from(self.last) + 1
    }

    /// Number of values in the run
    #[inline]
    pub fn len(self) -> u32 {
        u32::from(self.last - self.start) + 1
    }

    /// The run as a half-open range
    #[inline]
    pub fn range(self) -> Range<u32> {
        u32::from(self.start)..self.end()
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.range())
    }
}

/// Sorted runs of consecutive values, for clustered chunks
///
/// Runs never overlap and never touch: two runs separated by no absent value are always
/// merged, so a set of values has exactly one run encoding.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RunContainer {
    runs: Vec<Interval>,
}

impl RunContainer {
    /// Creates an empty run container
    #[inline]
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Creates a run container holding the values of `range`
    pub fn from_range(range: Range<u32>) -> Self {
        let mut run = Self::new();
        run.add_range(range);
        run
    }

    /// Creates a run container from arbitrary half-open ranges.
    ///
    /// The ranges may overlap, touch, or arrive in any order; the result is canonical.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::container::{ContainerOps, RunContainer};
    ///
    /// let run = RunContainer::from_ranges([10..20, 20..30]);
    /// assert_eq!(run.runs().len(), 1);
    /// assert_eq!(run.runs()[0].range(), 10..30);
    /// assert_eq!(run.cardinality(), 20);
    /// ```
    pub fn from_ranges<I: IntoIterator<Item = Range<u32>>>(ranges: I) -> Self {
        let mut run = Self::new();
        for range in ranges {
            run.add_range(range);
        }
        run
    }

    /// The runs, in ascending order
    #[inline]
    pub fn runs(&self) -> &[Interval] {
        &self.runs
    }

    /// Releases unused capacity
    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.runs.shrink_to_fit();
    }

    /// Wraps runs already known to be sorted, non-overlapping, and non-touching
    pub(crate) fn from_runs_unchecked(runs: Vec<Interval>) -> Self {
        debug_assert!(runs.windows(2).all(|w| w[0].end() < u32::from(w[1].start)));
        Self { runs }
    }

    /// Appends the non-empty `range`, which must not start before the last run starts.
    ///
    /// Touching or overlapping the last run extends it.
    pub(crate) fn push_range(&mut self, range: Range<u32>) {
        debug_assert!(!range.is_empty());
        if let Some(last) = self.runs.last_mut() {
            debug_assert!(u32::from(last.start) <= range.start);
            if range.start <= last.end() {
                if range.end > last.end() {
                    last.last = (range.end - 1) as u16;
                }
                return;
            }
        }
        self.runs.push(Interval::from_range(range));
    }

    /// Index of the run containing `value`, or the index where a run holding it would go
    #[inline]
    fn search(&self, value: u16) -> Result<usize, usize> {
        let index = self.runs.partition_point(|run| run.last < value);
        match self.runs.get(index) {
            Some(run) if run.start <= value => Ok(index),
            _ => Err(index),
        }
    }
}

impl ContainerOps for RunContainer {
    #[inline]
    fn cardinality(&self) -> u32 {
        self.runs.iter().map(|run| run.len()).sum()
    }

    #[inline]
    fn contains(&self, value: u16) -> bool {
        self.search(value).is_ok()
    }

    fn add(&mut self, value: u16) -> bool {
        if self.contains(value) {
            return false;
        }
        let value = u32::from(value);
        self.add_range(value..value + 1);
        true
    }

    fn remove(&mut self, value: u16) -> bool {
        if !self.contains(value) {
            return false;
        }
        let value = u32::from(value);
        self.remove_range(value..value + 1);
        true
    }

    fn add_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        debug_assert!(range.end <= MAX_CARDINALITY);
        // Runs in first..past all overlap or touch the new range
        let first = self.runs.partition_point(|run| run.end() < range.start);
        let past = self
            .runs
            .partition_point(|run| u32::from(run.start) <= range.end);
        if first == past {
            self.runs.insert(first, Interval::from_range(range));
            return;
        }
        let start = cmp::min(range.start, u32::from(self.runs[first].start));
        let end = cmp::max(range.end, self.runs[past - 1].end());
        self.runs
            .splice(first..past, [Interval::from_range(start..end)]);
    }

    fn remove_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        // Runs in first..past overlap the removed range
        let first = self.runs.partition_point(|run| run.end() <= range.start);
        let past = self
            .runs
            .partition_point(|run| u32::from(run.start) < range.end);
        if first >= past {
            return;
        }
        let head = u32::from(self.runs[first].start)..range.start;
        let tail = range.end..self.runs[past - 1].end();
        let pieces = [head, tail]
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .map(Interval::from_range);
        self.runs.splice(first..past, pieces);
    }

    #[inline]
    fn minimum(&self) -> Option<u16> {
        self.runs.first().map(|run| run.start)
    }

    #[inline]
    fn maximum(&self) -> Option<u16> {
        self.runs.last().map(|run| run.last)
    }

    fn rank(&self, value: u16) -> u32 {
        let mut rank = 0;
        for run in &self.runs {
            if run.last < value {
                rank += run.len();
            } else {
                if run.start <= value {
                    rank += u32::from(value - run.start) + 1;
                }
                break;
            }
        }
        rank
    }

    fn select(&self, rank: u32) -> Option<u16> {
        let mut remaining = rank;
        for run in &self.runs {
            if remaining < run.len() {
                return Some(run.start + remaining as u16);
            }
            remaining -= run.len();
        }
        None
    }

    #[inline]
    fn number_of_runs(&self) -> u32 {
        self.runs.len() as u32
    }

    fn range_cardinality(&self, range: Range<u32>) -> u32 {
        if range.is_empty() {
            return 0;
        }
        let first = self.runs.partition_point(|run| run.end() <= range.start);
        self.runs[first..]
            .iter()
            .take_while(|run| u32::from(run.start) < range.end)
            .map(|run| {
                let start = cmp::max(u32::from(run.start), range.start);
                let end = cmp::min(run.end(), range.end);
                end - start
            })
            .sum()
    }

    #[inline]
    fn size_in_bytes(&self) -> usize {
        super::convert::run_size_in_bytes(self.runs.len())
    }

    fn next_value(&self, from: u16) -> Option<u16> {
        match self.search(from) {
            Ok(_) => Some(from),
            Err(index) => self.runs.get(index).map(|run| run.start),
        }
    }

    fn previous_value(&self, from: u16) -> Option<u16> {
        match self.search(from) {
            Ok(_) => Some(from),
            Err(index) => index.checked_sub(1).map(|index| self.runs[index].last),
        }
    }

    fn next_absent_value(&self, from: u16) -> Option<u16> {
        match self.search(from) {
            // Runs never touch, so the value after a run is absent
            Ok(index) => self.runs[index].last.checked_add(1),
            Err(_) => Some(from),
        }
    }

    fn previous_absent_value(&self, from: u16) -> Option<u16> {
        match self.search(from) {
            Ok(index) => self.runs[index].start.checked_sub(1),
            Err(_) => Some(from),
        }
    }

    #[inline]
    fn iter(&self) -> ContainerIter<'_> {
        ContainerIter::run(&self.runs)
    }

    #[inline]
    fn reverse_iter(&self) -> ReverseContainerIter<'_> {
        ReverseContainerIter::run(&self.runs)
    }

    #[inline]
    fn for_all_in_range<C>(&self, from: u32, to: u32, consumer: &mut C)
    where
        C: RelativeRangeConsumer + ?Sized,
    {
        super::range::run_for_all(&self.runs, from, to, consumer);
    }
}

impl fmt::Debug for RunContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunContainer<{:?}>", self.runs)
    }
}
