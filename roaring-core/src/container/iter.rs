use std::cmp;
use std::iter::FusedIterator;

use super::{Container, ContainerOps, Interval, BITMAP_WORDS};

/// An iterator that can look at its next item without consuming it, and skip ahead
/// cheaply.
pub trait PeekableIterator: Iterator {
    /// The item the next call to [`Iterator::next`] will return
    fn peek_next(&self) -> Option<Self::Item>;

    /// Skips every item that comes before `target` in iteration order: smaller items for
    /// ascending iterators, larger items for descending ones.
    ///
    /// Does nothing when the next item is already at or past `target`. Skipping never
    /// moves the iterator backwards.
    fn advance_if_needed(&mut self, target: Self::Item);

    /// Returns true if [`Iterator::next`] would return an item
    #[inline]
    fn has_next(&self) -> bool {
        self.peek_next().is_some()
    }
}

/// Ascending iterator over the values of one container
///
/// Borrows the container; cloning the iterator copies only the cursor.
#[derive(Clone)]
pub struct ContainerIter<'a> {
    cursor: Cursor<'a>,
}

#[derive(Clone)]
enum Cursor<'a> {
    Array(&'a [u16]),
    Bitmap(BitmapCursor<'a>),
    Run(RunCursor<'a>),
}

#[derive(Clone)]
struct BitmapCursor<'a> {
    words: &'a [u64; BITMAP_WORDS],
    index: usize,
    // Bits of `words[index]` not yet yielded; zero only once the last word is exhausted
    word: u64,
}

impl BitmapCursor<'_> {
    /// Moves to the next non-zero word, stopping on the last word
    #[inline]
    fn settle(&mut self) {
        while self.word == 0 && self.index + 1 < BITMAP_WORDS {
            self.index += 1;
            self.word = self.words[self.index];
        }
    }

    #[inline]
    fn peek(&self) -> Option<u16> {
        if self.word == 0 {
            None
        } else {
            Some((self.index as u32 * 64 + self.word.trailing_zeros()) as u16)
        }
    }

    #[inline]
    fn next(&mut self) -> Option<u16> {
        let value = self.peek()?;
        self.word &= self.word - 1;
        self.settle();
        Some(value)
    }

    fn advance(&mut self, min: u16) {
        let target = usize::from(min / 64);
        if target > self.index {
            self.index = target;
            self.word = self.words[target];
        }
        self.word &= !0u64 << (min % 64);
        self.settle();
    }

    fn fill(&mut self, key: u32, buf: &mut [u32]) -> usize {
        let mut count = 0;
        while count < buf.len() && self.word != 0 {
            let base = key | (self.index as u32 * 64);
            while self.word != 0 && count < buf.len() {
                buf[count] = base | self.word.trailing_zeros();
                self.word &= self.word - 1;
                count += 1;
            }
            self.settle();
        }
        count
    }
}

#[derive(Clone)]
struct RunCursor<'a> {
    remaining: &'a [Interval],
    // Lies inside `remaining[0]` whenever `remaining` is non-empty
    next: u32,
}

impl<'a> RunCursor<'a> {
    #[inline]
    fn new(remaining: &'a [Interval]) -> Self {
        let next = remaining.first().map_or(0, |run| u32::from(run.start()));
        Self { remaining, next }
    }

    #[inline]
    fn step(&mut self, by: u32) {
        self.next += by;
        if let Some(run) = self.remaining.first() {
            if self.next == run.end() {
                let remaining = self.remaining;
                *self = Self::new(&remaining[1..]);
            }
        }
    }

    #[inline]
    fn next(&mut self) -> Option<u16> {
        if self.remaining.is_empty() {
            return None;
        }
        let value = self.next as u16;
        self.step(1);
        Some(value)
    }

    fn advance(&mut self, min: u16) {
        let skip = self.remaining.partition_point(|run| run.last() < min);
        let next = cmp::max(self.next, u32::from(min));
        let remaining = self.remaining;
        *self = Self::new(&remaining[skip..]);
        if let Some(run) = self.remaining.first() {
            self.next = cmp::max(u32::from(run.start()), next);
        }
    }

    fn fill(&mut self, key: u32, buf: &mut [u32]) -> usize {
        let mut count = 0;
        while let Some(run) = self.remaining.first() {
            let space = (buf.len() - count) as u32;
            if space == 0 {
                break;
            }
            let take = cmp::min(run.end() - self.next, space);
            for (dst, value) in buf[count..].iter_mut().zip(self.next..self.next + take) {
                *dst = key | value;
            }
            count += take as usize;
            self.step(take);
        }
        count
    }

    fn len(&self) -> usize {
        match self.remaining.split_first() {
            Some((first, rest)) => {
                (first.end() - self.next) as usize
                    + rest.iter().map(|run| run.len() as usize).sum::<usize>()
            }
            None => 0,
        }
    }
}

impl<'a> ContainerIter<'a> {
    /// An iterator that yields nothing
    #[inline]
    pub fn empty() -> Self {
        Self::array(&[])
    }

    #[inline]
    pub(super) fn array(values: &'a [u16]) -> Self {
        Self {
            cursor: Cursor::Array(values),
        }
    }

    #[inline]
    pub(super) fn bitmap(words: &'a [u64; BITMAP_WORDS]) -> Self {
        let mut cursor = BitmapCursor {
            words,
            index: 0,
            word: words[0],
        };
        cursor.settle();
        Self {
            cursor: Cursor::Bitmap(cursor),
        }
    }

    #[inline]
    pub(super) fn run(runs: &'a [Interval]) -> Self {
        Self {
            cursor: Cursor::Run(RunCursor::new(runs)),
        }
    }

    /// Returns the next value combined with the chunk base `key`
    ///
    /// `key` is the chunk's high bits already shifted into place (`u32::from(high) << 16`).
    #[inline]
    pub fn next_absolute(&mut self, key: u32) -> Option<u32> {
        self.next().map(|value| key | u32::from(value))
    }

    /// Fills `buf` with the next values combined with the chunk base `key`, returning how
    /// many were written.
    ///
    /// The iterator advances by exactly the returned count. Zero is returned only once the
    /// iterator is exhausted (or `buf` is empty).
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::container::{Container, ContainerOps};
    ///
    /// let container = Container::from_range(10..20);
    /// let mut iter = container.iter();
    /// let mut buf = [0u32; 4];
    ///
    /// assert_eq!(iter.next_batch(0x0002_0000, &mut buf), 4);
    /// assert_eq!(buf, [0x0002_000A, 0x0002_000B, 0x0002_000C, 0x0002_000D]);
    /// assert_eq!(iter.next(), Some(14));
    /// ```
    pub fn next_batch(&mut self, key: u32, buf: &mut [u32]) -> usize {
        match &mut self.cursor {
            Cursor::Array(remaining) => {
                let count = cmp::min(remaining.len(), buf.len());
                for (dst, &value) in buf.iter_mut().zip(&remaining[..count]) {
                    *dst = key | u32::from(value);
                }
                *remaining = &remaining[count..];
                count
            }
            Cursor::Bitmap(cursor) => cursor.fill(key, buf),
            Cursor::Run(cursor) => cursor.fill(key, buf),
        }
    }
}

impl<'a> Iterator for ContainerIter<'a> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        match &mut self.cursor {
            Cursor::Array(remaining) => {
                let (&first, rest) = remaining.split_first()?;
                *remaining = rest;
                Some(first)
            }
            Cursor::Bitmap(cursor) => cursor.next(),
            Cursor::Run(cursor) => cursor.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.cursor {
            Cursor::Array(remaining) => (remaining.len(), Some(remaining.len())),
            Cursor::Bitmap(cursor) => {
                let upper = (BITMAP_WORDS - cursor.index) * 64;
                (cursor.word.count_ones() as usize, Some(upper))
            }
            Cursor::Run(cursor) => (cursor.len(), Some(cursor.len())),
        }
    }
}

impl FusedIterator for ContainerIter<'_> {}

impl PeekableIterator for ContainerIter<'_> {
    #[inline]
    fn peek_next(&self) -> Option<u16> {
        match &self.cursor {
            Cursor::Array(remaining) => remaining.first().copied(),
            Cursor::Bitmap(cursor) => cursor.peek(),
            Cursor::Run(cursor) => cursor.remaining.first().map(|_| cursor.next as u16),
        }
    }

    fn advance_if_needed(&mut self, min: u16) {
        match self.peek_next() {
            Some(next) if next < min => {}
            _ => return,
        }
        match &mut self.cursor {
            Cursor::Array(remaining) => {
                let skip = remaining.partition_point(|&value| value < min);
                *remaining = &remaining[skip..];
            }
            Cursor::Bitmap(cursor) => cursor.advance(min),
            Cursor::Run(cursor) => cursor.advance(min),
        }
    }

    #[inline]
    fn has_next(&self) -> bool {
        match &self.cursor {
            Cursor::Array(remaining) => !remaining.is_empty(),
            Cursor::Bitmap(cursor) => cursor.word != 0,
            Cursor::Run(cursor) => !cursor.remaining.is_empty(),
        }
    }
}

/// Descending iterator over the values of one container
///
/// [`PeekableIterator::advance_if_needed`] skips the values above its argument.
#[derive(Clone)]
pub struct ReverseContainerIter<'a> {
    cursor: ReverseCursor<'a>,
}

#[derive(Clone)]
enum ReverseCursor<'a> {
    Array(&'a [u16]),
    Bitmap(ReverseBitmapCursor<'a>),
    Run(ReverseRunCursor<'a>),
}

#[derive(Clone)]
struct ReverseBitmapCursor<'a> {
    words: &'a [u64; BITMAP_WORDS],
    index: usize,
    // Bits of `words[index]` not yet yielded; zero only once the first word is exhausted
    word: u64,
}

impl ReverseBitmapCursor<'_> {
    /// Moves to the previous non-zero word, stopping on the first word
    #[inline]
    fn settle(&mut self) {
        while self.word == 0 && self.index > 0 {
            self.index -= 1;
            self.word = self.words[self.index];
        }
    }

    #[inline]
    fn peek(&self) -> Option<u16> {
        if self.word == 0 {
            None
        } else {
            Some((self.index as u32 * 64 + 63 - self.word.leading_zeros()) as u16)
        }
    }

    #[inline]
    fn next(&mut self) -> Option<u16> {
        let value = self.peek()?;
        self.word &= !(1u64 << (value % 64));
        self.settle();
        Some(value)
    }

    fn advance(&mut self, max: u16) {
        let target = usize::from(max / 64);
        if target < self.index {
            self.index = target;
            self.word = self.words[target];
        }
        self.word &= !0u64 >> (63 - max % 64);
        self.settle();
    }
}

#[derive(Clone)]
struct ReverseRunCursor<'a> {
    remaining: &'a [Interval],
    // Lies inside the last run of `remaining` whenever `remaining` is non-empty
    next: u16,
}

impl<'a> ReverseRunCursor<'a> {
    #[inline]
    fn new(remaining: &'a [Interval]) -> Self {
        let next = remaining.last().map_or(0, |run| run.last());
        Self { remaining, next }
    }

    #[inline]
    fn next(&mut self) -> Option<u16> {
        let (run, rest) = self.remaining.split_last()?;
        let value = self.next;
        if value == run.start() {
            *self = Self::new(rest);
        } else {
            self.next -= 1;
        }
        Some(value)
    }

    fn advance(&mut self, max: u16) {
        let keep = self.remaining.partition_point(|run| run.start() <= max);
        let remaining = self.remaining;
        let current = self.next;
        *self = Self::new(&remaining[..keep]);
        if let Some(run) = self.remaining.last() {
            self.next = run.last().min(max).min(current);
        }
    }
}

impl<'a> ReverseContainerIter<'a> {
    /// An iterator that yields nothing
    #[inline]
    pub fn empty() -> Self {
        Self::array(&[])
    }

    #[inline]
    pub(super) fn array(values: &'a [u16]) -> Self {
        Self {
            cursor: ReverseCursor::Array(values),
        }
    }

    #[inline]
    pub(super) fn bitmap(words: &'a [u64; BITMAP_WORDS]) -> Self {
        let mut cursor = ReverseBitmapCursor {
            words,
            index: BITMAP_WORDS - 1,
            word: words[BITMAP_WORDS - 1],
        };
        cursor.settle();
        Self {
            cursor: ReverseCursor::Bitmap(cursor),
        }
    }

    #[inline]
    pub(super) fn run(runs: &'a [Interval]) -> Self {
        Self {
            cursor: ReverseCursor::Run(ReverseRunCursor::new(runs)),
        }
    }
}

impl Iterator for ReverseContainerIter<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        match &mut self.cursor {
            ReverseCursor::Array(remaining) => {
                let (&last, rest) = remaining.split_last()?;
                *remaining = rest;
                Some(last)
            }
            ReverseCursor::Bitmap(cursor) => cursor.next(),
            ReverseCursor::Run(cursor) => cursor.next(),
        }
    }
}

impl FusedIterator for ReverseContainerIter<'_> {}

impl PeekableIterator for ReverseContainerIter<'_> {
    #[inline]
    fn peek_next(&self) -> Option<u16> {
        match &self.cursor {
            ReverseCursor::Array(remaining) => remaining.last().copied(),
            ReverseCursor::Bitmap(cursor) => cursor.peek(),
            ReverseCursor::Run(cursor) => cursor.remaining.last().map(|_| cursor.next),
        }
    }

    fn advance_if_needed(&mut self, max: u16) {
        match self.peek_next() {
            Some(next) if next > max => {}
            _ => return,
        }
        match &mut self.cursor {
            ReverseCursor::Array(remaining) => {
                let keep = remaining.partition_point(|&value| value <= max);
                *remaining = &remaining[..keep];
            }
            ReverseCursor::Bitmap(cursor) => cursor.advance(max),
            ReverseCursor::Run(cursor) => cursor.advance(max),
        }
    }
}

/// Ascending iterator that also knows the rank of the value it will yield next
///
/// # Examples
///
/// ```
/// use roaring_core::container::{Container, PeekableIterator};
///
/// let container: Container = [3u16, 8, 9, 40].into_iter().collect();
/// let mut iter = container.rank_iter();
/// assert_eq!(iter.peek_next_rank(), 1);
/// iter.advance_if_needed(9);
/// assert_eq!(iter.peek_next(), Some(9));
/// assert_eq!(iter.peek_next_rank(), 3);
/// assert_eq!(iter.next(), Some(9));
/// assert_eq!(iter.peek_next_rank(), 4);
/// ```
#[derive(Clone)]
pub struct ContainerRankIter<'a> {
    container: &'a Container,
    iter: ContainerIter<'a>,
    // Values yielded or skipped so far
    consumed: u32,
}

impl<'a> ContainerRankIter<'a> {
    #[inline]
    pub(super) fn new(container: &'a Container) -> Self {
        Self {
            container,
            iter: container.iter(),
            consumed: 0,
        }
    }

    /// Rank of the next value: the number of values smaller than or equal to it
    #[inline]
    pub fn peek_next_rank(&self) -> u32 {
        self.consumed + 1
    }
}

impl Iterator for ContainerRankIter<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        let value = self.iter.next()?;
        self.consumed += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl FusedIterator for ContainerRankIter<'_> {}

impl PeekableIterator for ContainerRankIter<'_> {
    #[inline]
    fn peek_next(&self) -> Option<u16> {
        self.iter.peek_next()
    }

    fn advance_if_needed(&mut self, min: u16) {
        self.iter.advance_if_needed(min);
        self.consumed = match self.iter.peek_next() {
            Some(next) => self.container.rank(next) - 1,
            None => self.container.cardinality(),
        };
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{Container, ContainerOps, PeekableIterator};

    fn bitmap_with(values: &[u16]) -> Container {
        let mut container = Container::Bitmap(Default::default());
        for &value in values {
            container.add(value);
        }
        container
    }

    #[test]
    fn bitmap_iteration_skips_empty_words() {
        let container = bitmap_with(&[1, 63, 64, 40000, 65535]);
        let values: Vec<u16> = container.iter().collect();
        assert_eq!(values, [1, 63, 64, 40000, 65535]);
    }

    #[test]
    fn bitmap_advance_within_and_across_words() {
        let container = bitmap_with(&[3, 10, 70, 5000]);
        let mut iter = container.iter();
        iter.advance_if_needed(4);
        assert_eq!(iter.peek_next(), Some(10));
        iter.advance_if_needed(10);
        assert_eq!(iter.peek_next(), Some(10));
        iter.advance_if_needed(71);
        assert_eq!(iter.peek_next(), Some(5000));
        iter.advance_if_needed(5001);
        assert!(!iter.has_next());
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn run_advance_lands_inside_a_run() {
        let container = Container::from_range(100..200);
        let mut iter = container.iter();
        iter.advance_if_needed(150);
        assert_eq!(iter.next(), Some(150));
        iter.advance_if_needed(10);
        assert_eq!(iter.next(), Some(151));
        iter.advance_if_needed(200);
        assert_eq!(iter.peek_next(), None);
    }

    #[test]
    fn exhausted_iterators_stay_exhausted() {
        let container = Container::from_range(65535..65536);
        let mut iter = container.iter();
        assert_eq!(iter.next(), Some(65535));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_batch(0, &mut [0; 8]), 0);
    }

    #[test]
    fn size_hint_is_exact_for_runs() {
        let container = Container::from_range(0..1000);
        let mut iter = container.iter();
        iter.advance_if_needed(990);
        assert_eq!(iter.size_hint(), (10, Some(10)));
        assert_eq!(iter.count(), 10);
    }

    #[test]
    fn reverse_iteration_in_every_encoding() {
        use crate::container::ContainerKind;

        let values = [0u16, 1, 2, 63, 64, 500, 501, 40000, 65535];
        let array: Container = values.into_iter().collect();
        let expected: Vec<u16> = values.iter().rev().copied().collect();
        for kind in [ContainerKind::Array, ContainerKind::Bitmap, ContainerKind::Run] {
            let container = array.clone().into_kind(kind);
            assert_eq!(container.reverse_iter().collect::<Vec<_>>(), expected, "{kind:?}");

            let mut iter = container.reverse_iter();
            iter.advance_if_needed(501);
            assert_eq!(iter.peek_next(), Some(501), "{kind:?}");
            iter.advance_if_needed(60000);
            assert_eq!(iter.next(), Some(501), "{kind:?}");
            iter.advance_if_needed(62);
            assert_eq!(iter.next(), Some(2), "{kind:?}");
            iter.advance_if_needed(0);
            assert_eq!(iter.next(), Some(0), "{kind:?}");
            assert_eq!(iter.next(), None, "{kind:?}");
            assert!(!iter.has_next());
        }
    }

    #[test]
    fn reverse_run_advance_lands_inside_a_run() {
        let container = Container::from_range(100..200);
        let mut iter = container.reverse_iter();
        assert_eq!(iter.next(), Some(199));
        iter.advance_if_needed(150);
        assert_eq!(iter.next(), Some(150));
        iter.advance_if_needed(180);
        assert_eq!(iter.next(), Some(149));
        iter.advance_if_needed(99);
        assert_eq!(iter.peek_next(), None);
    }

    #[test]
    fn rank_iterator_tracks_skips() {
        let container = Container::from_range(1000..3000);
        let mut iter = container.rank_iter();
        iter.advance_if_needed(2500);
        assert_eq!(iter.peek_next_rank(), 1501);
        assert_eq!(iter.peek_next_rank(), container.rank(2500));
        iter.advance_if_needed(5000);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.peek_next_rank(), 2001);
    }
}
