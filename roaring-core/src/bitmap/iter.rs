use std::iter::FusedIterator;

use super::{chunk_base, split, Bitmap};
use crate::container::{
    BatchIterator, ContainerIter, ContainerOps, PeekableIterator, ReverseContainerIter,
};

/// Ascending iterator over the values of a [`Bitmap`]
#[derive(Clone)]
pub struct BitmapIterator<'a> {
    bitmap: &'a Bitmap,
    // Index of the container `current` walks; may equal the container count once exhausted
    index: usize,
    base: u32,
    current: ContainerIter<'a>,
}

impl<'a> BitmapIterator<'a> {
    fn new(bitmap: &'a Bitmap) -> Self {
        let mut iter = BitmapIterator {
            bitmap,
            index: 0,
            base: 0,
            current: ContainerIter::empty(),
        };
        iter.load(0);
        iter
    }

    /// Points the iterator at the start of container `index`
    #[inline]
    fn load(&mut self, index: usize) {
        self.index = index;
        match self.bitmap.containers.get(index) {
            Some(container) => {
                self.base = chunk_base(self.bitmap.keys[index]);
                self.current = container.iter();
            }
            None => self.current = ContainerIter::empty(),
        }
    }

    /// Moves past exhausted containers. Every stored container is non-empty, so one step
    /// is always enough.
    #[inline]
    fn settle(&mut self) {
        if !self.current.has_next() && self.index < self.bitmap.containers.len() {
            self.load(self.index + 1);
        }
    }

    /// Attempt to read many values from the iterator into `dst`
    ///
    /// Returns the number of items read from the iterator, may be `< dst.len()` iff
    /// the iterator is exhausted.
    ///
    /// This can be much more efficient than repeated iteration.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap: Bitmap = Bitmap::new();
    /// bitmap.add_range(0..100);
    /// bitmap.add(222);
    /// bitmap.add(555);
    ///
    /// let mut buf = [0; 100];
    /// let mut iter = bitmap.iter();
    /// assert_eq!(iter.next_many(&mut buf), 100);
    /// // Get the first 100 items, from the original range added
    /// for (i, item) in buf.iter().enumerate() {
    ///     assert_eq!(*item, i as u32);
    /// }
    /// // Calls to next_many() can be interleaved with calls to next()
    /// assert_eq!(iter.next(), Some(222));
    /// assert_eq!(iter.next_many(&mut buf), 1);
    /// assert_eq!(buf[0], 555);
    ///
    /// assert_eq!(iter.next(), None);
    /// assert_eq!(iter.next_many(&mut buf), 0);
    /// ```
    pub fn next_many(&mut self, dst: &mut [u32]) -> usize {
        let mut count = 0;
        while count < dst.len() {
            let written = self.current.next_batch(self.base, &mut dst[count..]);
            count += written;
            if written == 0 || !self.current.has_next() {
                if self.index >= self.bitmap.containers.len() {
                    break;
                }
                self.load(self.index + 1);
            }
        }
        count
    }

    /// Reset the iterator to the first value `>= val`
    ///
    /// This can move the iterator forwards or backwards.
    ///
    /// # Examples
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[0, 1, 100, 1000, u32::MAX]);
    /// let mut iter = bitmap.iter();
    /// iter.reset_at_or_after(0);
    /// assert_eq!(iter.next(), Some(0));
    /// iter.reset_at_or_after(0);
    /// assert_eq!(iter.next(), Some(0));
    ///
    /// iter.reset_at_or_after(101);
    /// assert_eq!(iter.next(), Some(1000));
    /// assert_eq!(iter.next(), Some(u32::MAX));
    /// assert_eq!(iter.next(), None);
    /// iter.reset_at_or_after(u32::MAX);
    /// assert_eq!(iter.next(), Some(u32::MAX));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn reset_at_or_after(&mut self, val: u32) {
        let (key, low) = split(val);
        let index = self.bitmap.keys.partition_point(|&k| k < key);
        self.load(index);
        if self.bitmap.keys.get(index) == Some(&key) {
            self.current.advance_if_needed(low);
            self.settle();
        }
    }
}

impl<'a> Iterator for BitmapIterator<'a> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.current.next_absolute(self.base) {
                return Some(value);
            }
            if self.index >= self.bitmap.containers.len() {
                return None;
            }
            self.load(self.index + 1);
        }
    }
}

impl FusedIterator for BitmapIterator<'_> {}

impl PeekableIterator for BitmapIterator<'_> {
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    /// use roaring_core::container::PeekableIterator;
    ///
    /// let bitmap = Bitmap::of(&[3, 0x0001_0000]);
    /// let mut iter = bitmap.iter();
    /// assert_eq!(iter.peek_next(), Some(3));
    /// assert_eq!(iter.next(), Some(3));
    /// assert_eq!(iter.peek_next(), Some(0x0001_0000));
    /// ```
    fn peek_next(&self) -> Option<u32> {
        if let Some(low) = self.current.peek_next() {
            return Some(self.base | u32::from(low));
        }
        let next = self.index + 1;
        let container = self.bitmap.containers.get(next)?;
        let low = container.minimum()?;
        Some(chunk_base(self.bitmap.keys[next]) | u32::from(low))
    }

    fn advance_if_needed(&mut self, min: u32) {
        if self.peek_next().map_or(false, |next| next < min) {
            self.reset_at_or_after(min);
        }
    }
}

/// Descending iterator over the values of a [`Bitmap`]
///
/// # Examples
///
/// ```
/// use roaring_core::Bitmap;
/// use roaring_core::container::PeekableIterator;
///
/// let bitmap = Bitmap::of(&[1, 5, 70_000, 70_001]);
/// let mut iter = bitmap.reverse_iter();
/// assert_eq!(iter.next(), Some(70_001));
/// iter.advance_if_needed(69_999);
/// assert_eq!(iter.peek_next(), Some(5));
/// assert_eq!(iter.collect::<Vec<_>>(), [5, 1]);
/// ```
#[derive(Clone)]
pub struct BitmapReverseIterator<'a> {
    bitmap: &'a Bitmap,
    // Containers below this index have not been started; `current` walks this one
    index: usize,
    base: u32,
    current: ReverseContainerIter<'a>,
}

impl<'a> BitmapReverseIterator<'a> {
    fn new(bitmap: &'a Bitmap) -> Self {
        let mut iter = BitmapReverseIterator {
            bitmap,
            index: bitmap.containers.len(),
            base: 0,
            current: ReverseContainerIter::empty(),
        };
        iter.load_previous();
        iter
    }

    /// Points the iterator at the end of the container before the current one, returning
    /// false if there is none
    #[inline]
    fn load_previous(&mut self) -> bool {
        match self.index.checked_sub(1) {
            Some(index) => {
                self.index = index;
                self.base = chunk_base(self.bitmap.keys[index]);
                self.current = self.bitmap.containers[index].reverse_iter();
                true
            }
            None => {
                self.current = ReverseContainerIter::empty();
                false
            }
        }
    }

    /// Reset the iterator to the last value `<= val`
    ///
    /// This can move the iterator forwards or backwards.
    ///
    /// # Examples
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[0, 1, 100, 1000, u32::MAX]);
    /// let mut iter = bitmap.reverse_iter();
    /// iter.reset_at_or_before(999);
    /// assert_eq!(iter.next(), Some(100));
    /// iter.reset_at_or_before(u32::MAX);
    /// assert_eq!(iter.next(), Some(u32::MAX));
    /// iter.reset_at_or_before(0);
    /// assert_eq!(iter.next(), Some(0));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn reset_at_or_before(&mut self, val: u32) {
        let (key, low) = split(val);
        self.index = self.bitmap.keys.partition_point(|&k| k <= key);
        if !self.load_previous() {
            return;
        }
        if self.bitmap.keys[self.index] == key {
            self.current.advance_if_needed(low);
            if !self.current.has_next() {
                self.load_previous();
            }
        }
    }
}

impl<'a> Iterator for BitmapReverseIterator<'a> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.current.next() {
                return Some(self.base | u32::from(value));
            }
            if !self.load_previous() {
                return None;
            }
        }
    }
}

impl FusedIterator for BitmapReverseIterator<'_> {}

impl PeekableIterator for BitmapReverseIterator<'_> {
    fn peek_next(&self) -> Option<u32> {
        if let Some(low) = self.current.peek_next() {
            return Some(self.base | u32::from(low));
        }
        let previous = self.index.checked_sub(1)?;
        let high = self.bitmap.containers[previous].maximum()?;
        Some(chunk_base(self.bitmap.keys[previous]) | u32::from(high))
    }

    fn advance_if_needed(&mut self, max: u32) {
        if self.peek_next().map_or(false, |next| next > max) {
            self.reset_at_or_before(max);
        }
    }
}

/// Batch iterator over every chunk of a [`Bitmap`], reusing a single [`BatchIterator`]
///
/// # Examples
///
/// ```
/// use roaring_core::Bitmap;
///
/// let mut bitmap = Bitmap::new();
/// bitmap.add_range(10..15);
/// bitmap.add_range(0x0003_0000..0x0003_0002);
///
/// let mut batches = bitmap.batch_iter();
/// let mut buf = [0u32; 4];
/// assert_eq!(batches.next_batch(&mut buf), 4);
/// assert_eq!(buf, [10, 11, 12, 13]);
/// assert_eq!(batches.next_batch(&mut buf), 1);
/// assert_eq!(buf[0], 14);
/// assert_eq!(batches.next_batch(&mut buf), 2);
/// assert_eq!(&buf[..2], &[0x0003_0000, 0x0003_0001]);
/// assert_eq!(batches.next_batch(&mut buf), 0);
/// ```
#[derive(Clone)]
pub struct BitmapBatchIterator<'a> {
    bitmap: &'a Bitmap,
    index: usize,
    batch: BatchIterator<'a>,
}

impl<'a> BitmapBatchIterator<'a> {
    fn new(bitmap: &'a Bitmap) -> Self {
        let mut batch = BatchIterator::new();
        if let Some(container) = bitmap.containers.first() {
            batch.wrap(container);
        }
        BitmapBatchIterator {
            bitmap,
            index: 0,
            batch,
        }
    }

    /// Fills `buf` with the next values of the current chunk, moving to the next chunk when
    /// it is exhausted.
    ///
    /// A single call never mixes values from two chunks. Returns 0 once every chunk has
    /// been read.
    pub fn next_batch(&mut self, buf: &mut [u32]) -> usize {
        if buf.is_empty() {
            return 0;
        }
        loop {
            let key = match self.bitmap.keys.get(self.index) {
                Some(&key) => key,
                None => return 0,
            };
            let written = self.batch.next_batch(chunk_base(key), buf);
            if written > 0 {
                return written;
            }
            self.batch.release_container();
            self.index += 1;
            if let Some(container) = self.bitmap.containers.get(self.index) {
                self.batch.wrap(container);
            }
        }
    }

    /// Returns true if any values remain
    pub fn has_next(&self) -> bool {
        self.batch.has_next() || self.index + 1 < self.bitmap.containers.len()
    }
}

impl Bitmap {
    /// Returns an iterator over each value stored in the bitmap.
    /// Returned values are ordered in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(4);
    /// bitmap.add(3);
    /// bitmap.add(2);
    /// let mut iterator = bitmap.iter();
    ///
    /// assert_eq!(iterator.next(), Some(2));
    /// assert_eq!(iterator.next(), Some(3));
    /// assert_eq!(iterator.next(), Some(4));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> BitmapIterator<'_> {
        BitmapIterator::new(self)
    }

    /// Returns an iterator over each value stored in the bitmap, in descending order
    pub fn reverse_iter(&self) -> BitmapReverseIterator<'_> {
        BitmapReverseIterator::new(self)
    }

    /// Returns a batch iterator over the values of the bitmap, chunk by chunk
    pub fn batch_iter(&self) -> BitmapBatchIterator<'_> {
        BitmapBatchIterator::new(self)
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = u32;
    type IntoIter = BitmapIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<u32> for Bitmap {
    /// Convenience method for creating bitmap from iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap: Bitmap = (1..3).collect();
    ///
    /// assert!(!bitmap.is_empty());
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert_eq!(bitmap.cardinality(), 2);
    /// ```
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.extend(iter);
        bitmap
    }
}

impl Extend<u32> for Bitmap {
    fn extend<T: IntoIterator<Item = u32>>(&mut self, iter: T) {
        for item in iter {
            self.add(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bitmap {
        let mut bitmap = Bitmap::new();
        bitmap.add_range(0..5000);
        bitmap.add_many(&[70_000, 70_002, 200_000]);
        bitmap.add_range(0x0005_0000..0x0005_1000);
        bitmap
    }

    #[test]
    fn next_many_crosses_chunks() {
        let bitmap = sample();
        let mut iter = bitmap.iter();
        let mut buf = vec![0u32; 4998];
        assert_eq!(iter.next_many(&mut buf), 4998);
        assert_eq!(iter.next_many(&mut buf[..4]), 4);
        assert_eq!(&buf[..4], &[4998, 4999, 70_000, 70_002]);
        assert_eq!(iter.next(), Some(200_000));
    }

    #[test]
    fn advance_if_needed_never_moves_back() {
        let bitmap = sample();
        let mut iter = bitmap.iter();
        iter.advance_if_needed(70_001);
        assert_eq!(iter.peek_next(), Some(70_002));
        iter.advance_if_needed(10);
        assert_eq!(iter.peek_next(), Some(70_002));
        iter.advance_if_needed(70_003);
        assert_eq!(iter.next(), Some(200_000));
        iter.advance_if_needed(u32::MAX);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn batch_iterator_matches_iterator() {
        let bitmap = sample();
        for size in [1, 7, 65536] {
            let mut batches = bitmap.batch_iter();
            let mut buf = vec![0u32; size];
            let mut collected = Vec::new();
            loop {
                let n = batches.next_batch(&mut buf);
                if n == 0 {
                    break;
                }
                collected.extend_from_slice(&buf[..n]);
            }
            assert!(!batches.has_next());
            assert_eq!(collected, bitmap.to_vec());
        }
    }

    #[test]
    fn reverse_iterator_mirrors_iterator() {
        let bitmap = sample();
        let mut expected = bitmap.to_vec();
        expected.reverse();
        assert!(bitmap.reverse_iter().eq(expected.iter().copied()));

        let mut iter = bitmap.reverse_iter();
        iter.advance_if_needed(70_001);
        assert_eq!(iter.peek_next(), Some(70_000));
        iter.advance_if_needed(u32::MAX);
        assert_eq!(iter.next(), Some(70_000));
        iter.advance_if_needed(69_999);
        assert_eq!(iter.next(), Some(4999));
        iter.advance_if_needed(0);
        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.peek_next(), None);
    }
}
