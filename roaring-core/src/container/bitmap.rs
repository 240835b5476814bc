use std::fmt;
use std::ops::Range;

use super::{
    ContainerIter, ContainerOps, RelativeRangeConsumer, ReverseContainerIter, MAX_CARDINALITY,
};

/// Number of 64-bit words in a bitmap container
pub const BITMAP_WORDS: usize = 1024;

/// One bit per value of the chunk, with the number of set bits cached
#[derive(Clone, PartialEq, Eq)]
pub struct BitmapContainer {
    words: Box<[u64; BITMAP_WORDS]>,
    cardinality: u32,
}

impl BitmapContainer {
    /// Creates an empty bitmap container
    #[inline]
    pub fn new() -> Self {
        Self {
            words: Box::new([0; BITMAP_WORDS]),
            cardinality: 0,
        }
    }

    /// Creates a bitmap container with every bit set
    #[inline]
    pub fn full() -> Self {
        Self {
            words: Box::new([!0; BITMAP_WORDS]),
            cardinality: MAX_CARDINALITY,
        }
    }

    /// Wraps raw words, counting the bits once
    pub fn from_words(words: Box<[u64; BITMAP_WORDS]>) -> Self {
        let cardinality = count_ones(&words[..]);
        Self { words, cardinality }
    }

    /// Access the raw words
    #[inline]
    pub fn words(&self) -> &[u64; BITMAP_WORDS] {
        &self.words
    }

    /// Mutable word access that leaves the cached cardinality untouched.
    ///
    /// Callers must call [`BitmapContainer::recount`] before the container is used again.
    #[inline]
    pub(super) fn words_mut_deferred(&mut self) -> &mut [u64; BITMAP_WORDS] {
        &mut self.words
    }

    /// Recomputes the cached cardinality from the words
    #[inline]
    pub(super) fn recount(&mut self) {
        self.cardinality = count_ones(&self.words[..]);
    }

    /// Smallest set bit at or after `from`, if any
    pub fn next_set_bit(&self, from: u32) -> Option<u32> {
        if from >= MAX_CARDINALITY {
            return None;
        }
        let mut index = (from / 64) as usize;
        let mut word = self.words[index] & (!0u64 << (from % 64));
        loop {
            if word != 0 {
                return Some(index as u32 * 64 + word.trailing_zeros());
            }
            index += 1;
            if index == BITMAP_WORDS {
                return None;
            }
            word = self.words[index];
        }
    }

    /// Smallest clear bit at or after `from`, or 65536 if every remaining bit is set
    pub fn next_clear_bit(&self, from: u32) -> u32 {
        if from >= MAX_CARDINALITY {
            return MAX_CARDINALITY;
        }
        let mut index = (from / 64) as usize;
        let mut word = !self.words[index] & (!0u64 << (from % 64));
        loop {
            if word != 0 {
                return index as u32 * 64 + word.trailing_zeros();
            }
            index += 1;
            if index == BITMAP_WORDS {
                return MAX_CARDINALITY;
            }
            word = !self.words[index];
        }
    }

    /// Largest set bit at or before `from`, if any
    pub fn previous_set_bit(&self, from: u16) -> Option<u32> {
        let mut index = usize::from(from / 64);
        let mut word = self.words[index] & (!0u64 >> (63 - from % 64));
        loop {
            if word != 0 {
                return Some(index as u32 * 64 + 63 - word.leading_zeros());
            }
            index = index.checked_sub(1)?;
            word = self.words[index];
        }
    }

    /// Largest clear bit at or before `from`, if any
    pub fn previous_clear_bit(&self, from: u16) -> Option<u32> {
        let mut index = usize::from(from / 64);
        let mut word = !self.words[index] & (!0u64 >> (63 - from % 64));
        loop {
            if word != 0 {
                return Some(index as u32 * 64 + 63 - word.leading_zeros());
            }
            index = index.checked_sub(1)?;
            word = !self.words[index];
        }
    }

    /// Flips every bit in `range`
    pub fn flip_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        let words = &mut self.words;
        let mut cardinality = self.cardinality;
        for_each_masked_word(range, |index, mask| {
            let before = (words[index] & mask).count_ones();
            words[index] ^= mask;
            cardinality = cardinality - before + (mask.count_ones() - before);
        });
        self.cardinality = cardinality;
    }

    /// Sets the bit for every value of `values`
    pub(crate) fn add_many(&mut self, values: &[u16]) {
        for &value in values {
            self.add(value);
        }
    }
}

impl Default for BitmapContainer {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerOps for BitmapContainer {
    #[inline]
    fn cardinality(&self) -> u32 {
        self.cardinality
    }

    #[inline]
    fn contains(&self, value: u16) -> bool {
        let (index, mask) = locate(value);
        self.words[index] & mask != 0
    }

    #[inline]
    fn add(&mut self, value: u16) -> bool {
        let (index, mask) = locate(value);
        let word = &mut self.words[index];
        let added = *word & mask == 0;
        *word |= mask;
        self.cardinality += u32::from(added);
        added
    }

    #[inline]
    fn remove(&mut self, value: u16) -> bool {
        let (index, mask) = locate(value);
        let word = &mut self.words[index];
        let removed = *word & mask != 0;
        *word &= !mask;
        self.cardinality -= u32::from(removed);
        removed
    }

    fn add_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        debug_assert!(range.end <= MAX_CARDINALITY);
        let words = &mut self.words;
        let mut added = 0;
        for_each_masked_word(range, |index, mask| {
            added += (mask & !words[index]).count_ones();
            words[index] |= mask;
        });
        self.cardinality += added;
    }

    fn remove_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        let words = &mut self.words;
        let mut removed = 0;
        for_each_masked_word(range, |index, mask| {
            removed += (mask & words[index]).count_ones();
            words[index] &= !mask;
        });
        self.cardinality -= removed;
    }

    fn minimum(&self) -> Option<u16> {
        self.next_set_bit(0).map(|v| v as u16)
    }

    fn maximum(&self) -> Option<u16> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, word)| **word != 0)
            .map(|(index, word)| (index as u32 * 64 + 63 - word.leading_zeros()) as u16)
    }

    fn rank(&self, value: u16) -> u32 {
        let (index, _) = locate(value);
        let below = count_ones(&self.words[..index]);
        let mask = !0u64 >> (63 - u32::from(value) % 64);
        below + (self.words[index] & mask).count_ones()
    }

    fn select(&self, rank: u32) -> Option<u16> {
        if rank >= self.cardinality {
            return None;
        }
        let mut remaining = rank;
        for (index, &word) in self.words.iter().enumerate() {
            let ones = word.count_ones();
            if remaining < ones {
                let mut word = word;
                for _ in 0..remaining {
                    word &= word - 1;
                }
                return Some((index as u32 * 64 + word.trailing_zeros()) as u16);
            }
            remaining -= ones;
        }
        None
    }

    fn number_of_runs(&self) -> u32 {
        let mut runs = 0;
        let mut previous_high_bit = 0u64;
        for &word in self.words.iter() {
            // A run starts at every set bit whose lower neighbour is clear
            let starts = word & !((word << 1) | previous_high_bit);
            runs += starts.count_ones();
            previous_high_bit = word >> 63;
        }
        runs
    }

    fn range_cardinality(&self, range: Range<u32>) -> u32 {
        if range.is_empty() {
            return 0;
        }
        let mut total = 0;
        for_each_masked_word(range, |index, mask| {
            total += (self.words[index] & mask).count_ones();
        });
        total
    }

    #[inline]
    fn size_in_bytes(&self) -> usize {
        super::convert::BITMAP_SIZE_IN_BYTES
    }

    #[inline]
    fn next_value(&self, from: u16) -> Option<u16> {
        self.next_set_bit(u32::from(from)).map(|v| v as u16)
    }

    #[inline]
    fn previous_value(&self, from: u16) -> Option<u16> {
        self.previous_set_bit(from).map(|v| v as u16)
    }

    #[inline]
    fn next_absent_value(&self, from: u16) -> Option<u16> {
        let absent = self.next_clear_bit(u32::from(from));
        (absent < MAX_CARDINALITY).then(|| absent as u16)
    }

    #[inline]
    fn previous_absent_value(&self, from: u16) -> Option<u16> {
        self.previous_clear_bit(from).map(|v| v as u16)
    }

    #[inline]
    fn iter(&self) -> ContainerIter<'_> {
        ContainerIter::bitmap(&self.words)
    }

    #[inline]
    fn reverse_iter(&self) -> ReverseContainerIter<'_> {
        ReverseContainerIter::bitmap(&self.words)
    }

    #[inline]
    fn for_all_in_range<C>(&self, from: u32, to: u32, consumer: &mut C)
    where
        C: RelativeRangeConsumer + ?Sized,
    {
        super::range::bitmap_for_all(self, from, to, consumer);
    }
}

impl fmt::Debug for BitmapContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitmapContainer<{} values>", self.cardinality)
    }
}

#[inline]
fn locate(value: u16) -> (usize, u64) {
    (usize::from(value / 64), 1u64 << (value % 64))
}

#[inline]
pub(super) fn count_ones(words: &[u64]) -> u32 {
    words.iter().map(|w| w.count_ones()).sum()
}

/// Calls `f(word_index, mask)` for every word touched by the non-empty `range`, with
/// `mask` selecting the bits of that word that fall inside the range.
#[inline]
pub(super) fn for_each_masked_word(range: Range<u32>, mut f: impl FnMut(usize, u64)) {
    debug_assert!(range.start < range.end && range.end <= MAX_CARDINALITY);
    let last = range.end - 1;
    let first_index = (range.start / 64) as usize;
    let last_index = (last / 64) as usize;
    let first_mask = !0u64 << (range.start % 64);
    let last_mask = !0u64 >> (63 - last % 64);
    if first_index == last_index {
        f(first_index, first_mask & last_mask);
        return;
    }
    f(first_index, first_mask);
    for index in first_index + 1..last_index {
        f(index, !0);
    }
    f(last_index, last_mask);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_range_keeps_cardinality() {
        let mut bitmap = BitmapContainer::new();
        bitmap.add(3);
        bitmap.add(200);
        bitmap.add_range(0..130);
        assert_eq!(bitmap.cardinality(), 131);
        assert_eq!(bitmap.number_of_runs(), 2);
        bitmap.remove_range(64..128);
        assert_eq!(bitmap.cardinality(), 67);
        assert_eq!(bitmap.cardinality(), count_ones(&bitmap.words()[..]));
    }

    #[test]
    fn next_set_and_clear_bits() {
        let mut bitmap = BitmapContainer::new();
        bitmap.add_range(100..300);
        assert_eq!(bitmap.next_set_bit(0), Some(100));
        assert_eq!(bitmap.next_set_bit(299), Some(299));
        assert_eq!(bitmap.next_set_bit(300), None);
        assert_eq!(bitmap.next_clear_bit(100), 300);
        assert_eq!(BitmapContainer::full().next_clear_bit(0), MAX_CARDINALITY);
    }

    #[test]
    fn flip_range_updates_cardinality() {
        let mut bitmap = BitmapContainer::new();
        bitmap.add_range(0..10);
        bitmap.flip_range(5..20);
        assert_eq!(bitmap.cardinality(), 15);
        assert!(!bitmap.contains(7));
        assert!(bitmap.contains(19));
    }

    #[test]
    fn rank_select_maximum() {
        let mut bitmap = BitmapContainer::new();
        bitmap.add(0);
        bitmap.add(63);
        bitmap.add(64);
        bitmap.add(65535);
        assert_eq!(bitmap.rank(63), 2);
        assert_eq!(bitmap.rank(65535), 4);
        assert_eq!(bitmap.select(2), Some(64));
        assert_eq!(bitmap.select(4), None);
        assert_eq!(bitmap.maximum(), Some(65535));
        assert_eq!(bitmap.minimum(), Some(0));
    }

    #[test]
    fn previous_set_and_clear_bits() {
        let mut bitmap = BitmapContainer::new();
        bitmap.add_range(100..300);
        assert_eq!(bitmap.previous_set_bit(99), None);
        assert_eq!(bitmap.previous_set_bit(100), Some(100));
        assert_eq!(bitmap.previous_set_bit(65535), Some(299));
        assert_eq!(bitmap.previous_clear_bit(250), Some(99));
        assert_eq!(bitmap.previous_clear_bit(300), Some(300));

        let full = BitmapContainer::full();
        assert_eq!(full.previous_clear_bit(65535), None);
        assert_eq!(full.next_absent_value(0), None);
        assert_eq!(full.previous_value(70), Some(70));
    }

    #[test]
    fn flip_range_across_words_matches_popcount() {
        let mut bitmap = BitmapContainer::new();
        bitmap.add_range(0..100);
        bitmap.flip_range(50..150);
        assert_eq!(bitmap.cardinality(), 100);
        assert_eq!(bitmap.range_cardinality(0..50), 50);
        assert_eq!(bitmap.range_cardinality(100..150), 50);
        assert_eq!(bitmap.cardinality(), count_ones(&bitmap.words()[..]));
    }
}
