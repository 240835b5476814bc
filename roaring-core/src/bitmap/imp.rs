use std::cmp::Ordering;
use std::mem;
use std::ops::{Bound, ControlFlow, RangeBounds};

use tracing::debug;

use super::{chunk_base, chunk_ranges, split, Bitmap};
use crate::container::{Container, ContainerKind, ContainerOps, RelativeRangeConsumer};

/// One past the largest value a bitmap can hold
const UNIVERSE: u64 = 1 << 32;

impl Bitmap {
    /// Creates a new bitmap (initially empty)
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::new();
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Bitmap {
            keys: Vec::new(),
            containers: Vec::new(),
        }
    }

    /// Creates a new bitmap (initially empty) with room for `capacity` chunks
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::with_capacity(16);
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Bitmap {
            keys: Vec::with_capacity(capacity),
            containers: Vec::with_capacity(capacity),
        }
    }

    /// Creates a new bitmap from a slice of u32 integers
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let elements = vec![1, 2];
    ///
    /// let bitmap = Bitmap::of(&elements);
    ///
    /// let mut bitmap2 = Bitmap::new();
    ///
    /// for element in &elements {
    ///     bitmap2.add(*element);
    /// }
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert!(!bitmap.contains(3));
    /// assert_eq!(bitmap, bitmap2);
    /// ```
    #[inline]
    pub fn of(elements: &[u32]) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.add_many(elements);
        bitmap
    }

    /// Add the integer element to the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.is_empty());
    /// bitmap.add(1);
    /// assert!(!bitmap.is_empty());
    /// ```
    #[inline]
    pub fn add(&mut self, element: u32) {
        self.add_checked(element);
    }

    /// Add the integer element to the bitmap. Returns true if the value was
    /// added, false if the value was already in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.add_checked(1));
    /// assert!(!bitmap.add_checked(1));
    /// ```
    #[inline]
    pub fn add_checked(&mut self, element: u32) -> bool {
        let (key, low) = split(element);
        self.container_or_insert_with(key, Container::new).add(low)
    }

    /// Add every element of the slice to the bitmap
    ///
    /// Runs of elements sharing a chunk are added without looking the chunk up again.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_many(&[1, 2, 3, 0x0005_0000]);
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert!(bitmap.contains(3));
    /// assert!(bitmap.contains(0x0005_0000));
    /// ```
    pub fn add_many(&mut self, elements: &[u32]) {
        let mut rest = elements;
        while let Some(&first) = rest.first() {
            let (key, _) = split(first);
            let same_chunk = rest
                .iter()
                .position(|&value| split(value).0 != key)
                .unwrap_or(rest.len());
            let container = self.container_or_insert_with(key, Container::new);
            for &value in &rest[..same_chunk] {
                container.add(value as u16);
            }
            rest = &rest[same_chunk..];
        }
    }

    /// Add all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add_range((1..3));
    ///
    /// assert!(!bitmap1.is_empty());
    /// assert!(bitmap1.contains(1));
    /// assert!(bitmap1.contains(2));
    /// assert!(!bitmap1.contains(3));
    ///
    /// let mut bitmap2 = Bitmap::new();
    /// bitmap2.add_range((3..1));
    /// assert!(bitmap2.is_empty());
    ///
    /// let mut bitmap3 = Bitmap::new();
    /// bitmap3.add_range((3..3));
    /// assert!(bitmap3.is_empty());
    ///
    /// let mut bitmap4 = Bitmap::new();
    /// bitmap4.add_range(..=2);
    /// bitmap4.add_range(u32::MAX..=u32::MAX);
    /// assert!(bitmap4.contains(0));
    /// assert!(bitmap4.contains(1));
    /// assert!(bitmap4.contains(2));
    /// assert!(bitmap4.contains(u32::MAX));
    /// assert_eq!(bitmap4.cardinality(), 4);
    /// ```
    pub fn add_range<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_exclusive(range);
        for (key, range) in chunk_ranges(start, end) {
            if range.len() == 1 << 16 {
                *self.container_or_insert_with(key, Container::new) = Container::full();
                continue;
            }
            let mut inserted = false;
            let container = self.container_or_insert_with(key, || {
                inserted = true;
                Container::from_range(range.clone())
            });
            if !inserted {
                container.add_range(range);
            }
        }
    }

    /// Remove all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_range((1..4));
    /// assert!(!bitmap.is_empty());
    ///
    /// bitmap.remove_range((1..3));
    ///
    /// assert!(!bitmap.contains(1));
    /// assert!(!bitmap.contains(2));
    /// assert!(bitmap.contains(3));
    ///
    /// bitmap.add_range(u32::MAX..=u32::MAX);
    /// assert!(bitmap.contains(u32::MAX));
    /// ```
    pub fn remove_range<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_exclusive(range);
        for (key, range) in chunk_ranges(start, end) {
            if let Ok(index) = self.find(key) {
                self.containers[index].remove_range(range);
                self.prune(index);
            }
        }
    }

    /// Check whether a range of values of range are present
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 2]);
    /// assert!(bitmap.contains_range((1..3)));
    /// assert!(!bitmap.contains_range((1..4)));
    ///
    /// let mut bitmap = bitmap.clone();
    /// bitmap.add(u32::MAX - 1);
    /// bitmap.add(u32::MAX);
    /// assert!(bitmap.contains_range((u32::MAX - 1)..=u32::MAX))
    /// ```
    pub fn contains_range<R: RangeBounds<u32>>(&self, range: R) -> bool {
        let (start, end) = range_to_exclusive(range);
        chunk_ranges(start, end).all(|(key, range)| match self.container(key) {
            Some(container) => container.range_cardinality(range.clone()) == range.len() as u32,
            None => false,
        })
    }

    /// Empties the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(1);
    /// bitmap.add(2);
    /// bitmap.clear();
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.keys.clear();
        self.containers.clear();
    }

    /// Clear the integer element from the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(1);
    /// bitmap.remove(1);
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn remove(&mut self, element: u32) {
        self.remove_checked(element);
    }

    /// Remove the integer element from the bitmap. Returns true if the value
    /// was removed, false if the value was not present in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(1);
    /// assert!(bitmap.remove_checked(1));
    /// assert!(!bitmap.remove_checked(1));
    /// ```
    pub fn remove_checked(&mut self, element: u32) -> bool {
        let (key, low) = split(element);
        match self.find(key) {
            Ok(index) => {
                let removed = self.containers[index].remove(low);
                self.prune(index);
                removed
            }
            Err(_) => false,
        }
    }

    /// Contains returns true if the integer element is contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1]);
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(!bitmap.contains(2));
    /// ```
    #[inline]
    pub fn contains(&self, element: u32) -> bool {
        let (key, low) = split(element);
        self.container(key).map_or(false, |container| container.contains(low))
    }

    /// Returns number of elements in range
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 3, 4]);
    ///
    /// assert_eq!(bitmap.range_cardinality((..1)), 0);
    /// assert_eq!(bitmap.range_cardinality((..2)), 1);
    /// assert_eq!(bitmap.range_cardinality((2..5)), 2);
    /// assert_eq!(bitmap.range_cardinality((..5)), 3);
    /// assert_eq!(bitmap.range_cardinality((1..=4)), 3);
    /// assert_eq!(bitmap.range_cardinality(..), 3);
    /// ```
    pub fn range_cardinality<R: RangeBounds<u32>>(&self, range: R) -> u64 {
        let (start, end) = range_to_exclusive(range);
        chunk_ranges(start, end)
            .filter_map(|(key, range)| {
                let container = self.container(key)?;
                Some(u64::from(container.range_cardinality(range)))
            })
            .sum()
    }

    /// Returns the number of integers contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1]);
    ///
    /// assert_eq!(bitmap.cardinality(), 1);
    ///
    /// let mut bitmap = bitmap.clone();
    ///
    /// bitmap.add(2);
    ///
    /// assert_eq!(bitmap.cardinality(), 2);
    /// ```
    #[inline]
    pub fn cardinality(&self) -> u64 {
        self.containers
            .iter()
            .map(|container| u64::from(container.cardinality()))
            .sum()
    }

    /// Returns true if the Bitmap is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    ///
    /// assert!(bitmap.is_empty());
    ///
    /// bitmap.add(1);
    ///
    /// assert!(!bitmap.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Returns the smallest value in the set.
    ///
    /// Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap: Bitmap = [120, 1000].iter().copied().collect();
    /// let empty_bitmap = Bitmap::new();
    ///
    /// assert_eq!(bitmap.minimum(), Some(120));
    /// assert_eq!(empty_bitmap.minimum(), None);
    /// ```
    #[inline]
    pub fn minimum(&self) -> Option<u32> {
        let container = self.containers.first()?;
        let low = container.minimum()?;
        Some(chunk_base(self.keys[0]) | u32::from(low))
    }

    /// Returns the greatest value in the set.
    ///
    /// Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap: Bitmap = [120, 1000].iter().copied().collect();
    /// let empty_bitmap = Bitmap::new();
    ///
    /// assert_eq!(bitmap.maximum(), Some(1000));
    /// assert_eq!(empty_bitmap.maximum(), None);
    /// ```
    #[inline]
    pub fn maximum(&self) -> Option<u32> {
        let container = self.containers.last()?;
        let low = container.maximum()?;
        Some(chunk_base(self.keys[self.keys.len() - 1]) | u32::from(low))
    }

    /// Rank returns the number of values smaller or equal to x.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (5..10).collect();
    ///
    /// assert_eq!(bitmap.rank(8), 4);
    ///
    /// bitmap.add(15);
    ///
    /// assert_eq!(bitmap.rank(11), 5);
    /// assert_eq!(bitmap.rank(15), 6);
    /// ```
    pub fn rank(&self, x: u32) -> u64 {
        let (key, low) = split(x);
        let below = self.keys.partition_point(|&k| k < key);
        let mut rank: u64 = self.containers[..below]
            .iter()
            .map(|container| u64::from(container.cardinality()))
            .sum();
        if self.keys.get(below) == Some(&key) {
            rank += u64::from(self.containers[below].rank(low));
        }
        rank
    }

    /// Select returns the element having the designated rank, if it exists
    /// If the size of the roaring bitmap is strictly greater than rank,
    /// then this function returns element of given rank wrapped in Some.
    /// Otherwise, it returns None.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap: Bitmap = (5..10).collect();
    ///
    /// assert_eq!(bitmap.select(0), Some(5));
    /// assert_eq!(bitmap.select(1), Some(6));
    /// assert_eq!(bitmap.select(2), Some(7));
    /// assert_eq!(bitmap.select(3), Some(8));
    /// assert_eq!(bitmap.select(4), Some(9));
    /// assert_eq!(bitmap.select(5), None);
    /// ```
    pub fn select(&self, rank: u32) -> Option<u32> {
        let mut remaining = rank;
        for (key, container) in self.containers() {
            let cardinality = container.cardinality();
            if remaining < cardinality {
                let low = container.select(remaining)?;
                return Some(chunk_base(key) | u32::from(low));
            }
            remaining -= cardinality;
        }
        None
    }

    /// And computes the intersection between two bitmaps and returns the result
    /// as a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1]);
    /// let bitmap2 = Bitmap::of(&[1, 2]);
    ///
    /// let bitmap3 = bitmap1.and(&bitmap2);
    ///
    /// assert!(bitmap3.contains(1));
    /// assert!(!bitmap3.contains(2));
    /// ```
    pub fn and(&self, other: &Self) -> Self {
        self.merge(other, false, false, Container::and)
    }

    /// Computes the intersection between two bitmaps and stores the result
    /// in the current bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    /// let mut bitmap3 = Bitmap::of(&[15]);
    /// let bitmap4 = Bitmap::of(&[15, 25]);
    ///
    /// bitmap1.and_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 0);
    /// assert!(!bitmap1.contains(15));
    /// assert!(!bitmap1.contains(25));
    ///
    /// bitmap3.and_inplace(&bitmap4);
    ///
    /// assert_eq!(bitmap3.cardinality(), 1);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// ```
    pub fn and_inplace(&mut self, other: &Self) {
        self.merge_inplace(other, false, false, Container::and_inplace);
    }

    /// Or computes the union between two bitmaps and returns the result
    /// as a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    ///
    /// let bitmap3 = bitmap1.or(&bitmap2);
    ///
    /// assert_eq!(bitmap3.cardinality(), 2);
    /// assert!(bitmap3.contains(15));
    /// assert!(bitmap3.contains(25));
    /// ```
    pub fn or(&self, other: &Self) -> Self {
        self.merge(other, true, true, Container::or)
    }

    /// Computes the union between two bitmaps and stores the result in
    /// the current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    ///
    /// bitmap1.or_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 2);
    /// assert!(bitmap1.contains(15));
    /// assert!(bitmap1.contains(25));
    /// ```
    pub fn or_inplace(&mut self, other: &Self) {
        self.merge_inplace(other, true, true, Container::or_inplace);
    }

    /// Computes the union between many bitmaps quickly, as opposed to having
    /// to call or repeatedly.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add(15);
    ///
    /// let mut bitmap2 = Bitmap::new();
    /// bitmap2.add(25);
    ///
    /// let mut bitmap3 = Bitmap::new();
    /// bitmap3.add(35);
    ///
    /// let bitmap4 = Bitmap::fast_or(&[&bitmap1, &bitmap2, &bitmap3]);
    ///
    /// assert_eq!(bitmap4.cardinality(), 3);
    /// assert!(bitmap4.contains(15));
    /// assert!(bitmap4.contains(25));
    /// assert!(bitmap4.contains(35));
    /// ```
    pub fn fast_or(bitmaps: &[&Bitmap]) -> Self {
        let mut result = Bitmap::new();
        result.lazy_batch(|lazy| {
            for bitmap in bitmaps {
                lazy.or_inplace(bitmap);
            }
        });
        result
    }

    /// Computes the symmetric difference (xor) between two bitmaps
    /// and returns new bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// let bitmap3 = bitmap1.xor(&bitmap2);
    ///
    /// assert_eq!(bitmap3.cardinality(), 2);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// assert!(bitmap3.contains(35));
    /// ```
    pub fn xor(&self, other: &Self) -> Self {
        self.merge(other, true, true, Container::xor)
    }

    /// Inplace version of xor, stores result in the current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// bitmap1.xor_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 2);
    /// assert!(bitmap1.contains(15));
    /// assert!(!bitmap1.contains(25));
    /// assert!(bitmap1.contains(35));
    /// ```
    pub fn xor_inplace(&mut self, other: &Self) {
        self.merge_inplace(other, true, true, Container::xor_inplace);
    }

    /// Computes the difference between two bitmaps and returns the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// let bitmap3 = bitmap1.andnot(&bitmap2);
    ///
    /// assert_eq!(bitmap3.cardinality(), 1);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// assert!(!bitmap3.contains(35));
    /// ```
    pub fn andnot(&self, other: &Self) -> Self {
        self.merge(other, true, false, Container::andnot)
    }

    /// Computes the difference between two bitmaps and stores the result
    /// in the current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// bitmap1.andnot_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 1);
    /// assert!(bitmap1.contains(15));
    /// assert!(!bitmap1.contains(25));
    /// assert!(!bitmap1.contains(35));
    /// ```
    pub fn andnot_inplace(&mut self, other: &Self) {
        self.merge_inplace(other, true, false, Container::andnot_inplace);
    }

    /// Returns true if the two bitmaps share at least one value
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1, 0x0002_0000]);
    /// let bitmap2 = Bitmap::of(&[2, 0x0002_0000]);
    /// let bitmap3 = Bitmap::of(&[3]);
    ///
    /// assert!(bitmap1.intersect(&bitmap2));
    /// assert!(!bitmap1.intersect(&bitmap3));
    /// ```
    pub fn intersect(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    if self.containers[i].intersects(&other.containers[j]) {
                        return true;
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        false
    }

    /// Return true if all the elements of Self are in &other.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1: Bitmap = (5..10).collect();
    /// let bitmap2: Bitmap = (5..8).collect();
    /// let bitmap3: Bitmap = (5..10).collect();
    /// let bitmap4: Bitmap = (9..11).collect();
    ///
    /// assert!(bitmap2.is_subset(&bitmap1));
    /// assert!(bitmap3.is_subset(&bitmap1));
    /// assert!(!bitmap4.is_subset(&bitmap1));
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        self.containers().all(|(key, container)| match other.container(key) {
            Some(theirs) => container.andnot(theirs).is_empty(),
            None => false,
        })
    }

    /// Return the size of the intersection between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1]);
    /// let bitmap2 = Bitmap::of(&[1, 2]);
    ///
    /// assert_eq!(bitmap1.and_cardinality(&bitmap2), 1);
    /// ```
    pub fn and_cardinality(&self, other: &Self) -> u64 {
        let (mut i, mut j) = (0, 0);
        let mut count = 0;
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    count += u64::from(self.containers[i].and_cardinality(&other.containers[j]));
                    i += 1;
                    j += 1;
                }
            }
        }
        count
    }

    /// Return the size of the union between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    ///
    /// assert_eq!(bitmap1.or_cardinality(&bitmap2), 2);
    /// ```
    pub fn or_cardinality(&self, other: &Self) -> u64 {
        self.cardinality() + other.cardinality() - self.and_cardinality(other)
    }

    /// Return the size of the difference between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// assert_eq!(bitmap1.andnot_cardinality(&bitmap2), 1);
    /// ```
    pub fn andnot_cardinality(&self, other: &Self) -> u64 {
        self.cardinality() - self.and_cardinality(other)
    }

    /// Return the size of the symmetric difference between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// assert_eq!(bitmap1.xor_cardinality(&bitmap2), 2);
    /// ```
    pub fn xor_cardinality(&self, other: &Self) -> u64 {
        self.cardinality() + other.cardinality() - 2 * self.and_cardinality(other)
    }

    /// Negates the bits in the given range
    /// any integer present in this range and in the bitmap is removed.
    /// Returns result as a new bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[4]);
    ///
    /// let bitmap2 = bitmap1.flip(1..3);
    ///
    /// assert_eq!(bitmap2.cardinality(), 3);
    /// assert!(bitmap2.contains(1));
    /// assert!(bitmap2.contains(2));
    /// assert!(!bitmap2.contains(3));
    /// assert!(bitmap2.contains(4));
    ///
    /// let bitmap3 = bitmap1.flip(1..=5);
    /// assert_eq!(bitmap3.to_vec(), [1, 2, 3, 5])
    /// ```
    pub fn flip<R: RangeBounds<u32>>(&self, range: R) -> Self {
        let mut flipped = self.clone();
        flipped.flip_inplace(range);
        flipped
    }

    /// Negates the bits in the given range
    /// any integer present in this range and in the bitmap is removed.
    /// Stores the result in the current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[4]);
    /// bitmap1.flip_inplace(1..3);
    ///
    /// assert_eq!(bitmap1.cardinality(), 3);
    /// assert!(bitmap1.contains(1));
    /// assert!(bitmap1.contains(2));
    /// assert!(!bitmap1.contains(3));
    /// assert!(bitmap1.contains(4));
    /// bitmap1.flip_inplace(4..=4);
    /// assert_eq!(bitmap1.to_vec(), [1, 2]);
    /// ```
    pub fn flip_inplace<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_exclusive(range);
        for (key, range) in chunk_ranges(start, end) {
            match self.find(key) {
                Ok(index) => {
                    self.containers[index].flip_range(range);
                    self.prune(index);
                }
                Err(index) => {
                    self.keys.insert(index, key);
                    self.containers.insert(index, Container::from_range(range));
                }
            }
        }
    }

    /// Returns the smallest value in the bitmap that is at least `from`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[3, 70_000]);
    /// assert_eq!(bitmap.next_value(0), Some(3));
    /// assert_eq!(bitmap.next_value(4), Some(70_000));
    /// assert_eq!(bitmap.next_value(70_001), None);
    /// ```
    pub fn next_value(&self, from: u32) -> Option<u32> {
        let (key, low) = split(from);
        let mut index = self.keys.partition_point(|&k| k < key);
        if self.keys.get(index) == Some(&key) {
            if let Some(value) = self.containers[index].next_value(low) {
                return Some(chunk_base(key) | u32::from(value));
            }
            index += 1;
        }
        let container = self.containers.get(index)?;
        let low = container.minimum()?;
        Some(chunk_base(self.keys[index]) | u32::from(low))
    }

    /// Returns the largest value in the bitmap that is at most `from`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[3, 70_000]);
    /// assert_eq!(bitmap.previous_value(u32::MAX), Some(70_000));
    /// assert_eq!(bitmap.previous_value(69_999), Some(3));
    /// assert_eq!(bitmap.previous_value(2), None);
    /// ```
    pub fn previous_value(&self, from: u32) -> Option<u32> {
        let (key, low) = split(from);
        let mut index = self.keys.partition_point(|&k| k <= key);
        if index > 0 && self.keys[index - 1] == key {
            if let Some(value) = self.containers[index - 1].previous_value(low) {
                return Some(chunk_base(key) | u32::from(value));
            }
            index -= 1;
        }
        let index = index.checked_sub(1)?;
        let high = self.containers[index].maximum()?;
        Some(chunk_base(self.keys[index]) | u32::from(high))
    }

    /// Returns the smallest value absent from the bitmap that is at least `from`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_range(10..200_000);
    /// assert_eq!(bitmap.next_absent_value(5), Some(5));
    /// assert_eq!(bitmap.next_absent_value(10), Some(200_000));
    ///
    /// bitmap.add_range(..);
    /// assert_eq!(bitmap.next_absent_value(0), None);
    /// ```
    pub fn next_absent_value(&self, from: u32) -> Option<u32> {
        let (mut key, mut low) = split(from);
        loop {
            let absent = match self.container(key) {
                None => Some(low),
                Some(container) => container.next_absent_value(low),
            };
            if let Some(absent) = absent {
                return Some(chunk_base(key) | u32::from(absent));
            }
            key = key.checked_add(1)?;
            low = 0;
        }
    }

    /// Returns the largest value absent from the bitmap that is at most `from`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_range(10..200_000);
    /// assert_eq!(bitmap.previous_absent_value(300_000), Some(300_000));
    /// assert_eq!(bitmap.previous_absent_value(199_999), Some(9));
    ///
    /// bitmap.add_range(0..10);
    /// assert_eq!(bitmap.previous_absent_value(199_999), None);
    /// ```
    pub fn previous_absent_value(&self, from: u32) -> Option<u32> {
        let (mut key, mut low) = split(from);
        loop {
            let absent = match self.container(key) {
                None => Some(low),
                Some(container) => container.previous_absent_value(low),
            };
            if let Some(absent) = absent {
                return Some(chunk_base(key) | u32::from(absent));
            }
            key = key.checked_sub(1)?;
            low = u16::MAX;
        }
    }

    /// Returns a vector containing all of the integers stored in the Bitmap
    /// in sorted order.
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[15, 25]);
    ///
    /// assert_eq!(bitmap.to_vec(), [15, 25]);
    /// ```
    pub fn to_vec(&self) -> Vec<u32> {
        let mut values = Vec::with_capacity(self.cardinality() as usize);
        for (key, container) in self.containers() {
            let base = chunk_base(key);
            values.extend(container.iter().map(|low| base | u32::from(low)));
        }
        values
    }

    /// Remove run-length encoding even when it is more space efficient
    ///
    /// Returns true if a change was applied
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_range(0..100);
    /// bitmap.add_range(200..300);
    ///
    /// assert!(bitmap.remove_run_compression());
    /// assert!(!bitmap.remove_run_compression());
    /// assert_eq!(bitmap.cardinality(), 200);
    /// ```
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = 0;
        for container in &mut self.containers {
            if container.kind() == ContainerKind::Run {
                container.replace_with(Container::remove_run_compression);
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, "removed run compression");
        }
        changed > 0
    }

    /// Compresses the bitmap with run-length encoding where it pays off
    ///
    /// Returns true if the result has at least one run container
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_many(&[1, 2, 3, 4, 5, 6, 7, 8]);
    ///
    /// assert!(bitmap.run_optimize());
    /// assert_eq!(bitmap.cardinality(), 8);
    ///
    /// let mut sparse = Bitmap::of(&[1, 100, 10_000]);
    /// assert!(!sparse.run_optimize());
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        let mut changed = 0;
        for container in &mut self.containers {
            let before = container.kind();
            container.replace_with(Container::run_optimize);
            if container.kind() != before {
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, "run optimization changed container encodings");
        }
        self.containers
            .iter()
            .any(|container| container.kind() == ContainerKind::Run)
    }

    /// Releases unused capacity held by the bitmap and its containers
    pub fn shrink_to_fit(&mut self) {
        self.keys.shrink_to_fit();
        self.containers.shrink_to_fit();
        for container in &mut self.containers {
            container.shrink_to_fit();
        }
    }

    /// Reports every value in `start..start + length` to `consumer`, as positions relative to
    /// `start`.
    ///
    /// Positions are reported in ascending order, each exactly once, as present or absent.
    /// Chunks without a container are reported as absent runs, and so are positions beyond
    /// `u32::MAX`.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    /// use roaring_core::container::RelativeRangeConsumer;
    ///
    /// #[derive(Default)]
    /// struct Counter {
    ///     present: u32,
    ///     absent: u32,
    /// }
    ///
    /// impl RelativeRangeConsumer for Counter {
    ///     fn accept_present(&mut self, _pos: u32) {
    ///         self.present += 1;
    ///     }
    ///     fn accept_absent(&mut self, _pos: u32) {
    ///         self.absent += 1;
    ///     }
    ///     fn accept_all_present(&mut self, from: u32, to: u32) {
    ///         self.present += to - from;
    ///     }
    ///     fn accept_all_absent(&mut self, from: u32, to: u32) {
    ///         self.absent += to - from;
    ///     }
    /// }
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_range(65_530..65_540);
    ///
    /// let mut counter = Counter::default();
    /// bitmap.for_all_in_range(65_500, 1_000_000, &mut counter);
    /// assert_eq!(counter.present, 10);
    /// assert_eq!(counter.absent, 1_000_000 - 10);
    /// ```
    pub fn for_all_in_range<C>(&self, start: u32, length: u32, consumer: &mut C)
    where
        C: RelativeRangeConsumer + ?Sized,
    {
        let start64 = u64::from(start);
        let end64 = start64 + u64::from(length);
        let clamped = end64.min(UNIVERSE);
        for (key, range) in chunk_ranges(start64, clamped) {
            let origin = chunk_base(key) + range.start;
            let mut shifted = Shifted {
                inner: &mut *consumer,
                delta: start.wrapping_sub(origin),
            };
            match self.container(key) {
                Some(container) => {
                    container.for_all_in_range(range.start, range.end, &mut shifted)
                }
                None => shifted.accept_all_absent(0, range.end - range.start),
            }
        }
        if clamped < end64 {
            let from = (clamped - start64) as u32;
            consumer.accept_all_absent(from, length);
        }
    }

    /// Calls `f` on every value in ascending order, stopping early on `ControlFlow::Break`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::ops::ControlFlow;
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 3, 100, 200]);
    /// let mut seen = Vec::new();
    /// let result = bitmap.for_each(|value| {
    ///     if value > 50 {
    ///         return ControlFlow::Break(value);
    ///     }
    ///     seen.push(value);
    ///     ControlFlow::Continue(())
    /// });
    /// assert_eq!(result, ControlFlow::Break(100));
    /// assert_eq!(seen, [1, 2, 3]);
    /// ```
    pub fn for_each<F, O>(&self, mut f: F) -> ControlFlow<O>
    where
        F: FnMut(u32) -> ControlFlow<O>,
    {
        for (key, container) in self.containers() {
            let base = chunk_base(key);
            for low in container.iter() {
                f(base | u32::from(low))?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Combines the containers of both bitmaps key by key into a new bitmap
    fn merge(
        &self,
        other: &Self,
        keep_left: bool,
        keep_right: bool,
        both: impl Fn(&Container, &Container) -> Container,
    ) -> Self {
        let mut result = Bitmap::new();
        let (mut i, mut j) = (0, 0);
        while let Some(ordering) = next_key_order(self.keys.get(i), other.keys.get(j)) {
            let (key, container) = match ordering {
                Ordering::Equal => {
                    let merged = both(&self.containers[i], &other.containers[j]);
                    i += 1;
                    j += 1;
                    (self.keys[i - 1], merged)
                }
                Ordering::Less => {
                    i += 1;
                    if !keep_left {
                        continue;
                    }
                    (self.keys[i - 1], self.containers[i - 1].clone())
                }
                Ordering::Greater => {
                    j += 1;
                    if !keep_right {
                        continue;
                    }
                    (other.keys[j - 1], other.containers[j - 1].clone())
                }
            };
            if !container.is_empty() {
                result.push_container(key, container);
            }
        }
        result
    }

    /// In-place counterpart of [`Bitmap::merge`], reusing the containers of `self`
    fn merge_inplace(
        &mut self,
        other: &Self,
        keep_left: bool,
        keep_right: bool,
        both: impl Fn(&mut Container, &Container),
    ) {
        let keys = mem::take(&mut self.keys);
        let mut containers = mem::take(&mut self.containers).into_iter();
        self.keys.reserve(keys.len());
        self.containers.reserve(keys.len());

        let (mut i, mut j) = (0, 0);
        while let Some(ordering) = next_key_order(keys.get(i), other.keys.get(j)) {
            let (key, container) = match ordering {
                Ordering::Equal => {
                    let mut container = containers.next().unwrap_or_default();
                    both(&mut container, &other.containers[j]);
                    i += 1;
                    j += 1;
                    (keys[i - 1], container)
                }
                Ordering::Less => {
                    let container = containers.next().unwrap_or_default();
                    i += 1;
                    if !keep_left {
                        continue;
                    }
                    (keys[i - 1], container)
                }
                Ordering::Greater => {
                    j += 1;
                    if !keep_right {
                        continue;
                    }
                    (other.keys[j - 1], other.containers[j - 1].clone())
                }
            };
            if !container.is_empty() {
                self.push_container(key, container);
            }
        }
    }
}

/// Which side of a key merge to advance, or `None` once both sides are exhausted
#[inline]
fn next_key_order(left: Option<&u16>, right: Option<&u16>) -> Option<Ordering> {
    match (left, right) {
        (None, None) => None,
        (Some(_), None) => Some(Ordering::Less),
        (None, Some(_)) => Some(Ordering::Greater),
        (Some(l), Some(r)) => Some(l.cmp(r)),
    }
}

/// Translates offsets within one chunk's query into offsets from the bitmap query start
struct Shifted<'c, C: ?Sized> {
    inner: &'c mut C,
    // `offset - delta` (mod 2^32) is the position relative to the bitmap query
    delta: u32,
}

impl<C: RelativeRangeConsumer + ?Sized> RelativeRangeConsumer for Shifted<'_, C> {
    #[inline]
    fn accept_present(&mut self, pos: u32) {
        self.inner.accept_present(pos.wrapping_sub(self.delta));
    }

    #[inline]
    fn accept_absent(&mut self, pos: u32) {
        self.inner.accept_absent(pos.wrapping_sub(self.delta));
    }

    #[inline]
    fn accept_all_present(&mut self, from: u32, to: u32) {
        self.inner
            .accept_all_present(from.wrapping_sub(self.delta), to.wrapping_sub(self.delta));
    }

    #[inline]
    fn accept_all_absent(&mut self, from: u32, to: u32) {
        if to - from == 1 {
            self.inner.accept_absent(from.wrapping_sub(self.delta));
        } else {
            self.inner
                .accept_all_absent(from.wrapping_sub(self.delta), to.wrapping_sub(self.delta));
        }
    }
}

fn range_to_exclusive<R: RangeBounds<u32>>(range: R) -> (u64, u64) {
    let start = match range.start_bound() {
        Bound::Included(&i) => u64::from(i),
        Bound::Excluded(&i) => u64::from(i) + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => u64::from(i) + 1,
        Bound::Excluded(&i) => u64::from(i),
        Bound::Unbounded => UNIVERSE,
    };
    (start, end)
}
