use std::ops::Range;

use crate::container::{Container, ContainerOps};

/// A compressed bitmap of `u32` values
///
/// Values are split by their high 16 bits into chunks. Each non-empty chunk is stored as a
/// [`Container`] next to its key; empty chunks are never stored.
#[derive(Clone, Default)]
pub struct Bitmap {
    // Strictly increasing, parallel to `containers`
    keys: Vec<u16>,
    containers: Vec<Container>,
}

mod imp;
mod iter;
mod lazy;
mod ops;
mod serialization;
mod supplier;

pub use self::iter::{BitmapBatchIterator, BitmapIterator, BitmapReverseIterator};
pub use self::lazy::LazyBitmap;
pub use self::serialization::{Deserializer, Portable, Serializer};
pub use self::supplier::{or_all_with, BitmapSupplier, RoaringBitmapSupplier};

/// Splits a value into its chunk key and its position inside the chunk
#[inline]
fn split(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

/// First value of the chunk identified by `key`
#[inline]
fn chunk_base(key: u16) -> u32 {
    u32::from(key) << 16
}

/// Splits the half-open `start..end` (with `end <= 2^32`) into per-chunk local ranges
fn chunk_ranges(start: u64, end: u64) -> impl Iterator<Item = (u16, Range<u32>)> {
    let keys = if end > start {
        (start >> 16)..((end - 1) >> 16) + 1
    } else {
        0..0
    };
    keys.map(move |key| {
        let base = key << 16;
        let local_start = start.max(base) - base;
        let local_end = end.min(base + (1 << 16)) - base;
        (key as u16, local_start as u32..local_end as u32)
    })
}

impl Bitmap {
    #[inline]
    fn find(&self, key: u16) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    #[inline]
    fn container(&self, key: u16) -> Option<&Container> {
        self.find(key).ok().map(|index| &self.containers[index])
    }

    /// The container for `key`, inserting `make()` if there is none
    fn container_or_insert_with(
        &mut self,
        key: u16,
        make: impl FnOnce() -> Container,
    ) -> &mut Container {
        let index = match self.find(key) {
            Ok(index) => index,
            Err(index) => {
                self.keys.insert(index, key);
                self.containers.insert(index, make());
                index
            }
        };
        &mut self.containers[index]
    }

    /// Drops the container at `index` if it holds no values
    #[inline]
    fn prune(&mut self, index: usize) {
        if self.containers[index].is_empty() {
            self.keys.remove(index);
            self.containers.remove(index);
        }
    }

    /// Appends a non-empty container whose key is larger than every key present
    #[inline]
    fn push_container(&mut self, key: u16, container: Container) {
        debug_assert!(self.keys.last().map_or(true, |&last| last < key));
        debug_assert!(!container.is_empty());
        self.keys.push(key);
        self.containers.push(container);
    }

    /// The chunks of the bitmap, as `(key, container)` pairs in ascending key order
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    /// use roaring_core::container::ContainerOps;
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 0x0003_0000]);
    /// let chunks: Vec<(u16, u32)> = bitmap
    ///     .containers()
    ///     .map(|(key, container)| (key, container.cardinality()))
    ///     .collect();
    /// assert_eq!(chunks, [(0, 2), (3, 1)]);
    /// ```
    pub fn containers(&self) -> impl ExactSizeIterator<Item = (u16, &Container)> + '_ {
        self.keys.iter().copied().zip(self.containers.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ranges_split_on_key_boundaries() {
        let chunks: Vec<_> = chunk_ranges(65530, 131080).collect();
        assert_eq!(chunks, [(0, 65530..65536), (1, 0..65536), (2, 0..8)]);
        assert_eq!(chunk_ranges(5, 5).count(), 0);
        let last: Vec<_> = chunk_ranges(u64::from(u32::MAX), 1 << 32).collect();
        assert_eq!(last, [(u16::MAX, 65535..65536)]);
    }

    #[test]
    fn split_and_join() {
        assert_eq!(split(0x0001_0002), (1, 2));
        assert_eq!(chunk_base(3) | 7, 0x0003_0007);
    }
}
