use tracing::trace;

use super::Bitmap;
use crate::container::lazy::{lazy_or, repair};

/// A bitmap in the middle of a batch of deferred unions
///
/// Only reachable through [`Bitmap::lazy_batch`], which repairs the bitmap once the batch
/// ends.
pub struct LazyBitmap<'a> {
    bitmap: &'a mut Bitmap,
}

impl<'a> LazyBitmap<'a> {
    /// Modifies the bitmap this lazy bitmap is associated with to be the union of the two bitmaps.
    #[inline]
    pub fn or_inplace(&mut self, other: &Bitmap) -> &mut Self {
        let bitmap = &mut *self.bitmap;
        for (key, container) in other.containers() {
            match bitmap.find(key) {
                Ok(index) => lazy_or(&mut bitmap.containers[index], container),
                Err(index) => {
                    bitmap.keys.insert(index, key);
                    bitmap.containers.insert(index, container.clone());
                }
            }
        }
        self
    }
}

impl<'a> std::ops::BitOrAssign<&Bitmap> for LazyBitmap<'a> {
    #[inline]
    fn bitor_assign(&mut self, other: &Bitmap) {
        self.or_inplace(other);
    }
}

impl Bitmap {
    /// Perform multiple unions on a bitmap.
    ///
    /// The passed closure will be passed a handle which can be used to perform unions on the bitmap lazily.
    ///
    /// The result will be equivalent to doing the same operations on this bitmap directly, but because of reduced
    /// bookkeeping in between operations, it should be faster
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// // Perform a series of unions on a bitmap:
    /// let mut bitmap = Bitmap::of(&[99]);
    /// let bitmaps_to_or = [Bitmap::of(&[1, 2, 5, 10]), Bitmap::of(&[1, 30, 100])];
    ///
    /// bitmap.lazy_batch(|lazy| {
    ///     for b in &bitmaps_to_or {
    ///         *lazy |= b;
    ///     }
    /// });
    /// let mut bitmap2 = Bitmap::of(&[99]);
    /// for b in &bitmaps_to_or {
    ///     bitmap2 |= b;
    /// }
    /// assert_eq!(bitmap, bitmap2);
    /// assert_eq!(bitmap.to_vec(), [1, 2, 5, 10, 30, 99, 100]);
    /// ```
    ///
    /// The result the passed closure is returned from `lazy_batch`
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// let bitmaps_to_or = [Bitmap::of(&[1, 2, 5, 10]), Bitmap::of(&[1, 30, 100])];
    /// let total_added = bitmap.lazy_batch(|lazy| {
    ///     let mut total = 0;
    ///     for b in &bitmaps_to_or {
    ///         lazy.or_inplace(b);
    ///         total += b.cardinality();
    ///     }
    ///     total
    /// });
    /// assert_eq!(total_added, 7);
    /// assert_eq!(bitmap.cardinality(), 6);
    /// ```
    pub fn lazy_batch<F, O>(&mut self, f: F) -> O
    where
        F: FnOnce(&mut LazyBitmap<'_>) -> O,
    {
        let mut guard = RepairOnDrop { bitmap: self };
        let mut lazy_bitmap = LazyBitmap {
            bitmap: &mut *guard.bitmap,
        };
        f(&mut lazy_bitmap)
    }
}

/// Repairs every container of the bitmap when dropped, including while unwinding
struct RepairOnDrop<'a> {
    bitmap: &'a mut Bitmap,
}

impl Drop for RepairOnDrop<'_> {
    fn drop(&mut self) {
        trace!(
            containers = self.bitmap.containers.len(),
            "repairing after lazy batch"
        );
        for container in &mut self.bitmap.containers {
            repair(container);
        }
    }
}
