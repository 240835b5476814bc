use std::ops::BitOrAssign;

use super::Bitmap;

/// Produces fresh, empty bitmaps
///
/// Lets generic code build result bitmaps without naming the concrete bitmap type.
pub trait BitmapSupplier {
    type Bitmap;

    /// A new empty bitmap
    fn get(&self) -> Self::Bitmap;
}

/// Supplies empty [`Bitmap`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct RoaringBitmapSupplier;

impl BitmapSupplier for RoaringBitmapSupplier {
    type Bitmap = Bitmap;

    #[inline]
    fn get(&self) -> Bitmap {
        Bitmap::new()
    }
}

impl<F, B> BitmapSupplier for F
where
    F: Fn() -> B,
{
    type Bitmap = B;

    #[inline]
    fn get(&self) -> B {
        self()
    }
}

/// Unions `bitmaps` into a bitmap obtained from `supplier`
///
/// # Examples
///
/// ```
/// use roaring_core::{or_all_with, Bitmap, RoaringBitmapSupplier};
///
/// let a = Bitmap::of(&[1, 2]);
/// let b = Bitmap::of(&[2, 0x0001_0000]);
///
/// let union = or_all_with(&RoaringBitmapSupplier, [&a, &b]);
/// assert_eq!(union.to_vec(), [1, 2, 0x0001_0000]);
///
/// // Any closure producing a bitmap works too
/// let seeded = or_all_with(&|| Bitmap::of(&[99]), [&a]);
/// assert_eq!(seeded.to_vec(), [1, 2, 99]);
/// ```
pub fn or_all_with<'a, S, I>(supplier: &S, bitmaps: I) -> S::Bitmap
where
    S: BitmapSupplier,
    S::Bitmap: BitOrAssign<&'a Bitmap>,
    I: IntoIterator<Item = &'a Bitmap>,
{
    let mut result = supplier.get();
    for bitmap in bitmaps {
        result |= bitmap;
    }
    result
}
