//! Compressed bitmaps of `u32` values, built on three container encodings.
//!
//! ```
//! use roaring_core::Bitmap;
//!
//! let mut bitmap = Bitmap::new();
//! bitmap.add_range(0..100_000);
//! bitmap.add(1 << 31);
//! bitmap.remove(500);
//!
//! assert_eq!(bitmap.cardinality(), 100_000);
//! assert!(!bitmap.contains(500));
//! assert_eq!(bitmap.maximum(), Some(1 << 31));
//! ```

pub mod container;

mod bitmap;
mod error;

pub use bitmap::{
    or_all_with, Bitmap, BitmapBatchIterator, BitmapIterator, BitmapReverseIterator,
    BitmapSupplier, Deserializer, LazyBitmap, Portable, RoaringBitmapSupplier, Serializer,
};
pub use error::{Error, Result};
