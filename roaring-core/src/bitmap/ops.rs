use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::Bitmap;

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.minimum(), self.maximum()) {
            (Some(min), Some(max)) if self.cardinality() >= 32 => write!(
                f,
                "Bitmap<{:?} values between {:?} and {:?}>",
                self.cardinality(),
                min,
                max
            ),
            _ => write!(f, "Bitmap<{:?}>", self.to_vec()),
        }
    }
}

impl PartialEq for Bitmap {
    /// Two bitmaps are equal when they hold the same values, whatever the encoding of
    /// their containers
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add_range(0..1000);
    ///
    /// let mut bitmap2: Bitmap = (0..1000).collect();
    /// bitmap2.run_optimize();
    ///
    /// assert_eq!(bitmap1, bitmap2);
    /// ```
    #[inline]
    fn eq(&self, other: &Bitmap) -> bool {
        self.keys == other.keys && self.containers == other.containers
    }
}

impl Eq for Bitmap {}

impl BitAnd for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.and`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add(1);
    ///
    /// let mut bitmap2 = Bitmap::new();
    /// bitmap2.add(1);
    /// bitmap2.add(2);
    ///
    /// let bitmap3 = bitmap1 & bitmap2;
    ///
    /// assert!(bitmap3.contains(1));
    /// assert!(!bitmap3.contains(2));
    /// ```
    #[inline]
    fn bitand(mut self, other: Bitmap) -> Bitmap {
        self.and_inplace(&other);
        self
    }
}

impl<'a> BitAnd<&'a Bitmap> for Bitmap {
    type Output = Bitmap;

    #[inline]
    fn bitand(mut self, other: &'a Bitmap) -> Bitmap {
        self.and_inplace(other);
        self
    }
}

impl<'a, 'b> BitAnd<&'a Bitmap> for &'b Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.and`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1, 5, 0x0001_0000]);
    /// let bitmap2 = Bitmap::of(&[5, 6, 0x0001_0000]);
    ///
    /// let bitmap3 = &bitmap1 & &bitmap2;
    ///
    /// assert_eq!(bitmap3.to_vec(), [5, 0x0001_0000]);
    /// ```
    #[inline]
    fn bitand(self, other: &'a Bitmap) -> Bitmap {
        self.and(other)
    }
}

impl BitAndAssign for Bitmap {
    #[inline]
    fn bitand_assign(&mut self, other: Bitmap) {
        self.and_inplace(&other);
    }
}

impl<'a> BitAndAssign<&'a Bitmap> for Bitmap {
    /// Syntactic sugar for `.and_inplace`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    /// let mut bitmap3 = Bitmap::of(&[15]);
    ///
    /// bitmap1 &= &bitmap2;
    /// assert!(!bitmap1.contains(15));
    /// assert!(!bitmap1.contains(25));
    ///
    /// bitmap3 &= &Bitmap::of(&[15, 25]);
    /// assert!(bitmap3.contains(15));
    /// ```
    #[inline]
    fn bitand_assign(&mut self, other: &'a Bitmap) {
        self.and_inplace(other);
    }
}

impl BitOr for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.or`
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
    /// let bitmap3 = bitmap1 | bitmap2;
    ///
    /// assert_eq!(bitmap3.cardinality(), 2);
    /// assert!(bitmap3.contains(15));
    /// assert!(bitmap3.contains(25));
    /// ```
    #[inline]
    fn bitor(mut self, other: Bitmap) -> Bitmap {
        self.or_inplace(&other);
        self
    }
}

impl<'a> BitOr<&'a Bitmap> for Bitmap {
    type Output = Bitmap;

    #[inline]
    fn bitor(mut self, other: &'a Bitmap) -> Bitmap {
        self.or_inplace(other);
        self
    }
}

impl<'a, 'b> BitOr<&'a Bitmap> for &'b Bitmap {
    type Output = Bitmap;

    #[inline]
    fn bitor(self, other: &'a Bitmap) -> Bitmap {
        self.or(other)
    }
}

impl BitOrAssign for Bitmap {
    #[inline]
    fn bitor_assign(&mut self, other: Bitmap) {
        self.or_inplace(&other);
    }
}

impl<'a> BitOrAssign<&'a Bitmap> for Bitmap {
    /// Syntactic sugar for `.or_inplace`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[0x0002_0000]);
    ///
    /// bitmap1 |= &bitmap2;
    ///
    /// assert_eq!(bitmap1.to_vec(), [15, 0x0002_0000]);
    /// ```
    #[inline]
    fn bitor_assign(&mut self, other: &'a Bitmap) {
        self.or_inplace(other);
    }
}

impl BitXor for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.xor`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add(15);
    /// bitmap1.add(25);
    ///
    /// let mut bitmap2 = Bitmap::new();
    /// bitmap2.add(25);
    /// bitmap2.add(35);
    ///
    /// let bitmap3 = bitmap1 ^ bitmap2;
    ///
    /// assert_eq!(bitmap3.cardinality(), 2);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// assert!(bitmap3.contains(35));
    /// ```
    #[inline]
    fn bitxor(mut self, other: Bitmap) -> Bitmap {
        self.xor_inplace(&other);
        self
    }
}

impl<'a> BitXor<&'a Bitmap> for Bitmap {
    type Output = Bitmap;

    #[inline]
    fn bitxor(mut self, other: &'a Bitmap) -> Bitmap {
        self.xor_inplace(other);
        self
    }
}

impl<'a, 'b> BitXor<&'a Bitmap> for &'b Bitmap {
    type Output = Bitmap;

    #[inline]
    fn bitxor(self, other: &'a Bitmap) -> Bitmap {
        self.xor(other)
    }
}

impl BitXorAssign for Bitmap {
    #[inline]
    fn bitxor_assign(&mut self, other: Bitmap) {
        self.xor_inplace(&other);
    }
}

impl<'a> BitXorAssign<&'a Bitmap> for Bitmap {
    /// Syntactic sugar for `.xor_inplace`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// bitmap1 ^= &bitmap2;
    ///
    /// assert_eq!(bitmap1.to_vec(), [15, 35]);
    /// ```
    #[inline]
    fn bitxor_assign(&mut self, other: &'a Bitmap) {
        self.xor_inplace(other);
    }
}

impl Sub for Bitmap {
    type Output = Bitmap;

    /// Syntactic sugar for `.andnot`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add(15);
    /// bitmap1.add(25);
    ///
    /// let mut bitmap2 = Bitmap::new();
    /// bitmap2.add(25);
    /// bitmap2.add(35);
    ///
    /// let bitmap3 = bitmap1 - bitmap2;
    ///
    /// assert_eq!(bitmap3.cardinality(), 1);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// assert!(!bitmap3.contains(35));
    /// ```
    #[inline]
    fn sub(mut self, other: Bitmap) -> Bitmap {
        self.andnot_inplace(&other);
        self
    }
}

impl<'a> Sub<&'a Bitmap> for Bitmap {
    type Output = Bitmap;

    #[inline]
    fn sub(mut self, other: &'a Bitmap) -> Bitmap {
        self.andnot_inplace(other);
        self
    }
}

impl<'a, 'b> Sub<&'a Bitmap> for &'b Bitmap {
    type Output = Bitmap;

    #[inline]
    fn sub(self, other: &'a Bitmap) -> Bitmap {
        self.andnot(other)
    }
}

impl SubAssign for Bitmap {
    #[inline]
    fn sub_assign(&mut self, other: Bitmap) {
        self.andnot_inplace(&other);
    }
}

impl<'a> SubAssign<&'a Bitmap> for Bitmap {
    /// Syntactic sugar for `.andnot_inplace`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add_range(0..100_000);
    ///
    /// bitmap1 -= &Bitmap::of(&[5, 70_000]);
    ///
    /// assert_eq!(bitmap1.cardinality(), 99_998);
    /// assert!(!bitmap1.contains(5));
    /// assert!(!bitmap1.contains(70_000));
    /// ```
    #[inline]
    fn sub_assign(&mut self, other: &'a Bitmap) {
        self.andnot_inplace(other);
    }
}
