// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use core::fmt;
use core::ops::{BitAnd, BitOr, Not, Shl, Shr};

/// Implemented by unsigned integral types, this trait represents a valid
/// backing word for bitfield views: the integer that the field algebra masks
/// and shifts.
pub trait Word:
    Copy
    + Eq
    + fmt::Debug
    + fmt::LowerHex
    + Not<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Shl<usize, Output = Self>
    + Shr<usize, Output = Self>
    + private::Sealed
{
    /// The width of the word in bits.
    const BITS: usize;
    /// The all-zeros word.
    const ZERO: Self;
    /// The all-ones word.
    const ONES: Self;

    /// Truncates `value` to the width of the word.
    fn from_u128(value: u128) -> Self;

    /// Zero-extends the word to 128 bits.
    fn to_u128(self) -> u128;
}

macro_rules! word {
    ($($ty:ty),*) => {
        $(
            impl Word for $ty {
                const BITS: usize = <$ty>::BITS as usize;
                const ZERO: Self = 0;
                const ONES: Self = <$ty>::MAX;

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn from_u128(value: u128) -> Self {
                    value as $ty
                }

                #[inline]
                #[allow(clippy::cast_lossless)]
                fn to_u128(self) -> u128 {
                    self as u128
                }
            }

            impl private::Sealed for $ty {}
        )*
    };
}

word!(u8, u16, u32, u64, u128, usize);

// Ensures that no type outside of bitview can implement this type.
mod private {
    pub trait Sealed {}
}

#[cfg(test)]
mod tests {
    use super::Word;

    #[test]
    fn truncation() {
        assert_eq!(u8::from_u128(0x1_ff), 0xff);
        assert_eq!(u16::from_u128(0xabcd_1234), 0x1234);
        assert_eq!(u128::from_u128(u128::MAX), u128::MAX);
        assert_eq!(0xffu8.to_u128(), 0xff);
    }

    #[test]
    fn constants() {
        assert_eq!(<u8 as Word>::BITS, 8);
        assert_eq!(<u64 as Word>::ONES, u64::MAX);
        assert_eq!(<usize as Word>::BITS, usize::BITS as usize);
    }
}
