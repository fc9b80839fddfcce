// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use crate::location::FieldLocation;
use crate::word::Word;

/// Represents an invalid bit pattern for a field with a custom representation.
///
/// This is returned as the error type when reading such fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidBits<Raw>(pub Raw);

/// Sign extension of a primitive integer from a narrower bit width.
pub trait SignExtend: Copy {
    /// Replicates bit `width - 1` of `self` into every higher bit. For
    /// unsigned types, and for any `width` of at least the type's width, this
    /// is the identity.
    #[must_use]
    fn sign_extend(self, width: usize) -> Self;
}

/// The declared value type of a field over a backing word `W`.
///
/// Implemented for `bool` and every primitive integer. Custom
/// representations are most easily declared with
/// [`bitfield_repr`][crate::bitfield_repr].
pub trait FieldValue<W: Word>: Sized {
    /// The result of reading the field. This is `Self` unless not every bit
    /// pattern is a valid `Self`.
    type Output;

    /// Converts the extracted, unshifted bits of the field at `location`.
    fn from_field(bits: W, location: &FieldLocation) -> Self::Output;

    /// Converts the value to raw bits. Bits beyond the field width are
    /// discarded by the caller.
    fn into_field(self) -> W;
}

macro_rules! sign_extend {
    (unsigned: $($ty:ty),*; signed: $($sty:ty),*) => {
        $(
            impl SignExtend for $ty {
                #[inline]
                fn sign_extend(self, _width: usize) -> Self {
                    self
                }
            }
        )*
        $(
            impl SignExtend for $sty {
                #[inline]
                fn sign_extend(self, width: usize) -> Self {
                    let bits = <$sty>::BITS as usize;
                    if width >= bits {
                        self
                    } else {
                        let unused = bits - width;
                        (self << unused) >> unused
                    }
                }
            }
        )*
    };
}

sign_extend!(
    unsigned: u8, u16, u32, u64, u128, usize;
    signed: i8, i16, i32, i64, i128, isize
);

macro_rules! integer_values {
    ($($word:ty),*) => {
        $(
            integer_values!(@word $word;
                u8 u16 u32 u64 u128 usize i8 i16 i32 i64 i128 isize);

            impl FieldValue<$word> for bool {
                type Output = bool;

                #[inline]
                fn from_field(bits: $word, _location: &FieldLocation) -> bool {
                    bits != 0
                }

                #[inline]
                fn into_field(self) -> $word {
                    <$word>::from(self)
                }
            }
        )*
    };
    (@word $word:ty; $($value:ty)*) => {
        $(
            impl FieldValue<$word> for $value {
                type Output = $value;

                #[inline]
                #[allow(
                    clippy::cast_lossless,
                    clippy::cast_possible_truncation,
                    clippy::cast_possible_wrap
                )]
                fn from_field(bits: $word, location: &FieldLocation) -> $value {
                    location.sign_extend(bits as $value)
                }

                #[inline]
                #[allow(
                    clippy::cast_lossless,
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss
                )]
                fn into_field(self) -> $word {
                    self as $word
                }
            }
        )*
    };
}

integer_values!(u8, u16, u32, u64, u128, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extension() {
        assert_eq!(0b111i8.sign_extend(3), -1);
        assert_eq!(0b100i16.sign_extend(3), -4);
        assert_eq!(0b011i32.sign_extend(3), 3);
        assert_eq!(0b111u8.sign_extend(3), 0b111);
        assert_eq!(i64::MIN.sign_extend(64), i64::MIN);
        assert_eq!(1isize.sign_extend(1), -1);
    }

    #[test]
    fn conversions() {
        let loc = FieldLocation::new(3, 7);
        assert_eq!(<i32 as FieldValue<u8>>::from_field(0x1f, &loc), -1);
        assert_eq!(<u32 as FieldValue<u8>>::from_field(0x1f, &loc), 0x1f);
        assert_eq!(<i8 as FieldValue<u64>>::from_field(0x10, &loc), -16);
        assert!(<bool as FieldValue<u16>>::from_field(1, &FieldLocation::bit(9)));

        assert_eq!(FieldValue::<u8>::into_field(-1i32), 0xff);
        assert_eq!(FieldValue::<u32>::into_field(true), 1);
        assert_eq!(FieldValue::<u16>::into_field(0x1_2345u64), 0x2345);
    }
}
