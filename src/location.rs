// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Bit locations of fields and field sets, and the mask-and-shift algebra
//! over them.
//!
//! Descriptors never check that a location fits within the word they are
//! applied to. A location past the top of the word yields an unspecified
//! result, just as an oversized native bitfield would; [`layout!`] rejects
//! such declarations at compile time.
//!
//! [`layout!`]: crate::layout

use crate::value::SignExtend;
use crate::word::Word;

/// The location of a single field: an inclusive range of bit positions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldLocation {
    first_bit: usize,
    last_bit: usize,
}

impl FieldLocation {
    /// Creates a location spanning bits `first_bit` through `last_bit`,
    /// inclusive.
    ///
    /// # Panics
    ///
    /// Panics if `last_bit < first_bit`; in const context, this is a
    /// compile-time error.
    #[must_use]
    pub const fn new(first_bit: usize, last_bit: usize) -> Self {
        assert!(last_bit >= first_bit, "last bit precedes first bit");
        Self {
            first_bit,
            last_bit,
        }
    }

    /// Creates a width-1 location at `bit`.
    #[must_use]
    pub const fn bit(bit: usize) -> Self {
        Self::new(bit, bit)
    }

    /// The lowest bit position of the field.
    #[must_use]
    pub const fn first_bit(&self) -> usize {
        self.first_bit
    }

    /// The highest bit position of the field.
    #[must_use]
    pub const fn last_bit(&self) -> usize {
        self.last_bit
    }

    /// The width of the field in bits.
    #[must_use]
    pub const fn size_bits(&self) -> usize {
        1 + self.last_bit - self.first_bit
    }

    /// The bit shift of the field, which is its first bit.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.first_bit
    }

    /// The unshifted mask of the field. A field as wide as `W` yields all
    /// ones.
    #[inline]
    #[must_use]
    pub fn mask<W: Word>(&self) -> W {
        if self.size_bits() >= W::BITS {
            W::ONES
        } else {
            !(W::ONES << self.size_bits())
        }
    }

    /// Extracts the unshifted field value from `memory`.
    #[inline]
    #[must_use]
    pub fn extract_field<W: Word>(&self, memory: W) -> W {
        (memory >> self.offset()) & self.mask::<W>()
    }

    /// Masks `value` to the field width and shifts it into position.
    #[inline]
    #[must_use]
    pub fn position_field<W: Word>(&self, value: W) -> W {
        (value & self.mask::<W>()) << self.offset()
    }

    /// Replaces the field bits of `memory` with `value`, leaving every other
    /// bit untouched.
    #[inline]
    #[must_use]
    pub fn insert_field<W: Word>(&self, memory: W, value: W) -> W {
        (memory & !(self.mask::<W>() << self.offset()))
            | self.position_field(value)
    }

    /// Sign-extends `value` from the field width to the full width of `T`.
    /// This is the identity for unsigned `T`.
    #[inline]
    #[must_use]
    pub fn sign_extend<T: SignExtend>(&self, value: T) -> T {
        value.sign_extend(self.size_bits())
    }
}

/// The location of a set of `item_count` equally-sized, contiguous fields,
/// the first of which starts at `base_offset`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldSetLocation {
    item_size_bits: usize,
    item_count: usize,
    base_offset: usize,
}

impl FieldSetLocation {
    /// Creates a field set location.
    ///
    /// # Panics
    ///
    /// Panics if `item_size_bits` or `item_count` is zero; in const
    /// context, this is a compile-time error.
    #[must_use]
    pub const fn new(
        item_size_bits: usize,
        item_count: usize,
        base_offset: usize,
    ) -> Self {
        assert!(item_size_bits > 0, "field set items must be non-empty");
        assert!(item_count > 0, "field sets must have at least one item");
        Self {
            item_size_bits,
            item_count,
            base_offset,
        }
    }

    /// The width of each item in bits.
    #[must_use]
    pub const fn item_size_bits(&self) -> usize {
        self.item_size_bits
    }

    /// The number of items.
    #[must_use]
    pub const fn item_count(&self) -> usize {
        self.item_count
    }

    /// The first bit of item 0.
    #[must_use]
    pub const fn base_offset(&self) -> usize {
        self.base_offset
    }

    /// The first bit of item `index`. `index` is not range-checked.
    #[must_use]
    pub const fn offset(&self, index: usize) -> usize {
        self.base_offset + index * self.item_size_bits
    }

    /// The location of item `index`. `index` is not range-checked.
    #[must_use]
    pub const fn item(&self, index: usize) -> FieldLocation {
        let first_bit = self.offset(index);
        FieldLocation::new(first_bit, first_bit + self.item_size_bits - 1)
    }

    /// The location covering every item as a single field.
    #[must_use]
    pub const fn span(&self) -> FieldLocation {
        FieldLocation::new(
            self.base_offset,
            self.base_offset + self.item_size_bits * self.item_count - 1,
        )
    }

    /// The unshifted mask of a single item.
    #[inline]
    #[must_use]
    pub fn mask<W: Word>(&self) -> W {
        self.item(0).mask()
    }

    /// Extracts the unshifted value of item `index` from `memory`.
    #[inline]
    #[must_use]
    pub fn extract_field<W: Word>(&self, memory: W, index: usize) -> W {
        self.item(index).extract_field(memory)
    }

    /// Masks `value` to the item width and shifts it into the position of
    /// item `index`.
    #[inline]
    #[must_use]
    pub fn position_field<W: Word>(&self, value: W, index: usize) -> W {
        self.item(index).position_field(value)
    }

    /// Replaces the bits of item `index` in `memory` with `value`.
    #[inline]
    #[must_use]
    pub fn insert_field<W: Word>(
        &self,
        memory: W,
        value: W,
        index: usize,
    ) -> W {
        self.item(index).insert_field(memory, value)
    }

    /// Sign-extends `value` from the item width to the full width of `T`.
    #[inline]
    #[must_use]
    pub fn sign_extend<T: SignExtend>(&self, value: T) -> T {
        self.item(0).sign_extend(value)
    }
}

/// A type that names a [`FieldLocation`] at compile time.
pub trait StaticLocation {
    /// The location.
    const LOCATION: FieldLocation;
}

/// A type that names a [`FieldSetLocation`] at compile time.
pub trait StaticSetLocation {
    /// The location.
    const LOCATION: FieldSetLocation;
}

/// Type-level field location covering bits `FIRST` through `LAST`,
/// inclusive.
#[derive(Debug)]
pub enum Span<const FIRST: usize, const LAST: usize> {}

/// Type-level width-1 field location at bit `BIT`.
#[derive(Debug)]
pub enum Bit<const BIT: usize> {}

impl<const BIT: usize> StaticLocation for Bit<BIT> {
    const LOCATION: FieldLocation = FieldLocation::bit(BIT);
}

impl<const FIRST: usize, const LAST: usize> StaticLocation
    for Span<FIRST, LAST>
{
    const LOCATION: FieldLocation = FieldLocation::new(FIRST, LAST);
}

/// Type-level field set location of `COUNT` items of `SIZE` bits each,
/// starting at bit `OFFSET`.
#[derive(Debug)]
pub enum Items<const SIZE: usize, const COUNT: usize, const OFFSET: usize = 0> {}

impl<const SIZE: usize, const COUNT: usize, const OFFSET: usize>
    StaticSetLocation for Items<SIZE, COUNT, OFFSET>
{
    const LOCATION: FieldSetLocation =
        FieldSetLocation::new(SIZE, COUNT, OFFSET);
}

#[cfg(test)]
mod tests {
    use super::*;

    const BYTE: FieldLocation = FieldLocation::new(3, 7);
    const _: () = {
        assert!(BYTE.size_bits() == 5);
        assert!(BYTE.offset() == 3);
        assert!(<Items<2, 3, 1>>::LOCATION.offset(2) == 5);
        assert!(<Items<2, 3, 1>>::LOCATION.span().last_bit() == 6);
    };

    #[test]
    fn mask() {
        assert_eq!(BYTE.mask::<u8>(), 0x1f);
        assert_eq!(FieldLocation::bit(0).mask::<u32>(), 1);
        assert_eq!(FieldLocation::new(0, 7).mask::<u8>(), 0xff);
        assert_eq!(FieldLocation::new(0, 63).mask::<u64>(), u64::MAX);
        assert_eq!(FieldLocation::new(0, 127).mask::<u128>(), u128::MAX);
    }

    #[test]
    fn extract_position_insert() {
        assert_eq!(BYTE.extract_field(0b1010_1111u8), 0b1_0101);
        assert_eq!(BYTE.position_field(0xffu8), 0b1111_1000);
        assert_eq!(BYTE.insert_field(0b0000_0111u8, 0b1_0010), 0b1001_0111);
        assert_eq!(FieldLocation::new(0, 31).insert_field(0u32, u32::MAX), u32::MAX);
    }

    // Every in-range value round-trips through every field of a 16-bit word,
    // and bits outside the field are left as they were.
    #[test]
    fn round_trip_preserves_siblings() {
        for first_bit in 0..16 {
            for last_bit in first_bit..16 {
                let loc = FieldLocation::new(first_bit, last_bit);
                let field_mask = loc.mask::<u16>() << loc.offset();
                for memory in [0u16, 0xffff, 0xa5a5, 0x1234] {
                    for value in [0u16, 1, loc.mask::<u16>(), 0x5555 & loc.mask::<u16>()] {
                        let inserted = loc.insert_field(memory, value);
                        assert_eq!(loc.extract_field(inserted), value);
                        assert_eq!(inserted & !field_mask, memory & !field_mask);
                    }
                }
            }
        }
    }

    #[test]
    fn sign_extend() {
        assert_eq!(BYTE.sign_extend(0x1fi32), -1);
        assert_eq!(BYTE.sign_extend(0x10i32), -16);
        assert_eq!(BYTE.sign_extend(0x0fi32), 15);
        assert_eq!(BYTE.sign_extend(0x1fu32), 0x1f);
        assert_eq!(FieldLocation::new(0, 7).sign_extend(-128i8), -128);
        assert_eq!(FieldLocation::bit(4).sign_extend(1i8), -1);
    }

    #[test]
    fn field_set_items() {
        let set = FieldSetLocation::new(6, 2, 0);
        assert_eq!(set.item(1), FieldLocation::new(6, 11));
        assert_eq!(set.span(), FieldLocation::new(0, 11));

        let memory = set.insert_field(0xf000u16, 0x3f, 0);
        let memory = set.insert_field(memory, 0x2a & set.mask::<u16>(), 1);
        assert_eq!(memory & 0xf000, 0xf000);
        assert_eq!(set.extract_field(memory, 0), 0x3f);
        assert_eq!(set.extract_field(memory, 1), 0x2a);
        assert_eq!(set.position_field(0x2au16, 1), 0x2a << 6);
    }
}
