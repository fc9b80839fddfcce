// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Field access engines.
//!
//! An engine turns a field location and an access policy into loads and
//! stores on backing storage. Engines are chosen per register at the type
//! level, so there is no runtime dispatch.

use crate::access::{Readable, Writable};
use crate::location::{FieldLocation, StaticLocation, StaticSetLocation};
use crate::storage::Storage;
use crate::value::FieldValue;
use crate::word::Word;

/// Reads and writes fields of backing storage.
///
/// Every access loads and/or stores the whole backing word, unless an engine
/// documents otherwise. The policy `A` of each method is that of the
/// register holding the storage; field policies are checked by the views
/// before an engine is reached.
pub trait Engine {
    /// Reads the field at `location`.
    fn get<A, S, V>(storage: &S, location: FieldLocation) -> V::Output
    where
        A: Readable,
        S: Storage,
        V: FieldValue<S::Word>;

    /// Writes `value` to the field at `location`.
    fn set<A, S, V>(storage: &S, location: FieldLocation, value: V)
    where
        A: Writable,
        S: Storage,
        V: FieldValue<S::Word>;

    /// Reads the field at the static location `L`.
    #[inline]
    fn get_field<A, S, L, V>(storage: &S) -> V::Output
    where
        A: Readable,
        S: Storage,
        L: StaticLocation,
        V: FieldValue<S::Word>,
    {
        Self::get::<A, S, V>(storage, L::LOCATION)
    }

    /// Writes `value` to the field at the static location `L`.
    #[inline]
    fn set_field<A, S, L, V>(storage: &S, value: V)
    where
        A: Writable,
        S: Storage,
        L: StaticLocation,
        V: FieldValue<S::Word>,
    {
        Self::set::<A, S, V>(storage, L::LOCATION, value);
    }

    /// Reads item `index` of the field set at the static location `L`.
    /// `index` is only checked in debug builds.
    #[inline]
    fn get_item<A, S, L, V>(storage: &S, index: usize) -> V::Output
    where
        A: Readable,
        S: Storage,
        L: StaticSetLocation,
        V: FieldValue<S::Word>,
    {
        debug_assert!(index < L::LOCATION.item_count());
        Self::get::<A, S, V>(storage, L::LOCATION.item(index))
    }

    /// Writes `value` to item `index` of the field set at the static
    /// location `L`. `index` is only checked in debug builds.
    #[inline]
    fn set_item<A, S, L, V>(storage: &S, index: usize, value: V)
    where
        A: Writable,
        S: Storage,
        L: StaticSetLocation,
        V: FieldValue<S::Word>,
    {
        debug_assert!(index < L::LOCATION.item_count());
        Self::set::<A, S, V>(storage, L::LOCATION.item(index), value);
    }
}

/// Engines that touch nothing but the storage they are handed. Registers
/// using them may be created over storage anywhere in memory.
///
/// # Safety
///
/// Implementors must not access any memory other than through the
/// [`Storage`] methods of the storage passed to them.
pub unsafe trait Detached: Engine {}

/// The mask-and-shift engine.
///
/// Reads load the word and extract the field. Writes to read-write registers
/// load the word, insert the field and store the word back, preserving every
/// other bit, whatever the policy of the field itself.
///
/// Writes to write-only and ephemeral-write registers never load: the
/// positioned field is stored as the entire word, and every other bit of the
/// word is written as zero. When several fields of such a register are
/// written, only the bits of the most recent write survive. This mirrors
/// registers whose writes are commands rather than state; callers composing
/// several fields of one must write their combined value through the
/// register instead.
#[derive(Debug)]
pub enum Generic {}

impl Engine for Generic {
    #[inline]
    fn get<A, S, V>(storage: &S, location: FieldLocation) -> V::Output
    where
        A: Readable,
        S: Storage,
        V: FieldValue<S::Word>,
    {
        debug_assert!(location.last_bit() < <S::Word as Word>::BITS);
        V::from_field(location.extract_field(storage.load()), &location)
    }

    #[inline]
    fn set<A, S, V>(storage: &S, location: FieldLocation, value: V)
    where
        A: Writable,
        S: Storage,
        V: FieldValue<S::Word>,
    {
        debug_assert!(location.last_bit() < <S::Word as Word>::BITS);
        let bits = value.into_field();
        let word = if A::ACCESS.is_readable() && !A::ACCESS.is_ephemeralwrite() {
            location.insert_field(storage.load(), bits)
        } else {
            location.position_field(bits)
        };
        storage.store(word);
    }
}

// SAFETY: Only `Storage::load` and `Storage::store` are used.
unsafe impl Detached for Generic {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Rew, Rw, Wo};
    use crate::location::{Items, Span};
    use crate::storage::Plain;

    #[test]
    fn read_write_preserves_siblings() {
        let storage = Plain::with_word(0b1000_0001u8);
        Generic::set_field::<Rw, _, Span<3, 6>, _>(&storage, 0b1010u8);
        assert_eq!(storage.load(), 0b1101_0001);
        assert_eq!(Generic::get_field::<Rw, _, Span<3, 6>, u8>(&storage), 0b1010);
        assert_eq!(Generic::get_field::<Rw, _, Span<3, 6>, i8>(&storage), -6);
    }

    #[test]
    fn write_only_and_ephemeral_clobber_siblings() {
        let storage = Plain::with_word(0xffu8);
        Generic::set_field::<Wo, _, Span<1, 2>, _>(&storage, 1u8);
        assert_eq!(storage.load(), 0b0000_0010);

        storage.store(0xff);
        Generic::set_field::<Rew, _, Span<1, 2>, _>(&storage, 2u8);
        assert_eq!(storage.load(), 0b0000_0100);
    }

    #[test]
    fn items() {
        let storage = Plain::with_word(0u32);
        for index in 0..4 {
            Generic::set_item::<Rw, _, Items<4, 4, 8>, _>(&storage, index, index + 1);
        }
        assert_eq!(storage.load(), 0x0043_2100);
        assert_eq!(Generic::get_item::<Rw, _, Items<4, 4, 8>, u32>(&storage, 2), 3);
    }
}
