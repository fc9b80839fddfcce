// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Field and field set views.
//!
//! Views are borrowed from a [`Register`](crate::Register) and hold nothing
//! but a reference to its storage (plus an item index, for field set items):
//! the location, value type, access policies and engine are all type
//! parameters. Views are not `Clone`; copying a field's contents is spelled
//! [`Bound::assign`].
//!
//! A view carries two policies: its own, `A`, and that of its register,
//! `R`. An operation needs both to grant it. The register policy alone
//! decides how a write reaches the word, so a write-only field of a
//! read-write register still preserves its siblings.
//!
//! Copying a field that is not read-write is rejected:
//!
//! ```compile_fail
//! use bitview::{Plain, Register, Span, Wo};
//!
//! let a: Register<Plain<u8>> = Register::new(0);
//! let b: Register<Plain<u8>> = Register::new(0);
//! a.field::<Span<0, 3>, u8, Wo>().assign(&b.field::<Span<0, 3>, u8, Wo>());
//! ```
//!
//! So is copying a read-only field set:
//!
//! ```compile_fail
//! use bitview::{Items, Plain, Register, Ro};
//!
//! let a: Register<Plain<u8>> = Register::new(0);
//! let b: Register<Plain<u8>> = Register::new(0);
//! a.field_set::<Items<2, 4>, u8, Ro>()
//!     .assign(&b.field_set::<Items<2, 4>, u8, Ro>());
//! ```
//!
//! Or a field set of a register that is not read-write:
//!
//! ```compile_fail
//! use bitview::{Items, Plain, Register, Ro, Rw};
//!
//! let a: Register<Plain<u8>, Ro> = Register::new(0);
//! let b: Register<Plain<u8>, Ro> = Register::new(0);
//! a.field_set::<Items<2, 4>, u8, Rw>()
//!     .assign(&b.field_set::<Items<2, 4>, u8, Rw>());
//! ```

use core::fmt;
use core::marker::PhantomData;

use crate::access::{AccessPolicy, ReadWritable, Readable, Rew, Ro, Rw, Wo, Writable};
use crate::engine::{Engine, Generic};
use crate::location::{
    FieldLocation, FieldSetLocation, StaticLocation, StaticSetLocation,
};
use crate::storage::Storage;
use crate::value::FieldValue;

/// Where a bound view sits within its storage.
pub trait Placement: Copy {
    /// The location of the view.
    fn location(&self) -> FieldLocation;
}

/// A placement fixed at compile time by `L`.
pub struct Fixed<L>(PhantomData<L>);

impl<L> Clone for Fixed<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for Fixed<L> {}

impl<L: StaticLocation> Placement for Fixed<L> {
    #[inline]
    fn location(&self) -> FieldLocation {
        L::LOCATION
    }
}

/// Item `index` of the field set at `L`.
pub struct Indexed<L> {
    index: usize,
    _set: PhantomData<L>,
}

impl<L> Indexed<L> {
    /// The item index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl<L> Clone for Indexed<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for Indexed<L> {}

impl<L: StaticSetLocation> Placement for Indexed<L> {
    #[inline]
    fn location(&self) -> FieldLocation {
        L::LOCATION.item(self.index)
    }
}

/// A view of a single field of `S`, holding values of type `V`, accessed
/// with policy `A` within a register of policy `R`, through engine `E`.
///
/// See [`Field`] and [`Item`] for the two placements.
pub struct Bound<'a, S, P, V, A, R, E = Generic> {
    storage: &'a S,
    placement: P,
    _field: PhantomData<fn(V) -> (A, R, E)>,
}

/// A field at the static location `L`.
pub type Field<'a, S, L, V, A = Rw, R = Rw, E = Generic> =
    Bound<'a, S, Fixed<L>, V, A, R, E>;

/// An item of the field set at the static location `L`, bound to its index.
pub type Item<'a, S, L, V, A = Rw, R = Rw, E = Generic> =
    Bound<'a, S, Indexed<L>, V, A, R, E>;

impl<'a, S, L, V, A, R, E> Field<'a, S, L, V, A, R, E> {
    pub(crate) fn new(storage: &'a S) -> Self {
        Self {
            storage,
            placement: Fixed(PhantomData),
            _field: PhantomData,
        }
    }
}

impl<'a, S, L, V, A, R, E> Item<'a, S, L, V, A, R, E> {
    pub(crate) fn new(storage: &'a S, index: usize) -> Self {
        Self {
            storage,
            placement: Indexed {
                index,
                _set: PhantomData,
            },
            _field: PhantomData,
        }
    }

    /// The index of the item within its set.
    #[must_use]
    pub fn index(&self) -> usize {
        self.placement.index()
    }
}

impl<S, P, V, A, R, E> Bound<'_, S, P, V, A, R, E>
where
    S: Storage,
    P: Placement,
    V: FieldValue<S::Word>,
    A: AccessPolicy,
    R: AccessPolicy,
    E: Engine,
{
    /// The location of the field.
    #[must_use]
    pub fn location(&self) -> FieldLocation {
        self.placement.location()
    }

    /// Reads the field.
    #[must_use]
    pub fn get(&self) -> V::Output
    where
        A: Readable,
        R: Readable,
    {
        E::get::<R, S, V>(self.storage, self.location())
    }

    /// Writes the field.
    pub fn set(&self, value: V)
    where
        A: Writable,
        R: Writable,
    {
        E::set::<R, S, V>(self.storage, self.location(), value);
    }

    /// Copies the raw bits of `other` into this field. Values are not
    /// interpreted, so this succeeds even for bit patterns that are invalid
    /// for `V`.
    pub fn assign(&self, other: &Self)
    where
        A: ReadWritable,
        R: ReadWritable,
        S::Word: FieldValue<S::Word, Output = S::Word>,
    {
        let bits = E::get::<R, S, S::Word>(other.storage, other.location());
        E::set::<R, S, S::Word>(self.storage, self.location(), bits);
    }
}

impl<S, P, V, A, R, E> fmt::Debug for Bound<'_, S, P, V, A, R, E>
where
    S: Storage,
    P: Placement,
    V: FieldValue<S::Word>,
    V::Output: fmt::Debug,
    A: Readable,
    R: Readable,
    E: Engine,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

/// A view of the field set of `S` at the static location `L`, with the same
/// parameters as [`Bound`].
pub struct FieldSet<'a, S, L, V, A = Rw, R = Rw, E = Generic> {
    storage: &'a S,
    _set: PhantomData<fn(V) -> (L, A, R, E)>,
}

impl<'a, S, L, V, A, R, E> FieldSet<'a, S, L, V, A, R, E>
where
    S: Storage,
    L: StaticSetLocation,
    V: FieldValue<S::Word>,
    A: AccessPolicy,
    R: AccessPolicy,
    E: Engine,
{
    pub(crate) fn new(storage: &'a S) -> Self {
        Self {
            storage,
            _set: PhantomData,
        }
    }

    /// The location of the set.
    #[must_use]
    pub const fn location(&self) -> FieldSetLocation {
        L::LOCATION
    }

    /// The location of the whole set as a single field.
    #[must_use]
    pub const fn span(&self) -> FieldLocation {
        L::LOCATION.span()
    }

    /// The number of items.
    #[must_use]
    pub const fn len(&self) -> usize {
        L::LOCATION.item_count()
    }

    /// Always false: sets have at least one item.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Reads item `index`. The index is only checked in debug builds.
    #[must_use]
    pub fn get(&self, index: usize) -> V::Output
    where
        A: Readable,
        R: Readable,
    {
        E::get_item::<R, S, L, V>(self.storage, index)
    }

    /// Writes item `index`. The index is only checked in debug builds.
    pub fn set(&self, index: usize, value: V)
    where
        A: Writable,
        R: Writable,
    {
        E::set_item::<R, S, L, V>(self.storage, index, value);
    }

    /// A view of item `index`, bound to that index.
    #[must_use]
    pub fn item(&self, index: usize) -> Item<'a, S, L, V, A, R, E> {
        debug_assert!(index < self.len());
        Item::new(self.storage, index)
    }

    /// Reads every item, in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = V::Output> + use<'a, S, L, V, A, R, E>
    where
        A: Readable,
        R: Readable,
    {
        let storage = self.storage;
        (0..self.len()).map(move |index| E::get_item::<R, S, L, V>(storage, index))
    }

    /// Copies `other` into this set as a single field spanning every item:
    /// one read-modify-write of the whole span, not one per item.
    pub fn assign(&self, other: &Self)
    where
        A: ReadWritable,
        R: ReadWritable,
        S::Word: FieldValue<S::Word, Output = S::Word>,
    {
        let span = self.span();
        let bits = E::get::<R, S, S::Word>(other.storage, span);
        E::set::<R, S, S::Word>(self.storage, span, bits);
    }
}

impl<S, L, V, R, E> FieldSet<'_, S, L, V, Ro, R, E>
where
    S: Storage,
    L: StaticSetLocation,
    V: FieldValue<S::Word>,
    R: Readable,
    E: Engine,
{
    /// Reads item `index`: read-only sets index to plain values.
    #[must_use]
    pub fn at(&self, index: usize) -> V::Output {
        self.get(index)
    }
}

macro_rules! writable_at {
    ($($policy:ty),*) => {
        $(
            impl<'a, S, L, V, R, E> FieldSet<'a, S, L, V, $policy, R, E>
            where
                S: Storage,
                L: StaticSetLocation,
                V: FieldValue<S::Word>,
                R: AccessPolicy,
                E: Engine,
            {
                /// A view of item `index`: writable sets index to views
                /// bound to the index.
                #[must_use]
                pub fn at(&self, index: usize) -> Item<'a, S, L, V, $policy, R, E> {
                    self.item(index)
                }
            }
        )*
    };
}

writable_at!(Wo, Rw, Rew);

impl<S, L, V, A, R, E> fmt::Debug for FieldSet<'_, S, L, V, A, R, E>
where
    S: Storage,
    L: StaticSetLocation,
    V: FieldValue<S::Word>,
    V::Output: fmt::Debug,
    A: Readable,
    R: Readable,
    E: Engine,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
