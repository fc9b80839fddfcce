// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use core::fmt;
use core::marker::PhantomData;

use crate::access::{AccessPolicy, ReadWritable, Readable, Rw, Writable};
use crate::engine::{Detached, Engine, Generic};
use crate::field::{Field, FieldSet};
use crate::location::{StaticLocation, StaticSetLocation};
use crate::storage::Storage;
use crate::value::FieldValue;

/// Backing storage `S` together with its access policy `A` and field engine
/// `E`.
///
/// A register is laid out exactly as its storage. It serves both as the host
/// of fields over ordinary memory and as a memory-mapped register, in which
/// case it is obtained with [`Register::from_ptr`]. Whole-word reads and
/// writes are gated by `A`. Fields and field sets carry their own policies,
/// which can only narrow `A`: a field is read only if both it and its
/// register are readable, and likewise for writes.
///
/// Registers are `Clone` only when read-write; there is no other way to copy
/// the contents of one register into a new one.
#[repr(transparent)]
pub struct Register<S, A = Rw, E = Generic> {
    storage: S,
    _policy: PhantomData<(A, E)>,
}

impl<S: Storage, A: AccessPolicy, E: Detached> Register<S, A, E> {
    /// Creates a register holding `word`.
    #[must_use]
    pub fn new(word: S::Word) -> Self {
        Self::from_storage(S::with_word(word))
    }

    /// Creates a register over `storage`.
    #[must_use]
    pub const fn from_storage(storage: S) -> Self {
        Self {
            storage,
            _policy: PhantomData,
        }
    }
}

impl<S: Storage, A: AccessPolicy, E: Engine> Register<S, A, E> {
    /// Views the storage at `ptr` as a register.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, aligned, and valid for reads and writes of `S`
    /// for `'a`; nothing else may hold a mutable reference to it over that
    /// time. If `E` is not [`Detached`], the storage must further satisfy
    /// the requirements of the engine, e.g., lie in the region of a
    /// [`BitBand`](crate::BitBand) engine.
    #[must_use]
    pub const unsafe fn from_ptr<'a>(ptr: *const S) -> &'a Self {
        // SAFETY: `Register` is a transparent wrapper of `S`, and the caller
        // guarantees the validity of `ptr`.
        unsafe { &*ptr.cast::<Self>() }
    }

    /// The size of the backing storage in bytes.
    #[must_use]
    pub const fn size() -> usize {
        size_of::<S>()
    }

    /// The backing storage.
    #[must_use]
    pub fn storage(&self) -> &S
    where
        A: Readable,
    {
        &self.storage
    }

    /// Reads the whole word.
    #[must_use]
    pub fn read(&self) -> S::Word
    where
        A: Readable,
    {
        self.storage.load()
    }

    /// Writes the whole word.
    pub fn write(&self, word: S::Word)
    where
        A: Writable,
    {
        self.storage.store(word);
    }

    /// Replaces the word with `f` of its current value.
    pub fn modify(&self, f: impl FnOnce(S::Word) -> S::Word)
    where
        A: ReadWritable,
    {
        self.write(f(self.read()));
    }

    /// Copies the word of `other` into this register.
    pub fn assign(&self, other: &Self)
    where
        A: ReadWritable,
    {
        self.write(other.read());
    }

    /// A view of the field at `L`, holding values of type `V` under policy
    /// `FA`.
    #[must_use]
    pub fn field<L, V, FA>(&self) -> Field<'_, S, L, V, FA, A, E>
    where
        L: StaticLocation,
        V: FieldValue<S::Word>,
        FA: AccessPolicy,
    {
        Field::new(&self.storage)
    }

    /// A view of the field set at `L`, holding values of type `V` under
    /// policy `FA`.
    #[must_use]
    pub fn field_set<L, V, FA>(&self) -> FieldSet<'_, S, L, V, FA, A, E>
    where
        L: StaticSetLocation,
        V: FieldValue<S::Word>,
        FA: AccessPolicy,
    {
        FieldSet::new(&self.storage)
    }
}

impl<S, A, E> Clone for Register<S, A, E>
where
    S: Storage,
    A: ReadWritable,
    E: Detached,
{
    fn clone(&self) -> Self {
        Self::new(self.read())
    }
}

impl<S, A, E> fmt::Debug for Register<S, A, E>
where
    S: Storage,
    A: Readable,
    E: Engine,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Register")
            .field(&format_args!("{:#x}", self.read()))
            .finish()
    }
}
