// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Backing storage for bitfield views.
//!
//! A storage type owns the bits; views only borrow it. Every access moves the
//! whole backing word with a single load or store, using the discipline the
//! storage type defines: plain memory accesses for [`Plain`], volatile
//! accesses for [`Volatile`], and a byte-wise materialization for [`Packed`].
//! [`Float`] exposes the bits of an IEEE 754 value.
//!
//! None of these types are `Sync`. A read-modify-write through a view is
//! not atomic, and callers sharing storage between execution contexts must
//! bring their own synchronization.

use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::marker::PhantomData;
use core::ptr;

use crate::word::Word;

/// The backing storage of a register: something a [`Word`] can be loaded
/// from and stored to.
pub trait Storage {
    /// The integer the field algebra operates on.
    type Word: Word;

    /// Whether bit `n` of the word is bit `n % 8` of the byte at offset
    /// `n / 8` from the storage address, for every bit of the word. Engines
    /// addressing individual bits in memory require it.
    const LSB_FIRST: bool = false;

    /// Creates storage holding `word`.
    fn with_word(word: Self::Word) -> Self;

    /// Loads the whole backing word.
    fn load(&self) -> Self::Word;

    /// Stores the whole backing word.
    fn store(&self, word: Self::Word);
}

/// Ordinary memory: a variable, a struct member, an element of a buffer.
#[derive(Clone, Default, Eq, PartialEq)]
#[repr(transparent)]
pub struct Plain<W: Word>(Cell<W>);

impl<W: Word> Storage for Plain<W> {
    type Word = W;

    const LSB_FIRST: bool = cfg!(target_endian = "little");

    #[inline]
    fn with_word(word: W) -> Self {
        Self(Cell::new(word))
    }

    #[inline]
    fn load(&self) -> W {
        self.0.get()
    }

    #[inline]
    fn store(&self, word: W) {
        self.0.set(word);
    }
}

impl<W: Word> fmt::Debug for Plain<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plain({:#x})", self.load())
    }
}

/// The image of a memory-mapped register. Every load and store is a single
/// volatile access of the full word.
#[repr(transparent)]
pub struct Volatile<W: Word>(UnsafeCell<W>);

impl<W: Word> Storage for Volatile<W> {
    type Word = W;

    const LSB_FIRST: bool = cfg!(target_endian = "little");

    #[inline]
    fn with_word(word: W) -> Self {
        Self(UnsafeCell::new(word))
    }

    #[inline]
    fn load(&self) -> W {
        // SAFETY: The cell is valid for reads for the lifetime of `self`, and
        // `Volatile` is not `Sync`.
        unsafe { ptr::read_volatile(self.0.get()) }
    }

    #[inline]
    fn store(&self, word: W) {
        // SAFETY: As above, for writes.
        unsafe { ptr::write_volatile(self.0.get(), word) }
    }
}

impl<W: Word> fmt::Debug for Volatile<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Volatile({:#x})", self.load())
    }
}

/// The byte order of a [`Packed`] integer.
pub trait ByteOrder: private::Sealed {
    /// Whether the least significant byte comes first.
    const LITTLE_ENDIAN: bool;
}

/// Least significant byte first.
#[derive(Debug)]
pub enum LittleEndian {}

/// Most significant byte first.
#[derive(Debug)]
pub enum BigEndian {}

impl private::Sealed for LittleEndian {}
impl ByteOrder for LittleEndian {
    const LITTLE_ENDIAN: bool = true;
}

impl private::Sealed for BigEndian {}
impl ByteOrder for BigEndian {
    const LITTLE_ENDIAN: bool = false;
}

/// An integer packed into `N` bytes of byte order `O`, with no alignment
/// requirement, materialized as a `W` for bit manipulation.
///
/// If `N` is smaller than `W`, the missing high-order bytes read as zero and
/// are dropped on store. If `N` is larger, only the low-order bytes that fit
/// in `W` are significant; the others read back as zero after a store.
#[repr(transparent)]
pub struct Packed<O: ByteOrder, const N: usize, W: Word> {
    bytes: Cell<[u8; N]>,
    _order: PhantomData<(O, W)>,
}

impl<O: ByteOrder, const N: usize, W: Word> Packed<O, N, W> {
    // The significance (as a power of 256) of the byte at `index`.
    const fn significance(index: usize) -> usize {
        if O::LITTLE_ENDIAN { index } else { N - 1 - index }
    }

    /// The raw bytes, in storage order.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; N] {
        self.bytes.get()
    }

    /// Creates storage from raw bytes, in storage order.
    #[must_use]
    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self {
            bytes: Cell::new(bytes),
            _order: PhantomData,
        }
    }
}

impl<O: ByteOrder, const N: usize, W: Word> Storage for Packed<O, N, W> {
    type Word = W;

    const LSB_FIRST: bool = O::LITTLE_ENDIAN && N >= size_of::<W>();

    fn with_word(word: W) -> Self {
        let packed = Self::from_bytes([0; N]);
        packed.store(word);
        packed
    }

    fn load(&self) -> W {
        const { assert!(N > 0, "packed integers must be non-empty") }
        let bytes = self.bytes.get();
        let mut value = 0u128;
        for (index, byte) in bytes.iter().enumerate() {
            let significance = Self::significance(index);
            if significance < size_of::<u128>() {
                value |= u128::from(*byte) << (8 * significance);
            }
        }
        W::from_u128(value)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn store(&self, word: W) {
        let value = word.to_u128();
        let mut bytes = [0u8; N];
        for (index, byte) in bytes.iter_mut().enumerate() {
            let significance = Self::significance(index);
            if significance < size_of::<W>() {
                *byte = (value >> (8 * significance)) as u8;
            }
        }
        self.bytes.set(bytes);
    }
}

impl<O: ByteOrder, const N: usize, W: Word> Clone for Packed<O, N, W> {
    fn clone(&self) -> Self {
        Self::from_bytes(self.to_bytes())
    }
}

impl<O: ByteOrder, const N: usize, W: Word> fmt::Debug for Packed<O, N, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packed({:02x?})", self.to_bytes())
    }
}

/// A floating-point type whose bits may back a [`Float`].
pub trait FloatBits: Copy + fmt::Debug + private::Sealed {
    /// The unsigned integer of the same width.
    type Bits: Word;

    /// The raw IEEE 754 bits of `self`.
    fn to_bits(self) -> Self::Bits;

    /// The value with raw IEEE 754 bits `bits`.
    fn from_bits(bits: Self::Bits) -> Self;
}

macro_rules! float_bits {
    ($($float:ty => $bits:ty),* $(,)?) => {
        $(
            impl private::Sealed for $float {}

            impl FloatBits for $float {
                type Bits = $bits;

                #[inline]
                fn to_bits(self) -> $bits {
                    <$float>::to_bits(self)
                }

                #[inline]
                fn from_bits(bits: $bits) -> Self {
                    <$float>::from_bits(bits)
                }
            }
        )*
    };
}

float_bits!(f32 => u32, f64 => u64);

/// A floating-point value of type `F`, whose raw bits are the word. Laid out
/// as an `F`.
///
/// The bits are held as an integer, so every pattern (NaN payloads
/// included) survives a round trip through the storage.
#[repr(transparent)]
pub struct Float<F: FloatBits> {
    bits: Cell<F::Bits>,
    _float: PhantomData<F>,
}

impl<F: FloatBits> Float<F> {
    /// Creates storage holding `value`.
    #[must_use]
    pub fn new(value: F) -> Self {
        Self::with_word(value.to_bits())
    }

    /// The value.
    #[must_use]
    pub fn get(&self) -> F {
        F::from_bits(self.load())
    }

    /// Replaces the value.
    pub fn set(&self, value: F) {
        self.store(value.to_bits());
    }
}

impl<F: FloatBits> Storage for Float<F> {
    type Word = F::Bits;

    const LSB_FIRST: bool = cfg!(target_endian = "little");

    #[inline]
    fn with_word(word: F::Bits) -> Self {
        Self {
            bits: Cell::new(word),
            _float: PhantomData,
        }
    }

    #[inline]
    fn load(&self) -> F::Bits {
        self.bits.get()
    }

    #[inline]
    fn store(&self, word: F::Bits) {
        self.bits.set(word);
    }
}

impl<F: FloatBits> fmt::Debug for Float<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Float({:?})", self.get())
    }
}

// Ensures that no type outside of bitview can implement this type.
mod private {
    pub trait Sealed {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_volatile() {
        let plain = Plain::with_word(0xa5u8);
        plain.store(plain.load() ^ 0xff);
        assert_eq!(plain.load(), 0x5a);

        let volatile = Volatile::with_word(0x1234u16);
        assert_eq!(volatile.load(), 0x1234);
        volatile.store(0xbeef);
        assert_eq!(volatile.load(), 0xbeef);
    }

    #[test]
    fn packed_byte_orders() {
        let le = Packed::<LittleEndian, 3, u32>::with_word(0x12_3456);
        assert_eq!(le.to_bytes(), [0x56, 0x34, 0x12]);
        assert_eq!(le.load(), 0x12_3456);

        let be = Packed::<BigEndian, 3, u32>::with_word(0x12_3456);
        assert_eq!(be.to_bytes(), [0x12, 0x34, 0x56]);
        assert_eq!(be.load(), 0x12_3456);
    }

    #[test]
    fn packed_narrower_than_word() {
        // The top byte of the word does not fit and is dropped.
        let be = Packed::<BigEndian, 3, u32>::with_word(0xff12_3456);
        assert_eq!(be.load(), 0x12_3456);
    }

    #[test]
    fn packed_wider_than_word() {
        let le = Packed::<LittleEndian, 7, u32>::with_word(0x12_3456);
        assert_eq!(le.to_bytes(), [0x56, 0x34, 0x12, 0, 0, 0, 0]);
        assert_eq!(le.load(), 0x12_3456);

        let be = Packed::<BigEndian, 2, u8>::with_word(42);
        assert_eq!(be.to_bytes(), [0, 42]);
        assert_eq!(be.load(), 42);

        let be = Packed::<BigEndian, 7, u32>::from_bytes([0xff, 0xff, 0xff, 1, 2, 3, 4]);
        assert_eq!(be.load(), 0x0102_0304);
    }

    #[cfg(target_endian = "little")]
    const _: () = {
        assert!(Plain::<u32>::LSB_FIRST);
        assert!(Volatile::<u64>::LSB_FIRST);
        assert!(Float::<f32>::LSB_FIRST);
        assert!(Packed::<LittleEndian, 4, u32>::LSB_FIRST);
        assert!(Packed::<LittleEndian, 6, u32>::LSB_FIRST);
        assert!(!Packed::<LittleEndian, 3, u32>::LSB_FIRST);
        assert!(!Packed::<BigEndian, 4, u32>::LSB_FIRST);
    };

    const _: () = {
        assert!(size_of::<Float<f32>>() == size_of::<f32>());
        assert!(align_of::<Float<f64>>() == align_of::<f64>());
    };

    #[test]
    fn float_bits() {
        let float = Float::new(1.0f32);
        assert_eq!(float.load(), 0x3f80_0000);
        float.store(0xc000_0000);
        assert_eq!(float.get().to_bits(), (-2.0f32).to_bits());

        let nan = Float::<f64>::with_word(0x7ff0_0000_0000_0001);
        assert!(nan.get().is_nan());
        assert_eq!(nan.load(), 0x7ff0_0000_0000_0001);
    }
}
