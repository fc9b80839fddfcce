// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! The bit-band engine.
//!
//! Cortex-M3 and Cortex-M4 parts map each bit of the first megabyte of their
//! SRAM and peripheral regions to a full word in an alias region 32 MiB
//! above it. Reading an alias word yields the bit in bit 0, and writing one
//! sets or clears just that bit in a single bus transaction. [`BitBand`]
//! routes single-bit fields (and single-bit field set items) through the
//! alias; wider fields go through [`Generic`] unchanged.
//!
//! A bit-band access never loads or stores the backing word, so sibling
//! bits are preserved even for write-only and ephemeral-write policies.
//!
//! Bit-band registers can only be created over memory with
//! [`Register::from_ptr`](crate::Register::from_ptr), and the backing word
//! must lie within the bit-band region starting at the engine's base address.
//! There is no safe constructor:
//!
//! ```compile_fail
//! use bitview::{BitBand, Plain, Register, Rw};
//!
//! let _ = Register::<Plain<u32>, Rw, BitBand<0x2000_0000>>::new(0);
//! ```
//!
//! A base address outside of the bit-band regions fails to build:
//!
//! ```compile_fail
//! use bitview::{BitBand, Mmio};
//!
//! let _ = BitBand::<0x2000_1000, Mmio>::ALIAS_BASE;
//! ```
//!
//! The alias of a bit is computed from its byte and its position within it,
//! so the storage must hold its word least significant bit first in memory
//! (see [`Storage::LSB_FIRST`]). Other storage fails to build on first
//! access:
//!
//! ```compile_fail
//! use bitview::{BigEndian, Bit, BitBand, Packed, Register, Rw};
//!
//! type Storage = Packed<BigEndian, 4, u32>;
//! // SAFETY: Never dereferenced, as this does not build.
//! let reg = unsafe {
//!     Register::<Storage, Rw, BitBand<0x2000_0000>>::from_ptr(core::ptr::null())
//! };
//! let _ = reg.field::<Bit<0>, bool, Rw>().get();
//! ```

use core::marker::PhantomData;
use core::ptr;

use crate::access::{Readable, Writable};
use crate::engine::{Engine, Generic};
use crate::location::FieldLocation;
use crate::storage::Storage;
use crate::value::FieldValue;
use crate::word::Word;

/// Single-word accesses to the bit-band alias region.
///
/// # Safety
///
/// Implementors must perform exactly one access per call, to the given
/// alias address or to the bit it stands for.
pub unsafe trait BitBus {
    /// Reads the alias word at `address`.
    ///
    /// # Safety
    ///
    /// `address` must be a valid alias address for the current target.
    unsafe fn read(address: usize) -> u32;

    /// Writes the alias word at `address`.
    ///
    /// # Safety
    ///
    /// `address` must be a valid alias address for the current target.
    unsafe fn write(address: usize, value: u32);
}

/// The hardware bus: a volatile word access to the alias address.
#[derive(Debug)]
pub enum Mmio {}

// SAFETY: One volatile access per call.
unsafe impl BitBus for Mmio {
    #[inline]
    unsafe fn read(address: usize) -> u32 {
        // SAFETY: The caller provides a valid alias address.
        unsafe { ptr::read_volatile(ptr::with_exposed_provenance::<u32>(address)) }
    }

    #[inline]
    unsafe fn write(address: usize, value: u32) {
        // SAFETY: As above.
        unsafe {
            ptr::write_volatile(ptr::with_exposed_provenance_mut::<u32>(address), value);
        }
    }
}

/// The bit-band engine for the region at `BASE`, accessing the alias region
/// through `B`.
///
/// `BASE` must be the base of a bit-band region (`0x2000_0000` for SRAM,
/// `0x4000_0000` for peripherals): any address with bits set outside of
/// bits 29 and 30 fails to build on first use.
#[derive(Debug)]
pub struct BitBand<const BASE: usize, B: BitBus = Mmio>(PhantomData<B>);

impl<const BASE: usize, B: BitBus> BitBand<BASE, B> {
    /// The base of the alias region.
    pub const ALIAS_BASE: usize = {
        assert!(BASE & 0x9fff_ffff == 0, "misaligned bit-band base address");
        BASE | 0x0200_0000
    };

    /// The alias address of bit `bit` of `storage`.
    #[must_use]
    pub fn alias_address<S>(storage: &S, bit: usize) -> usize {
        Self::ALIAS_BASE
            | ((ptr::from_ref(storage).expose_provenance() & 0xf_ffff) << 5)
            | (bit << 2)
    }
}

impl<const BASE: usize, B: BitBus> Engine for BitBand<BASE, B> {
    #[inline]
    fn get<A, S, V>(storage: &S, location: FieldLocation) -> V::Output
    where
        A: Readable,
        S: Storage,
        V: FieldValue<S::Word>,
    {
        const { assert!(S::LSB_FIRST, "bit-band storage must be LSB-first") }
        if location.size_bits() != 1 {
            return Generic::get::<A, S, V>(storage, location);
        }
        let address = Self::alias_address(storage, location.first_bit());
        // SAFETY: Bit-band registers are only created over storage in the
        // region, per the contract of `Register::from_ptr`.
        let bit = unsafe { B::read(address) } & 1;
        V::from_field(S::Word::from_u128(u128::from(bit)), &location)
    }

    #[inline]
    fn set<A, S, V>(storage: &S, location: FieldLocation, value: V)
    where
        A: Writable,
        S: Storage,
        V: FieldValue<S::Word>,
    {
        const { assert!(S::LSB_FIRST, "bit-band storage must be LSB-first") }
        if location.size_bits() != 1 {
            return Generic::set::<A, S, V>(storage, location, value);
        }
        let address = Self::alias_address(storage, location.first_bit());
        let bit = FieldLocation::bit(0).extract_field(value.into_field());
        // SAFETY: As above.
        unsafe { B::write(address, u32::from(bit != S::Word::ZERO)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const _: () = {
        assert!(BitBand::<0x2000_0000, Mmio>::ALIAS_BASE == 0x2200_0000);
        assert!(BitBand::<0x4000_0000, Mmio>::ALIAS_BASE == 0x4200_0000);
    };

    #[test]
    fn alias_address() {
        let word = 0u32;
        let low = ptr::from_ref(&word).addr() & 0xf_ffff;
        assert_eq!(
            BitBand::<0x4000_0000, Mmio>::alias_address(&word, 0),
            0x4200_0000 | (low << 5)
        );
        assert_eq!(
            BitBand::<0x4000_0000, Mmio>::alias_address(&word, 31),
            0x4200_0000 | (low << 5) | 0x7c
        );
    }
}
