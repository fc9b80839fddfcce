// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

// The bit-band engine against a bus that decodes alias addresses back onto a
// register in host memory.

#![cfg(target_endian = "little")]

use std::cell::Cell;
use std::ptr;

use bitview::{
    BitBand, BitBus, LittleEndian, Packed, Storage, Volatile, layout,
};

thread_local! {
    static WINDOW: Cell<*mut u8> = const { Cell::new(ptr::null_mut()) };
    static ACCESSES: Cell<usize> = const { Cell::new(0) };
}

enum HostBus {}

impl HostBus {
    // The byte and bit addressed by an alias address, relative to the
    // register mapped in through `WINDOW`.
    fn decode(address: usize) -> (*mut u8, u8) {
        ACCESSES.set(ACCESSES.get() + 1);
        let offset = (address & 0x01ff_ffff) >> 2;
        let window = WINDOW.get();
        let delta = (offset >> 3).wrapping_sub(window.addr() & 0xf_ffff);
        #[allow(clippy::cast_possible_truncation)]
        let bit = (offset & 7) as u8;
        (window.wrapping_add(delta), bit)
    }
}

// SAFETY: One access to the addressed byte per call.
unsafe impl BitBus for HostBus {
    unsafe fn read(address: usize) -> u32 {
        let (byte, bit) = Self::decode(address);
        // SAFETY: The byte lies within the mapped register.
        u32::from((unsafe { byte.read_volatile() } >> bit) & 1)
    }

    unsafe fn write(address: usize, value: u32) {
        let (byte, bit) = Self::decode(address);
        // SAFETY: As above.
        unsafe {
            let old = byte.read_volatile();
            let new = if value & 1 == 0 {
                old & !(1 << bit)
            } else {
                old | (1 << bit)
            };
            byte.write_volatile(new);
        }
    }
}

layout!({
    #[engine(BitBand<0x2000_0000, HostBus>)]
    struct Banded(Volatile<u32>);
    {
        let enable: Bit<0>;
        let mode: Bits<5, 4>;
        let ready: Bit<9, bool, Ro>;
        let flags: BitSet<1, 8, 16>;
        let lanes: BitSet<2, 2, 24>;
        let strobe: Bit<31, bool, Wo>;
    }
});

layout!({
    struct Masked(Volatile<u32>);
    {
        let enable: Bit<0>;
        let mode: Bits<5, 4>;
        let ready: Bit<9, bool, Ro>;
        let flags: BitSet<1, 8, 16>;
        let lanes: BitSet<2, 2, 24>;
        let strobe: Bit<31, bool, Wo>;
    }
});

layout!({
    #[access(Wo)]
    #[engine(BitBand<0x2000_0000, HostBus>)]
    struct BandedKick(Volatile<u32>);
    {
        let strobe: Bit<31>;
    }
});

layout!({
    #[access(Wo)]
    struct MaskedKick(Volatile<u32>);
    {
        let strobe: Bit<31>;
    }
});

layout!({
    #[engine(BitBand<0x2000_0000, HostBus>)]
    struct BandedWire(Packed<LittleEndian, 4, u32>);
    {
        let enable: Bit<0>;
        let flags: BitSet<1, 8, 16>;
    }
});

#[repr(align(16))]
struct Aligned(Volatile<u32>);

// Maps the alias region onto a register holding `word` for the duration of
// `f`.
fn with_window(word: u32, f: impl FnOnce(&Volatile<u32>)) {
    let register = Aligned(Volatile::with_word(word));
    WINDOW.set(ptr::from_ref(&register.0).cast::<u8>().cast_mut());
    ACCESSES.set(0);
    f(&register.0);
    WINDOW.set(ptr::null_mut());
}

fn with_banded(word: u32, f: impl FnOnce(&Banded, &Volatile<u32>)) {
    with_window(word, |storage| {
        // SAFETY: The bus maps the alias region onto `storage`, which
        // outlives the view.
        let banded = unsafe { Banded::from_ptr(storage) };
        f(banded, storage);
    });
}

#[test]
fn single_bits_use_the_alias() {
    with_banded(0x0000_0200, |banded, storage| {
        assert!(banded.ready().get());
        assert_eq!(ACCESSES.get(), 1);

        banded.enable().set(true);
        banded.flags().set(3, true);
        banded.flags().at(7).set(true);
        assert_eq!(ACCESSES.get(), 4);
        assert_eq!(storage.load(), 0x0088_0201);

        banded.enable().set(false);
        assert!(!banded.enable().get());
        assert!(banded.flags().get(3));
        assert_eq!(storage.load(), 0x0088_0200);
    });
}

#[test]
fn wider_fields_use_the_word() {
    with_banded(0xffff_ffff, |banded, storage| {
        banded.mode().set(0b01);
        banded.lanes().set(1, 0b10);
        assert_eq!(banded.mode().get(), 0b01);
        assert_eq!(ACCESSES.get(), 0);
        assert_eq!(storage.load(), 0xfbff_ffdf);
    });
}

#[test]
fn matches_generic() {
    let masked = Masked::new(0x1234_0200);
    with_banded(0x1234_0200, |banded, storage| {
        for index in 0..8 {
            let bit = index % 3 == 0;
            banded.flags().set(index, bit);
            masked.flags().set(index, bit);
        }
        banded.enable().set(true);
        masked.enable().set(true);
        banded.mode().set(0b11);
        masked.mode().set(0b11);
        banded.lanes().at(0).set(0b01);
        masked.lanes().at(0).set(0b01);

        assert_eq!(storage.load(), masked.read());
        assert_eq!(
            format!("{banded:?}"),
            format!("{masked:?}").replace("Masked", "Banded")
        );
    });
}

// A bit-band write never touches the rest of the word, even when the
// register is write-only.
#[test]
fn write_only_bits_preserve_siblings() {
    let masked = Masked::new(0x0000_00ff);
    masked.strobe().set(true);
    assert_eq!(masked.read(), 0x8000_00ff);

    let word = Volatile::with_word(0x0000_00ffu32);
    // SAFETY: `word` outlives the view.
    let kick = unsafe { MaskedKick::from_ptr(&word) };
    kick.strobe().set(true);
    assert_eq!(word.load(), 0x8000_0000);

    with_window(0x0000_00ff, |storage| {
        // SAFETY: As in `with_banded`.
        let kick = unsafe { BandedKick::from_ptr(storage) };
        kick.strobe().set(true);
        assert_eq!(ACCESSES.get(), 1);
        assert_eq!(storage.load(), 0x8000_00ff);
    });
}

// Little-endian packed storage holds its bits in the order the alias region
// expects, aligned or not.
#[test]
fn packed_storage() {
    let wire = Packed::<LittleEndian, 4, u32>::with_word(0);
    WINDOW.set(ptr::from_ref(&wire).cast::<u8>().cast_mut());
    ACCESSES.set(0);
    // SAFETY: The bus maps the alias region onto `wire`, which outlives the
    // view.
    let banded = unsafe { BandedWire::from_ptr(&wire) };
    banded.enable().set(true);
    banded.flags().set(3, true);
    assert!(banded.flags().get(3));
    assert_eq!(ACCESSES.get(), 3);
    assert_eq!(wire.to_bytes(), [0x01, 0, 0x08, 0]);
    WINDOW.set(ptr::null_mut());
}
