// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

// Layouts over byte-packed integers.

use bitview::{BigEndian, LittleEndian, Packed, layout};

layout!({
    struct Sample(Packed<BigEndian, 3, u32>);
    {
        let value: Bits<23, 0, i32>;
        let top: Bits<23, 20>;
        let low: BitSet<4, 2>;
    }
});

layout!({
    struct HalfWord(Packed<LittleEndian, 4, u32>);
    {
        let halfword: Bits<15, 0, u16>;
        let parity: Bit<31>;
    }
});

#[test]
fn signed_value() {
    let sample = Sample::new(0);
    sample.value().set(-876_543);
    assert_eq!(sample.value().get(), -876_543);
    assert_eq!(sample.read(), 0xf2_a001);
    assert_eq!(sample.storage().to_bytes(), [0xf2, 0xa0, 0x01]);
    assert_eq!(sample.top().get(), 0xf);
    assert_eq!(sample.low().iter().collect::<Vec<_>>(), [0x1, 0x0]);
}

#[test]
fn halfword() {
    let word = HalfWord::new(0);
    word.halfword().set(0xabcd);
    assert_eq!(word.read(), 0xabcd);
    assert_eq!(word.storage().to_bytes(), [0xcd, 0xab, 0, 0]);

    word.write(0x1234_5678);
    assert_eq!(word.halfword().get(), 0x5678);
    assert!(!word.parity().get());

    word.parity().set(true);
    assert_eq!(word.storage().to_bytes(), [0x78, 0x56, 0x34, 0x92]);
}

// Packed storage has no alignment requirement, so layouts can view fields
// at any offset into a buffer.
#[test]
fn unaligned_view() {
    let mut buffer = [0x12u8, 0x34, 0x56, 0x78, 0x9a];
    let ptr = buffer.as_mut_ptr().wrapping_add(1).cast::<Packed<BigEndian, 3, u32>>();
    // SAFETY: `ptr` addresses bytes 1 through 3 of `buffer`, which outlives
    // `sample` and is not otherwise accessed until `sample` is dead.
    let sample = unsafe { Sample::from_ptr(ptr) };
    assert_eq!(sample.read(), 0x34_5678);
    assert_eq!(sample.top().get(), 0x3);
    assert_eq!(sample.value().get(), 0x34_5678);

    sample.low().set(1, 0xc);
    sample.top().set(0xa);
    assert_eq!(buffer, [0x12, 0xa4, 0x56, 0xc8, 0x9a]);
}
