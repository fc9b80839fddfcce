// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

// Compile-time assertions for layouts whose word width is only known once the
// storage type is resolved: usize and storage-path bases.

use bitview::{Access, BigEndian, LittleEndian, Packed, Volatile, layout};

layout!({
    struct Mcause(usize);
    {
        let interrupt: Bit<31>;
        let code: Bits<30, 0>;
    }
});

const _: () = {
    assert!(Mcause::INTERRUPT.first_bit() == 31);
    assert!(Mcause::INTERRUPT.size_bits() == 1);
    assert!(Mcause::CODE.size_bits() == 31);
    assert!(Mcause::CODE.offset() == 0);
    assert!(Mcause::FIELDS.len() == 2);
    assert!(size_of::<Mcause>() == size_of::<usize>());
};

layout!({
    #[access(Rew)]
    struct Header(Packed<BigEndian, 3, u32>);
    {
        let version: Bits<23, 20, u8, Ro>;
        let flags: BitSet<1, 4, 16, bool, Ro>;
        let length: Bits<15, 0, u16, Ro>;
        let ack: Bit<19>;
    }
});

const _: () = {
    assert!(size_of::<Header>() == 3);
    assert!(align_of::<Header>() == 1);
    assert!(Header::FLAGS.item_count() == 4);
    assert!(Header::FLAGS.offset(3) == 19);
    assert!(Header::FLAGS.span().last_bit() == 19);
    assert!(Header::LENGTH.last_bit() == 15);
    assert!(matches!(Header::FIELDS[0].access, Access::Read));
    assert!(matches!(Header::FIELDS[1].access, Access::Read));
    assert!(matches!(Header::FIELDS[3].access, Access::ReadEphemeralWrite));
};

layout!({
    #[access(Wo)]
    struct Doorbell(Volatile<u16>);
    {
        let ring: Bits<15, 0>;
    }
});

layout!({
    struct Wide(Packed<LittleEndian, 16, u128>);
    {
        let top: Bit<127>;
    }
});

const _: () = {
    assert!(size_of::<Doorbell>() == 2);
    assert!(matches!(Doorbell::FIELDS[0].access, Access::Write));
    assert!(Doorbell::RING.size_bits() == 16);
    assert!(Wide::TOP.first_bit() == 127);
    assert!(size_of::<Wide>() == 16);
};

#[test]
fn compile_time_test() {}
