// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use bitview::layout;

layout!({
    pub struct Example(u64);
    {
        let foo: Bits<18, 11>;
        let bar: Bits<10, 9>;
        let baz: Bit<8>;
        let frob: Bits<7, 4, i8>;
        let nibbles: BitSet<4, 7, 32>;
        let status: Bits<3, 0, u8, Ro>;
        let kick: Bit<63, bool, Wo>;
    }
});

fn main() {
    let example = Example::new(0);
    example.foo().set(0x1a);
    example.bar().set(0b01);
    example.baz().set(true);
    example.frob().set(-5);
    for (index, nibble) in (0..example.nibbles().len()).zip(1u8..) {
        example.nibbles().set(index, nibble);
    }

    println!("word: {:#x}", example.read());
    println!("debug: {example:?}");

    let copy = example.clone();
    example.kick().set(true);
    println!("after kick: {:#x}", example.read());
    println!("copy: {:#x}", copy.read());

    for field in &Example::FIELDS {
        println!(
            "{:>8}: bits {:>2}..={:<2} x{} ({})",
            field.name,
            field.first_bit,
            field.last_bit,
            field.item_count,
            field.access
        );
    }
}
