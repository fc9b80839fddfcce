// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use bitview::{bitfield_repr, layout};

/// Translation schemes of the RISC-V `satp.MODE` field. Values 1-7 and 12-15
/// are reserved.
#[bitfield_repr(u8)]
pub enum TranslationMode {
    Bare = 0,
    Sv39 = 8,
    Sv48 = 9,
    Sv57 = 10,
    Sv64 = 11,
}

// RV64 supervisor address translation and protection.
layout!({
    pub struct Satp(u64);
    {
        let mode: Bits<63, 60, TranslationMode>;
        let asid: Bits<59, 44, u16>;
        let root_ppn: Bits<43, 0>;
    }
});

fn main() {
    let satp = Satp::new(0);
    satp.asid().set(1);
    satp.root_ppn().set(0xffff);
    satp.mode().set(TranslationMode::Sv39);
    println!("{satp:#?}");

    // Reserved modes read back as their raw bits.
    satp.mode().assign(&Satp::new(0xd << 60).mode());
    println!("{:?}", satp.mode());
}
