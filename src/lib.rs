// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

#![no_std]

//! `bitview` is a no-std crate for declaring bitfields as zero-cost views over
//! integer storage: ordinary variables, byte-packed wire integers, and
//! memory-mapped hardware registers alike. The imagined user is transcribing
//! a register map out of a reference manual, and wants the compiler to keep
//! them from reading write-only bits or clobbering read-only ones.
//!
//! Fields never hold bits themselves. A [`Register`] owns the backing storage;
//! a [`Field`] or [`FieldSet`] borrows it and carries its bit location, value
//! type, [access policy](access) and engine as type parameters. Reading a
//! field loads the whole backing word and extracts the field from it; writing
//! one stores the whole word. There is no runtime dispatch and no extra
//! storage.
//!
//! ## Features
//!
//! * Fields of any width up to that of the backing word, read as `bool`, as
//!   any primitive integer (signed integers are sign-extended from the field
//!   width), or as a custom representation;
//! * Field sets: arrays of equally-sized, contiguous fields indexed at
//!   runtime;
//! * Overlapping fields, aliasing the same bits;
//! * Compile-time [access policies](access): reading a write-only field,
//!   writing a read-only one, or copying a register that is not read-write
//!   does not compile;
//! * Plain, volatile and byte-packed (little- or big-endian) storage;
//! * A [bit-band](bitband) engine for atomic single-bit access on Cortex-M3
//!   and Cortex-M4 parts;
//! * The [`layout!`] macro to declare all of the above in the shape of a
//!   register description.
//!
//! ## Example
//!
//! ```rust
//! use bitview::{bitfield_repr, layout};
//!
//! #[bitfield_repr(u8)]
//! pub enum Mode {
//!     Off = 0,
//!     Slow = 1,
//!     Fast = 3,
//! }
//!
//! layout!({
//!     pub struct Control(u16);
//!     {
//!         let enable: Bit<0>;
//!         let mode: Bits<2, 1, Mode>;
//!         let trim: Bits<7, 3, i8>;
//!         let status: Bits<11, 8, u8, Ro>;
//!         let gains: BitSet<2, 2, 12>;
//!     }
//! });
//!
//! let control = Control::new(0);
//! control.enable().set(true);
//! control.mode().set(Mode::Fast);
//! control.trim().set(-3);
//! control.gains().set(1, 0b10);
//!
//! assert_eq!(control.read(), 0b1000_0000_1110_1111);
//! assert!(control.enable().get());
//! assert_eq!(control.mode().get(), Ok(Mode::Fast));
//! assert_eq!(control.trim().get(), -3);
//! assert_eq!(control.status().get(), 0);
//! assert_eq!(control.gains().get(1), 0b10);
//!
//! control.write(0b100);
//! assert!(control.mode().get().is_err());
//!
//! // Will print: `Control { enable: false, mode: Err(InvalidBits(2)), trim: 0, status: 0, gains: [0, 0] }`
//! println!("{control:?}");
//! ```
//!
//! Without the macro, the same views are spelled out with [`Register`]:
//!
//! ```rust
//! use bitview::{Bit, Field, Plain, Register, Rw, Span};
//!
//! let reg: Register<Plain<u8>> = Register::new(0xff);
//! let integer: Field<'_, Plain<u8>, Span<3, 7>, i32, Rw> = reg.field();
//! let boolean = reg.field::<Bit<0>, bool, Rw>();
//! assert_eq!(integer.get(), -1);
//! assert!(boolean.get());
//! ```

pub mod access;
pub mod bitband;
pub mod engine;
mod field;
mod location;
mod register;
pub mod storage;
mod value;
mod word;

pub use access::{
    Access, AccessPolicy, NoAccess, ReadWritable, Readable, Rew, Ro, Rw, Wo,
    Writable,
};
pub use bitband::{BitBand, BitBus, Mmio};
pub use engine::{Detached, Engine, Generic};
pub use field::{Bound, Field, FieldSet, Fixed, Indexed, Item, Placement};
pub use location::{
    Bit, FieldLocation, FieldSetLocation, Items, Span, StaticLocation,
    StaticSetLocation,
};
pub use register::Register;
pub use storage::{
    BigEndian, Float, LittleEndian, Packed, Plain, Storage, Volatile,
};
pub use value::{FieldValue, InvalidBits, SignExtend};
pub use word::Word;

/// Specifies a layout of bitfields over a register.
///
/// # Syntax
///
/// ```text
/// layout!({
///     $(#[access($Access)])?
///     $(#[engine($Engine)])?
///     $(#[$attr])*
///     $vis struct $Name($Base);
///     {
///         $($Field)*
///     }
/// });
/// ```
///
/// where `$Base` is an unsigned integral type (`u8` through `u128`, or
/// `usize`) or a path to a [`Storage`] type, and each `$Field` takes one of
/// the forms
///
/// * `let $name: Bit<$bit (, $Value)? (, $Access)?>;`
/// * `let $name: Bits<$high, $low (, $Value)? (, $Access)?>;`
/// * `let $name: BitSet<$size, $count (, $offset)? (, $Value)? (, $Access)?>;`
///
/// `$Access` is one of [`Ro`], [`Wo`], [`Rw`], [`Rew`] or [`NoAccess`].
///
/// # Guiding example
///
/// ```rust
/// use bitview::{Volatile, bitfield_repr, layout};
///
/// #[bitfield_repr(u8)]
/// pub enum Parity {
///     None = 0,
///     Even = 2,
///     Odd = 3,
/// }
///
/// layout!({
///     pub struct LineControl(Volatile<u32>);
///     {
///         let enable: Bit<0>;
///         let parity: Bits<2, 1, Parity>;
///         let stop_bits: Bits<4, 3>;
///         let busy: Bit<8, Ro>;
///         let clear: Bit<9, bool, Wo>;
///         let lanes: BitSet<4, 4, 16>;
///     }
/// });
/// ```
///
/// This translates to the following:
///
/// ## Layout type
///
/// The layout type is always a `repr(transparent)` tuple struct wrapping a
/// [`Register`] over the base storage, and dereferences to it. A bare integer
/// base type `uN` means [`Plain<uN>`](Plain) storage. `LineControl` is a
/// 32-bit register with volatile storage, read-write as a whole (the
/// default), accessing its fields with the [`Generic`] engine (the default).
///
/// ## Layout type attributes
///
/// `#[access(..)]` gives the access policy of the register as a whole, and
/// the default policy of its fields. `#[engine(..)]` gives the field engine
/// by path, e.g., `#[engine(BitBand<0x4000_0000>)]`. All other attributes are
/// forwarded verbatim to the definition, except for `repr` attributes and
/// derivations of [`Clone`], [`Copy`] or [`Debug`], which are rejected.
///
/// ## Fields
///
/// Each field yields an accessor method of the same name returning a view:
/// a [`Field`] for `Bit` and `Bits` declarations, and a [`FieldSet`] of
/// `$count` items of `$size` bits each, the first at bit `$offset` (0 if
/// omitted), for `BitSet` declarations. Fields may overlap, in which case
/// they alias the same bits.
///
/// The value type of a field is `$Value`, or if omitted, `bool` for width-1
/// fields and items and otherwise the smallest unsigned integral type of bit
/// size at least the width. Signed value types are sign-extended from the
/// field width on read. Custom representations are declared with
/// [`bitfield_repr`]; not every bit pattern need be valid for them, so their
/// reads return `Result<$Value, InvalidBits<_>>`.
///
/// The access policy of a field is `$Access`, or if omitted, that of the
/// register. In the above, `busy` is read-only and `clear` write-only.
/// A field policy may only narrow that of its register, and how a field
/// write reaches the word is decided by the register alone: `clear` is
/// written into the current word, keeping every other bit, because
/// `LineControl` is read-write. A field granting a right its register lacks
/// is rejected:
///
/// ```compile_fail
/// bitview::layout!({
///     #[access(Ro)]
///     struct Status(u8);
///     {
///         let reset: Bit<7, bool, Rw>;
///     }
/// });
/// ```
///
/// Bit ranges past the top of a bare integral base type are rejected by the
/// macro; for other base types, they fail to compile when the storage word
/// is known.
///
/// ## Constructors
///
/// `new(word)` creates an instance holding `word`; it is only callable with
/// a [`Detached`] engine, however the engine is named. The unsafe `from_ptr(ptr)` views existing storage,
/// typically a memory-mapped register, as an instance of the layout (see
/// [`Register::from_ptr`]).
///
/// ## Trait implementations
///
/// * [`Deref`][`core::ops::Deref`], with a target of the underlying
///   [`Register`];
/// * [`Debug`], listing every readable field;
/// * [`Clone`], if the register is read-write and the engine is
///   [`Detached`].
///
/// ## Associated constants
///
/// For each field `foo`, `FOO` gives its [`FieldLocation`] or
/// [`FieldSetLocation`]. `FIELDS` gives the [`FieldMetadata`] of every field
/// in declaration order.
pub use bitview_macro::layout;

/// Syntax sugar for defining a custom field representation.
///
/// In particular, `#[bitfield_repr(uN)]` on a fieldless enum translates to
/// ```text
/// #[repr(uN)]
/// #[derive(
///     Clone,
///     Copy,
///     Debug,
///     Eq,
///     PartialEq,
///     ::zerocopy::Immutable,
///     ::zerocopy::IntoBytes,
///     ::zerocopy::TryFromBytes,
/// )]
/// ```
/// together with an implementation of [`FieldValue`] over every backing word,
/// reading as `Result<Self, InvalidBits<uN>>`. The enum's crate must depend
/// on `zerocopy`.
pub use bitview_macro::bitfield_repr;

/// The metadata of a field or field set declared with [`layout!`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldMetadata {
    /// The name of the field.
    pub name: &'static str,
    /// The first (low) bit of the field.
    pub first_bit: usize,
    /// The last (high) bit of the field. For field sets, this is the last bit
    /// of the last item.
    pub last_bit: usize,
    /// The number of items: 1 for a field.
    pub item_count: usize,
    /// The access rights to the field.
    pub access: Access,
}

impl FieldMetadata {
    /// The width of each item in bits.
    #[must_use]
    pub const fn item_size_bits(&self) -> usize {
        (1 + self.last_bit - self.first_bit) / self.item_count
    }
}
