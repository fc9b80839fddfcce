// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Access rights of registers, fields and field sets.
//!
//! An access policy is chosen per declaration as a zero-sized marker type
//! ([`Ro`], [`Wo`], [`Rw`], [`Rew`] or [`NoAccess`]). Every operation on a
//! view is gated by one of the capability traits [`Readable`], [`Writable`]
//! and [`ReadWritable`], so an operation the policy does not grant fails to
//! compile instead of failing at runtime.
//!
//! ```rust
//! use bitview::{Field, Plain, Register, Rw, Span};
//!
//! let reg: Register<Plain<u8>> = Register::new(0);
//! let field: Field<'_, Plain<u8>, Span<3, 7>, i32, Rw> = reg.field();
//! field.set(-2);
//! assert_eq!(field.get(), -2);
//! ```
//!
//! Reading a write-only field is rejected:
//!
//! ```compile_fail
//! use bitview::{Field, Plain, Register, Span, Wo};
//!
//! let reg: Register<Plain<u8>> = Register::new(0);
//! let field: Field<'_, Plain<u8>, Span<3, 7>, i32, Wo> = reg.field();
//! let _ = field.get();
//! ```
//!
//! So is writing a read-only field:
//!
//! ```compile_fail
//! use bitview::{Bit, Field, Plain, Register, Ro};
//!
//! let reg: Register<Plain<u8>> = Register::new(0);
//! let field: Field<'_, Plain<u8>, Bit<0>, bool, Ro> = reg.field();
//! field.set(true);
//! ```
//!
//! A field never grants more than its register. Writing a read-write field
//! of a read-only register is rejected:
//!
//! ```compile_fail
//! use bitview::{Plain, Register, Ro, Rw, Span};
//!
//! let reg: Register<Plain<u8>, Ro> = Register::new(0);
//! reg.field::<Span<0, 3>, u8, Rw>().set(1);
//! ```
//!
//! As is reading one of a write-only register:
//!
//! ```compile_fail
//! use bitview::{Items, Plain, Register, Rw, Wo};
//!
//! let reg: Register<Plain<u8>, Wo> = Register::new(0);
//! let _ = reg.field_set::<Items<2, 4>, u8, Rw>().get(0);
//! ```
//!
//! Copying a register that is not read-write is rejected too, both as a
//! clone and as an assignment:
//!
//! ```compile_fail
//! use bitview::{Plain, Register, Wo};
//!
//! let reg: Register<Plain<u8>, Wo> = Register::new(0);
//! let _ = reg.clone();
//! ```
//!
//! ```compile_fail
//! use bitview::{Plain, Register, Ro};
//!
//! let a: Register<Plain<u8>, Ro> = Register::new(0);
//! let b: Register<Plain<u8>, Ro> = Register::new(0);
//! a.assign(&b);
//! ```

use core::fmt;

/// Describes the access rights to a memory location.
///
/// The discriminants are bit sets: bit 0 grants reads, bit 1 grants writes,
/// and bit 2 marks writes as ephemeral.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Access {
    /// Neither reads nor writes.
    None = 0,
    /// Reads only.
    Read = 1,
    /// Writes only.
    Write = 2,
    /// Reads and writes.
    ReadWrite = 3,
    /// Reads and writes, where written values are not stored: a write never
    /// reads the word back first.
    ReadEphemeralWrite = 7,
}

impl Access {
    const READ: u8 = Self::Read as u8;
    const WRITE: u8 = Self::Write as u8;
    const READ_WRITE: u8 = Self::ReadWrite as u8;
    const EPHEMERAL: u8 = Self::ReadEphemeralWrite as u8;

    const fn bits(self) -> u8 {
        self as u8
    }

    /// Whether reads are permitted.
    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.bits() & Self::READ != 0
    }

    /// Whether writes are permitted.
    #[must_use]
    pub const fn is_writeable(self) -> bool {
        self.bits() & Self::WRITE != 0
    }

    /// Whether reads, and only reads, are permitted.
    #[must_use]
    pub const fn is_readonly(self) -> bool {
        self.bits() & Self::READ_WRITE == Self::READ
    }

    /// Whether writes, and only writes, are permitted.
    #[must_use]
    pub const fn is_writeonly(self) -> bool {
        self.bits() & Self::READ_WRITE == Self::WRITE
    }

    /// Whether both reads and writes are permitted. This includes
    /// [`Access::ReadEphemeralWrite`].
    #[must_use]
    pub const fn is_readwrite(self) -> bool {
        self.bits() & Self::READ_WRITE == Self::READ_WRITE
    }

    /// Whether writes skip the read-modify-write cycle.
    #[must_use]
    pub const fn is_ephemeralwrite(self) -> bool {
        self.bits() & Self::EPHEMERAL == Self::EPHEMERAL
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Read => "r",
            Self::Write => "w",
            Self::ReadWrite => "rw",
            Self::ReadEphemeralWrite => "rew",
        })
    }
}

/// A compile-time access policy.
pub trait AccessPolicy: private::Sealed {
    /// The access rights the policy stands for.
    const ACCESS: Access;
}

/// Policies that permit reads.
pub trait Readable: AccessPolicy {}

/// Policies that permit writes.
pub trait Writable: AccessPolicy {}

/// Policies that permit both reads and writes, and hence copies.
pub trait ReadWritable: Readable + Writable {}

/// No access.
#[derive(Debug)]
pub enum NoAccess {}

/// Read-only access.
#[derive(Debug)]
pub enum Ro {}

/// Write-only access.
#[derive(Debug)]
pub enum Wo {}

/// Read-write access.
#[derive(Debug)]
pub enum Rw {}

/// Read access with ephemeral writes.
#[derive(Debug)]
pub enum Rew {}

macro_rules! policy {
    ($marker:ident = $access:ident $(: $($cap:ident),*)?) => {
        impl private::Sealed for $marker {}
        impl AccessPolicy for $marker {
            const ACCESS: Access = Access::$access;
        }
        $($(impl $cap for $marker {})*)?
    };
}

policy!(NoAccess = None);
policy!(Ro = Read: Readable);
policy!(Wo = Write: Writable);
policy!(Rw = ReadWrite: Readable, Writable, ReadWritable);
policy!(Rew = ReadEphemeralWrite: Readable, Writable, ReadWritable);

// Ensures that no type outside of bitview can implement this type.
mod private {
    pub trait Sealed {}
}

#[cfg(test)]
mod tests {
    use super::*;

    // The capability traits must agree with the predicates of the policy
    // they are implemented for.
    const _: () = {
        assert!(!NoAccess::ACCESS.is_readable());
        assert!(!NoAccess::ACCESS.is_writeable());
        assert!(Ro::ACCESS.is_readonly());
        assert!(Wo::ACCESS.is_writeonly());
        assert!(Rw::ACCESS.is_readwrite());
        assert!(!Rw::ACCESS.is_ephemeralwrite());
        assert!(Rew::ACCESS.is_readwrite());
        assert!(Rew::ACCESS.is_ephemeralwrite());
    };

    #[test]
    fn predicates() {
        let table = [
            // access, r, w, ro, wo, rw, ew
            (Access::None, false, false, false, false, false, false),
            (Access::Read, true, false, true, false, false, false),
            (Access::Write, false, true, false, true, false, false),
            (Access::ReadWrite, true, true, false, false, true, false),
            (Access::ReadEphemeralWrite, true, true, false, false, true, true),
        ];
        for (access, r, w, ro, wo, rw, ew) in table {
            assert_eq!(access.is_readable(), r, "{access}");
            assert_eq!(access.is_writeable(), w, "{access}");
            assert_eq!(access.is_readonly(), ro, "{access}");
            assert_eq!(access.is_writeonly(), wo, "{access}");
            assert_eq!(access.is_readwrite(), rw, "{access}");
            assert_eq!(access.is_ephemeralwrite(), ew, "{access}");
        }
    }
}
