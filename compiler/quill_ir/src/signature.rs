//! Function signatures and source locations.

use std::cmp::Ordering;
use std::fmt;

use crate::{Name, StringLookup};

/// A `(name, arity)` pair identifying a function, macro or documented unit.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    pub name: Name,
    pub arity: u32,
}

impl Signature {
    #[inline]
    pub const fn new(name: Name, arity: u32) -> Self {
        Signature { name, arity }
    }

    /// The reflection function, `__info__/1`.
    pub const REFLECTION: Signature = Signature::new(Name::INFO, 1);

    /// Total order by name text, then arity.
    ///
    /// Unlike the derived `Ord` (which compares intern indices) this order
    /// does not depend on the order atoms were first interned.
    pub fn cmp_by_text<L: StringLookup + ?Sized>(&self, other: &Self, lookup: &L) -> Ordering {
        lookup
            .lookup(self.name)
            .cmp(lookup.lookup(other.name))
            .then(self.arity.cmp(&other.arity))
    }

    /// Render as `name/arity`.
    pub fn display<'a, L: StringLookup + ?Sized>(&'a self, lookup: &'a L) -> impl fmt::Display + 'a {
        SignatureDisplay { sig: *self, lookup }
    }
}

struct SignatureDisplay<'a, L: ?Sized> {
    sig: Signature,
    lookup: &'a L,
}

impl<L: StringLookup + ?Sized> fmt::Display for SignatureDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.lookup.lookup(self.sig.name), self.sig.arity)
    }
}

/// File and line of a declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Interned file path.
    pub file: Name,
    pub line: u32,
}

impl Location {
    #[inline]
    pub const fn new(file: Name, line: u32) -> Self {
        Location { file, line }
    }

    /// Same file, different line.
    #[must_use]
    #[inline]
    pub const fn at_line(self, line: u32) -> Self {
        Location { line, ..self }
    }

    /// Render as `file:line`.
    pub fn display<'a, L: StringLookup + ?Sized>(&'a self, lookup: &'a L) -> impl fmt::Display + 'a {
        LocationDisplay { loc: *self, lookup }
    }
}

struct LocationDisplay<'a, L: ?Sized> {
    loc: Location,
    lookup: &'a L,
}

impl<L: StringLookup + ?Sized> fmt::Display for LocationDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lookup.lookup(self.loc.file), self.loc.line)
    }
}
