//! Interned atom identifier.
//!
//! Provides compact 32-bit interned identifiers. The first entries of every
//! interner are a fixed table of well-known atoms, so their `Name`s are
//! compile-time constants.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Interned atom identifier.
///
/// A plain index into the owning `StringInterner`. Two names from the same
/// interner are equal iff their text is equal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Name(u32);

/// Atoms pre-interned by every interner, indexed by their `Name`.
///
/// The constants on `Name` below must stay in sync with this table.
pub(crate) const PREINTERNED: &[&str] = &[
    "",
    "nil",
    "true",
    "false",
    "__info__",
    "functions",
    "macros",
    "module",
    "docs",
    "moduledoc",
    "term",
    "type",
    "behaviour",
    "on_load",
    "spec",
    "typep",
    "opaque",
    "callback",
    "compile",
    "external_resource",
    "before_compile",
    "after_compile",
    "on_definition",
    "derive",
    "vsn",
    "doc",
    "typedoc",
    "def",
    "defp",
    "defmacro",
    "defmacrop",
    "debug_info",
    "Module",
    "compile_doc",
    "__before_compile__",
    "__after_compile__",
    "__on_definition__",
    "fun",
    "product",
    "bounded_fun",
];

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    pub const NIL: Name = Name(1);
    pub const TRUE: Name = Name(2);
    pub const FALSE: Name = Name(3);

    // Reflection function and its queries
    pub const INFO: Name = Name(4);
    pub const FUNCTIONS: Name = Name(5);
    pub const MACROS: Name = Name(6);
    pub const MODULE: Name = Name(7);
    pub const DOCS: Name = Name(8);
    pub const MODULEDOC: Name = Name(9);

    // Type vocabulary
    pub const TERM: Name = Name(10);
    pub const TYPE: Name = Name(11);

    // Attribute names
    pub const BEHAVIOUR: Name = Name(12);
    pub const ON_LOAD: Name = Name(13);
    pub const SPEC: Name = Name(14);
    pub const TYPEP: Name = Name(15);
    pub const OPAQUE: Name = Name(16);
    pub const CALLBACK: Name = Name(17);
    pub const COMPILE: Name = Name(18);
    pub const EXTERNAL_RESOURCE: Name = Name(19);
    pub const BEFORE_COMPILE: Name = Name(20);
    pub const AFTER_COMPILE: Name = Name(21);
    pub const ON_DEFINITION: Name = Name(22);
    pub const DERIVE: Name = Name(23);
    pub const VSN: Name = Name(24);
    pub const DOC: Name = Name(25);
    pub const TYPEDOC: Name = Name(26);

    // Definition kinds
    pub const DEF: Name = Name(27);
    pub const DEFP: Name = Name(28);
    pub const DEFMACRO: Name = Name(29);
    pub const DEFMACROP: Name = Name(30);

    // Compile options
    pub const DEBUG_INFO: Name = Name(31);

    // Built-in doc compiler hook
    pub const MODULE_MODULE: Name = Name(32);
    pub const COMPILE_DOC: Name = Name(33);

    // Default hook callbacks
    pub const BEFORE_COMPILE_CALLBACK: Name = Name(34);
    pub const AFTER_COMPILE_CALLBACK: Name = Name(35);
    pub const ON_DEFINITION_CALLBACK: Name = Name(36);

    // Abstract type syntax tags
    pub const FUN: Name = Name(37);
    pub const PRODUCT: Name = Name(38);
    pub const BOUNDED_FUN: Name = Name(39);

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create from raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Index into the interner's string table.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this name is one of the pre-interned atoms.
    #[inline]
    pub fn is_preinterned(self) -> bool {
        self.index() < PREINTERNED.len()
    }
}

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match PREINTERNED.get(self.index()) {
            Some(text) => write!(f, "Name({text})"),
            None => write!(f, "Name(#{})", self.0),
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}
