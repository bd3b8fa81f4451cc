//! Literal terms.
//!
//! `Term` is the value currency between the module compiler and its
//! collaborators: attribute values, documentation payloads, reflection
//! answers and opaque clause trees are all terms. The module compiler
//! builds and repackages terms but never evaluates them.

use std::fmt;

use crate::{Name, Signature, StringLookup};

/// A literal value or opaque syntax tree.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Term {
    Atom(Name),
    Integer(i64),
    /// UTF-8 binary (string literal).
    Binary(String),
    /// Raw bytes, e.g. a compiled module.
    Bytes(Vec<u8>),
    List(Vec<Term>),
    Tuple(Vec<Term>),
}

impl Term {
    /// The `nil` atom.
    #[inline]
    pub const fn nil() -> Self {
        Term::Atom(Name::NIL)
    }

    #[inline]
    pub const fn atom(name: Name) -> Self {
        Term::Atom(name)
    }

    pub fn binary(text: impl Into<String>) -> Self {
        Term::Binary(text.into())
    }

    pub fn list(items: impl IntoIterator<Item = Term>) -> Self {
        Term::List(items.into_iter().collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Term>) -> Self {
        Term::Tuple(items.into_iter().collect())
    }

    /// `{name, arity}` tuple for a signature.
    pub fn signature(signature: Signature) -> Self {
        Term::Tuple(vec![
            Term::Atom(signature.name),
            Term::Integer(i64::from(signature.arity)),
        ])
    }

    /// The top type `{type, Line, term, []}` in abstract type syntax.
    pub fn top_type(line: u32) -> Self {
        Term::Tuple(vec![
            Term::Atom(Name::TYPE),
            Term::Integer(i64::from(line)),
            Term::Atom(Name::TERM),
            Term::List(Vec::new()),
        ])
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Atom(Name::NIL))
    }

    #[inline]
    pub fn as_atom(&self) -> Option<Name> {
        match self {
            Term::Atom(name) => Some(*name),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&str> {
        match self {
            Term::Binary(text) => Some(text),
            _ => None,
        }
    }

    /// Render with atom names resolved through `lookup`.
    pub fn display<'a, L: StringLookup + ?Sized>(&'a self, lookup: &'a L) -> TermDisplay<'a, L> {
        TermDisplay { term: self, lookup }
    }
}

/// Display adapter returned by [`Term::display`].
pub struct TermDisplay<'a, L: ?Sized> {
    term: &'a Term,
    lookup: &'a L,
}

impl<L: StringLookup + ?Sized> TermDisplay<'_, L> {
    fn write_seq(&self, f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item.display(self.lookup))?;
        }
        Ok(())
    }
}

impl<L: StringLookup + ?Sized> fmt::Display for TermDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term {
            Term::Atom(name) => write!(f, "{}", self.lookup.lookup(*name)),
            Term::Integer(n) => write!(f, "{n}"),
            Term::Binary(text) => write!(f, "{text:?}"),
            Term::Bytes(bytes) => write!(f, "<<{} bytes>>", bytes.len()),
            Term::List(items) => {
                write!(f, "[")?;
                self.write_seq(f, items)?;
                write!(f, "]")
            }
            Term::Tuple(items) => {
                write!(f, "{{")?;
                self.write_seq(f, items)?;
                write!(f, "}}")
            }
        }
    }
}
