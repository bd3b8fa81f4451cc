//! Per-module documentation records.

use quill_ir::{Name, Signature, Term};

/// What a documentation record describes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DocKind {
    Def,
    Defmacro,
    Type,
    Opaque,
}

impl DocKind {
    /// Type and opaque records become typedoc forms, not `docs` answers.
    pub fn is_type(self) -> bool {
        matches!(self, DocKind::Type | DocKind::Opaque)
    }

    pub fn name(self) -> Name {
        match self {
            DocKind::Def => Name::DEF,
            DocKind::Defmacro => Name::DEFMACRO,
            DocKind::Type => Name::TYPE,
            DocKind::Opaque => Name::OPAQUE,
        }
    }
}

/// One documented unit.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DocEntry {
    pub signature: Signature,
    pub line: u32,
    pub kind: DocKind,
    /// Argument patterns (or type parameters) as written.
    pub formatted_signature: Term,
    /// `None` when the unit was defined without a doc attribute.
    pub doc: Option<String>,
}

impl DocEntry {
    /// `{{name, arity}, line, kind, signature, doc | nil}`.
    pub fn to_term(&self) -> Term {
        Term::tuple([
            Term::signature(self.signature),
            Term::Integer(i64::from(self.line)),
            Term::atom(self.kind.name()),
            self.formatted_signature.clone(),
            self.doc.as_deref().map_or_else(Term::nil, Term::binary),
        ])
    }
}

/// Documentation records of one module, in insertion order.
///
/// Duplicate signatures are kept; each produces its own record downstream.
#[derive(Clone, Debug, Default)]
pub struct DocStore {
    entries: Vec<DocEntry>,
}

impl DocStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DocEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocEntry> {
        self.entries.iter()
    }

    /// Whether a record for `signature` of `kind` already exists.
    pub fn contains(&self, signature: Signature, kind: DocKind) -> bool {
        self.entries
            .iter()
            .any(|e| e.signature == signature && e.kind == kind)
    }

    /// Function and macro records.
    pub fn definitions(&self) -> impl Iterator<Item = &DocEntry> {
        self.entries.iter().filter(|e| !e.kind.is_type())
    }

    /// Type and opaque records.
    pub fn types(&self) -> impl Iterator<Item = &DocEntry> {
        self.entries.iter().filter(|e| e.kind.is_type())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
