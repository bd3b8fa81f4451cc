//! Compilation environment handed in by the caller.

use quill_ir::{Location, Name, Term};

use crate::ModuleName;

/// Opaque lexical context (lexical tracker, aliases, requires).
///
/// The module compiler stores it on the session for collaborators and
/// never looks inside.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LexicalContext(Term);

impl LexicalContext {
    pub fn new(term: Term) -> Self {
        LexicalContext(term)
    }

    /// Context with no lexical information, for modules defined outside
    /// any tracked file.
    pub fn empty() -> Self {
        LexicalContext(Term::nil())
    }

    pub fn term(&self) -> &Term {
        &self.0
    }
}

impl Default for LexicalContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// Where a module is being defined and under which lexical context.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CompileEnv {
    /// Interned source file path.
    pub file: Name,
    /// Line of the module declaration.
    pub line: u32,
    pub lexical: LexicalContext,
}

impl CompileEnv {
    pub fn new(file: Name, line: u32) -> Self {
        CompileEnv {
            file,
            line,
            lexical: LexicalContext::empty(),
        }
    }

    #[must_use]
    pub fn with_lexical(mut self, lexical: LexicalContext) -> Self {
        self.lexical = lexical;
        self
    }

    pub fn location(&self) -> Location {
        Location::new(self.file, self.line)
    }

    /// `{module, file, line}`: the environment argument passed to
    /// compile hooks.
    pub fn to_term(&self, module: ModuleName) -> Term {
        Term::tuple([
            module.to_term(),
            Term::atom(self.file),
            Term::Integer(i64::from(self.line)),
        ])
    }
}

/// Variable bindings produced by evaluating the module body.
///
/// Insertion ordered; rebinding a name replaces its value in place.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Bindings(Vec<(Name, Term)>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Name) -> Option<&Term> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn bind(&mut self, name: Name, value: Term) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Name, &Term)> {
        self.0.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Name, Term)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (Name, Term)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.bind(name, value);
        }
        bindings
    }
}
