//! Interfaces of the collaborators the module compiler drives.
//!
//! The module compiler never parses, evaluates or generates code. It calls
//! out through these traits and only orchestrates the results.

use quill_ir::{Name, Signature, Term};
use rustc_hash::FxHashSet;

use crate::assemble::LoadOptions;
use crate::env::{Bindings, LexicalContext};
use crate::errors::{CompileError, EvalError};
use crate::forms::{Definition, Form, FunctionForm};
use crate::session::{ModuleName, Session};

/// What a hook call expanded to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expansion {
    /// Already a value; nothing left to evaluate.
    Literal(Term),
    /// A syntax tree to evaluate against the current bindings.
    Tree(Term),
}

/// Result of evaluating a module body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Evaluated {
    pub result: Term,
    pub bindings: Bindings,
    /// Lexical context after the body, if the evaluator changed it.
    pub lexical: Option<LexicalContext>,
}

impl Evaluated {
    pub fn new(result: Term, bindings: Bindings) -> Self {
        Evaluated {
            result,
            bindings,
            lexical: None,
        }
    }

    #[must_use]
    pub fn with_lexical(mut self, lexical: LexicalContext) -> Self {
        self.lexical = Some(lexical);
        self
    }
}

/// Runs user code.
///
/// Every call receives the session of the module being compiled so that
/// directives in the evaluated code (attribute writes, hook registration,
/// definitions) land in the right stores.
pub trait Evaluator {
    /// Evaluate the module body.
    fn eval_body(
        &mut self,
        session: &mut Session,
        body: &Term,
        bindings: &Bindings,
    ) -> Result<Evaluated, EvalError>;

    /// Call `target.function(args...)` as a compile hook.
    fn expand_hook(
        &mut self,
        session: &mut Session,
        target: ModuleName,
        function: Name,
        args: &[Term],
        bindings: &Bindings,
    ) -> Result<Expansion, EvalError>;

    /// Evaluate a tree returned by [`Evaluator::expand_hook`].
    fn eval_expansion(
        &mut self,
        session: &mut Session,
        tree: Term,
        bindings: &Bindings,
    ) -> Result<Term, EvalError>;
}

/// Everything the definition compiler gathered for one module.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Unwrapped {
    /// Every defined signature, public and private.
    pub all: Vec<Signature>,
    /// Public functions and macros as exported.
    pub exports: Vec<Signature>,
    pub private: Vec<Definition>,
    /// Public functions.
    pub defs: Vec<Signature>,
    /// Macros, public and private.
    pub macros: Vec<Signature>,
    pub functions: Vec<FunctionForm>,
}

impl Unwrapped {
    /// Signatures of `defmacrop` definitions.
    pub fn private_macros(&self) -> FxHashSet<Signature> {
        self.private
            .iter()
            .filter(|d| d.kind.is_macro())
            .map(|d| d.signature)
            .collect()
    }

    /// Signatures of every private definition.
    pub fn private_signatures(&self) -> FxHashSet<Signature> {
        self.private.iter().map(|d| d.signature).collect()
    }
}

/// Turns stored definitions into function forms.
pub trait DefinitionCompiler {
    /// Gather the definitions of `session`'s module. Called once, after
    /// `before_compile` hooks ran, so overridables they marked are visible.
    fn unwrap(&mut self, session: &Session) -> Result<Unwrapped, CompileError>;
}

/// A compiled module as produced by the backend.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Binary(pub Vec<u8>);

impl Binary {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_term(&self) -> Term {
        Term::Bytes(self.0.clone())
    }
}

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Binary(bytes)
    }
}

/// Callback the loader must invoke exactly once with the produced binary.
pub type OnReady<'a> = dyn FnMut(ModuleName, Binary) -> Result<Binary, CompileError> + 'a;

/// Code generation and loading.
pub trait Loader {
    /// Whether a module with this identity is already loaded.
    fn is_loaded(&self, module: ModuleName) -> bool;

    /// Compile and load `forms`.
    ///
    /// Must call `on_ready` exactly once, synchronously, before returning,
    /// and propagate its error. Backend failures are `LoadError`s.
    fn load(
        &mut self,
        module: ModuleName,
        forms: &[Form],
        options: &LoadOptions,
        on_ready: &mut OnReady<'_>,
    ) -> Result<Binary, CompileError>;
}
