//! Definitions coming in and forms going out.

use quill_ir::{Name, Signature, Term};

use crate::attribute::AttributeName;
use crate::reflection::ReflectionFunction;
use crate::specs::{FunType, SpecKind};
use crate::ModuleName;

/// Kind of a function-like definition.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DefKind {
    Def,
    Defp,
    Defmacro,
    Defmacrop,
}

impl DefKind {
    pub fn is_private(self) -> bool {
        matches!(self, DefKind::Defp | DefKind::Defmacrop)
    }

    pub fn is_macro(self) -> bool {
        matches!(self, DefKind::Defmacro | DefKind::Defmacrop)
    }

    pub fn name(self) -> Name {
        match self {
            DefKind::Def => Name::DEF,
            DefKind::Defp => Name::DEFP,
            DefKind::Defmacro => Name::DEFMACRO,
            DefKind::Defmacrop => Name::DEFMACROP,
        }
    }
}

/// A definition as assembled by the definition compiler.
///
/// Clause trees are opaque; they are only repackaged.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Definition {
    pub signature: Signature,
    pub kind: DefKind,
    pub line: u32,
    pub clauses: Vec<Term>,
}

/// One clause being stored, as reported to `on_definition` hooks.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DefinitionEvent {
    pub kind: DefKind,
    pub signature: Signature,
    pub line: u32,
    /// Argument patterns as written, used as the documented signature.
    pub args: Vec<Term>,
    pub guards: Vec<Term>,
    pub body: Term,
}

impl DefinitionEvent {
    /// Hook arguments: `[env, kind, name, args, guards, body]`.
    pub fn hook_args(&self, env: Term) -> Vec<Term> {
        vec![
            env,
            Term::atom(self.kind.name()),
            Term::atom(self.signature.name),
            Term::list(self.args.iter().cloned()),
            Term::list(self.guards.iter().cloned()),
            self.body.clone(),
        ]
    }
}

/// A compiled function ready for the backend.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FunctionForm {
    pub signature: Signature,
    pub line: u32,
    pub clauses: Vec<Term>,
}

/// One entry of the final form list handed to the loader.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Form {
    File {
        path: Name,
        line: u32,
    },
    Module {
        name: ModuleName,
        line: u32,
    },
    Export {
        line: u32,
        functions: Vec<Signature>,
    },
    Attribute {
        line: u32,
        name: AttributeName,
        value: Term,
    },
    Spec {
        kind: SpecKind,
        line: u32,
        signature: Signature,
        clauses: Vec<FunType>,
    },
    Typedoc {
        signature: Signature,
        doc: Option<String>,
    },
    Reflection(ReflectionFunction),
    Function(FunctionForm),
}

impl Form {
    /// Exported signatures, if this is the export form.
    pub fn as_export(&self) -> Option<&[Signature]> {
        match self {
            Form::Export { functions, .. } => Some(functions),
            _ => None,
        }
    }

    pub fn as_reflection(&self) -> Option<&ReflectionFunction> {
        match self {
            Form::Reflection(reflection) => Some(reflection),
            _ => None,
        }
    }
}
