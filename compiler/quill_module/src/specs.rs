//! Spec and callback translation.
//!
//! Macros compile to ordinary functions taking one extra leading argument
//! (the caller's environment), so a spec written against a public macro
//! must be rewritten to describe the function that actually exists: arity
//! plus one, with a leading top-type argument.

use std::fmt;

use quill_ir::{Name, Signature, Term};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::attribute::{AttributeName, AttributeStore, AttributeValue};
use crate::forms::Form;

/// Which attribute a spec clause was declared under.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SpecKind {
    Spec,
    Callback,
}

impl SpecKind {
    pub fn attribute(self) -> AttributeName {
        match self {
            SpecKind::Spec => AttributeName::Spec,
            SpecKind::Callback => AttributeName::Callback,
        }
    }

    pub fn name(self) -> Name {
        self.attribute().name()
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecKind::Spec => write!(f, "spec"),
            SpecKind::Callback => write!(f, "callback"),
        }
    }
}

/// A function type `(args) -> result when constraints`.
///
/// Argument, result and constraint types are opaque abstract-type terms.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FunType {
    pub line: u32,
    pub args: Vec<Term>,
    pub result: Term,
    pub constraints: Vec<Term>,
}

impl FunType {
    pub fn new(line: u32, args: Vec<Term>, result: Term) -> Self {
        FunType {
            line,
            args,
            result,
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: Vec<Term>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Prepend the top type to the argument list.
    #[must_use]
    pub fn with_leading_any(mut self) -> Self {
        self.args.insert(0, Term::top_type(self.line));
        self
    }

    /// Abstract type syntax: `{type, L, fun, [{type, L, product, Args}, Result]}`,
    /// wrapped in `bounded_fun` when constrained.
    pub fn to_term(&self) -> Term {
        let line = Term::Integer(i64::from(self.line));
        let product = Term::tuple([
            Term::atom(Name::TYPE),
            line.clone(),
            Term::atom(Name::PRODUCT),
            Term::list(self.args.iter().cloned()),
        ]);
        let fun = Term::tuple([
            Term::atom(Name::TYPE),
            line.clone(),
            Term::atom(Name::FUN),
            Term::list([product, self.result.clone()]),
        ]);
        if self.constraints.is_empty() {
            fun
        } else {
            Term::tuple([
                Term::atom(Name::TYPE),
                line,
                Term::atom(Name::BOUNDED_FUN),
                Term::list([fun, Term::list(self.constraints.iter().cloned())]),
            ])
        }
    }
}

/// One `@spec`/`@callback` clause as written by the user.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SpecDecl {
    pub signature: Signature,
    pub line: u32,
    pub fun: FunType,
}

impl SpecDecl {
    pub fn new(signature: Signature, line: u32, fun: FunType) -> Self {
        SpecDecl {
            signature,
            line,
            fun,
        }
    }

    /// `{{name, arity}, FunType}`.
    pub fn to_term(&self) -> Term {
        Term::tuple([Term::signature(self.signature), self.fun.to_term()])
    }

    /// Rewrite for the function a public macro compiles to, which takes
    /// `arity` arguments.
    fn for_macro(self, arity: u32) -> Self {
        SpecDecl {
            signature: Signature::new(self.signature.name, arity),
            line: self.line,
            fun: self.fun.with_leading_any(),
        }
    }
}

/// Consume `spec` and `callback` from `store` and produce their forms.
///
/// Specs attached to a public macro (in `macros`, not in `private_macros`)
/// are rewritten; everything else passes through. Clauses sharing a
/// `(kind, signature)` are merged, in declaration order and without
/// deduplication, into one form carrying the line of the first clause.
/// Forms come out in order of each signature's first clause, specs
/// before callbacks.
pub fn translate(
    store: &mut AttributeStore,
    macros: &FxHashSet<Signature>,
    private_macros: &FxHashSet<Signature>,
) -> Vec<Form> {
    let mut forms = Vec::new();
    for kind in [SpecKind::Spec, SpecKind::Callback] {
        let decls = store.take(kind.attribute()).into_iter().filter_map(|value| match value {
            AttributeValue::Spec(decl) => Some(decl),
            AttributeValue::Term(_) => {
                tracing::debug!(%kind, "ignoring untyped value stored under spec attribute");
                None
            }
        });
        merge_into(&mut forms, kind, decls.map(|decl| adjust(decl, macros, private_macros)));
    }
    forms
}

fn adjust(
    decl: SpecDecl,
    macros: &FxHashSet<Signature>,
    private_macros: &FxHashSet<Signature>,
) -> SpecDecl {
    let sig = decl.signature;
    if !macros.contains(&sig) || private_macros.contains(&sig) {
        return decl;
    }
    let Some(arity) = sig.arity.checked_add(1) else {
        tracing::debug!(arity = sig.arity, "macro spec arity out of range, left as declared");
        return decl;
    };
    decl.for_macro(arity)
}

fn merge_into(forms: &mut Vec<Form>, kind: SpecKind, decls: impl Iterator<Item = SpecDecl>) {
    let mut index: FxHashMap<Signature, usize> = FxHashMap::default();
    for decl in decls {
        if let Some(&at) = index.get(&decl.signature) {
            if let Form::Spec { clauses, .. } = &mut forms[at] {
                clauses.push(decl.fun);
            }
            continue;
        }
        index.insert(decl.signature, forms.len());
        forms.push(Form::Spec {
            kind,
            line: decl.line,
            signature: decl.signature,
            clauses: vec![decl.fun],
        });
    }
}
