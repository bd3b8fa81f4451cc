//! Compile-time hooks.
//!
//! Hooks are `(target, function)` pairs registered per kind and invoked in
//! registration order through the evaluator. Errors raised by a hook are
//! re-raised with a pruned backtrace ending in a frame that names the hook.

use std::fmt;

use quill_ir::{Location, Name, Term};
use smallvec::SmallVec;

use crate::attribute::{AttributeName, AttributeValue};
use crate::collab::{Evaluator, Expansion};
use crate::docs::{DocEntry, DocKind};
use crate::env::Bindings;
use crate::errors::{EvalError, Frame, HookError};
use crate::forms::{DefKind, DefinitionEvent};
use crate::session::{ModuleName, Session};

/// When a hook runs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum HookKind {
    /// After the module body, before definitions are gathered.
    BeforeCompile,
    /// Once the backend produced the module binary.
    AfterCompile,
    /// Each time a definition clause is stored.
    OnDefinition,
}

impl HookKind {
    pub const ALL: [HookKind; 3] = [
        HookKind::BeforeCompile,
        HookKind::AfterCompile,
        HookKind::OnDefinition,
    ];

    /// The attribute that registers hooks of this kind.
    pub fn attribute(self) -> AttributeName {
        match self {
            HookKind::BeforeCompile => AttributeName::BeforeCompile,
            HookKind::AfterCompile => AttributeName::AfterCompile,
            HookKind::OnDefinition => AttributeName::OnDefinition,
        }
    }

    pub fn from_attribute(name: AttributeName) -> Option<Self> {
        match name {
            AttributeName::BeforeCompile => Some(HookKind::BeforeCompile),
            AttributeName::AfterCompile => Some(HookKind::AfterCompile),
            AttributeName::OnDefinition => Some(HookKind::OnDefinition),
            _ => None,
        }
    }

    /// Function called when only a target module is given.
    pub fn default_function(self) -> Name {
        match self {
            HookKind::BeforeCompile => Name::BEFORE_COMPILE_CALLBACK,
            HookKind::AfterCompile => Name::AFTER_COMPILE_CALLBACK,
            HookKind::OnDefinition => Name::ON_DEFINITION_CALLBACK,
        }
    }

    fn index(self) -> usize {
        match self {
            HookKind::BeforeCompile => 0,
            HookKind::AfterCompile => 1,
            HookKind::OnDefinition => 2,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::BeforeCompile => write!(f, "before_compile"),
            HookKind::AfterCompile => write!(f, "after_compile"),
            HookKind::OnDefinition => write!(f, "on_definition"),
        }
    }
}

/// A registered `(target, function)` pair.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct HookEntry {
    pub target: ModuleName,
    pub function: Name,
}

impl HookEntry {
    /// The documentation compiler every session starts with when docs
    /// are enabled. Handled natively instead of through the evaluator.
    pub const DOC_COMPILER: HookEntry = HookEntry {
        target: ModuleName::new(Name::MODULE_MODULE),
        function: Name::COMPILE_DOC,
    };

    pub fn new(target: ModuleName, function: Name) -> Self {
        HookEntry { target, function }
    }

    /// Parse a hook attribute value: `M` or `{M, f}`.
    pub fn from_term(kind: HookKind, term: &Term) -> Option<Self> {
        match term {
            Term::Atom(_) => {
                ModuleName::from_target(term).map(|m| HookEntry::new(m, kind.default_function()))
            }
            Term::Tuple(items) => match items.as_slice() {
                [target, Term::Atom(function)] => {
                    ModuleName::from_target(target).map(|m| HookEntry::new(m, *function))
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_builtin(self) -> bool {
        self == Self::DOC_COMPILER
    }
}

type HookList = SmallVec<[HookEntry; 2]>;

/// Hook lists of one session.
#[derive(Clone, Debug, Default)]
pub struct HookRegistry {
    lists: [HookList; 3],
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` to the hooks of `kind`.
    pub fn register(&mut self, kind: HookKind, entry: HookEntry) {
        self.lists[kind.index()].push(entry);
    }

    /// Hooks of `kind` in invocation order.
    pub fn entries(&self, kind: HookKind) -> &[HookEntry] {
        &self.lists[kind.index()]
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(SmallVec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(SmallVec::is_empty)
    }

    pub fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }
}

/// Run the hooks of `kind` registered on `session`.
///
/// The list is snapshotted first: hooks may register further hooks, which
/// do not run in the current pass.
pub(crate) fn invoke(
    session: &mut Session,
    kind: HookKind,
    evaluator: &mut dyn Evaluator,
    args: &[Term],
    bindings: &Bindings,
    location: Location,
    event: Option<&DefinitionEvent>,
) -> Result<(), HookError> {
    let snapshot: HookList = session.hooks().entries(kind).iter().copied().collect();
    for entry in snapshot {
        if entry.is_builtin() {
            if let Some(event) = event {
                compile_doc(session, event);
            }
            continue;
        }
        tracing::trace!(
            %kind,
            target = entry.target.as_str(session.interner()),
            function = session.interner().lookup(entry.function),
            "invoking hook"
        );
        let outcome = match evaluator.expand_hook(session, entry.target, entry.function, args, bindings) {
            Ok(Expansion::Literal(_)) => Ok(()),
            Ok(Expansion::Tree(tree)) => evaluator.eval_expansion(session, tree, bindings).map(drop),
            Err(error) => Err(error),
        };
        if let Err(error) = outcome {
            return Err(attribute(session, kind, entry, args.len(), location, error));
        }
    }
    Ok(())
}

fn attribute(
    session: &Session,
    kind: HookKind,
    entry: HookEntry,
    arity: usize,
    location: Location,
    error: EvalError,
) -> HookError {
    let arity = u32::try_from(arity).unwrap_or(u32::MAX);
    let interner = session.interner();
    let hook = format!(
        "{}.{}/{}",
        entry.target.as_str(interner),
        interner.lookup(entry.function),
        arity
    );
    let frame = Frame::attribution(entry.target, entry.function, arity, location);
    HookError {
        kind,
        hook,
        error: EvalError {
            message: error.message,
            trace: error.trace.prune(frame),
            hook: None,
        },
    }
}

/// The built-in `on_definition` hook: attach a pending `@doc` to the
/// definition being stored.
fn compile_doc(session: &mut Session, event: &DefinitionEvent) {
    let pending = session.attributes_mut().take(AttributeName::Doc);
    let doc = pending
        .last()
        .and_then(AttributeValue::as_term)
        .and_then(Term::as_binary)
        .map(str::to_owned);

    let kind = match event.kind {
        DefKind::Def => DocKind::Def,
        DefKind::Defmacro => DocKind::Defmacro,
        DefKind::Defp | DefKind::Defmacrop => {
            if !pending.is_empty() {
                tracing::debug!(
                    signature = %event.signature.display(session.interner()),
                    "doc discarded for private definition"
                );
            }
            return;
        }
    };

    // Later clauses of a multi-clause definition carry no doc of their own.
    if doc.is_none() && session.docs().contains(event.signature, kind) {
        return;
    }
    session.docs_mut().push(DocEntry {
        signature: event.signature,
        line: event.line,
        kind,
        formatted_signature: Term::list(event.args.iter().cloned()),
        doc,
    });
}
