//! Compilation sessions.
//!
//! A `Session` owns all compile-time state of one module: its attribute
//! and doc stores, its hook lists and its overridable set. At most one
//! session per module identity exists at a time, enforced by a
//! `SessionRegistry`. Dropping the session releases its registry slot, so
//! teardown happens on every exit path of a compile.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use quill_ir::{Location, Name, SharedInterner, Signature, StringLookup, Term};

use crate::attribute::{AttributeFlags, AttributeName, AttributeStore, AttributeTable, AttributeValue};
use crate::collab::Evaluator;
use crate::config::CompilerOptions;
use crate::docs::{DocEntry, DocKind, DocStore};
use crate::env::{Bindings, CompileEnv, LexicalContext};
use crate::errors::{CompileError, EvalError, HookError};
use crate::forms::DefinitionEvent;
use crate::hooks::{self, HookEntry, HookKind, HookRegistry};

/// Identity of a module: a non-reserved atom.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ModuleName(Name);

impl ModuleName {
    #[inline]
    pub const fn new(name: Name) -> Self {
        ModuleName(name)
    }

    /// Validate a compile target.
    ///
    /// Only atoms qualify, and not the empty atom or the literals
    /// `nil`, `true` and `false`.
    pub fn from_target(target: &Term) -> Option<Self> {
        match target.as_atom()? {
            Name::EMPTY | Name::NIL | Name::TRUE | Name::FALSE => None,
            name => Some(ModuleName(name)),
        }
    }

    #[inline]
    pub const fn name(self) -> Name {
        self.0
    }

    pub fn to_term(self) -> Term {
        Term::atom(self.0)
    }

    pub fn as_str<L: StringLookup + ?Sized>(self, lookup: &L) -> &str {
        lookup.lookup(self.0)
    }
}

/// Modules currently being compiled.
///
/// Opening is an atomic check-and-insert on a concurrent map, so two
/// compiles of the same identity racing each other cannot both win.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    open: DashMap<ModuleName, ()>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, module: ModuleName) -> bool {
        self.open.contains_key(&module)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    fn try_acquire(&self, module: ModuleName) -> bool {
        match self.open.entry(module) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(());
                true
            }
        }
    }

    fn release(&self, module: ModuleName) {
        self.open.remove(&module);
    }
}

/// Shared handle to a session registry.
#[derive(Clone, Debug, Default)]
pub struct SharedSessionRegistry(Arc<SessionRegistry>);

impl SharedSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<SharedSessionRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SharedSessionRegistry::new).clone()
    }

    /// Open a session for `module`.
    ///
    /// Fails with `ModuleInDefinition` if a session for the same identity
    /// is already open anywhere in the process.
    pub fn open(
        &self,
        interner: &SharedInterner,
        module: ModuleName,
        env: CompileEnv,
        options: &CompilerOptions,
    ) -> Result<Session, CompileError> {
        if !self.try_acquire(module) {
            return Err(CompileError::ModuleInDefinition {
                module: module.as_str(interner).to_owned(),
                location: env.location(),
            });
        }
        let guard = SessionGuard {
            registry: self.clone(),
            module,
            released: false,
        };
        tracing::debug!(module = module.as_str(interner), "session opened");
        Ok(Session::new(interner.clone(), module, env, options.docs, guard))
    }
}

impl Deref for SharedSessionRegistry {
    type Target = SessionRegistry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Holds a registry slot; releases it on drop.
struct SessionGuard {
    registry: SharedSessionRegistry,
    module: ModuleName,
    released: bool,
}

impl SessionGuard {
    fn release(&mut self) {
        if !self.released {
            self.registry.release(self.module);
            self.released = true;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Compile-time state of one module.
pub struct Session {
    module: ModuleName,
    env: CompileEnv,
    interner: SharedInterner,
    attributes: AttributeStore,
    docs: DocStore,
    hooks: HookRegistry,
    overridable: Vec<Signature>,
    moduledoc: Option<(u32, Term)>,
    guard: SessionGuard,
}

impl Session {
    fn new(
        interner: SharedInterner,
        module: ModuleName,
        env: CompileEnv,
        docs: bool,
        guard: SessionGuard,
    ) -> Self {
        let mut hooks = HookRegistry::new();
        if docs {
            hooks.register(HookKind::OnDefinition, HookEntry::DOC_COMPILER);
        }
        Session {
            module,
            env,
            interner,
            attributes: AttributeStore::new(AttributeTable::with_defaults()),
            docs: DocStore::new(),
            hooks,
            overridable: Vec::new(),
            moduledoc: None,
            guard,
        }
    }

    pub fn module(&self) -> ModuleName {
        self.module
    }

    pub fn env(&self) -> &CompileEnv {
        &self.env
    }

    /// Where the module is declared.
    pub fn location(&self) -> Location {
        self.env.location()
    }

    pub fn lexical(&self) -> &LexicalContext {
        &self.env.lexical
    }

    pub fn set_lexical(&mut self, lexical: LexicalContext) {
        self.env.lexical = lexical;
    }

    /// The environment argument handed to hooks.
    pub fn env_term(&self) -> Term {
        self.env.to_term(self.module)
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.attributes
    }

    pub fn docs(&self) -> &DocStore {
        &self.docs
    }

    pub fn docs_mut(&mut self) -> &mut DocStore {
        &mut self.docs
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// The pending module doc and the line it was declared on.
    pub fn moduledoc(&self) -> Option<&(u32, Term)> {
        self.moduledoc.as_ref()
    }

    /// Write an attribute from a module-body directive.
    ///
    /// Hook attributes also register their hook: a bare module `M` names
    /// the conventional callback (`__before_compile__` and friends), a
    /// `{M, f}` tuple names `f` explicitly.
    pub fn put_attribute(
        &mut self,
        line: u32,
        name: AttributeName,
        value: impl Into<AttributeValue>,
    ) -> Result<(), EvalError> {
        let value = value.into();
        if let Some(kind) = HookKind::from_attribute(name) {
            let entry = value
                .as_term()
                .and_then(|term| HookEntry::from_term(kind, term))
                .ok_or_else(|| {
                    EvalError::new(format!(
                        "expected a module or {{module, function}} for @{kind}"
                    ))
                })?;
            self.hooks.register(kind, entry);
        } else if name == AttributeName::Moduledoc {
            if let Some(term) = value.as_term() {
                self.moduledoc = Some((line, term.clone()));
            }
        }
        self.attributes.put(name, value);
        Ok(())
    }

    /// Classify a custom attribute name for the rest of the session.
    pub fn register_attribute(&mut self, name: AttributeName, accumulate: bool, persist: bool) {
        let mut flags = AttributeFlags::empty();
        flags.set(AttributeFlags::ACCUMULATE, accumulate);
        flags.set(AttributeFlags::PERSIST, persist);
        self.attributes.register(name, flags);
    }

    /// Append a hook; it runs after every hook of the same kind
    /// registered before it.
    pub fn register_hook(&mut self, kind: HookKind, entry: HookEntry) {
        self.hooks.register(kind, entry);
    }

    /// Mark a definition as overridable. Repeated marks are ignored.
    pub fn make_overridable(&mut self, signature: Signature) {
        if !self.overridable.contains(&signature) {
            self.overridable.push(signature);
        }
    }

    pub fn is_overridable(&self, signature: Signature) -> bool {
        self.overridable.contains(&signature)
    }

    /// Overridable definitions in the order they were marked.
    pub fn overridable(&self) -> &[Signature] {
        &self.overridable
    }

    /// Record a public type or opaque type, consuming a pending `@typedoc`.
    pub fn define_type(&mut self, line: u32, kind: DocKind, signature: Signature, formatted: Term) {
        let doc = self
            .attributes
            .take(AttributeName::Typedoc)
            .last()
            .and_then(AttributeValue::as_term)
            .and_then(Term::as_binary)
            .map(str::to_owned);
        self.docs.push(DocEntry {
            signature,
            line,
            kind,
            formatted_signature: formatted,
            doc,
        });
    }

    /// Record a private type. A pending `@typedoc` is discarded.
    pub fn define_private_type(&mut self, signature: Signature) {
        if self.attributes.contains(AttributeName::Typedoc) {
            tracing::debug!(
                signature = %signature.display(&self.interner),
                "typedoc discarded for private type"
            );
            self.attributes.delete(AttributeName::Typedoc);
        }
    }

    /// Report a stored definition clause, firing `on_definition` hooks.
    pub fn define(
        &mut self,
        evaluator: &mut dyn Evaluator,
        event: &DefinitionEvent,
        bindings: &Bindings,
    ) -> Result<(), HookError> {
        let args = event.hook_args(self.env_term());
        let location = self.location().at_line(event.line);
        hooks::invoke(
            self,
            HookKind::OnDefinition,
            evaluator,
            &args,
            bindings,
            location,
            Some(event),
        )
    }

    /// Run every hook of `kind` in registration order.
    pub fn run_hooks(
        &mut self,
        kind: HookKind,
        evaluator: &mut dyn Evaluator,
        args: &[Term],
        bindings: &Bindings,
    ) -> Result<(), HookError> {
        let location = self.location();
        hooks::invoke(self, kind, evaluator, args, bindings, location, None)
    }

    /// Release every store and the registry slot.
    ///
    /// Dropping a session does the same; this is the explicit form.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.attributes.clear();
        self.docs.clear();
        self.hooks.clear();
        self.overridable.clear();
        self.moduledoc = None;
        if !self.guard.released {
            tracing::debug!(module = self.module.as_str(&self.interner), "session closed");
        }
        self.guard.release();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("module", &self.module.as_str(&self.interner))
            .field("attributes", &self.attributes.len())
            .field("docs", &self.docs.len())
            .field("overridable", &self.overridable.len())
            .finish_non_exhaustive()
    }
}
