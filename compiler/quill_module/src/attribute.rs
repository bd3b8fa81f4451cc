//! Per-module attribute storage.
//!
//! Every attribute name is classified once per session: accumulating names
//! collect every write, all others keep the last write. Independently, a
//! name may be persisted, meaning its final value(s) become attribute forms
//! of the compiled module.

use bitflags::bitflags;
use quill_ir::{Name, Term};
use rustc_hash::FxHashMap;

use crate::specs::SpecDecl;

/// Closed set of attribute names the compiler knows about, plus
/// user-defined names.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AttributeName {
    Behaviour,
    OnLoad,
    Spec,
    Type,
    Typep,
    Opaque,
    Callback,
    Compile,
    ExternalResource,
    BeforeCompile,
    AfterCompile,
    OnDefinition,
    Derive,
    Vsn,
    Doc,
    Moduledoc,
    Typedoc,
    Custom(Name),
}

impl AttributeName {
    pub fn from_name(name: Name) -> Self {
        match name {
            Name::BEHAVIOUR => AttributeName::Behaviour,
            Name::ON_LOAD => AttributeName::OnLoad,
            Name::SPEC => AttributeName::Spec,
            Name::TYPE => AttributeName::Type,
            Name::TYPEP => AttributeName::Typep,
            Name::OPAQUE => AttributeName::Opaque,
            Name::CALLBACK => AttributeName::Callback,
            Name::COMPILE => AttributeName::Compile,
            Name::EXTERNAL_RESOURCE => AttributeName::ExternalResource,
            Name::BEFORE_COMPILE => AttributeName::BeforeCompile,
            Name::AFTER_COMPILE => AttributeName::AfterCompile,
            Name::ON_DEFINITION => AttributeName::OnDefinition,
            Name::DERIVE => AttributeName::Derive,
            Name::VSN => AttributeName::Vsn,
            Name::DOC => AttributeName::Doc,
            Name::MODULEDOC => AttributeName::Moduledoc,
            Name::TYPEDOC => AttributeName::Typedoc,
            other => AttributeName::Custom(other),
        }
    }

    pub fn name(self) -> Name {
        match self {
            AttributeName::Behaviour => Name::BEHAVIOUR,
            AttributeName::OnLoad => Name::ON_LOAD,
            AttributeName::Spec => Name::SPEC,
            AttributeName::Type => Name::TYPE,
            AttributeName::Typep => Name::TYPEP,
            AttributeName::Opaque => Name::OPAQUE,
            AttributeName::Callback => Name::CALLBACK,
            AttributeName::Compile => Name::COMPILE,
            AttributeName::ExternalResource => Name::EXTERNAL_RESOURCE,
            AttributeName::BeforeCompile => Name::BEFORE_COMPILE,
            AttributeName::AfterCompile => Name::AFTER_COMPILE,
            AttributeName::OnDefinition => Name::ON_DEFINITION,
            AttributeName::Derive => Name::DERIVE,
            AttributeName::Vsn => Name::VSN,
            AttributeName::Doc => Name::DOC,
            AttributeName::Moduledoc => Name::MODULEDOC,
            AttributeName::Typedoc => Name::TYPEDOC,
            AttributeName::Custom(name) => name,
        }
    }
}

bitflags! {
    /// How an attribute name behaves on write and on emission.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct AttributeFlags: u8 {
        /// Every write appends instead of replacing.
        const ACCUMULATE = 1 << 0;
        /// Final value(s) are emitted as attribute forms.
        const PERSIST = 1 << 1;
    }
}

/// Shape of an attribute name, derived from its flags.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AttributeClass {
    Accumulate,
    Singular,
    /// Never registered and never written.
    Untracked,
}

/// Accumulating and persisted by default.
const MODULE_ATTRIBUTES: [AttributeName; 9] = [
    AttributeName::Behaviour,
    AttributeName::OnLoad,
    AttributeName::Spec,
    AttributeName::Type,
    AttributeName::Typep,
    AttributeName::Opaque,
    AttributeName::Callback,
    AttributeName::Compile,
    AttributeName::ExternalResource,
];

/// Accumulating bookkeeping that is never persisted.
const BOOKKEEPING_ATTRIBUTES: [AttributeName; 4] = [
    AttributeName::BeforeCompile,
    AttributeName::AfterCompile,
    AttributeName::OnDefinition,
    AttributeName::Derive,
];

/// Singular names the compiler itself reads.
const SINGULAR_ATTRIBUTES: [AttributeName; 3] = [
    AttributeName::Doc,
    AttributeName::Moduledoc,
    AttributeName::Typedoc,
];

/// Classification table for one session.
#[derive(Clone, Debug)]
pub struct AttributeTable {
    flags: FxHashMap<AttributeName, AttributeFlags>,
}

impl AttributeTable {
    /// An empty table: every name is untracked.
    pub fn empty() -> Self {
        AttributeTable {
            flags: FxHashMap::default(),
        }
    }

    /// The classification every module starts with.
    pub fn with_defaults() -> Self {
        let mut table = Self::empty();
        for name in MODULE_ATTRIBUTES {
            table.register(name, AttributeFlags::ACCUMULATE | AttributeFlags::PERSIST);
        }
        for name in BOOKKEEPING_ATTRIBUTES {
            table.register(name, AttributeFlags::ACCUMULATE);
        }
        table.register(AttributeName::Vsn, AttributeFlags::PERSIST);
        for name in SINGULAR_ATTRIBUTES {
            table.register(name, AttributeFlags::empty());
        }
        table
    }

    /// Register `name`, widening any flags it already has.
    pub fn register(&mut self, name: AttributeName, flags: AttributeFlags) {
        *self.flags.entry(name).or_default() |= flags;
    }

    pub fn flags(&self, name: AttributeName) -> AttributeFlags {
        self.flags.get(&name).copied().unwrap_or_default()
    }

    pub fn is_registered(&self, name: AttributeName) -> bool {
        self.flags.contains_key(&name)
    }

    pub fn is_accumulating(&self, name: AttributeName) -> bool {
        self.flags(name).contains(AttributeFlags::ACCUMULATE)
    }

    pub fn is_persisted(&self, name: AttributeName) -> bool {
        self.flags(name).contains(AttributeFlags::PERSIST)
    }
}

impl Default for AttributeTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A stored attribute value.
///
/// `spec` and `callback` values stay typed until the spec translator
/// consumes them; everything else is a plain term.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum AttributeValue {
    Term(Term),
    Spec(SpecDecl),
}

impl AttributeValue {
    pub fn as_term(&self) -> Option<&Term> {
        match self {
            AttributeValue::Term(term) => Some(term),
            AttributeValue::Spec(_) => None,
        }
    }

    pub fn to_term(&self) -> Term {
        match self {
            AttributeValue::Term(term) => term.clone(),
            AttributeValue::Spec(spec) => spec.to_term(),
        }
    }
}

impl From<Term> for AttributeValue {
    fn from(term: Term) -> Self {
        AttributeValue::Term(term)
    }
}

impl From<SpecDecl> for AttributeValue {
    fn from(spec: SpecDecl) -> Self {
        AttributeValue::Spec(spec)
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Accumulated(Vec<AttributeValue>),
    Single(AttributeValue),
}

impl Slot {
    fn values(&self) -> &[AttributeValue] {
        match self {
            Slot::Accumulated(values) => values,
            Slot::Single(value) => std::slice::from_ref(value),
        }
    }

    fn into_values(self) -> Vec<AttributeValue> {
        match self {
            Slot::Accumulated(values) => values,
            Slot::Single(value) => vec![value],
        }
    }
}

/// Attribute values of one module under compilation.
///
/// Iteration order is the order in which names were first written, so
/// emission is deterministic for identical input.
#[derive(Clone, Debug, Default)]
pub struct AttributeStore {
    table: AttributeTable,
    order: Vec<AttributeName>,
    slots: FxHashMap<AttributeName, Slot>,
}

impl AttributeStore {
    pub fn new(table: AttributeTable) -> Self {
        AttributeStore {
            table,
            order: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    pub fn table(&self) -> &AttributeTable {
        &self.table
    }

    /// Classify `name` for this module.
    pub fn classify(&self, name: AttributeName) -> AttributeClass {
        if self.table.is_accumulating(name) {
            AttributeClass::Accumulate
        } else if self.table.is_registered(name) || self.slots.contains_key(&name) {
            AttributeClass::Singular
        } else {
            AttributeClass::Untracked
        }
    }

    /// Register `name` with `flags`, widening existing flags.
    ///
    /// A singular value already stored under a name that becomes
    /// accumulating is kept as the first accumulated value.
    pub fn register(&mut self, name: AttributeName, flags: AttributeFlags) {
        self.table.register(name, flags);
        if self.table.is_accumulating(name) {
            if let Some(slot) = self.slots.get_mut(&name) {
                if let Slot::Single(value) = slot {
                    *slot = Slot::Accumulated(vec![value.clone()]);
                }
            }
        }
    }

    /// Append to an accumulating name, replace anything else.
    pub fn put(&mut self, name: AttributeName, value: impl Into<AttributeValue>) {
        let value = value.into();
        let accumulate = self.table.is_accumulating(name);
        match self.slots.get_mut(&name) {
            Some(Slot::Accumulated(values)) if accumulate => values.push(value),
            Some(slot) => {
                *slot = if accumulate {
                    Slot::Accumulated(vec![value])
                } else {
                    Slot::Single(value)
                };
            }
            None => {
                self.order.push(name);
                let slot = if accumulate {
                    Slot::Accumulated(vec![value])
                } else {
                    Slot::Single(value)
                };
                self.slots.insert(name, slot);
            }
        }
    }

    /// All values of `name` in write order (empty if absent).
    pub fn get_all(&self, name: AttributeName) -> &[AttributeValue] {
        self.slots.get(&name).map_or(&[], Slot::values)
    }

    /// The most recent value of `name`.
    pub fn get(&self, name: AttributeName) -> Option<&AttributeValue> {
        self.get_all(name).last()
    }

    pub fn contains(&self, name: AttributeName) -> bool {
        self.slots.contains_key(&name)
    }

    /// Remove `name` and return its values in write order.
    pub fn take(&mut self, name: AttributeName) -> Vec<AttributeValue> {
        match self.slots.remove(&name) {
            Some(slot) => {
                self.order.retain(|n| *n != name);
                slot.into_values()
            }
            None => Vec::new(),
        }
    }

    /// Remove `name`, discarding its values.
    pub fn delete(&mut self, name: AttributeName) {
        if self.slots.remove(&name).is_some() {
            self.order.retain(|n| *n != name);
        }
    }

    /// Names with stored values, in first-write order.
    pub fn names(&self) -> impl Iterator<Item = AttributeName> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(name, value)` pairs for every persisted attribute.
    ///
    /// Accumulated names yield one pair per value in write order. Singular
    /// names yield exactly one pair whose value is a one-element list.
    pub fn emit(&self) -> Vec<(AttributeName, Term)> {
        let mut out = Vec::new();
        for &name in &self.order {
            if !self.table.is_persisted(name) {
                continue;
            }
            let Some(slot) = self.slots.get(&name) else {
                continue;
            };
            match slot {
                Slot::Accumulated(values) => {
                    out.extend(values.iter().map(|v| (name, v.to_term())));
                }
                Slot::Single(value) => out.push((name, Term::list([value.to_term()]))),
            }
        }
        out
    }

    /// Drop every stored value. The classification table survives.
    pub fn clear(&mut self) {
        self.order.clear();
        self.slots.clear();
    }
}
