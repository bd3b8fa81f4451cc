//! Final form assembly.
//!
//! Forms come out in a fixed order: file, module, typedocs, persisted
//! attributes, specs and callbacks, export list, `__info__/1`, then the
//! user's functions.

use quill_ir::{Signature, StringLookup, Term};
use rustc_hash::FxHashSet;

use crate::attribute::{AttributeName, AttributeStore};
use crate::collab::Unwrapped;
use crate::config::CompilerOptions;
use crate::docs::DocStore;
use crate::errors::CompileError;
use crate::forms::Form;
use crate::reflection;
use crate::session::Session;
use crate::specs;

/// Options handed to the loader alongside the forms.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct LoadOptions {
    pub debug_info: bool,
    /// Every value written to the `compile` attribute, lists flattened.
    pub compile: Vec<Term>,
}

impl LoadOptions {
    pub fn from_attributes(attributes: &AttributeStore, options: &CompilerOptions) -> Self {
        let mut compile = Vec::new();
        for value in attributes.get_all(AttributeName::Compile) {
            match value.to_term() {
                Term::List(items) => compile.extend(items),
                other => compile.push(other),
            }
        }
        LoadOptions {
            debug_info: options.debug_info,
            compile,
        }
    }

    pub fn has(&self, option: &Term) -> bool {
        self.compile.contains(option)
    }
}

/// `__info__/1` plus `exports`, sorted by name text then arity.
pub fn merge_exports<L: StringLookup + ?Sized>(exports: &[Signature], lookup: &L) -> Vec<Signature> {
    let mut merged = Vec::with_capacity(exports.len() + 1);
    merged.push(Signature::REFLECTION);
    merged.extend_from_slice(exports);
    merged.sort_by(|a, b| a.cmp_by_text(b, lookup));
    merged
}

/// One attribute form per persisted `(name, value)` pair.
pub fn attach_persisted_attributes(forms: &mut Vec<Form>, attributes: &AttributeStore, line: u32) {
    forms.extend(
        attributes
            .emit()
            .into_iter()
            .map(|(name, value)| Form::Attribute { line, name, value }),
    );
}

/// One typedoc form per type or opaque doc record.
pub fn attach_typedocs(forms: &mut Vec<Form>, docs: &DocStore) {
    forms.extend(docs.types().map(|entry| Form::Typedoc {
        signature: entry.signature,
        doc: entry.doc.clone(),
    }));
}

/// Build the complete form list for the module of `session`.
///
/// Consumes the pending `spec` and `callback` attributes.
pub fn assemble(
    session: &mut Session,
    unwrapped: &Unwrapped,
    options: &CompilerOptions,
) -> Result<Vec<Form>, CompileError> {
    let info = reflection::build(session, unwrapped, options)?;

    let spec_forms = if options.internal {
        let dropped = session.attributes_mut().take(AttributeName::Spec).len()
            + session.attributes_mut().take(AttributeName::Callback).len();
        tracing::debug!(dropped, "internal compilation, specs not translated");
        Vec::new()
    } else {
        let macros: FxHashSet<Signature> = unwrapped.macros.iter().copied().collect();
        let private_macros = unwrapped.private_macros();
        specs::translate(session.attributes_mut(), &macros, &private_macros)
    };

    let env = session.env();
    let (file, line) = (env.file, env.line);
    let mut forms = vec![
        Form::File { path: file, line },
        Form::Module {
            name: session.module(),
            line,
        },
    ];
    attach_typedocs(&mut forms, session.docs());
    attach_persisted_attributes(&mut forms, session.attributes(), line);
    forms.extend(spec_forms);
    forms.push(Form::Export {
        line,
        functions: merge_exports(&unwrapped.exports, session.interner()),
    });
    forms.push(Form::Reflection(info));
    forms.extend(unwrapped.functions.iter().cloned().map(Form::Function));
    Ok(forms)
}
