//! Checks over the gathered definitions and the session stores.
//!
//! Conflicts are fatal. Everything else is a warning sent to the sink.

use quill_diagnostic::{Diagnostic, DiagnosticSink, ErrorCode};
use quill_ir::{Location, SharedInterner, Signature};
use rustc_hash::FxHashSet;

use crate::attribute::AttributeName;
use crate::collab::{Loader, Unwrapped};
use crate::config::CompilerOptions;
use crate::errors::CompileError;
use crate::session::{ModuleName, Session};

/// Fail if a private definition shares its signature with a public one.
pub fn check_conflicts(session: &Session, unwrapped: &Unwrapped) -> Result<(), CompileError> {
    let public: FxHashSet<Signature> = unwrapped
        .defs
        .iter()
        .chain(&unwrapped.exports)
        .copied()
        .collect();
    match unwrapped.private.iter().find(|d| public.contains(&d.signature)) {
        Some(conflict) => Err(CompileError::FunctionConflict {
            function: conflict.signature.display(session.interner()).to_string(),
            location: session.location().at_line(conflict.line),
        }),
        None => Ok(()),
    }
}

/// Warn about function docs whose signature was never defined.
///
/// Skipped for the bootstrap module.
pub fn warn_dangling_docs(
    session: &Session,
    unwrapped: &Unwrapped,
    options: &CompilerOptions,
    sink: &dyn DiagnosticSink,
) {
    if options.is_bootstrap_module(session.module().as_str(session.interner())) {
        return;
    }
    let known: FxHashSet<Signature> = unwrapped
        .all
        .iter()
        .chain(&unwrapped.defs)
        .chain(&unwrapped.macros)
        .copied()
        .chain(unwrapped.private.iter().map(|d| d.signature))
        .collect();

    let interner = session.interner();
    for entry in session.docs().definitions() {
        if known.contains(&entry.signature) {
            continue;
        }
        let signature = entry.signature.display(interner);
        sink.warn(
            Diagnostic::warning(ErrorCode::W4102)
                .with_message(format!("@doc provided for {signature}, but no definition exists"))
                .with_location(session.location().at_line(entry.line)),
        );
    }
}

/// Warn when a `@typedoc` was written but no type consumed it.
pub fn warn_unused_typedoc(session: &Session, sink: &dyn DiagnosticSink) {
    if session.attributes().contains(AttributeName::Typedoc) {
        sink.warn(
            Diagnostic::warning(ErrorCode::W4103)
                .with_message("@typedoc provided but no type follows it")
                .with_location(session.location()),
        );
    }
}

/// Warn before redefining a module that is already loaded.
pub fn check_availability(
    module: ModuleName,
    loader: &dyn Loader,
    options: &CompilerOptions,
    interner: &SharedInterner,
    location: Location,
    sink: &dyn DiagnosticSink,
) {
    if options.ignore_module_conflict || !loader.is_loaded(module) {
        return;
    }
    sink.warn(
        Diagnostic::warning(ErrorCode::W4101)
            .with_message(format!("redefining module {}", module.as_str(interner)))
            .with_location(location)
            .with_note("the current version is replaced when the new one loads"),
    );
}
