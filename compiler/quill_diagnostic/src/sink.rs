//! Warning sinks.
//!
//! Warnings raised during module compilation are fire-and-forget: a sink
//! never fails and never influences control flow. Errors are not routed
//! through sinks; they abort compilation and travel as typed `Result`s.

use parking_lot::Mutex;
use quill_ir::SharedInterner;

use crate::{Diagnostic, ErrorCode};

/// Destination for non-fatal diagnostics.
pub trait DiagnosticSink {
    /// Report a warning. Must not fail.
    fn warn(&self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn warn(&self, diagnostic: Diagnostic) {
        (**self).warn(diagnostic);
    }
}

/// Collects diagnostics in report order.
///
/// Interior mutability lets one queue be shared by every compilation a
/// caller drives, including nested compilations triggered from hooks.
#[derive(Default, Debug)]
pub struct DiagnosticQueue {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    /// Whether any queued diagnostic carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.diagnostics.lock().iter().any(|d| d.code == code)
    }

    /// Number of queued diagnostics carrying `code`.
    pub fn count_code(&self, code: ErrorCode) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.code == code)
            .count()
    }

    /// Take all queued diagnostics, leaving the queue empty.
    pub fn flush(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }
}

impl DiagnosticSink for DiagnosticQueue {
    fn warn(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }
}

/// Forwards warnings to `tracing` at `WARN` level.
#[derive(Clone)]
pub struct TracingSink {
    interner: SharedInterner,
}

impl TracingSink {
    pub fn new(interner: SharedInterner) -> Self {
        TracingSink { interner }
    }
}

impl DiagnosticSink for TracingSink {
    fn warn(&self, diagnostic: Diagnostic) {
        tracing::warn!(code = %diagnostic.code, "{}", diagnostic.render(&*self.interner));
    }
}
