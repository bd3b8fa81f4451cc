//! Module compilation orchestrator for Quill.
//!
//! Takes an evaluated module body and produces the loadable form list of
//! the module:
//!
//! - **Sessions**: one per module under compilation, with guaranteed
//!   teardown ([`Session`], [`SharedSessionRegistry`])
//! - **Attributes and docs**: per-module stores with accumulate/replace
//!   semantics ([`AttributeStore`], [`DocStore`])
//! - **Hooks**: `before_compile`, `after_compile` and `on_definition`
//!   callbacks run through the evaluator ([`HookRegistry`])
//! - **Assembly**: specs, persisted attributes, typedocs, the export list
//!   and the synthetic `__info__/1` ([`assemble`], [`reflection`])
//! - **Validation**: conflicts are errors, dangling docs are warnings
//!
//! Parsing, evaluation, definition compilation and code generation belong
//! to collaborators behind the traits in [`collab`].
//!
//! # Tracing
//!
//! Set `RUST_LOG=quill_module=debug` and call [`init_tracing`] to see each
//! compile stage; `trace` adds every hook dispatch.

pub mod assemble;
pub mod attribute;
pub mod collab;
mod compiler;
mod config;
pub mod docs;
mod env;
mod errors;
pub mod forms;
pub mod hooks;
pub mod reflection;
mod session;
pub mod specs;
mod tracking;
pub mod validate;

pub use attribute::{AttributeClass, AttributeFlags, AttributeName, AttributeStore, AttributeValue};
pub use collab::{Binary, DefinitionCompiler, Evaluated, Evaluator, Expansion, Loader, Unwrapped};
pub use compiler::{Collaborators, CompileStage, CompiledModule, ModuleCompiler};
pub use config::CompilerOptions;
pub use docs::{DocEntry, DocKind, DocStore};
pub use env::{Bindings, CompileEnv, LexicalContext};
pub use errors::{Backtrace, CompileError, EvalError, Frame, FrameOrigin, HookError, LoadError};
pub use forms::{DefKind, Definition, DefinitionEvent, Form, FunctionForm};
pub use hooks::{HookEntry, HookKind, HookRegistry};
pub use session::{ModuleName, Session, SessionRegistry, SharedSessionRegistry};
pub use specs::{FunType, SpecDecl, SpecKind};
pub use tracking::CompiledUnits;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
