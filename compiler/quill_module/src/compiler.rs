//! The module compiler.
//!
//! Drives one module from an evaluated body to a loaded binary:
//!
//! ```text
//! Idle → SessionOpen → BodyEvaluated → BeforeHooksRun → DefinitionsGathered
//!      → FormsAssembled → Validated → Loaded → Closed
//! ```
//!
//! `after_compile` hooks run inside `Loaded`, from the loader's completion
//! callback. `Closed` is reached from every stage, including on failure.

use std::fmt;

use quill_diagnostic::DiagnosticSink;
use quill_ir::{SharedInterner, Term};

use crate::assemble::{self, LoadOptions};
use crate::collab::{Binary, DefinitionCompiler, Evaluated, Evaluator, Loader};
use crate::config::CompilerOptions;
use crate::env::{Bindings, CompileEnv};
use crate::errors::{CompileError, LoadError};
use crate::hooks::HookKind;
use crate::session::{ModuleName, Session, SharedSessionRegistry};
use crate::tracking::CompiledUnits;
use crate::validate;

/// Where a compile is in its lifecycle.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CompileStage {
    Idle,
    SessionOpen,
    BodyEvaluated,
    BeforeHooksRun,
    DefinitionsGathered,
    FormsAssembled,
    Validated,
    Loaded,
    Closed,
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompileStage::Idle => "idle",
            CompileStage::SessionOpen => "session-open",
            CompileStage::BodyEvaluated => "body-evaluated",
            CompileStage::BeforeHooksRun => "before-hooks-run",
            CompileStage::DefinitionsGathered => "definitions-gathered",
            CompileStage::FormsAssembled => "forms-assembled",
            CompileStage::Validated => "validated",
            CompileStage::Loaded => "loaded",
            CompileStage::Closed => "closed",
        };
        f.write_str(name)
    }
}

fn enter(stage: CompileStage) {
    tracing::debug!(%stage, "compile stage");
}

/// A successfully compiled module.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompiledModule {
    pub module: ModuleName,
    pub binary: Binary,
    /// Value of the module body.
    pub result: Term,
}

/// The external collaborators of one compile.
pub struct Collaborators<'a> {
    pub evaluator: &'a mut dyn Evaluator,
    pub definitions: &'a mut dyn DefinitionCompiler,
    pub loader: &'a mut dyn Loader,
    pub sink: &'a dyn DiagnosticSink,
}

/// Compiles modules.
///
/// Cheap to share: every compile opens its own session, so one compiler
/// may serve concurrent compiles of different modules, and hooks may
/// re-enter it to compile helper modules.
#[derive(Clone)]
pub struct ModuleCompiler {
    interner: SharedInterner,
    options: CompilerOptions,
    registry: SharedSessionRegistry,
    compiled: CompiledUnits,
}

impl ModuleCompiler {
    /// A compiler using the process-wide session registry.
    pub fn new(interner: SharedInterner, options: CompilerOptions) -> Self {
        ModuleCompiler {
            interner,
            options,
            registry: SharedSessionRegistry::global(),
            compiled: CompiledUnits::new(),
        }
    }

    /// Use `registry` instead of the process-wide one.
    #[must_use]
    pub fn with_registry(mut self, registry: SharedSessionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Record compiled units into `compiled`.
    #[must_use]
    pub fn with_compiled_units(mut self, compiled: CompiledUnits) -> Self {
        self.compiled = compiled;
        self
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn registry(&self) -> &SharedSessionRegistry {
        &self.registry
    }

    pub fn compiled_units(&self) -> &CompiledUnits {
        &self.compiled
    }

    /// Compile the module named by `target`.
    ///
    /// `target` must be a valid module identity; otherwise nothing is
    /// opened. Once a session is open it is closed again whatever the
    /// outcome.
    #[tracing::instrument(level = "debug", skip_all, fields(target = %target.display(&self.interner)))]
    pub fn compile(
        &self,
        target: &Term,
        body: &Term,
        bindings: &Bindings,
        env: CompileEnv,
        collaborators: Collaborators<'_>,
    ) -> Result<CompiledModule, CompileError> {
        enter(CompileStage::Idle);
        let Some(module) = ModuleName::from_target(target) else {
            return Err(CompileError::InvalidModuleTarget {
                target: target.display(&self.interner).to_string(),
                location: env.location(),
            });
        };

        let Collaborators {
            evaluator,
            definitions,
            loader,
            sink,
        } = collaborators;

        validate::check_availability(module, &*loader, &self.options, &self.interner, env.location(), sink);

        let mut session = self.registry.open(&self.interner, module, env, &self.options)?;
        enter(CompileStage::SessionOpen);

        let outcome = self.run(&mut session, body, bindings, evaluator, definitions, loader, sink);

        session.close();
        enter(CompileStage::Closed);

        let (binary, result) = outcome?;
        Ok(CompiledModule {
            module,
            binary,
            result,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        session: &mut Session,
        body: &Term,
        bindings: &Bindings,
        evaluator: &mut dyn Evaluator,
        definitions: &mut dyn DefinitionCompiler,
        loader: &mut dyn Loader,
        sink: &dyn DiagnosticSink,
    ) -> Result<(Binary, Term), CompileError> {
        let Evaluated {
            result,
            bindings,
            lexical,
        } = evaluator.eval_body(session, body, bindings)?;
        if let Some(lexical) = lexical {
            session.set_lexical(lexical);
        }
        enter(CompileStage::BodyEvaluated);

        let args = [session.env_term()];
        session.run_hooks(HookKind::BeforeCompile, &mut *evaluator, &args, &bindings)?;
        validate::warn_unused_typedoc(session, sink);
        enter(CompileStage::BeforeHooksRun);

        let unwrapped = definitions.unwrap(session)?;
        enter(CompileStage::DefinitionsGathered);

        let forms = assemble::assemble(session, &unwrapped, &self.options)?;
        enter(CompileStage::FormsAssembled);

        validate::check_conflicts(session, &unwrapped)?;
        validate::warn_dangling_docs(session, &unwrapped, &self.options, sink);
        let load_options = LoadOptions::from_attributes(session.attributes(), &self.options);
        enter(CompileStage::Validated);

        let module = session.module();
        let env_term = session.env_term();
        let track = self.options.track_compiled_units;
        let compiled = &self.compiled;
        let mut reported = false;
        let mut on_ready = |ready: ModuleName, binary: Binary| -> Result<Binary, CompileError> {
            if reported {
                return Err(LoadError::new("loader reported the compiled binary more than once").into());
            }
            reported = true;
            let args = [env_term.clone(), binary.to_term()];
            session.run_hooks(HookKind::AfterCompile, &mut *evaluator, &args, &bindings)?;
            if track {
                compiled.record(ready, binary.clone());
            }
            Ok(binary)
        };
        let binary = loader.load(module, &forms, &load_options, &mut on_ready)?;
        if !reported {
            return Err(LoadError::new("loader finished without reporting the compiled binary").into());
        }
        enter(CompileStage::Loaded);

        Ok((binary, result))
    }
}
