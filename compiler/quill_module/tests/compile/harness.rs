//! Mock collaborators for driving `ModuleCompiler` end to end.

use quill_diagnostic::DiagnosticQueue;
use quill_ir::{Name, SharedInterner, Signature, Term};
use quill_module::assemble::LoadOptions;
use quill_module::collab::OnReady;
use quill_module::{
    Binary, Bindings, Collaborators, CompileEnv, CompileError, CompiledModule, CompilerOptions,
    DefKind, Definition, DefinitionCompiler, EvalError, Evaluated, Evaluator, Expansion, Form,
    FunctionForm, LoadError, Loader, ModuleCompiler, ModuleName, Session, SharedSessionRegistry,
    Unwrapped,
};

type BodyFn = Box<dyn FnMut(&mut Session) -> Result<Term, EvalError>>;
type HookFn = Box<dyn FnMut(&mut Session, &[Term]) -> Result<Expansion, EvalError>>;

/// Runs a closure as the module body and dispatches hooks by function name.
/// Unknown hooks expand to `nil`.
pub struct MockEvaluator {
    body: BodyFn,
    hooks: Vec<(Name, HookFn)>,
    pub hook_calls: Vec<(ModuleName, Name, Vec<Term>)>,
}

impl MockEvaluator {
    pub fn new(body: impl FnMut(&mut Session) -> Result<Term, EvalError> + 'static) -> Self {
        MockEvaluator {
            body: Box::new(body),
            hooks: Vec::new(),
            hook_calls: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(|_| Ok(Term::nil()))
    }

    pub fn on_hook(
        mut self,
        function: Name,
        hook: impl FnMut(&mut Session, &[Term]) -> Result<Expansion, EvalError> + 'static,
    ) -> Self {
        self.hooks.push((function, Box::new(hook)));
        self
    }
}

impl Evaluator for MockEvaluator {
    fn eval_body(
        &mut self,
        session: &mut Session,
        _body: &Term,
        bindings: &Bindings,
    ) -> Result<Evaluated, EvalError> {
        let result = (self.body)(session)?;
        Ok(Evaluated::new(result, bindings.clone()))
    }

    fn expand_hook(
        &mut self,
        session: &mut Session,
        target: ModuleName,
        function: Name,
        args: &[Term],
        _bindings: &Bindings,
    ) -> Result<Expansion, EvalError> {
        self.hook_calls.push((target, function, args.to_vec()));
        match self.hooks.iter_mut().find(|(name, _)| *name == function) {
            Some((_, hook)) => (*hook)(session, args),
            None => Ok(Expansion::Literal(Term::nil())),
        }
    }

    fn eval_expansion(
        &mut self,
        _session: &mut Session,
        tree: Term,
        _bindings: &Bindings,
    ) -> Result<Term, EvalError> {
        Ok(tree)
    }
}

/// Reports a fixed list of definitions and records what it saw.
#[derive(Default)]
pub struct MockDefinitions {
    definitions: Vec<Definition>,
    pub seen_overridable: Vec<Signature>,
    pub calls: usize,
}

impl MockDefinitions {
    pub fn new(definitions: Vec<Definition>) -> Self {
        MockDefinitions {
            definitions,
            ..Self::default()
        }
    }
}

impl DefinitionCompiler for MockDefinitions {
    fn unwrap(&mut self, session: &Session) -> Result<Unwrapped, CompileError> {
        self.calls += 1;
        self.seen_overridable = session.overridable().to_vec();

        let mut unwrapped = Unwrapped::default();
        for def in &self.definitions {
            unwrapped.all.push(def.signature);
            match def.kind {
                DefKind::Def => {
                    unwrapped.exports.push(def.signature);
                    unwrapped.defs.push(def.signature);
                }
                DefKind::Defmacro => {
                    unwrapped.exports.push(def.signature);
                    unwrapped.macros.push(def.signature);
                }
                DefKind::Defmacrop => {
                    unwrapped.macros.push(def.signature);
                    unwrapped.private.push(def.clone());
                }
                DefKind::Defp => unwrapped.private.push(def.clone()),
            }
            unwrapped.functions.push(FunctionForm {
                signature: def.signature,
                line: def.line,
                clauses: def.clauses.clone(),
            });
        }
        Ok(unwrapped)
    }
}

/// How the mock loader behaves.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum LoadBehavior {
    #[default]
    Succeed,
    Reject(String),
    /// Return without calling `on_ready`.
    SkipCallback,
    /// Call `on_ready` a second time after it succeeded.
    ReportTwice,
}

#[derive(Default)]
pub struct MockLoader {
    pub loaded: Vec<ModuleName>,
    pub behavior: LoadBehavior,
    pub received: Option<(Vec<Form>, LoadOptions)>,
}

impl MockLoader {
    pub fn forms(&self) -> &[Form] {
        match &self.received {
            Some((forms, _)) => forms,
            None => &[],
        }
    }
}

impl Loader for MockLoader {
    fn is_loaded(&self, module: ModuleName) -> bool {
        self.loaded.contains(&module)
    }

    fn load(
        &mut self,
        module: ModuleName,
        forms: &[Form],
        options: &LoadOptions,
        on_ready: &mut OnReady<'_>,
    ) -> Result<Binary, CompileError> {
        self.received = Some((forms.to_vec(), options.clone()));
        match &self.behavior {
            LoadBehavior::Succeed => {
                let binary = Binary::from(module.name().raw().to_le_bytes().to_vec());
                let binary = on_ready(module, binary)?;
                self.loaded.push(module);
                Ok(binary)
            }
            LoadBehavior::Reject(message) => Err(LoadError::new(message.clone()).into()),
            LoadBehavior::SkipCallback => Ok(Binary::default()),
            LoadBehavior::ReportTwice => {
                let binary = Binary::from(module.name().raw().to_le_bytes().to_vec());
                let binary = on_ready(module, binary)?;
                on_ready(module, binary)
            }
        }
    }
}

/// A compiler with its own registry and diagnostics queue.
pub struct World {
    pub interner: SharedInterner,
    pub registry: SharedSessionRegistry,
    pub compiler: ModuleCompiler,
    pub sink: DiagnosticQueue,
}

impl World {
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        let interner = SharedInterner::new();
        let registry = SharedSessionRegistry::new();
        let compiler = ModuleCompiler::new(interner.clone(), options).with_registry(registry.clone());
        World {
            interner,
            registry,
            compiler,
            sink: DiagnosticQueue::new(),
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn atom(&self, text: &str) -> Term {
        Term::atom(self.name(text))
    }

    pub fn module(&self, text: &str) -> ModuleName {
        ModuleName::new(self.name(text))
    }

    pub fn sig(&self, name: &str, arity: u32) -> Signature {
        Signature::new(self.name(name), arity)
    }

    pub fn def(&self, kind: DefKind, name: &str, arity: u32, line: u32) -> Definition {
        Definition {
            signature: self.sig(name, arity),
            kind,
            line,
            clauses: vec![Term::nil()],
        }
    }

    pub fn env(&self) -> CompileEnv {
        CompileEnv::new(self.name("lib/foo.ex"), 1)
    }

    pub fn compile(
        &self,
        target: &Term,
        evaluator: &mut MockEvaluator,
        definitions: &mut MockDefinitions,
        loader: &mut MockLoader,
    ) -> Result<CompiledModule, CompileError> {
        self.compiler.compile(
            target,
            &Term::nil(),
            &Bindings::new(),
            self.env(),
            Collaborators {
                evaluator,
                definitions,
                loader,
                sink: &self.sink,
            },
        )
    }
}

/// Compile `target` through `compiler` with empty collaborators. Used from
/// inside bodies and hooks, where the surrounding `World` isn't reachable.
pub fn compile_standalone(
    compiler: &ModuleCompiler,
    target: &Term,
    env: CompileEnv,
) -> Result<CompiledModule, CompileError> {
    let mut evaluator = MockEvaluator::empty();
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();
    let sink = DiagnosticQueue::new();
    compiler.compile(
        target,
        &Term::nil(),
        &Bindings::new(),
        env,
        Collaborators {
            evaluator: &mut evaluator,
            definitions: &mut definitions,
            loader: &mut loader,
            sink: &sink,
        },
    )
}
