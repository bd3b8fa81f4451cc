//! Errors raised while compiling a module.
//!
//! `CompileError` is the single failure type of `ModuleCompiler::compile`.
//! Every variant is fatal: the session is torn down and the error surfaces
//! to the caller. Non-fatal findings are `Diagnostic` warnings instead.

use std::fmt;

use quill_diagnostic::{Diagnostic, ErrorCode};
use quill_ir::{Location, Name};
use smallvec::SmallVec;

use crate::hooks::HookKind;
use crate::ModuleName;

/// Which code a backtrace frame belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FrameOrigin {
    /// User code (module bodies, hook implementations).
    User,
    /// The evaluator plumbing the module compiler calls into. Frames from
    /// here on are pruned when a hook error is attributed.
    Shim,
    /// Synthetic frame naming the hook that failed.
    Attribution,
}

/// One frame of an evaluation backtrace.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Frame {
    /// Module the function lives in, when known.
    pub module: Option<ModuleName>,
    pub function: Name,
    pub arity: u32,
    pub location: Option<Location>,
    pub origin: FrameOrigin,
}

impl Frame {
    pub fn user(module: Option<ModuleName>, function: Name, arity: u32) -> Self {
        Frame {
            module,
            function,
            arity,
            location: None,
            origin: FrameOrigin::User,
        }
    }

    pub fn shim(function: Name, arity: u32) -> Self {
        Frame {
            module: None,
            function,
            arity,
            location: None,
            origin: FrameOrigin::Shim,
        }
    }

    /// The `(target, function, arity, file, line)` frame pinned on hook errors.
    pub fn attribution(target: ModuleName, function: Name, arity: u32, location: Location) -> Self {
        Frame {
            module: Some(target),
            function,
            arity,
            location: Some(location),
            origin: FrameOrigin::Attribution,
        }
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// Backtrace of an evaluation error, innermost frame first.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Backtrace {
    frames: SmallVec<[Frame; 4]>,
}

impl Backtrace {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Backtrace {
            frames: frames.into_iter().collect(),
        }
    }

    /// Push an outer frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop the first shim frame and everything outside it, then append
    /// `attribution`.
    ///
    /// What remains is the user's own failure point followed by one frame
    /// naming the hook, without the evaluator's internal plumbing.
    #[must_use]
    pub fn prune(mut self, attribution: Frame) -> Self {
        if let Some(cut) = self
            .frames
            .iter()
            .position(|f| f.origin == FrameOrigin::Shim)
        {
            self.frames.truncate(cut);
        }
        self.frames.push(attribution);
        self
    }
}

/// Error raised by user code running inside the evaluator.
///
/// `Display` and `Error` are written out: the derive would take the
/// `Backtrace` field for `std::backtrace::Backtrace`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvalError {
    pub message: String,
    pub trace: Backtrace,
    /// Set when the error is a hook failure surfacing through evaluated
    /// code. Kept so the compile reports it as a hook error.
    pub hook: Option<Box<HookError>>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            message: message.into(),
            trace: Backtrace::default(),
            hook: None,
        }
    }

    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.trace.push(frame);
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

/// A compile hook raised.
///
/// The backtrace is already pruned: it ends with the attribution frame.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{kind} hook {hook} raised: {}", .error.message)]
pub struct HookError {
    pub kind: HookKind,
    /// Rendered `Target.function/arity`.
    pub hook: String,
    pub error: EvalError,
}

impl HookError {
    /// The synthetic frame identifying the failing hook.
    pub fn attribution(&self) -> Option<&Frame> {
        self.error
            .trace
            .frames()
            .last()
            .filter(|f| f.origin == FrameOrigin::Attribution)
    }

    pub fn location(&self) -> Option<Location> {
        self.attribution().and_then(|f| f.location)
    }
}

impl From<HookError> for EvalError {
    /// A hook failure surfacing through evaluated code, e.g. an
    /// `on_definition` hook fired while the body stores a definition.
    fn from(err: HookError) -> Self {
        EvalError {
            message: err.to_string(),
            trace: err.error.trace.clone(),
            hook: Some(Box::new(err)),
        }
    }
}

/// The backend rejected the final forms.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        LoadError {
            message: message.into(),
        }
    }
}

/// Why a module failed to compile.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("invalid module name: {target}")]
    InvalidModuleTarget { target: String, location: Location },

    #[error("cannot define module {module} because it is currently being defined")]
    ModuleInDefinition { module: String, location: Location },

    #[error("defp {function} already defined as def")]
    FunctionConflict { function: String, location: Location },

    #[error("function {function} is internal and should not be overridden")]
    InternalFunctionOverridden { function: String, location: Location },

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("error evaluating module body: {0}")]
    Eval(EvalError),

    #[error("{message}")]
    Definition { message: String, location: Location },

    #[error("could not load module: {0}")]
    Load(#[from] LoadError),
}

impl From<EvalError> for CompileError {
    /// Body errors are `Eval`, unless they are a hook failure carried out
    /// of the evaluator.
    fn from(err: EvalError) -> Self {
        match err.hook {
            Some(hook) => CompileError::Hook(*hook),
            None => CompileError::Eval(err),
        }
    }
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CompileError::InvalidModuleTarget { .. } => ErrorCode::E4001,
            CompileError::ModuleInDefinition { .. } => ErrorCode::E4002,
            CompileError::FunctionConflict { .. } => ErrorCode::E4101,
            CompileError::InternalFunctionOverridden { .. } => ErrorCode::E4102,
            CompileError::Hook(_) => ErrorCode::E4201,
            CompileError::Eval(_) => ErrorCode::E4202,
            CompileError::Definition { .. } => ErrorCode::E4203,
            CompileError::Load(_) => ErrorCode::E4204,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            CompileError::InvalidModuleTarget { location, .. }
            | CompileError::ModuleInDefinition { location, .. }
            | CompileError::FunctionConflict { location, .. }
            | CompileError::InternalFunctionOverridden { location, .. }
            | CompileError::Definition { location, .. } => Some(*location),
            CompileError::Hook(err) => err.location(),
            CompileError::Eval(err) => err.trace.frames().iter().find_map(|f| f.location),
            CompileError::Load(_) => None,
        }
    }

    /// Convert to a displayable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code()).with_message(self.to_string());
        if let Some(location) = self.location() {
            diag = diag.with_location(location);
        }
        match self {
            CompileError::ModuleInDefinition { .. } => diag.with_note(
                "a module cannot be redefined while its own body is still being compiled",
            ),
            CompileError::InternalFunctionOverridden { .. } => {
                diag.with_suggestion("rename the function; `__info__/1` is generated for every module")
            }
            CompileError::Hook(err) => diag.with_note(format!(
                "the error was raised while running the {} hook {}",
                err.kind, err.hook
            )),
            _ => diag,
        }
    }
}
