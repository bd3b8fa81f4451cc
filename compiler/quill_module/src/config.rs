//! Compiler configuration.

/// Environment variable toggling documentation metadata.
pub const ENV_DOCS: &str = "QUILL_DOCS";
/// Environment variable toggling debug info in load options.
pub const ENV_DEBUG_INFO: &str = "QUILL_DEBUG_INFO";
/// Environment variable silencing "redefining module" warnings.
pub const ENV_IGNORE_MODULE_CONFLICT: &str = "QUILL_IGNORE_MODULE_CONFLICT";

/// Options shared by every module compiled through one `ModuleCompiler`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CompilerOptions {
    /// Record documentation and expose it through the reflection function.
    pub docs: bool,
    /// Ask the backend to keep debug info.
    pub debug_info: bool,
    /// Don't warn when redefining a module that is already loaded.
    pub ignore_module_conflict: bool,
    /// Bootstrap mode: the type system isn't available yet, so specs and
    /// callbacks are not translated.
    pub internal: bool,
    /// Record every produced `(module, binary)` in `CompiledUnits`.
    pub track_compiled_units: bool,
    /// Module exempt from dangling-doc checks. Its forms are assembled
    /// before its own reflective metadata exists.
    pub bootstrap_module: Option<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            docs: true,
            debug_info: true,
            ignore_module_conflict: false,
            internal: false,
            track_compiled_units: false,
            bootstrap_module: Some("Kernel".to_owned()),
        }
    }
}

impl CompilerOptions {
    /// Defaults overridden by `QUILL_*` environment variables.
    ///
    /// `0`, `false`, `no` and `off` (any case) disable a flag; any other
    /// value enables it. Unset variables keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| lookup(key).map_or(default, |v| parse_flag(&v));
        CompilerOptions {
            docs: flag(ENV_DOCS, defaults.docs),
            debug_info: flag(ENV_DEBUG_INFO, defaults.debug_info),
            ignore_module_conflict: flag(
                ENV_IGNORE_MODULE_CONFLICT,
                defaults.ignore_module_conflict,
            ),
            ..defaults
        }
    }

    #[must_use]
    pub fn with_docs(mut self, docs: bool) -> Self {
        self.docs = docs;
        self
    }

    #[must_use]
    pub fn with_debug_info(mut self, debug_info: bool) -> Self {
        self.debug_info = debug_info;
        self
    }

    #[must_use]
    pub fn with_ignore_module_conflict(mut self, ignore: bool) -> Self {
        self.ignore_module_conflict = ignore;
        self
    }

    #[must_use]
    pub fn with_internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    #[must_use]
    pub fn with_compiled_unit_tracking(mut self, track: bool) -> Self {
        self.track_compiled_units = track;
        self
    }

    #[must_use]
    pub fn with_bootstrap_module(mut self, module: Option<impl Into<String>>) -> Self {
        self.bootstrap_module = module.map(Into::into);
        self
    }

    /// Whether `module` is the designated bootstrap module.
    pub fn is_bootstrap_module(&self, module: &str) -> bool {
        self.bootstrap_module.as_deref() == Some(module)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
