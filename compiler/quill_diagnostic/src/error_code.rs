use std::fmt;

/// Codes for all module-compiler diagnostics.
///
/// Format: E#### for errors, W#### for warnings. The first digit is the
/// phase; module compilation owns the 4xxx range:
/// - E40xx: session and target errors
/// - E41xx: assembly and validation errors
/// - E42xx: collaborator failures (evaluator, definitions, loader)
/// - W41xx: validation warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Compile target is not a valid module name
    E4001,
    /// Module is already being defined
    E4002,

    /// Function defined both public and private
    E4101,
    /// User code redefines the reflection function
    E4102,

    /// Compile-time hook raised
    E4201,
    /// Module body raised during evaluation
    E4202,
    /// Definition compiler rejected the module
    E4203,
    /// Backend rejected the final forms
    E4204,

    /// Redefining a module that is already loaded
    W4101,
    /// Documentation for a definition that does not exist
    W4102,
    /// `@typedoc` not followed by a type
    W4103,
}

impl ErrorCode {
    /// Get the code as a string (e.g., "E4001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4101 => "E4101",
            ErrorCode::E4102 => "E4102",
            ErrorCode::E4201 => "E4201",
            ErrorCode::E4202 => "E4202",
            ErrorCode::E4203 => "E4203",
            ErrorCode::E4204 => "E4204",
            ErrorCode::W4101 => "W4101",
            ErrorCode::W4102 => "W4102",
            ErrorCode::W4103 => "W4103",
        }
    }

    /// Check if this is a warning code (Wxxxx range).
    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }

    /// Check if this code is raised by a collaborator rather than the
    /// module compiler itself (E42xx range).
    pub fn is_collaborator_error(&self) -> bool {
        self.as_str().starts_with("E42")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
