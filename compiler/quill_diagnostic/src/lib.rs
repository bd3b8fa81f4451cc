//! Diagnostic system for the module compiler.
//!
//! - Codes for searchability (`E4xxx` errors, `W4xxx` warnings)
//! - Clear messages (what went wrong)
//! - `file:line` locations (where it went wrong)
//! - Notes and suggestions (why, and how to fix)
//!
//! Warnings flow into a [`DiagnosticSink`]; fatal problems are returned as
//! typed errors by the compiler and converted to a [`Diagnostic`] only
//! for display.

mod diagnostic;
mod error_code;
pub mod sink;

pub use diagnostic::{Diagnostic, Severity};
pub use error_code::ErrorCode;
pub use sink::{DiagnosticQueue, DiagnosticSink, TracingSink};
