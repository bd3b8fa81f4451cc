//! Quill IR - shared value types for the module compiler
//!
//! This crate contains the data every compiler phase agrees on:
//! - `Name`s for interned atoms (with a fixed table of well-known atoms)
//! - `Term`s for literal values and opaque syntax trees
//! - `Signature`s (`name/arity`) and `Location`s (`file:line`)
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: atoms are `Name(u32)`, compared in O(1)
//! - **Opaque Syntax**: clause trees travel as `Term`s; only the evaluator
//!   and backend interpret them

mod interner;
mod name;
mod signature;
mod term;

pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use signature::{Location, Signature};
pub use term::{Term, TermDisplay};
