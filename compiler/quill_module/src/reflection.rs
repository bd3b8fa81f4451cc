//! The synthetic `__info__/1` function.
//!
//! Every compiled module exports `__info__/1`, answering a fixed set of
//! queries about itself and delegating anything else to the platform's
//! generic module introspection.

use quill_ir::{Name, Signature, Term};

use crate::collab::Unwrapped;
use crate::config::CompilerOptions;
use crate::docs::DocEntry;
use crate::errors::CompileError;
use crate::session::{ModuleName, Session};

/// A query understood by `__info__/1`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InfoQuery {
    Functions,
    Macros,
    Module,
    Docs,
    Moduledoc,
    /// Anything else; answered by the fallback clause.
    Other(Name),
}

impl InfoQuery {
    pub fn from_name(name: Name) -> Self {
        match name {
            Name::FUNCTIONS => InfoQuery::Functions,
            Name::MACROS => InfoQuery::Macros,
            Name::MODULE => InfoQuery::Module,
            Name::DOCS => InfoQuery::Docs,
            Name::MODULEDOC => InfoQuery::Moduledoc,
            other => InfoQuery::Other(other),
        }
    }
}

/// How a query is answered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reflection {
    /// A fixed answer compiled into the function.
    Answer(Term),
    /// Delegated to generic module introspection of `module`.
    Fallback { module: ModuleName, query: Name },
}

/// The reflection function of one module.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReflectionFunction {
    pub module: ModuleName,
    pub line: u32,
    pub functions: Vec<Signature>,
    /// Public macros.
    pub macros: Vec<Signature>,
    /// Function and macro docs; `None` when docs are disabled.
    pub docs: Option<Vec<DocEntry>>,
    /// `{line, doc}`; `None` when docs are disabled.
    pub moduledoc: Option<(u32, Term)>,
}

impl ReflectionFunction {
    pub fn signature(&self) -> Signature {
        Signature::REFLECTION
    }

    /// Answer `query` the way the compiled function would.
    pub fn respond(&self, query: InfoQuery) -> Reflection {
        let answer = match query {
            InfoQuery::Functions => signatures_term(&self.functions),
            InfoQuery::Macros => signatures_term(&self.macros),
            InfoQuery::Module => self.module.to_term(),
            InfoQuery::Docs => self.docs.as_ref().map_or_else(Term::nil, |docs| {
                Term::list(docs.iter().map(DocEntry::to_term))
            }),
            InfoQuery::Moduledoc => self.moduledoc.as_ref().map_or_else(Term::nil, |(line, doc)| {
                Term::tuple([Term::Integer(i64::from(*line)), doc.clone()])
            }),
            InfoQuery::Other(query) => {
                return Reflection::Fallback {
                    module: self.module,
                    query,
                }
            }
        };
        Reflection::Answer(answer)
    }
}

fn signatures_term(signatures: &[Signature]) -> Term {
    Term::list(signatures.iter().copied().map(Term::signature))
}

/// Synthesize `__info__/1` for the module of `session`.
///
/// Fails if the user defined `__info__/1` themselves.
pub fn build(
    session: &Session,
    unwrapped: &Unwrapped,
    options: &CompilerOptions,
) -> Result<ReflectionFunction, CompileError> {
    let reflection = Signature::REFLECTION;
    if unwrapped.exports.contains(&reflection) || unwrapped.all.contains(&reflection) {
        return Err(CompileError::InternalFunctionOverridden {
            function: reflection.display(session.interner()).to_string(),
            location: session.location(),
        });
    }

    let (docs, moduledoc) = if options.docs {
        let docs = session.docs().definitions().cloned().collect();
        let moduledoc = session
            .moduledoc()
            .cloned()
            .unwrap_or((session.env().line, Term::nil()));
        (Some(docs), Some(moduledoc))
    } else {
        (None, None)
    };

    let private_macros = unwrapped.private_macros();
    let macros = unwrapped
        .macros
        .iter()
        .copied()
        .filter(|sig| !private_macros.contains(sig))
        .collect();

    Ok(ReflectionFunction {
        module: session.module(),
        line: session.env().line,
        functions: unwrapped.defs.clone(),
        macros,
        docs,
        moduledoc,
    })
}
