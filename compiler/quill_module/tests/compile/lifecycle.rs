use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use quill_diagnostic::ErrorCode;
use quill_ir::{Signature, Term};
use quill_module::{
    AttributeName, CompileError, DefKind, DocEntry, DocKind, Form, FunType, SpecDecl, SpecKind,
};
use rayon::prelude::*;

use crate::harness::{LoadBehavior, MockDefinitions, MockEvaluator, MockLoader, World};

#[test]
fn test_compiles_module_with_on_load_and_spec() {
    let world = World::new();
    let foo = world.module("Foo");
    let bar = world.sig("bar", 1);
    let init = world.sig("init", 0);
    let integer = world.atom("integer");
    let done = world.atom("done");

    let result = done.clone();
    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::OnLoad, Term::signature(init))?;
        let fun = FunType::new(3, vec![integer.clone()], integer.clone());
        session.put_attribute(3, AttributeName::Spec, SpecDecl::new(bar, 3, fun))?;
        Ok(result.clone())
    });
    let mut definitions = MockDefinitions::new(vec![
        world.def(DefKind::Defp, "init", 0, 4),
        world.def(DefKind::Def, "bar", 1, 5),
    ]);
    let mut loader = MockLoader::default();
    assert_eq!(loader.behavior, LoadBehavior::Succeed);

    let compiled = world
        .compile(&foo.to_term(), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();

    assert_eq!(compiled.module, foo);
    assert_eq!(compiled.result, done);
    assert_eq!(compiled.binary.as_bytes(), &foo.name().raw().to_le_bytes()[..]);
    assert_eq!(loader.loaded, vec![foo]);
    assert_eq!(definitions.calls, 1);

    let forms = loader.forms();
    let exports: Vec<&[Signature]> = forms.iter().filter_map(Form::as_export).collect();
    assert_eq!(exports, vec![&[Signature::REFLECTION, bar][..]]);

    let on_load = forms
        .iter()
        .filter(|f| matches!(f, Form::Attribute { name: AttributeName::OnLoad, .. }))
        .count();
    assert_eq!(on_load, 1);

    let specs: Vec<_> = forms
        .iter()
        .filter_map(|f| match f {
            Form::Spec {
                kind: SpecKind::Spec,
                signature,
                clauses,
                ..
            } => Some((*signature, clauses.len())),
            _ => None,
        })
        .collect();
    assert_eq!(specs, vec![(bar, 1)]);

    let reflection = forms.iter().find_map(Form::as_reflection).unwrap();
    assert_eq!(reflection.functions, vec![bar]);

    assert!(world.registry.is_empty());
    assert!(world.sink.is_empty());
}

#[test]
fn test_invalid_target_opens_nothing() {
    let world = World::new();
    let evaluated = Rc::new(Cell::new(false));
    let flag = Rc::clone(&evaluated);
    let mut evaluator = MockEvaluator::new(move |_| {
        flag.set(true);
        Ok(Term::nil())
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    for target in [Term::Integer(1), Term::nil(), Term::binary("Foo")] {
        let err = world
            .compile(&target, &mut evaluator, &mut definitions, &mut loader)
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidModuleTarget { .. }));
        assert_eq!(err.code(), ErrorCode::E4001);
    }

    assert!(!evaluated.get());
    assert_eq!(definitions.calls, 0);
    assert!(loader.received.is_none());
    assert!(world.registry.is_empty());
}

#[test]
fn test_concurrent_opens_admit_exactly_one() {
    let world = World::new();
    let foo = world.module("Foo");
    let registry = world.registry.clone();
    let interner = world.interner.clone();
    let options = world.compiler.options().clone();
    let env = world.env();

    let attempts: Vec<_> = (0..32)
        .into_par_iter()
        .map(|_| registry.open(&interner, foo, env.clone(), &options))
        .collect();

    assert_eq!(attempts.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(attempts
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, CompileError::ModuleInDefinition { .. })));
    assert!(registry.is_open(foo));

    drop(attempts);
    assert!(registry.is_empty());
}

#[test]
fn test_dangling_doc_warns_without_aborting() {
    let world = World::new();
    let missing = world.sig("missing", 2);
    let mut evaluator = MockEvaluator::new(move |session| {
        session.docs_mut().push(DocEntry {
            signature: missing,
            line: 6,
            kind: DocKind::Def,
            formatted_signature: Term::list([]),
            doc: Some("Gone.".to_owned()),
        });
        Ok(Term::nil())
    });
    let mut definitions = MockDefinitions::new(vec![world.def(DefKind::Def, "bar", 1, 3)]);
    let mut loader = MockLoader::default();

    world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();

    let diagnostics = world.sink.flush();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::W4102);
    assert_eq!(
        diagnostics[0].message,
        "@doc provided for missing/2, but no definition exists"
    );
    assert_eq!(diagnostics[0].location.map(|l| l.line), Some(6));
}

#[test]
fn test_leftover_typedoc_warns() {
    let world = World::new();
    let mut evaluator = MockEvaluator::new(|session| {
        session.put_attribute(4, AttributeName::Typedoc, Term::binary("Orphan."))?;
        Ok(Term::nil())
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();
    assert_eq!(world.sink.count_code(ErrorCode::W4103), 1);
}

#[test]
fn test_redefining_loaded_module_warns() {
    let world = World::new();
    let foo = world.module("Foo");
    let mut evaluator = MockEvaluator::empty();
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader {
        loaded: vec![foo],
        ..MockLoader::default()
    };

    world
        .compile(&foo.to_term(), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();
    assert!(world.sink.has_code(ErrorCode::W4101));
    assert_eq!(loader.loaded, vec![foo, foo]);

    let quiet = World::with_options(
        quill_module::CompilerOptions::default().with_ignore_module_conflict(true),
    );
    let foo = quiet.module("Foo");
    let mut loader = MockLoader {
        loaded: vec![foo],
        ..MockLoader::default()
    };
    quiet
        .compile(&foo.to_term(), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();
    assert!(quiet.sink.is_empty());
}
