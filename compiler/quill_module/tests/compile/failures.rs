use pretty_assertions::assert_eq;
use quill_ir::{Name, Term};
use quill_module::{
    AttributeName, CompileError, CompilerOptions, DefKind, Definition, EvalError, Expansion,
    LoadError,
};

use crate::harness::{LoadBehavior, MockDefinitions, MockEvaluator, MockLoader, World};

#[test]
fn test_body_failure_releases_the_module() {
    let world = World::new();
    let foo = world.atom("Foo");
    let mut failing = MockEvaluator::new(|session| {
        session.put_attribute(2, AttributeName::Vsn, Term::Integer(1))?;
        Err(EvalError::new("undefined function x/0"))
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    let err = world
        .compile(&foo, &mut failing, &mut definitions, &mut loader)
        .unwrap_err();
    assert!(matches!(err, CompileError::Eval(ref e) if e.message == "undefined function x/0"));
    assert!(world.registry.is_empty());
    assert_eq!(definitions.calls, 0);

    let mut evaluator = MockEvaluator::empty();
    world
        .compile(&foo, &mut evaluator, &mut definitions, &mut loader)
        .unwrap();
    let persisted_vsn = loader
        .forms()
        .iter()
        .any(|f| matches!(f, quill_module::Form::Attribute { name: AttributeName::Vsn, .. }));
    assert!(!persisted_vsn, "attributes of the failed attempt must not leak");
}

#[test]
fn test_user_defined_reflection_is_rejected_before_loading() {
    let world = World::new();
    let mut evaluator = MockEvaluator::empty();
    let mut definitions = MockDefinitions::new(vec![Definition {
        signature: quill_ir::Signature::REFLECTION,
        kind: DefKind::Def,
        line: 3,
        clauses: vec![Term::nil()],
    }]);
    let mut loader = MockLoader::default();

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::InternalFunctionOverridden {
            function: "__info__/1".to_owned(),
            location: world.env().location(),
        }
    );
    assert!(loader.received.is_none());
    assert!(loader.forms().is_empty());
    assert!(world.registry.is_empty());
}

#[test]
fn test_public_private_conflict_fails() {
    let world = World::new();
    let mut evaluator = MockEvaluator::empty();
    let mut definitions = MockDefinitions::new(vec![
        world.def(DefKind::Def, "bar", 1, 3),
        world.def(DefKind::Defp, "bar", 1, 7),
    ]);
    let mut loader = MockLoader::default();

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::FunctionConflict {
            function: "bar/1".to_owned(),
            location: world.env().location().at_line(7),
        }
    );
    assert!(loader.received.is_none());
}

#[test]
fn test_loader_rejection_skips_after_compile() {
    let world = World::new();
    let hooks = world.atom("Hooks");
    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::AfterCompile, hooks.clone())?;
        Ok(Term::nil())
    })
    .on_hook(Name::AFTER_COMPILE_CALLBACK, |_, _| Ok(Expansion::Literal(Term::nil())));
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader {
        behavior: LoadBehavior::Reject("disk full".to_owned()),
        ..MockLoader::default()
    };

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();
    assert_eq!(err, CompileError::Load(LoadError::new("disk full")));
    assert_eq!(err.to_string(), "could not load module: disk full");
    assert!(evaluator.hook_calls.is_empty());
    assert!(loader.loaded.is_empty());
    assert!(world.registry.is_empty());
}

#[test]
fn test_loader_that_never_reports_fails() {
    let world = World::new();
    let mut evaluator = MockEvaluator::empty();
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader {
        behavior: LoadBehavior::SkipCallback,
        ..MockLoader::default()
    };

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::Load(LoadError::new(
            "loader finished without reporting the compiled binary"
        ))
    );
    assert!(loader.received.is_some());
    assert!(world.registry.is_empty());
}

#[test]
fn test_after_compile_failure_propagates_through_loader() {
    let world = World::new();
    let hooks = world.atom("Hooks");
    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::AfterCompile, hooks.clone())?;
        Ok(Term::nil())
    })
    .on_hook(Name::AFTER_COMPILE_CALLBACK, |_, args| {
        assert_eq!(args.len(), 2);
        Err(EvalError::new("cannot write beam"))
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();
    assert!(matches!(
        err,
        CompileError::Hook(ref hook) if hook.hook == "Hooks.__after_compile__/2"
    ));
    assert!(loader.loaded.is_empty());
    assert!(world.registry.is_empty());
}

#[test]
fn test_loader_reporting_twice_fails_without_rerunning_hooks() {
    let world = World::with_options(CompilerOptions::default().with_compiled_unit_tracking(true));
    let hooks = world.atom("Hooks");
    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::AfterCompile, hooks.clone())?;
        Ok(Term::nil())
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader {
        behavior: LoadBehavior::ReportTwice,
        ..MockLoader::default()
    };

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::Load(LoadError::new(
            "loader reported the compiled binary more than once"
        ))
    );
    assert_eq!(evaluator.hook_calls.len(), 1);
    assert_eq!(world.compiler.compiled_units().len(), 1);
    assert!(world.registry.is_empty());
}
