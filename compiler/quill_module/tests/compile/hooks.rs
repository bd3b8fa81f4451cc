use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use quill_diagnostic::ErrorCode;
use quill_ir::{Name, Term};
use quill_module::{
    AttributeName, Bindings, CompileError, CompilerOptions, CompiledUnits, DefKind,
    DefinitionEvent, EvalError, Expansion, HookKind,
};

use crate::harness::{compile_standalone, MockDefinitions, MockEvaluator, MockLoader, World};

#[test]
fn test_before_compile_hook_shapes_definitions() {
    let world = World::new();
    let hooks = world.atom("Hooks");
    let run = world.sig("run", 0);

    let target = hooks.clone();
    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::BeforeCompile, target.clone())?;
        Ok(Term::nil())
    })
    .on_hook(Name::BEFORE_COMPILE_CALLBACK, move |session, _args| {
        session.make_overridable(run);
        Ok(Expansion::Literal(Term::nil()))
    });
    let mut definitions = MockDefinitions::new(vec![world.def(DefKind::Def, "run", 0, 3)]);
    let mut loader = MockLoader::default();

    world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();

    assert_eq!(definitions.seen_overridable, vec![run]);
    assert_eq!(
        evaluator.hook_calls,
        vec![(
            world.module("Hooks"),
            Name::BEFORE_COMPILE_CALLBACK,
            vec![world.env().to_term(world.module("Foo"))],
        )]
    );
}

#[test]
fn test_after_compile_sees_binary_and_units_are_tracked() {
    let world = World::with_options(CompilerOptions::default().with_compiled_unit_tracking(true));
    let foo = world.module("Foo");
    let finished = world.name("finished");

    let target = Term::tuple([world.atom("Hooks"), Term::atom(finished)]);
    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::AfterCompile, target.clone())?;
        Ok(Term::nil())
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    let compiled = world
        .compile(&foo.to_term(), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();

    assert_eq!(evaluator.hook_calls.len(), 1);
    let (_, function, args) = &evaluator.hook_calls[0];
    assert_eq!(*function, finished);
    assert_eq!(
        args,
        &vec![world.env().to_term(foo), compiled.binary.to_term()]
    );

    let units: &CompiledUnits = world.compiler.compiled_units();
    assert_eq!(units.modules(), vec![foo]);
    assert_eq!(units.drain(), vec![(foo, compiled.binary)]);
}

#[test]
fn test_hook_failure_is_attributed_and_cleaned_up() {
    let world = World::new();
    let hooks = world.atom("Hooks");
    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::BeforeCompile, hooks.clone())?;
        Ok(Term::nil())
    })
    .on_hook(Name::BEFORE_COMPILE_CALLBACK, |_, _| {
        Err(EvalError::new("no such table"))
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();

    let CompileError::Hook(hook) = &err else {
        panic!("expected a hook error, got {err:?}");
    };
    assert_eq!(hook.kind, HookKind::BeforeCompile);
    assert_eq!(hook.hook, "Hooks.__before_compile__/1");
    assert_eq!(hook.error.message, "no such table");
    assert_eq!(err.location(), Some(world.env().location()));

    assert_eq!(definitions.calls, 0);
    assert!(loader.received.is_none());
    assert!(world.registry.is_empty());
}

#[test]
fn test_hook_may_compile_another_module() {
    let world = World::with_options(CompilerOptions::default().with_compiled_unit_tracking(true));
    let hooks = world.atom("Hooks");
    let helper = world.atom("Helper");
    let compiler = world.compiler.clone();
    let env = world.env();

    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::BeforeCompile, hooks.clone())?;
        Ok(Term::nil())
    })
    .on_hook(Name::BEFORE_COMPILE_CALLBACK, move |_, _| {
        let compiled = compile_standalone(&compiler, &helper, env.clone())
            .map_err(|e| EvalError::new(e.to_string()))?;
        Ok(Expansion::Literal(compiled.module.to_term()))
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap();

    assert_eq!(
        world.compiler.compiled_units().modules(),
        vec![world.module("Helper"), world.module("Foo")]
    );
    assert!(world.registry.is_empty());
}

#[test]
fn test_reentrant_compile_of_same_module_fails() {
    let world = World::new();
    let compiler = world.compiler.clone();
    let target = world.atom("Foo");
    let env = world.env();
    let nested: Rc<RefCell<Option<CompileError>>> = Rc::default();

    let seen = Rc::clone(&nested);
    let inner_target = target.clone();
    let mut evaluator = MockEvaluator::new(move |_| {
        if let Err(err) = compile_standalone(&compiler, &inner_target, env.clone()) {
            *seen.borrow_mut() = Some(err);
        }
        Ok(Term::nil())
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    world
        .compile(&target, &mut evaluator, &mut definitions, &mut loader)
        .unwrap();

    let err = nested.borrow_mut().take().unwrap();
    assert_eq!(
        err,
        CompileError::ModuleInDefinition {
            module: "Foo".to_owned(),
            location: world.env().location(),
        }
    );
    assert_eq!(
        err.to_string(),
        "cannot define module Foo because it is currently being defined"
    );
    assert!(world.registry.is_empty());
}

#[test]
fn test_on_definition_failure_during_body_is_a_hook_error() {
    let world = World::new();
    let hooks = world.atom("Hooks");
    let bar = world.sig("bar", 1);
    let x = world.atom("x");

    let mut evaluator = MockEvaluator::new(move |session| {
        session.put_attribute(2, AttributeName::OnDefinition, hooks.clone())?;
        let mut definer = MockEvaluator::empty()
            .on_hook(Name::ON_DEFINITION_CALLBACK, |_, _| Err(EvalError::new("hook blew up")));
        let event = DefinitionEvent {
            kind: DefKind::Def,
            signature: bar,
            line: 5,
            args: vec![x.clone()],
            guards: Vec::new(),
            body: Term::nil(),
        };
        session.define(&mut definer, &event, &Bindings::new())?;
        Ok(Term::nil())
    });
    let mut definitions = MockDefinitions::default();
    let mut loader = MockLoader::default();

    let err = world
        .compile(&world.atom("Foo"), &mut evaluator, &mut definitions, &mut loader)
        .unwrap_err();

    let CompileError::Hook(hook) = &err else {
        panic!("expected a hook error, got {err:?}");
    };
    assert_eq!(hook.kind, HookKind::OnDefinition);
    assert_eq!(hook.hook, "Hooks.__on_definition__/6");
    assert_eq!(hook.error.message, "hook blew up");
    assert_eq!(err.code(), ErrorCode::E4201);
    assert_eq!(err.location().map(|l| l.line), Some(5));
    assert_eq!(definitions.calls, 0);
    assert!(world.registry.is_empty());
}
