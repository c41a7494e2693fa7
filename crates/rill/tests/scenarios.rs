//! End-to-end scenarios driven through the four public entry points
//! (`scan` → `parse` → `analyze` → `evaluate`), exercising the same
//! source/result pairs the unit tests cover individually but as a single
//! pipeline, the way a real caller (`rill-cli`) drives it.

use pretty_assertions::assert_eq;

use rill::error::{RillError, RuntimeError, StaticError};
use rill::value::Value;
use rill::{analyze, evaluate, parse, scan};

fn eval(src: &str) -> Value {
    let tokens = scan(src).expect("scan");
    let program = parse(tokens).expect("parse");
    analyze(&program).expect("analyze");
    evaluate(&program).expect("evaluate")
}

fn run_to_err(src: &str) -> RillError {
    rill::run(src).expect_err("expected the program to fail")
}

#[test]
fn s1_curried_add() {
    assert_eq!(eval("let a = fn(a,b) -> a + b; a(1)(2)").as_number(), Some(3.0));
}

#[test]
fn s2_while_loop_to_four() {
    assert_eq!(
        eval("let mut a = 1; while a < 4 { a = a + 1; } a").as_number(),
        Some(4.0)
    );
}

#[test]
fn s3_nested_tuple_equality() {
    assert_eq!(
        eval(r#"[1,"a",[true,bottom]] == [1,"a",[true,bottom]]"#).as_boolean(),
        Some(true)
    );
}

#[test]
fn s4_record_literal_get() {
    assert_eq!(eval("{ 'a' -> 1 } -> 'get'('a')").as_number(), Some(1.0));
}

#[test]
fn s5_pipe_chain() {
    assert_eq!(eval("1 |> ? + 1 |> 3 ** ?").as_number(), Some(9.0));
}

#[test]
fn s6_tuple_push_chain() {
    let result = eval("[]->'push'(1)->'push'(2)");
    let items = result.as_tuple_items().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_number(), Some(1.0));
    assert_eq!(items[1].as_number(), Some(2.0));
}

#[test]
fn negative_string_plus_number_is_runtime_type_mismatch() {
    assert!(matches!(
        run_to_err("'a' + 1"),
        RillError::Runtime(RuntimeError::TypeMismatch { .. })
    ));
}

#[test]
fn negative_me_at_top_level_is_static_error() {
    assert!(matches!(
        run_to_err("me;"),
        RillError::Static(StaticError::MeOutsideMethod { .. })
    ));
}

#[test]
fn negative_return_at_top_level_is_static_error() {
    assert!(matches!(
        run_to_err("return;"),
        RillError::Static(StaticError::ReturnOutsideCallable { .. })
    ));
}

#[test]
fn negative_non_boolean_if_condition_is_runtime_error() {
    assert!(matches!(
        run_to_err("if 1 {}"),
        RillError::Runtime(RuntimeError::NonBooleanCondition { .. })
    ));
}

#[test]
fn negative_redeclaration_is_static_error() {
    assert!(matches!(
        run_to_err("let a; let a;"),
        RillError::Static(StaticError::Redeclaration { .. })
    ));
}

#[test]
fn negative_calling_a_number_is_runtime_error() {
    assert!(matches!(
        run_to_err("1()"),
        RillError::Runtime(RuntimeError::NotCallable { .. })
    ));
}

#[test]
fn prototype_binding_gives_distinct_receivers_per_instance() {
    let a = eval("[1]->'push'");
    let b = eval("[2]->'push'");
    assert_ne!(a.hash(), b.hash());
}

#[test]
fn closure_depth_one_sees_only_innermost_frame() {
    // `g`'s innermost enclosing frame is `f`'s own body block, not the
    // top-level scope two frames up where `x` lives — `fn<1>` doesn't reach
    // that far even though `f` itself captured everything via `fn<>`.
    assert!(matches!(
        run_to_err("let x = 1; let f = fn<>() { let g = fn<1>() -> x; g() }; f()"),
        RillError::Static(StaticError::UnresolvedIdentifier { .. })
    ));
}
