//! End-to-end scenarios: source programs (pre-parsed, the way the surface
//! parser desugars them) through compile, lower and evaluate.

use quill_compiler::session::{ProgramError, Session};
use quill_core::expression::{Expression, Parameter};
use quill_core::value::Value;

fn run(program: &[Expression]) -> Value {
    Session::new()
        .eval_program(program)
        .expect("program should evaluate")
}

#[test]
fn smoke_integer_addition() {
    // 1 + 1
    let value = run(&[Expression::binary(
        "+",
        Expression::integer(1),
        Expression::integer(1),
    )]);
    assert_eq!(value, Value::Integer(2));
}

#[test]
fn smoke_mixed_addition_is_a_compile_error() {
    // 1 + 1.0
    let result = Session::new().eval(&Expression::binary(
        "+",
        Expression::integer(1),
        Expression::float(1.0),
    ));
    assert!(
        matches!(result, Err(ProgramError::Compile(_))),
        "no overload of `+` takes (Int, Float): {result:?}"
    );
}

#[test]
fn smoke_string_binding() {
    // a = "abcd"; a
    let value = run(&[
        Expression::define("a", Expression::text("abcd")),
        Expression::name("a"),
    ]);
    assert_eq!(value, Value::string("abcd"));
}

#[test]
fn smoke_nested_definitions() {
    // a = (b = do c = 1); a + (b + 3) + c
    let value = run(&[
        Expression::define(
            "a",
            Expression::define(
                "b",
                Expression::block(vec![Expression::define("c", Expression::integer(1))]),
            ),
        ),
        Expression::binary(
            "+",
            Expression::binary(
                "+",
                Expression::name("a"),
                Expression::binary("+", Expression::name("b"), Expression::integer(3)),
            ),
            Expression::name("c"),
        ),
    ]);
    assert_eq!(value, Value::Integer(6));
}

#[test]
fn smoke_true_division_yields_float() {
    // 9 * (1 + 4) / 2 - 3f
    let value = run(&[Expression::binary(
        "-",
        Expression::binary(
            "/",
            Expression::binary(
                "*",
                Expression::integer(9),
                Expression::binary("+", Expression::integer(1), Expression::integer(4)),
            ),
            Expression::integer(2),
        ),
        Expression::float(3.0),
    )]);
    assert_eq!(value, Value::Float(19.5));
}

#[test]
fn smoke_truncating_division_stays_integral() {
    // 9 * (1 + 4) div 2 - 3
    let value = run(&[Expression::binary(
        "-",
        Expression::binary(
            "div",
            Expression::binary(
                "*",
                Expression::integer(9),
                Expression::binary("+", Expression::integer(1), Expression::integer(4)),
            ),
            Expression::integer(2),
        ),
        Expression::integer(3),
    )]);
    assert_eq!(value, Value::Integer(19));
}

#[test]
fn smoke_function_definition_and_call() {
    // foo(x) = x + 1; foo(3)
    let value = run(&[
        Expression::define_function(
            "foo",
            vec![Parameter::untyped("x")],
            None,
            Expression::binary("+", Expression::name("x"), Expression::integer(1)),
        ),
        Expression::call(Expression::name("foo"), vec![Expression::integer(3)]),
    ]);
    assert_eq!(value, Value::Integer(4));
}

#[test]
fn smoke_recursive_gcd() {
    // gcd(a: Int, b: Int): Int = if b == 0 then a else gcd(b, a mod b)
    // gcd(12, 42)
    let value = run(&[
        Expression::define_function(
            "gcd",
            vec![
                Parameter::typed("a", Expression::name("Int")),
                Parameter::typed("b", Expression::name("Int")),
            ],
            Some(Expression::name("Int")),
            Expression::if_else(
                Expression::binary("==", Expression::name("b"), Expression::integer(0)),
                Expression::name("a"),
                Expression::call(
                    Expression::name("gcd"),
                    vec![
                        Expression::name("b"),
                        Expression::binary("mod", Expression::name("a"), Expression::name("b")),
                    ],
                ),
            ),
        ),
        Expression::call(
            Expression::name("gcd"),
            vec![Expression::integer(12), Expression::integer(42)],
        ),
    ]);
    assert_eq!(value, Value::Integer(6));
}

#[test]
fn smoke_more_specific_overload_wins() {
    // foo(x) = x + 1; foo(x: Int) = x - 1; foo(3)
    let value = run(&[
        Expression::define_function(
            "foo",
            vec![Parameter::untyped("x")],
            None,
            Expression::binary("+", Expression::name("x"), Expression::integer(1)),
        ),
        Expression::define_function(
            "foo",
            vec![Parameter::typed("x", Expression::name("Int"))],
            None,
            Expression::binary("-", Expression::name("x"), Expression::integer(1)),
        ),
        Expression::call(Expression::name("foo"), vec![Expression::integer(3)]),
    ]);
    assert_eq!(value, Value::Integer(2), "the Int overload outranks Any");
}

#[test]
fn smoke_mismatched_overload_is_eliminated() {
    // foo(x: Float) = x - 1.0; foo(x) = x + 1; foo(3)
    let value = run(&[
        Expression::define_function(
            "foo",
            vec![Parameter::typed("x", Expression::name("Float"))],
            None,
            Expression::binary("-", Expression::name("x"), Expression::float(1.0)),
        ),
        Expression::define_function(
            "foo",
            vec![Parameter::untyped("x")],
            None,
            Expression::binary("+", Expression::name("x"), Expression::integer(1)),
        ),
        Expression::call(Expression::name("foo"), vec![Expression::integer(3)]),
    ]);
    assert_eq!(
        value,
        Value::Integer(4),
        "the Float candidate is eliminated; the fallback matches"
    );
}

#[test]
fn smoke_closures_see_module_bindings() {
    // base = 10; addbase(x) = base + x; addbase(5)
    let value = run(&[
        Expression::define("base", Expression::integer(10)),
        Expression::define_function(
            "addbase",
            vec![Parameter::untyped("x")],
            None,
            Expression::binary("+", Expression::name("base"), Expression::name("x")),
        ),
        Expression::call(Expression::name("addbase"), vec![Expression::integer(5)]),
    ]);
    assert_eq!(value, Value::Integer(15));
}

#[test]
fn smoke_while_loop_accumulates() {
    // n = 5; acc = 0; while n != 0 { acc := acc + n; n := n - 1 }; acc
    let value = run(&[
        Expression::define("n", Expression::integer(5)),
        Expression::define("acc", Expression::integer(0)),
        Expression::while_loop(
            Expression::binary("!=", Expression::name("n"), Expression::integer(0)),
            Expression::block(vec![
                Expression::assign(
                    "acc",
                    Expression::binary("+", Expression::name("acc"), Expression::name("n")),
                ),
                Expression::assign(
                    "n",
                    Expression::binary("-", Expression::name("n"), Expression::integer(1)),
                ),
            ]),
        ),
        Expression::name("acc"),
    ]);
    assert_eq!(value, Value::Integer(15));
}

#[test]
fn smoke_integer_division_by_zero_fails_at_runtime() {
    // 1 div 0
    let result = Session::new().eval(&Expression::binary(
        "div",
        Expression::integer(1),
        Expression::integer(0),
    ));
    assert!(
        matches!(result, Err(ProgramError::Eval(_))),
        "domain failure surfaces from the evaluator: {result:?}"
    );
}
