//! Effect emission, unwinding and handling.

use quill_common::diagnostics::EvalErrorKind;
use quill_core::instruction::Instruction;
use quill_core::stack::Stack;
use quill_core::value::Value;

use crate::eval::Evaluator;

fn boxed(instruction: Instruction) -> Box<Instruction> {
    Box::new(instruction)
}

fn emit(value: i64) -> Instruction {
    Instruction::EmitEffect {
        value: boxed(Instruction::Constant(Value::Integer(value))),
    }
}

fn add_one(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Integer(i)) => Value::Integer(i + 1),
        _ => Value::None,
    }
}

#[test]
fn test_effect_unwinds_through_sequence() {
    // Instructions after the emit never run.
    let stack = Stack::new(Vec::new(), 1);
    let program = Instruction::sequence(vec![
        emit(1),
        Instruction::VariableSet {
            index: 0,
            value: boxed(Instruction::Constant(Value::Integer(9))),
        },
    ]);
    let result = Evaluator::new()
        .evaluate(&program, &stack)
        .expect("evaluation itself succeeds");
    assert_eq!(result, Value::effect(Value::Integer(1)));
    assert_eq!(stack.get(0), Some(Value::None), "tail never executed");
}

#[test]
fn test_effect_unwinds_out_of_loops_and_calls() {
    let stack = Stack::new(Vec::new(), 0);
    let looping = Instruction::While {
        condition: boxed(Instruction::Constant(Value::Boolean(true))),
        body: boxed(emit(7)),
    };
    let result = Evaluator::new().evaluate(&looping, &stack).unwrap();
    assert_eq!(result, Value::effect(Value::Integer(7)));
}

#[test]
fn test_handle_effect_applies_handler() {
    let stack = Stack::new(Vec::new(), 0);
    let program = Instruction::HandleEffect {
        handler: boxed(Instruction::Constant(Value::NativeFunction(add_one))),
        body: boxed(Instruction::sequence(vec![
            emit(41),
            Instruction::Constant(Value::Integer(0)),
        ])),
    };
    assert_eq!(
        Evaluator::new().run(&program, &stack).unwrap(),
        Value::Integer(42)
    );
}

#[test]
fn test_handle_effect_passes_through_plain_results() {
    let stack = Stack::new(Vec::new(), 0);
    let program = Instruction::HandleEffect {
        handler: boxed(Instruction::Constant(Value::NativeFunction(add_one))),
        body: boxed(Instruction::Constant(Value::Integer(5))),
    };
    assert_eq!(
        Evaluator::new().run(&program, &stack).unwrap(),
        Value::Integer(5)
    );
}

#[test]
fn test_nested_handlers_catch_innermost_first() {
    let stack = Stack::new(Vec::new(), 0);
    let inner = Instruction::HandleEffect {
        handler: boxed(Instruction::Constant(Value::NativeFunction(add_one))),
        body: boxed(emit(1)),
    };
    let outer = Instruction::HandleEffect {
        handler: boxed(Instruction::Constant(Value::NativeFunction(add_one))),
        body: boxed(inner),
    };
    // Inner handler consumes the effect; outer sees a plain value.
    assert_eq!(
        Evaluator::new().run(&outer, &stack).unwrap(),
        Value::Integer(2)
    );
}

#[test]
fn test_unhandled_effect_is_reported_at_entry() {
    let stack = Stack::new(Vec::new(), 0);
    let error = Evaluator::new()
        .run(&emit(3), &stack)
        .expect_err("unhandled effect must be reported");
    assert_eq!(error.kind, EvalErrorKind::UnhandledEffect);

    // `evaluate` itself returns the effect as a value for callers that
    // want to inspect it.
    let result = Evaluator::new().evaluate(&emit(3), &stack).unwrap();
    assert!(result.is_effect());
}

#[test]
fn test_effect_propagates_out_of_function_bodies() {
    let stack = Stack::new(Vec::new(), 0);
    let template = Stack::new(Vec::new(), 1);
    let function = Value::function(template, std::rc::Rc::new(emit(9)));
    let program = Instruction::HandleEffect {
        handler: boxed(Instruction::Constant(Value::NativeFunction(add_one))),
        body: boxed(Instruction::FunctionCall {
            callee: boxed(Instruction::Constant(function)),
            arguments: Vec::new().into_boxed_slice(),
        }),
    };
    assert_eq!(
        Evaluator::new().run(&program, &stack).unwrap(),
        Value::Integer(10)
    );
}
