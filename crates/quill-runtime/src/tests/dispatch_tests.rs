//! Dispatcher tests: ranking, elimination, specificity, stability.

use std::rc::Rc;

use quill_common::diagnostics::EvalErrorKind;
use quill_core::instruction::{DispatchCandidate, Instruction};
use quill_core::relate::TypeMatch;
use quill_core::stack::Stack;
use quill_core::types::Type;
use quill_core::value::Value;

use crate::dispatch::{rank_candidate, select_candidate};
use crate::eval::Evaluator;

// The marker constant stands in for a real callee; selection tests only
// look at indices.
fn candidate(parameter_types: Vec<Type>, marker: i64) -> DispatchCandidate {
    DispatchCandidate {
        parameter_types: parameter_types.into_iter().map(Rc::new).collect(),
        callee: Box::new(Instruction::Constant(Value::Integer(marker))),
    }
}

// =============================================================================
// Ranking
// =============================================================================

#[test]
fn test_rank_prefers_exact_kind_over_any() {
    let int_arg = [Type::integer()];
    let exact = rank_candidate(&[Rc::new(Type::integer())], &int_arg);
    let loose = rank_candidate(&[Rc::new(Type::any())], &int_arg);
    assert_eq!(exact, TypeMatch::AlmostEqual);
    assert_eq!(loose, TypeMatch::True);
    assert!(exact > loose);
}

#[test]
fn test_rank_arity_mismatch_is_none() {
    assert_eq!(
        rank_candidate(&[Rc::new(Type::integer())], &[]),
        TypeMatch::None
    );
}

#[test]
fn test_rank_reduces_across_arguments() {
    // One perfect and one loose argument reduce to the loose score.
    let score = rank_candidate(
        &[Rc::new(Type::integer()), Rc::new(Type::any())],
        &[Type::integer(), Type::integer()],
    );
    assert_eq!(score, TypeMatch::True);
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_select_more_specific_candidate() {
    // Mirrors `foo(x) = ...; foo(x: Int) = ...; foo(3)`.
    let candidates = [
        candidate(vec![Type::any()], 1),
        candidate(vec![Type::integer()], 2),
    ];
    let winner = select_candidate(&candidates, &[Type::integer()]).unwrap();
    assert_eq!(winner, 1, "the Int overload outranks the Any overload");
}

#[test]
fn test_select_eliminates_kind_clashes() {
    // Mirrors `foo(x: Float) = ...; foo(x) = ...; foo(3)`.
    let candidates = [
        candidate(vec![Type::float()], 1),
        candidate(vec![Type::any()], 2),
    ];
    let winner = select_candidate(&candidates, &[Type::integer()]).unwrap();
    assert_eq!(winner, 1, "the Float candidate is eliminated");
}

#[test]
fn test_select_fails_when_nothing_matches() {
    let candidates = [candidate(vec![Type::float()], 1)];
    let error = select_candidate(&candidates, &[Type::integer()]).unwrap_err();
    assert_eq!(error.kind, EvalErrorKind::NoOverloadFound);
}

#[test]
fn test_select_breaks_exact_ties_by_declaration_order() {
    let candidates = [
        candidate(vec![Type::integer()], 1),
        candidate(vec![Type::integer()], 2),
    ];
    let winner = select_candidate(&candidates, &[Type::integer()]).unwrap();
    assert_eq!(winner, 0, "first declared wins an exact tie");
}

#[test]
fn test_select_rejects_incomparable_ties() {
    // (Int, Any) vs (Any, Int) with (Int, Int) arguments: equal scores,
    // each more specific in a different position.
    let candidates = [
        candidate(vec![Type::integer(), Type::any()], 1),
        candidate(vec![Type::any(), Type::integer()], 2),
    ];
    let error =
        select_candidate(&candidates, &[Type::integer(), Type::integer()]).unwrap_err();
    assert_eq!(error.kind, EvalErrorKind::NoOverloadFound);
}

#[test]
fn test_law_dispatch_is_stable() {
    let candidates = [
        candidate(vec![Type::any()], 1),
        candidate(vec![Type::integer()], 2),
        candidate(vec![Type::float()], 3),
    ];
    let first = select_candidate(&candidates, &[Type::integer()]).unwrap();
    for _ in 0..20 {
        assert_eq!(
            select_candidate(&candidates, &[Type::integer()]).unwrap(),
            first
        );
    }
}

// =============================================================================
// End-to-end dispatch instruction
// =============================================================================

#[test]
fn test_dispatch_instruction_executes_winner() {
    fn on_int(args: &[Value]) -> Value {
        match args.first() {
            Some(Value::Integer(i)) => Value::Integer(i - 1),
            _ => Value::None,
        }
    }
    fn on_any(args: &[Value]) -> Value {
        match args.first() {
            Some(Value::Integer(i)) => Value::Integer(i + 1),
            _ => Value::None,
        }
    }

    let candidates = vec![
        DispatchCandidate {
            parameter_types: vec![Rc::new(Type::any())].into_boxed_slice(),
            callee: Box::new(Instruction::Constant(Value::NativeFunction(on_any))),
        },
        DispatchCandidate {
            parameter_types: vec![Rc::new(Type::integer())].into_boxed_slice(),
            callee: Box::new(Instruction::Constant(Value::NativeFunction(on_int))),
        },
    ];
    let program = Instruction::Dispatch {
        candidates: candidates.into_boxed_slice(),
        arguments: vec![Instruction::Constant(Value::Integer(3))].into_boxed_slice(),
    };
    let stack = Stack::new(Vec::new(), 0);
    assert_eq!(
        Evaluator::new().run(&program, &stack).unwrap(),
        Value::Integer(2),
        "the more specific Int overload wins"
    );
}
