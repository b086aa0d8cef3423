//! Lowering tests: statements translate structurally.

use std::rc::Rc;

use quill_core::instruction::{Instruction, VariableAddress};
use quill_core::statement::{
    BinaryInstructionKind, Statement, StatementKind, UnaryInstructionKind,
};
use quill_core::types::Type;
use quill_core::value::Value;

use crate::lower::lower;

fn int_constant(value: i64) -> Statement {
    Statement::constant(Value::Integer(value))
}

#[test]
fn test_lower_promotes_binary_opcodes() {
    let statement = Statement::binary(
        BinaryInstructionKind::AddInt,
        int_constant(1),
        int_constant(2),
        Rc::new(Type::integer()),
    );
    assert_eq!(
        lower(&statement),
        Instruction::AddInt(
            Box::new(Instruction::Constant(Value::Integer(1))),
            Box::new(Instruction::Constant(Value::Integer(2))),
        )
    );
}

#[test]
fn test_lower_promotes_unary_opcodes() {
    let statement = Statement::unary(
        UnaryInstructionKind::NegFloat,
        Statement::constant(Value::Float(2.0)),
        Rc::new(Type::float()),
    );
    assert_eq!(
        lower(&statement),
        Instruction::NegFloat(Box::new(Instruction::Constant(Value::Float(2.0))))
    );
}

#[test]
fn test_lower_sequences_to_fixed_arrays() {
    let statement = Statement::new(
        StatementKind::Sequence(vec![int_constant(1), int_constant(2)]),
        Rc::new(Type::integer()),
    );
    match lower(&statement) {
        Instruction::Sequence(instructions) => assert_eq!(instructions.len(), 2),
        other => panic!("expected a sequence, got {other:?}"),
    }
}

#[test]
fn test_lower_copies_addresses_verbatim() {
    let statement = Statement::new(
        StatementKind::SetAddress {
            address: VariableAddress::new([0, 3]),
            value: Box::new(int_constant(1)),
        },
        Rc::new(Type::integer()),
    );
    match lower(&statement) {
        Instruction::SetAddress { address, .. } => {
            assert_eq!(address, VariableAddress::new([0, 3]))
        }
        other => panic!("expected a set-address, got {other:?}"),
    }
}

#[test]
fn test_lower_keeps_control_flow_shape() {
    let statement = Statement::new(
        StatementKind::If {
            condition: Box::new(Statement::constant(Value::Boolean(true))),
            then_branch: Box::new(int_constant(1)),
            else_branch: None,
        },
        Rc::new(Type::integer()),
    );
    match lower(&statement) {
        Instruction::If { else_branch, .. } => assert!(else_branch.is_none()),
        other => panic!("expected an if, got {other:?}"),
    }
}
