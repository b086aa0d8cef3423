//! Statement-to-instruction lowering.
//!
//! A mechanical pass: growable sequences become fixed arrays, the
//! type annotations drop away, and the wrapped arithmetic opcodes are
//! promoted to top-level instruction variants. Addresses copy verbatim.

use quill_core::instruction::{DispatchCandidate, Instruction};
use quill_core::statement::{
    BinaryInstructionKind, Statement, StatementKind, UnaryInstructionKind,
};

/// Lower a typed statement into its executable form.
pub fn lower(statement: &Statement) -> Instruction {
    match &statement.kind {
        StatementKind::NoOp => Instruction::NoOp,
        StatementKind::Constant(value) => Instruction::Constant(value.clone()),
        StatementKind::FunctionCall { callee, arguments } => Instruction::FunctionCall {
            callee: Box::new(lower(callee)),
            arguments: lower_all(arguments),
        },
        StatementKind::Dispatch {
            candidates,
            arguments,
        } => Instruction::Dispatch {
            candidates: candidates
                .iter()
                .map(|candidate| DispatchCandidate {
                    parameter_types: candidate.parameter_types.clone().into_boxed_slice(),
                    callee: Box::new(lower(&candidate.callee)),
                })
                .collect(),
            arguments: lower_all(arguments),
        },
        StatementKind::Sequence(statements) => Instruction::Sequence(lower_all(statements)),
        StatementKind::VariableGet { index } => Instruction::VariableGet { index: *index },
        StatementKind::VariableSet { index, value } => Instruction::VariableSet {
            index: *index,
            value: Box::new(lower(value)),
        },
        StatementKind::FromImportedStack { import, inner } => Instruction::FromImportedStack {
            import: *import,
            inner: Box::new(lower(inner)),
        },
        StatementKind::SetAddress { address, value } => Instruction::SetAddress {
            address: address.clone(),
            value: Box::new(lower(value)),
        },
        StatementKind::ArmStack { function } => Instruction::ArmStack {
            function: Box::new(lower(function)),
        },
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => Instruction::If {
            condition: Box::new(lower(condition)),
            then_branch: Box::new(lower(then_branch)),
            else_branch: else_branch
                .as_ref()
                .map(|else_branch| Box::new(lower(else_branch))),
        },
        StatementKind::While { condition, body } => Instruction::While {
            condition: Box::new(lower(condition)),
            body: Box::new(lower(body)),
        },
        StatementKind::DoUntil { condition, body } => Instruction::DoUntil {
            condition: Box::new(lower(condition)),
            body: Box::new(lower(body)),
        },
        StatementKind::EmitEffect { value } => Instruction::EmitEffect {
            value: Box::new(lower(value)),
        },
        StatementKind::HandleEffect { handler, body } => Instruction::HandleEffect {
            handler: Box::new(lower(handler)),
            body: Box::new(lower(body)),
        },
        StatementKind::BuildTuple { elements } => Instruction::BuildTuple {
            elements: lower_all(elements),
        },
        StatementKind::BuildList { elements } => Instruction::BuildList {
            elements: lower_all(elements),
        },
        StatementKind::BuildSet { elements } => Instruction::BuildSet {
            elements: lower_all(elements),
        },
        StatementKind::BuildTable { entries } => Instruction::BuildTable {
            entries: entries
                .iter()
                .map(|(key, value)| (lower(key), lower(value)))
                .collect(),
        },
        StatementKind::BuildComposite { fields } => Instruction::BuildComposite {
            fields: fields
                .iter()
                .map(|(name, field)| (name.clone(), lower(field)))
                .collect(),
        },
        StatementKind::Unary { op, operand } => {
            let operand = Box::new(lower(operand));
            match op {
                UnaryInstructionKind::NegInt => Instruction::NegInt(operand),
                UnaryInstructionKind::NegFloat => Instruction::NegFloat(operand),
            }
        }
        StatementKind::Binary { op, left, right } => {
            let left = Box::new(lower(left));
            let right = Box::new(lower(right));
            match op {
                BinaryInstructionKind::AddInt => Instruction::AddInt(left, right),
                BinaryInstructionKind::SubInt => Instruction::SubInt(left, right),
                BinaryInstructionKind::MulInt => Instruction::MulInt(left, right),
                BinaryInstructionKind::DivInt => Instruction::DivInt(left, right),
                BinaryInstructionKind::ModInt => Instruction::ModInt(left, right),
                BinaryInstructionKind::AddFloat => Instruction::AddFloat(left, right),
                BinaryInstructionKind::SubFloat => Instruction::SubFloat(left, right),
                BinaryInstructionKind::MulFloat => Instruction::MulFloat(left, right),
                BinaryInstructionKind::DivFloat => Instruction::DivFloat(left, right),
            }
        }
    }
}

fn lower_all(statements: &[Statement]) -> Box<[Instruction]> {
    statements.iter().map(lower).collect()
}
