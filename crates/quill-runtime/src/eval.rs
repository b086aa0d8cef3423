//! The tree-walking evaluator.
//!
//! Executes an `Instruction` against a `Stack`. Effects unwind by value:
//! any sub-evaluation producing `Value::Effect` is propagated immediately
//! without further action, until a `HandleEffect` consumes it or it
//! reaches the entry point. Hard failures (domain errors, bad addresses,
//! exhausted budgets) travel the `Err` channel instead and are never
//! retried.
//!
//! Suspension points: the evaluator checks the host cancellation flag and
//! its depth budgets at `While`/`DoUntil` iterations and before every
//! `FunctionCall`/`Dispatch` invocation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use quill_common::diagnostics::{EvalError, EvalErrorKind};
use quill_common::limits::{MAX_CALL_DEPTH, MAX_EVAL_DEPTH};
use quill_core::instruction::Instruction;
use quill_core::stack::Stack;
use quill_core::typing::to_type;
use quill_core::value::Value;

use crate::dispatch::select_candidate;

/// Propagate an in-flight effect out of the current instruction.
macro_rules! propagate {
    ($value:expr) => {{
        let value = $value;
        if value.is_effect() {
            return Ok(value);
        }
        value
    }};
}

/// Evaluator state: recursion depth plus an optional host cancellation
/// flag consulted at suspension points.
pub struct Evaluator {
    depth: u32,
    call_depth: u32,
    cancel: Option<Arc<AtomicBool>>,
}

impl Evaluator {
    pub fn new() -> Evaluator {
        Evaluator {
            depth: 0,
            call_depth: 0,
            cancel: None,
        }
    }

    pub fn with_cancellation(cancel: Arc<AtomicBool>) -> Evaluator {
        Evaluator {
            depth: 0,
            call_depth: 0,
            cancel: Some(cancel),
        }
    }

    /// Entry point: evaluate and refuse an unhandled effect.
    pub fn run(&mut self, instruction: &Instruction, stack: &Stack) -> Result<Value, EvalError> {
        let result = self.evaluate(instruction, stack)?;
        match result {
            Value::Effect(payload) => Err(EvalError::new(
                EvalErrorKind::UnhandledEffect,
                format!("unhandled effect: {payload}"),
            )),
            value => Ok(value),
        }
    }

    /// Evaluate one instruction. `Ok(Value::Effect(..))` is an effect in
    /// flight, not a success; callers inside the tree propagate it.
    pub fn evaluate(
        &mut self,
        instruction: &Instruction,
        stack: &Stack,
    ) -> Result<Value, EvalError> {
        if self.depth >= MAX_EVAL_DEPTH {
            return Err(EvalError::new(
                EvalErrorKind::DepthExceeded,
                "instruction tree too deep",
            ));
        }
        self.depth += 1;
        let result = self.evaluate_inner(instruction, stack);
        self.depth -= 1;
        result
    }

    fn evaluate_inner(
        &mut self,
        instruction: &Instruction,
        stack: &Stack,
    ) -> Result<Value, EvalError> {
        match instruction {
            Instruction::NoOp => Ok(Value::None),
            Instruction::Constant(value) => Ok(value.clone()),
            Instruction::FunctionCall { callee, arguments } => {
                self.checkpoint()?;
                let callee = propagate!(self.evaluate(callee, stack)?);
                let arguments = match propagate_all(self.evaluate_all(arguments, stack)?) {
                    Ok(values) => values,
                    Err(effect) => return Ok(effect),
                };
                self.call(callee, arguments)
            }
            Instruction::Dispatch {
                candidates,
                arguments,
            } => {
                self.checkpoint()?;
                let arguments = match propagate_all(self.evaluate_all(arguments, stack)?) {
                    Ok(values) => values,
                    Err(effect) => return Ok(effect),
                };
                let argument_types: Vec<_> = arguments.iter().map(to_type).collect();
                let winner = select_candidate(candidates, &argument_types)?;
                let callee = propagate!(self.evaluate(&candidates[winner].callee, stack)?);
                self.call(callee, arguments)
            }
            Instruction::Sequence(instructions) => {
                let mut last = Value::None;
                for instruction in instructions.iter() {
                    last = propagate!(self.evaluate(instruction, stack)?);
                }
                Ok(last)
            }
            Instruction::VariableGet { index } => {
                stack.get(*index as usize).ok_or_else(|| {
                    EvalError::invalid_address(format!("no slot {index} in current stack"))
                })
            }
            Instruction::VariableSet { index, value } => {
                let value = propagate!(self.evaluate(value, stack)?);
                if !stack.set(*index as usize, value.clone()) {
                    return Err(EvalError::invalid_address(format!(
                        "no slot {index} in current stack"
                    )));
                }
                Ok(value)
            }
            Instruction::FromImportedStack { import, inner } => {
                let imported = stack.import(*import as usize).ok_or_else(|| {
                    EvalError::invalid_address(format!("no imported stack {import}"))
                })?;
                self.evaluate(inner, imported)
            }
            Instruction::SetAddress { address, value } => {
                let value = propagate!(self.evaluate(value, stack)?);
                let (chain, slot) = address.split().ok_or_else(|| {
                    EvalError::invalid_address("empty variable address")
                })?;
                let mut target = stack;
                for &import in chain {
                    target = target.import(import as usize).ok_or_else(|| {
                        EvalError::invalid_address(format!("no imported stack {import}"))
                    })?;
                }
                if !target.set(slot as usize, value.clone()) {
                    return Err(EvalError::invalid_address(format!(
                        "no slot {slot} at addressed stack"
                    )));
                }
                Ok(value)
            }
            Instruction::ArmStack { function } => {
                let function = propagate!(self.evaluate(function, stack)?);
                match function {
                    Value::Function(template) => {
                        // Close over the current stack: it becomes the only
                        // import of the armed frame, so the body reaches
                        // definition-site variables through import 0.
                        let armed = template.stack.rebase(vec![stack.clone()]);
                        Ok(Value::function(armed, template.instruction.clone()))
                    }
                    other => Err(EvalError::type_mismatch(format!(
                        "arm-stack expects a function, got {other}"
                    ))),
                }
            }
            Instruction::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = propagate!(self.evaluate(condition, stack)?);
                match condition {
                    Value::Boolean(true) => self.evaluate(then_branch, stack),
                    Value::Boolean(false) => match else_branch {
                        Some(else_branch) => self.evaluate(else_branch, stack),
                        None => Ok(Value::None),
                    },
                    other => Err(EvalError::type_mismatch(format!(
                        "condition must be Boolean, got {other}"
                    ))),
                }
            }
            Instruction::While { condition, body } => {
                loop {
                    self.checkpoint()?;
                    let condition = propagate!(self.evaluate(condition, stack)?);
                    match condition {
                        Value::Boolean(true) => {
                            propagate!(self.evaluate(body, stack)?);
                        }
                        Value::Boolean(false) => return Ok(Value::None),
                        other => {
                            return Err(EvalError::type_mismatch(format!(
                                "condition must be Boolean, got {other}"
                            )));
                        }
                    }
                }
            }
            Instruction::DoUntil { condition, body } => {
                loop {
                    self.checkpoint()?;
                    propagate!(self.evaluate(body, stack)?);
                    let condition = propagate!(self.evaluate(condition, stack)?);
                    match condition {
                        Value::Boolean(true) => return Ok(Value::None),
                        Value::Boolean(false) => {}
                        other => {
                            return Err(EvalError::type_mismatch(format!(
                                "condition must be Boolean, got {other}"
                            )));
                        }
                    }
                }
            }
            Instruction::EmitEffect { value } => {
                let value = propagate!(self.evaluate(value, stack)?);
                Ok(Value::effect(value))
            }
            Instruction::HandleEffect { handler, body } => {
                let result = self.evaluate(body, stack)?;
                match result {
                    Value::Effect(payload) => {
                        let handler = propagate!(self.evaluate(handler, stack)?);
                        self.call(handler, vec![(*payload).clone()])
                    }
                    value => Ok(value),
                }
            }
            Instruction::BuildTuple { elements } => {
                match propagate_all(self.evaluate_all(elements, stack)?) {
                    Ok(values) => Ok(Value::array(values)),
                    Err(effect) => Ok(effect),
                }
            }
            Instruction::BuildList { elements } => {
                match propagate_all(self.evaluate_all(elements, stack)?) {
                    Ok(values) => Ok(Value::list(values)),
                    Err(effect) => Ok(effect),
                }
            }
            Instruction::BuildSet { elements } => {
                match propagate_all(self.evaluate_all(elements, stack)?) {
                    Ok(values) => Ok(Value::set(values)),
                    Err(effect) => Ok(effect),
                }
            }
            Instruction::BuildTable { entries } => {
                let mut table = Vec::with_capacity(entries.len());
                for (key, value) in entries.iter() {
                    let key = propagate!(self.evaluate(key, stack)?);
                    let value = propagate!(self.evaluate(value, stack)?);
                    table.push((key, value));
                }
                Ok(Value::table(table))
            }
            Instruction::BuildComposite { fields } => {
                let mut composite = Vec::with_capacity(fields.len());
                for (name, field) in fields.iter() {
                    let field = propagate!(self.evaluate(field, stack)?);
                    composite.push((name.clone(), field));
                }
                Ok(Value::composite(composite))
            }
            Instruction::AddInt(left, right) => {
                self.int_binary(left, right, stack, |a, b| Ok(a.wrapping_add(b)))
            }
            Instruction::SubInt(left, right) => {
                self.int_binary(left, right, stack, |a, b| Ok(a.wrapping_sub(b)))
            }
            Instruction::MulInt(left, right) => {
                self.int_binary(left, right, stack, |a, b| Ok(a.wrapping_mul(b)))
            }
            Instruction::DivInt(left, right) => self.int_binary(left, right, stack, |a, b| {
                if b == 0 {
                    Err(EvalError::domain("integer division by zero"))
                } else {
                    Ok(a.wrapping_div(b))
                }
            }),
            Instruction::ModInt(left, right) => self.int_binary(left, right, stack, |a, b| {
                if b == 0 {
                    Err(EvalError::domain("integer modulo by zero"))
                } else {
                    Ok(a.wrapping_rem(b))
                }
            }),
            Instruction::AddFloat(left, right) => {
                self.float_binary(left, right, stack, |a, b| a + b)
            }
            Instruction::SubFloat(left, right) => {
                self.float_binary(left, right, stack, |a, b| a - b)
            }
            Instruction::MulFloat(left, right) => {
                self.float_binary(left, right, stack, |a, b| a * b)
            }
            Instruction::DivFloat(left, right) => {
                self.float_binary(left, right, stack, |a, b| a / b)
            }
            Instruction::NegInt(operand) => {
                let operand = propagate!(self.evaluate(operand, stack)?);
                Ok(Value::Integer(int_operand(&operand)?.wrapping_neg()))
            }
            Instruction::NegFloat(operand) => {
                let operand = propagate!(self.evaluate(operand, stack)?);
                Ok(Value::Float(-float_operand(&operand)?))
            }
        }
    }

    /// Invoke a callable with already-evaluated arguments.
    pub fn call(&mut self, callee: Value, arguments: Vec<Value>) -> Result<Value, EvalError> {
        match callee {
            Value::Function(function) => {
                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(EvalError::new(
                        EvalErrorKind::DepthExceeded,
                        "call depth exceeded",
                    ));
                }
                // Fresh slots per activation; imports stay shared.
                let frame = function.stack.shallow_refresh();
                for (index, argument) in arguments.into_iter().enumerate() {
                    if !frame.set(index, argument) {
                        return Err(EvalError::invalid_address(format!(
                            "argument slot {index} missing in activation frame"
                        )));
                    }
                }
                self.call_depth += 1;
                let result = self.evaluate(&function.instruction, &frame);
                self.call_depth -= 1;
                result
            }
            Value::NativeFunction(native) => Ok(native(&arguments)),
            other => Err(EvalError::type_mismatch(format!(
                "value is not callable: {other}"
            ))),
        }
    }

    fn evaluate_all(
        &mut self,
        instructions: &[Instruction],
        stack: &Stack,
    ) -> Result<Evaluated, EvalError> {
        let mut values = Vec::with_capacity(instructions.len());
        for instruction in instructions {
            let value = self.evaluate(instruction, stack)?;
            if value.is_effect() {
                return Ok(Evaluated::Effect(value));
            }
            values.push(value);
        }
        Ok(Evaluated::Values(values))
    }

    /// Suspension point: cancellation and budgets.
    fn checkpoint(&self) -> Result<(), EvalError> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                trace!("evaluator cancelled at checkpoint");
                return Err(EvalError::new(
                    EvalErrorKind::Cancelled,
                    "cancelled by host",
                ));
            }
        }
        Ok(())
    }

    fn int_binary(
        &mut self,
        left: &Instruction,
        right: &Instruction,
        stack: &Stack,
        op: fn(i64, i64) -> Result<i64, EvalError>,
    ) -> Result<Value, EvalError> {
        let left = propagate!(self.evaluate(left, stack)?);
        let right = propagate!(self.evaluate(right, stack)?);
        Ok(Value::Integer(op(int_operand(&left)?, int_operand(&right)?)?))
    }

    fn float_binary(
        &mut self,
        left: &Instruction,
        right: &Instruction,
        stack: &Stack,
        op: fn(f64, f64) -> f64,
    ) -> Result<Value, EvalError> {
        let left = propagate!(self.evaluate(left, stack)?);
        let right = propagate!(self.evaluate(right, stack)?);
        Ok(Value::Float(op(float_operand(&left)?, float_operand(&right)?)))
    }
}

/// Result of evaluating an argument list: either all values, or the first
/// effect encountered (which aborts the rest).
enum Evaluated {
    Values(Vec<Value>),
    Effect(Value),
}

fn propagate_all(evaluated: Evaluated) -> Result<Vec<Value>, Value> {
    match evaluated {
        Evaluated::Values(values) => Ok(values),
        Evaluated::Effect(effect) => Err(effect),
    }
}

fn int_operand(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(EvalError::type_mismatch(format!(
            "expected an integer operand, got {other}"
        ))),
    }
}

fn float_operand(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Float(x) => Ok(*x),
        other => Err(EvalError::type_mismatch(format!(
            "expected a float operand, got {other}"
        ))),
    }
}
