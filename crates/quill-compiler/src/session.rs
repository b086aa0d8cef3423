//! A REPL-style compile-and-evaluate driver.
//!
//! A `Session` pairs a module context (importing the standard primitives)
//! with its runtime stack, compiling one expression at a time and
//! evaluating the lowered result. The module stack grows as definitions
//! accumulate; activation frames stay fixed.

use std::fmt;
use std::rc::Rc;

use quill_common::diagnostics::{CompileError, EvalError};
use quill_core::expression::Expression;
use quill_core::scope::{Context, Scope};
use quill_core::stack::Stack;
use quill_core::statement::Statement;
use quill_core::value::Value;
use quill_runtime::eval::Evaluator;
use quill_runtime::primitives::standard_context;

use crate::compile::compile;
use crate::lower::lower;

/// A failure from either pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramError {
    Compile(CompileError),
    Eval(EvalError),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::Compile(error) => write!(f, "{error}"),
            ProgramError::Eval(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for ProgramError {}

impl From<CompileError> for ProgramError {
    fn from(error: CompileError) -> Self {
        ProgramError::Compile(error)
    }
}

impl From<EvalError> for ProgramError {
    fn from(error: EvalError) -> Self {
        ProgramError::Eval(error)
    }
}

pub struct Session {
    module_context: Rc<Context>,
    module_stack: Stack,
    evaluator: Evaluator,
}

impl Session {
    /// A fresh module importing the standard primitives.
    pub fn new() -> Session {
        let (prelude_context, prelude_stack) = standard_context();
        let module_context = Context::new(vec![prelude_context]);
        let module_stack = Stack::new(vec![prelude_stack], 0);
        module_context.attach_stack(module_stack.clone());
        Session {
            module_context,
            module_stack,
            evaluator: Evaluator::new(),
        }
    }

    pub fn scope(&self) -> Rc<Scope> {
        self.module_context.top_scope()
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.module_context
    }

    pub fn compile(&self, expression: &Expression) -> Result<Statement, CompileError> {
        compile(expression, &self.scope())
    }

    /// Compile, lower and evaluate one expression against the module.
    pub fn eval(&mut self, expression: &Expression) -> Result<Value, ProgramError> {
        let statement = self.compile(expression)?;
        let instruction = lower(&statement);
        // Definitions may have grown the module frame.
        self.module_stack.ensure_size(self.module_context.slot_count());
        let value = self.evaluator.run(&instruction, &self.module_stack)?;
        Ok(value)
    }

    /// Evaluate a whole program; the result is the last expression's value.
    pub fn eval_program(&mut self, expressions: &[Expression]) -> Result<Value, ProgramError> {
        let mut last = Value::None;
        for expression in expressions {
            last = self.eval(expression)?;
        }
        Ok(last)
    }
}
