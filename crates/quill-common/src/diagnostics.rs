//! Error taxonomy for the quill core.
//!
//! Two error families cover the whole pipeline:
//! - `CompileError`: the compiler rejects an expression (unresolved name,
//!   no overload satisfies the call-site types, bad annotation, ...).
//!   Surfaced synchronously to the caller of the compiler entry point.
//! - `EvalError`: the evaluator fails at run time (arithmetic domain
//!   failure, invalid address, dispatch failure, budget exhaustion).
//!
//! Effects are not errors: an emitted effect unwinds to the nearest handler
//! as a value. Only an effect that reaches the top of the evaluator is
//! reported here, as `EvalErrorKind::UnhandledEffect`.

use std::fmt;

/// The kind of a compile-time failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// An identifier did not resolve to any visible variable.
    UnresolvedName,
    /// No overload candidate survived call-site type narrowing.
    NoOverloadFound,
    /// The callee of a call is not a function value.
    NotCallable,
    /// A static type check failed (condition not Boolean, assignment of an
    /// incompatible value, ...).
    TypeMismatch,
    /// A lazy variable was re-entered while its initializer was running.
    CyclicLazyInit,
    /// A type annotation did not const-evaluate to a `Type` value.
    InvalidAnnotation,
    /// Compile-time evaluation (lazy initializer, template expansion) failed.
    EvaluationFailed,
}

/// A compile-time error with a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            message: message.into(),
        }
    }

    pub fn unresolved_name(name: &str) -> Self {
        Self::new(
            CompileErrorKind::UnresolvedName,
            format!("unresolved name `{name}`"),
        )
    }

    pub fn no_overload(name: &str, detail: impl Into<String>) -> Self {
        Self::new(
            CompileErrorKind::NoOverloadFound,
            format!("no overload of `{name}` matches: {}", detail.into()),
        )
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compile error ({:?}): {}", self.kind, self.message)
    }
}

impl std::error::Error for CompileError {}

/// The kind of a run-time failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Arithmetic domain failure (integer division by zero).
    Domain,
    /// An operand or condition had the wrong runtime kind.
    TypeMismatch,
    /// Runtime dispatch found no acceptable candidate, or the ranking was
    /// ambiguous between incomparable candidates.
    NoOverloadFound,
    /// A stack slot or import index was out of range.
    InvalidAddress,
    /// Evaluation exceeded the configured recursion depth.
    DepthExceeded,
    /// The host cancellation flag was raised at a suspension point.
    Cancelled,
    /// An emitted effect reached the top of the evaluator unhandled.
    UnhandledEffect,
}

/// A run-time error with a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::Domain, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::TypeMismatch, message)
    }

    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::InvalidAddress, message)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evaluation error ({:?}): {}", self.kind, self.message)
    }
}

impl std::error::Error for EvalError {}
