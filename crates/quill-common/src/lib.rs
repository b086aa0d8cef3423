//! Common types and utilities for the quill runtime core.
//!
//! This crate provides foundational types used across all quill crates:
//! - Error taxonomy (`CompileError`, `EvalError`)
//! - Centralized limits and thresholds

// Error taxonomy shared by the compiler and the evaluator
pub mod diagnostics;
pub use diagnostics::{CompileError, CompileErrorKind, EvalError, EvalErrorKind};

// Centralized limits and thresholds
pub mod limits;
