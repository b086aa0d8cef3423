//! Centralized limits and thresholds for the quill runtime.
//!
//! This module provides shared constants for recursion depths and capacity
//! limits used throughout the codebase. Centralizing these values:
//! - Prevents duplicate definitions with inconsistent values
//! - Makes it easy to tune limits for different environments
//! - Documents the rationale for each limit

/// Maximum instruction-tree recursion depth in the evaluator.
///
/// Every nested sub-instruction evaluation adds a frame to the host call
/// stack; at this depth the evaluator bails out with
/// `EvalErrorKind::DepthExceeded` instead of overflowing it. Deeply nested
/// expression trees and recursive calls both count (each activation walks
/// its body through the same recursion).
pub const MAX_EVAL_DEPTH: u32 = 1_000;

/// Maximum nesting of `FunctionCall`/`Dispatch` activations.
///
/// Bounds runaway recursion in user programs (a function calling itself
/// without a base case) independently of how shallow each body is.
pub const MAX_CALL_DEPTH: u32 = 500;
