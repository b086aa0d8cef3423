//! The quill compiler.
//!
//! Turns parsed `Expression` trees into typed `Statement`s against a
//! `Scope`, and lowers statements into the fixed-array `Instruction` form
//! the evaluator consumes:
//! - `compile`: name resolution across imported contexts, static overload
//!   narrowing, template expansion, lambda and lazy-variable handling
//! - `lower`: the mechanical statement-to-instruction pass
//! - `session`: a REPL-style driver pairing a module context with its
//!   runtime stack

pub mod compile;
pub mod lower;
pub mod session;

pub use compile::compile;
pub use lower::lower;
pub use session::{ProgramError, Session};

#[cfg(test)]
mod tests;
