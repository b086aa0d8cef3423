//! Core data model for the quill runtime.
//!
//! This crate defines the mutually recursive trees at the center of the
//! system and the relations over them:
//! - `Value`: the unified runtime datum (primitives, collections,
//!   references, composites, first-class types, functions, effects)
//! - `Type`: algebraic descriptions of sets of values, with property bags
//! - `Property`/`PropertyTag`: user-extensible predicates on types/values
//! - The `TypeMatch` lattice: the ordered match relation used for
//!   subtyping, overload ranking and structural checks
//! - `to_type`/`check_type`: deriving types from values and testing values
//!   against types
//! - `Stack`: the per-activation record with imported stacks
//! - `Expression`/`Statement`/`Instruction`: the parsed, typed and lowered
//!   program trees
//! - `Context`/`Scope`/`Variable`: the lexical binding model
//!
//! Equality and hashing over `Value` are structural except for `Reference`,
//! `Function` and `Scope`, which compare by identity; that is the sole
//! cycle-breaker in the object graph.

pub mod expression;
pub mod instruction;
pub mod relate;
pub mod scope;
pub mod stack;
pub mod statement;
pub mod typing;
pub mod types;
pub mod value;

mod equality;

pub use expression::{Expression, LambdaExpression, Parameter};
pub use instruction::{DispatchCandidate, Instruction, VariableAddress};
pub use relate::{TypeBound, TypeMatch, Variance, common_type, compare, reduce_matches, type_match};
pub use scope::{Context, LazyState, ResolvedVariable, Scope, Variable};
pub use stack::Stack;
pub use statement::{
    BinaryInstructionKind, Statement, StatementCandidate, StatementKind, UnaryInstructionKind,
};
pub use types::{
    CompositeType, CustomMatcherType, FunctionType, Properties, Property, PropertyTag, TableType,
    TupleType, Type, TypeData, TypeKind, WithPropertyType, template_tag, typed_template_tag,
};
pub use typing::{check_type, to_type, to_type_rc};
pub use value::{FunctionValue, NativeFn, PropertyRef, Value, ValueKind};

#[cfg(test)]
mod tests;
