//! Executable instructions.
//!
//! The lowered form of the statement tree: immutable, children in
//! fixed-length arrays so execution allocates nothing, and the arithmetic
//! opcodes promoted to top-level variants. Equality and hashing are
//! structural over all fields.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::types::Type;
use crate::value::Value;

/// Path from the current context to a variable slot: all but the last
/// index select imports in turn; the final index is the slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct VariableAddress(pub SmallVec<[u32; 4]>);

impl VariableAddress {
    pub fn new(indices: impl IntoIterator<Item = u32>) -> VariableAddress {
        VariableAddress(indices.into_iter().collect())
    }

    /// (import chain, slot index). `None` when the address is empty.
    pub fn split(&self) -> Option<(&[u32], u32)> {
        let (last, chain) = self.0.split_last()?;
        Some((chain, *last))
    }
}

/// An overload candidate: declared parameter types plus an instruction
/// that evaluates to the callable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DispatchCandidate {
    pub parameter_types: Box<[Rc<Type>]>,
    pub callee: Box<Instruction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    NoOp,
    Constant(Value),
    FunctionCall {
        callee: Box<Instruction>,
        arguments: Box<[Instruction]>,
    },
    Dispatch {
        candidates: Box<[DispatchCandidate]>,
        arguments: Box<[Instruction]>,
    },
    Sequence(Box<[Instruction]>),
    /// Direct slot read on the current stack.
    VariableGet {
        index: u32,
    },
    /// Evaluate, store, yield the stored value.
    VariableSet {
        index: u32,
        value: Box<Instruction>,
    },
    /// Evaluate `inner` against `imports[import]`; a strict lexical swap.
    FromImportedStack {
        import: u32,
        inner: Box<Instruction>,
    },
    /// Walk the address across imports and store into the final slot.
    SetAddress {
        address: VariableAddress,
        value: Box<Instruction>,
    },
    /// Re-capture: the resulting function closes over the current stack.
    ArmStack {
        function: Box<Instruction>,
    },
    If {
        condition: Box<Instruction>,
        then_branch: Box<Instruction>,
        else_branch: Option<Box<Instruction>>,
    },
    While {
        condition: Box<Instruction>,
        body: Box<Instruction>,
    },
    /// Body once, then repeat until the condition turns true.
    DoUntil {
        condition: Box<Instruction>,
        body: Box<Instruction>,
    },
    /// Wrap the payload in an `Effect` and unwind.
    EmitEffect {
        value: Box<Instruction>,
    },
    HandleEffect {
        handler: Box<Instruction>,
        body: Box<Instruction>,
    },
    BuildTuple {
        elements: Box<[Instruction]>,
    },
    BuildList {
        elements: Box<[Instruction]>,
    },
    BuildSet {
        elements: Box<[Instruction]>,
    },
    /// Each pair evaluates key first.
    BuildTable {
        entries: Box<[(Instruction, Instruction)]>,
    },
    /// Field names fixed at compile time.
    BuildComposite {
        fields: Box<[(String, Instruction)]>,
    },
    // Arithmetic, promoted from the statement-level opcode wrappers.
    // Integers wrap two's-complement; floats follow IEEE-754; integer
    // division by zero is a domain error.
    AddInt(Box<Instruction>, Box<Instruction>),
    SubInt(Box<Instruction>, Box<Instruction>),
    MulInt(Box<Instruction>, Box<Instruction>),
    DivInt(Box<Instruction>, Box<Instruction>),
    ModInt(Box<Instruction>, Box<Instruction>),
    AddFloat(Box<Instruction>, Box<Instruction>),
    SubFloat(Box<Instruction>, Box<Instruction>),
    MulFloat(Box<Instruction>, Box<Instruction>),
    DivFloat(Box<Instruction>, Box<Instruction>),
    NegInt(Box<Instruction>),
    NegFloat(Box<Instruction>),
}

impl Instruction {
    pub fn constant(value: Value) -> Instruction {
        Instruction::Constant(value)
    }

    pub fn sequence(instructions: Vec<Instruction>) -> Instruction {
        Instruction::Sequence(instructions.into_boxed_slice())
    }
}
