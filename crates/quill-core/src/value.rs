//! The unified runtime value representation.
//!
//! `Value` is a tagged union over `ValueKind`. Primitives pack their payload
//! directly into the payload word; everything else stores one owned
//! reference to a heap object, so a `Value` always fits in two machine
//! words (one tag word + one payload word).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::expression::Expression;
use crate::instruction::Instruction;
use crate::scope::Scope;
use crate::stack::Stack;
use crate::statement::Statement;
use crate::types::{Properties, Type};

/// A host-native callable. Non-owning: plain function pointer.
pub type NativeFn = fn(&[Value]) -> Value;

/// A bytecode closure: a template stack plus an immutable instruction tree.
///
/// The stack is a template: each call shallow-refreshes it so recursive
/// calls do not clobber outer frames. Its imports are shared by pointer,
/// which is what makes module-level variable mutation observable.
#[derive(Clone)]
pub struct FunctionValue {
    pub stack: Stack,
    pub instruction: Rc<Instruction>,
}

/// A value annotated with a runtime property bag.
#[derive(Clone)]
pub struct PropertyRef {
    pub properties: Properties,
    pub value: Value,
}

/// Discriminant of a `Value`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    None,
    Integer,
    Unsigned,
    Float,
    Boolean,
    List,
    String,
    Array,
    Reference,
    Composite,
    PropertyReference,
    Type,
    NativeFunction,
    Function,
    Effect,
    Set,
    Table,
    Expression,
    Statement,
    Scope,
}

/// A runtime datum.
///
/// Equality and hashing are structural for every variant except
/// `Reference`, `Function` and `Scope`, which use pointer identity (the
/// cycle-breakers; see `equality.rs`). Floats compare bit-exactly so the
/// derived relations stay reflexive.
#[derive(Clone)]
pub enum Value {
    /// The unit datum.
    None,
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    /// Growable ordered sequence.
    List(Rc<RefCell<Vec<Value>>>),
    /// Mutable text. Byte-sequence equality.
    String(Rc<RefCell<String>>),
    /// Fixed-length tuple-like sequence; never grown after construction.
    Array(Rc<Vec<Value>>),
    /// Exactly one mutable cell. Identity equality.
    Reference(Rc<RefCell<Value>>),
    /// Mapping from short names to values; lexicographic field order.
    Composite(Rc<RefCell<BTreeMap<String, Value>>>),
    /// A value annotated with a runtime `Properties` bag.
    PropertyReference(Rc<PropertyRef>),
    /// A first-class type.
    Type(Rc<Type>),
    NativeFunction(NativeFn),
    /// Closure. Identity equality.
    Function(Rc<FunctionValue>),
    /// An in-flight effect unwinding towards a handler.
    Effect(Rc<Value>),
    Set(Rc<RefCell<FxHashSet<Value>>>),
    Table(Rc<RefCell<FxHashMap<Value, Value>>>),
    /// A parsed expression carried as a first-class value.
    Expression(Rc<Expression>),
    /// A typed statement carried as a first-class value.
    Statement(Rc<Statement>),
    /// A compile-time scope carried as a first-class value. Identity equality.
    Scope(Rc<Scope>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Integer(_) => ValueKind::Integer,
            Value::Unsigned(_) => ValueKind::Unsigned,
            Value::Float(_) => ValueKind::Float,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::List(_) => ValueKind::List,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Reference(_) => ValueKind::Reference,
            Value::Composite(_) => ValueKind::Composite,
            Value::PropertyReference(_) => ValueKind::PropertyReference,
            Value::Type(_) => ValueKind::Type,
            Value::NativeFunction(_) => ValueKind::NativeFunction,
            Value::Function(_) => ValueKind::Function,
            Value::Effect(_) => ValueKind::Effect,
            Value::Set(_) => ValueKind::Set,
            Value::Table(_) => ValueKind::Table,
            Value::Expression(_) => ValueKind::Expression,
            Value::Statement(_) => ValueKind::Statement,
            Value::Scope(_) => ValueKind::Scope,
        }
    }

    pub fn is_effect(&self) -> bool {
        matches!(self, Value::Effect(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::NativeFunction(_))
    }

    // ------------------------------------------------------------------
    // Constructors (the `toValue` family)
    // ------------------------------------------------------------------

    pub fn list(values: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn string(text: impl Into<String>) -> Value {
        Value::String(Rc::new(RefCell::new(text.into())))
    }

    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(values))
    }

    pub fn reference(value: Value) -> Value {
        Value::Reference(Rc::new(RefCell::new(value)))
    }

    pub fn composite(fields: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Composite(Rc::new(RefCell::new(fields.into_iter().collect())))
    }

    pub fn with_properties(properties: Properties, value: Value) -> Value {
        Value::PropertyReference(Rc::new(PropertyRef { properties, value }))
    }

    pub fn of_type(ty: Type) -> Value {
        Value::Type(Rc::new(ty))
    }

    pub fn function(stack: Stack, instruction: Rc<Instruction>) -> Value {
        Value::Function(Rc::new(FunctionValue { stack, instruction }))
    }

    pub fn effect(value: Value) -> Value {
        Value::Effect(Rc::new(value))
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(Rc::new(RefCell::new(values.into_iter().collect())))
    }

    pub fn table(entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        Value::Table(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    pub fn expression(expression: Expression) -> Value {
        Value::Expression(Rc::new(expression))
    }

    pub fn statement(statement: Statement) -> Value {
        Value::Statement(Rc::new(statement))
    }

    /// Unwrap nested property annotations down to the underlying value.
    pub fn strip_properties(&self) -> &Value {
        let mut value = self;
        while let Value::PropertyReference(inner) = value {
            value = &inner.value;
        }
        value
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Unsigned(u) => write!(f, "{u}u"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::String(s) => write!(f, "{:?}", s.borrow()),
            Value::Array(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            // Shallow on purpose: reference cells may be cyclic.
            Value::Reference(cell) => write!(f, "ref@{:p}", Rc::as_ptr(cell)),
            Value::Composite(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::PropertyReference(inner) => write!(f, "{}", inner.value),
            Value::Type(ty) => write!(f, "{ty}"),
            Value::NativeFunction(_) => write!(f, "<native>"),
            Value::Function(func) => write!(f, "<function@{:p}>", Rc::as_ptr(func)),
            Value::Effect(inner) => write!(f, "effect({inner})"),
            Value::Set(items) => {
                write!(f, "#{{")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Value::Table(entries) => {
                write!(f, "#[")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "]")
            }
            Value::Expression(_) => write!(f, "<expression>"),
            Value::Statement(_) => write!(f, "<statement>"),
            Value::Scope(scope) => write!(f, "<scope@{:p}>", Rc::as_ptr(scope)),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The `$` debug printer doubles as Debug; a derived impl would
        // recurse into reference cycles.
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod size_tests {
    use super::Value;

    #[test]
    fn value_fits_in_two_machine_words() {
        assert!(std::mem::size_of::<Value>() <= 2 * std::mem::size_of::<usize>());
    }
}
