//! Structural equality and hashing for `Value` and `Type`.
//!
//! The object graph is potentially cyclic through `Reference` cells,
//! closures (a `Function` references a stack that may hold the function)
//! and scopes. Those three variants compare and hash by pointer identity;
//! every other variant recurses structurally, which is safe because the
//! data model keeps the rest of the graph acyclic.
//!
//! Invariants kept here:
//! - `a == b` implies `hash(a) == hash(b)` for both `Value` and `Type`
//! - floats compare bit-exactly, so equality stays reflexive and `Value`
//!   can key sets and tables
//! - absent optional subfields hash to a fixed sentinel distinct from any
//!   present subfield

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::types::{Type, TypeData};
use crate::value::Value;

/// Hash sentinel for absent optional subfields.
const NIL_HASH: u64 = 0x6e69_6c00;

// =============================================================================
// Value
// =============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Unsigned(a), Value::Unsigned(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::String(a), Value::String(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || a == b,
            // Identity: the sole cycle-breaker for reference cells.
            (Value::Reference(a), Value::Reference(b)) => Rc::ptr_eq(a, b),
            (Value::Composite(a), Value::Composite(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::PropertyReference(a), Value::PropertyReference(b)) => {
                Rc::ptr_eq(a, b) || (a.properties == b.properties && a.value == b.value)
            }
            (Value::Type(a), Value::Type(b)) => type_rc_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => std::ptr::fn_addr_eq(*a, *b),
            // Identity: closures reference their enclosing stack.
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Effect(a), Value::Effect(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Expression(a), Value::Expression(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Statement(a), Value::Statement(b)) => Rc::ptr_eq(a, b) || a == b,
            // Identity: scopes chain back into their context.
            (Value::Scope(a), Value::Scope(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Value::None => {}
            Value::Integer(i) => i.hash(state),
            Value::Unsigned(u) => u.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::List(items) => {
                for item in items.borrow().iter() {
                    item.hash(state);
                }
            }
            Value::String(s) => s.borrow().hash(state),
            Value::Array(items) => {
                for item in items.iter() {
                    item.hash(state);
                }
            }
            Value::Reference(cell) => (Rc::as_ptr(cell) as usize).hash(state),
            Value::Composite(fields) => {
                // BTreeMap iteration is ordered, so this is deterministic.
                for (name, value) in fields.borrow().iter() {
                    name.hash(state);
                    value.hash(state);
                }
            }
            Value::PropertyReference(inner) => {
                inner.properties.hash(state);
                inner.value.hash(state);
            }
            Value::Type(ty) => ty.hash(state),
            Value::NativeFunction(f) => (*f as usize).hash(state),
            Value::Function(func) => (Rc::as_ptr(func) as usize).hash(state),
            Value::Effect(inner) => inner.hash(state),
            Value::Set(items) => {
                unordered_hash(items.borrow().iter(), state);
            }
            Value::Table(entries) => {
                unordered_hash(entries.borrow().iter(), state);
            }
            Value::Expression(expression) => expression.hash(state),
            Value::Statement(statement) => statement.hash(state),
            Value::Scope(scope) => (Rc::as_ptr(scope) as usize).hash(state),
        }
    }
}

/// Order-independent hash fold for sets and tables.
fn unordered_hash<T: Hash, H: Hasher>(items: impl Iterator<Item = T>, state: &mut H) {
    let mut combined = 0u64;
    for item in items {
        let mut entry = rustc_hash::FxHasher::default();
        item.hash(&mut entry);
        combined = combined.wrapping_add(entry.finish());
    }
    combined.hash(state);
}

// =============================================================================
// Type
// =============================================================================

/// Pointer identity short-circuits payload comparison; ill-formed cyclic
/// types therefore cannot hang the fast path on themselves.
fn type_rc_eq(a: &Rc<Type>, b: &Rc<Type>) -> bool {
    Rc::ptr_eq(a, b) || a == b
}

fn type_option_eq(a: &Option<Rc<Type>>, b: &Option<Rc<Type>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => type_rc_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn type_list_eq(a: &[Rc<Type>], b: &[Rc<Type>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| type_rc_eq(x, y))
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        type_data_eq(&self.data, &other.data) && self.properties == other.properties
    }
}

fn type_data_eq(a: &TypeData, b: &TypeData) -> bool {
    match (a, b) {
        (TypeData::NoneValue, TypeData::NoneValue)
        | (TypeData::Integer, TypeData::Integer)
        | (TypeData::Unsigned, TypeData::Unsigned)
        | (TypeData::Float, TypeData::Float)
        | (TypeData::Boolean, TypeData::Boolean)
        | (TypeData::String, TypeData::String)
        | (TypeData::Expression, TypeData::Expression)
        | (TypeData::Statement, TypeData::Statement)
        | (TypeData::Scope, TypeData::Scope)
        | (TypeData::Any, TypeData::Any)
        | (TypeData::None, TypeData::None) => true,
        (TypeData::Function(x), TypeData::Function(y)) => {
            type_rc_eq(&x.arguments, &y.arguments) && type_rc_eq(&x.return_type, &y.return_type)
        }
        (TypeData::Tuple(x), TypeData::Tuple(y)) => {
            type_list_eq(&x.elements, &y.elements) && type_option_eq(&x.varargs, &y.varargs)
        }
        (TypeData::Reference(x), TypeData::Reference(y))
        | (TypeData::List(x), TypeData::List(y))
        | (TypeData::Set(x), TypeData::Set(y)) => type_rc_eq(x, y),
        (TypeData::Table(x), TypeData::Table(y)) => {
            type_rc_eq(&x.key, &y.key) && type_rc_eq(&x.value, &y.value)
        }
        (TypeData::Composite(x), TypeData::Composite(y)) => {
            x.fields.len() == y.fields.len()
                && x.fields.iter().zip(y.fields.iter()).all(
                    |((name_x, field_x), (name_y, field_y))| {
                        name_x == name_y && type_rc_eq(field_x, field_y)
                    },
                )
        }
        (TypeData::Type(x), TypeData::Type(y)) => type_option_eq(x, y),
        (TypeData::Union(x), TypeData::Union(y))
        | (TypeData::Intersection(x), TypeData::Intersection(y)) => type_list_eq(x, y),
        (TypeData::Not(x), TypeData::Not(y)) => type_rc_eq(x, y),
        (TypeData::BaseType(x), TypeData::BaseType(y)) => x == y,
        (TypeData::WithProperty(x), TypeData::WithProperty(y)) => {
            x.tag == y.tag && type_rc_eq(&x.inner, &y.inner)
        }
        (TypeData::CustomMatcher(x), TypeData::CustomMatcher(y)) => {
            matcher_fn_eq(x.type_matcher, y.type_matcher)
                && matcher_fn_eq(x.value_matcher, y.value_matcher)
        }
        _ => false,
    }
}

fn matcher_fn_eq<T: ?Sized, R>(a: Option<fn(&T) -> R>, b: Option<fn(&T) -> R>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => std::ptr::fn_addr_eq(x, y),
        (None, None) => true,
        _ => false,
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        hash_type_data(&self.data, state);
        self.properties.hash(state);
    }
}

fn hash_type_option<H: Hasher>(ty: &Option<Rc<Type>>, state: &mut H) {
    match ty {
        Some(inner) => inner.hash(state),
        None => NIL_HASH.hash(state),
    }
}

fn hash_type_data<H: Hasher>(data: &TypeData, state: &mut H) {
    match data {
        TypeData::NoneValue
        | TypeData::Integer
        | TypeData::Unsigned
        | TypeData::Float
        | TypeData::Boolean
        | TypeData::String
        | TypeData::Expression
        | TypeData::Statement
        | TypeData::Scope
        | TypeData::Any
        | TypeData::None => {}
        TypeData::Function(func) => {
            func.arguments.hash(state);
            func.return_type.hash(state);
        }
        TypeData::Tuple(tuple) => {
            for element in &tuple.elements {
                element.hash(state);
            }
            hash_type_option(&tuple.varargs, state);
        }
        TypeData::Reference(inner) | TypeData::List(inner) | TypeData::Set(inner) => {
            inner.hash(state);
        }
        TypeData::Table(table) => {
            table.key.hash(state);
            table.value.hash(state);
        }
        TypeData::Composite(composite) => {
            for (name, field) in &composite.fields {
                name.hash(state);
                field.hash(state);
            }
        }
        TypeData::Type(inner) => hash_type_option(inner, state),
        TypeData::Union(operands) | TypeData::Intersection(operands) => {
            for operand in operands {
                operand.hash(state);
            }
        }
        TypeData::Not(inner) => inner.hash(state),
        TypeData::BaseType(kind) => kind.hash(state),
        TypeData::WithProperty(wp) => {
            wp.tag.hash(state);
            wp.inner.hash(state);
        }
        TypeData::CustomMatcher(cm) => {
            match cm.type_matcher {
                Some(f) => (f as usize).hash(state),
                None => NIL_HASH.hash(state),
            }
            match cm.value_matcher {
                Some(f) => (f as usize).hash(state),
                None => NIL_HASH.hash(state),
            }
        }
    }
}
