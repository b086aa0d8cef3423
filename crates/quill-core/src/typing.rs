//! Deriving types from values and testing values against types.
//!
//! `to_type` produces the tightest concrete type describing a value;
//! `check_type` mirrors the match relation over a value instead of a type.

use std::rc::Rc;

use crate::relate::{common_type, type_match};
use crate::types::{Type, TypeData};
use crate::value::Value;

/// The tightest concrete type describing `value`.
///
/// Collection element types are the join (`common_type`) of the element
/// types, `Any` when empty. Property annotations on the value surface as
/// properties on the derived type, which is what `WithProperty` matching
/// inspects. Callables derive an unconstrained function type; signatures
/// live on variables, not on runtime values.
pub fn to_type(value: &Value) -> Type {
    match value {
        Value::None => Type::none_value(),
        Value::Integer(_) => Type::integer(),
        Value::Unsigned(_) => Type::unsigned(),
        Value::Float(_) => Type::float(),
        Value::Boolean(_) => Type::boolean(),
        Value::List(items) => Type::list(join_types(items.borrow().iter())),
        Value::String(_) => Type::string(),
        Value::Array(items) => {
            Type::tuple(items.iter().map(|item| Rc::new(to_type(item))).collect())
        }
        Value::Reference(cell) => Type::reference(Rc::new(to_type(&cell.borrow()))),
        Value::Composite(fields) => Type::composite(
            fields
                .borrow()
                .iter()
                .map(|(name, field)| (name.clone(), Rc::new(to_type(field)))),
        ),
        Value::PropertyReference(inner) => {
            let mut derived = to_type(&inner.value);
            derived.properties.merge(&inner.properties);
            derived
        }
        Value::Type(inner) => Type::type_of(Some(inner.clone())),
        Value::NativeFunction(_) | Value::Function(_) => unconstrained_function(),
        // Effects are transient control tokens; describe the payload.
        Value::Effect(inner) => to_type(inner),
        Value::Set(items) => Type::set(join_types(items.borrow().iter())),
        Value::Table(entries) => {
            let entries = entries.borrow();
            Type::table(
                join_types(entries.keys()),
                join_types(entries.values()),
            )
        }
        Value::Expression(_) => Type::expression(),
        Value::Statement(_) => Type::statement(),
        Value::Scope(_) => Type::scope(),
    }
}

pub fn to_type_rc(value: &Value) -> Rc<Type> {
    Rc::new(to_type(value))
}

fn join_types<'a>(values: impl Iterator<Item = &'a Value>) -> Rc<Type> {
    let mut joined: Option<Rc<Type>> = None;
    for value in values {
        let ty = Rc::new(to_type(value));
        joined = Some(match joined {
            Some(current) => common_type(&current, &ty),
            None => ty,
        });
    }
    joined.unwrap_or_else(|| Rc::new(Type::any()))
}

fn unconstrained_function() -> Type {
    Type::function(
        crate::types::TupleType {
            elements: Vec::new(),
            varargs: Some(Rc::new(Type::any())),
        },
        Rc::new(Type::any()),
    )
}

/// Does `value` inhabit `ty`?
///
/// Concrete collection types recurse element-wise; a function type only
/// requires the value to be callable; typeclasses fold over the value.
/// Every tag on `ty` with a value matcher must also accept the value.
pub fn check_type(value: &Value, ty: &Type) -> bool {
    for property in ty.properties.iter() {
        if let Some(predicate) = property.tag.value_matcher() {
            if !predicate(value, &property.arguments) {
                return false;
            }
        }
    }
    check_data(value, ty)
}

fn check_data(value: &Value, ty: &Type) -> bool {
    match &ty.data {
        TypeData::Any => true,
        TypeData::None => false,
        TypeData::Union(operands) => operands.iter().any(|operand| check_type(value, operand)),
        TypeData::Intersection(operands) => {
            operands.iter().all(|operand| check_type(value, operand))
        }
        TypeData::Not(inner) => !check_type(value, inner),
        TypeData::BaseType(kind) => to_type(value).kind() == *kind,
        TypeData::WithProperty(wp) => {
            to_type(value).properties.has(&wp.tag) && check_type(value, &wp.inner)
        }
        TypeData::CustomMatcher(cm) => match cm.value_matcher {
            Some(predicate) => predicate(value),
            None => false,
        },
        _ => check_concrete(value.strip_properties(), ty),
    }
}

/// `ty` is of concrete kind here; property annotations on the value have
/// been stripped (they only matter to `WithProperty` above).
fn check_concrete(value: &Value, ty: &Type) -> bool {
    match (&ty.data, value) {
        (TypeData::NoneValue, Value::None) => true,
        (TypeData::Integer, Value::Integer(_)) => true,
        (TypeData::Unsigned, Value::Unsigned(_)) => true,
        (TypeData::Float, Value::Float(_)) => true,
        (TypeData::Boolean, Value::Boolean(_)) => true,
        (TypeData::String, Value::String(_)) => true,
        (TypeData::Expression, Value::Expression(_)) => true,
        (TypeData::Statement, Value::Statement(_)) => true,
        (TypeData::Scope, Value::Scope(_)) => true,
        // Callability only; the signature is not enforced here.
        (TypeData::Function(_), value) => value.is_callable(),
        (TypeData::List(element), Value::List(items)) => {
            items.borrow().iter().all(|item| check_type(item, element))
        }
        (TypeData::Set(element), Value::Set(items)) => {
            items.borrow().iter().all(|item| check_type(item, element))
        }
        (TypeData::Table(table), Value::Table(entries)) => entries
            .borrow()
            .iter()
            .all(|(key, val)| check_type(key, &table.key) && check_type(val, &table.value)),
        (TypeData::Reference(inner), Value::Reference(cell)) => {
            check_type(&cell.borrow(), inner)
        }
        (TypeData::Tuple(tuple), Value::Array(items)) => match &tuple.varargs {
            None => {
                items.len() == tuple.elements.len()
                    && items
                        .iter()
                        .zip(&tuple.elements)
                        .all(|(item, element)| check_type(item, element))
            }
            Some(tail) => {
                let fixed = tuple.elements.len();
                items.len() >= fixed
                    && items[..fixed]
                        .iter()
                        .zip(&tuple.elements)
                        .all(|(item, element)| check_type(item, element))
                    && items[fixed..].iter().all(|item| check_type(item, tail))
            }
        },
        (TypeData::Composite(composite), Value::Composite(fields)) => {
            let fields = fields.borrow();
            fields.len() == composite.fields.len()
                && composite.fields.iter().all(|(name, field_ty)| {
                    fields
                        .get(name)
                        .is_some_and(|field| check_type(field, field_ty))
                })
        }
        (TypeData::Type(inner), Value::Type(described)) => match inner {
            Some(inner) => type_match(inner, described).matches(),
            None => true,
        },
        _ => false,
    }
}
