//! Tests for `to_type` derivation and `check_type`.

use std::rc::Rc;

use crate::relate::TypeMatch;
use crate::types::{Properties, PropertyTag, Type, TypeKind};
use crate::typing::{check_type, to_type};
use crate::value::Value;

// =============================================================================
// Round trip: check_type(v, to_type(v))
// =============================================================================

#[test]
fn test_law_roundtrip_value_type_check() {
    let values = vec![
        Value::None,
        Value::Integer(-3),
        Value::Unsigned(3),
        Value::Float(2.25),
        Value::Boolean(false),
        Value::string("xyz"),
        Value::list(vec![Value::Integer(1), Value::Integer(2)]),
        Value::array(vec![Value::Integer(1), Value::string("s")]),
        Value::reference(Value::Float(1.0)),
        Value::composite([("a".to_string(), Value::Integer(1))]),
        Value::of_type(Type::boolean()),
        Value::set([Value::Integer(1)]),
        Value::table([(Value::string("k"), Value::Integer(1))]),
    ];
    for value in values {
        let derived = to_type(&value);
        assert!(
            check_type(&value, &derived),
            "round trip failed for {value}: derived {derived}"
        );
    }
}

// =============================================================================
// Derivation shape
// =============================================================================

#[test]
fn test_to_type_kinds() {
    assert_eq!(to_type(&Value::Integer(1)).kind(), TypeKind::Integer);
    assert_eq!(to_type(&Value::Float(1.0)).kind(), TypeKind::Float);
    assert_eq!(to_type(&Value::string("a")).kind(), TypeKind::String);
    assert_eq!(
        to_type(&Value::array(vec![Value::Integer(1)])).kind(),
        TypeKind::Tuple
    );
    assert_eq!(
        to_type(&Value::list(vec![Value::Integer(1)])).kind(),
        TypeKind::List
    );
}

#[test]
fn test_to_type_homogeneous_list_keeps_element_type() {
    let list = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
    let derived = to_type(&list);
    let expected = Type::list(Rc::new(Type::integer()));
    assert_eq!(derived, expected);
}

#[test]
fn test_to_type_mixed_list_joins_elements() {
    let list = Value::list(vec![Value::Integer(1), Value::Float(2.0)]);
    let derived = to_type(&list);
    match &derived.data {
        crate::types::TypeData::List(element) => {
            assert_eq!(element.kind(), TypeKind::Union);
        }
        other => panic!("expected a list type, got {other:?}"),
    }
}

#[test]
fn test_to_type_empty_list_is_list_of_any() {
    let derived = to_type(&Value::list(Vec::new()));
    assert_eq!(derived, Type::list(Rc::new(Type::any())));
}

#[test]
fn test_to_type_callables_are_functions() {
    fn identity(args: &[Value]) -> Value {
        args.first().cloned().unwrap_or(Value::None)
    }
    let derived = to_type(&Value::NativeFunction(identity));
    assert_eq!(derived.kind(), TypeKind::Function);
}

#[test]
fn test_to_type_surfaces_value_properties() {
    let tag = PropertyTag::new("Marker", Vec::new());
    let annotated = Value::with_properties(
        Properties::single(tag.clone(), Vec::new()),
        Value::Integer(1),
    );
    let derived = to_type(&annotated);
    assert_eq!(derived.kind(), TypeKind::Integer);
    assert!(derived.properties.has(&tag));
}

// =============================================================================
// check_type over typeclasses
// =============================================================================

#[test]
fn test_check_type_union_and_intersection() {
    let int_or_str = Type::union(vec![Rc::new(Type::integer()), Rc::new(Type::string())]);
    assert!(check_type(&Value::Integer(1), &int_or_str));
    assert!(check_type(&Value::string("a"), &int_or_str));
    assert!(!check_type(&Value::Float(1.0), &int_or_str));

    let both = Type::intersection(vec![Rc::new(Type::any()), Rc::new(Type::integer())]);
    assert!(check_type(&Value::Integer(1), &both));
    assert!(!check_type(&Value::Float(1.0), &both));
}

#[test]
fn test_check_type_not() {
    let not_int = Type::negation(Rc::new(Type::integer()));
    assert!(!check_type(&Value::Integer(1), &not_int));
    assert!(check_type(&Value::string("a"), &not_int));
}

#[test]
fn test_check_type_base_type() {
    let lists = Type::base_type(TypeKind::List);
    assert!(check_type(&Value::list(Vec::new()), &lists));
    assert!(!check_type(&Value::Integer(1), &lists));
}

#[test]
fn test_check_type_function_only_requires_callable() {
    fn noop(_: &[Value]) -> Value {
        Value::None
    }
    let fn_type = Type::function(
        crate::types::TupleType {
            elements: vec![Rc::new(Type::integer())],
            varargs: None,
        },
        Rc::new(Type::integer()),
    );
    // Signature is not enforced at this point, callability is.
    assert!(check_type(&Value::NativeFunction(noop), &fn_type));
    assert!(!check_type(&Value::Integer(1), &fn_type));
}

#[test]
fn test_check_type_with_property_inspects_annotations() {
    let tag = PropertyTag::new("Marker", Vec::new());
    let matcher = Type::with_property_of(tag.clone(), Rc::new(Type::integer()));

    let annotated = Value::with_properties(
        Properties::single(tag.clone(), Vec::new()),
        Value::Integer(1),
    );
    assert!(check_type(&annotated, &matcher));
    assert!(!check_type(&Value::Integer(1), &matcher));
}

#[test]
fn test_check_type_value_matcher_must_accept() {
    fn positive(value: &Value, _: &[Value]) -> bool {
        matches!(value, Value::Integer(i) if *i > 0)
    }
    let tag = PropertyTag::with_matchers("Positive", Vec::new(), None, Some(positive));
    let refined = Type::integer().with_property(tag, Vec::new());
    assert!(check_type(&Value::Integer(3), &refined));
    assert!(!check_type(&Value::Integer(-3), &refined));
}

#[test]
fn test_check_type_inner_type_match() {
    let describes_int = Type::type_of(Some(Rc::new(Type::integer())));
    assert!(check_type(&Value::of_type(Type::integer()), &describes_int));
    assert!(!check_type(&Value::of_type(Type::float()), &describes_int));
    // Unconstrained matcher accepts any type value.
    let any_type = Type::type_of(None);
    assert!(check_type(&Value::of_type(Type::float()), &any_type));
}

#[test]
fn test_check_type_custom_matcher() {
    fn only_strings(ty: &Type) -> TypeMatch {
        if ty.kind() == TypeKind::String {
            TypeMatch::True
        } else {
            TypeMatch::False
        }
    }
    fn only_string_values(value: &Value) -> bool {
        matches!(value, Value::String(_))
    }
    let matcher = Type::custom_matcher("strings", Some(only_strings), Some(only_string_values));
    assert!(check_type(&Value::string("a"), &matcher));
    assert!(!check_type(&Value::Integer(1), &matcher));
}
