//! Stack tests: slot access, refresh semantics, import sharing.

use crate::stack::Stack;
use crate::value::Value;

#[test]
fn test_get_and_set_are_bounds_checked() {
    let stack = Stack::new(Vec::new(), 2);
    assert_eq!(stack.get(0), Some(Value::None));
    assert!(stack.set(1, Value::Integer(5)));
    assert_eq!(stack.get(1), Some(Value::Integer(5)));
    assert_eq!(stack.get(2), None);
    assert!(!stack.set(2, Value::None));
}

#[test]
fn test_shallow_refresh_copies_slots_and_shares_imports() {
    let module = Stack::new(Vec::new(), 1);
    module.set(0, Value::Integer(1));
    let template = Stack::new(vec![module.clone()], 1);
    template.set(0, Value::Integer(10));

    let frame = template.shallow_refresh();
    assert!(!frame.same_slots(&template), "slots are a fresh copy");
    assert_eq!(frame.get(0), Some(Value::Integer(10)));

    // Writes to the frame never touch the template.
    frame.set(0, Value::Integer(99));
    assert_eq!(template.get(0), Some(Value::Integer(10)));

    // Imports stay shared: a module write is visible through the frame.
    module.set(0, Value::Integer(2));
    assert_eq!(frame.import(0).unwrap().get(0), Some(Value::Integer(2)));
}

#[test]
fn test_clone_shares_the_live_frame() {
    let stack = Stack::new(Vec::new(), 1);
    let alias = stack.clone();
    alias.set(0, Value::Integer(7));
    assert_eq!(stack.get(0), Some(Value::Integer(7)));
    assert!(stack.same_slots(&alias));
}

#[test]
fn test_ensure_size_only_grows() {
    let stack = Stack::new(Vec::new(), 1);
    stack.set(0, Value::Integer(3));
    stack.ensure_size(3);
    assert_eq!(stack.len(), 3);
    assert_eq!(stack.get(0), Some(Value::Integer(3)), "existing slots keep values");
    assert_eq!(stack.get(2), Some(Value::None));
    stack.ensure_size(1);
    assert_eq!(stack.len(), 3, "never shrinks");
}

#[test]
fn test_rebase_keeps_slots_swaps_imports() {
    let template = Stack::new(Vec::new(), 1);
    template.set(0, Value::Integer(4));
    let site = Stack::new(Vec::new(), 0);
    let armed = template.rebase(vec![site]);
    assert!(armed.same_slots(&template));
    assert_eq!(armed.imports().len(), 1);
    assert!(template.imports().is_empty());
}
