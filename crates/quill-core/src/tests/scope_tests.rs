//! Context/Scope/Variable tests: allocation, shadowing, import chains.

use std::rc::Rc;

use crate::scope::Context;
use crate::types::Type;

fn any() -> Rc<Type> {
    Rc::new(Type::any())
}

#[test]
fn test_slot_indices_are_stable_and_sequential() {
    let context = Context::new(Vec::new());
    let scope = context.top_scope();
    let a = scope.define("a", any());
    let b = scope.define("b", any());
    assert_eq!(a.stack_index(), 0);
    assert_eq!(b.stack_index(), 1);
    assert_eq!(context.slot_count(), 2);
    // The list only grows; earlier indices keep their variables.
    let c = scope.define("c", any());
    assert_eq!(c.stack_index(), 2);
    assert!(Rc::ptr_eq(&context.variable(0).unwrap(), &a));
}

#[test]
fn test_lookup_prefers_latest_definition() {
    let context = Context::new(Vec::new());
    let scope = context.top_scope();
    let first = scope.define("x", any());
    let second = scope.define("x", any());
    let resolved = scope.lookup("x").unwrap();
    assert!(Rc::ptr_eq(&resolved.variable, &second));
    assert!(!Rc::ptr_eq(&resolved.variable, &first));
    assert!(resolved.is_local());
}

#[test]
fn test_lookup_all_returns_declaration_order() {
    let context = Context::new(Vec::new());
    let scope = context.top_scope();
    let first = scope.define("f", any());
    let second = scope.define("f", any());
    let all = scope.lookup_all("f");
    assert_eq!(all.len(), 2);
    assert!(Rc::ptr_eq(&all[0].variable, &first));
    assert!(Rc::ptr_eq(&all[1].variable, &second));
}

#[test]
fn test_child_scopes_see_parent_variables() {
    let context = Context::new(Vec::new());
    let top = context.top_scope();
    let outer = top.define("v", any());
    let child = top.child();
    let resolved = child.lookup("v").unwrap();
    assert!(Rc::ptr_eq(&resolved.variable, &outer));
    // Variables of a child scope are invisible from the parent.
    child.define("inner", any());
    assert!(top.lookup("inner").is_none());
}

#[test]
fn test_lookup_crosses_imports_with_chains() {
    let prelude = Context::new(Vec::new());
    let in_prelude = prelude.top_scope().define("p", any());
    let module = Context::new(vec![prelude]);
    let function = Context::new(vec![module.clone()]);

    // One hop from the module.
    let from_module = module.top_scope().lookup("p").unwrap();
    assert!(Rc::ptr_eq(&from_module.variable, &in_prelude));
    assert_eq!(from_module.import_chain.as_slice(), &[0]);

    // Two hops from a function body context.
    let from_function = function.top_scope().lookup("p").unwrap();
    assert_eq!(from_function.import_chain.as_slice(), &[0, 0]);
}

#[test]
fn test_local_definitions_shadow_imports() {
    let prelude = Context::new(Vec::new());
    prelude.top_scope().define("n", any());
    let module = Context::new(vec![prelude]);
    let local = module.top_scope().define("n", any());
    let resolved = module.top_scope().lookup("n").unwrap();
    assert!(Rc::ptr_eq(&resolved.variable, &local));
    assert!(resolved.is_local());
    // Both stay visible to overload collection, locals first.
    assert_eq!(module.top_scope().lookup_all("n").len(), 2);
}
