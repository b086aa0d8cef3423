//! Activation records.
//!
//! A `Stack` is the runtime frame of a context or function: a slot array
//! plus imported stacks giving access to enclosing modules by index.
//! Imports are shared by pointer: mutation of an imported slot is visible
//! to every holder, which is how module-level variables behave. Slots are
//! owned by their activation: entering a function `shallow_refresh`es the
//! template so recursive calls do not clobber outer frames.

use std::cell::RefCell;
use std::rc::Rc;

use crate::value::Value;

#[derive(Clone)]
pub struct Stack {
    imports: Rc<[Stack]>,
    slots: Rc<RefCell<Vec<Value>>>,
}

impl Stack {
    /// A stack with `size` slots, all `None`.
    pub fn new(imports: Vec<Stack>, size: usize) -> Stack {
        Stack {
            imports: Rc::from(imports),
            slots: Rc::new(RefCell::new(vec![Value::None; size])),
        }
    }

    pub fn with_slots(imports: Vec<Stack>, slots: Vec<Value>) -> Stack {
        Stack {
            imports: Rc::from(imports),
            slots: Rc::new(RefCell::new(slots)),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.slots.borrow().get(index).cloned()
    }

    /// Store into a slot. `false` when the index is out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn import(&self, index: usize) -> Option<&Stack> {
        self.imports.get(index)
    }

    pub fn imports(&self) -> &[Stack] {
        &self.imports
    }

    /// Grow the slot array to at least `size` entries, filling with `None`.
    /// Top-level session stacks grow as definitions accumulate; activation
    /// frames never do.
    pub fn ensure_size(&self, size: usize) {
        let mut slots = self.slots.borrow_mut();
        if slots.len() < size {
            slots.resize(size, Value::None);
        }
    }

    /// A new stack sharing this one's imports with a freshly-allocated copy
    /// of the value slots.
    pub fn shallow_refresh(&self) -> Stack {
        Stack {
            imports: self.imports.clone(),
            slots: Rc::new(RefCell::new(self.slots.borrow().clone())),
        }
    }

    /// The same slot template under a different import list. Used when a
    /// function value is armed with its definition-site stack.
    pub fn rebase(&self, imports: Vec<Stack>) -> Stack {
        Stack {
            imports: Rc::from(imports),
            slots: self.slots.clone(),
        }
    }

    /// Slot-array identity, for tests that assert frame sharing.
    pub fn same_slots(&self, other: &Stack) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }
}
