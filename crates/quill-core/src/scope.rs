//! The lexical binding model.
//!
//! A `Context` owns every variable declared in a module or function body;
//! its variable list only grows, and the indices it hands out stay stable
//! for its lifetime. A `Scope` is a tree node restricting which of a
//! context's variables are visible. A `Variable` is one binding: a stack
//! slot, the compiler's cached type, an optional compile-time constant and
//! an optional lazy initializer with an explicit evaluation state machine.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::expression::Expression;
use crate::stack::Stack;
use crate::types::Type;
use crate::value::Value;

/// Evaluation state of a lazy binding. Re-entering `Evaluating` is a
/// cycle and must be reported, never retried.
#[derive(Clone, Debug)]
pub enum LazyState {
    /// Not lazy; the value is produced by ordinary evaluation.
    Eager,
    /// Lazy and untouched; holds the initializer.
    Pending(Rc<Expression>),
    /// Initializer currently running.
    Evaluating,
    /// Forced; the result is the variable's constant value.
    Evaluated,
}

/// A single binding.
pub struct Variable {
    name: String,
    /// Slot within the owning context's stack.
    stack_index: u32,
    cached_type: RefCell<Rc<Type>>,
    /// Compile-time constant, when known (primitives, forced lazies).
    constant_value: RefCell<Option<Value>>,
    lazy: RefCell<LazyState>,
}

impl Variable {
    fn new(name: String, stack_index: u32, cached_type: Rc<Type>) -> Variable {
        Variable {
            name,
            stack_index,
            cached_type: RefCell::new(cached_type),
            constant_value: RefCell::new(None),
            lazy: RefCell::new(LazyState::Eager),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stack_index(&self) -> u32 {
        self.stack_index
    }

    pub fn cached_type(&self) -> Rc<Type> {
        self.cached_type.borrow().clone()
    }

    pub fn set_cached_type(&self, cached_type: Rc<Type>) {
        *self.cached_type.borrow_mut() = cached_type;
    }

    pub fn constant_value(&self) -> Option<Value> {
        self.constant_value.borrow().clone()
    }

    pub fn set_constant_value(&self, value: Value) {
        *self.constant_value.borrow_mut() = Some(value);
    }

    pub fn lazy_state(&self) -> LazyState {
        self.lazy.borrow().clone()
    }

    pub fn mark_evaluating(&self) {
        *self.lazy.borrow_mut() = LazyState::Evaluating;
    }

    /// Record the forced value and leave the lazy machine in `Evaluated`.
    pub fn complete_lazy(&self, value: Value) {
        self.set_constant_value(value);
        *self.lazy.borrow_mut() = LazyState::Evaluated;
    }
}

/// Compile-time owner of a module's (or function body's) bindings.
pub struct Context {
    imports: RefCell<Vec<Rc<Context>>>,
    /// Append-only; indices handed out stay stable.
    all_variables: RefCell<Vec<Rc<Variable>>>,
    top: RefCell<Option<Rc<Scope>>>,
    /// The live stack paired with this context, when one exists (top-level
    /// sessions). Needed to force lazy bindings at compile time.
    runtime_stack: RefCell<Option<Stack>>,
}

impl Context {
    pub fn new(imports: Vec<Rc<Context>>) -> Rc<Context> {
        let context = Rc::new(Context {
            imports: RefCell::new(imports),
            all_variables: RefCell::new(Vec::new()),
            top: RefCell::new(None),
            runtime_stack: RefCell::new(None),
        });
        let top = Rc::new(Scope {
            context: Rc::downgrade(&context),
            parent: None,
            variables: RefCell::new(Vec::new()),
        });
        *context.top.borrow_mut() = Some(top);
        context
    }

    pub fn top_scope(&self) -> Rc<Scope> {
        self.top
            .borrow()
            .clone()
            .expect("context top scope is set at construction")
    }

    pub fn imports(&self) -> Vec<Rc<Context>> {
        self.imports.borrow().clone()
    }

    pub fn import(&self, index: usize) -> Option<Rc<Context>> {
        self.imports.borrow().get(index).cloned()
    }

    pub fn add_import(&self, context: Rc<Context>) -> u32 {
        let mut imports = self.imports.borrow_mut();
        imports.push(context);
        (imports.len() - 1) as u32
    }

    /// Number of stack slots this context's activations need.
    pub fn slot_count(&self) -> usize {
        self.all_variables.borrow().len()
    }

    pub fn variable(&self, index: usize) -> Option<Rc<Variable>> {
        self.all_variables.borrow().get(index).cloned()
    }

    pub fn attach_stack(&self, stack: Stack) {
        *self.runtime_stack.borrow_mut() = Some(stack);
    }

    pub fn runtime_stack(&self) -> Option<Stack> {
        self.runtime_stack.borrow().clone()
    }

    fn allocate(&self, name: String, cached_type: Rc<Type>) -> Rc<Variable> {
        let mut all = self.all_variables.borrow_mut();
        let variable = Rc::new(Variable::new(name, all.len() as u32, cached_type));
        all.push(variable.clone());
        variable
    }
}

/// A resolved binding: the variable plus the import-index chain leading
/// from the querying context to the owning one (empty when local).
#[derive(Clone)]
pub struct ResolvedVariable {
    pub variable: Rc<Variable>,
    pub import_chain: SmallVec<[u32; 4]>,
}

impl ResolvedVariable {
    pub fn is_local(&self) -> bool {
        self.import_chain.is_empty()
    }
}

/// A visibility restriction over a context's variables. Scopes chain along
/// `parent`; only the top scope reaches across the context's imports.
pub struct Scope {
    context: Weak<Context>,
    parent: Option<Rc<Scope>>,
    variables: RefCell<Vec<Rc<Variable>>>,
}

impl Scope {
    pub fn context(&self) -> Rc<Context> {
        self.context
            .upgrade()
            .expect("scope outlived its owning context")
    }

    pub fn child(self: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            context: self.context.clone(),
            parent: Some(self.clone()),
            variables: RefCell::new(Vec::new()),
        })
    }

    /// Declare a new variable visible from this scope.
    pub fn define(&self, name: impl Into<String>, cached_type: Rc<Type>) -> Rc<Variable> {
        let variable = self.context().allocate(name.into(), cached_type);
        self.variables.borrow_mut().push(variable.clone());
        variable
    }

    /// Declare a lazy variable; forcing happens on first observation.
    pub fn define_lazy(
        &self,
        name: impl Into<String>,
        cached_type: Rc<Type>,
        initializer: Rc<Expression>,
    ) -> Rc<Variable> {
        let variable = self.define(name, cached_type);
        *variable.lazy.borrow_mut() = LazyState::Pending(initializer);
        variable
    }

    /// Resolve `name` to the nearest visible binding: the scope chain of
    /// this context first (latest definition shadows), then imported
    /// contexts in index order, depth first.
    pub fn lookup(&self, name: &str) -> Option<ResolvedVariable> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(variable) = current
                .variables
                .borrow()
                .iter()
                .rev()
                .find(|v| v.name() == name)
            {
                return Some(ResolvedVariable {
                    variable: variable.clone(),
                    import_chain: SmallVec::new(),
                });
            }
            scope = current.parent.as_deref();
        }
        for (index, import) in self.context().imports().iter().enumerate() {
            if let Some(mut resolved) = import.top_scope().lookup(name) {
                resolved.import_chain.insert(0, index as u32);
                return Some(resolved);
            }
        }
        None
    }

    /// Every visible binding named `name`, in declaration order: this
    /// context's scopes from the root down, then imports in index order.
    /// This is the candidate set an overloaded call site ranks.
    pub fn lookup_all(&self, name: &str) -> Vec<ResolvedVariable> {
        let mut results = Vec::new();
        // Root-most scope first so earlier declarations rank earlier.
        let mut scope = Some(self);
        let mut ordered: Vec<&Scope> = Vec::new();
        while let Some(current) = scope {
            ordered.push(current);
            scope = current.parent.as_deref();
        }
        for current in ordered.into_iter().rev() {
            for variable in current.variables.borrow().iter() {
                if variable.name() == name {
                    results.push(ResolvedVariable {
                        variable: variable.clone(),
                        import_chain: SmallVec::new(),
                    });
                }
            }
        }
        for (index, import) in self.context().imports().iter().enumerate() {
            for mut resolved in import.top_scope().lookup_all(name) {
                resolved.import_chain.insert(0, index as u32);
                results.push(resolved);
            }
        }
        results
    }
}
