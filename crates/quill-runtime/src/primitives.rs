//! The standard primitives set.
//!
//! Builds the top-level context the compiler imports: type constants,
//! typed-template arithmetic that expands into arithmetic statements at
//! compile time, and a few runtime natives. Entries follow the injection
//! contract of the external primitives registry: named variables with
//! preassigned stack indices and compile-time constant values.
//!
//! Operator names hold overload sets: each overload is its own variable,
//! and call sites narrow them by argument types. A typed-template overload
//! is a native function wrapped in a `PropertyReference` carrying the
//! `TypedTemplate` tag; the compiler invokes it with the compiled argument
//! statements and splices the returned statement.

use std::rc::Rc;

use quill_core::scope::Context;
use quill_core::stack::Stack;
use quill_core::statement::{BinaryInstructionKind, Statement, UnaryInstructionKind};
use quill_core::types::{Properties, TupleType, Type, typed_template_tag};
use quill_core::value::Value;

/// Build the standard top-level context and its runtime stack.
pub fn standard_context() -> (Rc<Context>, Stack) {
    let context = Context::new(Vec::new());
    let scope = context.top_scope();
    let mut slots = Vec::new();

    let mut register = |name: &str, ty: Type, value: Value| {
        let variable = scope.define(name, Rc::new(ty));
        variable.set_constant_value(value.clone());
        debug_assert_eq!(variable.stack_index() as usize, slots.len());
        slots.push(value);
    };

    // Type constants.
    register_type(&mut register, "Int", Type::integer());
    register_type(&mut register, "Uint", Type::unsigned());
    register_type(&mut register, "Float", Type::float());
    register_type(&mut register, "Bool", Type::boolean());
    register_type(&mut register, "Str", Type::string());
    register_type(&mut register, "Any", Type::any());
    register("none", Type::none_value(), Value::None);

    // Arithmetic templates. Overloads of one name are separate variables;
    // call-site narrowing picks among them.
    register(
        "+",
        binary_type(Type::integer(), Type::integer(), Type::integer()),
        template(expand_add_int),
    );
    register(
        "+",
        binary_type(Type::float(), Type::float(), Type::float()),
        template(expand_add_float),
    );
    register(
        "-",
        binary_type(Type::integer(), Type::integer(), Type::integer()),
        template(expand_sub_int),
    );
    register(
        "-",
        binary_type(Type::float(), Type::float(), Type::float()),
        template(expand_sub_float),
    );
    register(
        "-",
        unary_type(Type::integer(), Type::integer()),
        template(expand_neg_int),
    );
    register(
        "-",
        unary_type(Type::float(), Type::float()),
        template(expand_neg_float),
    );
    register(
        "*",
        binary_type(Type::integer(), Type::integer(), Type::integer()),
        template(expand_mul_int),
    );
    register(
        "*",
        binary_type(Type::float(), Type::float(), Type::float()),
        template(expand_mul_float),
    );
    // `/` on integers is true division and yields Float; `div` truncates.
    register(
        "/",
        binary_type(Type::integer(), Type::integer(), Type::float()),
        Value::NativeFunction(true_divide),
    );
    register(
        "/",
        binary_type(Type::float(), Type::float(), Type::float()),
        template(expand_div_float),
    );
    register(
        "div",
        binary_type(Type::integer(), Type::integer(), Type::integer()),
        template(expand_div_int),
    );
    register(
        "mod",
        binary_type(Type::integer(), Type::integer(), Type::integer()),
        template(expand_mod_int),
    );

    // Comparison natives.
    register(
        "==",
        binary_type(Type::any(), Type::any(), Type::boolean()),
        Value::NativeFunction(structural_equals),
    );
    register(
        "!=",
        binary_type(Type::any(), Type::any(), Type::boolean()),
        Value::NativeFunction(structural_not_equals),
    );

    let stack = Stack::with_slots(Vec::new(), slots);
    context.attach_stack(stack.clone());
    (context, stack)
}

fn register_type(register: &mut impl FnMut(&str, Type, Value), name: &str, described: Type) {
    let described = Rc::new(described);
    register(
        name,
        Type::type_of(Some(described.clone())),
        Value::Type(described),
    );
}

fn binary_type(left: Type, right: Type, result: Type) -> Type {
    Type::function(
        TupleType {
            elements: vec![Rc::new(left), Rc::new(right)],
            varargs: None,
        },
        Rc::new(result),
    )
}

fn unary_type(operand: Type, result: Type) -> Type {
    Type::function(
        TupleType {
            elements: vec![Rc::new(operand)],
            varargs: None,
        },
        Rc::new(result),
    )
}

/// Wrap a statement expander as a typed-template value.
fn template(expander: quill_core::value::NativeFn) -> Value {
    Value::with_properties(
        Properties::single(typed_template_tag(), Vec::new()),
        Value::NativeFunction(expander),
    )
}

// ---------------------------------------------------------------------
// Template expanders: compiled argument statements in, statement out.
// ---------------------------------------------------------------------

fn expand_binary(args: &[Value], op: BinaryInstructionKind, result: Type) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::Statement(left)), Some(Value::Statement(right))) => {
            Value::statement(Statement::binary(
                op,
                (**left).clone(),
                (**right).clone(),
                Rc::new(result),
            ))
        }
        _ => Value::None,
    }
}

fn expand_unary(args: &[Value], op: UnaryInstructionKind, result: Type) -> Value {
    match args.first() {
        Some(Value::Statement(operand)) => {
            Value::statement(Statement::unary(op, (**operand).clone(), Rc::new(result)))
        }
        _ => Value::None,
    }
}

fn expand_add_int(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::AddInt, Type::integer())
}

fn expand_sub_int(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::SubInt, Type::integer())
}

fn expand_mul_int(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::MulInt, Type::integer())
}

fn expand_div_int(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::DivInt, Type::integer())
}

fn expand_mod_int(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::ModInt, Type::integer())
}

fn expand_add_float(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::AddFloat, Type::float())
}

fn expand_sub_float(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::SubFloat, Type::float())
}

fn expand_mul_float(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::MulFloat, Type::float())
}

fn expand_div_float(args: &[Value]) -> Value {
    expand_binary(args, BinaryInstructionKind::DivFloat, Type::float())
}

fn expand_neg_int(args: &[Value]) -> Value {
    expand_unary(args, UnaryInstructionKind::NegInt, Type::integer())
}

fn expand_neg_float(args: &[Value]) -> Value {
    expand_unary(args, UnaryInstructionKind::NegFloat, Type::float())
}

// ---------------------------------------------------------------------
// Runtime natives
// ---------------------------------------------------------------------

fn true_divide(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::Integer(a)), Some(Value::Integer(b))) => {
            Value::Float(*a as f64 / *b as f64)
        }
        _ => Value::None,
    }
}

fn structural_equals(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => Value::Boolean(a == b),
        _ => Value::None,
    }
}

fn structural_not_equals(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => Value::Boolean(a != b),
        _ => Value::None,
    }
}
