//! Expression-to-statement compilation.
//!
//! The compiler walks the expression tree with a scope in hand, producing
//! a `Statement` whose `cached_type` is populated on every node. Call
//! sites gather the visible overload set, narrow it against the static
//! argument types, and commit to a direct call, a typed-template
//! expansion, or a runtime `Dispatch` over the survivors.

use std::rc::Rc;

use tracing::{debug, trace};

use quill_common::diagnostics::{CompileError, CompileErrorKind};
use quill_core::expression::{Expression, LambdaExpression};
use quill_core::relate::{TypeMatch, common_type, reduce_matches, type_match};
use quill_core::scope::{Context, LazyState, ResolvedVariable, Scope};
use quill_core::stack::Stack;
use quill_core::statement::{Statement, StatementCandidate, StatementKind};
use quill_core::types::{TupleType, Type, TypeKind, template_tag, typed_template_tag};
use quill_core::typing::to_type_rc;
use quill_core::value::{NativeFn, Value};
use quill_runtime::eval::Evaluator;

use crate::lower::lower;

/// Compile `expression` against `scope`, producing a typed statement.
pub fn compile(expression: &Expression, scope: &Rc<Scope>) -> Result<Statement, CompileError> {
    match expression {
        Expression::Constant(value) => Ok(Statement::constant(value.clone())),
        Expression::Name(name) => {
            let resolved = resolve(scope, name)?;
            Ok(variable_access(&resolved))
        }
        Expression::Define { name, value } => match value.as_ref() {
            // Function definitions pre-declare the binding so recursive
            // bodies resolve their own name.
            Expression::Lambda(lambda) => compile_function_definition(scope, name, lambda),
            other => {
                let value = compile(other, scope)?;
                let cached_type = value.cached_type.clone();
                let variable = scope.define(name.clone(), cached_type.clone());
                trace!(name = %name, index = variable.stack_index(), "define");
                Ok(Statement::new(
                    StatementKind::VariableSet {
                        index: variable.stack_index(),
                        value: Box::new(value),
                    },
                    cached_type,
                ))
            }
        },
        Expression::Assign { name, value } => {
            let value = compile(value, scope)?;
            let resolved = scope
                .lookup(name)
                .ok_or_else(|| CompileError::unresolved_name(name))?;
            let declared = resolved.variable.cached_type();
            if is_definite_mismatch(type_match(&declared, &value.cached_type)) {
                return Err(CompileError::new(
                    CompileErrorKind::TypeMismatch,
                    format!(
                        "cannot assign {} to `{name}` of type {declared}",
                        value.cached_type
                    ),
                ));
            }
            let cached_type = value.cached_type.clone();
            if resolved.is_local() {
                Ok(Statement::new(
                    StatementKind::VariableSet {
                        index: resolved.variable.stack_index(),
                        value: Box::new(value),
                    },
                    cached_type,
                ))
            } else {
                Ok(Statement::new(
                    StatementKind::SetAddress {
                        address: resolved_address(&resolved),
                        value: Box::new(value),
                    },
                    cached_type,
                ))
            }
        }
        Expression::Block(expressions) => {
            // Blocks are scope-transparent; only lambda bodies open scopes.
            let mut statements = Vec::with_capacity(expressions.len());
            for expression in expressions {
                statements.push(compile(expression, scope)?);
            }
            let cached_type = statements
                .last()
                .map(|statement| statement.cached_type.clone())
                .unwrap_or_else(|| Rc::new(Type::none_value()));
            Ok(Statement::new(
                StatementKind::Sequence(statements),
                cached_type,
            ))
        }
        Expression::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let condition = compile_condition(condition, scope)?;
            let then_branch = compile(then_branch, scope)?;
            match else_branch {
                Some(else_branch) => {
                    let else_branch = compile(else_branch, scope)?;
                    let cached_type =
                        common_type(&then_branch.cached_type, &else_branch.cached_type);
                    Ok(Statement::new(
                        StatementKind::If {
                            condition: Box::new(condition),
                            then_branch: Box::new(then_branch),
                            else_branch: Some(Box::new(else_branch)),
                        },
                        cached_type,
                    ))
                }
                None => {
                    // A missing false branch yields `none`.
                    let cached_type =
                        common_type(&then_branch.cached_type, &Rc::new(Type::none_value()));
                    Ok(Statement::new(
                        StatementKind::If {
                            condition: Box::new(condition),
                            then_branch: Box::new(then_branch),
                            else_branch: None,
                        },
                        cached_type,
                    ))
                }
            }
        }
        Expression::While { condition, body } => {
            let condition = compile_condition(condition, scope)?;
            let body = compile(body, scope)?;
            Ok(Statement::new(
                StatementKind::While {
                    condition: Box::new(condition),
                    body: Box::new(body),
                },
                Rc::new(Type::none_value()),
            ))
        }
        Expression::DoUntil { condition, body } => {
            let condition = compile_condition(condition, scope)?;
            let body = compile(body, scope)?;
            Ok(Statement::new(
                StatementKind::DoUntil {
                    condition: Box::new(condition),
                    body: Box::new(body),
                },
                Rc::new(Type::none_value()),
            ))
        }
        Expression::Lambda(lambda) => {
            let (statement, _) = compile_lambda(scope, lambda, None)?;
            Ok(statement)
        }
        Expression::Emit(value) => {
            let value = compile(value, scope)?;
            Ok(Statement::new(
                StatementKind::EmitEffect {
                    value: Box::new(value),
                },
                Rc::new(Type::none_value()),
            ))
        }
        Expression::Handle { handler, body } => {
            let handler = compile(handler, scope)?;
            let handler_kind = handler.cached_type.kind();
            if handler_kind != TypeKind::Function && handler_kind != TypeKind::Any {
                return Err(CompileError::new(
                    CompileErrorKind::NotCallable,
                    format!("effect handler has type {}", handler.cached_type),
                ));
            }
            let body = compile(body, scope)?;
            let cached_type = match handler.cached_type.function_return() {
                Some(return_type) => common_type(&body.cached_type, return_type),
                None => Rc::new(Type::any()),
            };
            Ok(Statement::new(
                StatementKind::HandleEffect {
                    handler: Box::new(handler),
                    body: Box::new(body),
                },
                cached_type,
            ))
        }
        Expression::Call { callee, arguments } => match callee.as_ref() {
            Expression::Name(name) => compile_named_call(scope, name, arguments),
            other => compile_dynamic_call(scope, other, arguments),
        },
        Expression::ListOf(elements) => {
            let elements = compile_all(elements, scope)?;
            let element_type = join_statement_types(&elements);
            Ok(Statement::new(
                StatementKind::BuildList { elements },
                Rc::new(Type::list(element_type)),
            ))
        }
        Expression::TupleOf(elements) => {
            let elements = compile_all(elements, scope)?;
            let element_types = elements
                .iter()
                .map(|element| element.cached_type.clone())
                .collect();
            Ok(Statement::new(
                StatementKind::BuildTuple { elements },
                Rc::new(Type::tuple(element_types)),
            ))
        }
        Expression::SetOf(elements) => {
            let elements = compile_all(elements, scope)?;
            let element_type = join_statement_types(&elements);
            Ok(Statement::new(
                StatementKind::BuildSet { elements },
                Rc::new(Type::set(element_type)),
            ))
        }
        Expression::TableOf(entries) => {
            let mut compiled = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                compiled.push((compile(key, scope)?, compile(value, scope)?));
            }
            let key_type = join_types(compiled.iter().map(|(key, _)| &key.cached_type));
            let value_type = join_types(compiled.iter().map(|(_, value)| &value.cached_type));
            Ok(Statement::new(
                StatementKind::BuildTable { entries: compiled },
                Rc::new(Type::table(key_type, value_type)),
            ))
        }
        Expression::CompositeOf(fields) => {
            let mut compiled = Vec::with_capacity(fields.len());
            for (name, field) in fields {
                compiled.push((name.clone(), compile(field, scope)?));
            }
            let field_types: Vec<_> = compiled
                .iter()
                .map(|(name, field)| (name.clone(), field.cached_type.clone()))
                .collect();
            Ok(Statement::new(
                StatementKind::BuildComposite { fields: compiled },
                Rc::new(Type::composite(field_types)),
            ))
        }
    }
}

// =============================================================================
// Names and variables
// =============================================================================

fn resolve(scope: &Rc<Scope>, name: &str) -> Result<ResolvedVariable, CompileError> {
    let resolved = scope
        .lookup(name)
        .ok_or_else(|| CompileError::unresolved_name(name))?;
    force_lazy(&resolved, scope)?;
    Ok(resolved)
}

/// Build the access statement for a resolved variable: a slot read wrapped
/// in one `FromImportedStack` per import hop.
fn variable_access(resolved: &ResolvedVariable) -> Statement {
    let cached_type = resolved.variable.cached_type();
    let mut statement = Statement::new(
        StatementKind::VariableGet {
            index: resolved.variable.stack_index(),
        },
        cached_type.clone(),
    );
    for &import in resolved.import_chain.iter().rev() {
        statement = Statement::new(
            StatementKind::FromImportedStack {
                import,
                inner: Box::new(statement),
            },
            cached_type.clone(),
        );
    }
    statement
}

fn resolved_address(resolved: &ResolvedVariable) -> quill_core::instruction::VariableAddress {
    let mut indices: Vec<u32> = resolved.import_chain.iter().copied().collect();
    indices.push(resolved.variable.stack_index());
    quill_core::instruction::VariableAddress::new(indices)
}

/// Force a lazy binding on first observation. Re-entry while the
/// initializer runs is a cycle; a failed initializer is never retried.
fn force_lazy(resolved: &ResolvedVariable, scope: &Rc<Scope>) -> Result<(), CompileError> {
    match resolved.variable.lazy_state() {
        LazyState::Eager | LazyState::Evaluated => Ok(()),
        LazyState::Evaluating => Err(CompileError::new(
            CompileErrorKind::CyclicLazyInit,
            format!("lazy variable `{}` depends on itself", resolved.variable.name()),
        )),
        LazyState::Pending(initializer) => {
            let owner = owning_context(scope, resolved)?;
            resolved.variable.mark_evaluating();
            let value = evaluate_initializer(&initializer, &owner, resolved)?;
            resolved.variable.set_cached_type(to_type_rc(&value));
            resolved.variable.complete_lazy(value);
            Ok(())
        }
    }
}

fn owning_context(
    scope: &Rc<Scope>,
    resolved: &ResolvedVariable,
) -> Result<Rc<Context>, CompileError> {
    let mut context = scope.context();
    for &import in resolved.import_chain.iter() {
        context = context.import(import as usize).ok_or_else(|| {
            CompileError::new(
                CompileErrorKind::EvaluationFailed,
                format!("import {import} missing while forcing a lazy binding"),
            )
        })?;
    }
    Ok(context)
}

fn evaluate_initializer(
    initializer: &Expression,
    owner: &Rc<Context>,
    resolved: &ResolvedVariable,
) -> Result<Value, CompileError> {
    let statement = compile(initializer, &owner.top_scope())?;
    let instruction = lower(&statement);
    let stack = owner.runtime_stack().ok_or_else(|| {
        CompileError::new(
            CompileErrorKind::EvaluationFailed,
            "no runtime stack to force a lazy binding against",
        )
    })?;
    stack.ensure_size(owner.slot_count());
    let value = Evaluator::new()
        .run(&instruction, &stack)
        .map_err(|error| CompileError::new(CompileErrorKind::EvaluationFailed, error.to_string()))?;
    stack.set(resolved.variable.stack_index() as usize, value.clone());
    Ok(value)
}

// =============================================================================
// Conditions and annotations
// =============================================================================

fn compile_condition(
    condition: &Expression,
    scope: &Rc<Scope>,
) -> Result<Statement, CompileError> {
    let condition = compile(condition, scope)?;
    if is_definite_mismatch(type_match(&Type::boolean(), &condition.cached_type)) {
        return Err(CompileError::new(
            CompileErrorKind::TypeMismatch,
            format!("condition has type {}, expected Bool", condition.cached_type),
        ));
    }
    Ok(condition)
}

fn is_definite_mismatch(outcome: TypeMatch) -> bool {
    matches!(
        outcome,
        TypeMatch::None | TypeMatch::False | TypeMatch::FiniteFalse
    )
}

/// Const-evaluate an expression the compiler needs a value for (type
/// annotations): literals and references to constant bindings only.
fn const_value(expression: &Expression, scope: &Rc<Scope>) -> Result<Value, CompileError> {
    match expression {
        Expression::Constant(value) => Ok(value.clone()),
        Expression::Name(name) => {
            let resolved = resolve(scope, name)?;
            resolved.variable.constant_value().ok_or_else(|| {
                CompileError::new(
                    CompileErrorKind::InvalidAnnotation,
                    format!("`{name}` is not a compile-time constant"),
                )
            })
        }
        _ => Err(CompileError::new(
            CompileErrorKind::InvalidAnnotation,
            "annotations must be constants or constant names",
        )),
    }
}

fn annotation_type(
    annotation: &Expression,
    scope: &Rc<Scope>,
) -> Result<Rc<Type>, CompileError> {
    match const_value(annotation, scope)? {
        Value::Type(ty) => Ok(ty),
        other => Err(CompileError::new(
            CompileErrorKind::InvalidAnnotation,
            format!("annotation evaluated to {other}, expected a type"),
        )),
    }
}

// =============================================================================
// Lambdas
// =============================================================================

/// Compile an anonymous lambda. Returns the arming statement plus the
/// function type.
fn compile_lambda(
    scope: &Rc<Scope>,
    lambda: &LambdaExpression,
    declared: Option<(&[Rc<Type>], Option<Rc<Type>>)>,
) -> Result<(Statement, Rc<Type>), CompileError> {
    let (parameter_types, return_annotation) = match declared {
        Some((parameter_types, return_annotation)) => {
            (parameter_types.to_vec(), return_annotation)
        }
        None => (
            lambda_parameter_types(scope, lambda)?,
            lambda
                .return_annotation
                .as_ref()
                .map(|annotation| annotation_type(annotation, scope))
                .transpose()?,
        ),
    };

    let child_context = Context::new(vec![scope.context()]);
    let child_scope = child_context.top_scope();
    for (parameter, parameter_type) in lambda.parameters.iter().zip(&parameter_types) {
        child_scope.define(parameter.name.clone(), parameter_type.clone());
    }

    let body = compile(&lambda.body, &child_scope)?;
    let return_type = match return_annotation {
        Some(declared_return) => {
            if is_definite_mismatch(type_match(&declared_return, &body.cached_type)) {
                return Err(CompileError::new(
                    CompileErrorKind::TypeMismatch,
                    format!(
                        "body has type {}, declared return is {declared_return}",
                        body.cached_type
                    ),
                ));
            }
            declared_return
        }
        None => body.cached_type.clone(),
    };

    let function_type = Rc::new(Type::function(
        TupleType {
            elements: parameter_types,
            varargs: None,
        },
        return_type,
    ));

    // The template frame is sized for the body's context; arming swaps in
    // the definition-site stack as its only import.
    let instruction = lower(&body);
    let template = Stack::new(Vec::new(), child_context.slot_count());
    let function = Value::function(template, Rc::new(instruction));
    let statement = Statement::new(
        StatementKind::ArmStack {
            function: Box::new(Statement::new(
                StatementKind::Constant(function),
                function_type.clone(),
            )),
        },
        function_type.clone(),
    );
    Ok((statement, function_type))
}

fn lambda_parameter_types(
    scope: &Rc<Scope>,
    lambda: &LambdaExpression,
) -> Result<Vec<Rc<Type>>, CompileError> {
    lambda
        .parameters
        .iter()
        .map(|parameter| match &parameter.annotation {
            Some(annotation) => annotation_type(annotation, scope),
            None => Ok(Rc::new(Type::any())),
        })
        .collect()
}

/// `name(params) = body`: declare the binding with its signature before
/// compiling the body so recursion resolves, then finalize the inferred
/// return type.
fn compile_function_definition(
    scope: &Rc<Scope>,
    name: &str,
    lambda: &LambdaExpression,
) -> Result<Statement, CompileError> {
    let parameter_types = lambda_parameter_types(scope, lambda)?;
    let return_annotation = lambda
        .return_annotation
        .as_ref()
        .map(|annotation| annotation_type(annotation, scope))
        .transpose()?;
    let provisional_return = return_annotation
        .clone()
        .unwrap_or_else(|| Rc::new(Type::any()));
    let provisional = Rc::new(Type::function(
        TupleType {
            elements: parameter_types.clone(),
            varargs: None,
        },
        provisional_return,
    ));
    let variable = scope.define(name.to_string(), provisional);
    debug!(name, index = variable.stack_index(), "define function");

    let (armed, function_type) =
        compile_lambda(scope, lambda, Some((&parameter_types, return_annotation)))?;
    variable.set_cached_type(function_type.clone());
    Ok(Statement::new(
        StatementKind::VariableSet {
            index: variable.stack_index(),
            value: Box::new(armed),
        },
        function_type,
    ))
}

// =============================================================================
// Calls
// =============================================================================

fn compile_all(
    expressions: &[Expression],
    scope: &Rc<Scope>,
) -> Result<Vec<Statement>, CompileError> {
    expressions
        .iter()
        .map(|expression| compile(expression, scope))
        .collect()
}

fn join_statement_types(statements: &[Statement]) -> Rc<Type> {
    join_types(statements.iter().map(|statement| &statement.cached_type))
}

fn join_types<'a>(types: impl Iterator<Item = &'a Rc<Type>>) -> Rc<Type> {
    let mut joined: Option<Rc<Type>> = None;
    for ty in types {
        joined = Some(match joined {
            Some(current) => common_type(&current, ty),
            None => ty.clone(),
        });
    }
    joined.unwrap_or_else(|| Rc::new(Type::any()))
}

/// One call-site overload candidate that survived static narrowing.
/// Survivors keep declaration order; runtime dispatch re-ranks them.
struct CallCandidate {
    resolved: ResolvedVariable,
    parameter_types: Vec<Rc<Type>>,
    return_type: Rc<Type>,
}

/// Score declared parameters against static argument types. Mirrors tuple
/// matching: arity must agree unless the signature is variadic.
fn match_arguments(parameters: &TupleType, argument_types: &[Rc<Type>]) -> TypeMatch {
    match &parameters.varargs {
        None => {
            if parameters.elements.len() != argument_types.len() {
                return TypeMatch::None;
            }
            reduce_matches(
                parameters
                    .elements
                    .iter()
                    .zip(argument_types)
                    .map(|(parameter, argument)| type_match(parameter, argument)),
            )
        }
        Some(tail) => {
            if argument_types.len() < parameters.elements.len() {
                return TypeMatch::None;
            }
            let fixed = parameters.elements.len();
            reduce_matches(
                parameters
                    .elements
                    .iter()
                    .zip(argument_types)
                    .map(|(parameter, argument)| type_match(parameter, argument))
                    .chain(
                        argument_types[fixed..]
                            .iter()
                            .map(|argument| type_match(tail, argument)),
                    ),
            )
        }
    }
}

fn compile_named_call(
    scope: &Rc<Scope>,
    name: &str,
    arguments: &[Expression],
) -> Result<Statement, CompileError> {
    let bindings = scope.lookup_all(name);
    if bindings.is_empty() {
        return Err(CompileError::unresolved_name(name));
    }

    // An untyped template intercepts the raw argument expressions before
    // any typing happens. Only an unambiguous binding may do that.
    if bindings.len() == 1 {
        if let Some(expander) = tagged_expander(&bindings[0], &template_tag()) {
            return expand_untyped_template(scope, name, expander, arguments);
        }
    }

    let argument_statements = compile_all(arguments, scope)?;
    let argument_types: Vec<Rc<Type>> = argument_statements
        .iter()
        .map(|argument| argument.cached_type.clone())
        .collect();

    let mut saw_function = false;
    let mut survivors: Vec<CallCandidate> = Vec::new();
    for binding in bindings {
        force_lazy(&binding, scope)?;
        let ty = binding.variable.cached_type();
        let (Some(parameters), Some(return_type)) =
            (ty.function_arguments(), ty.function_return())
        else {
            continue;
        };
        saw_function = true;
        let score = match_arguments(parameters, &argument_types);
        trace!(name, score = ?score, "call candidate");
        if is_definite_mismatch(score) {
            continue;
        }
        survivors.push(CallCandidate {
            parameter_types: parameters.elements.clone(),
            return_type: return_type.clone(),
            resolved: binding,
        });
    }

    if !saw_function {
        // A single non-function binding may still be dynamically callable.
        let nearest = scope
            .lookup(name)
            .ok_or_else(|| CompileError::unresolved_name(name))?;
        let ty = nearest.variable.cached_type();
        if ty.kind() == TypeKind::Any {
            return Ok(Statement::new(
                StatementKind::FunctionCall {
                    callee: Box::new(variable_access(&nearest)),
                    arguments: argument_statements,
                },
                Rc::new(Type::any()),
            ));
        }
        return Err(CompileError::new(
            CompileErrorKind::NotCallable,
            format!("`{name}` has type {ty}"),
        ));
    }

    if survivors.is_empty() {
        let detail = argument_types
            .iter()
            .map(|ty| ty.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CompileError::no_overload(name, format!("({detail})")));
    }

    if survivors.len() == 1 {
        let winner = &survivors[0];
        if let Some(expander) = tagged_expander(&winner.resolved, &typed_template_tag()) {
            return expand_typed_template(name, expander, &argument_statements);
        }
        debug!(name, "direct call");
        return Ok(Statement::new(
            StatementKind::FunctionCall {
                callee: Box::new(variable_access(&winner.resolved)),
                arguments: argument_statements,
            },
            winner.return_type.clone(),
        ));
    }

    // Several candidates stay alive (typically on statically untyped
    // arguments): defer ranking to runtime. Templates cannot be deferred.
    if survivors
        .iter()
        .any(|candidate| tagged_expander(&candidate.resolved, &typed_template_tag()).is_some())
    {
        return Err(CompileError::no_overload(
            name,
            "ambiguous template application",
        ));
    }
    debug!(name, candidates = survivors.len(), "runtime dispatch");
    let return_type = join_types(survivors.iter().map(|candidate| &candidate.return_type));
    let candidates = survivors
        .into_iter()
        .map(|candidate| StatementCandidate {
            callee: Box::new(variable_access(&candidate.resolved)),
            parameter_types: candidate.parameter_types,
        })
        .collect();
    Ok(Statement::new(
        StatementKind::Dispatch {
            candidates,
            arguments: argument_statements,
        },
        return_type,
    ))
}

fn compile_dynamic_call(
    scope: &Rc<Scope>,
    callee: &Expression,
    arguments: &[Expression],
) -> Result<Statement, CompileError> {
    let callee = compile(callee, scope)?;
    let argument_statements = compile_all(arguments, scope)?;
    match callee.cached_type.kind() {
        TypeKind::Function => {
            if let Some(parameters) = callee.cached_type.function_arguments() {
                let argument_types: Vec<Rc<Type>> = argument_statements
                    .iter()
                    .map(|argument| argument.cached_type.clone())
                    .collect();
                if is_definite_mismatch(match_arguments(parameters, &argument_types)) {
                    return Err(CompileError::new(
                        CompileErrorKind::NoOverloadFound,
                        format!("arguments do not fit {}", callee.cached_type),
                    ));
                }
            }
            let return_type = callee
                .cached_type
                .function_return()
                .cloned()
                .unwrap_or_else(|| Rc::new(Type::any()));
            Ok(Statement::new(
                StatementKind::FunctionCall {
                    callee: Box::new(callee),
                    arguments: argument_statements,
                },
                return_type,
            ))
        }
        TypeKind::Any => Ok(Statement::new(
            StatementKind::FunctionCall {
                callee: Box::new(callee),
                arguments: argument_statements,
            },
            Rc::new(Type::any()),
        )),
        _ => Err(CompileError::new(
            CompileErrorKind::NotCallable,
            format!("callee has type {}", callee.cached_type),
        )),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// The expander function of a binding tagged with `tag`, if any. Template
/// bindings are compile-time constants wrapping a native function in a
/// property reference.
fn tagged_expander(
    resolved: &ResolvedVariable,
    tag: &quill_core::types::PropertyTag,
) -> Option<NativeFn> {
    match resolved.variable.constant_value() {
        Some(Value::PropertyReference(annotated)) if annotated.properties.has(tag) => {
            match &annotated.value {
                Value::NativeFunction(expander) => Some(*expander),
                _ => None,
            }
        }
        _ => None,
    }
}

fn expand_typed_template(
    name: &str,
    expander: NativeFn,
    argument_statements: &[Statement],
) -> Result<Statement, CompileError> {
    let arguments: Vec<Value> = argument_statements
        .iter()
        .map(|statement| Value::statement(statement.clone()))
        .collect();
    match expander(&arguments) {
        Value::Statement(statement) => {
            debug!(name, "typed template expanded");
            Ok((*statement).clone())
        }
        other => Err(CompileError::new(
            CompileErrorKind::EvaluationFailed,
            format!("template `{name}` produced {other}, expected a statement"),
        )),
    }
}

fn expand_untyped_template(
    scope: &Rc<Scope>,
    name: &str,
    expander: NativeFn,
    arguments: &[Expression],
) -> Result<Statement, CompileError> {
    let raw: Vec<Value> = arguments
        .iter()
        .map(|argument| Value::expression(argument.clone()))
        .collect();
    match expander(&raw) {
        // Re-enter the compiler on the produced form.
        Value::Expression(expanded) => compile(&expanded, scope),
        Value::Statement(statement) => Ok((*statement).clone()),
        other => Err(CompileError::new(
            CompileErrorKind::EvaluationFailed,
            format!("template `{name}` produced {other}, expected code"),
        )),
    }
}
