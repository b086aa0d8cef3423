//! Core type definitions.
//!
//! This module contains the main `Type` struct, its payload enum and all
//! payload variant structs.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::relate::TypeMatch;
use crate::types::{Properties, PropertyTag};
use crate::value::Value;

// =============================================================================
// Type Kind
// =============================================================================

/// Discriminant of a `Type`, also usable as a kind-level matcher
/// (`TypeData::BaseType`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    // Concrete kinds: describe a single class of runtime values.
    NoneValue,
    Integer,
    Unsigned,
    Float,
    Boolean,
    Function,
    Tuple,
    Reference,
    List,
    String,
    Set,
    Table,
    Expression,
    Statement,
    Scope,
    Composite,
    Type,
    // Typeclass kinds: describe sets of types.
    Any,
    None,
    Union,
    Intersection,
    Not,
    BaseType,
    WithProperty,
    // Host-supplied predicate pair.
    CustomMatcher,
}

impl TypeKind {
    pub fn is_concrete(self) -> bool {
        matches!(
            self,
            TypeKind::NoneValue
                | TypeKind::Integer
                | TypeKind::Unsigned
                | TypeKind::Float
                | TypeKind::Boolean
                | TypeKind::Function
                | TypeKind::Tuple
                | TypeKind::Reference
                | TypeKind::List
                | TypeKind::String
                | TypeKind::Set
                | TypeKind::Table
                | TypeKind::Expression
                | TypeKind::Statement
                | TypeKind::Scope
                | TypeKind::Composite
                | TypeKind::Type
        )
    }

    /// Concrete kinds with no structural payload beyond the kind itself.
    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            TypeKind::NoneValue
                | TypeKind::Integer
                | TypeKind::Unsigned
                | TypeKind::Float
                | TypeKind::Boolean
                | TypeKind::String
                | TypeKind::Expression
                | TypeKind::Statement
                | TypeKind::Scope
        )
    }
}

// =============================================================================
// Payload structs
// =============================================================================

/// A function type: argument tuple plus return type. Both sides non-null.
#[derive(Clone, Debug)]
pub struct FunctionType {
    /// Always a `Tuple` type.
    pub arguments: Rc<Type>,
    pub return_type: Rc<Type>,
}

/// An ordered sequence of element types with an optional variadic tail.
#[derive(Clone, Debug)]
pub struct TupleType {
    pub elements: Vec<Rc<Type>>,
    pub varargs: Option<Rc<Type>>,
}

/// Key and value types of a table.
#[derive(Clone, Debug)]
pub struct TableType {
    pub key: Rc<Type>,
    pub value: Rc<Type>,
}

/// Field name to type mapping; `BTreeMap` keeps the lexicographic order
/// the data model requires for printing and hashing.
#[derive(Clone, Debug)]
pub struct CompositeType {
    pub fields: BTreeMap<String, Rc<Type>>,
}

/// An inner type plus a property tag required on candidates.
#[derive(Clone, Debug)]
pub struct WithPropertyType {
    pub tag: PropertyTag,
    pub inner: Rc<Type>,
}

/// Host-supplied predicate pair: one on types, one on values.
#[derive(Clone, Debug)]
pub struct CustomMatcherType {
    /// Debug only.
    pub name: String,
    pub type_matcher: Option<fn(&Type) -> TypeMatch>,
    pub value_matcher: Option<fn(&Value) -> bool>,
}

// =============================================================================
// Type
// =============================================================================

/// Payload of a `Type`, tagged by `TypeKind`.
#[derive(Clone, Debug)]
pub enum TypeData {
    // Concrete atomic
    NoneValue,
    Integer,
    Unsigned,
    Float,
    Boolean,
    String,
    Expression,
    Statement,
    Scope,
    // Concrete structural
    Function(Box<FunctionType>),
    Tuple(Box<TupleType>),
    Reference(Rc<Type>),
    List(Rc<Type>),
    Set(Rc<Type>),
    Table(Box<TableType>),
    Composite(Box<CompositeType>),
    /// The type of type values; the payload is the described inner type,
    /// absent when unconstrained.
    Type(Option<Rc<Type>>),
    // Typeclasses
    Any,
    None,
    Union(Vec<Rc<Type>>),
    Intersection(Vec<Rc<Type>>),
    Not(Rc<Type>),
    BaseType(TypeKind),
    WithProperty(Box<WithPropertyType>),
    // Matcher
    CustomMatcher(Box<CustomMatcherType>),
}

/// An algebraic description of a set of values.
///
/// Carries a `Properties` bag regardless of kind; properties attach
/// additional predicates applied during matching and value checking, and
/// never strengthen an `Equal` match beyond `AlmostEqual`.
#[derive(Clone, Debug)]
pub struct Type {
    pub data: TypeData,
    pub properties: Properties,
}

impl Type {
    pub fn new(data: TypeData) -> Self {
        Type {
            data,
            properties: Properties::new(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match &self.data {
            TypeData::NoneValue => TypeKind::NoneValue,
            TypeData::Integer => TypeKind::Integer,
            TypeData::Unsigned => TypeKind::Unsigned,
            TypeData::Float => TypeKind::Float,
            TypeData::Boolean => TypeKind::Boolean,
            TypeData::String => TypeKind::String,
            TypeData::Expression => TypeKind::Expression,
            TypeData::Statement => TypeKind::Statement,
            TypeData::Scope => TypeKind::Scope,
            TypeData::Function(_) => TypeKind::Function,
            TypeData::Tuple(_) => TypeKind::Tuple,
            TypeData::Reference(_) => TypeKind::Reference,
            TypeData::List(_) => TypeKind::List,
            TypeData::Set(_) => TypeKind::Set,
            TypeData::Table(_) => TypeKind::Table,
            TypeData::Composite(_) => TypeKind::Composite,
            TypeData::Type(_) => TypeKind::Type,
            TypeData::Any => TypeKind::Any,
            TypeData::None => TypeKind::None,
            TypeData::Union(_) => TypeKind::Union,
            TypeData::Intersection(_) => TypeKind::Intersection,
            TypeData::Not(_) => TypeKind::Not,
            TypeData::BaseType(_) => TypeKind::BaseType,
            TypeData::WithProperty(_) => TypeKind::WithProperty,
            TypeData::CustomMatcher(_) => TypeKind::CustomMatcher,
        }
    }

    pub fn is_concrete(&self) -> bool {
        self.kind().is_concrete()
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn none_value() -> Self {
        Type::new(TypeData::NoneValue)
    }

    pub fn integer() -> Self {
        Type::new(TypeData::Integer)
    }

    pub fn unsigned() -> Self {
        Type::new(TypeData::Unsigned)
    }

    pub fn float() -> Self {
        Type::new(TypeData::Float)
    }

    pub fn boolean() -> Self {
        Type::new(TypeData::Boolean)
    }

    pub fn string() -> Self {
        Type::new(TypeData::String)
    }

    pub fn expression() -> Self {
        Type::new(TypeData::Expression)
    }

    pub fn statement() -> Self {
        Type::new(TypeData::Statement)
    }

    pub fn scope() -> Self {
        Type::new(TypeData::Scope)
    }

    pub fn any() -> Self {
        Type::new(TypeData::Any)
    }

    pub fn none() -> Self {
        Type::new(TypeData::None)
    }

    pub fn function(arguments: TupleType, return_type: Rc<Type>) -> Self {
        Type::new(TypeData::Function(Box::new(FunctionType {
            arguments: Rc::new(Type::new(TypeData::Tuple(Box::new(arguments)))),
            return_type,
        })))
    }

    pub fn tuple(elements: Vec<Rc<Type>>) -> Self {
        Type::new(TypeData::Tuple(Box::new(TupleType {
            elements,
            varargs: None,
        })))
    }

    pub fn tuple_varargs(elements: Vec<Rc<Type>>, varargs: Rc<Type>) -> Self {
        Type::new(TypeData::Tuple(Box::new(TupleType {
            elements,
            varargs: Some(varargs),
        })))
    }

    pub fn reference(inner: Rc<Type>) -> Self {
        Type::new(TypeData::Reference(inner))
    }

    pub fn list(element: Rc<Type>) -> Self {
        Type::new(TypeData::List(element))
    }

    pub fn set(element: Rc<Type>) -> Self {
        Type::new(TypeData::Set(element))
    }

    pub fn table(key: Rc<Type>, value: Rc<Type>) -> Self {
        Type::new(TypeData::Table(Box::new(TableType { key, value })))
    }

    pub fn composite(fields: impl IntoIterator<Item = (String, Rc<Type>)>) -> Self {
        Type::new(TypeData::Composite(Box::new(CompositeType {
            fields: fields.into_iter().collect(),
        })))
    }

    pub fn type_of(inner: Option<Rc<Type>>) -> Self {
        Type::new(TypeData::Type(inner))
    }

    /// Operand list must be non-empty.
    pub fn union(operands: Vec<Rc<Type>>) -> Self {
        debug_assert!(!operands.is_empty(), "union must have operands");
        Type::new(TypeData::Union(operands))
    }

    /// Operand list must be non-empty.
    pub fn intersection(operands: Vec<Rc<Type>>) -> Self {
        debug_assert!(!operands.is_empty(), "intersection must have operands");
        Type::new(TypeData::Intersection(operands))
    }

    pub fn negation(inner: Rc<Type>) -> Self {
        Type::new(TypeData::Not(inner))
    }

    pub fn base_type(kind: TypeKind) -> Self {
        Type::new(TypeData::BaseType(kind))
    }

    pub fn with_property_of(tag: PropertyTag, inner: Rc<Type>) -> Self {
        Type::new(TypeData::WithProperty(Box::new(WithPropertyType {
            tag,
            inner,
        })))
    }

    pub fn custom_matcher(
        name: impl Into<String>,
        type_matcher: Option<fn(&Type) -> TypeMatch>,
        value_matcher: Option<fn(&Value) -> bool>,
    ) -> Self {
        Type::new(TypeData::CustomMatcher(Box::new(CustomMatcherType {
            name: name.into(),
            type_matcher,
            value_matcher,
        })))
    }

    /// Attach a property to this type.
    pub fn with_property(mut self, tag: PropertyTag, arguments: Vec<Value>) -> Self {
        self.properties.insert(tag, arguments);
        self
    }

    /// The argument tuple of a function type, if this is one.
    pub fn function_arguments(&self) -> Option<&TupleType> {
        match &self.data {
            TypeData::Function(func) => match &func.arguments.data {
                TypeData::Tuple(tuple) => Some(tuple.as_ref()),
                _ => Option::None,
            },
            _ => Option::None,
        }
    }

    /// The return type of a function type, if this is one.
    pub fn function_return(&self) -> Option<&Rc<Type>> {
        match &self.data {
            TypeData::Function(func) => Some(&func.return_type),
            _ => Option::None,
        }
    }
}

impl From<TypeData> for Type {
    fn from(data: TypeData) -> Self {
        Type::new(data)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_type(self, f)
    }
}

fn display_list(types: &[Rc<Type>], sep: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

fn display_type(ty: &Type, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &ty.data {
        TypeData::NoneValue => write!(f, "NoneValue"),
        TypeData::Integer => write!(f, "Int"),
        TypeData::Unsigned => write!(f, "Uint"),
        TypeData::Float => write!(f, "Float"),
        TypeData::Boolean => write!(f, "Bool"),
        TypeData::String => write!(f, "Str"),
        TypeData::Expression => write!(f, "Expression"),
        TypeData::Statement => write!(f, "Statement"),
        TypeData::Scope => write!(f, "Scope"),
        TypeData::Function(func) => {
            write!(f, "{} -> {}", func.arguments, func.return_type)
        }
        TypeData::Tuple(tuple) => {
            write!(f, "(")?;
            display_list(&tuple.elements, ", ", f)?;
            if let Some(varargs) = &tuple.varargs {
                if !tuple.elements.is_empty() {
                    write!(f, ", ")?;
                }
                write!(f, "...{varargs}")?;
            }
            write!(f, ")")
        }
        TypeData::Reference(inner) => write!(f, "Ref[{inner}]"),
        TypeData::List(element) => write!(f, "List[{element}]"),
        TypeData::Set(element) => write!(f, "Set[{element}]"),
        TypeData::Table(table) => write!(f, "Table[{}, {}]", table.key, table.value),
        TypeData::Composite(composite) => {
            write!(f, "{{")?;
            for (i, (name, field)) in composite.fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{name}: {field}")?;
            }
            write!(f, "}}")
        }
        TypeData::Type(Some(inner)) => write!(f, "Type[{inner}]"),
        TypeData::Type(Option::None) => write!(f, "Type"),
        TypeData::Any => write!(f, "Any"),
        TypeData::None => write!(f, "None"),
        TypeData::Union(operands) => {
            write!(f, "Union[")?;
            display_list(operands, " | ", f)?;
            write!(f, "]")
        }
        TypeData::Intersection(operands) => {
            write!(f, "Intersection[")?;
            display_list(operands, " & ", f)?;
            write!(f, "]")
        }
        TypeData::Not(inner) => write!(f, "Not[{inner}]"),
        TypeData::BaseType(kind) => write!(f, "BaseType[{kind:?}]"),
        TypeData::WithProperty(wp) => {
            write!(f, "WithProperty[{}, {}]", wp.tag.name(), wp.inner)
        }
        TypeData::CustomMatcher(cm) => write!(f, "Matcher[{}]", cm.name),
    }
}
