//! The algebraic type model.
//!
//! Types describe sets of values. Concrete kinds describe a single class of
//! runtime values; typeclass kinds (`Any`, `None`, `Union`, ...) describe
//! sets of types; `CustomMatcher` delegates to host-supplied predicates.
//! Every type carries a `Properties` bag regardless of kind.

mod property;
mod type_def;

pub use property::{Properties, Property, PropertyTag, template_tag, typed_template_tag};
pub use type_def::{
    CompositeType, CustomMatcherType, FunctionType, TableType, TupleType, Type, TypeData, TypeKind,
    WithPropertyType,
};
