//! The ordered type-match relation.
//!
//! `type_match(matcher, t)` asks whether the set described by `t` fits the
//! set described by `matcher`, answering in an eight-element ordered
//! lattice. The same order serves two purposes: lattice folds (`min` over
//! structural fields, `max` over union operands) and dispatch ranking
//! (higher outcomes beat lower ones when selecting an overload).
//!
//! `Equal` is only produced by the operand-identity fast path; structural
//! twins cap at `AlmostEqual`, which keeps `Equal` trivially symmetric.

use std::rc::Rc;

use tracing::trace;

use crate::types::{TupleType, Type, TypeData};

// =============================================================================
// TypeMatch
// =============================================================================

/// Outcome of a type match, ordered from least to most favorable:
///
/// `Unknown < None < FiniteFalse < False < True < FiniteTrue < AlmostEqual < Equal`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeMatch {
    /// The matcher is not informative in this direction; the caller may try
    /// the converse.
    Unknown,
    /// Strong incompatibility; short-circuits any composition.
    None,
    FiniteFalse,
    False,
    True,
    /// A more specific class of success; wins against `True` in ranking.
    FiniteTrue,
    /// Equivalent for dispatch purposes, differing only in metadata.
    AlmostEqual,
    /// Same set, structurally identical. Symmetric.
    Equal,
}

impl TypeMatch {
    /// The match succeeds.
    pub fn matches(self) -> bool {
        self >= TypeMatch::True
    }

    /// Swap success and failure: `True ↔ False`, `FiniteTrue ↔ FiniteFalse`;
    /// the remaining outcomes are self-converse.
    pub fn converse(self) -> TypeMatch {
        match self {
            TypeMatch::True => TypeMatch::False,
            TypeMatch::False => TypeMatch::True,
            TypeMatch::FiniteTrue => TypeMatch::FiniteFalse,
            TypeMatch::FiniteFalse => TypeMatch::FiniteTrue,
            other => other,
        }
    }
}

/// Combine per-field matches of a structural type: pointwise `min` starting
/// from `Equal`, with `None` short-circuiting the whole fold.
pub fn reduce_matches(matches: impl IntoIterator<Item = TypeMatch>) -> TypeMatch {
    let mut reduced = TypeMatch::Equal;
    for m in matches {
        if m == TypeMatch::None {
            return TypeMatch::None;
        }
        reduced = reduced.min(m);
    }
    reduced
}

// =============================================================================
// The match relation
// =============================================================================

/// Match `candidate` against `matcher`.
pub fn type_match(matcher: &Type, candidate: &Type) -> TypeMatch {
    // Identical operand reference is the only way to observe `Equal`.
    if std::ptr::eq(matcher, candidate) {
        return TypeMatch::Equal;
    }

    let mut result = match_data(matcher, candidate);
    if result == TypeMatch::None {
        trace!(matcher = %matcher, candidate = %candidate, "type_match: none");
        return TypeMatch::None;
    }
    // Concrete equality is only reached by the fast path above.
    result = result.min(TypeMatch::AlmostEqual);

    // Properties on the matcher fold in as additional predicates.
    for property in matcher.properties.iter() {
        if let Some(predicate) = property.tag.type_matcher() {
            result = result.min(predicate(candidate, &property.arguments));
            if result == TypeMatch::None {
                return TypeMatch::None;
            }
        }
    }
    result
}

fn match_data(matcher: &Type, candidate: &Type) -> TypeMatch {
    match &matcher.data {
        TypeData::Any => TypeMatch::True,
        TypeData::None => TypeMatch::Unknown,
        TypeData::Union(operands) => {
            // Track the maximum; saturate at FiniteTrue once reached (a
            // union is never Equal to one of its members).
            let mut best = TypeMatch::Unknown;
            for operand in operands {
                best = best.max(type_match(operand, candidate));
                if best >= TypeMatch::FiniteTrue {
                    return TypeMatch::FiniteTrue;
                }
            }
            best
        }
        TypeData::Intersection(operands) => {
            // Track the minimum; None short-circuits, anything at or below
            // FiniteFalse saturates there.
            let mut worst = TypeMatch::Equal;
            for operand in operands {
                let m = type_match(operand, candidate);
                if m == TypeMatch::None {
                    return TypeMatch::None;
                }
                worst = worst.min(m);
                if worst <= TypeMatch::FiniteFalse {
                    return TypeMatch::FiniteFalse;
                }
            }
            worst
        }
        TypeData::Not(inner) => type_match(inner, candidate).converse(),
        TypeData::BaseType(kind) => {
            if candidate.kind() == *kind {
                TypeMatch::True
            } else {
                TypeMatch::False
            }
        }
        TypeData::WithProperty(wp) => {
            let tagged = if candidate.properties.has(&wp.tag) {
                TypeMatch::AlmostEqual
            } else {
                TypeMatch::FiniteFalse
            };
            // The inner type applies as a covariant bound.
            tagged.min(TypeBound::covariant(wp.inner.clone()).match_against(candidate))
        }
        TypeData::CustomMatcher(cm) => match cm.type_matcher {
            Some(predicate) => predicate(candidate),
            None => TypeMatch::None,
        },
        _ => match_concrete(matcher, candidate),
    }
}

/// `matcher` is of concrete kind here.
fn match_concrete(matcher: &Type, candidate: &Type) -> TypeMatch {
    if !candidate.is_concrete() {
        // A concrete matcher cannot decide against a typeclass; let the
        // caller consult the converse direction.
        return TypeMatch::Unknown;
    }
    if matcher.kind() != candidate.kind() {
        return TypeMatch::None;
    }
    if matcher.kind().is_atomic() {
        return TypeMatch::AlmostEqual;
    }

    match (&matcher.data, &candidate.data) {
        // Element covariant.
        (TypeData::Reference(m), TypeData::Reference(t))
        | (TypeData::List(m), TypeData::List(t))
        | (TypeData::Set(m), TypeData::Set(t)) => type_match(m, t),
        // Arguments contravariant, return covariant.
        (TypeData::Function(m), TypeData::Function(t)) => reduce_matches([
            type_match(&t.arguments, &m.arguments),
            type_match(&m.return_type, &t.return_type),
        ]),
        // Both covariant.
        (TypeData::Table(m), TypeData::Table(t)) => reduce_matches([
            type_match(&m.key, &t.key),
            type_match(&m.value, &t.value),
        ]),
        (TypeData::Tuple(m), TypeData::Tuple(t)) => tuple_match(m, t),
        (TypeData::Composite(m), TypeData::Composite(t)) => {
            // Same key set, pointwise covariant on the field types.
            if m.fields.len() != t.fields.len() {
                return TypeMatch::None;
            }
            let mut reduced = TypeMatch::Equal;
            for ((name_m, field_m), (name_t, field_t)) in m.fields.iter().zip(t.fields.iter()) {
                if name_m != name_t {
                    return TypeMatch::None;
                }
                let field = type_match(field_m, field_t);
                if field == TypeMatch::None {
                    return TypeMatch::None;
                }
                reduced = reduced.min(field);
            }
            reduced
        }
        (TypeData::Type(m), TypeData::Type(t)) => match (m, t) {
            (Some(m), Some(t)) => type_match(m, t),
            (None, None) => TypeMatch::Equal,
            // An unconstrained matcher accepts any described type.
            (None, Some(_)) => TypeMatch::True,
            (Some(_), None) => TypeMatch::Unknown,
        },
        _ => TypeMatch::None,
    }
}

/// Elementwise covariant; lengths must agree unless the matcher has a
/// variadic tail, which then absorbs surplus candidate elements. A
/// candidate-only tail (or a plain length mismatch) is `None`.
fn tuple_match(matcher: &TupleType, candidate: &TupleType) -> TypeMatch {
    match (&matcher.varargs, &candidate.varargs) {
        (None, None) => {
            if matcher.elements.len() != candidate.elements.len() {
                return TypeMatch::None;
            }
            reduce_matches(
                matcher
                    .elements
                    .iter()
                    .zip(&candidate.elements)
                    .map(|(m, t)| type_match(m, t)),
            )
        }
        (Some(matcher_tail), Some(candidate_tail)) => {
            if matcher.elements.len() != candidate.elements.len() {
                return TypeMatch::None;
            }
            reduce_matches(
                matcher
                    .elements
                    .iter()
                    .zip(&candidate.elements)
                    .map(|(m, t)| type_match(m, t))
                    .chain([type_match(matcher_tail, candidate_tail)]),
            )
        }
        (Some(matcher_tail), None) => {
            if candidate.elements.len() < matcher.elements.len() {
                return TypeMatch::None;
            }
            let fixed = matcher.elements.len();
            reduce_matches(
                matcher
                    .elements
                    .iter()
                    .zip(&candidate.elements)
                    .map(|(m, t)| type_match(m, t))
                    .chain(
                        candidate.elements[fixed..]
                            .iter()
                            .map(|t| type_match(matcher_tail, t)),
                    ),
            )
        }
        (None, Some(_)) => TypeMatch::None,
    }
}

// =============================================================================
// Bounds, ordering, joins
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
    /// Reserved; currently behaves as `Invariant`.
    Ultravariant,
}

/// A type paired with a variance, used for subtyping checks.
#[derive(Clone, Debug)]
pub struct TypeBound {
    pub bound: Rc<Type>,
    pub variance: Variance,
}

impl TypeBound {
    pub fn covariant(bound: Rc<Type>) -> Self {
        TypeBound {
            bound,
            variance: Variance::Covariant,
        }
    }

    pub fn contravariant(bound: Rc<Type>) -> Self {
        TypeBound {
            bound,
            variance: Variance::Contravariant,
        }
    }

    /// Match a candidate against this bound, consulting the converse
    /// direction when the primary one is uninformative.
    pub fn match_against(&self, candidate: &Type) -> TypeMatch {
        match self.variance {
            Variance::Covariant => {
                let primary = type_match(&self.bound, candidate);
                if primary == TypeMatch::Unknown {
                    type_match(candidate, &self.bound).converse()
                } else {
                    primary
                }
            }
            Variance::Contravariant => {
                let primary = type_match(candidate, &self.bound);
                if primary == TypeMatch::Unknown {
                    type_match(&self.bound, candidate).converse()
                } else {
                    primary
                }
            }
            Variance::Invariant | Variance::Ultravariant => {
                let primary = type_match(&self.bound, candidate);
                if primary == TypeMatch::Unknown {
                    primary.max(type_match(candidate, &self.bound))
                } else {
                    primary
                }
            }
        }
    }

    pub fn matches(&self, candidate: &Type) -> bool {
        self.match_against(candidate).matches()
    }
}

/// Signed ordering between two types: positive when `a` sits above `b`
/// (matches it more strongly than the reverse), negative for the converse,
/// zero when the directions agree.
pub fn compare(a: &Type, b: &Type) -> i32 {
    type_match(a, b) as i32 - type_match(b, a) as i32
}

/// The common supertype of `a` and `b`: whichever side the ordering favors,
/// or their union when neither subsumes the other.
pub fn common_type(a: &Rc<Type>, b: &Rc<Type>) -> Rc<Type> {
    let forward = type_match(a, b);
    if forward == TypeMatch::Equal {
        return a.clone();
    }
    let backward = type_match(b, a);
    if forward.matches() && forward >= backward {
        a.clone()
    } else if backward.matches() {
        b.clone()
    } else {
        Rc::new(Type::union(vec![a.clone(), b.clone()]))
    }
}
