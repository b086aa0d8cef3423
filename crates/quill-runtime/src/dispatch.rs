//! Runtime overload selection.
//!
//! Each candidate's declared parameter types are matched covariantly
//! against the runtime argument types, reduced across arguments by `min`.
//! Candidates that fail are eliminated; survivors are ranked by their
//! reduced `TypeMatch` (higher wins). Equal-score survivors are broken by
//! specificity (the candidate whose whole signature sits below the others
//! in the type ordering), then by declaration order; a tie between
//! incomparable signatures is a dispatch failure.

use std::cmp::Ordering;
use std::rc::Rc;

use tracing::debug;

use quill_common::diagnostics::{EvalError, EvalErrorKind};
use quill_core::instruction::DispatchCandidate;
use quill_core::relate::{TypeBound, TypeMatch, compare};
use quill_core::types::Type;

/// Score one candidate signature against the runtime argument types.
/// `None` when the arity differs or any parameter rejects its argument.
pub fn rank_candidate(parameter_types: &[Rc<Type>], argument_types: &[Type]) -> TypeMatch {
    if parameter_types.len() != argument_types.len() {
        return TypeMatch::None;
    }
    let mut reduced = TypeMatch::Equal;
    for (parameter, argument) in parameter_types.iter().zip(argument_types) {
        let score = TypeBound::covariant(parameter.clone()).match_against(argument);
        if score == TypeMatch::None {
            return TypeMatch::None;
        }
        reduced = reduced.min(score);
    }
    reduced
}

/// Pick the winning candidate index for the given runtime argument types.
pub fn select_candidate(
    candidates: &[DispatchCandidate],
    argument_types: &[Type],
) -> Result<usize, EvalError> {
    let mut survivors: Vec<(usize, TypeMatch)> = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let score = rank_candidate(&candidate.parameter_types, argument_types);
        debug!(candidate = index, score = ?score, "trying overload");
        if score.matches() {
            survivors.push((index, score));
        }
    }

    let Some(&(_, best_score)) = survivors.iter().max_by_key(|(_, score)| *score) else {
        return Err(EvalError::new(
            EvalErrorKind::NoOverloadFound,
            "no overload accepts the argument types",
        ));
    };
    let top: Vec<usize> = survivors
        .iter()
        .filter(|(_, score)| *score == best_score)
        .map(|(index, _)| *index)
        .collect();
    if top.len() == 1 {
        return Ok(top[0]);
    }

    // Equal scores: prefer the strictly most specific signature.
    for &index in &top {
        let mut dominates_all = true;
        for &other in &top {
            if other == index {
                continue;
            }
            match compare_signatures(
                &candidates[index].parameter_types,
                &candidates[other].parameter_types,
            ) {
                Some(Ordering::Less) | Some(Ordering::Equal) => {}
                _ => {
                    dominates_all = false;
                    break;
                }
            }
        }
        if dominates_all {
            // Declaration order resolves exact-equal signatures: `top` is
            // ordered, so the first dominator wins.
            return Ok(index);
        }
    }

    Err(EvalError::new(
        EvalErrorKind::NoOverloadFound,
        "ambiguous dispatch: candidates have incomparable specificity",
    ))
}

/// Pointwise specificity ordering over two equal-arity signatures:
/// `Less` when `a` is at least as specific everywhere (its parameters sit
/// at or below `b`'s) and strictly more specific somewhere; `None` when
/// the comparison points both ways.
fn compare_signatures(a: &[Rc<Type>], b: &[Rc<Type>]) -> Option<Ordering> {
    if a.len() != b.len() {
        return None;
    }
    let mut saw_less = false;
    let mut saw_greater = false;
    for (pa, pb) in a.iter().zip(b) {
        match compare(pa, pb).signum() {
            // pa sits above pb: pa is the more general parameter.
            1 => saw_greater = true,
            -1 => saw_less = true,
            _ => {}
        }
    }
    match (saw_less, saw_greater) {
        (true, true) => None,
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => Some(Ordering::Equal),
    }
}
