//! Precedence between computed sibling rules
//!
//! Templates come first, then wildcards with more literal characters, then
//! wildcards with fewer stars, then canonical text; `*` is always last.

use super::Spec;
use crate::path::PathElement;
use std::cmp::Ordering;

/// Sort order for the computed children of a composite rule
pub(crate) fn compare_computed(a: &Spec, b: &Spec) -> Ordering {
    let (a, b) = (a.element(), b.element());
    rank(a)
        .cmp(&rank(b))
        .then_with(|| literal_len(b).cmp(&literal_len(a)))
        .then_with(|| star_count(a).cmp(&star_count(b)))
        .then_with(|| a.canonical_form().cmp(&b.canonical_form()))
}

fn rank(element: &PathElement) -> u8 {
    match element {
        PathElement::Template(_) => 0,
        PathElement::StarSingle(_) | PathElement::StarMulti(_) => 1,
        PathElement::StarAll => 2,
        _ => 3,
    }
}

fn literal_len(element: &PathElement) -> usize {
    match element {
        PathElement::Template(template) => template.literal_len(),
        PathElement::StarSingle(star) => star.literal_len(),
        PathElement::StarMulti(star) => star.literal_len(),
        _ => 0,
    }
}

fn star_count(element: &PathElement) -> usize {
    match element {
        PathElement::StarSingle(_) | PathElement::StarAll => 1,
        PathElement::StarMulti(star) => star.stars(),
        _ => 0,
    }
}
