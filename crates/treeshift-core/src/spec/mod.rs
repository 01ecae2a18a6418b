//! Compiled shift specs
//!
//! A spec document is compiled once into a tree of [`Spec`] nodes and then
//! reused, read-only, for any number of inputs. Composite nodes mirror the
//! nested objects of the document; leaf nodes hold the output paths a
//! matched value is written to.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

mod builder;
mod matching;
mod ordering;

pub use builder::SpecBuilder;
pub(crate) use builder::{child_location, value_kind, ROOT_LOCATION};

use crate::path::{OutputPath, PathElement};
use std::collections::HashMap;

/// A compiled rule
#[derive(Debug, Clone)]
pub enum Spec {
    /// Rule whose right-hand side is an object
    Composite(CompositeSpec),
    /// Rule whose right-hand side is one or more output paths
    Leaf(LeafSpec),
}

/// A rule with nested rules
#[derive(Debug, Clone)]
pub struct CompositeSpec {
    element: PathElement,
    /// `&`, `$`, `#text` and `@` rules, fired once per visit
    special_children: Vec<LeafSpec>,
    /// Literal rules by key, including OR aliases
    literal_children: HashMap<String, Spec>,
    /// Template and wildcard rules in match priority order
    computed_children: Vec<Spec>,
}

/// A rule that writes the matched value
#[derive(Debug, Clone)]
pub struct LeafSpec {
    element: PathElement,
    outputs: Vec<OutputPath>,
}

impl Spec {
    /// The key this rule matches
    pub fn element(&self) -> &PathElement {
        match self {
            Spec::Composite(composite) => &composite.element,
            Spec::Leaf(leaf) => &leaf.element,
        }
    }

    /// Number of rules in this subtree, itself included
    pub fn rule_count(&self) -> usize {
        match self {
            Spec::Composite(composite) => 1 + composite.descendant_count(),
            Spec::Leaf(_) => 1,
        }
    }
}

impl CompositeSpec {
    /// Partition compiled children by how they are matched
    pub(crate) fn new(element: PathElement, children: Vec<Spec>) -> Self {
        let mut special_children = Vec::new();
        let mut literal_children = HashMap::new();
        let mut computed_children = Vec::new();

        for child in children {
            let literal = match child.element() {
                PathElement::Literal(key) => Some(key.clone()),
                _ => None,
            };
            match (child, literal) {
                (Spec::Leaf(leaf), _) if leaf.element.is_special() => special_children.push(leaf),
                (child, Some(key)) => {
                    literal_children.insert(key, child);
                }
                (child, None) => computed_children.push(child),
            }
        }
        computed_children.sort_by(ordering::compare_computed);

        Self {
            element,
            special_children,
            literal_children,
            computed_children,
        }
    }

    pub fn element(&self) -> &PathElement {
        &self.element
    }

    pub fn special_children(&self) -> &[LeafSpec] {
        &self.special_children
    }

    pub fn literal_children(&self) -> &HashMap<String, Spec> {
        &self.literal_children
    }

    pub fn computed_children(&self) -> &[Spec] {
        &self.computed_children
    }

    fn descendant_count(&self) -> usize {
        self.special_children.len()
            + self.literal_children.values().map(Spec::rule_count).sum::<usize>()
            + self.computed_children.iter().map(Spec::rule_count).sum::<usize>()
    }
}

impl LeafSpec {
    pub(crate) fn new(element: PathElement, outputs: Vec<OutputPath>) -> Self {
        Self { element, outputs }
    }

    pub fn element(&self) -> &PathElement {
        &self.element
    }

    /// Output paths; empty for a rule that only claims and drops its key
    pub fn outputs(&self) -> &[OutputPath] {
        &self.outputs
    }
}
