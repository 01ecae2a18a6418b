//! Parallel walk of a compiled spec and an input document
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::EvaluationError;
use crate::path::element::key_text;
use crate::path::{OutputPath, PathElement};
use crate::spec::{CompositeSpec, LeafSpec, Spec};
use crate::traversal::{self, place};
use crate::walked::{MatchedElement, WalkedPath, ROOT_KEY};
use log::trace;
use serde_json::Value;

type WalkResult = std::result::Result<(), EvaluationError>;

/// Walk `input` with the root rule, writing into `output`
pub(super) fn apply_root(root: &CompositeSpec, input: &Value, output: &mut Value) -> WalkResult {
    let mut walked = WalkedPath::new();
    apply_composite(root, Some(input), MatchedElement::new(ROOT_KEY), &mut walked, output)
}

fn apply_composite<'a>(
    spec: &CompositeSpec,
    input: Option<&'a Value>,
    matched: MatchedElement,
    walked: &mut WalkedPath<'a>,
    output: &mut Value,
) -> WalkResult {
    walked.push(input, matched);

    for special in spec.special_children() {
        apply_special(special, walked, output)?;
    }
    if let Some(input) = input {
        walk_children(spec, input, walked, output)?;
    }

    walked.pop();
    walked.increment_hash_count();
    Ok(())
}

fn walk_children<'a>(
    spec: &CompositeSpec,
    input: &'a Value,
    walked: &mut WalkedPath<'a>,
    output: &mut Value,
) -> WalkResult {
    match input {
        Value::Object(map) => {
            for (key, value) in map {
                visit(spec, key, Some(value), walked, output)?;
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                visit(spec, &index.to_string(), Some(value), walked, output)?;
            }
        }
        Value::Null => {}
        scalar => {
            if let Some(text) = key_text(scalar) {
                visit(spec, &text, None, walked, output)?;
            }
        }
    }
    Ok(())
}

fn visit<'a>(
    parent: &CompositeSpec,
    key: &str,
    value: Option<&'a Value>,
    walked: &mut WalkedPath<'a>,
    output: &mut Value,
) -> WalkResult {
    let Some((rule, matched)) = parent.find_owning_rule(key, walked)? else {
        return Ok(());
    };

    match rule {
        Spec::Composite(composite) => apply_composite(composite, value, matched, walked, output),
        Spec::Leaf(leaf) => {
            walked.push(value, matched);
            if let Some(value) = value {
                write_all(leaf.outputs(), value, walked, output)?;
            }
            walked.pop();
            walked.increment_hash_count();
            Ok(())
        }
    }
}

/// Fire a self-reference rule against the current level
fn apply_special<'a>(
    special: &LeafSpec,
    walked: &mut WalkedPath<'a>,
    output: &mut Value,
) -> WalkResult {
    let (frame_input, frame_key, value) = match special.element() {
        PathElement::Reference(reference) => {
            let key = walked.resolve(reference)?;
            (None, key.clone(), Value::String(key))
        }
        PathElement::HashLiteral(text) => (None, text.clone(), Value::String(text.clone())),
        PathElement::Transpose(transpose) => {
            let Some(found) = transpose.lookup(walked)? else {
                trace!("Nothing found for '{}', skipping", transpose.canonical_form());
                return Ok(());
            };
            let key = transpose.frame_key(walked).unwrap_or_default();
            (Some(found), key, found.clone())
        }
        other => {
            trace!("Rule '{}' is not a self-reference, ignoring", other);
            return Ok(());
        }
    };

    walked.push(frame_input, MatchedElement::new(frame_key));
    let written = write_all(special.outputs(), &value, walked, output);
    walked.pop();
    written
}

fn write_all(
    outputs: &[OutputPath],
    value: &Value,
    walked: &WalkedPath<'_>,
    output: &mut Value,
) -> WalkResult {
    for path in outputs {
        match path.evaluate(walked)? {
            Some(steps) => {
                trace!("Writing to '{}'", traversal::render(&steps));
                place(output, &steps, value.clone())?;
            }
            None => trace!("Output path '{}' resolved to nothing, skipping", path),
        }
    }
    Ok(())
}
