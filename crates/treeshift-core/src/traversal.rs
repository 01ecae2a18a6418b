//! Writing values into the output tree
//!
//! A resolved output path is a list of [`TraversalStep`]s. Intermediate
//! steps create the containers they need; the final step accumulates, so two
//! writes to the same place produce an array rather than one overwriting the
//! other.
//!
//! When an intermediate step finds a value of the wrong shape (an object
//! where an index step needs an array, or a scalar anywhere) the value is
//! replaced with an empty container of the right shape and the data it held
//! is lost. A warning is logged when that discards anything but `null`.
//!
//! Index steps pad arrays with `null`, so an index above
//! [`MAX_ARRAY_INDEX`] is refused before anything is written.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::EvaluationError;
use log::warn;
use serde_json::{Map, Value};
use std::fmt;

/// Largest array index an index step may pad up to
pub const MAX_ARRAY_INDEX: usize = 1 << 20;

/// Check an index against [`MAX_ARRAY_INDEX`]
pub fn check_index(index: usize) -> Result<usize, EvaluationError> {
    if index > MAX_ARRAY_INDEX {
        return Err(EvaluationError::IndexTooLarge {
            index: index.to_string(),
            max: MAX_ARRAY_INDEX,
        });
    }
    Ok(index)
}

/// One concrete step of a resolved output path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalStep {
    /// Object key
    Key(String),
    /// Array position, padded with `null` when past the end
    Index(usize),
    /// New array element
    Append,
}

impl fmt::Display for TraversalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalStep::Key(key) => write!(f, ".{}", key),
            TraversalStep::Index(index) => write!(f, "[{}]", index),
            TraversalStep::Append => write!(f, "[]"),
        }
    }
}

/// Place `value` at the end of `steps`, creating containers along the way
///
/// Fails without touching `root` when an index step exceeds
/// [`MAX_ARRAY_INDEX`].
pub fn place(
    root: &mut Value,
    steps: &[TraversalStep],
    value: Value,
) -> Result<(), EvaluationError> {
    for step in steps {
        if let TraversalStep::Index(index) = step {
            check_index(*index)?;
        }
    }

    let Some((last, parents)) = steps.split_last() else {
        accumulate(root, value);
        return Ok(());
    };

    let mut current = root;
    for (position, step) in parents.iter().enumerate() {
        current = descend(current, step, steps, position);
    }

    match last {
        TraversalStep::Key(key) => {
            let slot = ensure_object(current, steps)
                .entry(key.clone())
                .or_insert(Value::Null);
            accumulate(slot, value);
        }
        TraversalStep::Index(index) => {
            let items = ensure_array(current, steps);
            pad(items, *index);
            accumulate(&mut items[*index], value);
        }
        TraversalStep::Append => ensure_array(current, steps).push(value),
    }
    Ok(())
}

/// Render steps as a path string for log messages
pub fn render(steps: &[TraversalStep]) -> String {
    steps.iter().map(ToString::to_string).collect()
}

fn descend<'v>(
    current: &'v mut Value,
    step: &TraversalStep,
    steps: &[TraversalStep],
    position: usize,
) -> &'v mut Value {
    match step {
        TraversalStep::Key(key) => ensure_object(current, &steps[..=position])
            .entry(key.clone())
            .or_insert(Value::Null),
        TraversalStep::Index(index) => {
            let items = ensure_array(current, &steps[..=position]);
            pad(items, *index);
            &mut items[*index]
        }
        TraversalStep::Append => {
            let items = ensure_array(current, &steps[..=position]);
            items.push(Value::Null);
            let end = items.len() - 1;
            &mut items[end]
        }
    }
}

/// Terminal write: fill an empty slot, otherwise collect into an array
fn accumulate(slot: &mut Value, value: Value) {
    match slot {
        Value::Null => *slot = value,
        Value::Array(items) => items.push(value),
        existing => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

// Callers have checked `index` against MAX_ARRAY_INDEX.
fn pad(items: &mut Vec<Value>, index: usize) {
    if items.len() <= index {
        items.resize(index + 1, Value::Null);
    }
}

// Wrong-shaped data is overwritten, not merged.
fn ensure_object<'v>(value: &'v mut Value, at: &[TraversalStep]) -> &'v mut Map<String, Value> {
    if !value.is_object() {
        discard(value, at, "object");
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

fn ensure_array<'v>(value: &'v mut Value, at: &[TraversalStep]) -> &'v mut Vec<Value> {
    if !value.is_array() {
        discard(value, at, "array");
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("value was just replaced with an array"),
    }
}

fn discard(value: &Value, at: &[TraversalStep], expected: &str) {
    if !value.is_null() {
        warn!(
            "Replacing {} at '{}' with an empty {}; its previous content is dropped",
            kind_name(value),
            render(at),
            expected
        );
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> TraversalStep {
        TraversalStep::Key(k.to_string())
    }

    #[test]
    fn test_place_creates_intermediate_objects() {
        let mut output = Value::Null;
        place(&mut output, &[key("a"), key("b")], json!(1)).unwrap();
        assert_eq!(output, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_second_write_accumulates_into_array() {
        let mut output = Value::Null;
        place(&mut output, &[key("x"), key("y")], json!(1)).unwrap();
        place(&mut output, &[key("x"), key("y")], json!(2)).unwrap();
        place(&mut output, &[key("x"), key("y")], json!(3)).unwrap();
        assert_eq!(output, json!({"x": {"y": [1, 2, 3]}}));
    }

    #[test]
    fn test_accumulating_onto_array_value_pushes() {
        let mut output = Value::Null;
        place(&mut output, &[key("tags")], json!(["a"])).unwrap();
        place(&mut output, &[key("tags")], json!("b")).unwrap();
        assert_eq!(output, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn test_append_always_pushes() {
        let mut output = Value::Null;
        place(&mut output, &[key("list"), TraversalStep::Append], json!(1)).unwrap();
        place(&mut output, &[key("list"), TraversalStep::Append], json!([2])).unwrap();
        assert_eq!(output, json!({"list": [1, [2]]}));
    }

    #[test]
    fn test_index_pads_with_null() {
        let mut output = Value::Null;
        place(&mut output, &[key("list"), TraversalStep::Index(2)], json!("c")).unwrap();
        assert_eq!(output, json!({"list": [null, null, "c"]}));

        place(&mut output, &[key("list"), TraversalStep::Index(0), key("id")], json!(7)).unwrap();
        assert_eq!(output, json!({"list": [{"id": 7}, null, "c"]}));
    }

    #[test]
    fn test_intermediate_append_creates_new_element() {
        let mut output = Value::Null;
        place(&mut output, &[TraversalStep::Append, key("id")], json!(1)).unwrap();
        place(&mut output, &[TraversalStep::Append, key("id")], json!(2)).unwrap();
        assert_eq!(output, json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_empty_steps_write_root() {
        let mut output = Value::Null;
        place(&mut output, &[], json!({"a": 1})).unwrap();
        assert_eq!(output, json!({"a": 1}));

        place(&mut output, &[], json!({"b": 2})).unwrap();
        assert_eq!(output, json!([{"a": 1}, {"b": 2}]));
    }

    #[test]
    fn test_wrong_shape_is_overwritten() {
        let mut output = Value::Null;
        place(&mut output, &[key("a")], json!("scalar")).unwrap();
        place(&mut output, &[key("a"), key("b")], json!(1)).unwrap();
        assert_eq!(output, json!({"a": {"b": 1}}));

        place(&mut output, &[key("a"), TraversalStep::Index(0)], json!(true)).unwrap();
        assert_eq!(output, json!({"a": [true]}));
    }

    #[test]
    fn test_index_zero_on_existing_empty_array() {
        let mut output = json!({"list": []});
        place(&mut output, &[key("list"), TraversalStep::Index(0)], json!("a")).unwrap();
        assert_eq!(output, json!({"list": ["a"]}));
    }

    #[test]
    fn test_index_at_limit_is_accepted() {
        let mut output = Value::Null;
        place(&mut output, &[TraversalStep::Index(MAX_ARRAY_INDEX)], json!(1)).unwrap();
        let items = output.as_array().unwrap();
        assert_eq!(items.len(), MAX_ARRAY_INDEX + 1);
        assert_eq!(items[MAX_ARRAY_INDEX], json!(1));
        assert!(items[0].is_null());
    }

    #[test]
    fn test_index_past_limit_is_refused_without_writing() {
        let mut output = json!({"kept": true});
        for index in [MAX_ARRAY_INDEX + 1, usize::MAX] {
            let err = place(
                &mut output,
                &[key("list"), TraversalStep::Index(index), key("id")],
                json!(1),
            )
            .unwrap_err();
            assert_eq!(
                err,
                EvaluationError::IndexTooLarge {
                    index: index.to_string(),
                    max: MAX_ARRAY_INDEX,
                }
            );
        }
        assert_eq!(output, json!({"kept": true}));

        let terminal = place(
            &mut output,
            &[key("list"), TraversalStep::Index(usize::MAX)],
            json!(1),
        );
        assert!(terminal.is_err());
        assert_eq!(output, json!({"kept": true}));
    }

    #[test]
    fn test_render_steps() {
        let steps = [key("a"), TraversalStep::Index(1), TraversalStep::Append];
        assert_eq!(render(&steps), ".a[1][]");
    }
}
