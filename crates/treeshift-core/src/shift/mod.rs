//! The shift transform
//!
//! A [`Shift`] relocates values of an input document into a new output
//! document. Its spec mirrors the shape of the input: keys match input keys
//! (literally, by wildcard, or by back-reference) and string values name the
//! output paths matched values are copied to.
//!
//! ```
//! use serde_json::json;
//! use treeshift_core::Shift;
//!
//! let shift = Shift::new(&json!({"rating": {"primary": {"value": "Rating"}}})).unwrap();
//! let output = shift.apply(&json!({"rating": {"primary": {"value": 3}}})).unwrap();
//! assert_eq!(output, json!({"Rating": 3}));
//! ```
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

mod walk;

#[cfg(test)]
mod prop_tests;

use crate::chain::{Context, Transform};
use crate::error::Result;
use crate::spec::{CompositeSpec, Spec, SpecBuilder};
use log::debug;
use serde_json::Value;

/// A compiled shift spec, reusable across inputs and threads
#[derive(Debug, Clone)]
pub struct Shift {
    root: CompositeSpec,
}

impl Shift {
    /// Compile a shift spec document
    pub fn new(spec: &Value) -> Result<Self> {
        let root = SpecBuilder::new().build_root(spec)?;
        debug!("Shift compiled with {} rules", rule_count(&root));
        Ok(Self { root })
    }

    /// Run the spec against one input
    ///
    /// Returns `Value::Null` when no rule wrote anything. The output never
    /// shares data with `input`.
    pub fn apply(&self, input: &Value) -> Result<Value> {
        let mut output = Value::Null;
        walk::apply_root(&self.root, input, &mut output)?;
        Ok(output)
    }

    /// The compiled root rule
    pub fn root(&self) -> &CompositeSpec {
        &self.root
    }
}

impl Transform for Shift {
    fn transform(&self, input: Value, _context: &Context) -> Result<Value> {
        self.apply(&input)
    }
}

fn rule_count(root: &CompositeSpec) -> usize {
    root.special_children().len()
        + root.literal_children().values().map(Spec::rule_count).sum::<usize>()
        + root.computed_children().iter().map(Spec::rule_count).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, EvaluationError, SpecError};
    use serde_json::json;

    fn shift(spec: Value, input: Value) -> Value {
        Shift::new(&spec).unwrap().apply(&input).unwrap()
    }

    #[test]
    fn test_literal_copy() {
        let output = shift(
            json!({"a": {"b": "x.y"}, "c": "z"}),
            json!({"a": {"b": [1, 2]}, "c": "text", "ignored": true}),
        );
        assert_eq!(output, json!({"x": {"y": [1, 2]}, "z": "text"}));
    }

    #[test]
    fn test_nothing_written_is_null() {
        assert_eq!(shift(json!({"missing": "x"}), json!({"a": 1})), Value::Null);
        assert_eq!(shift(json!({}), json!({"a": 1})), Value::Null);
    }

    #[test]
    fn test_identity_with_root_path() {
        let input = json!({"a": [1, {"b": null}], "c": "d"});
        assert_eq!(shift(json!({"@": ""}), input.clone()), input);
    }

    #[test]
    fn test_star_with_amp_renames_by_key() {
        let output = shift(
            json!({"*": "renamed.&"}),
            json!({"a": 1, "b": 2}),
        );
        assert_eq!(output, json!({"renamed": {"a": 1, "b": 2}}));
    }

    #[test]
    fn test_amp_one_is_parent_key() {
        let output = shift(
            json!({"rating": {"primary": {"value": "out.&1", "max": "out.&"}}}),
            json!({"rating": {"primary": {"value": 3, "max": 5}}}),
        );
        assert_eq!(output, json!({"out": {"primary": 3, "max": 5}}));
    }

    #[test]
    fn test_repeated_writes_accumulate() {
        let output = shift(
            json!({"a": "x.y", "b": "x.y"}),
            json!({"a": 1, "b": 2}),
        );
        assert_eq!(output, json!({"x": {"y": [1, 2]}}));
    }

    #[test]
    fn test_auto_expand_appends_in_order() {
        let output = shift(
            json!({"*": "list[]"}),
            json!({"first": "a", "second": "b", "third": "c"}),
        );
        assert_eq!(output, json!({"list": ["a", "b", "c"]}));
    }

    #[test]
    fn test_dotted_append_segment() {
        let output = shift(
            json!({"*": "list.[]"}),
            json!({"first": "a", "second": "b", "third": "c"}),
        );
        assert_eq!(output, json!({"list": ["a", "b", "c"]}));
    }

    #[test]
    fn test_index_zero_into_existing_empty_array() {
        let output = shift(
            json!({"a": "list", "b": "list[0]"}),
            json!({"a": [], "b": "x"}),
        );
        assert_eq!(output, json!({"list": ["x"]}));
    }

    #[test]
    fn test_explicit_index_past_limit_is_a_spec_error() {
        let spec = json!({"a": format!("x[{}]", usize::MAX)});
        match Shift::new(&spec) {
            Err(Error::InvalidSpec { source, .. }) => {
                assert!(matches!(source, SpecError::InvalidArrayIndex { .. }))
            }
            other => panic!("expected spec error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_referenced_index_past_limit_fails() {
        let shift = Shift::new(&json!({"*": "x[&0]"})).unwrap();
        for key in [usize::MAX.to_string(), "4000000000".to_string()] {
            let mut input = serde_json::Map::new();
            input.insert(key.clone(), json!(1));
            let result = shift.apply(&Value::Object(input));
            assert!(matches!(
                result,
                Err(Error::Evaluation(EvaluationError::IndexTooLarge { ref index, .. })) if *index == key
            ));
        }
    }

    #[test]
    fn test_array_input_indices_as_keys() {
        let output = shift(
            json!({"photos": {"*": {"url": "urls[&1]"}}}),
            json!({"photos": [{"url": "a.png"}, {"url": "b.png"}]}),
        );
        assert_eq!(output, json!({"urls": ["a.png", "b.png"]}));
    }

    #[test]
    fn test_hash_count_indexes_output() {
        let output = shift(
            json!({"*": {"keep": {"id": "items[#3].id"}}}),
            json!({"x": {"keep": {"id": 1}}, "y": {"drop": {}}, "z": {"keep": {"id": 3}}}),
        );
        assert_eq!(output, json!({"items": [{"id": 1}, null, {"id": 3}]}));
    }

    #[test]
    fn test_null_rule_claims_and_drops() {
        let output = shift(
            json!({"secret": null, "*": "rest.&"}),
            json!({"secret": 1, "open": 2}),
        );
        assert_eq!(output, json!({"rest": {"open": 2}}));
    }

    #[test]
    fn test_multiple_outputs() {
        let output = shift(json!({"a": ["x", "y"]}), json!({"a": 7}));
        assert_eq!(output, json!({"x": 7, "y": 7}));
    }

    #[test]
    fn test_scalar_matched_by_text() {
        let output = shift(
            json!({"status": {"active": {"#on": "flags.state"}, "idle": {"#off": "flags.state"}}}),
            json!({"status": "active"}),
        );
        assert_eq!(output, json!({"flags": {"state": "on"}}));
    }

    #[test]
    fn test_dollar_writes_key_and_capture() {
        let output = shift(
            json!({"tag-*": {"$": "keys[]", "$(0,1)": "names[]"}}),
            json!({"tag-red": {}, "tag-blue": {}}),
        );
        assert_eq!(
            output,
            json!({"keys": ["tag-red", "tag-blue"], "names": ["red", "blue"]})
        );
    }

    #[test]
    fn test_transpose_key_from_sibling_value() {
        let output = shift(
            json!({"*": {"name": "byId.@(1,id)"}}),
            json!({"a": {"id": "k1", "name": "first"}, "b": {"id": 2, "name": "second"}}),
        );
        assert_eq!(output, json!({"byId": {"k1": "first", "2": "second"}}));
    }

    #[test]
    fn test_transpose_special_copies_subtree() {
        let output = shift(
            json!({"wrapper": {"@(0,inner)": "moved"}}),
            json!({"wrapper": {"inner": {"deep": [1]}}}),
        );
        assert_eq!(output, json!({"moved": {"deep": [1]}}));
    }

    #[test]
    fn test_template_key_matches_evaluated_reference() {
        let output = shift(
            json!({"*": {"thumb-&0": "thumbs.&1"}}),
            json!({"large": {"thumb-large": "l.png", "thumb-small": "x"}}),
        );
        assert_eq!(output, json!({"thumbs": {"large": "l.png"}}));
    }

    #[test]
    fn test_reference_out_of_range_fails() {
        let result = Shift::new(&json!({"a": "x.&5"}))
            .unwrap()
            .apply(&json!({"a": 1}));
        assert!(matches!(
            result,
            Err(Error::Evaluation(EvaluationError::ReferenceOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_input_is_not_aliased() {
        let input = json!({"a": {"b": [1, 2]}});
        let mut output = shift(json!({"a": "copy"}), input.clone());
        output["copy"]["b"][0] = json!(99);
        assert_eq!(input, json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn test_shift_is_a_transform() {
        let stage: Box<dyn Transform> = Box::new(Shift::new(&json!({"a": "b"})).unwrap());
        let output = stage.transform(json!({"a": 1}), &Context::new()).unwrap();
        assert_eq!(output, json!({"b": 1}));
    }
}
