//! Property-based tests for the shift transform
//!
//! These tests check that shifting is deterministic, never aliases its input
//! and that spec compilation fails cleanly instead of panicking.

use super::Shift;
use crate::path::PathElement;
use crate::proptest_strategies::*;
use proptest::prelude::*;
use serde_json::{json, Value};

proptest! {
    /// Property: the same spec and input always give the same output
    #[test]
    fn prop_shift_is_idempotent(input in json_object_strategy()) {
        let shift = Shift::new(&json!({"*": "copy.&", "@": "whole"})).unwrap();
        let first = shift.apply(&input).unwrap();
        let second = shift.apply(&input).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: mutating the output leaves the input untouched
    #[test]
    fn prop_output_does_not_alias_input(input in json_object_strategy()) {
        let snapshot = input.clone();
        let shift = Shift::new(&json!({"@": "whole"})).unwrap();
        let mut output = shift.apply(&input).unwrap();
        if let Some(whole) = output.get_mut("whole") {
            *whole = Value::Null;
        }
        prop_assert_eq!(input, snapshot);
    }

    /// Property: a literal-only spec copies exactly the mapped keys
    #[test]
    fn prop_literal_spec_copies_values(
        input in json_object_strategy(),
        (spec, mapped) in literal_spec_strategy(),
    ) {
        let output = Shift::new(&spec).unwrap().apply(&input).unwrap();
        for (from, to) in &mapped {
            match input.get(from) {
                Some(value) => prop_assert_eq!(output.get(to), Some(value)),
                None => prop_assert!(output.get(to).is_none()),
            }
        }
    }

    /// Property: identity through the root path reproduces the input
    #[test]
    fn prop_root_transpose_is_identity(input in json_value_strategy()) {
        let output = Shift::new(&json!({"@": ""})).unwrap().apply(&input).unwrap();
        prop_assert_eq!(output, input);
    }

    /// Property: key parsing never panics
    #[test]
    fn prop_parse_input_key_never_panics(raw in raw_key_strategy()) {
        let _ = PathElement::parse_input_key(&raw);
    }

    /// Property: spec compilation never panics on arbitrary keys and paths
    #[test]
    fn prop_spec_build_never_panics(key in raw_key_strategy(), path in raw_key_strategy()) {
        let _ = Shift::new(&json!({ key: path }));
    }
}
