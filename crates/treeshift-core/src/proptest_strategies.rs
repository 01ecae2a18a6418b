//! Property-based testing strategies for generating test data
//!
//! Strategies for random input documents, literal-only shift specs and
//! arbitrary key text.

#![cfg(test)]

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Keys without characters that carry meaning in specs
pub fn plain_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,8}"
}

/// Arbitrary key text, including the characters specs treat specially
pub fn raw_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9&$#@*|.\\\\()\\[\\],-]{0,12}"
}

/// JSON values with bounded depth and width
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 24, 5, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..5).prop_map(Value::Array),
            btree_map(plain_key_strategy(), inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Object documents, the usual shape of a shift input
pub fn json_object_strategy() -> impl Strategy<Value = Value> {
    btree_map(plain_key_strategy(), json_value_strategy(), 0..6)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

/// A spec copying some top-level keys to distinct output keys
///
/// Yields the spec together with the `(input key, output key)` pairs it maps.
pub fn literal_spec_strategy() -> impl Strategy<Value = (Value, Vec<(String, String)>)> {
    btree_map(plain_key_strategy(), plain_key_strategy(), 1..6).prop_map(|pairs| {
        let mut spec = Map::new();
        let mut mapped = Vec::new();
        for (index, (from, to)) in pairs.into_iter().enumerate() {
            let target = format!("{}_{}", to, index);
            spec.insert(from.clone(), Value::String(target.clone()));
            mapped.push((from, target));
        }
        (Value::Object(spec), mapped)
    })
}
