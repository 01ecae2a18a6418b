//! Compiling spec documents into rule trees
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::{CompositeSpec, LeafSpec, Spec};
use crate::error::{Result, SpecError};
use crate::path::{split_top_level, OutputPath, PathElement};
use crate::walked::ROOT_KEY;
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Location reported for errors in the top-level object
pub(crate) const ROOT_LOCATION: &str = "<root>";

/// Compiles raw spec objects into [`Spec`] trees
#[derive(Debug, Clone, Default)]
pub struct SpecBuilder;

impl SpecBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Compile a whole spec document; it must be an object
    pub fn build_root(&self, spec: &Value) -> Result<CompositeSpec> {
        let raw = spec.as_object().ok_or_else(|| {
            SpecError::InvalidRoot {
                expected: "an object".to_string(),
                found: value_kind(spec).to_string(),
            }
            .at(ROOT_LOCATION)
        })?;

        let children = self.build(raw, "")?;
        let root = CompositeSpec::new(PathElement::Literal(ROOT_KEY.to_string()), children);
        debug!(
            "Compiled shift spec: {} literal, {} computed, {} special top-level rules",
            root.literal_children().len(),
            root.computed_children().len(),
            root.special_children().len()
        );
        Ok(root)
    }

    /// Compile the entries of one spec object into sibling rules
    ///
    /// `location` is the dotted path of the object inside the document, empty
    /// for the top level.
    pub fn build(&self, raw: &Map<String, Value>, location: &str) -> Result<Vec<Spec>> {
        let mut rules = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();

        for (key, value) in raw {
            let here = child_location(location, key);
            for alternative in split_top_level(key, '|') {
                if alternative.is_empty() {
                    return Err(SpecError::UnsupportedKey {
                        key: key.clone(),
                        message: "empty alternative in '|' key".to_string(),
                    }
                    .at(here));
                }

                let element = PathElement::parse_input_key(alternative)
                    .map_err(|e| e.at(here.as_str()))?;
                if !seen.insert(element.canonical_form()) {
                    return Err(SpecError::DuplicateKey {
                        canonical: element.canonical_form(),
                    }
                    .at(here));
                }

                rules.push(self.build_rule(element, key, value, &here)?);
            }
        }

        Ok(rules)
    }

    fn build_rule(
        &self,
        element: PathElement,
        key: &str,
        value: &Value,
        location: &str,
    ) -> Result<Spec> {
        let invalid = |message: &str| {
            SpecError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            }
            .at(location)
        };

        let outputs = match value {
            Value::Object(nested) => {
                if element.is_special() {
                    return Err(invalid("a self-reference key needs output paths, not an object"));
                }
                let children = self.build(nested, location)?;
                return Ok(Spec::Composite(CompositeSpec::new(element, children)));
            }
            Value::Null => Vec::new(),
            Value::String(path) => vec![self.output(path, location)?],
            Value::Number(number) => vec![self.output(&number.to_string(), location)?],
            Value::Bool(flag) => vec![self.output(&flag.to_string(), location)?],
            Value::Array(paths) => {
                let mut outputs = Vec::with_capacity(paths.len());
                for path in paths {
                    let path = path
                        .as_str()
                        .ok_or_else(|| invalid("output path lists may only hold strings"))?;
                    outputs.push(self.output(path, location)?);
                }
                outputs
            }
        };

        Ok(Spec::Leaf(LeafSpec::new(element, outputs)))
    }

    fn output(&self, path: &str, location: &str) -> Result<OutputPath> {
        OutputPath::parse(path).map_err(|e| e.at(location))
    }
}

/// Dotted location of `key` inside the object at `parent`
pub(crate) fn child_location(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn build(spec: Value) -> Result<CompositeSpec> {
        SpecBuilder::new().build_root(&spec)
    }

    fn spec_error(spec: Value) -> (String, SpecError) {
        match build(spec) {
            Err(Error::InvalidSpec { location, source }) => (location, source),
            other => panic!("expected a spec error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_root_must_be_object() {
        let (location, error) = spec_error(json!(["a"]));
        assert_eq!(location, ROOT_LOCATION);
        assert!(matches!(error, SpecError::InvalidRoot { .. }));
    }

    #[test]
    fn test_or_keys_share_the_right_hand_side() {
        let root = build(json!({"a|b": "out"})).unwrap();
        for key in ["a", "b"] {
            match &root.literal_children()[key] {
                Spec::Leaf(leaf) => assert_eq!(leaf.outputs()[0].raw(), "out"),
                other => panic!("expected leaf, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_right_hand_side_shapes() {
        let root = build(json!({
            "many": ["x", "y.z"],
            "drop": null,
            "num": 5,
            "flag": true
        }))
        .unwrap();
        let outputs = |key: &str| match &root.literal_children()[key] {
            Spec::Leaf(leaf) => leaf.outputs().iter().map(|o| o.raw().to_string()).collect::<Vec<_>>(),
            other => panic!("expected leaf, got {:?}", other),
        };

        assert_eq!(outputs("many"), vec!["x", "y.z"]);
        assert!(outputs("drop").is_empty());
        assert_eq!(outputs("num"), vec!["5"]);
        assert_eq!(outputs("flag"), vec!["true"]);
    }

    #[test]
    fn test_duplicate_canonical_keys() {
        let (location, error) = spec_error(json!({"&1": "a", "&(1,0)": "b"}));
        assert_eq!(location, "&(1,0)");
        assert_eq!(
            error,
            SpecError::DuplicateKey {
                canonical: "&(1,0)".to_string()
            }
        );

        let (_, error) = spec_error(json!({"a|a": "x"}));
        assert!(matches!(error, SpecError::DuplicateKey { .. }));
    }

    #[test]
    fn test_errors_carry_nested_location() {
        let (location, error) = spec_error(json!({"rating": {"*": {"a.b": "x"}}}));
        assert_eq!(location, "rating.*.a.b");
        assert!(matches!(error, SpecError::IllegalCharacter { character: '.', .. }));
    }

    #[test]
    fn test_invalid_right_hand_sides() {
        let (_, error) = spec_error(json!({"a": [1]}));
        assert!(matches!(error, SpecError::InvalidValue { .. }));

        let (_, error) = spec_error(json!({"&": {"x": "y"}}));
        assert!(matches!(error, SpecError::InvalidValue { .. }));

        let (_, error) = spec_error(json!({"a": "x[-1]"}));
        assert!(matches!(error, SpecError::InvalidArrayIndex { .. }));

        let (_, error) = spec_error(json!({"a": "x..y"}));
        assert!(matches!(error, SpecError::InvalidOutputPath { .. }));
    }

    #[test]
    fn test_malformed_keys() {
        let (_, error) = spec_error(json!({"a|": "x"}));
        assert!(matches!(error, SpecError::UnsupportedKey { .. }));

        let (_, error) = spec_error(json!({"&(1": "x"}));
        assert!(matches!(error, SpecError::MalformedReference { .. }));

        let (_, error) = spec_error(json!({"x-&-1": "x"}));
        assert!(matches!(error, SpecError::NegativeReference { .. }));
    }
}
