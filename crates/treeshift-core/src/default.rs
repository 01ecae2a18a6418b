//! The default transform
//!
//! Fills in values that are missing (or `null`) in a document. The spec is a
//! tree of the defaults to apply:
//!
//! * `"key": value` sets `key` when it is absent or `null`;
//! * `"key": {...}` creates an object at `key` when absent and recurses;
//! * `"key[]": {...}` does the same with an array container, whose nested
//!   literal keys are indices;
//! * `"a|b": ...` and `"*": ...` apply to keys that already exist.
//!
//! Literal entries are applied first, then `|` entries, then `*`, so a
//! literal default is visible to a wildcard default applied after it.

use crate::chain::{Context, Transform};
use crate::error::{Result, SpecError};
use crate::path::{count_unescaped, split_top_level, unescape};
use crate::spec::{child_location, value_kind, ROOT_LOCATION};
use crate::traversal::MAX_ARRAY_INDEX;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A compiled default spec
#[derive(Debug, Clone)]
pub struct Defaults {
    root: DefaultNode,
}

#[derive(Debug, Clone, PartialEq)]
struct DefaultNode {
    array: bool,
    literal: Vec<(String, DefaultValue)>,
    alternatives: Vec<(Vec<String>, DefaultValue)>,
    star: Option<Box<DefaultValue>>,
}

#[derive(Debug, Clone, PartialEq)]
enum DefaultValue {
    Leaf(Value),
    Node(DefaultNode),
}

impl Defaults {
    /// Compile a default spec; it must be an object
    pub fn new(spec: &Value) -> Result<Self> {
        let raw = spec.as_object().ok_or_else(|| {
            SpecError::InvalidRoot {
                expected: "an object".to_string(),
                found: value_kind(spec).to_string(),
            }
            .at(ROOT_LOCATION)
        })?;
        let root = DefaultNode::build(raw, false, "")?;
        debug!(
            "Default spec compiled: {} literal, {} alternative, {} wildcard top-level entries",
            root.literal.len(),
            root.alternatives.len(),
            usize::from(root.star.is_some())
        );
        Ok(Self { root })
    }

    /// Apply the defaults; a `null` input starts from an empty object
    pub fn apply(&self, input: Value) -> Value {
        let mut output = if input.is_null() {
            Value::Object(Map::new())
        } else {
            input
        };
        self.root.apply(&mut output);
        output
    }
}

impl Transform for Defaults {
    fn transform(&self, input: Value, _context: &Context) -> Result<Value> {
        Ok(self.apply(input))
    }
}

impl DefaultNode {
    fn build(raw: &Map<String, Value>, array: bool, location: &str) -> Result<Self> {
        let mut node = DefaultNode {
            array,
            literal: Vec::new(),
            alternatives: Vec::new(),
            star: None,
        };
        let mut seen = HashSet::new();

        for (raw_key, value) in raw {
            let here = child_location(location, raw_key);
            let (key, is_array) = match raw_key.strip_suffix("[]") {
                Some(base) => (base, true),
                None => (raw_key.as_str(), false),
            };
            if !seen.insert(key.to_string()) {
                return Err(SpecError::DuplicateKey {
                    canonical: key.to_string(),
                }
                .at(here));
            }

            let default = match value {
                Value::Object(nested) => DefaultValue::Node(Self::build(nested, is_array, &here)?),
                _ if is_array => {
                    return Err(SpecError::InvalidValue {
                        key: raw_key.clone(),
                        message: "only object defaults can be marked with '[]'".to_string(),
                    }
                    .at(here));
                }
                leaf => DefaultValue::Leaf(leaf.clone()),
            };

            if key == "*" {
                node.star = Some(Box::new(default));
                continue;
            }
            if count_unescaped(key, '*') > 0 {
                return Err(SpecError::UnsupportedKey {
                    key: raw_key.clone(),
                    message: "defaults only support '*' on its own".to_string(),
                }
                .at(here));
            }

            let pieces = split_top_level(key, '|');
            if pieces.iter().any(|p| p.is_empty()) {
                return Err(SpecError::UnsupportedKey {
                    key: raw_key.clone(),
                    message: "empty alternative in '|' key".to_string(),
                }
                .at(here));
            }
            if pieces.len() > 1 {
                let keys = pieces.into_iter().map(unescape).collect();
                node.alternatives.push((keys, default));
            } else {
                node.literal.push((unescape(key), default));
            }
        }

        Ok(node)
    }

    /// Whether `value` is the container this node describes
    fn fits(&self, value: &Value) -> bool {
        if self.array {
            value.is_array()
        } else {
            value.is_object()
        }
    }

    fn empty_container(&self) -> Value {
        if self.array {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        }
    }

    fn apply(&self, target: &mut Value) {
        for (key, default) in &self.literal {
            if let Some(slot) = literal_slot(target, key) {
                fill(default, slot, true);
            }
        }
        for (keys, default) in &self.alternatives {
            for key in keys {
                if let Some(slot) = existing_slot(target, key) {
                    fill(default, slot, false);
                }
            }
        }
        if let Some(default) = &self.star {
            match target {
                Value::Object(map) => map.values_mut().for_each(|slot| fill(default, slot, false)),
                Value::Array(items) => items.iter_mut().for_each(|slot| fill(default, slot, false)),
                _ => {}
            }
        }
    }
}

/// Apply one default to a slot; `create` allows a missing container to be made
fn fill(default: &DefaultValue, slot: &mut Value, create: bool) {
    match default {
        DefaultValue::Leaf(value) => {
            if slot.is_null() {
                *slot = value.clone();
            }
        }
        DefaultValue::Node(node) => {
            if create && slot.is_null() {
                *slot = node.empty_container();
            }
            if node.fits(slot) {
                node.apply(slot);
            } else if !slot.is_null() {
                debug!("Keeping existing value where a default container was expected");
            }
        }
    }
}

/// The slot a literal default writes to, created (as `null`) when absent
fn literal_slot<'v>(target: &'v mut Value, key: &str) -> Option<&'v mut Value> {
    match target {
        Value::Object(map) => Some(map.entry(key.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = key.parse::<usize>().ok()?;
            if index > MAX_ARRAY_INDEX {
                warn!(
                    "Skipping default at index {}, past the maximum of {}",
                    key, MAX_ARRAY_INDEX
                );
                return None;
            }
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

fn existing_slot<'v>(target: &'v mut Value, key: &str) -> Option<&'v mut Value> {
    match target {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}
