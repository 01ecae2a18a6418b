//! The remove transform
//!
//! Deletes keys from a document. Keys of the spec use the same matching as
//! shift keys (literals, `a|b`, `*`, `prefix*suffix`); an empty string or
//! `null` removes the matched keys, an object descends into them. On arrays
//! the element indices are matched as text.

use crate::chain::{Context, Transform};
use crate::error::{Result, SpecError};
use crate::path::{split_top_level, PathElement};
use crate::spec::{child_location, value_kind, ROOT_LOCATION};
use crate::walked::WalkedPath;
use log::{debug, trace};
use serde_json::{Map, Value};

/// A compiled remove spec
#[derive(Debug, Clone)]
pub struct Removal {
    root: RemovalNode,
}

#[derive(Debug, Clone)]
struct RemovalNode {
    rules: Vec<RemovalRule>,
}

#[derive(Debug, Clone)]
struct RemovalRule {
    element: PathElement,
    action: RemovalAction,
}

#[derive(Debug, Clone)]
enum RemovalAction {
    Remove,
    Descend(RemovalNode),
}

impl Removal {
    /// Compile a remove spec; it must be an object
    pub fn new(spec: &Value) -> Result<Self> {
        let raw = spec.as_object().ok_or_else(|| {
            SpecError::InvalidRoot {
                expected: "an object".to_string(),
                found: value_kind(spec).to_string(),
            }
            .at(ROOT_LOCATION)
        })?;
        let root = RemovalNode::build(raw, "")?;
        debug!("Remove spec compiled with {} top-level rules", root.rules.len());
        Ok(Self { root })
    }

    /// Remove the matched keys from `input`
    pub fn apply(&self, mut input: Value) -> Result<Value> {
        let walked = WalkedPath::new();
        self.root.apply(&mut input, &walked)?;
        Ok(input)
    }
}

impl Transform for Removal {
    fn transform(&self, input: Value, _context: &Context) -> Result<Value> {
        self.apply(input)
    }
}

impl RemovalNode {
    fn build(raw: &Map<String, Value>, location: &str) -> Result<Self> {
        let mut rules = Vec::new();

        for (key, value) in raw {
            let here = child_location(location, key);
            let action = match value {
                Value::Null => RemovalAction::Remove,
                Value::String(text) if text.is_empty() => RemovalAction::Remove,
                Value::Object(nested) => RemovalAction::Descend(Self::build(nested, &here)?),
                _ => {
                    return Err(SpecError::InvalidValue {
                        key: key.clone(),
                        message: "expected \"\", null or an object".to_string(),
                    }
                    .at(here));
                }
            };

            for alternative in split_top_level(key, '|') {
                if alternative.is_empty() && key.contains('|') {
                    return Err(SpecError::UnsupportedKey {
                        key: key.clone(),
                        message: "empty alternative in '|' key".to_string(),
                    }
                    .at(here));
                }
                let element = PathElement::parse_input_key(alternative)
                    .map_err(|e| e.at(here.as_str()))?;
                if !matches!(
                    element,
                    PathElement::Literal(_)
                        | PathElement::StarAll
                        | PathElement::StarSingle(_)
                        | PathElement::StarMulti(_)
                ) {
                    return Err(SpecError::UnsupportedKey {
                        key: key.clone(),
                        message: "remove keys cannot use references".to_string(),
                    }
                    .at(here));
                }
                rules.push(RemovalRule {
                    element,
                    action: action.clone(),
                });
            }
        }

        Ok(Self { rules })
    }

    fn apply(&self, target: &mut Value, walked: &WalkedPath<'_>) -> Result<()> {
        match target {
            Value::Object(map) => {
                let keys: Vec<String> = map.keys().cloned().collect();
                let mut doomed = Vec::new();
                for key in &keys {
                    for rule in &self.rules {
                        if rule.element.match_key(key, walked)?.is_none() {
                            continue;
                        }
                        match &rule.action {
                            RemovalAction::Remove => doomed.push(key.clone()),
                            RemovalAction::Descend(node) => {
                                if let Some(child) = map.get_mut(key) {
                                    node.apply(child, walked)?;
                                }
                            }
                        }
                    }
                }
                if !doomed.is_empty() {
                    trace!("Removing keys {:?}", doomed);
                    map.retain(|key, _| !doomed.contains(key));
                }
            }
            Value::Array(items) => {
                let mut doomed = Vec::new();
                for index in 0..items.len() {
                    let key = index.to_string();
                    for rule in &self.rules {
                        if rule.element.match_key(&key, walked)?.is_none() {
                            continue;
                        }
                        match &rule.action {
                            RemovalAction::Remove => doomed.push(index),
                            RemovalAction::Descend(node) => node.apply(&mut items[index], walked)?,
                        }
                    }
                }
                doomed.sort_unstable();
                doomed.dedup();
                for index in doomed.into_iter().rev() {
                    items.remove(index);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
