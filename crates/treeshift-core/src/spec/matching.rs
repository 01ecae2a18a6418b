//! Deciding which rule owns an input key

use super::{CompositeSpec, Spec};
use crate::error::EvaluationError;
use crate::walked::{MatchedElement, WalkedPath};
use log::trace;

impl CompositeSpec {
    /// Find the child rule that claims `key`
    ///
    /// Literal rules are looked up first, then computed rules in priority
    /// order. The first rule that matches wins; `None` means no rule wants the
    /// key and it is skipped.
    pub fn find_owning_rule(
        &self,
        key: &str,
        walked: &WalkedPath<'_>,
    ) -> Result<Option<(&Spec, MatchedElement)>, EvaluationError> {
        if let Some(rule) = self.literal_children.get(key) {
            trace!("Key '{}' owned by literal rule", key);
            return Ok(Some((rule, MatchedElement::new(key))));
        }

        for rule in &self.computed_children {
            if let Some(matched) = rule.element().match_key(key, walked)? {
                trace!("Key '{}' owned by rule '{}'", key, rule.element());
                return Ok(Some((rule, matched)));
            }
        }

        trace!("Key '{}' has no owning rule", key);
        Ok(None)
    }
}
