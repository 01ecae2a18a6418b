//! Key templates: literal text interleaved with `&` references
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::reference::Reference;
use super::{escape, key_chars};
use crate::error::{EvaluationError, SpecError};
use crate::walked::WalkedPath;

/// One piece of a key template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text, escapes already removed
    Text(String),
    /// Back-reference substituted at evaluation time
    Ref(Reference),
}

/// A key such as `photo-&1-&(0,1)` that is only known once the walk reaches it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    parts: Vec<TemplatePart>,
}

impl KeyTemplate {
    /// Parse a raw key; unescaped `&` starts a reference, everything else is text
    pub fn parse(raw: &str) -> Result<Self, SpecError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let chars = key_chars(raw);
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c.escaped || c.ch != '&' {
                text.push(c.ch);
                i += 1;
                continue;
            }

            if !text.is_empty() {
                parts.push(TemplatePart::Text(std::mem::take(&mut text)));
            }
            let (reference, consumed) = Reference::scan(&raw[c.offset..])?;
            parts.push(TemplatePart::Ref(reference));

            let end = c.offset + consumed;
            while i < chars.len() && chars[i].offset < end {
                i += 1;
            }
        }

        if !text.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Text(text));
        }

        Ok(Self { parts })
    }

    /// The parts in order
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Whether any part is a reference
    pub fn has_references(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, TemplatePart::Ref(_)))
    }

    /// The text of a template without references
    pub fn as_literal(&self) -> Option<String> {
        if self.has_references() {
            return None;
        }
        Some(
            self.parts
                .iter()
                .filter_map(|p| match p {
                    TemplatePart::Text(text) => Some(text.as_str()),
                    TemplatePart::Ref(_) => None,
                })
                .collect(),
        )
    }

    /// The template when it is nothing but a single reference
    pub fn as_single_reference(&self) -> Option<Reference> {
        match self.parts.as_slice() {
            [TemplatePart::Ref(reference)] => Some(*reference),
            _ => None,
        }
    }

    /// Number of literal characters, used to rank templates against each other
    pub fn literal_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match p {
                TemplatePart::Text(text) => text.chars().count(),
                TemplatePart::Ref(_) => 0,
            })
            .sum()
    }

    /// Substitute every reference with the key it points at
    pub fn evaluate(&self, walked: &WalkedPath<'_>) -> Result<String, EvaluationError> {
        let mut key = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => key.push_str(text),
                TemplatePart::Ref(reference) => key.push_str(&walked.resolve(reference)?),
            }
        }
        Ok(key)
    }

    /// Unambiguous rendering with fully expanded references
    pub fn canonical_form(&self) -> String {
        self.parts
            .iter()
            .map(|p| match p {
                TemplatePart::Text(text) => escape(text),
                TemplatePart::Ref(reference) => reference.canonical_form(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ReferenceKind;
    use crate::walked::MatchedElement;

    #[test]
    fn test_parse_mixed_template() {
        let template = KeyTemplate::parse("photo-&1-&(0,1)").unwrap();
        assert_eq!(
            template.parts(),
            &[
                TemplatePart::Text("photo-".to_string()),
                TemplatePart::Ref(Reference::new(ReferenceKind::Amp, 1, 0)),
                TemplatePart::Text("-".to_string()),
                TemplatePart::Ref(Reference::new(ReferenceKind::Amp, 0, 1)),
            ]
        );
        assert_eq!(template.canonical_form(), "photo-&(1,0)-&(0,1)");
        assert_eq!(template.literal_len(), 7);
    }

    #[test]
    fn test_escaped_amp_is_text() {
        let template = KeyTemplate::parse(r"Q\&A").unwrap();
        assert!(!template.has_references());
        assert_eq!(template.as_literal().as_deref(), Some("Q&A"));
        assert_eq!(template.canonical_form(), r"Q\&A");
    }

    #[test]
    fn test_single_reference() {
        let template = KeyTemplate::parse("&2").unwrap();
        assert_eq!(
            template.as_single_reference(),
            Some(Reference::new(ReferenceKind::Amp, 2, 0))
        );
        assert!(KeyTemplate::parse("x&2").unwrap().as_single_reference().is_none());
    }

    #[test]
    fn test_empty_template_is_empty_literal() {
        let template = KeyTemplate::parse("").unwrap();
        assert_eq!(template.as_literal().as_deref(), Some(""));
    }

    #[test]
    fn test_evaluate_against_walked_path() {
        let mut walked = WalkedPath::new();
        walked.push(None, MatchedElement::new("root"));
        walked.push(None, MatchedElement::new("photos"));
        walked.push(None, MatchedElement::with_captures("thumb-large", vec!["large".to_string()]));

        let template = KeyTemplate::parse("&1_&(0,1)").unwrap();
        assert_eq!(template.evaluate(&walked).unwrap(), "photos_large");
    }

    #[test]
    fn test_malformed_reference_propagates() {
        assert!(KeyTemplate::parse("a&(1").is_err());
    }
}
