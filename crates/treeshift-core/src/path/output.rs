//! Output paths: the dotted right-hand side of a spec leaf
//!
//! `SecondaryRatings.&1.Value`, `photos[&1].url`, `ids[]`, `@(1,id).name`
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::element::{ArrayIndex, PathElement, Transpose};
use super::template::KeyTemplate;
use super::{key_chars, split_top_level};
use crate::error::{EvaluationError, SpecError};
use crate::traversal::TraversalStep;
use crate::walked::WalkedPath;
use std::fmt;

/// A compiled output path
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPath {
    raw: String,
    elements: Vec<PathElement>,
}

impl OutputPath {
    /// Compile a dotted output path; the empty path addresses the output root
    pub fn parse(raw: &str) -> Result<Self, SpecError> {
        let mut elements = Vec::new();
        if !raw.is_empty() {
            for segment in split_top_level(raw, '.') {
                parse_segment(raw, segment, &mut elements)?;
            }
        }
        Ok(Self {
            raw: raw.to_string(),
            elements,
        })
    }

    /// The path as written in the spec
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Whether the path writes straight to the output root
    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Resolve every element against the walked path
    ///
    /// `Ok(None)` means a transpose segment found nothing usable as a key and
    /// the write is skipped.
    pub fn evaluate(
        &self,
        walked: &WalkedPath<'_>,
    ) -> Result<Option<Vec<TraversalStep>>, EvaluationError> {
        let mut steps = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            match element.evaluate_output(walked)? {
                Some(step) => steps.push(step),
                None => return Ok(None),
            }
        }
        Ok(Some(steps))
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn invalid(path: &str, message: impl Into<String>) -> SpecError {
    SpecError::InvalidOutputPath {
        path: path.to_string(),
        message: message.into(),
    }
}

/// Compile one dotted segment: a key or transpose followed by zero or more
/// bracketed indices
fn parse_segment(path: &str, segment: &str, out: &mut Vec<PathElement>) -> Result<(), SpecError> {
    if segment.is_empty() {
        return Err(invalid(path, "empty path segment"));
    }

    let (head, brackets) = split_brackets(path, segment)?;

    if head.starts_with('@') {
        out.push(PathElement::Transpose(Transpose::parse(head)?));
    } else if !head.is_empty() {
        if key_chars(head).iter().any(|c| !c.escaped && c.ch == '*') {
            return Err(invalid(path, format!("'*' is not allowed in output key '{}'", head)));
        }
        let template = KeyTemplate::parse(head)?;
        out.push(match template.as_literal() {
            Some(literal) => PathElement::Literal(literal),
            None => PathElement::Template(template),
        });
    }

    for content in brackets {
        out.push(PathElement::Array(ArrayIndex::parse(content)?));
    }
    Ok(())
}

/// Separate the key part of a segment from its trailing `[..]` groups
fn split_brackets<'s>(path: &str, segment: &'s str) -> Result<(&'s str, Vec<&'s str>), SpecError> {
    let chars = key_chars(segment);
    let mut paren_depth = 0usize;
    let mut head_end = None;
    let mut brackets = Vec::new();
    let mut open: Option<usize> = None;

    for c in &chars {
        if c.escaped {
            if open.is_none() && head_end.is_some() {
                return Err(invalid(path, format!("text after index in '{}'", segment)));
            }
            continue;
        }
        match (c.ch, open) {
            ('(', None) => paren_depth += 1,
            (')', None) => paren_depth = paren_depth.saturating_sub(1),
            ('[', None) if paren_depth == 0 => {
                head_end.get_or_insert(c.offset);
                open = Some(c.offset + 1);
            }
            ('[', Some(_)) => return Err(invalid(path, "nested '['")),
            (']', Some(start)) => {
                brackets.push(&segment[start..c.offset]);
                open = None;
            }
            (']', None) => return Err(invalid(path, "unbalanced ']'")),
            (_, None) if head_end.is_some() => {
                return Err(invalid(path, format!("text after index in '{}'", segment)));
            }
            _ => {}
        }
    }

    if open.is_some() {
        return Err(invalid(path, "unclosed '['"));
    }

    let head = &segment[..head_end.unwrap_or(segment.len())];
    Ok((head, brackets))
}
