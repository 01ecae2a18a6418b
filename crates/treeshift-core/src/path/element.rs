//! Path elements: one compiled level of a spec key or output path
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use super::reference::{Reference, ReferenceKind};
use super::template::KeyTemplate;
use super::{count_unescaped, escape, key_chars, split_top_level, unescape};
use crate::error::{EvaluationError, SpecError};
use crate::traversal::{check_index, TraversalStep, MAX_ARRAY_INDEX};
use crate::walked::{MatchedElement, WalkedPath};
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// One level of a spec key or output path
#[derive(Debug, Clone, PartialEq)]
pub enum PathElement {
    /// Matches a key equal to the text
    Literal(String),
    /// `*`: matches any key no sibling claims
    StarAll,
    /// `prefix*suffix`
    StarSingle(StarSingle),
    /// Two or more `*`, compiled to a regex
    StarMulti(StarMulti),
    /// Text with `&` references, e.g. `photo-&1`
    Template(KeyTemplate),
    /// A bare `&`/`$` key: writes the referenced key as a value
    Reference(Reference),
    /// `#text`: writes `text` as a value
    HashLiteral(String),
    /// `@`, `@N`, `@(N,sub.path)`: the input value at a walked level
    Transpose(Transpose),
    /// Output side array index
    Array(ArrayIndex),
}

/// A key with exactly one `*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarSingle {
    raw: String,
    prefix: String,
    suffix: String,
}

/// A key with two or more `*`
#[derive(Debug, Clone)]
pub struct StarMulti {
    raw: String,
    regex: Regex,
    stars: usize,
    literal_len: usize,
}

/// Bracketed array index in an output path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayIndex {
    /// `[]`: always append
    AutoExpand,
    /// `[3]`
    Explicit(usize),
    /// `[&1]`, `[&(1,1)]` or `[#2]`
    Reference(Reference),
}

/// Lookup of an input value by walked level and relative sub-path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transpose {
    path_index: usize,
    sub_path: Vec<String>,
}

impl PathElement {
    /// Classify and compile a key from the left-hand side of a spec
    ///
    /// Reference-bearing keys are recognised first, then `*`, single and
    /// multi wildcards; anything else is a literal. `\` escapes the next
    /// character. Dots are only allowed inside the sub-path of `@(N,a.b)`.
    pub fn parse_input_key(raw: &str) -> Result<Self, SpecError> {
        if raw.starts_with('@') {
            return Ok(PathElement::Transpose(Transpose::parse(raw)?));
        }
        for c in key_chars(raw) {
            if !c.escaped && matches!(c.ch, '.' | '[' | ']') {
                return Err(SpecError::IllegalCharacter {
                    key: raw.to_string(),
                    character: c.ch,
                });
            }
        }

        if raw.starts_with('$') {
            let reference = Reference::parse(raw)?;
            return Ok(PathElement::Reference(reference));
        }
        if let Some(text) = raw.strip_prefix('#') {
            if text.is_empty() {
                return Err(SpecError::UnsupportedKey {
                    key: raw.to_string(),
                    message: "'#' needs the literal text to write".to_string(),
                });
            }
            return Ok(PathElement::HashLiteral(unescape(text)));
        }
        let stars = count_unescaped(raw, '*');
        if count_unescaped(raw, '&') > 0 {
            if stars > 0 {
                return Err(SpecError::UnsupportedKey {
                    key: raw.to_string(),
                    message: "a key cannot mix '&' references and '*' wildcards".to_string(),
                });
            }
            let template = KeyTemplate::parse(raw)?;
            return Ok(match template.as_single_reference() {
                Some(reference) => PathElement::Reference(reference),
                None => PathElement::Template(template),
            });
        }

        Ok(match stars {
            0 => PathElement::Literal(unescape(raw)),
            1 if raw == "*" => PathElement::StarAll,
            1 => PathElement::StarSingle(StarSingle::new(raw)),
            _ => PathElement::StarMulti(StarMulti::new(raw)?),
        })
    }

    /// Unambiguous rendering used for ordering and duplicate detection
    pub fn canonical_form(&self) -> String {
        match self {
            PathElement::Literal(key) => escape(key),
            PathElement::StarAll => "*".to_string(),
            PathElement::StarSingle(star) => star.raw.clone(),
            PathElement::StarMulti(star) => star.raw.clone(),
            PathElement::Template(template) => template.canonical_form(),
            PathElement::Reference(reference) => reference.canonical_form(),
            PathElement::HashLiteral(text) => format!("#{}", escape(text)),
            PathElement::Transpose(transpose) => transpose.canonical_form(),
            PathElement::Array(index) => index.canonical_form(),
        }
    }

    /// Whether this is a self-reference key, fired once per visit of its parent
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            PathElement::Reference(_) | PathElement::HashLiteral(_) | PathElement::Transpose(_)
        )
    }

    /// Try to claim an input key
    ///
    /// Templates resolve their references against the walked path as it
    /// stands, so `&0` is the level of the rule's parent. Self-reference and
    /// array elements never claim keys.
    pub fn match_key(
        &self,
        key: &str,
        walked: &WalkedPath<'_>,
    ) -> Result<Option<MatchedElement>, EvaluationError> {
        let matched = match self {
            PathElement::Literal(literal) => (literal == key).then(|| MatchedElement::new(key)),
            PathElement::StarAll => Some(MatchedElement::new(key)),
            PathElement::StarSingle(star) => star
                .capture(key)
                .map(|middle| MatchedElement::with_captures(key, vec![middle.to_string()])),
            PathElement::StarMulti(star) => star
                .captures(key)
                .map(|captures| MatchedElement::with_captures(key, captures)),
            PathElement::Template(template) => {
                (template.evaluate(walked)? == key).then(|| MatchedElement::new(key))
            }
            PathElement::Reference(_)
            | PathElement::HashLiteral(_)
            | PathElement::Transpose(_)
            | PathElement::Array(_) => None,
        };
        Ok(matched)
    }

    /// Evaluate an output path element into a concrete traversal step
    ///
    /// `Ok(None)` means the write has to be skipped because a transpose found
    /// nothing usable as a key.
    pub fn evaluate_output(
        &self,
        walked: &WalkedPath<'_>,
    ) -> Result<Option<TraversalStep>, EvaluationError> {
        let step = match self {
            PathElement::Literal(key) => TraversalStep::Key(key.clone()),
            PathElement::Template(template) => TraversalStep::Key(template.evaluate(walked)?),
            PathElement::Array(index) => index.evaluate(walked)?,
            PathElement::Transpose(transpose) => {
                match transpose.lookup(walked)?.and_then(key_text) {
                    Some(key) => TraversalStep::Key(key),
                    None => return Ok(None),
                }
            }
            // Output path parsing never produces input-side matchers.
            PathElement::StarAll
            | PathElement::StarSingle(_)
            | PathElement::StarMulti(_)
            | PathElement::Reference(_)
            | PathElement::HashLiteral(_) => TraversalStep::Key(self.canonical_form()),
        };
        Ok(Some(step))
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_form())
    }
}

impl StarSingle {
    fn new(raw: &str) -> Self {
        let pieces = split_top_level_star(raw);
        let (prefix, suffix) = match pieces.as_slice() {
            [prefix, suffix] => (prefix.clone(), suffix.clone()),
            _ => (String::new(), String::new()),
        };
        Self {
            raw: raw.to_string(),
            prefix,
            suffix,
        }
    }

    /// The substring between prefix and suffix, if the key fits
    pub fn capture<'k>(&self, key: &'k str) -> Option<&'k str> {
        if key.len() < self.prefix.len() + self.suffix.len() {
            return None;
        }
        key.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Characters the key must contain literally
    pub fn literal_len(&self) -> usize {
        self.prefix.chars().count() + self.suffix.chars().count()
    }
}

impl StarMulti {
    fn new(raw: &str) -> Result<Self, SpecError> {
        let pieces = split_top_level_star(raw);
        let pattern = format!(
            "^{}$",
            pieces
                .iter()
                .map(|piece| regex::escape(piece))
                .collect::<Vec<_>>()
                .join("(.*?)")
        );
        let regex = Regex::new(&pattern).map_err(|e| SpecError::InvalidPattern {
            key: raw.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            raw: raw.to_string(),
            regex,
            stars: pieces.len() - 1,
            literal_len: pieces.iter().map(|p| p.chars().count()).sum(),
        })
    }

    /// The substring matched by each `*`, in order
    pub fn captures(&self, key: &str) -> Option<Vec<String>> {
        let captures = self.regex.captures(key)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }

    pub fn stars(&self) -> usize {
        self.stars
    }

    pub fn literal_len(&self) -> usize {
        self.literal_len
    }
}

impl PartialEq for StarMulti {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// Unescaped text pieces between the unescaped `*` of a raw key
fn split_top_level_star(raw: &str) -> Vec<String> {
    let mut pieces = vec![String::new()];
    for c in key_chars(raw) {
        if !c.escaped && c.ch == '*' {
            pieces.push(String::new());
        } else if let Some(last) = pieces.last_mut() {
            last.push(c.ch);
        }
    }
    pieces
}

impl ArrayIndex {
    /// Parse the text between `[` and `]`
    pub fn parse(content: &str) -> Result<Self, SpecError> {
        let invalid = || SpecError::InvalidArrayIndex {
            index: content.to_string(),
        };

        if content.is_empty() {
            return Ok(ArrayIndex::AutoExpand);
        }
        if content.chars().all(|c| c.is_ascii_digit()) {
            return content
                .parse()
                .ok()
                .filter(|index| *index <= MAX_ARRAY_INDEX)
                .map(ArrayIndex::Explicit)
                .ok_or_else(invalid);
        }
        match content.chars().next() {
            Some('&') | Some('#') => Ok(ArrayIndex::Reference(Reference::parse(content)?)),
            _ => Err(invalid()),
        }
    }

    /// Resolve to a concrete step
    pub fn evaluate(&self, walked: &WalkedPath<'_>) -> Result<TraversalStep, EvaluationError> {
        match self {
            ArrayIndex::AutoExpand => Ok(TraversalStep::Append),
            ArrayIndex::Explicit(index) => Ok(TraversalStep::Index(check_index(*index)?)),
            ArrayIndex::Reference(reference) if reference.kind() == ReferenceKind::Hash => {
                Ok(TraversalStep::Index(check_index(walked.hash_count(reference)?)?))
            }
            ArrayIndex::Reference(reference) => {
                let key = walked.resolve(reference)?;
                if key.is_empty() || !key.chars().all(|c| c.is_ascii_digit()) {
                    return Err(EvaluationError::NonNumericIndex {
                        reference: reference.canonical_form(),
                        value: key,
                    });
                }
                // All digits: anything that does not fit is too large, not malformed
                match key.parse::<usize>() {
                    Ok(index) => Ok(TraversalStep::Index(check_index(index)?)),
                    Err(_) => Err(EvaluationError::IndexTooLarge {
                        index: key,
                        max: MAX_ARRAY_INDEX,
                    }),
                }
            }
        }
    }

    pub fn canonical_form(&self) -> String {
        match self {
            ArrayIndex::AutoExpand => "[]".to_string(),
            ArrayIndex::Explicit(index) => format!("[{}]", index),
            ArrayIndex::Reference(reference) => format!("[{}]", reference.canonical_form()),
        }
    }
}

impl Transpose {
    /// Parse `@`, `@N`, `@(N)` or `@(N,sub.path)`
    pub fn parse(raw: &str) -> Result<Self, SpecError> {
        let malformed = |message: &str| SpecError::MalformedReference {
            token: raw.to_string(),
            message: message.to_string(),
        };
        let rest = raw
            .strip_prefix('@')
            .ok_or_else(|| malformed("a value reference starts with '@'"))?;

        if rest.is_empty() {
            return Ok(Self { path_index: 0, sub_path: Vec::new() });
        }
        if rest.chars().all(|c| c.is_ascii_digit()) {
            let path_index = rest.parse().map_err(|_| malformed("level is too large"))?;
            return Ok(Self { path_index, sub_path: Vec::new() });
        }

        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| malformed("expected '@N' or '@(N,path)'"))?;
        let (index, path) = match inner.split_once(',') {
            Some((index, path)) => (index.trim(), path.trim()),
            None => (inner.trim(), ""),
        };
        if index.starts_with('-') {
            return Err(SpecError::NegativeReference { token: raw.to_string() });
        }
        let path_index = index
            .parse()
            .map_err(|_| malformed("level must be a non-negative integer"))?;
        let sub_path = if path.is_empty() {
            Vec::new()
        } else {
            split_top_level(path, '.').into_iter().map(unescape).collect()
        };

        Ok(Self { path_index, sub_path })
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    pub fn sub_path(&self) -> &[String] {
        &self.sub_path
    }

    /// Find the referenced input value
    ///
    /// `Ok(None)` when the level was entered without a value or the
    /// sub-path does not exist.
    pub fn lookup<'a>(&self, walked: &WalkedPath<'a>) -> Result<Option<&'a Value>, EvaluationError> {
        let frame = walked
            .frame_from_end(self.path_index)
            .ok_or_else(|| EvaluationError::ReferenceOutOfRange {
                reference: self.canonical_form(),
                path_index: self.path_index,
                depth: walked.depth(),
            })?;

        let mut current = match frame.input() {
            Some(value) => value,
            None => return Ok(None),
        };
        for step in &self.sub_path {
            let next = match current {
                Value::Object(map) => map.get(step),
                Value::Array(items) => step.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = match next {
                Some(value) => value,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    /// The key recorded for a frame built from this lookup
    pub fn frame_key(&self, walked: &WalkedPath<'_>) -> Option<String> {
        match self.sub_path.last() {
            Some(last) => Some(last.clone()),
            None => walked
                .frame_from_end(self.path_index)
                .map(|frame| frame.matched().key().to_string()),
        }
    }

    pub fn canonical_form(&self) -> String {
        if self.sub_path.is_empty() {
            format!("@({})", self.path_index)
        } else {
            let path: Vec<String> = self.sub_path.iter().map(|s| escape(s)).collect();
            format!("@({},{})", self.path_index, path.join("."))
        }
    }
}

/// Text of a scalar usable as a key
pub(crate) fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
