//! The walked path: a stack recording the route taken through the input
//!
//! Each level descended during a shift pushes a frame holding the key that
//! was matched (plus any wildcard captures) and the input value found there.
//! Back-references in keys and output paths resolve against this stack,
//! counting from its end.
//!
//! A `WalkedPath` belongs to exactly one transform invocation. It is created
//! when the invocation starts and dropped when it returns.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::EvaluationError;
use crate::path::{Reference, ReferenceKind};
use serde_json::Value;

/// Key of the frame pushed for the document root
pub const ROOT_KEY: &str = "root";

/// What was matched at one level of the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedElement {
    /// Index 0 is the full key, 1..N are wildcard captures
    sub_keys: Vec<String>,
    /// Matches recorded under this level so far, read by `#` references
    hash_count: usize,
    /// Length of the input array when the frame was entered on an array.
    /// Kept for "write only to a newly appended index" semantics; no write
    /// path consults it yet.
    origin_size: Option<usize>,
}

impl MatchedElement {
    /// A match without wildcard captures
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_captures(key, Vec::new())
    }

    /// A match with the substrings captured by each `*`
    pub fn with_captures(key: impl Into<String>, captures: Vec<String>) -> Self {
        let mut sub_keys = Vec::with_capacity(captures.len() + 1);
        sub_keys.push(key.into());
        sub_keys.extend(captures);
        Self {
            sub_keys,
            hash_count: 0,
            origin_size: None,
        }
    }

    /// The full matched key
    pub fn key(&self) -> &str {
        &self.sub_keys[0]
    }

    /// The key (group 0) or a wildcard capture (group 1..N)
    pub fn sub_key(&self, group: usize) -> Option<&str> {
        self.sub_keys.get(group).map(String::as_str)
    }

    /// Number of wildcard captures
    pub fn capture_count(&self) -> usize {
        self.sub_keys.len() - 1
    }

    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    pub fn increment_hash_count(&mut self) {
        self.hash_count += 1;
    }

    /// Input array length at entry, `None` for non-array frames
    pub fn origin_size(&self) -> Option<usize> {
        self.origin_size
    }
}

/// One level of the walked path
#[derive(Debug, Clone)]
pub struct PathFrame<'a> {
    input: Option<&'a Value>,
    matched: MatchedElement,
}

impl<'a> PathFrame<'a> {
    /// Input value at this level; `None` when a scalar was matched by its text
    pub fn input(&self) -> Option<&'a Value> {
        self.input
    }

    pub fn matched(&self) -> &MatchedElement {
        &self.matched
    }
}

/// Stack of matched elements for one transform invocation
#[derive(Debug, Clone, Default)]
pub struct WalkedPath<'a> {
    frames: Vec<PathFrame<'a>>,
}

impl<'a> WalkedPath<'a> {
    /// Create an empty walked path
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Descend one level
    pub fn push(&mut self, input: Option<&'a Value>, mut matched: MatchedElement) {
        if let Some(Value::Array(items)) = input {
            matched.origin_size = Some(items.len());
        }
        self.frames.push(PathFrame { input, matched });
    }

    /// Ascend one level
    pub fn pop(&mut self) -> Option<MatchedElement> {
        self.frames.pop().map(|frame| frame.matched)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame `path_index` levels up from the current one (0 = current)
    pub fn frame_from_end(&self, path_index: usize) -> Option<&PathFrame<'a>> {
        self.frames
            .len()
            .checked_sub(path_index + 1)
            .map(|index| &self.frames[index])
    }

    /// The current frame
    pub fn last(&self) -> Option<&PathFrame<'a>> {
        self.frames.last()
    }

    /// Resolve a reference to the text it stands for
    ///
    /// `&` and `$` yield the key or capture at the referenced level; `#`
    /// yields that level's match counter.
    pub fn resolve(&self, reference: &Reference) -> Result<String, EvaluationError> {
        let frame = self.referenced_frame(reference)?;
        if reference.kind() == ReferenceKind::Hash {
            return Ok(frame.matched.hash_count.to_string());
        }

        let matched = &frame.matched;
        matched
            .sub_key(reference.key_group())
            .map(str::to_string)
            .ok_or_else(|| EvaluationError::KeyGroupOutOfRange {
                reference: reference.canonical_form(),
                key_group: reference.key_group(),
                key: matched.key().to_string(),
                available: matched.capture_count(),
            })
    }

    /// Match counter of the referenced level
    pub fn hash_count(&self, reference: &Reference) -> Result<usize, EvaluationError> {
        Ok(self.referenced_frame(reference)?.matched.hash_count)
    }

    /// Record one more match under the current level
    pub fn increment_hash_count(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.matched.increment_hash_count();
        }
    }

    fn referenced_frame(&self, reference: &Reference) -> Result<&PathFrame<'a>, EvaluationError> {
        self.frame_from_end(reference.path_index())
            .ok_or_else(|| EvaluationError::ReferenceOutOfRange {
                reference: reference.canonical_form(),
                path_index: reference.path_index(),
                depth: self.depth(),
            })
    }
}
