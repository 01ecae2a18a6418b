//! Back-reference tokens
//!
//! A reference points at a level of the walked path: `&` and `$` resolve to
//! the key (or a wildcard capture of the key) matched at that level, `#`
//! resolves to the number of matches recorded at that level so far.
//!
//! Accepted syntax, shown for `&`:
//!
//! | token    | path index | key group |
//! |----------|------------|-----------|
//! | `&`      | 0          | 0         |
//! | `&2`     | 2          | 0         |
//! | `&(2)`   | 2          | 0         |
//! | `&(2,1)` | 2          | 1         |
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::SpecError;
use std::fmt;

/// Which sigil introduced a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `&`: the matched key, usable inside keys and output paths
    Amp,
    /// `$`: the matched key, written out as a value
    Dollar,
    /// `#`: the match counter of a level, usable as an array index
    Hash,
}

/// A parsed back-reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    kind: ReferenceKind,
    path_index: usize,
    key_group: usize,
}

impl ReferenceKind {
    /// The character introducing this kind of reference
    pub fn sigil(self) -> char {
        match self {
            ReferenceKind::Amp => '&',
            ReferenceKind::Dollar => '$',
            ReferenceKind::Hash => '#',
        }
    }

    /// Look up the kind for a sigil character
    pub fn from_sigil(ch: char) -> Option<Self> {
        match ch {
            '&' => Some(ReferenceKind::Amp),
            '$' => Some(ReferenceKind::Dollar),
            '#' => Some(ReferenceKind::Hash),
            _ => None,
        }
    }
}

impl Reference {
    /// Create a reference from its parts
    pub fn new(kind: ReferenceKind, path_index: usize, key_group: usize) -> Self {
        Self { kind, path_index, key_group }
    }

    /// Parse a token that consists of exactly one reference
    pub fn parse(token: &str) -> Result<Self, SpecError> {
        let (reference, consumed) = Self::scan(token)?;
        if consumed != token.len() {
            return Err(SpecError::MalformedReference {
                token: token.to_string(),
                message: format!("unexpected trailing text '{}'", &token[consumed..]),
            });
        }
        Ok(reference)
    }

    /// Parse the reference at the start of `input`
    ///
    /// Returns the reference and the number of bytes it occupies, so callers
    /// can keep scanning literal text that follows (`photo-&1-thumb`).
    pub(crate) fn scan(input: &str) -> Result<(Self, usize), SpecError> {
        let malformed = |message: &str| SpecError::MalformedReference {
            token: input.to_string(),
            message: message.to_string(),
        };

        let sigil = input.chars().next().ok_or_else(|| malformed("empty reference"))?;
        let kind = ReferenceKind::from_sigil(sigil)
            .ok_or_else(|| malformed("a reference starts with '&', '$' or '#'"))?;
        let rest = &input[sigil.len_utf8()..];

        let (path_index, key_group, consumed) = if let Some(inner) = rest.strip_prefix('(') {
            let close = inner
                .find(')')
                .ok_or_else(|| malformed("missing closing parenthesis"))?;
            let parts: Vec<&str> = inner[..close].split(',').collect();
            let (path_index, key_group) = match parts.as_slice() {
                [index] => (parse_index(index, input)?, 0),
                [index, group] => (parse_index(index, input)?, parse_index(group, input)?),
                _ => return Err(malformed("expected at most two comma separated numbers")),
            };
            (path_index, key_group, 1 + 1 + close + 1)
        } else if rest.starts_with('-') {
            return Err(SpecError::NegativeReference { token: input.to_string() });
        } else {
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                (0, 0, 1)
            } else {
                (parse_index(&rest[..digits], input)?, 0, 1 + digits)
            }
        };

        if kind == ReferenceKind::Hash && key_group != 0 {
            return Err(malformed("'#' references do not take a key group"));
        }

        Ok((Self::new(kind, path_index, key_group), consumed))
    }

    /// The sigil kind
    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// Levels to walk back from the end of the walked path
    pub fn path_index(&self) -> usize {
        self.path_index
    }

    /// 0 for the whole key, 1..N for wildcard captures
    pub fn key_group(&self) -> usize {
        self.key_group
    }

    /// Fully expanded rendering, e.g. `&(1,0)`
    pub fn canonical_form(&self) -> String {
        format!("{}({},{})", self.kind.sigil(), self.path_index, self.key_group)
    }
}

fn parse_index(text: &str, token: &str) -> Result<usize, SpecError> {
    let text = text.trim();
    if text.starts_with('-') {
        return Err(SpecError::NegativeReference { token: token.to_string() });
    }
    text.parse::<usize>().map_err(|_| SpecError::MalformedReference {
        token: token.to_string(),
        message: format!("'{}' is not a non-negative integer", text),
    })
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_form())
    }
}
