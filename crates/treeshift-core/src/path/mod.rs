//! Path element model for spec keys and output paths
//!
//! Every key on the left-hand side of a spec and every dotted segment of an
//! output path on the right-hand side is compiled into a [`PathElement`].
//! The same model serves both sides; parsing decides which variants are
//! legal where.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

pub mod element;
pub mod output;
pub mod reference;
pub mod template;

pub use element::{ArrayIndex, PathElement, StarMulti, StarSingle, Transpose};
pub use output::OutputPath;
pub use reference::{Reference, ReferenceKind};
pub use template::{KeyTemplate, TemplatePart};

/// Characters with a meaning in spec keys or output paths
pub(crate) const SPECIAL_CHARS: &[char] = &[
    '\\', '.', '|', '*', '&', '$', '#', '@', '[', ']', '(', ')',
];

/// A character of a raw key together with whether it was escaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyChar {
    /// Byte offset of the character in the raw key (the backslash, if escaped)
    pub offset: usize,
    pub ch: char,
    pub escaped: bool,
}

/// Decode the escape sequences of a raw key
///
/// A backslash escapes the next character; a trailing backslash stands for
/// itself.
pub(crate) fn key_chars(raw: &str) -> Vec<KeyChar> {
    let mut chars = Vec::with_capacity(raw.len());
    let mut iter = raw.char_indices().peekable();

    while let Some((offset, ch)) = iter.next() {
        if ch == '\\' {
            if let Some((_, next)) = iter.next() {
                chars.push(KeyChar { offset, ch: next, escaped: true });
                continue;
            }
        }
        chars.push(KeyChar { offset, ch, escaped: false });
    }

    chars
}

/// Remove escape sequences from a raw key
pub(crate) fn unescape(raw: &str) -> String {
    key_chars(raw).into_iter().map(|c| c.ch).collect()
}

/// Render text so that it reads back as the same literal
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIAL_CHARS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Count the unescaped occurrences of a character
pub(crate) fn count_unescaped(raw: &str, target: char) -> usize {
    key_chars(raw)
        .iter()
        .filter(|c| !c.escaped && c.ch == target)
        .count()
}

/// Split a raw key on a separator, ignoring escaped separators and
/// separators nested inside `(...)` or `[...]`
///
/// The pieces keep their escape sequences.
pub(crate) fn split_top_level(raw: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for c in key_chars(raw) {
        if c.escaped {
            continue;
        }
        match c.ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ch if ch == separator && depth == 0 => {
                pieces.push(&raw[start..c.offset]);
                start = c.offset + ch.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&raw[start..]);

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_chars_tracks_escapes() {
        let chars = key_chars(r"a\.b");
        assert_eq!(chars.len(), 3);
        assert_eq!(chars[1], KeyChar { offset: 1, ch: '.', escaped: true });
        assert_eq!(chars[2].offset, 3);
    }

    #[test]
    fn test_trailing_backslash_is_literal() {
        assert_eq!(unescape("ab\\"), "ab\\");
    }

    #[test]
    fn test_escape_round_trips_through_unescape() {
        let text = "price.usd|eur*&$#@[0](x)\\";
        assert_eq!(unescape(&escape(text)), text);
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_split_top_level_respects_nesting_and_escapes() {
        assert_eq!(split_top_level("a.b.c", '.'), vec!["a", "b", "c"]);
        assert_eq!(split_top_level(r"a\.b.c", '.'), vec![r"a\.b", "c"]);
        assert_eq!(split_top_level("x.@(1,a.b).y", '.'), vec!["x", "@(1,a.b)", "y"]);
        assert_eq!(split_top_level("a|b", '|'), vec!["a", "b"]);
        assert_eq!(split_top_level("", '.'), vec![""]);
    }

    #[test]
    fn test_count_unescaped() {
        assert_eq!(count_unescaped(r"a*b\*c*", '*'), 2);
        assert_eq!(count_unescaped("abc", '*'), 0);
    }
}
