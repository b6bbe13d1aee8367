//! A single match position within a document.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Context tokens per annotation, e.g. `{"word": ["the", "cat"], "lemma": [...]}`.
pub type ContextTokens = BTreeMap<String, Vec<String>>;

/// A hit as returned by a search node.
///
/// Hits refer to their document by pid only; document metadata lives in a
/// separate table keyed by that pid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    /// Persistent identifier of the document.
    pub doc_pid: String,

    /// First token position of the match.
    pub start: i64,

    /// Token position just after the match.
    pub end: i64,

    /// Tokens before the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<ContextTokens>,

    /// The matched tokens.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<ContextTokens>,

    /// Tokens after the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<ContextTokens>,
}

/// Which part of a hit's context to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextPart {
    /// Before the match.
    Left,
    /// The match itself.
    Match,
    /// After the match.
    Right,
}

impl Hit {
    /// Create a hit without context.
    pub fn new<S: Into<String>>(doc_pid: S, start: i64, end: i64) -> Self {
        Self {
            doc_pid: doc_pid.into(),
            start,
            end,
            left: None,
            matched: None,
            right: None,
        }
    }

    /// Attach context tokens for one annotation.
    pub fn with_context<A, I, W>(mut self, part: ContextPart, annotation: A, words: I) -> Self
    where
        A: Into<String>,
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let slot = match part {
            ContextPart::Left => &mut self.left,
            ContextPart::Match => &mut self.matched,
            ContextPart::Right => &mut self.right,
        };
        slot.get_or_insert_with(BTreeMap::new).insert(
            annotation.into(),
            words.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Context tokens for a part and annotation; empty if the node didn't send them.
    pub fn context(&self, part: ContextPart, annotation: &str) -> &[String] {
        let tokens = match part {
            ContextPart::Left => self.left.as_ref(),
            ContextPart::Match => self.matched.as_ref(),
            ContextPart::Right => self.right.as_ref(),
        };
        tokens
            .and_then(|t| t.get(annotation))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Whether text comparisons respect case and diacritics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchSensitivity {
    /// Compare exactly.
    Sensitive,
    /// Ignore case and diacritics.
    Insensitive,
}

impl MatchSensitivity {
    /// Normalize a token for comparison under this sensitivity.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            MatchSensitivity::Sensitive => Cow::Borrowed(text),
            MatchSensitivity::Insensitive => Cow::Owned(fold(text)),
        }
    }
}

/// Lowercase and strip diacritics.
pub(crate) fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare the context text of two hits.
///
/// With `from_start` false the tokens are compared starting from the end
/// (the token closest to the match for left context). With
/// `stop_after_one_word` only the first compared token counts.
pub fn compare_hit_text(
    a: &Hit,
    b: &Hit,
    part: ContextPart,
    annotation: &str,
    sensitivity: MatchSensitivity,
    from_start: bool,
    stop_after_one_word: bool,
) -> Ordering {
    let wa = ordered_words(a.context(part, annotation), from_start, stop_after_one_word);
    let wb = ordered_words(b.context(part, annotation), from_start, stop_after_one_word);

    for (x, y) in wa.iter().zip(wb.iter()) {
        let ord = sensitivity.normalize(x).cmp(&sensitivity.normalize(y));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    wa.len().cmp(&wb.len())
}

fn ordered_words(words: &[String], from_start: bool, stop_after_one_word: bool) -> Vec<&str> {
    let limit = if stop_after_one_word { 1 } else { usize::MAX };
    if from_start {
        words.iter().map(String::as_str).take(limit).collect()
    } else {
        words.iter().rev().map(String::as_str).take(limit).collect()
    }
}
