//! Ordinal resolution: title → sortable integer rank.
//!
//! The first ordinal word or digit run in a title decides its number.
//! Resolution never fails; a title without a recognised ordinal gets
//! [`UNRESOLVED_NUMBER`] so it still sorts, after every numbered sibling.

use crate::error::LawTreeError;
use crate::output::UNRESOLVED_NUMBER;
use crate::vocabulary::Vocabulary;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

/// Digit run in Western, Arabic-Indic or Extended Arabic-Indic digits.
pub(crate) const DIGITS: &str = "[0-9\u{0660}-\u{0669}\u{06F0}-\u{06F9}]+";

static DEFAULT_RESOLVER: Lazy<OrdinalResolver> = Lazy::new(|| {
    OrdinalResolver::new(&Vocabulary::arabic()).expect("built-in vocabulary compiles")
});

/// Resolve `title` with the built-in Arabic vocabulary.
pub fn resolve_ordinal(title: &str) -> u32 {
    DEFAULT_RESOLVER.resolve(title)
}

/// Compile a vocabulary-derived pattern. Keywords and ordinal words match
/// regardless of case, which matters for vocabularies in a cased script.
pub(crate) fn vocabulary_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Maps ordinal tokens to ranks using a vocabulary's ordinal word map.
#[derive(Debug, Clone)]
pub struct OrdinalResolver {
    pattern: Regex,
    ranks: HashMap<String, u32>,
}

impl OrdinalResolver {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, LawTreeError> {
        let words: Vec<&str> = vocabulary
            .ordinal_words
            .iter()
            .map(|o| o.word.as_str())
            .collect();
        let pattern = format!("(?:{}|{DIGITS})", alternation(&words));
        let pattern = vocabulary_regex(&pattern).map_err(|source| LawTreeError::InvalidPattern {
            level: "ordinal".into(),
            source,
        })?;
        let ranks = vocabulary
            .ordinal_words
            .iter()
            .map(|o| (o.word.to_lowercase(), o.rank))
            .collect();
        Ok(Self { pattern, ranks })
    }

    /// Rank of the first ordinal token in `title`, or [`UNRESOLVED_NUMBER`].
    pub fn resolve(&self, title: &str) -> u32 {
        let Some(token) = self.pattern.find(title) else {
            return UNRESOLVED_NUMBER;
        };
        let token = token.as_str();
        self.ranks
            .get(&token.to_lowercase())
            .copied()
            .or_else(|| parse_digits(token))
            .unwrap_or(UNRESOLVED_NUMBER)
    }
}

/// Escaped regex alternation, longest word first so that `أولى` wins over
/// its prefix `أول`.
pub(crate) fn alternation(words: &[&str]) -> String {
    let mut sorted: Vec<&str> = words.to_vec();
    sorted.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    sorted.dedup();
    sorted
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

/// Parse a digit run in any of the supported scripts.
fn parse_digits(token: &str) -> Option<u32> {
    token.chars().try_fold(0u32, |acc, c| {
        let digit = match c {
            '0'..='9' => c as u32 - '0' as u32,
            '\u{0660}'..='\u{0669}' => c as u32 - 0x0660,
            '\u{06F0}'..='\u{06F9}' => c as u32 - 0x06F0,
            _ => return None,
        };
        acc.checked_mul(10)?.checked_add(digit)
    })
}
