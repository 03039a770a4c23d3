//! Segmentation: find level boundaries in flat text and annotate them.
//!
//! A boundary is a level keyword followed by an ordinal (`الباب الثاني`,
//! `المادة 12 مكرر`). For every level the vocabulary yields two patterns:
//!
//! - a **heading** pattern, `\b<keyword>\s+(?:ال)?<ordinal>`
//! - a **stop** pattern, `\s*(?:[.؛]|<keyword of this level or deeper>)`
//!
//! Both ignore case. A title runs from the heading to the first stop (or the
//! end of the text).
//! Article titles stop right after the ordinal so that the article body
//! becomes content rather than title.
//!
//! Spans are collected per level without overlap, then merged and sorted by
//! start offset. Spans of different levels may overlap; they are emitted as
//! found.
//!
//! ## Annotated format
//!
//! ```text
//! محتوى: <text before the first span>
//!
//! ╔═══════ القسم الأول أحكام عامة ═══════╗
//!
//! ╾───── المادة 1 ─────╼
//! نص: <article body>
//! ```
//!
//! This text is the private wire format between this stage and
//! [`crate::pipeline::tree`].

use crate::error::LawTreeError;
use crate::pipeline::ordinal::{alternation, vocabulary_regex, DIGITS};
use crate::vocabulary::{Level, LevelSpec, Vocabulary};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A detected boundary in the normalised text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub level: Level,
    /// Matched text, trimmed.
    pub title: String,
    /// Byte offset of the keyword.
    pub start: usize,
    /// Byte offset just past the title (half-open).
    pub end: usize,
}

/// Output of [`Segmenter::annotate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// All spans, sorted by start offset.
    pub spans: Vec<Span>,
    /// Delimiter-annotated text.
    pub annotated: String,
}

#[derive(Debug, Clone)]
struct LevelPattern {
    level: Level,
    heading: Regex,
    /// `None` for levels whose title ends at the ordinal.
    stop: Option<Regex>,
}

/// Boundary detector and annotator, compiled once per vocabulary.
#[derive(Debug, Clone)]
pub struct Segmenter {
    patterns: Vec<LevelPattern>,
    vocabulary: Vocabulary,
}

impl Segmenter {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, LawTreeError> {
        vocabulary.validate()?;
        let patterns = vocabulary
            .levels
            .iter()
            .map(|spec| compile_level(spec, vocabulary))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            vocabulary: vocabulary.clone(),
        })
    }

    /// Find every span in `text`, sorted by start offset.
    ///
    /// Ties keep level order (shallowest first) because the sort is stable.
    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .patterns
            .iter()
            .flat_map(|p| find_level_spans(p, text))
            .collect();
        spans.sort_by_key(|s| s.start);
        spans
    }

    /// Detect spans and re-emit `text` in the annotated format.
    pub fn annotate(&self, text: &str) -> Segmentation {
        let spans = self.detect(text);
        let annotated = self.render(text, &spans);
        debug!(
            "Segmented {} chars into {} spans ({} articles)",
            text.chars().count(),
            spans.len(),
            spans.iter().filter(|s| s.level.is_leaf()).count()
        );
        Segmentation { spans, annotated }
    }

    fn render(&self, text: &str, spans: &[Span]) -> String {
        let free_tag = &self.vocabulary.free_content_tag;
        let body_tag = &self.vocabulary.body_tag;
        let mut lines: Vec<String> = Vec::with_capacity(spans.len() * 3 + 2);
        let mut last_end = 0usize;

        for (i, span) in spans.iter().enumerate() {
            if span.start > last_end {
                if let Some(content) = meaningful(&text[last_end..span.start]) {
                    lines.push(format!("{free_tag} {content}"));
                    lines.push(String::new());
                }
            }

            let delimiters = &self.vocabulary.spec(span.level).delimiters;
            lines.push(delimiters.wrap(&span.title));
            last_end = last_end.max(span.end);

            if span.level.is_leaf() {
                let next_start = spans.get(i + 1).map_or(text.len(), |s| s.start);
                if next_start > last_end {
                    if let Some(body) = meaningful(&text[last_end..next_start]) {
                        lines.push(format!("{body_tag} {body}"));
                    }
                    // The body belongs to the article; never re-emit it as
                    // free content.
                    last_end = next_start;
                }
                lines.push(String::new());
            }
            lines.push(String::new());
        }

        if let Some(rest) = meaningful(&text[last_end..]) {
            lines.push(format!("{free_tag} {rest}"));
        }

        collapse_blank_lines(lines.join("\n").trim())
    }
}

fn compile_level(spec: &LevelSpec, vocabulary: &Vocabulary) -> Result<LevelPattern, LawTreeError> {
    let invalid = |source| LawTreeError::InvalidPattern {
        level: spec.level.to_string(),
        source,
    };

    let ordinals: Vec<&str> = spec.ordinals.iter().map(String::as_str).collect();
    let numeric = match &spec.numeric_suffix {
        Some(suffix) => format!(
            r"{DIGITS}(?:\s*{}(?:\s*{DIGITS})?)?",
            regex::escape(suffix)
        ),
        None => DIGITS.to_string(),
    };
    let ordinal = if ordinals.is_empty() {
        numeric
    } else {
        format!("{}|{numeric}", alternation(&ordinals))
    };
    let heading = format!(
        r"\b{}\s+(?:ال)?(?:{ordinal})",
        regex::escape(&spec.keyword)
    );
    let heading = vocabulary_regex(&heading).map_err(invalid)?;

    let stop = if spec.heading_text {
        let keywords: Vec<&str> = spec
            .level
            .same_or_deeper()
            .map(|l| vocabulary.spec(l).keyword.as_str())
            .collect();
        let keywords = keywords
            .iter()
            .map(|k| format!(r"\b{}", regex::escape(k)))
            .collect::<Vec<_>>()
            .join("|");
        Some(vocabulary_regex(&format!(r"\s*(?:[.؛]|{keywords})")).map_err(invalid)?)
    } else {
        None
    };

    Ok(LevelPattern {
        level: spec.level,
        heading,
        stop,
    })
}

/// Non-overlapping spans of one level, in text order.
fn find_level_spans(pattern: &LevelPattern, text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos <= text.len() {
        let Some(m) = pattern.heading.find_at(text, pos) else {
            break;
        };
        let end = match &pattern.stop {
            Some(stop) => stop
                .find_at(text, m.end())
                .map_or(text.len(), |s| s.start()),
            None => m.end(),
        };
        spans.push(Span {
            level: pattern.level,
            title: text[m.start()..end].trim().to_string(),
            start: m.start(),
            end,
        });
        pos = end.max(m.end());
    }

    spans
}

/// `segment` without surrounding whitespace and leading sentence
/// punctuation, or `None` if no letter or digit is left (the `.` closing a
/// title is not content).
fn meaningful(segment: &str) -> Option<&str> {
    let trimmed = segment
        .trim()
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '؛' | ':' | '،' | '-'));
    trimmed
        .chars()
        .any(char::is_alphanumeric)
        .then_some(trimmed)
}

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapse three or more consecutive newlines to exactly one blank line.
pub fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n").into_owned()
}
