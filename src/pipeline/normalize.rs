//! Normalisation: deterministic repair of OCR-transcribed statute text.
//!
//! ## What goes wrong in OCR output?
//!
//! Scanned Arabic statutes come back from OCR with a small, stable set of
//! artefacts:
//!
//! - Page banners (`=== PAGE 12 ===`) and page-number lines (`- 12 -`)
//! - Lines holding nothing but dashes or dots
//! - Words split across a line break
//! - The definite article torn apart: `ا لمادة` instead of `المادة`
//! - Stretched glyphs read as runs of one letter: `الممملكة`
//!
//! Every rule below is a pure `&str → String` pass. Line-break joins need the
//! newlines that the final flattening pass removes, and the definite-article
//! repair must precede boundary detection because the level keywords all
//! start with it.
//!
//! Removing one artefact can expose another (a dot line between the halves
//! of `- 5 -`, a collapsed `ااا` in front of `لمادة`), so the removal rules
//! and the repair rules each run until the text stops changing. Every rule
//! only ever shortens the text, which bounds the loop. The result is a fixed
//! point: normalising normalised text changes nothing.

use crate::config::ConversionConfig;
use crate::error::LawTreeError;
use crate::pipeline::ordinal::vocabulary_regex;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Output of [`Normalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Single-line, single-spaced text.
    pub text: String,
    pub report: NormalizationReport,
}

/// What the normaliser changed, for logging and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// `=== PAGE n ===` banners and `- n -` page numbers removed.
    pub page_markers_removed: usize,
    /// Article-prefix repairs keyed by the letter following `ال`.
    pub article_prefix_repairs: BTreeMap<char, usize>,
    /// Repairs of the level keywords themselves.
    pub keyword_repairs: usize,
    /// Words whose letter runs were collapsed, original → corrected.
    pub letter_runs: BTreeMap<String, String>,
}

impl NormalizationReport {
    pub fn total_article_prefix_repairs(&self) -> usize {
        self.article_prefix_repairs.values().sum()
    }
}

/// Text repair pass, compiled once per vocabulary.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// `(keyword, pattern matching its torn form)` for every keyword that
    /// starts with the definite article.
    keyword_repairs: Vec<(String, Regex)>,
    exemptions: HashSet<String>,
    max_letter_run: usize,
}

impl Normalizer {
    pub fn new(config: &ConversionConfig) -> Result<Self, LawTreeError> {
        let keyword_repairs = config
            .vocabulary
            .levels
            .iter()
            .filter_map(|spec| {
                let rest = spec.keyword.strip_prefix("ال")?;
                let pattern = format!(r"\bا\s+ل{}\b", regex::escape(rest));
                Some(
                    vocabulary_regex(&pattern)
                        .map(|re| (spec.keyword.clone(), re))
                        .map_err(|source| LawTreeError::InvalidPattern {
                            level: spec.level.to_string(),
                            source,
                        }),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            keyword_repairs,
            exemptions: config.vocabulary.letter_run_exemptions.iter().cloned().collect(),
            max_letter_run: config.max_letter_run.max(1),
        })
    }

    /// Apply every repair rule to `raw`.
    ///
    /// Rules (applied in order):
    /// 0. Normalise line endings and strip invisible Unicode
    /// 1. Remove page banners and page-number markers
    /// 2. Remove punctuation-only lines and blank lines (1 and 2 repeat until
    ///    stable)
    /// 3. Rejoin words broken across a line boundary
    /// 4. Repair the torn definite article (`ا ل` + letter, then keywords)
    /// 5. Collapse runs of 3+ identical letters (4 and 5 repeat until stable)
    /// 6. Flatten newlines and collapse horizontal whitespace
    pub fn normalize(&self, raw: &str) -> Normalized {
        let mut report = NormalizationReport::default();

        let s = normalise_line_endings(raw);
        let s = remove_invisible_chars(&s);
        let s = until_stable(s, |s| remove_empty_lines(&remove_page_markers(s, &mut report)));
        let s = rejoin_broken_words(&s);
        let s = until_stable(s, |s| {
            let s = repair_article_prefix(s, &mut report);
            let s = self.repair_keywords(&s, &mut report);
            self.collapse_letter_runs(&s, &mut report)
        });
        let text = flatten_whitespace(&s);

        debug!(
            "Normalised {} → {} chars: {} page markers, {} prefix repairs, {} letter-run words",
            raw.chars().count(),
            text.chars().count(),
            report.page_markers_removed,
            report.total_article_prefix_repairs(),
            report.letter_runs.len()
        );

        Normalized { text, report }
    }

    // ── Rule 4b: Keyword repairs ─────────────────────────────────────────

    fn repair_keywords(&self, input: &str, report: &mut NormalizationReport) -> String {
        let mut s = input.to_string();
        for (keyword, pattern) in &self.keyword_repairs {
            let hits = pattern.find_iter(&s).count();
            if hits > 0 {
                report.keyword_repairs += hits;
                s = pattern.replace_all(&s, keyword.as_str()).into_owned();
            }
        }
        s
    }

    // ── Rule 5: Collapse letter runs ─────────────────────────────────────

    fn collapse_letter_runs(&self, input: &str, report: &mut NormalizationReport) -> String {
        RE_WORD
            .replace_all(input, |caps: &Captures<'_>| {
                let word = &caps[0];
                if self.exemptions.contains(word) {
                    return word.to_string();
                }
                match collapse_runs(word, self.max_letter_run) {
                    Some(fixed) => {
                        report.letter_runs.insert(word.to_string(), fixed.clone());
                        fixed
                    }
                    None => word.to_string(),
                }
            })
            .into_owned()
    }
}

/// Apply `pass` until it returns its input unchanged.
fn until_stable(mut text: String, mut pass: impl FnMut(&str) -> String) -> String {
    loop {
        let next = pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

// ── Rule 0: Line endings and invisible characters ─────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 1: Page markers ─────────────────────────────────────────────────

static RE_PAGE_BANNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"=== PAGE \d+ ===").unwrap());

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s*\d+\s*-").unwrap());

fn remove_page_markers(input: &str, report: &mut NormalizationReport) -> String {
    report.page_markers_removed += RE_PAGE_BANNER.find_iter(input).count();
    let s = RE_PAGE_BANNER.replace_all(input, "");
    report.page_markers_removed += RE_PAGE_NUMBER.find_iter(&s).count();
    RE_PAGE_NUMBER.replace_all(&s, "").into_owned()
}

// ── Rule 2: Punctuation-only and blank lines ─────────────────────────────

static RE_PUNCT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-.،]+[ \t]*$\n?").unwrap());

static RE_BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\n").unwrap());

fn remove_empty_lines(input: &str) -> String {
    let s = RE_PUNCT_LINE.replace_all(input, "");
    RE_BLANK_LINE.replace_all(&s, "").into_owned()
}

// ── Rule 3: Broken words ─────────────────────────────────────────────────

static RE_BROKEN_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\x{0627}-\x{064A}\x{0660}-\x{0669}])\n([\x{0627}-\x{064A}])").unwrap()
});

/// Join `letter\nletter` with a single space. Runs twice because matches
/// cannot overlap: in `ب\nت\nث` the first pass only sees the first break.
fn rejoin_broken_words(input: &str) -> String {
    let s = RE_BROKEN_WORD.replace_all(input, "$1 $2");
    RE_BROKEN_WORD.replace_all(&s, "$1 $2").into_owned()
}

// ── Rule 4a: Torn definite article ───────────────────────────────────────

static RE_TORN_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bا\s+ل([\x{0627}-\x{064A}])").unwrap());

fn repair_article_prefix(input: &str, report: &mut NormalizationReport) -> String {
    RE_TORN_ARTICLE
        .replace_all(input, |caps: &Captures<'_>| {
            let letter = &caps[1];
            if let Some(c) = letter.chars().next() {
                *report.article_prefix_repairs.entry(c).or_default() += 1;
            }
            format!("ال{letter}")
        })
        .into_owned()
}

// ── Rule 5 helpers ───────────────────────────────────────────────────────

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

fn is_arabic_letter(c: char) -> bool {
    ('\u{0627}'..='\u{064A}').contains(&c)
}

/// Cap every run of 3+ identical Arabic letters at `max` repetitions, or
/// `None` if the word has no such run.
fn collapse_runs(word: &str, max: usize) -> Option<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut out = String::with_capacity(word.len());
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&d| d == c).count();
        let keep = if is_arabic_letter(c) && run >= 3 {
            run.min(max)
        } else {
            run
        };
        changed |= keep != run;
        out.extend(std::iter::repeat_n(c, keep));
        i += run;
    }

    changed.then_some(out)
}

// ── Rule 6: Flatten whitespace ───────────────────────────────────────────

static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn flatten_whitespace(input: &str) -> String {
    let s = input.replace('\n', " ");
    RE_HORIZONTAL_WS.replace_all(&s, " ").trim().to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(&ConversionConfig::default()).unwrap()
    }

    #[test]
    fn test_remove_page_markers() {
        let mut report = NormalizationReport::default();
        let out = remove_page_markers("نص === PAGE 3 === آخر\n- 12 -\n", &mut report);
        assert!(!out.contains("PAGE"));
        assert!(!out.contains("12"));
        assert_eq!(report.page_markers_removed, 2);
    }

    #[test]
    fn test_remove_empty_lines() {
        let out = remove_empty_lines("أ\n---\n\n . \nب\n   \nج");
        assert_eq!(out, "أ\nب\nج");
    }

    #[test]
    fn test_rejoin_broken_words() {
        assert_eq!(rejoin_broken_words("الما\nدة"), "الما دة");
        assert_eq!(rejoin_broken_words("ب\nت\nث"), "ب ت ث");
        assert_eq!(rejoin_broken_words("١\nب"), "١ ب");
        // Latin text is left alone.
        assert_eq!(rejoin_broken_words("a\nb"), "a\nb");
    }

    #[test]
    fn test_repair_article_prefix_counts_letters() {
        let mut report = NormalizationReport::default();
        let out = repair_article_prefix("ا لمادة و ا لباب و ا لمادة", &mut report);
        assert_eq!(out, "المادة و الباب و المادة");
        assert_eq!(report.article_prefix_repairs.get(&'م'), Some(&2));
        assert_eq!(report.article_prefix_repairs.get(&'ب'), Some(&1));
    }

    #[test]
    fn test_article_prefix_needs_isolated_alef() {
        let mut report = NormalizationReport::default();
        // The alef ending هذا is not an isolated prefix.
        let out = repair_article_prefix("هذا لقانون", &mut report);
        assert_eq!(out, "هذا لقانون");
        assert!(report.article_prefix_repairs.is_empty());
    }

    #[test]
    fn test_keyword_repairs() {
        let n = normalizer();
        let mut report = NormalizationReport::default();
        let out = n.repair_keywords("ا  لفصل الأول", &mut report);
        assert_eq!(out, "الفصل الأول");
        assert_eq!(report.keyword_repairs, 1);
    }

    #[test]
    fn test_collapse_runs() {
        assert_eq!(collapse_runs("الممملكة", 2).as_deref(), Some("المملكة"));
        assert_eq!(collapse_runs("ققققانون", 1).as_deref(), Some("قانون"));
        assert_eq!(collapse_runs("المملكة", 2), None);
        // Digits are never collapsed.
        assert_eq!(collapse_runs("1999", 2), None);
    }

    #[test]
    fn test_letter_run_exemptions() {
        let mut config = ConversionConfig::default();
        config.vocabulary.letter_run_exemptions = vec!["بببب".into()];
        let n = Normalizer::new(&config).unwrap();
        let mut report = NormalizationReport::default();
        let out = n.collapse_letter_runs("بببب تتتت", &mut report);
        assert_eq!(out, "بببب تت");
        assert_eq!(report.letter_runs.get("تتتت").map(String::as_str), Some("تت"));
        assert!(!report.letter_runs.contains_key("بببب"));
    }

    #[test]
    fn test_flatten_whitespace() {
        assert_eq!(flatten_whitespace("  أ\n\tب   ج \n"), "أ ب ج");
    }

    #[test]
    fn test_normalize_full_pipeline() {
        let raw = "=== PAGE 1 ===\r\nا لقسم الأول\r\n- 1 -\r\n...\r\n\r\nالمادة 1 تطبق في الممممملكة\n";
        let out = normalizer().normalize(raw);
        assert_eq!(out.text, "القسم الأول المادة 1 تطبق في المملكة");
        assert!(!out.text.contains('\n'));
        assert_eq!(out.report.page_markers_removed, 2);
        assert_eq!(out.report.total_article_prefix_repairs(), 1);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "=== PAGE 2 ===\nا لباب الثاني\nالأحكا\nم العامة\n- 7 -\nالمادة ١ تتتطبق\n\n\n";
        let n = normalizer();
        let once = n.normalize(raw).text;
        let twice = n.normalize(&once);
        assert_eq!(twice.text, once);
        assert_eq!(twice.report, NormalizationReport::default());
    }

    #[test]
    fn test_page_number_split_by_dot_line() {
        let n = normalizer();
        let once = n.normalize("نص -\n.\n5 - آخر");
        assert_eq!(once.text, "نص آخر");
        assert_eq!(once.report.page_markers_removed, 1);
        assert_eq!(n.normalize(&once.text).text, once.text);
    }

    #[test]
    fn test_collapse_exposes_torn_article() {
        let config = ConversionConfig::builder().max_letter_run(1).build().unwrap();
        let n = Normalizer::new(&config).unwrap();
        let once = n.normalize("ااا لمادة 1 نص");
        assert_eq!(once.text, "المادة 1 نص");
        assert_eq!(once.report.article_prefix_repairs.get(&'م'), Some(&1));
        assert_eq!(n.normalize(&once.text).text, once.text);
    }

    #[test]
    fn test_until_stable_stops_at_fixed_point() {
        let out = until_stable("aaaa".to_string(), |s| s.replacen("aa", "a", 1));
        assert_eq!(out, "a");
    }

    #[test]
    fn test_empty_input() {
        let out = normalizer().normalize("");
        assert_eq!(out.text, "");
    }
}
