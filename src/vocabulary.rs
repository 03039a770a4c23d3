//! Level vocabulary: keywords, ordinal words, and delimiter glyphs.
//!
//! Every language-specific constant the pipeline relies on lives here:
//!
//! 1. **Single source of truth** — the keyword table drives both boundary
//!    detection ([`crate::pipeline::segment`]) and the delimiter re-parse
//!    ([`crate::pipeline::tree`]), so the two stages can never disagree on
//!    the intermediate format.
//!
//! 2. **Portability** — [`Vocabulary`] is serde (de)serialisable. A JSON file
//!    with a different keyword set retargets the pipeline at another family of
//!    legal documents without touching code.
//!
//! [`Vocabulary::arabic()`] (also the [`Default`]) is the vocabulary for
//! Arabic statutes: القسم → الباب → الفصل → الفرع → المادة.

use crate::error::LawTreeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ── Default Arabic constants ─────────────────────────────────────────────

/// Tag prefixed to free content lines in the annotated text.
pub const FREE_CONTENT_TAG: &str = "محتوى:";

/// Tag prefixed to article body lines in the annotated text.
pub const BODY_TAG: &str = "نص:";

/// Category label stamped on every produced document.
pub const DEFAULT_CATEGORY: &str = "قانون تنظيمي";

/// Words whose repeated letters are genuine and must never be collapsed.
pub const LETTER_RUN_EXEMPTIONS: [&str; 3] = ["الله", "الرحمن", "الرحيم"];

/// Suffix allowed after a digit article number ("bis").
pub const ARTICLE_SUFFIX: &str = "مكرر";

const MASCULINE_ORDINALS: [(&str, u32); 10] = [
    ("أول", 1),
    ("ثاني", 2),
    ("ثالث", 3),
    ("رابع", 4),
    ("خامس", 5),
    ("سادس", 6),
    ("سابع", 7),
    ("ثامن", 8),
    ("تاسع", 9),
    ("عاشر", 10),
];

const FEMININE_ORDINALS: [(&str, u32); 10] = [
    ("أولى", 1),
    ("ثانية", 2),
    ("ثالثة", 3),
    ("رابعة", 4),
    ("خامسة", 5),
    ("سادسة", 6),
    ("سابعة", 7),
    ("ثامنة", 8),
    ("تاسعة", 9),
    ("عاشرة", 10),
];

const PRELIMINARY: (&str, u32) = ("تمهيدي", 0);

// ── Level ────────────────────────────────────────────────────────────────

/// One of the five nesting depths of a legal code, shallowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// القسم
    Section,
    /// الباب
    Chapter,
    /// الفصل
    SubChapter,
    /// الفرع
    Subsection,
    /// المادة, always a leaf.
    Article,
}

impl Level {
    /// All levels in rank order.
    pub const ALL: [Level; 5] = [
        Level::Section,
        Level::Chapter,
        Level::SubChapter,
        Level::Subsection,
        Level::Article,
    ];

    /// Depth rank: 0 for [`Level::Section`] up to 4 for [`Level::Article`].
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Article nodes never receive children.
    pub fn is_leaf(self) -> bool {
        self == Level::Article
    }

    /// Levels at the same depth or deeper than `self`.
    pub fn same_or_deeper(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().filter(move |l| l.rank() >= self.rank())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Section => "section",
            Level::Chapter => "chapter",
            Level::SubChapter => "sub_chapter",
            Level::Subsection => "subsection",
            Level::Article => "article",
        };
        f.write_str(name)
    }
}

// ── Delimiters ───────────────────────────────────────────────────────────

/// Left/right glyphs wrapping a detected title in the annotated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterPair {
    pub left: String,
    pub right: String,
}

impl DelimiterPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Render a marker line: `"{left} {title} {right}"`.
    pub fn wrap(&self, title: &str) -> String {
        format!("{} {} {}", self.left, title, self.right)
    }

    /// Recover the title from a marker line produced by [`Self::wrap`].
    ///
    /// Returns `None` when the line is not a marker of this pair or the
    /// enclosed title is blank.
    pub fn unwrap_title<'a>(&self, line: &'a str) -> Option<&'a str> {
        let title = line
            .trim()
            .strip_prefix(self.left.as_str())?
            .strip_suffix(self.right.as_str())?
            .trim();
        (!title.is_empty()).then_some(title)
    }
}

// ── Level table ──────────────────────────────────────────────────────────

/// One row of the level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub level: Level,
    /// Keyword as it appears in running text, e.g. `الباب`.
    pub keyword: String,
    /// Short label emitted as the node type, e.g. `باب`.
    pub label: String,
    /// Ordinal word forms accepted after the keyword.
    pub ordinals: Vec<String>,
    /// Word allowed after a digit ordinal (`مكرر`).
    #[serde(default)]
    pub numeric_suffix: Option<String>,
    /// Whether the title runs past the ordinal up to the next stop.
    pub heading_text: bool,
    pub delimiters: DelimiterPair,
}

/// An ordinal word and the rank it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinalWord {
    pub word: String,
    pub rank: u32,
}

/// Everything the pipeline needs to know about a document family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Exactly five rows, one per [`Level`], in rank order.
    pub levels: Vec<LevelSpec>,
    pub ordinal_words: Vec<OrdinalWord>,
    pub free_content_tag: String,
    pub body_tag: String,
    pub category: String,
    #[serde(default)]
    pub letter_run_exemptions: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::arabic()
    }
}

impl Vocabulary {
    /// Vocabulary for Arabic statutes.
    pub fn arabic() -> Self {
        let masculine = || words(&MASCULINE_ORDINALS).chain([PRELIMINARY.0.to_string()]);
        let feminine = || words(&FEMININE_ORDINALS);

        let levels = vec![
            LevelSpec {
                level: Level::Section,
                keyword: "القسم".into(),
                label: "قسم".into(),
                ordinals: masculine().chain(feminine()).collect(),
                numeric_suffix: None,
                heading_text: true,
                delimiters: DelimiterPair::new("╔═══════", "═══════╗"),
            },
            LevelSpec {
                level: Level::Chapter,
                keyword: "الباب".into(),
                label: "باب".into(),
                ordinals: masculine().collect(),
                numeric_suffix: None,
                heading_text: true,
                delimiters: DelimiterPair::new("╠──────", "──────╣"),
            },
            LevelSpec {
                level: Level::SubChapter,
                keyword: "الفصل".into(),
                label: "فصل".into(),
                ordinals: masculine().collect(),
                numeric_suffix: None,
                heading_text: true,
                delimiters: DelimiterPair::new("╟┄┄┄┄┄", "┄┄┄┄┄╢"),
            },
            LevelSpec {
                level: Level::Subsection,
                keyword: "الفرع".into(),
                label: "فرع".into(),
                ordinals: masculine().collect(),
                numeric_suffix: None,
                heading_text: true,
                delimiters: DelimiterPair::new("╙⋅⋅⋅⋅⋅", "⋅⋅⋅⋅⋅╜"),
            },
            LevelSpec {
                level: Level::Article,
                keyword: "المادة".into(),
                label: "مادة".into(),
                ordinals: feminine().collect(),
                numeric_suffix: Some(ARTICLE_SUFFIX.into()),
                heading_text: false,
                delimiters: DelimiterPair::new("╾─────", "─────╼"),
            },
        ];

        let ordinal_words = MASCULINE_ORDINALS
            .iter()
            .chain(FEMININE_ORDINALS.iter())
            .chain(std::iter::once(&PRELIMINARY))
            .map(|&(word, rank)| OrdinalWord {
                word: word.to_string(),
                rank,
            })
            .collect();

        Self {
            levels,
            ordinal_words,
            free_content_tag: FREE_CONTENT_TAG.into(),
            body_tag: BODY_TAG.into(),
            category: DEFAULT_CATEGORY.into(),
            letter_run_exemptions: LETTER_RUN_EXEMPTIONS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Parse a vocabulary from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, LawTreeError> {
        let vocabulary: Self = serde_json::from_str(json)?;
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    /// The row for `level`.
    ///
    /// Only meaningful on a validated vocabulary, where row `i` holds the
    /// level of rank `i`. [`Segmenter`](crate::pipeline::segment::Segmenter)
    /// and [`TreeBuilder`](crate::pipeline::tree::TreeBuilder) refuse to
    /// build from one that is not.
    ///
    /// # Panics
    /// If the vocabulary has fewer than five rows.
    pub fn spec(&self, level: Level) -> &LevelSpec {
        &self.levels[level.rank()]
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), LawTreeError> {
        let found: Vec<Level> = self.levels.iter().map(|s| s.level).collect();
        if found != Level::ALL {
            return Err(LawTreeError::InvalidConfig(format!(
                "vocabulary must list the five levels in rank order, got {found:?}"
            )));
        }

        let mut glyphs = HashSet::new();
        for spec in &self.levels {
            if spec.keyword.trim().is_empty() {
                return Err(LawTreeError::InvalidConfig(format!(
                    "level {} has an empty keyword",
                    spec.level
                )));
            }
            if spec.ordinals.iter().any(|w| w.trim().is_empty()) {
                return Err(LawTreeError::InvalidConfig(format!(
                    "level {} has an empty ordinal word",
                    spec.level
                )));
            }
            let DelimiterPair { left, right } = &spec.delimiters;
            if left.trim().is_empty() || right.trim().is_empty() {
                return Err(LawTreeError::InvalidConfig(format!(
                    "level {} has an empty delimiter",
                    spec.level
                )));
            }
            if !glyphs.insert(left.as_str()) {
                return Err(LawTreeError::InvalidConfig(format!(
                    "delimiter '{left}' is used by more than one level"
                )));
            }
        }

        if self.ordinal_words.iter().any(|o| o.word.trim().is_empty()) {
            return Err(LawTreeError::InvalidConfig(
                "ordinal word map contains an empty word".into(),
            ));
        }
        if self.free_content_tag.trim().is_empty() || self.body_tag.trim().is_empty() {
            return Err(LawTreeError::InvalidConfig(
                "content tags must not be empty".into(),
            ));
        }
        if self.free_content_tag == self.body_tag {
            return Err(LawTreeError::InvalidConfig(
                "free content and body tags must differ".into(),
            ));
        }
        Ok(())
    }

    /// First character of every left delimiter.
    pub fn marker_glyphs(&self) -> Vec<char> {
        self.levels
            .iter()
            .filter_map(|s| s.delimiters.left.chars().next())
            .collect()
    }
}

fn words(table: &'static [(&'static str, u32)]) -> impl Iterator<Item = String> {
    table.iter().map(|(w, _)| w.to_string())
}
