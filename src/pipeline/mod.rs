//! Pipeline stages for statute-to-tree conversion.
//!
//! Each submodule implements exactly one transformation step. Stages are
//! synchronous and hold the whole document in memory; parallelism exists
//! only across documents (see [`crate::convert::convert_batch`]).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ segment ──▶ tree ──▶ prune
//! (bytes)   (OCR repair)  (annotate)  (nest)   (drop empty)
//! ```
//!
//! 1. [`input`]     — read a file, dropping undecodable bytes
//! 2. [`normalize`] — deterministic repair rules, flattened to one line
//! 3. [`segment`]   — find level boundaries and wrap them in delimiters
//! 4. [`tree`]      — re-read the annotated text into nested nodes
//!
//! [`ordinal`] is shared by the segmenter (ordinal grammar) and the tree
//! builder (node numbers).

pub mod input;
pub mod normalize;
pub mod ordinal;
pub mod segment;
pub mod tree;

use crate::config::ConversionConfig;
use crate::error::LawTreeError;
use crate::output::{ConversionOutput, ConversionStats, Document};
use crate::vocabulary::Vocabulary;
use normalize::{Normalized, Normalizer};
use ordinal::OrdinalResolver;
use segment::{Segmentation, Segmenter};
use std::time::Instant;
use tracing::info;
use tree::TreeBuilder;

/// All stages, compiled once for a configuration.
///
/// Construction is the only fallible step; [`Pipeline::run`] cannot fail.
#[derive(Debug, Clone)]
pub struct Pipeline {
    normalizer: Normalizer,
    segmenter: Segmenter,
    builder: TreeBuilder,
    vocabulary: Vocabulary,
}

impl Pipeline {
    pub fn new(config: &ConversionConfig) -> Result<Self, LawTreeError> {
        let vocabulary = &config.vocabulary;
        vocabulary.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(config)?,
            segmenter: Segmenter::new(vocabulary)?,
            builder: TreeBuilder::new(vocabulary, OrdinalResolver::new(vocabulary)?)?,
            vocabulary: vocabulary.clone(),
        })
    }

    /// Normalise and segment `raw` without building a tree.
    pub fn annotate(&self, raw: &str) -> (Normalized, Segmentation) {
        let normalized = self.normalizer.normalize(raw);
        let segmentation = self.segmenter.annotate(&normalized.text);
        (normalized, segmentation)
    }

    /// Convert `raw` into a document titled `title`, recording `source` as
    /// its provenance.
    pub fn run(&self, raw: &str, title: &str, source: &str) -> ConversionOutput {
        let start = Instant::now();

        let (normalized, segmentation) = self.annotate(raw);
        let parsed = self.builder.build(&segmentation.annotated);
        let nodes_built = parsed.size();
        let structure = tree::prune(parsed.nodes);

        let document = Document {
            title: title.to_string(),
            category: self.vocabulary.category.clone(),
            intro: parsed.intro,
            structure,
            source_path: source.to_string(),
        };
        let counts = document.counts();
        let stats = ConversionStats {
            spans_detected: segmentation.spans.len(),
            nodes_built,
            nodes_pruned: nodes_built - counts.total(),
            counts,
            input_chars: raw.chars().count(),
            normalized_chars: normalized.text.chars().count(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Converted '{}': {} sections, {} chapters, {} sub-chapters, {} subsections, {} articles ({} pruned)",
            title,
            counts.sections,
            counts.chapters,
            counts.sub_chapters,
            counts.subsections,
            counts.articles,
            stats.nodes_pruned
        );

        ConversionOutput {
            document,
            annotated: segmentation.annotated,
            report: normalized.report,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Level;

    fn pipeline() -> Pipeline {
        Pipeline::new(&ConversionConfig::default()).unwrap()
    }

    #[test]
    fn builds_nested_document() {
        let out = pipeline().run(
            "القسم الأول تمهيدي. الباب الأول التسمية. المادة 1 يسمى هذا القانون.",
            "قانون",
            "mem://law",
        );
        let doc = &out.document;
        assert_eq!(doc.structure.len(), 1);
        let section = &doc.structure[0];
        assert_eq!(section.level, Level::Section);
        assert_eq!(section.number, 1);
        let chapter = &section.children[0];
        assert_eq!(chapter.level, Level::Chapter);
        let article = &chapter.children[0];
        assert_eq!(article.level, Level::Article);
        assert_eq!(article.number, 1);
        assert!(article.content.contains("يسمى هذا القانون"));

        assert_eq!(out.stats.spans_detected, 3);
        assert_eq!(out.stats.counts.articles, 1);
        assert_eq!(doc.category, "قانون تنظيمي");
        assert_eq!(doc.source_path, "mem://law");
    }

    #[test]
    fn empty_headings_are_pruned_and_counted() {
        let out = pipeline().run("الباب الأول. الباب الثاني. المادة 1 نص.", "t", "s");
        assert_eq!(out.stats.nodes_built, 3);
        assert_eq!(out.stats.nodes_pruned, 1);
        assert_eq!(out.document.structure.len(), 1);
        assert_eq!(out.document.structure[0].number, 2);
    }

    #[test]
    fn section_inside_chapter_title_keeps_tree_well_formed() {
        let out = pipeline().run(
            "الباب الأول أحكام القسم الثاني مقتضيات. المادة 1 نص.",
            "t",
            "s",
        );
        assert_eq!(out.stats.spans_detected, 3);
        assert_eq!(out.stats.nodes_built, 3);
        assert_eq!(out.stats.nodes_pruned, 1);

        let structure = &out.document.structure;
        assert_eq!(structure.len(), 1);
        let section = &structure[0];
        assert_eq!(section.level, Level::Section);
        assert_eq!(section.number, 2);
        assert_eq!(section.children.len(), 1);
        assert_eq!(section.children[0].level, Level::Article);
        assert_eq!(section.children[0].content, "نص.");
        assert!(out.document.intro.is_empty());
    }

    #[test]
    fn text_without_markers_becomes_intro() {
        let out = pipeline().run("نص بدون أي عنوان", "t", "s");
        assert!(out.document.structure.is_empty());
        assert_eq!(out.document.intro, "نص بدون أي عنوان");
        assert_eq!(out.stats.spans_detected, 0);
    }

    #[test]
    fn rejects_invalid_vocabulary() {
        let mut config = ConversionConfig::default();
        config.vocabulary.levels.pop();
        assert!(Pipeline::new(&config).is_err());
    }
}
