//! Result types: the document tree and per-run statistics.
//!
//! The tree is plain owned data. Field names follow the JSON records the
//! converter has always emitted (`type`, `title`, `number`, `marker`,
//! `content`, `children`), so downstream consumers see the same shape no
//! matter which serialiser the caller picks.

use crate::error::DocumentError;
use crate::pipeline::normalize::NormalizationReport;
use crate::vocabulary::Level;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ordinal assigned when no ordinal word or digit run is found in a title.
pub const UNRESOLVED_NUMBER: u32 = 999;

/// One titled unit of the legal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub level: Level,
    /// Vocabulary label of the level, e.g. `باب`.
    #[serde(rename = "type")]
    pub label: String,
    pub title: String,
    /// Resolved ordinal; 0 for a preliminary unit, [`UNRESOLVED_NUMBER`]
    /// when unrecognised.
    pub number: u32,
    /// The delimiter line the node was parsed from.
    pub marker: String,
    pub content: String,
    pub children: Vec<Node>,
}

impl Node {
    /// Number of nodes at `level` in this subtree, `self` included.
    pub fn count(&self, level: Level) -> usize {
        usize::from(self.level == level)
            + self.children.iter().map(|c| c.count(level)).sum::<usize>()
    }

    /// Number of nodes in this subtree, `self` included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    /// Height of this subtree: 1 for a leaf.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Depth-first, pre-order walk over this subtree.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(Node::walk)))
    }
}

/// A converted legal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    /// Fixed category label from the vocabulary.
    #[serde(rename = "type")]
    pub category: String,
    /// Free text appearing before the first structural marker.
    pub intro: String,
    pub structure: Vec<Node>,
    /// Caller-supplied provenance of the source text.
    pub source_path: String,
}

impl Document {
    /// Number of nodes at `level` anywhere in the tree.
    pub fn count(&self, level: Level) -> usize {
        self.structure.iter().map(|n| n.count(level)).sum()
    }

    /// Per-level node counts.
    pub fn counts(&self) -> StructureCounts {
        StructureCounts {
            sections: self.count(Level::Section),
            chapters: self.count(Level::Chapter),
            sub_chapters: self.count(Level::SubChapter),
            subsections: self.count(Level::Subsection),
            articles: self.count(Level::Article),
        }
    }

    /// Depth-first, pre-order walk over every node.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.structure.iter().flat_map(Node::walk)
    }
}

/// Node counts per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureCounts {
    pub sections: usize,
    pub chapters: usize,
    pub sub_chapters: usize,
    pub subsections: usize,
    pub articles: usize,
}

impl StructureCounts {
    /// Count for one level.
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::Section => self.sections,
            Level::Chapter => self.chapters,
            Level::SubChapter => self.sub_chapters,
            Level::Subsection => self.subsections,
            Level::Article => self.articles,
        }
    }

    pub fn total(&self) -> usize {
        self.sections + self.chapters + self.sub_chapters + self.subsections + self.articles
    }
}

/// Statistics for one converted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Spans found by the segmenter across all levels.
    pub spans_detected: usize,
    /// Nodes built from the annotated text, before pruning.
    pub nodes_built: usize,
    /// Nodes dropped for having neither content nor children.
    pub nodes_pruned: usize,
    /// Nodes per level in the final tree.
    pub counts: StructureCounts,
    /// Characters in the decoded input.
    pub input_chars: usize,
    /// Characters in the normalised flat text.
    pub normalized_chars: usize,
    pub duration_ms: u64,
}

/// Everything one conversion produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub document: Document,
    /// Delimiter-annotated intermediate text; worth persisting for debugging.
    pub annotated: String,
    pub report: NormalizationReport,
    pub stats: ConversionStats,
}

/// Outcome of one document of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub input: PathBuf,
    /// Where the JSON document was written, on success.
    pub output_path: Option<PathBuf>,
    pub stats: Option<ConversionStats>,
    pub error: Option<DocumentError>,
}

impl DocumentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole batch, sorted by input path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutput {
    pub results: Vec<DocumentResult>,
}

impl BatchOutput {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Sum of per-level counts over every converted document.
    pub fn totals(&self) -> StructureCounts {
        self.results
            .iter()
            .filter_map(|r| r.stats.as_ref())
            .fold(StructureCounts::default(), |acc, s| StructureCounts {
                sections: acc.sections + s.counts.sections,
                chapters: acc.chapters + s.counts.chapters,
                sub_chapters: acc.sub_chapters + s.counts.sub_chapters,
                subsections: acc.subsections + s.counts.subsections,
                articles: acc.articles + s.counts.articles,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(level: Level, children: Vec<Node>) -> Node {
        Node {
            level,
            label: level.to_string(),
            title: String::new(),
            number: 1,
            marker: String::new(),
            content: "x".into(),
            children,
        }
    }

    #[test]
    fn counts_walk_the_whole_tree() {
        let doc = Document {
            title: "t".into(),
            category: "c".into(),
            intro: String::new(),
            structure: vec![node(
                Level::Section,
                vec![
                    node(Level::Chapter, vec![node(Level::Article, vec![])]),
                    node(Level::Article, vec![]),
                ],
            )],
            source_path: "s".into(),
        };
        let counts = doc.counts();
        assert_eq!(counts.sections, 1);
        assert_eq!(counts.chapters, 1);
        assert_eq!(counts.articles, 2);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.get(Level::Article), 2);
        assert_eq!(counts.get(Level::Subsection), 0);
        assert_eq!(doc.nodes().count(), 4);
        assert_eq!(doc.structure[0].depth(), 3);
    }

    #[test]
    fn node_serialises_level_label_as_type() {
        let n = node(Level::Article, vec![]);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "article");
        assert_eq!(json["level"], "article");
        assert!(json["children"].as_array().unwrap().is_empty());
    }

    #[test]
    fn batch_output_tallies() {
        let ok = DocumentResult {
            input: "a.txt".into(),
            output_path: Some("a.json".into()),
            stats: Some(ConversionStats {
                counts: StructureCounts {
                    articles: 3,
                    ..Default::default()
                },
                ..Default::default()
            }),
            error: None,
        };
        let missing = DocumentResult {
            input: "b.txt".into(),
            output_path: None,
            stats: None,
            error: Some(DocumentError::Missing {
                path: "b.txt".into(),
            }),
        };
        let batch = BatchOutput {
            results: vec![ok, missing],
        };
        assert_eq!(batch.succeeded(), 1);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.totals().articles, 3);
    }
}
