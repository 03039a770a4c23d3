//! Tree reconstruction from the annotated text.
//!
//! The builder reads the segmenter's output line by line. Nodes live in a
//! flat arena and refer to their children by index; a separate stack holds
//! the indices of the currently open ancestors. Only when the whole text has
//! been read is the arena turned into owned [`Node`] values.

use crate::error::LawTreeError;
use crate::output::Node;
use crate::pipeline::ordinal::OrdinalResolver;
use crate::vocabulary::{Level, Vocabulary};
use tracing::debug;

/// Result of [`TreeBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTree {
    /// Text found before the first marker line.
    pub intro: String,
    /// Top-level nodes, unpruned.
    pub nodes: Vec<Node>,
}

impl ParsedTree {
    /// Total number of nodes, nested ones included.
    pub fn size(&self) -> usize {
        self.nodes.iter().map(Node::size).sum()
    }
}

#[derive(Debug)]
struct ArenaNode {
    level: Level,
    title: String,
    marker: String,
    content: String,
    children: Vec<usize>,
}

/// Re-parses annotated text into a nested tree.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    vocabulary: Vocabulary,
    resolver: OrdinalResolver,
    marker_glyphs: Vec<char>,
}

impl TreeBuilder {
    pub fn new(vocabulary: &Vocabulary, resolver: OrdinalResolver) -> Result<Self, LawTreeError> {
        vocabulary.validate()?;
        Ok(Self {
            vocabulary: vocabulary.clone(),
            resolver,
            marker_glyphs: vocabulary.marker_glyphs(),
        })
    }

    pub fn build(&self, annotated: &str) -> ParsedTree {
        let mut arena: Vec<ArenaNode> = Vec::new();
        let mut roots: Vec<usize> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut current: Option<usize> = None;
        let mut intro = String::new();

        for line in annotated.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }

            if let Some((level, title)) = self.parse_marker(line) {
                while let Some(&top) = open.last() {
                    if arena[top].level.rank() < level.rank() {
                        break;
                    }
                    open.pop();
                }

                let idx = arena.len();
                arena.push(ArenaNode {
                    level,
                    title: title.to_string(),
                    marker: line.to_string(),
                    content: String::new(),
                    children: Vec::new(),
                });
                match open.last() {
                    Some(&parent) => arena[parent].children.push(idx),
                    None => roots.push(idx),
                }
                if !level.is_leaf() {
                    open.push(idx);
                }
                current = Some(idx);
                continue;
            }

            if let Some(text) = self.strip_tag(line) {
                match current {
                    Some(idx) => append(&mut arena[idx].content, text),
                    None => append(&mut intro, text),
                }
                continue;
            }

            match current {
                Some(idx) if !arena[idx].level.is_leaf() => {
                    if !self.starts_with_glyph(line) {
                        append(&mut arena[idx].content, line);
                    }
                }
                Some(_) => {}
                None => append(&mut intro, line),
            }
        }

        debug!(
            "Built {} nodes ({} top-level) from annotated text",
            arena.len(),
            roots.len()
        );

        let nodes = roots
            .iter()
            .map(|&idx| self.materialize(&arena, idx))
            .collect();
        ParsedTree { intro, nodes }
    }

    fn parse_marker<'a>(&self, line: &'a str) -> Option<(Level, &'a str)> {
        self.vocabulary
            .levels
            .iter()
            .find_map(|spec| spec.delimiters.unwrap_title(line).map(|t| (spec.level, t)))
    }

    fn strip_tag<'a>(&self, line: &'a str) -> Option<&'a str> {
        [&self.vocabulary.free_content_tag, &self.vocabulary.body_tag]
            .into_iter()
            .find_map(|tag| line.strip_prefix(tag.as_str()))
            .map(str::trim)
    }

    fn starts_with_glyph(&self, line: &str) -> bool {
        line.starts_with(self.marker_glyphs.as_slice())
    }

    fn materialize(&self, arena: &[ArenaNode], idx: usize) -> Node {
        let n = &arena[idx];
        Node {
            level: n.level,
            label: self.vocabulary.spec(n.level).label.clone(),
            title: n.title.clone(),
            number: self.resolver.resolve(&n.title),
            marker: n.marker.clone(),
            content: n.content.clone(),
            children: n
                .children
                .iter()
                .map(|&c| self.materialize(arena, c))
                .collect(),
        }
    }
}

fn append(target: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

/// Drop every node whose trimmed content is empty and whose children are all
/// pruned away. Order is preserved; kept content is trimmed.
pub fn prune(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            node.children = prune(std::mem::take(&mut node.children));
            let trimmed = node.content.trim();
            if trimmed.len() != node.content.len() {
                node.content = trimmed.to_string();
            }
            (!node.content.is_empty() || !node.children.is_empty()).then_some(node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TreeBuilder {
        let vocab = Vocabulary::arabic();
        let resolver = OrdinalResolver::new(&vocab).unwrap();
        TreeBuilder::new(&vocab, resolver).unwrap()
    }

    #[test]
    fn rejects_incomplete_vocabulary() {
        let mut vocab = Vocabulary::arabic();
        let resolver = OrdinalResolver::new(&vocab).unwrap();
        vocab.levels.truncate(4);
        assert!(matches!(
            TreeBuilder::new(&vocab, resolver),
            Err(LawTreeError::InvalidConfig(_))
        ));
    }

    const SECTION: &str = "╔═══════ القسم الأول أحكام عامة ═══════╗";
    const CHAPTER_1: &str = "╠────── الباب الأول التعاريف ──────╣";
    const CHAPTER_2: &str = "╠────── الباب الثاني النطاق ──────╣";
    const ARTICLE_1: &str = "╾───── المادة 1 ─────╼";
    const ARTICLE_2: &str = "╾───── المادة 2 ─────╼";

    #[test]
    fn nests_by_level_rank() {
        let text = [
            SECTION,
            CHAPTER_1,
            ARTICLE_1,
            "نص: أول نص.",
            ARTICLE_2,
            "نص: ثاني نص.",
            CHAPTER_2,
            "محتوى: مقدمة الباب.",
        ]
        .join("\n");
        let tree = builder().build(&text);

        assert_eq!(tree.nodes.len(), 1);
        let section = &tree.nodes[0];
        assert_eq!(section.level, Level::Section);
        assert_eq!(section.children.len(), 2);

        let chapter = &section.children[0];
        assert_eq!(chapter.number, 1);
        assert_eq!(chapter.children.len(), 2);
        assert_eq!(chapter.children[1].number, 2);
        assert_eq!(chapter.children[1].content, "ثاني نص.");

        let chapter_2 = &section.children[1];
        assert_eq!(chapter_2.number, 2);
        assert_eq!(chapter_2.content, "مقدمة الباب.");
    }

    #[test]
    fn node_fields_come_from_the_marker() {
        let tree = builder().build(SECTION);
        let node = &tree.nodes[0];
        assert_eq!(node.title, "القسم الأول أحكام عامة");
        assert_eq!(node.label, "قسم");
        assert_eq!(node.marker, SECTION);
        assert_eq!(node.number, 1);
    }

    #[test]
    fn articles_stay_leaves() {
        let text = [ARTICLE_1, "نص: أ.", CHAPTER_1, ARTICLE_2, "نص: ب."].join("\n");
        let tree = builder().build(&text);
        // A chapter after an article is a sibling of the article, not a child.
        assert_eq!(tree.nodes.len(), 2);
        assert!(tree.nodes[0].children.is_empty());
        assert_eq!(tree.nodes[1].children.len(), 1);
    }

    #[test]
    fn text_before_first_marker_is_intro() {
        let text = ["محتوى: ظهير شريف.", "", SECTION, "محتوى: تمهيد."].join("\n");
        let tree = builder().build(&text);
        assert_eq!(tree.intro, "ظهير شريف.");
        assert_eq!(tree.nodes[0].content, "تمهيد.");
    }

    #[test]
    fn untagged_lines_skip_articles_and_glyph_lines() {
        let text = [
            CHAPTER_1,
            "سطر حر",
            "╠────── مكسور",
            ARTICLE_1,
            "سطر بعد المادة",
        ]
        .join("\n");
        let tree = builder().build(&text);
        let chapter = &tree.nodes[0];
        assert_eq!(chapter.content, "سطر حر");
        assert_eq!(chapter.children[0].content, "");
    }

    #[test]
    fn empty_input_builds_nothing() {
        let tree = builder().build("");
        assert!(tree.intro.is_empty());
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn prune_drops_empty_branches_in_order() {
        let text = [
            SECTION,
            CHAPTER_1,
            ARTICLE_1,
            CHAPTER_2,
            ARTICLE_2,
            "نص: باق.",
        ]
        .join("\n");
        let tree = builder().build(&text);
        assert_eq!(tree.size(), 5);

        let pruned = prune(tree.nodes);
        assert_eq!(pruned.len(), 1);
        let section = &pruned[0];
        assert_eq!(section.children.len(), 1);
        assert_eq!(section.children[0].number, 2);
        assert_eq!(section.children[0].children[0].content, "باق.");
    }

    #[test]
    fn prune_keeps_content_only_nodes() {
        let tree = builder().build(&[CHAPTER_1, "محتوى: نص."].join("\n"));
        let pruned = prune(tree.nodes);
        assert_eq!(pruned.len(), 1);
        assert!(pruned[0].children.is_empty());
    }
}
