//! Corpus flattening.
//!
//! Every node below a title's root becomes one [`SummaryEntry`], emitted in
//! pre-order with siblings in source order. The title number is derived once
//! per title from the root label and attached to all of that title's entries.
//! The walk uses an explicit stack, so tree depth is bounded only by memory.

use tracing::{debug, info, instrument};

use ecfr_shared::{Corpus, Node, SummaryEntry, TitleDocument};

/// Lazy pre-order walk over all non-root nodes of a corpus.
pub struct SummaryIter<'a> {
    titles: std::slice::Iter<'a, TitleDocument>,
    stack: Vec<&'a Node>,
    title_number: Option<&'a str>,
}

impl<'a> SummaryIter<'a> {
    pub fn new(corpus: &'a Corpus) -> Self {
        Self {
            titles: corpus.iter(),
            stack: Vec::new(),
            title_number: None,
        }
    }
}

impl Iterator for SummaryIter<'_> {
    type Item = SummaryEntry;

    fn next(&mut self) -> Option<SummaryEntry> {
        loop {
            if let Some(node) = self.stack.pop() {
                // Reversed so the leftmost child is popped first.
                self.stack.extend(node.children().iter().rev());
                return Some(SummaryEntry::from_node(node, self.title_number));
            }

            let title = self.titles.next()?;
            self.title_number = title.title_number();
            debug!(
                title_number = self.title_number.unwrap_or("-"),
                "flattening title"
            );
            self.stack.extend(title.root().children().iter().rev());
        }
    }
}

/// Iterate the summary entries of `corpus` without collecting them.
pub fn entries(corpus: &Corpus) -> SummaryIter<'_> {
    SummaryIter::new(corpus)
}

/// Flatten every title of `corpus`, in corpus order.
#[instrument(skip_all, fields(titles = corpus.len()))]
pub fn flatten(corpus: &Corpus) -> Vec<SummaryEntry> {
    let entries: Vec<SummaryEntry> = entries(corpus).collect();
    info!(count = entries.len(), "flattened corpus into summary entries");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn corpus(value: serde_json::Value) -> Corpus {
        serde_json::from_value(value).expect("valid corpus")
    }

    fn nodes_below(node: &Node) -> usize {
        node.children().iter().map(|child| 1 + nodes_below(child)).sum()
    }

    fn labels(entries: &[SummaryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.label.as_deref().unwrap_or("")).collect()
    }

    #[test]
    fn chapter_and_part_example() {
        let corpus = corpus(json!([{
            "label": "Title 5 - Administrative",
            "children": [{
                "type": "chapter",
                "label": "Chapter I",
                "identifier": "5-I",
                "description": "Two words",
                "children": [{"type": "part", "label": "Part 100", "identifier": "5-100"}]
            }]
        }]));

        let entries = flatten(&corpus);
        let value = serde_json::to_value(&entries).unwrap();

        assert_eq!(
            value,
            json!([
                {
                    "type": "chapter",
                    "label": "Chapter I",
                    "identifier": "5-I",
                    "description": "Two words",
                    "word_count": 2,
                    "title_number": "5"
                },
                {
                    "type": "part",
                    "label": "Part 100",
                    "identifier": "5-100",
                    "word_count": 0,
                    "title_number": "5"
                }
            ])
        );
    }

    #[test]
    fn non_title_label_gives_absent_number() {
        let corpus = corpus(json!([{
            "label": "Appendix A",
            "children": [{"label": "Section A-1"}]
        }]));

        let entries = flatten(&corpus);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title_number, None);
    }

    #[test]
    fn unlabeled_root_gives_absent_number_for_whole_tree() {
        let corpus = corpus(json!([{
            "children": [{"label": "A", "children": [{"label": "B"}, {"label": "C"}]}]
        }]));

        let entries = flatten(&corpus);
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.title_number.is_none()));
    }

    #[test]
    fn preorder_with_sibling_order() {
        let corpus = corpus(json!([{
            "label": "Title 9 - Animals",
            "children": [
                {"label": "A", "children": [
                    {"label": "A1", "children": [{"label": "A1a"}]},
                    {"label": "A2"}
                ]},
                {"label": "B", "children": []},
                {"label": "C", "children": [{"label": "C1"}]}
            ]
        }]));

        let entries = flatten(&corpus);
        assert_eq!(labels(&entries), ["A", "A1", "A1a", "A2", "B", "C", "C1"]);
        assert!(entries.iter().all(|e| e.title_number.as_deref() == Some("9")));
    }

    #[test]
    fn titles_concatenate_in_corpus_order() {
        let corpus = corpus(json!([
            {"label": "Title 2 - Grants", "children": [{"label": "x"}, {"label": "y"}]},
            {"label": "Title 1 - General", "children": [{"label": "z"}]}
        ]));

        let entries = flatten(&corpus);
        assert_eq!(labels(&entries), ["x", "y", "z"]);
        let numbers: Vec<_> = entries.iter().map(|e| e.title_number.as_deref()).collect();
        assert_eq!(numbers, [Some("2"), Some("2"), Some("1")]);
    }

    #[test]
    fn title_without_children_yields_nothing() {
        let corpus = corpus(json!([
            {"label": "Title 35 - Panama Canal [Reserved]"},
            {"label": "Title 36 - Parks", "children": []}
        ]));
        assert!(flatten(&corpus).is_empty());
    }

    #[test]
    fn word_count_follows_description() {
        let corpus = corpus(json!([{
            "label": "Title 40 - Protection of Environment",
            "children": [
                {"description": "  Air   programs\tand  standards "},
                {"description": ""},
                {"label": "no description"}
            ]
        }]));

        let entries = flatten(&corpus);
        let counts: Vec<_> = entries.iter().map(|e| e.word_count).collect();
        assert_eq!(counts, [4, 0, 0]);
        assert_eq!(entries[1].description.as_deref(), Some(""));
        assert!(entries[2].description.is_none());
    }

    #[test]
    fn entry_count_matches_descendants() {
        let fixture = std::fs::read_to_string("../../../fixtures/titles/title-1.json").unwrap();
        let title: TitleDocument = serde_json::from_str(&fixture).unwrap();
        let corpus = Corpus::from(vec![title.clone(), title]);

        let expected: usize = corpus.iter().map(|t| nodes_below(t.root())).sum();
        assert_eq!(expected, 10);
        assert_eq!(flatten(&corpus).len(), expected);
    }

    #[test]
    fn flattening_is_deterministic() {
        let corpus = corpus(json!([{
            "label": "Title 7 - Agriculture",
            "children": [{"label": "a", "children": [{"label": "b"}]}, {"label": "c"}]
        }]));

        let first = flatten(&corpus);
        let second = flatten(&corpus);
        assert_eq!(first, second);
    }

    #[test]
    fn deep_tree_does_not_overflow() {
        let mut node = Node {
            label: Some("leaf".into()),
            ..Node::default()
        };
        for depth in 0..100_000 {
            node = Node {
                label: Some(format!("level {depth}")),
                children: Some(vec![node]),
                ..Node::default()
            };
        }
        let corpus = Corpus::from(vec![TitleDocument(Node {
            label: Some("Title 50 - Wildlife".into()),
            children: Some(vec![node]),
            ..Node::default()
        })]);

        let count = entries(&corpus).count();
        assert_eq!(count, 100_001);
        drop(corpus);
    }
}
