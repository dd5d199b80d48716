//! Core domain types for eCFR title documents and their flat summaries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Free stack below which a nested serialize grows a new segment.
const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each additional stack segment.
const STACK_SEGMENT: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One element of a title's structure tree (title, chapter, part, section, ...).
///
/// The four descriptive attributes are optional and stay absent when the
/// source omitted them. Attributes this crate does not interpret (`reserved`,
/// `size`, `volumes`, ...) are carried in `extra` so that re-serializing a
/// node reproduces the source record.
///
/// An attribute given as JSON `null` reads as absent, like a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered child nodes. `None` when the attribute is missing entirely.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_children"
    )]
    pub children: Option<Vec<Node>>,

    /// Uninterpreted attributes, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Child nodes in source order; empty for leaves.
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Parse JSON without a nesting limit, growing the stack as the input nests.
///
/// Title trees routinely nest deeper than `serde_json`'s default limit of 128.
pub fn from_json_str<T: DeserializeOwned>(input: &str) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_str(input);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Serializes each nesting level on a stack segment with room to spare.
fn serialize_children<S: Serializer>(
    children: &Option<Vec<Node>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
        children.serialize(serializer)
    })
}

// ---------------------------------------------------------------------------
// TitleDocument / Corpus
// ---------------------------------------------------------------------------

/// Root of one title's tree, as stored in `title-<N>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleDocument(pub Node);

impl TitleDocument {
    /// The root node.
    pub fn root(&self) -> &Node {
        &self.0
    }

    /// Title identifier derived from the root label (`"Title 5 - ..."` → `"5"`).
    pub fn title_number(&self) -> Option<&str> {
        self.0.label.as_deref().and_then(derive_title_number)
    }
}

impl Drop for TitleDocument {
    // Tear the tree down level by level so dropping never recurses per depth.
    fn drop(&mut self) {
        let mut pending = self.0.children.take().unwrap_or_default();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.children.take().unwrap_or_default());
        }
    }
}

impl From<Node> for TitleDocument {
    fn from(root: Node) -> Self {
        Self(root)
    }
}

/// Ordered collection of parsed title documents, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    pub titles: Vec<TitleDocument>,
}

impl Corpus {
    /// Number of title documents.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TitleDocument> {
        self.titles.iter()
    }
}

impl From<Vec<TitleDocument>> for Corpus {
    fn from(titles: Vec<TitleDocument>) -> Self {
        Self { titles }
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a TitleDocument;
    type IntoIter = std::slice::Iter<'a, TitleDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.titles.iter()
    }
}

// ---------------------------------------------------------------------------
// SummaryEntry
// ---------------------------------------------------------------------------

/// Flat per-node record written to the summary artifact.
///
/// The descriptive attributes are copied only when the source node had them.
/// `word_count` and `title_number` are always written; an underivable title
/// number is written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub word_count: usize,

    pub title_number: Option<String>,
}

impl SummaryEntry {
    /// Build the entry for `node` within a title whose identifier is `title_number`.
    pub fn from_node(node: &Node, title_number: Option<&str>) -> Self {
        Self {
            node_type: node.node_type.clone(),
            label: node.label.clone(),
            identifier: node.identifier.clone(),
            description: node.description.clone(),
            word_count: node.description.as_deref().map_or(0, word_count),
            title_number: title_number.map(str::to_owned),
        }
    }
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// Extract the title identifier from a root label.
///
/// The first whitespace token must be `title` (any case) and a second token
/// must exist; that token is returned verbatim, punctuation included.
pub fn derive_title_number(label: &str) -> Option<&str> {
    let mut tokens = label.split_whitespace();
    let first = tokens.next()?;
    if first.to_lowercase() != "title" {
        return None;
    }
    tokens.next()
}

/// Number of whitespace-separated tokens in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
