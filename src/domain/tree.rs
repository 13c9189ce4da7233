//! Attribute tree
//!
//! The tree is an arena of datasets. The root dataset is [`DatasetId`] 0 and a sequence
//! element refers to its items by index into the arena, so nested items are plain indices
//! rather than owned sub-trees. Trees are acyclic by construction: an item is only ever
//! attached to the sequence that allocated it.

use super::tag::Tag;
use super::vr::Vr;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a dataset inside an [`AttributeTree`]
///
/// Identifiers are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(usize);

impl DatasetId {
    /// Position in the arena
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Element value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Zero-length value
    Empty,
    /// Text values (multi-valued elements keep one string per value)
    Strings(Vec<String>),
    /// Numbers (binary numeric VRs, and IS/DS read from JSON numbers)
    Numbers(Vec<serde_json::Number>),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Reference to bulk data held outside the tree
    BulkData(String),
    /// Items of a sequence
    Sequence(Vec<DatasetId>),
}

impl Value {
    /// Single string value
    pub fn string(value: impl Into<String>) -> Self {
        Value::Strings(vec![value.into()])
    }

    /// Textual form used for pseudonym derivation, multi-values joined with `\`
    pub fn text(&self) -> Option<String> {
        match self {
            Value::Strings(values) => Some(values.join("\\")),
            Value::Numbers(values) => Some(
                values
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join("\\"),
            ),
            Value::Empty => Some(String::new()),
            Value::Binary(_) | Value::BulkData(_) | Value::Sequence(_) => None,
        }
    }

    /// Items when this value is a sequence
    pub fn items(&self) -> &[DatasetId] {
        match self {
            Value::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Zero-length value or empty sequence
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Strings(values) => values.iter().all(|v| v.is_empty()),
            Value::Numbers(values) => values.is_empty(),
            Value::Binary(bytes) => bytes.is_empty(),
            Value::BulkData(_) => false,
            Value::Sequence(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => f.write_str(""),
            Value::Strings(_) | Value::Numbers(_) => {
                write!(f, "{}", self.text().unwrap_or_default())
            }
            Value::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::BulkData(uri) => write!(f, "<bulk data {uri}>"),
            Value::Sequence(items) => write!(f, "<sequence of {} item(s)>", items.len()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One attribute of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub vr: Vr,
    pub value: Value,
}

impl Element {
    /// Creates an element
    pub fn new(tag: Tag, vr: Vr, value: Value) -> Self {
        Self { tag, vr, value }
    }

    /// Creates a single-valued text element
    pub fn text(tag: Tag, vr: Vr, value: impl Into<String>) -> Self {
        Self::new(tag, vr, Value::string(value))
    }

    /// Creates a sequence element over already allocated items
    pub fn sequence(tag: Tag, items: Vec<DatasetId>) -> Self {
        Self::new(tag, Vr::SQ, Value::Sequence(items))
    }

    /// Whether the element is a sequence
    pub fn is_sequence(&self) -> bool {
        self.vr == Vr::SQ
    }
}

/// Ordered mapping of tag to element
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    elements: BTreeMap<Tag, Element>,
}

impl Dataset {
    /// Elements in tag order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Number of elements at this level
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the dataset has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Parsed attribute tree of one imaging file
#[derive(Debug, Clone)]
pub struct AttributeTree {
    datasets: Vec<Dataset>,
}

impl Default for AttributeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeTree {
    /// Creates a tree holding an empty root dataset
    pub fn new() -> Self {
        Self {
            datasets: vec![Dataset::default()],
        }
    }

    /// Root dataset
    pub fn root(&self) -> DatasetId {
        DatasetId(0)
    }

    /// Allocates a new, detached item dataset for use in a sequence
    pub fn new_item(&mut self) -> DatasetId {
        self.datasets.push(Dataset::default());
        DatasetId(self.datasets.len() - 1)
    }

    /// Dataset by id
    pub fn dataset(&self, id: DatasetId) -> &Dataset {
        &self.datasets[id.0]
    }

    /// Element lookup
    pub fn get(&self, dataset: DatasetId, tag: Tag) -> Option<&Element> {
        self.datasets[dataset.0].elements.get(&tag)
    }

    /// Mutable element lookup
    pub fn get_mut(&mut self, dataset: DatasetId, tag: Tag) -> Option<&mut Element> {
        self.datasets[dataset.0].elements.get_mut(&tag)
    }

    /// Whether `dataset` holds `tag`
    pub fn contains(&self, dataset: DatasetId, tag: Tag) -> bool {
        self.datasets[dataset.0].elements.contains_key(&tag)
    }

    /// Inserts or replaces an element, returning the previous one
    pub fn insert(&mut self, dataset: DatasetId, element: Element) -> Option<Element> {
        self.datasets[dataset.0]
            .elements
            .insert(element.tag, element)
    }

    /// Removes an element; items of a removed sequence become unreachable
    pub fn remove(&mut self, dataset: DatasetId, tag: Tag) -> Option<Element> {
        self.datasets[dataset.0].elements.remove(&tag)
    }

    /// Tags of a dataset in ascending order
    pub fn tags(&self, dataset: DatasetId) -> Vec<Tag> {
        self.datasets[dataset.0].elements.keys().copied().collect()
    }

    /// First string value of an element, with DICOM padding trimmed
    pub fn string(&self, dataset: DatasetId, tag: Tag) -> Option<&str> {
        match &self.get(dataset, tag)?.value {
            Value::Strings(values) => values.first().map(|v| v.trim_matches([' ', '\0'])),
            _ => None,
        }
    }

    /// Number of elements reachable from the root, nested items included
    pub fn element_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            for element in self.dataset(id).iter() {
                count += 1;
                stack.extend(element.value.items().iter().copied());
            }
        }
        count
    }

    fn fmt_dataset(
        &self,
        f: &mut fmt::Formatter<'_>,
        dataset: DatasetId,
        depth: usize,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);
        for element in self.dataset(dataset).iter() {
            writeln!(
                f,
                "{indent}{} {} [{}]",
                element.tag, element.vr, element.value
            )?;
            for (index, item) in element.value.items().iter().enumerate() {
                writeln!(f, "{indent}  Item {}", index + 1)?;
                self.fmt_dataset(f, *item, depth + 2)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AttributeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_dataset(f, self.root(), 0)
    }
}

/// Location of an element: the chain of (sequence tag, item index) steps plus its own tag
///
/// ```
/// use dicom_deid::domain::{ElementPath, Tag};
///
/// let path = ElementPath::new(vec![(Tag::new(0x0008, 0x1140), 0)], Tag::new(0x0008, 0x1155));
/// assert_eq!(path.to_string(), "(0008,1140)[0].(0008,1155)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementPath {
    parents: Vec<(Tag, usize)>,
    tag: Tag,
}

impl ElementPath {
    /// Path from the parent chain and the element's tag
    pub fn new(parents: Vec<(Tag, usize)>, tag: Tag) -> Self {
        Self { parents, tag }
    }

    /// Path of a top-level element
    pub fn root(tag: Tag) -> Self {
        Self::new(Vec::new(), tag)
    }

    /// Final tag
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Nesting depth (0 for top-level elements)
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    /// Parent chain for the children of item `index` of this (sequence) element
    pub fn item_prefix(&self, index: usize) -> Vec<(Tag, usize)> {
        let mut prefix = self.parents.clone();
        prefix.push((self.tag, index));
        prefix
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (tag, index) in &self.parents {
            write!(f, "{tag}[{index}].")?;
        }
        write!(f, "{}", self.tag)
    }
}

impl Serialize for ElementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
