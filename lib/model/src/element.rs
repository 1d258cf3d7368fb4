use crate::RdfTerm;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The attributes of a graph element. Ordered by key for deterministic rendering.
pub type Attributes = BTreeMap<String, String>;

/// The identity of an RDF term: its canonical (N-Triples) form.
///
/// Cloning a [`TermKey`] is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermKey(Arc<str>);

impl TermKey {
    /// Derives the key of `term`.
    pub fn of(term: &RdfTerm) -> Self {
        Self(term.canonical().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TermKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity of an edge: the identities of its endpoints and of its label term.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: TermKey,
    pub label: TermKey,
    pub target: TermKey,
}

impl Display for EdgeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.source, self.label, self.target)
    }
}

/// The stable identity of a [`GraphElement`].
///
/// Repeated occurrences of the same term (or triple) within a run map to the same identity and
/// thus to the same visual element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    Node(TermKey),
    Edge(EdgeKey),
}

impl ElementId {
    pub fn is_node(&self) -> bool {
        matches!(self, ElementId::Node(_))
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementId::Node(key) => key.fmt(f),
            ElementId::Edge(key) => key.fmt(f),
        }
    }
}

impl From<TermKey> for ElementId {
    fn from(key: TermKey) -> Self {
        Self::Node(key)
    }
}

impl From<EdgeKey> for ElementId {
    fn from(key: EdgeKey) -> Self {
        Self::Edge(key)
    }
}

/// A node in the visual graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualNode {
    pub key: TermKey,
    pub label: String,
    pub attributes: Attributes,
}

/// A directed, labelled edge in the visual graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualEdge {
    pub key: EdgeKey,
    pub label: String,
    pub attributes: Attributes,
}

/// An element of the visual graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphElement {
    Node(VisualNode),
    Edge(VisualEdge),
}

impl GraphElement {
    pub fn id(&self) -> ElementId {
        match self {
            GraphElement::Node(node) => ElementId::Node(node.key.clone()),
            GraphElement::Edge(edge) => ElementId::Edge(edge.key.clone()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            GraphElement::Node(node) => &node.label,
            GraphElement::Edge(edge) => &edge.label,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            GraphElement::Node(node) => &node.attributes,
            GraphElement::Edge(edge) => &edge.attributes,
        }
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        match self {
            GraphElement::Node(node) => &mut node.attributes,
            GraphElement::Edge(edge) => &mut edge.attributes,
        }
    }

    /// Merges the attributes of `other` into `self`. Values of `other` win for keys present in
    /// both. Returns whether any attribute changed.
    ///
    /// The identity and the label of `self` are kept.
    pub fn merge_attributes(&mut self, other: Attributes) -> bool {
        let target = self.attributes_mut();
        let mut changed = false;
        for (key, value) in other {
            if target.get(&key) != Some(&value) {
                target.insert(key, value);
                changed = true;
            }
        }
        changed
    }

    pub fn into_attributes(self) -> Attributes {
        match self {
            GraphElement::Node(node) => node.attributes,
            GraphElement::Edge(edge) => edge.attributes,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, GraphElement::Node(_))
    }
}
