use crate::chunked::ChunkedVec;
use crate::selection::ElementIndex;
use parking_lot::RwLock;
use rdf_lens_model::{ElementId, GraphElement, ResultRow, Variable};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A retained row of the result table together with the elements it contributed to.
#[derive(Debug)]
pub(crate) struct RowEntry {
    pub(crate) index: usize,
    pub(crate) row: ResultRow,
    pub(crate) elements: Vec<ElementId>,
}

/// The state behind a [VisualSnapshot]. Only the [VisualModel](crate::VisualModel) mutates it.
///
/// Clones share their storage. The element index is shared by all states of one generation; it
/// only grows, and each state filters it by its own element and row counts.
#[derive(Clone, Debug, Default)]
pub(crate) struct GraphState {
    pub(crate) generation: u64,
    pub(crate) version: u64,
    pub(crate) variables: Arc<[Variable]>,
    pub(crate) elements: ChunkedVec<Arc<GraphElement>>,
    pub(crate) rows: ChunkedVec<Arc<RowEntry>>,
    pub(crate) index: Arc<RwLock<ElementIndex>>,
    /// One past the largest row index applied so far.
    pub(crate) row_limit: usize,
    pub(crate) node_count: usize,
    pub(crate) truncated: bool,
    pub(crate) table_truncated: bool,
}

impl GraphState {
    pub(crate) fn empty(generation: u64, variables: Arc<[Variable]>) -> Self {
        Self {
            generation,
            variables,
            ..Self::default()
        }
    }
}

/// A consistent, point-in-time view of the [VisualModel](crate::VisualModel).
///
/// Snapshots are immutable. Holding on to a snapshot never blocks the pipeline, and the pipeline
/// only copies the parts of the graph that it changes afterward.
#[derive(Clone, Debug)]
pub struct VisualSnapshot {
    pub(crate) state: Arc<GraphState>,
}

impl VisualSnapshot {
    pub(crate) fn new(state: Arc<GraphState>) -> Self {
        Self { state }
    }

    /// Incremented every time the model is cleared.
    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    /// The number of batches applied since the model was last cleared.
    ///
    /// Within one generation, versions observed by a reader never decrease.
    pub fn version(&self) -> u64 {
        self.state.version
    }

    /// Iterates over all elements in the order in which they first appeared.
    pub fn elements(&self) -> impl Iterator<Item = &GraphElement> {
        self.state.elements.iter().map(|element| element.as_ref())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphElement> {
        self.elements().filter(|e| e.is_node())
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphElement> {
        self.elements().filter(|e| !e.is_node())
    }

    pub fn get(&self, id: &ElementId) -> Option<&GraphElement> {
        let position = self.position(id)?;
        self.state.elements.get(position).map(|element| element.as_ref())
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &ElementId) -> Option<usize> {
        let position = self.state.index.read().position(id)?;
        (position < self.state.elements.len()).then_some(position)
    }

    pub fn element_count(&self) -> usize {
        self.state.elements.len()
    }

    pub fn node_count(&self) -> usize {
        self.state.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.state.elements.len() - self.state.node_count
    }

    pub fn is_empty(&self) -> bool {
        self.state.elements.is_empty() && self.state.rows.is_empty()
    }

    /// Whether elements have been dropped because the model reached its capacity.
    pub fn is_truncated(&self) -> bool {
        self.state.truncated
    }

    /// Whether rows have been left out of the result table because it reached its capacity.
    ///
    /// The elements of these rows are still part of the graph, but they are not linked to any row.
    pub fn is_table_truncated(&self) -> bool {
        self.state.table_truncated
    }

    /// The columns of the result table.
    pub fn variables(&self) -> &[Variable] {
        &self.state.variables
    }

    /// The retained rows of the result table, in stream order.
    pub fn rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.state.rows.iter().map(|entry| &entry.row)
    }

    /// The number of retained rows.
    pub fn row_count(&self) -> usize {
        self.state.rows.len()
    }

    /// Returns the row at position `row_index` of the result stream, if it has been retained.
    pub fn row(&self, row_index: usize) -> Option<&ResultRow> {
        self.row_entry(row_index).map(|entry| &entry.row)
    }

    /// The row indices that contributed to the element `id`.
    pub fn rows_of(&self, id: &ElementId) -> BTreeSet<usize> {
        self.state
            .index
            .read()
            .rows_of(id, self.state.elements.len(), self.state.row_limit)
    }

    /// The elements that the row at `row_index` contributed to.
    pub fn elements_of(&self, row_index: usize) -> BTreeSet<ElementId> {
        self.row_entry(row_index)
            .map(|entry| entry.elements.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Rows are retained in increasing index order.
    fn row_entry(&self, row_index: usize) -> Option<&RowEntry> {
        let rows = &self.state.rows;
        let (mut low, mut high) = (0, rows.len());
        while low < high {
            let middle = low + (high - low) / 2;
            let entry = rows.get(middle)?;
            match entry.index.cmp(&row_index) {
                Ordering::Less => low = middle + 1,
                Ordering::Greater => high = middle,
                Ordering::Equal => return Some(entry.as_ref()),
            }
        }
        None
    }
}
