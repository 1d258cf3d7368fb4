use crate::batch::{AppliedBatch, Batch};
use crate::selection::ElementIndex;
use crate::snapshot::{GraphState, RowEntry, VisualSnapshot};
use parking_lot::{Mutex, RwLock};
use rdf_lens_model::{ElementId, GraphElement, Variable};
use std::sync::Arc;

/// The graph that is drawn by the rendering engine.
///
/// A [`VisualModel`] is a cheap, clonable handle. All clones refer to the same graph. The pipeline
/// is the only writer; renderers and the [`SelectionBridge`](crate::SelectionBridge) only read
/// [`VisualSnapshot`]s.
///
/// The graph is stored in shared chunks. Applying a batch copies only the chunks that the batch
/// touches, no matter how many snapshots are held, so its cost does not grow with the size of
/// the graph.
#[derive(Clone, Debug, Default)]
pub struct VisualModel {
    inner: Arc<ModelInner>,
}

#[derive(Debug, Default)]
struct ModelInner {
    max_elements: Option<usize>,
    max_rows: Option<usize>,
    /// The state that batches are applied to.
    writer: Mutex<GraphState>,
    /// The state that snapshots are taken from.
    published: RwLock<Arc<GraphState>>,
}

impl VisualModel {
    /// Creates an empty model without a capacity limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty model that holds at most `max_elements` elements, if given.
    pub fn with_max_elements(max_elements: Option<usize>) -> Self {
        Self::with_limits(max_elements, None)
    }

    /// Creates an empty model that holds at most `max_elements` elements and keeps at most
    /// `max_rows` rows of the result table, if given.
    pub fn with_limits(max_elements: Option<usize>, max_rows: Option<usize>) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                max_elements,
                max_rows,
                ..ModelInner::default()
            }),
        }
    }

    pub fn max_elements(&self) -> Option<usize> {
        self.inner.max_elements
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.inner.max_rows
    }

    /// Returns a consistent view of the current state of the model.
    pub fn snapshot(&self) -> VisualSnapshot {
        VisualSnapshot::new(Arc::clone(&self.inner.published.read()))
    }

    /// Removes all elements, rows and selection data.
    pub fn clear(&self) {
        self.clear_with_columns(Arc::from(Vec::new()));
    }

    /// Removes all elements, rows and selection data and sets the columns of the result table.
    pub fn clear_with_columns(&self, variables: Arc<[Variable]>) {
        let mut state = self.inner.writer.lock();
        let generation = state.generation + 1;
        *state = GraphState::empty(generation, variables);
        self.publish(&state);
        tracing::debug!(generation, "Cleared visual model");
    }

    /// Applies `batch` atomically.
    ///
    /// Elements are merged by identity: new identities are inserted, the attributes of existing
    /// ones are merged with the new values winning. If the model has reached its capacity, new
    /// identities are dropped and the model is marked as truncated. Edges whose endpoints are not
    /// part of the model are dropped as well.
    ///
    /// Once the result table holds `max_rows` rows, further rows are left out of it. Their
    /// elements are still applied.
    pub fn apply(&self, batch: Batch) -> AppliedBatch {
        let mut state = self.inner.writer.lock();
        let shared = Arc::clone(&state.index);
        let mut index = shared.write();
        let mut applied = AppliedBatch::default();

        for entry in batch.into_entries() {
            let mut contributed = Vec::with_capacity(entry.elements.len());
            for element in entry.elements {
                let id = element.id();
                if let Some(position) = index.position(&id) {
                    if let Some(existing) = state.elements.get_mut(position) {
                        Arc::make_mut(existing).merge_attributes(element.into_attributes());
                    }
                    applied.merged += 1;
                    contributed.push(id);
                } else if self.has_room(&state) && has_endpoints(&index, &element) {
                    if element.is_node() {
                        state.node_count += 1;
                    }
                    index.insert(id.clone(), state.elements.len());
                    state.elements.push(Arc::new(element));
                    applied.inserted += 1;
                    contributed.push(id);
                } else {
                    state.truncated = true;
                    applied.dropped += 1;
                }
            }

            state.row_limit = state.row_limit.max(entry.row_index + 1);
            if self
                .inner
                .max_rows
                .is_some_and(|max| state.rows.len() >= max)
            {
                state.table_truncated = true;
                continue;
            }
            for id in &contributed {
                index.record_row(id, entry.row_index);
            }
            state.rows.push(Arc::new(RowEntry {
                index: entry.row_index,
                row: entry.row,
                elements: contributed,
            }));
        }
        drop(index);

        state.version += 1;
        applied.version = state.version;
        applied.element_count = state.elements.len();
        self.publish(&state);
        tracing::debug!(
            version = applied.version,
            inserted = applied.inserted,
            merged = applied.merged,
            dropped = applied.dropped,
            "Applied batch to visual model"
        );
        applied
    }

    /// Called with the writer lock held, so versions are published in order.
    fn publish(&self, state: &GraphState) {
        let published = Arc::new(state.clone());
        *self.inner.published.write() = published;
    }

    fn has_room(&self, state: &GraphState) -> bool {
        self.inner
            .max_elements
            .is_none_or(|max| state.elements.len() < max)
    }
}

fn has_endpoints(index: &ElementIndex, element: &GraphElement) -> bool {
    match element {
        GraphElement::Node(_) => true,
        GraphElement::Edge(edge) => {
            index
                .position(&ElementId::Node(edge.key.source.clone()))
                .is_some()
                && index
                    .position(&ElementId::Node(edge.key.target.clone()))
                    .is_some()
        }
    }
}
