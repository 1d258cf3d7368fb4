use crate::model::VisualModel;
use rdf_lens_model::ElementId;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Position of every element of a generation and the rows that contributed to it.
///
/// The index only grows within a generation and is shared by all snapshots of that generation.
/// Positions and row indices are assigned in increasing order, so a snapshot sees its own state by
/// ignoring positions at or beyond its element count and rows at or beyond its row limit.
#[derive(Debug, Default)]
pub(crate) struct ElementIndex {
    slots: FxHashMap<ElementId, Slot>,
}

#[derive(Debug)]
struct Slot {
    position: usize,
    rows: Vec<usize>,
}

impl ElementIndex {
    pub(crate) fn position(&self, id: &ElementId) -> Option<usize> {
        self.slots.get(id).map(|slot| slot.position)
    }

    pub(crate) fn insert(&mut self, id: ElementId, position: usize) {
        self.slots.insert(
            id,
            Slot {
                position,
                rows: Vec::new(),
            },
        );
    }

    /// Records that `row_index` contributed to `id`.
    ///
    /// Rows are recorded in stream order.
    pub(crate) fn record_row(&mut self, id: &ElementId, row_index: usize) {
        if let Some(slot) = self.slots.get_mut(id) {
            if slot.rows.last() != Some(&row_index) {
                slot.rows.push(row_index);
            }
        }
    }

    pub(crate) fn rows_of(
        &self,
        id: &ElementId,
        element_count: usize,
        row_limit: usize,
    ) -> BTreeSet<usize> {
        self.slots
            .get(id)
            .filter(|slot| slot.position < element_count)
            .map(|slot| {
                slot.rows
                    .iter()
                    .copied()
                    .take_while(|row| *row < row_limit)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Maps picks on the visual graph to rows of the result table and vice versa.
///
/// All lookups are answered from the latest snapshot of the [VisualModel] and never modify it.
#[derive(Clone, Debug)]
pub struct SelectionBridge {
    model: VisualModel,
}

impl SelectionBridge {
    pub fn new(model: VisualModel) -> Self {
        Self { model }
    }

    /// Returns the indices of the rows that contributed to the picked element.
    pub fn on_visual_pick(&self, id: &ElementId) -> BTreeSet<usize> {
        self.model.snapshot().rows_of(id)
    }

    /// Returns the elements that the picked row contributed to.
    pub fn on_row_pick(&self, row_index: usize) -> BTreeSet<ElementId> {
        self.model.snapshot().elements_of(row_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Batch;
    use rdf_lens_model::{
        Attributes, GraphElement, NamedNode, RdfTerm, ResultRow, TermKey, Variable, VisualNode,
    };
    use std::sync::Arc;

    fn node(local: &str) -> GraphElement {
        let term: RdfTerm = NamedNode::new_unchecked(format!("http://example.com/{local}")).into();
        GraphElement::Node(VisualNode {
            key: TermKey::of(&term),
            label: local.to_owned(),
            attributes: Attributes::new(),
        })
    }

    fn empty_row() -> ResultRow {
        let variables: Arc<[Variable]> = Arc::from(Vec::new());
        ResultRow::new(variables, Vec::new())
    }

    #[test]
    fn picks_are_cross_referenced() {
        let model = VisualModel::new();
        let bridge = SelectionBridge::new(model.clone());
        let mut batch = Batch::new();
        batch.push(0, empty_row(), vec![node("A"), node("B")]);
        batch.push(1, empty_row(), Vec::new());
        batch.push(2, empty_row(), vec![node("A")]);
        model.apply(batch);

        assert_eq!(bridge.on_visual_pick(&node("A").id()), [0, 2].into());
        assert_eq!(bridge.on_visual_pick(&node("B").id()), [0].into());
        assert_eq!(
            bridge.on_row_pick(0),
            [node("A").id(), node("B").id()].into()
        );
        assert!(bridge.on_row_pick(1).is_empty());
        assert!(bridge.on_row_pick(42).is_empty());
        assert!(bridge.on_visual_pick(&node("C").id()).is_empty());
    }

    #[test]
    fn picks_follow_the_model() {
        let model = VisualModel::new();
        let bridge = SelectionBridge::new(model.clone());
        let mut batch = Batch::new();
        batch.push(0, empty_row(), vec![node("A")]);
        model.apply(batch);
        assert_eq!(bridge.on_row_pick(0).len(), 1);

        model.clear();
        assert!(bridge.on_row_pick(0).is_empty());
        assert!(bridge.on_visual_pick(&node("A").id()).is_empty());
    }
}
