use rdf_lens_model::{GraphElement, ResultRow};

/// A row together with the elements projected from it.
#[derive(Clone, Debug)]
pub struct BatchEntry {
    /// The position of the row in the result stream.
    pub row_index: usize,
    pub row: ResultRow,
    pub elements: Vec<GraphElement>,
}

/// A group of rows and their elements that is applied to the [VisualModel](crate::VisualModel)
/// in one atomic step.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    entries: Vec<BatchEntry>,
    element_count: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row_index: usize, row: ResultRow, elements: Vec<GraphElement>) {
        self.element_count += elements.len();
        self.entries.push(BatchEntry {
            row_index,
            row,
            elements,
        });
    }

    /// The number of rows in this batch.
    pub fn row_count(&self) -> usize {
        self.entries.len()
    }

    /// The number of elements in this batch, including duplicates.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }
}

/// Describes the effect of applying a [Batch].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppliedBatch {
    /// Elements that were not yet part of the model.
    pub inserted: usize,
    /// Elements that were merged into an existing element.
    pub merged: usize,
    /// Elements that were dropped because the model reached its capacity.
    pub dropped: usize,
    /// The number of batches applied since the model was last cleared, including this one.
    pub version: u64,
    /// The number of elements in the model after applying the batch.
    pub element_count: usize,
}

impl AppliedBatch {
    /// The number of elements that took effect in the model.
    pub fn applied_count(&self) -> usize {
        self.inserted + self.merged
    }
}
