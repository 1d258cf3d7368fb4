//! The visual graph that the rendering engine draws, and the bridge between picks on this graph
//! and rows of the result table.
//!
//! # Consistency
//!
//! The [`VisualModel`] has a single writer (the pipeline) and any number of readers. Readers
//! obtain immutable [`VisualSnapshot`]s. A batch is applied in a single critical section, so a
//! snapshot never shows a partially-applied batch. Taking a snapshot is cheap. The graph is kept
//! in shared chunks, and the writer only copies the chunks that a batch changes while older
//! snapshots still refer to them.

mod batch;
mod chunked;
mod model;
mod selection;
mod snapshot;

pub use batch::{AppliedBatch, Batch, BatchEntry};
pub use model::VisualModel;
pub use selection::SelectionBridge;
pub use snapshot::VisualSnapshot;
