use crate::error::{EngineError, ExecutionError};
use async_trait::async_trait;
use rdf_lens_model::{Query, ResultRow, Variable};
use std::sync::Arc;

/// A query engine that RDF Lens can visualize the results of.
///
/// The engine owns parsing, planning and executing queries. RDF Lens only pulls rows from the
/// cursors it opens. There is no process-wide engine state: each run receives the engine
/// explicitly and owns the cursor it opened.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Returns a human-readable name of this engine, used for logging.
    fn name(&self) -> &str;

    /// Opens `query` and returns a cursor over its results.
    ///
    /// Implementations should return as soon as the query is planned. Producing rows happens in
    /// [ResultCursor::next_row].
    async fn open(&self, query: &Query) -> Result<Box<dyn ResultCursor>, EngineError>;
}

/// A pull-based cursor over the rows of an opened query.
#[async_trait]
pub trait ResultCursor: Send {
    /// Returns the variables of the rows produced by this cursor.
    fn variables(&self) -> Arc<[Variable]>;

    /// Pulls the next row. Returns [None] once all rows have been produced.
    async fn next_row(&mut self) -> Result<Option<ResultRow>, ExecutionError>;

    /// Releases the engine-side resources of this cursor.
    ///
    /// Callers guarantee that this is called at most once and that [Self::next_row] is not called
    /// afterward.
    fn close(&mut self);
}
