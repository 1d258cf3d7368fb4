use rdf_lens_common::error::{EngineError, ExecutionError};
use rdf_lens_common::{QueryEngine, ResultCursor};
use rdf_lens_model::{Query, ResultRow, Variable};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A cancellable, lazily-produced sequence of result rows.
///
/// Rows are pulled one at a time with [Self::next], so the consumer controls the pace and may stop
/// early without draining the engine. The stream holds no rows besides the one in flight.
///
/// The limit and the timeout of the [Query] are enforced by the stream. Once the stream has
/// reported its end or an error, it is exhausted and does not touch the engine anymore.
///
/// The engine cursor is closed exactly once: either by [Self::close] or when the stream is
/// dropped.
pub struct ResultStream {
    cursor: Box<dyn ResultCursor>,
    variables: Arc<[Variable]>,
    limit: Option<usize>,
    deadline: Option<(Instant, Duration)>,
    yielded: usize,
    exhausted: bool,
    closed: bool,
}

impl ResultStream {
    /// Opens `query` on `engine`.
    ///
    /// The timeout of the query starts when this method is called.
    pub async fn open(engine: &dyn QueryEngine, query: &Query) -> Result<Self, EngineError> {
        let opened_at = Instant::now();
        tracing::debug!(engine = engine.name(), kind = %query.kind(), "Opening query");
        let cursor = engine.open(query).await?;
        Ok(Self::from_cursor(cursor, query, opened_at))
    }

    fn from_cursor(cursor: Box<dyn ResultCursor>, query: &Query, opened_at: Instant) -> Self {
        Self {
            variables: cursor.variables(),
            cursor,
            limit: query.limit(),
            deadline: query.timeout().map(|timeout| (opened_at + timeout, timeout)),
            yielded: 0,
            exhausted: false,
            closed: false,
        }
    }

    /// The variables of the rows in this stream.
    pub fn variables(&self) -> Arc<[Variable]> {
        Arc::clone(&self.variables)
    }

    /// The number of rows yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Pulls the next row. Returns [None] at the end of the stream.
    pub async fn next(&mut self) -> Result<Option<ResultRow>, ExecutionError> {
        if self.exhausted || self.closed {
            return Ok(None);
        }
        if self.limit.is_some_and(|limit| self.yielded >= limit) {
            self.exhausted = true;
            return Ok(None);
        }

        let result = match self.deadline {
            Some((deadline, timeout)) => {
                match tokio::time::timeout_at(deadline, self.cursor.next_row()).await {
                    Ok(result) => result,
                    Err(_) => Err(ExecutionError::Timeout(timeout)),
                }
            }
            None => self.cursor.next_row().await,
        };

        match &result {
            Ok(Some(_)) => self.yielded += 1,
            Ok(None) | Err(_) => self.exhausted = true,
        }
        result
    }

    /// Releases the engine resources of this stream. Calling this method more than once has no
    /// effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cursor.close();
        tracing::debug!(rows = self.yielded, "Closed result stream");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        self.close();
    }
}
