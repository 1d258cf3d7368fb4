use crate::cursor::ReplayCursor;
use crate::error::ReplayError;
use crate::format::ReplayFormat;
use async_trait::async_trait;
use rdf_lens_common::error::EngineError;
use rdf_lens_common::{QueryEngine, ResultCursor};
use rdf_lens_model::{Query, QueryKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A query engine that answers every query with the content of one document.
///
/// The document is read when a query is opened, so changes to the file are picked up by the next
/// run.
#[derive(Clone, Debug)]
pub struct ReplayEngine {
    path: PathBuf,
    format: ReplayFormat,
    row_delay: Option<Duration>,
}

impl ReplayEngine {
    /// Creates an engine serving `path` in the given `format`.
    pub fn new(path: impl Into<PathBuf>, format: ReplayFormat) -> Self {
        Self {
            path: path.into(),
            format,
            row_delay: None,
        }
    }

    /// Creates an engine serving `path`. The format is detected from the file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ReplayError> {
        let path = path.into();
        let format = ReplayFormat::from_path(&path)?;
        Ok(Self::new(path, format))
    }

    /// Delays every row by `delay`, simulating a slow engine.
    #[must_use]
    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ReplayFormat {
        self.format
    }
}

#[async_trait]
impl QueryEngine for ReplayEngine {
    fn name(&self) -> &str {
        "replay"
    }

    async fn open(&self, query: &Query) -> Result<Box<dyn ResultCursor>, EngineError> {
        if query.kind() == QueryKind::Ask && self.format.is_graph() {
            return Err(EngineError::UnsupportedQueryKind(query.kind()));
        }
        let document = tokio::fs::read(&self.path).await?;
        tracing::debug!(
            path = %self.path.display(),
            format = %self.format,
            bytes = document.len(),
            "Replaying document"
        );
        let cursor = ReplayCursor::open(document, self.format, self.row_delay)?;
        Ok(Box::new(cursor))
    }
}
