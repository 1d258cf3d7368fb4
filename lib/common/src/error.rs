use rdf_lens_model::QueryKind;
use std::error::Error;
use std::io;
use std::time::Duration;

/// An error raised while a query is opened, i.e., before any result row is produced.
///
/// An [`EngineError`] is fatal for the run that caused it. Nothing has been visualized yet.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The query could not be parsed or compiled.
    #[error("The query could not be compiled: {0}")]
    Syntax(String),
    /// The engine does not support this kind of query.
    #[error("The engine does not support {0} queries")]
    UnsupportedQueryKind(QueryKind),
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl EngineError {
    /// Wraps an arbitrary engine-specific error.
    #[inline]
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}

/// An error raised while the rows of an opened query are consumed.
///
/// An [`ExecutionError`] ends the run but keeps the results that have already been visualized.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExecutionError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The query exceeded its time budget.
    #[error("The query did not finish within {0:?}")]
    Timeout(Duration),
    /// The engine produced a row that could not be read.
    #[error("The engine produced an invalid result: {0}")]
    InvalidResult(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl ExecutionError {
    /// Wraps an arbitrary engine-specific error.
    #[inline]
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}

impl From<ExecutionError> for io::Error {
    #[inline]
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::Io(error) => error,
            ExecutionError::Timeout(_) => Self::new(io::ErrorKind::TimedOut, error.to_string()),
            ExecutionError::InvalidResult(_) => {
                Self::new(io::ErrorKind::InvalidData, error.to_string())
            }
            ExecutionError::Other(error) => Self::other(error),
        }
    }
}
