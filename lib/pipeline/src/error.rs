use rdf_lens_common::error::{EngineError, ExecutionError};
use std::sync::Arc;

/// An error returned by the operations of a [PipelineController](crate::PipelineController).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// A run is still live. It has to be cancelled (and finish) before a new one can start.
    #[error("A run is already in progress")]
    AlreadyRunning,
    /// Only starting or running runs can be cancelled.
    #[error("There is no run that could be cancelled")]
    NotCancellable,
    /// The query could not be opened. The run has failed.
    #[error(transparent)]
    Engine(Arc<EngineError>),
}

/// The reason a run has failed.
///
/// The error is shared so that run states and events can be cloned.
#[derive(Clone, Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Engine(Arc<EngineError>),
    #[error(transparent)]
    Execution(Arc<ExecutionError>),
}

impl From<ExecutionError> for RunError {
    fn from(error: ExecutionError) -> Self {
        Self::Execution(Arc::new(error))
    }
}
