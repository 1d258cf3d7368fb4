use crate::state::{RunId, RunState, RunStats};
use rdf_lens_model::Variable;
use rdf_lens_projection::ProjectionAnomaly;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Notifications from the pull loop to the interaction thread.
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    /// The query has been opened and the visual model has been cleared.
    Started {
        run: RunId,
        variables: Arc<[Variable]>,
    },
    /// A batch has been applied to the visual model.
    Progress {
        run: RunId,
        stats: RunStats,
        /// The version of the visual model after applying the batch.
        version: u64,
    },
    /// A term could only be projected on a best-effort basis. Only sent if anomalies are reported.
    Anomaly {
        run: RunId,
        row_index: usize,
        anomaly: ProjectionAnomaly,
    },
    /// The run has reached a terminal state.
    Finished { run: RunId, state: RunState },
}

impl PipelineEvent {
    pub fn run(&self) -> RunId {
        match self {
            PipelineEvent::Started { run, .. }
            | PipelineEvent::Progress { run, .. }
            | PipelineEvent::Anomaly { run, .. }
            | PipelineEvent::Finished { run, .. } => *run,
        }
    }
}

/// The receiving end of the events of a [PipelineController](crate::PipelineController).
///
/// Use `recv().await` to wait for the next event or `try_recv()` to poll.
pub type PipelineEvents = UnboundedReceiver<PipelineEvent>;
