use crate::error::RunError;
use rdf_lens_model::Query;
use rdf_lens_projection::AnomalyTally;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio::time::Instant;

/// Identifies a run of a [PipelineController](crate::PipelineController).
///
/// Run ids of the same controller strictly increase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl RunId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Counters of a run, updated whenever a batch is flushed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Rows applied to the visual model.
    pub rows_seen: usize,
    /// Elements projected from these rows, including repeated identities.
    pub elements_emitted: usize,
    /// The number of elements in the visual model.
    pub element_count: usize,
    /// Whether the visual model dropped elements because it reached its capacity.
    pub truncated: bool,
    pub anomalies: AnomalyTally,
}

/// The state of a [PipelineController](crate::PipelineController).
#[derive(Clone, Debug)]
pub enum RunState {
    /// No run has been started since the controller was created or reset.
    Idle,
    /// The query is being opened.
    Starting {
        run: RunId,
        query: Query,
        started_at: Instant,
    },
    /// Rows are being pulled and applied.
    Running {
        run: RunId,
        query: Query,
        started_at: Instant,
        stats: RunStats,
    },
    /// Cancellation was requested. The run stops at the next safe point.
    Cancelling {
        run: RunId,
        query: Query,
        started_at: Instant,
        stats: RunStats,
    },
    /// The result stream has been drained.
    Completed {
        run: RunId,
        elapsed: Duration,
        stats: RunStats,
    },
    /// The run has been cancelled. What was visualized before remains visible.
    Cancelled {
        run: RunId,
        elapsed: Duration,
        stats: RunStats,
    },
    /// The run has failed. What was visualized before remains visible.
    Failed {
        run: RunId,
        error: RunError,
        stats: RunStats,
    },
}

impl RunState {
    /// The run this state belongs to.
    pub fn run(&self) -> Option<RunId> {
        match self {
            RunState::Idle => None,
            RunState::Starting { run, .. }
            | RunState::Running { run, .. }
            | RunState::Cancelling { run, .. }
            | RunState::Completed { run, .. }
            | RunState::Cancelled { run, .. }
            | RunState::Failed { run, .. } => Some(*run),
        }
    }

    /// Returns the counters of the run, if any.
    pub fn stats(&self) -> Option<&RunStats> {
        match self {
            RunState::Idle | RunState::Starting { .. } => None,
            RunState::Running { stats, .. }
            | RunState::Cancelling { stats, .. }
            | RunState::Completed { stats, .. }
            | RunState::Cancelled { stats, .. }
            | RunState::Failed { stats, .. } => Some(stats),
        }
    }

    /// Whether a run is in progress, i.e., a new run cannot be started.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            RunState::Starting { .. } | RunState::Running { .. } | RunState::Cancelling { .. }
        )
    }

    /// Whether the state is one of the final states of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed { .. } | RunState::Cancelled { .. } | RunState::Failed { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Starting { .. } => "starting",
            RunState::Running { .. } => "running",
            RunState::Cancelling { .. } => "cancelling",
            RunState::Completed { .. } => "completed",
            RunState::Cancelled { .. } => "cancelled",
            RunState::Failed { .. } => "failed",
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.run() {
            Some(run) => write!(f, "{} ({run})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}
