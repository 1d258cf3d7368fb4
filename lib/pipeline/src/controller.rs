use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, RunError};
use crate::event::{PipelineEvent, PipelineEvents};
use crate::state::{RunId, RunState, RunStats};
use crate::stream::ResultStream;
use parking_lot::Mutex;
use rdf_lens_common::error::{EngineError, ExecutionError};
use rdf_lens_common::QueryEngine;
use rdf_lens_model::{Query, ResultRow};
use rdf_lens_projection::{GraphProjector, ProjectionRules};
use rdf_lens_visual::{Batch, SelectionBridge, VisualModel};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

/// Runs queries and feeds their results into a [VisualModel].
///
/// The controller owns at most one live run. Starting a run while another one is live is
/// rejected, never queued. Rows are pulled on a background task, so neither [Self::start] nor
/// [Self::cancel] blocks on engine I/O after the query has been opened.
///
/// The controller is a cheap, clonable handle. All clones control the same runs.
#[derive(Clone)]
pub struct PipelineController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    engine: Arc<dyn QueryEngine>,
    config: PipelineConfig,
    model: VisualModel,
    state: watch::Sender<RunState>,
    events: mpsc::UnboundedSender<PipelineEvent>,
    last_run: AtomicU64,
    cancel: Mutex<CancellationToken>,
}

impl PipelineController {
    /// Creates a new controller together with the receiving end of its events.
    pub fn new(engine: Arc<dyn QueryEngine>, config: PipelineConfig) -> (Self, PipelineEvents) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(RunState::Idle);
        let controller = Self {
            inner: Arc::new(ControllerInner {
                engine,
                model: VisualModel::with_limits(config.max_elements, config.max_rows),
                config,
                state,
                events,
                last_run: AtomicU64::new(0),
                cancel: Mutex::default(),
            }),
        };
        (controller, receiver)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// The model that the runs of this controller write to.
    pub fn model(&self) -> &VisualModel {
        &self.inner.model
    }

    /// Creates a [SelectionBridge] over the model of this controller.
    pub fn selection(&self) -> SelectionBridge {
        SelectionBridge::new(self.inner.model.clone())
    }

    /// The current state.
    pub fn state(&self) -> RunState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn watch(&self) -> watch::Receiver<RunState> {
        self.inner.state.subscribe()
    }

    /// Starts a new run of `query`.
    ///
    /// Returns once the query has been opened; the rows are pulled in the background. Fails with
    /// [PipelineError::AlreadyRunning] without changing anything if a run is live, and with
    /// [PipelineError::Engine] if the query cannot be opened. In the latter case, the run ends in
    /// [RunState::Failed] and the visual model is left untouched.
    pub async fn start(&self, query: Query) -> Result<RunId, PipelineError> {
        let run = self.begin(&query)?;
        let cancel = self.inner.cancel.lock().clone();
        tracing::info!(%run, kind = %query.kind(), "Starting run");

        // The run continues on its own task even if the caller stops waiting for it.
        let (opened, on_opened) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let started_at = Instant::now();
            let stream = match ResultStream::open(inner.engine.as_ref(), &query).await {
                Ok(stream) => stream,
                Err(error) => {
                    let error = Arc::new(error);
                    tracing::warn!(%run, %error, "Could not open query");
                    inner.finish(
                        run,
                        RunState::Failed {
                            run,
                            error: RunError::Engine(Arc::clone(&error)),
                            stats: RunStats::default(),
                        },
                    );
                    send_open_result(opened, Err(error));
                    return;
                }
            };

            if cancel.is_cancelled() {
                drop(stream);
                inner.finish(
                    run,
                    RunState::Cancelled {
                        run,
                        elapsed: started_at.elapsed(),
                        stats: RunStats::default(),
                    },
                );
                send_open_result(opened, Ok(()));
                return;
            }

            let variables = stream.variables();
            inner.model.clear_with_columns(Arc::clone(&variables));
            inner.state.send_modify(|state| {
                if let RunState::Starting { .. } = state {
                    *state = RunState::Running {
                        run,
                        query: query.clone(),
                        started_at,
                        stats: RunStats::default(),
                    };
                }
            });
            inner.emit(PipelineEvent::Started {
                run,
                variables: Arc::clone(&variables),
            });
            send_open_result(opened, Ok(()));

            let rules = inner
                .config
                .rules
                .clone()
                .unwrap_or_else(|| ProjectionRules::for_query(query.kind(), &variables));
            let projector = GraphProjector::new(rules, inner.config.prefixes.clone());
            let worker = RunWorker {
                inner,
                run,
                cancel,
                projector,
                started_at,
                batch: Batch::new(),
                last_flush: Instant::now(),
                row_index: 0,
                stats: RunStats::default(),
            };
            worker.pull(stream).await;
        });

        match on_opened.await {
            Ok(Ok(())) | Err(_) => Ok(run),
            Ok(Err(error)) => Err(PipelineError::Engine(error)),
        }
    }

    fn begin(&self, query: &Query) -> Result<RunId, PipelineError> {
        let inner = &self.inner;
        let mut started = None;
        inner.state.send_if_modified(|state| {
            if state.is_live() {
                return false;
            }
            let run = RunId::new(inner.last_run.fetch_add(1, Ordering::Relaxed) + 1);
            *inner.cancel.lock() = CancellationToken::new();
            *state = RunState::Starting {
                run,
                query: query.clone(),
                started_at: Instant::now(),
            };
            started = Some(run);
            true
        });
        started.ok_or(PipelineError::AlreadyRunning)
    }

    /// Requests the cancellation of the live run.
    ///
    /// Cancellation is cooperative: the run stops pulling rows and closes its result stream after
    /// the row fetch or flush in progress, and then ends in [RunState::Cancelled]. Use
    /// [Self::wait] to await this.
    pub fn cancel(&self) -> Result<RunId, PipelineError> {
        let mut cancelled = None;
        self.inner.state.send_if_modified(|state| {
            let next = match state {
                RunState::Starting {
                    run,
                    query,
                    started_at,
                } => RunState::Cancelling {
                    run: *run,
                    query: query.clone(),
                    started_at: *started_at,
                    stats: RunStats::default(),
                },
                RunState::Running {
                    run,
                    query,
                    started_at,
                    stats,
                } => RunState::Cancelling {
                    run: *run,
                    query: query.clone(),
                    started_at: *started_at,
                    stats: *stats,
                },
                _ => return false,
            };
            cancelled = next.run();
            self.inner.cancel.lock().cancel();
            *state = next;
            true
        });
        let run = cancelled.ok_or(PipelineError::NotCancellable)?;
        tracing::info!(%run, "Cancellation requested");
        Ok(run)
    }

    /// Returns a controller whose last run has ended to [RunState::Idle].
    ///
    /// The visual model keeps the results of the last run until the next run starts.
    pub fn reset(&self) -> Result<(), PipelineError> {
        let mut rejected = false;
        self.inner.state.send_if_modified(|state| {
            if state.is_live() {
                rejected = true;
                return false;
            }
            let modified = state.is_terminal();
            *state = RunState::Idle;
            modified
        });
        if rejected {
            return Err(PipelineError::AlreadyRunning);
        }
        Ok(())
    }

    /// Waits until no run is live and returns the state at this point.
    pub async fn wait(&self) -> RunState {
        let mut state = self.inner.state.subscribe();
        let finished = match state.wait_for(|state| !state.is_live()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        finished
    }
}

fn send_open_result(
    sender: oneshot::Sender<Result<(), Arc<EngineError>>>,
    result: Result<(), Arc<EngineError>>,
) {
    if sender.send(result).is_err() {
        tracing::trace!("Nobody is waiting for the query to open");
    }
}

impl ControllerInner {
    fn emit(&self, event: PipelineEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Pipeline events are not consumed");
        }
    }

    /// Moves `run` to the terminal state `state`.
    fn finish(&self, run: RunId, state: RunState) {
        let mut finished = state;
        self.state.send_modify(|current| {
            // A cancellation that arrives after the stream has ended still ends the run as
            // cancelled.
            if matches!(current, RunState::Cancelling { .. }) {
                if let RunState::Completed {
                    run,
                    elapsed,
                    stats,
                } = finished
                {
                    finished = RunState::Cancelled {
                        run,
                        elapsed,
                        stats,
                    };
                }
            }
            *current = finished.clone();
        });
        tracing::info!(%run, state = finished.name(), "Run finished");
        self.emit(PipelineEvent::Finished {
            run,
            state: finished,
        });
    }
}

/// The pull loop of a single run.
struct RunWorker {
    inner: Arc<ControllerInner>,
    run: RunId,
    cancel: CancellationToken,
    projector: GraphProjector,
    started_at: Instant,
    batch: Batch,
    last_flush: Instant,
    row_index: usize,
    stats: RunStats,
}

/// The outcome of waiting for the next row.
enum Fetched {
    Row(Result<Option<ResultRow>, ExecutionError>),
    /// A time-slice flush observed a cancellation request while the row was still pending.
    Cancelled,
}

impl RunWorker {
    async fn pull(mut self, mut stream: ResultStream) {
        let outcome = loop {
            if self.cancel.is_cancelled() {
                break Outcome::Cancelled;
            }
            match self.fetch(&mut stream).await {
                Fetched::Cancelled => break Outcome::Cancelled,
                // The row arrived after cancellation was requested and is dropped.
                Fetched::Row(Ok(Some(_))) if self.cancel.is_cancelled() => {
                    break Outcome::Cancelled
                }
                Fetched::Row(Ok(Some(row))) => {
                    self.push(row);
                    if self.batch.element_count() >= self.inner.config.batch_size
                        || self.batch.row_count() >= self.inner.config.batch_size
                        || self.last_flush.elapsed() >= self.inner.config.flush_interval
                    {
                        self.flush();
                    }
                }
                Fetched::Row(Ok(None)) => break Outcome::Completed,
                Fetched::Row(Err(error)) => break Outcome::Failed(error),
            }
        };

        // Everything that has been projected is kept, also for failed and cancelled runs.
        self.flush();
        stream.close();

        let stats = self.stats;
        let elapsed = self.started_at.elapsed();
        let state = match outcome {
            Outcome::Completed => RunState::Completed {
                run: self.run,
                elapsed,
                stats,
            },
            Outcome::Cancelled => RunState::Cancelled {
                run: self.run,
                elapsed,
                stats,
            },
            Outcome::Failed(error) => {
                tracing::warn!(run = %self.run, %error, "Run failed");
                RunState::Failed {
                    run: self.run,
                    error: error.into(),
                    stats,
                }
            }
        };
        self.inner.finish(self.run, state);
    }

    /// Waits for the next row. While waiting, a non-empty batch is flushed once the flush interval
    /// has elapsed.
    async fn fetch(&mut self, stream: &mut ResultStream) -> Fetched {
        let next = stream.next();
        tokio::pin!(next);
        loop {
            if self.batch.is_empty() {
                return Fetched::Row(next.await);
            }
            let deadline = self.last_flush + self.inner.config.flush_interval;
            tokio::select! {
                biased;
                row = &mut next => return Fetched::Row(row),
                () = tokio::time::sleep_until(deadline) => {
                    self.flush();
                    if self.cancel.is_cancelled() {
                        return Fetched::Cancelled;
                    }
                }
            }
        }
    }

    fn push(&mut self, row: ResultRow) {
        let row_index = self.row_index;
        self.row_index += 1;

        let projection = self.projector.project(&row);
        let policy = self.inner.config.anomaly_policy;
        if policy.counts() {
            for anomaly in &projection.anomalies {
                self.stats.anomalies.record(anomaly);
            }
        }
        if policy.reports() {
            for anomaly in projection.anomalies {
                tracing::warn!(run = %self.run, row_index, %anomaly, "Projection anomaly");
                self.inner.emit(PipelineEvent::Anomaly {
                    run: self.run,
                    row_index,
                    anomaly,
                });
            }
        }
        self.batch.push(row_index, row, projection.elements);
    }

    fn flush(&mut self) {
        self.last_flush = Instant::now();
        if self.batch.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.batch);
        let rows = batch.row_count();
        let elements = batch.element_count();
        let applied = self.inner.model.apply(batch);

        self.stats.rows_seen += rows;
        self.stats.elements_emitted += elements;
        self.stats.element_count = applied.element_count;
        self.stats.truncated |= applied.dropped > 0;
        tracing::debug!(
            run = %self.run,
            rows,
            elements,
            version = applied.version,
            "Flushed batch"
        );

        let stats = self.stats;
        self.inner.state.send_modify(|state| {
            if let RunState::Running { stats: current, .. }
            | RunState::Cancelling { stats: current, .. } = state
            {
                *current = stats;
            }
        });
        self.inner.emit(PipelineEvent::Progress {
            run: self.run,
            stats,
            version: applied.version,
        });
    }
}

enum Outcome {
    Completed,
    Cancelled,
    Failed(ExecutionError),
}
