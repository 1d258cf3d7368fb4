//! The pipeline that runs a query and incrementally turns its results into a visual graph.
//!
//! A [`PipelineController`] owns at most one live run at a time. A run
//! 1. opens a [`ResultStream`] on the query engine,
//! 2. pulls rows on a background task and projects them with a
//!    [`GraphProjector`](rdf_lens_projection::GraphProjector),
//! 3. applies the projected elements to the [`VisualModel`](rdf_lens_visual::VisualModel) in
//!    batches, and
//! 4. reports its progress as [`PipelineEvent`]s.
//!
//! ```text
//! Idle ──start──> Starting ──> Running ──┬──> Completed ─┐
//!   ^                 │           │      ├──> Failed  ───┼──reset / start──> ...
//!   │                 └──cancel───┴────> Cancelling ──> Cancelled ─┘
//!   └──────────────────────────────────────────────────────────────┘
//! ```

mod cancel;
mod config;
mod controller;
mod error;
mod event;
mod state;
mod stream;

pub use config::PipelineConfig;
pub use controller::PipelineController;
pub use error::{PipelineError, RunError};
pub use event::{PipelineEvent, PipelineEvents};
pub use state::{RunId, RunState, RunStats};
pub use stream::ResultStream;
