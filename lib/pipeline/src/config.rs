use rdf_lens_projection::{AnomalyPolicy, PrefixMap, ProjectionRules};
use std::time::Duration;

/// Configures how a [PipelineController](crate::PipelineController) executes runs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// A batch is flushed to the visual model once it holds this many elements or rows.
    pub batch_size: usize,
    /// A non-empty batch is flushed at the latest after this interval, even if the engine has not
    /// produced the next row yet.
    pub flush_interval: Duration,
    /// The capacity of the visual model. [None] means unbounded.
    pub max_elements: Option<usize>,
    /// The number of rows the result table keeps. Later rows are still projected onto the graph.
    /// [None] means unbounded.
    pub max_rows: Option<usize>,
    /// What happens with terms that can only be projected on a best-effort basis.
    pub anomaly_policy: AnomalyPolicy,
    /// The projection rules. If [None], the rules are inferred per run from the query kind and the
    /// result variables.
    pub rules: Option<ProjectionRules>,
    /// Used for compacting IRIs in labels.
    pub prefixes: PrefixMap,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            flush_interval: Duration::from_millis(100),
            max_elements: None,
            max_rows: None,
            anomaly_policy: AnomalyPolicy::default(),
            rules: None,
            prefixes: PrefixMap::with_common_prefixes(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    #[must_use]
    pub fn with_max_elements(mut self, max_elements: Option<usize>) -> Self {
        self.max_elements = max_elements;
        self
    }

    #[must_use]
    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    #[must_use]
    pub fn with_anomaly_policy(mut self, anomaly_policy: AnomalyPolicy) -> Self {
        self.anomaly_policy = anomaly_policy;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ProjectionRules) -> Self {
        self.rules = Some(rules);
        self
    }

    #[must_use]
    pub fn with_prefixes(mut self, prefixes: PrefixMap) -> Self {
        self.prefixes = prefixes;
        self
    }
}
