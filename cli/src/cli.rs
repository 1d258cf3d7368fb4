use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use rdf_lens::model::QueryKind;
use rdf_lens::projection::AnomalyPolicy;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(about, version, name = "rdf-lens")]
/// RDF Lens command line shell for visualizing query results
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay the results of a query stored in a file and project them onto a graph
    ///
    /// Press Ctrl-C to cancel the run. Everything visualized until then is kept.
    Run {
        /// File with the results to replay
        ///
        /// It can be a SPARQL results document (srj, srx, csv, tsv) or an RDF document whose
        /// triples are replayed as ?subject ?predicate ?object rows.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// The format of the file
        ///
        /// It can be an extension like "srj" or a MIME type like "text/turtle".
        ///
        /// By default the format is guessed from the file extension.
        #[arg(long)]
        format: Option<String>,
        /// The text of the query that produced the results
        #[arg(short, long)]
        query: Option<String>,
        /// The kind of the query: select, ask, construct or shacl
        ///
        /// By default the kind is detected from the query text. Without a query, RDF documents
        /// are treated as construct results and everything else as select results.
        #[arg(long)]
        kind: Option<QueryKind>,
        /// Stop after this many rows
        #[arg(long)]
        limit: Option<usize>,
        /// Fail the run if it takes longer than this, e.g. "30s" or "500ms"
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,
        /// Delay every row, simulating a slow engine
        #[arg(long, value_parser = parse_duration)]
        row_delay: Option<Duration>,
        /// Number of elements or rows after which the visual model is updated
        #[arg(long)]
        batch_size: Option<usize>,
        /// Maximal time between two updates of the visual model
        #[arg(long, value_parser = parse_duration)]
        flush_interval: Option<Duration>,
        /// Maximal number of elements in the visual model
        #[arg(long)]
        max_elements: Option<usize>,
        /// Maximal number of rows kept in the result table
        ///
        /// Later rows are still added to the graph but cannot be selected.
        #[arg(long)]
        max_rows: Option<usize>,
        /// JSON file with the role of each result variable
        ///
        /// For example: [{"variable": "s", "role": "subject"}, {"variable": "name", "role": {"attribute_of": "s"}}]
        ///
        /// By default the roles are inferred from the query kind and the variable names.
        #[arg(long, value_hint = ValueHint::FilePath)]
        rules: Option<PathBuf>,
        /// Additional prefix used in labels, e.g. "ex=http://example.com/"
        #[arg(long, value_parser = parse_prefix)]
        prefix: Vec<(String, String)>,
        /// What to do with terms that can only be visualized on a best-effort basis
        #[arg(long, value_enum, default_value_t = Anomalies::Count)]
        anomalies: Anomalies,
        /// Print every element of the visual model once the run is over
        #[arg(long)]
        elements: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Anomalies {
    /// Degrade the affected terms silently
    Silent,
    /// Count the affected terms in the summary
    Count,
    /// Count and print each affected term
    Report,
}

impl From<Anomalies> for AnomalyPolicy {
    fn from(value: Anomalies) -> Self {
        match value {
            Anomalies::Silent => AnomalyPolicy::Silent,
            Anomalies::Count => AnomalyPolicy::Count,
            Anomalies::Report => AnomalyPolicy::Report,
        }
    }
}

/// Parses "250ms", "3s", "2m" or a plain number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (number, unit) = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or((value, ""), |split| value.split_at(split));
    let number = number
        .parse::<u64>()
        .map_err(|_| format!("'{value}' is not a duration"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "" | "s" => Ok(Duration::from_secs(number)),
        "m" => number
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("'{value}' is too long")),
        _ => Err(format!("Unknown duration unit '{unit}', expected ms, s or m")),
    }
}

fn parse_prefix(value: &str) -> Result<(String, String), String> {
    let (prefix, namespace) = value
        .split_once('=')
        .ok_or_else(|| format!("'{value}' is not of the form prefix=namespace"))?;
    if namespace.is_empty() {
        return Err(format!("The namespace of '{prefix}' is empty"));
    }
    Ok((prefix.to_owned(), namespace.to_owned()))
}
