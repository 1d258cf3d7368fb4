#![allow(
    clippy::print_stderr,
    clippy::print_stdout,
    reason = "Progress goes to stderr, the summary to stdout"
)]
use crate::cli::{Args, Command};
use anyhow::Context;
use clap::Parser;
use rdf_lens::model::{GraphElement, Query, QueryKind};
use rdf_lens::pipeline::{
    PipelineConfig, PipelineController, PipelineEvent, PipelineEvents, RunState,
};
use rdf_lens::projection::{PrefixMap, ProjectionRules};
use rdf_lens::sources::{ReplayEngine, ReplayFormat};
use rdf_lens::visual::VisualSnapshot;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Run {
            file,
            format,
            query,
            kind,
            limit,
            timeout,
            row_delay,
            batch_size,
            flush_interval,
            max_elements,
            max_rows,
            rules,
            prefix,
            anomalies,
            elements,
        } => {
            let format = if let Some(format) = format {
                format
                    .parse::<ReplayFormat>()
                    .with_context(|| format!("The file format '{format}' is unknown"))?
            } else {
                ReplayFormat::from_path(&file)?
            };
            let mut engine = ReplayEngine::new(&file, format);
            if let Some(delay) = row_delay {
                engine = engine.with_row_delay(delay);
            }

            let kind = match (kind, &query) {
                (Some(kind), _) => kind,
                (None, Some(text)) => QueryKind::detect(text).with_context(|| {
                    "Not able to detect the kind of the query, please set --kind"
                })?,
                (None, None) if format.is_graph() => QueryKind::Construct,
                (None, None) => QueryKind::Select,
            };
            let mut query = Query::new(query.unwrap_or_default(), kind);
            if let Some(limit) = limit {
                query = query.with_limit(limit);
            }
            if let Some(timeout) = timeout {
                query = query.with_timeout(timeout);
            }

            let mut prefixes = PrefixMap::with_common_prefixes();
            for (name, namespace) in prefix {
                prefixes.insert(name, namespace);
            }
            let mut config = PipelineConfig::default()
                .with_max_elements(max_elements)
                .with_max_rows(max_rows)
                .with_anomaly_policy(anomalies.into())
                .with_prefixes(prefixes);
            if let Some(batch_size) = batch_size {
                config = config.with_batch_size(batch_size);
            }
            if let Some(flush_interval) = flush_interval {
                config = config.with_flush_interval(flush_interval);
            }
            if let Some(rules) = rules {
                config = config.with_rules(load_rules(&rules)?);
            }

            let (controller, events) = PipelineController::new(Arc::new(engine), config);
            let state = run(&controller, events, query).await?;
            let snapshot = controller.model().snapshot();
            print_summary(&state, &snapshot);
            if elements {
                print_elements(&snapshot);
            }
            if let RunState::Failed { run, error, .. } = state {
                return Err(anyhow::Error::new(error).context(format!("The run {run} failed")));
            }
            Ok(())
        }
    }
}

/// Drives a single run to its end, cancelling it on Ctrl-C.
async fn run(
    controller: &PipelineController,
    mut events: PipelineEvents,
    query: Query,
) -> anyhow::Result<RunState> {
    let run = controller
        .start(query)
        .await
        .context("Failed to start the query")?;
    let mut interrupted = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let finished = matches!(event, PipelineEvent::Finished { .. });
                report(&event);
                if finished && event.run() == run {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                signal.context("Failed to listen for Ctrl-C")?;
                tracing::debug!(%run, "Received Ctrl-C");
                interrupted = true;
                if controller.cancel().is_ok() {
                    eprintln!("Cancelling run {run}");
                }
            }
        }
    }
    Ok(controller.wait().await)
}

fn report(event: &PipelineEvent) {
    match event {
        PipelineEvent::Started { run, variables } => {
            let variables = variables
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            eprintln!("Run {run} started: {variables}");
        }
        PipelineEvent::Progress { run, stats, .. } => {
            eprintln!(
                "Run {run}: {} rows, {} elements",
                stats.rows_seen, stats.element_count
            );
        }
        PipelineEvent::Anomaly {
            run,
            row_index,
            anomaly,
        } => eprintln!("Run {run}, row {row_index}: {anomaly}"),
        PipelineEvent::Finished { run, state } => eprintln!("Run {run} finished: {}", state.name()),
    }
}

fn print_summary(state: &RunState, snapshot: &VisualSnapshot) {
    println!("state: {}", state.name());
    println!("rows: {}", snapshot.row_count());
    println!("nodes: {}", snapshot.node_count());
    println!("edges: {}", snapshot.edge_count());
    if snapshot.is_truncated() {
        println!("truncated: true");
    }
    if snapshot.is_table_truncated() {
        println!("table truncated: true");
    }
    if let Some(stats) = state.stats() {
        if stats.anomalies.total() > 0 {
            println!("anomalies: {}", stats.anomalies.total());
        }
    }
}

fn print_elements(snapshot: &VisualSnapshot) {
    for element in snapshot.elements() {
        let kind = match element {
            GraphElement::Node(_) => "node",
            GraphElement::Edge(_) => "edge",
        };
        let attributes = element
            .attributes()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{kind} {} {{{attributes}}}", element.label());
    }
}

fn load_rules(path: &Path) -> anyhow::Result<ProjectionRules> {
    let file = fs::read(path)
        .with_context(|| format!("Failed to read the rules file {}", path.display()))?;
    serde_json::from_slice(&file)
        .with_context(|| format!("The rules file {} is invalid", path.display()))
}
