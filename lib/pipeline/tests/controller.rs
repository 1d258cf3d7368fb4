#![cfg(test)]

mod common;

use common::{ex, literal, next_event_matching, select, triple, ScriptedEngine, Step};
use insta::assert_snapshot;
use rdf_lens_common::QueryEngine;
use rdf_lens_model::{ElementId, GraphElement, TermKey};
use rdf_lens_pipeline::{
    PipelineConfig, PipelineController, PipelineError, PipelineEvent, RunError, RunState,
};
use rdf_lens_projection::{AnomalyPolicy, PrefixMap};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const KNOWS: &str = "SELECT ?s ?p ?o WHERE { ?s ?p ?o }";

fn config() -> PipelineConfig {
    let mut prefixes = PrefixMap::new();
    prefixes.insert("ex", common::EX);
    PipelineConfig::default().with_prefixes(prefixes)
}

fn new_controller(
    engine: &Arc<ScriptedEngine>,
    config: PipelineConfig,
) -> (PipelineController, rdf_lens_pipeline::PipelineEvents) {
    let engine: Arc<dyn QueryEngine> = Arc::clone(engine) as Arc<dyn QueryEngine>;
    PipelineController::new(engine, config)
}

fn render(controller: &PipelineController) -> String {
    controller
        .model()
        .snapshot()
        .elements()
        .map(|element| match element {
            GraphElement::Node(node) => format!("node {}", node.label),
            GraphElement::Edge(edge) => format!(
                "edge {} -{}-> {}",
                edge.key.source, edge.label, edge.key.target
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn node_id(local: &str) -> ElementId {
    ElementId::Node(TermKey::of(&ex(local)))
}

#[tokio::test]
async fn completed_run_deduplicates_nodes() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        triple("A", "knows", "C"),
    ]));
    let (controller, _events) = new_controller(&engine, config());

    controller.start(select(KNOWS)).await?;
    let state = controller.wait().await;

    let RunState::Completed { stats, .. } = state else {
        panic!("Unexpected state {state}");
    };
    assert_eq!(stats.rows_seen, 2);
    let snapshot = controller.model().snapshot();
    assert_eq!(snapshot.node_count(), 3);
    assert_eq!(snapshot.edge_count(), 2);
    assert_snapshot!(render(&controller), @r"
    node ex:A
    node ex:B
    edge <http://example.com/A> -ex:knows-> <http://example.com/B>
    node ex:C
    edge <http://example.com/A> -ex:knows-> <http://example.com/C>
    ");
    assert_eq!(engine.closes(), 1);
    Ok(())
}

#[tokio::test]
async fn cancel_after_first_row_keeps_first_row() -> Result<(), Box<dyn Error>> {
    let gate = Arc::new(Notify::new());
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        Step::Wait(Arc::clone(&gate)),
        triple("A", "knows", "C"),
    ]));
    let (controller, mut events) = new_controller(&engine, config().with_batch_size(1));

    let run = controller.start(select(KNOWS)).await?;
    next_event_matching(&mut events, |event| {
        matches!(event, PipelineEvent::Progress { stats, .. } if stats.rows_seen == 1)
    })
    .await;
    assert_eq!(controller.cancel()?, run);
    assert!(matches!(controller.state(), RunState::Cancelling { .. }));
    gate.notify_one();

    let state = controller.wait().await;
    assert!(matches!(state, RunState::Cancelled { .. }), "{state}");
    let snapshot = controller.model().snapshot();
    assert_eq!(snapshot.node_count(), 2);
    assert_eq!(snapshot.edge_count(), 1);
    assert_eq!(engine.closes(), 1);

    let finished = next_event_matching(&mut events, |event| {
        matches!(event, PipelineEvent::Finished { .. })
    })
    .await;
    assert!(matches!(
        finished,
        PipelineEvent::Finished {
            state: RunState::Cancelled { .. },
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn cancel_while_opening() -> Result<(), Box<dyn Error>> {
    let gate = Arc::new(Notify::new());
    let engine = Arc::new(
        ScriptedEngine::new(vec![triple("A", "knows", "B")]).with_open_gate(Arc::clone(&gate)),
    );
    let (controller, _events) = new_controller(&engine, config());

    let starting = tokio::spawn({
        let controller = controller.clone();
        async move { controller.start(select(KNOWS)).await }
    });
    while !matches!(controller.state(), RunState::Starting { .. }) {
        tokio::task::yield_now().await;
    }
    controller.cancel()?;
    gate.notify_one();
    starting.await??;

    let state = controller.wait().await;
    assert!(matches!(state, RunState::Cancelled { .. }), "{state}");
    assert!(controller.model().snapshot().is_empty());
    assert_eq!(engine.fetches(), 0);
    assert_eq!(engine.closes(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_run_retains_partial_results() -> Result<(), Box<dyn Error>> {
    let mut steps = (0..10)
        .map(|i| triple(&format!("S{i}"), "knows", &format!("O{i}")))
        .collect::<Vec<_>>();
    steps.push(Step::Fail("connection reset".to_owned()));
    steps.push(triple("X", "knows", "Y"));
    let engine = Arc::new(ScriptedEngine::new(steps));
    let (controller, _events) = new_controller(&engine, config().with_batch_size(4));

    controller.start(select(KNOWS)).await?;
    let state = controller.wait().await;

    let RunState::Failed { error, stats, .. } = state else {
        panic!("Unexpected state {state}");
    };
    assert!(matches!(error, RunError::Execution(_)));
    assert_eq!(
        error.to_string(),
        "The engine produced an invalid result: connection reset"
    );
    assert_eq!(stats.rows_seen, 10);
    let snapshot = controller.model().snapshot();
    assert_eq!(snapshot.node_count(), 20);
    assert_eq!(snapshot.edge_count(), 10);
    assert_eq!(snapshot.row_count(), 10);
    assert!(!snapshot.contains(&node_id("X")));
    assert_eq!(engine.closes(), 1);
    Ok(())
}

#[tokio::test]
async fn start_while_running_is_rejected() -> Result<(), Box<dyn Error>> {
    let gate = Arc::new(Notify::new());
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        Step::Wait(Arc::clone(&gate)),
    ]));
    let (controller, mut events) = new_controller(&engine, config().with_batch_size(1));

    let run = controller.start(select(KNOWS)).await?;
    next_event_matching(&mut events, |event| {
        matches!(event, PipelineEvent::Progress { .. })
    })
    .await;
    let before = controller.model().snapshot();

    let result = controller.start(select(KNOWS)).await;
    assert!(matches!(result, Err(PipelineError::AlreadyRunning)));
    assert!(matches!(controller.state(), RunState::Running { .. }));
    assert_eq!(controller.state().run(), Some(run));
    let after = controller.model().snapshot();
    assert_eq!(after.generation(), before.generation());
    assert_eq!(after.version(), before.version());
    assert_eq!(engine.opened.load(std::sync::atomic::Ordering::SeqCst), 1);

    gate.notify_one();
    assert!(matches!(controller.wait().await, RunState::Completed { .. }));
    Ok(())
}

#[tokio::test]
async fn engine_error_fails_without_touching_the_model() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::failing_to_open("unexpected token"));
    let (controller, mut events) = new_controller(&engine, config());
    let generation = controller.model().snapshot().generation();

    let result = controller.start(select(KNOWS)).await;
    let Err(PipelineError::Engine(error)) = result else {
        panic!("Unexpected result {result:?}");
    };
    assert_snapshot!(error, @"The query could not be compiled: unexpected token");
    assert!(matches!(
        controller.state(),
        RunState::Failed {
            error: RunError::Engine(_),
            ..
        }
    ));
    assert_eq!(controller.model().snapshot().generation(), generation);
    assert!(matches!(
        events.recv().await,
        Some(PipelineEvent::Finished {
            state: RunState::Failed { .. },
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn runs_do_not_leak_into_each_other() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::new(vec![triple("A", "knows", "B")]));
    let (controller, _events) = new_controller(&engine, config());

    let first = controller.start(select(KNOWS)).await?;
    controller.wait().await;
    let first_generation = controller.model().snapshot().generation();
    let second = controller.start(select(KNOWS)).await?;
    controller.wait().await;

    assert!(second > first);
    let snapshot = controller.model().snapshot();
    assert!(snapshot.generation() > first_generation);
    assert_eq!(snapshot.element_count(), 3);
    assert_eq!(snapshot.row_count(), 1);
    assert_eq!(engine.closes(), 2);
    Ok(())
}

#[tokio::test]
async fn cancel_and_reset_require_matching_states() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::new(vec![triple("A", "knows", "B")]));
    let (controller, _events) = new_controller(&engine, config());

    assert!(matches!(
        controller.cancel(),
        Err(PipelineError::NotCancellable)
    ));
    controller.start(select(KNOWS)).await?;
    controller.wait().await;
    assert!(matches!(
        controller.cancel(),
        Err(PipelineError::NotCancellable)
    ));

    controller.reset()?;
    assert!(matches!(controller.state(), RunState::Idle));
    assert_eq!(controller.model().snapshot().element_count(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn partial_batches_are_flushed_after_the_interval() -> Result<(), Box<dyn Error>> {
    let gate = Arc::new(Notify::new());
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        Step::Wait(Arc::clone(&gate)),
        triple("A", "knows", "C"),
    ]));
    let (controller, mut events) = new_controller(
        &engine,
        config()
            .with_batch_size(1000)
            .with_flush_interval(Duration::from_millis(50)),
    );

    controller.start(select(KNOWS)).await?;
    let progress = next_event_matching(&mut events, |event| {
        matches!(event, PipelineEvent::Progress { .. })
    })
    .await;
    let PipelineEvent::Progress { stats, version, .. } = progress else {
        unreachable!()
    };
    assert_eq!(stats.rows_seen, 1);
    assert_eq!(version, 1);
    assert!(matches!(controller.state(), RunState::Running { .. }));
    assert_eq!(controller.model().snapshot().element_count(), 3);

    gate.notify_one();
    let state = controller.wait().await;
    assert_eq!(state.stats().map(|s| s.rows_seen), Some(2));
    assert_eq!(controller.model().snapshot().element_count(), 5);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshots_are_observed_in_order() -> Result<(), Box<dyn Error>> {
    let steps = (0..200)
        .map(|i| triple("Hub", "links", &format!("N{i}")))
        .collect::<Vec<_>>();
    let engine = Arc::new(ScriptedEngine::new(steps));
    let (controller, _events) = new_controller(&engine, config().with_batch_size(3));

    let reader = tokio::spawn({
        let model = controller.model().clone();
        let mut state = controller.watch();
        async move {
            let mut last = (0, 0);
            loop {
                let snapshot = model.snapshot();
                let current = (snapshot.version(), snapshot.element_count());
                assert!(current.0 >= last.0, "version went back: {last:?} -> {current:?}");
                assert!(current.1 >= last.1, "elements went back: {last:?} -> {current:?}");
                assert_eq!(snapshot.row_count() * 2 + 1, current.1.max(1));
                last = current;
                if state.borrow_and_update().is_terminal() {
                    return last;
                }
                tokio::task::yield_now().await;
            }
        }
    });
    controller.start(select(KNOWS)).await?;
    controller.wait().await;
    reader.await?;

    assert_eq!(controller.model().snapshot().node_count(), 201);
    Ok(())
}

#[tokio::test]
async fn selection_follows_the_run() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        Step::Row(vec![None, None, None]),
        triple("A", "knows", "C"),
    ]));
    let (controller, _events) = new_controller(&engine, config());
    controller.start(select(KNOWS)).await?;
    controller.wait().await;

    let selection = controller.selection();
    assert_eq!(selection.on_visual_pick(&node_id("A")), [0, 2].into());
    assert_eq!(selection.on_visual_pick(&node_id("C")), [2].into());
    assert!(selection.on_row_pick(1).is_empty());
    assert_eq!(selection.on_row_pick(2).len(), 3);
    Ok(())
}

#[tokio::test]
async fn anomalies_are_reported_by_policy() -> Result<(), Box<dyn Error>> {
    let steps = vec![Step::Row(vec![
        Some(literal("not a node")),
        Some(ex("knows")),
        Some(ex("B")),
    ])];

    let engine = Arc::new(ScriptedEngine::new(steps.clone()));
    let (controller, mut events) =
        new_controller(&engine, config().with_anomaly_policy(AnomalyPolicy::Report));
    controller.start(select(KNOWS)).await?;
    let anomaly = next_event_matching(&mut events, |event| {
        matches!(event, PipelineEvent::Anomaly { .. })
    })
    .await;
    let PipelineEvent::Anomaly {
        row_index, anomaly, ..
    } = anomaly
    else {
        unreachable!()
    };
    assert_eq!(row_index, 0);
    assert_snapshot!(anomaly, @r#"literal in subject position in ?s: "not a node""#);
    let state = controller.wait().await;
    assert_eq!(state.stats().map(|s| s.anomalies.literal_subjects), Some(1));
    // The literal is still visualized.
    assert_eq!(controller.model().snapshot().node_count(), 2);

    let engine = Arc::new(ScriptedEngine::new(steps));
    let (controller, _events) =
        new_controller(&engine, config().with_anomaly_policy(AnomalyPolicy::Silent));
    controller.start(select(KNOWS)).await?;
    let state = controller.wait().await;
    assert_eq!(state.stats().map(|s| s.anomalies.total()), Some(0));
    Ok(())
}

#[tokio::test]
async fn capacity_limit_is_reported() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        triple("A", "knows", "C"),
    ]));
    let (controller, _events) = new_controller(&engine, config().with_max_elements(Some(3)));
    controller.start(select(KNOWS)).await?;

    let state = controller.wait().await;
    let stats = state.stats().copied().unwrap_or_default();
    assert!(stats.truncated);
    assert_eq!(stats.element_count, 3);
    assert!(controller.model().snapshot().is_truncated());
    Ok(())
}

#[tokio::test]
async fn row_limit_bounds_the_result_table() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        triple("A", "knows", "C"),
        triple("A", "knows", "D"),
    ]));
    let (controller, _events) =
        new_controller(&engine, config().with_batch_size(1).with_max_rows(Some(2)));
    controller.start(select(KNOWS)).await?;

    let state = controller.wait().await;
    assert_eq!(state.stats().map(|s| s.rows_seen), Some(3));
    let snapshot = controller.model().snapshot();
    assert!(snapshot.is_table_truncated());
    assert_eq!(snapshot.row_count(), 2);
    assert_eq!(snapshot.node_count(), 4);
    assert!(controller.selection().on_row_pick(2).is_empty());
    Ok(())
}

#[tokio::test]
async fn limit_stops_pulling() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(ScriptedEngine::new(vec![
        triple("A", "knows", "B"),
        triple("A", "knows", "C"),
        triple("A", "knows", "D"),
    ]));
    let (controller, _events) = new_controller(&engine, config());
    controller.start(select(KNOWS).with_limit(2)).await?;

    let state = controller.wait().await;
    assert!(matches!(state, RunState::Completed { .. }));
    assert_eq!(state.stats().map(|s| s.rows_seen), Some(2));
    assert_eq!(engine.fetches(), 2);
    assert_eq!(engine.closes(), 1);
    Ok(())
}
