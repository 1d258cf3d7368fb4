#![allow(dead_code, reason = "Not every test uses every helper")]

use async_trait::async_trait;
use rdf_lens_common::error::{EngineError, ExecutionError};
use rdf_lens_common::{QueryEngine, ResultCursor};
use rdf_lens_model::{Literal, NamedNode, Query, RdfTerm, ResultRow, Variable};
use rdf_lens_pipeline::{PipelineEvent, PipelineEvents};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const EX: &str = "http://example.com/";

pub fn ex(local: &str) -> RdfTerm {
    NamedNode::new_unchecked(format!("{EX}{local}")).into()
}

pub fn literal(value: &str) -> RdfTerm {
    Literal::new_simple_literal(value).into()
}

/// What the cursor of a [ScriptedEngine] does when the next row is pulled.
#[derive(Clone, Debug)]
pub enum Step {
    Row(Vec<Option<RdfTerm>>),
    /// Waits until the gate is notified and continues with the next step.
    Wait(Arc<Notify>),
    Fail(String),
}

/// A row binding `?s ?p ?o` to `ex:` IRIs.
pub fn triple(s: &str, p: &str, o: &str) -> Step {
    Step::Row(vec![Some(ex(s)), Some(ex(p)), Some(ex(o))])
}

/// A query engine that plays back a script of steps for every query.
pub struct ScriptedEngine {
    variables: Arc<[Variable]>,
    steps: Vec<Step>,
    open_error: Option<String>,
    open_gate: Option<Arc<Notify>>,
    pub opened: Arc<AtomicUsize>,
    pub fetches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>) -> Self {
        Self::with_variables(&["s", "p", "o"], steps)
    }

    pub fn with_variables(variables: &[&str], steps: Vec<Step>) -> Self {
        Self {
            variables: variables
                .iter()
                .map(|name| Variable::new_unchecked(*name))
                .collect(),
            steps,
            open_error: None,
            open_gate: None,
            opened: Arc::default(),
            fetches: Arc::default(),
            closes: Arc::default(),
        }
    }

    pub fn failing_to_open(message: &str) -> Self {
        let mut engine = Self::new(Vec::new());
        engine.open_error = Some(message.to_owned());
        engine
    }

    /// Makes `open` wait until `gate` is notified.
    pub fn with_open_gate(mut self, gate: Arc<Notify>) -> Self {
        self.open_gate = Some(gate);
        self
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, _query: &Query) -> Result<Box<dyn ResultCursor>, EngineError> {
        if let Some(gate) = &self.open_gate {
            gate.notified().await;
        }
        if let Some(message) = &self.open_error {
            return Err(EngineError::Syntax(message.clone()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedCursor {
            variables: Arc::clone(&self.variables),
            steps: self.steps.iter().cloned().collect(),
            fetches: Arc::clone(&self.fetches),
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct ScriptedCursor {
    variables: Arc<[Variable]>,
    steps: VecDeque<Step>,
    fetches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl ResultCursor for ScriptedCursor {
    fn variables(&self) -> Arc<[Variable]> {
        Arc::clone(&self.variables)
    }

    async fn next_row(&mut self) -> Result<Option<ResultRow>, ExecutionError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        loop {
            match self.steps.pop_front() {
                None => return Ok(None),
                Some(Step::Row(values)) => {
                    return Ok(Some(ResultRow::new(Arc::clone(&self.variables), values)))
                }
                Some(Step::Wait(gate)) => gate.notified().await,
                Some(Step::Fail(message)) => return Err(ExecutionError::InvalidResult(message)),
            }
        }
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn select(text: &str) -> Query {
    Query::sparql(text).unwrap()
}

/// Receives events until `predicate` matches and returns the matching event.
pub async fn next_event_matching(
    events: &mut PipelineEvents,
    predicate: impl Fn(&PipelineEvent) -> bool,
) -> PipelineEvent {
    loop {
        let event = events.recv().await.unwrap();
        if predicate(&event) {
            return event;
        }
    }
}
