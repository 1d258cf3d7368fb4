use crate::format::ReplayFormat;
use async_trait::async_trait;
use oxrdfio::{RdfParser, ReaderQuadParser};
use rdf_lens_common::error::{EngineError, ExecutionError};
use rdf_lens_common::ResultCursor;
use rdf_lens_model::{DecodedTerm, Literal, ResultRow, Variable};
use sparesults::{QueryResultsParser, ReaderQueryResultsParserOutput, ReaderSolutionsParser};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

type Document = Cursor<Vec<u8>>;

enum ReplayRows {
    Solutions(ReaderSolutionsParser<Document>),
    /// The boolean of an `ASK` result. Taken once it has been served.
    Boolean(Option<bool>),
    Triples(ReaderQuadParser<Document>),
    Closed,
}

/// Serves the rows of one document.
pub(crate) struct ReplayCursor {
    variables: Arc<[Variable]>,
    rows: ReplayRows,
    row_delay: Option<Duration>,
}

impl ReplayCursor {
    /// Reads the header of `document`. Syntax errors in the header are reported as
    /// [EngineError]s, errors in the body only once the affected row is pulled.
    pub(crate) fn open(
        document: Vec<u8>,
        format: ReplayFormat,
        row_delay: Option<Duration>,
    ) -> Result<Self, EngineError> {
        let document = Cursor::new(document);
        let (variables, rows): (Arc<[Variable]>, ReplayRows) = match format {
            ReplayFormat::Results(format) => match QueryResultsParser::from_format(format)
                .for_reader(document)
                .map_err(EngineError::other)?
            {
                ReaderQueryResultsParserOutput::Solutions(solutions) => (
                    solutions.variables().iter().cloned().collect(),
                    ReplayRows::Solutions(solutions),
                ),
                ReaderQueryResultsParserOutput::Boolean(value) => (
                    Arc::from([Variable::new_unchecked("boolean")]),
                    ReplayRows::Boolean(Some(value)),
                ),
            },
            ReplayFormat::Rdf(format) => (
                ["subject", "predicate", "object"]
                    .into_iter()
                    .map(Variable::new_unchecked)
                    .collect(),
                ReplayRows::Triples(RdfParser::from_format(format).for_reader(document)),
            ),
        };
        Ok(Self {
            variables,
            rows,
            row_delay,
        })
    }

    fn pull(&mut self) -> Result<Option<ResultRow>, ExecutionError> {
        let values: Vec<Option<DecodedTerm>> = match &mut self.rows {
            ReplayRows::Solutions(solutions) => match solutions.next() {
                None => return Ok(None),
                Some(solution) => solution
                    .map_err(|error| ExecutionError::InvalidResult(error.to_string()))?
                    .values()
                    .to_vec(),
            },
            ReplayRows::Boolean(value) => match value.take() {
                None => return Ok(None),
                Some(value) => vec![Some(Literal::from(value).into())],
            },
            ReplayRows::Triples(triples) => match triples.next() {
                None => return Ok(None),
                Some(quad) => {
                    let quad =
                        quad.map_err(|error| ExecutionError::InvalidResult(error.to_string()))?;
                    vec![
                        Some(quad.subject.into()),
                        Some(quad.predicate.into()),
                        Some(quad.object),
                    ]
                }
            },
            ReplayRows::Closed => return Ok(None),
        };
        Ok(Some(ResultRow::from((Arc::clone(&self.variables), values))))
    }
}

#[async_trait]
impl ResultCursor for ReplayCursor {
    fn variables(&self) -> Arc<[Variable]> {
        Arc::clone(&self.variables)
    }

    async fn next_row(&mut self) -> Result<Option<ResultRow>, ExecutionError> {
        if let Some(delay) = self.row_delay {
            tokio::time::sleep(delay).await;
        }
        self.pull()
    }

    fn close(&mut self) {
        self.rows = ReplayRows::Closed;
    }
}
