//! A [`QueryEngine`](rdf_lens_common::QueryEngine) that replays results from serialized
//! documents.
//!
//! The [`ReplayEngine`] does not evaluate queries. It serves the content of one document for every
//! query it opens:
//! - SPARQL result documents (JSON, XML, CSV, TSV) are served row by row. A boolean result becomes
//!   a single row binding `?boolean`.
//! - RDF documents (Turtle, N-Triples, TriG, RDF/XML, ...) are served as `?subject ?predicate
//!   ?object` rows, one per triple.
//!
//! This makes it possible to explore previously exported results, and to drive the pipeline in
//! tests and demos.

mod cursor;
mod engine;
mod error;
mod format;

pub use engine::ReplayEngine;
pub use error::ReplayError;
pub use format::ReplayFormat;
