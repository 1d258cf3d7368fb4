//! Interfaces between RDF Lens and the query engine it visualizes, together with the errors that
//! cross this boundary.

mod engine;
pub mod error;

pub use engine::{QueryEngine, ResultCursor};
