//! The data model shared by all RDF Lens crates.
//!
//! Terms produced by a query engine enter the system as [`RdfTerm`]s exactly once. Everything
//! downstream (projection, visual model, selection) works on the identities derived from these
//! terms, never on the engine's own representation.

mod element;
mod error;
mod query;
mod row;
mod term;

pub use element::*;
pub use error::*;
pub use query::*;
pub use row::*;
pub use term::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::Term as DecodedTerm;
pub use oxrdf::{
    BlankNode, BlankNodeRef, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef,
    TermParseError, Variable, VariableNameParseError, VariableRef,
};
