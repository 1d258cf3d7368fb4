//! Projection of query result rows onto the elements of a visual graph.
//!
//! A [`GraphProjector`] turns each [`ResultRow`](rdf_lens_model::ResultRow) into zero or more
//! [`GraphElement`](rdf_lens_model::GraphElement)s, guided by declarative [`ProjectionRules`]
//! that assign a role to each variable:
//!
//! ```text
//! SELECT ?s ?p ?o ?name
//!         │  │  │   └── AttributeOf(?s)
//!         │  │  └────── Object     ─┐
//!         │  └───────── Predicate   ├─> two nodes and one edge per row
//!         └──────────── Subject    ─┘
//! ```
//!
//! Projection is a pure function of the row and the rules. It never fails: terms that cannot be
//! interpreted are degraded to a node showing their raw form and reported as a
//! [`ProjectionAnomaly`].

mod anomaly;
mod prefixes;
mod projector;
mod rules;

pub use anomaly::{AnomalyKind, AnomalyPolicy, AnomalyTally, ProjectionAnomaly};
pub use prefixes::PrefixMap;
pub use projector::{GraphProjector, Projection};
pub use rules::{ProjectionRuleError, ProjectionRules, ProjectionRulesBuilder, VariableRole};
