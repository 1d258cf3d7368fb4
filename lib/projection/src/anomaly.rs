use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// What went wrong while projecting a term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnomalyKind {
    /// The engine produced a term shape that is not an IRI, a literal or a blank node.
    UnrecognizedTerm,
    /// A literal is bound to a subject variable.
    LiteralSubject,
    /// A predicate variable is bound to something other than an IRI.
    NonIriPredicate,
}

impl Display for AnomalyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AnomalyKind::UnrecognizedTerm => "unrecognized term",
            AnomalyKind::LiteralSubject => "literal in subject position",
            AnomalyKind::NonIriPredicate => "predicate is not an IRI",
        })
    }
}

/// A term that could only be projected on a best-effort basis.
///
/// Anomalies never abort a run. The affected term is still visualized, using its raw lexical form
/// where necessary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectionAnomaly {
    pub kind: AnomalyKind,
    /// The name of the variable the term was bound to.
    pub variable: String,
    /// The raw form of the term.
    pub raw: String,
}

impl Display for ProjectionAnomaly {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in ?{}: {}", self.kind, self.variable, self.raw)
    }
}

/// Decides what happens with [ProjectionAnomaly]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyPolicy {
    /// Degrade the affected terms without keeping track of them.
    Silent,
    /// Degrade the affected terms and count them in the run diagnostics.
    #[default]
    Count,
    /// Count the anomalies and report each one to the user.
    Report,
}

impl AnomalyPolicy {
    pub fn counts(self) -> bool {
        !matches!(self, AnomalyPolicy::Silent)
    }

    pub fn reports(self) -> bool {
        matches!(self, AnomalyPolicy::Report)
    }
}

/// Counts the anomalies of a run by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnomalyTally {
    pub unrecognized_terms: usize,
    pub literal_subjects: usize,
    pub non_iri_predicates: usize,
}

impl AnomalyTally {
    pub fn record(&mut self, anomaly: &ProjectionAnomaly) {
        match anomaly.kind {
            AnomalyKind::UnrecognizedTerm => self.unrecognized_terms += 1,
            AnomalyKind::LiteralSubject => self.literal_subjects += 1,
            AnomalyKind::NonIriPredicate => self.non_iri_predicates += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unrecognized_terms + self.literal_subjects + self.non_iri_predicates
    }
}
