use oxrdf::{BlankNode, Literal, NamedNode, Term};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An RDF term as seen by RDF Lens.
///
/// Query engines hand out terms in their own representation. These are converted into an
/// [`RdfTerm`] once, when a result row enters the pipeline. Shapes that RDF Lens does not
/// understand (e.g., quoted triples) are kept as [`RdfTerm::Unrecognized`] with their raw lexical
/// form so that they can still be displayed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RdfTerm {
    /// An IRI.
    Iri(NamedNode),
    /// A literal with an optional datatype or language tag.
    Literal(Literal),
    /// A blank node.
    BlankNode(BlankNode),
    /// A term shape that could not be interpreted.
    Unrecognized(String),
}

impl RdfTerm {
    /// Parses an N-Triples term. Input that is not a valid term becomes
    /// [`RdfTerm::Unrecognized`] instead of failing.
    pub fn parse_lenient(raw: &str) -> Self {
        match Term::from_str(raw) {
            Ok(term) => term.into(),
            Err(_) => Self::Unrecognized(raw.to_owned()),
        }
    }

    /// Returns the canonical (N-Triples) form of this term.
    ///
    /// Two terms have the same canonical form iff they denote the same RDF term. Unrecognized
    /// terms use their raw form.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Returns the lexical part of the term: the IRI, the literal value, the blank node id or the
    /// raw form.
    pub fn lexical(&self) -> &str {
        match self {
            RdfTerm::Iri(node) => node.as_str(),
            RdfTerm::Literal(literal) => literal.value(),
            RdfTerm::BlankNode(node) => node.as_str(),
            RdfTerm::Unrecognized(raw) => raw,
        }
    }

    /// Returns a short name of the term's kind.
    pub fn kind(&self) -> TermKind {
        match self {
            RdfTerm::Iri(_) => TermKind::Iri,
            RdfTerm::Literal(_) => TermKind::Literal,
            RdfTerm::BlankNode(_) => TermKind::BlankNode,
            RdfTerm::Unrecognized(_) => TermKind::Unrecognized,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, RdfTerm::Iri(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, RdfTerm::Literal(_))
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, RdfTerm::Unrecognized(_))
    }
}

impl Display for RdfTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RdfTerm::Iri(node) => node.fmt(f),
            RdfTerm::Literal(literal) => literal.fmt(f),
            RdfTerm::BlankNode(node) => node.fmt(f),
            RdfTerm::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl From<Term> for RdfTerm {
    #[inline]
    fn from(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => Self::Iri(node),
            Term::BlankNode(node) => Self::BlankNode(node),
            Term::Literal(literal) => Self::Literal(literal),
            #[allow(
                unreachable_patterns,
                reason = "Quoted triples only exist with oxrdf's rdf-star feature"
            )]
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<NamedNode> for RdfTerm {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::Iri(node)
    }
}

impl From<Literal> for RdfTerm {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<BlankNode> for RdfTerm {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

/// The kind of an [`RdfTerm`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermKind {
    Iri,
    Literal,
    BlankNode,
    Unrecognized,
}

impl TermKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TermKind::Iri => "iri",
            TermKind::Literal => "literal",
            TermKind::BlankNode => "blank-node",
            TermKind::Unrecognized => "unrecognized",
        }
    }
}

impl Display for TermKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
