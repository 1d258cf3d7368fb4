use crate::UnknownQueryKindError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// The kind of a submitted query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// A SPARQL `SELECT` query.
    Select,
    /// A SPARQL `ASK` query.
    Ask,
    /// A SPARQL `CONSTRUCT` or `DESCRIBE` query.
    Construct,
    /// A SHACL validation of the data graph against a shapes graph.
    ShaclValidate,
}

impl QueryKind {
    /// Detects the kind of a SPARQL query from its query form keyword.
    ///
    /// Comments and `PREFIX`/`BASE` declarations in front of the query form are skipped. Returns
    /// [None] if no query form is found, e.g., for a shapes graph or an update.
    pub fn detect(text: &str) -> Option<Self> {
        let mut tokens = Tokens::new(text);
        loop {
            let token = tokens.next()?;
            if token.eq_ignore_ascii_case("PREFIX") {
                tokens.next()?;
                tokens.next()?;
            } else if token.eq_ignore_ascii_case("BASE") {
                tokens.next()?;
            } else if token.eq_ignore_ascii_case("SELECT") {
                return Some(Self::Select);
            } else if token.eq_ignore_ascii_case("ASK") {
                return Some(Self::Ask);
            } else if token.eq_ignore_ascii_case("CONSTRUCT")
                || token.eq_ignore_ascii_case("DESCRIBE")
            {
                return Some(Self::Construct);
            } else {
                return None;
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Select => "select",
            QueryKind::Ask => "ask",
            QueryKind::Construct => "construct",
            QueryKind::ShaclValidate => "shacl",
        }
    }
}

impl Display for QueryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = UnknownQueryKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(Self::Select),
            "ask" => Ok(Self::Ask),
            "construct" | "describe" => Ok(Self::Construct),
            "shacl" | "shacl-validate" => Ok(Self::ShaclValidate),
            _ => Err(UnknownQueryKindError(s.to_owned())),
        }
    }
}

/// A query submitted by the user.
///
/// A [`Query`] is configured once, before it is submitted, and is immutable afterward. Cloning is
/// cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    text: Arc<str>,
    kind: QueryKind,
    limit: Option<usize>,
    timeout: Option<Duration>,
}

impl Query {
    /// Creates a new query of the given `kind`.
    pub fn new(text: impl Into<Arc<str>>, kind: QueryKind) -> Self {
        Self {
            text: text.into(),
            kind,
            limit: None,
            timeout: None,
        }
    }

    /// Creates a new SPARQL query whose kind is detected from `text`.
    pub fn sparql(text: impl Into<Arc<str>>) -> Option<Self> {
        let text = text.into();
        let kind = QueryKind::detect(&text)?;
        Some(Self::new(text, kind))
    }

    /// Limits the number of rows consumed from the engine.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets an overall time budget for the execution of the query.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Splits query text into whitespace-separated tokens, skipping comments. IRIs (`<...>`) are
/// always a token of their own, even if they contain `#` or are not preceded by whitespace.
struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            self.rest = self.rest.trim_start();
            if self.rest.starts_with('#') {
                let end = self.rest.find('\n').unwrap_or(self.rest.len());
                self.rest = &self.rest[end..];
                continue;
            }
            break;
        }

        if self.rest.is_empty() {
            return None;
        }

        let end = if self.rest.starts_with('<') {
            self.rest.find('>').map_or(self.rest.len(), |i| i + 1)
        } else {
            self.rest
                .find(|c: char| c.is_whitespace() || c == '<' || c == '#' || c == '{')
                .unwrap_or(self.rest.len())
                .max(1)
        };
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_plain_forms() {
        assert_eq!(
            QueryKind::detect("SELECT * WHERE { ?s ?p ?o }"),
            Some(QueryKind::Select)
        );
        assert_eq!(QueryKind::detect("ask {}"), Some(QueryKind::Ask));
        assert_eq!(
            QueryKind::detect("CONSTRUCT WHERE { ?s ?p ?o }"),
            Some(QueryKind::Construct)
        );
        assert_eq!(
            QueryKind::detect("DESCRIBE <http://example.com/A>"),
            Some(QueryKind::Construct)
        );
    }

    #[test]
    fn detect_skips_prologue_and_comments() {
        let query = "# find friends\n\
            PREFIX ex: <http://example.com/#>\n\
            BASE <http://example.com/>\n\
            PREFIX foaf:<http://xmlns.com/foaf/0.1/>\n\
            # SELECT in a comment\n\
            select ?a ?b { ?a foaf:knows ?b }";
        assert_eq!(QueryKind::detect(query), Some(QueryKind::Select));
    }

    #[test]
    fn detect_rejects_non_queries() {
        assert_eq!(QueryKind::detect(""), None);
        assert_eq!(QueryKind::detect("INSERT DATA {}"), None);
        assert_eq!(QueryKind::detect("PREFIX ex:"), None);
        assert_eq!(
            QueryKind::detect("@prefix sh: <http://www.w3.org/ns/shacl#> ."),
            None
        );
    }

    #[test]
    fn query_kind_from_str() {
        assert_eq!("SHACL".parse(), Ok(QueryKind::ShaclValidate));
        assert_eq!("describe".parse(), Ok(QueryKind::Construct));
        assert!("update".parse::<QueryKind>().is_err());
    }

    #[test]
    fn query_builder() {
        let query = Query::sparql("SELECT * {}")
            .map(|q| q.with_limit(10).with_timeout(Duration::from_secs(1)));
        let Some(query) = query else {
            panic!("Expected a query");
        };
        assert_eq!(query.kind(), QueryKind::Select);
        assert_eq!(query.limit(), Some(10));
        assert_eq!(query.timeout(), Some(Duration::from_secs(1)));
    }
}
