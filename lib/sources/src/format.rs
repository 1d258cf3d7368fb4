use crate::error::ReplayError;
use oxrdfio::RdfFormat;
use sparesults::QueryResultsFormat;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

/// The serialization of a replayed document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayFormat {
    /// A SPARQL query results document.
    Results(QueryResultsFormat),
    /// An RDF document whose triples are replayed as rows.
    Rdf(RdfFormat),
}

impl ReplayFormat {
    /// Detects the format from the file extension of `path`.
    ///
    /// Query result formats take precedence, so `.xml` is read as SPARQL XML results.
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| ReplayError::UnknownFormat(path.to_owned()))
    }

    /// Looks up a format by its canonical file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        QueryResultsFormat::from_extension(&extension)
            .map(Self::Results)
            .or_else(|| RdfFormat::from_extension(&extension).map(Self::Rdf))
    }

    /// Whether the document holds a graph, as opposed to solutions or a boolean.
    pub fn is_graph(self) -> bool {
        matches!(self, ReplayFormat::Rdf(_))
    }

    pub fn name(self) -> &'static str {
        match self {
            ReplayFormat::Results(format) => format.name(),
            ReplayFormat::Rdf(format) => format.name(),
        }
    }
}

impl FromStr for ReplayFormat {
    type Err = ReplayError;

    /// Accepts file extensions (`srj`, `ttl`) as well as media types.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_extension(name)
            .or_else(|| QueryResultsFormat::from_media_type(name).map(Self::Results))
            .or_else(|| RdfFormat::from_media_type(name).map(Self::Rdf))
            .ok_or_else(|| ReplayError::UnknownFormatName(name.to_owned()))
    }
}

impl Display for ReplayFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
