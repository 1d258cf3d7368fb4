/// Raised when a textual query kind (e.g., from a command line flag) is not known.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown query kind '{0}', expected one of select, ask, construct, shacl")]
pub struct UnknownQueryKindError(pub String);
