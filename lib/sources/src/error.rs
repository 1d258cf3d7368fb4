use std::path::PathBuf;

/// An error raised while setting up a [ReplayEngine](crate::ReplayEngine).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReplayError {
    #[error("Could not detect the format of {}", .0.display())]
    UnknownFormat(PathBuf),
    #[error("Unknown format name: {0}")]
    UnknownFormatName(String),
}
