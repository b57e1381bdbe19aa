use std::io;
use std::path::PathBuf;

use doc_xref_parser::ParseError;
use thiserror::Error;

use crate::identity::PageId;

/// Errors that abort an operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("content root {} is unavailable: {source}", .root.display())]
    CorpusUnavailable { root: PathBuf, source: io::Error },

    #[error(
        "page identity '{identity}' is produced by both {} and {}",
        .first.display(),
        .second.display()
    )]
    IdentityCollision {
        identity: PageId,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("i/o error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidInput(String),
}

/// A single file that could not be parsed. Recorded in the report; never
/// aborts the run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}: {source}", .path.display())]
pub struct MalformedDocument {
    /// File path relative to the content root.
    pub path: PathBuf,
    pub source: ParseError,
}
