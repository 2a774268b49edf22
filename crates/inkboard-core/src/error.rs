//! Engine error types.

use crate::operation::Path;
use thiserror::Error;

/// Errors raised while mutating or querying a board.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("No node at path {0:?}")]
    PathNotFound(Path),
    #[error("Invalid path {0:?}")]
    InvalidPath(Path),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Board is read-only")]
    ReadOnly,
    #[error("Invalid patch for node at {path:?}: {source}")]
    InvalidPatch {
        path: Path,
        #[source]
        source: serde_json::Error,
    },
    #[error("Element {child} cannot be nested in frame {frame}")]
    InvalidNesting { frame: String, child: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;
