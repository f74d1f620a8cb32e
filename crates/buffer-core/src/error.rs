//! Error types.

use crate::workspace::{BufferId, ViewId};
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while opening or editing a buffer.
pub enum BufferError {
    #[error("I/O error: {0}")]
    /// Reading the source stream failed.
    Io(#[from] std::io::Error),

    #[error("buffer is read-only")]
    /// An edit was attempted on a read-only buffer.
    ReadOnly,
}

#[derive(Debug, Error)]
/// Workspace-level errors.
pub enum WorkspaceError {
    #[error("view not found: {0:?}")]
    /// A view id was not found.
    ViewNotFound(ViewId),

    #[error("buffer not found: {0:?}")]
    /// A buffer id was not found.
    BufferNotFound(BufferId),

    #[error(transparent)]
    /// Opening or editing the underlying buffer failed.
    Buffer(#[from] BufferError),
}

#[derive(Debug, Error)]
/// Search errors.
pub enum SearchError {
    #[error("invalid regex: {0}")]
    /// The provided pattern failed to compile.
    InvalidRegex(#[from] regex::Error),
}
