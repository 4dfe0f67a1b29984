//! Error types for queue operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the queue store and its operations.
///
/// Control operations report `NotFound` / `DuplicateId` / `InvalidState` /
/// `Conflict` to the invoking command as a non-fatal failure. `Corrupt` and
/// `FileMissing` are only produced by the strict read path used by the
/// display side; the writer-side load recovers from both transparently.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Referenced order id absent, or no order matched a default selection.
    #[error("order not found: {}", .id.as_deref().unwrap_or("no matching order in the queue"))]
    NotFound { id: Option<String> },

    /// Explicit or generated id already present in the queue.
    #[error("order id already exists: {id}")]
    DuplicateId { id: String },

    /// Explicit status precondition on removal not met.
    #[error("order {id} is not in status {expected}")]
    InvalidState { id: String, expected: String },

    /// Persisted file unparseable or structurally malformed.
    #[error("queue file is corrupt: {reason}")]
    Corrupt { reason: String },

    /// Queue file does not exist yet.
    #[error("queue file not found: {}", .path.display())]
    FileMissing { path: PathBuf },

    /// Another writer saved between our load and our save.
    #[error("queue file was modified concurrently (loaded generation {loaded}, on disk {on_disk})")]
    Conflict { loaded: u64, on_disk: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueueError {
    /// `NotFound` for a by-id lookup.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: Some(id.into()) }
    }

    /// `NotFound` for a no-id default selection with no candidate.
    pub fn no_candidate() -> Self {
        Self::NotFound { id: None }
    }
}

pub type QueueResult<T> = Result<T, QueueError>;
