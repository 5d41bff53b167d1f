//! Store error types.

use thiserror::Error;

/// Errors surfaced by coordination-store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The auction was already claimed by another auctioneer.
    #[error("already claimed")]
    AlreadyClaimed,

    /// The record is not (or no longer) present in the store.
    #[error("not found")]
    NotFound,

    /// Lock maintenance could not be started or broke down.
    #[error("lock maintenance failed: {0}")]
    LockFailed(String),

    /// A watch stream failed on the store side.
    #[error("watch failed: {0}")]
    WatchFailed(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
