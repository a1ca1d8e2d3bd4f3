//! Service-level errors for the board engine.

use crate::board::domain::{BoardDomainError, BucketKey, ItemId};
use crate::board::ports::ItemStoreError;
use thiserror::Error;

/// Result type for board engine operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors surfaced by the board engine services.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Domain validation or guard failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] ItemStoreError),

    /// The referenced item does not exist or was purged concurrently.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// A computed bucket ordering failed the density check.
    ///
    /// Indicates a bug in the engine, never expected in normal operation;
    /// the offending write is rolled back and nothing is committed.
    #[error("bucket {bucket} failed the density check: {detail}")]
    InvariantViolation {
        /// The bucket whose ordering was inconsistent.
        bucket: BucketKey,
        /// What the check found.
        detail: String,
    },

    /// A bucket stayed contended through every retry.
    #[error("bucket {0} was modified concurrently, retries exhausted")]
    ConcurrentModification(BucketKey),
}
