//! Error types for board domain validation and parsing.

use super::{ItemKind, LifecycleState, Status};
use thiserror::Error;

/// Errors returned while constructing or transitioning domain board values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// A container key segment is empty or contains whitespace.
    #[error("invalid container key segment '{0}', expected a non-empty token without whitespace")]
    InvalidContainerKey(String),

    /// The status does not belong to the item's kind.
    #[error("status '{status}' does not belong to item kind '{kind}'")]
    KindMismatch {
        /// The item's kind.
        kind: ItemKind,
        /// The offending status.
        status: Status,
    },

    /// The lifecycle transition is not allowed.
    #[error("lifecycle transition from '{from}' to '{to}' is not allowed")]
    InvalidLifecycleTransition {
        /// The current lifecycle state.
        from: LifecycleState,
        /// The requested lifecycle state.
        to: LifecycleState,
    },

    /// Archiving requires a terminal status.
    #[error("only completed items can be archived, status is '{status}'")]
    ArchiveRequiresTerminalStatus {
        /// The item's non-terminal status.
        status: Status,
    },

    /// The item is already in a terminal status.
    #[error("item is already completed (status '{status}')")]
    AlreadyCompleted {
        /// The item's terminal status.
        status: Status,
    },

    /// The item is not in a terminal status.
    #[error("item is not completed (status '{status}')")]
    NotCompleted {
        /// The item's non-terminal status.
        status: Status,
    },

    /// The item does not occupy a board position.
    #[error("item is not on the board (lifecycle state '{state}')")]
    NotActive {
        /// The item's lifecycle state.
        state: LifecycleState,
    },
}

/// Error returned while parsing statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status '{status}' for item kind '{kind}'")]
pub struct ParseStatusError {
    /// The persisted kind token.
    pub kind: String,
    /// The persisted status token.
    pub status: String,
}

/// Error returned while parsing lifecycle states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown lifecycle state: {0}")]
pub struct ParseLifecycleStateError(pub String);
