//! Status columns for tasks and projects.
//!
//! Status is the horizontal board dimension (which column a card sits in)
//! and is orthogonal to the retention lifecycle. The union is closed per
//! item kind: a task can never hold a project status and vice versa.

use super::{ParseStatusError, error::BoardDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of board item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A task card with a two-column board.
    Task,
    /// A project card with a three-column board.
    Project,
}

impl ItemKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Status column of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is open.
    Todo,
    /// Task has been completed.
    Complete,
}

/// Status column of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Project has not been started.
    Todo,
    /// Project is being worked on.
    InProgress,
    /// Project has been finished.
    Done,
}

/// Status of a board item, closed per item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Status {
    /// Task status column.
    Task(TaskStatus),
    /// Project status column.
    Project(ProjectStatus),
}

impl Status {
    /// Returns the item kind this status belongs to.
    #[must_use]
    pub const fn kind(self) -> ItemKind {
        match self {
            Self::Task(_) => ItemKind::Task,
            Self::Project(_) => ItemKind::Project,
        }
    }

    /// Returns the initial status for newly created items of `kind`.
    #[must_use]
    pub const fn initial(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Task => Self::Task(TaskStatus::Todo),
            ItemKind::Project => Self::Project(ProjectStatus::Todo),
        }
    }

    /// Returns the terminal status for items of `kind`.
    #[must_use]
    pub const fn terminal(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Task => Self::Task(TaskStatus::Complete),
            ItemKind::Project => Self::Project(ProjectStatus::Done),
        }
    }

    /// Returns whether this status marks the item as finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Task(TaskStatus::Complete) | Self::Project(ProjectStatus::Done)
        )
    }

    /// Returns the canonical storage representation of the column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task(TaskStatus::Todo) | Self::Project(ProjectStatus::Todo) => "todo",
            Self::Task(TaskStatus::Complete) => "complete",
            Self::Project(ProjectStatus::InProgress) => "in_progress",
            Self::Project(ProjectStatus::Done) => "done",
        }
    }

    /// Reconstructs a status from its persisted kind and column tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ParseStatusError`] when the tokens do not name a known
    /// kind/column combination.
    pub fn from_parts(kind: &str, status: &str) -> Result<Self, ParseStatusError> {
        let normalized_kind = kind.trim().to_ascii_lowercase();
        let normalized_status = status.trim().to_ascii_lowercase();
        let parsed = match (normalized_kind.as_str(), normalized_status.as_str()) {
            ("task", "todo") => Some(Self::Task(TaskStatus::Todo)),
            ("task", "complete") => Some(Self::Task(TaskStatus::Complete)),
            ("project", "todo") => Some(Self::Project(ProjectStatus::Todo)),
            ("project", "in_progress") => Some(Self::Project(ProjectStatus::InProgress)),
            ("project", "done") => Some(Self::Project(ProjectStatus::Done)),
            _ => None,
        };
        parsed.ok_or_else(|| ParseStatusError {
            kind: kind.to_owned(),
            status: status.to_owned(),
        })
    }

    /// Validates that this status belongs to `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::KindMismatch`] when the status belongs to
    /// another item kind.
    pub const fn ensure_kind(self, kind: ItemKind) -> Result<(), BoardDomainError> {
        match (self, kind) {
            (Self::Task(_), ItemKind::Task) | (Self::Project(_), ItemKind::Project) => Ok(()),
            _ => Err(BoardDomainError::KindMismatch { kind, status: self }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
