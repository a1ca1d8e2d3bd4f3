//! Board item aggregate root.

use super::{BoardDomainError, BucketKey, ContainerKey, ItemId, ItemKind, LifecycleState, Status};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A task or project card on a board.
///
/// The aggregate is the sole writer of its lifecycle fields
/// (`lifecycle_state`, `completed_at`, `archived_at`, `deleted_at`);
/// positions are written exclusively by the position index through the
/// crate-private setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    container: ContainerKey,
    title: String,
    status: Status,
    position: Option<u32>,
    lifecycle_state: LifecycleState,
    completed_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedItemData {
    /// Persisted item identifier.
    pub id: ItemId,
    /// Persisted container key.
    pub container: ContainerKey,
    /// Persisted title.
    pub title: String,
    /// Persisted status column.
    pub status: Status,
    /// Persisted bucket slot, present only for active items.
    pub position: Option<u32>,
    /// Persisted lifecycle state.
    pub lifecycle_state: LifecycleState,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted archival timestamp.
    pub archived_at: Option<DateTime<Utc>>,
    /// Persisted recycle timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates a new item in the initial status column of its kind.
    ///
    /// The item starts without a bucket slot; the position index assigns one
    /// when the item is inserted into its board.
    #[must_use]
    pub fn new(
        container: ContainerKey,
        kind: ItemKind,
        title: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ItemId::new(),
            container,
            title: title.into(),
            status: Status::initial(kind),
            position: None,
            lifecycle_state: LifecycleState::Active,
            completed_at: None,
            archived_at: None,
            deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an item from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedItemData) -> Self {
        Self {
            id: data.id,
            container: data.container,
            title: data.title,
            status: data.status,
            position: data.position,
            lifecycle_state: data.lifecycle_state,
            completed_at: data.completed_at,
            archived_at: data.archived_at,
            deleted_at: data.deleted_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the container key.
    #[must_use]
    pub const fn container(&self) -> &ContainerKey {
        &self.container
    }

    /// Returns the item title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the item kind.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.status.kind()
    }

    /// Returns the status column.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the bucket slot, present only while the item is active.
    #[must_use]
    pub const fn position(&self) -> Option<u32> {
        self.position
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle_state
    }

    /// Returns the completion timestamp, if the item is in a terminal column.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the archival timestamp, if the item is archived.
    #[must_use]
    pub const fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    /// Returns the recycle timestamp, if the item is in the bin.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the bucket this item orders within.
    #[must_use]
    pub fn bucket(&self) -> BucketKey {
        BucketKey::new(self.container.clone(), self.status)
    }

    /// Returns whether the item currently occupies a board slot.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.lifecycle_state, LifecycleState::Active)
    }

    /// Renames the item.
    pub fn rename(&mut self, title: impl Into<String>, clock: &impl Clock) {
        self.title = title.into();
        self.touch(clock);
    }

    /// Moves the item to a different status column of the same kind.
    ///
    /// Entering a terminal column stamps `completed_at` when unset; leaving
    /// one clears it, so retention countdowns track what the board shows.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::KindMismatch`] when the target column
    /// belongs to another item kind.
    pub(crate) fn set_status(
        &mut self,
        status: Status,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        status.ensure_kind(self.kind())?;
        let was_terminal = self.status.is_terminal();
        self.status = status;
        if status.is_terminal() {
            if self.completed_at.is_none() {
                self.completed_at = Some(clock.utc());
            }
        } else if was_terminal {
            self.completed_at = None;
        }
        self.touch(clock);
        Ok(())
    }

    /// Marks the item as finished, moving it to the terminal column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::AlreadyCompleted`] when the item is
    /// already in a terminal column, or [`BoardDomainError::NotActive`] when
    /// it is not on the board.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), BoardDomainError> {
        self.ensure_active()?;
        if self.status.is_terminal() {
            return Err(BoardDomainError::AlreadyCompleted {
                status: self.status,
            });
        }
        self.set_status(Status::terminal(self.kind()), clock)
    }

    /// Reopens a finished item, moving it back to the initial column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::NotCompleted`] when the item is not in a
    /// terminal column, or [`BoardDomainError::NotActive`] when it is not on
    /// the board.
    pub fn reopen(&mut self, clock: &impl Clock) -> Result<(), BoardDomainError> {
        self.ensure_active()?;
        if !self.status.is_terminal() {
            return Err(BoardDomainError::NotCompleted {
                status: self.status,
            });
        }
        self.set_status(Status::initial(self.kind()), clock)
    }

    /// Archives the item, taking it off the board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::ArchiveRequiresTerminalStatus`] when the
    /// item is not finished, or
    /// [`BoardDomainError::InvalidLifecycleTransition`] when the item is not
    /// active.
    pub fn archive(&mut self, clock: &impl Clock) -> Result<(), BoardDomainError> {
        if !self.status.is_terminal() {
            return Err(BoardDomainError::ArchiveRequiresTerminalStatus {
                status: self.status,
            });
        }
        self.transition_to(LifecycleState::Archived)?;
        self.archived_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    /// Moves the item to the recycle bin, regardless of its status column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidLifecycleTransition`] when the
    /// item is already recycled or purged.
    pub fn recycle(&mut self, clock: &impl Clock) -> Result<(), BoardDomainError> {
        self.transition_to(LifecycleState::Recycled)?;
        // deleted_at takes over the retention countdown from archived_at.
        self.archived_at = None;
        self.deleted_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    /// Restores an archived or recycled item to the board.
    ///
    /// Clears the timestamp of the state the item came from; the position
    /// index appends the restored item at the end of its status bucket.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidLifecycleTransition`] when the
    /// item is already active or has been purged.
    pub fn restore(&mut self, clock: &impl Clock) -> Result<(), BoardDomainError> {
        self.transition_to(LifecycleState::Active)?;
        self.archived_at = None;
        self.deleted_at = None;
        self.touch(clock);
        Ok(())
    }

    /// Validates that the item may be physically purged.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidLifecycleTransition`] unless the
    /// item sits in the recycle bin.
    pub const fn ensure_can_purge(&self) -> Result<(), BoardDomainError> {
        if self.lifecycle_state.can_transition_to(LifecycleState::Purged) {
            return Ok(());
        }
        Err(BoardDomainError::InvalidLifecycleTransition {
            from: self.lifecycle_state,
            to: LifecycleState::Purged,
        })
    }

    /// Assigns the bucket slot. Position index use only.
    pub(crate) fn assign_position(&mut self, position: u32) {
        self.position = Some(position);
    }

    /// Clears the bucket slot. Position index use only.
    pub(crate) fn clear_position(&mut self) {
        self.position = None;
    }

    const fn ensure_active(&self) -> Result<(), BoardDomainError> {
        if self.is_active() {
            return Ok(());
        }
        Err(BoardDomainError::NotActive {
            state: self.lifecycle_state,
        })
    }

    fn transition_to(&mut self, target_state: LifecycleState) -> Result<(), BoardDomainError> {
        if !self.lifecycle_state.can_transition_to(target_state) {
            return Err(BoardDomainError::InvalidLifecycleTransition {
                from: self.lifecycle_state,
                to: target_state,
            });
        }
        self.lifecycle_state = target_state;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
