//! Retention lifecycle state machine.

use super::ParseLifecycleStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Retention lifecycle state of a board item.
///
/// Orthogonal to the status column: an item can be `complete` and still
/// `active`. Transitions are forward-monotonic except `restore`, which
/// returns archived or recycled items to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Item occupies a slot in its status bucket.
    Active,
    /// Item has been archived and left the board.
    Archived,
    /// Item sits in the recycle bin awaiting restore or purge.
    Recycled,
    /// Item has been physically deleted.
    Purged,
}

impl LifecycleState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Recycled => "recycled",
            Self::Purged => "purged",
        }
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// `Purged` is absorbing: no transition leaves it. Archived items are
    /// never purged directly; they pass through the recycle bin first.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Archived | Self::Recycled)
                | (Self::Archived, Self::Active | Self::Recycled)
                | (Self::Recycled, Self::Active | Self::Purged)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LifecycleState {
    type Error = ParseLifecycleStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            "recycled" => Ok(Self::Recycled),
            "purged" => Ok(Self::Purged),
            _ => Err(ParseLifecycleStateError(value.to_owned())),
        }
    }
}
