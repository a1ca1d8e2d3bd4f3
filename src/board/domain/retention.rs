//! Retention policy configuration.

use chrono::{DateTime, Duration, Utc};

/// Time thresholds for the automatic retention transitions.
///
/// The windows the source board displays as copy text are enforced here as
/// configuration: a grace period before finished items auto-archive, and the
/// age at which recycled items are purged for good. Archived items have no
/// automatic expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    archive_grace: Duration,
    purge_after: Duration,
}

impl RetentionPolicy {
    /// Creates a policy with explicit thresholds.
    #[must_use]
    pub const fn new(archive_grace: Duration, purge_after: Duration) -> Self {
        Self {
            archive_grace,
            purge_after,
        }
    }

    /// Sets the grace period between completion and auto-archival.
    #[must_use]
    pub const fn with_archive_grace(mut self, archive_grace: Duration) -> Self {
        self.archive_grace = archive_grace;
        self
    }

    /// Sets the age at which recycled items are purged.
    #[must_use]
    pub const fn with_purge_after(mut self, purge_after: Duration) -> Self {
        self.purge_after = purge_after;
        self
    }

    /// Returns the grace period between completion and auto-archival.
    #[must_use]
    pub const fn archive_grace(&self) -> Duration {
        self.archive_grace
    }

    /// Returns the age at which recycled items are purged.
    #[must_use]
    pub const fn purge_after(&self) -> Duration {
        self.purge_after
    }

    /// Returns whether an item finished at `completed_at` is due to archive.
    #[must_use]
    pub fn archive_due(&self, completed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(completed_at) >= self.archive_grace
    }

    /// Returns whether an item recycled at `deleted_at` is due to purge.
    #[must_use]
    pub fn purge_due(&self, deleted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(deleted_at) >= self.purge_after
    }
}

impl Default for RetentionPolicy {
    /// Ten days of grace before auto-archival, thirty days in the bin.
    fn default() -> Self {
        Self {
            archive_grace: Duration::days(10),
            purge_after: Duration::days(30),
        }
    }
}
