//! Identifier and validated key types for the board domain.

use super::{BoardDomainError, Status};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a board item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Creates a new random item identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an item identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for ItemId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated tenant/category composite identifying one board.
///
/// Positions are ordered per container and status column; two containers
/// never contend for the same bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerKey {
    tenant: String,
    category: String,
}

impl ContainerKey {
    /// Creates a validated container key.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidContainerKey`] when either segment
    /// is empty after trimming or contains whitespace.
    pub fn new(
        tenant: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, BoardDomainError> {
        let tenant_segment = validate_segment(tenant.into())?;
        let category_segment = validate_segment(category.into())?;
        Ok(Self {
            tenant: tenant_segment,
            category: category_segment,
        })
    }

    /// Returns the tenant segment.
    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Returns the board category segment.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.category)
    }
}

fn validate_segment(raw: String) -> Result<String, BoardDomainError> {
    let normalized = raw.trim();
    if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
        return Err(BoardDomainError::InvalidContainerKey(raw));
    }
    Ok(normalized.to_owned())
}

/// One `(container, status)` bucket, the unit of position ordering.
///
/// Positions are dense and unique within a bucket; serialization of
/// concurrent writes is also scoped to this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    container: ContainerKey,
    status: Status,
}

impl BucketKey {
    /// Creates a bucket key from its parts.
    #[must_use]
    pub const fn new(container: ContainerKey, status: Status) -> Self {
        Self { container, status }
    }

    /// Returns the container segment of the key.
    #[must_use]
    pub const fn container(&self) -> &ContainerKey {
        &self.container
    }

    /// Returns the status column segment of the key.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container, self.status)
    }
}
