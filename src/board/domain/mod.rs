//! Domain model for the ordered-item lifecycle engine.
//!
//! The board domain models dense bucket ordering, the closed status union
//! for tasks and projects, and the retention lifecycle state machine while
//! keeping all infrastructure concerns outside of the domain boundary.

mod error;
mod ids;
mod item;
mod lifecycle;
mod retention;
mod status;

pub use error::{BoardDomainError, ParseLifecycleStateError, ParseStatusError};
pub use ids::{BucketKey, ContainerKey, ItemId};
pub use item::{Item, PersistedItemData};
pub use lifecycle::LifecycleState;
pub use retention::RetentionPolicy;
pub use status::{ItemKind, ProjectStatus, Status, TaskStatus};
