//! Orchestration services for the board engine.

mod aggregator;
mod error;
mod lifecycle;
mod position;
mod resolver;
mod retention;

pub use aggregator::{ArchiveWindow, BoardAggregator};
pub use error::{BoardError, BoardResult};
pub use lifecycle::{BulkOutcome, LifecycleService};
pub use position::PositionIndex;
pub use resolver::{DropTarget, MoveOutcome, MoveResolver};
pub use retention::{RetentionSweeper, SweepReport};
