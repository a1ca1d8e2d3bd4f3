//! Port contracts for the board engine.

mod notifier;
mod store;

pub use notifier::{ChangeNotifier, NullNotifier};
pub use store::{BucketSnapshot, ChangeSet, ItemStore, ItemStoreError, ItemStoreResult};
