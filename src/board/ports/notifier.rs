//! Change notification port.

use crate::board::domain::ContainerKey;

/// Invalidate-and-refetch signal fired after every committed mutation.
///
/// Consumers subscribe a view layer here instead of reloading wholesale:
/// when a container is invalidated, its board views should be refetched
/// through the aggregator.
pub trait ChangeNotifier: Send + Sync {
    /// Signals that the views of `container` are stale.
    fn invalidate(&self, container: &ContainerKey);
}

/// Notifier that drops every signal, for embedders without a view layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn invalidate(&self, _container: &ContainerKey) {}
}
