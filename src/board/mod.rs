//! Ordered-item lifecycle engine.
//!
//! The board module owns the two pieces of real design content in a
//! multi-tenant task/project board: a dense integer ordering per
//! `(container, status)` bucket that survives concurrent drag-and-drop
//! moves, and a retention state machine carrying each item from `active`
//! through `archived`/`recycled` to `purged`. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
