//! Trestle: ordered-item lifecycle engine for multi-tenant boards.
//!
//! This crate implements the ordering and retention core of a task/project
//! board: dense, gap-free positions within each status column under
//! concurrent drag-and-drop moves, and a lifecycle state machine that drives
//! every item through active, archived, recycled, and purged states on
//! user-triggered and time-gated transitions.
//!
//! # Architecture
//!
//! Trestle follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`board`]: position index, move resolution, lifecycle transitions,
//!   retention sweeps, and the read-side board views

pub mod board;
