//! Storage adapters backing the board's ports.

pub mod memory;
pub mod postgres;
