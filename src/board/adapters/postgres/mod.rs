//! `PostgreSQL` adapter implementations.

pub mod models;
pub mod schema;

mod repository;

pub use repository::{BoardPgPool, PostgresItemStore};
