//! Database access: users, admins, the book catalog, and usage counters

pub mod catalog;
pub mod db;
pub mod migrations;
pub mod stats;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
