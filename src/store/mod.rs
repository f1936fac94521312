//! Persistence layer — libSQL-backed storage for preferences, tutorials,
//! chat turns, and usage records.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, StoredTurn};
