//! SQLite persistence layer.

pub mod database;
pub mod queries;
pub mod schema;
mod store;

pub use database::{Database, DatabaseError};
pub use store::SqliteTokenStore;
