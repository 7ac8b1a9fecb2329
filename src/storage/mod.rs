//! Storage module for persisting harvested articles
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Batch article persistence with idempotent upserts
//! - High-water-mark lookup for resumption
//! - Connection reconnect/close for the liveness watchdog and shutdown

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{ArticleStore, StoreError, StoreResult};
