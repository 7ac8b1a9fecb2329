//! Storage trait and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::article::Article;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store connection is closed")]
    Closed,

    #[error("Refusing to insert an empty batch")]
    EmptyBatch,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for the article persistence backend
///
/// The harvest loop only needs a high-water mark, a bulk insert, and a
/// reconnect hook; everything else here exists for stats and tests.
pub trait ArticleStore {
    /// Returns the highest stored article id, or None for an empty store
    fn latest_id(&self) -> StoreResult<Option<u64>>;

    /// Persists a batch of articles in one write
    ///
    /// The batch must be non-empty. Inserting an id that already exists is
    /// an idempotent upsert: the article row and its paragraphs are
    /// replaced, paragraph ordering is preserved.
    fn insert_batch(&mut self, articles: &[Article]) -> StoreResult<()>;

    /// Drops and reopens the underlying connection
    ///
    /// Idempotent; used by the liveness watchdog to recover from a
    /// half-dead connection without touching harvest progress.
    fn reconnect(&mut self) -> StoreResult<()>;

    /// Closes the underlying connection
    ///
    /// Idempotent; operations after close fail with [`StoreError::Closed`].
    fn close(&mut self) -> StoreResult<()>;

    /// Total number of stored articles
    fn count_articles(&self) -> StoreResult<u64>;

    /// Loads one article with its paragraphs in page order
    fn get_article(&self, id: u64) -> StoreResult<Option<Article>>;
}
