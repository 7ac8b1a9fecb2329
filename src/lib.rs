//! Khobor: an incremental news archive harvester
//!
//! This crate harvests sequentially-numbered articles from a single news
//! site, persists them to a local SQLite document store, and resumes from
//! the highest stored id across restarts.

pub mod article;
pub mod config;
pub mod harvest;
pub mod status;
pub mod storage;

use thiserror::Error;

/// Main error type for khobor operations
#[derive(Debug, Error)]
pub enum KhoborError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for khobor operations
pub type Result<T> = std::result::Result<T, KhoborError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use article::Article;
pub use config::Config;
pub use harvest::{ArticleFetcher, BatchScheduler, Fetch, FetchOutcome, Watchdog};
pub use status::ScrapeProgress;
pub use storage::{ArticleStore, SqliteStore};
