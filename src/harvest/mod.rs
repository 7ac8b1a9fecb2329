//! Harvest module - the polling/backoff control loop and its collaborators
//!
//! This module contains:
//! - The article fetcher with retry and outcome classification
//! - The opaque HTML extraction for the source site's markup
//! - The batch scheduler driving the id cursor
//! - The liveness watchdog that reconnects a stalled store

mod fetcher;
mod parser;
mod scheduler;
mod watchdog;

pub use fetcher::{build_http_client, ArticleFetcher, Fetch, FetchOutcome};
pub use parser::{extract_article, ExtractedArticle};
pub use scheduler::BatchScheduler;
pub use watchdog::Watchdog;
