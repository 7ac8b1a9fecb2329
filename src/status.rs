//! Inbound status endpoints
//!
//! A thin liveness/progress surface for external callers:
//! - `GET /` answers with a liveness line and current progress
//! - `GET /results` answers with a fixed pointer to the console logs
//!
//! The scheduler publishes progress through [`ScrapeProgress`] atomics;
//! the handlers only ever read.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Progress counters shared between the scheduler and the status routes
#[derive(Debug, Default)]
pub struct ScrapeProgress {
    cursor: AtomicU64,
    articles: AtomicU64,
    batches: AtomicU64,
}

impl ScrapeProgress {
    /// Publishes the cursor without counting a batch (startup)
    pub fn set_cursor(&self, cursor: u64) {
        self.cursor.store(cursor, Ordering::Relaxed);
    }

    /// Records a completed batch iteration and the cursor after it
    pub fn record_batch(&self, cursor: u64) {
        self.cursor.store(cursor, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Records successfully persisted articles
    pub fn add_articles(&self, count: u64) {
        self.articles.fetch_add(count, Ordering::Relaxed);
    }

    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn articles(&self) -> u64 {
        self.articles.load(Ordering::Relaxed)
    }

    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }
}

#[derive(Serialize)]
struct ResultsResponse {
    message: &'static str,
}

/// Builds the status router
pub fn create_router(progress: Arc<ScrapeProgress>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/results", get(results))
        .with_state(progress)
}

async fn liveness(State(progress): State<Arc<ScrapeProgress>>) -> String {
    format!(
        "Scraper is running and alive! cursor={} articles={} batches={}",
        progress.cursor(),
        progress.articles(),
        progress.batches()
    )
}

async fn results() -> Json<ResultsResponse> {
    Json(ResultsResponse {
        message: "Scraping in progress. Check console logs for updates.",
    })
}

/// Serves the status endpoints until shutdown is signalled
///
/// # Arguments
///
/// * `port` - Listen port
/// * `progress` - Shared progress counters
/// * `shutdown` - Watch flag that drains the server when it flips
pub async fn serve(
    port: u16,
    progress: Arc<ScrapeProgress>,
    mut shutdown: watch::Receiver<bool>,
) -> crate::Result<()> {
    let app = create_router(progress);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "status server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;

    Ok(())
}
