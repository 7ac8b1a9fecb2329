//! Article fetcher: one HTTP fetch per id with bounded retries
//!
//! This module performs the outbound HTTP work for the harvest loop:
//! - Building the HTTP client
//! - Fetching `{base-url}{id}` with retries on transient status codes
//! - Classifying every attempt into a typed outcome

use crate::article::Article;
use crate::config::HarvestConfig;
use crate::harvest::parser::extract_article;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

/// Result of fetching one article id
///
/// NotFound and TransientError both produce no article for batch
/// aggregation, but they are logged distinctly: NotFound is the site's
/// deliberate empty page, TransientError is a delivery failure.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The id resolved to a parseable article
    Found(Article),

    /// The site returned its canonical empty page for this id
    NotFound,

    /// The fetch failed in a way that produced no article
    TransientError(String),
}

/// Seam between the batch scheduler and the HTTP fetcher
///
/// The scheduler only needs "give me the outcome for this id"; tests drive
/// it with scripted implementations.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, id: u64) -> FetchOutcome;
}

/// Builds the HTTP client used for article fetches
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("khobor/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches article pages by id and classifies the outcome
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 503 / 429 | Retry up to `fetch-retries` times after the initial request, linear backoff |
/// | Request timeout | Retry up to `fetch-retries` times after the initial request, linear backoff |
/// | Other non-2xx | Immediate TransientError, no retry |
/// | Other network error | Immediate TransientError, no retry |
/// | 2xx slower than `slow-response-secs` | TransientError, no retry |
/// | 2xx, empty content region | NotFound |
/// | 2xx, paragraphs extracted | Found |
///
/// No shared mutable state; safe to invoke for many ids concurrently.
pub struct ArticleFetcher {
    client: Client,
    base_url: String,
    retries: u32,
    retry_backoff: Duration,
    slow_response: Duration,
}

impl ArticleFetcher {
    /// Creates a fetcher for the given source site
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to use
    /// * `base_url` - URL prefix the numeric id is appended to
    /// * `config` - Harvest configuration (retries, backoff, slow threshold)
    pub fn new(client: Client, base_url: &str, config: &HarvestConfig) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            retries: config.fetch_retries,
            retry_backoff: Duration::from_secs(config.retry_backoff_secs),
            slow_response: Duration::from_secs(config.slow_response_secs),
        }
    }

    /// Performs one classified fetch for an article id
    async fn fetch_id(&self, id: u64) -> FetchOutcome {
        let url = format!("{}{}", self.base_url, id);
        let mut attempt = 1u32;

        loop {
            let started = Instant::now();
            let result = self.client.get(&url).send().await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::SERVICE_UNAVAILABLE
                        || status == StatusCode::TOO_MANY_REQUESTS
                    {
                        // `retries` counts retries after the initial
                        // request, so the attempt budget is retries + 1
                        if attempt <= self.retries {
                            let backoff = self.retry_backoff * attempt;
                            tracing::warn!(
                                id,
                                status = status.as_u16(),
                                attempt,
                                ?backoff,
                                "retryable status, backing off"
                            );
                            tokio::time::sleep(backoff).await;
                            attempt += 1;
                            continue;
                        }
                        tracing::warn!(id, status = status.as_u16(), attempt, "retries exhausted");
                        return FetchOutcome::TransientError(format!(
                            "HTTP {} after {} attempts",
                            status.as_u16(),
                            attempt
                        ));
                    }

                    if !status.is_success() {
                        tracing::debug!(
                            id,
                            status = status.as_u16(),
                            "unexpected status, abandoning id"
                        );
                        return FetchOutcome::TransientError(format!(
                            "HTTP {}",
                            status.as_u16()
                        ));
                    }

                    let html = match response.text().await {
                        Ok(html) => html,
                        Err(e) => {
                            tracing::debug!(id, error = %e, "failed to read body");
                            return FetchOutcome::TransientError(format!(
                                "failed to read body: {}",
                                e
                            ));
                        }
                    };

                    // The round trip covers the body too: fast headers
                    // with a trickling body are just as untrustworthy as
                    // a slow server
                    let elapsed = started.elapsed();
                    if elapsed > self.slow_response {
                        tracing::warn!(id, ?elapsed, "slow response, discarding");
                        return FetchOutcome::TransientError(format!(
                            "slow response ({}ms)",
                            elapsed.as_millis()
                        ));
                    }

                    return match extract_article(&html) {
                        Some(extracted) => {
                            tracing::debug!(id, ?elapsed, "article found");
                            FetchOutcome::Found(Article {
                                id,
                                collected_at: Utc::now(),
                                source_url: url,
                                title: extracted.title,
                                published_date: extracted.published_date,
                                body: extracted.paragraphs,
                            })
                        }
                        None => {
                            tracing::debug!(id, ?elapsed, "no article at this id");
                            FetchOutcome::NotFound
                        }
                    };
                }

                Err(e) if e.is_timeout() => {
                    if attempt <= self.retries {
                        let backoff = self.retry_backoff * attempt;
                        tracing::warn!(id, attempt, ?backoff, "request timed out, backing off");
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    tracing::warn!(id, attempt, "timeout retries exhausted");
                    return FetchOutcome::TransientError(format!(
                        "timeout after {} attempts",
                        attempt
                    ));
                }

                Err(e) => {
                    tracing::debug!(id, error = %e, "request failed, abandoning id");
                    return FetchOutcome::TransientError(e.to_string());
                }
            }
        }
    }
}

#[async_trait]
impl Fetch for ArticleFetcher {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        self.fetch_id(id).await
    }
}
