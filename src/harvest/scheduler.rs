//! Batch scheduler - the harvest control loop
//!
//! This module drives the sliding id window:
//! - Fans out one batch of concurrent fetches and joins on all of them
//! - Classifies the batch as productive or empty
//! - Advances the cursor only after a productive batch
//! - Enforces the empty-streak long sleep and the absolute empty ceiling
//! - Arms the liveness watchdog around every iteration

use crate::config::HarvestConfig;
use crate::harvest::fetcher::{Fetch, FetchOutcome};
use crate::harvest::watchdog::Watchdog;
use crate::status::ScrapeProgress;
use crate::storage::ArticleStore;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// The harvest control loop
///
/// Owns the cursor and both empty counters exclusively; they are only
/// updated after a full batch join, never mid-batch. The watchdog and the
/// status server observe progress through their own channels and never
/// touch this state.
pub struct BatchScheduler<F, S> {
    config: HarvestConfig,
    fetcher: F,
    store: Arc<Mutex<S>>,
    progress: Arc<ScrapeProgress>,
    watchdog: Watchdog,
    shutdown: watch::Receiver<bool>,

    /// Next id to begin a batch from
    cursor: u64,

    /// Consecutive empty batches since the last long sleep or success
    empty_streak: u32,

    /// Consecutive empty batches since the last success; long sleeps do
    /// not reset this one, so the ceiling can actually be reached
    consecutive_empty: u32,
}

impl<F, S> BatchScheduler<F, S>
where
    F: Fetch,
    S: ArticleStore,
{
    /// Creates a scheduler; the cursor is initialized from the store when
    /// [`run`](Self::run) starts
    pub fn new(
        config: HarvestConfig,
        fetcher: F,
        store: Arc<Mutex<S>>,
        progress: Arc<ScrapeProgress>,
        watchdog: Watchdog,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
            progress,
            watchdog,
            shutdown,
            cursor: 0,
            empty_streak: 0,
            consecutive_empty: 0,
        }
    }

    /// Next id the scheduler will attempt
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Runs the harvest loop until the empty ceiling is reached or a
    /// shutdown is signalled
    ///
    /// Per iteration:
    /// 1. Arm the watchdog and fan out `concurrency` fetches over
    ///    `[cursor, cursor + concurrency)`, joining on all of them
    /// 2. Zero found: keep the cursor, bump both empty counters, and take
    ///    the long sleep once the streak crosses its threshold
    /// 3. Some found: one batch write, advance the cursor by exactly
    ///    `concurrency` (unfound ids in the window are never revisited)
    ///
    /// A failed batch write is logged and dropped; the loop continues.
    pub async fn run(&mut self) -> crate::Result<()> {
        let latest = self.store.lock().unwrap().latest_id()?;
        self.cursor = match latest {
            Some(id) => id + 1,
            None => self.config.start_id,
        };
        self.progress.set_cursor(self.cursor);
        tracing::info!(cursor = self.cursor, "starting harvest loop");

        loop {
            if *self.shutdown.borrow() {
                tracing::info!("shutdown requested, stopping harvest loop");
                break;
            }

            if self.consecutive_empty >= self.config.empty_ceiling {
                tracing::info!(
                    empty_batches = self.consecutive_empty,
                    cursor = self.cursor,
                    "empty-batch ceiling reached, treating source as exhausted"
                );
                break;
            }

            self.watchdog.arm();
            let window_end = self.cursor + self.config.concurrency;
            let started = Instant::now();

            let batch = join_all((self.cursor..window_end).map(|id| self.fetcher.fetch(id)));
            let outcomes = tokio::select! {
                outcomes = batch => Some(outcomes),
                _ = self.shutdown.changed() => None,
            };
            let Some(outcomes) = outcomes else {
                tracing::info!("shutdown requested, abandoning in-flight batch");
                break;
            };

            let mut found = Vec::new();
            let mut not_found = 0u64;
            let mut transient = 0u64;
            for outcome in outcomes {
                match outcome {
                    FetchOutcome::Found(article) => found.push(article),
                    FetchOutcome::NotFound => not_found += 1,
                    FetchOutcome::TransientError(_) => transient += 1,
                }
            }

            if found.is_empty() {
                self.empty_streak += 1;
                self.consecutive_empty += 1;
                self.watchdog.disarm();
                self.progress.record_batch(self.cursor);
                tracing::info!(
                    cursor = self.cursor,
                    not_found,
                    transient,
                    streak = self.empty_streak,
                    "batch produced no articles, will retry the same window"
                );

                if self.empty_streak >= self.config.empty_streak_threshold {
                    let pause = Duration::from_secs(self.config.long_sleep_secs);
                    tracing::info!(
                        pause_secs = pause.as_secs(),
                        "empty streak threshold reached, pausing"
                    );
                    let interrupted = tokio::select! {
                        _ = tokio::time::sleep(pause) => false,
                        _ = self.shutdown.changed() => true,
                    };
                    if interrupted {
                        tracing::info!("shutdown requested during pause");
                        break;
                    }
                    self.empty_streak = 0;
                }
                continue;
            }

            self.empty_streak = 0;
            self.consecutive_empty = 0;

            let batch_size = found.len();
            let insert = self.store.lock().unwrap().insert_batch(&found);
            match insert {
                Ok(()) => self.progress.add_articles(batch_size as u64),
                Err(e) => {
                    // Accepted best-effort gap: the batch is dropped and
                    // the loop carries on
                    tracing::error!(
                        error = %e,
                        window_start = self.cursor,
                        window_end,
                        dropped = batch_size,
                        "batch insert failed, articles dropped"
                    );
                }
            }

            // Ids in this window that were NotFound or TransientError are
            // permanently skipped from here on
            self.cursor = window_end;
            self.watchdog.disarm();
            self.progress.record_batch(self.cursor);
            tracing::info!(
                inserted = batch_size,
                not_found,
                transient,
                cursor = self.cursor,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "batch complete"
            );
        }

        self.watchdog.disarm();
        Ok(())
    }
}
