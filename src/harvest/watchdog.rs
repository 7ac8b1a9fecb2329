//! Liveness watchdog for the store connection
//!
//! A batch that hangs past the configured threshold usually means the
//! store connection is half-dead. The watchdog runs on its own task,
//! derives its deadline purely from a monotonic arming instant (never from
//! counting ticks), and its only permitted action is a store reconnect.
//! Harvest progress (cursor, streak counters) lives in the scheduler and
//! is never touched from here.

use crate::storage::ArticleStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle to the spawned watchdog task
///
/// The scheduler arms the watchdog at the start of every batch iteration
/// and disarms it at the end (and across the long sleep, which is a
/// deliberate pause, not a stall). Dropping the handle ends the task.
pub struct Watchdog {
    tx: watch::Sender<Option<Instant>>,
    _task: JoinHandle<()>,
}

impl Watchdog {
    /// Spawns the watchdog task
    ///
    /// # Arguments
    ///
    /// * `store` - The store to reconnect when the deadline passes
    /// * `threshold` - Elapsed time without a rearm that triggers reconnect
    pub fn spawn<S>(store: Arc<Mutex<S>>, threshold: Duration) -> Self
    where
        S: ArticleStore + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(store, threshold, rx));
        Self { tx, _task: task }
    }

    /// Starts (or restarts) the threshold window from now
    pub fn arm(&self) {
        let _ = self.tx.send(Some(Instant::now()));
    }

    /// Stops the watchdog until the next arm
    pub fn disarm(&self) {
        let _ = self.tx.send(None);
    }
}

/// Watchdog task body
async fn run<S>(
    store: Arc<Mutex<S>>,
    threshold: Duration,
    mut rx: watch::Receiver<Option<Instant>>,
) where
    S: ArticleStore + Send + 'static,
{
    let mut armed: Option<Instant> = *rx.borrow();

    loop {
        match armed {
            None => match rx.changed().await {
                Ok(()) => armed = *rx.borrow(),
                // Handle dropped, harvest is over
                Err(_) => break,
            },
            Some(since) => {
                let deadline = since + threshold;
                tokio::select! {
                    changed = rx.changed() => match changed {
                        Ok(()) => armed = *rx.borrow(),
                        Err(_) => break,
                    },
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::warn!(
                            threshold_secs = threshold.as_secs(),
                            "no batch completed within the watchdog window, reconnecting store"
                        );
                        let result = store.lock().unwrap().reconnect();
                        match result {
                            Ok(()) => tracing::info!("store reconnected"),
                            Err(e) => tracing::error!(error = %e, "store reconnect failed"),
                        }
                        // Start a fresh window so the reconnect fires at
                        // most once per threshold
                        armed = Some(Instant::now());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;
    use crate::storage::{StoreError, StoreResult};

    /// Store stub that counts reconnects
    #[derive(Default)]
    struct ReconnectSpy {
        reconnects: u32,
    }

    impl ArticleStore for ReconnectSpy {
        fn latest_id(&self) -> StoreResult<Option<u64>> {
            Ok(None)
        }

        fn insert_batch(&mut self, articles: &[Article]) -> StoreResult<()> {
            if articles.is_empty() {
                return Err(StoreError::EmptyBatch);
            }
            Ok(())
        }

        fn reconnect(&mut self) -> StoreResult<()> {
            self.reconnects += 1;
            Ok(())
        }

        fn close(&mut self) -> StoreResult<()> {
            Ok(())
        }

        fn count_articles(&self) -> StoreResult<u64> {
            Ok(0)
        }

        fn get_article(&self, _id: u64) -> StoreResult<Option<Article>> {
            Ok(None)
        }
    }

    fn reconnects(store: &Arc<Mutex<ReconnectSpy>>) -> u32 {
        store.lock().unwrap().reconnects
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_threshold() {
        let store = Arc::new(Mutex::new(ReconnectSpy::default()));
        let watchdog = Watchdog::spawn(store.clone(), Duration::from_secs(25));

        watchdog.arm();
        tokio::time::sleep(Duration::from_secs(26)).await;

        assert_eq!(reconnects(&store), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_defers_firing() {
        let store = Arc::new(Mutex::new(ReconnectSpy::default()));
        let watchdog = Watchdog::spawn(store.clone(), Duration::from_secs(25));

        watchdog.arm();
        tokio::time::sleep(Duration::from_secs(20)).await;
        watchdog.arm();
        tokio::time::sleep(Duration::from_secs(20)).await;

        // 40s of wall time, but never 25s without a rearm
        assert_eq!(reconnects(&store), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(reconnects(&store), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_window() {
        let store = Arc::new(Mutex::new(ReconnectSpy::default()));
        let watchdog = Watchdog::spawn(store.clone(), Duration::from_secs(25));

        watchdog.arm();
        tokio::time::sleep(Duration::from_secs(51)).await;

        // Windows at 25s and 50s, no third
        assert_eq!(reconnects(&store), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_firing() {
        let store = Arc::new(Mutex::new(ReconnectSpy::default()));
        let watchdog = Watchdog::spawn(store.clone(), Duration::from_secs(25));

        watchdog.arm();
        tokio::time::sleep(Duration::from_secs(10)).await;
        watchdog.disarm();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(reconnects(&store), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unarmed_watchdog_is_silent() {
        let store = Arc::new(Mutex::new(ReconnectSpy::default()));
        let _watchdog = Watchdog::spawn(store.clone(), Duration::from_secs(25));

        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(reconnects(&store), 0);
    }
}
