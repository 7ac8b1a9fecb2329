use serde::Deserialize;

/// Main configuration structure for khobor
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub harvest: HarvestConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// The news site being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL prefix the numeric article id is appended to
    /// (e.g. "https://example.com/news.php?news=")
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Harvest loop behavior configuration
///
/// Every knob has a documented default so a minimal config file only needs
/// the base URL, database path, and listen port.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Width of one batch: number of ids fetched concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: u64,

    /// Consecutive empty batches before the long sleep kicks in
    #[serde(rename = "empty-streak-threshold", default = "default_empty_streak_threshold")]
    pub empty_streak_threshold: u32,

    /// Duration of the long sleep after an empty streak (seconds)
    #[serde(rename = "long-sleep-secs", default = "default_long_sleep_secs")]
    pub long_sleep_secs: u64,

    /// A 2xx response slower than this is treated as a transient failure (seconds)
    #[serde(rename = "slow-response-secs", default = "default_slow_response_secs")]
    pub slow_response_secs: u64,

    /// Store reconnect fires if no batch completes within this window (seconds)
    #[serde(rename = "watchdog-secs", default = "default_watchdog_secs")]
    pub watchdog_secs: u64,

    /// Consecutive empty batches (across long sleeps) that end the run
    #[serde(rename = "empty-ceiling", default = "default_empty_ceiling")]
    pub empty_ceiling: u32,

    /// Retries per id after the initial request, for retryable failures
    /// (503/429/timeout); 3 retries means 4 requests total
    #[serde(rename = "fetch-retries", default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// Linear backoff unit between retry attempts (seconds); 0 retries
    /// immediately
    #[serde(rename = "retry-backoff-secs", default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    /// First id to attempt when the store is empty
    #[serde(rename = "start-id", default = "default_start_id")]
    pub start_id: u64,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Inbound status server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the liveness/progress endpoints
    #[serde(rename = "listen-port")]
    pub listen_port: u16,
}

fn default_concurrency() -> u64 {
    100
}

fn default_empty_streak_threshold() -> u32 {
    5
}

fn default_long_sleep_secs() -> u64 {
    1800
}

fn default_slow_response_secs() -> u64 {
    20
}

fn default_watchdog_secs() -> u64 {
    25
}

fn default_empty_ceiling() -> u32 {
    500
}

fn default_fetch_retries() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    10
}

fn default_start_id() -> u64 {
    1
}
