use std::time::Duration;

/// Configuration for timeout durations of the storage collaborators
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Wait for a pooled database connection
    pub db_acquire: Duration,

    /// SQLite busy handler wait while another writer holds the lock
    pub db_busy: Duration,

    /// Bound on a single bitmap cache operation, including connecting
    pub cache_op: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            db_acquire: Duration::from_secs(10),
            db_busy: Duration::from_secs(5),
            cache_op: Duration::from_millis(250),
        }
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_op(mut self, cache_op: Duration) -> Self {
        self.cache_op = cache_op;
        self
    }
}
