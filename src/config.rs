//! Ambient configuration for the store connection and consumer defaults.
//!
//! Mirrors `ringmpsc_stream::StreamConfig`'s shape (a plain struct,
//! `Default`, and named presets) rather than any file/CLI loading layer —
//! spec.md's exclusion of "configuration loading" is about files and flags,
//! not about the core having no configuration surface at all.

use std::time::Duration;

/// Connection parameters for [`crate::RedisStore::connect`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Redis-compatible connection URL, e.g. `redis://127.0.0.1/`.
    pub redis_url: String,
    /// Maximum number of pooled connections.
    pub max_pool_size: u32,
    /// Timeout for acquiring a connection from the pool.
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1/".to_string(),
            max_pool_size: 8,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Prefetch/poll-interval defaults for [`crate::Queue::start_consuming`].
#[derive(Debug, Clone, Copy)]
pub struct ConsumeConfig {
    /// Upper bound on the in-memory delivery buffer (and thereby, modulo
    /// worker count, on per-connection `unacked` depth).
    pub prefetch_limit: usize,
    /// Back-off sleep the poll routine uses when the ready list is
    /// observed empty or the in-memory buffer is full.
    pub poll_interval: Duration,
}

impl Default for ConsumeConfig {
    fn default() -> Self {
        Self {
            prefetch_limit: 100,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ConsumeConfig {
    /// Lower prefetch, shorter poll interval: favors latency over
    /// throughput.
    pub fn low_latency() -> Self {
        Self {
            prefetch_limit: 16,
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Higher prefetch, longer poll interval: favors throughput over
    /// per-item latency.
    pub fn high_throughput() -> Self {
        Self {
            prefetch_limit: 1_000,
            poll_interval: Duration::from_millis(250),
        }
    }

    /// Sets the prefetch limit.
    pub fn with_prefetch_limit(mut self, prefetch_limit: usize) -> Self {
        self.prefetch_limit = prefetch_limit;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
