//! Configuration types for the concurrent merge operations

use crate::error::{StreamError, StreamResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on concat reader threads when none is configured.
pub const DEFAULT_MAX_READER_THREADS: usize = 64;
/// Per-source queue capacity for zips.
pub const DEFAULT_ZIP_QUEUE_CAPACITY: usize = 32;
/// Queue capacity for `queued()` read-ahead.
pub const DEFAULT_QUEUED_CAPACITY: usize = 128;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 1_000;

/// Configuration for parallel merge operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Reader threads for concat. `None` means one per source, capped at
    /// `DEFAULT_MAX_READER_THREADS`. Zips always run one reader per source.
    pub reader_threads: Option<usize>,
    /// Capacity of each per-source queue. `None` picks a default based on
    /// the operation and source count.
    pub queue_capacity: Option<usize>,
    /// How long a blocked offer or poll waits before re-checking
    /// cancellation and errors.
    pub poll_interval_ms: u64,
    /// Grace period for reader tasks to exit when a merge is dropped.
    pub shutdown_timeout_ms: u64,
    pub thread_name: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            reader_threads: None,
            queue_capacity: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            thread_name: "rs2-pull-reader".to_string(),
        }
    }
}

impl ParallelConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of concat reader threads
    pub fn reader_threads(mut self, threads: usize) -> Self {
        self.reader_threads = Some(threads);
        self
    }

    /// Set the per-source queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Set the poll interval, rounded up to whole milliseconds
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = whole_millis(interval);
        self
    }

    /// Set the shutdown grace period, rounded up to whole milliseconds
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = whole_millis(timeout);
        self
    }

    /// Set the name given to reader threads
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> StreamResult<Self> {
        let config: ParallelConfig = serde_json::from_str(json)
            .map_err(|e| StreamError::InvalidArgument(format!("invalid parallel config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall or disable the engine.
    pub fn validate(&self) -> StreamResult<()> {
        if self.reader_threads == Some(0) {
            return Err(StreamError::InvalidArgument(
                "reader_threads must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(StreamError::InvalidArgument(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(StreamError::InvalidArgument(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Reader threads used to concat `sources` streams.
    pub fn concat_reader_threads(&self, sources: usize) -> usize {
        self.reader_threads
            .unwrap_or(DEFAULT_MAX_READER_THREADS)
            .min(sources)
            .max(1)
    }

    /// Per-source queue capacity used to concat `sources` streams.
    pub fn concat_queue_capacity(&self, sources: usize) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| (sources * 32).clamp(128, 1024))
    }

    /// Per-source queue capacity used by zips.
    pub fn zip_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_ZIP_QUEUE_CAPACITY)
    }
}

fn whole_millis(duration: Duration) -> u64 {
    let millis = duration.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX)
}
