//! Bounded worker pool for reader tasks
//!
//! Each merge owns one `AsyncExecutor`. Reader tasks run on the blocking pool
//! of a private tokio runtime whose size is capped at construction, so a merge
//! never creates more threads than it was configured with. The single async
//! worker only drives timers for the timed queue operations.

use crate::error::{StreamError, StreamResult};
use crate::stream_configuration::ParallelConfig;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

pub struct AsyncExecutor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    max_threads: usize,
    shutdown_timeout: Duration,
}

impl AsyncExecutor {
    /// Create an executor running at most `max_threads` tasks at once.
    pub fn new(max_threads: usize) -> StreamResult<Self> {
        Self::with_config(max_threads, &ParallelConfig::default())
    }

    /// Create an executor taking its thread name and shutdown grace period
    /// from `config`.
    pub fn with_config(max_threads: usize, config: &ParallelConfig) -> StreamResult<Self> {
        if max_threads == 0 {
            return Err(StreamError::InvalidArgument(
                "executor needs at least one thread".to_string(),
            ));
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_threads)
            .thread_name(config.thread_name.clone())
            .enable_time()
            .build()?;
        let handle = runtime.handle().clone();

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            handle,
            max_threads,
            shutdown_timeout: config.shutdown_timeout_duration(),
        })
    }

    /// Run `task` on the pool. Tasks beyond `max_threads` wait for a free
    /// thread.
    pub fn execute<F, R>(&self, task: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle.spawn_blocking(task)
    }

    /// Handle used for timed queue operations on this executor's timers.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn is_running(&self) -> bool {
        self.lock_runtime().is_some()
    }

    /// Stop the pool, waiting at most the shutdown grace period for running
    /// tasks to return. Later calls do nothing.
    pub fn shutdown(&self) {
        let runtime = self.lock_runtime().take();
        if let Some(runtime) = runtime {
            log::trace!(
                "shutting down executor ({} threads, grace {:?})",
                self.max_threads,
                self.shutdown_timeout
            );
            runtime.shutdown_timeout(self.shutdown_timeout);
        }
    }

    fn lock_runtime(&self) -> std::sync::MutexGuard<'_, Option<Runtime>> {
        self.runtime.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AsyncExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExecutor")
            .field("max_threads", &self.max_threads)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("running", &self.is_running())
            .finish()
    }
}
