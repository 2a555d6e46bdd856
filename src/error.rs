//! Error types and handling for rs2-pull
//!
//! This module provides the error type shared by the sequential pipeline and
//! the concurrent merge engine, plus the first-error-wins holder used by
//! reader tasks.

use std::any::Any;
use std::sync::Mutex;

/// Main error type for pull stream operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    /// I/O related errors
    #[error("IO error: {0}")]
    IO(String),
    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
    /// Operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,
    /// A caller violated an operation's contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// `next()` was called on an exhausted iterator
    #[error("No such element")]
    NoSuchElement,
    /// A background reader task panicked
    #[error("Task panicked: {0}")]
    TaskPanicked(String),
    /// Custom error with message
    #[error("Stream error: {0}")]
    Custom(String),
    /// A primary failure with every other failure observed alongside it
    #[error("{primary} (with {} suppressed)", .suppressed.len())]
    Suppressed {
        primary: Box<StreamError>,
        suppressed: Vec<StreamError>,
    },
}

impl StreamError {
    /// Attach `other` as a secondary cause of this error.
    ///
    /// Aggregates are flattened, so the result always has a single level:
    /// one primary cause plus a list of suppressed causes in the order they
    /// were observed.
    pub fn with_suppressed(self, other: StreamError) -> StreamError {
        let (primary, mut suppressed) = match self {
            StreamError::Suppressed { primary, suppressed } => (primary, suppressed),
            err => (Box::new(err), Vec::new()),
        };

        match other {
            StreamError::Suppressed { primary: p, suppressed: rest } => {
                suppressed.push(*p);
                suppressed.extend(rest);
            }
            err => suppressed.push(err),
        }

        StreamError::Suppressed { primary, suppressed }
    }

    /// The first failure observed.
    pub fn primary(&self) -> &StreamError {
        match self {
            StreamError::Suppressed { primary, .. } => primary,
            err => err,
        }
    }

    /// Failures observed after the primary one.
    pub fn suppressed(&self) -> &[StreamError] {
        match self {
            StreamError::Suppressed { suppressed, .. } => suppressed,
            _ => &[],
        }
    }

    /// Build a `TaskPanicked` error from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> StreamError {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        StreamError::TaskPanicked(message)
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::IO(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for StreamError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        StreamError::Timeout
    }
}

/// Result type for pull stream operations
pub type StreamResult<T> = Result<T, StreamError>;

/// Merge two outcomes, keeping the first failure as primary.
pub(crate) fn merge_outcomes<T>(result: StreamResult<T>, cleanup: StreamResult<()>) -> StreamResult<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => Err(err.with_suppressed(close_err)),
    }
}

/// Single-slot, first-error-wins holder shared between reader tasks and the
/// consumer of a merge.
#[derive(Debug, Default)]
pub struct ErrorHolder {
    slot: Mutex<Option<StreamError>>,
}

impl ErrorHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. The first one becomes the primary cause; every later
    /// one is attached to it as suppressed.
    pub fn record(&self, err: StreamError) {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(match slot.take() {
            None => err,
            Some(first) => first.with_suppressed(err),
        });
    }

    pub fn is_set(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Snapshot of the aggregated error, if any.
    pub fn get(&self) -> Option<StreamError> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_suppressed_flattens_nested_aggregates() {
        let left = StreamError::Custom("a".into()).with_suppressed(StreamError::Timeout);
        let right = StreamError::Cancelled.with_suppressed(StreamError::NoSuchElement);
        let merged = left.with_suppressed(right);

        assert_eq!(merged.primary(), &StreamError::Custom("a".into()));
        assert_eq!(
            merged.suppressed(),
            &[StreamError::Timeout, StreamError::Cancelled, StreamError::NoSuchElement]
        );
    }

    #[test]
    fn holder_keeps_first_error() {
        let holder = ErrorHolder::new();
        assert!(!holder.is_set());

        holder.record(StreamError::Custom("first".into()));
        holder.record(StreamError::Custom("second".into()));

        let err = holder.get().unwrap();
        assert_eq!(err.primary(), &StreamError::Custom("first".into()));
        assert_eq!(err.suppressed(), &[StreamError::Custom("second".into())]);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let err = StreamError::from_panic(Box::new("boom"));
        assert_eq!(err, StreamError::TaskPanicked("boom".into()));

        let err = StreamError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err, StreamError::TaskPanicked("owned".into()));
    }
}
