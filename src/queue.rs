//! Bounded single-producer queue between a reader task and the consumer
//!
//! Provides backpressure for the merge engine: offers block while the queue is
//! full and polls block while it is empty, both waking at a fixed interval so
//! cancellation is never missed for longer than one interval.

use crate::error::{StreamError, StreamResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

/// Error types for Queue operations
#[derive(Debug, Clone, PartialEq)]
pub enum QueueError {
    /// The receiving side has been closed or dropped
    QueueClosed,
    /// Queue is at capacity
    QueueFull,
    /// The merge stopped while an offer was waiting
    Cancelled,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::QueueClosed => write!(f, "Queue is closed"),
            QueueError::QueueFull => write!(f, "Queue is full"),
            QueueError::Cancelled => write!(f, "Queue offer cancelled"),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<QueueError> for StreamError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Cancelled | QueueError::QueueClosed => StreamError::Cancelled,
            QueueError::QueueFull => StreamError::Custom(err.to_string()),
        }
    }
}

/// Outcome of polling a queue.
///
/// `Empty` means nothing is buffered right now; `Drained` means nothing is
/// buffered and the sender is gone, so nothing ever will be.
#[derive(Debug, Clone, PartialEq)]
pub enum Polled<T> {
    Item(T),
    Empty,
    Drained,
}

impl<T> Polled<T> {
    pub fn into_item(self) -> Option<T> {
        match self {
            Polled::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_drained(&self) -> bool {
        matches!(self, Polled::Drained)
    }
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicUsize,
    dequeued: AtomicUsize,
}

/// Create a bounded queue holding at most `capacity` items.
///
/// Timed operations run on `handle`, which must have its time driver
/// enabled and must not be the runtime of the calling thread.
pub fn bounded<T: Send>(capacity: usize, handle: Handle) -> StreamResult<(QueueSender<T>, QueueReceiver<T>)> {
    if capacity == 0 {
        return Err(StreamError::InvalidArgument(
            "queue capacity must be at least 1".to_string(),
        ));
    }

    let (tx, rx) = mpsc::channel(capacity);
    let counters = Arc::new(Counters::default());

    let sender = QueueSender {
        tx,
        handle: handle.clone(),
        counters: Arc::clone(&counters),
    };
    let receiver = QueueReceiver {
        rx,
        handle,
        capacity,
        counters,
        closed: false,
    };
    Ok((sender, receiver))
}

/// Writing half of a bounded queue. Dropping it marks the queue as drained
/// once the consumer has taken everything already buffered.
pub struct QueueSender<T> {
    tx: mpsc::Sender<T>,
    handle: Handle,
    counters: Arc<Counters>,
}

impl<T: Send> QueueSender<T> {
    /// Enqueue `item`, waiting while the queue is full.
    ///
    /// Every `interval` the wait re-checks `running` and gives up with
    /// `QueueError::Cancelled` once it is false.
    pub fn offer(&self, item: T, interval: Duration, running: &AtomicBool) -> Result<(), QueueError> {
        let item = match self.tx.try_send(item) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(TrySendError::Closed(_)) => return Err(QueueError::QueueClosed),
            Err(TrySendError::Full(item)) => item,
        };

        let tx = &self.tx;
        loop {
            if !running.load(Ordering::Acquire) {
                return Err(QueueError::Cancelled);
            }

            let reserved = self
                .handle
                .block_on(async { tokio::time::timeout(interval, tx.reserve()).await });

            match reserved {
                Ok(Ok(permit)) => {
                    permit.send(item);
                    self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                }
                Ok(Err(_)) => return Err(QueueError::QueueClosed),
                // still full, check the flag again
                Err(_) => continue,
            }
        }
    }

    /// Enqueue `item` only if there is room right now.
    pub fn try_offer(&self, item: T) -> Result<(), QueueError> {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(QueueError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(QueueError::QueueClosed),
        }
    }

    /// Whether the receiver has been closed or dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reading half of a bounded queue.
pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<T>,
    handle: Handle,
    capacity: usize,
    counters: Arc<Counters>,
    closed: bool,
}

impl<T: Send> QueueReceiver<T> {
    /// Take the next item without waiting.
    pub fn try_poll(&mut self) -> Polled<T> {
        match self.rx.try_recv() {
            Ok(item) => {
                self.counters.dequeued.fetch_add(1, Ordering::Relaxed);
                Polled::Item(item)
            }
            Err(TryRecvError::Empty) => Polled::Empty,
            Err(TryRecvError::Disconnected) => Polled::Drained,
        }
    }

    /// Take the next item, waiting at most `timeout` for one to arrive.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Polled<T> {
        match self.try_poll() {
            Polled::Empty => {}
            polled => return polled,
        }

        let rx = &mut self.rx;
        let received = self
            .handle
            .block_on(async { tokio::time::timeout(timeout, rx.recv()).await });

        match received {
            Ok(Some(item)) => {
                self.counters.dequeued.fetch_add(1, Ordering::Relaxed);
                Polled::Item(item)
            }
            Ok(None) => Polled::Drained,
            Err(_) => Polled::Empty,
        }
    }

    /// Refuse further offers. Items already buffered can still be polled.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.rx.close();
        }
    }

    /// Number of buffered items
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            capacity: self.capacity,
            buffered: self.rx.len(),
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
            closed: self.closed,
        }
    }
}

/// Snapshot of a queue's counters
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    pub capacity: usize,
    pub buffered: usize,
    pub enqueued: usize,
    pub dequeued: usize,
    pub closed: bool,
}

impl QueueStats {
    /// Fraction of the capacity currently in use
    pub fn utilization(&self) -> f64 {
        self.buffered as f64 / self.capacity as f64
    }
}

impl fmt::Display for QueueStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueStats {{ buffered: {}/{} ({:.1}%), enqueued: {}, dequeued: {}, closed: {} }}",
            self.buffered,
            self.capacity,
            self.utilization() * 100.0,
            self.enqueued,
            self.dequeued,
            self.closed
        )
    }
}
