//! Close-handler chain for pull streams
//!
//! Handlers run in registration order, each exactly once. A failing handler
//! never prevents the ones after it from running; the first failure becomes
//! the primary cause and the rest are attached as suppressed causes.

use crate::error::{StreamError, StreamResult};
use std::fmt;

/// A cleanup action registered with `on_close`.
pub type CloseHandler = Box<dyn FnOnce() -> StreamResult<()> + Send + 'static>;

/// Ordered set of cleanup actions owned by a stream.
#[derive(Default)]
pub struct CloseHandlers {
    handlers: Vec<CloseHandler>,
}

impl CloseHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, handler: F)
    where
        F: FnOnce() -> StreamResult<()> + Send + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Append every handler of `other`, keeping its order after ours.
    pub fn append(&mut self, mut other: CloseHandlers) {
        self.handlers.append(&mut other.handlers);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run and remove every handler.
    ///
    /// Calling this again afterwards is a no-op that returns `Ok(())`.
    pub fn run_all(&mut self) -> StreamResult<()> {
        let mut failure: Option<StreamError> = None;

        for handler in self.handlers.drain(..) {
            if let Err(err) = handler() {
                failure = Some(match failure {
                    None => err,
                    Some(first) => first.with_suppressed(err),
                });
            }
        }

        match failure {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl fmt::Debug for CloseHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseHandlers")
            .field("len", &self.handlers.len())
            .finish()
    }
}
