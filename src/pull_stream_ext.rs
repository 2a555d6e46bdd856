//! Extension trait for turning collections and iterators into pull streams

use crate::pull_stream::PullStream;

/// Converts anything iterable into a `PullStream`.
pub trait IntoPullStream: IntoIterator + Sized {
    fn into_pull_stream(self) -> PullStream<Self::Item>
    where
        Self::IntoIter: Send + 'static,
        Self::Item: Send + 'static,
    {
        PullStream::from_iter(self)
    }
}

impl<I: IntoIterator> IntoPullStream for I {}
