//! Core pull-iterator trait and the elementary pipeline stages
//!
//! Every stage owns exactly one upstream iterator and does no work until the
//! consumer pulls. `has_next` may look ahead and buffer one element but never
//! advances past it; `next` hands that element out.

use crate::error::{StreamError, StreamResult};
use std::marker::PhantomData;

/// Pull-based cursor over the rest of a sequence.
///
/// The bulk operations have element-wise defaults; sources that can do
/// better (a vector moving its cursor on `skip`) override them.
pub trait LazyIterator {
    type Item;

    /// Whether another element is available. Repeated calls without an
    /// intervening `next` return the same answer.
    fn has_next(&mut self) -> StreamResult<bool>;

    /// Advance by one element, failing with `StreamError::NoSuchElement`
    /// when exhausted.
    fn next(&mut self) -> StreamResult<Self::Item>;

    /// Drain the iterator, returning how many elements were left.
    fn count(&mut self) -> StreamResult<usize> {
        let mut count = 0;
        while self.has_next()? {
            self.next()?;
            count += 1;
        }
        Ok(count)
    }

    /// Discard up to `n` elements.
    fn skip(&mut self, n: usize) -> StreamResult<()> {
        for _ in 0..n {
            if !self.has_next()? {
                break;
            }
            self.next()?;
        }
        Ok(())
    }

    /// Drain the remaining elements into a vector.
    fn to_vec(&mut self) -> StreamResult<Vec<Self::Item>> {
        let mut items = Vec::new();
        while self.has_next()? {
            items.push(self.next()?);
        }
        Ok(items)
    }
}

/// Type-erased iterator owned by a stream.
pub type BoxedIter<T> = Box<dyn LazyIterator<Item = T> + Send + 'static>;

impl<I: LazyIterator + ?Sized> LazyIterator for Box<I> {
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        (**self).has_next()
    }

    fn next(&mut self) -> StreamResult<Self::Item> {
        (**self).next()
    }

    fn count(&mut self) -> StreamResult<usize> {
        (**self).count()
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        (**self).skip(n)
    }

    fn to_vec(&mut self) -> StreamResult<Vec<Self::Item>> {
        (**self).to_vec()
    }
}

// ================================
// Empty
// ================================

/// Iterator with no elements.
pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Empty<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for Empty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazyIterator for Empty<T> {
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        Ok(false)
    }

    fn next(&mut self) -> StreamResult<T> {
        Err(StreamError::NoSuchElement)
    }

    fn count(&mut self) -> StreamResult<usize> {
        Ok(0)
    }

    fn skip(&mut self, _n: usize) -> StreamResult<()> {
        Ok(())
    }
}

// ================================
// Map / TryMap
// ================================

/// Element-wise transform.
pub struct Map<I, F> {
    upstream: I,
    f: F,
}

impl<I, F> Map<I, F> {
    pub fn new(upstream: I, f: F) -> Self {
        Self { upstream, f }
    }
}

impl<I, F, R> LazyIterator for Map<I, F>
where
    I: LazyIterator,
    F: FnMut(I::Item) -> R,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.upstream.has_next()
    }

    fn next(&mut self) -> StreamResult<R> {
        let item = self.upstream.next()?;
        Ok((self.f)(item))
    }

    // one output per input, so counting and skipping need not apply `f`
    fn count(&mut self) -> StreamResult<usize> {
        self.upstream.count()
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        self.upstream.skip(n)
    }
}

/// Element-wise transform that may fail.
pub struct TryMap<I, F> {
    upstream: I,
    f: F,
}

impl<I, F> TryMap<I, F> {
    pub fn new(upstream: I, f: F) -> Self {
        Self { upstream, f }
    }
}

impl<I, F, R> LazyIterator for TryMap<I, F>
where
    I: LazyIterator,
    F: FnMut(I::Item) -> StreamResult<R>,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.upstream.has_next()
    }

    fn next(&mut self) -> StreamResult<R> {
        let item = self.upstream.next()?;
        (self.f)(item)
    }
}

// ================================
// Filter
// ================================

/// Keeps elements matching a predicate, producing at most `max` of them.
pub struct Filter<I: LazyIterator, P> {
    upstream: I,
    predicate: P,
    buffered: Option<I::Item>,
    remaining: usize,
}

impl<I: LazyIterator, P> Filter<I, P> {
    pub fn new(upstream: I, predicate: P, max: usize) -> Self {
        Self {
            upstream,
            predicate,
            buffered: None,
            remaining: max,
        }
    }
}

impl<I, P> LazyIterator for Filter<I, P>
where
    I: LazyIterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.buffered.is_some() {
            return Ok(true);
        }
        if self.remaining == 0 {
            return Ok(false);
        }
        while self.upstream.has_next()? {
            let item = self.upstream.next()?;
            if (self.predicate)(&item) {
                self.buffered = Some(item);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        self.remaining -= 1;
        self.buffered.take().ok_or(StreamError::NoSuchElement)
    }
}

// ================================
// Peek
// ================================

/// Runs a side effect on every element as it passes through.
pub struct Peek<I, F> {
    upstream: I,
    action: F,
}

impl<I, F> Peek<I, F> {
    pub fn new(upstream: I, action: F) -> Self {
        Self { upstream, action }
    }
}

impl<I, F> LazyIterator for Peek<I, F>
where
    I: LazyIterator,
    F: FnMut(&I::Item),
{
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.upstream.has_next()
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        let item = self.upstream.next()?;
        (self.action)(&item);
        Ok(item)
    }
}

// ================================
// Limit / Skip
// ================================

/// Yields at most `n` elements, then stops pulling upstream.
pub struct Limit<I> {
    upstream: I,
    remaining: usize,
}

impl<I> Limit<I> {
    pub fn new(upstream: I, n: usize) -> Self {
        Self { upstream, remaining: n }
    }
}

impl<I: LazyIterator> LazyIterator for Limit<I> {
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.remaining == 0 {
            return Ok(false);
        }
        self.upstream.has_next()
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        if self.remaining == 0 {
            return Err(StreamError::NoSuchElement);
        }
        let item = self.upstream.next()?;
        self.remaining -= 1;
        Ok(item)
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        let n = n.min(self.remaining);
        self.upstream.skip(n)?;
        self.remaining -= n;
        Ok(())
    }
}

/// Discards the first `n` elements, using the upstream's bulk skip.
pub struct Skip<I> {
    upstream: I,
    pending: usize,
}

impl<I> Skip<I> {
    pub fn new(upstream: I, n: usize) -> Self {
        Self { upstream, pending: n }
    }
}

impl<I: LazyIterator> Skip<I> {
    fn skip_prefix(&mut self) -> StreamResult<()> {
        if self.pending > 0 {
            let n = std::mem::take(&mut self.pending);
            self.upstream.skip(n)?;
        }
        Ok(())
    }
}

impl<I: LazyIterator> LazyIterator for Skip<I> {
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.skip_prefix()?;
        self.upstream.has_next()
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        self.skip_prefix()?;
        self.upstream.next()
    }

    fn count(&mut self) -> StreamResult<usize> {
        self.skip_prefix()?;
        self.upstream.count()
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        self.skip_prefix()?;
        self.upstream.skip(n)
    }

    fn to_vec(&mut self) -> StreamResult<Vec<I::Item>> {
        self.skip_prefix()?;
        self.upstream.to_vec()
    }
}
