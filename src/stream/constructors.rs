//! Source iterators that start a pipeline

use crate::error::{StreamError, StreamResult};
use crate::stream::core::LazyIterator;
use std::iter::Peekable;

// ================================
// Vector-backed source
// ================================

/// Source over an owned vector. Counting, skipping and draining move the
/// cursor directly instead of stepping one element at a time.
pub struct VecSource<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> VecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }

    /// Source over `items[start..end]`.
    pub fn range(mut items: Vec<T>, start: usize, end: usize) -> StreamResult<Self> {
        if start > end || end > items.len() {
            return Err(StreamError::InvalidArgument(format!(
                "range {}..{} out of bounds for length {}",
                start,
                end,
                items.len()
            )));
        }
        items.truncate(end);
        items.drain(..start);
        Ok(Self::new(items))
    }
}

impl<T> LazyIterator for VecSource<T> {
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        Ok(!self.items.as_slice().is_empty())
    }

    fn next(&mut self) -> StreamResult<T> {
        self.items.next().ok_or(StreamError::NoSuchElement)
    }

    fn count(&mut self) -> StreamResult<usize> {
        let count = self.items.len();
        self.items = Default::default();
        Ok(count)
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        if n > 0 {
            self.items.nth(n - 1);
        }
        Ok(())
    }

    fn to_vec(&mut self) -> StreamResult<Vec<T>> {
        Ok(std::mem::take(&mut self.items).collect())
    }
}

// ================================
// Iterator-backed sources
// ================================

/// Source over any std iterator.
pub struct IterSource<I: Iterator> {
    iter: Peekable<I>,
}

impl<I: Iterator> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter: iter.peekable(),
        }
    }
}

impl<I: Iterator> LazyIterator for IterSource<I> {
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        Ok(self.iter.peek().is_some())
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        self.iter.next().ok_or(StreamError::NoSuchElement)
    }

    fn count(&mut self) -> StreamResult<usize> {
        Ok(self.iter.by_ref().count())
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        if n > 0 {
            self.iter.nth(n - 1);
        }
        Ok(())
    }
}

/// Source over an iterator of results. The first error ends the pull that
/// observed it.
pub struct ResultSource<I, T> {
    iter: I,
    buffered: Option<T>,
}

impl<I, T> ResultSource<I, T>
where
    I: Iterator<Item = StreamResult<T>>,
{
    pub fn new(iter: I) -> Self {
        Self { iter, buffered: None }
    }
}

impl<I, T> LazyIterator for ResultSource<I, T>
where
    I: Iterator<Item = StreamResult<T>>,
{
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.buffered.is_some() {
            return Ok(true);
        }
        match self.iter.next() {
            Some(Ok(item)) => {
                self.buffered = Some(item);
                Ok(true)
            }
            Some(Err(err)) => Err(err),
            None => Ok(false),
        }
    }

    fn next(&mut self) -> StreamResult<T> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        self.buffered.take().ok_or(StreamError::NoSuchElement)
    }
}

// ================================
// Generators
// ================================

/// Source driven by a state value and a pair of closures over it.
pub struct Iterate<S, H, N> {
    state: S,
    has_next: H,
    next: N,
}

impl<S, H, N> Iterate<S, H, N> {
    pub fn new(state: S, has_next: H, next: N) -> Self {
        Self {
            state,
            has_next,
            next,
        }
    }
}

impl<S, H, N, T> LazyIterator for Iterate<S, H, N>
where
    H: FnMut(&S) -> bool,
    N: FnMut(&mut S) -> T,
{
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        Ok((self.has_next)(&self.state))
    }

    fn next(&mut self) -> StreamResult<T> {
        if !(self.has_next)(&self.state) {
            return Err(StreamError::NoSuchElement);
        }
        Ok((self.next)(&mut self.state))
    }
}

/// `seed, f(seed), f(f(seed)), ...` for as long as `has_next` accepts the
/// candidate. `f` is only applied to elements that were emitted.
pub struct IterateFrom<T, H, F> {
    pending: Option<T>,
    checked: bool,
    has_next: H,
    f: F,
}

impl<T, H, F> IterateFrom<T, H, F> {
    pub fn new(seed: T, has_next: H, f: F) -> Self {
        Self {
            pending: Some(seed),
            checked: false,
            has_next,
            f,
        }
    }
}

impl<T, H, F> LazyIterator for IterateFrom<T, H, F>
where
    H: FnMut(&T) -> bool,
    F: FnMut(&T) -> T,
{
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        if !self.checked {
            self.checked = true;
            if let Some(candidate) = &self.pending {
                if !(self.has_next)(candidate) {
                    self.pending = None;
                }
            }
        }
        Ok(self.pending.is_some())
    }

    fn next(&mut self) -> StreamResult<T> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let current = self.pending.take().ok_or(StreamError::NoSuchElement)?;
        self.pending = Some((self.f)(&current));
        self.checked = false;
        Ok(current)
    }
}

/// Endless source calling `f` for every element.
pub struct Generate<F> {
    f: F,
}

impl<F> Generate<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, T> LazyIterator for Generate<F>
where
    F: FnMut() -> T,
{
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        Ok(true)
    }

    fn next(&mut self) -> StreamResult<T> {
        Ok((self.f)())
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        for _ in 0..n {
            (self.f)();
        }
        Ok(())
    }
}
