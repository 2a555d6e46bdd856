//! The `PullStream` facade
//!
//! A `PullStream` is a single-use handle over a chain of pipeline stages.
//! Intermediate operations consume the handle and return a new one wrapping
//! an extra stage; nothing is pulled until a terminal operation runs.
//! Terminal operations consume the handle too, so a drained stream cannot be
//! traversed twice.
//!
//! Every stream owns a close-handler chain. Terminal operations run it once
//! they are done; dropping a stream that was never consumed runs it as well.

use crate::close::CloseHandlers;
use crate::collector::Collector;
use crate::error::{merge_outcomes, StreamError, StreamResult};
use crate::stream::advanced::{
    self, Barrier, Concat, DedupAdjacent, DropWhile, FillFn, FlatMap, FlatMapStream, Split, TakeWhile, Zip,
    Zip3, ZipAll,
};
use crate::stream::constructors::{Generate, Iterate, IterSource, IterateFrom, ResultSource, VecSource};
use crate::stream::core::{BoxedIter, Empty, Filter, LazyIterator, Limit, Map, Peek, Skip, TryMap};
use crate::stream::parallel;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::io::BufRead;

/// Lazy, single-use, pull-based stream.
pub struct PullStream<T> {
    iter: BoxedIter<T>,
    sorted: bool,
    handlers: CloseHandlers,
}

impl<T: Send + 'static> PullStream<T> {
    // ================================
    // Construction
    // ================================

    fn with_parts(iter: BoxedIter<T>, sorted: bool, handlers: CloseHandlers) -> Self {
        Self {
            iter,
            sorted,
            handlers,
        }
    }

    /// Wrap any lazy iterator.
    pub fn from_lazy<I>(iter: I) -> Self
    where
        I: LazyIterator<Item = T> + Send + 'static,
    {
        Self::with_parts(Box::new(iter), false, CloseHandlers::new())
    }

    pub fn empty() -> Self {
        Self::from_lazy(Empty::new())
    }

    pub fn of(items: Vec<T>) -> Self {
        Self::from_lazy(VecSource::new(items))
    }

    /// Stream over `items[start..end]`.
    pub fn of_range(items: Vec<T>, start: usize, end: usize) -> StreamResult<Self> {
        Ok(Self::from_lazy(VecSource::range(items, start, end)?))
    }

    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_lazy(IterSource::new(iter.into_iter()))
    }

    /// Stream over fallible items; the first `Err` fails the pull that
    /// reaches it.
    pub fn from_results<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = StreamResult<T>>,
        I::IntoIter: Send + 'static,
    {
        Self::from_lazy(ResultSource::new(iter.into_iter()))
    }

    /// Stream driven by `state`: `next` produces an element for as long as
    /// `has_next` returns true.
    ///
    /// ```
    /// use rs2_pull::PullStream;
    ///
    /// let countdown = PullStream::iterate(3, |n| *n > 0, |n| {
    ///     *n -= 1;
    ///     *n + 1
    /// });
    /// assert_eq!(countdown.to_vec().unwrap(), vec![3, 2, 1]);
    /// ```
    pub fn iterate<S, H, N>(state: S, has_next: H, next: N) -> Self
    where
        S: Send + 'static,
        H: FnMut(&S) -> bool + Send + 'static,
        N: FnMut(&mut S) -> T + Send + 'static,
    {
        Self::from_lazy(Iterate::new(state, has_next, next))
    }

    /// `seed, f(seed), f(f(seed)), ...` while `has_next` accepts the value.
    pub fn iterate_from<H, F>(seed: T, has_next: H, f: F) -> Self
    where
        H: FnMut(&T) -> bool + Send + 'static,
        F: FnMut(&T) -> T + Send + 'static,
    {
        Self::from_lazy(IterateFrom::new(seed, has_next, f))
    }

    /// Endless stream of `f()` results.
    pub fn generate<F>(f: F) -> Self
    where
        F: FnMut() -> T + Send + 'static,
    {
        Self::from_lazy(Generate::new(f))
    }

    pub fn repeat(item: T, n: usize) -> Self
    where
        T: Clone,
    {
        Self::from_iter(std::iter::repeat(item).take(n))
    }

    /// Sequential concatenation. The result runs the close handlers of every
    /// part, in order.
    pub fn concat(streams: Vec<PullStream<T>>) -> Self {
        let mut handlers = CloseHandlers::new();
        let mut parts = Vec::with_capacity(streams.len());
        for stream in streams {
            let (iter, _, stream_handlers) = stream.into_parts();
            parts.push(iter);
            handlers.append(stream_handlers);
        }
        Self::with_parts(Box::new(Concat::new(parts)), false, handlers)
    }

    /// Pair elements positionally, ending with the shorter stream.
    pub fn zip<B, R, F>(a: PullStream<T>, b: PullStream<B>, f: F) -> PullStream<R>
    where
        B: Send + 'static,
        R: Send + 'static,
        F: FnMut(T, B) -> R + Send + 'static,
    {
        let (iter_a, _, mut handlers) = a.into_parts();
        let (iter_b, _, handlers_b) = b.into_parts();
        handlers.append(handlers_b);
        PullStream::with_parts(Box::new(Zip::new(iter_a, iter_b, f)), false, handlers)
    }

    /// Pair elements positionally until both streams are exhausted; the
    /// stream that ends first contributes its fill value from then on.
    pub fn zip_longest<B, R, F>(
        a: PullStream<T>,
        b: PullStream<B>,
        fill_a: T,
        fill_b: B,
        f: F,
    ) -> PullStream<R>
    where
        T: Clone,
        B: Clone + Send + 'static,
        R: Send + 'static,
        F: FnMut(T, B) -> R + Send + 'static,
    {
        let (iter_a, _, mut handlers) = a.into_parts();
        let (iter_b, _, handlers_b) = b.into_parts();
        handlers.append(handlers_b);
        let fill_a: FillFn<T> = Box::new(move || fill_a.clone());
        let fill_b: FillFn<B> = Box::new(move || fill_b.clone());
        PullStream::with_parts(
            Box::new(Zip::longest(iter_a, iter_b, fill_a, fill_b, f)),
            false,
            handlers,
        )
    }

    pub fn zip3<B, C, R, F>(
        a: PullStream<T>,
        b: PullStream<B>,
        c: PullStream<C>,
        f: F,
    ) -> PullStream<R>
    where
        B: Send + 'static,
        C: Send + 'static,
        R: Send + 'static,
        F: FnMut(T, B, C) -> R + Send + 'static,
    {
        let (iter_a, _, mut handlers) = a.into_parts();
        let (iter_b, _, handlers_b) = b.into_parts();
        let (iter_c, _, handlers_c) = c.into_parts();
        handlers.append(handlers_b);
        handlers.append(handlers_c);
        PullStream::with_parts(Box::new(Zip3::new(iter_a, iter_b, iter_c, f)), false, handlers)
    }

    pub fn zip3_longest<B, C, R, F>(
        a: PullStream<T>,
        b: PullStream<B>,
        c: PullStream<C>,
        fills: (T, B, C),
        f: F,
    ) -> PullStream<R>
    where
        T: Clone,
        B: Clone + Send + 'static,
        C: Clone + Send + 'static,
        R: Send + 'static,
        F: FnMut(T, B, C) -> R + Send + 'static,
    {
        let (iter_a, _, mut handlers) = a.into_parts();
        let (iter_b, _, handlers_b) = b.into_parts();
        let (iter_c, _, handlers_c) = c.into_parts();
        handlers.append(handlers_b);
        handlers.append(handlers_c);
        let (fill_a, fill_b, fill_c) = fills;
        let fills: (FillFn<T>, FillFn<B>, FillFn<C>) = (
            Box::new(move || fill_a.clone()),
            Box::new(move || fill_b.clone()),
            Box::new(move || fill_c.clone()),
        );
        PullStream::with_parts(
            Box::new(Zip3::longest(iter_a, iter_b, iter_c, fills, f)),
            false,
            handlers,
        )
    }

    /// Combine one element of every stream per step, ending with the
    /// shortest. No streams means no elements.
    pub fn zip_all<R, F>(streams: Vec<PullStream<T>>, f: F) -> PullStream<R>
    where
        R: Send + 'static,
        F: FnMut(Vec<T>) -> R + Send + 'static,
    {
        let (iters, handlers) = Self::split_all(streams);
        PullStream::with_parts(Box::new(ZipAll::new(iters, f)), false, handlers)
    }

    /// Combine one element of every stream per step until all are exhausted.
    /// `fills[i]` stands in for stream `i` once it has ended.
    pub fn zip_all_longest<R, F>(streams: Vec<PullStream<T>>, fills: Vec<T>, f: F) -> StreamResult<PullStream<R>>
    where
        T: Clone,
        R: Send + 'static,
        F: FnMut(Vec<T>) -> R + Send + 'static,
    {
        if fills.len() != streams.len() {
            return Err(StreamError::InvalidArgument(format!(
                "expected {} fill values, got {}",
                streams.len(),
                fills.len()
            )));
        }
        let (iters, handlers) = Self::split_all(streams);
        let fills = fills
            .into_iter()
            .map(|fill| Box::new(move || fill.clone()) as FillFn<T>)
            .collect();
        Ok(PullStream::with_parts(
            Box::new(ZipAll::longest(iters, fills, f)),
            false,
            handlers,
        ))
    }

    fn split_all(streams: Vec<PullStream<T>>) -> (Vec<BoxedIter<T>>, CloseHandlers) {
        let mut handlers = CloseHandlers::new();
        let mut iters = Vec::with_capacity(streams.len());
        for stream in streams {
            let (iter, _, stream_handlers) = stream.into_parts();
            iters.push(iter);
            handlers.append(stream_handlers);
        }
        (iters, handlers)
    }

    // ================================
    // Internals
    // ================================

    /// Take the stream apart without running its close handlers.
    fn into_parts(mut self) -> (BoxedIter<T>, bool, CloseHandlers) {
        let iter = std::mem::replace(&mut self.iter, Box::new(Empty::new()));
        let handlers = std::mem::take(&mut self.handlers);
        (iter, self.sorted, handlers)
    }

    /// Wrap the iterator in one more stage, keeping the close handlers.
    fn stage<R, S, F>(self, sorted: bool, wrap: F) -> PullStream<R>
    where
        R: Send + 'static,
        S: LazyIterator<Item = R> + Send + 'static,
        F: FnOnce(BoxedIter<T>) -> S,
    {
        let (iter, _, handlers) = self.into_parts();
        PullStream::with_parts(Box::new(wrap(iter)), sorted, handlers)
    }

    /// Run `op` against the iterator, then the close handlers. A close
    /// failure becomes the result, or is attached to the failure of `op`.
    fn terminate<R, F>(self, op: F) -> StreamResult<R>
    where
        F: FnOnce(&mut BoxedIter<T>) -> StreamResult<R>,
    {
        let (mut iter, _, mut handlers) = self.into_parts();
        let result = op(&mut iter);
        drop(iter);
        merge_outcomes(result, handlers.run_all())
    }

    pub(crate) fn iter_mut(&mut self) -> &mut BoxedIter<T> {
        &mut self.iter
    }

    /// Whether the stream is known to be in natural order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    // ================================
    // Intermediate operations
    // ================================

    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.filter_max(predicate, usize::MAX)
    }

    /// Like `filter`, producing at most `max` matches.
    pub fn filter_max<P>(self, predicate: P, max: usize) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        let sorted = self.sorted;
        self.stage(sorted, |iter| Filter::new(iter, predicate, max))
    }

    pub fn map<R, F>(self, f: F) -> PullStream<R>
    where
        R: Send + 'static,
        F: FnMut(T) -> R + Send + 'static,
    {
        self.stage(false, |iter| Map::new(iter, f))
    }

    /// Fallible map; an `Err` fails the pull that produced it.
    pub fn try_map<R, F>(self, f: F) -> PullStream<R>
    where
        R: Send + 'static,
        F: FnMut(T) -> StreamResult<R> + Send + 'static,
    {
        self.stage(false, |iter| TryMap::new(iter, f))
    }

    /// Replace every element by the elements of `f(element)`. Returning
    /// `None` or an empty collection contributes nothing.
    pub fn flat_map<U, F>(self, f: F) -> PullStream<U::Item>
    where
        U: IntoIterator + 'static,
        U::IntoIter: Send + 'static,
        U::Item: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.stage(false, |iter| FlatMap::<_, _, U>::new(iter, f))
    }

    /// Replace every element by a sub-stream, closing each one once it is
    /// used up.
    pub fn flat_map_stream<R, F>(self, f: F) -> PullStream<R>
    where
        R: Send + 'static,
        F: FnMut(T) -> PullStream<R> + Send + 'static,
    {
        self.stage(false, |iter| FlatMapStream::<_, _, R>::new(iter, f))
    }

    pub fn take_while<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.take_while_max(predicate, usize::MAX)
    }

    pub fn take_while_max<P>(self, predicate: P, max: usize) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        let sorted = self.sorted;
        self.stage(sorted, |iter| TakeWhile::new(iter, predicate, max))
    }

    pub fn drop_while<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.drop_while_max(predicate, usize::MAX)
    }

    pub fn drop_while_max<P>(self, predicate: P, max: usize) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        let sorted = self.sorted;
        self.stage(sorted, |iter| DropWhile::new(iter, predicate, max))
    }

    /// Remove duplicates, keeping first occurrences in encounter order.
    ///
    /// On a stream known to be sorted only adjacent duplicates can exist, so
    /// no buffering happens; otherwise the whole stream is materialized.
    pub fn distinct(self) -> Self
    where
        T: Hash + Eq,
    {
        if self.sorted {
            self.stage(true, DedupAdjacent::new)
        } else {
            self.stage(false, |iter| Barrier::new(iter, advanced::distinct_hashed))
        }
    }

    /// Keep the first element seen for every key.
    pub fn distinct_by<K, F>(self, key: F) -> Self
    where
        K: Hash + Eq,
        F: FnMut(&T) -> K + Send + 'static,
    {
        let sorted = self.sorted;
        self.stage(sorted, |iter| {
            Barrier::new(iter, move |items| advanced::distinct_by_key(items, key))
        })
    }

    /// Keep the first element of every class of elements `cmp` considers
    /// equal.
    pub fn distinct_by_cmp<C>(self, cmp: C) -> Self
    where
        C: FnMut(&T, &T) -> Ordering + Send + 'static,
    {
        let sorted = self.sorted;
        self.stage(sorted, |iter| {
            Barrier::new(iter, move |items| advanced::distinct_by_cmp(items, cmp))
        })
    }

    /// Stable sort in natural order. A no-op on a stream already known to be
    /// sorted.
    pub fn sorted(self) -> Self
    where
        T: Ord,
    {
        if self.sorted {
            return self;
        }
        self.stage(true, |iter| {
            Barrier::new(iter, |mut items: Vec<T>| {
                items.sort();
                items
            })
        })
    }

    /// Stable sort by a comparator.
    pub fn sorted_by<C>(self, mut cmp: C) -> Self
    where
        C: FnMut(&T, &T) -> Ordering + Send + 'static,
    {
        self.stage(false, |iter| {
            Barrier::new(iter, move |mut items: Vec<T>| {
                items.sort_by(&mut cmp);
                items
            })
        })
    }

    /// Stable sort by a key.
    pub fn sorted_by_key<K, F>(self, mut key: F) -> Self
    where
        K: Ord,
        F: FnMut(&T) -> K + Send + 'static,
    {
        self.stage(false, |iter| {
            Barrier::new(iter, move |mut items: Vec<T>| {
                items.sort_by_key(&mut key);
                items
            })
        })
    }

    /// The `n` largest elements, in encounter order.
    pub fn top(self, n: usize) -> Self
    where
        T: Ord,
    {
        self.top_by(n, T::cmp)
    }

    /// The `n` largest elements under `cmp`, in encounter order.
    pub fn top_by<C>(self, n: usize, cmp: C) -> Self
    where
        C: FnMut(&T, &T) -> Ordering + Send + 'static,
    {
        let sorted = self.sorted;
        self.stage(sorted, |iter| {
            Barrier::new(iter, move |items| advanced::top_by(items, n, cmp))
        })
    }

    /// Run `action` on every element as it is pulled.
    pub fn peek<F>(self, action: F) -> Self
    where
        F: FnMut(&T) + Send + 'static,
    {
        let sorted = self.sorted;
        self.stage(sorted, |iter| Peek::new(iter, action))
    }

    /// At most the first `n` elements.
    pub fn limit(self, n: usize) -> Self {
        let sorted = self.sorted;
        self.stage(sorted, |iter| Limit::new(iter, n))
    }

    /// Everything after the first `n` elements.
    pub fn skip(self, n: usize) -> Self {
        let sorted = self.sorted;
        self.stage(sorted, |iter| Skip::new(iter, n))
    }

    /// Consecutive chunks of `size` elements; the last chunk may be shorter.
    pub fn split(self, size: usize) -> StreamResult<PullStream<Vec<T>>> {
        if size == 0 {
            return Err(StreamError::InvalidArgument(
                "split size must be at least 1".to_string(),
            ));
        }
        Ok(self.stage(false, |iter| Split::new(iter, size)))
    }

    /// Group elements by key. Groups come out in the order their key was
    /// first seen.
    pub fn group_by<K, F>(self, classifier: F) -> PullStream<(K, Vec<T>)>
    where
        K: Hash + Eq + Send + 'static,
        F: FnMut(&T) -> K + Send + 'static,
    {
        self.stage(false, |iter| {
            Barrier::new(iter, move |items| advanced::group_by(items, classifier))
        })
    }

    /// Append `other` after this stream. Close handlers of both run.
    pub fn append(self, other: PullStream<T>) -> Self {
        Self::concat(vec![self, other])
    }

    /// Read this stream ahead on a background reader buffering up to
    /// `capacity` elements.
    pub fn queued(self, capacity: usize) -> StreamResult<Self> {
        parallel::ParallelMerge::default().queued(self, capacity)
    }

    /// Register a close handler. It runs after every handler already
    /// registered.
    pub fn on_close<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() -> StreamResult<()> + Send + 'static,
    {
        self.handlers.push(handler);
        self
    }

    /// Run the close handlers. Later calls do nothing.
    pub fn close(&mut self) -> StreamResult<()> {
        self.handlers.run_all()
    }

    // ================================
    // Terminal operations
    // ================================

    pub fn for_each<F>(self, mut action: F) -> StreamResult<()>
    where
        F: FnMut(T),
    {
        self.terminate(|iter| {
            while iter.has_next()? {
                action(iter.next()?);
            }
            Ok(())
        })
    }

    /// Run `action` on elements until it returns false.
    pub fn for_each_while<F>(self, mut action: F) -> StreamResult<()>
    where
        F: FnMut(T) -> bool,
    {
        self.terminate(|iter| {
            while iter.has_next()? {
                if !action(iter.next()?) {
                    break;
                }
            }
            Ok(())
        })
    }

    /// Combine all elements with `f`; `None` for an empty stream.
    pub fn reduce<F>(self, mut f: F) -> StreamResult<Option<T>>
    where
        F: FnMut(T, T) -> T,
    {
        self.terminate(|iter| {
            if !iter.has_next()? {
                return Ok(None);
            }
            let mut acc = iter.next()?;
            while iter.has_next()? {
                acc = f(acc, iter.next()?);
            }
            Ok(Some(acc))
        })
    }

    /// Combine all elements with `f`, starting from `identity`.
    pub fn reduce_with<F>(self, identity: T, f: F) -> StreamResult<T>
    where
        F: FnMut(T, T) -> T,
    {
        self.fold(identity, f)
    }

    /// Accumulate into a value of another type.
    pub fn fold<R, F>(self, init: R, mut f: F) -> StreamResult<R>
    where
        F: FnMut(R, T) -> R,
    {
        self.terminate(|iter| {
            let mut acc = init;
            while iter.has_next()? {
                acc = f(acc, iter.next()?);
            }
            Ok(acc)
        })
    }

    pub fn collect<C>(self) -> StreamResult<C>
    where
        C: Default + Extend<T>,
    {
        self.collect_with(C::default, |container: &mut C, item| container.extend(Some(item)))
    }

    /// Collect into a container made by `supplier`.
    pub fn collect_with<R, S, A>(self, supplier: S, mut accumulator: A) -> StreamResult<R>
    where
        S: FnOnce() -> R,
        A: FnMut(&mut R, T),
    {
        self.terminate(|iter| {
            let mut container = supplier();
            while iter.has_next()? {
                accumulator(&mut container, iter.next()?);
            }
            Ok(container)
        })
    }

    /// Collect with a reusable `Collector`.
    pub fn collect_by<C>(self, mut collector: C) -> StreamResult<C::Output>
    where
        C: Collector<T>,
    {
        let container = self.terminate(|iter| {
            let mut container = collector.supply();
            while iter.has_next()? {
                collector.accumulate(&mut container, iter.next()?);
            }
            Ok(container)
        })?;
        Ok(collector.finish(container))
    }

    pub fn to_vec(self) -> StreamResult<Vec<T>> {
        self.terminate(|iter| iter.to_vec())
    }

    pub fn count(self) -> StreamResult<usize> {
        self.terminate(|iter| iter.count())
    }

    pub fn min(self) -> StreamResult<Option<T>>
    where
        T: Ord,
    {
        if self.sorted {
            return self.first();
        }
        self.min_by(T::cmp)
    }

    pub fn max(self) -> StreamResult<Option<T>>
    where
        T: Ord,
    {
        if self.sorted {
            return self.last();
        }
        self.max_by(T::cmp)
    }

    /// Smallest element under `cmp`; the first one among equals.
    pub fn min_by<C>(self, mut cmp: C) -> StreamResult<Option<T>>
    where
        C: FnMut(&T, &T) -> Ordering,
    {
        self.reduce(|best, item| if cmp(&item, &best) == Ordering::Less { item } else { best })
    }

    /// Largest element under `cmp`; the first one among equals.
    pub fn max_by<C>(self, mut cmp: C) -> StreamResult<Option<T>>
    where
        C: FnMut(&T, &T) -> Ordering,
    {
        self.reduce(|best, item| if cmp(&item, &best) == Ordering::Greater { item } else { best })
    }

    /// The `k`-th largest element (`k = 1` is the maximum); `None` when the
    /// stream has fewer than `k` elements.
    pub fn kth_largest(self, k: usize) -> StreamResult<Option<T>>
    where
        T: Ord,
    {
        self.kth_largest_by(k, T::cmp)
    }

    pub fn kth_largest_by<C>(self, k: usize, mut cmp: C) -> StreamResult<Option<T>>
    where
        C: FnMut(&T, &T) -> Ordering,
    {
        if k == 0 {
            return Err(StreamError::InvalidArgument("k must be at least 1".to_string()));
        }
        self.terminate(|iter| {
            // the k largest seen so far, ascending
            let mut window: Vec<T> = Vec::with_capacity(k);
            while iter.has_next()? {
                let item = iter.next()?;
                if window.len() == k {
                    if cmp(&item, &window[0]) != Ordering::Greater {
                        continue;
                    }
                    window.remove(0);
                }
                let pos = window.partition_point(|held| cmp(held, &item) != Ordering::Greater);
                window.insert(pos, item);
            }
            if window.len() < k {
                return Ok(None);
            }
            Ok(window.into_iter().next())
        })
    }

    pub fn any_match<P>(self, mut predicate: P) -> StreamResult<bool>
    where
        P: FnMut(&T) -> bool,
    {
        self.terminate(|iter| {
            while iter.has_next()? {
                if predicate(&iter.next()?) {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    pub fn all_match<P>(self, mut predicate: P) -> StreamResult<bool>
    where
        P: FnMut(&T) -> bool,
    {
        self.terminate(|iter| {
            while iter.has_next()? {
                if !predicate(&iter.next()?) {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    pub fn none_match<P>(self, mut predicate: P) -> StreamResult<bool>
    where
        P: FnMut(&T) -> bool,
    {
        self.terminate(|iter| {
            while iter.has_next()? {
                if predicate(&iter.next()?) {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    /// The first element, if any.
    pub fn first(self) -> StreamResult<Option<T>> {
        self.terminate(|iter| {
            if iter.has_next()? {
                Ok(Some(iter.next()?))
            } else {
                Ok(None)
            }
        })
    }

    /// The last element, if any. Drains the stream.
    pub fn last(self) -> StreamResult<Option<T>> {
        self.terminate(|iter| {
            let mut last = None;
            while iter.has_next()? {
                last = Some(iter.next()?);
            }
            Ok(last)
        })
    }

    pub fn find_first<P>(self, mut predicate: P) -> StreamResult<Option<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.terminate(|iter| {
            while iter.has_next()? {
                let item = iter.next()?;
                if predicate(&item) {
                    return Ok(Some(item));
                }
            }
            Ok(None)
        })
    }

    /// Any matching element. Sequential streams return the first match.
    pub fn find_any<P>(self, predicate: P) -> StreamResult<Option<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.find_first(predicate)
    }

    /// The last matching element. Always scans to the end.
    pub fn find_last<P>(self, mut predicate: P) -> StreamResult<Option<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.terminate(|iter| {
            let mut found = None;
            while iter.has_next()? {
                let item = iter.next()?;
                if predicate(&item) {
                    found = Some(item);
                }
            }
            Ok(found)
        })
    }
}

impl PullStream<String> {
    /// Lines of `reader`. Read failures surface as `StreamError::IO`.
    pub fn lines<B>(reader: B) -> PullStream<String>
    where
        B: BufRead + Send + 'static,
    {
        PullStream::from_results(reader.lines().map(|line| line.map_err(StreamError::from)))
    }
}

impl<T> Drop for PullStream<T> {
    fn drop(&mut self) {
        if let Err(err) = self.handlers.run_all() {
            log::warn!("close handler failed while dropping stream: {}", err);
        }
    }
}

impl<T> fmt::Debug for PullStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullStream")
            .field("sorted", &self.sorted)
            .field("close_handlers", &self.handlers.len())
            .finish()
    }
}

// ================================
// std iteration
// ================================

/// Std iterator over a stream's elements. The stream is closed as soon as
/// it ends or fails; after an error the iterator yields nothing more.
pub struct StreamIter<T> {
    stream: Option<PullStream<T>>,
}

impl<T: Send + 'static> Iterator for StreamIter<T> {
    type Item = StreamResult<T>;

    fn next(&mut self) -> Option<StreamResult<T>> {
        let stream = self.stream.as_mut()?;
        let pulled = match stream.iter.has_next() {
            Ok(true) => match stream.iter.next() {
                Ok(item) => return Some(Ok(item)),
                Err(err) => Err(err),
            },
            Ok(false) => Ok(()),
            Err(err) => Err(err),
        };

        let closed = self.stream.take().map_or(Ok(()), |mut stream| stream.close());
        match merge_outcomes(pulled, closed) {
            Ok(()) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T: Send + 'static> IntoIterator for PullStream<T> {
    type Item = StreamResult<T>;
    type IntoIter = StreamIter<T>;

    fn into_iter(self) -> StreamIter<T> {
        StreamIter { stream: Some(self) }
    }
}
