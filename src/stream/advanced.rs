//! Advanced stages: flat_map, take/drop-while, the materializing barriers
//! (distinct, sorted, top, group_by), split, and sequential concat/zip
use crate::error::{StreamError, StreamResult};
use crate::pull_stream::PullStream;
use crate::stream::constructors::VecSource;
use crate::stream::core::{BoxedIter, LazyIterator};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::iter::Peekable;

// ================================
// FlatMap
// ================================

/// Expands every element into a sub-sequence, moving on to the next element
/// only once the current sub-sequence is used up. `None` and empty
/// collections contribute nothing.
pub struct FlatMap<I, F, U: IntoIterator> {
    upstream: I,
    f: F,
    current: Option<Peekable<U::IntoIter>>,
}

impl<I, F, U: IntoIterator> FlatMap<I, F, U> {
    pub fn new(upstream: I, f: F) -> Self {
        Self {
            upstream,
            f,
            current: None,
        }
    }
}

impl<I, F, U> LazyIterator for FlatMap<I, F, U>
where
    I: LazyIterator,
    F: FnMut(I::Item) -> U,
    U: IntoIterator,
{
    type Item = U::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if current.peek().is_some() {
                    return Ok(true);
                }
            }
            self.current = None;
            if !self.upstream.has_next()? {
                return Ok(false);
            }
            let item = self.upstream.next()?;
            self.current = Some((self.f)(item).into_iter().peekable());
        }
    }

    fn next(&mut self) -> StreamResult<U::Item> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        self.current
            .as_mut()
            .and_then(|current| current.next())
            .ok_or(StreamError::NoSuchElement)
    }
}

/// Like `FlatMap`, but over sub-streams. Each sub-stream is closed as soon
/// as it is exhausted; one abandoned midway is closed when dropped.
pub struct FlatMapStream<I, F, R> {
    upstream: I,
    f: F,
    current: Option<PullStream<R>>,
}

impl<I, F, R> FlatMapStream<I, F, R> {
    pub fn new(upstream: I, f: F) -> Self {
        Self {
            upstream,
            f,
            current: None,
        }
    }
}

impl<I, F, R> LazyIterator for FlatMapStream<I, F, R>
where
    I: LazyIterator,
    F: FnMut(I::Item) -> PullStream<R>,
    R: Send + 'static,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if current.iter_mut().has_next()? {
                    return Ok(true);
                }
            }
            if let Some(mut finished) = self.current.take() {
                finished.close()?;
            }
            if !self.upstream.has_next()? {
                return Ok(false);
            }
            let item = self.upstream.next()?;
            self.current = Some((self.f)(item));
        }
    }

    fn next(&mut self) -> StreamResult<R> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        match self.current.as_mut() {
            Some(current) => current.iter_mut().next(),
            None => Err(StreamError::NoSuchElement),
        }
    }
}

// ================================
// TakeWhile / DropWhile
// ================================

/// Yields elements while the predicate holds, stopping for good at the
/// first element that fails it.
pub struct TakeWhile<I: LazyIterator, P> {
    upstream: I,
    predicate: P,
    buffered: Option<I::Item>,
    done: bool,
    remaining: usize,
}

impl<I: LazyIterator, P> TakeWhile<I, P> {
    pub fn new(upstream: I, predicate: P, max: usize) -> Self {
        Self {
            upstream,
            predicate,
            buffered: None,
            done: false,
            remaining: max,
        }
    }
}

impl<I, P> LazyIterator for TakeWhile<I, P>
where
    I: LazyIterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.buffered.is_some() {
            return Ok(true);
        }
        if self.done || self.remaining == 0 {
            return Ok(false);
        }
        if self.upstream.has_next()? {
            let item = self.upstream.next()?;
            if (self.predicate)(&item) {
                self.buffered = Some(item);
                return Ok(true);
            }
        }
        self.done = true;
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

/// Discards the prefix on which the predicate holds, then passes the rest
/// through, at most `max` elements in total.
pub struct DropWhile<I: LazyIterator, P> {
    upstream: I,
    predicate: P,
    dropping: bool,
    buffered: Option<I::Item>,
    remaining: usize,
}

impl<I: LazyIterator, P> DropWhile<I, P> {
    pub fn new(upstream: I, predicate: P, max: usize) -> Self {
        Self {
            upstream,
            predicate,
            dropping: true,
            buffered: None,
            remaining: max,
        }
    }
}

impl<I, P> LazyIterator for DropWhile<I, P>
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
        if self.dropping {
            while self.upstream.has_next()? {
                let item = self.upstream.next()?;
                if !(self.predicate)(&item) {
                    self.dropping = false;
                    self.buffered = Some(item);
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        self.upstream.has_next()
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        self.remaining -= 1;
        match self.buffered.take() {
            Some(item) => Ok(item),
            None => self.upstream.next(),
        }
    }
}

// ================================
// Barriers
// ================================

/// Materializes the whole upstream on the first pull, applies `op` to it and
/// replays the result.
pub struct Barrier<I, F, R> {
    upstream: I,
    op: Option<F>,
    output: VecSource<R>,
}

impl<I, F, R> Barrier<I, F, R> {
    pub fn new(upstream: I, op: F) -> Self {
        Self {
            upstream,
            op: Some(op),
            output: VecSource::new(Vec::new()),
        }
    }
}

impl<I, F, R> Barrier<I, F, R>
where
    I: LazyIterator,
    F: FnOnce(Vec<I::Item>) -> Vec<R>,
{
    fn materialize(&mut self) -> StreamResult<()> {
        if self.op.is_some() {
            let items = self.upstream.to_vec()?;
            if let Some(op) = self.op.take() {
                self.output = VecSource::new(op(items));
            }
        }
        Ok(())
    }
}

impl<I, F, R> LazyIterator for Barrier<I, F, R>
where
    I: LazyIterator,
    F: FnOnce(Vec<I::Item>) -> Vec<R>,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.materialize()?;
        self.output.has_next()
    }

    fn next(&mut self) -> StreamResult<R> {
        self.materialize()?;
        self.output.next()
    }

    fn count(&mut self) -> StreamResult<usize> {
        self.materialize()?;
        self.output.count()
    }

    fn skip(&mut self, n: usize) -> StreamResult<()> {
        self.materialize()?;
        self.output.skip(n)
    }

    fn to_vec(&mut self) -> StreamResult<Vec<R>> {
        self.materialize()?;
        self.output.to_vec()
    }
}

fn retain_marked<T>(items: Vec<T>, keep: Vec<bool>) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}

/// First occurrence of every distinct element, in encounter order.
pub fn distinct_hashed<T: Hash + Eq>(items: Vec<T>) -> Vec<T> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(items.len());
        items.iter().map(|item| seen.insert(item)).collect()
    };
    retain_marked(items, keep)
}

/// First element for every distinct key, in encounter order.
pub fn distinct_by_key<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(items.len());
        items.iter().map(|item| seen.insert(key(item))).collect()
    };
    retain_marked(items, keep)
}

/// First element of every equivalence class under `cmp`, in encounter
/// order.
pub fn distinct_by_cmp<T, C>(items: Vec<T>, mut cmp: C) -> Vec<T>
where
    C: FnMut(&T, &T) -> Ordering,
{
    let keep: Vec<bool> = {
        // indices of the kept representatives, ordered by `cmp`
        let mut representatives: Vec<usize> = Vec::new();
        (0..items.len())
            .map(|i| {
                match representatives.binary_search_by(|&j| cmp(&items[j], &items[i])) {
                    Ok(_) => false,
                    Err(pos) => {
                        representatives.insert(pos, i);
                        true
                    }
                }
            })
            .collect()
    };
    retain_marked(items, keep)
}

/// The `n` largest elements under `cmp`, kept in encounter order. Among
/// equal elements the earlier ones win.
pub fn top_by<T, C>(items: Vec<T>, n: usize, mut cmp: C) -> Vec<T>
where
    C: FnMut(&T, &T) -> Ordering,
{
    if n >= items.len() {
        return items;
    }
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| cmp(&items[b], &items[a]));
    let mut keep = vec![false; items.len()];
    for &index in order.iter().take(n) {
        keep[index] = true;
    }
    retain_marked(items, keep)
}

/// Groups elements by key. Groups come out in the order their key was first
/// seen; elements keep their encounter order inside a group.
pub fn group_by<T, K, F>(items: Vec<T>, mut classifier: F) -> Vec<(K, Vec<T>)>
where
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for item in items {
        let next_slot = groups.len();
        let slot = *slots.entry(classifier(&item)).or_insert(next_slot);
        if slot == next_slot {
            groups.push(Vec::new());
        }
        groups[slot].push(item);
    }

    let mut keys: Vec<(usize, K)> = slots.into_iter().map(|(key, slot)| (slot, key)).collect();
    keys.sort_unstable_by_key(|(slot, _)| *slot);
    keys.into_iter().map(|(_, key)| key).zip(groups).collect()
}

// ================================
// DedupAdjacent
// ================================

/// Drops elements equal to the one just emitted. On sorted input this is a
/// full distinct without buffering.
pub struct DedupAdjacent<I: LazyIterator> {
    upstream: I,
    pending: Option<I::Item>,
}

impl<I: LazyIterator> DedupAdjacent<I> {
    pub fn new(upstream: I) -> Self {
        Self {
            upstream,
            pending: None,
        }
    }
}

impl<I> LazyIterator for DedupAdjacent<I>
where
    I: LazyIterator,
    I::Item: PartialEq,
{
    type Item = I::Item;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        if self.upstream.has_next()? {
            self.pending = Some(self.upstream.next()?);
            return Ok(true);
        }
        Ok(false)
    }

    fn next(&mut self) -> StreamResult<I::Item> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let current = self.pending.take().ok_or(StreamError::NoSuchElement)?;
        while self.upstream.has_next()? {
            let candidate = self.upstream.next()?;
            if candidate != current {
                self.pending = Some(candidate);
                break;
            }
        }
        Ok(current)
    }
}

// ================================
// Split
// ================================

/// Consecutive chunks of `size` elements; the last one may be shorter.
pub struct Split<I> {
    upstream: I,
    size: usize,
}

impl<I> Split<I> {
    pub fn new(upstream: I, size: usize) -> Self {
        Self { upstream, size }
    }
}

impl<I: LazyIterator> LazyIterator for Split<I> {
    type Item = Vec<I::Item>;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.upstream.has_next()
    }

    fn next(&mut self) -> StreamResult<Vec<I::Item>> {
        if !self.upstream.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let mut chunk = Vec::with_capacity(self.size);
        while chunk.len() < self.size && self.upstream.has_next()? {
            chunk.push(self.upstream.next()?);
        }
        Ok(chunk)
    }
}

// ================================
// Concat
// ================================

/// All elements of the first part, then of the second, and so on.
pub struct Concat<T> {
    parts: VecDeque<BoxedIter<T>>,
}

impl<T> Concat<T> {
    pub fn new(parts: Vec<BoxedIter<T>>) -> Self {
        Self {
            parts: parts.into(),
        }
    }
}

impl<T> LazyIterator for Concat<T> {
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        while let Some(front) = self.parts.front_mut() {
            if front.has_next()? {
                return Ok(true);
            }
            self.parts.pop_front();
        }
        Ok(false)
    }

    fn next(&mut self) -> StreamResult<T> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        match self.parts.front_mut() {
            Some(front) => front.next(),
            None => Err(StreamError::NoSuchElement),
        }
    }

    fn count(&mut self) -> StreamResult<usize> {
        let mut total = 0;
        for mut part in self.parts.drain(..) {
            total += part.count()?;
        }
        Ok(total)
    }
}

// ================================
// Sequential zips
// ================================

/// Produces the value a finished source contributes to a zip that
/// continues to the longest source.
pub type FillFn<T> = Box<dyn FnMut() -> T + Send + 'static>;

/// One source of a zip, with its optional fill value.
pub struct ZipLane<T> {
    iter: BoxedIter<T>,
    fill: Option<FillFn<T>>,
}

impl<T> ZipLane<T> {
    pub fn new(iter: BoxedIter<T>, fill: Option<FillFn<T>>) -> Self {
        Self { iter, fill }
    }

    fn has_next(&mut self) -> StreamResult<bool> {
        self.iter.has_next()
    }

    fn pull(&mut self) -> StreamResult<T> {
        if self.iter.has_next()? {
            return self.iter.next();
        }
        match self.fill.as_mut() {
            Some(fill) => Ok(fill()),
            None => Err(StreamError::NoSuchElement),
        }
    }
}

/// Pairs elements of two sources positionally.
///
/// Without fill values the zip ends with the shorter source; with them it
/// runs until both are exhausted.
pub struct Zip<A, B, F> {
    a: ZipLane<A>,
    b: ZipLane<B>,
    f: F,
    longest: bool,
}

impl<A, B, F> Zip<A, B, F> {
    pub fn new(a: BoxedIter<A>, b: BoxedIter<B>, f: F) -> Self {
        Self {
            a: ZipLane::new(a, None),
            b: ZipLane::new(b, None),
            f,
            longest: false,
        }
    }

    pub fn longest(a: BoxedIter<A>, b: BoxedIter<B>, fill_a: FillFn<A>, fill_b: FillFn<B>, f: F) -> Self {
        Self {
            a: ZipLane::new(a, Some(fill_a)),
            b: ZipLane::new(b, Some(fill_b)),
            f,
            longest: true,
        }
    }
}

impl<A, B, F, R> LazyIterator for Zip<A, B, F>
where
    F: FnMut(A, B) -> R,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.longest {
            Ok(self.a.has_next()? || self.b.has_next()?)
        } else {
            Ok(self.a.has_next()? && self.b.has_next()?)
        }
    }

    fn next(&mut self) -> StreamResult<R> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let a = self.a.pull()?;
        let b = self.b.pull()?;
        Ok((self.f)(a, b))
    }
}

/// Three-way positional zip.
pub struct Zip3<A, B, C, F> {
    a: ZipLane<A>,
    b: ZipLane<B>,
    c: ZipLane<C>,
    f: F,
    longest: bool,
}

impl<A, B, C, F> Zip3<A, B, C, F> {
    pub fn new(a: BoxedIter<A>, b: BoxedIter<B>, c: BoxedIter<C>, f: F) -> Self {
        Self {
            a: ZipLane::new(a, None),
            b: ZipLane::new(b, None),
            c: ZipLane::new(c, None),
            f,
            longest: false,
        }
    }

    pub fn longest(
        a: BoxedIter<A>,
        b: BoxedIter<B>,
        c: BoxedIter<C>,
        fills: (FillFn<A>, FillFn<B>, FillFn<C>),
        f: F,
    ) -> Self {
        let (fill_a, fill_b, fill_c) = fills;
        Self {
            a: ZipLane::new(a, Some(fill_a)),
            b: ZipLane::new(b, Some(fill_b)),
            c: ZipLane::new(c, Some(fill_c)),
            f,
            longest: true,
        }
    }
}

impl<A, B, C, F, R> LazyIterator for Zip3<A, B, C, F>
where
    F: FnMut(A, B, C) -> R,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.longest {
            Ok(self.a.has_next()? || self.b.has_next()? || self.c.has_next()?)
        } else {
            Ok(self.a.has_next()? && self.b.has_next()? && self.c.has_next()?)
        }
    }

    fn next(&mut self) -> StreamResult<R> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let a = self.a.pull()?;
        let b = self.b.pull()?;
        let c = self.c.pull()?;
        Ok((self.f)(a, b, c))
    }
}

/// Positional zip over any number of sources of the same element type.
pub struct ZipAll<T, F> {
    lanes: Vec<ZipLane<T>>,
    f: F,
    longest: bool,
}

impl<T, F> ZipAll<T, F> {
    pub fn new(sources: Vec<BoxedIter<T>>, f: F) -> Self {
        Self {
            lanes: sources.into_iter().map(|iter| ZipLane::new(iter, None)).collect(),
            f,
            longest: false,
        }
    }

    /// Each source is paired with the fill at the same position; extra
    /// sources or fills are ignored.
    pub fn longest(sources: Vec<BoxedIter<T>>, fills: Vec<FillFn<T>>, f: F) -> Self {
        Self {
            lanes: sources
                .into_iter()
                .zip(fills)
                .map(|(iter, fill)| ZipLane::new(iter, Some(fill)))
                .collect(),
            f,
            longest: true,
        }
    }
}

impl<T, F, R> LazyIterator for ZipAll<T, F>
where
    F: FnMut(Vec<T>) -> R,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.lanes.is_empty() {
            return Ok(false);
        }
        for lane in self.lanes.iter_mut() {
            let has_next = lane.has_next()?;
            if self.longest && has_next {
                return Ok(true);
            }
            if !self.longest && !has_next {
                return Ok(false);
            }
        }
        Ok(!self.longest)
    }

    fn next(&mut self) -> StreamResult<R> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let row = self
            .lanes
            .iter_mut()
            .map(|lane| lane.pull())
            .collect::<StreamResult<Vec<T>>>()?;
        Ok((self.f)(row))
    }
}
