//! Concurrent merge engine
//!
//! Every source gets a reader task on a bounded pool and a bounded queue of
//! its own. The consumer iterators poll those queues and combine what they
//! find. All readers of one merge share a `MergeState`: a running flag that
//! stops them, an error holder whose first error is re-raised to the
//! consumer, and a notifier the concat consumer waits on between arrivals.
//!
//! Lifecycle of a merge: running, then either failed (an error was recorded)
//! or exhausted, then closed. Both failure and exhaustion clear the running
//! flag. Closing the merged stream, explicitly, through a terminal operation
//! or on drop, also clears it, waits up to the shutdown grace period for the
//! readers to return and then stops the pool. A closed merge yields nothing
//! further and reports `Cancelled` if pulled.

use crate::error::{merge_outcomes, ErrorHolder, StreamError, StreamResult};
use crate::executor::AsyncExecutor;
use crate::pull_stream::PullStream;
use crate::queue::{self, Polled, QueueError, QueueReceiver, QueueSender};
use crate::stream::advanced::FillFn;
use crate::stream::core::LazyIterator;
use crate::stream_configuration::{ParallelConfig, DEFAULT_QUEUED_CAPACITY};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;

// ================================
// Shared state
// ================================

/// State shared by the readers and the consumer of one merge.
#[derive(Debug)]
pub(crate) struct MergeState {
    running: AtomicBool,
    closed: AtomicBool,
    live_readers: AtomicUsize,
    errors: ErrorHolder,
    arrivals: Notify,
    finished: Notify,
}

impl MergeState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            live_readers: AtomicUsize::new(0),
            errors: ErrorHolder::new(),
            arrivals: Notify::new(),
            finished: Notify::new(),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn live_readers(&self) -> usize {
        self.live_readers.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            log::trace!("merge cancelled");
        }
    }

    fn fail(&self, err: StreamError) {
        self.errors.record(err);
        self.cancel();
    }

    fn error(&self) -> Option<StreamError> {
        self.errors.get()
    }

    /// Block until every reader has returned or `grace` has passed.
    fn wait_for_readers(&self, handle: &Handle, grace: Duration) {
        handle.block_on(async {
            let all_returned = async {
                loop {
                    let finished = self.finished.notified();
                    if self.live_readers() == 0 {
                        break;
                    }
                    finished.await;
                }
            };
            if tokio::time::timeout(grace, all_returned).await.is_err() {
                log::warn!("{} readers still running after {:?}", self.live_readers(), grace);
            }
        });
    }
}

/// Counts one reader task as live until it returns or is dropped unstarted.
struct LiveReader(Arc<MergeState>);

impl LiveReader {
    fn register(state: &Arc<MergeState>) -> Self {
        state.live_readers.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(state))
    }
}

impl Drop for LiveReader {
    fn drop(&mut self) {
        self.0.live_readers.fetch_sub(1, Ordering::AcqRel);
        self.0.finished.notify_waiters();
    }
}

/// Register the teardown of a merge on the stream that consumes it.
fn close_merge_on_close<T: Send + 'static>(
    stream: PullStream<T>,
    state: Arc<MergeState>,
    executor: Arc<AsyncExecutor>,
) -> PullStream<T> {
    stream.on_close(move || {
        state.closed.store(true, Ordering::Release);
        state.cancel();
        if executor.is_running() {
            state.wait_for_readers(executor.handle(), executor.shutdown_timeout());
        }
        executor.shutdown();
        log::debug!("merge closed");
        Ok(())
    })
}

/// Everything a consumer iterator keeps alive besides its queues.
///
/// Declared as the last field of every consumer so the queues are dropped,
/// and therefore closed, before the executor waits for its readers.
struct MergeContext {
    state: Arc<MergeState>,
    interval: Duration,
    handle: Handle,
    _executor: Arc<AsyncExecutor>,
}

impl MergeContext {
    /// Raise the recorded error, if any, stopping the merge.
    /// A merge closed without an error reports `Cancelled`.
    fn check(&self) -> StreamResult<()> {
        match self.state.error() {
            Some(err) => {
                self.state.cancel();
                Err(err)
            }
            None if self.state.is_closed() => Err(StreamError::Cancelled),
            None => Ok(()),
        }
    }

    fn wait_for_arrival(&self) {
        let state = &self.state;
        let interval = self.interval;
        self.handle.block_on(async {
            let _ = tokio::time::timeout(interval, state.arrivals.notified()).await;
        });
    }
}

impl Drop for MergeContext {
    fn drop(&mut self) {
        self.state.cancel();
    }
}

// ================================
// Reader tasks
// ================================

fn spawn_reader<T: Send + 'static>(
    executor: &AsyncExecutor,
    index: usize,
    mut source: PullStream<T>,
    tx: QueueSender<T>,
    state: Arc<MergeState>,
    interval: Duration,
) {
    let live = LiveReader::register(&state);
    let _ = executor.execute(move || {
        let _live = live;
        let drained = panic::catch_unwind(AssertUnwindSafe(|| {
            drain_into(&mut source, &tx, &state, interval)
        }))
        .unwrap_or_else(|payload| Err(StreamError::from_panic(payload)));

        let closed = panic::catch_unwind(AssertUnwindSafe(|| source.close()))
            .unwrap_or_else(|payload| Err(StreamError::from_panic(payload)));

        match merge_outcomes(drained, closed) {
            Ok(forwarded) => {
                log::debug!("reader {} finished after forwarding {} items", index, forwarded)
            }
            Err(err) => {
                log::warn!("reader {} failed: {}", index, err);
                state.fail(err);
            }
        }

        // the error, if any, is visible before the queue reports drained
        drop(tx);
        state.arrivals.notify_one();
    });
}

fn drain_into<T: Send + 'static>(
    source: &mut PullStream<T>,
    tx: &QueueSender<T>,
    state: &MergeState,
    interval: Duration,
) -> StreamResult<usize> {
    let mut forwarded = 0;
    let iter = source.iter_mut();

    while state.is_running() && iter.has_next()? {
        let item = iter.next()?;
        match tx.offer(item, interval, &state.running) {
            Ok(()) => {
                forwarded += 1;
                state.arrivals.notify_one();
            }
            Err(QueueError::Cancelled) | Err(QueueError::QueueClosed) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(forwarded)
}

// ================================
// Consumer lanes
// ================================

/// Consumer side of one zip source: the queue, at most one item taken from
/// it, and the fill value used once the source is exhausted.
struct Lane<T> {
    rx: QueueReceiver<T>,
    head: Option<T>,
    done: bool,
    fill: Option<FillFn<T>>,
}

impl<T: Send> Lane<T> {
    fn new(rx: QueueReceiver<T>, fill: Option<FillFn<T>>) -> Self {
        Self {
            rx,
            head: None,
            done: false,
            fill,
        }
    }

    /// Wait until this lane holds an item or its reader has finished.
    fn fill_head(&mut self, ctx: &MergeContext) -> StreamResult<()> {
        while self.head.is_none() && !self.done {
            ctx.check()?;
            match self.rx.poll_timeout(ctx.interval) {
                Polled::Item(item) => self.head = Some(item),
                Polled::Empty => {}
                Polled::Drained => self.done = true,
            }
        }
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        self.head.is_none() && self.done
    }

    fn take(&mut self) -> StreamResult<T> {
        if let Some(item) = self.head.take() {
            return Ok(item);
        }
        match self.fill.as_mut() {
            Some(fill) => Ok(fill()),
            None => Err(StreamError::NoSuchElement),
        }
    }
}

// ================================
// Consumer iterators
// ================================

/// Unordered multiplexing of several sources.
pub struct ParallelConcatIter<T> {
    receivers: Vec<QueueReceiver<T>>,
    cursor: usize,
    buffered: Option<T>,
    ctx: MergeContext,
}

impl<T: Send> ParallelConcatIter<T> {
    /// One pass over the live queues, starting after the last hit. Drained
    /// queues are dropped from the rotation.
    fn poll_round(&mut self) -> Option<T> {
        if self.receivers.is_empty() {
            return None;
        }
        let start = self.cursor % self.receivers.len();
        self.receivers.rotate_left(start);
        self.cursor = 0;

        let mut i = 0;
        while i < self.receivers.len() {
            match self.receivers[i].try_poll() {
                Polled::Item(item) => {
                    self.cursor = i + 1;
                    return Some(item);
                }
                Polled::Empty => i += 1,
                Polled::Drained => {
                    self.receivers.remove(i);
                }
            }
        }
        None
    }
}

impl<T: Send> LazyIterator for ParallelConcatIter<T> {
    type Item = T;

    fn has_next(&mut self) -> StreamResult<bool> {
        if self.buffered.is_some() {
            return Ok(true);
        }
        loop {
            self.ctx.check()?;
            if let Some(item) = self.poll_round() {
                self.buffered = Some(item);
                return Ok(true);
            }
            if self.receivers.is_empty() {
                // a reader may have failed while we took its last item
                self.ctx.check()?;
                self.ctx.state.cancel();
                return Ok(false);
            }
            self.ctx.wait_for_arrival();
        }
    }

    fn next(&mut self) -> StreamResult<T> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        self.buffered.take().ok_or(StreamError::NoSuchElement)
    }
}

/// Two-source positional zip.
pub struct ParallelZipIter<A, B, F> {
    a: Lane<A>,
    b: Lane<B>,
    f: F,
    longest: bool,
    ctx: MergeContext,
}

impl<A, B, F, R> LazyIterator for ParallelZipIter<A, B, F>
where
    A: Send,
    B: Send,
    F: FnMut(A, B) -> R,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.ctx.check()?;
        self.a.fill_head(&self.ctx)?;
        if !self.longest && self.a.is_exhausted() {
            return finish(&self.ctx);
        }
        self.b.fill_head(&self.ctx)?;
        let exhausted = if self.longest {
            self.a.is_exhausted() && self.b.is_exhausted()
        } else {
            self.b.is_exhausted()
        };
        if exhausted {
            return finish(&self.ctx);
        }
        Ok(true)
    }

    fn next(&mut self) -> StreamResult<R> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let a = self.a.take()?;
        let b = self.b.take()?;
        Ok((self.f)(a, b))
    }
}

/// Three-source positional zip.
pub struct ParallelZip3Iter<A, B, C, F> {
    a: Lane<A>,
    b: Lane<B>,
    c: Lane<C>,
    f: F,
    longest: bool,
    ctx: MergeContext,
}

impl<A, B, C, F, R> LazyIterator for ParallelZip3Iter<A, B, C, F>
where
    A: Send,
    B: Send,
    C: Send,
    F: FnMut(A, B, C) -> R,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.ctx.check()?;
        self.a.fill_head(&self.ctx)?;
        if !self.longest && self.a.is_exhausted() {
            return finish(&self.ctx);
        }
        self.b.fill_head(&self.ctx)?;
        if !self.longest && self.b.is_exhausted() {
            return finish(&self.ctx);
        }
        self.c.fill_head(&self.ctx)?;
        let exhausted = if self.longest {
            self.a.is_exhausted() && self.b.is_exhausted() && self.c.is_exhausted()
        } else {
            self.c.is_exhausted()
        };
        if exhausted {
            return finish(&self.ctx);
        }
        Ok(true)
    }

    fn next(&mut self) -> StreamResult<R> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let a = self.a.take()?;
        let b = self.b.take()?;
        let c = self.c.take()?;
        Ok((self.f)(a, b, c))
    }
}

/// Positional zip over any number of sources of one element type.
pub struct ParallelZipAllIter<T, F> {
    lanes: Vec<Lane<T>>,
    f: F,
    longest: bool,
    ctx: MergeContext,
}

impl<T, F, R> LazyIterator for ParallelZipAllIter<T, F>
where
    T: Send,
    F: FnMut(Vec<T>) -> R,
{
    type Item = R;

    fn has_next(&mut self) -> StreamResult<bool> {
        self.ctx.check()?;
        let mut any_live = false;
        for lane in self.lanes.iter_mut() {
            lane.fill_head(&self.ctx)?;
            if lane.is_exhausted() {
                if !self.longest {
                    return finish(&self.ctx);
                }
            } else {
                any_live = true;
            }
        }
        if !any_live {
            return finish(&self.ctx);
        }
        Ok(true)
    }

    fn next(&mut self) -> StreamResult<R> {
        if !self.has_next()? {
            return Err(StreamError::NoSuchElement);
        }
        let row = self
            .lanes
            .iter_mut()
            .map(|lane| lane.take())
            .collect::<StreamResult<Vec<T>>>()?;
        Ok((self.f)(row))
    }
}

/// End of a zip: surface a late error, otherwise stop the readers.
fn finish(ctx: &MergeContext) -> StreamResult<bool> {
    ctx.check()?;
    ctx.state.cancel();
    Ok(false)
}

// ================================
// Merge builder
// ================================

/// Builds concurrent merges with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ParallelMerge {
    config: ParallelConfig,
}

impl ParallelMerge {
    pub fn new(config: ParallelConfig) -> StreamResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    fn start(&self, readers: usize, operation: &str, queue_capacity: usize) -> StreamResult<(Arc<AsyncExecutor>, Arc<MergeState>)> {
        log::debug!(
            "starting {} with {} reader threads, queue capacity {}",
            operation,
            readers,
            queue_capacity
        );
        let executor = AsyncExecutor::with_config(readers, &self.config)?;
        Ok((Arc::new(executor), Arc::new(MergeState::new())))
    }

    fn context(&self, executor: &Arc<AsyncExecutor>, state: &Arc<MergeState>) -> MergeContext {
        MergeContext {
            state: Arc::clone(state),
            interval: self.config.poll_interval_duration(),
            handle: executor.handle().clone(),
            _executor: Arc::clone(executor),
        }
    }

    fn reader<T: Send + 'static>(
        &self,
        executor: &AsyncExecutor,
        state: &Arc<MergeState>,
        index: usize,
        source: PullStream<T>,
        capacity: usize,
    ) -> StreamResult<QueueReceiver<T>> {
        let (tx, rx) = queue::bounded(capacity, executor.handle().clone())?;
        spawn_reader(
            executor,
            index,
            source,
            tx,
            Arc::clone(state),
            self.config.poll_interval_duration(),
        );
        Ok(rx)
    }

    fn concat_inner<T: Send + 'static>(
        &self,
        sources: Vec<PullStream<T>>,
        capacity: usize,
        operation: &str,
    ) -> StreamResult<PullStream<T>> {
        if sources.is_empty() {
            return Ok(PullStream::empty());
        }
        let threads = self.config.concat_reader_threads(sources.len());
        let (executor, state) = self.start(threads, operation, capacity)?;

        let mut receivers = Vec::with_capacity(sources.len());
        for (index, source) in sources.into_iter().enumerate() {
            receivers.push(self.reader(&executor, &state, index, source, capacity)?);
        }

        let stream = PullStream::from_lazy(ParallelConcatIter {
            receivers,
            cursor: 0,
            buffered: None,
            ctx: self.context(&executor, &state),
        });
        Ok(close_merge_on_close(stream, state, executor))
    }

    /// Merge `sources` into one stream in no particular cross-source order.
    pub fn concat<T: Send + 'static>(&self, sources: Vec<PullStream<T>>) -> StreamResult<PullStream<T>> {
        let capacity = self.config.concat_queue_capacity(sources.len());
        self.concat_inner(sources, capacity, "parallel concat")
    }

    /// Read `source` ahead on a background reader, buffering up to
    /// `capacity` elements.
    pub fn queued<T: Send + 'static>(&self, source: PullStream<T>, capacity: usize) -> StreamResult<PullStream<T>> {
        if capacity == 0 {
            return Err(StreamError::InvalidArgument(
                "queued capacity must be at least 1".to_string(),
            ));
        }
        self.concat_inner(vec![source], capacity, "queued read-ahead")
    }

    fn zip_inner<A, B, R, F>(
        &self,
        a: PullStream<A>,
        b: PullStream<B>,
        fills: Option<(FillFn<A>, FillFn<B>)>,
        f: F,
    ) -> StreamResult<PullStream<R>>
    where
        A: Send + 'static,
        B: Send + 'static,
        R: Send + 'static,
        F: FnMut(A, B) -> R + Send + 'static,
    {
        let capacity = self.config.zip_queue_capacity();
        let (executor, state) = self.start(2, "parallel zip", capacity)?;
        let rx_a = self.reader(&executor, &state, 0, a, capacity)?;
        let rx_b = self.reader(&executor, &state, 1, b, capacity)?;

        let longest = fills.is_some();
        let (fill_a, fill_b) = match fills {
            Some((fill_a, fill_b)) => (Some(fill_a), Some(fill_b)),
            None => (None, None),
        };

        let stream = PullStream::from_lazy(ParallelZipIter {
            a: Lane::new(rx_a, fill_a),
            b: Lane::new(rx_b, fill_b),
            f,
            longest,
            ctx: self.context(&executor, &state),
        });
        Ok(close_merge_on_close(stream, state, executor))
    }

    /// Pair the elements of `a` and `b`, ending with the shorter one.
    pub fn zip<A, B, R, F>(&self, a: PullStream<A>, b: PullStream<B>, f: F) -> StreamResult<PullStream<R>>
    where
        A: Send + 'static,
        B: Send + 'static,
        R: Send + 'static,
        F: FnMut(A, B) -> R + Send + 'static,
    {
        self.zip_inner(a, b, None, f)
    }

    /// Pair the elements of `a` and `b` until both are exhausted, using the
    /// fill value of whichever finished first.
    pub fn zip_longest<A, B, R, F>(
        &self,
        a: PullStream<A>,
        b: PullStream<B>,
        fill_a: A,
        fill_b: B,
        f: F,
    ) -> StreamResult<PullStream<R>>
    where
        A: Clone + Send + 'static,
        B: Clone + Send + 'static,
        R: Send + 'static,
        F: FnMut(A, B) -> R + Send + 'static,
    {
        let fills: (FillFn<A>, FillFn<B>) = (
            Box::new(move || fill_a.clone()),
            Box::new(move || fill_b.clone()),
        );
        self.zip_inner(a, b, Some(fills), f)
    }

    fn zip3_inner<A, B, C, R, F>(
        &self,
        sources: (PullStream<A>, PullStream<B>, PullStream<C>),
        fills: Option<(FillFn<A>, FillFn<B>, FillFn<C>)>,
        f: F,
    ) -> StreamResult<PullStream<R>>
    where
        A: Send + 'static,
        B: Send + 'static,
        C: Send + 'static,
        R: Send + 'static,
        F: FnMut(A, B, C) -> R + Send + 'static,
    {
        let (a, b, c) = sources;
        let capacity = self.config.zip_queue_capacity();
        let (executor, state) = self.start(3, "parallel zip3", capacity)?;
        let rx_a = self.reader(&executor, &state, 0, a, capacity)?;
        let rx_b = self.reader(&executor, &state, 1, b, capacity)?;
        let rx_c = self.reader(&executor, &state, 2, c, capacity)?;

        let longest = fills.is_some();
        let (fill_a, fill_b, fill_c) = match fills {
            Some((fill_a, fill_b, fill_c)) => (Some(fill_a), Some(fill_b), Some(fill_c)),
            None => (None, None, None),
        };

        let stream = PullStream::from_lazy(ParallelZip3Iter {
            a: Lane::new(rx_a, fill_a),
            b: Lane::new(rx_b, fill_b),
            c: Lane::new(rx_c, fill_c),
            f,
            longest,
            ctx: self.context(&executor, &state),
        });
        Ok(close_merge_on_close(stream, state, executor))
    }

    /// Combine the elements of three sources, ending with the shortest.
    pub fn zip3<A, B, C, R, F>(
        &self,
        a: PullStream<A>,
        b: PullStream<B>,
        c: PullStream<C>,
        f: F,
    ) -> StreamResult<PullStream<R>>
    where
        A: Send + 'static,
        B: Send + 'static,
        C: Send + 'static,
        R: Send + 'static,
        F: FnMut(A, B, C) -> R + Send + 'static,
    {
        self.zip3_inner((a, b, c), None, f)
    }

    /// Combine the elements of three sources until all are exhausted.
    pub fn zip3_longest<A, B, C, R, F>(
        &self,
        a: PullStream<A>,
        b: PullStream<B>,
        c: PullStream<C>,
        fills: (A, B, C),
        f: F,
    ) -> StreamResult<PullStream<R>>
    where
        A: Clone + Send + 'static,
        B: Clone + Send + 'static,
        C: Clone + Send + 'static,
        R: Send + 'static,
        F: FnMut(A, B, C) -> R + Send + 'static,
    {
        let (fill_a, fill_b, fill_c) = fills;
        let fills: (FillFn<A>, FillFn<B>, FillFn<C>) = (
            Box::new(move || fill_a.clone()),
            Box::new(move || fill_b.clone()),
            Box::new(move || fill_c.clone()),
        );
        self.zip3_inner((a, b, c), Some(fills), f)
    }

    fn zip_all_inner<T, R, F>(
        &self,
        sources: Vec<PullStream<T>>,
        fills: Option<Vec<FillFn<T>>>,
        f: F,
    ) -> StreamResult<PullStream<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: FnMut(Vec<T>) -> R + Send + 'static,
    {
        if sources.is_empty() {
            return Ok(PullStream::empty());
        }
        let capacity = self.config.zip_queue_capacity();
        let (executor, state) = self.start(sources.len(), "parallel zip_all", capacity)?;

        let longest = fills.is_some();
        let mut fills = fills.map(|fills| fills.into_iter());
        let mut lanes = Vec::with_capacity(sources.len());
        for (index, source) in sources.into_iter().enumerate() {
            let rx = self.reader(&executor, &state, index, source, capacity)?;
            let fill = fills.as_mut().and_then(|fills| fills.next());
            lanes.push(Lane::new(rx, fill));
        }

        let stream = PullStream::from_lazy(ParallelZipAllIter {
            lanes,
            f,
            longest,
            ctx: self.context(&executor, &state),
        });
        Ok(close_merge_on_close(stream, state, executor))
    }

    /// Combine one element from every source per step, ending with the
    /// shortest source.
    pub fn zip_all<T, R, F>(&self, sources: Vec<PullStream<T>>, f: F) -> StreamResult<PullStream<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: FnMut(Vec<T>) -> R + Send + 'static,
    {
        self.zip_all_inner(sources, None, f)
    }

    /// Combine one element from every source per step until all are
    /// exhausted. `fills[i]` stands in for source `i` once it is done.
    pub fn zip_all_longest<T, R, F>(
        &self,
        sources: Vec<PullStream<T>>,
        fills: Vec<T>,
        f: F,
    ) -> StreamResult<PullStream<R>>
    where
        T: Clone + Send + 'static,
        R: Send + 'static,
        F: FnMut(Vec<T>) -> R + Send + 'static,
    {
        if fills.len() != sources.len() {
            return Err(StreamError::InvalidArgument(format!(
                "expected {} fill values, got {}",
                sources.len(),
                fills.len()
            )));
        }
        let fills = fills
            .into_iter()
            .map(|fill| Box::new(move || fill.clone()) as FillFn<T>)
            .collect();
        self.zip_all_inner(sources, Some(fills), f)
    }
}

// ================================
// Default-configured entry points
// ================================

/// Merge `sources` concurrently with the default configuration.
pub fn parallel_concat<T: Send + 'static>(sources: Vec<PullStream<T>>) -> StreamResult<PullStream<T>> {
    ParallelMerge::default().concat(sources)
}

/// Merge `sources` concurrently with an explicit configuration.
pub fn parallel_concat_with<T: Send + 'static>(
    sources: Vec<PullStream<T>>,
    config: ParallelConfig,
) -> StreamResult<PullStream<T>> {
    ParallelMerge::new(config)?.concat(sources)
}

/// Read `source` ahead on a background reader. `None` uses the default
/// capacity.
pub fn queued<T: Send + 'static>(source: PullStream<T>, capacity: Option<usize>) -> StreamResult<PullStream<T>> {
    ParallelMerge::default().queued(source, capacity.unwrap_or(DEFAULT_QUEUED_CAPACITY))
}

pub fn parallel_zip<A, B, R, F>(a: PullStream<A>, b: PullStream<B>, f: F) -> StreamResult<PullStream<R>>
where
    A: Send + 'static,
    B: Send + 'static,
    R: Send + 'static,
    F: FnMut(A, B) -> R + Send + 'static,
{
    ParallelMerge::default().zip(a, b, f)
}

pub fn parallel_zip_longest<A, B, R, F>(
    a: PullStream<A>,
    b: PullStream<B>,
    fill_a: A,
    fill_b: B,
    f: F,
) -> StreamResult<PullStream<R>>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    R: Send + 'static,
    F: FnMut(A, B) -> R + Send + 'static,
{
    ParallelMerge::default().zip_longest(a, b, fill_a, fill_b, f)
}

pub fn parallel_zip3<A, B, C, R, F>(
    a: PullStream<A>,
    b: PullStream<B>,
    c: PullStream<C>,
    f: F,
) -> StreamResult<PullStream<R>>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
    F: FnMut(A, B, C) -> R + Send + 'static,
{
    ParallelMerge::default().zip3(a, b, c, f)
}

pub fn parallel_zip3_longest<A, B, C, R, F>(
    a: PullStream<A>,
    b: PullStream<B>,
    c: PullStream<C>,
    fills: (A, B, C),
    f: F,
) -> StreamResult<PullStream<R>>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
    R: Send + 'static,
    F: FnMut(A, B, C) -> R + Send + 'static,
{
    ParallelMerge::default().zip3_longest(a, b, c, fills, f)
}

pub fn parallel_zip_all<T, R, F>(sources: Vec<PullStream<T>>, f: F) -> StreamResult<PullStream<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: FnMut(Vec<T>) -> R + Send + 'static,
{
    ParallelMerge::default().zip_all(sources, f)
}

pub fn parallel_zip_all_longest<T, R, F>(
    sources: Vec<PullStream<T>>,
    fills: Vec<T>,
    f: F,
) -> StreamResult<PullStream<R>>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: FnMut(Vec<T>) -> R + Send + 'static,
{
    ParallelMerge::default().zip_all_longest(sources, fills, f)
}
