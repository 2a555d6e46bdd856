use rs2_pull::*;
use serial_test::serial;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn close_flag<T: Send + 'static>(stream: PullStream<T>) -> (PullStream<T>, Arc<AtomicBool>) {
    let flag = Arc::new(AtomicBool::new(false));
    let set = Arc::clone(&flag);
    let stream = stream.on_close(move || {
        set.store(true, Ordering::SeqCst);
        Ok(())
    });
    (stream, flag)
}

fn fast_config() -> ParallelConfig {
    ParallelConfig::default().poll_interval(Duration::from_millis(10))
}

/// Live threads of this process, or 0 where `/proc` is unavailable.
fn thread_count() -> usize {
    std::fs::read_dir("/proc/self/task").map(|tasks| tasks.count()).unwrap_or(0)
}

fn settles_to(baseline: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while thread_count() > baseline {
        if Instant::now() > deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    true
}

#[test]
#[serial]
fn test_parallel_concat_yields_every_element() {
    let merged = parallel_concat(vec![
        PullStream::of(vec![1, 2]),
        PullStream::of(vec![3, 4]),
        PullStream::of(vec![5, 6]),
    ])
    .unwrap();

    let values: HashSet<i32> = merged.collect().unwrap();
    assert_eq!(values, (1..=6).collect());
}

#[test]
#[serial]
fn test_parallel_concat_keeps_per_source_order() {
    let evens = PullStream::of((0..200).map(|x| x * 2).collect::<Vec<_>>());
    let odds = PullStream::of((0..200).map(|x| x * 2 + 1).collect::<Vec<_>>());
    let merged = parallel_concat(vec![evens, odds]).unwrap().to_vec().unwrap();

    assert_eq!(merged.len(), 400);
    let evens: Vec<i32> = merged.iter().copied().filter(|x| x % 2 == 0).collect();
    let odds: Vec<i32> = merged.iter().copied().filter(|x| x % 2 == 1).collect();
    assert!(evens.windows(2).all(|w| w[0] < w[1]));
    assert!(odds.windows(2).all(|w| w[0] < w[1]));
}

#[test]
#[serial]
fn test_parallel_concat_passes_none_elements_through() {
    let merged = parallel_concat(vec![
        PullStream::of(vec![Some(1), None]),
        PullStream::of(vec![None, Some(2)]),
    ])
    .unwrap()
    .to_vec()
    .unwrap();

    assert_eq!(merged.len(), 4);
    assert_eq!(merged.iter().filter(|x| x.is_none()).count(), 2);
}

#[test]
#[serial]
fn test_parallel_concat_of_nothing_is_empty() {
    assert_eq!(parallel_concat(Vec::<PullStream<i32>>::new()).unwrap().count().unwrap(), 0);
    assert_eq!(
        parallel_concat(vec![PullStream::<i32>::empty(), PullStream::empty()])
            .unwrap()
            .count()
            .unwrap(),
        0
    );
}

#[test]
#[serial]
fn test_queued_preserves_order() {
    let values = queued(PullStream::of((0..1000).collect::<Vec<_>>()), Some(8))
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(values, (0..1000).collect::<Vec<_>>());

    let doubled = PullStream::of(vec![1, 2, 3]).queued(2).unwrap().map(|x| x * 2).to_vec().unwrap();
    assert_eq!(doubled, vec![2, 4, 6]);

    assert!(matches!(
        PullStream::of(vec![1]).queued(0),
        Err(StreamError::InvalidArgument(_))
    ));
}

#[test]
#[serial]
fn test_parallel_zip_stops_at_shortest() {
    let pairs = parallel_zip(
        PullStream::of(vec![1, 2, 3]),
        PullStream::of(vec!["a", "b"]),
        |n, s| format!("{}{}", n, s),
    )
    .unwrap()
    .to_vec()
    .unwrap();
    assert_eq!(pairs, vec!["1a", "2b"]);
}

#[test]
#[serial]
fn test_parallel_zip_longest_fills() {
    let pairs = parallel_zip_longest(
        PullStream::of(vec![1, 2, 3]),
        PullStream::of(vec!["a", "b"]),
        0,
        "z",
        |n, s| format!("{}{}", n, s),
    )
    .unwrap()
    .to_vec()
    .unwrap();
    assert_eq!(pairs, vec!["1a", "2b", "3z"]);
}

#[test]
#[serial]
fn test_parallel_zip3_and_zip_all() {
    let sums = parallel_zip3(
        PullStream::of(vec![1, 2]),
        PullStream::of(vec![10, 20, 30]),
        PullStream::of(vec![100, 200]),
        |a, b, c| a + b + c,
    )
    .unwrap()
    .to_vec()
    .unwrap();
    assert_eq!(sums, vec![111, 222]);

    let padded = parallel_zip3_longest(
        PullStream::of(vec![1]),
        PullStream::of(vec![10, 20]),
        PullStream::<i32>::empty(),
        (0, 0, -1),
        |a, b, c| (a, b, c),
    )
    .unwrap()
    .to_vec()
    .unwrap();
    assert_eq!(padded, vec![(1, 10, -1), (0, 20, -1)]);

    let rows = parallel_zip_all(
        vec![
            PullStream::of(vec![1, 2, 3]),
            PullStream::of(vec![4, 5, 6]),
            PullStream::of(vec![7, 8]),
        ],
        |row| row,
    )
    .unwrap()
    .to_vec()
    .unwrap();
    assert_eq!(rows, vec![vec![1, 4, 7], vec![2, 5, 8]]);

    let longest = parallel_zip_all_longest(
        vec![PullStream::of(vec![1, 2]), PullStream::of(vec![3])],
        vec![0, 0],
        |row| row.into_iter().sum::<i32>(),
    )
    .unwrap()
    .to_vec()
    .unwrap();
    assert_eq!(longest, vec![4, 2]);
}

#[test]
#[serial]
fn test_parallel_zip_all_edge_cases() {
    assert_eq!(
        parallel_zip_all(Vec::<PullStream<i32>>::new(), |row| row.len())
            .unwrap()
            .count()
            .unwrap(),
        0
    );
    assert!(matches!(
        parallel_zip_all_longest(vec![PullStream::of(vec![1])], vec![0, 0], |row| row),
        Err(StreamError::InvalidArgument(_))
    ));
    assert_eq!(
        parallel_zip(PullStream::<i32>::empty(), PullStream::of(vec![1]), |a, b| a + b)
            .unwrap()
            .count()
            .unwrap(),
        0
    );
}

#[test]
#[serial]
fn test_failing_source_surfaces_error_promptly() {
    let (failing, failing_closed) = close_flag(PullStream::from_results(vec![
        Ok(1),
        Ok(2),
        Err(StreamError::Custom("source failed".into())),
    ]));
    let (endless, endless_closed) = close_flag(PullStream::generate(|| 0));

    let merge = ParallelMerge::new(fast_config()).unwrap();
    let started = Instant::now();
    let result = merge.concat(vec![failing, endless]).unwrap().count();

    assert_eq!(result, Err(StreamError::Custom("source failed".into())));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(failing_closed.load(Ordering::SeqCst));
    assert!(endless_closed.load(Ordering::SeqCst));
}

#[test]
#[serial]
fn test_failing_zip_source_surfaces_error() {
    let result = parallel_zip(
        PullStream::from_results(vec![Ok(1), Err(StreamError::Timeout)]),
        PullStream::generate(|| 1),
        |a, b| a + b,
    )
    .unwrap()
    .to_vec();
    assert_eq!(result, Err(StreamError::Timeout));
}

#[test]
#[serial]
fn test_reader_panic_becomes_task_panicked() {
    let source = PullStream::of(vec![1, 2, 3]).map(|x| {
        if x == 3 {
            panic!("boom");
        }
        x
    });
    let result = parallel_concat(vec![source]).unwrap().to_vec();
    assert_eq!(result, Err(StreamError::TaskPanicked("boom".into())));
}

#[test]
#[serial]
fn test_close_failure_of_source_fails_merge() {
    let source = PullStream::of(vec![1, 2]).on_close(|| Err(StreamError::Custom("close".into())));
    let result = parallel_concat(vec![source]).unwrap().to_vec();
    assert_eq!(result, Err(StreamError::Custom("close".into())));
}

#[test]
#[serial]
fn test_endless_sources_stop_after_limit() {
    let (a, a_closed) = close_flag(PullStream::generate(|| 1));
    let (b, b_closed) = close_flag(PullStream::generate(|| 2));
    let merge = ParallelMerge::new(fast_config()).unwrap();

    let started = Instant::now();
    let values = merge.concat(vec![a, b]).unwrap().limit(50).to_vec().unwrap();

    assert_eq!(values.len(), 50);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(a_closed.load(Ordering::SeqCst));
    assert!(b_closed.load(Ordering::SeqCst));

    let pairs = parallel_zip(PullStream::generate(|| 1), PullStream::generate(|| 2), |a, b| a + b)
        .unwrap()
        .limit(10)
        .to_vec()
        .unwrap();
    assert_eq!(pairs, vec![3; 10]);
}

#[test]
#[serial]
fn test_dropping_unconsumed_merge_cleans_up() {
    let (source, closed) = close_flag(PullStream::generate(|| 7));
    let merge = ParallelMerge::new(fast_config()).unwrap();
    let stream = merge.concat(vec![source]).unwrap();

    thread::sleep(Duration::from_millis(20));
    drop(stream);
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
#[serial]
fn test_close_stops_merge_readers() {
    let baseline = thread_count();
    let (source, closed) = close_flag(PullStream::generate(|| 1));
    let merge = ParallelMerge::new(fast_config().queue_capacity(4)).unwrap();
    let mut stream = merge.concat(vec![source]).unwrap();

    // let the reader fill its queue and block on it
    thread::sleep(Duration::from_millis(50));
    stream.close().unwrap();

    assert!(closed.load(Ordering::SeqCst));
    assert!(settles_to(baseline));
    assert_eq!(stream.to_vec(), Err(StreamError::Cancelled));
}

#[test]
#[serial]
fn test_close_after_failing_zip_leaves_no_readers() {
    let baseline = thread_count();
    let (failing, failing_closed) = close_flag(PullStream::<i32>::from_results(vec![Err(
        StreamError::Custom("lane failed".into()),
    )]));
    let (endless, endless_closed) = close_flag(PullStream::generate(|| 2));
    let merge = ParallelMerge::new(fast_config()).unwrap();
    let mut stream = merge.zip(failing, endless, |a, b| a + b).unwrap();

    thread::sleep(Duration::from_millis(100));
    stream.close().unwrap();

    assert!(failing_closed.load(Ordering::SeqCst));
    assert!(endless_closed.load(Ordering::SeqCst));
    assert!(settles_to(baseline));

    let err = stream.to_vec().unwrap_err();
    assert_eq!(err.primary(), &StreamError::Custom("lane failed".into()));
}

#[test]
#[serial]
fn test_single_reader_thread_with_many_sources() {
    let config = fast_config().reader_threads(1).queue_capacity(4);
    let sources = (0..4)
        .map(|i| PullStream::of((0..50).map(|x| x + i * 100).collect::<Vec<_>>()))
        .collect();

    let mut values = parallel_concat_with(sources, config).unwrap().to_vec().unwrap();
    values.sort();

    let mut expected: Vec<i32> = (0..4).flat_map(|i| (0..50).map(move |x| x + i * 100)).collect();
    expected.sort();
    assert_eq!(values, expected);
}

#[test]
#[serial]
fn test_parallel_result_composes_with_sequential_ops() {
    let sum = parallel_concat(vec![PullStream::of(vec![1, 2, 3]), PullStream::of(vec![4, 5])])
        .unwrap()
        .filter(|x| x % 2 == 1)
        .sorted()
        .to_vec()
        .unwrap();
    assert_eq!(sum, vec![1, 3, 5]);
}

#[test]
#[serial]
fn test_parallel_concat_random_source_sizes() {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    for _ in 0..5 {
        let sizes: Vec<usize> = (0..rng.gen_range(1..8)).map(|_| rng.gen_range(0..300)).collect();
        let sources = sizes
            .iter()
            .map(|&size| PullStream::of((0..size).collect::<Vec<_>>()))
            .collect();

        let config = fast_config().queue_capacity(rng.gen_range(1..16));
        let merged = parallel_concat_with(sources, config).unwrap().to_vec().unwrap();
        assert_eq!(merged.len(), sizes.iter().sum::<usize>());
    }
}
