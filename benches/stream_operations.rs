use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rs2_pull::*;
use std::time::Duration;

fn bench_sequential_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_operations");

    for size in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("map_filter", size), size, |b, &size| {
            b.iter(|| {
                let result = PullStream::from_iter(0..size)
                    .map(|x| black_box(x * 2))
                    .filter(|x| black_box(x % 4 == 0))
                    .to_vec()
                    .unwrap();
                black_box(result)
            });
        });

        group.bench_with_input(BenchmarkId::new("fold", size), size, |b, &size| {
            b.iter(|| {
                let result = PullStream::from_iter(0..size)
                    .fold(0i64, |acc, x| black_box(acc + x as i64))
                    .unwrap();
                black_box(result)
            });
        });

        group.bench_with_input(BenchmarkId::new("split_and_count", size), size, |b, &size| {
            b.iter(|| {
                let result = PullStream::from_iter(0..size)
                    .split(100)
                    .unwrap()
                    .map(|chunk| black_box(chunk.len()))
                    .count()
                    .unwrap();
                black_box(result)
            });
        });

        group.bench_with_input(BenchmarkId::new("skip_count_vec", size), size, |b, &size| {
            let values: Vec<i32> = (0..size).collect();
            b.iter(|| {
                let result = PullStream::of(values.clone()).skip(size as usize / 2).count().unwrap();
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_barrier_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier_operations");

    for size in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("sorted", size), size, |b, &size| {
            b.iter(|| {
                let result = PullStream::from_iter((0..size).rev()).sorted().to_vec().unwrap();
                black_box(result)
            });
        });

        group.bench_with_input(BenchmarkId::new("distinct", size), size, |b, &size| {
            b.iter(|| {
                let result = PullStream::from_iter((0..size).map(|x| x % 97)).distinct().count().unwrap();
                black_box(result)
            });
        });

        group.bench_with_input(BenchmarkId::new("sorted_distinct", size), size, |b, &size| {
            b.iter(|| {
                let result = PullStream::from_iter((0..size).map(|x| x % 97))
                    .sorted()
                    .distinct()
                    .count()
                    .unwrap();
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_parallel_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_merge");
    group.measurement_time(Duration::from_secs(10));

    for sources in [2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("concat", sources), sources, |b, &sources| {
            b.iter(|| {
                let streams = (0..sources)
                    .map(|i| PullStream::from_iter((0..10_000).map(move |x| x + i)))
                    .collect();
                let result = parallel_concat(streams).unwrap().count().unwrap();
                black_box(result)
            });
        });

        group.bench_with_input(BenchmarkId::new("zip_all", sources), sources, |b, &sources| {
            b.iter(|| {
                let streams = (0..sources).map(|_| PullStream::from_iter(0..10_000)).collect();
                let result = parallel_zip_all(streams, |row| row.into_iter().sum::<i32>())
                    .unwrap()
                    .count()
                    .unwrap();
                black_box(result)
            });
        });
    }

    group.bench_function("queued_read_ahead", |b| {
        b.iter(|| {
            let result = queued(PullStream::from_iter(0..10_000), None)
                .unwrap()
                .map(|x| black_box(x + 1))
                .count()
                .unwrap();
            black_box(result)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_operations,
    bench_barrier_operations,
    bench_parallel_merge
);
criterion_main!(benches);
