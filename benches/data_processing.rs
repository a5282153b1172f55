//! Benchmarks for the consumer-side hot path
//!
//! Run with: cargo bench

use chrono::{Duration, Local};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use obdvis_rs::session::{project, SessionStore};
use obdvis_rs::{Sample, SeriesPoint};

const LABELS: [&str; 5] = [
    "Engine RPM",
    "Vehicle Speed",
    "Coolant Temp",
    "Engine Load",
    "Throttle Position",
];

fn make_samples(count: usize) -> Vec<Sample> {
    let base = Local::now();
    (0..count)
        .map(|i| {
            let ts = base + Duration::milliseconds(i as i64 * 100);
            LABELS.iter().enumerate().fold(Sample::new(ts), |s, (j, label)| {
                // Every seventh reading is missing
                let value = if (i + j) % 7 == 0 {
                    None
                } else {
                    Some((i as f64 * 0.1 + j as f64).sin() * 1000.0)
                };
                s.with_reading(*label, value)
            })
        })
        .collect()
}

fn make_series(count: usize) -> Vec<SeriesPoint> {
    (0..count)
        .map(|i| SeriesPoint::new(i as f64 * 0.1, (i as f64).sin()))
        .collect()
}

fn bench_store_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_record");

    for size in [1000, 10_000].iter() {
        let samples = make_samples(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("record", size), &samples, |b, samples| {
            b.iter(|| {
                let mut store = SessionStore::new();
                for sample in samples {
                    store.record(black_box(sample));
                }
                black_box(store.samples_recorded())
            });
        });
    }

    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for size in [1000, 10_000, 100_000].iter() {
        let series = make_series(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("all", size), &series, |b, series| {
            b.iter(|| black_box(project(series, 0.0)));
        });

        group.bench_with_input(BenchmarkId::new("last_30s", size), &series, |b, series| {
            b.iter(|| black_box(project(series, 30.0)));
        });
    }

    group.finish();
}

fn bench_plot_points_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("plot_points_conversion");

    for size in [1000, 10_000, 50_000].iter() {
        let series = make_series(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(
            BenchmarkId::new("as_plot_point", size),
            &series,
            |b, series| {
                b.iter(|| {
                    let points: Vec<[f64; 2]> =
                        series.iter().map(SeriesPoint::as_plot_point).collect();
                    black_box(points)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_store_record,
    bench_projection,
    bench_plot_points_conversion
);
criterion_main!(benches);
