//! Summarization throughput benchmarks
//!
//! Measures the reduction kernels over synthetic results tables; sweeps of a
//! few thousand rows should summarize in well under a millisecond.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use afinar::aggregate::aggregate_variant_deltas;
use afinar::measure::MeasurementResult;
use afinar::summary::{summarize_pass_orders, summarize_variants, SweepSummary};

fn synthetic_rows(benchmarks: usize, variants: usize, orders: usize) -> Vec<MeasurementResult> {
    let mut rows = Vec::with_capacity(benchmarks * variants * orders);
    for bench in 0..benchmarks {
        for variant in 0..variants {
            for order in 0..orders {
                let median_ms = 10.0 + (bench * 7 + variant * 3 + order) as f64;
                rows.push(MeasurementResult {
                    benchmark: format!("rt{bench:02}-bench"),
                    variant: format!("O{variant}"),
                    pass_order: format!("order{order}"),
                    flags: format!("-O{variant} --pass-order=inline,unroll,tail"),
                    wat_size: 2048,
                    wasm_size: 512,
                    runs: 5,
                    warmup_runs: 1,
                    p25_ms: median_ms - 0.5,
                    median_ms,
                    p75_ms: median_ms + 0.5,
                    result: "42".to_string(),
                });
            }
        }
    }
    rows
}

fn bench_summarize_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize_variants");
    group.measurement_time(Duration::from_secs(5));

    for benchmarks in [16, 64, 256].iter() {
        let rows = synthetic_rows(*benchmarks, 4, 6);
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(rows.len()),
            &rows,
            |b, rows| {
                b.iter(|| black_box(summarize_variants(rows)));
            },
        );
    }

    group.finish();
}

fn bench_summarize_pass_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize_pass_orders");
    group.measurement_time(Duration::from_secs(5));

    let rows = synthetic_rows(64, 4, 6);
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("1536_rows", |b| {
        b.iter(|| black_box(summarize_pass_orders(&rows)));
    });

    group.finish();
}

fn bench_aggregate_variant_deltas(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_variant_deltas");
    group.measurement_time(Duration::from_secs(5));

    for runs in [3, 10].iter() {
        let rows = synthetic_rows(64, 4, 6);
        let summaries: Vec<SweepSummary> = (0..*runs)
            .map(|_| {
                SweepSummary::new(
                    "config.json".to_string(),
                    summarize_variants(&rows),
                    summarize_pass_orders(&rows),
                )
            })
            .collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(runs),
            &summaries,
            |b, summaries| {
                b.iter(|| black_box(aggregate_variant_deltas(summaries)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_summarize_variants,
    bench_summarize_pass_orders,
    bench_aggregate_variant_deltas
);
criterion_main!(benches);
