//! Benchmark for the metric reductions
//!
//! Target: a 30-broker cluster reduces in well under a microsecond

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use msk_inventory::domain::ports::Datapoint;
use msk_inventory::inventory::{
    average_across_brokers_peak_max, latest_cluster_value, sum_across_brokers, BrokerSample,
};

fn broker_samples(count: u32) -> Vec<BrokerSample> {
    (1..=count)
        .map(|id| BrokerSample {
            broker_id: id,
            average: (id % 7 != 0).then(|| f64::from(id) * 1.5),
            maximum: Some(f64::from(id) * 3.0),
        })
        .collect()
}

fn bench_broker_reductions(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let samples = broker_samples(30);
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("sum_across_brokers", |b| {
        b.iter(|| sum_across_brokers(black_box(&samples)));
    });

    group.bench_function("average_across_brokers_peak_max", |b| {
        b.iter(|| average_across_brokers_peak_max(black_box(&samples)));
    });

    group.finish();
}

fn bench_latest_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    // One 15-minute window at one-minute resolution, out of order
    let points: Vec<Datapoint> = (0..15)
        .rev()
        .map(|m| Datapoint {
            timestamp: start + Duration::minutes(m),
            average: Some(m as f64),
            maximum: Some(m as f64 * 2.0),
        })
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));

    group.bench_function("latest_cluster_value", |b| {
        b.iter(|| latest_cluster_value(black_box(&points)));
    });

    group.finish();
}

criterion_group!(benches, bench_broker_reductions, bench_latest_value);
criterion_main!(benches);
