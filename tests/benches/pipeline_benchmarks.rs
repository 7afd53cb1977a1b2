//! # Mesh Explorer Pipeline Benchmarks
//!
//! | Path | Measured |
//! |------|----------|
//! | mx-02 ingestion | one synthetic layer through the in-memory store |
//! | mx-02 epoch stats | recalculation over a full epoch |
//! | mx-03 search | address, hash and numeric lookups |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mx_02_layer_sync::{synthetic_layer, StatsRecalculator, SyncConfig};
use mx_tests::Pipeline;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn bench_layer_ingestion(c: &mut Criterion) {
    let rt = runtime();
    let pipeline = Pipeline::in_memory(0, SyncConfig::for_testing());
    let snapshot = synthetic_layer(&pipeline.network, 1);

    let mut group = c.benchmark_group("mx-02-layer-sync");
    group.measurement_time(Duration::from_secs(5));

    // re-ingesting the same layer measures the idempotent upsert path
    let ingestor = &pipeline.ingestor;
    let snapshot = &snapshot;
    group.bench_function("ingest_layer", |b| {
        b.to_async(&rt)
            .iter(|| async move { ingestor.ingest(black_box(snapshot)).await })
    });
    group.finish();
}

fn bench_epoch_stats(c: &mut Criterion) {
    let rt = runtime();
    let pipeline = Pipeline::in_memory(29, SyncConfig::for_testing());
    rt.block_on(pipeline.sync_to_tip());
    let stats = StatsRecalculator::new(pipeline.store.clone(), pipeline.network.clone());

    let stats = &stats;
    c.bench_function("mx-02-epoch-recalculate", |b| {
        b.to_async(&rt)
            .iter(|| async move { stats.recalculate(black_box(1)).await })
    });
}

fn bench_search(c: &mut Criterion) {
    let rt = runtime();
    let pipeline = Pipeline::in_memory(49, SyncConfig::for_testing());
    rt.block_on(pipeline.sync_to_tip());

    let layer = synthetic_layer(&pipeline.network, 25);
    let ids = [
        ("address", layer.accounts[0].address.clone()),
        ("smesher", layer.activations[0].smesher_id.clone()),
        ("layer", "42".to_string()),
        ("miss", "z".repeat(66)),
    ];

    let resolver = &pipeline.resolver;
    let mut group = c.benchmark_group("mx-03-search");
    for (name, id) in &ids {
        group.bench_with_input(BenchmarkId::new("resolve", name), id, |b, id| {
            b.to_async(&rt)
                .iter(|| async move { resolver.resolve(black_box(id)).await })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layer_ingestion, bench_epoch_stats, bench_search);
criterion_main!(benches);
