//! # Registry Benchmarks
//!
//! Announcement and lookup cost of the in-memory registry as the number of
//! holders per block grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::{ModuleUid, NodeId, Timestamp};
use sw_01_shard_announcer::InMemoryRegistry;

fn populated(blocks: u32, holders: usize) -> (InMemoryRegistry, Vec<ModuleUid>) {
    let registry = InMemoryRegistry::default();
    let uids: Vec<ModuleUid> = (0..blocks).map(|i| ModuleUid::for_block("bloom", i)).collect();
    let far_future = Timestamp::from_secs(u32::MAX as u64);
    for _ in 0..holders {
        let node = NodeId::random();
        for uid in &uids {
            registry.store(uid, node, far_future);
        }
    }
    (registry, uids)
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("sw-01-registry-store");
    for blocks in [8u32, 70] {
        group.throughput(Throughput::Elements(blocks as u64));
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, &blocks| {
            let (registry, uids) = populated(blocks, 16);
            let node = NodeId::random();
            let mut expire_at = Timestamp::from_secs(1);
            b.iter(|| {
                expire_at = expire_at + std::time::Duration::from_millis(1);
                for uid in &uids {
                    registry.store(black_box(uid), node, expire_at);
                }
            });
        });
    }
    group.finish();
}

fn bench_live_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sw-01-registry-lookup");
    for holders in [1usize, 32, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(holders), &holders, |b, &holders| {
            let (registry, uids) = populated(4, holders);
            b.iter(|| black_box(registry.live_nodes(&uids[0])));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_store, bench_live_nodes);
criterion_main!(benches);
