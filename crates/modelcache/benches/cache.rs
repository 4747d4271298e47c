use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use modelcache::{memoize, CacheStore, StateDict};

type Model = Arc<StateDict<f32>>;

fn model(params: usize) -> Model {
    Arc::new((0..params).map(|i| (format!("layer.{}.weight", i), 0.0f32)).collect())
}

fn bench_cached_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_lookup");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("lookup_64_params", |b| {
        let store: CacheStore<u64, Model> = CacheStore::new(1000).unwrap();

        // Pre-populate
        for id in 0..100 {
            store.insert(id, model(64));
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(store.lookup(&(counter % 100)));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_memoize_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("memoize_hit_or_build", |b| {
        let store: CacheStore<u64, Model> = CacheStore::new(100).unwrap();

        let mut counter = 0u64;
        b.iter(|| {
            // Keys cycle over twice the capacity, so about half the calls build
            black_box(memoize(&store, counter % 200, || model(8)));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_insert_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_evict");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert_full_store", |b| {
        let store: CacheStore<u64, Model> = CacheStore::new(10).unwrap();
        let shared = model(8);

        let mut counter = 0u64;
        b.iter(|| {
            black_box(store.insert(counter, Arc::clone(&shared)));
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cached_lookup,
    bench_memoize_mixed,
    bench_insert_evict
);
criterion_main!(benches);
