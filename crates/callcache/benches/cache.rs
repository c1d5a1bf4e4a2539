use std::sync::Arc;

use callcache::{Cache, Error, KvStore, MemoryStore, Value};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn memory_cache() -> Cache {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    Cache::new(store).unwrap()
}

fn bench_tracked_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("store_1kb_tracked", |b| {
        let cache = memory_cache();
        let data = Value::Bytes(vec![b'x'; 1024]);

        b.iter(|| {
            black_box(cache.store(data.clone()).unwrap());
        });
    });

    group.finish();
}

fn bench_retrieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieve");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("retrieve_int", |b| {
        let cache = memory_cache();

        let mut keys = Vec::new();
        for i in 0..100i64 {
            keys.push(cache.store(i).unwrap());
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(cache.retrieve_int(&keys[counter % 100]).unwrap());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_memoized_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("memoized_fetch");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_hit", |b| {
        let cache = memory_cache();
        let memo = cache.memoize(|url: &str| Ok::<_, Error>(format!("<html>{}</html>", url)));

        // Warm the cache
        memo.fetch("http://example.com").unwrap();

        b.iter(|| {
            black_box(memo.fetch("http://example.com").unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tracked_store, bench_retrieve, bench_memoized_fetch);
criterion_main!(benches);
