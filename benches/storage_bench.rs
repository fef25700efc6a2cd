//! Benchmarks for txkv storage operations

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;
use txkv::txlog::{Event, FileLog, Log};
use txkv::Store;

fn storage_benchmarks(c: &mut Criterion) {
    c.bench_function("event_encode", |b| {
        let event = Event::set("user42", vec![b'v'; 256]);
        b.iter(|| black_box(event.encode().unwrap()));
    });

    c.bench_function("event_decode", |b| {
        let bytes = Event::set("user42", vec![b'v'; 256]).encode().unwrap();
        b.iter(|| black_box(Event::decode(&bytes).unwrap()));
    });

    c.bench_function("log_append", |b| {
        let temp = TempDir::new().unwrap();
        let log = FileLog::open(temp.path().join("bench.log")).unwrap();
        let event = Event::set("user42", vec![b'v'; 256]);
        b.iter(|| log.append(black_box(&event)).unwrap());
    });

    c.bench_function("store_set", |b| {
        let temp = TempDir::new().unwrap();
        let store = Store::new(FileLog::open(temp.path().join("bench.log")).unwrap());
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            store.set(format!("key{}", i % 1024).as_bytes(), b"value").unwrap();
        });
    });

    c.bench_function("store_get", |b| {
        let temp = TempDir::new().unwrap();
        let store = Store::new(FileLog::open(temp.path().join("bench.log")).unwrap());
        for i in 0..1024 {
            store.set(format!("key{}", i).as_bytes(), b"value").unwrap();
        }
        b.iter_batched(
            || format!("key{}", next_key_index()),
            |key| black_box(store.get(key.as_bytes())),
            BatchSize::SmallInput,
        );
    });
}

/// Cheap deterministic spread over the preloaded keys
fn next_key_index() -> usize {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    NEXT.fetch_add(7919, Ordering::Relaxed) % 1024
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
