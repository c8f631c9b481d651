//! Performance benchmarks for the host core's pure components
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdfium_host::cache::{BoundedCache, Disposable};
use pdfium_host::range;

/// Stand-in artifact sized like a small rendered thumbnail
struct Blob(Vec<u8>);

impl Disposable for Blob {
    fn dispose(&mut self) {
        self.0.clear();
    }
}

/// Benchmark cache churn at a realistic hit rate (key space twice capacity)
fn bench_cache_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_churn");

    for capacity in [16usize, 256] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                let cache = BoundedCache::new(capacity).unwrap();
                let mut i = 0u32;
                b.iter(|| {
                    i = i.wrapping_add(1);
                    let key = i % (capacity as u32 * 2);
                    let hit = cache.with_get(&key, |blob: &Blob| blob.0.len()).unwrap();
                    if hit.is_none() {
                        cache.insert(key, Blob(vec![0u8; 4096])).unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark range parsing on a representative mixed specification
fn bench_range_parse(c: &mut Criterion) {
    let input = "1-5, 10, 15-20, 40, 42, 50-60, 100-150";

    let mut group = c.benchmark_group("range_parse");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("parse", |b| {
        b.iter(|| range::parse(black_box(input)).unwrap());
    });

    group.bench_function("parse_expanded", |b| {
        b.iter(|| range::parse_expanded(black_box(input), 200).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_cache_churn, bench_range_parse);
criterion_main!(benches);
