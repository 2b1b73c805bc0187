//! HNSW index performance benchmarks.
//!
//! Run with: `cargo bench --bench hnsw_benchmark`

use annidx::{Hnsw, Index};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vectors(n: usize, d: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n * d).map(|_| rng.gen_range(-1.0_f32..1.0)).collect()
}

fn bench_hnsw_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_insert");
    let d = 32;

    for &count in &[1_000usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("vectors", count), &count, |b, &count| {
            let x = random_vectors(count, d, 1);
            b.iter(|| {
                let mut idx = Hnsw::with_seed(d, 16, 200, 1);
                idx.add(&x, count).unwrap();
                black_box(idx.ntotal())
            });
        });
    }

    group.finish();
}

fn bench_hnsw_search_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_search_latency");
    let d = 32;
    let n = 10_000;

    let x = random_vectors(n, d, 2);
    let mut idx = Hnsw::with_seed(d, 16, 200, 2);
    idx.add(&x, n).unwrap();
    idx.set_ef(64);

    let query = random_vectors(1, d, 3);

    for &k in &[10usize, 50, 100] {
        group.bench_with_input(BenchmarkId::new("top_k", k), &k, |b, &k| {
            b.iter(|| black_box(idx.search(&query, 1, k).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hnsw_insert, bench_hnsw_search_latency);
criterion_main!(benches);
