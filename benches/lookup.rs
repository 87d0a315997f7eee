//! Lookup Benchmark for linefind
//!
//! This benchmark measures the per-query cost of the search algorithms
//! over datasets of various sizes, separating the reread strategies
//! (which pay file I/O per query) from the cached strategies (which pay
//! once at build time).

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use linefind::search::algorithms::{
    build_set_cache, build_sorted_lines, linear_scan_file, mmap_scan, set_cache_contains,
    sorted_bisect,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Writes a dataset of `n` distinct lines and returns its location.
fn make_dataset(n: usize) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    let mut content = String::new();
    for i in 0..n {
        content.push_str(&format!("row-{i:08}\n"));
    }
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// Benchmark the reread strategies (per-query file pass)
fn bench_reread(c: &mut Criterion) {
    let (_dir, path) = make_dataset(10_000);

    // Hit near the end and a guaranteed miss: worst cases for the scans.
    let deep_hit = "row-00009999";
    let miss = "row-none";

    let mut group = c.benchmark_group("reread");
    group.throughput(Throughput::Elements(1));

    group.bench_function("linear_scan_hit", |b| {
        b.iter(|| black_box(linear_scan_file(&path, deep_hit).unwrap()));
    });

    group.bench_function("linear_scan_miss", |b| {
        b.iter(|| black_box(linear_scan_file(&path, miss).unwrap()));
    });

    group.bench_function("mmap_scan_hit", |b| {
        b.iter(|| black_box(mmap_scan(&path, deep_hit).unwrap()));
    });

    group.bench_function("mmap_scan_miss", |b| {
        b.iter(|| black_box(mmap_scan(&path, miss).unwrap()));
    });

    group.finish();
}

/// Benchmark the cached strategies (snapshot built once)
fn bench_cached(c: &mut Criterion) {
    let (_dir, path) = make_dataset(100_000);

    let cache = build_set_cache(&path).unwrap();
    let sorted = build_sorted_lines(&path).unwrap();

    let mut group = c.benchmark_group("cached");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_cache_hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let query = format!("row-{:08}", i % 100_000);
            black_box(set_cache_contains(&cache, &query));
            i += 1;
        });
    });

    group.bench_function("set_cache_miss", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let query = format!("missing-{i}");
            black_box(set_cache_contains(&cache, &query));
            i += 1;
        });
    });

    group.bench_function("sorted_bisect_hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let query = format!("row-{:08}", i % 100_000);
            black_box(sorted_bisect(&sorted, &query));
            i += 1;
        });
    });

    group.bench_function("sorted_bisect_miss", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let query = format!("missing-{i}");
            black_box(sorted_bisect(&sorted, &query));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark snapshot construction cost
fn bench_build(c: &mut Criterion) {
    let (_dir, path) = make_dataset(100_000);

    let mut group = c.benchmark_group("build");

    group.bench_function("set_cache", |b| {
        b.iter(|| black_box(build_set_cache(&path).unwrap()));
    });

    group.bench_function("sorted_lines", |b| {
        b.iter(|| black_box(build_sorted_lines(&path).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_reread, bench_cached, bench_build);
criterion_main!(benches);
