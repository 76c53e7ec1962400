use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use phonescout::extract::PhoneMatcher;
use phonescout::{extract, generator, ExtractConfig};
use std::num::NonZeroUsize;
use tempfile::tempdir;

fn generated_text(bytes: u64) -> String {
    let mut buf = Vec::new();
    generator::generate_to(&mut buf, bytes, 42).unwrap();
    String::from_utf8(buf).unwrap()
}

fn bench_matcher(c: &mut Criterion) {
    let text = generated_text(256 * 1024);
    let matcher = PhoneMatcher::new();

    let mut group = c.benchmark_group("Matcher");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("extract_256k", |b| {
        b.iter(|| black_box(matcher.extract(black_box(&text)).count()));
    });
    group.finish();
}

fn bench_worker_scaling(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("generated.txt");
    let summary = generator::generate_file(&path, 8, 42).unwrap();

    let mut group = c.benchmark_group("Worker Scaling");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(summary.bytes_written));
    for workers in [1, 2, 4, 8] {
        let mut config = ExtractConfig::new(&path);
        config.worker_count = NonZeroUsize::new(workers).unwrap();
        group.bench_function(format!("workers_{}", workers), |b| {
            b.iter(|| black_box(extract(&config).unwrap()));
        });
    }
    group.finish();
}

fn bench_block_size(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("generated.txt");
    generator::generate_file(&path, 8, 7).unwrap();

    let mut group = c.benchmark_group("Block Size");
    group.sample_size(10);
    for block_size in [64 * 1024, 512 * 1024, 4 * 1024 * 1024] {
        let mut config = ExtractConfig::new(&path);
        config.block_size = block_size;
        group.bench_function(format!("block_{}k", block_size / 1024), |b| {
            b.iter(|| black_box(extract(&config).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_matcher, bench_worker_scaling, bench_block_size);
criterion_main!(benches);
