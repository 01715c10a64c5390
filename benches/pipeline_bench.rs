//! Benchmarks for chunksig.
//!
//! Run with:
//!     cargo bench

use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chunksig::{HashAlgorithm, Pipeline, PipelineConfig};

const MIB: usize = 1024 * 1024;

fn config(chunk_size: usize, workers: usize) -> PipelineConfig {
    PipelineConfig::default()
        .with_chunk_size(chunk_size)
        .with_worker_count(workers)
}

fn bench_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("algorithms");
    let size = 16 * MIB;
    // Deterministic pseudo-random data
    let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();

    group.throughput(Throughput::Bytes(size as u64));
    for algorithm in HashAlgorithm::ALL {
        let pipeline = Pipeline::new(config(MIB, 4), *algorithm).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(algorithm), &data, |b, data| {
            b.iter(|| {
                let signature = pipeline.run(Cursor::new(black_box(data))).unwrap();
                black_box(signature.len())
            });
        });
    }

    group.finish();
}

fn bench_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("workers");
    let size = 16 * MIB;
    let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();

    group.throughput(Throughput::Bytes(size as u64));
    for workers in [1, 2, 4, 8] {
        let pipeline = Pipeline::new(config(MIB, workers), HashAlgorithm::Md5).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &data, |b, data| {
            b.iter(|| black_box(pipeline.run(Cursor::new(data)).unwrap()));
        });
    }

    group.finish();
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_sizes");
    let size = 16 * MIB;
    let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();

    group.throughput(Throughput::Bytes(size as u64));
    for chunk_size in [64 * 1024, 256 * 1024, MIB, 4 * MIB] {
        let pipeline = Pipeline::new(config(chunk_size, 4), HashAlgorithm::Crc32).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}kb", chunk_size / 1024)),
            &data,
            |b, data| {
                b.iter(|| black_box(pipeline.run(Cursor::new(data)).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_algorithms, bench_workers, bench_chunk_sizes);
criterion_main!(benches);
