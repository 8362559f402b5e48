//! Benchmarks for the decoding cursor.
//!
//! Measures linear walks in both decode modes and the cost of the classification queries:
//! - Fast walk over a function body
//! - Text walk over the same body
//! - Fast walk over arbitrary bytes (invalid-heavy)
//! - Flow-control and target resolution per instruction

extern crate codecursor;

use codecursor::{
    disassembler::{decode_stream, DecodeMode, DecoderConfig},
    Decoder,
};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

/// A small leaf function repeated to get a measurable buffer.
fn function_bodies(count: usize) -> Vec<u8> {
    const BODY: [u8; 41] = [
        0x55, 0x48, 0x89, 0xE5, 0x48, 0x83, 0xEC, 0x10, 0x48, 0x89, 0xC8, 0x48, 0x01, 0xD0, 0x4C,
        0x01, 0xC0, 0x4C, 0x01, 0xC8, 0x48, 0xC7, 0xC1, 0x05, 0x00, 0x00, 0x00, 0x48, 0xF7, 0xE1,
        0x74, 0x04, 0xFF, 0x25, 0x10, 0x00, 0x00, 0x00, 0x5D, 0xC3, 0xCC,
    ];
    BODY.iter().copied().cycle().take(BODY.len() * count).collect()
}

fn noise(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

/// Benchmark fast and text walks over function bodies.
fn bench_walk(c: &mut Criterion) {
    let code = function_bodies(256);

    let mut group = c.benchmark_group("walk");
    group.throughput(Throughput::Bytes(code.len() as u64));
    group.bench_function("fast", |b| {
        b.iter(|| {
            let count = Decoder::new(black_box(&code), 0x1_4000_1000).count();
            black_box(count)
        });
    });
    group.bench_function("text", |b| {
        let config = DecoderConfig::default().with_mode(DecodeMode::Text);
        b.iter(|| {
            let instrs = decode_stream(black_box(&code), 0x1_4000_1000, config).unwrap();
            black_box(instrs)
        });
    });
    group.finish();
}

/// Benchmark a fast-mode walk over bytes that are mostly not code.
fn bench_walk_noise(c: &mut Criterion) {
    let data = noise(16 * 1024);

    let mut group = c.benchmark_group("walk");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("noise", |b| {
        b.iter(|| {
            let count = Decoder::new(black_box(&data), 0).count();
            black_box(count)
        });
    });
    group.finish();
}

/// Benchmark classification queries over an already decoded stream.
fn bench_classify(c: &mut Criterion) {
    let code = function_bodies(64);
    let instrs = decode_stream(&code, 0x1000, DecoderConfig::default()).unwrap();

    c.bench_function("classify", |b| {
        b.iter(|| {
            let mut targets = 0u64;
            for instr in black_box(&instrs) {
                black_box(instr.flow_control());
                targets = targets
                    .wrapping_add(instr.branch_target())
                    .wrapping_add(instr.memory_address());
            }
            black_box(targets)
        });
    });
}

criterion_group!(
    benches,
    bench_walk,
    bench_walk_noise,
    bench_classify
);
criterion_main!(benches);
