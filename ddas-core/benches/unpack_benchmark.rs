//! Benchmarks for DDAS hit unpacking.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ddas_core::{HitRecord, HitUnpacker};

/// 250 MSPS hit with energy sums, QDC sums, external clock and an 8-sample trace.
const HIT: [u32; 24] = [
    0x0000002c, 0x0f1000fa, 0x002d2321, 0x0000f687, 0x547f000a, 0x000808be, 0x00000001,
    0x00000002, 0x00000003, 0x00000004, 0x00000005, 0x00000006, 0x00000007, 0x00000008,
    0x00000009, 0x0000000a, 0x0000000b, 0x0000000c, 0x0a0a0b0b, 0x0c0c0d0d, 0x00020001,
    0x00040003, 0x00060005, 0x00080007,
];

fn synthetic_stream(n_hits: usize, trace_samples: u32) -> Vec<u32> {
    let channel_length = 4 + trace_samples.div_ceil(2);
    let mut words = Vec::new();

    for i in 0..n_hits as u32 {
        words.push(channel_length * 2);
        words.push(0x0f0e_01f4);
        words.push((i & 0xF) | 4 << 12 | channel_length << 17);
        words.push(i);
        words.push(((i & 0xFFFF) << 16) | (i >> 16));
        words.push(trace_samples << 16 | (i & 0xFFFF));
        for s in 0..trace_samples.div_ceil(2) {
            words.push((s + 1) << 16 | s);
        }
    }
    words
}

fn unpack_single_benchmark(c: &mut Criterion) {
    let unpacker = HitUnpacker::new();

    let mut group = c.benchmark_group("unpack_single");
    group.throughput(Throughput::Elements(1));

    group.bench_function("owned", |b| {
        b.iter(|| black_box(unpacker.unpack(black_box(&HIT)).unwrap().consumed))
    });

    group.bench_function("in_place", |b| {
        let mut hit = HitRecord::new();
        b.iter(|| {
            let status = unpacker.unpack_into(black_box(&HIT), &mut hit).unwrap();
            black_box(status.consumed)
        })
    });

    group.finish();
}

fn unpack_stream_benchmark(c: &mut Criterion) {
    let unpacker = HitUnpacker::new();
    let mut group = c.benchmark_group("unpack_stream");

    for trace_samples in [0, 250] {
        let words = synthetic_stream(10_000, trace_samples);
        group.throughput(Throughput::Bytes(words.len() as u64 * 4));

        group.bench_function(format!("10k_hits_{trace_samples}_samples"), |b| {
            b.iter(|| {
                let mut window = black_box(words.as_slice());
                let mut hits = 0usize;
                while !window.is_empty() {
                    let unpacked = unpacker.unpack(window).unwrap();
                    window = unpacked.remaining(window);
                    hits += 1;
                }
                black_box(hits)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, unpack_single_benchmark, unpack_stream_benchmark);
criterion_main!(benches);
