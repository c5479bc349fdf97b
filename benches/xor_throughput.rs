//! Throughput of the packet XOR kernel and of schedule execution

use cauchyrs::engine::xor::xor_into;
use cauchyrs::engine::{CauchyEngine, FieldEngine, Schedule, ScheduleStrategy};
use cauchyrs::CodingParams;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

fn bench_xor_into(c: &mut Criterion) {
    let mut group = c.benchmark_group("xor_into");
    for size in [256usize, 4096, 64 * 1024] {
        let src = vec![0xA5u8; size + 1];
        let mut dst = vec![0x5Au8; size + 1];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("aligned", size), &size, |b, &size| {
            b.iter(|| xor_into(black_box(&mut dst[..size]), black_box(&src[..size])))
        });
        // Source and destination disagree modulo 16, forcing the bytewise path
        group.bench_with_input(BenchmarkId::new("skewed", size), &size, |b, &size| {
            b.iter(|| xor_into(black_box(&mut dst[..size]), black_box(&src[1..size + 1])))
        });
    }
    group.finish();
}

fn bench_schedule_strategy(c: &mut Criterion) {
    let params = CodingParams::new(8, 4, 8).unwrap();
    let engine = CauchyEngine::new();
    let matrix = engine.generate_cauchy_matrix(&params);
    let bits = engine.matrix_to_bitmatrix(&params, &matrix);
    let packet_size = 512;
    let fragment_size = packet_size * params.w();

    let data: Vec<Vec<u8>> = (0..params.k())
        .map(|d| vec![d as u8 + 1; fragment_size])
        .collect();
    let data_refs: Vec<&[u8]> = data.iter().map(Vec::as_slice).collect();

    let mut group = c.benchmark_group("schedule_execute");
    group.throughput(Throughput::Bytes((fragment_size * params.k()) as u64));
    for strategy in [ScheduleStrategy::Smart, ScheduleStrategy::Dumb] {
        let schedule = Schedule::from_bitmatrix(strategy, params.k(), params.w(), &bits);
        let mut parity = vec![vec![0u8; fragment_size]; params.m()];
        group.bench_function(BenchmarkId::new("encode", format!("{strategy:?}")), |b| {
            b.iter(|| {
                let mut outputs: Vec<&mut [u8]> =
                    parity.iter_mut().map(Vec::as_mut_slice).collect();
                schedule
                    .execute(&data_refs, &mut outputs, packet_size)
                    .unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_xor_into, bench_schedule_strategy);
criterion_main!(benches);
