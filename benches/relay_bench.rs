//! Performance benchmarks for the verification relay hot paths.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use stark_vip::infra::{
    decode_option_u256_array, encode_array_argument, parse_calldata_output, selector,
    CalldataParseMode,
};
use stark_vip::prover::codec;

/// Calldata tool output with `count` 252-bit elements
fn calldata_output(count: usize) -> String {
    let elements: Vec<String> = (0..count)
        .map(|i| format!("0x{:063x}", (i as u128) * 0x9e3779b97f4a7c15))
        .collect();
    serde_json::to_string(&elements).unwrap()
}

/// Benchmark parsing the calldata tool's stdout
fn bench_calldata_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("calldata_parse");

    for count in [100, 1_000, 3_000].iter() {
        let json = calldata_output(*count);
        let tokens = json
            .trim_matches(|c| c == '[' || c == ']')
            .replace(['"', ','], " ");

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("json_array", count), &json, |b, json| {
            b.iter(|| parse_calldata_output(black_box(json), CalldataParseMode::Strict).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("tokens", count), &tokens, |b, tokens| {
            b.iter(|| {
                parse_calldata_output(black_box(tokens), CalldataParseMode::Tolerant).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark building the `starknet_call` arguments
fn bench_call_encoding(c: &mut Criterion) {
    let calldata =
        parse_calldata_output(&calldata_output(3_000), CalldataParseMode::Strict).unwrap();

    c.bench_function("selector", |b| {
        b.iter(|| selector(black_box("verify_ultra_starknet_zk_honk_proof")))
    });
    c.bench_function("encode_array_argument_3000", |b| {
        b.iter(|| encode_array_argument(black_box(&calldata)))
    });

    let result: Vec<String> = ["0x0", "0x4"]
        .iter()
        .map(|s| s.to_string())
        .chain((0..8).map(|i| format!("{:#x}", i * 1_000_003)))
        .collect();
    c.bench_function("decode_option_u256_array", |b| {
        b.iter(|| decode_option_u256_array(black_box(&result)).unwrap())
    });
}

/// Benchmark the proof transport codec
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for size in [2_048, 16_384, 65_536].iter() {
        let bytes: Vec<u8> = (0..*size).map(|i| (i % 251) as u8).collect();
        let encoded = codec::encode(&bytes);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("encode", size), &bytes, |b, bytes| {
            b.iter(|| codec::encode(black_box(bytes)));
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, text| {
            b.iter(|| codec::decode(black_box(text)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_calldata_parse, bench_call_encoding, bench_codec);
criterion_main!(benches);
