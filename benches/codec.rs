#![allow(clippy::unwrap_used)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use drisl::{marshal, unmarshal, validate, Cid, DecOptions, Value, ValueMap};

fn sample_small() -> Vec<u8> {
    vec![0xa1, 0x61, 0x61, 0x01] // {"a":1}
}

fn sample_medium() -> Vec<u8> {
    let mut entries = Vec::new();
    for i in 0..64_i64 {
        entries.push((format!("k{i:03}"), Value::from(i)));
    }
    let map = Value::Map(ValueMap::from_entries(entries).unwrap());
    marshal(&map).unwrap()
}

fn sample_with_cids() -> Vec<u8> {
    let mut entries = Vec::new();
    for i in 0..32_i64 {
        let cid = Cid::hash_bytes(format!("blob-{i}").as_bytes());
        entries.push((format!("k{i:03}"), Value::Cid(cid)));
    }
    let map = Value::Map(ValueMap::from_entries(entries).unwrap());
    marshal(&map).unwrap()
}

fn bench_codec(c: &mut Criterion) {
    let opts = DecOptions::default();

    let small = sample_small();
    c.bench_function("validate_small", |b| {
        b.iter(|| {
            validate(black_box(&small), &opts).unwrap();
        })
    });

    let medium = sample_medium();
    c.bench_function("validate_medium", |b| {
        b.iter(|| {
            validate(black_box(&medium), &opts).unwrap();
        })
    });

    c.bench_function("unmarshal_medium", |b| {
        b.iter(|| {
            let v: Value = unmarshal(black_box(&medium)).unwrap();
            black_box(v);
        })
    });

    let decoded: Value = unmarshal(&medium).unwrap();
    c.bench_function("marshal_medium", |b| {
        b.iter(|| {
            let bytes = marshal(black_box(&decoded)).unwrap();
            black_box(bytes);
        })
    });

    let with_cids = sample_with_cids();
    c.bench_function("unmarshal_with_cids", |b| {
        b.iter(|| {
            let v: Value = unmarshal(black_box(&with_cids)).unwrap();
            black_box(v);
        })
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
