//! Criterion benchmarks for the hot paths: flattening and schema
//! generation, single-document and batch.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use json_tools_core::{flatten, generate_schema, Pipeline};
use serde_json::{json, Value};

fn deep_document() -> Vec<u8> {
    let doc = json!({
        "user": {
            "name": "John",
            "details": {"age": 30, "city": "NYC", "scores": [1, 2, 3, 4, 5]},
            "tags": ["alpha", "beta", "gamma"],
            "meta": {"created": "2024-01-01", "flags": {"a": true, "b": false}}
        },
        "items": [{"id": 1, "price": 9.99}, {"id": 2, "price": 19.99}]
    });
    serde_json::to_vec(&doc).unwrap()
}

fn batch_document(len: usize) -> Vec<u8> {
    let docs: Vec<Value> = (0..len)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("record-{i}"),
                "nested": {"values": [i, i + 1, i + 2], "active": i % 2 == 0}
            })
        })
        .collect();
    serde_json::to_vec(&Value::Array(docs)).unwrap()
}

fn bench_flatten(c: &mut Criterion) {
    let doc = deep_document();
    c.bench_function("flatten/single", |b| {
        b.iter(|| flatten(black_box(&doc), false, None).unwrap())
    });

    let batch = batch_document(1_000);
    c.bench_function("flatten/batch-1k-st", |b| {
        b.iter(|| flatten(black_box(&batch), false, Some(1)).unwrap())
    });
    c.bench_function("flatten/batch-1k-mt", |b| {
        b.iter(|| flatten(black_box(&batch), false, Some(4)).unwrap())
    });
}

fn bench_schema(c: &mut Criterion) {
    let doc = deep_document();
    c.bench_function("schema/single", |b| {
        b.iter(|| generate_schema(black_box(&doc), false, None).unwrap())
    });

    let batch = batch_document(1_000);
    c.bench_function("schema/batch-1k-st", |b| {
        b.iter(|| generate_schema(black_box(&batch), false, Some(1)).unwrap())
    });
    c.bench_function("schema/batch-1k-mt", |b| {
        b.iter(|| generate_schema(black_box(&batch), false, Some(4)).unwrap())
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let doc = deep_document();
    c.bench_function("pipeline/filter-rewrite-flatten", |b| {
        b.iter(|| {
            Pipeline::new()
                .add_json(black_box(&doc))
                .unwrap()
                .remove_empty_strings()
                .remove_nulls()
                .replace_keys("^meta$", "metadata")
                .flatten()
                .build()
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_flatten, bench_schema, bench_pipeline);
criterion_main!(benches);
