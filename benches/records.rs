//! Record engine benchmarks for flexrec
//!
//! These benchmarks measure the operations a request/response loop performs:
//! binding bytes, reading fields lazily, overlaying a few writes, and
//! re-encoding, with and without a record pool.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flexrec::{PoolConfig, Record, RecordPool, Schema};
use std::hint::black_box as hint_black_box;
use std::sync::Arc;

fn product_schema() -> Arc<Schema> {
    Schema::from_definition(
        r#"{
            "name": "string",
            "price": "float32",
            "quantity": "int32",
            "tags": "[]string",
            "sizes": "[]int32",
            "seller": { "id": "int64", "rating": "float64" }
        }"#,
    )
    .unwrap()
}

fn sample_bytes(schema: &Arc<Schema>) -> Vec<u8> {
    let mut record = Record::new(Arc::clone(schema));
    record.set("name", "Cola").unwrap();
    record.set("price", 0.123f32).unwrap();
    record.set("quantity", 42).unwrap();
    record.set("tags", vec!["fizzy", "sweet", "cold"]).unwrap();
    record.set("sizes", (0..64).collect::<Vec<i32>>()).unwrap();
    let mut seller = record.new_nested("seller").unwrap();
    seller.set("id", 7i64).unwrap();
    seller.set("rating", 4.8).unwrap();
    record.set("seller", seller).unwrap();
    record.to_bytes().unwrap()
}

fn bench_lazy_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("lazy_reads");
    let schema = product_schema();
    let bytes = bytes::Bytes::from(sample_bytes(&schema));

    group.bench_function("bind", |b| {
        b.iter(|| hint_black_box(Record::from_bytes(Arc::clone(&schema), black_box(bytes.clone()))));
    });

    let record = Record::from_bytes(Arc::clone(&schema), bytes.clone());
    group.bench_function("get_int32", |b| {
        b.iter(|| hint_black_box(record.get_int32(black_box("quantity")).unwrap()));
    });

    group.bench_function("get_str", |b| {
        b.iter(|| hint_black_box(record.get_str(black_box("name")).unwrap()));
    });

    group.bench_function("array_element", |b| {
        b.iter(|| {
            let view = record.array("sizes").unwrap().unwrap();
            hint_black_box(view.get_int32(black_box(63)).unwrap())
        });
    });

    group.bench_function("nested_scalar", |b| {
        b.iter(|| {
            let seller = record.nested("seller").unwrap().unwrap();
            hint_black_box(seller.get_float64("rating").unwrap())
        });
    });

    group.finish();
}

fn bench_update_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_cycle");
    let schema = product_schema();
    let bytes = bytes::Bytes::from(sample_bytes(&schema));

    group.bench_function("unpooled", |b| {
        b.iter(|| {
            let mut record = Record::from_bytes(Arc::clone(&schema), bytes.clone());
            record.set("quantity", black_box(3)).unwrap();
            hint_black_box(record.to_bytes().unwrap())
        });
    });

    let pool = RecordPool::new(PoolConfig::default().initial_records(4).builder_capacity(1024));
    group.bench_function("pooled", |b| {
        b.iter(|| {
            let mut record = pool.acquire_bound(&schema, bytes.clone());
            record.set("quantity", black_box(3)).unwrap();
            let out = record.to_bytes().unwrap();
            pool.release(record);
            hint_black_box(out)
        });
    });

    group.finish();
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    let schema = product_schema();
    let bytes = bytes::Bytes::from(sample_bytes(&schema));

    for extra in [1usize, 16, 256] {
        let tail: Vec<i32> = (0..extra as i32).collect();
        group.bench_with_input(BenchmarkId::new("sizes", extra), &tail, |b, tail| {
            b.iter(|| {
                let mut record = Record::from_bytes(Arc::clone(&schema), bytes.clone());
                record.append("sizes", tail.clone()).unwrap();
                hint_black_box(record.to_bytes().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("json");
    let schema = product_schema();
    let record = Record::from_bytes(Arc::clone(&schema), sample_bytes(&schema));
    let text = record.to_json().unwrap();

    group.bench_function("to_json", |b| {
        b.iter(|| hint_black_box(record.to_json().unwrap()));
    });

    group.bench_function("apply_json", |b| {
        b.iter(|| {
            let mut fresh = Record::new(Arc::clone(&schema));
            fresh.apply_json(black_box(&text)).unwrap();
            hint_black_box(fresh)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_lazy_reads,
    bench_update_cycle,
    bench_append,
    bench_json
);
criterion_main!(benches);
