use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_canon::{
    decode, decode_with, dedup, deep_clone, encode, encode_with, from_str, to_string,
    DecodeOptions, EncodeOptions, Hooked, HostValue,
};

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn alice() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn benchmark_simple_struct(c: &mut Criterion) {
    let user = alice();
    let text = to_string(&user).unwrap();

    c.bench_function("serialize_simple_struct", |b| {
        b.iter(|| to_string(black_box(&user)))
    });
    c.bench_function("deserialize_simple_struct", |b| {
        b.iter(|| from_str::<User>(black_box(&text)))
    });
}

fn benchmark_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("array");

    for size in [10, 100, 500] {
        let items = products(size);
        let text = to_string(&items).unwrap();

        group.bench_with_input(BenchmarkId::new("serialize", size), &items, |b, items| {
            b.iter(|| to_string(black_box(items)))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &text, |b, text| {
            b.iter(|| decode(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_hooks(c: &mut Criterion) {
    let mut group = c.benchmark_group("hooks");
    let host = HostValue::from_serialize(&products(100)).unwrap();
    let text = encode(&host).unwrap();

    let filter = EncodeOptions::new().with_filter(|key, value| {
        Ok(if key == "sku" {
            Hooked::Omit
        } else {
            Hooked::Keep(value.clone())
        })
    });
    let allowlist = EncodeOptions::new().with_allowlist(["name", "price"]);
    let reviver = DecodeOptions::new().with_reviver(|_, value| Ok(Hooked::Keep(value)));

    group.bench_function("encode_plain", |b| b.iter(|| encode(black_box(&host))));
    group.bench_function("encode_filter", |b| {
        b.iter(|| encode_with(black_box(&host), &filter))
    });
    group.bench_function("encode_allowlist", |b| {
        b.iter(|| encode_with(black_box(&host), &allowlist))
    });
    group.bench_function("decode_reviver", |b| {
        b.iter(|| decode_with(black_box(&text), &reviver))
    });
    group.finish();
}

fn benchmark_derived(c: &mut Criterion) {
    let mut group = c.benchmark_group("derived");
    let host = HostValue::from_serialize(&products(100)).unwrap();
    let repeated: Vec<HostValue> = (0..200)
        .map(|i| HostValue::from_serialize(&products(1 + i % 20)).unwrap())
        .collect();

    group.bench_function("deep_clone", |b| b.iter(|| deep_clone(black_box(&host))));
    group.bench_function("dedup", |b| b.iter(|| dedup(black_box(&repeated))));
    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let user = alice();
    let mut group = c.benchmark_group("comparison");

    group.bench_function("canon_serialize", |b| {
        b.iter(|| serde_canon::to_string(black_box(&user)))
    });
    group.bench_function("json_serialize", |b| {
        b.iter(|| serde_json::to_string(black_box(&user)))
    });

    let text = serde_json::to_string(&user).unwrap();
    group.bench_function("canon_deserialize", |b| {
        b.iter(|| serde_canon::from_str::<User>(black_box(&text)))
    });
    group.bench_function("json_deserialize", |b| {
        b.iter(|| serde_json::from_str::<User>(black_box(&text)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_simple_struct,
    benchmark_array,
    benchmark_hooks,
    benchmark_derived,
    benchmark_comparison_with_json
);
criterion_main!(benches);
