//! Benchmarks for spec compilation and shift execution
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use treeshift_core::{Chain, Context, Shift, Transform};

fn rating_spec() -> Value {
    json!({
        "rating": {
            "primary": {"value": "Rating", "max": "RatingRange"},
            "*": {
                "value": "SecondaryRatings.&1.Value",
                "max": "SecondaryRatings.&1.Range",
                "&": "SecondaryRatings.&1.Id"
            }
        }
    })
}

fn create_rating_data(categories: usize) -> Value {
    let mut rating = serde_json::Map::new();
    rating.insert("primary".to_string(), json!({"value": 3, "max": 5}));
    for i in 0..categories {
        rating.insert(format!("category{}", i), json!({"value": i % 5, "max": 5}));
    }
    json!({ "rating": Value::Object(rating) })
}

fn create_catalog(items: usize) -> Value {
    let products: Vec<Value> = (0..items)
        .map(|i| {
            json!({
                "id": format!("p{}", i),
                "name": format!("Product {}", i),
                "price": (i as f64) * 1.25,
                "tags": ["a", "b", "c"]
            })
        })
        .collect();
    json!({ "products": products })
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    let specs = [
        ("literal", json!({"a": {"b": {"c": "x.y.z"}}})),
        ("rating", rating_spec()),
        (
            "wildcards",
            json!({"*": {"tag-*": "tags.&(0,1)", "*-*-*": "multi[]", "@": "all[]"}}),
        ),
    ];

    for (name, spec) in specs.iter() {
        group.bench_with_input(BenchmarkId::new("build", name), spec, |b, spec| {
            b.iter(|| Shift::new(black_box(spec)).unwrap())
        });
    }

    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");
    let shift = Shift::new(&rating_spec()).unwrap();

    for categories in [1usize, 10, 100] {
        let input = create_rating_data(categories);
        group.bench_with_input(
            BenchmarkId::new("rating", categories),
            &input,
            |b, input| b.iter(|| shift.apply(black_box(input)).unwrap()),
        );
    }

    group.finish();
}

fn bench_large_dataset(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_dataset");
    let pivot = Shift::new(&json!({
        "products": {
            "*": {
                "name": "byId.@(1,id).name",
                "price": "byId.@(1,id).price",
                "tags": {"*": "tags[]"}
            }
        }
    }))
    .unwrap();

    for items in [100usize, 1000] {
        let input = create_catalog(items);
        group.bench_with_input(BenchmarkId::new("pivot", items), &input, |b, input| {
            b.iter(|| pivot.apply(black_box(input)).unwrap())
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let chain = Chain::from_value(json!([
        {"operation": "shift", "spec": rating_spec()},
        {"operation": "default", "spec": {"Rating": 0, "RatingRange": 5}},
        {"operation": "remove", "spec": {"SecondaryRatings": {"*": {"Id": ""}}}}
    ]))
    .unwrap();
    let input = create_rating_data(10);
    let context = Context::new();

    c.bench_function("chain/rating_pipeline", |b| {
        b.iter(|| chain.transform(black_box(input.clone()), &context).unwrap())
    });
}

criterion_group!(
    benches,
    bench_compile,
    bench_apply,
    bench_large_dataset,
    bench_chain
);
criterion_main!(benches);
