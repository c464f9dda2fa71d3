//! Benchmarks for schema compilation.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use strata_schema::{
    CompileOptions, SchemaCompiler, SchemaDefinition, compile_persistence_schema,
    compile_validation_schema,
};

/// A minimal definition with a single field.
fn minimal_definition() -> SchemaDefinition {
    serde_json::from_value(serde_json::json!({
        "name": { "type": "String", "required": true },
    }))
    .expect("definition should deserialize")
}

/// A small user-shaped definition exercising most modifiers.
fn user_definition() -> SchemaDefinition {
    serde_json::from_value(serde_json::json!({
        "email":    { "type": "String", "required": true, "unique": true, "email": true },
        "password": { "type": "String", "minlength": 8 },
        "name":     { "type": "String", "minlength": 2, "maxlength": 64 },
        "age":      { "type": "Number", "min": 13, "max": 130 },
        "role":     { "type": "String", "enum": ["admin", "user", "guest"], "default": "user" },
        "friends":  { "type": "Array", "items": { "type": "ObjectId", "ref": "users" } },
        "address":  {
            "type": "Object",
            "schema": {
                "city": { "type": "String" },
                "zip":  { "type": "String", "minlength": 4 },
            },
        },
        "labels":   { "type": "Map" },
        "joined":   { "type": "Date", "required": true },
    }))
    .expect("definition should deserialize")
}

fn bench_compile_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_pair");

    for (label, definition) in [
        ("minimal", minimal_definition()),
        ("user", user_definition()),
    ] {
        let options = CompileOptions::new().enable_cache(false);
        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &definition,
            |b, definition| {
                b.iter(|| {
                    let validation =
                        compile_validation_schema(black_box(definition), &options).unwrap();
                    let persistence =
                        compile_persistence_schema(black_box(definition), &Default::default());
                    black_box((validation, persistence))
                });
            },
        );
    }

    group.finish();
}

fn bench_cached_compile(c: &mut Criterion) {
    let compiler = SchemaCompiler::new();
    let definition = user_definition();
    let options = CompileOptions::new();

    // Warm the cache once, then measure hits.
    compiler.compile(&definition, &options).unwrap();

    c.bench_function("compile_cached_hit", |b| {
        b.iter(|| black_box(compiler.compile(black_box(&definition), &options).unwrap()));
    });
}

fn bench_parse(c: &mut Criterion) {
    let definition = user_definition();
    let options = CompileOptions::new().enable_cache(false);
    let schema = compile_validation_schema(&definition, &options).unwrap();

    let valid = serde_json::json!({
        "email": "a@b.co",
        "password": "Str0ng!ab",
        "name": "Ada",
        "age": 36,
        "role": "ADMIN",
        "friends": ["507f1f77bcf86cd799439011"],
        "address": { "city": "Oslo", "zip": "00100" },
        "labels": { "env": "prod" },
        "joined": "2024-07-01T12:30:00Z",
    });

    c.bench_function("parse_valid_document", |b| {
        b.iter(|| black_box(schema.parse(black_box(&valid))));
    });
}

criterion_group!(benches, bench_compile_pair, bench_cached_compile, bench_parse);
criterion_main!(benches);
