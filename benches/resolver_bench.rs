//! Resolver and compiler throughput.
//!
//! Measures decoding of each storage generation and compilation of a large
//! field list, the hot paths of list views and exports.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feedback_core::compile::{compile, Context, Shape};
use feedback_core::decode::{repair::repair_malformed_json, resolve};
use feedback_core::logging::LogContext;
use serde_json::json;

fn canonical_document(field_count: usize) -> String {
    let fields: Vec<_> = (1..=field_count)
        .map(|n| {
            json!({
                "key": format!("{}_Field {}", n, n),
                "label": format!("Field {}", n),
                "value": format!("value number {} with \"quotes\"", n),
                "type": if n % 5 == 0 { "textarea" } else { "text" },
                "meta": {},
            })
        })
        .collect();
    json!({
        "subject": "Bench",
        "ip": "192.0.2.1",
        "entry_title": "Contact",
        "entry_page": 1,
        "source_id": 1,
        "source_type": "single",
        "request_url": "https://site.test/contact/",
        "fields": fields,
    })
    .to_string()
}

fn legacy_document(field_count: usize) -> String {
    let mut content = String::from("Message body<!--more-->AUTHOR: Ann\nAUTHOR EMAIL: ann@example.com\nSUBJECT: Bench\nIP: 192.0.2.1\nArray\n(\n");
    for n in 1..=field_count {
        content.push_str(&format!("    [{}_Field {}] =&gt; value {}\n", n, n, n));
    }
    content.push(')');
    content
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let ctx = LogContext::new("bench");

    let canonical = canonical_document(20);
    group.bench_function("gen3_20_fields", |b| {
        b.iter(|| black_box(resolve(black_box(&canonical), Some("v3"), &ctx)));
    });

    // Bare quotes in user text force the repair pass.
    let gen2 = canonical.replace("\\\"", "\"").replace('"', "\\\"");
    group.bench_function("gen2_20_fields_repaired", |b| {
        b.iter(|| black_box(resolve(black_box(&gen2), Some("v2"), &ctx)));
    });

    let legacy = legacy_document(20);
    group.bench_function("legacy_20_fields", |b| {
        b.iter(|| black_box(resolve(black_box(&legacy), None, &ctx)));
    });

    group.bench_function("repair_table", |b| {
        b.iter(|| black_box(repair_malformed_json(black_box(&gen2))));
    });

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let parsed = resolve(&canonical_document(500), Some("v3"), &LogContext::new("bench"));

    group.bench_function("csv_label_value_500_fields", |b| {
        b.iter(|| black_box(compile(black_box(&parsed.fields), Context::Csv, Shape::LabelValue)));
    });

    group.bench_function("api_all_500_fields", |b| {
        b.iter(|| black_box(compile(black_box(&parsed.fields), Context::Api, Shape::All)));
    });

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_compile);
criterion_main!(benches);
