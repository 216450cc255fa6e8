//! Criterion benchmarks for the usage-export CSV parser

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use repbill::parser::parse_usage_csv;
use std::hint::black_box;

const HEADER: &str = "admin_username,limited_1m,limited_2m,limited_3m,limited_4m,limited_5m,limited_6m,unlimited_1m,unlimited_2m,unlimited_3m,unlimited_4m,unlimited_5m,unlimited_6m";

/// Synthesize an export with `rows` representatives, a sprinkling of
/// quoted fields, and the occasional null-sentinel row.
fn synthesize_export(rows: usize) -> String {
    let mut content = String::with_capacity(rows * 48);
    content.push_str(HEADER);
    content.push('\n');

    for i in 0..rows {
        if i % 40 == 39 {
            content.push_str("null,0,0,0,0,0,0,0,0,0,0,0,0\n");
            continue;
        }
        let gb = (i % 50) + 1;
        if i % 10 == 0 {
            content.push_str(&format!(
                "\"shop_{},main\",{},{},0,0,0,0,{},0,0,0,0,0\n",
                i,
                gb,
                gb / 2,
                i % 4
            ));
        } else {
            content.push_str(&format!(
                "rep_{},{},{},0,0,0,0,{},1,0,0,0,0\n",
                i,
                gb,
                gb / 2,
                i % 4
            ));
        }
    }

    content
}

fn bench_parse_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    for rows in [100usize, 1_000, 10_000] {
        let content = synthesize_export(rows);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("parse_usage_csv", format!("{} rows", rows)),
            &content,
            |b, content| {
                b.iter(|| parse_usage_csv(black_box(content)));
            },
        );
    }

    group.finish();
}

fn bench_parse_single_row(c: &mut Criterion) {
    let line = "ali_vpn,10,5,0,0,0,0,2,1,0,0,0,0";

    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(line.len() as u64));

    group.bench_function("parse_single_row", |b| {
        b.iter(|| parse_usage_csv(black_box(line)));
    });

    group.finish();
}

criterion_group!(benches, bench_parse_file, bench_parse_single_row);
criterion_main!(benches);
