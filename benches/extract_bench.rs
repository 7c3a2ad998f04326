#![allow(clippy::expect_used)]

use std::fmt::Write;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use xmlselect::config::ExtractConfig;
use xmlselect::extract::{NullReporter, XPathTransformer};
use xmlselect::parser::parse_str;
use xmlselect::xpath::XPath;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// A catalog row with `books` entries.
fn make_catalog(books: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<catalog>\n");
    for i in 0..books {
        let genre = if i % 3 == 0 { "fiction" } else { "science" };
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\" genre=\"{genre}\"><title>Title {i}</title>\
             <author>Author {i}</author><price>{}.99</price></book>",
            10 + i % 40
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

fn transformer(expressions: &[&str]) -> XPathTransformer {
    let config = ExtractConfig::new("xml").expressions(expressions.iter().copied());
    XPathTransformer::new(&config, Arc::new(NullReporter))
}

const EXPRESSIONS: [&str; 4] = [
    "/catalog/book[1]/title/text()",
    "//book/title/text()",
    "//book[@genre='fiction' and number(price) > 20]/title",
    "//book[last()]/@id",
];

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_expressions", |b| {
        b.iter(|| {
            for expr in EXPRESSIONS {
                let _ = XPath::compile(black_box(expr));
            }
        });
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let xml = make_catalog(100);
    let doc = parse_str(&xml).expect("failed to parse catalog");
    let simple = XPath::compile("//book/title").expect("invalid expression");
    let complex = XPath::compile(EXPRESSIONS[2]).expect("invalid expression");
    c.bench_function("xpath_simple", |b| {
        b.iter(|| simple.evaluate(black_box(&doc), doc.root()));
    });
    c.bench_function("xpath_complex", |b| {
        b.iter(|| complex.evaluate(black_box(&doc), doc.root()));
    });
}

fn bench_transform_row(c: &mut Criterion) {
    let t = transformer(&EXPRESSIONS);
    let mut group = c.benchmark_group("transform_row");
    for books in [10, 100, 1000] {
        let xml = make_catalog(books);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_function(format!("{books}_books"), |b| {
            b.iter(|| t.transform(black_box(Some(xml.as_str()))));
        });
    }
    group.finish();
}

fn bench_transform_batch(c: &mut Criterion) {
    let t = transformer(&EXPRESSIONS);
    let owned: Vec<String> = (0..256).map(|i| make_catalog(5 + i % 20)).collect();
    let rows: Vec<Option<&str>> = owned.iter().map(|s| Some(s.as_str())).collect();
    let mut group = c.benchmark_group("transform_batch");
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("sequential", |b| {
        b.iter(|| {
            rows.iter()
                .map(|row| t.transform(black_box(*row)))
                .collect::<Vec<_>>()
        });
    });
    group.bench_function("parallel", |b| {
        b.iter(|| t.transform_batch(black_box(&rows)));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_evaluate,
    bench_transform_row,
    bench_transform_batch
);
criterion_main!(benches);
