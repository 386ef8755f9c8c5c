use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use readmode_core::preprocess::{PreprocessConfig, preprocess_html, remove_noise};
use readmode_core::readability::extract_content;
use readmode_core::structured::extract_structured;
use readmode_core::{Document, ExtractionConfig, ReadabilityConfig, Trace, extract_article};
use url::Url;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let small = fixture("teaser_with_json_ld.html");
    let medium = fixture("article.html");

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "teaser"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "article"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_full_extraction(c: &mut Criterion) {
    let url = Url::parse("https://ledger.example/2024/05/council-budget").unwrap();
    let config = ExtractionConfig::default();

    let mut group = c.benchmark_group("extract_article");
    for name in ["article.html", "teaser_with_json_ld.html", "nav_heavy.html"] {
        let html = fixture(name);
        group.bench_with_input(BenchmarkId::from_parameter(name), &html, |b, html| {
            b.iter(|| extract_article(black_box(html), &url, &config, &mut Trace::new()))
        });
    }
    group.finish();
}

fn bench_preprocess(c: &mut Criterion) {
    let html = fixture("article.html");
    let config = PreprocessConfig::default();

    c.bench_function("remove_noise", |b| b.iter(|| remove_noise(black_box(&html))));
    c.bench_function("preprocess", |b| b.iter(|| preprocess_html(black_box(&html), &config)));
}

fn bench_strategies(c: &mut Criterion) {
    let html = fixture("article.html");
    let doc = Document::parse_cleaned(&html, &PreprocessConfig::default()).unwrap();
    let config = ReadabilityConfig::default();

    c.bench_function("readability", |b| b.iter(|| extract_content(black_box(&doc), black_box(&config))));

    let teaser = Document::parse(&fixture("teaser_with_json_ld.html")).unwrap();
    c.bench_function("structured_data", |b| b.iter(|| extract_structured(black_box(&teaser))));
}

criterion_group!(benches, bench_parse, bench_full_extraction, bench_preprocess, bench_strategies);
criterion_main!(benches);
