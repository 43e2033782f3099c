use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docx_rs::{Docx, Paragraph, Run};
use officescout::search::KeywordMatcher;
use officescout::{NullReporter, Scout, ScoutConfig, SearchOptions};
use std::io::Cursor;
use tempfile::tempdir;

fn sample_text(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "Paragraph {} covers the quarterly Budget review. Größe und Straße {}.",
                i, i
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

fn bench_text_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_matching");
    for paragraphs in [10, 100, 1000] {
        let text = sample_text(paragraphs);
        let insensitive = KeywordMatcher::new(keywords(&["budget", "straße"]), false);
        let sensitive = KeywordMatcher::new(keywords(&["Budget", "Straße"]), true);

        group.bench_with_input(
            BenchmarkId::new("case_insensitive", paragraphs),
            &text,
            |b, text| b.iter(|| insensitive.find_in_text(black_box(text)).len()),
        );
        group.bench_with_input(
            BenchmarkId::new("case_sensitive", paragraphs),
            &text,
            |b, text| b.iter(|| sensitive.find_in_text(black_box(text)).len()),
        );
    }
    group.finish();
}

fn bench_cell_matching(c: &mut Criterion) {
    let cells: Vec<String> = (0..10_000)
        .map(|i| format!("Invoice {} for Budget line {}", 2000 + i % 50, i))
        .collect();
    let matcher = KeywordMatcher::new(keywords(&["2024", "budget", "missing"]), false);

    c.bench_function("cell_matching_10k", |b| {
        b.iter(|| {
            cells
                .iter()
                .map(|cell| matcher.find_in_cell(black_box(cell)).len())
                .sum::<usize>()
        })
    });
}

fn bench_cached_search(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        let docx = Docx::new().add_paragraph(
            Paragraph::new().add_run(Run::new().add_text(sample_text(20).replace("\n\n", " "))),
        );
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        std::fs::write(dir.path().join(format!("doc_{}.docx", i)), buf.into_inner()).unwrap();
    }

    let scout = Scout::new(ScoutConfig::default());
    let options = SearchOptions::new(dir.path(), "budget, straße");
    // Warm the cache so the loop measures traversal and matching only
    scout.search(&options, &NullReporter).unwrap();

    c.bench_function("cached_search_20_docx", |b| {
        b.iter(|| scout.search(black_box(&options), &NullReporter).unwrap())
    });
}

criterion_group!(
    benches,
    bench_text_matching,
    bench_cell_matching,
    bench_cached_search
);
criterion_main!(benches);
