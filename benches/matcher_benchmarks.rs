//! Benchmarks for brace scans.
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use bracelight_buffer::Snapshot;
use bracelight_core::matcher::{PairOutcome, ScanContext, find_pair};
use bracelight_core::{DelimiterTable, PlainText, RevisionClock};
use bracelight_syntax::SyntaxClassifier;

/// Generates a function whose body spans `lines` lines.
fn generate_block(lines: usize) -> String {
    let mut text = String::from("fn bench() {\n");
    for i in 0..lines {
        text.push_str(&format!("    let v{i} = [({i}, \"x\"), ({i}, 0)]; // item {i}\n"));
    }
    text.push_str("}\n");
    text
}

/// Benchmarks a scan from the outer brace, bounded by a viewport or not.
fn bench_bounded_vs_unbounded(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_from_outer_brace");
    let table = DelimiterTable::default();
    let clock = RevisionClock::new();
    let revision = clock.advance();

    for size in [100, 1000, 10000].iter() {
        let snapshot = Snapshot::from_text(&generate_block(*size));
        let cx = ScanContext {
            snapshot: &snapshot,
            oracle: &PlainText,
            clock: &clock,
        };

        group.bench_with_input(BenchmarkId::new("viewport_50", size), &cx, |b, cx| {
            b.iter(|| {
                let outcome = find_pair(cx, &table, revision, black_box(11), 50);
                black_box(outcome)
            })
        });

        group.bench_with_input(BenchmarkId::new("unbounded", size), &cx, |b, cx| {
            b.iter(|| {
                let outcome = find_pair(cx, &table, revision, black_box(11), 0);
                black_box(outcome)
            })
        });
    }

    group.finish();
}

/// Benchmarks an unbounded scan that consults the tree-sitter classifier.
fn bench_classified_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("classified_scan");
    let table = DelimiterTable::default();
    let clock = RevisionClock::new();
    let revision = clock.advance();

    for size in [100, 1000].iter() {
        let snapshot = Snapshot::from_text(&generate_block(*size));
        let Ok(classifier) = SyntaxClassifier::new("rust") else {
            return;
        };
        let cx = ScanContext {
            snapshot: &snapshot,
            oracle: &classifier,
            clock: &clock,
        };
        // Warm the per-version parse cache
        assert!(matches!(
            find_pair(&cx, &table, revision, 11, 0),
            PairOutcome::Resolved(_)
        ));

        group.bench_with_input(BenchmarkId::new("rust", size), &cx, |b, cx| {
            b.iter(|| {
                let outcome = find_pair(cx, &table, revision, black_box(11), 0);
                black_box(outcome)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bounded_vs_unbounded, bench_classified_scan);
criterion_main!(benches);
