//! Criterion benchmarks for the Phalanx aggregator.
//!
//! Covers the hot paths of a distributed hits request:
//! - Hit comparison under a parsed sort spec
//! - Merging hit streams from several in-memory nodes

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use phalanx::config::AggregatorConfig;
use phalanx::model::{ContextPart, DocInfo, Hit};
use phalanx::node::MockNodeClient;
use phalanx::ordering::{HitOrdering, SortableHit};
use phalanx::search::{SearchContext, SearchKey, SearchRegistry, UseCache};

const WORDS: &[&str] = &[
    "the", "cat", "sat", "on", "mat", "Über", "dog", "café", "ran", "away", "quickly", "home",
];

/// Generate hits spread over documents, with word contexts.
fn generate_hits(node: usize, count: usize) -> Vec<Hit> {
    (0..count)
        .map(|i| {
            let word = |offset: usize| WORDS[(i * 7 + node * 3 + offset) % WORDS.len()];
            Hit::new(format!("n{node}-d{}", i / 5), (i * 3) as i64, (i * 3 + 1) as i64)
                .with_context(ContextPart::Left, "word", [word(1), word(2)])
                .with_context(ContextPart::Match, "word", [word(0)])
                .with_context(ContextPart::Right, "word", [word(3)])
        })
        .collect()
}

fn bench_hit_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_ordering");
    let hits = generate_hits(0, 1000);
    let docs: Vec<DocInfo> = (0..200)
        .map(|d| DocInfo::new(format!("n0-d{d}")).with_field("year", [format!("{}", 1900 + d % 120)]))
        .collect();

    for spec in ["hitposition", "hit:word:i", "left:word", "(decade:year,-field:year,hitposition)"] {
        let ordering = HitOrdering::parse(spec).unwrap().unwrap();
        group.throughput(Throughput::Elements(hits.len() as u64));
        group.bench_function(format!("sort_{spec}"), |b| {
            b.iter(|| {
                let mut sortable: Vec<SortableHit<'_>> = hits
                    .iter()
                    .enumerate()
                    .map(|(i, hit)| SortableHit::new(hit, docs.get(i / 5)))
                    .collect();
                sortable.sort_by(|x, y| ordering.compare(x, y));
                black_box(sortable.len())
            })
        });
    }

    group.finish();
}

fn bench_distributed_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("distributed_merge");
    let runtime = Runtime::new().unwrap();

    for nodes in [2usize, 8] {
        let urls: Vec<String> = (0..nodes).map(|n| format!("http://node{n}")).collect();
        let mut client = MockNodeClient::new();
        for (n, url) in urls.iter().enumerate() {
            client = client.with_hits(url.clone(), generate_hits(n, 2000));
        }
        let context = SearchContext::new(AggregatorConfig::new(urls.clone()), Arc::new(client));
        let registry = SearchRegistry::new(context);

        for sort in ["", "hitposition"] {
            let name = if sort.is_empty() { "natural" } else { sort };
            group.throughput(Throughput::Elements(1000));
            group.bench_function(format!("{name}_{nodes}_nodes"), |b| {
                b.iter(|| {
                    let key = SearchKey::new("corpus", "[]").with_sort(sort);
                    let search = registry.get(key, UseCache::No, 1000).unwrap();
                    let results = runtime.block_on(search.window(0, 1000)).unwrap();
                    black_box(results.summary.actual_window_size)
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_hit_ordering, bench_distributed_merge);
criterion_main!(benches);
