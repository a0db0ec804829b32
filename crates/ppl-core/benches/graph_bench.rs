//! # Graph Benchmarks
//!
//! Merge and codec throughput for ppl-core.
//!
//! Run with: `cargo bench -p ppl-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ppl_core::{Contact, ContactGraph, GraphFormat, GraphStore, Related, Relationship};
use std::hint::black_box;

fn sample_contact(i: usize) -> Contact {
    let mut c = Contact::new(format!("Contact {i}"))
        .expect("contact")
        .with_uid(format!("c{i}"));
    c.email = vec![format!("c{i}@example.com"), format!("c{i}@work.example")];
    c.tel = vec![format!("+1 555 {i:04}")];
    c.note = Some(format!("Note for contact {i} <with> markup & quotes \""));
    c.related = vec![
        Related::to_uri(format!("urn:uuid:c{}", i + 1), &["friend"]),
        Related::to_text("Someone", &["kin"]),
    ];
    c
}

/// A chain of contacts, each pointing at the next.
fn create_chain_graph(size: usize) -> ContactGraph {
    let mut graph = ContactGraph::new();
    for i in 0..size {
        graph.add(sample_contact(i)).expect("add");
    }
    for i in 1..size {
        graph
            .add_edge(Relationship::new(format!("c{}", i - 1), format!("c{i}"), &["friend"]))
            .expect("edge");
    }
    graph
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_contact_merge(c: &mut Criterion) {
    let base = sample_contact(0);
    let mut other = sample_contact(1);
    other.uid = base.uid.clone();

    c.bench_function("contact_merge", |b| {
        b.iter(|| {
            let mut merged = base.clone();
            merged.merge_from(black_box(&other), true);
            black_box(merged)
        });
    });
}

fn bench_store_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_merge");
    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut graph = ContactGraph::new();
                for i in 0..size {
                    let _ = graph.merge(sample_contact(i % (size / 2)));
                }
                black_box(graph)
            });
        });
    }
    group.finish();
}

fn bench_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("codecs");
    for size in [100, 1000].iter() {
        let graph = create_chain_graph(*size);
        for format in [GraphFormat::Json, GraphFormat::GraphMl] {
            let text = format.encode(&graph).expect("encode");
            group.bench_with_input(
                BenchmarkId::new(format!("encode_{}", format.as_str()), size),
                &graph,
                |b, graph| b.iter(|| black_box(format.encode(graph))),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("decode_{}", format.as_str()), size),
                &text,
                |b, text| b.iter(|| black_box(format.decode(text))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_contact_merge, bench_store_merge, bench_codecs);
criterion_main!(benches);
