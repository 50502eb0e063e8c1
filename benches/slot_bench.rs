//! Indexed property slot benchmarks.
//!
//! Compares key lookups on slots below the indexing threshold (linear scan)
//! with slots above it (lazily built unique index), and measures the cost of
//! growing a slot across the threshold.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use metagraph::{Atom, IndexKey, IndexSpec, NodeId, NodeStore};

/// A store with one owner whose `children` slot holds `n` named nodes.
fn populated(n: usize) -> (NodeStore, NodeId, Atom, Vec<String>) {
    let store = NodeStore::new();
    let owner = store.new_node("owner", None);
    let children = store.intern("children");
    let names: Vec<String> = (0..n).map(|i| format!("child_{i}")).collect();
    let values: Vec<NodeId> = names.iter().map(|name| store.new_node(name, None)).collect();
    store
        .add_values(owner, children, &values)
        .expect("owner exists");
    (store, owner, children, names)
}

fn bench_lookup_by_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot_lookup_by_name");

    for n in [4, 8, 16, 64, 512] {
        let (store, owner, children, names) = populated(n);
        let last = names.last().cloned().unwrap_or_default();
        group.bench_with_input(BenchmarkId::new("value_by_name", n), &last, |b, name| {
            b.iter(|| {
                black_box(store.value_by_name(owner, children, black_box(name)))
            });
        });
    }

    group.finish();
}

fn bench_lookup_by_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot_lookup_by_classifier");

    for n in [8, 64, 512] {
        let store = NodeStore::new();
        let owner = store.new_node("owner", None);
        let children = store.intern("children");
        let classifiers: Vec<NodeId> = (0..4)
            .map(|i| store.new_node(&format!("Kind{i}"), None))
            .collect();
        let values: Vec<NodeId> = (0..n)
            .map(|i| store.new_node(&format!("child_{i}"), Some(classifiers[i % 4])))
            .collect();
        store
            .add_values(owner, children, &values)
            .expect("owner exists");

        let key = IndexKey::Node(classifiers[1]);
        group.bench_with_input(BenchmarkId::new("values_by_key", n), &key, |b, &key| {
            b.iter(|| {
                black_box(store.values_by_key(owner, children, IndexSpec::Classifier, key))
            });
        });
    }

    group.finish();
}

fn bench_grow_across_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot_grow");

    for n in [8, 32, 256] {
        group.bench_with_input(BenchmarkId::new("add_then_lookup", n), &n, |b, &n| {
            b.iter(|| {
                let (store, owner, children, names) = populated(n);
                for name in names.iter().step_by(4) {
                    black_box(store.value_by_name(owner, children, name).ok());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    slot_benches,
    bench_lookup_by_name,
    bench_lookup_by_classifier,
    bench_grow_across_threshold
);
criterion_main!(slot_benches);
