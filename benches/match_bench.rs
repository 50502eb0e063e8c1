//! Type match engine benchmarks.
//!
//! Ranks overload-style candidate sets: one argument type matched against
//! every candidate's parameter type, keeping the most specific.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use metagraph::{
    CoreTypes, GraphBuilder, MatchPolicy, NodeId, NodeStore, TypeMatchEngine, select_most_specific,
};

/// A linear chain `C0 <- C1 <- ... <- C{depth-1}` and generic types for each.
fn chain(b: &GraphBuilder<'_>, depth: usize) -> Vec<NodeId> {
    let mut generic_types = Vec::with_capacity(depth);
    let mut previous: Option<NodeId> = None;
    for i in 0..depth {
        let class = b.class(&format!("bench::C{i}")).expect("class");
        if let Some(super_type) = previous {
            b.extends(class, super_type).expect("generalization");
        }
        generic_types.push(b.generic_type(class).expect("generic type"));
        previous = Some(class);
    }
    generic_types
}

fn bench_subtype_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_distance");

    for depth in [2, 8, 32] {
        let store = NodeStore::new();
        let core = CoreTypes::bootstrap(&store).expect("bootstrap");
        let b = GraphBuilder::new(&store, &core);
        let types = chain(&b, depth);
        let engine = TypeMatchEngine::new(&store, &core);
        let (target, value) = (types[0], types[depth - 1]);

        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |bench, _| {
            bench.iter(|| {
                black_box(engine.match_types(
                    black_box(target),
                    Some(black_box(value)),
                    true,
                    MatchPolicy::default(),
                ))
            });
        });
    }

    group.finish();
}

fn bench_overload_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_overload");

    for candidates in [4, 16, 64] {
        let store = NodeStore::new();
        let core = CoreTypes::bootstrap(&store).expect("bootstrap");
        let b = GraphBuilder::new(&store, &core);
        let types = chain(&b, candidates);
        let engine = TypeMatchEngine::new(&store, &core);
        let argument = types[candidates / 2];

        group.bench_with_input(
            BenchmarkId::new("candidates", candidates),
            &types,
            |bench, types| {
                bench.iter(|| {
                    let results: Vec<_> = types
                        .iter()
                        .map(|&parameter| {
                            engine
                                .match_types(parameter, Some(argument), true, MatchPolicy::default())
                                .ok()
                                .flatten()
                        })
                        .collect();
                    black_box(select_most_specific(&results))
                });
            },
        );
    }

    group.finish();
}

fn bench_generic_arguments(c: &mut Criterion) {
    let store = NodeStore::new();
    let core = CoreTypes::bootstrap(&store).expect("bootstrap");
    let b = GraphBuilder::new(&store, &core);
    let list = b.class("bench::List").expect("class");
    b.type_parameter(list, "T", false).expect("type parameter");

    let number = b.generic_type(core.number).expect("generic type");
    let integer = b.generic_type(core.integer).expect("generic type");
    let list_of_number = b.generic_type_with(list, &[number], &[]).expect("generic type");
    let list_of_integer = b.generic_type_with(list, &[integer], &[]).expect("generic type");
    let engine = TypeMatchEngine::new(&store, &core);

    c.bench_function("match_list_of_integer_as_list_of_number", |bench| {
        bench.iter(|| {
            black_box(engine.match_types(
                list_of_number,
                Some(list_of_integer),
                true,
                MatchPolicy::default(),
            ))
        });
    });
}

criterion_group!(
    match_benches,
    bench_subtype_distance,
    bench_overload_ranking,
    bench_generic_arguments
);
criterion_main!(match_benches);
