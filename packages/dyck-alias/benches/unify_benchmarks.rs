//! Performance benchmarks for the alias graph engine
//!
//! - Unify on synthetic graphs: wide fanout, long dereference chains
//! - Full analysis of generated modules with indirect calls

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dyck_alias::features::alias_analysis::{DyckGraph, LabelId};
use dyck_alias::{AliasAnalysis, Linkage, Module, ModuleBuilder, Signature, Type};

// ============================================================================
// Synthetic graphs
// ============================================================================

/// One root with `n` dereference targets: collapses to a single class
fn fanout_graph(n: usize) -> DyckGraph {
    let mut graph = DyckGraph::new();
    let root = graph.fresh(None);
    for _ in 0..n {
        let target = graph.fresh(None);
        graph.add_edge(root, target, LabelId::DEREF);
    }
    graph
}

/// Two parallel chains `a0 -*-> a1 -*-> ...` and `b0 -*-> b1 -*-> ...`
/// joined at the head: unification cascades down the whole length
fn zipper_graph(n: usize) -> DyckGraph {
    let mut graph = DyckGraph::new();
    let (mut a, mut b) = (graph.fresh(None), graph.fresh(None));
    graph.make_alias(a, b);
    for _ in 0..n {
        let (na, nb) = (graph.fresh(None), graph.fresh(None));
        graph.add_edge(a, na, LabelId::DEREF);
        graph.add_edge(b, nb, LabelId::DEREF);
        a = na;
        b = nb;
    }
    graph
}

fn bench_unify_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify_fanout");

    for n in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || fanout_graph(n),
                |mut graph| {
                    graph.unify();
                    black_box(graph.live_count())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_unify_zipper(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify_zipper");

    for n in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || zipper_graph(n),
                |mut graph| {
                    graph.unify();
                    black_box(graph.stats().merges)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Whole modules
// ============================================================================

/// `n` handlers registered in an exported table and dispatched through it
fn dispatch_module(n: usize) -> Module {
    let sig = Signature::new(vec![Type::ptr()], Type::ptr());
    let mut mb = ModuleBuilder::new("dispatch");
    let table = mb.add_global("table", Linkage::External);
    let main = mb.declare_function("main", Signature::new(vec![], Type::Void));

    for i in 0..n {
        let handler = mb.declare_function(&format!("handler{}", i), sig.clone());
        let value = mb.function_value(handler);
        mb.global_initializer(table, Some(i as i64), value);
        let mut b = mb.body(handler);
        let arg = b.param(0);
        let loaded = b.load("loaded", arg, Type::ptr());
        b.ret(Some(loaded));
    }

    let mut b = mb.body(main);
    let state = b.alloca("state");
    for i in 0..n {
        let slot = b.field(&format!("slot{}", i), table, i as i64);
        let fp = b.load(&format!("fp{}", i), slot, Type::ptr());
        let merged = b.select(&format!("any{}", i), fp, state, Type::ptr());
        b.call(&format!("r{}", i), merged, &[state], sig.clone());
    }
    b.ret(None);
    mb.build()
}

fn bench_full_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_analysis");
    group.sample_size(20);

    for n in [10usize, 100, 500] {
        let module = dispatch_module(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &module, |b, module| {
            b.iter(|| {
                let analysis = AliasAnalysis::new(black_box(module)).unwrap();
                black_box(analysis.stats().classes)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_unify_fanout,
    bench_unify_zipper,
    bench_full_analysis,
);

criterion_main!(benches);
