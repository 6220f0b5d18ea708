//! Benchmarks for the orientation engine and DAG -> PAG conversion.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use ancestra_graph::{MixedGraph, NodeType};
use ancestra_search::DagToPag;

/// A layered DAG with alternating chain and collider structure, sized by
/// node count. Deterministic so runs are comparable.
fn layered_dag(n: usize, with_latents: bool) -> MixedGraph {
    let mut g = MixedGraph::new();
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        ids.push(g.add_measured_node(&format!("X{i}")).unwrap());
    }
    for i in 0..n.saturating_sub(1) {
        g.add_directed_edge(ids[i], ids[i + 1]).unwrap();
    }
    for i in 0..n.saturating_sub(3) {
        if i % 3 == 0 {
            g.add_directed_edge(ids[i], ids[i + 3]).unwrap();
        }
    }
    if with_latents {
        for i in 0..n.saturating_sub(2) {
            if i % 4 == 0 {
                let l = g.add_node(&format!("L{i}"), NodeType::Latent).unwrap();
                g.add_directed_edge(l, ids[i]).unwrap();
                g.add_directed_edge(l, ids[i + 2]).unwrap();
            }
        }
    }
    g
}

fn bench_dag_to_pag(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag_to_pag");
    for &n in &[8usize, 12, 16] {
        group.bench_with_input(BenchmarkId::new("measured", n), &n, |bench, &n| {
            let dag = layered_dag(n, false);
            bench.iter(|| DagToPag::new(dag.clone()).convert().unwrap());
        });
        group.bench_with_input(BenchmarkId::new("latent", n), &n, |bench, &n| {
            let dag = layered_dag(n, true);
            bench.iter(|| DagToPag::new(dag.clone()).convert().unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dag_to_pag);
criterion_main!(benches);
