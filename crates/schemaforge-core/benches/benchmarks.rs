//! Criterion benchmarks for the render passes.
//!
//! Graphs are parsed outside the benchmark loop so only traversal and
//! emission are measured.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::Path;

use schemaforge_core::graph::{GraphBuilder, PrimitiveKind, Property};
use schemaforge_core::{
    render_expectations, render_factories, render_models, ExpectationOptions, FactoryOptions,
    RenderOptions, TypeGraph,
};

/// Load and parse a graph from the shared test fixtures directory.
fn load_graph(name: &str) -> TypeGraph {
    let graphs_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/graphs");
    let path = Path::new(graphs_dir).join(name);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read graph {}: {}", path.display(), e));
    TypeGraph::from_json_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse graph {}: {}", path.display(), e))
}

/// `n` classes, each with one property of every primitive kind and a
/// reference to the previous class.
fn wide_graph(n: usize) -> TypeGraph {
    let mut b = GraphBuilder::new();
    let primitives: Vec<_> = PrimitiveKind::ALL.iter().map(|p| b.primitive(*p)).collect();
    let mut previous = None;
    for i in 0..n {
        let mut props: Vec<Property> = primitives
            .iter()
            .enumerate()
            .map(|(j, ty)| Property::new(format!("p{j}"), *ty))
            .collect();
        if let Some(prev) = previous {
            props.push(Property::new("previous", prev).optional());
        }
        let source = format!("file:///schemas/entities/c{i}.json");
        previous = Some(b.class(&format!("C{i}"), Some(&source), props));
    }
    b.build().unwrap()
}

fn options(file: &str) -> RenderOptions {
    RenderOptions::default().with_output_file(file)
}

fn bench_models_fleet(c: &mut Criterion) {
    let graph = load_graph("fleet.json");

    c.bench_function("models/fleet", |b| {
        b.iter(|| render_models(black_box(&graph), options("model.ts")).unwrap())
    });
}

fn bench_models_wide(c: &mut Criterion) {
    let graph = wide_graph(200);

    c.bench_function("models/wide_200", |b| {
        b.iter(|| render_models(black_box(&graph), options("model.ts")).unwrap())
    });
}

fn bench_chained_passes(c: &mut Criterion) {
    let graph = wide_graph(200);
    let expectation_options = ExpectationOptions {
        entity_globs: vec!["**/entities/*.json".to_string()],
        ..ExpectationOptions::default()
    };

    c.bench_function("chained/wide_200", |b| {
        b.iter(|| {
            let model = render_models(black_box(&graph), options("model.ts")).unwrap();
            render_factories(
                &graph,
                options("factories.ts"),
                FactoryOptions::default(),
                vec![model.registry.clone()],
            )
            .unwrap();
            render_expectations(
                &graph,
                options("expectations.ts"),
                expectation_options.clone(),
                vec![model.registry],
            )
            .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_models_fleet,
    bench_models_wide,
    bench_chained_passes
);
criterion_main!(benches);
