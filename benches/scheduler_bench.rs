//! Scheduler Benchmark
//!
//! Measures end-to-end resolution of synthetic units as the worker count
//! grows, to show where the shared queue stops paying for itself.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sable::syntax::{DeclSpec, Expr, StmtSpec, TypeExpr};
use sable::{NoExternalMetadata, ResolverOptions, SyntaxTree, SyntaxTreeBuilder, resolve_unit};
use std::sync::Arc;

// =============================================================================
// Unit Generators
// =============================================================================

/// `modules` modules of `per_module` chained variables, each module also
/// carrying an overload set and a call site that exercises it.
fn generate_wide_unit(modules: usize, per_module: usize) -> SyntaxTree {
    let specs = (0..modules)
        .map(|m| {
            let mut members: Vec<DeclSpec> = (0..per_module)
                .map(|i| {
                    let init = if i == 0 {
                        Expr::int(m as i128)
                    } else {
                        Expr::name(&format!("v{}", i - 1))
                    };
                    DeclSpec::variable(&format!("v{i}"), None, Some(init))
                })
                .collect();
            members.push(DeclSpec::function(
                "sink",
                vec![("v", TypeExpr::named("I64"))],
                None,
                vec![],
            ));
            members.push(DeclSpec::function(
                "sink",
                vec![("v", TypeExpr::named("String"))],
                None,
                vec![],
            ));
            members.push(DeclSpec::function(
                "drain",
                vec![],
                None,
                vec![StmtSpec::Expr(Expr::call(
                    "sink",
                    vec![Expr::name(&format!("v{}", per_module - 1))],
                ))],
            ));
            DeclSpec::module(&format!("M{m}"), members)
        })
        .collect();
    SyntaxTreeBuilder::build("bench.sb", specs)
}

/// `count` distinct instantiations of one template, each used twice.
fn generate_template_unit(count: usize) -> SyntaxTree {
    let mut specs = vec![
        DeclSpec::structure("Cell", vec![("value", TypeExpr::named("T"))]).with_type_params(&["T"]),
    ];
    for i in 0..count {
        specs.push(DeclSpec::structure(&format!("S{i}"), vec![("id", TypeExpr::named("I32"))]));
        for copy in 0..2 {
            specs.push(DeclSpec::variable(
                &format!("c{i}_{copy}"),
                Some(TypeExpr::generic("Cell", vec![TypeExpr::named(&format!("S{i}"))])),
                None,
            ));
        }
    }
    SyntaxTreeBuilder::build("templates.sb", specs)
}

fn options(workers: usize) -> ResolverOptions {
    ResolverOptions {
        worker_threads: workers,
        ..ResolverOptions::default()
    }
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_wide_unit_by_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_wide_unit");
    let tree = generate_wide_unit(32, 32);
    group.throughput(Throughput::Elements(tree.len() as u64));

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.iter(|| {
                let unit = resolve_unit(
                    black_box(&tree),
                    options(workers),
                    Arc::new(NoExternalMetadata),
                );
                black_box(unit)
            })
        });
    }
    group.finish();
}

fn bench_template_instantiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_templates");

    for count in [16usize, 64, 256] {
        let tree = generate_template_unit(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &tree, |b, tree| {
            b.iter(|| {
                let unit = resolve_unit(black_box(tree), options(4), Arc::new(NoExternalMetadata));
                black_box(unit)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wide_unit_by_workers, bench_template_instantiation);
criterion_main!(benches);
