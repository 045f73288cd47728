use super::*;
use crate::options::ResolverOptions;
use sable_binder::{NoExternalMetadata, ScopeId};
use sable_syntax::{DeclSpec, Expr, SyntaxTreeBuilder, TypeExpr};
use std::sync::Arc;

fn waits(edges: &[(u32, Dependency)]) -> FxHashMap<WorkItemId, Dependency> {
    edges
        .iter()
        .map(|(from, dep)| (WorkItemId(*from), *dep))
        .collect()
}

fn on_build(id: u32) -> Dependency {
    Dependency::Phase(WorkItemId(id), Phase::Build)
}

fn resolve_with(workers: usize, specs: Vec<DeclSpec>) -> crate::ResolvedUnit {
    let tree = SyntaxTreeBuilder::build("unit.sb", specs);
    let options = ResolverOptions {
        worker_threads: workers,
        ..ResolverOptions::default()
    };
    crate::resolve(&tree, options, Arc::new(NoExternalMetadata))
}

#[test]
fn test_find_cycles_two_items() {
    let cycles = find_cycles(4, &waits(&[(1, on_build(2)), (2, on_build(1))]));
    assert_eq!(cycles, vec![vec![WorkItemId(1), WorkItemId(2)]]);
}

#[test]
fn test_find_cycles_self_wait() {
    let cycles = find_cycles(2, &waits(&[(0, on_build(0))]));
    assert_eq!(cycles, vec![vec![WorkItemId(0)]]);
}

#[test]
fn test_find_cycles_excludes_tail_into_cycle() {
    // 0 -> 1 -> 2 -> 3 -> 2
    let cycles = find_cycles(
        4,
        &waits(&[
            (0, on_build(1)),
            (1, on_build(2)),
            (2, on_build(3)),
            (3, on_build(2)),
        ]),
    );
    assert_eq!(cycles, vec![vec![WorkItemId(2), WorkItemId(3)]]);
}

#[test]
fn test_find_cycles_scope_waits_end_paths() {
    let cycles = find_cycles(
        3,
        &waits(&[
            (0, on_build(1)),
            (1, Dependency::ScopeFrozen(ScopeId(0))),
            (2, on_build(0)),
        ]),
    );
    assert!(cycles.is_empty());
}

#[test]
fn test_find_cycles_disjoint_cycles() {
    let cycles = find_cycles(
        5,
        &waits(&[
            (0, on_build(1)),
            (1, on_build(0)),
            (3, on_build(4)),
            (4, on_build(3)),
        ]),
    );
    assert_eq!(cycles.len(), 2);
    assert!(cycles.iter().all(|cycle| cycle.len() == 2));
}

#[test]
fn test_empty_unit_finishes() {
    let unit = resolve_with(2, vec![]);
    assert!(unit.declarations.is_empty());
    assert!(!unit.has_errors());
}

#[test]
fn test_mutual_initializers_deadlock() {
    let unit = resolve_with(
        2,
        vec![
            DeclSpec::variable("a", None, Some(Expr::name("b"))),
            DeclSpec::variable("b", None, Some(Expr::name("a"))),
        ],
    );

    let codes = unit.diagnostic_codes();
    assert_eq!(
        codes,
        vec![DiagnosticCode::ResolutionDeadlock.code(); 2],
        "{:?}",
        unit.diagnostics
    );
    for diagnostic in &unit.diagnostics {
        assert!(
            diagnostic.message_text.contains("a -> b -> a"),
            "{}",
            diagnostic.message_text
        );
    }
    assert!(unit.declarations.iter().all(|d| d.failed));
}

#[test]
fn test_self_initializer_deadlock() {
    let unit = resolve_with(1, vec![DeclSpec::variable("x", None, Some(Expr::name("x")))]);
    assert_eq!(unit.diagnostics.len(), 1);
    assert!(unit.diagnostics[0].message_text.contains("x -> x"));
}

#[test]
fn test_worker_count_does_not_change_output() {
    let specs = || {
        vec![
            DeclSpec::module(
                "App",
                (0..40)
                    .map(|i| {
                        let init = if i == 0 {
                            Expr::int(1)
                        } else {
                            Expr::name(&format!("v{}", i - 1))
                        };
                        DeclSpec::variable(&format!("v{i}"), None, Some(init))
                    })
                    .collect(),
            ),
            DeclSpec::variable("last", Some(TypeExpr::named("I64")), Some(Expr::name("App.v39"))),
        ]
    };

    let single = resolve_with(1, specs()).to_json().unwrap();
    for _ in 0..4 {
        assert_eq!(resolve_with(4, specs()).to_json().unwrap(), single);
    }
}
