//! Resolution under contention: many units at once, many workers per unit.

use anyhow::Result;
use rayon::prelude::*;
use sable::syntax::{DeclSpec, Expr, StmtSpec, TypeExpr};
use sable::{NoExternalMetadata, ResolvedUnit, ResolverOptions, SyntaxTreeBuilder, resolve_unit};
use std::io::Write;
use std::sync::Arc;

/// Overloads, templates and cross-module references that all contend for
/// the same scopes and the same instance cache.
fn contended_unit() -> Vec<DeclSpec> {
    let mut specs = vec![
        DeclSpec::structure("Box", vec![("item", TypeExpr::named("T"))]).with_type_params(&["T"]),
        DeclSpec::function("take", vec![("v", TypeExpr::named("U8"))], None, vec![]),
        DeclSpec::function("take", vec![("v", TypeExpr::named("I64"))], None, vec![]),
        DeclSpec::function("take", vec![("v", TypeExpr::named("String"))], None, vec![]),
    ];
    for i in 0..24 {
        let arg = match i % 3 {
            0 => "U8",
            1 => "I32",
            _ => "String",
        };
        specs.push(DeclSpec::variable(
            &format!("box{i}"),
            Some(TypeExpr::generic("Box", vec![TypeExpr::named(arg)])),
            None,
        ));
        specs.push(DeclSpec::function(
            &format!("use{i}"),
            vec![],
            None,
            vec![StmtSpec::Expr(Expr::call(
                "take",
                vec![Expr::name(&format!("box{i}.item"))],
            ))],
        ));
    }
    specs
}

fn resolve(workers: usize, specs: Vec<DeclSpec>) -> ResolvedUnit {
    let tree = SyntaxTreeBuilder::build("contended.sb", specs);
    let options = ResolverOptions {
        worker_threads: workers,
        ..ResolverOptions::default()
    };
    resolve_unit(&tree, options, Arc::new(NoExternalMetadata))
}

#[test]
fn test_contended_unit_resolves_cleanly() {
    sable::tracing_config::init_tracing();
    let unit = resolve(8, contended_unit());

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    let names: Vec<&str> = unit.instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Box<I32>", "Box<String>", "Box<U8>"]);

    let targets = |name: &str| {
        unit.find(name)
            .map(|d| d.uses_of("take").into_iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default()
    };
    assert_eq!(targets("use0"), vec![sable::UseTarget::Declaration("take(U8)".into())]);
    assert_eq!(targets("use1"), vec![sable::UseTarget::Declaration("take(I64)".into())]);
    assert_eq!(targets("use2"), vec![sable::UseTarget::Declaration("take(String)".into())]);
}

#[test]
fn test_parallel_units_match_sequential_output() -> Result<()> {
    let expected = resolve(1, contended_unit()).to_json()?;

    let outputs: Vec<String> = (0..16)
        .into_par_iter()
        .map(|i| resolve(1 + i % 6, contended_unit()).to_json())
        .collect::<serde_json::Result<_>>()?;

    for output in outputs {
        assert_eq!(output, expected);
    }
    Ok(())
}

#[test]
fn test_options_file_drives_resolution() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "workerThreads": 3, "defaultIntegerType": "U16", "fileName": "app.sb" }}"#
    )?;
    let options = ResolverOptions::from_file(file.path())?;

    let tree = SyntaxTreeBuilder::build(
        "app.sb",
        vec![
            DeclSpec::variable("n", None, Some(Expr::int(7))),
            DeclSpec::variable("bad", Some(TypeExpr::named("Missing")), None),
        ],
    );
    let unit = resolve_unit(&tree, options, Arc::new(NoExternalMetadata));

    assert_eq!(unit.find("n").and_then(|n| n.var_type.as_deref()), Some("U16"));
    assert_eq!(unit.diagnostics.len(), 1);
    assert_eq!(unit.diagnostics[0].file, "app.sb");
    Ok(())
}
