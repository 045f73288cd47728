//! End-to-end resolution of whole units.

use sable::syntax::{BinaryOp, DeclSpec, Expr, StmtSpec, TypeExpr};
use sable::{
    DiagnosticCode, ExternalFunction, InMemoryMetadata, MetadataBridge, NoExternalMetadata,
    ResolvedUnit, ResolverOptions, SyntaxTreeBuilder, UseTarget, resolve_unit,
};
use std::sync::Arc;

fn resolve_with(
    specs: Vec<DeclSpec>,
    options: ResolverOptions,
    bridge: Arc<dyn MetadataBridge>,
) -> ResolvedUnit {
    let tree = SyntaxTreeBuilder::build("unit.sb", specs);
    resolve_unit(&tree, options, bridge)
}

fn resolve(specs: Vec<DeclSpec>) -> ResolvedUnit {
    resolve_with(specs, ResolverOptions::default(), Arc::new(NoExternalMetadata))
}

fn ty(name: &str) -> TypeExpr {
    TypeExpr::named(name)
}

fn main_calling(call: Expr) -> DeclSpec {
    DeclSpec::function("main", vec![], None, vec![StmtSpec::Expr(call)])
}

fn codes(unit: &ResolvedUnit) -> Vec<u32> {
    unit.diagnostic_codes()
}

fn declaration(name: &str) -> UseTarget {
    UseTarget::Declaration(name.to_string())
}

// =============================================================================
// Overloads
// =============================================================================

#[test]
fn test_literal_selects_exactly_fitting_overload() {
    let unit = resolve(vec![
        DeclSpec::function("fn2", vec![], None, vec![]),
        DeclSpec::function("fn2", vec![("p", ty("U8"))], None, vec![]),
        main_calling(Expr::call("fn2", vec![Expr::int(42)])),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    let main = unit.find("main").unwrap();
    assert_eq!(main.uses_of("fn2"), vec![&declaration("fn2(U8)")]);
}

#[test]
fn test_zero_argument_call_picks_zero_parameter_overload() {
    let unit = resolve(vec![
        DeclSpec::function("f", vec![("a", ty("U8"))], None, vec![]),
        DeclSpec::function("f", vec![], None, vec![]),
        DeclSpec::function("f", vec![("a", ty("U8")), ("b", ty("U8"))], None, vec![]),
        main_calling(Expr::call("f", vec![])),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    assert_eq!(unit.find("main").unwrap().uses_of("f"), vec![&declaration("f()")]);
}

#[test]
fn test_exact_match_is_independent_of_declaration_order() {
    for reversed in [false, true] {
        let mut overloads = vec![
            DeclSpec::function("show", vec![("v", ty("Bool"))], None, vec![]),
            DeclSpec::function("show", vec![("v", ty("String"))], None, vec![]),
        ];
        if reversed {
            overloads.reverse();
        }
        overloads.push(main_calling(Expr::call("show", vec![Expr::string("hi")])));

        let unit = resolve(overloads);
        assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
        assert_eq!(
            unit.find("main").unwrap().uses_of("show"),
            vec![&declaration("show(String)")]
        );
    }
}

#[test]
fn test_incomparable_candidates_are_ambiguous() {
    let unit = resolve(vec![
        DeclSpec::function("f", vec![("a", ty("U8")), ("b", ty("U16"))], None, vec![]),
        DeclSpec::function("f", vec![("a", ty("U16")), ("b", ty("U8"))], None, vec![]),
        DeclSpec::variable("x", Some(ty("U8")), None),
        main_calling(Expr::call("f", vec![Expr::name("x"), Expr::name("x")])),
    ]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::AmbiguousOverload.code()]);
    assert_eq!(unit.find("main").unwrap().uses_of("f"), vec![&UseTarget::Error]);
}

#[test]
fn test_no_applicable_overload_lists_candidates() {
    let unit = resolve(vec![
        DeclSpec::function("f", vec![("a", ty("U8"))], None, vec![]),
        DeclSpec::function("f", vec![("a", ty("Bool"))], None, vec![]),
        main_calling(Expr::call("f", vec![Expr::string("no")])),
    ]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::NoApplicableOverload.code()]);
    let message = &unit.diagnostics[0].message_text;
    assert!(message.contains("f(U8)"), "{message}");
    assert!(message.contains("f(Bool)"), "{message}");
}

#[test]
fn test_error_argument_suppresses_overload_diagnostic() {
    let unit = resolve(vec![
        DeclSpec::function("f", vec![("a", ty("U8"))], None, vec![]),
        main_calling(Expr::call("f", vec![Expr::name("missing")])),
    ]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::UnresolvedReference.code()]);
}

#[test]
fn test_duplicate_overload_signature_reported_on_later_declaration() {
    let unit = resolve(vec![
        DeclSpec::function("f", vec![("a", ty("U8"))], None, vec![]),
        DeclSpec::function("f", vec![("b", ty("U8"))], None, vec![]),
    ]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::DuplicateDeclaration.code()]);
    assert_eq!(unit.diagnostics[0].start, unit.declarations[1].span.start);
    assert!(unit.diagnostics[0].message_text.contains("f(U8)"));
}

// =============================================================================
// Conversions
// =============================================================================

const UNSIGNED: [&str; 4] = ["U8", "U16", "U32", "U64"];
const SIGNED: [&str; 4] = ["I8", "I16", "I32", "I64"];
const FLOAT: [&str; 2] = ["F32", "F64"];

#[test]
fn test_widening_grid_within_each_family() {
    for family in [&UNSIGNED[..], &SIGNED[..], &FLOAT[..]] {
        for (i, from) in family.iter().enumerate() {
            for (j, to) in family.iter().enumerate() {
                let unit = resolve(vec![
                    DeclSpec::variable("a", Some(ty(from)), None),
                    DeclSpec::function("take", vec![("p", ty(to))], None, vec![]),
                    main_calling(Expr::call("take", vec![Expr::name("a")])),
                ]);
                if i <= j {
                    assert!(!unit.has_errors(), "{from} -> {to}: {:?}", unit.diagnostics);
                } else {
                    assert_eq!(
                        codes(&unit),
                        vec![DiagnosticCode::NoApplicableOverload.code()],
                        "{from} -> {to}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_explicit_cast_allows_narrowing() {
    let unit = resolve(vec![
        DeclSpec::variable("wide", Some(ty("U16")), Some(Expr::int(300))),
        DeclSpec::variable(
            "narrow",
            Some(ty("U8")),
            Some(Expr::call("U8", vec![Expr::name("wide")])),
        ),
        DeclSpec::variable("implicit", Some(ty("U8")), Some(Expr::name("wide"))),
    ]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::TypeMismatch.code()]);
    assert!(unit.diagnostics[0].message_text.contains("'U16'"));
    let narrow = unit.find("narrow").unwrap();
    assert_eq!(narrow.uses_of("U8"), vec![&UseTarget::Cast("U8".to_string())]);
}

#[test]
fn test_user_conversion_applies_at_call() {
    let unit = resolve(vec![
        DeclSpec::structure("Feet", vec![("value", ty("I32"))]),
        DeclSpec::structure("Meters", vec![("value", ty("I32"))]),
        DeclSpec::function("Meters", vec![("f", ty("Feet"))], Some(ty("Meters")), vec![])
            .with_self_param()
            .without_body(),
        DeclSpec::function("walk", vec![("m", ty("Meters"))], None, vec![]),
        DeclSpec::function(
            "main",
            vec![],
            None,
            vec![
                StmtSpec::Decl(DeclSpec::variable("f", Some(ty("Feet")), None)),
                StmtSpec::Expr(Expr::call("walk", vec![Expr::name("f")])),
            ],
        ),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    let main = unit.find("main").unwrap();
    assert_eq!(main.uses_of("walk"), vec![&declaration("walk(Meters)")]);
    assert_eq!(main.uses_of("Meters(Feet)"), vec![&declaration("Meters(Feet)")]);
}

#[test]
fn test_initializer_and_return_type_mismatch() {
    let unit = resolve(vec![
        DeclSpec::variable("s", Some(ty("String")), Some(Expr::int(5))),
        DeclSpec::function(
            "f",
            vec![],
            Some(ty("U8")),
            vec![StmtSpec::Return(Some(Expr::bool(true)))],
        ),
        DeclSpec::function("g", vec![], Some(ty("U8")), vec![StmtSpec::Return(None)]),
    ]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::TypeMismatch.code(); 3]);
    assert!(
        unit.diagnostics[0]
            .message_text
            .contains("Type '5' is not implicitly convertible to 'String'")
    );
}

// =============================================================================
// Declarations and references
// =============================================================================

#[test]
fn test_enum_with_single_option() {
    let unit = resolve(vec![DeclSpec::enumeration("MyEnum", vec![("None", Some(0))])]);

    assert!(!unit.has_errors());
    assert_eq!(unit.declarations.len(), 1);
    let my_enum = &unit.declarations[0];
    assert_eq!(my_enum.kind, sable::solver::DefKind::Enum);
    assert_eq!(my_enum.options.len(), 1);
    assert_eq!(my_enum.options[0].name, "None");
    assert_eq!(my_enum.options[0].value, 0);
}

#[test]
fn test_enum_values_continue_from_previous() {
    let unit = resolve(vec![
        DeclSpec::enumeration("Level", vec![("Low", None), ("High", Some(10)), ("Max", None)]),
        DeclSpec::variable("top", None, Some(Expr::name("Level.Max"))),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    let values: Vec<i64> = unit.find("Level").unwrap().options.iter().map(|o| o.value).collect();
    assert_eq!(values, vec![0, 10, 11]);
    let top = unit.find("top").unwrap();
    assert_eq!(top.var_type.as_deref(), Some("Level"));
    assert_eq!(top.uses_of("Level.Max"), vec![&declaration("Level")]);
}

#[test]
fn test_forward_reference_resolves() {
    let unit = resolve(vec![
        DeclSpec::variable("a", None, Some(Expr::name("b"))),
        DeclSpec::variable("b", Some(ty("U16")), Some(Expr::int(3))),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    assert_eq!(unit.find("a").unwrap().var_type.as_deref(), Some("U16"));
    assert_eq!(unit.find("a").unwrap().uses_of("b"), vec![&declaration("b")]);
}

#[test]
fn test_untyped_literal_takes_default_integer() {
    let options = ResolverOptions {
        default_integer_type: "I64".to_string(),
        ..ResolverOptions::default()
    };
    let unit = resolve_with(
        vec![
            DeclSpec::variable("n", None, Some(Expr::int(1))),
            DeclSpec::variable("m", None, Some(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2)))),
        ],
        options,
        Arc::new(NoExternalMetadata),
    );
    assert_eq!(unit.find("n").unwrap().var_type.as_deref(), Some("I64"));
    assert_eq!(unit.find("m").unwrap().var_type.as_deref(), Some("I64"));
}

#[test]
fn test_module_members_and_field_access() {
    let unit = resolve(vec![DeclSpec::module(
        "Geo",
        vec![
            DeclSpec::structure("Point", vec![("x", ty("I32")), ("y", ty("I32"))]),
            DeclSpec::variable("origin", Some(ty("Point")), None),
            DeclSpec::variable("x0", None, Some(Expr::name("origin.x"))),
        ],
    )
    .public()]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    let geo = unit.find("Geo").unwrap();
    let names: Vec<&str> = geo.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Point", "origin", "x0"]);
    let x0 = unit.find("Geo.x0").unwrap();
    assert_eq!(x0.var_type.as_deref(), Some("I32"));
    assert_eq!(x0.uses_of("origin"), vec![&declaration("Geo.origin")]);
}

#[test]
fn test_unresolved_and_not_callable() {
    let unit = resolve(vec![
        DeclSpec::variable("v", Some(ty("U8")), Some(Expr::int(1))),
        DeclSpec::variable("w", Some(ty("Missing")), None),
        main_calling(Expr::call("v", vec![])),
    ]);

    let mut found = codes(&unit);
    found.sort();
    assert_eq!(
        found,
        vec![
            DiagnosticCode::UnresolvedReference.code(),
            DiagnosticCode::NotCallable.code()
        ]
    );
    assert_eq!(unit.find("w").unwrap().uses_of("Missing"), vec![&UseTarget::Error]);
}

#[test]
fn test_reference_cycle_reports_deadlock() {
    let unit = resolve(vec![DeclSpec::module(
        "App",
        vec![
            DeclSpec::variable("a", None, Some(Expr::name("b"))),
            DeclSpec::variable("b", None, Some(Expr::name("c"))),
            DeclSpec::variable("c", None, Some(Expr::name("a"))),
        ],
    )]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::ResolutionDeadlock.code(); 3]);
    assert!(
        unit.diagnostics
            .iter()
            .all(|d| d.message_text.contains("App.a -> App.b -> App.c -> App.a"))
    );
}

// =============================================================================
// Templates
// =============================================================================

fn generic_struct() -> DeclSpec {
    DeclSpec::structure("Struct", vec![("Id", ty("T"))]).with_type_params(&["T"])
}

#[test]
fn test_instance_refers_back_to_template() {
    let unit = resolve(vec![
        generic_struct(),
        DeclSpec::variable("s", Some(TypeExpr::generic("Struct", vec![ty("U8")])), None),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    let template = unit.find("Struct").unwrap();
    assert_eq!(unit.instances.len(), 1);
    let instance = &unit.instances[0];
    assert_eq!(instance.name, "Struct<U8>");
    assert_eq!(instance.template, Some(template.def));
    assert_eq!(instance.instance_of.as_deref(), Some("Struct"));
    assert_eq!(instance.type_args, vec!["U8".to_string()]);
    assert_eq!(instance.fields[0].ty, "U8");
    assert_eq!(unit.find("s").unwrap().var_type.as_deref(), Some("Struct<U8>"));
}

#[test]
fn test_instances_are_shared_per_argument_list() {
    let unit = resolve(vec![
        generic_struct(),
        DeclSpec::variable("a", Some(TypeExpr::generic("Struct", vec![ty("U8")])), None),
        DeclSpec::variable("b", Some(TypeExpr::generic("Struct", vec![ty("U8")])), None),
        DeclSpec::variable("c", Some(TypeExpr::generic("Struct", vec![ty("I32")])), None),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    let names: Vec<&str> = unit.instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Struct<I32>", "Struct<U8>"]);

    let target = |var: &str| unit.find(var).unwrap().references[0].def;
    assert_eq!(target("a"), target("b"));
    assert_ne!(target("a"), target("c"));
}

#[test]
fn test_template_argument_count_mismatch() {
    let unit = resolve(vec![
        generic_struct(),
        DeclSpec::variable(
            "s",
            Some(TypeExpr::generic("Struct", vec![ty("U8"), ty("U16")])),
            None,
        ),
        DeclSpec::variable("t", Some(ty("Struct")), None),
    ]);

    assert_eq!(
        codes(&unit),
        vec![DiagnosticCode::TemplateArgumentCountMismatch.code(); 2]
    );
    assert!(unit.instances.is_empty());
}

fn identity() -> DeclSpec {
    DeclSpec::function(
        "identity",
        vec![("x", ty("T"))],
        Some(ty("T")),
        vec![StmtSpec::Return(Some(Expr::name("x")))],
    )
    .with_type_params(&["T"])
}

#[test]
fn test_template_function_inference_and_explicit_arguments() {
    let unit = resolve(vec![
        identity(),
        DeclSpec::variable("flag", None, Some(Expr::call("identity", vec![Expr::bool(true)]))),
        DeclSpec::variable("count", None, Some(Expr::call("identity", vec![Expr::int(5)]))),
        DeclSpec::variable(
            "small",
            None,
            Some(Expr::generic_call("identity", vec![ty("U8")], vec![Expr::int(5)])),
        ),
    ]);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    assert_eq!(unit.find("flag").unwrap().var_type.as_deref(), Some("Bool"));
    assert_eq!(unit.find("count").unwrap().var_type.as_deref(), Some("I32"));
    assert_eq!(unit.find("small").unwrap().var_type.as_deref(), Some("U8"));

    let names: Vec<&str> = unit.instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["identity<Bool>", "identity<I32>", "identity<U8>"]);
    assert!(unit.instances.iter().all(|i| !i.failed));
    assert_eq!(
        unit.find("flag").unwrap().uses_of("identity"),
        vec![&declaration("identity<Bool>(Bool)")]
    );
}

/// `Wrap<T>`, a plain `g(U8, U8)` and a template `g<T>(T, U16): Wrap<T>`.
fn wrap_and_g_overloads() -> Vec<DeclSpec> {
    vec![
        DeclSpec::structure("Wrap", vec![("v", ty("T"))]).with_type_params(&["T"]),
        DeclSpec::function("g", vec![("x", ty("U8")), ("y", ty("U8"))], None, vec![]),
        DeclSpec::function(
            "g",
            vec![("x", ty("T")), ("y", ty("U16"))],
            Some(TypeExpr::generic("Wrap", vec![ty("T")])),
            vec![],
        )
        .with_type_params(&["T"]),
        DeclSpec::variable("a", Some(ty("U8")), None),
        DeclSpec::variable("b", Some(ty("U16")), None),
    ]
}

#[test]
fn test_losing_template_candidate_creates_no_instances() {
    let mut specs = wrap_and_g_overloads();
    specs.push(main_calling(Expr::call("g", vec![Expr::name("a"), Expr::name("a")])));
    let unit = resolve(specs);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    assert!(unit.instances.is_empty(), "{:?}", unit.instances);
    assert_eq!(unit.find("main").unwrap().uses_of("g"), vec![&declaration("g(U8,U8)")]);
}

#[test]
fn test_winning_template_candidate_instantiates_its_return_type() {
    let mut specs = wrap_and_g_overloads();
    specs.push(DeclSpec::variable(
        "won",
        None,
        Some(Expr::call("g", vec![Expr::name("a"), Expr::name("b")])),
    ));
    let unit = resolve(specs);

    assert!(!unit.has_errors(), "{:?}", unit.diagnostics);
    assert_eq!(unit.find("won").unwrap().var_type.as_deref(), Some("Wrap<U8>"));
    let mut names: Vec<&str> = unit.instances.iter().map(|i| i.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Wrap<U8>", "g<U8>"]);
}

#[test]
fn test_overload_with_unresolved_parameter_loses_to_exact_match() {
    let unit = resolve(vec![
        DeclSpec::function("h", vec![("x", ty("Missing"))], None, vec![]),
        DeclSpec::function("h", vec![("x", ty("U8"))], None, vec![]),
        DeclSpec::variable("a", Some(ty("U8")), None),
        main_calling(Expr::call("h", vec![Expr::name("a")])),
    ]);

    assert_eq!(codes(&unit), vec![DiagnosticCode::UnresolvedReference.code()]);
    assert_eq!(unit.find("main").unwrap().uses_of("h"), vec![&declaration("h(U8)")]);
}

#[test]
fn test_template_inference_conflict() {
    let unit = resolve(vec![
        DeclSpec::function("pair", vec![("a", ty("T")), ("b", ty("T"))], None, vec![])
            .with_type_params(&["T"]),
        main_calling(Expr::call("pair", vec![Expr::bool(true), Expr::string("s")])),
    ]);

    assert_eq!(
        codes(&unit),
        vec![DiagnosticCode::TemplateArgumentInferenceFailed.code()]
    );
    assert!(unit.diagnostics[0].message_text.contains("'T' is bound to both"));
}

#[test]
fn test_explicit_template_argument_count_mismatch_at_call() {
    let unit = resolve(vec![
        identity(),
        main_calling(Expr::generic_call(
            "identity",
            vec![ty("U8"), ty("U16")],
            vec![Expr::int(1)],
        )),
    ]);

    assert_eq!(
        codes(&unit),
        vec![DiagnosticCode::TemplateArgumentCountMismatch.code()]
    );
}

#[test]
fn test_runaway_instantiation_hits_depth_limit() {
    let options = ResolverOptions {
        max_instantiation_depth: 6,
        ..ResolverOptions::default()
    };
    let unit = resolve_with(
        vec![
            DeclSpec::structure(
                "Nest",
                vec![(
                    "inner",
                    TypeExpr::generic("Nest", vec![TypeExpr::generic("Nest", vec![ty("T")])]),
                )],
            )
            .with_type_params(&["T"]),
            DeclSpec::variable("n", Some(TypeExpr::generic("Nest", vec![ty("U8")])), None),
        ],
        options,
        Arc::new(NoExternalMetadata),
    );

    assert_eq!(
        codes(&unit),
        vec![DiagnosticCode::InstantiationDepthExceeded.code()]
    );
    assert!(!unit.find("n").unwrap().failed);
    assert_eq!(unit.instances.iter().filter(|i| i.failed).count(), 1);
}

// =============================================================================
// Host metadata and operators
// =============================================================================

fn console() -> Arc<dyn MetadataBridge> {
    Arc::new(
        InMemoryMetadata::new()
            .with_module(
                "System.Console",
                vec![
                    ExternalFunction::new("System.Console.WriteLine", &["String"], "Void"),
                    ExternalFunction::new("System.Console.WriteLine", &["I32"], "Void"),
                ],
            )
            .with_operator(ExternalFunction::new(
                "System.String.op_Multiply",
                &["String", "I32"],
                "String",
            )),
    )
}

#[test]
fn test_external_call_through_imported_namespace() {
    let options = ResolverOptions {
        imported_namespaces: vec!["System".to_string()],
        ..ResolverOptions::default()
    };
    let unit = resolve_with(
        vec![DeclSpec::function(
            "main",
            vec![],
            None,
            vec![
                StmtSpec::Expr(Expr::call("Console.WriteLine", vec![Expr::string("hi")])),
                StmtSpec::Expr(Expr::call("System.Console.WriteLine", vec![Expr::int(42)])),
                StmtSpec::Expr(Expr::call("Console.Beep", vec![])),
            ],
        )],
        options,
        console(),
    );

    assert_eq!(
        codes(&unit),
        vec![DiagnosticCode::UnresolvedExternalSymbol.code()]
    );
    let main = unit.find("main").unwrap();
    let external = UseTarget::External("System.Console.WriteLine".to_string());
    assert_eq!(main.uses_of("Console.WriteLine"), vec![&external]);
    assert_eq!(main.uses_of("System.Console.WriteLine"), vec![&external]);
}

#[test]
fn test_user_and_host_operators() {
    let unit = resolve_with(
        vec![
            DeclSpec::structure("Vec2", vec![("x", ty("F64")), ("y", ty("F64"))]),
            DeclSpec::function(
                "op_Addition",
                vec![("a", ty("Vec2")), ("b", ty("Vec2"))],
                Some(ty("Vec2")),
                vec![],
            )
            .without_body(),
            DeclSpec::variable("p", Some(ty("Vec2")), None),
            DeclSpec::variable("sum", None, Some(Expr::binary(BinaryOp::Add, Expr::name("p"), Expr::name("p")))),
            DeclSpec::variable(
                "echo",
                None,
                Some(Expr::binary(BinaryOp::Mul, Expr::string("ab"), Expr::int(3))),
            ),
            DeclSpec::variable(
                "bad",
                None,
                Some(Expr::binary(BinaryOp::Sub, Expr::bool(true), Expr::bool(false))),
            ),
        ],
        ResolverOptions::default(),
        console(),
    );

    assert_eq!(
        codes(&unit),
        vec![DiagnosticCode::UnresolvedExternalSymbol.code()]
    );
    assert!(unit.diagnostics[0].message_text.contains("op_Subtraction(Bool, Bool)"));

    let sum = unit.find("sum").unwrap();
    assert_eq!(sum.var_type.as_deref(), Some("Vec2"));
    assert_eq!(
        sum.uses_of("op_Addition"),
        vec![&declaration("op_Addition(Vec2,Vec2)")]
    );

    let echo = unit.find("echo").unwrap();
    assert_eq!(echo.var_type.as_deref(), Some("String"));
    assert_eq!(
        echo.uses_of("op_Multiply"),
        vec![&UseTarget::External("System.String.op_Multiply".to_string())]
    );
}

#[test]
fn test_json_output_is_camel_case() {
    let unit = resolve(vec![
        DeclSpec::function("f", vec![("a", ty("U8"))], Some(ty("U8")), vec![]).without_body(),
    ]);
    let json = unit.to_json().unwrap();
    assert!(json.contains("\"qualifiedName\": \"f\""), "{json}");
    assert!(json.contains("\"overloadKey\": \"f(U8)\""), "{json}");
    assert!(json.contains("\"returnType\": \"U8\""), "{json}");
}
