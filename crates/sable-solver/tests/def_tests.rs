use super::*;
use sable_binder::NodeId;

fn info(kind: DefKind, name: &str, node: u32) -> DefinitionInfo {
    DefinitionInfo::new(
        kind,
        name,
        name,
        SymbolId(node + 1),
        Locality::Module,
        DeclOrder::node(NodeId(node)),
        Span::new(node, node + 1),
    )
}

#[test]
fn test_register_allocates_sequential_ids() {
    let store = DefinitionStore::new();
    let a = store.register(info(DefKind::Struct, "A", 0));
    let b = store.register(info(DefKind::Function, "b", 1));
    assert!(a.is_valid());
    assert_eq!(b.0, a.0 + 1);
    assert_eq!(store.get_kind(a), Some(DefKind::Struct));
    assert_eq!(store.get_name(b).as_deref(), Some("b"));
    assert_eq!(store.all_ids(), vec![a, b]);
    assert!(!DefId::INVALID.is_valid());
}

#[test]
fn test_symbol_binding_never_changes() {
    let store = DefinitionStore::new();
    let first = store.register(info(DefKind::Variable, "x", 0));
    let second = store.register(info(DefKind::Variable, "x", 0));
    assert_eq!(store.bind_symbol(SymbolId(1), first), first);
    assert_eq!(store.bind_symbol(SymbolId(1), second), first);
    assert_eq!(store.def_of_symbol(SymbolId(1)), Some(first));
    assert_eq!(store.def_of_symbol(SymbolId(2)), None);
}

#[test]
fn test_concurrent_binding_has_one_winner() {
    use rayon::prelude::*;

    let store = DefinitionStore::new();
    let winners: Vec<DefId> = (0..64u32)
        .into_par_iter()
        .map(|i| {
            let def = store.register(info(DefKind::Variable, "v", i));
            store.bind_symbol(SymbolId(99), def)
        })
        .collect();
    assert!(winners.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_signature_updates() {
    let store = DefinitionStore::new();
    let f = store.register(info(DefKind::Function, "fn2", 0));
    assert_eq!(store.get_return_type(f), None);
    store.set_signature(
        f,
        vec![ParamInfo {
            name: "p".to_string(),
            span: Span::new(3, 4),
            ty: TypeId::U8,
            is_self: false,
        }],
        TypeId::VOID,
        "fn2(U8)".to_string(),
    );
    let def = store.get(f).unwrap();
    assert_eq!(def.param_types(), vec![TypeId::U8]);
    assert_eq!(def.return_type, Some(TypeId::VOID));
    assert_eq!(def.overload_key.as_deref(), Some("fn2(U8)"));
    assert!(!store.is_failed(f));
    store.mark_failed(f);
    assert!(store.is_failed(f));
}

#[test]
fn test_instance_back_reference() {
    let store = DefinitionStore::new();
    let template = store.register(
        info(DefKind::Struct, "Struct", 0).with_type_params(vec!["T".to_string()]),
    );
    let instance = store.register(
        info(DefKind::Struct, "Struct<U8>", 0)
            .with_type_params(vec!["T".to_string()])
            .instance(template, vec![TypeId::U8]),
    );
    assert!(store.get(template).unwrap().is_template());
    let inst = store.get(instance).unwrap();
    assert!(!inst.is_template());
    assert_eq!(inst.instance_of, Some(template));
    assert_eq!(inst.type_args, vec![TypeId::U8]);
}
