use super::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_cache_creates_once_per_key() {
    let cache = InstantiationCache::new();
    let created = AtomicU32::new(0);
    let next = AtomicU32::new(100);

    let results: Vec<(DefId, bool)> = (0..128)
        .into_par_iter()
        .map(|i| {
            let arg = if i % 2 == 0 { TypeId::U8 } else { TypeId::I32 };
            cache.get_or_create(InstantiationKey::new(DefId(1), &[arg]), |_| {
                created.fetch_add(1, Ordering::SeqCst);
                DefId(next.fetch_add(1, Ordering::SeqCst))
            })
        })
        .collect();

    assert_eq!(created.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
    assert_eq!(results.iter().filter(|(_, fresh)| *fresh).count(), 2);

    let u8_instance = cache.get(&InstantiationKey::new(DefId(1), &[TypeId::U8]));
    let i32_instance = cache.get(&InstantiationKey::new(DefId(1), &[TypeId::I32]));
    assert!(u8_instance.is_some());
    assert_ne!(u8_instance, i32_instance);
}

#[test]
fn test_inference_binds_each_param() {
    let interner = TypeInterner::new();
    let mut inference = TemplateInference::new(&names(&["K", "V"]));
    inference.bind(0, TypeId::U8).unwrap();
    inference.bind(1, TypeId::STRING).unwrap();
    inference.bind(0, TypeId::U8).unwrap();
    assert_eq!(
        inference.finish(&interner, IntrinsicKind::I32),
        Ok(vec![TypeId::U8, TypeId::STRING])
    );
}

#[test]
fn test_inference_conflict() {
    let mut inference = TemplateInference::new(&names(&["T"]));
    inference.bind(0, TypeId::U8).unwrap();
    assert_eq!(
        inference.bind(0, TypeId::STRING),
        Err(InferenceError::Conflict {
            param: "T".to_string(),
            first: TypeId::U8,
            second: TypeId::STRING,
        })
    );
}

#[test]
fn test_inference_unbound() {
    let interner = TypeInterner::new();
    let mut inference = TemplateInference::new(&names(&["T", "U"]));
    inference.bind(0, TypeId::U8).unwrap();
    assert_eq!(
        inference.finish(&interner, IntrinsicKind::I32),
        Err(InferenceError::Unbound {
            param: "U".to_string()
        })
    );
}

#[test]
fn test_literals_adopt_typed_binding() {
    let interner = TypeInterner::new();
    let mut inference = TemplateInference::new(&names(&["T"]));
    inference.bind_literal(0, 7);
    inference.bind(0, TypeId::U8).unwrap();
    assert_eq!(
        inference.finish(&interner, IntrinsicKind::I32),
        Ok(vec![TypeId::U8])
    );

    let mut alone = TemplateInference::new(&names(&["T"]));
    alone.bind_literal(0, 7);
    assert_eq!(alone.finish(&interner, IntrinsicKind::I32), Ok(vec![TypeId::I32]));

    let mut too_big = TemplateInference::new(&names(&["T"]));
    too_big.bind(0, TypeId::U8).unwrap();
    too_big.bind_literal(0, 1000);
    assert!(matches!(
        too_big.finish(&interner, IntrinsicKind::I32),
        Err(InferenceError::Conflict { .. })
    ));
}

#[test]
fn test_substitution_keeps_param_order() {
    let subst = substitution(&names(&["T", "U"]), &[TypeId::U8, TypeId::BOOL]);
    let pairs: Vec<(&str, TypeId)> = subst.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(pairs, vec![("T", TypeId::U8), ("U", TypeId::BOOL)]);
}
