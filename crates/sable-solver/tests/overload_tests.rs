use super::*;
use crate::conversion::IntrinsicOnly;

fn candidate(key: &'static str, params: &[TypeId]) -> Candidate<&'static str> {
    Candidate {
        key,
        params: params.to_vec(),
    }
}

fn resolve(
    interner: &TypeInterner,
    candidates: &[Candidate<&'static str>],
    args: &[TypeId],
) -> OverloadOutcome<&'static str> {
    match resolve_overload(&mut IntrinsicOnly, interner, candidates, args) {
        Ok(outcome) => outcome,
        Err(never) => match never {},
    }
}

#[test]
fn test_literal_picks_fitting_overload() {
    let interner = TypeInterner::new();
    let set = [candidate("fn2()", &[]), candidate("fn2(U8)", &[TypeId::U8])];
    let outcome = resolve(&interner, &set, &[interner.int_literal(42)]);
    assert!(matches!(outcome, OverloadOutcome::Resolved { key: "fn2(U8)", .. }));
}

#[test]
fn test_zero_args_picks_zero_params() {
    let interner = TypeInterner::new();
    let set = [
        candidate("f(U8)", &[TypeId::U8]),
        candidate("f()", &[]),
        candidate("f(U8,U8)", &[TypeId::U8, TypeId::U8]),
    ];
    assert!(matches!(
        resolve(&interner, &set, &[]),
        OverloadOutcome::Resolved { key: "f()", .. }
    ));
}

#[test]
fn test_exact_match_wins_regardless_of_order() {
    let interner = TypeInterner::new();
    let forward = [candidate("U32", &[TypeId::U32]), candidate("U16", &[TypeId::U16])];
    let backward = [candidate("U16", &[TypeId::U16]), candidate("U32", &[TypeId::U32])];
    for set in [&forward, &backward] {
        match resolve(&interner, set, &[TypeId::U16]) {
            OverloadOutcome::Resolved { key, conversions } => {
                assert_eq!(key, "U16");
                assert_eq!(conversions, vec![Conversion::EXACT]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_tie_between_comparable_candidates_goes_to_first_declared() {
    let interner = TypeInterner::new();
    // Both accept U8 implicitly; U16 refines U32, so this is not ambiguous.
    let set = [candidate("U32", &[TypeId::U32]), candidate("U16", &[TypeId::U16])];
    assert!(matches!(
        resolve(&interner, &set, &[TypeId::U8]),
        OverloadOutcome::Resolved { key: "U32", .. }
    ));
}

#[test]
fn test_incomparable_tie_is_ambiguous() {
    let interner = TypeInterner::new();
    let set = [
        candidate("(U16,U64)", &[TypeId::U16, TypeId::U64]),
        candidate("(U64,U16)", &[TypeId::U64, TypeId::U16]),
    ];
    match resolve(&interner, &set, &[TypeId::U8, TypeId::U8]) {
        OverloadOutcome::Ambiguous { candidates } => {
            assert_eq!(candidates, vec!["(U16,U64)", "(U64,U16)"]);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn test_no_applicable_overload_lists_rejected() {
    let interner = TypeInterner::new();
    let set = [candidate("U8", &[TypeId::U8]), candidate("Bool", &[TypeId::BOOL])];
    match resolve(&interner, &set, &[TypeId::I32]) {
        OverloadOutcome::NoApplicable { rejected } => assert_eq!(rejected, vec!["U8", "Bool"]),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        resolve(&interner, &[], &[TypeId::I32]),
        OverloadOutcome::NoApplicable { .. }
    ));
}

#[test]
fn test_refinement() {
    let interner = TypeInterner::new();
    assert!(refines(&interner, &[TypeId::U8], &[TypeId::U16]));
    assert!(!refines(&interner, &[TypeId::U16], &[TypeId::U8]));
    assert!(!refines(&interner, &[TypeId::U8], &[TypeId::U8]));
    assert!(!refines(&interner, &[TypeId::U8], &[TypeId::U8, TypeId::U8]));
}
