use super::*;
use rayon::prelude::*;

#[test]
fn test_intern_same_string_returns_same_atom() {
    let interner = ShardedInterner::new();
    let a1 = interner.intern("Struct");
    let a2 = interner.intern("Struct");
    assert_eq!(a1, a2);
    assert_eq!(&*interner.resolve(a1), "Struct");
}

#[test]
fn test_empty_string_is_none_atom() {
    let interner = ShardedInterner::new();
    assert_eq!(interner.intern(""), Atom::NONE);
    assert!(Atom::NONE.is_none());
    assert_eq!(&*interner.resolve(Atom::NONE), "");
}

#[test]
fn test_common_strings_are_preinterned() {
    let interner = ShardedInterner::new();
    let before = interner.len();
    interner.intern("U8");
    interner.intern("self");
    assert_eq!(interner.len(), before);
}

#[test]
fn test_concurrent_intern_is_deduplicated() {
    let interner = ShardedInterner::new();
    let atoms: Vec<Atom> = (0..256)
        .into_par_iter()
        .map(|i| interner.intern(&format!("name{}", i % 8)))
        .collect();

    for (i, atom) in atoms.iter().enumerate() {
        assert_eq!(*atom, interner.intern(&format!("name{}", i % 8)));
    }
    let distinct: std::collections::HashSet<_> = atoms.into_iter().collect();
    assert_eq!(distinct.len(), 8);
}
