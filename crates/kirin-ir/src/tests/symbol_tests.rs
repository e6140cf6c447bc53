use super::*;

#[test]
fn test_reference_deduplicates_public_signatures() {
    let mut table = SymbolTable::new();
    let sig = IdSignature::public("lib", "foo", Some(1));
    let a = table.reference(SymbolKind::Function, sig.clone());
    let b = table.reference(SymbolKind::Function, sig.clone());
    assert_eq!(a, b);
    assert_eq!(table.lookup(&sig), Some(a));
    assert!(!table.is_bound(a));
}

#[test]
fn test_file_local_references_are_not_shared() {
    let mut table = SymbolTable::new();
    let sig = IdSignature::FileLocal {
        container: Box::new(IdSignature::public("lib", "A", None)),
        id: 1,
    };
    let a = table.reference(SymbolKind::Function, sig.clone());
    let b = table.reference(SymbolKind::Function, sig);
    assert_ne!(a, b);
    assert!(!table.is_public_api(a));
}

#[test]
fn test_bind_and_delegate() {
    let mut table = SymbolTable::new();
    let expect = table.declare(SymbolKind::Function);
    let actual = table.declare(SymbolKind::Function);
    table.bind(expect, DeclId(1));
    table.bind(actual, DeclId(2));
    assert_eq!(table.owner(expect), Some(DeclId(1)));

    table.set_delegate(expect, actual);
    assert_eq!(table.resolve(expect), actual);
    assert_eq!(table.owner(expect), Some(DeclId(2)));
}

#[test]
fn test_binding_through_delegate_binds_target() {
    let mut table = SymbolTable::new();
    let fake = table.declare(SymbolKind::Property);
    let registered = table.reference(SymbolKind::Property, IdSignature::public("lib", "B.x", Some(3)));
    table.set_delegate(fake, registered);
    table.bind(fake, DeclId(10));
    assert_eq!(table.owner(registered), Some(DeclId(10)));
    assert_eq!(
        table.signature(fake),
        Some(&IdSignature::public("lib", "B.x", Some(3)))
    );
}

#[test]
fn test_rebinding_same_declaration_is_allowed() {
    let mut table = SymbolTable::new();
    let s = table.declare(SymbolKind::Class);
    table.bind(s, DeclId(4));
    table.bind(s, DeclId(4));
    assert_eq!(table.owner(s), Some(DeclId(4)));
}

#[test]
#[should_panic(expected = "already bound")]
fn test_rebinding_different_declaration_panics() {
    let mut table = SymbolTable::new();
    let s = table.declare(SymbolKind::Class);
    table.bind(s, DeclId(4));
    table.bind(s, DeclId(5));
}

#[test]
fn test_unbound_symbols() {
    let mut table = SymbolTable::new();
    let bound = table.declare(SymbolKind::Class);
    let unbound = table.reference(SymbolKind::Class, IdSignature::public("lib", "X", None));
    table.bind(bound, DeclId(0));
    assert_eq!(table.unbound_symbols(), vec![unbound]);
}
