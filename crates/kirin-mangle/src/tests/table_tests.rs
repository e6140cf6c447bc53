use super::*;
use kirin_common::FqName;
use kirin_ir::{IdSignature, IrArena, IrBuilder, SignatureFlags, SymbolKind, Visibility};

#[test]
fn test_builtin_operators_get_builtin_signatures() {
    let mut arena = IrArena::new();
    let _table = GlobalDeclarationTable::new(&mut arena);

    let operators = arena.builtins().operators().to_vec();
    assert!(!operators.is_empty());
    for operator in operators {
        let symbol = arena.decl(operator.decl).symbol;
        let signature = arena.symbols.signature(symbol).expect("signature");
        assert!(signature.is_built_in());
        assert_eq!(arena.symbols.lookup(signature), Some(symbol));
    }
}

#[test]
fn test_builtin_classes_are_registered() {
    let mut arena = IrArena::new();
    let _table = GlobalDeclarationTable::new(&mut arena);

    let any = arena.builtins().any;
    let expected = IdSignature::public("kotlin", "Any", None);
    assert_eq!(arena.symbols.lookup(&expected), Some(arena.decl(any).symbol));
}

#[test]
fn test_public_signature_shape() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let class = b.class(file, "Box").build();
    let method = b.function(class, "get").build();
    let mut table = GlobalDeclarationTable::new(&mut arena);

    let class_signature = table.compute_signature(&arena, class);
    assert_eq!(class_signature, IdSignature::public("lib", "Box", None));

    let method_signature = table.compute_signature(&arena, method);
    let public = method_signature.as_public().expect("public");
    assert_eq!(public.package_fq_name, FqName::new("lib"));
    assert_eq!(public.declaration_fq_name, FqName::new("Box.get"));
    assert_eq!(public.id, Some(hash_mangle("kfun:lib.Box.#get(){}")));
    assert_eq!(method_signature.top_level(), class_signature);
}

#[test]
fn test_accessor_signature_points_to_property() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let int = b.int_type();
    let size = b.property(file, "size", int).build();
    let getter = arena
        .decl(size)
        .as_property()
        .and_then(|p| p.getter)
        .expect("getter");
    let mut table = GlobalDeclarationTable::new(&mut arena);

    let property_signature = table.compute_signature(&arena, size);
    let signature = table.compute_signature(&arena, getter);
    match &signature {
        IdSignature::Accessor { property, accessor } => {
            assert_eq!(**property, property_signature);
            assert_eq!(accessor.declaration_fq_name, FqName::new("<get-size>"));
        }
        other => panic!("expected accessor signature, got {other:?}"),
    }
    assert_eq!(signature.top_level(), property_signature);
}

#[test]
fn test_expect_mask_covers_nested_members() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("common");
    let file = b.file(module, "main.kt", "lib");
    let class = b.class(file, "Platform").flag(kirin_ir::DeclFlags::EXPECT).build();
    let member = b.function(class, "name").build();
    let mut table = GlobalDeclarationTable::new(&mut arena);

    let signature = table.compute_signature(&arena, member);
    assert!(signature.as_public().expect("public").mask.contains(SignatureFlags::EXPECT));
    assert!(signature.is_expect());
}

#[test]
fn test_file_local_signatures_are_stable_per_table() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let hidden = b.function(file, "hidden").visibility(Visibility::Private).build();
    let other = b.function(file, "other").visibility(Visibility::Private).build();
    let mut global = GlobalDeclarationTable::new(&mut arena);
    let mut table = DeclarationTable::new(&mut global);

    let first = table.signature_of(&arena, hidden);
    assert!(first.is_local());
    assert_eq!(table.signature_of(&arena, hidden), first);
    assert_ne!(table.signature_of(&arena, other), first);
    match first {
        IdSignature::FileLocal { container, .. } => assert!(container.is_package()),
        other => panic!("expected file-local signature, got {other:?}"),
    }
}

#[test]
fn test_assign_signatures_adopts_referenced_symbol() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let foo = b.function(file, "foo").build();
    let mut table = GlobalDeclarationTable::new(&mut arena);

    let signature = Signaturer::new(IrMangler, 0).compose_public_signature(&arena, foo);
    let referenced = arena.symbols.reference(SymbolKind::Function, signature.clone());
    let original = arena.decl(foo).symbol;
    assert!(!arena.symbols.is_bound(referenced));

    table.assign_signatures(&mut arena, foo);

    assert_eq!(arena.decl(foo).symbol, referenced);
    assert_eq!(arena.symbols.owner(referenced), Some(foo));
    assert_eq!(arena.symbols.resolve(original), referenced);
    assert_eq!(arena.symbols.lookup(&signature), Some(referenced));
}

#[test]
fn test_recording_tracker_reports_clashes() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let first_file = b.file(module, "a.kt", "lib");
    let second_file = b.file(module, "b.kt", "lib");
    let first = b.function(first_file, "dup").build();
    let second = b.function(second_file, "dup").build();

    let signaturer = Signaturer::new(IrMangler, 0);
    let mut tracker = RecordingClashTracker::default();
    for decl in [first, second] {
        let signature = signaturer.compose_public_signature(&arena, decl);
        tracker.commit(&arena, decl, &signature);
    }

    assert_eq!(tracker.clashes().len(), 1);
    let (_, owner, clashing) = &tracker.clashes()[0];
    assert_eq!((*owner, *clashing), (first, second));
}
