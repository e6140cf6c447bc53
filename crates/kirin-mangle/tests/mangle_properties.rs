//! Properties of mangled names and signatures over a realistic module.

use kirin_ir::{DeclId, IrArena, IrBuilder, Visibility};
use kirin_mangle::{GlobalDeclarationTable, IrMangler, Mangler, RecordingClashTracker, SignatureClashTracker, Signaturer};
use rustc_hash::FxHashSet;

/// A module with overloads, members, generics, extension properties and a
/// private helper.
fn build_library(arena: &mut IrArena) -> Vec<DeclId> {
    let mut b = IrBuilder::new(arena);
    let module = b.module("lib");
    let file = b.file(module, "collections.kt", "lib.collections");
    let int = b.int_type();
    let string = b.string_type();

    let mut decls = Vec::new();
    decls.push(b.function(file, "sum").build());
    decls.push(b.function(file, "sum").param("a", int.clone()).build());
    decls.push(b.function(file, "sum").param("a", int.clone()).param("b", int.clone()).build());
    decls.push(b.function(file, "sum").vararg_param("all", int.clone()).build());
    decls.push(b.function(file, "sum").receiver(string.clone()).build());
    decls.push(b.function(file, "sum").param("a", int.clone().nullable()).build());

    let mut list = b.class(file, "MutableList");
    let element = list.type_parameter("E");
    let list = list.build();
    decls.push(list);
    decls.push(b.constructor(list).build());
    decls.push(b.constructor(list).param("capacity", int.clone()).build());
    decls.push(b.function(list, "add").param("element", element.clone()).build());
    decls.push(b.function(list, "add").param("index", int.clone()).param("element", element).build());
    decls.push(b.property(list, "size", int.clone()).build());
    decls.push(b.property(file, "size", int.clone()).receiver(string).build());
    decls.push(b.function(file, "helper").visibility(Visibility::Internal).build());
    decls
}

#[test]
fn test_overloads_have_distinct_mangles() {
    let mut arena = IrArena::new();
    let decls = build_library(&mut arena);

    let mut seen = FxHashSet::default();
    for &decl in &decls {
        let mangle = IrMangler.mangle(&arena, decl);
        assert!(seen.insert(mangle.clone()), "duplicate mangle {mangle}");
    }
}

#[test]
fn test_mangles_are_stable() {
    let mut arena = IrArena::new();
    let decls = build_library(&mut arena);

    for &decl in &decls {
        assert_eq!(IrMangler.mangle(&arena, decl), IrMangler.mangle(&arena, decl));
        assert_eq!(
            IrMangler.hashed_mangle(&arena, decl),
            IrMangler.hashed_mangle(&arena, decl)
        );
    }
}

#[test]
fn test_library_has_no_signature_clashes() {
    let mut arena = IrArena::new();
    let decls = build_library(&mut arena);

    let signaturer = Signaturer::new(IrMangler, 0);
    let mut tracker = RecordingClashTracker::default();
    for &decl in &decls {
        assert!(IrMangler.is_exported(&arena, decl));
        let signature = signaturer.compose_public_signature(&arena, decl);
        tracker.commit(&arena, decl, &signature);
    }
    assert!(tracker.clashes().is_empty(), "{:?}", tracker.clashes());
}

#[test]
fn test_table_assigns_every_nested_declaration() {
    let mut arena = IrArena::new();
    let decls = build_library(&mut arena);
    let mut table = GlobalDeclarationTable::new(&mut arena);

    for &decl in &decls {
        table.assign_signatures(&mut arena, decl);
    }
    for &decl in &decls {
        for nested in arena.descendants(decl) {
            let symbol = arena.decl(nested).symbol;
            assert!(
                arena.symbols.signature(symbol).is_some(),
                "{} has no signature",
                arena.render(nested)
            );
        }
    }
}
