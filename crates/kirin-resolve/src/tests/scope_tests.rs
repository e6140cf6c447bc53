use super::*;
use kirin_ir::{IrArena, IrBuilder};
use std::rc::Rc;

fn two_packages() -> (IrArena, Rc<DeclarationIndex>) {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("lib");
    let a = b.file(module, "a.kt", "a");
    let other = b.file(module, "b.kt", "b");
    b.class(a, "Shared").build();
    let outer = b.class(other, "Shared").build();
    b.class(outer, "Inner").build();
    b.function(a, "helper").build();
    b.function(other, "helper").build();
    let index = Rc::new(DeclarationIndex::build(&arena));
    (arena, index)
}

#[test]
fn test_innermost_layer_wins_classifier_lookup() {
    let (arena, index) = two_packages();
    let name = arena.names.lookup("Shared").expect("interned");
    let scope = CompositeScope::new([
        PackageMemberScope::new("a".into(), index.clone()),
        PackageMemberScope::new("b".into(), index.clone()),
    ]);

    let found = scope.lookup_classifier(&arena, name).expect("found");
    assert_eq!(arena.render(found), "b/Shared");
}

#[test]
fn test_child_scope_shares_tail() {
    let (arena, index) = two_packages();
    let base = CompositeScope::new([PackageMemberScope::new("a".into(), index.clone())]);
    let child = base.child_scope(Some(PackageMemberScope::new("b".into(), index)));
    let same = base.child_scope(None);

    assert_eq!(base.len(), 1);
    assert_eq!(child.len(), 2);
    assert_eq!(same.len(), 1);
    let name = arena.names.lookup("Shared").expect("interned");
    assert_eq!(
        base.lookup_classifier(&arena, name).map(|d| arena.render(d)),
        Some("a/Shared".to_string())
    );
}

#[test]
fn test_layers_deduplicate_providers() {
    let (_, index) = two_packages();
    let layer = PackageMemberScope::new("a".into(), index);
    let scope = CompositeScope::new([layer.clone(), layer]);
    assert_eq!(scope.len(), 2);
    assert_eq!(scope.layers().len(), 1);
}

#[test]
fn test_function_lookup_collects_every_layer_once() {
    let (arena, index) = two_packages();
    let name = arena.names.lookup("helper").expect("interned");
    let scope = CompositeScope::new([
        PackageMemberScope::new("a".into(), index.clone()),
        PackageMemberScope::new("b".into(), index.clone()),
        StarImportScope::new(vec!["a".into()], index),
    ]);

    let found = scope.lookup_functions(&arena, name);
    assert_eq!(found.len(), 2);
    assert!(scope.lookup_properties(&arena, name).is_empty());
}

#[test]
fn test_star_import_of_class_brings_nested_classifiers() {
    let (arena, index) = two_packages();
    let name = arena.names.lookup("Inner").expect("interned");
    let scope = CompositeScope::new([StarImportScope::new(vec!["b.Shared".into()], index)]);

    let found = scope.lookup_classifier(&arena, name).expect("found");
    assert_eq!(arena.render(found), "b/Shared.Inner");
}

#[test]
fn test_explicit_import_alias() {
    let (mut arena, index) = two_packages();
    let alias = arena.intern("Renamed");
    let scope = CompositeScope::new([ExplicitImportScope::new(
        vec![(alias, "b.Shared.Inner".into())],
        index,
    )]);

    let found = scope.lookup_classifier(&arena, alias).expect("found");
    assert_eq!(arena.decl_name(found), "Inner");
}

#[test]
fn test_type_parameter_scope_absent_without_parameters() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("lib");
    let file = b.file(module, "a.kt", "a");
    let plain = b.class(file, "Plain").build();
    let mut generic = b.class(file, "Box");
    generic.type_parameter("T");
    let generic = generic.build();

    assert!(TypeParameterScope::for_declaration(&arena, plain).is_none());
    let scope = CompositeScope::empty()
        .child_scope(TypeParameterScope::for_declaration(&arena, generic));
    let t = arena.names.lookup("T").expect("interned");
    let found = scope.lookup_classifier(&arena, t).expect("found");
    assert_eq!(arena.decl_name(found), "T");
}
