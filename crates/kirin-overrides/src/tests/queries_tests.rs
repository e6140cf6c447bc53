use super::*;
use kirin_ir::{DeclId, DeclOrigin, IrArena, IrBuilder, Modality, SymbolId, Visibility};

fn symbol(arena: &IrArena, decl: DeclId) -> SymbolId {
    arena.decl(decl).symbol
}

fn make_fake(arena: &mut IrArena, member: DeclId, overridden: &[DeclId]) {
    let symbols = overridden.iter().map(|&d| arena.decl(d).symbol).collect();
    arena.decl_mut(member).origin = DeclOrigin::FakeOverride;
    set_overridden(arena, member, symbols);
}

/// `interface I { fun f() }`, `open class A : I { override fun f() }`,
/// `class B : A` with a fake `f`.
fn hierarchy(arena: &mut IrArena) -> (DeclId, DeclId, DeclId) {
    let mut b = IrBuilder::new(arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let i = b.interface(file, "I").build();
    let a = b.class(file, "A").modality(Modality::Open).extends("I").build();
    let c = b.class(file, "B").extends("A").build();
    let i_f = b.function(i, "f").modality(Modality::Abstract).build();
    let a_f = b.function(a, "f").modality(Modality::Open).build();
    let b_f = b.function(c, "f").modality(Modality::Open).build();
    let i_f_symbol = arena.decl(i_f).symbol;
    set_overridden(arena, a_f, vec![i_f_symbol]);
    make_fake(arena, b_f, &[a_f]);
    (i_f, a_f, b_f)
}

#[test]
fn test_overridden_declarations_stop_at_real_members() {
    let mut arena = IrArena::new();
    let (i_f, a_f, b_f) = hierarchy(&mut arena);

    assert_eq!(overridden_declarations(&arena, a_f), vec![a_f]);
    assert_eq!(overridden_declarations(&arena, b_f), vec![a_f]);
    assert!(overrides(&arena, b_f, a_f));
    assert!(!overrides(&arena, a_f, b_f));
    assert!(!overrides(&arena, b_f, i_f));
}

#[test]
fn test_filter_overrides_keeps_most_derived() {
    let mut arena = IrArena::new();
    let (_, a_f, b_f) = hierarchy(&mut arena);

    assert_eq!(filter_overrides(&arena, &[a_f, b_f]), vec![b_f]);
    assert_eq!(filter_overrides(&arena, &[b_f, a_f]), vec![b_f]);
    assert_eq!(filter_overrides(&arena, &[a_f]), vec![a_f]);
}

#[test]
fn test_collect_real_overrides_drops_repeated() {
    let mut arena = IrArena::new();
    let (i_f, a_f, b_f) = hierarchy(&mut arena);

    assert_eq!(collect_real_overrides(&arena, a_f), vec![a_f]);
    assert_eq!(collect_real_overrides(&arena, b_f), vec![a_f]);

    // A second fake path straight to I.f is overridden by A.f.
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("other");
    let file = b.file(module, "other.kt", "other");
    let d = b.class(file, "D").build();
    let d_f = b.function(d, "f").modality(Modality::Open).build();
    make_fake(&mut arena, d_f, &[b_f, i_f]);
    assert_eq!(collect_real_overrides(&arena, d_f), vec![a_f]);
}

#[test]
fn test_resolve_fake_override_prefers_class_implementation() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let i = b.interface(file, "I").build();
    let base = b.class(file, "Base").modality(Modality::Open).build();
    let j = b.interface(file, "J").build();
    let c = b.class(file, "C").extends("I").extends("Base").extends("J").build();
    let default = b.function(i, "f").modality(Modality::Open).build();
    let implementation = b.function(base, "f").modality(Modality::Open).build();
    let declaration = b.function(j, "f").modality(Modality::Abstract).build();
    let fake = b.function(c, "f").modality(Modality::Open).build();
    make_fake(&mut arena, fake, &[default, implementation, declaration]);

    assert_eq!(resolve_fake_override(&arena, fake), Some(implementation));

    let only_abstract = {
        let mut b = IrBuilder::new(&mut arena);
        let k = b.class(file, "K").modality(Modality::Abstract).build();
        b.function(k, "f").modality(Modality::Abstract).build()
    };
    make_fake(&mut arena, only_abstract, &[declaration]);
    assert_eq!(resolve_fake_override(&arena, only_abstract), None);
}

#[test]
fn test_set_overridden_binds_accessors() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let int = b.int_type();
    let base = b.class(file, "Base").modality(Modality::Open).build();
    let derived = b.class(file, "Derived").extends("Base").build();
    let base_size = b
        .property(base, "size", int.clone())
        .modality(Modality::Open)
        .var_with_setter_visibility(Some(Visibility::Protected))
        .build();
    let size = b.property(derived, "size", int).var().build();

    let base_symbol = symbol(&arena, base_size);
    set_overridden(&mut arena, size, vec![base_symbol]);

    let accessors = |property: DeclId| {
        let data = arena.decl(property).as_property().cloned().unwrap();
        (data.getter.unwrap(), data.setter.unwrap())
    };
    let (base_getter, base_setter) = accessors(base_size);
    let (getter, setter) = accessors(size);
    assert_eq!(arena.decl(size).overridden(), &[base_symbol]);
    assert_eq!(arena.decl(getter).overridden(), &[symbol(&arena, base_getter)]);
    assert_eq!(arena.decl(setter).overridden(), &[symbol(&arena, base_setter)]);
}
