use super::*;
use kirin_ir::{IrArena, IrBuilder, IrType, Variance};

#[test]
fn test_nullability_and_builtin_bounds() {
    let arena = IrArena::new();
    let checker = OverrideTypeChecker::new(&arena);
    let int = arena.int_type();
    let any = arena.any_type();
    let nothing = arena.nothing_type();

    assert!(checker.equal_types(&int, &int.clone()));
    assert!(!checker.equal_types(&int, &int.clone().nullable()));
    assert!(checker.is_subtype_of(&int, &any));
    assert!(checker.is_subtype_of(&nothing, &int));
    assert!(checker.is_subtype_of(&int, &int.clone().nullable()));
    assert!(!checker.is_subtype_of(&int.clone().nullable(), &any));
    assert!(checker.is_subtype_of(&int.clone().nullable(), &any.clone().nullable()));
    assert!(!checker.is_subtype_of(&any, &int));
}

#[test]
fn test_dynamic_is_compatible_both_ways() {
    let arena = IrArena::new();
    let checker = OverrideTypeChecker::new(&arena);
    let string = arena.string_type();

    assert!(checker.is_subtype_of(&IrType::Dynamic, &string));
    assert!(checker.is_subtype_of(&string, &IrType::Dynamic));
    assert!(!checker.equal_types(&IrType::Dynamic, &string));
}

#[test]
fn test_declared_supertypes_are_walked() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let base = b.class(file, "Base").build();
    let base_type = b.class_type(base);
    let middle = b.class(file, "Middle").extends_type(base_type.clone()).build();
    let middle_type = b.class_type(middle);
    let leaf = b.class(file, "Leaf").extends_type(middle_type.clone()).build();
    let leaf_type = b.class_type(leaf);

    let checker = OverrideTypeChecker::new(&arena);
    assert!(checker.is_subtype_of(&leaf_type, &base_type));
    assert!(checker.is_subtype_of(&leaf_type, &middle_type));
    assert!(!checker.is_subtype_of(&base_type, &leaf_type));
}

#[test]
fn test_declared_variance_of_arguments() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let mut producer = b.class(file, "Producer");
    producer.type_parameter("T");
    let producer = producer.build();
    let mut holder = b.class(file, "Holder");
    holder.type_parameter("T");
    let holder = holder.build();
    let int = b.int_type();
    let any = b.any_type();

    let parameter = arena.decl(producer).type_parameters()[0];
    if let kirin_ir::DeclData::TypeParameter(data) = &mut arena.decl_mut(parameter).data {
        data.variance = Variance::Out;
    }

    let class_of = |class, argument: &IrType| IrType::class(arena.decl(class).symbol, vec![argument.clone()]);
    let checker = OverrideTypeChecker::new(&arena);
    assert!(checker.is_subtype_of(&class_of(producer, &int), &class_of(producer, &any)));
    assert!(!checker.is_subtype_of(&class_of(producer, &any), &class_of(producer, &int)));
    assert!(!checker.is_subtype_of(&class_of(holder, &int), &class_of(holder, &any)));
}

#[test]
fn test_axioms_identify_corresponding_type_parameters() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let mut first = b.function(file, "first");
    let t = first.type_parameter("T");
    let first = first.build();
    let mut second = b.function(file, "second");
    let u = second.type_parameter("U");
    let second = second.build();

    let plain = OverrideTypeChecker::new(&arena);
    assert!(!plain.equal_types(&t, &u));

    let checker = OverrideTypeChecker::with_axioms(
        &arena,
        arena.decl(first).type_parameters(),
        arena.decl(second).type_parameters(),
    );
    assert!(checker.equal_types(&t, &u));
    assert!(checker.equal_types(&u.clone().nullable(), &t.clone().nullable()));
    assert!(checker.is_subtype_of(&t, &u.nullable()));
}

#[test]
fn test_type_parameter_upper_bound() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let mut f = b.function(file, "f");
    let t = f.type_parameter("T");
    f.build();
    let int = arena.int_type();
    let any = arena.any_type();

    let checker = OverrideTypeChecker::new(&arena);
    assert!(checker.is_subtype_of(&t, &any.clone().nullable()));
    assert!(!checker.is_subtype_of(&t, &any));
    assert!(!checker.is_subtype_of(&t, &int));
}
