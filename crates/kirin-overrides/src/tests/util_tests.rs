use super::*;
use kirin_ir::{DeclFlags, DeclId, IrArena, IrBuilder, Modality, TypeSubstitution, Visibility};

fn declared(decls: &[DeclId]) -> Vec<OverridableMember> {
    decls.iter().copied().map(OverridableMember::declared).collect()
}

#[test]
fn test_basic_overridability() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let int = b.int_type();
    let string = b.string_type();
    let base = b.class(file, "Base").build();
    let derived = b.class(file, "Derived").build();
    let base_f = b.function(base, "f").param("x", int.clone()).build();
    let same = b.function(derived, "f").param("y", int.clone()).build();
    let other_type = b.function(derived, "f").param("x", string.clone()).build();
    let other_count = b.function(derived, "f").build();
    let other_name = b.function(derived, "g").param("x", int.clone()).build();
    let property = b.property(derived, "f", int.clone()).build();
    let with_receiver = b.function(derived, "f").receiver(string).param("x", int.clone()).build();
    let suspending = b.function(derived, "f").param("x", int).flag(DeclFlags::SUSPEND).build();

    let util = OverridingUtil::new(&arena);
    let sup = OverridableMember::declared(base_f);
    let check = |sub| util.is_overridable_by(&sup, &OverridableMember::declared(sub));

    assert_eq!(check(same), OverrideCompatibilityInfo::success());
    assert_eq!(check(other_type).message, "Value parameter type mismatch");
    assert_eq!(check(other_count).message, "Value parameter number mismatch");
    assert_eq!(check(other_name).message, "Name mismatch");
    assert_eq!(check(property).message, "Member kind mismatch");
    assert_eq!(check(with_receiver).message, "Receiver presence mismatch");
    assert_eq!(check(suspending).result, OverrideCompatibility::Conflict);
    assert_eq!(
        util.both_ways_overridability(&sup, &OverridableMember::declared(suspending)),
        OverrideCompatibility::Conflict
    );
}

#[test]
fn test_generic_member_through_substitution() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let int = b.int_type();
    let mut boxed = b.class(file, "Box");
    let t = boxed.type_parameter("T");
    let boxed = boxed.build();
    let put = b.function(boxed, "put").param("x", t).build();
    let int_box = b.class(file, "IntBox").build();
    let int_put = b.function(int_box, "put").param("x", int.clone()).build();

    let parameter = arena.decl(boxed).type_parameters()[0];
    let mut substitution = TypeSubstitution::default();
    substitution.insert(arena.decl(parameter).symbol, int.clone());
    let super_type = kirin_ir::IrType::class(arena.decl(boxed).symbol, vec![int]);
    let inherited = OverridableMember::inherited(put, super_type, substitution);

    let util = OverridingUtil::new(&arena);
    let declared = OverridableMember::declared(int_put);
    assert_eq!(
        util.is_overridable_by(&inherited, &declared).result,
        OverrideCompatibility::Overridable
    );
    assert_eq!(
        util.is_overridable_by(&OverridableMember::declared(put), &declared).result,
        OverrideCompatibility::Incompatible
    );
}

#[test]
fn test_generic_functions_match_by_position() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let any = b.any_type();
    let base = b.class(file, "Base").build();
    let derived = b.class(file, "Derived").build();
    let mut f = b.function(base, "f");
    let t = f.type_parameter("T");
    let f = f.param("x", t).build();
    let mut g = b.function(derived, "f");
    let u = g.type_parameter("U");
    let g = g.param("x", u).build();
    let plain = b.function(derived, "f").param("x", any).build();

    let util = OverridingUtil::new(&arena);
    let sup = OverridableMember::declared(f);
    assert_eq!(
        util.is_overridable_by(&sup, &OverridableMember::declared(g)).result,
        OverrideCompatibility::Overridable
    );
    assert_eq!(
        util.is_overridable_by(&sup, &OverridableMember::declared(plain)).message,
        "Type parameter number mismatch"
    );
}

#[test]
fn test_modality_rules() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let class = b.class(file, "C").build();
    let expect_class = b.class(file, "E").modality(Modality::Open).flag(DeclFlags::EXPECT).build();
    let a = b.class(file, "A").build();
    let final_f = b.function(a, "f").build();
    let open_f = b.function(a, "f").modality(Modality::Open).build();
    let abstract_f = b.function(a, "f").modality(Modality::Abstract).build();

    let members = declared(&[final_f, open_f, abstract_f]);
    let util = OverridingUtil::new(&arena);
    assert_eq!(util.determine_modality(&members, &[0, 1, 2], class), Modality::Final);
    assert_eq!(util.determine_modality(&members, &[1], class), Modality::Open);
    assert_eq!(util.determine_modality(&members, &[2], class), Modality::Abstract);
    assert_eq!(util.determine_modality(&members, &[1, 2], class), Modality::Open);
    assert_eq!(util.determine_modality(&members, &[2], expect_class), Modality::Open);
}

#[test]
fn test_visibility_and_most_specific() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let any = b.any_type();
    let string = b.string_type();
    let a = b.class(file, "A").build();
    let general = b.function(a, "get").returns(any).visibility(Visibility::Protected).build();
    let specific = b.function(a, "get").returns(string).build();
    let private = b.function(a, "get").visibility(Visibility::Private).build();

    let members = declared(&[general, specific, private]);
    let util = OverridingUtil::new(&arena);
    assert_eq!(util.find_member_with_max_visibility(&members, &[0, 1]), 1);
    assert_eq!(util.find_member_with_max_visibility(&members, &[2, 0]), 0);
    assert_eq!(util.filter_visible(&members, &[0, 1, 2]), vec![0, 1]);
    assert!(util.is_more_specific(&members[1], &members[0]));
    assert!(!util.is_more_specific(&members[0], &members[1]));
}

#[test]
fn test_most_specific_prefers_narrower_return_type() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let any = b.any_type();
    let string = b.string_type();
    let a = b.class(file, "A").build();
    let general = b.function(a, "get").returns(any).build();
    let specific = b.function(a, "get").returns(string).build();
    let dynamic = b.function(a, "get").returns(kirin_ir::IrType::Dynamic).build();

    let members = declared(&[general, specific, dynamic]);
    let util = OverridingUtil::new(&arena);
    assert_eq!(util.select_most_specific(&members, &[0, 1]), 1);
    assert_eq!(util.select_most_specific(&members, &[1, 0]), 1);
    // Equally specific: the first non-dynamic one wins.
    assert_eq!(util.select_most_specific(&members, &[2, 1]), 1);
}

#[test]
fn test_extract_members_overridable_in_both_ways() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let int = b.int_type();
    let a = b.class(file, "A").build();
    let c = b.class(file, "C").build();
    let first = b.function(a, "f").build();
    let second = b.function(c, "f").build();
    let overload = b.function(c, "f").param("x", int).build();
    let suspending = b.function(c, "f").flag(DeclFlags::SUSPEND).build();

    let members = declared(&[first, second, overload, suspending]);
    let util = OverridingUtil::new(&arena);
    let mut remaining = vec![0, 1, 2, 3];
    let group = util.extract_members_overridable_in_both_ways(&members, 0, &mut remaining);
    assert_eq!(group, vec![0, 1]);
    assert_eq!(remaining, vec![2]);
}

#[test]
fn test_return_type_mismatch_conflicts_when_checked() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "app");
    let (int, string, any) = (b.int_type(), b.string_type(), b.any_type());
    let first = b.interface(file, "I1").build();
    let second = b.interface(file, "I2").build();
    let third = b.interface(file, "I3").build();
    let int_f = b.function(first, "f").modality(Modality::Abstract).returns(int).build();
    let string_f = b.function(second, "f").modality(Modality::Abstract).returns(string).build();
    let any_f = b.function(third, "f").modality(Modality::Abstract).returns(any).build();

    let util = OverridingUtil::new(&arena);
    let [int_f, string_f, any_f] = [int_f, string_f, any_f].map(OverridableMember::declared);

    assert_eq!(
        util.is_overridable_by(&int_f, &string_f),
        OverrideCompatibilityInfo::success()
    );
    assert_eq!(
        util.check_overridability(&int_f, &string_f, true),
        OverrideCompatibilityInfo::conflict("Return type mismatch")
    );
    assert_eq!(
        util.check_overridability(&any_f, &int_f, true),
        OverrideCompatibilityInfo::success()
    );
    assert_eq!(
        util.check_overridability(&int_f, &any_f, true).result,
        OverrideCompatibility::Conflict
    );
}
