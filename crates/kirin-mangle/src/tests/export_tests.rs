use super::*;
use kirin_common::SpecialNames;
use kirin_ir::{ClassKind, IrArena, IrBuilder, Visibility};

#[test]
fn test_visibility_decides_top_level_export() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let public = b.function(file, "public").build();
    let internal = b.function(file, "internal").visibility(Visibility::Internal).build();
    let private = b.function(file, "private").visibility(Visibility::Private).build();

    let checker = ExportChecker::new(&arena);
    assert!(checker.check(public));
    assert!(checker.check(internal));
    assert!(!checker.check(private));
}

#[test]
fn test_members_inherit_container_export() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let hidden = b.class(file, "Hidden").visibility(Visibility::Private).build();
    let member = b.function(hidden, "run").build();
    let open = b.class(file, "Open").build();
    let open_member = b.function(open, "run").build();
    let protected = b.function(open, "guarded").visibility(Visibility::Protected).build();

    let checker = ExportChecker::new(&arena);
    assert!(!checker.check(member));
    assert!(checker.check(open_member));
    assert!(checker.check(protected));
}

#[test]
fn test_published_api_overrides_visibility() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let published = b
        .function(file, "helper")
        .visibility(Visibility::Private)
        .annotation(export::PUBLISHED_API_ANNOTATION)
        .build();

    assert!(ExportChecker::new(&arena).check(published));
}

#[test]
fn test_parameters_and_type_parameters_are_never_exported() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let int = b.int_type();
    let mut f = b.function(file, "f");
    f.type_parameter("T");
    let f = f.param("x", int).build();

    let function = arena.decl(f).as_function().expect("function");
    let (parameter, type_parameter) = (function.value_parameters[0], function.type_parameters[0]);
    let checker = ExportChecker::new(&arena);
    assert!(!checker.check(parameter));
    assert!(!checker.check(type_parameter));
}

#[test]
fn test_backing_field_follows_property_annotations() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let int = b.int_type();
    let plain = b.property(file, "plain", int.clone()).backing_field().build();
    let published = b.property(file, "published", int).backing_field().build();
    b.arena()
        .decl_mut(published)
        .annotations
        .push(kirin_common::FqName::new(export::PUBLISHED_API_ANNOTATION));

    let field = |property| {
        arena
            .decl(property)
            .as_property()
            .and_then(|p| p.backing_field)
            .expect("backing field")
    };
    let (plain_field, published_field) = (field(plain), field(published));
    let checker = ExportChecker::new(&arena);
    assert!(!checker.check(plain_field));
    assert!(checker.check(published_field));
}

#[test]
fn test_special_cases() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app");
    let file = b.file(module, "main.kt", "lib");
    let any = b.user_type("Any");
    let alias = b.type_alias(file, "Alias", any);
    b.arena().decl_mut(alias).visibility = Visibility::Private;
    let anonymous = b.class(file, SpecialNames::NO_NAME_PROVIDED).build();
    let object = b.class(file, "Singleton").kind(ClassKind::Object).build();
    let ctor = b.constructor(object).visibility(Visibility::Private).build();

    let checker = ExportChecker::new(&arena);
    assert!(checker.check(alias));
    assert!(!checker.check(anonymous));
    assert!(checker.check(ctor));
}
