//! Building small trees through the public builder API.

use kirin_ir::{
    ClassKind, DeclData, DeclFlags, DeclKind, DeclParent, IrArena, IrBuilder, Modality, TypeRef,
    Visibility,
};

#[test]
fn test_class_with_members() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("lib");
    let file = b.file(module, "shapes.kt", "geo");

    let int = b.int_type();
    let shape = b
        .interface(file, "Shape")
        .visibility(Visibility::Public)
        .build();
    let area = b
        .function(shape, "area")
        .modality(Modality::Abstract)
        .returns(int)
        .build();
    let name = b
        .property(shape, "name", b.string_type())
        .modality(Modality::Abstract)
        .build();

    assert_eq!(arena.members(shape), &[area, name]);
    assert_eq!(arena.file(file).declarations, vec![shape]);
    assert_eq!(arena.fq_name(area).as_str(), "geo.Shape.area");
    assert_eq!(arena.render(shape), "geo/Shape");
    assert_eq!(
        arena.decl(shape).as_class().map(|c| c.kind),
        Some(ClassKind::Interface)
    );
    let getter = arena
        .decl(name)
        .as_property()
        .and_then(|p| p.getter)
        .expect("property has a getter");
    assert_eq!(arena.decl_name(getter), "<get-name>");
    assert_eq!(arena.decl(getter).modality(), Some(Modality::Abstract));
    assert_eq!(arena.parent_class(getter), Some(shape));
}

#[test]
fn test_var_property_gets_setter_and_receiver() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("lib");
    let file = b.file(module, "ext.kt", "lib");
    let int = b.int_type();
    let string = b.string_type();
    let prop = b
        .property(file, "size", int)
        .receiver(string)
        .var()
        .build();

    let data = arena.decl(prop).as_property().expect("property");
    let setter = data.setter.expect("var has a setter");
    assert!(arena.decl(prop).flags.contains(DeclFlags::VAR));
    let setter_data = arena.decl(setter).as_function().expect("setter");
    assert!(setter_data.extension_receiver.is_some());
    assert_eq!(setter_data.value_parameters.len(), 1);
    assert_eq!(setter_data.corresponding_property, Some(prop));
}

#[test]
fn test_generic_class_and_unresolved_supertype() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("lib");
    let file = b.file(module, "box.kt", "lib");

    let mut boxed = b.class(file, "Box").modality(Modality::Open);
    let t = boxed.type_parameter("T");
    let boxed = boxed.extends("Container").build();
    let get = b.function(boxed, "get").returns(t).build();

    let class = arena.decl(boxed).as_class().expect("class");
    assert_eq!(class.type_parameters.len(), 1);
    assert!(matches!(class.super_types[0], TypeRef::Unresolved(_)));
    let tp = class.type_parameters[0];
    assert_eq!(arena.decl(tp).parent, DeclParent::Decl(boxed));
    assert_eq!(arena.decl(tp).kind(), DeclKind::TypeParameter);
    let returns = &arena.decl(get).as_function().expect("function").return_type;
    assert_eq!(returns.classifier().map(|c| c.symbol()), Some(arena.decl(tp).symbol));
    assert_eq!(arena.render_type(&arena.class_type(boxed)), "lib.Box<T>");
}

#[test]
fn test_expect_actual_recorded_on_file() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let common = b.module("common");
    let platform = b.module_with_deps("platform", &[common]);
    let common_file = b.file(common, "f.kt", "app");
    let platform_file = b.file(platform, "f.jvm.kt", "app");
    let expect = b.function(common_file, "f").flag(DeclFlags::EXPECT).build();
    let actual = b.function(platform_file, "f").flag(DeclFlags::ACTUAL).build();
    b.expect_actual(platform_file, expect, actual);

    let pairs = &arena.file(platform_file).actuals;
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].expect, arena.decl(expect).symbol);
    assert_eq!(arena.module(platform).dependencies, vec![common]);
    assert!(matches!(arena.decl(actual).data, DeclData::Function(_)));
}
