//! Serializing modules in one arena and linking them into a fresh session.

use kirin_ir::{
    Body, DeclData, DeclFlags, DeclId, DeclOrigin, Expr, FunctionClassKind, IdSignature,
    IrArena, IrBuilder, Modality, ModuleId, SymbolId, SymbolKind,
};
use kirin_linker::{
    DeserializationStrategy, IrLibrary, IrLinker, IrSerializer, LinkError, LinkSession,
    LinkerOptions, WireError, FORWARD_DECLARATIONS_MODULE,
};
use kirin_mangle::GlobalDeclarationTable;
use kirin_overrides::{FakeOverrideBuilder, FakeOverrideOptions};

// =============================================================================
// Helpers
// =============================================================================

/// Serialize `modules` and push each library through its byte form.
fn serialize(arena: &mut IrArena, modules: &[ModuleId]) -> Vec<IrLibrary> {
    let mut global = GlobalDeclarationTable::new(arena);
    let mut serializer = IrSerializer::new(arena, &mut global);
    modules
        .iter()
        .map(|&module| {
            let library = serializer.serialize_module(module).expect("serialize");
            IrLibrary::from_bytes(&library.to_bytes()).expect("library bytes reload")
        })
        .collect()
}

fn signature_of(arena: &mut IrArena, decl: DeclId) -> IdSignature {
    let mut global = GlobalDeclarationTable::new(arena);
    global.compute_signature(arena, decl)
}

fn call(callee: SymbolId) -> Body {
    Body::Block(vec![Expr::Call {
        callee,
        receiver: None,
        arguments: Vec::new(),
    }])
}

fn top_level(session: &LinkSession, module: &str, name: &str) -> Option<DeclId> {
    let arena = &session.arena;
    let module = arena.module_by_name(module)?;
    arena
        .module(module)
        .files
        .iter()
        .flat_map(|&file| arena.file(file).declarations.iter().copied())
        .find(|&decl| arena.decl_name(decl) == name)
}

fn body_symbols(session: &LinkSession, function: DeclId) -> Vec<SymbolId> {
    session
        .arena
        .decl(function)
        .as_function()
        .and_then(|f| f.body.as_ref())
        .map(Body::symbols)
        .unwrap_or_default()
}

fn link(libraries: Vec<IrLibrary>, options: LinkerOptions) -> Result<(LinkSession, IrLinker), LinkError> {
    let mut session = LinkSession::new();
    let mut linker = IrLinker::new(&session, options);
    for library in libraries {
        linker.load_library(&mut session, library)?;
    }
    linker.link(&mut session)?;
    Ok((session, linker))
}

/// `lib` with `foo` and `bar`; `app` exports `main`, which calls `foo`.
fn lib_and_app(arena: &mut IrArena) -> (ModuleId, ModuleId) {
    let mut b = IrBuilder::new(arena);
    let lib = b.module("lib");
    let lib_file = b.file(lib, "lib.kt", "lib");
    let int = b.int_type();
    let answer = Body::Expression(Expr::Const(kirin_ir::ConstValue::Int(42)));
    let foo = b.function(lib_file, "foo").returns(int).body(answer).build();
    b.function(lib_file, "bar").build();

    let app = b.module_with_deps("app", &[lib]);
    let app_file = b.file(app, "main.kt", "app");
    let foo_symbol = b.arena().decl(foo).symbol;
    let main = b.function(app_file, "main").body(call(foo_symbol)).build();
    b.explicitly_export(app_file, main);
    (lib, app)
}

// =============================================================================
// Reachability
// =============================================================================

#[test]
fn test_only_reachable_top_levels_are_read() {
    let mut arena = IrArena::new();
    let (lib, app) = lib_and_app(&mut arena);
    let libraries = serialize(&mut arena, &[lib, app]);

    let (session, linker) = link(libraries, LinkerOptions::default()).expect("link");

    let main = top_level(&session, "app", "main").expect("main is exported");
    let foo = top_level(&session, "lib", "foo").expect("foo is called from main");
    assert!(top_level(&session, "lib", "bar").is_none());
    assert_eq!(body_symbols(&session, main), vec![session.arena.decl(foo).symbol]);
    assert_eq!(session.arena.owner(session.arena.decl(foo).symbol), Some(foo));
    assert_eq!(session.arena.decl(foo).origin, DeclOrigin::Deserialized);
    assert_eq!(linker.stats().top_levels, 2);
    assert_eq!(linker.stats().modules, 2);
    assert!(linker.unbound_public_symbols(&session).is_empty());
}

#[test]
fn test_exported_dependency_is_read_whole() {
    let mut arena = IrArena::new();
    let (lib, app) = lib_and_app(&mut arena);
    let libraries = serialize(&mut arena, &[lib, app]);

    let options = LinkerOptions {
        exported_dependencies: vec!["lib".to_string()],
        ..LinkerOptions::default()
    };
    let (session, linker) = link(libraries, options).expect("link");

    assert!(top_level(&session, "lib", "foo").is_some());
    assert!(top_level(&session, "lib", "bar").is_some());
    assert_eq!(linker.stats().top_levels, 3);
}

#[test]
fn test_header_only_module_gets_placeholder_bodies() {
    let mut arena = IrArena::new();
    let (lib, app) = lib_and_app(&mut arena);
    let mut libraries = serialize(&mut arena, &[lib, app]).into_iter();
    let (lib, app) = (libraries.next().unwrap(), libraries.next().unwrap());

    let mut session = LinkSession::new();
    let mut linker = IrLinker::new(&session, LinkerOptions::default());
    linker
        .load_library_with_strategy(&mut session, lib, DeserializationStrategy::OnlyDeclarationHeaders)
        .expect("load lib");
    linker.load_library(&mut session, app).expect("load app");
    linker.link(&mut session).expect("link");

    let foo = top_level(&session, "lib", "foo").expect("foo");
    let body = session.arena.decl(foo).as_function().and_then(|f| f.body.clone());
    assert_eq!(
        body,
        Some(Body::Block(vec![Expr::Error(
            Body::STATEMENT_NOT_DESERIALIZED.to_string()
        )]))
    );
    let main = top_level(&session, "app", "main").expect("main");
    let main_body = session.arena.decl(main).as_function().and_then(|f| f.body.as_ref());
    assert!(main_body.is_some_and(|body| !body.is_placeholder()));
    assert_eq!(linker.stats().bodies, 1);
}

#[test]
fn test_get_declaration_reads_on_demand() {
    let mut arena = IrArena::new();
    let (lib, _) = lib_and_app(&mut arena);
    let bar = {
        let files = &arena.module(lib).files;
        let file = files[0];
        arena.file(file).declarations[1]
    };
    let signature = signature_of(&mut arena, bar);
    let libraries = serialize(&mut arena, &[lib]);

    let mut session = LinkSession::new();
    let mut linker = IrLinker::new(&session, LinkerOptions::default());
    for library in libraries {
        linker
            .load_library_with_strategy(&mut session, library, DeserializationStrategy::OnlyReferenced)
            .expect("load");
    }
    linker.link(&mut session).expect("link");
    assert_eq!(linker.stats().top_levels, 0);

    let symbol = session.arena.symbols.reference(SymbolKind::Function, signature);
    let decl = linker
        .get_declaration(&mut session, symbol)
        .expect("read")
        .expect("bar is declared in lib");
    assert_eq!(session.arena.decl_name(decl), "bar");
    assert_eq!(linker.stats().top_levels, 1);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unowned_signature_fails_the_link() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let lib = b.module("lib");
    let lib_file = b.file(lib, "lib.kt", "lib");
    let foo = b.function(lib_file, "foo").build();
    let app = b.module("app");
    let app_file = b.file(app, "main.kt", "app");
    let foo_symbol = b.arena().decl(foo).symbol;
    let main = b.function(app_file, "main").body(call(foo_symbol)).build();
    b.explicitly_export(app_file, main);
    let libraries = serialize(&mut arena, &[app]);

    let err = link(libraries, LinkerOptions::default()).err().expect("lib is not loaded");
    match err {
        LinkError::NoDeserializerFound { signature } => assert!(signature.contains("foo")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dependencies_must_be_loaded_first() {
    let mut arena = IrArena::new();
    let (lib, app) = lib_and_app(&mut arena);
    let libraries = serialize(&mut arena, &[app, lib]);

    let err = link(libraries, LinkerOptions::default()).err().expect("app needs lib");
    assert!(matches!(
        err,
        LinkError::MissingDependency { ref module, ref dependency } if module == "app" && dependency == "lib"
    ));
}

#[test]
fn test_module_cannot_be_loaded_twice() {
    let mut arena = IrArena::new();
    let (lib, _) = lib_and_app(&mut arena);
    let library = serialize(&mut arena, &[lib]).remove(0);

    let mut session = LinkSession::new();
    let mut linker = IrLinker::new(&session, LinkerOptions::default());
    linker.load_library(&mut session, library.clone()).expect("first load");
    let err = linker.load_library(&mut session, library).unwrap_err();
    assert!(matches!(err, LinkError::DuplicateModule { .. }));
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_class_members_and_type_parameters() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let lib = b.module("lib");
    let file = b.file(lib, "box.kt", "lib");
    let mut class = b.class(file, "Box").modality(Modality::Open);
    let t = class.type_parameter("T");
    let class = class.build();
    b.function(class, "get").returns(t).build();
    b.explicitly_export(file, class);
    let libraries = serialize(&mut arena, &[lib]);

    let (session, _) = link(libraries, LinkerOptions::default()).expect("link");
    let arena = &session.arena;
    let class = top_level(&session, "lib", "Box").expect("Box is exported");
    assert_eq!(arena.decl(class).modality(), Some(Modality::Open));

    let parameter = arena.decl(class).type_parameters()[0];
    assert_eq!(arena.decl_name(parameter), "T");
    let [get] = arena.members(class) else {
        panic!("Box has one member");
    };
    let return_type = &arena.decl(*get).as_function().expect("function").return_type;
    let classifier = return_type.classifier().expect("simple type").symbol();
    assert_eq!(arena.owner(classifier), Some(parameter));
}

#[test]
fn test_property_accessors_point_back_to_their_property() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let lib = b.module("lib");
    let file = b.file(lib, "counter.kt", "lib");
    let int = b.int_type();
    let count = b.property(file, "count", int).var().backing_field().build();
    let getter = b
        .arena()
        .decl(count)
        .as_property()
        .and_then(|p| p.getter)
        .expect("getter");
    let getter_symbol = b.arena().decl(getter).symbol;

    let app = b.module_with_deps("app", &[lib]);
    let app_file = b.file(app, "main.kt", "app");
    let main = b.function(app_file, "main").body(call(getter_symbol)).build();
    b.explicitly_export(app_file, main);
    let libraries = serialize(&mut arena, &[lib, app]);

    let (session, _) = link(libraries, LinkerOptions::default()).expect("link");
    let arena = &session.arena;
    let main = top_level(&session, "app", "main").expect("main");
    let count = top_level(&session, "lib", "count").expect("count is reached through its getter");
    let property = arena.decl(count).as_property().expect("property");

    let getter = arena.owner(body_symbols(&session, main)[0]).expect("getter is bound");
    assert_eq!(property.getter, Some(getter));
    assert!(property.setter.is_some());
    let field = property.backing_field.expect("backing field");
    assert!(matches!(
        &arena.decl(field).data,
        DeclData::Field(data) if data.corresponding_property == Some(count)
    ));
    assert_eq!(
        arena.decl(getter).as_function().and_then(|f| f.corresponding_property),
        Some(count)
    );
}

#[test]
fn test_value_parameters_keep_their_identity_inside_the_body() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let lib = b.module("lib");
    let file = b.file(lib, "id.kt", "lib");
    let int = b.int_type();
    let id = b.function(file, "id").param("x", int.clone()).returns(int).build();
    let x = b.arena().decl(id).as_function().expect("function").value_parameters[0];
    let x_symbol = b.arena().decl(x).symbol;
    let id_symbol = b.arena().decl(id).symbol;
    if let Some(function) = b.arena().decl_mut(id).as_function_mut() {
        function.body = Some(Body::Block(vec![Expr::Return {
            target: id_symbol,
            value: Box::new(Expr::GetValue(x_symbol)),
        }]));
    }
    b.explicitly_export(file, id);
    let libraries = serialize(&mut arena, &[lib]);

    let (session, _) = link(libraries, LinkerOptions::default()).expect("link");
    let id = top_level(&session, "lib", "id").expect("id");
    let x = session.arena.decl(id).as_function().expect("function").value_parameters[0];
    let symbols = body_symbols(&session, id);
    assert_eq!(symbols, vec![session.arena.decl(id).symbol, session.arena.decl(x).symbol]);
    assert_eq!(
        session.arena.decl(x).as_value_parameter().map(|p| p.index),
        Some(0)
    );
}

// =============================================================================
// Expect / actual
// =============================================================================

#[test]
fn test_expect_call_is_redirected_to_the_actual() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let common = b.module("common");
    let common_file = b.file(common, "common.kt", "lib");
    let expect = b.function(common_file, "f").flag(DeclFlags::EXPECT).build();
    let expect_symbol = b.arena().decl(expect).symbol;
    let g = b.function(common_file, "g").body(call(expect_symbol)).build();
    b.explicitly_export(common_file, g);

    let platform = b.module_with_deps("platform", &[common]);
    let platform_file = b.file(platform, "platform.kt", "lib");
    let actual = b.function(platform_file, "f").flag(DeclFlags::ACTUAL).build();
    b.expect_actual(platform_file, expect, actual);
    let libraries = serialize(&mut arena, &[common, platform]);

    let (session, linker) = link(libraries, LinkerOptions::default()).expect("link");
    let g = top_level(&session, "common", "g").expect("g");
    let callee = body_symbols(&session, g)[0];
    let owner = session.arena.owner(callee).expect("callee is bound");
    assert_eq!(Some(owner), top_level(&session, "platform", "f"));
    assert!(session.arena.decl(owner).flags.contains(DeclFlags::ACTUAL));
    assert_eq!(linker.stats().delegated_expects, 1);
}

#[test]
fn test_conflicting_actuals_are_rejected() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let common = b.module("common");
    let common_file = b.file(common, "common.kt", "lib");
    let expect = b.function(common_file, "f").flag(DeclFlags::EXPECT).build();

    let platform = b.module_with_deps("platform", &[common]);
    let platform_file = b.file(platform, "platform.kt", "lib");
    let first = b.function(platform_file, "f").flag(DeclFlags::ACTUAL).build();
    let second = b.function(platform_file, "f2").flag(DeclFlags::ACTUAL).build();
    b.expect_actual(platform_file, expect, first);
    b.expect_actual(platform_file, expect, second);
    let libraries = serialize(&mut arena, &[common, platform]);

    let err = link(libraries, LinkerOptions::default()).err().expect("two actuals");
    assert!(matches!(err, LinkError::ConflictingActual { .. }));
}

// =============================================================================
// Built-ins, forward declarations and fake overrides
// =============================================================================

#[test]
fn test_function_class_is_created_on_reference() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let lib = b.module("lib");
    let file = b.file(lib, "apply.kt", "lib");
    let int = b.int_type();
    let unit = b.unit_type();
    let function1 = b.arena().function_class(FunctionClassKind::Function, 1);
    let block = b.class_type_with(function1, vec![int, unit]);
    let apply = b.function(file, "apply").param("block", block).build();
    b.explicitly_export(file, apply);
    let libraries = serialize(&mut arena, &[lib]);

    let (session, _) = link(libraries, LinkerOptions::default()).expect("link");
    let arena = &session.arena;
    let apply = top_level(&session, "lib", "apply").expect("apply");
    let parameter = arena.decl(apply).as_function().expect("function").value_parameters[0];
    let ty = &arena.decl(parameter).as_value_parameter().expect("parameter").ty;
    let class = arena
        .owner(ty.class_symbol().expect("class type"))
        .expect("function class is bound");
    assert_eq!(
        arena.function_class_kind(class),
        Some((FunctionClassKind::Function, 1))
    );
}

#[test]
fn test_forward_declarations_get_stub_classes() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let interop = b.module("interop");
    let interop_file = b.file(interop, "structs.kt", "cnames.structs");
    let opaque = b.class(interop_file, "Opaque").build();
    let opaque_type = b.class_type(opaque);

    let app = b.module("app");
    let app_file = b.file(app, "main.kt", "app");
    let take = b.function(app_file, "take").param("handle", opaque_type).build();
    b.explicitly_export(app_file, take);
    let libraries = serialize(&mut arena, &[app]);

    let options = LinkerOptions {
        forward_declaration_packages: vec![kirin_common::FqName::new("cnames.structs")],
        ..LinkerOptions::default()
    };
    let (session, linker) = link(libraries, options).expect("link");
    assert_eq!(linker.stats().forward_declarations, 1);

    let stub = top_level(&session, FORWARD_DECLARATIONS_MODULE, "Opaque").expect("stub class");
    assert_eq!(session.arena.decl(stub).origin, DeclOrigin::ForwardDeclaration);
    assert_eq!(session.arena.package_of(stub).as_str(), "cnames.structs");
    assert!(linker.unbound_public_symbols(&session).is_empty());
}

#[test]
fn test_fake_override_references_bind_after_rebuilding() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let lib = b.module("lib");
    let lib_file = b.file(lib, "shapes.kt", "lib");
    let base = b.class(lib_file, "Base").modality(Modality::Open).build();
    b.function(base, "describe").modality(Modality::Open).build();
    let base_type = b.class_type(base);
    let derived = b.class(lib_file, "Derived").extends_type(base_type).build();

    {
        let mut table = GlobalDeclarationTable::new(&mut arena);
        FakeOverrideBuilder::new(&mut table, FakeOverrideOptions::default())
            .provide_fake_overrides(&mut arena, lib);
    }
    let fake = arena
        .members(derived)
        .iter()
        .copied()
        .find(|&m| arena.decl(m).is_fake_override())
        .expect("Derived inherits describe");
    let fake_symbol = arena.decl(fake).symbol;

    let mut b = IrBuilder::new(&mut arena);
    let app = b.module_with_deps("app", &[lib]);
    let app_file = b.file(app, "main.kt", "app");
    let main = b.function(app_file, "main").body(call(fake_symbol)).build();
    b.explicitly_export(app_file, main);
    let libraries = serialize(&mut arena, &[lib, app]);

    let (mut session, linker) = link(libraries, LinkerOptions::default()).expect("link");
    let main = top_level(&session, "app", "main").expect("main");
    let callee = body_symbols(&session, main)[0];
    assert!(!session.arena.symbols.is_bound(callee));
    assert_eq!(linker.unbound_public_symbols(&session).len(), 1);

    let lib = session.arena.module_by_name("lib").expect("lib is loaded");
    let LinkSession { arena, table } = &mut session;
    FakeOverrideBuilder::new(table, FakeOverrideOptions::default()).provide_fake_overrides(arena, lib);

    let owner = session.arena.owner(callee).expect("fake override adopted the reference");
    assert!(session.arena.decl(owner).is_fake_override());
    assert_eq!(session.arena.decl_name(owner), "describe");
    assert_eq!(
        Some(session.arena.parent_decl(owner).expect("member")),
        top_level(&session, "lib", "Derived")
    );
    assert!(linker.unbound_public_symbols(&session).is_empty());
}

#[test]
fn test_sealed_member_modality_is_rejected() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let lib = b.module("lib");
    let file = b.file(lib, "lib.kt", "lib");
    b.function(file, "f").modality(Modality::Sealed).build();
    let libraries = serialize(&mut arena, &[lib]);

    let options = LinkerOptions {
        exported_dependencies: vec!["lib".to_string()],
        ..LinkerOptions::default()
    };
    let err = link(libraries, options).err().expect("sealed function");
    assert!(
        matches!(
            err,
            LinkError::Wire(WireError::InvalidValue { field: "modality", value: 1, .. })
        ),
        "{err}"
    );
}
