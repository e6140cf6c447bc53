use super::*;

#[test]
fn test_builtins_installed() {
    let arena = IrArena::new();
    let builtins = arena.builtins();
    assert_eq!(arena.module(builtins.module).name, "<builtins>");
    assert_eq!(arena.decl_name(builtins.any), "Any");
    assert_eq!(arena.fq_name(builtins.string).as_str(), "kotlin.String");
    let any_members: Vec<&str> = arena
        .members(builtins.any)
        .iter()
        .map(|&m| arena.decl_name(m))
        .collect();
    assert_eq!(any_members, vec!["equals", "hashCode", "toString"]);
    assert!(!builtins.operators().is_empty());
    assert_eq!(
        builtins.operators()[0].mangle,
        "operator#EQEQ@kotlin.Any?;kotlin.Any?"
    );
}

#[test]
fn test_function_class_parse() {
    assert_eq!(
        FunctionClassKind::parse("kotlin", "Function2"),
        Some((FunctionClassKind::Function, 2))
    );
    assert_eq!(
        FunctionClassKind::parse("kotlin.coroutines", "SuspendFunction0"),
        Some((FunctionClassKind::SuspendFunction, 0))
    );
    assert_eq!(
        FunctionClassKind::parse("kotlin.reflect", "KSuspendFunction11"),
        Some((FunctionClassKind::KSuspendFunction, 11))
    );
    assert_eq!(FunctionClassKind::parse("kotlin", "Function"), None);
    assert_eq!(FunctionClassKind::parse("kotlin", "SuspendFunction1"), None);
    assert_eq!(FunctionClassKind::parse("kotlin", "Function1x"), None);
}

#[test]
fn test_function_class_is_lazy_and_cached() {
    let mut arena = IrArena::new();
    let before = arena.decl_count();
    let f2 = arena.function_class(FunctionClassKind::Function, 2);
    assert!(arena.decl_count() > before);
    let after = arena.decl_count();
    assert_eq!(arena.function_class(FunctionClassKind::Function, 2), f2);
    assert_eq!(arena.decl_count(), after);

    assert_eq!(arena.decl_name(f2), "Function2");
    assert_eq!(arena.decl(f2).type_parameters().len(), 3);
    assert_eq!(
        arena.function_class_kind(f2),
        Some((FunctionClassKind::Function, 2))
    );
    let invoke = arena.members(f2)[0];
    assert_eq!(arena.decl_name(invoke), "invoke");
    let data = arena.decl(invoke).as_function().expect("invoke is a function");
    assert_eq!(data.value_parameters.len(), 2);
}

#[test]
fn test_suspend_function_class_lives_in_coroutines() {
    let mut arena = IrArena::new();
    let f = arena.function_class(FunctionClassKind::SuspendFunction, 1);
    assert_eq!(arena.package_of(f).as_str(), "kotlin.coroutines");
    let invoke = arena.members(f)[0];
    assert!(arena.decl(invoke).flags.contains(DeclFlags::SUSPEND));
}

#[test]
fn test_visibility_compare() {
    assert_eq!(Visibility::Public.compare(Visibility::Private), Some(2));
    assert_eq!(Visibility::Private.compare(Visibility::Internal), Some(-1));
    assert_eq!(Visibility::Internal.compare(Visibility::Protected), None);
    assert_eq!(Visibility::Protected.compare(Visibility::Protected), Some(0));
    assert!(Modality::Final < Modality::Sealed);
    assert!(Modality::Open < Modality::Abstract);
}
