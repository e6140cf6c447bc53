use super::project::*;

#[test]
fn parses_plain_and_qualified_types() {
    let ty = parse_type("Int").expect("type");
    assert_eq!(ty.path, vec!["Int".to_string()]);
    assert!(ty.arguments.is_empty());
    assert!(!ty.nullable);

    let ty = parse_type("kotlin.collections.List").expect("type");
    assert_eq!(ty.dotted(), "kotlin.collections.List");
}

#[test]
fn parses_nested_arguments_and_nullability() {
    let ty = parse_type(" Map< String , List<T?> >? ").expect("type");
    assert!(ty.nullable);
    assert_eq!(ty.dotted(), "Map");
    assert_eq!(ty.arguments.len(), 2);
    let list = &ty.arguments[1];
    assert_eq!(list.dotted(), "List");
    assert!(!list.nullable);
    assert!(list.arguments[0].nullable);
    assert_eq!(list.arguments[0].dotted(), "T");
}

#[test]
fn rejects_malformed_types() {
    for text in ["", "List<", "List<Int", "a..b", "Int Int", "List<>"] {
        assert!(parse_type(text).is_err(), "`{text}` should not parse");
    }
}

#[test]
fn parses_tagged_declarations() {
    let project = parse_project(
        r#"{
          "modules": [{
            "name": "lib",
            "files": [{
              "name": "a.kt",
              "package": "lib",
              "imports": ["other.*"],
              "declarations": [
                { "kind": "interface", "name": "I", "typeParameters": ["T"],
                  "members": [{ "kind": "function", "name": "f", "returns": "T", "modality": "abstract" }] },
                { "kind": "class", "name": "C", "supertypes": ["I<Int>"], "modality": "open", "exported": true },
                { "kind": "property", "name": "p", "type": "Int", "var": true, "backingField": true },
                { "kind": "typeAlias", "name": "A", "expandsTo": "C" }
              ]
            }]
          }]
        }"#,
    )
    .expect("valid project");

    let file = &project.modules[0].files[0];
    assert_eq!(file.declarations.len(), 4);
    let DeclSpec::Interface(interface) = &file.declarations[0] else {
        panic!("expected interface");
    };
    assert_eq!(interface.type_parameters, vec!["T".to_string()]);
    let DeclSpec::Function(f) = &interface.members[0] else {
        panic!("expected function");
    };
    assert_eq!(f.common.modality, Some(ModalitySpec::Abstract));
    assert_eq!(f.returns.as_deref(), Some("T"));

    let DeclSpec::Class(class) = &file.declarations[1] else {
        panic!("expected class");
    };
    assert!(class.common.exported);
    assert_eq!(class.supertypes, vec!["I<Int>".to_string()]);

    let DeclSpec::Property(p) = &file.declarations[2] else {
        panic!("expected property");
    };
    assert!(p.var && p.backing_field);
    assert_eq!(file.declarations[3].name(), "A");
}

#[test]
fn unknown_declaration_kind_is_an_error() {
    let err = parse_project(
        r#"{ "modules": [{ "name": "m", "files": [{ "name": "a.kt",
             "declarations": [{ "kind": "struct", "name": "S" }] }] }] }"#,
    )
    .expect_err("unknown kind");
    assert!(format!("{err:#}").contains("struct"));
}
