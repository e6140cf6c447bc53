use super::args::{CliArgs, Command, Strategy};
use super::config::*;
use clap::Parser;
use kirin_common::FqName;
use kirin_linker::{DeserializationStrategy, FORWARD_DECLARATIONS_MODULE};

fn link_args(extra: &[&str]) -> super::args::LinkArgs {
    let mut argv = vec!["kirin", "link", "a.kirl"];
    argv.extend_from_slice(extra);
    match CliArgs::try_parse_from(argv).expect("valid arguments").command {
        Command::Link(link) => link,
        other => panic!("expected link, got {other:?}"),
    }
}

#[test]
fn parses_camel_case_fields() {
    let config = parse_config(
        r#"{
            "defaultImports": ["kotlin", "kotlin.collections"],
            "maxAliasDepth": 4,
            "dependencyStrategy": "only_declaration_headers",
            "exportedDependencies": ["stdlib"],
            "forwardDeclarationModule": "fwd",
            "forwardDeclarationPackages": ["cnames.structs"]
        }"#,
    )
    .expect("valid config");
    assert_eq!(config.max_alias_depth, Some(4));
    assert_eq!(
        config.dependency_strategy,
        Some(DeserializationStrategy::OnlyDeclarationHeaders)
    );
    assert_eq!(config.forward_declaration_module.as_deref(), Some("fwd"));
}

#[test]
fn rejects_unknown_fields() {
    let err = parse_config(r#"{ "defaultImport": ["kotlin"] }"#).expect_err("typo");
    assert!(format!("{err:#}").contains("defaultImport"));
}

#[test]
fn empty_config_gives_library_defaults() {
    let config = parse_config("{}").expect("valid config");
    let resolver = resolver_options(&config, None);
    assert_eq!(resolver.default_imports, vec![FqName::new("kotlin")]);

    let linker = linker_options(&config, &link_args(&[]));
    assert_eq!(linker.dependency_strategy, DeserializationStrategy::ExplicitlyExported);
    assert!(linker.exported_dependencies.is_empty());
    assert_eq!(linker.forward_declaration_module, FORWARD_DECLARATIONS_MODULE);
}

#[test]
fn flags_override_the_config_file() {
    let config = parse_config(
        r#"{
            "defaultImports": ["kotlin"],
            "dependencyStrategy": "all",
            "exportedDependencies": ["a"],
            "forwardDeclarationPackages": ["cnames.structs"]
        }"#,
    )
    .expect("valid config");

    let imports = vec!["lib".to_string()];
    let resolver = resolver_options(&config, Some(&imports));
    assert_eq!(resolver.default_imports, vec![FqName::new("lib")]);

    let args = link_args(&["--strategy", "only-referenced", "--export", "b,c"]);
    assert_eq!(args.strategy, Some(Strategy::OnlyReferenced));
    let linker = linker_options(&config, &args);
    assert_eq!(linker.dependency_strategy, DeserializationStrategy::OnlyReferenced);
    assert_eq!(linker.exported_dependencies, vec!["b".to_string(), "c".to_string()]);
    assert_eq!(
        linker.forward_declaration_packages,
        vec![FqName::new("cnames.structs")]
    );
}

#[test]
fn finds_config_in_the_working_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(find_config(None, dir.path()).is_none());

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").expect("write config");
    assert_eq!(
        find_config(None, dir.path()),
        Some(dir.path().join(CONFIG_FILE_NAME))
    );

    let explicit = dir.path().join("other.json");
    assert_eq!(find_config(Some(&explicit), dir.path()), Some(explicit));
}

#[test]
fn load_config_reports_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "{ not json").expect("write config");
    let err = load_config(&path).expect_err("malformed");
    assert!(format!("{err:#}").contains(CONFIG_FILE_NAME));
}
