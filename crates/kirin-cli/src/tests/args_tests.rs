use super::args::*;
use clap::Parser;
use kirin_linker::DeserializationStrategy;
use std::path::PathBuf;

#[test]
fn parses_resolve_with_default_imports() {
    let args = CliArgs::try_parse_from([
        "kirin",
        "resolve",
        "project.json",
        "--default-imports",
        "kotlin,kotlin.collections",
    ])
    .expect("valid arguments");
    assert_eq!(args.format, OutputFormat::Text);
    let Command::Resolve(resolve) = args.command else {
        panic!("expected resolve");
    };
    assert_eq!(resolve.project, PathBuf::from("project.json"));
    assert_eq!(
        resolve.default_imports,
        Some(vec!["kotlin".to_string(), "kotlin.collections".to_string()])
    );
    assert!(!resolve.fake_overrides);
}

#[test]
fn pack_requires_an_output_directory() {
    assert!(CliArgs::try_parse_from(["kirin", "pack", "project.json"]).is_err());
    let args = CliArgs::try_parse_from(["kirin", "pack", "project.json", "-o", "out"])
        .expect("valid arguments");
    let Command::Pack(pack) = args.command else {
        panic!("expected pack");
    };
    assert_eq!(pack.out_dir, PathBuf::from("out"));
    assert!(!pack.force);
}

#[test]
fn link_needs_at_least_one_library() {
    assert!(CliArgs::try_parse_from(["kirin", "link"]).is_err());
}

#[test]
fn global_flags_follow_the_subcommand() {
    let args = CliArgs::try_parse_from([
        "kirin",
        "link",
        "lib.kirl",
        "app.kirl",
        "--format",
        "json",
        "--no-color",
        "--strategy",
        "headers",
        "--export",
        "lib",
    ])
    .expect("valid arguments");
    assert_eq!(args.format, OutputFormat::Json);
    assert!(args.no_color);
    let Command::Link(link) = args.command else {
        panic!("expected link");
    };
    assert_eq!(link.libraries.len(), 2);
    assert_eq!(link.strategy, Some(Strategy::OnlyDeclarationHeaders));
    assert_eq!(link.exported_dependencies, Some(vec!["lib".to_string()]));
}

#[test]
fn strategy_maps_to_linker_strategy() {
    assert_eq!(
        DeserializationStrategy::from(Strategy::OnlyReferenced),
        DeserializationStrategy::OnlyReferenced
    );
    assert_eq!(
        DeserializationStrategy::from(Strategy::OnlyDeclarationHeaders),
        DeserializationStrategy::OnlyDeclarationHeaders
    );
    assert!(!DeserializationStrategy::from(Strategy::OnlyDeclarationHeaders).need_bodies());
}
