//! End-to-end runs of the `kirin` commands against temporary directories.

use clap::Parser;
use kirin_cli::args::CliArgs;
use kirin_cli::driver::{self, EXIT_DIAGNOSTICS, EXIT_SUCCESS};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

const SHAPES: &str = r#"{
  "modules": [
    {
      "name": "lib",
      "files": [{
        "name": "shapes.kt",
        "package": "shapes",
        "declarations": [
          { "kind": "interface", "name": "Shape",
            "members": [{ "kind": "function", "name": "area", "returns": "Int", "modality": "abstract" }] },
          { "kind": "class", "name": "Box", "typeParameters": ["T"], "modality": "open",
            "members": [
              { "kind": "function", "name": "get", "parameters": [{ "name": "i", "type": "Int" }], "returns": "T" },
              { "kind": "property", "name": "size", "type": "Int", "backingField": true }
            ] },
          { "kind": "class", "name": "Square", "supertypes": ["Box<Int>", "Shape"], "exported": true },
          { "kind": "function", "name": "unused" }
        ]
      }]
    },
    {
      "name": "app",
      "dependencies": ["lib"],
      "files": [{
        "name": "main.kt",
        "package": "app",
        "imports": ["shapes.*"],
        "declarations": [
          { "kind": "class", "name": "Tile", "supertypes": ["Square"] },
          { "kind": "function", "name": "main", "exported": true, "calls": ["shapes.Box.get"] }
        ]
      }]
    }
  ]
}"#;

const CYCLE: &str = r#"{
  "modules": [{
    "name": "app",
    "files": [{
      "name": "cycle.kt",
      "package": "app",
      "declarations": [
        { "kind": "class", "name": "A", "supertypes": ["B"] },
        { "kind": "class", "name": "B", "supertypes": ["A"] }
      ]
    }]
  }]
}"#;

const EXPECT_ACTUAL: &str = r#"{
  "modules": [
    { "name": "common", "files": [{ "name": "common.kt", "package": "lib",
      "declarations": [
        { "kind": "function", "name": "f", "expect": true },
        { "kind": "function", "name": "g", "exported": true, "calls": ["lib.f"] }
      ] }] },
    { "name": "platform", "dependencies": ["common"], "files": [{ "name": "platform.kt", "package": "lib",
      "declarations": [{ "kind": "function", "name": "f", "actual": true }] }] }
  ]
}"#;

// =============================================================================
// Helpers
// =============================================================================

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write test file");
}

/// Run `kirin <argv>` in `cwd`; returns the exit code and stdout.
fn kirin(cwd: &Path, argv: &[&str]) -> anyhow::Result<(i32, String)> {
    let args = CliArgs::try_parse_from(std::iter::once("kirin").chain(argv.iter().copied()))?;
    let mut out = Vec::new();
    let code = driver::run(&args, cwd, &mut out)?;
    Ok((code, String::from_utf8(out)?))
}

fn kirin_json(cwd: &Path, argv: &[&str]) -> (i32, Value) {
    let mut argv = argv.to_vec();
    argv.extend(["--format", "json"]);
    let (code, out) = kirin(cwd, &argv).expect("command runs");
    (code, serde_json::from_str(&out).expect("json report"))
}

fn packed(project: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "project.json", project);
    let (code, _) = kirin(dir.path(), &["pack", "project.json", "-o", "out"]).expect("pack");
    assert_eq!(code, EXIT_SUCCESS);
    dir
}

// =============================================================================
// resolve
// =============================================================================

#[test]
fn test_resolve_prints_resolved_supertypes() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "project.json", SHAPES);

    let (code, report) = kirin_json(dir.path(), &["resolve", "project.json"]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(report["diagnostics"].as_array().map(Vec::len), Some(0));

    let lib = &report["modules"][0];
    assert_eq!(lib["module"], "lib");
    let square = lib["classes"]
        .as_array()
        .and_then(|classes| classes.iter().find(|c| c["declaration"] == "shapes/Square"))
        .expect("Square is reported");
    assert_eq!(
        square["supertypes"],
        serde_json::json!(["shapes.Box<kotlin.Int>", "shapes.Shape"])
    );

    let tile = &report["modules"][1]["classes"][0];
    assert_eq!(tile["declaration"], "app/Tile");
    assert_eq!(tile["supertypes"], serde_json::json!(["shapes.Square"]));
    assert!(report.get("fake_overrides").is_none());
}

#[test]
fn test_resolve_reports_cycles_with_exit_code() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "project.json", CYCLE);

    let (code, text) = kirin(dir.path(), &["resolve", "project.json", "--no-color"]).expect("resolve");
    assert_eq!(code, EXIT_DIAGNOSTICS);
    assert!(text.contains("K1001: Loop in supertype definition for app."), "{text}");
    assert!(text.ends_with("Found 1 error(s).\n"), "{text}");
}

#[test]
fn test_resolve_can_build_fake_overrides() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "project.json", SHAPES);

    let (_, report) = kirin_json(dir.path(), &["resolve", "project.json", "--fake-overrides"]);
    let created = report["fake_overrides"].as_u64().expect("count reported");
    assert!(created > 0, "Square and Tile inherit members");
}

#[test]
fn test_raw_generic_supertype_is_a_diagnostic() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "project.json",
        r#"{ "modules": [{ "name": "app", "files": [{ "name": "raw.kt", "package": "app",
          "declarations": [
            { "kind": "class", "name": "Box", "typeParameters": ["T"], "modality": "open",
              "members": [{ "kind": "function", "name": "get", "returns": "T", "modality": "open" }] },
            { "kind": "class", "name": "RawBox", "supertypes": ["Box"] }
          ] }] }] }"#,
    );

    let (code, report) = kirin_json(dir.path(), &["resolve", "project.json", "--fake-overrides"]);
    assert_eq!(code, EXIT_DIAGNOSTICS);
    let diagnostic = &report["diagnostics"][0];
    assert_eq!(diagnostic["declaration"], "app/RawBox");
    assert_eq!(diagnostic["code"], 1005);
    assert_eq!(
        diagnostic["message_text"],
        "1 type argument(s) expected for app.Box, got 0"
    );
    assert!(report["fake_overrides"].is_u64());
}

#[test]
fn test_sealed_member_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "project.json",
        r#"{ "modules": [{ "name": "app", "files": [{ "name": "base.kt", "package": "app",
          "declarations": [
            { "kind": "class", "name": "Base", "modality": "open",
              "members": [{ "kind": "function", "name": "f", "modality": "sealed" }] },
            { "kind": "class", "name": "Sub", "supertypes": ["Base"] }
          ] }] }] }"#,
    );

    let err = kirin(dir.path(), &["resolve", "project.json", "--fake-overrides"])
        .expect_err("sealed member");
    assert!(format!("{err:#}").contains("member `f` cannot be sealed"), "{err:#}");
}

#[test]
fn test_missing_project_names_the_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = kirin(dir.path(), &["resolve", "absent.json"]).expect_err("no such file");
    assert!(format!("{err:#}").contains("absent.json"));
}

// =============================================================================
// pack
// =============================================================================

#[test]
fn test_pack_writes_one_library_per_module() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "project.json", SHAPES);

    let (code, report) = kirin_json(dir.path(), &["pack", "project.json", "-o", "out"]);
    assert_eq!(code, EXIT_SUCCESS);
    let libraries = report["libraries"].as_array().expect("libraries");
    assert_eq!(libraries.len(), 2);
    assert_eq!(libraries[0]["module"], "lib");
    assert_eq!(libraries[0]["top_levels"], 4);
    assert!(dir.path().join("out/lib.kirl").is_file());
    assert!(dir.path().join("out/app.kirl").is_file());
}

#[test]
fn test_pack_refuses_unresolved_projects_without_force() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "project.json", CYCLE);

    let err = kirin(dir.path(), &["pack", "project.json", "-o", "out"]).expect_err("cycle");
    assert!(format!("{err:#}").contains("--force"));
    assert!(!dir.path().join("out").exists());

    let (code, _) = kirin(dir.path(), &["pack", "project.json", "-o", "out", "--force"]).expect("forced");
    assert_eq!(code, EXIT_SUCCESS);
    assert!(dir.path().join("out/app.kirl").is_file());
}

// =============================================================================
// link
// =============================================================================

#[test]
fn test_link_reads_only_what_exports_reach() {
    let dir = packed(SHAPES);

    // Dependents may be listed before their dependencies.
    let (code, report) = kirin_json(dir.path(), &["link", "out/app.kirl", "out/lib.kirl"]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(report["modules"], serde_json::json!(["lib", "app"]));
    let stats = &report["stats"];
    assert_eq!(stats["modules"], 2);
    assert_eq!(stats["delegated_expects"], 0);
    // Square and main are exported and reach Shape and Box. Neither Tile
    // nor `unused` is read.
    assert_eq!(stats["top_levels"], 4);
    assert!(report["fake_overrides"].as_u64().expect("count") > 0);
    assert_eq!(report["unbound_symbols"], serde_json::json!([]));
}

#[test]
fn test_link_all_strategy_reads_everything() {
    let dir = packed(SHAPES);

    let (_, report) = kirin_json(
        dir.path(),
        &["link", "out/lib.kirl", "out/app.kirl", "--strategy", "all"],
    );
    assert_eq!(report["stats"]["top_levels"], 6);
}

#[test]
fn test_link_redirects_expect_calls_to_actuals() {
    let dir = packed(EXPECT_ACTUAL);

    let (code, text) = kirin(
        dir.path(),
        &["link", "out/common.kirl", "out/platform.kirl", "--export", "platform", "--no-color"],
    )
    .expect("link");
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.starts_with("linked 2 module(s): common, platform"), "{text}");
    assert!(text.contains("delegated expects:    1"), "{text}");
}

#[test]
fn test_config_file_sets_the_strategy() {
    let dir = packed(SHAPES);
    write(
        dir.path(),
        "kirin.json",
        r#"{ "dependencyStrategy": "only_declaration_headers" }"#,
    );

    let (_, report) = kirin_json(dir.path(), &["link", "out/lib.kirl", "out/app.kirl"]);
    assert_eq!(report["stats"]["bodies"], 0);

    // The flag wins over the file.
    let (_, report) = kirin_json(
        dir.path(),
        &["link", "out/lib.kirl", "out/app.kirl", "--strategy", "explicitly-exported"],
    );
    assert!(report["stats"]["bodies"].as_u64().expect("count") > 0);
}

#[test]
fn test_link_without_dependency_fails() {
    let dir = packed(SHAPES);
    let err = kirin(dir.path(), &["link", "out/app.kirl"]).expect_err("lib is missing");
    assert!(format!("{err:#}").contains("failed to load library app"), "{err:#}");
}

#[test]
fn test_link_rejects_malformed_library() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "broken.kirl", "not a library");
    let err = kirin(dir.path(), &["link", "broken.kirl"]).expect_err("bad magic");
    assert!(format!("{err:#}").contains("malformed library"));
}
