//! Subcommand implementations.
//!
//! Each command produces a serializable report; [`run`] renders it as text
//! or JSON and picks the exit code.

use anyhow::{Context, Result, bail};
use kirin_common::{Diagnostic, DiagnosticBag};
use kirin_ir::{DeclData, DeclId, IrArena, ModuleId};
use kirin_linker::{
    IrLibrary, IrLinker, IrSerializer, LIBRARY_EXTENSION, LinkSession, LinkStats, LinkerOptions,
};
use kirin_mangle::GlobalDeclarationTable;
use kirin_overrides::{FakeOverrideBuilder, FakeOverrideOptions};
use kirin_resolve::{ResolverOptions, SupertypeResolver, apply_supertypes};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span};

use crate::args::{CliArgs, Command, LinkArgs, OutputFormat, PackArgs, ResolveArgs};
use crate::config::{
    KirinConfig, find_config, linker_options, load_config, resolve_options_for_pack,
    resolve_options_for_resolve,
};
use crate::elaborate::elaborate;
use crate::project::{ProjectSpec, load_project};
use crate::reporter::Reporter;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DIAGNOSTICS: i32 = 1;

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ClassSupertypes {
    pub declaration: String,
    pub supertypes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSupertypes {
    pub module: String,
    pub classes: Vec<ClassSupertypes>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub modules: Vec<ModuleSupertypes>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake_overrides: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackedLibrary {
    pub module: String,
    pub path: PathBuf,
    pub files: usize,
    pub top_levels: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackReport {
    pub libraries: Vec<PackedLibrary>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub modules: Vec<String>,
    pub stats: LinkStats,
    pub fake_overrides: usize,
    pub unbound_symbols: Vec<String>,
}

// =============================================================================
// Entry point
// =============================================================================

/// Run the parsed command, writing the report to `out`. Returns the exit code.
pub fn run(args: &CliArgs, cwd: &Path, out: &mut dyn Write) -> Result<i32> {
    let config = match find_config(args.config.as_deref(), cwd) {
        Some(path) => {
            debug!(config = %path.display(), "loading config");
            load_config(&path)?
        }
        None => KirinConfig::default(),
    };
    let reporter = Reporter::new(!args.no_color);
    let json = args.format == OutputFormat::Json;

    let (rendered, code) = match &args.command {
        Command::Resolve(resolve) => {
            let report = resolve_command(&config, resolve, cwd)?;
            let code = exit_code(&report.diagnostics);
            let rendered = if json {
                to_json(&report)?
            } else {
                reporter.render_resolve(&report)
            };
            (rendered, code)
        }
        Command::Pack(pack) => {
            let report = pack_command(&config, pack, cwd)?;
            let rendered = if json {
                to_json(&report)?
            } else {
                reporter.render_pack(&report)
            };
            (rendered, EXIT_SUCCESS)
        }
        Command::Link(link) => {
            let report = link_command(&config, link, cwd)?;
            let rendered = if json {
                to_json(&report)?
            } else {
                reporter.render_link(&report)
            };
            (rendered, EXIT_SUCCESS)
        }
    };
    writeln!(out, "{rendered}").context("failed to write report")?;
    Ok(code)
}

fn exit_code(diagnostics: &[Diagnostic]) -> i32 {
    if diagnostics.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_DIAGNOSTICS
    }
}

fn to_json<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}

// =============================================================================
// resolve
// =============================================================================

pub fn resolve_command(config: &KirinConfig, args: &ResolveArgs, cwd: &Path) -> Result<ResolveReport> {
    let project = load_project(&cwd.join(&args.project))?;
    let options = resolve_options_for_resolve(config, args);
    let (mut arena, modules, diagnostics) = resolve_project(&project, &options)?;

    let fake_overrides = if args.fake_overrides {
        Some(build_fake_overrides(&mut arena, &modules))
    } else {
        None
    };
    Ok(ResolveReport {
        modules: modules
            .iter()
            .map(|&module| module_supertypes(&arena, module))
            .collect(),
        diagnostics: diagnostics.into_vec(),
        fake_overrides,
    })
}

/// Elaborate `project` and resolve the supertypes of all its modules in one
/// session.
pub fn resolve_project(
    project: &ProjectSpec,
    options: &ResolverOptions,
) -> Result<(IrArena, Vec<ModuleId>, DiagnosticBag)> {
    let mut arena = IrArena::new();
    let modules = elaborate(&mut arena, project)?;
    let _span = span!(Level::INFO, "resolve_project", modules = modules.len()).entered();
    let session = {
        let mut resolver = SupertypeResolver::new(&arena, options.clone());
        for &module in &modules {
            resolver.resolve_module(module);
        }
        resolver.into_session()
    };
    let diagnostics = apply_supertypes(&mut arena, &session);
    info!(diagnostics = diagnostics.len(), "supertypes resolved");
    Ok((arena, modules, diagnostics))
}

fn build_fake_overrides(arena: &mut IrArena, modules: &[ModuleId]) -> usize {
    let mut table = GlobalDeclarationTable::new(arena);
    let mut builder = FakeOverrideBuilder::new(&mut table, FakeOverrideOptions::default());
    for &module in modules {
        builder.provide_fake_overrides(arena, module);
    }
    builder.created()
}

fn module_supertypes(arena: &IrArena, module: ModuleId) -> ModuleSupertypes {
    let mut classes = Vec::new();
    for &file in &arena.module(module).files {
        for &top in &arena.file(file).declarations {
            collect_supertypes(arena, top, &mut classes);
        }
    }
    ModuleSupertypes {
        module: arena.module(module).name.clone(),
        classes,
    }
}

fn collect_supertypes(arena: &IrArena, decl: DeclId, out: &mut Vec<ClassSupertypes>) {
    let refs = match &arena.decl(decl).data {
        DeclData::Class(class) => class.super_types.clone(),
        DeclData::TypeAlias(alias) => vec![alias.expanded.clone()],
        _ => return,
    };
    out.push(ClassSupertypes {
        declaration: arena.render(decl),
        supertypes: refs.iter().map(|r| arena.render_type_ref(r)).collect(),
    });
    for &member in arena.members(decl) {
        collect_supertypes(arena, member, out);
    }
}

// =============================================================================
// pack
// =============================================================================

pub fn pack_command(config: &KirinConfig, args: &PackArgs, cwd: &Path) -> Result<PackReport> {
    let project = load_project(&cwd.join(&args.project))?;
    let options = resolve_options_for_pack(config, args);
    let (mut arena, modules, diagnostics) = resolve_project(&project, &options)?;
    if diagnostics.has_errors() && !args.force {
        let first = diagnostics
            .iter()
            .next()
            .map(ToString::to_string)
            .unwrap_or_default();
        bail!(
            "supertype resolution reported {} error(s), first: {first} (use --force to pack anyway)",
            diagnostics.len()
        );
    }

    let out_dir = cwd.join(&args.out_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut global = GlobalDeclarationTable::new(&mut arena);
    let mut serializer = IrSerializer::new(&arena, &mut global);
    let mut libraries = Vec::new();
    for module in modules {
        let library = serializer
            .serialize_module(module)
            .with_context(|| format!("failed to serialize module {}", arena.module(module).name))?;
        let path = out_dir.join(format!("{}.{LIBRARY_EXTENSION}", library.name));
        std::fs::write(&path, library.to_bytes())
            .with_context(|| format!("failed to write library: {}", path.display()))?;
        debug!(library = %path.display(), "library written");
        libraries.push(PackedLibrary {
            module: library.name.clone(),
            path,
            files: library.files.len(),
            top_levels: library.top_level_count(),
        });
    }
    Ok(PackReport {
        libraries,
        diagnostics: diagnostics.into_vec(),
    })
}

// =============================================================================
// link
// =============================================================================

pub fn link_command(config: &KirinConfig, args: &LinkArgs, cwd: &Path) -> Result<LinkReport> {
    let libraries = args
        .libraries
        .iter()
        .map(|path| read_library(&cwd.join(path)))
        .collect::<Result<Vec<_>>>()?;
    link_libraries(libraries, linker_options(config, args), !args.no_fake_overrides)
}

pub fn read_library(path: &Path) -> Result<IrLibrary> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read library: {}", path.display()))?;
    IrLibrary::from_bytes(&bytes).with_context(|| format!("malformed library: {}", path.display()))
}

/// Order libraries so every dependency present in the set is loaded before
/// its dependents. Dependencies outside the set are left for the linker to
/// report.
pub fn order_libraries(mut pending: Vec<IrLibrary>) -> Result<Vec<IrLibrary>> {
    let names: FxHashSet<String> = pending.iter().map(|l| l.name.clone()).collect();
    let mut loaded: FxHashSet<String> = FxHashSet::default();
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending.iter().position(|library| {
            library
                .dependencies
                .iter()
                .all(|dependency| loaded.contains(dependency) || !names.contains(dependency))
        });
        let Some(index) = ready else {
            let cycle: Vec<&str> = pending.iter().map(|l| l.name.as_str()).collect();
            bail!("library dependencies form a cycle: {}", cycle.join(", "));
        };
        let library = pending.remove(index);
        loaded.insert(library.name.clone());
        ordered.push(library);
    }
    Ok(ordered)
}

/// Load, link and (optionally) build fake overrides for every linked module.
pub fn link_libraries(
    libraries: Vec<IrLibrary>,
    options: LinkerOptions,
    fake_overrides: bool,
) -> Result<LinkReport> {
    let mut session = LinkSession::new();
    let mut linker = IrLinker::new(&session, options);
    for library in order_libraries(libraries)? {
        let name = library.name.clone();
        linker
            .load_library(&mut session, library)
            .with_context(|| format!("failed to load library {name}"))?;
    }
    let stats = linker.link(&mut session).context("link failed")?;

    let modules: Vec<(String, ModuleId)> = linker
        .loaded_modules()
        .map(|(name, module)| (name.to_string(), module))
        .collect();
    let created = if fake_overrides {
        let LinkSession { arena, table } = &mut session;
        let mut builder = FakeOverrideBuilder::new(table, FakeOverrideOptions::default());
        for &(_, module) in &modules {
            builder.provide_fake_overrides(arena, module);
        }
        builder.created()
    } else {
        0
    };

    let unbound_symbols = linker
        .unbound_public_symbols(&session)
        .iter()
        .map(|signature| signature.render())
        .collect();
    Ok(LinkReport {
        modules: modules.into_iter().map(|(name, _)| name).collect(),
        stats,
        fake_overrides: created,
        unbound_symbols,
    })
}
