//! `kirin.json` loading and merging with command-line flags.

use anyhow::{Context, Result};
use kirin_common::FqName;
use kirin_linker::{DeserializationStrategy, LinkerOptions};
use kirin_resolve::ResolverOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::args::{LinkArgs, PackArgs, ResolveArgs};

pub const CONFIG_FILE_NAME: &str = "kirin.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KirinConfig {
    #[serde(default)]
    pub default_imports: Option<Vec<String>>,
    #[serde(default)]
    pub max_alias_depth: Option<usize>,
    #[serde(default)]
    pub dependency_strategy: Option<DeserializationStrategy>,
    #[serde(default)]
    pub exported_dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub forward_declaration_module: Option<String>,
    #[serde(default)]
    pub forward_declaration_packages: Option<Vec<String>>,
}

pub fn parse_config(source: &str) -> Result<KirinConfig> {
    let config = serde_json::from_str(source).context("failed to parse kirin.json")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<KirinConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse_config(&source).with_context(|| format!("in {}", path.display()))
}

/// The explicit `--config` path, or `kirin.json` in `cwd` when it exists.
pub fn find_config(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = cwd.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

// =============================================================================
// Merging
// =============================================================================

fn fq_names(names: &[String]) -> Vec<FqName> {
    names.iter().map(|name| FqName::new(name.trim())).collect()
}

pub fn resolver_options(config: &KirinConfig, default_imports: Option<&[String]>) -> ResolverOptions {
    let mut options = ResolverOptions::default();
    if let Some(imports) = default_imports.or(config.default_imports.as_deref()) {
        options.default_imports = fq_names(imports);
    }
    if let Some(depth) = config.max_alias_depth {
        options.max_alias_depth = depth;
    }
    options
}

pub fn resolve_options_for_resolve(config: &KirinConfig, args: &ResolveArgs) -> ResolverOptions {
    resolver_options(config, args.default_imports.as_deref())
}

pub fn resolve_options_for_pack(config: &KirinConfig, args: &PackArgs) -> ResolverOptions {
    resolver_options(config, args.default_imports.as_deref())
}

/// Command-line flags win over the config file, which wins over defaults.
pub fn linker_options(config: &KirinConfig, args: &LinkArgs) -> LinkerOptions {
    let mut options = LinkerOptions::default();
    if let Some(strategy) = args.strategy.map(Into::into).or(config.dependency_strategy) {
        options.dependency_strategy = strategy;
    }
    if let Some(exported) = args
        .exported_dependencies
        .as_ref()
        .or(config.exported_dependencies.as_ref())
    {
        options.exported_dependencies = exported.clone();
    }
    if let Some(module) = &config.forward_declaration_module {
        options.forward_declaration_module = module.clone();
    }
    if let Some(packages) = args
        .forward_declaration_packages
        .as_deref()
        .or(config.forward_declaration_packages.as_deref())
    {
        options.forward_declaration_packages = fq_names(packages);
    }
    options
}
