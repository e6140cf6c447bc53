//! Package index of top-level declarations.
//!
//! Package and import scopes need "all top levels named `n` in package `p`"
//! across every module of the arena. The index is built once per resolution
//! pass and shared by those scopes.

use kirin_common::{Atom, FqName};
use kirin_ir::{DeclId, DeclKind, IrArena};
use rustc_hash::FxHashMap;

type NameTable = FxHashMap<Atom, Vec<DeclId>>;

#[derive(Debug, Default)]
pub struct DeclarationIndex {
    classifiers: FxHashMap<FqName, NameTable>,
    callables: FxHashMap<FqName, NameTable>,
}

impl DeclarationIndex {
    pub fn build(arena: &IrArena) -> Self {
        let mut index = DeclarationIndex::default();
        for module in arena.module_ids() {
            for &file in &arena.module(module).files {
                let file = arena.file(file);
                // Register the package even when it is empty so star imports
                // of it are recognized as package imports.
                index.classifiers.entry(file.package.clone()).or_default();
                for &decl in &file.declarations {
                    let declaration = arena.decl(decl);
                    let table = match declaration.kind() {
                        DeclKind::Class | DeclKind::TypeAlias => &mut index.classifiers,
                        DeclKind::Function | DeclKind::Property => &mut index.callables,
                        _ => continue,
                    };
                    table
                        .entry(file.package.clone())
                        .or_default()
                        .entry(declaration.name)
                        .or_default()
                        .push(decl);
                }
            }
        }
        index
    }

    pub fn has_package(&self, package: &FqName) -> bool {
        self.classifiers.contains_key(package)
    }

    pub fn classifiers(&self, package: &FqName, name: Atom) -> &[DeclId] {
        self.classifiers
            .get(package)
            .and_then(|names| names.get(&name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn callables(&self, package: &FqName, name: Atom) -> &[DeclId] {
        self.callables
            .get(package)
            .and_then(|names| names.get(&name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve a fully qualified classifier path such as `lib.Outer.Inner`:
    /// the longest known package prefix, then nested classifiers.
    pub fn resolve_classifier_path(&self, arena: &IrArena, path: &FqName) -> Option<DeclId> {
        let segments = path.path_segments();
        let names: Vec<Atom> = segments
            .iter()
            .map(|segment| arena.names.lookup(segment))
            .collect::<Option<_>>()?;
        self.resolve_segments(arena, &segments, &names)
    }

    /// Resolve `names` (the interned form of `segments`) as package prefix
    /// plus classifier path.
    pub fn resolve_segments(&self, arena: &IrArena, segments: &[&str], names: &[Atom]) -> Option<DeclId> {
        for split in (0..segments.len()).rev() {
            let package = FqName::from_segments(&segments[..split]);
            if !self.has_package(&package) {
                continue;
            }
            let Some(&top) = self.classifiers(&package, names[split]).first() else {
                continue;
            };
            let mut current = top;
            let mut resolved = true;
            for &name in &names[split + 1..] {
                match nested_classifier(arena, current, name) {
                    Some(nested) => current = nested,
                    None => {
                        resolved = false;
                        break;
                    }
                }
            }
            if resolved {
                return Some(current);
            }
        }
        None
    }
}

/// A class or type alias named `name` among the members of `class`.
pub fn nested_classifier(arena: &IrArena, class: DeclId, name: Atom) -> Option<DeclId> {
    arena.members(class).iter().copied().find(|&member| {
        let decl = arena.decl(member);
        decl.name == name && matches!(decl.kind(), DeclKind::Class | DeclKind::TypeAlias)
    })
}
