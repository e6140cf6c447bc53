//! Scope Model
//!
//! Scopes answer "what does this name mean here". Each provider (`Scope`)
//! contributes one layer: the nested classes of some class, the type
//! parameters of a declaration, a package, an import list. `CompositeScope`
//! stacks providers into a persistent list; composing never mutates an
//! existing scope, it only produces a new head that shares the old tail.
//!
//! Lookup walks from the innermost layer outward. Classifier lookup stops at
//! the first layer with a match; function and property lookup collect from
//! every layer and suppress a declaration seen twice.

use crate::index::DeclarationIndex;
use kirin_common::{Atom, FqName};
use kirin_ir::{DeclId, DeclKind, IrArena};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

pub type ScopeRef = Rc<dyn Scope>;

/// One layer of name lookup.
pub trait Scope: fmt::Debug {
    fn process_classifiers_by_name(
        &self,
        arena: &IrArena,
        name: Atom,
        processor: &mut dyn FnMut(DeclId),
    );

    fn process_functions_by_name(
        &self,
        _arena: &IrArena,
        _name: Atom,
        _processor: &mut dyn FnMut(DeclId),
    ) {
    }

    fn process_properties_by_name(
        &self,
        _arena: &IrArena,
        _name: Atom,
        _processor: &mut dyn FnMut(DeclId),
    ) {
    }
}

fn is_classifier(arena: &IrArena, decl: DeclId) -> bool {
    matches!(
        arena.decl(decl).kind(),
        DeclKind::Class | DeclKind::TypeAlias
    )
}

// =============================================================================
// Providers
// =============================================================================

/// Classes and type aliases declared inside a class.
#[derive(Debug)]
pub struct NestedClassifierScope {
    pub class: DeclId,
}

impl NestedClassifierScope {
    pub fn new(class: DeclId) -> ScopeRef {
        Rc::new(Self { class })
    }
}

impl Scope for NestedClassifierScope {
    fn process_classifiers_by_name(
        &self,
        arena: &IrArena,
        name: Atom,
        processor: &mut dyn FnMut(DeclId),
    ) {
        for &member in arena.members(self.class) {
            if arena.decl(member).name == name && is_classifier(arena, member) {
                processor(member);
            }
        }
    }
}

/// The type parameters of one declaration.
#[derive(Debug)]
pub struct TypeParameterScope {
    parameters: SmallVec<[DeclId; 4]>,
}

impl TypeParameterScope {
    /// `None` when there is nothing to add.
    pub fn for_declaration(arena: &IrArena, decl: DeclId) -> Option<ScopeRef> {
        let parameters = arena.decl(decl).type_parameters();
        if parameters.is_empty() {
            return None;
        }
        Some(Rc::new(Self {
            parameters: parameters.iter().copied().collect(),
        }))
    }
}

impl Scope for TypeParameterScope {
    fn process_classifiers_by_name(
        &self,
        arena: &IrArena,
        name: Atom,
        processor: &mut dyn FnMut(DeclId),
    ) {
        for &parameter in &self.parameters {
            if arena.decl(parameter).name == name {
                processor(parameter);
            }
        }
    }
}

/// Functions and properties declared inside a class.
#[derive(Debug)]
pub struct MemberScope {
    pub class: DeclId,
}

impl MemberScope {
    pub fn new(class: DeclId) -> ScopeRef {
        Rc::new(Self { class })
    }

    fn process_members(
        &self,
        arena: &IrArena,
        name: Atom,
        kind: DeclKind,
        processor: &mut dyn FnMut(DeclId),
    ) {
        for &member in arena.members(self.class) {
            let decl = arena.decl(member);
            if decl.name == name && decl.kind() == kind {
                processor(member);
            }
        }
    }
}

impl Scope for MemberScope {
    fn process_classifiers_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        NestedClassifierScope { class: self.class }.process_classifiers_by_name(arena, name, processor);
    }

    fn process_functions_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        self.process_members(arena, name, DeclKind::Function, processor);
    }

    fn process_properties_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        self.process_members(arena, name, DeclKind::Property, processor);
    }
}

/// Top-level declarations of one package, across every module.
#[derive(Debug)]
pub struct PackageMemberScope {
    pub package: FqName,
    index: Rc<DeclarationIndex>,
}

impl PackageMemberScope {
    pub fn new(package: FqName, index: Rc<DeclarationIndex>) -> ScopeRef {
        Rc::new(Self { package, index })
    }
}

impl Scope for PackageMemberScope {
    fn process_classifiers_by_name(&self, _arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        for &decl in self.index.classifiers(&self.package, name) {
            processor(decl);
        }
    }

    fn process_functions_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        for &decl in self.index.callables(&self.package, name) {
            if arena.decl(decl).kind() == DeclKind::Function {
                processor(decl);
            }
        }
    }

    fn process_properties_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        for &decl in self.index.callables(&self.package, name) {
            if arena.decl(decl).kind() == DeclKind::Property {
                processor(decl);
            }
        }
    }
}

/// `import a.b.C` and `import a.b.C as D`.
#[derive(Debug)]
pub struct ExplicitImportScope {
    /// (name introduced into scope, imported path)
    imports: Vec<(Atom, FqName)>,
    index: Rc<DeclarationIndex>,
}

impl ExplicitImportScope {
    pub fn new(imports: Vec<(Atom, FqName)>, index: Rc<DeclarationIndex>) -> ScopeRef {
        Rc::new(Self { imports, index })
    }

    fn process_callables(
        &self,
        arena: &IrArena,
        name: Atom,
        kind: DeclKind,
        processor: &mut dyn FnMut(DeclId),
    ) {
        for (alias, path) in &self.imports {
            if *alias != name {
                continue;
            }
            let Some(target) = arena.names.lookup(path.short_name()) else {
                continue;
            };
            for &decl in self.index.callables(&path.parent(), target) {
                if arena.decl(decl).kind() == kind {
                    processor(decl);
                }
            }
        }
    }
}

impl Scope for ExplicitImportScope {
    fn process_classifiers_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        for (alias, path) in &self.imports {
            if *alias == name {
                if let Some(decl) = self.index.resolve_classifier_path(arena, path) {
                    processor(decl);
                }
            }
        }
    }

    fn process_functions_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        self.process_callables(arena, name, DeclKind::Function, processor);
    }

    fn process_properties_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        self.process_callables(arena, name, DeclKind::Property, processor);
    }
}

/// `import a.b.*`, including the default imports every file receives.
/// A star import of a class path brings that class's nested classifiers.
#[derive(Debug)]
pub struct StarImportScope {
    packages: Vec<FqName>,
    index: Rc<DeclarationIndex>,
}

impl StarImportScope {
    pub fn new(packages: Vec<FqName>, index: Rc<DeclarationIndex>) -> ScopeRef {
        Rc::new(Self { packages, index })
    }
}

impl Scope for StarImportScope {
    fn process_classifiers_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        for package in &self.packages {
            if self.index.has_package(package) {
                for &decl in self.index.classifiers(package, name) {
                    processor(decl);
                }
            } else if let Some(class) = self.index.resolve_classifier_path(arena, package) {
                NestedClassifierScope { class }.process_classifiers_by_name(arena, name, processor);
            }
        }
    }

    fn process_functions_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        for package in &self.packages {
            for &decl in self.index.callables(package, name) {
                if arena.decl(decl).kind() == DeclKind::Function {
                    processor(decl);
                }
            }
        }
    }

    fn process_properties_by_name(&self, arena: &IrArena, name: Atom, processor: &mut dyn FnMut(DeclId)) {
        for package in &self.packages {
            for &decl in self.index.callables(package, name) {
                if arena.decl(decl).kind() == DeclKind::Property {
                    processor(decl);
                }
            }
        }
    }
}

// =============================================================================
// CompositeScope
// =============================================================================

struct ScopeNode {
    scope: ScopeRef,
    next: Option<Rc<ScopeNode>>,
}

/// An immutable stack of scope layers. The head is the innermost layer.
#[derive(Clone, Default)]
pub struct CompositeScope {
    head: Option<Rc<ScopeNode>>,
    len: usize,
}

impl CompositeScope {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stack `scopes` in order: the last one becomes the innermost layer.
    pub fn new(scopes: impl IntoIterator<Item = ScopeRef>) -> Self {
        Self::empty().child_scopes(scopes)
    }

    /// A new composite with `addition` as its innermost layer. `None` yields
    /// a composite equal to `self`.
    pub fn child_scope(&self, addition: Option<ScopeRef>) -> Self {
        match addition {
            None => self.clone(),
            Some(scope) => CompositeScope {
                head: Some(Rc::new(ScopeNode {
                    scope,
                    next: self.head.clone(),
                })),
                len: self.len + 1,
            },
        }
    }

    pub fn child_scopes(&self, additions: impl IntoIterator<Item = ScopeRef>) -> Self {
        additions
            .into_iter()
            .fold(self.clone(), |acc, scope| acc.child_scope(Some(scope)))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Layers from innermost to outermost, each distinct provider once.
    pub fn layers(&self) -> Vec<ScopeRef> {
        let mut seen: FxHashSet<*const ()> = FxHashSet::default();
        let mut out = Vec::with_capacity(self.len);
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            if seen.insert(Rc::as_ptr(&current.scope) as *const ()) {
                out.push(current.scope.clone());
            }
            node = current.next.as_deref();
        }
        out
    }

    /// First classifier named `name`, innermost layer first.
    pub fn lookup_classifier(&self, arena: &IrArena, name: Atom) -> Option<DeclId> {
        for layer in self.layers() {
            let mut found = None;
            layer.process_classifiers_by_name(arena, name, &mut |decl| {
                found.get_or_insert(decl);
            });
            if found.is_some() {
                return found;
            }
        }
        None
    }

    pub fn lookup_functions(&self, arena: &IrArena, name: Atom) -> Vec<DeclId> {
        self.collect(|layer, processor| layer.process_functions_by_name(arena, name, processor))
    }

    pub fn lookup_properties(&self, arena: &IrArena, name: Atom) -> Vec<DeclId> {
        self.collect(|layer, processor| layer.process_properties_by_name(arena, name, processor))
    }

    fn collect(&self, query: impl Fn(&dyn Scope, &mut dyn FnMut(DeclId))) -> Vec<DeclId> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for layer in self.layers() {
            query(layer.as_ref(), &mut |decl| {
                if seen.insert(decl) {
                    out.push(decl);
                }
            });
        }
        out
    }
}

impl fmt::Debug for CompositeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.layers()).finish()
    }
}
