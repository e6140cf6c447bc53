//! Collaborators the supertype resolver consumes.
//!
//! Both are traits so an embedding front end can substitute its own import
//! handling or type-reference resolution. The defaults here resolve plain
//! Kotlin-style paths against the arena.

use crate::index::{DeclarationIndex, nested_classifier};
use crate::scope::{CompositeScope, ExplicitImportScope, PackageMemberScope, ScopeRef, StarImportScope};
use kirin_common::FqName;
use kirin_common::limits::MAX_TYPE_ARGUMENT_DEPTH;
use kirin_ir::{
    Classifier, DeclId, DeclKind, FileId, IrArena, IrType, SimpleType, TypeArgument,
    UserTypeArgument, UserTypeRef,
};
use std::rc::Rc;

/// Where a type reference is written; lets a resolver adjust its rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypePosition {
    SuperType,
    TypeAliasExpansion,
}

/// The classifier a written type names, with its arguments resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTypeHead {
    /// A class, type alias or type parameter.
    pub classifier: DeclId,
    pub arguments: Vec<TypeArgument>,
    pub nullable: bool,
}

pub trait TypeResolver {
    /// Resolve one written type against `scope`. The error string is a
    /// human-readable message ("Unresolved reference: Foo").
    fn resolve_type(
        &self,
        arena: &IrArena,
        type_ref: &UserTypeRef,
        scope: &CompositeScope,
        position: TypePosition,
    ) -> Result<ResolvedTypeHead, String>;
}

pub trait ImportingScopeProvider {
    /// Import layers of `file`, outermost first.
    fn importing_scopes(&self, arena: &IrArena, file: FileId) -> Vec<ScopeRef>;
}

pub fn render_user_type(arena: &IrArena, type_ref: &UserTypeRef) -> String {
    let path: Vec<&str> = type_ref
        .segments
        .iter()
        .map(|segment| arena.name(segment.name))
        .collect();
    path.join(".")
}

// =============================================================================
// Default type resolver
// =============================================================================

pub struct DefaultTypeResolver {
    index: Rc<DeclarationIndex>,
}

impl DefaultTypeResolver {
    pub fn new(index: Rc<DeclarationIndex>) -> Self {
        Self { index }
    }

    fn resolve_head(
        &self,
        arena: &IrArena,
        type_ref: &UserTypeRef,
        scope: &CompositeScope,
    ) -> Option<DeclId> {
        let first = type_ref.segments.first()?;
        if let Some(found) = scope.lookup_classifier(arena, first.name) {
            let mut current = found;
            for segment in &type_ref.segments[1..] {
                current = nested_classifier(arena, current, segment.name)?;
            }
            return Some(current);
        }
        // Fully qualified: `lib.Outer.Inner`.
        let segments: Vec<&str> = type_ref
            .segments
            .iter()
            .map(|segment| arena.name(segment.name))
            .collect();
        let names: Vec<_> = type_ref.segments.iter().map(|segment| segment.name).collect();
        self.index.resolve_segments(arena, &segments, &names)
    }

    fn resolve_argument_type(
        &self,
        arena: &IrArena,
        type_ref: &UserTypeRef,
        scope: &CompositeScope,
        depth: usize,
    ) -> IrType {
        if depth > MAX_TYPE_ARGUMENT_DEPTH {
            return IrType::Error("Type argument nesting is too deep".to_string());
        }
        let Some(head) = self.resolve_head(arena, type_ref, scope) else {
            return IrType::Error(format!(
                "Unresolved reference: {}",
                render_user_type(arena, type_ref)
            ));
        };
        let arguments = self.resolve_arguments(arena, type_ref, scope, depth + 1);
        let decl = arena.decl(head);
        let ty = match decl.kind() {
            DeclKind::TypeParameter => IrType::type_parameter(decl.symbol),
            DeclKind::TypeAlias => match decl.as_type_alias().and_then(|a| a.expanded.resolved_type()) {
                Some(expanded) => expanded.clone(),
                None => IrType::Error(format!(
                    "Unresolved expanded typeRef for {}",
                    arena.fq_name(head)
                )),
            },
            _ => IrType::Simple(SimpleType {
                classifier: Classifier::Class(decl.symbol),
                arguments,
                nullable: false,
                abbreviation: None,
            }),
        };
        ty.with_nullability(type_ref.nullable || ty.is_nullable())
    }

    fn resolve_arguments(
        &self,
        arena: &IrArena,
        type_ref: &UserTypeRef,
        scope: &CompositeScope,
        depth: usize,
    ) -> Vec<TypeArgument> {
        let Some(last) = type_ref.segments.last() else {
            return Vec::new();
        };
        last.arguments
            .iter()
            .map(|argument| match argument {
                UserTypeArgument::Star => TypeArgument::Star,
                UserTypeArgument::Projection { variance, ty } => TypeArgument::Projection {
                    variance: *variance,
                    ty: self.resolve_argument_type(arena, ty, scope, depth),
                },
            })
            .collect()
    }
}

impl TypeResolver for DefaultTypeResolver {
    fn resolve_type(
        &self,
        arena: &IrArena,
        type_ref: &UserTypeRef,
        scope: &CompositeScope,
        _position: TypePosition,
    ) -> Result<ResolvedTypeHead, String> {
        let head = self
            .resolve_head(arena, type_ref, scope)
            .ok_or_else(|| format!("Unresolved reference: {}", render_user_type(arena, type_ref)))?;
        // Arguments first: a generic head is only meaningful once its
        // arguments are.
        let arguments = self.resolve_arguments(arena, type_ref, scope, 1);
        Ok(ResolvedTypeHead {
            classifier: head,
            arguments,
            nullable: type_ref.nullable,
        })
    }
}

// =============================================================================
// Default importing scopes
// =============================================================================

pub struct DefaultImportingScopes {
    index: Rc<DeclarationIndex>,
    default_imports: Vec<FqName>,
}

impl DefaultImportingScopes {
    pub fn new(index: Rc<DeclarationIndex>, default_imports: Vec<FqName>) -> Self {
        Self {
            index,
            default_imports,
        }
    }
}

impl ImportingScopeProvider for DefaultImportingScopes {
    /// Default star imports, explicit star imports, the file's own package,
    /// explicit imports. Later layers shadow earlier ones.
    fn importing_scopes(&self, arena: &IrArena, file: FileId) -> Vec<ScopeRef> {
        let file = arena.file(file);
        let mut scopes = Vec::with_capacity(4);
        if !self.default_imports.is_empty() {
            scopes.push(StarImportScope::new(
                self.default_imports.clone(),
                self.index.clone(),
            ));
        }
        let star: Vec<FqName> = file
            .imports
            .iter()
            .filter(|import| import.all_under)
            .map(|import| import.fq_name.clone())
            .collect();
        if !star.is_empty() {
            scopes.push(StarImportScope::new(star, self.index.clone()));
        }
        scopes.push(PackageMemberScope::new(file.package.clone(), self.index.clone()));
        let explicit: Vec<_> = file
            .imports
            .iter()
            .filter_map(|import| {
                let name = arena.names.lookup(import.imported_name()?)?;
                Some((name, import.fq_name.clone()))
            })
            .collect();
        if !explicit.is_empty() {
            scopes.push(ExplicitImportScope::new(explicit, self.index.clone()));
        }
        scopes
    }
}
