//! Supertype Resolver
//!
//! Computes the resolved supertype list of every class and the resolved
//! expansion of every type alias. The walk is memoized per declaration in the
//! session and is re-entrant: resolving a nested class first resolves its
//! outer class's supertypes (they contribute nested classifiers to its scope),
//! and resolving any class continues into the classes its supertypes name.
//!
//! Cycles are detected by status, not by call stack: reaching a declaration
//! that is still `Computing` breaks the edge with one explicit error.
//!
//! The compute phase only reads the arena. [`apply_supertypes`] writes the
//! results back and turns error references into diagnostics.

use crate::collaborators::{
    DefaultImportingScopes, DefaultTypeResolver, ImportingScopeProvider, ResolvedTypeHead,
    TypePosition, TypeResolver, render_user_type,
};
use crate::index::DeclarationIndex;
use crate::scope::{CompositeScope, NestedClassifierScope, ScopeRef, TypeParameterScope};
use crate::session::{ScopeKey, SupertypeComputationSession, SupertypeComputationStatus};
use kirin_common::diagnostics::diagnostic_codes;
use kirin_common::limits::MAX_ALIAS_CHAIN_DEPTH;
use kirin_common::{DiagnosticBag, FqName};
use kirin_ir::{
    ClassKind, Classifier, DeclData, DeclId, DeclKind, ErrorKind, FileId, IrArena, IrType,
    ModuleId, SimpleType, TypeArgument, TypeRef, TypeSubstitution, UserTypeRef,
};
use rustc_hash::FxHashSet;
use std::rc::Rc;
use tracing::{Level, debug, span, trace};

// =============================================================================
// Options
// =============================================================================

#[derive(Clone, Debug)]
pub struct ResolverOptions {
    /// Packages star-imported into every file.
    pub default_imports: Vec<FqName>,
    /// Alias-to-alias hops followed before an expansion is given up on.
    pub max_alias_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            default_imports: vec![FqName::new("kotlin")],
            max_alias_depth: MAX_ALIAS_CHAIN_DEPTH,
        }
    }
}

// =============================================================================
// SupertypeResolver
// =============================================================================

pub struct SupertypeResolver<'a> {
    arena: &'a IrArena,
    session: SupertypeComputationSession,
    type_resolver: Box<dyn TypeResolver + 'a>,
    importing_scopes: Box<dyn ImportingScopeProvider + 'a>,
    options: ResolverOptions,
    alias_depth: usize,
}

impl<'a> SupertypeResolver<'a> {
    /// A resolver with the default collaborators over a fresh session.
    pub fn new(arena: &'a IrArena, options: ResolverOptions) -> Self {
        let index = Rc::new(DeclarationIndex::build(arena));
        let importing = DefaultImportingScopes::new(index.clone(), options.default_imports.clone());
        Self::with_collaborators(
            arena,
            options,
            Box::new(DefaultTypeResolver::new(index)),
            Box::new(importing),
        )
    }

    pub fn with_collaborators(
        arena: &'a IrArena,
        options: ResolverOptions,
        type_resolver: Box<dyn TypeResolver + 'a>,
        importing_scopes: Box<dyn ImportingScopeProvider + 'a>,
    ) -> Self {
        Self {
            arena,
            session: SupertypeComputationSession::new(),
            type_resolver,
            importing_scopes,
            options,
            alias_depth: 0,
        }
    }

    pub fn session(&self) -> &SupertypeComputationSession {
        &self.session
    }

    pub fn into_session(self) -> SupertypeComputationSession {
        self.session
    }

    /// Resolve every class and type alias declared in `module`.
    pub fn resolve_module(&mut self, module: ModuleId) {
        let arena = self.arena;
        let _span = span!(Level::INFO, "resolve_supertypes", module = %arena.module(module).name)
            .entered();
        for &file in &arena.module(module).files {
            self.resolve_file(file);
        }
    }

    pub fn resolve_file(&mut self, file: FileId) {
        let _span = span!(Level::DEBUG, "resolve_file", file = %self.arena.file(file).name).entered();
        let mut pending: Vec<DeclId> = self.arena.file(file).declarations.iter().rev().copied().collect();
        while let Some(decl) = pending.pop() {
            match self.arena.decl(decl).kind() {
                DeclKind::Class => {
                    self.resolve_supertypes(decl);
                    pending.extend(self.arena.members(decl).iter().rev().copied());
                }
                DeclKind::TypeAlias => {
                    self.resolve_supertypes(decl);
                }
                _ => {}
            }
        }
    }

    /// Resolved supertypes of a class, or the single resolved expansion of a
    /// type alias. Memoized: a second call returns the same list.
    pub fn resolve_supertypes(&mut self, decl: DeclId) -> Rc<[TypeRef]> {
        match self.session.status(decl) {
            SupertypeComputationStatus::Computed(refs) => return refs,
            SupertypeComputationStatus::Computing => {
                debug!(decl = %self.arena.render(decl), "supertype loop");
                return Rc::from(vec![self.loop_error(decl)]);
            }
            SupertypeComputationStatus::NotComputed => {}
        }

        self.session.start_computing(decl);
        let scope = self.prepare_scope(decl);
        let mut refs = self.resolve_declared_refs(decl, &scope);
        self.visit_resolved_super_classes(&mut refs);
        trace!(decl = %self.arena.render(decl), count = refs.len(), "supertypes computed");
        self.session.store(decl, refs)
    }

    /// Every class reachable through supertypes of `decl`: direct supertypes
    /// first, then each one's own supertypes.
    pub fn resolve_all_supertypes(&mut self, decl: DeclId) -> Vec<DeclId> {
        let mut visited = FxHashSet::default();
        visited.insert(decl);
        let mut result = Vec::new();
        self.collect_all_supertypes(decl, &mut visited, &mut result);
        result
    }

    fn collect_all_supertypes(
        &mut self,
        decl: DeclId,
        visited: &mut FxHashSet<DeclId>,
        result: &mut Vec<DeclId>,
    ) {
        let direct: Vec<DeclId> = self
            .resolve_supertypes(decl)
            .iter()
            .filter_map(|r| self.class_of(r))
            .filter(|class| visited.insert(*class))
            .collect();
        result.extend(direct.iter().copied());
        for class in direct {
            self.collect_all_supertypes(class, visited, result);
        }
    }

    fn class_of(&self, type_ref: &TypeRef) -> Option<DeclId> {
        let class = self.arena.owner(type_ref.class_symbol()?)?;
        (self.arena.decl(class).kind() == DeclKind::Class).then_some(class)
    }

    /// Walk into every class the new refs name so transitively reachable
    /// classes are resolved too. An edge to a class still being computed is
    /// the cycle closing; it is replaced by an error.
    fn visit_resolved_super_classes(&mut self, refs: &mut [TypeRef]) {
        for type_ref in refs.iter_mut() {
            let Some(class) = self.class_of(type_ref) else {
                continue;
            };
            match self.session.status(class) {
                SupertypeComputationStatus::Computing => {
                    debug!(class = %self.arena.render(class), "breaking supertype cycle");
                    *type_ref = self.loop_error(class);
                }
                SupertypeComputationStatus::NotComputed => {
                    self.resolve_supertypes(class);
                }
                SupertypeComputationStatus::Computed(_) => {}
            }
        }
    }

    fn loop_error(&self, decl: DeclId) -> TypeRef {
        TypeRef::error(
            ErrorKind::LoopInSupertypes,
            format!("Loop in supertype definition for {}", self.arena.fq_name(decl)),
        )
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// The scope supertypes of `decl` are resolved in: the enclosing scope
    /// (outer class or file) plus `decl`'s own type parameters.
    fn prepare_scope(&mut self, decl: DeclId) -> CompositeScope {
        let base = match self.arena.parent_class(decl) {
            Some(outer) => self.nested_classifier_scope(outer),
            None => self.file_scope(self.arena.file_of(decl)),
        };
        base.child_scope(TypeParameterScope::for_declaration(self.arena, decl))
    }

    fn file_scope(&mut self, file: FileId) -> CompositeScope {
        let arena = self.arena;
        let importing = &self.importing_scopes;
        self.session.get_or_create_scope(ScopeKey::File(file), |_| {
            CompositeScope::new(importing.importing_scopes(arena, file))
        })
    }

    /// What classes nested in `outer` can see: `outer`'s own scope, the
    /// nested classifiers of its non-interface supertypes (closest last),
    /// its type parameters, its companion objects and its own nested
    /// classifiers, innermost last.
    fn nested_classifier_scope(&mut self, outer: DeclId) -> CompositeScope {
        let key = ScopeKey::NestedClasses(outer);
        if let Some(scope) = self.session.scope(key) {
            return scope;
        }
        let outer_scope = self.prepare_scope(outer);
        let super_classes: Vec<DeclId> = self
            .resolve_all_supertypes(outer)
            .into_iter()
            .filter(|&class| {
                self.arena
                    .decl(class)
                    .as_class()
                    .is_some_and(|c| c.kind != ClassKind::Interface)
            })
            .collect();

        let mut layers: Vec<ScopeRef> = super_classes
            .iter()
            .rev()
            .map(|&class| NestedClassifierScope::new(class))
            .collect();
        layers.extend(TypeParameterScope::for_declaration(self.arena, outer));
        for class in super_classes.iter().rev().chain(std::iter::once(&outer)) {
            if let Some(companion) = self.arena.companion_of(*class) {
                layers.push(NestedClassifierScope::new(companion));
            }
        }
        layers.push(NestedClassifierScope::new(outer));

        let scope = outer_scope.child_scopes(layers);
        self.session.get_or_create_scope(key, |_| scope)
    }

    // =========================================================================
    // Reference resolution
    // =========================================================================

    fn resolve_declared_refs(&mut self, decl: DeclId, scope: &CompositeScope) -> Vec<TypeRef> {
        let arena = self.arena;
        match &arena.decl(decl).data {
            DeclData::Class(class) => class
                .super_types
                .iter()
                .map(|type_ref| match type_ref {
                    TypeRef::Unresolved(user) => {
                        self.resolve_user_ref(user, scope, TypePosition::SuperType)
                    }
                    resolved => resolved.clone(),
                })
                .collect(),
            DeclData::TypeAlias(alias) => {
                let expansion = match &alias.expanded {
                    TypeRef::Unresolved(user) => {
                        self.resolve_user_ref(user, scope, TypePosition::TypeAliasExpansion)
                    }
                    resolved => resolved.clone(),
                };
                vec![expansion]
            }
            _ => panic!(
                "Supertypes requested for {} which is neither a class nor a type alias",
                arena.render(decl)
            ),
        }
    }

    fn resolve_user_ref(
        &mut self,
        user: &UserTypeRef,
        scope: &CompositeScope,
        position: TypePosition,
    ) -> TypeRef {
        let arena = self.arena;
        let head = match self.type_resolver.resolve_type(arena, user, scope, position) {
            Ok(head) => head,
            Err(message) => return TypeRef::error(ErrorKind::UnresolvedReference, message),
        };
        let decl = arena.decl(head.classifier);
        match decl.kind() {
            DeclKind::TypeParameter if position == TypePosition::SuperType => TypeRef::error(
                ErrorKind::TypeParameterAsSupertype,
                format!(
                    "Type parameter cannot be a super-type: {}",
                    arena.decl_name(head.classifier)
                ),
            ),
            DeclKind::TypeParameter => {
                let ty = IrType::type_parameter(decl.symbol);
                TypeRef::Resolved(ty.with_nullability(head.nullable))
            }
            DeclKind::TypeAlias => self.expand_alias(&head, position),
            DeclKind::Class if head.arguments.len() != decl.type_parameters().len() => {
                TypeRef::error(
                    ErrorKind::WrongTypeArgumentCount,
                    format!(
                        "{} type argument(s) expected for {}, got {}",
                        decl.type_parameters().len(),
                        arena.fq_name(head.classifier),
                        head.arguments.len()
                    ),
                )
            }
            DeclKind::Class => TypeRef::Resolved(IrType::Simple(SimpleType {
                classifier: Classifier::Class(decl.symbol),
                arguments: head.arguments,
                nullable: head.nullable,
                abbreviation: None,
            })),
            _ => TypeRef::error(
                ErrorKind::UnresolvedReference,
                format!("Unresolved reference: {}", render_user_type(arena, user)),
            ),
        }
    }

    /// Expand a use of a type alias. The alias's own expansion is resolved
    /// first (memoized), so chains `X -> Y -> Z` end at `Z`.
    fn expand_alias(&mut self, head: &ResolvedTypeHead, position: TypePosition) -> TypeRef {
        let arena = self.arena;
        let alias = head.classifier;
        let unresolved = || {
            TypeRef::error(
                ErrorKind::UnresolvedExpansion,
                format!("Unresolved expanded typeRef for {}", arena.fq_name(alias)),
            )
        };
        if self.alias_depth >= self.options.max_alias_depth {
            return unresolved();
        }

        self.alias_depth += 1;
        let expansion = self.resolve_supertypes(alias);
        self.alias_depth -= 1;

        let expanded = match expansion.first() {
            Some(TypeRef::Resolved(ty)) => ty.clone(),
            Some(TypeRef::Error(error)) if error.kind == ErrorKind::LoopInSupertypes => {
                return TypeRef::Error(error.clone());
            }
            _ => return unresolved(),
        };

        let parameters = arena.decl(alias).type_parameters();
        let substitution: TypeSubstitution = parameters
            .iter()
            .zip(head.arguments.iter())
            .map(|(&parameter, argument)| {
                let replacement = match argument {
                    TypeArgument::Projection { ty, .. } => ty.clone(),
                    TypeArgument::Star => arena.nullable_any_type(),
                };
                (arena.decl(parameter).symbol, replacement)
            })
            .collect();
        let ty = expanded.substitute(&substitution);

        let abbreviation = Some(arena.decl(alias).symbol);
        match ty {
            IrType::Simple(simple) if matches!(simple.classifier, Classifier::TypeParameter(_))
                && position == TypePosition::SuperType =>
            {
                TypeRef::error(
                    ErrorKind::TypeParameterAsSupertype,
                    format!(
                        "Type parameter cannot be a super-type: {}",
                        arena.render_type(&IrType::Simple(simple))
                    ),
                )
            }
            IrType::Simple(simple) => TypeRef::Resolved(IrType::Simple(SimpleType {
                nullable: simple.nullable || head.nullable,
                abbreviation,
                ..simple
            })),
            other => TypeRef::Resolved(other),
        }
    }
}

// =============================================================================
// Apply phase
// =============================================================================

/// Write every computed result of `session` into the arena and report the
/// error references as diagnostics.
///
/// # Panics
/// When a declaration is still `Computing`, or a type alias result does not
/// hold exactly one reference.
pub fn apply_supertypes(arena: &mut IrArena, session: &SupertypeComputationSession) -> DiagnosticBag {
    if let Some(&decl) = session.in_progress().first() {
        panic!(
            "Supertypes of {} are still being computed",
            arena.render(decl)
        );
    }
    let mut diagnostics = DiagnosticBag::new();
    for (decl, refs) in session.computed() {
        let rendered = arena.render(decl);
        for type_ref in refs.iter() {
            if let TypeRef::Error(error) = type_ref {
                let code = match error.kind {
                    ErrorKind::LoopInSupertypes => diagnostic_codes::LOOP_IN_SUPERTYPES,
                    ErrorKind::TypeParameterAsSupertype => diagnostic_codes::TYPE_PARAMETER_AS_SUPERTYPE,
                    ErrorKind::UnresolvedExpansion => diagnostic_codes::UNRESOLVED_EXPANSION,
                    ErrorKind::UnresolvedReference => diagnostic_codes::UNRESOLVED_REFERENCE,
                    ErrorKind::WrongTypeArgumentCount => {
                        diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS
                    }
                };
                diagnostics.error(rendered.clone(), error.message.clone(), code);
            }
        }
        match &mut arena.decl_mut(decl).data {
            DeclData::Class(class) => class.super_types = refs.to_vec(),
            DeclData::TypeAlias(alias) => {
                assert!(
                    refs.len() == 1,
                    "Type alias {rendered} must have exactly one expansion, got {}",
                    refs.len()
                );
                alias.expanded = refs[0].clone();
            }
            _ => {}
        }
    }
    diagnostics
}

/// Resolve and apply the supertypes of every class-like declaration in
/// `module` with a fresh session.
pub fn resolve_module_supertypes(
    arena: &mut IrArena,
    module: ModuleId,
    options: &ResolverOptions,
) -> DiagnosticBag {
    let session = {
        let mut resolver = SupertypeResolver::new(arena, options.clone());
        resolver.resolve_module(module);
        resolver.into_session()
    };
    apply_supertypes(arena, &session)
}
