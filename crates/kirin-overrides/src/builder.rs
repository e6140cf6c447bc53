//! Fake Override Builder
//!
//! Completes the member list of every class in a module with fake overrides
//! for the members it inherits without redeclaring.
//!
//! Classes are processed supertypes first: a class can only see the members
//! its supertypes inherit once their fake overrides exist. A `processed` set
//! makes every class complete exactly once, which is what keeps a diamond's
//! shared ancestor from being expanded twice.
//!
//! After a fake override is built its symbol is redelegated through the
//! signature table: if a library already referenced the fake override's
//! signature (a call through the subclass), that symbol is adopted and the
//! use site sees the new declaration.

use crate::copier::FakeOverrideCopier;
use crate::queries::{collect_real_overrides, set_overridden};
use crate::util::{OverridableMember, OverrideCompatibility, OverridingUtil};
use indexmap::IndexMap;
use kirin_common::Atom;
use kirin_ir::{DeclId, DeclKind, IrArena, ModuleId, SymbolId, TypeArgument, TypeRef, TypeSubstitution};
use kirin_mangle::{GlobalDeclarationTable, IrMangler, Mangler};
use rustc_hash::FxHashSet;
use tracing::{Level, debug, span, trace, warn};

// =============================================================================
// Options
// =============================================================================

/// Platform hook opting classes out of fake-override construction.
pub trait FakeOverrideClassFilter {
    fn construct_fake_overrides(&self, _arena: &IrArena, _class: DeclId) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFakeOverrideClassFilter;

impl FakeOverrideClassFilter for DefaultFakeOverrideClassFilter {}

pub struct FakeOverrideOptions {
    pub class_filter: Box<dyn FakeOverrideClassFilter>,
}

impl Default for FakeOverrideOptions {
    fn default() -> Self {
        Self {
            class_filter: Box::new(DefaultFakeOverrideClassFilter),
        }
    }
}

// =============================================================================
// FakeOverrideBuilder
// =============================================================================

pub struct FakeOverrideBuilder<'t, M: Mangler = IrMangler> {
    table: &'t mut GlobalDeclarationTable<M>,
    options: FakeOverrideOptions,
    processed: FxHashSet<DeclId>,
    created: usize,
}

impl<'t, M: Mangler> FakeOverrideBuilder<'t, M> {
    pub fn new(table: &'t mut GlobalDeclarationTable<M>, options: FakeOverrideOptions) -> Self {
        Self {
            table,
            options,
            processed: FxHashSet::default(),
            created: 0,
        }
    }

    /// Number of fake overrides created so far.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn is_processed(&self, class: DeclId) -> bool {
        self.processed.contains(&class)
    }

    /// Build fake overrides for every class of `module`, including nested
    /// classes. Classes local to function bodies are not visited.
    pub fn provide_fake_overrides(&mut self, arena: &mut IrArena, module: ModuleId) {
        let _span = span!(Level::INFO, "provide_fake_overrides", module = %arena.module(module).name)
            .entered();
        let before = self.created;

        let mut classes = Vec::new();
        for &file in &arena.module(module).files {
            let mut stack: Vec<DeclId> = arena.file(file).declarations.clone();
            stack.reverse();
            while let Some(decl) = stack.pop() {
                if arena.decl(decl).kind() != DeclKind::Class {
                    continue;
                }
                classes.push(decl);
                stack.extend(arena.members(decl).iter().rev().copied());
            }
        }

        for class in classes {
            self.build_fake_override_chains_for_class(arena, class);
        }
        debug!(created = self.created - before, "fake overrides provided");
    }

    /// Complete `class` after completing its supertypes.
    pub fn build_fake_override_chains_for_class(&mut self, arena: &mut IrArena, class: DeclId) {
        if !self.processed.insert(class) {
            return;
        }
        if !self.options.class_filter.construct_fake_overrides(arena, class)
            || !self.is_public_api(arena, class)
        {
            trace!(class = %arena.render(class), "skipping fake overrides");
            return;
        }
        for super_class in arena.super_classes(class) {
            self.build_fake_override_chains_for_class(arena, super_class);
        }
        self.build_fake_overrides_for_class(arena, class);
    }

    fn is_public_api(&self, arena: &IrArena, decl: DeclId) -> bool {
        let symbol = arena.decl(decl).symbol;
        match arena.symbols.signature(symbol) {
            Some(signature) => signature.is_public(),
            None => self.table.is_exported(arena, decl),
        }
    }

    fn overridable_members(&self, arena: &IrArena, class: DeclId) -> Vec<DeclId> {
        arena
            .members(class)
            .iter()
            .copied()
            .filter(|&member| {
                arena.decl(member).is_overridable_member() && self.is_public_api(arena, member)
            })
            .collect()
    }

    /// Candidates in supertype order, then member order.
    fn inherited_members(&self, arena: &IrArena, class: DeclId) -> Vec<OverridableMember> {
        let mut out = Vec::new();
        for super_type in arena.super_types(class).iter().filter_map(TypeRef::resolved_type) {
            let Some(super_class) = arena.class_of_type(super_type) else {
                continue;
            };
            let mut substitution = TypeSubstitution::default();
            let arguments = super_type.as_simple().map_or(&[][..], |s| s.arguments.as_slice());
            let parameters = arena.decl(super_class).type_parameters();
            if parameters.len() != arguments.len() {
                warn!(
                    class = %arena.render(class),
                    super_type = %arena.render_type(super_type),
                    "type arguments do not match type parameters, supertype skipped"
                );
                continue;
            }
            for (&parameter, argument) in parameters.iter().zip(arguments) {
                let ty = match argument {
                    TypeArgument::Star => arena.nullable_any_type(),
                    TypeArgument::Projection { ty, .. } => ty.clone(),
                };
                substitution.insert(arena.decl(parameter).symbol, ty);
            }
            for member in self.overridable_members(arena, super_class) {
                out.push(OverridableMember::inherited(
                    member,
                    super_type.clone(),
                    substitution.clone(),
                ));
            }
        }
        out
    }

    /// Bind the overridden sets of `class`'s own members and add fake
    /// overrides for everything else it inherits.
    pub fn build_fake_overrides_for_class(&mut self, arena: &mut IrArena, class: DeclId) {
        let _span = span!(Level::DEBUG, "build_fake_overrides", class = %arena.render(class)).entered();

        let from_current = self.overridable_members(arena, class);
        let from_super = self.inherited_members(arena, class);

        let mut by_name: IndexMap<Atom, Vec<usize>> = IndexMap::new();
        for (index, member) in from_super.iter().enumerate() {
            by_name
                .entry(arena.decl(member.decl).name)
                .or_default()
                .push(index);
        }

        for (name, group) in by_name {
            let mut not_overridden = group.clone();
            let declared: Vec<DeclId> = from_current
                .iter()
                .copied()
                .filter(|&member| arena.decl(member).name == name)
                .collect();
            for current in declared {
                let bound = self.extract_and_bind_overrides(arena, current, &from_super, &group);
                not_overridden.retain(|index| !bound.contains(index));
            }
            self.create_and_bind_fake_overrides(arena, class, &from_super, not_overridden);
        }
    }

    /// Record what `current` overrides among `group`. Returns every member
    /// it binds, including conflicting ones, which then get no fake
    /// override.
    fn extract_and_bind_overrides(
        &self,
        arena: &mut IrArena,
        current: DeclId,
        members: &[OverridableMember],
        group: &[usize],
    ) -> Vec<usize> {
        let util = OverridingUtil::new(arena);
        let declared = OverridableMember::declared(current);
        let mut bound = Vec::with_capacity(group.len());
        let mut overridden: Vec<SymbolId> = Vec::new();
        for &index in group {
            let from_super = &members[index];
            match util.is_overridable_by(from_super, &declared).result {
                OverrideCompatibility::Overridable => {
                    if util.is_visible_for_override(from_super) {
                        let symbol = arena.decl(from_super.decl).symbol;
                        if !overridden.contains(&symbol) {
                            overridden.push(symbol);
                        }
                    }
                    bound.push(index);
                }
                OverrideCompatibility::Conflict => bound.push(index),
                OverrideCompatibility::Incompatible => {}
            }
        }
        trace!(member = %arena.render(current), overridden = overridden.len(), "bound declared member");
        set_overridden(arena, current, overridden);
        bound
    }

    fn create_and_bind_fake_overrides(
        &mut self,
        arena: &mut IrArena,
        class: DeclId,
        members: &[OverridableMember],
        mut from_super: Vec<usize>,
    ) {
        while !from_super.is_empty() {
            let util = OverridingUtil::new(arena);
            let max_visibility = util.find_member_with_max_visibility(members, &from_super);
            let overridables =
                util.extract_members_overridable_in_both_ways(members, max_visibility, &mut from_super);
            self.create_and_bind_fake_override(arena, class, members, &overridables);
        }
    }

    fn create_and_bind_fake_override(
        &mut self,
        arena: &mut IrArena,
        class: DeclId,
        members: &[OverridableMember],
        overridables: &[usize],
    ) {
        let util = OverridingUtil::new(arena);
        let visible = util.filter_visible(members, overridables);
        let effective: &[usize] = if visible.is_empty() { overridables } else { &visible };
        let modality = util.determine_modality(members, effective, class);
        let visibility = arena
            .decl(members[util.find_member_with_max_visibility(members, effective)].decl)
            .visibility;
        let most_specific = &members[util.select_most_specific(members, effective)];

        let mut overridden: Vec<SymbolId> = Vec::new();
        for &index in effective {
            for real in collect_real_overrides(arena, members[index].decl) {
                let symbol = arena.decl(real).symbol;
                if !overridden.contains(&symbol) {
                    overridden.push(symbol);
                }
            }
        }

        let fake_override = FakeOverrideCopier::new(arena, class, most_specific.substitution.clone())
            .with_modality(modality)
            .with_visibility(visibility)
            .copy(most_specific.decl);
        assert!(
            !overridden.is_empty(),
            "Overridden symbols should be set for fake override {}",
            arena.render(fake_override)
        );
        set_overridden(arena, fake_override, overridden);

        self.table.assign_signatures(arena, fake_override);
        arena.add_member(class, fake_override);
        self.created += 1;
        trace!(
            fake_override = %arena.render(fake_override),
            template = %arena.render(most_specific.decl),
            modality = modality.name(),
            visibility = visibility.name(),
            "synthesized fake override"
        );
    }
}
