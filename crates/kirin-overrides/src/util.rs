//! Overridability
//!
//! The pure part of fake-override construction: deciding whether one member
//! can override another, merging inherited members into groups, and picking
//! the modality, visibility and template of the fake override that stands
//! for a group.
//!
//! Members are compared through [`OverridableMember`], which pairs a
//! declaration with the substitution of its class's type parameters by the
//! arguments of the supertype it is inherited through. No declaration is
//! copied until a group has been decided.

use crate::type_checker::OverrideTypeChecker;
use kirin_ir::{
    ClassKind, DeclData, DeclFlags, DeclId, DeclKind, IrArena, IrType, Modality, TypeSubstitution,
    Visibility,
};
use smallvec::SmallVec;

/// An inherited member as seen from the class being completed, or a member
/// declared in that class (no supertype, empty substitution).
#[derive(Clone, Debug)]
pub struct OverridableMember {
    pub decl: DeclId,
    pub super_type: Option<IrType>,
    pub substitution: TypeSubstitution,
}

impl OverridableMember {
    pub fn declared(decl: DeclId) -> Self {
        Self {
            decl,
            super_type: None,
            substitution: TypeSubstitution::default(),
        }
    }

    pub fn inherited(decl: DeclId, super_type: IrType, substitution: TypeSubstitution) -> Self {
        Self {
            decl,
            super_type: Some(super_type),
            substitution,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OverrideCompatibility {
    Overridable,
    Conflict,
    Incompatible,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideCompatibilityInfo {
    pub result: OverrideCompatibility,
    pub message: &'static str,
}

impl OverrideCompatibilityInfo {
    pub fn success() -> Self {
        Self {
            result: OverrideCompatibility::Overridable,
            message: "SUCCESS",
        }
    }

    pub fn incompatible(message: &'static str) -> Self {
        Self {
            result: OverrideCompatibility::Incompatible,
            message,
        }
    }

    pub fn conflict(message: &'static str) -> Self {
        Self {
            result: OverrideCompatibility::Conflict,
            message,
        }
    }
}

pub struct OverridingUtil<'a> {
    arena: &'a IrArena,
}

impl<'a> OverridingUtil<'a> {
    pub fn new(arena: &'a IrArena) -> Self {
        Self { arena }
    }

    // =========================================================================
    // Member shape
    // =========================================================================

    fn getter(&self, property: DeclId) -> Option<DeclId> {
        self.arena.decl(property).as_property().and_then(|p| p.getter)
    }

    fn setter(&self, property: DeclId) -> Option<DeclId> {
        self.arena.decl(property).as_property().and_then(|p| p.setter)
    }

    fn parameter_type(&self, parameter: DeclId, substitution: &TypeSubstitution) -> IrType {
        self.arena
            .decl(parameter)
            .as_value_parameter()
            .map_or(IrType::Dynamic, |p| p.ty.substitute(substitution))
    }

    /// The function whose parameters describe `member`: itself, or the
    /// getter of a property.
    fn signature_function(&self, member: DeclId) -> Option<DeclId> {
        match self.arena.decl(member).kind() {
            DeclKind::Property => self.getter(member),
            _ => Some(member),
        }
    }

    fn has_receiver(&self, member: DeclId) -> bool {
        self.signature_function(member)
            .and_then(|f| self.arena.decl(f).as_function())
            .is_some_and(|f| f.extension_receiver.is_some())
    }

    /// Extension receiver followed by the value parameters; properties only
    /// contribute their receiver.
    fn compiled_value_parameter_types(&self, member: &OverridableMember) -> SmallVec<[IrType; 4]> {
        let mut out = SmallVec::new();
        let is_property = self.arena.decl(member.decl).kind() == DeclKind::Property;
        let Some(function) = self
            .signature_function(member.decl)
            .and_then(|f| self.arena.decl(f).as_function())
        else {
            return out;
        };
        if let Some(receiver) = function.extension_receiver {
            out.push(self.parameter_type(receiver, &member.substitution));
        }
        if !is_property {
            for &parameter in &function.value_parameters {
                out.push(self.parameter_type(parameter, &member.substitution));
            }
        }
        out
    }

    fn value_parameter_count(&self, member: DeclId) -> usize {
        self.arena
            .decl(member)
            .as_function()
            .map_or(0, |f| f.value_parameters.len())
    }

    pub fn return_type(&self, member: &OverridableMember) -> IrType {
        self.signature_function(member.decl)
            .and_then(|f| self.arena.decl(f).as_function())
            .map_or(IrType::Dynamic, |f| f.return_type.substitute(&member.substitution))
    }

    fn type_parameters(&self, member: DeclId) -> &'a [DeclId] {
        self.arena.decl(member).type_parameters()
    }

    fn is_var(&self, member: DeclId) -> bool {
        self.arena.decl(member).flags.contains(DeclFlags::VAR)
    }

    fn visibility(&self, member: &OverridableMember) -> Visibility {
        self.arena.decl(member.decl).visibility
    }

    fn modality(&self, member: &OverridableMember) -> Modality {
        self.arena.decl(member.decl).modality().unwrap_or(Modality::Final)
    }

    // =========================================================================
    // Overridability
    // =========================================================================

    /// Whether `sub` can override `sup`. Return types are not compared.
    pub fn is_overridable_by(
        &self,
        sup: &OverridableMember,
        sub: &OverridableMember,
    ) -> OverrideCompatibilityInfo {
        self.check_overridability(sup, sub, false)
    }

    /// [`Self::is_overridable_by`], optionally also requiring the return type
    /// of `sub` to be a subtype of the return type of `sup`. Members whose
    /// signatures match but whose return types do not are a conflict.
    pub fn check_overridability(
        &self,
        sup: &OverridableMember,
        sub: &OverridableMember,
        check_return_type: bool,
    ) -> OverrideCompatibilityInfo {
        if let Some(problem) = self.basic_overridability_problem(sup.decl, sub.decl) {
            return problem;
        }

        let super_parameters = self.compiled_value_parameter_types(sup);
        let sub_parameters = self.compiled_value_parameter_types(sub);
        let super_type_parameters = self.type_parameters(sup.decl);
        let sub_type_parameters = self.type_parameters(sub.decl);
        if super_type_parameters.len() != sub_type_parameters.len() {
            return OverrideCompatibilityInfo::incompatible("Type parameter number mismatch");
        }

        let checker =
            OverrideTypeChecker::with_axioms(self.arena, super_type_parameters, sub_type_parameters);
        debug_assert_eq!(super_parameters.len(), sub_parameters.len());
        for (sub_type, super_type) in sub_parameters.iter().zip(&super_parameters) {
            if !checker.equal_types(sub_type, super_type) {
                return OverrideCompatibilityInfo::incompatible("Value parameter type mismatch");
            }
        }

        if check_return_type
            && !checker.is_subtype_of(&self.return_type(sub), &self.return_type(sup))
        {
            return OverrideCompatibilityInfo::conflict("Return type mismatch");
        }

        let (a, b) = (self.arena.decl(sup.decl), self.arena.decl(sub.decl));
        if a.kind() == DeclKind::Function
            && a.flags.contains(DeclFlags::SUSPEND) != b.flags.contains(DeclFlags::SUSPEND)
        {
            return OverrideCompatibilityInfo::conflict("Incompatible suspendability");
        }
        OverrideCompatibilityInfo::success()
    }

    fn basic_overridability_problem(
        &self,
        sup: DeclId,
        sub: DeclId,
    ) -> Option<OverrideCompatibilityInfo> {
        let (a, b) = (self.arena.decl(sup), self.arena.decl(sub));
        assert!(
            matches!(a.kind(), DeclKind::Function | DeclKind::Property),
            "This kind of declaration cannot be checked for overridability: {}",
            self.arena.render(sup)
        );
        if a.kind() != b.kind() {
            return Some(OverrideCompatibilityInfo::incompatible("Member kind mismatch"));
        }
        if a.name != b.name {
            return Some(OverrideCompatibilityInfo::incompatible("Name mismatch"));
        }
        if self.has_receiver(sup) != self.has_receiver(sub) {
            return Some(OverrideCompatibilityInfo::incompatible("Receiver presence mismatch"));
        }
        if a.kind() == DeclKind::Function
            && self.value_parameter_count(sup) != self.value_parameter_count(sub)
        {
            return Some(OverrideCompatibilityInfo::incompatible(
                "Value parameter number mismatch",
            ));
        }
        None
    }

    /// Overridable only when each member can override the other; a conflict
    /// in either direction is a conflict.
    pub fn both_ways_overridability(
        &self,
        overrider: &OverridableMember,
        candidate: &OverridableMember,
    ) -> OverrideCompatibility {
        let first = self.is_overridable_by(candidate, overrider).result;
        let second = self.is_overridable_by(overrider, candidate).result;
        match (first, second) {
            (OverrideCompatibility::Overridable, OverrideCompatibility::Overridable) => {
                OverrideCompatibility::Overridable
            }
            (OverrideCompatibility::Conflict, _) | (_, OverrideCompatibility::Conflict) => {
                OverrideCompatibility::Conflict
            }
            _ => OverrideCompatibility::Incompatible,
        }
    }

    pub fn is_visible_for_override(&self, from_super: &OverridableMember) -> bool {
        !matches!(
            self.visibility(from_super),
            Visibility::Private | Visibility::Local
        )
    }

    // =========================================================================
    // Group decisions
    // =========================================================================

    /// Index (into `members`) of the member with the widest visibility. The
    /// earlier member wins ties and incomparable pairs.
    pub fn find_member_with_max_visibility(
        &self,
        members: &[OverridableMember],
        indices: &[usize],
    ) -> usize {
        assert!(!indices.is_empty(), "Should have at least one overridable member");
        let mut result = indices[0];
        for &candidate in &indices[1..] {
            let current = self.visibility(&members[result]);
            let compared = current.compare(self.visibility(&members[candidate]));
            if compared.is_some_and(|c| c < 0) {
                result = candidate;
            }
        }
        result
    }

    /// Remove from `extract_from` the overrider and every member overridable
    /// with it both ways; conflicting members are removed and dropped.
    pub fn extract_members_overridable_in_both_ways(
        &self,
        members: &[OverridableMember],
        overrider: usize,
        extract_from: &mut Vec<usize>,
    ) -> Vec<usize> {
        let mut overridable = vec![overrider];
        extract_from.retain(|&candidate| {
            if candidate == overrider {
                return false;
            }
            match self.both_ways_overridability(&members[overrider], &members[candidate]) {
                OverrideCompatibility::Overridable => {
                    overridable.push(candidate);
                    false
                }
                OverrideCompatibility::Conflict => false,
                OverrideCompatibility::Incompatible => true,
            }
        });
        overridable
    }

    pub fn filter_visible(&self, members: &[OverridableMember], indices: &[usize]) -> Vec<usize> {
        indices
            .iter()
            .copied()
            .filter(|&i| self.is_visible_for_override(&members[i]))
            .collect()
    }

    pub fn determine_modality(
        &self,
        members: &[OverridableMember],
        indices: &[usize],
        class: DeclId,
    ) -> Modality {
        let mut has_open = false;
        let mut has_abstract = false;
        for &i in indices {
            match self.modality(&members[i]) {
                Modality::Final => return Modality::Final,
                Modality::Sealed => panic!(
                    "Member cannot have sealed modality: {}",
                    self.arena.render(members[i].decl)
                ),
                Modality::Open => has_open = true,
                Modality::Abstract => has_abstract = true,
            }
        }

        // An expect class that can be instantiated keeps its inherited
        // abstract members at the class's own modality.
        let class_decl = self.arena.decl(class);
        let class_modality = class_decl.modality().unwrap_or(Modality::Final);
        let abstract_to_class_modality = class_decl.is_expect()
            && class_modality != Modality::Abstract
            && class_modality != Modality::Sealed;

        if has_open && !has_abstract {
            return Modality::Open;
        }
        if !has_open && has_abstract {
            return if abstract_to_class_modality {
                class_modality
            } else {
                Modality::Abstract
            };
        }

        let mut result = Modality::Abstract;
        for &i in indices {
            let modality = match self.modality(&members[i]) {
                Modality::Abstract if abstract_to_class_modality => class_modality,
                modality => modality,
            };
            if modality < result {
                result = modality;
            }
        }
        result
    }

    fn is_visibility_more_specific(&self, a: DeclId, b: DeclId) -> bool {
        self.arena
            .decl(a)
            .visibility
            .compare(self.arena.decl(b).visibility)
            .is_none_or(|c| c >= 0)
    }

    fn is_accessor_more_specific(&self, a: Option<DeclId>, b: Option<DeclId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.is_visibility_more_specific(a, b),
            _ => true,
        }
    }

    fn is_return_type_more_specific(
        &self,
        a: &OverridableMember,
        a_type: &IrType,
        b: &OverridableMember,
        b_type: &IrType,
    ) -> bool {
        OverrideTypeChecker::with_axioms(
            self.arena,
            self.type_parameters(a.decl),
            self.type_parameters(b.decl),
        )
        .is_subtype_of(a_type, b_type)
    }

    pub fn is_more_specific(&self, a: &OverridableMember, b: &OverridableMember) -> bool {
        if !self.is_visibility_more_specific(a.decl, b.decl) {
            return false;
        }
        let (a_type, b_type) = (self.return_type(a), self.return_type(b));
        match &self.arena.decl(a.decl).data {
            DeclData::Function(_) => self.is_return_type_more_specific(a, &a_type, b, &b_type),
            DeclData::Property(_) => {
                if !self.is_accessor_more_specific(self.setter(a.decl), self.setter(b.decl)) {
                    return false;
                }
                match (self.is_var(a.decl), self.is_var(b.decl)) {
                    (true, true) => OverrideTypeChecker::with_axioms(
                        self.arena,
                        self.type_parameters(a.decl),
                        self.type_parameters(b.decl),
                    )
                    .equal_types(&a_type, &b_type),
                    // A val is never more specific than a var.
                    (false, true) => false,
                    _ => self.is_return_type_more_specific(a, &a_type, b, &b_type),
                }
            }
            _ => panic!("Unexpected callable: {}", self.arena.render(a.decl)),
        }
    }

    fn is_more_specific_than_all(
        &self,
        members: &[OverridableMember],
        candidate: usize,
        indices: &[usize],
    ) -> bool {
        indices
            .iter()
            .all(|&other| self.is_more_specific(&members[candidate], &members[other]))
    }

    /// The member whose shape the fake override copies. Among several
    /// equally specific members the first with a non-dynamic return type
    /// wins, then the first in `indices` order.
    pub fn select_most_specific(&self, members: &[OverridableMember], indices: &[usize]) -> usize {
        assert!(!indices.is_empty(), "Should have at least one overridable member");
        if indices.len() == 1 {
            return indices[0];
        }

        let first = indices[0];
        let mut transitively_most_specific = first;
        let mut candidates: SmallVec<[usize; 2]> = SmallVec::new();
        for &index in indices {
            if self.is_more_specific_than_all(members, index, indices) {
                candidates.push(index);
            }
            if self.is_more_specific(&members[index], &members[first])
                && !self.is_more_specific(&members[first], &members[index])
            {
                transitively_most_specific = index;
            }
        }

        match candidates.as_slice() {
            [] => transitively_most_specific,
            [only] => *only,
            _ => candidates
                .iter()
                .copied()
                .find(|&i| !self.return_type(&members[i]).is_dynamic())
                .unwrap_or(candidates[0]),
        }
    }

    /// Whether `class` is an interface; used to prefer class implementations.
    pub fn is_interface(&self, class: DeclId) -> bool {
        self.arena
            .decl(class)
            .as_class()
            .is_some_and(|c| c.kind == ClassKind::Interface)
    }
}
