//! Override Type Checker
//!
//! Equality and subtyping over `IrType` as needed to compare the signatures
//! of an inherited member and a member that may override it.
//!
//! Two members never share type parameter symbols: a generic member copied
//! into a subclass gets fresh ones. The checker is therefore created with the
//! two type parameter lists being compared and treats corresponding
//! parameters as the same type (the *axioms*). That is what lets
//! `fun <T> f(t: T)` override `fun <U> f(t: U)`.

use kirin_common::limits::MAX_SUBTYPE_WALK_DEPTH;
use kirin_ir::{
    Classifier, DeclId, IrArena, IrType, SimpleType, SymbolId, TypeArgument, TypeRef,
    TypeSubstitution, Variance,
};
use rustc_hash::FxHashMap;
use tracing::warn;

pub struct OverrideTypeChecker<'a> {
    arena: &'a IrArena,
    axioms: FxHashMap<SymbolId, SymbolId>,
}

impl<'a> OverrideTypeChecker<'a> {
    pub fn new(arena: &'a IrArena) -> Self {
        Self {
            arena,
            axioms: FxHashMap::default(),
        }
    }

    /// A checker where the i-th parameter of `first` equals the i-th
    /// parameter of `second`. Extra parameters on either side get no axiom.
    pub fn with_axioms(arena: &'a IrArena, first: &[DeclId], second: &[DeclId]) -> Self {
        let mut axioms = FxHashMap::default();
        for (&a, &b) in first.iter().zip(second) {
            let (a, b) = (arena.decl(a).symbol, arena.decl(b).symbol);
            axioms.insert(a, b);
            axioms.insert(b, a);
        }
        Self { arena, axioms }
    }

    fn same_type_parameter(&self, a: SymbolId, b: SymbolId) -> bool {
        a == b || self.axioms.get(&a) == Some(&b)
    }

    fn same_class(&self, a: SymbolId, b: SymbolId) -> bool {
        self.arena.symbols.resolve(a) == self.arena.symbols.resolve(b)
    }

    fn is_class(&self, classifier: Classifier, class: DeclId) -> bool {
        match classifier {
            Classifier::Class(symbol) => self.same_class(symbol, self.arena.decl(class).symbol),
            Classifier::TypeParameter(_) => false,
        }
    }

    // =========================================================================
    // Equality
    // =========================================================================

    pub fn equal_types(&self, a: &IrType, b: &IrType) -> bool {
        match (a, b) {
            (IrType::Dynamic, IrType::Dynamic) => true,
            (IrType::Error(a), IrType::Error(b)) => a == b,
            (IrType::Simple(a), IrType::Simple(b)) => self.equal_simple(a, b),
            _ => false,
        }
    }

    fn equal_simple(&self, a: &SimpleType, b: &SimpleType) -> bool {
        if a.nullable != b.nullable || a.arguments.len() != b.arguments.len() {
            return false;
        }
        let heads = match (a.classifier, b.classifier) {
            (Classifier::Class(x), Classifier::Class(y)) => self.same_class(x, y),
            (Classifier::TypeParameter(x), Classifier::TypeParameter(y)) => {
                self.same_type_parameter(x, y)
            }
            _ => false,
        };
        heads
            && a.arguments
                .iter()
                .zip(&b.arguments)
                .all(|(x, y)| self.equal_arguments(x, y))
    }

    fn equal_arguments(&self, a: &TypeArgument, b: &TypeArgument) -> bool {
        match (a, b) {
            (TypeArgument::Star, TypeArgument::Star) => true,
            (
                TypeArgument::Projection { variance: v1, ty: t1 },
                TypeArgument::Projection { variance: v2, ty: t2 },
            ) => v1 == v2 && self.equal_types(t1, t2),
            _ => false,
        }
    }

    // =========================================================================
    // Subtyping
    // =========================================================================

    pub fn is_subtype_of(&self, sub: &IrType, sup: &IrType) -> bool {
        self.is_subtype_at_depth(sub, sup, 0)
    }

    fn is_subtype_at_depth(&self, sub: &IrType, sup: &IrType, depth: usize) -> bool {
        if depth > MAX_SUBTYPE_WALK_DEPTH {
            warn!(depth, "subtype walk depth exceeded");
            return false;
        }
        if self.equal_types(sub, sup) {
            return true;
        }
        match (sub, sup) {
            (IrType::Dynamic, _) | (_, IrType::Dynamic) => true,
            (IrType::Error(_), _) | (_, IrType::Error(_)) => false,
            (IrType::Simple(a), IrType::Simple(b)) => self.is_simple_subtype(a, b, depth),
        }
    }

    fn is_simple_subtype(&self, a: &SimpleType, b: &SimpleType, depth: usize) -> bool {
        if a.nullable && !b.nullable {
            return false;
        }
        let builtins = self.arena.builtins();
        if self.is_class(a.classifier, builtins.nothing) {
            return true;
        }

        match a.classifier {
            Classifier::TypeParameter(parameter) => {
                if let Classifier::TypeParameter(other) = b.classifier {
                    if self.same_type_parameter(parameter, other) {
                        return true;
                    }
                }
                let sup = IrType::Simple(b.clone());
                self.type_parameter_bounds(parameter).iter().any(|bound| {
                    let bound = bound.with_nullability(bound.is_nullable() || a.nullable);
                    self.is_subtype_at_depth(&bound, &sup, depth + 1)
                })
            }
            Classifier::Class(symbol) => {
                if self.is_class(b.classifier, builtins.any) {
                    return true;
                }
                let Classifier::Class(target) = b.classifier else {
                    return false;
                };
                if self.same_class(symbol, target) {
                    return self.arguments_conform(symbol, &a.arguments, &b.arguments, depth);
                }
                let Some(class) = self.arena.owner(symbol) else {
                    return false;
                };
                let substitution = self.class_substitution(class, &a.arguments);
                let sup = IrType::Simple(b.clone());
                self.arena
                    .super_types(class)
                    .iter()
                    .filter_map(TypeRef::resolved_type)
                    .any(|super_type| {
                        let super_type = super_type
                            .substitute(&substitution)
                            .with_nullability(a.nullable);
                        self.is_subtype_at_depth(&super_type, &sup, depth + 1)
                    })
            }
        }
    }

    fn type_parameter_bounds(&self, parameter: SymbolId) -> Vec<IrType> {
        self.arena
            .owner(parameter)
            .and_then(|decl| self.arena.decl(decl).as_type_parameter())
            .map(|data| data.super_types.clone())
            .unwrap_or_default()
    }

    /// Type parameters of `class` mapped to `arguments`; star projections
    /// become `Any?`.
    fn class_substitution(&self, class: DeclId, arguments: &[TypeArgument]) -> TypeSubstitution {
        let mut substitution = TypeSubstitution::default();
        for (&parameter, argument) in self
            .arena
            .decl(class)
            .type_parameters()
            .iter()
            .zip(arguments)
        {
            let ty = match argument {
                TypeArgument::Star => self.arena.nullable_any_type(),
                TypeArgument::Projection { ty, .. } => ty.clone(),
            };
            substitution.insert(self.arena.decl(parameter).symbol, ty);
        }
        substitution
    }

    fn arguments_conform(
        &self,
        class: SymbolId,
        sub: &[TypeArgument],
        sup: &[TypeArgument],
        depth: usize,
    ) -> bool {
        if sub.len() != sup.len() {
            return false;
        }
        let parameters = self
            .arena
            .owner(class)
            .map(|decl| self.arena.decl(decl).type_parameters().to_vec())
            .unwrap_or_default();

        sub.iter().zip(sup).enumerate().all(|(i, (a, b))| match (a, b) {
            (_, TypeArgument::Star) => true,
            (TypeArgument::Star, TypeArgument::Projection { .. }) => false,
            (
                TypeArgument::Projection { variance: va, ty: ta },
                TypeArgument::Projection { variance: vb, ty: tb },
            ) => {
                let declared = parameters
                    .get(i)
                    .and_then(|&p| self.arena.decl(p).as_type_parameter())
                    .map_or(Variance::Invariant, |p| p.variance);
                let variance = if *vb != Variance::Invariant { *vb } else { declared };
                match variance {
                    Variance::Out => {
                        *va != Variance::In && self.is_subtype_at_depth(ta, tb, depth + 1)
                    }
                    Variance::In => {
                        *va != Variance::Out && self.is_subtype_at_depth(tb, ta, depth + 1)
                    }
                    Variance::Invariant => self.equal_types(ta, tb),
                }
            }
        })
    }
}
