//! Queries over overridden sets.

use crate::util::OverridingUtil;
use kirin_ir::{DeclData, DeclId, IrArena, Modality, SymbolId};
use rustc_hash::FxHashSet;

fn overridden_owners(arena: &IrArena, member: DeclId) -> Vec<DeclId> {
    arena
        .decl(member)
        .overridden()
        .iter()
        .filter_map(|&symbol| arena.owner(symbol))
        .collect()
}

fn is_real(arena: &IrArena, member: DeclId) -> bool {
    !arena.decl(member).is_fake_override()
}

/// Set the overridden symbols of a function or property. A property's
/// accessors get the matching accessors of the overridden properties.
pub fn set_overridden(arena: &mut IrArena, member: DeclId, overridden: Vec<SymbolId>) {
    let accessors = arena.decl(member).as_property().map(|p| (p.getter, p.setter));
    if let Some((getter, setter)) = accessors {
        let owners: Vec<DeclId> = overridden.iter().filter_map(|&s| arena.owner(s)).collect();
        let accessor_symbols = |select: fn(&kirin_ir::PropertyData) -> Option<DeclId>| -> Vec<SymbolId> {
            owners
                .iter()
                .filter_map(|&owner| arena.decl(owner).as_property().and_then(select))
                .map(|accessor| arena.decl(accessor).symbol)
                .collect()
        };
        let getters = accessor_symbols(|p| p.getter);
        let setters = accessor_symbols(|p| p.setter);
        for (accessor, symbols) in [(getter, getters), (setter, setters)] {
            if let Some(function) = accessor.and_then(|a| arena.decl_mut(a).as_function_mut()) {
                function.overridden = symbols;
            }
        }
    }

    match &mut arena.decl_mut(member).data {
        DeclData::Function(function) => function.overridden = overridden,
        DeclData::Property(property) => property.overridden = overridden,
        _ => panic!("Unexpected declaration for overridden symbols: {member:?}"),
    }
}

/// Every declaration `member` overrides, transitively. A real member
/// stands for itself.
///
/// # Panics
/// When a fake override has no overridden symbols.
pub fn overridden_declarations(arena: &IrArena, member: DeclId) -> Vec<DeclId> {
    let mut result = Vec::new();
    let mut seen = FxHashSet::default();
    collect_overridden_declarations(arena, member, &mut result, &mut seen);
    result
}

fn collect_overridden_declarations(
    arena: &IrArena,
    member: DeclId,
    result: &mut Vec<DeclId>,
    seen: &mut FxHashSet<DeclId>,
) {
    if is_real(arena, member) {
        if seen.insert(member) {
            result.push(member);
        }
        return;
    }
    let overridden = overridden_owners(arena, member);
    assert!(
        !overridden.is_empty(),
        "No overridden declarations found for fake override {}",
        arena.render(member)
    );
    for overridden in overridden {
        collect_overridden_declarations(arena, overridden, result, seen);
        if seen.insert(overridden) {
            result.push(overridden);
        }
    }
}

/// Whether `f` overrides `g`, directly or through fake overrides.
pub fn overrides(arena: &IrArena, f: DeclId, g: DeclId) -> bool {
    f != g && overridden_declarations(arena, f).contains(&g)
}

/// Drop every candidate that another candidate overrides.
pub fn filter_overrides(arena: &IrArena, candidates: &[DeclId]) -> Vec<DeclId> {
    if candidates.len() <= 1 {
        return candidates.to_vec();
    }
    let mut result: Vec<DeclId> = Vec::new();
    'outer: for &me in candidates {
        let mut i = 0;
        while i < result.len() {
            let other = result[i];
            if overrides(arena, me, other) {
                result.remove(i);
                continue;
            }
            if overrides(arena, other, me) {
                continue 'outer;
            }
            i += 1;
        }
        result.push(me);
    }
    assert!(!result.is_empty(), "All candidates filtered out");
    result
}

/// The real declarations a fake override ultimately stands for, without
/// those overridden by another member of the result.
pub fn collect_real_overrides(arena: &IrArena, member: DeclId) -> Vec<DeclId> {
    if is_real(arena, member) {
        return vec![member];
    }

    let mut visited = FxHashSet::default();
    let mut reals = Vec::new();
    let mut stack: Vec<DeclId> = overridden_owners(arena, member);
    stack.reverse();
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        if is_real(arena, current) {
            reals.push(current);
        } else {
            let mut next = overridden_owners(arena, current);
            next.reverse();
            stack.extend(next);
        }
    }

    let mut repeated = FxHashSet::default();
    let mut stack: Vec<DeclId> = reals.iter().flat_map(|&r| overridden_owners(arena, r)).collect();
    while let Some(current) = stack.pop() {
        if repeated.insert(current) {
            stack.extend(overridden_owners(arena, current));
        }
    }
    reals.retain(|r| !repeated.contains(r));
    reals
}

/// The implementation a call through `member` dispatches to: a non-abstract
/// real override, preferring one declared in a class over one declared in
/// an interface.
pub fn resolve_fake_override(arena: &IrArena, member: DeclId) -> Option<DeclId> {
    let util = OverridingUtil::new(arena);
    let concrete: Vec<DeclId> = collect_real_overrides(arena, member)
        .into_iter()
        .filter(|&real| arena.decl(real).modality() != Some(Modality::Abstract))
        .collect();
    let mut in_classes = concrete
        .iter()
        .copied()
        .filter(|&real| arena.parent_class(real).is_none_or(|class| !util.is_interface(class)));
    match (in_classes.next(), in_classes.next()) {
        (Some(only), None) => Some(only),
        _ => concrete.first().copied(),
    }
}
