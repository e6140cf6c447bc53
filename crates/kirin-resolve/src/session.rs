//! Supertype Computation Session
//!
//! Per-pass memo table: one status per class-like declaration plus the lazily
//! built scopes the resolver reuses. A fresh session is created for every
//! resolution run and is never shared between runs.
//!
//! Status transitions are strictly `NotComputed -> Computing -> Computed`;
//! anything else is a broken memoization contract and panics.

use crate::scope::CompositeScope;
use kirin_ir::{DeclId, FileId, TypeRef};
use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::trace;

#[derive(Clone, Debug, PartialEq)]
pub enum SupertypeComputationStatus {
    NotComputed,
    Computing,
    Computed(Rc<[TypeRef]>),
}

/// Identity of a memoized scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Import scopes of a file.
    File(FileId),
    /// Classifier scope visible to classes nested in the given class.
    NestedClasses(DeclId),
}

#[derive(Debug, Default)]
pub struct SupertypeComputationSession {
    statuses: FxHashMap<DeclId, SupertypeComputationStatus>,
    scopes: FxHashMap<ScopeKey, CompositeScope>,
}

impl SupertypeComputationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, decl: DeclId) -> SupertypeComputationStatus {
        self.statuses
            .get(&decl)
            .cloned()
            .unwrap_or(SupertypeComputationStatus::NotComputed)
    }

    pub fn is_computing(&self, decl: DeclId) -> bool {
        matches!(self.statuses.get(&decl), Some(SupertypeComputationStatus::Computing))
    }

    /// # Panics
    /// When `decl` has already been started.
    pub fn start_computing(&mut self, decl: DeclId) {
        let previous = self.statuses.insert(decl, SupertypeComputationStatus::Computing);
        if let Some(status) = previous {
            panic!("Unexpected supertype computation status for {decl:?}: {status:?}");
        }
    }

    /// # Panics
    /// When `decl` is not currently being computed.
    pub fn store(&mut self, decl: DeclId, super_types: Vec<TypeRef>) -> Rc<[TypeRef]> {
        let refs: Rc<[TypeRef]> = super_types.into();
        match self.statuses.get_mut(&decl) {
            Some(status @ SupertypeComputationStatus::Computing) => {
                *status = SupertypeComputationStatus::Computed(refs.clone());
            }
            other => panic!(
                "Unexpected supertype computation status for {decl:?}: {other:?}, expected Computing"
            ),
        }
        refs
    }

    pub fn scope(&self, key: ScopeKey) -> Option<CompositeScope> {
        self.scopes.get(&key).cloned()
    }

    /// The scope cached under `key`, building it on first access.
    pub fn get_or_create_scope(
        &mut self,
        key: ScopeKey,
        builder: impl FnOnce(&mut Self) -> CompositeScope,
    ) -> CompositeScope {
        if let Some(scope) = self.scopes.get(&key) {
            return scope.clone();
        }
        trace!(?key, "building scope");
        let scope = builder(self);
        self.scopes.entry(key).or_insert(scope).clone()
    }

    /// Every declaration that reached `Computed`, in declaration order.
    pub fn computed(&self) -> Vec<(DeclId, Rc<[TypeRef]>)> {
        let mut out: Vec<_> = self
            .statuses
            .iter()
            .filter_map(|(&decl, status)| match status {
                SupertypeComputationStatus::Computed(refs) => Some((decl, refs.clone())),
                _ => None,
            })
            .collect();
        out.sort_by_key(|(decl, _)| *decl);
        out
    }

    /// Declarations left in `Computing`; empty after a completed pass.
    pub fn in_progress(&self) -> Vec<DeclId> {
        let mut out: Vec<_> = self
            .statuses
            .iter()
            .filter(|(_, status)| matches!(status, SupertypeComputationStatus::Computing))
            .map(|(&decl, _)| decl)
            .collect();
        out.sort();
        out
    }
}
