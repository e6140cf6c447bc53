//! Declaration Tables
//!
//! Two tiers of memoized signatures:
//! - [`GlobalDeclarationTable`]: shared by a whole link. Pre-seeded with the
//!   built-ins, computes public signatures and reports every assignment to a
//!   [`SignatureClashTracker`].
//! - [`DeclarationTable`]: one per serialized module. Routes local
//!   declarations to file-local signatures and everything else to the global
//!   table.

use crate::hash::hash_mangle;
use crate::mangler::{IrMangler, Mangler};
use crate::signaturer::Signaturer;
use kirin_ir::{DeclId, DeclParent, IdSignature, IrArena};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

// =============================================================================
// Clash tracking
// =============================================================================

/// Observer of every public signature assignment.
pub trait SignatureClashTracker {
    fn commit(&mut self, arena: &IrArena, decl: DeclId, signature: &IdSignature);
}

#[derive(Debug, Default)]
pub struct NoopClashTracker;

impl SignatureClashTracker for NoopClashTracker {
    fn commit(&mut self, _arena: &IrArena, _decl: DeclId, _signature: &IdSignature) {}
}

/// Remembers the first owner of each signature and every later declaration
/// that claimed the same one.
#[derive(Debug, Default)]
pub struct RecordingClashTracker {
    owners: FxHashMap<IdSignature, DeclId>,
    clashes: Vec<(IdSignature, DeclId, DeclId)>,
}

impl RecordingClashTracker {
    /// `(signature, first owner, clashing declaration)`
    pub fn clashes(&self) -> &[(IdSignature, DeclId, DeclId)] {
        &self.clashes
    }
}

impl SignatureClashTracker for RecordingClashTracker {
    fn commit(&mut self, arena: &IrArena, decl: DeclId, signature: &IdSignature) {
        let first = *self.owners.entry(signature.clone()).or_insert(decl);
        if first != decl {
            debug!(
                signature = %signature.render(),
                first = %arena.render(first),
                second = %arena.render(decl),
                "signature clash"
            );
            self.clashes.push((signature.clone(), first, decl));
        }
    }
}

// =============================================================================
// GlobalDeclarationTable
// =============================================================================

pub struct GlobalDeclarationTable<M: Mangler = IrMangler> {
    signaturer: Signaturer<M>,
    table: FxHashMap<DeclId, IdSignature>,
    clash_tracker: Box<dyn SignatureClashTracker>,
}

impl GlobalDeclarationTable<IrMangler> {
    pub fn new(arena: &mut IrArena) -> Self {
        Self::with_mangler(arena, IrMangler, Box::new(NoopClashTracker))
    }
}

impl<M: Mangler> GlobalDeclarationTable<M> {
    pub fn with_mangler(
        arena: &mut IrArena,
        mangler: M,
        clash_tracker: Box<dyn SignatureClashTracker>,
    ) -> Self {
        let mut table = Self {
            signaturer: Signaturer::new(mangler, 0),
            table: FxHashMap::default(),
            clash_tracker,
        };
        table.load_known_builtins(arena);
        table
    }

    /// Built-in operators get `BuiltIn` signatures from their fixed mangle;
    /// built-in classes and already materialized function classes get their
    /// ordinary public signatures.
    fn load_known_builtins(&mut self, arena: &mut IrArena) {
        let operators = arena.builtins().operators().to_vec();
        for operator in operators {
            let signature = IdSignature::BuiltIn {
                id: hash_mangle(&operator.mangle),
                mangle: operator.mangle,
            };
            self.clash_tracker.commit(arena, operator.decl, &signature);
            let symbol = arena.decl(operator.decl).symbol;
            arena.symbols.set_signature(symbol, signature.clone());
            self.table.insert(operator.decl, signature);
        }

        let file = arena.builtins().file;
        let mut roots = arena.file(file).declarations.clone();
        roots.extend(arena.builtins().function_classes().map(|(_, class)| class));
        for root in roots {
            self.assign_signatures(arena, root);
        }
        debug!(count = self.table.len(), "loaded built-in signatures");
    }

    pub fn mangler(&self) -> &M {
        self.signaturer.mangler()
    }

    pub fn signaturer_mut(&mut self) -> &mut Signaturer<M> {
        &mut self.signaturer
    }

    pub fn is_exported(&self, arena: &IrArena, decl: DeclId) -> bool {
        self.signaturer.mangler().is_exported(arena, decl)
    }

    /// The public signature of an exported declaration, memoized.
    pub fn compute_signature(&mut self, arena: &IrArena, decl: DeclId) -> IdSignature {
        if let Some(signature) = self.table.get(&decl) {
            return signature.clone();
        }
        let signature = self.signaturer.compose_public_signature(arena, decl);
        trace!(decl = %arena.render(decl), signature = %signature.render(), "public signature");
        self.clash_tracker.commit(arena, decl, &signature);
        self.table.insert(decl, signature.clone());
        signature
    }

    /// Give `root` and everything nested in it a signature and register the
    /// public ones with the symbol table. When a public signature was
    /// already referenced through an unbound symbol, that symbol becomes the
    /// declaration's symbol and the declaration's previous symbol delegates
    /// to it.
    pub fn assign_signatures(&mut self, arena: &mut IrArena, root: DeclId) {
        for decl in arena.descendants(root) {
            let signature = if self.is_exported(arena, decl) {
                self.compute_signature(arena, decl)
            } else {
                self.local_signature(arena, decl)
            };

            let own = arena.decl(decl).symbol;
            match arena.symbols.lookup(&signature) {
                Some(existing) if existing != own && !arena.symbols.is_bound(existing) => {
                    trace!(decl = %arena.render(decl), "adopting referenced symbol");
                    arena.symbols.bind(existing, decl);
                    arena.symbols.set_delegate(own, existing);
                    arena.decl_mut(decl).symbol = existing;
                }
                _ => arena.symbols.set_signature(own, signature),
            }
        }
    }

    fn local_signature(&mut self, arena: &IrArena, decl: DeclId) -> IdSignature {
        if let Some(signature) = self.table.get(&decl) {
            return signature.clone();
        }
        let container = match arena.decl(decl).parent {
            DeclParent::File(file) => Signaturer::<M>::package_signature(arena, file),
            DeclParent::Decl(parent) if self.is_exported(arena, parent) => {
                self.compute_signature(arena, parent)
            }
            DeclParent::Decl(parent) => self.local_signature(arena, parent),
        };
        let signature = self
            .signaturer
            .compose_file_local_signature(arena, decl, container);
        self.table.insert(decl, signature.clone());
        signature
    }
}

// =============================================================================
// DeclarationTable
// =============================================================================

pub struct DeclarationTable<'g, M: Mangler = IrMangler> {
    global: &'g mut GlobalDeclarationTable<M>,
    table: FxHashMap<DeclId, IdSignature>,
}

impl<'g, M: Mangler> DeclarationTable<'g, M> {
    pub fn new(global: &'g mut GlobalDeclarationTable<M>) -> Self {
        Self {
            global,
            table: FxHashMap::default(),
        }
    }

    pub fn is_exported(&self, arena: &IrArena, decl: DeclId) -> bool {
        self.global.is_exported(arena, decl)
    }

    /// Idempotent: the same declaration always gets the same signature.
    pub fn signature_of(&mut self, arena: &IrArena, decl: DeclId) -> IdSignature {
        if self.is_exported(arena, decl) {
            return self.global.compute_signature(arena, decl);
        }
        if let Some(signature) = self.table.get(&decl) {
            return signature.clone();
        }
        let container = match arena.decl(decl).parent {
            DeclParent::File(file) => Signaturer::<M>::package_signature(arena, file),
            DeclParent::Decl(parent) => self.signature_of(arena, parent),
        };
        let signature = self
            .global
            .signaturer_mut()
            .compose_file_local_signature(arena, decl, container);
        self.table.insert(decl, signature.clone());
        signature
    }
}
