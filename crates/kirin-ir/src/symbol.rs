//! Symbols.
//!
//! A symbol is the referenceable handle of a declaration. It can exist before
//! its declaration does: the linker references a symbol by signature as soon
//! as some deserialized body mentions it, and binds it later once the owning
//! top level has been read.
//!
//! A symbol may also *delegate* to another symbol. Expect symbols are
//! retargeted to their actuals this way, and fake overrides are redelegated to
//! the symbol registered under their signature, without rewriting any use
//! site that already holds the original handle.

use crate::ids::{DeclId, SymbolId};
use crate::signature::IdSignature;
use rustc_hash::FxHashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    TypeAlias,
    Function,
    Constructor,
    Property,
    Field,
    EnumEntry,
    ValueParameter,
    TypeParameter,
    Variable,
}

#[derive(Clone, Debug)]
pub struct SymbolData {
    pub kind: SymbolKind,
    pub signature: Option<IdSignature>,
    owner: Option<DeclId>,
    delegate: Option<SymbolId>,
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolData>,
    /// Public signature -> the symbol registered for it.
    by_signature: FxHashMap<IdSignature, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh symbol without a signature.
    pub fn declare(&mut self, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolData {
            kind,
            signature: None,
            owner: None,
            delegate: None,
        });
        id
    }

    /// The symbol for `signature`, creating an unbound one on first use.
    /// File-local signatures are not shared and always get a fresh symbol.
    pub fn reference(&mut self, kind: SymbolKind, signature: IdSignature) -> SymbolId {
        if signature.is_public() {
            if let Some(&existing) = self.by_signature.get(&signature) {
                return existing;
            }
        }
        let id = self.declare(kind);
        self.set_signature(id, signature);
        id
    }

    pub fn lookup(&self, signature: &IdSignature) -> Option<SymbolId> {
        self.by_signature.get(signature).copied()
    }

    /// Attach a signature to a symbol. A public signature is registered for
    /// lookup unless another symbol already holds it.
    pub fn set_signature(&mut self, symbol: SymbolId, signature: IdSignature) {
        if signature.is_public() {
            self.by_signature.entry(signature.clone()).or_insert(symbol);
        }
        self.symbols[symbol.index()].signature = Some(signature);
    }

    pub fn data(&self, symbol: SymbolId) -> &SymbolData {
        &self.symbols[symbol.index()]
    }

    pub fn kind(&self, symbol: SymbolId) -> SymbolKind {
        self.data(symbol).kind
    }

    /// Follow the delegation chain to the symbol that actually gets bound.
    pub fn resolve(&self, symbol: SymbolId) -> SymbolId {
        let mut current = symbol;
        while let Some(next) = self.symbols[current.index()].delegate {
            current = next;
        }
        current
    }

    pub fn delegate(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.data(symbol).delegate
    }

    /// Retarget `symbol` to `target`. Binding and owner queries on `symbol`
    /// are forwarded from now on.
    pub fn set_delegate(&mut self, symbol: SymbolId, target: SymbolId) {
        if symbol == target {
            return;
        }
        assert!(
            self.resolve(target) != symbol,
            "Delegation cycle between symbols {symbol:?} and {target:?}"
        );
        self.symbols[symbol.index()].delegate = Some(target);
    }

    /// The signature of `symbol`, or of its delegate when it has none.
    pub fn signature(&self, symbol: SymbolId) -> Option<&IdSignature> {
        let data = self.data(symbol);
        match (&data.signature, data.delegate) {
            (Some(signature), _) => Some(signature),
            (None, Some(delegate)) => self.signature(delegate),
            (None, None) => None,
        }
    }

    pub fn is_public_api(&self, symbol: SymbolId) -> bool {
        self.signature(symbol).is_some_and(IdSignature::is_public)
    }

    pub fn owner(&self, symbol: SymbolId) -> Option<DeclId> {
        self.symbols[self.resolve(symbol).index()].owner
    }

    pub fn is_bound(&self, symbol: SymbolId) -> bool {
        self.owner(symbol).is_some()
    }

    /// Bind the end of `symbol`'s delegation chain to `decl`.
    ///
    /// # Panics
    /// When the symbol is already bound to a different declaration.
    pub fn bind(&mut self, symbol: SymbolId, decl: DeclId) {
        let target = self.resolve(symbol);
        let data = &mut self.symbols[target.index()];
        if let Some(existing) = data.owner {
            assert!(
                existing == decl,
                "Symbol {:?} ({}) is already bound to {:?}, cannot rebind to {:?}",
                target,
                data.signature
                    .as_ref()
                    .map(IdSignature::render)
                    .unwrap_or_default(),
                existing,
                decl
            );
            return;
        }
        data.owner = Some(decl);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbols registered under a public signature.
    pub fn public_symbols(&self) -> impl Iterator<Item = (&IdSignature, SymbolId)> {
        self.by_signature.iter().map(|(sig, &id)| (sig, id))
    }

    /// Symbols that were referenced but never bound.
    pub fn unbound_symbols(&self) -> Vec<SymbolId> {
        (0..self.symbols.len() as u32)
            .map(SymbolId)
            .filter(|&id| !self.is_bound(id))
            .collect()
    }
}
