//! Deserialization strategies, linker options and reachability states.

use indexmap::IndexSet;
use kirin_common::FqName;
use kirin_ir::{IdSignature, SymbolId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Strategy
// =============================================================================

/// How much of a module is read, and when.
///
/// | Strategy | Bodies | Explicitly exported | Every top level |
/// |----------|--------|---------------------|-----------------|
/// | `OnlyReferenced` | yes | no | no |
/// | `All` | yes | yes | yes |
/// | `ExplicitlyExported` | yes | yes | no |
/// | `OnlyDeclarationHeaders` | no | no | no |
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeserializationStrategy {
    OnlyReferenced,
    All,
    #[default]
    ExplicitlyExported,
    OnlyDeclarationHeaders,
}

impl DeserializationStrategy {
    pub fn need_bodies(self) -> bool {
        !matches!(self, DeserializationStrategy::OnlyDeclarationHeaders)
    }

    pub fn explicitly_exported(self) -> bool {
        matches!(
            self,
            DeserializationStrategy::All | DeserializationStrategy::ExplicitlyExported
        )
    }

    pub fn the_whole_world(self) -> bool {
        matches!(self, DeserializationStrategy::All)
    }
}

// =============================================================================
// Options
// =============================================================================

pub const FORWARD_DECLARATIONS_MODULE: &str = "<forward declarations>";
pub const FORWARD_DECLARATIONS_FILE: &str = "forward declarations pseudo-file";

#[derive(Clone, Debug)]
pub struct LinkerOptions {
    /// Strategy for libraries not listed in `exported_dependencies`.
    pub dependency_strategy: DeserializationStrategy,
    /// Libraries read with [`DeserializationStrategy::All`].
    pub exported_dependencies: Vec<String>,
    /// Module that receives forward-declaration stubs.
    pub forward_declaration_module: String,
    /// Packages whose unowned classes are forward declarations rather than
    /// link errors.
    pub forward_declaration_packages: Vec<FqName>,
}

impl Default for LinkerOptions {
    fn default() -> Self {
        Self {
            dependency_strategy: DeserializationStrategy::default(),
            exported_dependencies: Vec::new(),
            forward_declaration_module: FORWARD_DECLARATIONS_MODULE.to_string(),
            forward_declaration_packages: Vec::new(),
        }
    }
}

impl LinkerOptions {
    pub fn strategy_for(&self, module: &str) -> DeserializationStrategy {
        if self.exported_dependencies.iter().any(|name| name == module) {
            DeserializationStrategy::All
        } else {
            self.dependency_strategy
        }
    }

    pub fn is_forward_declaration(&self, signature: &IdSignature) -> bool {
        let package = signature.package_fq_name();
        self.forward_declaration_packages.contains(&package)
    }
}

// =============================================================================
// States
// =============================================================================

/// Symbols created for one scope, plus the top levels of that scope that
/// were found reachable and still have to be read.
#[derive(Debug, Default)]
pub struct SimpleDeserializationState {
    symbols: FxHashMap<IdSignature, SymbolId>,
    reachable: IndexSet<IdSignature>,
}

impl SimpleDeserializationState {
    pub fn contains(&self, signature: &IdSignature) -> bool {
        self.symbols.contains_key(signature)
    }

    pub fn get(&self, signature: &IdSignature) -> Option<SymbolId> {
        self.symbols.get(signature).copied()
    }

    pub fn insert(&mut self, signature: IdSignature, symbol: SymbolId) {
        self.symbols.insert(signature, symbol);
    }

    pub fn enqueue(&mut self, signature: IdSignature) -> bool {
        self.reachable.insert(signature)
    }

    /// Oldest reachable top level not yet completed.
    pub fn next_pending(&self) -> Option<IdSignature> {
        self.reachable.first().cloned()
    }

    pub fn complete(&mut self, signature: &IdSignature) {
        self.reachable.shift_remove(signature);
    }

    pub fn has_pending(&self) -> bool {
        !self.reachable.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Public symbols of one module. Reachable top levels are queued in the file
/// that declares them; the module only tracks which files have work.
#[derive(Debug, Default)]
pub struct ModuleDeserializationState {
    symbols: FxHashMap<IdSignature, SymbolId>,
    pending_files: IndexSet<usize>,
}

impl ModuleDeserializationState {
    pub fn contains(&self, signature: &IdSignature) -> bool {
        self.symbols.contains_key(signature)
    }

    pub fn get(&self, signature: &IdSignature) -> Option<SymbolId> {
        self.symbols.get(signature).copied()
    }

    pub fn insert(&mut self, signature: IdSignature, symbol: SymbolId) {
        self.symbols.insert(signature, symbol);
    }

    pub fn enqueue_file(&mut self, file: usize) -> bool {
        self.pending_files.insert(file)
    }

    pub fn take_pending_file(&mut self) -> Option<usize> {
        self.pending_files.shift_remove_index(0)
    }
}
