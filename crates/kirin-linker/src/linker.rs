//! IR Linker
//!
//! Reads libraries into a [`LinkSession`] on demand. Loading a library only
//! indexes its top-level signatures; a declaration is read when something
//! already read refers to it (or the module's strategy asks for it
//! eagerly). Discovery is a work queue, not recursion:
//!
//! ```text
//! reference(sig) ─► top_level(sig) ─► owning module ─► file queue
//!                                                         │
//!   deserialize_all_reachable_top_levels ◄────────────────┘
//!        └─► read declaration ─► new references ─► ...
//! ```
//!
//! Symbols live in one of four states:
//!
//! | State | Holds | Lookup order |
//! |-------|-------|--------------|
//! | file-local | local signatures of the file being read | 1 |
//! | global | built-ins and function classes | 2 |
//! | module | public signatures a module (or a dependency) declares | 3 |
//! | forward | classes of forward-declaration packages | 4 |
//!
//! A public signature nobody owns is a [`LinkError::NoDeserializerFound`].

use crate::deserializer::DeclarationReader;
use crate::error::{LinkError, LinkResult};
use crate::library::IrLibrary;
use crate::proto::{self, actual};
use crate::reader::{read_signature, read_symbol_entry};
use crate::session::LinkSession;
use crate::state::{
    DeserializationStrategy, FORWARD_DECLARATIONS_FILE, LinkerOptions, ModuleDeserializationState,
    SimpleDeserializationState,
};
use indexmap::{IndexMap, IndexSet};
use kirin_common::FqName;
use kirin_ir::{
    ClassData, ClassKind, DeclData, DeclId, DeclOrigin, DeclParent, Declaration, FileId,
    FunctionClassKind, IdSignature, ImportDirective, IrType, Modality, ModuleId, SymbolId,
    SymbolKind,
};
use kirin_mangle::Mangler;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{Level, debug, span, trace};

// =============================================================================
// Per-module and per-file state
// =============================================================================

/// Position of a file among the loaded libraries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FileRef {
    pub module: usize,
    pub file: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StateRef {
    Local(FileRef),
    Global,
    Module(usize),
    Forward,
}

pub(crate) struct FileDeserializer {
    pub file: FileId,
    /// Top-level signature -> index in the file's declaration table.
    reversed_signature_index: FxHashMap<IdSignature, u32>,
    pub state: SimpleDeserializationState,
    deserialized: FxHashSet<IdSignature>,
    header_loaded: bool,
    pub signature_cache: FxHashMap<u32, IdSignature>,
    pub type_cache: FxHashMap<u32, IrType>,
}

impl FileDeserializer {
    fn new(file: FileId) -> Self {
        Self {
            file,
            reversed_signature_index: FxHashMap::default(),
            state: SimpleDeserializationState::default(),
            deserialized: FxHashSet::default(),
            header_loaded: false,
            signature_cache: FxHashMap::default(),
            type_cache: FxHashMap::default(),
        }
    }
}

pub(crate) struct ModuleDeserializer {
    name: String,
    module: ModuleId,
    library: Arc<IrLibrary>,
    strategy: DeserializationStrategy,
    dependencies: Vec<usize>,
    pub files: Vec<FileDeserializer>,
    /// Top-level signature -> file declaring it.
    reversed_file_index: FxHashMap<IdSignature, usize>,
    state: ModuleDeserializationState,
}

/// Counters reported after a link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub modules: usize,
    pub top_levels: usize,
    pub bodies: usize,
    pub delegated_expects: usize,
    pub forward_declarations: usize,
}

// =============================================================================
// IrLinker
// =============================================================================

pub struct IrLinker {
    options: LinkerOptions,
    pub(crate) modules: Vec<ModuleDeserializer>,
    global: SimpleDeserializationState,
    forward: SimpleDeserializationState,
    modules_with_reachable: IndexSet<usize>,
    forward_declarations: IndexSet<SymbolId>,
    expect_symbols: IndexMap<IdSignature, SymbolId>,
    expect_to_actual: FxHashMap<IdSignature, IdSignature>,
    top_level_actual_to_module: FxHashMap<IdSignature, usize>,
    pub(crate) stats: LinkStats,
}

impl IrLinker {
    /// A linker over `session`. Built-ins are already present in the
    /// session's arena and are seeded into the global state.
    pub fn new<M: Mangler>(session: &LinkSession<M>, options: LinkerOptions) -> Self {
        let arena = &session.arena;
        let mut global = SimpleDeserializationState::default();
        for &file in &arena.module(arena.builtins().module).files {
            for &decl in &arena.file(file).declarations {
                let symbol = arena.decl(decl).symbol;
                match arena.symbols.signature(symbol) {
                    Some(signature) if signature.is_public() => {
                        global.insert(signature.clone(), symbol);
                    }
                    _ => {}
                }
            }
        }
        debug!(count = global.len(), "seeded global deserialization state");

        Self {
            options,
            modules: Vec::new(),
            global,
            forward: SimpleDeserializationState::default(),
            modules_with_reachable: IndexSet::new(),
            forward_declarations: IndexSet::new(),
            expect_symbols: IndexMap::new(),
            expect_to_actual: FxHashMap::default(),
            top_level_actual_to_module: FxHashMap::default(),
            stats: LinkStats::default(),
        }
    }

    pub fn options(&self) -> &LinkerOptions {
        &self.options
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Arena modules created for the loaded libraries, in load order.
    pub fn loaded_modules(&self) -> impl Iterator<Item = (&str, ModuleId)> {
        self.modules.iter().map(|m| (m.name.as_str(), m.module))
    }

    pub(crate) fn file_state(&self, at: FileRef) -> &FileDeserializer {
        &self.modules[at.module].files[at.file]
    }

    pub(crate) fn file_state_mut(&mut self, at: FileRef) -> &mut FileDeserializer {
        &mut self.modules[at.module].files[at.file]
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load a library with the strategy [`LinkerOptions::strategy_for`] picks.
    pub fn load_library<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        library: IrLibrary,
    ) -> LinkResult<ModuleId> {
        let strategy = self.options.strategy_for(&library.name);
        self.load_library_with_strategy(session, library, strategy)
    }

    /// Index the library's top levels and create its module and files in
    /// the arena. Nothing is deserialized yet; eager strategies only enqueue.
    /// Dependencies must be loaded first.
    pub fn load_library_with_strategy<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        library: IrLibrary,
        strategy: DeserializationStrategy,
    ) -> LinkResult<ModuleId> {
        let _span = span!(Level::INFO, "load_library", module = %library.name).entered();
        if session.arena.module_by_name(&library.name).is_some() {
            return Err(LinkError::DuplicateModule {
                module: library.name,
            });
        }

        let mut dependencies = Vec::with_capacity(library.dependencies.len());
        for dependency in &library.dependencies {
            let index = self
                .modules
                .iter()
                .position(|m| &m.name == dependency)
                .ok_or_else(|| LinkError::MissingDependency {
                    module: library.name.clone(),
                    dependency: dependency.clone(),
                })?;
            dependencies.push(index);
        }
        let dependency_ids = dependencies.iter().map(|&i| self.modules[i].module).collect();
        let module = session.arena.add_module(library.name.clone(), dependency_ids);

        let mut files = Vec::with_capacity(library.files.len());
        let mut reversed_file_index = FxHashMap::default();
        for (index, file) in library.files.iter().enumerate() {
            let id = session
                .arena
                .add_file(module, file.name.clone(), FqName::new(file.package.as_str()));
            let mut state = FileDeserializer::new(id);
            for (position, &signature) in file.declaration_ids.iter().enumerate() {
                let signature = read_signature(file, signature, &mut state.signature_cache)?;
                state
                    .reversed_signature_index
                    .insert(signature.clone(), position as u32);
                reversed_file_index.insert(signature, index);
            }
            files.push(state);
        }

        let library = Arc::new(library);
        let position = self.modules.len();
        self.modules.push(ModuleDeserializer {
            name: library.name.clone(),
            module,
            library: Arc::clone(&library),
            strategy,
            dependencies,
            files,
            reversed_file_index,
            state: ModuleDeserializationState::default(),
        });
        self.stats.modules += 1;

        for (index, file) in library.files.iter().enumerate() {
            let at = FileRef {
                module: position,
                file: index,
            };
            if strategy.the_whole_world() {
                let signatures: Vec<IdSignature> = self
                    .file_state(at)
                    .reversed_signature_index
                    .keys()
                    .cloned()
                    .collect();
                for signature in signatures {
                    self.enqueue_in_file(at, &signature);
                }
            }
            if strategy.explicitly_exported() {
                for &exported in &file.explicitly_exported {
                    let signature =
                        read_signature(file, exported, &mut self.file_state_mut(at).signature_cache)?;
                    self.enqueue_in_file(at, &signature.top_level());
                }
            }
        }
        debug!(
            files = library.files.len(),
            top_levels = library.top_level_count(),
            ?strategy,
            "library loaded"
        );
        Ok(module)
    }

    // =========================================================================
    // Symbol states
    // =========================================================================

    /// The module declaring top level `signature`: `from` first, then its
    /// dependencies breadth-first. Without `from`, every loaded module in
    /// load order.
    fn module_owning(&self, from: Option<usize>, signature: &IdSignature) -> Option<usize> {
        let Some(start) = from else {
            return self
                .modules
                .iter()
                .position(|m| m.reversed_file_index.contains_key(signature));
        };
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([start]);
        while let Some(index) = queue.pop_front() {
            if !visited.insert(index) {
                continue;
            }
            let module = &self.modules[index];
            if module.reversed_file_index.contains_key(signature) {
                return Some(index);
            }
            queue.extend(module.dependencies.iter().copied());
        }
        None
    }

    fn state_for(&self, at: Option<FileRef>, signature: &IdSignature) -> LinkResult<StateRef> {
        if signature.is_local() {
            return at.map(StateRef::Local).ok_or_else(|| not_found(signature));
        }
        if self.global.contains(signature)
            || signature.is_built_in()
            || special_function_class(signature).is_some()
        {
            return Ok(StateRef::Global);
        }
        if let Some(module) = self.module_owning(at.map(|at| at.module), signature) {
            return Ok(StateRef::Module(module));
        }
        if self.options.is_forward_declaration(signature) {
            return Ok(StateRef::Forward);
        }
        Err(not_found(signature))
    }

    fn state_contains(&self, state: StateRef, signature: &IdSignature) -> bool {
        match state {
            StateRef::Local(at) => self.file_state(at).state.contains(signature),
            StateRef::Global => self.global.contains(signature),
            StateRef::Module(module) => self.modules[module].state.contains(signature),
            StateRef::Forward => self.forward.contains(signature),
        }
    }

    fn state_get(&self, state: StateRef, signature: &IdSignature) -> Option<SymbolId> {
        match state {
            StateRef::Local(at) => self.file_state(at).state.get(signature),
            StateRef::Global => self.global.get(signature),
            StateRef::Module(module) => self.modules[module].state.get(signature),
            StateRef::Forward => self.forward.get(signature),
        }
    }

    fn state_insert(&mut self, state: StateRef, signature: IdSignature, symbol: SymbolId) {
        match state {
            StateRef::Local(at) => self.file_state_mut(at).state.insert(signature, symbol),
            StateRef::Global => self.global.insert(signature, symbol),
            StateRef::Module(module) => self.modules[module].state.insert(signature, symbol),
            StateRef::Forward => self.forward.insert(signature, symbol),
        }
    }

    /// Mark top level `signature` reachable in `state`. Global and forward
    /// states are never drained: their declarations come from elsewhere.
    fn add_to_state(&mut self, state: StateRef, signature: &IdSignature) -> LinkResult<()> {
        match state {
            StateRef::Local(at) => {
                self.enqueue_in_file(at, signature);
            }
            StateRef::Module(module) => {
                self.add_to_module(module, signature)?;
            }
            StateRef::Global => {
                self.global.enqueue(signature.clone());
            }
            StateRef::Forward => {
                self.forward.enqueue(signature.clone());
            }
        }
        Ok(())
    }

    /// Queue top level `signature` in the file of `module` declaring it.
    /// Returns whether it was newly queued.
    fn add_to_module(&mut self, module: usize, signature: &IdSignature) -> LinkResult<bool> {
        let deserializer = &self.modules[module];
        let Some(&file) = deserializer.reversed_file_index.get(signature) else {
            return Err(LinkError::NoFileForSignature {
                signature: signature.render(),
                module: deserializer.name.clone(),
            });
        };
        Ok(self.enqueue_in_file(FileRef { module, file }, signature))
    }

    fn enqueue_in_file(&mut self, at: FileRef, signature: &IdSignature) -> bool {
        let file = self.file_state_mut(at);
        if file.deserialized.contains(signature) {
            return false;
        }
        let queued = file.state.enqueue(signature.clone());
        self.modules[at.module].state.enqueue_file(at.file);
        self.modules_with_reachable.insert(at.module);
        queued
    }

    /// The symbol for `signature` as seen from file `at`, created unbound on
    /// first reference. The top level containing it becomes reachable.
    pub(crate) fn reference_signature<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        at: Option<FileRef>,
        kind: SymbolKind,
        signature: IdSignature,
    ) -> LinkResult<SymbolId> {
        let top = signature.top_level();
        let top_state = self.state_for(at, &top)?;
        if !self.state_contains(top_state, &top) {
            self.add_to_state(top_state, &top)?;
        }
        let state = if top.is_local() != signature.is_local() {
            self.state_for(at, &signature)?
        } else {
            top_state
        };
        if let Some(symbol) = self.state_get(state, &signature) {
            return Ok(symbol);
        }

        if let Some((class_kind, arity)) = special_function_class(&top) {
            materialize_function_class(session, class_kind, arity);
        }
        let symbol = session.arena.symbols.reference(kind, signature.clone());
        trace!(signature = %signature, ?state, "referenced");
        self.state_insert(state, signature.clone(), symbol);

        if state == StateRef::Forward && kind == SymbolKind::Class {
            self.forward_declarations.insert(symbol);
        }
        if signature.is_expect() {
            if let Some(actual) = self.expect_to_actual.get(&signature).cloned() {
                self.enqueue_actual(&actual)?;
            }
            self.expect_symbols.insert(signature, symbol);
        }
        Ok(symbol)
    }

    // =========================================================================
    // Draining
    // =========================================================================

    /// Read every reachable top level, including the ones discovered while
    /// reading. Modules are visited in the order they became reachable, and
    /// files and top levels within a module likewise.
    pub fn deserialize_all_reachable_top_levels<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
    ) -> LinkResult<()> {
        while let Some(module) = self.modules_with_reachable.shift_remove_index(0) {
            let _span =
                span!(Level::DEBUG, "deserialize_module", module = %self.modules[module].name)
                    .entered();
            while let Some(file) = self.modules[module].state.take_pending_file() {
                let at = FileRef { module, file };
                self.load_file_header(session, at)?;
                while let Some(signature) = self.file_state(at).state.next_pending() {
                    if !self.file_state(at).deserialized.contains(&signature) {
                        self.deserialize_top_level(session, at, &signature)?;
                    }
                    self.file_state_mut(at).state.complete(&signature);
                }
            }
        }
        Ok(())
    }

    /// Annotations and imports of a file, read the first time the file is
    /// touched.
    fn load_file_header<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        at: FileRef,
    ) -> LinkResult<()> {
        if self.file_state(at).header_loaded {
            return Ok(());
        }
        self.file_state_mut(at).header_loaded = true;
        let library = Arc::clone(&self.modules[at.module].library);
        let file = &library.files[at.file];

        let mut annotations = Vec::with_capacity(file.annotations.len());
        for &annotation in &file.annotations {
            annotations.push(FqName::new(file.string(annotation)?));
        }
        let mut imports = Vec::with_capacity(file.imports.len());
        for raw in &file.imports {
            let message = proto::IMPORT.decode(raw)?;
            let alias = match message.opt_index(proto::import::ALIAS)? {
                Some(alias) => Some(file.string(alias)?.to_string()),
                None => None,
            };
            imports.push(ImportDirective {
                fq_name: FqName::new(file.string(message.index(proto::import::FQ_NAME)?)?),
                all_under: message.bool(proto::import::ALL_UNDER),
                alias,
            });
        }

        let data = session.arena.file_mut(self.file_state(at).file);
        data.annotations = annotations;
        data.imports = imports;
        Ok(())
    }

    fn deserialize_top_level<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        at: FileRef,
        signature: &IdSignature,
    ) -> LinkResult<DeclId> {
        let library = Arc::clone(&self.modules[at.module].library);
        let file = &library.files[at.file];
        let Some(&index) = self.file_state(at).reversed_signature_index.get(signature) else {
            return Err(LinkError::MissingTopLevel {
                signature: signature.render(),
                file: file.name.clone(),
            });
        };
        self.file_state_mut(at).deserialized.insert(signature.clone());

        let message = proto::DECLARATION.decode(file.declaration(index)?)?;
        let reader = DeclarationReader {
            file,
            at,
            need_bodies: self.modules[at.module].strategy.need_bodies(),
        };
        let parent = DeclParent::File(self.file_state(at).file);
        let decl = self.read_declaration(session, &reader, &message, parent)?;
        session.arena.attach(decl);
        self.stats.top_levels += 1;
        trace!(signature = %signature, file = %file.name, "deserialized top level");
        Ok(decl)
    }

    // =========================================================================
    // Demand-driven lookup
    // =========================================================================

    /// The declaration of `symbol`, reading it if needed.
    ///
    /// Returns `None` for symbols without a public signature and for expects
    /// that no loaded module declares.
    ///
    /// # Panics
    /// When the owning module was found but reading it did not bind the
    /// symbol.
    pub fn get_declaration<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        symbol: SymbolId,
    ) -> LinkResult<Option<DeclId>> {
        if !session.arena.symbols.is_public_api(symbol) {
            return Ok(None);
        }
        if !session.arena.symbols.is_bound(symbol) {
            let Some(signature) = session.arena.symbols.signature(symbol).cloned() else {
                return Ok(None);
            };
            self.find_deserialized_declaration(session, &signature)?;
            if !session.arena.symbols.is_bound(symbol) {
                if signature.is_expect() {
                    return Ok(None);
                }
                panic!(
                    "Symbol for {} is still unbound after its module was read",
                    signature.render()
                );
            }
        }
        Ok(session.arena.owner(symbol))
    }

    fn find_deserialized_declaration<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        signature: &IdSignature,
    ) -> LinkResult<()> {
        let top = signature.top_level();
        if let Some((kind, arity)) = special_function_class(&top) {
            materialize_function_class(session, kind, arity);
            return Ok(());
        }
        match self.module_owning(None, &top) {
            Some(module) => {
                self.add_to_module(module, &top)?;
                self.deserialize_all_reachable_top_levels(session)
            }
            None if signature.is_expect() => Ok(()),
            None => Err(not_found(signature)),
        }
    }

    // =========================================================================
    // Expect / actual
    // =========================================================================

    /// Record every `expect -> actual` pair of the loaded libraries. Actuals
    /// whose expect was already referenced are queued right away.
    pub fn init_expect_actual_linker(&mut self) -> LinkResult<()> {
        for module in 0..self.modules.len() {
            let library = Arc::clone(&self.modules[module].library);
            for (index, file) in library.files.iter().enumerate() {
                let at = FileRef {
                    module,
                    file: index,
                };
                for raw in &file.actuals {
                    let message = proto::ACTUAL.decode(raw)?;
                    let expect = self.entry_signature(at, message.index(actual::EXPECT)?)?;
                    let actual = self.entry_signature(at, message.index(actual::ACTUAL)?)?;
                    match self.expect_to_actual.get(&expect) {
                        Some(existing) if *existing != actual => {
                            return Err(LinkError::ConflictingActual {
                                expect: expect.render(),
                                existing: existing.render(),
                                actual: actual.render(),
                            });
                        }
                        _ => {}
                    }
                    self.expect_to_actual.insert(expect.clone(), actual.clone());

                    let top = actual.top_level();
                    if let Some(owner) = self.module_owning(Some(module), &top) {
                        self.top_level_actual_to_module.insert(top, owner);
                    }
                    if self.expect_symbols.contains_key(&expect) {
                        self.enqueue_actual(&actual)?;
                    }
                }
            }
        }
        debug!(pairs = self.expect_to_actual.len(), "expect/actual pairs recorded");
        Ok(())
    }

    fn entry_signature(&mut self, at: FileRef, symbol: u32) -> LinkResult<IdSignature> {
        let library = Arc::clone(&self.modules[at.module].library);
        let file = &library.files[at.file];
        let (_, signature) = read_symbol_entry(file, symbol)?;
        Ok(read_signature(
            file,
            signature,
            &mut self.file_state_mut(at).signature_cache,
        )?)
    }

    fn enqueue_actual(&mut self, actual: &IdSignature) -> LinkResult<bool> {
        let top = actual.top_level();
        match self.top_level_actual_to_module.get(&top) {
            Some(&module) => self.add_to_module(module, &top),
            None => Ok(false),
        }
    }

    /// Read every actual whose expect was referenced, then make each such
    /// expect symbol delegate to its actual.
    pub fn finalize_expect_actual_linker<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
    ) -> LinkResult<()> {
        let _span = span!(Level::DEBUG, "finalize_expect_actual").entered();
        // Actual bodies may reference further expects; repeat until stable.
        loop {
            let mut forced = false;
            let expects: Vec<IdSignature> = self.expect_symbols.keys().cloned().collect();
            for expect in expects {
                let Some(actual) = self.expect_to_actual.get(&expect).cloned() else {
                    continue;
                };
                let bound = session
                    .arena
                    .symbols
                    .lookup(&actual)
                    .is_some_and(|symbol| session.arena.symbols.is_bound(symbol));
                if !bound {
                    forced |= self.enqueue_actual(&actual)?;
                }
            }
            if !forced {
                break;
            }
            self.deserialize_all_reachable_top_levels(session)?;
        }

        let expects: Vec<(IdSignature, SymbolId)> = self
            .expect_symbols
            .iter()
            .map(|(signature, &symbol)| (signature.clone(), symbol))
            .collect();
        for (expect, expect_symbol) in expects {
            let Some(actual) = self.expect_to_actual.get(&expect) else {
                continue;
            };
            let Some(actual_symbol) = session.arena.symbols.lookup(actual) else {
                continue;
            };
            let kind = session.arena.symbols.kind(expect_symbol);
            let allowed = matches!(
                kind,
                SymbolKind::Class
                    | SymbolKind::EnumEntry
                    | SymbolKind::Function
                    | SymbolKind::Constructor
                    | SymbolKind::Property
            );
            if !allowed || session.arena.symbols.kind(actual_symbol) != kind {
                return Err(LinkError::UnexpectedExpectSymbol {
                    signature: expect.render(),
                    kind: format!("{kind:?}"),
                });
            }
            session.arena.symbols.set_delegate(expect_symbol, actual_symbol);
            self.stats.delegated_expects += 1;
        }
        Ok(())
    }

    // =========================================================================
    // Forward declarations
    // =========================================================================

    /// Declare an empty class for every forward-declared symbol nothing else
    /// bound. Stubs go to one pseudo-file per package in the forward
    /// declaration module. Returns the number of stubs.
    pub fn declare_forward_declarations<M: Mangler>(&mut self, session: &mut LinkSession<M>) -> usize {
        let unbound: Vec<SymbolId> = self
            .forward_declarations
            .iter()
            .copied()
            .filter(|&symbol| !session.arena.symbols.is_bound(symbol))
            .collect();
        if unbound.is_empty() {
            return 0;
        }

        let arena = &mut session.arena;
        let name = &self.options.forward_declaration_module;
        let module = match arena.module_by_name(name) {
            Some(module) => module,
            None => arena.add_module(name.clone(), Vec::new()),
        };

        let mut by_package: IndexMap<FqName, Vec<(SymbolId, String)>> = IndexMap::new();
        for symbol in unbound {
            let Some(signature) = arena.symbols.signature(symbol) else {
                continue;
            };
            let Some(public) = signature.as_public() else {
                continue;
            };
            by_package
                .entry(public.package_fq_name.clone())
                .or_default()
                .push((symbol, public.short_name().to_string()));
        }

        let mut count = 0;
        for (package, classes) in by_package {
            let file = arena.add_file(module, FORWARD_DECLARATIONS_FILE, package);
            for (symbol, class_name) in classes {
                let name = arena.intern(&class_name);
                let mut declaration = Declaration::new(
                    name,
                    DeclParent::File(file),
                    symbol,
                    DeclData::Class(ClassData {
                        kind: ClassKind::Class,
                        modality: Modality::Final,
                        type_parameters: Vec::new(),
                        super_types: Vec::new(),
                        members: Vec::new(),
                    }),
                );
                declaration.origin = DeclOrigin::ForwardDeclaration;
                let decl = arena.add_declaration(declaration);
                arena.attach(decl);
                count += 1;
            }
        }
        self.stats.forward_declarations += count;
        debug!(count, "declared forward declarations");
        count
    }

    // =========================================================================
    // Whole link
    // =========================================================================

    /// Read everything reachable from the loaded libraries, finish
    /// expect/actual linking and declare forward declarations.
    ///
    /// Fake overrides are not part of libraries; references to them stay
    /// unbound until the fake-override builder runs on the linked modules.
    pub fn link<M: Mangler>(&mut self, session: &mut LinkSession<M>) -> LinkResult<LinkStats> {
        let _span = span!(Level::INFO, "link", modules = self.modules.len()).entered();
        self.init_expect_actual_linker()?;
        self.deserialize_all_reachable_top_levels(session)?;
        self.finalize_expect_actual_linker(session)?;
        self.declare_forward_declarations(session);
        debug!(
            top_levels = self.stats.top_levels,
            bodies = self.stats.bodies,
            expects = self.stats.delegated_expects,
            "link finished"
        );
        Ok(self.stats.clone())
    }

    /// Public signatures referenced but not bound to any declaration.
    pub fn unbound_public_symbols<M: Mangler>(&self, session: &LinkSession<M>) -> Vec<IdSignature> {
        let symbols = &session.arena.symbols;
        let mut unbound: Vec<IdSignature> = symbols
            .public_symbols()
            .filter(|&(_, symbol)| !symbols.is_bound(symbol))
            .map(|(signature, _)| signature.clone())
            .collect();
        unbound.sort_by_key(IdSignature::render);
        unbound
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn not_found(signature: &IdSignature) -> LinkError {
    LinkError::NoDeserializerFound {
        signature: signature.render(),
    }
}

/// `kotlin.FunctionN` and friends: created by the built-ins on request
/// rather than read from a library.
fn special_function_class(signature: &IdSignature) -> Option<(FunctionClassKind, u32)> {
    let IdSignature::Public(public) = signature.top_level() else {
        return None;
    };
    FunctionClassKind::parse(
        public.package_fq_name.as_str(),
        public.declaration_fq_name.as_str(),
    )
}

fn materialize_function_class<M: Mangler>(
    session: &mut LinkSession<M>,
    kind: FunctionClassKind,
    arity: u32,
) {
    let exists = session
        .arena
        .builtins()
        .function_classes()
        .any(|(key, _)| key == (kind, arity));
    if exists {
        return;
    }
    let class = session.arena.function_class(kind, arity);
    session.table.assign_signatures(&mut session.arena, class);
}
