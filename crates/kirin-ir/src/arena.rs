//! The IR arena.
//!
//! `IrArena` owns every declaration, file, module and symbol of one
//! compilation. Declarations are never removed; passes only append (new fake
//! overrides, deserialized top levels, forward-declaration stubs) or mutate in
//! place (resolved supertypes, overridden sets).

use crate::builtins::IrBuiltIns;
use crate::decl::{DeclData, DeclKind, Declaration};
use crate::ids::{DeclId, DeclParent, FileId, ModuleId, SymbolId};
use crate::module::{IrFile, IrModule};
use crate::symbol::SymbolTable;
use crate::types::{Classifier, IrType, TypeArgument, TypeRef};
use kirin_common::{Atom, FqName, Interner};

#[derive(Debug)]
pub struct IrArena {
    decls: Vec<Declaration>,
    files: Vec<IrFile>,
    modules: Vec<IrModule>,
    pub symbols: SymbolTable,
    pub names: Interner,
    pub(crate) builtins: IrBuiltIns,
}

impl IrArena {
    /// Create an arena with the built-in module already installed.
    pub fn new() -> Self {
        let mut names = Interner::new();
        names.intern_common();
        let mut arena = IrArena {
            decls: Vec::new(),
            files: Vec::new(),
            modules: Vec::new(),
            symbols: SymbolTable::new(),
            names,
            builtins: IrBuiltIns::default(),
        };
        arena.builtins = IrBuiltIns::install(&mut arena);
        arena
    }

    pub fn builtins(&self) -> &IrBuiltIns {
        &self.builtins
    }

    // =========================================================================
    // Names
    // =========================================================================

    pub fn intern(&mut self, name: &str) -> Atom {
        self.names.intern(name)
    }

    pub fn name(&self, atom: Atom) -> &str {
        self.names.resolve(atom)
    }

    pub fn decl_name(&self, id: DeclId) -> &str {
        self.names.resolve(self.decl(id).name)
    }

    // =========================================================================
    // Modules and files
    // =========================================================================

    pub fn add_module(&mut self, name: impl Into<String>, dependencies: Vec<ModuleId>) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(IrModule {
            name: name.into(),
            files: Vec::new(),
            dependencies,
        });
        id
    }

    pub fn add_file(&mut self, module: ModuleId, name: impl Into<String>, package: FqName) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(IrFile::new(module, name, package));
        self.modules[module.index()].files.push(id);
        id
    }

    pub fn module(&self, id: ModuleId) -> &IrModule {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut IrModule {
        &mut self.modules[id.index()]
    }

    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + use<> {
        (0..self.modules.len() as u32).map(ModuleId)
    }

    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .map(|i| ModuleId(i as u32))
    }

    pub fn file(&self, id: FileId) -> &IrFile {
        &self.files[id.index()]
    }

    pub fn file_mut(&mut self, id: FileId) -> &mut IrFile {
        &mut self.files[id.index()]
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Create a declaration with a fresh symbol. The declaration is not yet
    /// attached to its parent; see [`IrArena::attach`].
    pub fn declare(&mut self, name: &str, parent: DeclParent, data: DeclData) -> DeclId {
        let symbol = self.symbols.declare(data.symbol_kind());
        let name = self.names.intern(name);
        self.add_declaration(Declaration::new(name, parent, symbol, data))
    }

    /// Store a fully built declaration and bind its symbol to it.
    pub fn add_declaration(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.symbols.bind(decl.symbol, id);
        self.decls.push(decl);
        id
    }

    /// Append `id` to its parent's declaration list (file) or member list
    /// (class). Other parents own their children through typed fields.
    pub fn attach(&mut self, id: DeclId) {
        match self.decl(id).parent {
            DeclParent::File(file) => self.files[file.index()].declarations.push(id),
            DeclParent::Decl(parent) => {
                if let Some(class) = self.decls[parent.index()].as_class_mut() {
                    class.members.push(id);
                }
            }
        }
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.decls[id.index()]
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> + use<> {
        (0..self.decls.len() as u32).map(DeclId)
    }

    /// The declaration a symbol is bound to, following delegation.
    pub fn owner(&self, symbol: SymbolId) -> Option<DeclId> {
        self.symbols.owner(symbol)
    }

    // =========================================================================
    // Tree navigation
    // =========================================================================

    pub fn parent_decl(&self, id: DeclId) -> Option<DeclId> {
        self.decl(id).parent.as_decl()
    }

    /// The class directly containing `id`, if its parent is a class.
    pub fn parent_class(&self, id: DeclId) -> Option<DeclId> {
        self.parent_decl(id)
            .filter(|&parent| self.decl(parent).kind() == DeclKind::Class)
    }

    pub fn is_top_level(&self, id: DeclId) -> bool {
        matches!(self.decl(id).parent, DeclParent::File(_))
    }

    pub fn top_level_of(&self, id: DeclId) -> DeclId {
        let mut current = id;
        while let DeclParent::Decl(parent) = self.decl(current).parent {
            current = parent;
        }
        current
    }

    pub fn file_of(&self, id: DeclId) -> FileId {
        match self.decl(self.top_level_of(id)).parent {
            DeclParent::File(file) => file,
            DeclParent::Decl(_) => unreachable!("top level declaration has a declaration parent"),
        }
    }

    pub fn module_of(&self, id: DeclId) -> ModuleId {
        self.file(self.file_of(id)).module
    }

    pub fn package_of(&self, id: DeclId) -> &FqName {
        &self.file(self.file_of(id)).package
    }

    /// Path of `id` inside its package: `Outer.Inner.member`.
    pub fn declaration_path(&self, id: DeclId) -> FqName {
        let mut names = vec![self.decl_name(id)];
        let mut current = id;
        while let Some(parent) = self.parent_decl(current) {
            names.push(self.decl_name(parent));
            current = parent;
        }
        names.reverse();
        FqName::from_segments(&names)
    }

    pub fn fq_name(&self, id: DeclId) -> FqName {
        let path = self.declaration_path(id);
        let package = self.package_of(id);
        if package.is_root() {
            path
        } else {
            FqName::new(format!("{}.{}", package.as_str(), path.as_str()))
        }
    }

    /// Human-readable identity used in diagnostics and panics:
    /// `package/Outer.Inner`.
    pub fn render(&self, id: DeclId) -> String {
        format!(
            "{}/{}",
            self.package_of(id).as_str(),
            self.declaration_path(id).as_str()
        )
    }

    /// Declarations owned by `id`: members, accessors, backing fields,
    /// receivers, value and type parameters.
    pub fn children(&self, id: DeclId) -> Vec<DeclId> {
        let mut out = Vec::new();
        match &self.decl(id).data {
            DeclData::Class(class) => {
                out.extend(class.type_parameters.iter().copied());
                out.extend(class.members.iter().copied());
            }
            DeclData::TypeAlias(alias) => out.extend(alias.type_parameters.iter().copied()),
            DeclData::Function(function) | DeclData::Constructor(function) => {
                if function.corresponding_property.is_none() {
                    out.extend(function.type_parameters.iter().copied());
                }
                out.extend(function.extension_receiver);
                out.extend(function.value_parameters.iter().copied());
            }
            DeclData::Property(property) => {
                out.extend(property.type_parameters.iter().copied());
                out.extend(property.getter);
                out.extend(property.setter);
                out.extend(property.backing_field);
            }
            _ => {}
        }
        out
    }

    /// `root` and everything nested in it, parents before children.
    pub fn descendants(&self, root: DeclId) -> Vec<DeclId> {
        let mut out = vec![root];
        let mut next = 0;
        while next < out.len() {
            let children = self.children(out[next]);
            out.extend(children);
            next += 1;
        }
        out
    }

    // =========================================================================
    // Classes
    // =========================================================================

    pub fn members(&self, class: DeclId) -> &[DeclId] {
        self.decl(class)
            .as_class()
            .map(|c| c.members.as_slice())
            .unwrap_or(&[])
    }

    pub fn add_member(&mut self, class: DeclId, member: DeclId) {
        if let Some(data) = self.decl_mut(class).as_class_mut() {
            data.members.push(member);
        }
    }

    pub fn super_types(&self, class: DeclId) -> &[TypeRef] {
        self.decl(class)
            .as_class()
            .map(|c| c.super_types.as_slice())
            .unwrap_or(&[])
    }

    /// Bound classes named by the resolved supertypes of `class`.
    pub fn super_classes(&self, class: DeclId) -> Vec<DeclId> {
        self.super_types(class)
            .iter()
            .filter_map(TypeRef::class_symbol)
            .filter_map(|symbol| self.owner(symbol))
            .collect()
    }

    pub fn class_of_type(&self, ty: &IrType) -> Option<DeclId> {
        ty.class_symbol().and_then(|symbol| self.owner(symbol))
    }

    pub fn companion_of(&self, class: DeclId) -> Option<DeclId> {
        self.members(class).iter().copied().find(|&member| {
            let decl = self.decl(member);
            decl.kind() == DeclKind::Class && decl.flags.contains(crate::decl::DeclFlags::COMPANION)
        })
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn class_type(&self, class: DeclId) -> IrType {
        let data = self.decl(class);
        let arguments = data
            .type_parameters()
            .iter()
            .map(|&tp| IrType::type_parameter(self.decl(tp).symbol))
            .collect();
        IrType::class(data.symbol, arguments)
    }

    /// Source-like rendering of a type: `kotlin.collections.List<T>?`.
    pub fn render_type(&self, ty: &IrType) -> String {
        match ty {
            IrType::Dynamic => "dynamic".to_string(),
            IrType::Error(message) => format!("<error: {message}>"),
            IrType::Simple(simple) => {
                let mut out = match simple.classifier {
                    Classifier::Class(symbol) | Classifier::TypeParameter(symbol) => {
                        match self.owner(symbol) {
                            Some(decl) if self.decl(decl).kind() == DeclKind::TypeParameter => {
                                self.decl_name(decl).to_string()
                            }
                            Some(decl) => self.fq_name(decl).as_str().to_string(),
                            None => self
                                .symbols
                                .signature(symbol)
                                .map(|sig| sig.render())
                                .unwrap_or_else(|| "<unbound>".to_string()),
                        }
                    }
                };
                if !simple.arguments.is_empty() {
                    out.push('<');
                    for (i, argument) in simple.arguments.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        match argument {
                            TypeArgument::Star => out.push('*'),
                            TypeArgument::Projection { variance, ty } => {
                                if !variance.label().is_empty() {
                                    out.push_str(variance.label());
                                    out.push(' ');
                                }
                                out.push_str(&self.render_type(ty));
                            }
                        }
                    }
                    out.push('>');
                }
                if simple.nullable {
                    out.push('?');
                }
                out
            }
        }
    }

    pub fn render_type_ref(&self, type_ref: &TypeRef) -> String {
        match type_ref {
            TypeRef::Resolved(ty) => self.render_type(ty),
            TypeRef::Error(error) => format!("<error: {}>", error.message),
            TypeRef::Unresolved(user) => {
                let path: Vec<&str> = user
                    .segments
                    .iter()
                    .map(|segment| self.name(segment.name))
                    .collect();
                format!("<unresolved: {}>", path.join("."))
            }
        }
    }
}

impl Default for IrArena {
    fn default() -> Self {
        Self::new()
    }
}
