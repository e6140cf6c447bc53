//! Name Mangler
//!
//! Produces the structural mangled name of a declaration:
//!
//! | Kind | Shape |
//! |------|-------|
//! | class | `kclass:pkg.Outer.Inner` |
//! | function | `kfun:pkg.Outer.#name@recv(p1;p2){0§<bound>}ret` |
//! | property | `kprop:pkg.Outer.@recvname` |
//! | accessor | `kfun:pkg.Outer.#name@recv:getter:` |
//! | field / enum entry / type alias | `kfield:` / `kenumentry:` / `ktypealias:` + path |
//! | type parameter | `ktypeparam:` + owner + `@index` |
//!
//! The prefix is only emitted for the declaration being mangled, never for
//! the parents walked to build its path. Built-in function classes use fixed
//! names (see [`crate::hash`]). Declarations nested in an `expect`
//! declaration get a `#expect` suffix.

use crate::export::ExportChecker;
use crate::hash::{function_class_symbol_name, function_invoke_symbol_name, hash_mangle};
use kirin_ir::{
    Classifier, DeclData, DeclFlags, DeclId, DeclKind, DeclParent, IdSignature, IrArena, IrType,
    TypeArgument, Variance, Visibility,
};

/// Mangling and export policy. The provided methods are the common
/// behavior; a platform overrides the hooks it needs.
pub trait Mangler {
    fn is_exported(&self, arena: &IrArena, decl: DeclId) -> bool {
        ExportChecker::new(arena).check(decl)
    }

    /// Mangled name with its kind prefix.
    fn mangle(&self, arena: &IrArena, decl: DeclId) -> String {
        MangleComputer::new(arena, self).compute_mangle(decl)
    }

    /// Mangled name without the kind prefix.
    fn mangle_string(&self, arena: &IrArena, decl: DeclId) -> String {
        MangleComputer::new(arena, self).compute_mangle_string(decl)
    }

    fn hashed_mangle(&self, arena: &IrArena, decl: DeclId) -> u64 {
        hash_mangle(&self.mangle(arena, decl))
    }

    /// Replaces the structural mangle of a function entirely.
    fn platform_specific_function_name(&self, _arena: &IrArena, _decl: DeclId) -> Option<String> {
        None
    }
}

/// The common mangler with no platform hooks.
#[derive(Clone, Copy, Debug, Default)]
pub struct IrMangler;

impl Mangler for IrMangler {}

// =============================================================================
// MangleComputer
// =============================================================================

pub struct MangleComputer<'a, M: Mangler + ?Sized> {
    arena: &'a IrArena,
    mangler: &'a M,
    out: String,
    /// Declarations whose type parameters are in scope, outermost last.
    type_parameter_containers: Vec<DeclId>,
    is_real_expect: bool,
}

impl<'a, M: Mangler + ?Sized> MangleComputer<'a, M> {
    pub fn new(arena: &'a IrArena, mangler: &'a M) -> Self {
        Self {
            arena,
            mangler,
            out: String::with_capacity(64),
            type_parameter_containers: Vec::with_capacity(4),
            is_real_expect: false,
        }
    }

    pub fn compute_mangle(mut self, decl: DeclId) -> String {
        self.visit(decl, true);
        self.out
    }

    pub fn compute_mangle_string(mut self, decl: DeclId) -> String {
        self.visit(decl, false);
        self.out
    }

    fn fresh(&self) -> MangleComputer<'a, M> {
        MangleComputer::new(self.arena, self.mangler)
    }

    fn add_prefix(&mut self, prefix: &str, with_prefix: bool) -> usize {
        if with_prefix {
            self.out.push_str(prefix);
            self.out.push(':');
        }
        self.out.len()
    }

    fn visit_parent(&mut self, decl: DeclId) {
        match self.arena.decl(decl).parent {
            DeclParent::File(file) => {
                let package = &self.arena.file(file).package;
                if !package.is_root() {
                    self.out.push_str(package.as_str());
                }
            }
            DeclParent::Decl(parent) => self.visit(parent, false),
        }
    }

    fn note_expect(&mut self, decl: DeclId) {
        self.is_real_expect |= self.arena.decl(decl).is_expect();
    }

    fn append_expect_suffix(&mut self, with_prefix: bool) {
        if with_prefix && self.is_real_expect {
            self.out.push_str("#expect");
        }
    }

    fn visit(&mut self, decl: DeclId, with_prefix: bool) {
        let arena = self.arena;
        let declaration = arena.decl(decl);
        match &declaration.data {
            DeclData::Class(_) => self.visit_class(decl, with_prefix),
            DeclData::Function(function) => {
                self.note_expect(decl);
                if let Some(property) = function.corresponding_property {
                    self.mangle_property_accessor(property, decl, with_prefix);
                    return;
                }
                if let Some(class) = arena.parent_class(decl) {
                    if arena.function_class_kind(class).is_some() && arena.decl_name(decl) == "invoke" {
                        self.out
                            .push_str(&function_invoke_symbol_name(arena.decl_name(class)));
                        return;
                    }
                }
                if let Some(name) = self.mangler.platform_specific_function_name(arena, decl) {
                    self.out.push_str(&name);
                    return;
                }
                self.mangle_function(decl, false, with_prefix);
            }
            DeclData::Constructor(_) => self.mangle_function(decl, true, with_prefix),
            DeclData::Property(_) => self.visit_property(decl, with_prefix),
            DeclData::Field(_) => self.mangle_simple_declaration(decl, "kfield", with_prefix),
            DeclData::EnumEntry => {
                self.mangle_simple_declaration(decl, "kenumentry", with_prefix);
                self.append_expect_suffix(with_prefix);
            }
            DeclData::TypeAlias(_) => self.mangle_simple_declaration(decl, "ktypealias", with_prefix),
            DeclData::TypeParameter(parameter) => {
                self.add_prefix("ktypeparam", with_prefix);
                let owner = self.effective_parent(decl);
                self.visit(owner, with_prefix);
                self.out.push('@');
                self.out.push_str(&parameter.index.to_string());
            }
            DeclData::ValueParameter(_) | DeclData::Variable { .. } => panic!(
                "Unexpected declaration for mangling: {} ({:?})",
                arena.render(decl),
                declaration.kind()
            ),
        }
    }

    fn mangle_simple_declaration(&mut self, decl: DeclId, prefix: &str, with_prefix: bool) {
        let prefix_length = self.add_prefix(prefix, with_prefix);
        self.visit_parent(decl);
        if prefix_length != self.out.len() {
            self.out.push('.');
        }
        self.out.push_str(self.arena.decl_name(decl));
    }

    fn visit_class(&mut self, decl: DeclId, with_prefix: bool) {
        if with_prefix && self.arena.function_class_kind(decl).is_some() {
            self.out
                .push_str(&function_class_symbol_name(self.arena.decl_name(decl)));
            return;
        }
        self.note_expect(decl);
        self.type_parameter_containers.push(decl);
        self.mangle_simple_declaration(decl, "kclass", with_prefix);
        self.append_expect_suffix(with_prefix);
    }

    fn visit_property(&mut self, decl: DeclId, with_prefix: bool) {
        let arena = self.arena;
        let receiver = arena.decl(decl).as_property().and_then(|property| {
            property
                .getter
                .or(property.setter)
                .and_then(|accessor| arena.decl(accessor).as_function())
                .and_then(|accessor| accessor.extension_receiver)
        });

        let prefix_length = self.add_prefix("kprop", with_prefix);
        self.note_expect(decl);
        self.type_parameter_containers.push(decl);
        self.visit_parent(decl);
        if prefix_length != self.out.len() {
            self.out.push('.');
        }
        if let Some(receiver) = receiver {
            self.out.push('@');
            self.mangle_value_parameter(receiver);
        }
        self.out.push_str(arena.decl_name(decl));
        self.append_expect_suffix(with_prefix);
    }

    fn mangle_property_accessor(&mut self, property: DeclId, accessor: DeclId, with_prefix: bool) {
        let arena = self.arena;
        let length = self.add_prefix("kfun", with_prefix);
        self.type_parameter_containers.push(property);
        self.note_expect(property);
        self.visit_parent(property);
        if length != self.out.len() {
            self.out.push('.');
        }
        self.out.push('#');
        self.out.push_str(arena.decl_name(property));

        if let Some(receiver) = arena.decl(accessor).as_function().and_then(|f| f.extension_receiver) {
            self.out.push('@');
            self.mangle_value_parameter(receiver);
        }

        let is_getter = arena
            .decl(property)
            .as_property()
            .is_some_and(|p| p.getter == Some(accessor));
        self.out.push_str(if is_getter { ":getter:" } else { ":setter:" });
        self.append_expect_suffix(with_prefix);
    }

    fn mangle_function(&mut self, decl: DeclId, is_constructor: bool, with_prefix: bool) {
        let arena = self.arena;
        self.note_expect(decl);
        let prefix_length = self.add_prefix("kfun", with_prefix);
        self.type_parameter_containers.push(decl);
        self.visit_parent(decl);
        if prefix_length != self.out.len() {
            self.out.push('.');
        }
        self.out.push('#');
        self.out.push_str(arena.decl_name(decl));
        if arena.decl(decl).visibility == Visibility::Internal {
            let module = &arena.module(arena.module_of(decl)).name;
            self.out.push('$');
            self.out
                .push_str(module.trim_start_matches('<').trim_end_matches('>'));
        }

        self.mangle_signature(decl, is_constructor);
        self.append_expect_suffix(with_prefix);
    }

    fn mangle_signature(&mut self, decl: DeclId, is_constructor: bool) {
        let arena = self.arena;
        let Some(function) = arena.decl(decl).as_function() else {
            return;
        };
        if let Some(receiver) = function.extension_receiver {
            self.out.push('@');
            self.mangle_value_parameter(receiver);
        }

        self.out.push('(');
        for (i, &parameter) in function.value_parameters.iter().enumerate() {
            if i > 0 {
                self.out.push(';');
            }
            self.mangle_value_parameter(parameter);
        }
        self.out.push(')');

        self.out.push('{');
        for (i, &parameter) in function.type_parameters.iter().enumerate() {
            if i > 0 {
                self.out.push(';');
            }
            self.mangle_type_parameter(parameter);
        }
        self.out.push('}');

        if !is_constructor && !self.is_unit(&function.return_type) {
            self.mangle_type(&function.return_type);
        }
    }

    fn is_unit(&self, ty: &IrType) -> bool {
        !ty.is_nullable() && self.arena.class_of_type(ty) == Some(self.arena.builtins().unit)
    }

    fn mangle_value_parameter(&mut self, parameter: DeclId) {
        let declaration = self.arena.decl(parameter);
        if let Some(data) = declaration.as_value_parameter() {
            self.mangle_type(&data.ty);
        }
        if declaration.flags.contains(DeclFlags::VARARG) {
            self.out.push_str("...");
        }
    }

    fn mangle_type_parameter(&mut self, parameter: DeclId) {
        let Some(data) = self.arena.decl(parameter).as_type_parameter() else {
            return;
        };
        self.out.push_str(&data.index.to_string());
        self.out.push('§');
        self.out.push('<');
        for (i, bound) in data.super_types.iter().enumerate() {
            if i > 0 {
                self.out.push('&');
            }
            self.mangle_type(bound);
        }
        self.out.push('>');
    }

    /// The declaration a type parameter is indexed against: accessors share
    /// their property's type parameters.
    fn effective_parent(&self, parameter: DeclId) -> DeclId {
        let Some(parent) = self.arena.parent_decl(parameter) else {
            panic!(
                "Type parameter {} has no declaration parent",
                self.arena.render(parameter)
            );
        };
        let declaration = self.arena.decl(parent);
        match declaration.kind() {
            DeclKind::Function => declaration
                .as_function()
                .and_then(|f| f.corresponding_property)
                .unwrap_or(parent),
            _ => parent,
        }
    }

    fn mangle_type_parameter_reference(&mut self, parameter: DeclId) {
        let parent = self.effective_parent(parameter);
        let container = self
            .type_parameter_containers
            .iter()
            .position(|&c| c == parent)
            .map_or(-1, |i| i as i64);
        let index = self
            .arena
            .decl(parameter)
            .as_type_parameter()
            .map_or(0, |p| p.index);
        self.out.push_str(&format!("{container}:{index}"));
    }

    fn mangle_type(&mut self, ty: &IrType) {
        match ty {
            IrType::Simple(simple) => {
                match simple.classifier {
                    Classifier::Class(symbol) => match self.arena.owner(symbol) {
                        Some(class) => {
                            let name = self.fresh().compute_mangle_string(class);
                            self.out.push_str(&name);
                        }
                        None => {
                            let rendered = self
                                .arena
                                .symbols
                                .signature(symbol)
                                .map_or_else(|| "<unbound>".to_string(), unbound_class_name);
                            self.out.push_str(&rendered);
                        }
                    },
                    Classifier::TypeParameter(symbol) => {
                        if let Some(parameter) = self.arena.owner(symbol) {
                            self.mangle_type_parameter_reference(parameter);
                        }
                    }
                }
                if !simple.arguments.is_empty() {
                    self.out.push('<');
                    for (i, argument) in simple.arguments.iter().enumerate() {
                        if i > 0 {
                            self.out.push(',');
                        }
                        match argument {
                            TypeArgument::Star => self.out.push('*'),
                            TypeArgument::Projection { variance, ty } => {
                                if *variance != Variance::Invariant {
                                    self.out.push_str(variance.label());
                                    self.out.push('|');
                                }
                                self.mangle_type(ty);
                            }
                        }
                    }
                    self.out.push('>');
                }
                if simple.nullable {
                    self.out.push('?');
                }
            }
            IrType::Dynamic => self.out.push_str("<dynamic>"),
            IrType::Error(_) => self.out.push_str("<error>"),
        }
    }
}

/// Name of a class known only by its signature, spelled the way a bound class
/// mangles (`pkg.Outer.Inner`).
fn unbound_class_name(signature: &IdSignature) -> String {
    match signature {
        IdSignature::Public(public) if !public.declaration_fq_name.is_root() => {
            if public.package_fq_name.is_root() {
                public.declaration_fq_name.as_str().to_string()
            } else {
                format!(
                    "{}.{}",
                    public.package_fq_name.as_str(),
                    public.declaration_fq_name.as_str()
                )
            }
        }
        _ => signature.render(),
    }
}
