//! IR Serializer
//!
//! Writes a module into an [`IrLibrary`]. Every file gets its own tables;
//! symbols are written as `(kind, signature)` pairs so a reader in another
//! compilation can match them by signature alone.
//!
//! Fake overrides are not written: the linking side rebuilds them, and
//! references to them are carried by signature and adopted when the
//! rebuilt fake override gets its signature.

use crate::error::{LinkError, LinkResult};
use crate::library::{IrLibrary, LibraryFile};
use crate::proto::{self, *};
use crate::schema::MessageWriter;
use kirin_ir::{
    Body, ConstValue, DeclData, DeclId, Expr, FileId, IdSignature, IrArena, IrType, ModuleId,
    PublicSignature, SymbolId, TypeArgument, TypeRef,
};
use kirin_mangle::{DeclarationTable, GlobalDeclarationTable, IrMangler, Mangler};
use rustc_hash::FxHashMap;
use tracing::{Level, debug, span, trace};

pub struct IrSerializer<'a, 'g, M: Mangler = IrMangler> {
    arena: &'a IrArena,
    table: DeclarationTable<'g, M>,
}

impl<'a, 'g, M: Mangler> IrSerializer<'a, 'g, M> {
    pub fn new(arena: &'a IrArena, global: &'g mut GlobalDeclarationTable<M>) -> Self {
        Self {
            arena,
            table: DeclarationTable::new(global),
        }
    }

    pub fn serialize_module(&mut self, module: ModuleId) -> LinkResult<IrLibrary> {
        let arena = self.arena;
        let data = arena.module(module);
        let _span = span!(Level::INFO, "serialize_module", module = %data.name).entered();

        let files = data
            .files
            .iter()
            .map(|&file| self.serialize_file(file))
            .collect::<LinkResult<Vec<_>>>()?;
        let library = IrLibrary {
            name: data.name.clone(),
            dependencies: data
                .dependencies
                .iter()
                .map(|&dependency| arena.module(dependency).name.clone())
                .collect(),
            files,
        };
        debug!(
            files = library.files.len(),
            top_levels = library.top_level_count(),
            "module serialized"
        );
        Ok(library)
    }

    pub fn serialize_file(&mut self, file: FileId) -> LinkResult<LibraryFile> {
        let arena = self.arena;
        let data = arena.file(file);
        trace!(file = %data.name, "serializing file");
        let mut writer = FileSerializer {
            arena,
            table: &mut self.table,
            out: LibraryFile {
                name: data.name.clone(),
                package: data.package.as_str().to_string(),
                ..LibraryFile::default()
            },
            strings: FxHashMap::default(),
            signatures: FxHashMap::default(),
            symbols: FxHashMap::default(),
            types: FxHashMap::default(),
        };

        for &decl in &data.declarations {
            if arena.decl(decl).is_fake_override() {
                continue;
            }
            let message = writer.declaration(decl)?;
            let signature = writer.table.signature_of(arena, decl);
            let id = writer.signature(&signature);
            writer.out.declarations.push(message.finish());
            writer.out.declaration_ids.push(id);
        }
        for &symbol in &data.explicitly_exported {
            let signature = writer.symbol_signature(symbol)?;
            let id = writer.signature(&signature);
            writer.out.explicitly_exported.push(id);
        }
        for pair in &data.actuals {
            let mut w = MessageWriter::new();
            w.varint(actual::EXPECT, u64::from(writer.symbol(pair.expect)?));
            w.varint(actual::ACTUAL, u64::from(writer.symbol(pair.actual)?));
            writer.out.actuals.push(w.finish());
        }
        for annotation in &data.annotations {
            let id = writer.string(annotation.as_str());
            writer.out.annotations.push(id);
        }
        for import in &data.imports {
            let mut w = MessageWriter::new();
            w.varint(proto::import::FQ_NAME, u64::from(writer.string(import.fq_name.as_str())));
            w.bool(proto::import::ALL_UNDER, import.all_under);
            if let Some(alias) = &import.alias {
                w.varint(proto::import::ALIAS, u64::from(writer.string(alias)));
            }
            writer.out.imports.push(w.finish());
        }
        Ok(writer.out)
    }
}

// =============================================================================
// Per-file tables
// =============================================================================

struct FileSerializer<'s, 'a, 'g, M: Mangler> {
    arena: &'a IrArena,
    table: &'s mut DeclarationTable<'g, M>,
    out: LibraryFile,
    strings: FxHashMap<String, u32>,
    signatures: FxHashMap<IdSignature, u32>,
    symbols: FxHashMap<SymbolId, u32>,
    types: FxHashMap<IrType, u32>,
}

impl<M: Mangler> FileSerializer<'_, '_, '_, M> {
    fn string(&mut self, value: &str) -> u32 {
        if let Some(&index) = self.strings.get(value) {
            return index;
        }
        let index = self.out.strings.len() as u32;
        self.out.strings.push(value.as_bytes().to_vec());
        self.strings.insert(value.to_string(), index);
        index
    }

    fn signature(&mut self, signature: &IdSignature) -> u32 {
        if let Some(&index) = self.signatures.get(signature) {
            return index;
        }
        let mut w = MessageWriter::new();
        match signature {
            IdSignature::Public(public) => {
                let message = self.public_signature(public);
                w.message(proto::signature::PUBLIC, message);
            }
            IdSignature::Accessor { property, accessor } => {
                let mut m = MessageWriter::new();
                m.varint(accessor_signature::PROPERTY, u64::from(self.signature(property)));
                m.message(accessor_signature::ACCESSOR, self.public_signature(accessor));
                w.message(proto::signature::ACCESSOR, m);
            }
            IdSignature::FileLocal { container, id } => {
                let mut m = MessageWriter::new();
                m.varint(file_local_signature::CONTAINER, u64::from(self.signature(container)));
                m.varint(file_local_signature::ID, *id);
                w.message(proto::signature::FILE_LOCAL, m);
            }
            IdSignature::BuiltIn { mangle, id } => {
                let mut m = MessageWriter::new();
                m.varint(built_in_signature::MANGLE, u64::from(self.string(mangle)));
                m.varint(built_in_signature::ID, *id);
                w.message(proto::signature::BUILT_IN, m);
            }
        }
        let index = self.out.signatures.len() as u32;
        self.out.signatures.push(w.finish());
        self.signatures.insert(signature.clone(), index);
        index
    }

    fn public_signature(&mut self, public: &PublicSignature) -> MessageWriter {
        let mut m = MessageWriter::new();
        m.varint(public_signature::PACKAGE, u64::from(self.string(public.package_fq_name.as_str())));
        m.varint(
            public_signature::DECLARATION,
            u64::from(self.string(public.declaration_fq_name.as_str())),
        );
        m.opt_varint(public_signature::ID, public.id);
        if !public.mask.is_empty() {
            m.varint(public_signature::MASK, public.mask.bits());
        }
        m
    }

    /// The signature a reference to `symbol` is written with.
    fn symbol_signature(&mut self, symbol: SymbolId) -> LinkResult<IdSignature> {
        if let Some(owner) = self.arena.owner(symbol) {
            return Ok(self.table.signature_of(self.arena, owner));
        }
        self.arena
            .symbols
            .signature(symbol)
            .cloned()
            .ok_or(LinkError::UnsignedSymbol { symbol: symbol.0 })
    }

    fn symbol(&mut self, symbol: SymbolId) -> LinkResult<u32> {
        if let Some(&index) = self.symbols.get(&symbol) {
            return Ok(index);
        }
        let signature = self.symbol_signature(symbol)?;
        let kind = self.arena.symbols.kind(symbol);
        let mut w = MessageWriter::new();
        w.varint(proto::symbol::KIND, symbol_kind_to_wire(kind));
        w.varint(proto::symbol::SIGNATURE, u64::from(self.signature(&signature)));
        let index = self.out.symbols.len() as u32;
        self.out.symbols.push(w.finish());
        self.symbols.insert(symbol, index);
        Ok(index)
    }

    fn symbols(&mut self, symbols: &[SymbolId]) -> LinkResult<Vec<u64>> {
        symbols
            .iter()
            .map(|&symbol| self.symbol(symbol).map(u64::from))
            .collect()
    }

    fn ty(&mut self, ty: &IrType) -> LinkResult<u32> {
        if let Some(&index) = self.types.get(ty) {
            return Ok(index);
        }
        let mut w = MessageWriter::new();
        match ty {
            IrType::Simple(simple) => {
                let mut m = MessageWriter::new();
                let classifier = simple.classifier;
                m.varint(simple_type::CLASSIFIER, u64::from(self.symbol(classifier.symbol())?));
                m.bool(
                    simple_type::TYPE_PARAMETER,
                    matches!(classifier, kirin_ir::Classifier::TypeParameter(_)),
                );
                for argument in &simple.arguments {
                    let mut a = MessageWriter::new();
                    match argument {
                        TypeArgument::Star => {
                            a.bool(type_argument::STAR, true);
                        }
                        TypeArgument::Projection { variance, ty } => {
                            a.varint(type_argument::VARIANCE, variance_to_wire(*variance));
                            a.varint(type_argument::TYPE, u64::from(self.ty(ty)?));
                        }
                    }
                    m.message(simple_type::ARGUMENT, a);
                }
                m.bool(simple_type::NULLABLE, simple.nullable);
                if let Some(abbreviation) = simple.abbreviation {
                    m.varint(simple_type::ABBREVIATION, u64::from(self.symbol(abbreviation)?));
                }
                w.message(proto::ty::SIMPLE, m);
            }
            IrType::Dynamic => {
                w.varint(proto::ty::DYNAMIC, 1);
            }
            IrType::Error(message) => {
                w.varint(proto::ty::ERROR, u64::from(self.string(message)));
            }
        }
        let index = self.out.types.len() as u32;
        self.out.types.push(w.finish());
        self.types.insert(ty.clone(), index);
        Ok(index)
    }

    fn type_ref(&mut self, owner: DeclId, type_ref: &TypeRef) -> LinkResult<MessageWriter> {
        let mut w = MessageWriter::new();
        match type_ref {
            TypeRef::Resolved(ty) => {
                w.varint(proto::type_ref::RESOLVED, u64::from(self.ty(ty)?));
            }
            TypeRef::Error(error) => {
                let mut m = MessageWriter::new();
                m.varint(error_type_ref::KIND, error_kind_to_wire(error.kind));
                m.varint(error_type_ref::MESSAGE, u64::from(self.string(&error.message)));
                w.message(proto::type_ref::ERROR, m);
            }
            TypeRef::Unresolved(_) => {
                return Err(LinkError::UnresolvedTypeReference {
                    declaration: self.arena.render(owner),
                });
            }
        }
        Ok(w)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declaration(&mut self, decl: DeclId) -> LinkResult<MessageWriter> {
        let arena = self.arena;
        let declaration = arena.decl(decl);
        let mut w = MessageWriter::new();

        let symbol = self.declared_symbol(decl)?;
        w.varint(proto::declaration::SYMBOL, u64::from(symbol));
        w.varint(proto::declaration::NAME, u64::from(self.string(arena.decl_name(decl))));
        w.varint(proto::declaration::ORIGIN, origin_to_wire(declaration.origin));
        w.varint(proto::declaration::VISIBILITY, visibility_to_wire(declaration.visibility));
        if !declaration.flags.is_empty() {
            w.varint(proto::declaration::FLAGS, u64::from(declaration.flags.bits()));
        }
        for annotation in &declaration.annotations {
            w.varint(proto::declaration::ANNOTATION, u64::from(self.string(annotation.as_str())));
        }

        match &declaration.data {
            DeclData::Class(class) => {
                let mut m = MessageWriter::new();
                m.varint(proto::class::KIND, class_kind_to_wire(class.kind));
                m.varint(proto::class::MODALITY, modality_to_wire(class.modality));
                for &parameter in &class.type_parameters {
                    m.message(proto::class::TYPE_PARAMETER, self.declaration(parameter)?);
                }
                for super_type in &class.super_types {
                    m.message(proto::class::SUPER_TYPE, self.type_ref(decl, super_type)?);
                }
                for &member in &class.members {
                    if arena.decl(member).is_fake_override() {
                        continue;
                    }
                    m.message(proto::class::MEMBER, self.declaration(member)?);
                }
                w.message(proto::declaration::CLASS, m);
            }
            DeclData::TypeAlias(alias) => {
                let mut m = MessageWriter::new();
                for &parameter in &alias.type_parameters {
                    m.message(proto::type_alias::TYPE_PARAMETER, self.declaration(parameter)?);
                }
                m.message(proto::type_alias::EXPANDED, self.type_ref(decl, &alias.expanded)?);
                w.message(proto::declaration::TYPE_ALIAS, m);
            }
            DeclData::Function(function) | DeclData::Constructor(function) => {
                let mut m = MessageWriter::new();
                m.varint(proto::function::MODALITY, modality_to_wire(function.modality));
                for &parameter in &function.type_parameters {
                    // Accessors share their property's type parameters.
                    if arena.parent_decl(parameter) == Some(decl) {
                        m.message(proto::function::TYPE_PARAMETER, self.declaration(parameter)?);
                    } else {
                        let symbol = self.symbol(arena.decl(parameter).symbol)?;
                        m.varint(proto::function::INHERITED_TYPE_PARAMETER, u64::from(symbol));
                    }
                }
                if let Some(receiver) = function.extension_receiver {
                    m.message(proto::function::EXTENSION_RECEIVER, self.declaration(receiver)?);
                }
                for &parameter in &function.value_parameters {
                    m.message(proto::function::VALUE_PARAMETER, self.declaration(parameter)?);
                }
                m.varint(proto::function::RETURN_TYPE, u64::from(self.ty(&function.return_type)?));
                for symbol in self.symbols(&function.overridden)? {
                    m.varint(proto::function::OVERRIDDEN, symbol);
                }
                if let Some(body) = &function.body {
                    m.varint(proto::function::BODY, u64::from(self.body(body)?));
                }
                let tag = match declaration.data {
                    DeclData::Constructor(_) => proto::declaration::CONSTRUCTOR,
                    _ => proto::declaration::FUNCTION,
                };
                w.message(tag, m);
            }
            DeclData::Property(property) => {
                let mut m = MessageWriter::new();
                m.varint(proto::property::MODALITY, modality_to_wire(property.modality));
                for &parameter in &property.type_parameters {
                    m.message(proto::property::TYPE_PARAMETER, self.declaration(parameter)?);
                }
                if let Some(getter) = property.getter {
                    m.message(proto::property::GETTER, self.declaration(getter)?);
                }
                if let Some(setter) = property.setter {
                    m.message(proto::property::SETTER, self.declaration(setter)?);
                }
                if let Some(field) = property.backing_field {
                    m.message(proto::property::BACKING_FIELD, self.declaration(field)?);
                }
                for symbol in self.symbols(&property.overridden)? {
                    m.varint(proto::property::OVERRIDDEN, symbol);
                }
                w.message(proto::declaration::PROPERTY, m);
            }
            DeclData::Field(field) => {
                let mut m = MessageWriter::new();
                m.varint(proto::field::TYPE, u64::from(self.ty(&field.ty)?));
                if let Some(initializer) = &field.initializer {
                    m.varint(proto::field::INITIALIZER, u64::from(self.body(initializer)?));
                }
                w.message(proto::declaration::FIELD, m);
            }
            DeclData::EnumEntry => {
                w.message(proto::declaration::ENUM_ENTRY, MessageWriter::new());
            }
            DeclData::ValueParameter(parameter) => {
                let mut m = MessageWriter::new();
                m.sint(proto::value_parameter::INDEX, i64::from(parameter.index));
                m.varint(proto::value_parameter::TYPE, u64::from(self.ty(&parameter.ty)?));
                w.message(proto::declaration::VALUE_PARAMETER, m);
            }
            DeclData::TypeParameter(parameter) => {
                let mut m = MessageWriter::new();
                m.varint(proto::type_parameter::INDEX, u64::from(parameter.index));
                m.varint(proto::type_parameter::VARIANCE, variance_to_wire(parameter.variance));
                for bound in &parameter.super_types {
                    m.varint(proto::type_parameter::SUPER_TYPE, u64::from(self.ty(bound)?));
                }
                w.message(proto::declaration::TYPE_PARAMETER, m);
            }
            DeclData::Variable { ty } => {
                let mut m = MessageWriter::new();
                m.varint(proto::variable::TYPE, u64::from(self.ty(ty)?));
                w.message(proto::declaration::VARIABLE, m);
            }
        }
        Ok(w)
    }

    /// The symbol entry a declaration is declared with: its own signature,
    /// registered under the declaration's symbol.
    fn declared_symbol(&mut self, decl: DeclId) -> LinkResult<u32> {
        let symbol = self.arena.decl(decl).symbol;
        if let Some(&index) = self.symbols.get(&symbol) {
            return Ok(index);
        }
        let signature = self.table.signature_of(self.arena, decl);
        let kind = self.arena.decl(decl).data.symbol_kind();
        let mut w = MessageWriter::new();
        w.varint(proto::symbol::KIND, symbol_kind_to_wire(kind));
        w.varint(proto::symbol::SIGNATURE, u64::from(self.signature(&signature)));
        let index = self.out.symbols.len() as u32;
        self.out.symbols.push(w.finish());
        self.symbols.insert(symbol, index);
        Ok(index)
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    fn body(&mut self, body: &Body) -> LinkResult<u32> {
        let mut w = MessageWriter::new();
        match body {
            Body::Block(statements) => {
                w.message(proto::body::BLOCK, self.block(statements)?);
            }
            Body::Expression(expr) => {
                w.message(proto::body::EXPRESSION, self.expr(expr)?);
            }
        }
        let index = self.out.bodies.len() as u32;
        self.out.bodies.push(w.finish());
        Ok(index)
    }

    fn block(&mut self, statements: &[Expr]) -> LinkResult<MessageWriter> {
        let mut m = MessageWriter::new();
        for statement in statements {
            m.message(proto::block::STATEMENT, self.expr(statement)?);
        }
        Ok(m)
    }

    fn expr(&mut self, expr: &Expr) -> LinkResult<MessageWriter> {
        let mut w = MessageWriter::new();
        match expr {
            Expr::Const(value) => {
                let mut m = MessageWriter::new();
                match value {
                    ConstValue::Null => m.varint(constant::NULL, 1),
                    ConstValue::Unit => m.varint(constant::UNIT, 1),
                    ConstValue::Boolean(value) => m.varint(constant::BOOLEAN, u64::from(*value)),
                    ConstValue::Int(value) => m.sint(constant::INT, *value),
                    ConstValue::String(value) => {
                        let index = self.string(value);
                        m.varint(constant::STRING, u64::from(index))
                    }
                };
                w.message(proto::expr::CONST, m);
            }
            Expr::Call {
                callee,
                receiver,
                arguments,
            } => {
                let mut m = MessageWriter::new();
                m.varint(call::CALLEE, u64::from(self.symbol(*callee)?));
                if let Some(receiver) = receiver {
                    m.message(call::RECEIVER, self.expr(receiver)?);
                }
                for argument in arguments {
                    m.message(call::ARGUMENT, self.expr(argument)?);
                }
                w.message(proto::expr::CALL, m);
            }
            Expr::GetValue(symbol) => {
                w.varint(proto::expr::GET_VALUE, u64::from(self.symbol(*symbol)?));
            }
            Expr::SetValue { target, value } | Expr::Return { target, value } => {
                let mut m = MessageWriter::new();
                m.varint(assignment::TARGET, u64::from(self.symbol(*target)?));
                m.message(assignment::VALUE, self.expr(value)?);
                let tag = match expr {
                    Expr::Return { .. } => proto::expr::RETURN,
                    _ => proto::expr::SET_VALUE,
                };
                w.message(tag, m);
            }
            Expr::Block(statements) => {
                w.message(proto::expr::BLOCK, self.block(statements)?);
            }
            Expr::Error(message) => {
                w.varint(proto::expr::ERROR, u64::from(self.string(message)));
            }
        }
        Ok(w)
    }
}
