//! Declaration, type and body reading.
//!
//! A top-level declaration is read as one tree: its nested declarations are
//! embedded in its message. Everything else (types, bodies, symbols,
//! signatures) is an index into the file's tables, dereferenced here and
//! cached per file.

use crate::error::{LinkError, LinkResult, WireError};
use crate::library::LibraryFile;
use crate::linker::{FileRef, IrLinker};
use crate::proto::{self, *};
use crate::reader::{read_signature, read_symbol_entry};
use crate::schema::Message;
use crate::session::LinkSession;
use kirin_common::FqName;
use kirin_ir::{
    Body, ClassData, Classifier, ConstValue, DeclData, DeclFlags, DeclId, DeclOrigin, DeclParent,
    Declaration, ErrorTypeRef, Expr, FieldData, FunctionData, IdSignature, IrType, PropertyData,
    SimpleType, SymbolId, TypeAliasData, TypeArgument, TypeParameterData, TypeRef,
    ValueParameterData,
};
use kirin_mangle::Mangler;

/// The file a declaration tree is read from.
pub(crate) struct DeclarationReader<'l> {
    pub file: &'l LibraryFile,
    pub at: FileRef,
    /// `false` replaces bodies and initializers with placeholders.
    pub need_bodies: bool,
}

impl IrLinker {
    fn signature_at(&mut self, r: &DeclarationReader<'_>, index: u32) -> LinkResult<IdSignature> {
        let cache = &mut self.file_state_mut(r.at).signature_cache;
        Ok(read_signature(r.file, index, cache)?)
    }

    fn read_symbol<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        index: u32,
    ) -> LinkResult<SymbolId> {
        let (kind, signature) = read_symbol_entry(r.file, index)?;
        let signature = self.signature_at(r, signature)?;
        self.reference_signature(session, Some(r.at), kind, signature)
    }

    fn read_symbols<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        indices: Vec<u32>,
    ) -> LinkResult<Vec<SymbolId>> {
        let mut symbols = Vec::with_capacity(indices.len());
        for index in indices {
            symbols.push(self.read_symbol(session, r, index)?);
        }
        Ok(symbols)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Read one declaration and everything nested in it. The declaration is
    /// not attached to `parent`; class members are attached to their class.
    pub(crate) fn read_declaration<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        message: &Message<'_>,
        parent: DeclParent,
    ) -> LinkResult<DeclId> {
        let symbol = self.read_symbol(session, r, message.index(proto::declaration::SYMBOL)?)?;
        if session.arena.symbols.is_bound(symbol) {
            return Err(LinkError::DuplicateDeclaration {
                signature: session
                    .arena
                    .symbols
                    .signature(symbol)
                    .map(IdSignature::render)
                    .unwrap_or_default(),
            });
        }
        let name = r.file.string(message.index(proto::declaration::NAME)?)?;
        let name = session.arena.intern(name);
        let origin = match message.enumeration(proto::declaration::ORIGIN, origin_from_wire)? {
            DeclOrigin::Defined => DeclOrigin::Deserialized,
            origin => origin,
        };
        let mut annotations = Vec::new();
        for annotation in message.repeated_indices(proto::declaration::ANNOTATION)? {
            annotations.push(FqName::new(r.file.string(annotation)?));
        }

        let tag = message.oneof(DECLARATION_PAYLOADS)?;
        let data = self.read_header_payload(session, r, message, tag)?;
        let mut declaration = Declaration::new(name, parent, symbol, data);
        declaration.origin = origin;
        declaration.visibility =
            message.enumeration(proto::declaration::VISIBILITY, visibility_from_wire)?;
        declaration.flags =
            DeclFlags::from_bits_truncate(message.varint_or_default(proto::declaration::FLAGS) as u32);
        declaration.annotations = annotations;
        let id = session.arena.add_declaration(declaration);

        match tag {
            proto::declaration::CLASS => {
                let payload = message.message(tag, &proto::CLASS)?;
                self.fill_class(session, r, &payload, id)?;
            }
            proto::declaration::TYPE_ALIAS => {
                let payload = message.message(tag, &proto::TYPE_ALIAS)?;
                let type_parameters =
                    self.read_children(session, r, &payload, proto::type_alias::TYPE_PARAMETER, id)?;
                let expanded = payload.message(proto::type_alias::EXPANDED, &TYPE_REF)?;
                let expanded = self.read_type_ref(session, r, &expanded)?;
                if let DeclData::TypeAlias(alias) = &mut session.arena.decl_mut(id).data {
                    alias.type_parameters = type_parameters;
                    alias.expanded = expanded;
                }
            }
            proto::declaration::FUNCTION | proto::declaration::CONSTRUCTOR => {
                let payload = message.message(tag, &proto::FUNCTION)?;
                self.fill_function(session, r, &payload, id)?;
            }
            proto::declaration::PROPERTY => {
                let payload = message.message(tag, &proto::PROPERTY)?;
                self.fill_property(session, r, &payload, id, parent)?;
            }
            _ => {}
        }
        Ok(id)
    }

    /// The payload of a declaration, complete for kinds without nested
    /// declarations and empty otherwise.
    fn read_header_payload<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        message: &Message<'_>,
        tag: u32,
    ) -> LinkResult<DeclData> {
        let data = match tag {
            proto::declaration::CLASS => {
                let class = message.message(tag, &proto::CLASS)?;
                DeclData::Class(ClassData {
                    kind: class.enumeration(proto::class::KIND, class_kind_from_wire)?,
                    modality: class.enumeration(proto::class::MODALITY, modality_from_wire)?,
                    type_parameters: Vec::new(),
                    super_types: Vec::new(),
                    members: Vec::new(),
                })
            }
            proto::declaration::TYPE_ALIAS => DeclData::TypeAlias(TypeAliasData {
                type_parameters: Vec::new(),
                expanded: TypeRef::Resolved(IrType::Dynamic),
            }),
            proto::declaration::FUNCTION | proto::declaration::CONSTRUCTOR => {
                let function = message.message(tag, &proto::FUNCTION)?;
                let data = FunctionData {
                    modality: function
                        .enumeration(proto::function::MODALITY, member_modality_from_wire)?,
                    type_parameters: Vec::new(),
                    extension_receiver: None,
                    value_parameters: Vec::new(),
                    return_type: IrType::Dynamic,
                    overridden: Vec::new(),
                    corresponding_property: None,
                    body: None,
                };
                if tag == proto::declaration::CONSTRUCTOR {
                    DeclData::Constructor(data)
                } else {
                    DeclData::Function(data)
                }
            }
            proto::declaration::PROPERTY => {
                let property = message.message(tag, &proto::PROPERTY)?;
                DeclData::Property(PropertyData {
                    modality: property
                        .enumeration(proto::property::MODALITY, member_modality_from_wire)?,
                    type_parameters: Vec::new(),
                    getter: None,
                    setter: None,
                    backing_field: None,
                    overridden: Vec::new(),
                })
            }
            proto::declaration::FIELD => {
                let field = message.message(tag, &proto::FIELD)?;
                let ty = self.read_type(session, r, field.index(proto::field::TYPE)?)?;
                let initializer = match field.opt_index(proto::field::INITIALIZER)? {
                    Some(_) if !r.need_bodies => Some(Body::Expression(Expr::Error(
                        Body::EXPRESSION_NOT_DESERIALIZED.to_string(),
                    ))),
                    Some(body) => Some(self.read_body(session, r, body)?),
                    None => None,
                };
                DeclData::Field(FieldData {
                    ty,
                    corresponding_property: None,
                    initializer,
                })
            }
            proto::declaration::ENUM_ENTRY => DeclData::EnumEntry,
            proto::declaration::VALUE_PARAMETER => {
                let parameter = message.message(tag, &proto::VALUE_PARAMETER)?;
                let index = parameter.sint(proto::value_parameter::INDEX)?;
                let index = i32::try_from(index).map_err(|_| WireError::InvalidValue {
                    message: "ValueParameter",
                    field: "index",
                    value: index as u64,
                })?;
                let ty = self.read_type(session, r, parameter.index(proto::value_parameter::TYPE)?)?;
                DeclData::ValueParameter(ValueParameterData { index, ty })
            }
            proto::declaration::TYPE_PARAMETER => {
                let parameter = message.message(tag, &proto::TYPE_PARAMETER)?;
                let mut super_types = Vec::new();
                for bound in parameter.repeated_indices(proto::type_parameter::SUPER_TYPE)? {
                    super_types.push(self.read_type(session, r, bound)?);
                }
                DeclData::TypeParameter(TypeParameterData {
                    index: parameter
                        .opt_index(proto::type_parameter::INDEX)?
                        .unwrap_or_default(),
                    variance: parameter
                        .enumeration(proto::type_parameter::VARIANCE, variance_from_wire)?,
                    super_types,
                })
            }
            _ => {
                let variable = message.message(tag, &proto::VARIABLE)?;
                DeclData::Variable {
                    ty: self.read_type(session, r, variable.index(proto::variable::TYPE)?)?,
                }
            }
        };
        Ok(data)
    }

    /// Nested declarations under `tag`, parented to `owner`.
    fn read_children<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        message: &Message<'_>,
        tag: u32,
        owner: DeclId,
    ) -> LinkResult<Vec<DeclId>> {
        let mut children = Vec::new();
        for child in message.repeated_messages(tag, &DECLARATION)? {
            children.push(self.read_declaration(session, r, &child, DeclParent::Decl(owner))?);
        }
        Ok(children)
    }

    fn fill_class<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        payload: &Message<'_>,
        id: DeclId,
    ) -> LinkResult<()> {
        let type_parameters =
            self.read_children(session, r, payload, proto::class::TYPE_PARAMETER, id)?;
        let mut super_types = Vec::new();
        for super_type in payload.repeated_messages(proto::class::SUPER_TYPE, &TYPE_REF)? {
            super_types.push(self.read_type_ref(session, r, &super_type)?);
        }
        if let Some(class) = session.arena.decl_mut(id).as_class_mut() {
            class.type_parameters = type_parameters;
            class.super_types = super_types;
        }
        for member in payload.repeated_messages(proto::class::MEMBER, &DECLARATION)? {
            let member = self.read_declaration(session, r, &member, DeclParent::Decl(id))?;
            session.arena.attach(member);
        }
        Ok(())
    }

    fn fill_function<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        payload: &Message<'_>,
        id: DeclId,
    ) -> LinkResult<()> {
        let mut type_parameters =
            self.read_children(session, r, payload, proto::function::TYPE_PARAMETER, id)?;
        // Accessors reuse the type parameters of their property, which is
        // read before them.
        for index in payload.repeated_indices(proto::function::INHERITED_TYPE_PARAMETER)? {
            let symbol = self.read_symbol(session, r, index)?;
            let parameter = session.arena.owner(symbol).ok_or(WireError::InvalidValue {
                message: "Function",
                field: "inherited_type_parameter",
                value: u64::from(index),
            })?;
            type_parameters.push(parameter);
        }
        let extension_receiver = match payload
            .opt_message(proto::function::EXTENSION_RECEIVER, &DECLARATION)?
        {
            Some(receiver) => Some(self.read_declaration(session, r, &receiver, DeclParent::Decl(id))?),
            None => None,
        };
        let value_parameters =
            self.read_children(session, r, payload, proto::function::VALUE_PARAMETER, id)?;
        let return_type = self.read_type(session, r, payload.index(proto::function::RETURN_TYPE)?)?;
        let overridden = payload.repeated_indices(proto::function::OVERRIDDEN)?;
        let overridden = self.read_symbols(session, r, overridden)?;
        let body = match payload.opt_index(proto::function::BODY)? {
            Some(_) if !r.need_bodies => Some(Body::Block(vec![Expr::Error(
                Body::STATEMENT_NOT_DESERIALIZED.to_string(),
            )])),
            Some(body) => Some(self.read_body(session, r, body)?),
            None => None,
        };

        if let Some(function) = session.arena.decl_mut(id).as_function_mut() {
            function.type_parameters = type_parameters;
            function.extension_receiver = extension_receiver;
            function.value_parameters = value_parameters;
            function.return_type = return_type;
            function.overridden = overridden;
            function.body = body;
        }
        Ok(())
    }

    /// Accessors and the backing field share the property's parent.
    fn fill_property<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        payload: &Message<'_>,
        id: DeclId,
        parent: DeclParent,
    ) -> LinkResult<()> {
        let type_parameters =
            self.read_children(session, r, payload, proto::property::TYPE_PARAMETER, id)?;
        if let Some(property) = session.arena.decl_mut(id).as_property_mut() {
            property.type_parameters = type_parameters;
        }

        let mut accessors = [None, None];
        for (slot, tag) in accessors
            .iter_mut()
            .zip([proto::property::GETTER, proto::property::SETTER])
        {
            if let Some(accessor) = payload.opt_message(tag, &DECLARATION)? {
                let accessor = self.read_declaration(session, r, &accessor, parent)?;
                if let Some(function) = session.arena.decl_mut(accessor).as_function_mut() {
                    function.corresponding_property = Some(id);
                }
                *slot = Some(accessor);
            }
        }
        let backing_field = match payload.opt_message(proto::property::BACKING_FIELD, &DECLARATION)? {
            Some(field) => {
                let field = self.read_declaration(session, r, &field, parent)?;
                if let DeclData::Field(data) = &mut session.arena.decl_mut(field).data {
                    data.corresponding_property = Some(id);
                }
                Some(field)
            }
            None => None,
        };
        let overridden = payload.repeated_indices(proto::property::OVERRIDDEN)?;
        let overridden = self.read_symbols(session, r, overridden)?;

        let [getter, setter] = accessors;
        if let Some(property) = session.arena.decl_mut(id).as_property_mut() {
            property.getter = getter;
            property.setter = setter;
            property.backing_field = backing_field;
            property.overridden = overridden;
        }
        Ok(())
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Type `index` of the file. Argument types always have a smaller index
    /// than the type using them.
    fn read_type<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        index: u32,
    ) -> LinkResult<IrType> {
        if let Some(ty) = self.file_state(r.at).type_cache.get(&index) {
            return Ok(ty.clone());
        }
        let message = proto::TYPE.decode(r.file.ty(index)?)?;
        let ty = match message.oneof(&[proto::ty::SIMPLE, proto::ty::DYNAMIC, proto::ty::ERROR])? {
            proto::ty::SIMPLE => {
                let simple = message.message(proto::ty::SIMPLE, &SIMPLE_TYPE)?;
                let symbol = self.read_symbol(session, r, simple.index(simple_type::CLASSIFIER)?)?;
                let classifier = if simple.bool(simple_type::TYPE_PARAMETER) {
                    Classifier::TypeParameter(symbol)
                } else {
                    Classifier::Class(symbol)
                };
                let mut arguments = Vec::new();
                for argument in simple.repeated_messages(simple_type::ARGUMENT, &TYPE_ARGUMENT)? {
                    if argument.bool(type_argument::STAR) {
                        arguments.push(TypeArgument::Star);
                        continue;
                    }
                    let child = argument.index(type_argument::TYPE)?;
                    if child >= index {
                        return Err(WireError::InvalidValue {
                            message: "TypeArgument",
                            field: "type",
                            value: u64::from(child),
                        }
                        .into());
                    }
                    arguments.push(TypeArgument::Projection {
                        variance: argument.enumeration(type_argument::VARIANCE, variance_from_wire)?,
                        ty: self.read_type(session, r, child)?,
                    });
                }
                let abbreviation = match simple.opt_index(simple_type::ABBREVIATION)? {
                    Some(alias) => Some(self.read_symbol(session, r, alias)?),
                    None => None,
                };
                IrType::Simple(SimpleType {
                    classifier,
                    arguments,
                    nullable: simple.bool(simple_type::NULLABLE),
                    abbreviation,
                })
            }
            proto::ty::DYNAMIC => IrType::Dynamic,
            _ => IrType::Error(r.file.string(message.index(proto::ty::ERROR)?)?.to_string()),
        };
        self.file_state_mut(r.at).type_cache.insert(index, ty.clone());
        Ok(ty)
    }

    fn read_type_ref<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        message: &Message<'_>,
    ) -> LinkResult<TypeRef> {
        match message.oneof(&[proto::type_ref::RESOLVED, proto::type_ref::ERROR])? {
            proto::type_ref::RESOLVED => {
                let ty = self.read_type(session, r, message.index(proto::type_ref::RESOLVED)?)?;
                Ok(TypeRef::Resolved(ty))
            }
            _ => {
                let error = message.message(proto::type_ref::ERROR, &ERROR_TYPE_REF)?;
                Ok(TypeRef::Error(ErrorTypeRef {
                    kind: error.enumeration(error_type_ref::KIND, error_kind_from_wire)?,
                    message: r.file.string(error.index(error_type_ref::MESSAGE)?)?.to_string(),
                }))
            }
        }
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    fn read_body<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        index: u32,
    ) -> LinkResult<Body> {
        let message = proto::BODY.decode(r.file.body(index)?)?;
        let body = match message.oneof(&[proto::body::BLOCK, proto::body::EXPRESSION])? {
            proto::body::BLOCK => {
                let block = message.message(proto::body::BLOCK, &BLOCK)?;
                Body::Block(self.read_block(session, r, &block)?)
            }
            _ => {
                let expr = message.message(proto::body::EXPRESSION, &EXPR)?;
                Body::Expression(self.read_expr(session, r, &expr)?)
            }
        };
        self.stats.bodies += 1;
        Ok(body)
    }

    fn read_block<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        block: &Message<'_>,
    ) -> LinkResult<Vec<Expr>> {
        let mut statements = Vec::new();
        for statement in block.repeated_messages(proto::block::STATEMENT, &EXPR)? {
            statements.push(self.read_expr(session, r, &statement)?);
        }
        Ok(statements)
    }

    fn read_expr<M: Mangler>(
        &mut self,
        session: &mut LinkSession<M>,
        r: &DeclarationReader<'_>,
        message: &Message<'_>,
    ) -> LinkResult<Expr> {
        let tag = message.oneof(&[
            proto::expr::CONST,
            proto::expr::CALL,
            proto::expr::GET_VALUE,
            proto::expr::SET_VALUE,
            proto::expr::BLOCK,
            proto::expr::RETURN,
            proto::expr::ERROR,
        ])?;
        let expr = match tag {
            proto::expr::CONST => {
                let value = message.message(tag, &CONST)?;
                let constant = match value.oneof(&[
                    constant::NULL,
                    constant::UNIT,
                    constant::BOOLEAN,
                    constant::INT,
                    constant::STRING,
                ])? {
                    constant::NULL => ConstValue::Null,
                    constant::UNIT => ConstValue::Unit,
                    constant::BOOLEAN => ConstValue::Boolean(value.bool(constant::BOOLEAN)),
                    constant::INT => ConstValue::Int(value.sint(constant::INT)?),
                    _ => ConstValue::String(
                        r.file.string(value.index(constant::STRING)?)?.to_string(),
                    ),
                };
                Expr::Const(constant)
            }
            proto::expr::CALL => {
                let call = message.message(tag, &CALL)?;
                let callee = self.read_symbol(session, r, call.index(call::CALLEE)?)?;
                let receiver = match call.opt_message(call::RECEIVER, &EXPR)? {
                    Some(receiver) => Some(Box::new(self.read_expr(session, r, &receiver)?)),
                    None => None,
                };
                let mut arguments = Vec::new();
                for argument in call.repeated_messages(call::ARGUMENT, &EXPR)? {
                    arguments.push(self.read_expr(session, r, &argument)?);
                }
                Expr::Call {
                    callee,
                    receiver,
                    arguments,
                }
            }
            proto::expr::GET_VALUE => Expr::GetValue(self.read_symbol(session, r, message.index(tag)?)?),
            proto::expr::SET_VALUE | proto::expr::RETURN => {
                let assignment = message.message(tag, &ASSIGNMENT)?;
                let target = self.read_symbol(session, r, assignment.index(assignment::TARGET)?)?;
                let value = assignment.message(assignment::VALUE, &EXPR)?;
                let value = Box::new(self.read_expr(session, r, &value)?);
                if tag == proto::expr::RETURN {
                    Expr::Return { target, value }
                } else {
                    Expr::SetValue { target, value }
                }
            }
            proto::expr::BLOCK => {
                let block = message.message(tag, &BLOCK)?;
                Expr::Block(self.read_block(session, r, &block)?)
            }
            _ => Expr::Error(r.file.string(message.index(tag)?)?.to_string()),
        };
        Ok(expr)
    }
}
