//! Fluent construction of IR trees.
//!
//! Elaboration is out of scope for the middle-end, so tests and the CLI build
//! their input declarations through `IrBuilder`. Builders create their
//! declaration eagerly and attach it to the parent immediately; the fluent
//! methods then fill in the header and payload.
//!
//! ```
//! use kirin_ir::{IrArena, IrBuilder, Modality};
//! let mut arena = IrArena::new();
//! let mut b = IrBuilder::new(&mut arena);
//! let module = b.module("lib");
//! let file = b.file(module, "a.kt", "lib");
//! let a = b.class(file, "A").modality(Modality::Open).build();
//! let bb = b.class(file, "B").extends("A").build();
//! assert_ne!(a, bb);
//! ```

use crate::arena::IrArena;
use crate::body::Body;
use crate::decl::{
    ClassData, ClassKind, DeclData, DeclFlags, FieldData, FunctionData, Modality, PropertyData,
    TypeAliasData, TypeParameterData, ValueParameterData, Visibility,
};
use crate::ids::{DeclId, DeclParent, FileId, ModuleId};
use crate::module::{ExpectActual, ImportDirective};
use crate::types::{IrType, TypePathSegment, TypeRef, UserTypeArgument, UserTypeRef, Variance};
use kirin_common::{FqName, SpecialNames};

pub struct IrBuilder<'a> {
    arena: &'a mut IrArena,
}

impl<'a> IrBuilder<'a> {
    pub fn new(arena: &'a mut IrArena) -> Self {
        Self { arena }
    }

    pub fn arena(&mut self) -> &mut IrArena {
        self.arena
    }

    pub fn module(&mut self, name: &str) -> ModuleId {
        self.arena.add_module(name, Vec::new())
    }

    pub fn module_with_deps(&mut self, name: &str, dependencies: &[ModuleId]) -> ModuleId {
        self.arena.add_module(name, dependencies.to_vec())
    }

    pub fn file(&mut self, module: ModuleId, name: &str, package: &str) -> FileId {
        self.arena.add_file(module, name, FqName::new(package))
    }

    pub fn import(&mut self, file: FileId, import: ImportDirective) {
        self.arena.file_mut(file).imports.push(import);
    }

    /// Record that `actual` implements `expect`.
    pub fn expect_actual(&mut self, file: FileId, expect: DeclId, actual: DeclId) {
        let expect = self.arena.decl(expect).symbol;
        let actual = self.arena.decl(actual).symbol;
        self.arena
            .file_mut(file)
            .actuals
            .push(ExpectActual { expect, actual });
    }

    pub fn explicitly_export(&mut self, file: FileId, decl: DeclId) {
        let symbol = self.arena.decl(decl).symbol;
        self.arena.file_mut(file).explicitly_exported.push(symbol);
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// An unresolved reference to a dotted path, optionally ending in `?`.
    pub fn user_type(&mut self, path: &str) -> TypeRef {
        TypeRef::Unresolved(self.user_type_ref(path, Vec::new()))
    }

    pub fn user_type_ref(&mut self, path: &str, arguments: Vec<UserTypeRef>) -> UserTypeRef {
        let (path, nullable) = match path.strip_suffix('?') {
            Some(path) => (path, true),
            None => (path, false),
        };
        let names: Vec<&str> = path.split('.').collect();
        let last = names.len().saturating_sub(1);
        let mut arguments = Some(arguments);
        let segments = names
            .iter()
            .enumerate()
            .map(|(i, name)| TypePathSegment {
                name: self.arena.intern(name),
                arguments: if i == last {
                    arguments
                        .take()
                        .unwrap_or_default()
                        .into_iter()
                        .map(|ty| UserTypeArgument::Projection {
                            variance: Variance::Invariant,
                            ty,
                        })
                        .collect()
                } else {
                    Vec::new()
                },
            })
            .collect();
        UserTypeRef { segments, nullable }
    }

    pub fn class_type(&self, class: DeclId) -> IrType {
        self.arena.class_type(class)
    }

    pub fn class_type_with(&self, class: DeclId, arguments: Vec<IrType>) -> IrType {
        IrType::class(self.arena.decl(class).symbol, arguments)
    }

    pub fn any_type(&self) -> IrType {
        self.arena.any_type()
    }

    pub fn unit_type(&self) -> IrType {
        self.arena.unit_type()
    }

    pub fn int_type(&self) -> IrType {
        self.arena.int_type()
    }

    pub fn string_type(&self) -> IrType {
        self.arena.string_type()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub fn class(&mut self, parent: impl Into<DeclParent>, name: &str) -> ClassBuilder<'_> {
        let id = self.arena.declare(
            name,
            parent.into(),
            DeclData::Class(ClassData {
                kind: ClassKind::Class,
                modality: Modality::Final,
                type_parameters: Vec::new(),
                super_types: Vec::new(),
                members: Vec::new(),
            }),
        );
        self.arena.attach(id);
        ClassBuilder {
            arena: self.arena,
            id,
        }
    }

    pub fn interface(&mut self, parent: impl Into<DeclParent>, name: &str) -> ClassBuilder<'_> {
        self.class(parent, name)
            .kind(ClassKind::Interface)
            .modality(Modality::Abstract)
    }

    pub fn function(&mut self, parent: impl Into<DeclParent>, name: &str) -> FunctionBuilder<'_> {
        let return_type = self.arena.unit_type();
        let id = self.arena.declare(
            name,
            parent.into(),
            DeclData::Function(empty_function(Modality::Final, return_type)),
        );
        self.arena.attach(id);
        FunctionBuilder {
            arena: self.arena,
            id,
        }
    }

    pub fn constructor(&mut self, class: DeclId) -> FunctionBuilder<'_> {
        let return_type = self.arena.class_type(class);
        let id = self.arena.declare(
            SpecialNames::INIT,
            DeclParent::Decl(class),
            DeclData::Constructor(empty_function(Modality::Final, return_type)),
        );
        self.arena.attach(id);
        FunctionBuilder {
            arena: self.arena,
            id,
        }
    }

    /// A `val` with a getter. Use [`PropertyBuilder::var`] for a setter.
    pub fn property(&mut self, parent: impl Into<DeclParent>, name: &str, ty: IrType) -> PropertyBuilder<'_> {
        let parent = parent.into();
        let id = self.arena.declare(
            name,
            parent,
            DeclData::Property(PropertyData {
                modality: Modality::Final,
                type_parameters: Vec::new(),
                getter: None,
                setter: None,
                backing_field: None,
                overridden: Vec::new(),
            }),
        );
        self.arena.attach(id);
        let mut getter_data = empty_function(Modality::Final, ty.clone());
        getter_data.corresponding_property = Some(id);
        let getter = self
            .arena
            .declare(&format!("<get-{name}>"), parent, DeclData::Function(getter_data));
        if let Some(property) = self.arena.decl_mut(id).as_property_mut() {
            property.getter = Some(getter);
        }
        PropertyBuilder {
            arena: self.arena,
            id,
            ty,
        }
    }

    pub fn type_alias(&mut self, parent: impl Into<DeclParent>, name: &str, expanded: TypeRef) -> DeclId {
        let id = self.arena.declare(
            name,
            parent.into(),
            DeclData::TypeAlias(TypeAliasData {
                type_parameters: Vec::new(),
                expanded,
            }),
        );
        self.arena.attach(id);
        id
    }

    /// Add a type parameter to an already built type alias.
    pub fn alias_type_parameter(&mut self, alias: DeclId, name: &str) -> IrType {
        add_type_parameter(self.arena, alias, name, Variance::Invariant)
    }

    pub fn enum_entry(&mut self, class: DeclId, name: &str) -> DeclId {
        let id = self
            .arena
            .declare(name, DeclParent::Decl(class), DeclData::EnumEntry);
        self.arena.attach(id);
        id
    }
}

fn empty_function(modality: Modality, return_type: IrType) -> FunctionData {
    FunctionData {
        modality,
        type_parameters: Vec::new(),
        extension_receiver: None,
        value_parameters: Vec::new(),
        return_type,
        overridden: Vec::new(),
        corresponding_property: None,
        body: None,
    }
}

/// Add a type parameter to `owner` and return a type referring to it.
fn add_type_parameter(arena: &mut IrArena, owner: DeclId, name: &str, variance: Variance) -> IrType {
    let index = arena.decl(owner).type_parameters().len() as u32;
    let bound = arena.nullable_any_type();
    let parameter = arena.declare(
        name,
        DeclParent::Decl(owner),
        DeclData::TypeParameter(TypeParameterData {
            index,
            variance,
            super_types: vec![bound],
        }),
    );
    match &mut arena.decl_mut(owner).data {
        DeclData::Class(class) => class.type_parameters.push(parameter),
        DeclData::TypeAlias(alias) => alias.type_parameters.push(parameter),
        DeclData::Function(function) | DeclData::Constructor(function) => {
            function.type_parameters.push(parameter);
        }
        DeclData::Property(property) => property.type_parameters.push(parameter),
        _ => {}
    }
    IrType::type_parameter(arena.decl(parameter).symbol)
}

fn add_value_parameter(arena: &mut IrArena, function: DeclId, name: &str, ty: IrType, receiver: bool) -> DeclId {
    let index = if receiver {
        -1
    } else {
        arena
            .decl(function)
            .as_function()
            .map_or(0, |f| f.value_parameters.len() as i32)
    };
    let parameter = arena.declare(
        name,
        DeclParent::Decl(function),
        DeclData::ValueParameter(ValueParameterData { index, ty }),
    );
    if let Some(data) = arena.decl_mut(function).as_function_mut() {
        if receiver {
            data.extension_receiver = Some(parameter);
        } else {
            data.value_parameters.push(parameter);
        }
    }
    parameter
}

// =============================================================================
// ClassBuilder
// =============================================================================

pub struct ClassBuilder<'a> {
    arena: &'a mut IrArena,
    id: DeclId,
}

impl ClassBuilder<'_> {
    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn kind(self, kind: ClassKind) -> Self {
        if let Some(class) = self.arena.decl_mut(self.id).as_class_mut() {
            class.kind = kind;
        }
        self
    }

    pub fn modality(self, modality: Modality) -> Self {
        self.arena.decl_mut(self.id).set_modality(modality);
        self
    }

    pub fn visibility(self, visibility: Visibility) -> Self {
        self.arena.decl_mut(self.id).visibility = visibility;
        self
    }

    pub fn flag(self, flag: DeclFlags) -> Self {
        self.arena.decl_mut(self.id).flags |= flag;
        self
    }

    pub fn annotation(self, fq_name: &str) -> Self {
        self.arena
            .decl_mut(self.id)
            .annotations
            .push(FqName::new(fq_name));
        self
    }

    pub fn super_type(self, super_type: TypeRef) -> Self {
        if let Some(class) = self.arena.decl_mut(self.id).as_class_mut() {
            class.super_types.push(super_type);
        }
        self
    }

    /// Add an unresolved supertype written as a dotted path.
    pub fn extends(self, path: &str) -> Self {
        let reference = IrBuilder::new(&mut *self.arena).user_type(path);
        self.super_type(reference)
    }

    /// Add an already resolved supertype.
    pub fn extends_type(self, ty: IrType) -> Self {
        self.super_type(TypeRef::Resolved(ty))
    }

    pub fn type_parameter(&mut self, name: &str) -> IrType {
        add_type_parameter(self.arena, self.id, name, Variance::Invariant)
    }

    pub fn build(self) -> DeclId {
        self.id
    }
}

// =============================================================================
// FunctionBuilder
// =============================================================================

pub struct FunctionBuilder<'a> {
    arena: &'a mut IrArena,
    id: DeclId,
}

impl FunctionBuilder<'_> {
    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn modality(self, modality: Modality) -> Self {
        self.arena.decl_mut(self.id).set_modality(modality);
        self
    }

    pub fn visibility(self, visibility: Visibility) -> Self {
        self.arena.decl_mut(self.id).visibility = visibility;
        self
    }

    pub fn flag(self, flag: DeclFlags) -> Self {
        self.arena.decl_mut(self.id).flags |= flag;
        self
    }

    pub fn annotation(self, fq_name: &str) -> Self {
        self.arena
            .decl_mut(self.id)
            .annotations
            .push(FqName::new(fq_name));
        self
    }

    pub fn returns(self, ty: IrType) -> Self {
        if let Some(function) = self.arena.decl_mut(self.id).as_function_mut() {
            function.return_type = ty;
        }
        self
    }

    pub fn param(self, name: &str, ty: IrType) -> Self {
        add_value_parameter(self.arena, self.id, name, ty, false);
        self
    }

    pub fn vararg_param(self, name: &str, ty: IrType) -> Self {
        let parameter = add_value_parameter(self.arena, self.id, name, ty, false);
        self.arena.decl_mut(parameter).flags |= DeclFlags::VARARG;
        self
    }

    pub fn receiver(self, ty: IrType) -> Self {
        add_value_parameter(self.arena, self.id, SpecialNames::THIS, ty, true);
        self
    }

    pub fn type_parameter(&mut self, name: &str) -> IrType {
        add_type_parameter(self.arena, self.id, name, Variance::Invariant)
    }

    pub fn body(self, body: Body) -> Self {
        if let Some(function) = self.arena.decl_mut(self.id).as_function_mut() {
            function.body = Some(body);
        }
        self
    }

    pub fn build(self) -> DeclId {
        self.id
    }
}

// =============================================================================
// PropertyBuilder
// =============================================================================

pub struct PropertyBuilder<'a> {
    arena: &'a mut IrArena,
    id: DeclId,
    ty: IrType,
}

impl PropertyBuilder<'_> {
    pub fn id(&self) -> DeclId {
        self.id
    }

    fn accessors(&self) -> Vec<DeclId> {
        self.arena
            .decl(self.id)
            .as_property()
            .map(|p| p.getter.into_iter().chain(p.setter).collect())
            .unwrap_or_default()
    }

    pub fn modality(self, modality: Modality) -> Self {
        self.arena.decl_mut(self.id).set_modality(modality);
        for accessor in self.accessors() {
            self.arena.decl_mut(accessor).set_modality(modality);
        }
        self
    }

    pub fn visibility(self, visibility: Visibility) -> Self {
        self.arena.decl_mut(self.id).visibility = visibility;
        for accessor in self.accessors() {
            self.arena.decl_mut(accessor).visibility = visibility;
        }
        self
    }

    pub fn flag(self, flag: DeclFlags) -> Self {
        self.arena.decl_mut(self.id).flags |= flag;
        self
    }

    /// Make the property mutable by adding a setter.
    pub fn var(self) -> Self {
        self.var_with_setter_visibility(None)
    }

    pub fn var_with_setter_visibility(self, visibility: Option<Visibility>) -> Self {
        let decl = self.arena.decl(self.id);
        let (parent, modality, property_visibility) =
            (decl.parent, decl.modality().unwrap_or(Modality::Final), decl.visibility);
        let name = format!("<set-{}>", self.arena.decl_name(self.id));
        let mut data = empty_function(modality, self.arena.unit_type());
        data.corresponding_property = Some(self.id);
        let setter = self.arena.declare(&name, parent, DeclData::Function(data));
        self.arena.decl_mut(setter).visibility = visibility.unwrap_or(property_visibility);
        add_value_parameter(
            self.arena,
            setter,
            SpecialNames::SETTER_PARAMETER,
            self.ty.clone(),
            false,
        );
        let receiver = self
            .getter()
            .and_then(|getter| self.arena.decl(getter).as_function()?.extension_receiver)
            .map(|receiver| self.receiver_type(receiver));
        if let Some(ty) = receiver {
            add_value_parameter(self.arena, setter, SpecialNames::THIS, ty, true);
        }
        let declaration = self.arena.decl_mut(self.id);
        declaration.flags |= DeclFlags::VAR;
        if let Some(property) = declaration.as_property_mut() {
            property.setter = Some(setter);
        }
        self
    }

    fn getter(&self) -> Option<DeclId> {
        self.arena.decl(self.id).as_property()?.getter
    }

    fn receiver_type(&self, receiver: DeclId) -> IrType {
        self.arena
            .decl(receiver)
            .as_value_parameter()
            .map(|p| p.ty.clone())
            .unwrap_or(IrType::Dynamic)
    }

    /// Extension receiver, applied to every accessor.
    pub fn receiver(self, ty: IrType) -> Self {
        for accessor in self.accessors() {
            add_value_parameter(self.arena, accessor, SpecialNames::THIS, ty.clone(), true);
        }
        self
    }

    pub fn type_parameter(&mut self, name: &str) -> IrType {
        let ty = add_type_parameter(self.arena, self.id, name, Variance::Invariant);
        let parameters = self.arena.decl(self.id).type_parameters().to_vec();
        for accessor in self.accessors() {
            if let Some(function) = self.arena.decl_mut(accessor).as_function_mut() {
                function.type_parameters = parameters.clone();
            }
        }
        ty
    }

    pub fn backing_field(self) -> Self {
        let decl = self.arena.decl(self.id);
        let parent = decl.parent;
        let name = self.arena.decl_name(self.id).to_string();
        let field = self.arena.declare(
            &name,
            parent,
            DeclData::Field(FieldData {
                ty: self.ty.clone(),
                corresponding_property: Some(self.id),
                initializer: None,
            }),
        );
        self.arena.decl_mut(field).visibility = Visibility::Private;
        if let Some(property) = self.arena.decl_mut(self.id).as_property_mut() {
            property.backing_field = Some(field);
        }
        self
    }

    pub fn build(self) -> DeclId {
        self.id
    }
}
