//! Fake Override Copier
//!
//! Copies an inherited function or property into the class being completed.
//! The copy gets fresh symbols, fresh type parameters, the substituted
//! signature of the original and origin `FakeOverride`. Bodies, backing
//! fields and overridden sets are not copied.

use kirin_ir::{
    DeclData, DeclFlags, DeclId, DeclKind, DeclOrigin, DeclParent, FunctionData, IrArena, IrType, Modality,
    PropertyData, TypeParameterData, TypeSubstitution, ValueParameterData, Visibility,
};

pub struct FakeOverrideCopier<'a> {
    arena: &'a mut IrArena,
    class: DeclId,
    modality: Option<Modality>,
    visibility: Option<Visibility>,
    substitution: TypeSubstitution,
}

impl<'a> FakeOverrideCopier<'a> {
    pub fn new(arena: &'a mut IrArena, class: DeclId, substitution: TypeSubstitution) -> Self {
        Self {
            arena,
            class,
            modality: None,
            visibility: None,
            substitution,
        }
    }

    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = Some(modality);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Copy `member` into the class. The copy is not attached to the class's
    /// member list.
    pub fn copy(mut self, member: DeclId) -> DeclId {
        match self.arena.decl(member).kind() {
            DeclKind::Function => {
                let visibility = self.visibility;
                self.copy_function(member, DeclParent::Decl(self.class), None, visibility)
            }
            DeclKind::Property => self.copy_property(member),
            _ => panic!(
                "Only functions and properties can be fake overridden: {}",
                self.arena.render(member)
            ),
        }
    }

    /// `overridden_visibility` replaces the original's visibility when set.
    fn copy_header(
        &mut self,
        original: DeclId,
        copy: DeclId,
        overridden_visibility: Option<Visibility>,
    ) {
        let source = self.arena.decl(original);
        let (flags, annotations, visibility) = (
            source.flags - DeclFlags::EXTERNAL,
            source.annotations.clone(),
            source.visibility,
        );
        let modality = self.modality.or_else(|| source.modality());
        let target = self.arena.decl_mut(copy);
        target.origin = DeclOrigin::FakeOverride;
        target.flags = flags;
        target.annotations = annotations;
        target.visibility = overridden_visibility.unwrap_or(visibility);
        if let Some(modality) = modality {
            target.set_modality(modality);
        }
    }

    /// Declare copies of `parameters` under `owner`, extending the
    /// substitution so uses of the originals refer to the copies.
    fn copy_type_parameters(&mut self, parameters: &[DeclId], owner: DeclId) -> Vec<DeclId> {
        let mut copies = Vec::with_capacity(parameters.len());
        for &parameter in parameters {
            let name = self.arena.decl_name(parameter).to_string();
            let data = self
                .arena
                .decl(parameter)
                .as_type_parameter()
                .cloned()
                .unwrap_or(TypeParameterData {
                    index: copies.len() as u32,
                    variance: Default::default(),
                    super_types: Vec::new(),
                });
            let copy = self
                .arena
                .declare(&name, DeclParent::Decl(owner), DeclData::TypeParameter(data));
            self.arena.decl_mut(copy).origin = DeclOrigin::FakeOverride;
            self.substitution.insert(
                self.arena.decl(parameter).symbol,
                IrType::type_parameter(self.arena.decl(copy).symbol),
            );
            copies.push(copy);
        }
        // Bounds may mention any parameter of the list.
        for &copy in &copies {
            let bounds: Vec<IrType> = self
                .arena
                .decl(copy)
                .as_type_parameter()
                .map(|data| {
                    data.super_types
                        .iter()
                        .map(|bound| bound.substitute(&self.substitution))
                        .collect()
                })
                .unwrap_or_default();
            if let DeclData::TypeParameter(data) = &mut self.arena.decl_mut(copy).data {
                data.super_types = bounds;
            }
        }
        copies
    }

    fn copy_value_parameter(&mut self, parameter: DeclId, owner: DeclId) -> DeclId {
        let name = self.arena.decl_name(parameter).to_string();
        let source = self.arena.decl(parameter);
        let flags = source.flags;
        let (index, ty) = source
            .as_value_parameter()
            .map_or((0, IrType::Dynamic), |p| (p.index, p.ty.substitute(&self.substitution)));
        let copy = self.arena.declare(
            &name,
            DeclParent::Decl(owner),
            DeclData::ValueParameter(ValueParameterData { index, ty }),
        );
        let target = self.arena.decl_mut(copy);
        target.flags = flags;
        target.origin = DeclOrigin::FakeOverride;
        copy
    }

    /// `property` is set for accessors: the copied property and its already
    /// copied type parameters, which accessors share.
    fn copy_function(
        &mut self,
        original: DeclId,
        parent: DeclParent,
        property: Option<(DeclId, Vec<DeclId>)>,
        visibility: Option<Visibility>,
    ) -> DeclId {
        let name = self.arena.decl_name(original).to_string();
        let Some(source) = self.arena.decl(original).as_function().cloned() else {
            panic!("Expected a function: {}", self.arena.render(original));
        };

        let copy = self.arena.declare(
            &name,
            parent,
            DeclData::Function(FunctionData {
                modality: source.modality,
                type_parameters: Vec::new(),
                extension_receiver: None,
                value_parameters: Vec::new(),
                return_type: IrType::Dynamic,
                overridden: Vec::new(),
                corresponding_property: None,
                body: None,
            }),
        );
        self.copy_header(original, copy, visibility);

        let (type_parameters, corresponding_property) = match property {
            Some((property, shared)) => (shared, Some(property)),
            None => (self.copy_type_parameters(&source.type_parameters, copy), None),
        };
        let extension_receiver = source
            .extension_receiver
            .map(|receiver| self.copy_value_parameter(receiver, copy));
        let value_parameters: Vec<DeclId> = source
            .value_parameters
            .iter()
            .map(|&parameter| self.copy_value_parameter(parameter, copy))
            .collect();
        let return_type = source.return_type.substitute(&self.substitution);

        if let Some(function) = self.arena.decl_mut(copy).as_function_mut() {
            function.type_parameters = type_parameters;
            function.extension_receiver = extension_receiver;
            function.value_parameters = value_parameters;
            function.return_type = return_type;
            function.corresponding_property = corresponding_property;
        }
        copy
    }

    /// An accessor declared with its property's visibility follows the
    /// property's new visibility; a narrower one (`private set`) is kept.
    fn accessor_visibility(&self, property: DeclId, accessor: DeclId) -> Option<Visibility> {
        if self.arena.decl(accessor).visibility == self.arena.decl(property).visibility {
            self.visibility
        } else {
            None
        }
    }

    fn copy_property(&mut self, original: DeclId) -> DeclId {
        let name = self.arena.decl_name(original).to_string();
        let Some(source) = self.arena.decl(original).as_property().cloned() else {
            panic!("Expected a property: {}", self.arena.render(original));
        };
        let parent = DeclParent::Decl(self.class);
        let copy = self.arena.declare(
            &name,
            parent,
            DeclData::Property(PropertyData {
                modality: source.modality,
                type_parameters: Vec::new(),
                getter: None,
                setter: None,
                backing_field: None,
                overridden: Vec::new(),
            }),
        );
        let visibility = self.visibility;
        self.copy_header(original, copy, visibility);

        let type_parameters = self.copy_type_parameters(&source.type_parameters, copy);
        let getter = source.getter.map(|getter| {
            let visibility = self.accessor_visibility(original, getter);
            self.copy_function(getter, parent, Some((copy, type_parameters.clone())), visibility)
        });
        let setter = source.setter.map(|setter| {
            let visibility = self.accessor_visibility(original, setter);
            self.copy_function(setter, parent, Some((copy, type_parameters.clone())), visibility)
        });

        if let Some(property) = self.arena.decl_mut(copy).as_property_mut() {
            property.type_parameters = type_parameters;
            property.getter = getter;
            property.setter = setter;
        }
        copy
    }
}
