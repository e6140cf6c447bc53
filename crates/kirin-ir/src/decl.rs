//! Declarations.
//!
//! Every named program entity is a `Declaration` stored in the arena. The
//! common header (name, origin, visibility, parent, flags, annotations, symbol)
//! is shared; the kind-specific payload lives in `DeclData`.
//!
//! Synthesized declarations are distinguished by `DeclOrigin`, not by a
//! separate type: a fake override is an ordinary function or property whose
//! origin is `FakeOverride`.

use crate::body::Body;
use crate::ids::{DeclId, DeclParent, SymbolId};
use crate::symbol::SymbolKind;
use crate::types::{IrType, TypeRef, Variance};
use bitflags::bitflags;
use kirin_common::{Atom, FqName};

// =============================================================================
// Header enums
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclOrigin {
    /// Written by the user.
    Defined,
    /// Inherited member synthesized by the fake-override builder.
    FakeOverride,
    /// Stub materialized for an unbound forward-declared symbol.
    ForwardDeclaration,
    /// Compiler built-in.
    BuiltIn,
    /// Read back from a library.
    Deserialized,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
    Local,
}

impl Visibility {
    /// Visibilities that can be seen from another module's code.
    pub fn is_publicly_visible(self) -> bool {
        matches!(
            self,
            Visibility::Public | Visibility::Protected | Visibility::Internal
        )
    }

    fn rank(self) -> i32 {
        match self {
            Visibility::Private | Visibility::Local => 0,
            Visibility::Internal | Visibility::Protected => 1,
            Visibility::Public => 2,
        }
    }

    /// Compare two visibilities. `None` when they are incomparable
    /// (protected vs. internal, private vs. local).
    pub fn compare(self, other: Visibility) -> Option<i32> {
        if self == other {
            return Some(0);
        }
        let (a, b) = (self.rank(), other.rank());
        if a == b { None } else { Some(a - b) }
    }

    pub fn name(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
            Visibility::Local => "local",
        }
    }
}

/// Ordered from most to least restrictive: `Final < Sealed < Open < Abstract`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modality {
    Final,
    Sealed,
    Open,
    Abstract,
}

impl Modality {
    pub fn name(self) -> &'static str {
        match self {
            Modality::Final => "final",
            Modality::Sealed => "sealed",
            Modality::Open => "open",
            Modality::Abstract => "abstract",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    EnumClass,
    AnnotationClass,
    Object,
}

impl ClassKind {
    pub fn is_singleton(self) -> bool {
        matches!(self, ClassKind::Object)
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DeclFlags: u32 {
        const EXPECT = 1 << 0;
        const ACTUAL = 1 << 1;
        const EXTERNAL = 1 << 2;
        const SUSPEND = 1 << 3;
        /// Mutable property (`var`).
        const VAR = 1 << 4;
        const COMPANION = 1 << 5;
        const INNER = 1 << 6;
        const DATA = 1 << 7;
        const VARARG = 1 << 8;
        const OPERATOR = 1 << 9;
        const INLINE = 1 << 10;
        const CONST = 1 << 11;
        const LATEINIT = 1 << 12;
    }
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Clone, Debug)]
pub struct ClassData {
    pub kind: ClassKind,
    pub modality: Modality,
    pub type_parameters: Vec<DeclId>,
    pub super_types: Vec<TypeRef>,
    /// Append-only. Accessors, value parameters and type parameters are not
    /// members; they hang off their owning declaration.
    pub members: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct TypeAliasData {
    pub type_parameters: Vec<DeclId>,
    pub expanded: TypeRef,
}

/// Shared by functions, constructors and property accessors.
#[derive(Clone, Debug)]
pub struct FunctionData {
    pub modality: Modality,
    pub type_parameters: Vec<DeclId>,
    pub extension_receiver: Option<DeclId>,
    pub value_parameters: Vec<DeclId>,
    pub return_type: IrType,
    pub overridden: Vec<SymbolId>,
    /// Set on getters and setters.
    pub corresponding_property: Option<DeclId>,
    pub body: Option<Body>,
}

#[derive(Clone, Debug)]
pub struct PropertyData {
    pub modality: Modality,
    pub type_parameters: Vec<DeclId>,
    pub getter: Option<DeclId>,
    pub setter: Option<DeclId>,
    pub backing_field: Option<DeclId>,
    pub overridden: Vec<SymbolId>,
}

#[derive(Clone, Debug)]
pub struct FieldData {
    pub ty: IrType,
    pub corresponding_property: Option<DeclId>,
    pub initializer: Option<Body>,
}

#[derive(Clone, Debug)]
pub struct ValueParameterData {
    /// Position in the value parameter list; `-1` for the extension receiver.
    pub index: i32,
    pub ty: IrType,
}

#[derive(Clone, Debug)]
pub struct TypeParameterData {
    pub index: u32,
    pub variance: Variance,
    pub super_types: Vec<IrType>,
}

#[derive(Clone, Debug)]
pub enum DeclData {
    Class(ClassData),
    TypeAlias(TypeAliasData),
    Function(FunctionData),
    Constructor(FunctionData),
    Property(PropertyData),
    Field(FieldData),
    EnumEntry,
    ValueParameter(ValueParameterData),
    TypeParameter(TypeParameterData),
    Variable { ty: IrType },
}

/// Payload-free discriminant of `DeclData`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
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

impl DeclData {
    pub fn kind(&self) -> DeclKind {
        match self {
            DeclData::Class(_) => DeclKind::Class,
            DeclData::TypeAlias(_) => DeclKind::TypeAlias,
            DeclData::Function(_) => DeclKind::Function,
            DeclData::Constructor(_) => DeclKind::Constructor,
            DeclData::Property(_) => DeclKind::Property,
            DeclData::Field(_) => DeclKind::Field,
            DeclData::EnumEntry => DeclKind::EnumEntry,
            DeclData::ValueParameter(_) => DeclKind::ValueParameter,
            DeclData::TypeParameter(_) => DeclKind::TypeParameter,
            DeclData::Variable { .. } => DeclKind::Variable,
        }
    }

    pub fn symbol_kind(&self) -> SymbolKind {
        match self.kind() {
            DeclKind::Class => SymbolKind::Class,
            DeclKind::TypeAlias => SymbolKind::TypeAlias,
            DeclKind::Function => SymbolKind::Function,
            DeclKind::Constructor => SymbolKind::Constructor,
            DeclKind::Property => SymbolKind::Property,
            DeclKind::Field => SymbolKind::Field,
            DeclKind::EnumEntry => SymbolKind::EnumEntry,
            DeclKind::ValueParameter => SymbolKind::ValueParameter,
            DeclKind::TypeParameter => SymbolKind::TypeParameter,
            DeclKind::Variable => SymbolKind::Variable,
        }
    }
}

// =============================================================================
// Declaration
// =============================================================================

#[derive(Clone, Debug)]
pub struct Declaration {
    pub name: Atom,
    pub origin: DeclOrigin,
    pub visibility: Visibility,
    pub parent: DeclParent,
    pub flags: DeclFlags,
    pub annotations: Vec<FqName>,
    pub symbol: SymbolId,
    pub data: DeclData,
}

impl Declaration {
    pub fn new(name: Atom, parent: DeclParent, symbol: SymbolId, data: DeclData) -> Self {
        let visibility = match data {
            DeclData::ValueParameter(_) | DeclData::TypeParameter(_) | DeclData::Variable { .. } => {
                Visibility::Local
            }
            _ => Visibility::Public,
        };
        Self {
            name,
            origin: DeclOrigin::Defined,
            visibility,
            parent,
            flags: DeclFlags::empty(),
            annotations: Vec::new(),
            symbol,
            data,
        }
    }

    pub fn kind(&self) -> DeclKind {
        self.data.kind()
    }

    pub fn is_expect(&self) -> bool {
        self.flags.contains(DeclFlags::EXPECT)
    }

    pub fn is_fake_override(&self) -> bool {
        self.origin == DeclOrigin::FakeOverride
    }

    pub fn has_annotation(&self, fq_name: &FqName) -> bool {
        self.annotations.iter().any(|a| a == fq_name)
    }

    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.data {
            DeclData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.data {
            DeclData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_type_alias(&self) -> Option<&TypeAliasData> {
        match &self.data {
            DeclData::TypeAlias(alias) => Some(alias),
            _ => None,
        }
    }

    /// Function payload of functions, constructors and accessors.
    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.data {
            DeclData::Function(function) | DeclData::Constructor(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionData> {
        match &mut self.data {
            DeclData::Function(function) | DeclData::Constructor(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyData> {
        match &self.data {
            DeclData::Property(property) => Some(property),
            _ => None,
        }
    }

    pub fn as_property_mut(&mut self) -> Option<&mut PropertyData> {
        match &mut self.data {
            DeclData::Property(property) => Some(property),
            _ => None,
        }
    }

    pub fn as_value_parameter(&self) -> Option<&ValueParameterData> {
        match &self.data {
            DeclData::ValueParameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn as_type_parameter(&self) -> Option<&TypeParameterData> {
        match &self.data {
            DeclData::TypeParameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    /// Modality of classes, functions and properties.
    pub fn modality(&self) -> Option<Modality> {
        match &self.data {
            DeclData::Class(class) => Some(class.modality),
            DeclData::Function(function) | DeclData::Constructor(function) => {
                Some(function.modality)
            }
            DeclData::Property(property) => Some(property.modality),
            _ => None,
        }
    }

    pub fn set_modality(&mut self, modality: Modality) {
        match &mut self.data {
            DeclData::Class(class) => class.modality = modality,
            DeclData::Function(function) | DeclData::Constructor(function) => {
                function.modality = modality;
            }
            DeclData::Property(property) => property.modality = modality,
            _ => {}
        }
    }

    /// Overridden symbols of functions and properties.
    pub fn overridden(&self) -> &[SymbolId] {
        match &self.data {
            DeclData::Function(function) => &function.overridden,
            DeclData::Property(property) => &property.overridden,
            _ => &[],
        }
    }

    pub fn type_parameters(&self) -> &[DeclId] {
        match &self.data {
            DeclData::Class(class) => &class.type_parameters,
            DeclData::TypeAlias(alias) => &alias.type_parameters,
            DeclData::Function(function) | DeclData::Constructor(function) => {
                &function.type_parameters
            }
            DeclData::Property(property) => &property.type_parameters,
            _ => &[],
        }
    }

    /// Whether this is a function or property, i.e. something a subclass can
    /// inherit and override.
    pub fn is_overridable_member(&self) -> bool {
        matches!(self.kind(), DeclKind::Function | DeclKind::Property)
            && self
                .as_function()
                .is_none_or(|function| function.corresponding_property.is_none())
    }
}

