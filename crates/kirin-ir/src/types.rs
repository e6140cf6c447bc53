//! Type model.
//!
//! `IrType` is a reified type: a classifier symbol plus arguments and
//! nullability. `TypeRef` is what declarations store for their supertypes and
//! alias expansions; it starts out `Unresolved` (syntactic path as written) and
//! the supertype resolver turns it into `Resolved` or `Error`. After
//! resolution no `Unresolved` reference remains.

use crate::ids::SymbolId;
use kirin_common::Atom;
use rustc_hash::FxHashMap;

/// Type parameter symbol -> replacement type.
pub type TypeSubstitution = FxHashMap<SymbolId, IrType>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    In,
    Out,
}

impl Variance {
    /// Keyword used in source and in mangled names; empty for invariant.
    pub fn label(self) -> &'static str {
        match self {
            Variance::Invariant => "",
            Variance::In => "in",
            Variance::Out => "out",
        }
    }
}

// =============================================================================
// IrType
// =============================================================================

/// The head of a simple type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Classifier {
    Class(SymbolId),
    TypeParameter(SymbolId),
}

impl Classifier {
    pub fn symbol(self) -> SymbolId {
        match self {
            Classifier::Class(symbol) | Classifier::TypeParameter(symbol) => symbol,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Star,
    Projection { variance: Variance, ty: IrType },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SimpleType {
    pub classifier: Classifier,
    pub arguments: Vec<TypeArgument>,
    pub nullable: bool,
    /// The type alias this type was written through, if any.
    pub abbreviation: Option<SymbolId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Simple(SimpleType),
    Dynamic,
    Error(String),
}

impl IrType {
    pub fn class(symbol: SymbolId, arguments: Vec<IrType>) -> IrType {
        IrType::Simple(SimpleType {
            classifier: Classifier::Class(symbol),
            arguments: arguments
                .into_iter()
                .map(|ty| TypeArgument::Projection {
                    variance: Variance::Invariant,
                    ty,
                })
                .collect(),
            nullable: false,
            abbreviation: None,
        })
    }

    pub fn type_parameter(symbol: SymbolId) -> IrType {
        IrType::Simple(SimpleType {
            classifier: Classifier::TypeParameter(symbol),
            arguments: Vec::new(),
            nullable: false,
            abbreviation: None,
        })
    }

    pub fn as_simple(&self) -> Option<&SimpleType> {
        match self {
            IrType::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    pub fn classifier(&self) -> Option<Classifier> {
        self.as_simple().map(|simple| simple.classifier)
    }

    /// Symbol of the class heading this type, if it is a class type.
    pub fn class_symbol(&self) -> Option<SymbolId> {
        match self.classifier() {
            Some(Classifier::Class(symbol)) => Some(symbol),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            IrType::Simple(simple) => simple.nullable,
            IrType::Dynamic => true,
            IrType::Error(_) => false,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, IrType::Dynamic)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, IrType::Error(_))
    }

    pub fn with_nullability(&self, nullable: bool) -> IrType {
        match self {
            IrType::Simple(simple) => IrType::Simple(SimpleType {
                nullable,
                ..simple.clone()
            }),
            other => other.clone(),
        }
    }

    pub fn nullable(self) -> IrType {
        self.with_nullability(true)
    }

    /// Replace type parameters according to `substitution`. A nullable use of
    /// a parameter stays nullable after replacement.
    pub fn substitute(&self, substitution: &TypeSubstitution) -> IrType {
        if substitution.is_empty() {
            return self.clone();
        }
        match self {
            IrType::Simple(simple) => {
                if let Classifier::TypeParameter(symbol) = simple.classifier {
                    if let Some(replacement) = substitution.get(&symbol) {
                        return if simple.nullable {
                            replacement.with_nullability(true)
                        } else {
                            replacement.clone()
                        };
                    }
                }
                IrType::Simple(SimpleType {
                    classifier: simple.classifier,
                    arguments: simple
                        .arguments
                        .iter()
                        .map(|argument| match argument {
                            TypeArgument::Star => TypeArgument::Star,
                            TypeArgument::Projection { variance, ty } => TypeArgument::Projection {
                                variance: *variance,
                                ty: ty.substitute(substitution),
                            },
                        })
                        .collect(),
                    nullable: simple.nullable,
                    abbreviation: simple.abbreviation,
                })
            }
            other => other.clone(),
        }
    }
}

// =============================================================================
// TypeRef
// =============================================================================

/// One segment of a written type path: `Outer<Int>.Inner`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypePathSegment {
    pub name: Atom,
    pub arguments: Vec<UserTypeArgument>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserTypeArgument {
    Star,
    Projection {
        variance: Variance,
        ty: UserTypeRef,
    },
}

/// A type as written in source, before name resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserTypeRef {
    pub segments: Vec<TypePathSegment>,
    pub nullable: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LoopInSupertypes,
    TypeParameterAsSupertype,
    UnresolvedExpansion,
    UnresolvedReference,
    WrongTypeArgumentCount,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorTypeRef {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    Unresolved(UserTypeRef),
    Resolved(IrType),
    Error(ErrorTypeRef),
}

impl TypeRef {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        TypeRef::Error(ErrorTypeRef {
            kind,
            message: message.into(),
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, TypeRef::Resolved(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, TypeRef::Unresolved(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeRef::Error(_))
    }

    pub fn resolved_type(&self) -> Option<&IrType> {
        match self {
            TypeRef::Resolved(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorTypeRef> {
        match self {
            TypeRef::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Class symbol of a resolved class-type reference.
    pub fn class_symbol(&self) -> Option<SymbolId> {
        self.resolved_type().and_then(IrType::class_symbol)
    }
}
