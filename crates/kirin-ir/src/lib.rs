//! Intermediate representation for the kirin middle-end.
//!
//! This crate provides the data every pass works on:
//! - Arena-allocated declarations (`IrArena`, `Declaration`, `DeclData`)
//! - Types and type references (`IrType`, `TypeRef`)
//! - Symbols with delegation (`SymbolTable`)
//! - Cross-module identities (`IdSignature`)
//! - Built-ins and lazily created function classes
//! - A fluent `IrBuilder` for constructing input trees

pub mod ids;
pub use ids::{DeclId, DeclParent, FileId, ModuleId, SymbolId};

pub mod signature;
pub use signature::{IdSignature, PublicSignature, SignatureFlags};

pub mod types;
pub use types::{
    Classifier, ErrorKind, ErrorTypeRef, IrType, SimpleType, TypeArgument, TypePathSegment,
    TypeRef, TypeSubstitution, UserTypeArgument, UserTypeRef, Variance,
};

pub mod decl;
pub use decl::{
    ClassData, ClassKind, DeclData, DeclFlags, DeclKind, DeclOrigin, Declaration, FieldData,
    FunctionData, Modality, PropertyData, TypeAliasData, TypeParameterData, ValueParameterData,
    Visibility,
};

pub mod symbol;
pub use symbol::{SymbolKind, SymbolTable};

pub mod body;
pub use body::{Body, ConstValue, Expr};

pub mod module;
pub use module::{ExpectActual, ImportDirective, IrFile, IrModule};

pub mod arena;
pub use arena::IrArena;

pub mod builtins;
pub use builtins::{FunctionClassKind, IrBuiltIns, KnownOperator};

pub mod builder;
pub use builder::{ClassBuilder, FunctionBuilder, IrBuilder, PropertyBuilder};

#[cfg(test)]
#[path = "tests/signature_tests.rs"]
mod signature_tests;

#[cfg(test)]
#[path = "tests/symbol_tests.rs"]
mod symbol_tests;

#[cfg(test)]
#[path = "tests/builtins_tests.rs"]
mod builtins_tests;
