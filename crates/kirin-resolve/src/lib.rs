//! Lexical scopes and supertype resolution.
//!
//! This crate provides:
//! - Scope providers and the persistent `CompositeScope` stack
//! - A package index of top-level declarations (`DeclarationIndex`)
//! - The per-pass memo table (`SupertypeComputationSession`)
//! - The memoized, cycle-tolerant `SupertypeResolver`
//!
//! Typical use resolves a module and writes the results back:
//!
//! ```ignore
//! let diagnostics = resolve_module_supertypes(&mut arena, module, &ResolverOptions::default());
//! ```

pub mod scope;
pub use scope::{
    CompositeScope, ExplicitImportScope, MemberScope, NestedClassifierScope, PackageMemberScope,
    Scope, ScopeRef, StarImportScope, TypeParameterScope,
};

pub mod index;
pub use index::{DeclarationIndex, nested_classifier};

pub mod session;
pub use session::{ScopeKey, SupertypeComputationSession, SupertypeComputationStatus};

pub mod collaborators;
pub use collaborators::{
    DefaultImportingScopes, DefaultTypeResolver, ImportingScopeProvider, ResolvedTypeHead,
    TypePosition, TypeResolver,
};

pub mod resolver;
pub use resolver::{ResolverOptions, SupertypeResolver, apply_supertypes, resolve_module_supertypes};

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod scope_tests;

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod session_tests;
