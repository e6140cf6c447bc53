//! Fake-override construction for the kirin middle-end.
//!
//! This crate provides:
//! - Override type checking with type parameter axioms (`OverrideTypeChecker`)
//! - Overridability checks and group decisions (`OverridingUtil`)
//! - Copying inherited members into subclasses (`FakeOverrideCopier`)
//! - Module-wide fake-override construction (`FakeOverrideBuilder`)
//! - Queries over overridden sets

pub mod type_checker;
pub use type_checker::OverrideTypeChecker;

pub mod util;
pub use util::{OverridableMember, OverrideCompatibility, OverrideCompatibilityInfo, OverridingUtil};

pub mod copier;
pub use copier::FakeOverrideCopier;

pub mod queries;
pub use queries::{
    collect_real_overrides, filter_overrides, overridden_declarations, overrides,
    resolve_fake_override, set_overridden,
};

pub mod builder;
pub use builder::{
    DefaultFakeOverrideClassFilter, FakeOverrideBuilder, FakeOverrideClassFilter,
    FakeOverrideOptions,
};

#[cfg(test)]
#[path = "tests/type_checker_tests.rs"]
mod type_checker_tests;

#[cfg(test)]
#[path = "tests/util_tests.rs"]
mod util_tests;

#[cfg(test)]
#[path = "tests/queries_tests.rs"]
mod queries_tests;
