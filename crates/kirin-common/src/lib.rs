//! Common types and utilities for the kirin compiler middle-end.
//!
//! This crate provides foundational types used across all kirin crates:
//! - String interning (`Atom`, `Interner`)
//! - Qualified names (`FqName`, `SpecialNames`)
//! - Centralized limits and thresholds
//! - Diagnostics (`Diagnostic`, `DiagnosticBag`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Fully qualified names shared by signatures, imports and the mangler
pub mod name;
pub use name::{FqName, SpecialNames};

// Centralized limits and thresholds
pub mod limits;

// Diagnostics produced by the resolver and surfaced by the CLI
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCategory};

#[cfg(test)]
#[path = "tests/interner_tests.rs"]
mod interner_tests;

#[cfg(test)]
#[path = "tests/name_tests.rs"]
mod name_tests;
