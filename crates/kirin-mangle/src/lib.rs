//! Name mangling and signature tables.
//!
//! This crate provides:
//! - Structural mangled names (`Mangler`, `IrMangler`, `MangleComputer`)
//! - ABI export classification (`ExportChecker`)
//! - Public and file-local signature composition (`Signaturer`)
//! - Memoized global and per-module signature tables

pub mod hash;
pub use hash::{PUBLIC_MANGLE_FLAG, function_class_symbol_name, function_invoke_symbol_name, hash_mangle};

pub mod export;
pub use export::ExportChecker;

pub mod mangler;
pub use mangler::{IrMangler, MangleComputer, Mangler};

pub mod signaturer;
pub use signaturer::Signaturer;

pub mod table;
pub use table::{
    DeclarationTable, GlobalDeclarationTable, NoopClashTracker, RecordingClashTracker,
    SignatureClashTracker,
};

#[cfg(test)]
#[path = "tests/mangler_tests.rs"]
mod mangler_tests;

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod export_tests;

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod table_tests;
