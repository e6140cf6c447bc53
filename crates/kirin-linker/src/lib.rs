//! Binary IR libraries and the cross-module linker.
//!
//! This crate provides:
//! - A tagged, length-delimited wire format (`varint`, `schema`, `proto`)
//! - The library container and its per-file tables (`IrLibrary`)
//! - `IrSerializer`, which writes a module into a library
//! - `IrLinker`, which reads libraries back on demand and resolves
//!   expect/actual pairs and forward declarations

pub mod error;
pub use error::{LinkError, LinkResult, WireError};

pub mod varint;

pub mod schema;

pub mod proto;

pub mod library;
pub use library::{IrLibrary, LIBRARY_EXTENSION, LibraryFile};

pub mod reader;

pub mod serializer;
pub use serializer::IrSerializer;

pub mod state;
pub use state::{
    DeserializationStrategy, FORWARD_DECLARATIONS_FILE, FORWARD_DECLARATIONS_MODULE, LinkerOptions,
};

pub mod session;
pub use session::LinkSession;

pub mod linker;
pub use linker::{IrLinker, LinkStats};

mod deserializer;

#[cfg(test)]
#[path = "tests/varint_tests.rs"]
mod varint_tests;

#[cfg(test)]
#[path = "tests/schema_tests.rs"]
mod schema_tests;

#[cfg(test)]
#[path = "tests/library_tests.rs"]
mod library_tests;
