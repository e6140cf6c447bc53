//! Table lookups that need no linker state: signatures and symbol entries.

use crate::error::WireError;
use crate::library::LibraryFile;
use crate::proto::{self, *};
use crate::schema::Message;
use kirin_common::FqName;
use kirin_ir::{IdSignature, PublicSignature, SignatureFlags, SymbolKind};
use rustc_hash::FxHashMap;

/// Decode signature `index`, memoized in `cache`.
///
/// Signatures only point at signatures with a smaller index (the writer
/// interns containers first), which bounds the recursion.
pub fn read_signature(
    file: &LibraryFile,
    index: u32,
    cache: &mut FxHashMap<u32, IdSignature>,
) -> Result<IdSignature, WireError> {
    if let Some(signature) = cache.get(&index) {
        return Ok(signature.clone());
    }
    let message = proto::SIGNATURE.decode(file.signature(index)?)?;
    let signature = match message.oneof(&[
        proto::signature::PUBLIC,
        proto::signature::ACCESSOR,
        proto::signature::FILE_LOCAL,
        proto::signature::BUILT_IN,
    ])? {
        proto::signature::PUBLIC => {
            let public = message.message(proto::signature::PUBLIC, &PUBLIC_SIGNATURE)?;
            IdSignature::Public(read_public(file, &public)?)
        }
        proto::signature::ACCESSOR => {
            let accessor = message.message(proto::signature::ACCESSOR, &ACCESSOR_SIGNATURE)?;
            let property = nested(file, index, accessor.index(accessor_signature::PROPERTY)?, cache)?;
            let public = accessor.message(accessor_signature::ACCESSOR, &PUBLIC_SIGNATURE)?;
            IdSignature::Accessor {
                property: Box::new(property),
                accessor: read_public(file, &public)?,
            }
        }
        proto::signature::FILE_LOCAL => {
            let local = message.message(proto::signature::FILE_LOCAL, &FILE_LOCAL_SIGNATURE)?;
            let container = nested(file, index, local.index(file_local_signature::CONTAINER)?, cache)?;
            IdSignature::FileLocal {
                container: Box::new(container),
                id: local.varint(file_local_signature::ID)?,
            }
        }
        _ => {
            let built_in = message.message(proto::signature::BUILT_IN, &BUILT_IN_SIGNATURE)?;
            IdSignature::BuiltIn {
                mangle: file.string(built_in.index(built_in_signature::MANGLE)?)?.to_string(),
                id: built_in.varint(built_in_signature::ID)?,
            }
        }
    };
    cache.insert(index, signature.clone());
    Ok(signature)
}

fn nested(
    file: &LibraryFile,
    parent: u32,
    index: u32,
    cache: &mut FxHashMap<u32, IdSignature>,
) -> Result<IdSignature, WireError> {
    if index >= parent {
        return Err(WireError::InvalidValue {
            message: "Signature",
            field: "container",
            value: u64::from(index),
        });
    }
    read_signature(file, index, cache)
}

fn read_public(file: &LibraryFile, message: &Message<'_>) -> Result<PublicSignature, WireError> {
    Ok(PublicSignature::new(
        FqName::new(file.string(message.index(public_signature::PACKAGE)?)?),
        FqName::new(file.string(message.index(public_signature::DECLARATION)?)?),
        message.opt_varint(public_signature::ID),
        SignatureFlags::from_bits_truncate(message.varint_or_default(public_signature::MASK)),
    ))
}

/// `(kind, signature index)` of symbol `index`.
pub fn read_symbol_entry(file: &LibraryFile, index: u32) -> Result<(SymbolKind, u32), WireError> {
    let message = proto::SYMBOL.decode(file.symbol(index)?)?;
    let kind = message.enumeration(proto::symbol::KIND, symbol_kind_from_wire)?;
    Ok((kind, message.index(proto::symbol::SIGNATURE)?))
}
