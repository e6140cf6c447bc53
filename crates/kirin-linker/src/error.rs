//! Link and wire-format errors.

use thiserror::Error;

/// A malformed library.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("varint at offset {offset} does not fit in 64 bits")]
    VarintOverflow { offset: usize },

    #[error("length-delimited field of {length} bytes exceeds the limit of {limit}")]
    FieldTooLong { length: u64, limit: usize },

    #[error("unsupported wire type {wire_type} for field {tag} of {message}")]
    UnsupportedWireType {
        message: &'static str,
        tag: u32,
        wire_type: u8,
    },

    #[error("field {field} of {message} has wire type {found}, expected {expected}")]
    WireTypeMismatch {
        message: &'static str,
        field: &'static str,
        found: u8,
        expected: u8,
    },

    #[error("missing required field {field} in {message}")]
    MissingField {
        message: &'static str,
        field: &'static str,
    },

    #[error("invalid value {value} for {field} in {message}")]
    InvalidValue {
        message: &'static str,
        field: &'static str,
        value: u64,
    },

    #[error("message {message} has none of its alternatives set")]
    EmptyOneof { message: &'static str },

    #[error("{table} index {index} out of range ({len} entries)")]
    IndexOutOfRange {
        table: &'static str,
        index: u64,
        len: usize,
    },

    #[error("string table entry {index} is not valid UTF-8")]
    InvalidUtf8 { index: u64 },

    #[error("message nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("not a kirin library (bad magic)")]
    BadMagic,

    #[error("unsupported library format version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u64 },
}

/// A failed serialization or link pass. Any of these aborts the whole pass.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("Deserializer for declaration {signature} is not found")]
    NoDeserializerFound { signature: String },

    #[error("No file for {signature} in module {module}")]
    NoFileForSignature { signature: String, module: String },

    #[error("No top level declaration {signature} in file {file}")]
    MissingTopLevel { signature: String, file: String },

    #[error("Declaration {signature} is declared twice")]
    DuplicateDeclaration { signature: String },

    #[error("Module {module} is already loaded")]
    DuplicateModule { module: String },

    #[error("Module {module} depends on {dependency}, which is not loaded")]
    MissingDependency { module: String, dependency: String },

    #[error("Expect {expect} is already mapped to {existing}, cannot map it to {actual}")]
    ConflictingActual {
        expect: String,
        existing: String,
        actual: String,
    },

    #[error("Unexpected {kind} symbol {signature} in expect/actual linking")]
    UnexpectedExpectSymbol { signature: String, kind: String },

    #[error("Symbol {symbol} has neither an owner nor a signature")]
    UnsignedSymbol { symbol: u32 },

    #[error("Unresolved type reference in {declaration}; resolve supertypes before serializing")]
    UnresolvedTypeReference { declaration: String },
}

pub type LinkResult<T> = Result<T, LinkError>;
