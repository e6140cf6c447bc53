//! Library Container
//!
//! A library is one serialized module:
//!
//! ```text
//! "KIRL" <version: varint> Library { name, dependency*, file* }
//! ```
//!
//! Loading a library only splits each file into its tables. Table entries
//! stay encoded until the linker dereferences them by index.

use crate::error::WireError;
use crate::proto::{self, file, library};
use crate::schema::{Message, MessageWriter};
use crate::varint::{ByteReader, write_varint};

pub const LIBRARY_MAGIC: &[u8; 4] = b"KIRL";
pub const LIBRARY_VERSION: u64 = 1;
/// File extension of serialized libraries.
pub const LIBRARY_EXTENSION: &str = "kirl";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IrLibrary {
    pub name: String,
    /// Names of the modules this one was compiled against.
    pub dependencies: Vec<String>,
    pub files: Vec<LibraryFile>,
}

/// The tables of one serialized file. Entries are encoded messages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LibraryFile {
    pub name: String,
    pub package: String,
    /// Top-level declarations, parallel to `declaration_ids`.
    pub declarations: Vec<Vec<u8>>,
    /// Signature index of each top-level declaration.
    pub declaration_ids: Vec<u32>,
    pub symbols: Vec<Vec<u8>>,
    pub signatures: Vec<Vec<u8>>,
    pub types: Vec<Vec<u8>>,
    pub strings: Vec<Vec<u8>>,
    pub bodies: Vec<Vec<u8>>,
    /// Signature indices of top levels linked whenever the file is.
    pub explicitly_exported: Vec<u32>,
    pub actuals: Vec<Vec<u8>>,
    /// String indices of the file's annotations.
    pub annotations: Vec<u32>,
    pub imports: Vec<Vec<u8>>,
}

fn entry<'a>(entries: &'a [Vec<u8>], table: &'static str, index: u32) -> Result<&'a [u8], WireError> {
    entries
        .get(index as usize)
        .map(Vec::as_slice)
        .ok_or(WireError::IndexOutOfRange {
            table,
            index: u64::from(index),
            len: entries.len(),
        })
}

impl LibraryFile {
    pub fn declaration(&self, index: u32) -> Result<&[u8], WireError> {
        entry(&self.declarations, "declaration", index)
    }

    pub fn symbol(&self, index: u32) -> Result<&[u8], WireError> {
        entry(&self.symbols, "symbol", index)
    }

    pub fn signature(&self, index: u32) -> Result<&[u8], WireError> {
        entry(&self.signatures, "signature", index)
    }

    pub fn ty(&self, index: u32) -> Result<&[u8], WireError> {
        entry(&self.types, "type", index)
    }

    pub fn body(&self, index: u32) -> Result<&[u8], WireError> {
        entry(&self.bodies, "body", index)
    }

    pub fn string(&self, index: u32) -> Result<&str, WireError> {
        let bytes = entry(&self.strings, "string", index)?;
        std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 {
            index: u64::from(index),
        })
    }

    fn encode(&self) -> MessageWriter {
        let mut w = MessageWriter::new();
        w.string(file::NAME, &self.name);
        if !self.package.is_empty() {
            w.string(file::PACKAGE, &self.package);
        }
        for declaration in &self.declarations {
            w.bytes(file::DECLARATION, declaration);
        }
        for &id in &self.declaration_ids {
            w.varint(file::DECLARATION_ID, u64::from(id));
        }
        for symbol in &self.symbols {
            w.bytes(file::SYMBOL, symbol);
        }
        for signature in &self.signatures {
            w.bytes(file::SIGNATURE, signature);
        }
        for ty in &self.types {
            w.bytes(file::TYPE, ty);
        }
        for string in &self.strings {
            w.bytes(file::STRING, string);
        }
        for body in &self.bodies {
            w.bytes(file::BODY, body);
        }
        for &id in &self.explicitly_exported {
            w.varint(file::EXPLICITLY_EXPORTED, u64::from(id));
        }
        for actual in &self.actuals {
            w.bytes(file::ACTUAL, actual);
        }
        for &annotation in &self.annotations {
            w.varint(file::ANNOTATION, u64::from(annotation));
        }
        for import in &self.imports {
            w.bytes(file::IMPORT, import);
        }
        w
    }

    fn decode(message: &Message<'_>) -> Result<Self, WireError> {
        let owned = |tag| message.repeated_bytes(tag).map(<[u8]>::to_vec).collect();
        let file = LibraryFile {
            name: utf8(message.bytes(file::NAME)?)?,
            package: message.opt_bytes(file::PACKAGE).map(utf8).transpose()?.unwrap_or_default(),
            declarations: owned(file::DECLARATION),
            declaration_ids: message.repeated_indices(file::DECLARATION_ID)?,
            symbols: owned(file::SYMBOL),
            signatures: owned(file::SIGNATURE),
            types: owned(file::TYPE),
            strings: owned(file::STRING),
            bodies: owned(file::BODY),
            explicitly_exported: message.repeated_indices(file::EXPLICITLY_EXPORTED)?,
            actuals: owned(file::ACTUAL),
            annotations: message.repeated_indices(file::ANNOTATION)?,
            imports: owned(file::IMPORT),
        };
        if file.declarations.len() != file.declaration_ids.len() {
            return Err(WireError::IndexOutOfRange {
                table: "declaration_id",
                index: file.declarations.len() as u64,
                len: file.declaration_ids.len(),
            });
        }
        Ok(file)
    }
}

fn utf8(bytes: &[u8]) -> Result<String, WireError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8 { index: 0 })
}

impl IrLibrary {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = MessageWriter::new();
        w.string(library::NAME, &self.name);
        for dependency in &self.dependencies {
            w.string(library::DEPENDENCY, dependency);
        }
        for file in &self.files {
            w.message(library::FILE, file.encode());
        }

        let mut out = LIBRARY_MAGIC.to_vec();
        write_varint(&mut out, LIBRARY_VERSION);
        out.extend_from_slice(&w.finish());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let body = bytes
            .strip_prefix(LIBRARY_MAGIC.as_slice())
            .ok_or(WireError::BadMagic)?;
        let mut reader = ByteReader::new(body);
        let version = reader.read_varint()?;
        if version != LIBRARY_VERSION {
            return Err(WireError::UnsupportedVersion {
                found: version,
                expected: LIBRARY_VERSION,
            });
        }
        let body = &body[reader.cursor()..];

        let message = proto::LIBRARY.decode(body)?;
        let files = message
            .repeated_messages(library::FILE, &proto::FILE)?
            .iter()
            .map(LibraryFile::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IrLibrary {
            name: utf8(message.bytes(library::NAME)?)?,
            dependencies: message
                .repeated_bytes(library::DEPENDENCY)
                .map(utf8)
                .collect::<Result<_, _>>()?,
            files,
        })
    }

    /// Total number of top-level declarations across all files.
    pub fn top_level_count(&self) -> usize {
        self.files.iter().map(|file| file.declarations.len()).sum()
    }
}
