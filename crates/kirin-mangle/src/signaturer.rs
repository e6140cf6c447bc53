//! Signature Composition
//!
//! Turns a declaration into its `IdSignature`:
//! - exported declarations get a public signature: package, the class path
//!   down to the declaration, and for callables the hashed mangle;
//! - accessors get an accessor signature tied to their property;
//! - everything else gets a file-local signature: the container's signature
//!   (supplied by the memoizing table) plus a counter unique within the
//!   composing table.

use crate::mangler::Mangler;
use kirin_common::FqName;
use kirin_ir::{
    DeclId, DeclKind, DeclParent, FileId, IdSignature, IrArena, PublicSignature, SignatureFlags,
};
use smallvec::SmallVec;

pub struct Signaturer<M: Mangler> {
    mangler: M,
    local_index: u64,
}

impl<M: Mangler> Signaturer<M> {
    pub fn new(mangler: M, start_index: u64) -> Self {
        Self {
            mangler,
            local_index: start_index,
        }
    }

    pub fn mangler(&self) -> &M {
        &self.mangler
    }

    /// # Panics
    /// When `decl` is not exported.
    pub fn compose_public_signature(&self, arena: &IrArena, decl: DeclId) -> IdSignature {
        assert!(
            self.mangler.is_exported(arena, decl),
            "Public signature requested for non-exported declaration {}",
            arena.render(decl)
        );
        let declaration = arena.decl(decl);
        let property = declaration
            .as_function()
            .and_then(|function| function.corresponding_property);
        match property {
            Some(property) => {
                let property_signature = self.build_public(arena, property);
                let accessor = PublicSignature::new(
                    property_signature.package_fq_name.clone(),
                    property_signature
                        .declaration_fq_name
                        .parent()
                        .child(arena.decl_name(decl)),
                    Some(self.mangler.hashed_mangle(arena, decl)),
                    property_signature.mask,
                );
                IdSignature::Accessor {
                    property: Box::new(IdSignature::Public(property_signature)),
                    accessor,
                }
            }
            None => IdSignature::Public(self.build_public(arena, decl)),
        }
    }

    /// `container` is the signature of the declaration's parent, or the
    /// package signature for a top-level declaration.
    ///
    /// # Panics
    /// When `decl` is exported.
    pub fn compose_file_local_signature(
        &mut self,
        arena: &IrArena,
        decl: DeclId,
        container: IdSignature,
    ) -> IdSignature {
        assert!(
            !self.mangler.is_exported(arena, decl),
            "File-local signature requested for exported declaration {}",
            arena.render(decl)
        );
        self.local_index += 1;
        IdSignature::FileLocal {
            container: Box::new(container),
            id: self.local_index,
        }
    }

    pub fn package_signature(arena: &IrArena, file: FileId) -> IdSignature {
        IdSignature::Public(PublicSignature::package(arena.file(file).package.clone()))
    }

    fn build_public(&self, arena: &IrArena, decl: DeclId) -> PublicSignature {
        let id = match arena.decl(decl).kind() {
            DeclKind::Function | DeclKind::Constructor | DeclKind::Property | DeclKind::Field => {
                Some(self.mangler.hashed_mangle(arena, decl))
            }
            DeclKind::Class | DeclKind::TypeAlias | DeclKind::EnumEntry => None,
            kind => panic!(
                "Unexpected {kind:?} in public signature of {}",
                arena.render(decl)
            ),
        };

        let mut segments: SmallVec<[&str; 4]> = SmallVec::new();
        let mut mask = SignatureFlags::empty();
        let mut current = decl;
        let file = loop {
            let declaration = arena.decl(current);
            segments.push(arena.name(declaration.name));
            if declaration.is_expect() {
                mask |= SignatureFlags::EXPECT;
            }
            match declaration.parent {
                DeclParent::File(file) => break file,
                DeclParent::Decl(parent) => current = parent,
            }
        };
        segments.reverse();

        PublicSignature::new(
            arena.file(file).package.clone(),
            FqName::from_segments(&segments[..]),
            id,
            mask,
        )
    }
}
