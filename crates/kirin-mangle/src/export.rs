//! Export Classification
//!
//! Decides whether a declaration belongs to its module's ABI and therefore
//! gets a public, cross-module signature. Everything else is file-local.

use kirin_common::{FqName, SpecialNames};
use kirin_ir::{DeclData, DeclId, DeclParent, IrArena, Visibility};

pub const PUBLISHED_API_ANNOTATION: &str = "kotlin.PublishedApi";

pub struct ExportChecker<'a> {
    arena: &'a IrArena,
    published_api: FqName,
}

impl<'a> ExportChecker<'a> {
    pub fn new(arena: &'a IrArena) -> Self {
        Self {
            arena,
            published_api: FqName::new(PUBLISHED_API_ANNOTATION),
        }
    }

    pub fn check(&self, decl: DeclId) -> bool {
        let declaration = self.arena.decl(decl);
        match &declaration.data {
            DeclData::ValueParameter(_) | DeclData::Variable { .. } | DeclData::TypeParameter(_) => {
                false
            }
            DeclData::Field(field) => {
                let annotated = field.corresponding_property.unwrap_or(decl);
                self.is_exported(decl, annotated, Some(declaration.visibility))
            }
            DeclData::Function(function) => {
                let annotated = function.corresponding_property.unwrap_or(decl);
                self.is_exported(decl, annotated, Some(declaration.visibility))
            }
            DeclData::Constructor(_) => {
                let class = self.arena.parent_decl(decl);
                match class {
                    Some(class)
                        if self
                            .arena
                            .decl(class)
                            .as_class()
                            .is_some_and(|c| c.kind.is_singleton()) =>
                    {
                        self.check(class)
                    }
                    _ => self.is_exported(decl, decl, Some(declaration.visibility)),
                }
            }
            DeclData::TypeAlias(_) if self.arena.is_top_level(decl) => true,
            DeclData::Class(_) if self.arena.decl_name(decl) == SpecialNames::NO_NAME_PROVIDED => {
                false
            }
            DeclData::EnumEntry => self.is_exported(decl, decl, None),
            _ => self.is_exported(decl, decl, Some(declaration.visibility)),
        }
    }

    /// `annotated` carries the annotations consulted (a property for its
    /// accessors and backing field); `visibility` is `None` when the kind has
    /// no visibility of its own.
    fn is_exported(&self, decl: DeclId, annotated: DeclId, visibility: Option<Visibility>) -> bool {
        if self.arena.decl(annotated).has_annotation(&self.published_api) {
            return true;
        }
        if visibility.is_some_and(|v| !v.is_publicly_visible()) {
            return false;
        }
        match self.arena.decl(decl).parent {
            DeclParent::File(_) => true,
            DeclParent::Decl(parent) => self.check(parent),
        }
    }
}
