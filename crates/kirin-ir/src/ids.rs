//! Arena handles.
//!
//! Declarations, files, modules and symbols all live in flat vectors owned by
//! `IrArena`; everything else refers to them by these u32 newtypes.

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Handle of a declaration in `IrArena`.
    DeclId
);
arena_id!(
    /// Handle of a file in `IrArena`.
    FileId
);
arena_id!(
    /// Handle of a module in `IrArena`.
    ModuleId
);
arena_id!(
    /// Handle of a symbol in `SymbolTable`.
    SymbolId
);

/// The single owner of a declaration. Ownership is a tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclParent {
    File(FileId),
    Decl(DeclId),
}

impl DeclParent {
    pub fn as_decl(self) -> Option<DeclId> {
        match self {
            DeclParent::Decl(id) => Some(id),
            DeclParent::File(_) => None,
        }
    }
}

impl From<FileId> for DeclParent {
    fn from(value: FileId) -> Self {
        DeclParent::File(value)
    }
}

impl From<DeclId> for DeclParent {
    fn from(value: DeclId) -> Self {
        DeclParent::Decl(value)
    }
}
