//! The state of one link: the arena everything is read into and the
//! signature table shared by the linker, the serializer and the fake-override
//! builder. Created once per compilation and dropped at the end of it.

use kirin_ir::IrArena;
use kirin_mangle::{GlobalDeclarationTable, IrMangler, Mangler};

pub struct LinkSession<M: Mangler = IrMangler> {
    pub arena: IrArena,
    pub table: GlobalDeclarationTable<M>,
}

impl LinkSession<IrMangler> {
    pub fn new() -> Self {
        let mut arena = IrArena::new();
        let table = GlobalDeclarationTable::new(&mut arena);
        Self { arena, table }
    }
}

impl Default for LinkSession<IrMangler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Mangler> LinkSession<M> {
    /// Wrap an arena that was built elsewhere together with its table.
    pub fn from_parts(arena: IrArena, table: GlobalDeclarationTable<M>) -> Self {
        Self { arena, table }
    }
}
