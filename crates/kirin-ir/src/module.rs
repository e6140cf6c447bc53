//! Modules and files.

use crate::ids::{DeclId, FileId, ModuleId, SymbolId};
use kirin_common::FqName;

#[derive(Clone, Debug)]
pub struct IrModule {
    pub name: String,
    pub files: Vec<FileId>,
    pub dependencies: Vec<ModuleId>,
}

/// `import a.b.C`, `import a.b.*` or `import a.b.C as D`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportDirective {
    pub fq_name: FqName,
    pub all_under: bool,
    pub alias: Option<String>,
}

impl ImportDirective {
    pub fn explicit(fq_name: impl Into<FqName>) -> Self {
        Self {
            fq_name: fq_name.into(),
            all_under: false,
            alias: None,
        }
    }

    pub fn star(package: impl Into<FqName>) -> Self {
        Self {
            fq_name: package.into(),
            all_under: true,
            alias: None,
        }
    }

    /// The name the import introduces into scope (explicit imports only).
    pub fn imported_name(&self) -> Option<&str> {
        if self.all_under {
            return None;
        }
        Some(
            self.alias
                .as_deref()
                .unwrap_or_else(|| self.fq_name.short_name()),
        )
    }
}

/// An `actual` declaration and the `expect` it implements.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExpectActual {
    pub expect: SymbolId,
    pub actual: SymbolId,
}

#[derive(Clone, Debug)]
pub struct IrFile {
    pub module: ModuleId,
    pub name: String,
    pub package: FqName,
    pub imports: Vec<ImportDirective>,
    pub declarations: Vec<DeclId>,
    pub annotations: Vec<FqName>,
    pub actuals: Vec<ExpectActual>,
    /// Top levels that must be linked whenever this file is touched.
    pub explicitly_exported: Vec<SymbolId>,
}

impl IrFile {
    pub fn new(module: ModuleId, name: impl Into<String>, package: FqName) -> Self {
        Self {
            module,
            name: name.into(),
            package,
            imports: Vec::new(),
            declarations: Vec::new(),
            annotations: Vec::new(),
            actuals: Vec::new(),
            explicitly_exported: Vec::new(),
        }
    }
}
