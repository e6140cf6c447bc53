//! Builds IR from a [`ProjectSpec`].
//!
//! Elaboration runs in three passes so declarations can refer to each other
//! in any order:
//! 1. classes and type aliases are declared with their type parameters and
//!    raw (unresolved) supertypes;
//! 2. functions and properties are declared, their types resolved against
//!    the classes from pass 1;
//! 3. call bodies and expect/actual pairs are wired up.
//!
//! Member types are looked up by name in the enclosing type parameters, then
//! the file's package, then as a fully qualified name, then in `kotlin`.

use anyhow::{Context, Result, anyhow, bail};
use kirin_common::FqName;
use kirin_ir::{
    Body, ClassKind, DeclFlags, DeclId, DeclParent, Expr, FileId, ImportDirective, IrArena,
    IrBuilder, IrType, Modality, ModuleId, SymbolId, TypeRef, UserTypeRef,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::project::{
    ClassSpec, CommonSpec, DeclSpec, FunctionSpec, ModalitySpec, ProjectSpec, PropertySpec,
    TypeSyntax, parse_type,
};

/// Elaborate every module of `project` into `arena`, in project order.
pub fn elaborate(arena: &mut IrArena, project: &ProjectSpec) -> Result<Vec<ModuleId>> {
    let mut elaborator = Elaborator::new(arena);
    elaborator.run(arena, project)
}

type TypeScope = Vec<(String, IrType)>;

#[derive(Default)]
struct Elaborator {
    /// Class symbols by fully qualified name.
    classes: FxHashMap<String, SymbolId>,
    /// Classes in the order pass 1 declared them; pass 2 walks the same order.
    class_order: Vec<DeclId>,
    cursor: usize,
    type_parameters: FxHashMap<DeclId, TypeScope>,
    /// Functions, and property getters under the property's name.
    callables: FxHashMap<String, DeclId>,
    pending_calls: Vec<(DeclId, Vec<String>)>,
    expects: FxHashMap<String, Vec<DeclId>>,
    actuals: Vec<(FileId, DeclId)>,
}

impl Elaborator {
    fn new(arena: &IrArena) -> Self {
        let mut elaborator = Elaborator::default();
        let builtins = arena.builtins();
        for class in [
            builtins.any,
            builtins.nothing,
            builtins.unit,
            builtins.boolean,
            builtins.int,
            builtins.long,
            builtins.string,
        ] {
            elaborator
                .classes
                .insert(arena.fq_name(class).as_str().to_string(), arena.decl(class).symbol);
        }
        elaborator
    }

    fn run(&mut self, arena: &mut IrArena, project: &ProjectSpec) -> Result<Vec<ModuleId>> {
        let mut modules: FxHashMap<&str, ModuleId> = FxHashMap::default();
        let mut files = Vec::new();
        for module in &project.modules {
            if modules.contains_key(module.name.as_str()) || arena.module_by_name(&module.name).is_some() {
                bail!("module `{}` is declared twice", module.name);
            }
            let dependencies = module
                .dependencies
                .iter()
                .map(|name| {
                    modules.get(name.as_str()).copied().ok_or_else(|| {
                        anyhow!(
                            "module `{}` depends on `{name}`, which is not declared before it",
                            module.name
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let id = IrBuilder::new(arena).module_with_deps(&module.name, &dependencies);
            modules.insert(&module.name, id);

            for file_spec in &module.files {
                let file = IrBuilder::new(arena).file(id, &file_spec.name, &file_spec.package);
                for import in &file_spec.imports {
                    IrBuilder::new(arena).import(file, parse_import(import));
                }
                for decl in &file_spec.declarations {
                    self.declare_classifiers(arena, file.into(), file, decl)
                        .with_context(|| format!("in {}/{}", module.name, file_spec.name))?;
                }
                files.push((file, file_spec));
            }
        }

        for &(file, file_spec) in &files {
            let package = FqName::new(file_spec.package.as_str());
            for decl in &file_spec.declarations {
                self.declare_members(arena, file.into(), file, decl, &Vec::new(), &package)
                    .with_context(|| format!("in {}", file_spec.name))?;
            }
        }

        self.wire_calls(arena)?;
        self.wire_actuals(arena)?;
        debug!(
            modules = modules.len(),
            classes = self.class_order.len(),
            callables = self.callables.len(),
            "project elaborated"
        );
        Ok(project
            .modules
            .iter()
            .filter_map(|module| modules.get(module.name.as_str()).copied())
            .collect())
    }

    // =========================================================================
    // Pass 1: classifiers
    // =========================================================================

    fn declare_classifiers(
        &mut self,
        arena: &mut IrArena,
        parent: DeclParent,
        file: FileId,
        decl: &DeclSpec,
    ) -> Result<()> {
        match decl {
            DeclSpec::Class(spec)
            | DeclSpec::Interface(spec)
            | DeclSpec::Object(spec)
            | DeclSpec::EnumClass(spec) => {
                let kind = decl.class_kind().unwrap_or(ClassKind::Class);
                let id = self.declare_class(arena, parent, kind, spec)?;
                self.register_top_level(arena, parent, file, id, &spec.common);
                for member in &spec.members {
                    self.declare_classifiers(arena, id.into(), file, member)?;
                }
            }
            DeclSpec::TypeAlias(spec) => {
                let expanded = TypeRef::Unresolved(user_type(arena, &parse_type(&spec.expands_to)?));
                let mut b = IrBuilder::new(arena);
                let id = b.type_alias(parent, &spec.name, expanded);
                for name in &spec.type_parameters {
                    b.alias_type_parameter(id, name);
                }
            }
            DeclSpec::Function(_) | DeclSpec::Property(_) => {}
        }
        Ok(())
    }

    fn declare_class(
        &mut self,
        arena: &mut IrArena,
        parent: DeclParent,
        kind: ClassKind,
        spec: &ClassSpec,
    ) -> Result<DeclId> {
        let supertypes = spec
            .supertypes
            .iter()
            .map(|text| Ok(TypeRef::Unresolved(user_type(arena, &parse_type(text)?))))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("in supertypes of {}", spec.name))?;

        let mut b = IrBuilder::new(arena);
        let mut class = match kind {
            ClassKind::Interface => b.interface(parent, &spec.name),
            kind => b.class(parent, &spec.name).kind(kind),
        };
        if let Some(modality) = spec.common.modality {
            class = class.modality(modality.into());
        }
        class = class.flag(decl_flags(&spec.common));
        if spec.companion {
            class = class.flag(DeclFlags::COMPANION);
        }
        let scope: TypeScope = spec
            .type_parameters
            .iter()
            .map(|name| (name.clone(), class.type_parameter(name)))
            .collect();
        for supertype in supertypes {
            class = class.super_type(supertype);
        }
        let id = class.build();
        for entry in &spec.enum_entries {
            b.enum_entry(id, entry);
        }

        let fq_name = arena.fq_name(id).as_str().to_string();
        trace!(class = %fq_name, "class declared");
        self.classes.insert(fq_name, arena.decl(id).symbol);
        self.class_order.push(id);
        self.type_parameters.insert(id, scope);
        Ok(id)
    }

    // =========================================================================
    // Pass 2: callables
    // =========================================================================

    fn declare_members(
        &mut self,
        arena: &mut IrArena,
        parent: DeclParent,
        file: FileId,
        decl: &DeclSpec,
        scope: &TypeScope,
        package: &FqName,
    ) -> Result<()> {
        match decl {
            DeclSpec::Class(spec)
            | DeclSpec::Interface(spec)
            | DeclSpec::Object(spec)
            | DeclSpec::EnumClass(spec) => {
                let id = self.next_class()?;
                let inner = self.type_parameters.get(&id).cloned().unwrap_or_default();
                for member in &spec.members {
                    self.declare_members(arena, id.into(), file, member, &inner, package)?;
                }
            }
            DeclSpec::Function(spec) => {
                let id = self
                    .declare_function(arena, parent, spec, scope, package)
                    .with_context(|| format!("in function {}", spec.name))?;
                self.register_top_level(arena, parent, file, id, &spec.common);
            }
            DeclSpec::Property(spec) => {
                let id = self
                    .declare_property(arena, parent, spec, scope, package)
                    .with_context(|| format!("in property {}", spec.name))?;
                self.register_top_level(arena, parent, file, id, &spec.common);
            }
            DeclSpec::TypeAlias(_) => {}
        }
        Ok(())
    }

    fn next_class(&mut self) -> Result<DeclId> {
        let id = self
            .class_order
            .get(self.cursor)
            .copied()
            .ok_or_else(|| anyhow!("class declarations changed between passes"))?;
        self.cursor += 1;
        Ok(id)
    }

    fn declare_function(
        &mut self,
        arena: &mut IrArena,
        parent: DeclParent,
        spec: &FunctionSpec,
        outer: &TypeScope,
        package: &FqName,
    ) -> Result<DeclId> {
        let modality = member_modality(&spec.name, spec.common.modality)?;
        let unit = arena.unit_type();
        let mut b = IrBuilder::new(arena);
        let mut function = b.function(parent, &spec.name);
        let mut scope = outer.clone();
        for name in &spec.type_parameters {
            scope.push((name.clone(), function.type_parameter(name)));
        }

        if let Some(receiver) = &spec.receiver {
            function = function.receiver(self.resolve_type(receiver, &scope, package)?);
        }
        for parameter in &spec.parameters {
            let ty = self.resolve_type(&parameter.ty, &scope, package)?;
            function = function.param(&parameter.name, ty);
        }
        let returns = match &spec.returns {
            Some(text) => self.resolve_type(text, &scope, package)?,
            None => unit,
        };
        function = function.returns(returns).flag(decl_flags(&spec.common));
        if let Some(modality) = modality {
            function = function.modality(modality);
        }
        let id = function.build();

        if !spec.calls.is_empty() {
            self.pending_calls.push((id, spec.calls.clone()));
        }
        self.callables
            .entry(arena.fq_name(id).as_str().to_string())
            .or_insert(id);
        Ok(id)
    }

    fn declare_property(
        &mut self,
        arena: &mut IrArena,
        parent: DeclParent,
        spec: &PropertySpec,
        scope: &TypeScope,
        package: &FqName,
    ) -> Result<DeclId> {
        let modality = member_modality(&spec.name, spec.common.modality)?;
        let ty = self.resolve_type(&spec.ty, scope, package)?;
        let mut b = IrBuilder::new(arena);
        let mut property = b.property(parent, &spec.name, ty);
        if spec.var {
            property = property.var();
        }
        if spec.backing_field {
            property = property.backing_field();
        }
        if let Some(modality) = modality {
            property = property.modality(modality);
        }
        let id = property.flag(decl_flags(&spec.common)).build();

        if let Some(getter) = arena.decl(id).as_property().and_then(|p| p.getter) {
            self.callables
                .entry(arena.fq_name(id).as_str().to_string())
                .or_insert(getter);
        }
        Ok(id)
    }

    fn resolve_type(&self, text: &str, scope: &TypeScope, package: &FqName) -> Result<IrType> {
        self.resolve_syntax(&parse_type(text)?, scope, package)
    }

    fn resolve_syntax(&self, syntax: &TypeSyntax, scope: &TypeScope, package: &FqName) -> Result<IrType> {
        if let [name] = syntax.path.as_slice() {
            if name == "dynamic" {
                return Ok(IrType::Dynamic);
            }
            if let Some((_, ty)) = scope.iter().rev().find(|(n, _)| n == name) {
                return Ok(ty.with_nullability(syntax.nullable));
            }
        }
        let dotted = syntax.dotted();
        let candidates = [
            package.child(&dotted).as_str().to_string(),
            dotted.clone(),
            format!("kotlin.{dotted}"),
        ];
        let symbol = candidates
            .iter()
            .find_map(|candidate| self.classes.get(candidate))
            .copied()
            .ok_or_else(|| anyhow!("unknown type `{dotted}`"))?;
        let arguments = syntax
            .arguments
            .iter()
            .map(|argument| self.resolve_syntax(argument, scope, package))
            .collect::<Result<Vec<_>>>()?;
        Ok(IrType::class(symbol, arguments).with_nullability(syntax.nullable))
    }

    fn register_top_level(
        &mut self,
        arena: &mut IrArena,
        parent: DeclParent,
        file: FileId,
        id: DeclId,
        common: &CommonSpec,
    ) {
        if !matches!(parent, DeclParent::File(_)) {
            return;
        }
        if common.exported {
            IrBuilder::new(arena).explicitly_export(file, id);
        }
        if common.expect {
            self.expects
                .entry(arena.fq_name(id).as_str().to_string())
                .or_default()
                .push(id);
        }
        if common.actual {
            self.actuals.push((file, id));
        }
    }

    // =========================================================================
    // Pass 3: bodies and expect/actual
    // =========================================================================

    fn wire_calls(&mut self, arena: &mut IrArena) -> Result<()> {
        for (function, callees) in std::mem::take(&mut self.pending_calls) {
            let statements = callees
                .iter()
                .map(|callee| {
                    let target = self.callables.get(callee).copied().ok_or_else(|| {
                        anyhow!("{} calls unknown `{callee}`", arena.render(function))
                    })?;
                    Ok(Expr::Call {
                        callee: arena.decl(target).symbol,
                        receiver: None,
                        arguments: Vec::new(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            if let Some(data) = arena.decl_mut(function).as_function_mut() {
                data.body = Some(Body::Block(statements));
            }
        }
        Ok(())
    }

    /// Pair every top-level `actual` with the `expect` of the same name in
    /// another module.
    fn wire_actuals(&mut self, arena: &mut IrArena) -> Result<()> {
        for (file, actual) in std::mem::take(&mut self.actuals) {
            let fq_name = arena.fq_name(actual).as_str().to_string();
            let module = arena.file(file).module;
            let expect = self
                .expects
                .get(&fq_name)
                .into_iter()
                .flatten()
                .copied()
                .find(|&expect| arena.module_of(expect) != module)
                .ok_or_else(|| anyhow!("actual {fq_name} has no expect declaration"))?;
            IrBuilder::new(arena).expect_actual(file, expect, actual);
        }
        Ok(())
    }
}

fn member_modality(name: &str, modality: Option<ModalitySpec>) -> Result<Option<Modality>> {
    match modality {
        Some(ModalitySpec::Sealed) => bail!("member `{name}` cannot be sealed"),
        other => Ok(other.map(Modality::from)),
    }
}

fn decl_flags(common: &CommonSpec) -> DeclFlags {
    let mut flags = DeclFlags::empty();
    if common.expect {
        flags |= DeclFlags::EXPECT;
    }
    if common.actual {
        flags |= DeclFlags::ACTUAL;
    }
    flags
}

fn user_type(arena: &mut IrArena, syntax: &TypeSyntax) -> UserTypeRef {
    let arguments = syntax
        .arguments
        .iter()
        .map(|argument| user_type(arena, argument))
        .collect();
    let path = if syntax.nullable {
        format!("{}?", syntax.dotted())
    } else {
        syntax.dotted()
    };
    IrBuilder::new(arena).user_type_ref(&path, arguments)
}

pub fn parse_import(text: &str) -> ImportDirective {
    let text = text.trim();
    if let Some(package) = text.strip_suffix(".*") {
        return ImportDirective::star(package);
    }
    match text.split_once(" as ") {
        Some((path, alias)) => ImportDirective {
            alias: Some(alias.trim().to_string()),
            ..ImportDirective::explicit(path.trim())
        },
        None => ImportDirective::explicit(text),
    }
}

