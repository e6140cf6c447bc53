//! Built-in declarations.
//!
//! Every arena starts with a `<builtins>` module holding the handful of
//! `kotlin` classes the middle-end itself needs (`Any`, `Nothing`, `Unit`,
//! primitives, `Function`) plus the known operator functions of
//! `kotlin.internal.ir`. Function classes (`Function3`, `SuspendFunction1`,
//! `KFunction0`, ...) form an unbounded family and are materialized on
//! demand by [`IrArena::function_class`].

use crate::arena::IrArena;
use crate::decl::{
    ClassData, ClassKind, DeclData, DeclFlags, DeclOrigin, FunctionData, Modality,
    TypeParameterData, ValueParameterData,
};
use crate::ids::{DeclId, DeclParent, FileId, ModuleId};
use crate::signature::BUILT_IN_PACKAGE;
use crate::types::{Classifier, IrType, SimpleType, TypeArgument, TypeRef, Variance};
use kirin_common::FqName;
use rustc_hash::FxHashMap;
use tracing::trace;

pub const BUILTINS_MODULE_NAME: &str = "<builtins>";

// =============================================================================
// Function classes
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FunctionClassKind {
    Function,
    SuspendFunction,
    KFunction,
    KSuspendFunction,
}

impl FunctionClassKind {
    pub const ALL: [FunctionClassKind; 4] = [
        FunctionClassKind::Function,
        FunctionClassKind::SuspendFunction,
        FunctionClassKind::KFunction,
        FunctionClassKind::KSuspendFunction,
    ];

    pub fn package(self) -> &'static str {
        match self {
            FunctionClassKind::Function => "kotlin",
            FunctionClassKind::SuspendFunction => "kotlin.coroutines",
            FunctionClassKind::KFunction | FunctionClassKind::KSuspendFunction => "kotlin.reflect",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            FunctionClassKind::Function => "Function",
            FunctionClassKind::SuspendFunction => "SuspendFunction",
            FunctionClassKind::KFunction => "KFunction",
            FunctionClassKind::KSuspendFunction => "KSuspendFunction",
        }
    }

    pub fn is_suspend(self) -> bool {
        matches!(
            self,
            FunctionClassKind::SuspendFunction | FunctionClassKind::KSuspendFunction
        )
    }

    pub fn class_name(self, arity: u32) -> String {
        format!("{}{}", self.prefix(), arity)
    }

    /// Recognize `K?(Suspend)?Function<digits>` in its home package.
    pub fn parse(package: &str, name: &str) -> Option<(FunctionClassKind, u32)> {
        let (reflect, rest) = match name.strip_prefix('K') {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let (suspend, rest) = match rest.strip_prefix("Suspend") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let digits = rest.strip_prefix("Function")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let arity = digits.parse().ok()?;
        let kind = match (reflect, suspend) {
            (false, false) => FunctionClassKind::Function,
            (false, true) => FunctionClassKind::SuspendFunction,
            (true, false) => FunctionClassKind::KFunction,
            (true, true) => FunctionClassKind::KSuspendFunction,
        };
        (kind.package() == package).then_some((kind, arity))
    }
}

// =============================================================================
// IrBuiltIns
// =============================================================================

/// A built-in operator and the fixed mangle its signature is derived from.
#[derive(Clone, Debug)]
pub struct KnownOperator {
    pub decl: DeclId,
    pub mangle: String,
}

#[derive(Clone, Debug, Default)]
pub struct IrBuiltIns {
    pub module: ModuleId,
    pub file: FileId,
    pub any: DeclId,
    pub nothing: DeclId,
    pub unit: DeclId,
    pub boolean: DeclId,
    pub int: DeclId,
    pub long: DeclId,
    pub string: DeclId,
    pub function: DeclId,
    operators: Vec<KnownOperator>,
    function_classes: FxHashMap<(FunctionClassKind, u32), DeclId>,
    package_files: FxHashMap<&'static str, FileId>,
}

/// `(name, parameter types, return type)`; types name classes of this module,
/// `?` marks nullability.
const OPERATORS: &[(&str, &[&str], &str)] = &[
    ("EQEQ", &["Any?", "Any?"], "Boolean"),
    ("EQEQEQ", &["Any?", "Any?"], "Boolean"),
    ("less", &["Int", "Int"], "Boolean"),
    ("lessOrEqual", &["Int", "Int"], "Boolean"),
    ("greater", &["Int", "Int"], "Boolean"),
    ("greaterOrEqual", &["Int", "Int"], "Boolean"),
    ("ANDAND", &["Boolean", "Boolean"], "Boolean"),
    ("OROR", &["Boolean", "Boolean"], "Boolean"),
    ("noWhenBranchMatchedException", &[], "Nothing"),
    ("illegalArgumentException", &["String"], "Nothing"),
];

impl IrBuiltIns {
    pub(crate) fn install(arena: &mut IrArena) -> IrBuiltIns {
        let module = arena.add_module(BUILTINS_MODULE_NAME, Vec::new());
        let file = arena.add_file(module, "builtins.kt", FqName::new("kotlin"));

        let any = builtin_class(arena, file, "Any", ClassKind::Class, Modality::Open);
        let nothing = builtin_class(arena, file, "Nothing", ClassKind::Class, Modality::Final);
        let unit = builtin_class(arena, file, "Unit", ClassKind::Object, Modality::Final);
        let boolean = builtin_class(arena, file, "Boolean", ClassKind::Class, Modality::Final);
        let int = builtin_class(arena, file, "Int", ClassKind::Class, Modality::Final);
        let long = builtin_class(arena, file, "Long", ClassKind::Class, Modality::Final);
        let string = builtin_class(arena, file, "String", ClassKind::Class, Modality::Final);
        let function = builtin_class(arena, file, "Function", ClassKind::Interface, Modality::Abstract);

        let mut builtins = IrBuiltIns {
            module,
            file,
            any,
            nothing,
            unit,
            boolean,
            int,
            long,
            string,
            function,
            ..IrBuiltIns::default()
        };
        builtins.package_files.insert("kotlin", file);

        let any_type = arena.class_type(any);

        // interface Function<out R>
        add_type_parameter(arena, function, "R", 0, Variance::Out, vec![any_type.clone().nullable()]);
        for class in [nothing, unit, boolean, int, long, string, function] {
            if let Some(data) = arena.decl_mut(class).as_class_mut() {
                data.super_types.push(TypeRef::Resolved(any_type.clone()));
            }
        }

        // open fun equals(other: Any?): Boolean / hashCode(): Int / toString(): String
        let boolean_type = arena.class_type(boolean);
        let int_type = arena.class_type(int);
        let string_type = arena.class_type(string);
        let equals = builtin_function(arena, DeclParent::Decl(any), "equals", Modality::Open, boolean_type);
        add_value_parameter(arena, equals, "other", 0, any_type.clone().nullable());
        builtin_function(arena, DeclParent::Decl(any), "hashCode", Modality::Open, int_type);
        builtin_function(arena, DeclParent::Decl(any), "toString", Modality::Open, string_type);

        let operator_file = arena.add_file(module, "operators.kt", FqName::new(BUILT_IN_PACKAGE));
        for &(name, parameters, returns) in OPERATORS {
            let return_type = builtins.named_type(arena, returns);
            let decl = builtin_function(
                arena,
                DeclParent::File(operator_file),
                name,
                Modality::Final,
                return_type,
            );
            arena.decl_mut(decl).flags |= DeclFlags::OPERATOR;
            for (index, parameter) in parameters.iter().enumerate() {
                let ty = builtins.named_type(arena, parameter);
                add_value_parameter(arena, decl, &format!("arg{index}"), index as i32, ty);
            }
            let qualified: Vec<String> = parameters.iter().map(|p| format!("kotlin.{p}")).collect();
            builtins.operators.push(KnownOperator {
                decl,
                mangle: format!("operator#{}@{}", name, qualified.join(";")),
            });
        }
        builtins
    }

    fn named_type(&self, arena: &IrArena, name: &str) -> IrType {
        let (name, nullable) = match name.strip_suffix('?') {
            Some(name) => (name, true),
            None => (name, false),
        };
        let class = match name {
            "Any" => self.any,
            "Nothing" => self.nothing,
            "Unit" => self.unit,
            "Boolean" => self.boolean,
            "Int" => self.int,
            "Long" => self.long,
            _ => self.string,
        };
        arena.class_type(class).with_nullability(nullable)
    }

    pub fn operators(&self) -> &[KnownOperator] {
        &self.operators
    }

    /// Function classes materialized so far.
    pub fn function_classes(&self) -> impl Iterator<Item = ((FunctionClassKind, u32), DeclId)> + '_ {
        self.function_classes.iter().map(|(&key, &decl)| (key, decl))
    }
}

fn builtin_class(
    arena: &mut IrArena,
    file: FileId,
    name: &str,
    kind: ClassKind,
    modality: Modality,
) -> DeclId {
    let id = arena.declare(
        name,
        DeclParent::File(file),
        DeclData::Class(ClassData {
            kind,
            modality,
            type_parameters: Vec::new(),
            super_types: Vec::new(),
            members: Vec::new(),
        }),
    );
    arena.decl_mut(id).origin = DeclOrigin::BuiltIn;
    arena.attach(id);
    id
}

fn builtin_function(
    arena: &mut IrArena,
    parent: DeclParent,
    name: &str,
    modality: Modality,
    return_type: IrType,
) -> DeclId {
    let id = arena.declare(
        name,
        parent,
        DeclData::Function(FunctionData {
            modality,
            type_parameters: Vec::new(),
            extension_receiver: None,
            value_parameters: Vec::new(),
            return_type,
            overridden: Vec::new(),
            corresponding_property: None,
            body: None,
        }),
    );
    arena.decl_mut(id).origin = DeclOrigin::BuiltIn;
    arena.attach(id);
    id
}

fn add_value_parameter(arena: &mut IrArena, function: DeclId, name: &str, index: i32, ty: IrType) {
    let parameter = arena.declare(
        name,
        DeclParent::Decl(function),
        DeclData::ValueParameter(ValueParameterData { index, ty }),
    );
    if let Some(data) = arena.decl_mut(function).as_function_mut() {
        data.value_parameters.push(parameter);
    }
}

fn add_type_parameter(
    arena: &mut IrArena,
    owner: DeclId,
    name: &str,
    index: u32,
    variance: Variance,
    bound: Vec<IrType>,
) -> IrType {
    let parameter = arena.declare(
        name,
        DeclParent::Decl(owner),
        DeclData::TypeParameter(TypeParameterData {
            index,
            variance,
            super_types: bound,
        }),
    );
    let ty = IrType::type_parameter(arena.decl(parameter).symbol);
    match &mut arena.decl_mut(owner).data {
        DeclData::Class(class) => class.type_parameters.push(parameter),
        DeclData::Function(function) => function.type_parameters.push(parameter),
        _ => {}
    }
    ty
}

// =============================================================================
// Lazy function classes
// =============================================================================

impl IrArena {
    /// The function class `kind` of `arity`, creating it on first request:
    ///
    /// ```kotlin
    /// interface Function2<in P1, in P2, out R> : Function<R> {
    ///     operator fun invoke(p1: P1, p2: P2): R
    /// }
    /// ```
    pub fn function_class(&mut self, kind: FunctionClassKind, arity: u32) -> DeclId {
        if let Some(&existing) = self.builtins.function_classes.get(&(kind, arity)) {
            return existing;
        }
        let file = match self.builtins.package_files.get(kind.package()) {
            Some(&file) => file,
            None => {
                let module = self.builtins.module;
                let file = self.add_file(
                    module,
                    format!("{}.kt", kind.package()),
                    FqName::new(kind.package()),
                );
                self.builtins.package_files.insert(kind.package(), file);
                file
            }
        };
        trace!(class = %kind.class_name(arity), "materializing function class");
        let class = builtin_class(
            self,
            file,
            &kind.class_name(arity),
            ClassKind::Interface,
            Modality::Abstract,
        );
        let bound = self.nullable_any_type();
        let mut parameter_types = Vec::with_capacity(arity as usize);
        for i in 0..arity {
            parameter_types.push(add_type_parameter(
                self,
                class,
                &format!("P{}", i + 1),
                i,
                Variance::In,
                vec![bound.clone()],
            ));
        }
        let return_type =
            add_type_parameter(self, class, "R", arity, Variance::Out, vec![bound]);

        let base = self.builtins.function;
        let base_symbol = self.decl(base).symbol;
        let super_type = IrType::Simple(SimpleType {
            classifier: Classifier::Class(base_symbol),
            arguments: vec![TypeArgument::Projection {
                variance: Variance::Invariant,
                ty: return_type.clone(),
            }],
            nullable: false,
            abbreviation: None,
        });
        if let Some(data) = self.decl_mut(class).as_class_mut() {
            data.super_types.push(TypeRef::Resolved(super_type));
        }

        let invoke = builtin_function(
            self,
            DeclParent::Decl(class),
            "invoke",
            Modality::Abstract,
            return_type,
        );
        let mut flags = DeclFlags::OPERATOR;
        if kind.is_suspend() {
            flags |= DeclFlags::SUSPEND;
        }
        self.decl_mut(invoke).flags |= flags;
        for (i, ty) in parameter_types.into_iter().enumerate() {
            add_value_parameter(self, invoke, &format!("p{}", i + 1), i as i32, ty);
        }

        self.builtins.function_classes.insert((kind, arity), class);
        class
    }

    /// Whether `class` is a materialized function class.
    pub fn function_class_kind(&self, class: DeclId) -> Option<(FunctionClassKind, u32)> {
        if self.module_of(class) != self.builtins.module || !self.is_top_level(class) {
            return None;
        }
        FunctionClassKind::parse(self.package_of(class).as_str(), self.decl_name(class))
    }

    pub fn any_type(&self) -> IrType {
        self.class_type(self.builtins.any)
    }

    pub fn nullable_any_type(&self) -> IrType {
        self.any_type().nullable()
    }

    pub fn unit_type(&self) -> IrType {
        self.class_type(self.builtins.unit)
    }

    pub fn nothing_type(&self) -> IrType {
        self.class_type(self.builtins.nothing)
    }

    pub fn boolean_type(&self) -> IrType {
        self.class_type(self.builtins.boolean)
    }

    pub fn int_type(&self) -> IrType {
        self.class_type(self.builtins.int)
    }

    pub fn string_type(&self) -> IrType {
        self.class_type(self.builtins.string)
    }
}
