//! Library message schemas.
//!
//! Field tags are the format's versioning mechanism: a tag is never reused
//! for a different meaning, and readers skip tags they do not know.
//!
//! Within a file, everything refers to everything else by index into the
//! file's tables (strings, signatures, symbols, types, bodies). Nested
//! declarations are embedded in their parent's message.

use crate::schema::{FieldSpec, MessageSchema, WireType};
use kirin_ir::{ClassKind, DeclOrigin, ErrorKind, Modality, SymbolKind, Variance, Visibility};

const V: WireType = WireType::Varint;
const L: WireType = WireType::LengthDelimited;

macro_rules! tags {
    ($module:ident { $($name:ident = $tag:literal),* $(,)? }) => {
        pub mod $module {
            $(pub const $name: u32 = $tag;)*
        }
    };
}

// =============================================================================
// Containers
// =============================================================================

tags!(library { NAME = 1, DEPENDENCY = 2, FILE = 3 });

pub static LIBRARY: MessageSchema = MessageSchema {
    name: "Library",
    fields: &[
        FieldSpec::required(library::NAME, "name", L),
        FieldSpec::repeated(library::DEPENDENCY, "dependency", L),
        FieldSpec::repeated(library::FILE, "file", L),
    ],
};

tags!(file {
    NAME = 1,
    PACKAGE = 2,
    DECLARATION = 3,
    DECLARATION_ID = 4,
    SYMBOL = 5,
    SIGNATURE = 6,
    TYPE = 7,
    STRING = 8,
    BODY = 9,
    EXPLICITLY_EXPORTED = 10,
    ACTUAL = 11,
    ANNOTATION = 12,
    IMPORT = 13,
});

pub static FILE: MessageSchema = MessageSchema {
    name: "File",
    fields: &[
        FieldSpec::required(file::NAME, "name", L),
        FieldSpec::optional(file::PACKAGE, "package", L),
        FieldSpec::repeated(file::DECLARATION, "declaration", L),
        FieldSpec::repeated(file::DECLARATION_ID, "declaration_id", V),
        FieldSpec::repeated(file::SYMBOL, "symbol", L),
        FieldSpec::repeated(file::SIGNATURE, "signature", L),
        FieldSpec::repeated(file::TYPE, "type", L),
        FieldSpec::repeated(file::STRING, "string", L),
        FieldSpec::repeated(file::BODY, "body", L),
        FieldSpec::repeated(file::EXPLICITLY_EXPORTED, "explicitly_exported", V),
        FieldSpec::repeated(file::ACTUAL, "actual", L),
        FieldSpec::repeated(file::ANNOTATION, "annotation", V),
        FieldSpec::repeated(file::IMPORT, "import", L),
    ],
};

tags!(actual { EXPECT = 1, ACTUAL = 2 });

pub static ACTUAL: MessageSchema = MessageSchema {
    name: "Actual",
    fields: &[
        FieldSpec::required(actual::EXPECT, "expect", V),
        FieldSpec::required(actual::ACTUAL, "actual", V),
    ],
};

tags!(import { FQ_NAME = 1, ALL_UNDER = 2, ALIAS = 3 });

pub static IMPORT: MessageSchema = MessageSchema {
    name: "Import",
    fields: &[
        FieldSpec::required(import::FQ_NAME, "fq_name", V),
        FieldSpec::optional(import::ALL_UNDER, "all_under", V),
        FieldSpec::optional(import::ALIAS, "alias", V),
    ],
};

// =============================================================================
// Symbols and signatures
// =============================================================================

tags!(symbol { KIND = 1, SIGNATURE = 2 });

pub static SYMBOL: MessageSchema = MessageSchema {
    name: "Symbol",
    fields: &[
        FieldSpec::required(symbol::KIND, "kind", V),
        FieldSpec::required(symbol::SIGNATURE, "signature", V),
    ],
};

tags!(signature { PUBLIC = 1, ACCESSOR = 2, FILE_LOCAL = 3, BUILT_IN = 4 });

pub static SIGNATURE: MessageSchema = MessageSchema {
    name: "Signature",
    fields: &[
        FieldSpec::optional(signature::PUBLIC, "public", L),
        FieldSpec::optional(signature::ACCESSOR, "accessor", L),
        FieldSpec::optional(signature::FILE_LOCAL, "file_local", L),
        FieldSpec::optional(signature::BUILT_IN, "built_in", L),
    ],
};

tags!(public_signature { PACKAGE = 1, DECLARATION = 2, ID = 3, MASK = 4 });

pub static PUBLIC_SIGNATURE: MessageSchema = MessageSchema {
    name: "PublicSignature",
    fields: &[
        FieldSpec::required(public_signature::PACKAGE, "package", V),
        FieldSpec::required(public_signature::DECLARATION, "declaration", V),
        FieldSpec::optional(public_signature::ID, "id", V),
        FieldSpec::optional(public_signature::MASK, "mask", V),
    ],
};

tags!(accessor_signature { PROPERTY = 1, ACCESSOR = 2 });

pub static ACCESSOR_SIGNATURE: MessageSchema = MessageSchema {
    name: "AccessorSignature",
    fields: &[
        FieldSpec::required(accessor_signature::PROPERTY, "property", V),
        FieldSpec::required(accessor_signature::ACCESSOR, "accessor", L),
    ],
};

tags!(file_local_signature { CONTAINER = 1, ID = 2 });

pub static FILE_LOCAL_SIGNATURE: MessageSchema = MessageSchema {
    name: "FileLocalSignature",
    fields: &[
        FieldSpec::required(file_local_signature::CONTAINER, "container", V),
        FieldSpec::required(file_local_signature::ID, "id", V),
    ],
};

tags!(built_in_signature { MANGLE = 1, ID = 2 });

pub static BUILT_IN_SIGNATURE: MessageSchema = MessageSchema {
    name: "BuiltInSignature",
    fields: &[
        FieldSpec::required(built_in_signature::MANGLE, "mangle", V),
        FieldSpec::required(built_in_signature::ID, "id", V),
    ],
};

// =============================================================================
// Types
// =============================================================================

tags!(ty { SIMPLE = 1, DYNAMIC = 2, ERROR = 3 });

pub static TYPE: MessageSchema = MessageSchema {
    name: "Type",
    fields: &[
        FieldSpec::optional(ty::SIMPLE, "simple", L),
        FieldSpec::optional(ty::DYNAMIC, "dynamic", V),
        FieldSpec::optional(ty::ERROR, "error", V),
    ],
};

tags!(simple_type {
    CLASSIFIER = 1,
    TYPE_PARAMETER = 2,
    ARGUMENT = 3,
    NULLABLE = 4,
    ABBREVIATION = 5,
});

pub static SIMPLE_TYPE: MessageSchema = MessageSchema {
    name: "SimpleType",
    fields: &[
        FieldSpec::required(simple_type::CLASSIFIER, "classifier", V),
        FieldSpec::optional(simple_type::TYPE_PARAMETER, "type_parameter", V),
        FieldSpec::repeated(simple_type::ARGUMENT, "argument", L),
        FieldSpec::optional(simple_type::NULLABLE, "nullable", V),
        FieldSpec::optional(simple_type::ABBREVIATION, "abbreviation", V),
    ],
};

tags!(type_argument { STAR = 1, VARIANCE = 2, TYPE = 3 });

pub static TYPE_ARGUMENT: MessageSchema = MessageSchema {
    name: "TypeArgument",
    fields: &[
        FieldSpec::optional(type_argument::STAR, "star", V),
        FieldSpec::optional(type_argument::VARIANCE, "variance", V),
        FieldSpec::optional(type_argument::TYPE, "type", V),
    ],
};

tags!(type_ref { RESOLVED = 1, ERROR = 2 });

pub static TYPE_REF: MessageSchema = MessageSchema {
    name: "TypeRef",
    fields: &[
        FieldSpec::optional(type_ref::RESOLVED, "resolved", V),
        FieldSpec::optional(type_ref::ERROR, "error", L),
    ],
};

tags!(error_type_ref { KIND = 1, MESSAGE = 2 });

pub static ERROR_TYPE_REF: MessageSchema = MessageSchema {
    name: "ErrorTypeRef",
    fields: &[
        FieldSpec::optional(error_type_ref::KIND, "kind", V),
        FieldSpec::required(error_type_ref::MESSAGE, "message", V),
    ],
};

// =============================================================================
// Declarations
// =============================================================================

tags!(declaration {
    SYMBOL = 1,
    NAME = 2,
    ORIGIN = 3,
    VISIBILITY = 4,
    FLAGS = 5,
    ANNOTATION = 6,
    CLASS = 10,
    TYPE_ALIAS = 11,
    FUNCTION = 12,
    CONSTRUCTOR = 13,
    PROPERTY = 14,
    FIELD = 15,
    ENUM_ENTRY = 16,
    VALUE_PARAMETER = 17,
    TYPE_PARAMETER = 18,
    VARIABLE = 19,
});

pub const DECLARATION_PAYLOADS: &[u32] = &[
    declaration::CLASS,
    declaration::TYPE_ALIAS,
    declaration::FUNCTION,
    declaration::CONSTRUCTOR,
    declaration::PROPERTY,
    declaration::FIELD,
    declaration::ENUM_ENTRY,
    declaration::VALUE_PARAMETER,
    declaration::TYPE_PARAMETER,
    declaration::VARIABLE,
];

pub static DECLARATION: MessageSchema = MessageSchema {
    name: "Declaration",
    fields: &[
        FieldSpec::required(declaration::SYMBOL, "symbol", V),
        FieldSpec::required(declaration::NAME, "name", V),
        FieldSpec::optional(declaration::ORIGIN, "origin", V),
        FieldSpec::optional(declaration::VISIBILITY, "visibility", V),
        FieldSpec::optional(declaration::FLAGS, "flags", V),
        FieldSpec::repeated(declaration::ANNOTATION, "annotation", V),
        FieldSpec::optional(declaration::CLASS, "class", L),
        FieldSpec::optional(declaration::TYPE_ALIAS, "type_alias", L),
        FieldSpec::optional(declaration::FUNCTION, "function", L),
        FieldSpec::optional(declaration::CONSTRUCTOR, "constructor", L),
        FieldSpec::optional(declaration::PROPERTY, "property", L),
        FieldSpec::optional(declaration::FIELD, "field", L),
        FieldSpec::optional(declaration::ENUM_ENTRY, "enum_entry", L),
        FieldSpec::optional(declaration::VALUE_PARAMETER, "value_parameter", L),
        FieldSpec::optional(declaration::TYPE_PARAMETER, "type_parameter", L),
        FieldSpec::optional(declaration::VARIABLE, "variable", L),
    ],
};

tags!(class {
    KIND = 1,
    MODALITY = 2,
    TYPE_PARAMETER = 3,
    SUPER_TYPE = 4,
    MEMBER = 5,
});

pub static CLASS: MessageSchema = MessageSchema {
    name: "Class",
    fields: &[
        FieldSpec::optional(class::KIND, "kind", V),
        FieldSpec::optional(class::MODALITY, "modality", V),
        FieldSpec::repeated(class::TYPE_PARAMETER, "type_parameter", L),
        FieldSpec::repeated(class::SUPER_TYPE, "super_type", L),
        FieldSpec::repeated(class::MEMBER, "member", L),
    ],
};

tags!(type_alias { TYPE_PARAMETER = 1, EXPANDED = 2 });

pub static TYPE_ALIAS: MessageSchema = MessageSchema {
    name: "TypeAlias",
    fields: &[
        FieldSpec::repeated(type_alias::TYPE_PARAMETER, "type_parameter", L),
        FieldSpec::required(type_alias::EXPANDED, "expanded", L),
    ],
};

tags!(function {
    MODALITY = 1,
    TYPE_PARAMETER = 2,
    INHERITED_TYPE_PARAMETER = 3,
    EXTENSION_RECEIVER = 4,
    VALUE_PARAMETER = 5,
    RETURN_TYPE = 6,
    OVERRIDDEN = 7,
    BODY = 8,
});

pub static FUNCTION: MessageSchema = MessageSchema {
    name: "Function",
    fields: &[
        FieldSpec::optional(function::MODALITY, "modality", V),
        FieldSpec::repeated(function::TYPE_PARAMETER, "type_parameter", L),
        FieldSpec::repeated(function::INHERITED_TYPE_PARAMETER, "inherited_type_parameter", V),
        FieldSpec::optional(function::EXTENSION_RECEIVER, "extension_receiver", L),
        FieldSpec::repeated(function::VALUE_PARAMETER, "value_parameter", L),
        FieldSpec::required(function::RETURN_TYPE, "return_type", V),
        FieldSpec::repeated(function::OVERRIDDEN, "overridden", V),
        FieldSpec::optional(function::BODY, "body", V),
    ],
};

tags!(property {
    MODALITY = 1,
    TYPE_PARAMETER = 2,
    GETTER = 3,
    SETTER = 4,
    BACKING_FIELD = 5,
    OVERRIDDEN = 6,
});

pub static PROPERTY: MessageSchema = MessageSchema {
    name: "Property",
    fields: &[
        FieldSpec::optional(property::MODALITY, "modality", V),
        FieldSpec::repeated(property::TYPE_PARAMETER, "type_parameter", L),
        FieldSpec::optional(property::GETTER, "getter", L),
        FieldSpec::optional(property::SETTER, "setter", L),
        FieldSpec::optional(property::BACKING_FIELD, "backing_field", L),
        FieldSpec::repeated(property::OVERRIDDEN, "overridden", V),
    ],
};

tags!(field { TYPE = 1, INITIALIZER = 2 });

pub static FIELD: MessageSchema = MessageSchema {
    name: "Field",
    fields: &[
        FieldSpec::required(field::TYPE, "type", V),
        FieldSpec::optional(field::INITIALIZER, "initializer", V),
    ],
};

pub static ENUM_ENTRY: MessageSchema = MessageSchema {
    name: "EnumEntry",
    fields: &[],
};

tags!(value_parameter { INDEX = 1, TYPE = 2 });

pub static VALUE_PARAMETER: MessageSchema = MessageSchema {
    name: "ValueParameter",
    fields: &[
        FieldSpec::required(value_parameter::INDEX, "index", V),
        FieldSpec::required(value_parameter::TYPE, "type", V),
    ],
};

tags!(type_parameter { INDEX = 1, VARIANCE = 2, SUPER_TYPE = 3 });

pub static TYPE_PARAMETER: MessageSchema = MessageSchema {
    name: "TypeParameter",
    fields: &[
        FieldSpec::optional(type_parameter::INDEX, "index", V),
        FieldSpec::optional(type_parameter::VARIANCE, "variance", V),
        FieldSpec::repeated(type_parameter::SUPER_TYPE, "super_type", V),
    ],
};

tags!(variable { TYPE = 1 });

pub static VARIABLE: MessageSchema = MessageSchema {
    name: "Variable",
    fields: &[FieldSpec::required(variable::TYPE, "type", V)],
};

// =============================================================================
// Bodies
// =============================================================================

tags!(body { BLOCK = 1, EXPRESSION = 2 });

pub static BODY: MessageSchema = MessageSchema {
    name: "Body",
    fields: &[
        FieldSpec::optional(body::BLOCK, "block", L),
        FieldSpec::optional(body::EXPRESSION, "expression", L),
    ],
};

tags!(block { STATEMENT = 1 });

pub static BLOCK: MessageSchema = MessageSchema {
    name: "Block",
    fields: &[FieldSpec::repeated(block::STATEMENT, "statement", L)],
};

tags!(expr {
    CONST = 1,
    CALL = 2,
    GET_VALUE = 3,
    SET_VALUE = 4,
    BLOCK = 5,
    RETURN = 6,
    ERROR = 7,
});

pub static EXPR: MessageSchema = MessageSchema {
    name: "Expr",
    fields: &[
        FieldSpec::optional(expr::CONST, "const", L),
        FieldSpec::optional(expr::CALL, "call", L),
        FieldSpec::optional(expr::GET_VALUE, "get_value", V),
        FieldSpec::optional(expr::SET_VALUE, "set_value", L),
        FieldSpec::optional(expr::BLOCK, "block", L),
        FieldSpec::optional(expr::RETURN, "return", L),
        FieldSpec::optional(expr::ERROR, "error", V),
    ],
};

tags!(constant { NULL = 1, UNIT = 2, BOOLEAN = 3, INT = 4, STRING = 5 });

pub static CONST: MessageSchema = MessageSchema {
    name: "Const",
    fields: &[
        FieldSpec::optional(constant::NULL, "null", V),
        FieldSpec::optional(constant::UNIT, "unit", V),
        FieldSpec::optional(constant::BOOLEAN, "boolean", V),
        FieldSpec::optional(constant::INT, "int", V),
        FieldSpec::optional(constant::STRING, "string", V),
    ],
};

tags!(call { CALLEE = 1, RECEIVER = 2, ARGUMENT = 3 });

pub static CALL: MessageSchema = MessageSchema {
    name: "Call",
    fields: &[
        FieldSpec::required(call::CALLEE, "callee", V),
        FieldSpec::optional(call::RECEIVER, "receiver", L),
        FieldSpec::repeated(call::ARGUMENT, "argument", L),
    ],
};

tags!(assignment { TARGET = 1, VALUE = 2 });

/// Shared by `SetValue` and `Return`.
pub static ASSIGNMENT: MessageSchema = MessageSchema {
    name: "Assignment",
    fields: &[
        FieldSpec::required(assignment::TARGET, "target", V),
        FieldSpec::required(assignment::VALUE, "value", L),
    ],
};

// =============================================================================
// Enumerations
// =============================================================================

macro_rules! wire_enum {
    ($ty:ident, $to:ident, $from:ident { $($variant:ident = $code:literal),* $(,)? }) => {
        pub fn $to(value: $ty) -> u64 {
            match value {
                $($ty::$variant => $code,)*
            }
        }

        pub fn $from(code: u64) -> Option<$ty> {
            match code {
                $($code => Some($ty::$variant),)*
                _ => None,
            }
        }
    };
}

wire_enum!(SymbolKind, symbol_kind_to_wire, symbol_kind_from_wire {
    Class = 0,
    TypeAlias = 1,
    Function = 2,
    Constructor = 3,
    Property = 4,
    Field = 5,
    EnumEntry = 6,
    ValueParameter = 7,
    TypeParameter = 8,
    Variable = 9,
});

wire_enum!(DeclOrigin, origin_to_wire, origin_from_wire {
    Defined = 0,
    FakeOverride = 1,
    ForwardDeclaration = 2,
    BuiltIn = 3,
    Deserialized = 4,
});

wire_enum!(Visibility, visibility_to_wire, visibility_from_wire {
    Public = 0,
    Protected = 1,
    Internal = 2,
    Private = 3,
    Local = 4,
});

wire_enum!(Modality, modality_to_wire, modality_from_wire {
    Final = 0,
    Sealed = 1,
    Open = 2,
    Abstract = 3,
});

/// Functions and properties are never sealed.
pub fn member_modality_from_wire(code: u64) -> Option<Modality> {
    modality_from_wire(code).filter(|&modality| modality != Modality::Sealed)
}

wire_enum!(ClassKind, class_kind_to_wire, class_kind_from_wire {
    Class = 0,
    Interface = 1,
    EnumClass = 2,
    AnnotationClass = 3,
    Object = 4,
});

wire_enum!(Variance, variance_to_wire, variance_from_wire {
    Invariant = 0,
    In = 1,
    Out = 2,
});

wire_enum!(ErrorKind, error_kind_to_wire, error_kind_from_wire {
    LoopInSupertypes = 0,
    TypeParameterAsSupertype = 1,
    UnresolvedExpansion = 2,
    UnresolvedReference = 3,
    WrongTypeArgumentCount = 4,
});
