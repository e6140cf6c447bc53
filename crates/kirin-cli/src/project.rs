//! JSON project descriptions.
//!
//! A project lists modules in dependency order; each module holds files and
//! each file holds declarations. Types are written as source-like strings
//! (`kotlin.collections.List<T>?`) and parsed with [`parse_type`].
//!
//! ```json
//! {
//!   "modules": [{
//!     "name": "lib",
//!     "files": [{
//!       "name": "shapes.kt",
//!       "package": "shapes",
//!       "declarations": [
//!         { "kind": "interface", "name": "Shape",
//!           "members": [{ "kind": "function", "name": "area", "returns": "Int", "modality": "abstract" }] },
//!         { "kind": "class", "name": "Square", "supertypes": ["Shape"], "exported": true }
//!       ]
//!     }]
//!   }]
//! }
//! ```

use anyhow::{Context, Result, bail};
use kirin_ir::{ClassKind, Modality};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSpec {
    pub modules: Vec<ModuleSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSpec {
    pub name: String,
    #[serde(default)]
    pub package: String,
    /// `a.b.C`, `a.b.C as D` or `a.b.*`.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub declarations: Vec<DeclSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeclSpec {
    Class(ClassSpec),
    Interface(ClassSpec),
    Object(ClassSpec),
    EnumClass(ClassSpec),
    Function(FunctionSpec),
    Property(PropertySpec),
    TypeAlias(TypeAliasSpec),
}

impl DeclSpec {
    pub fn name(&self) -> &str {
        match self {
            DeclSpec::Class(spec)
            | DeclSpec::Interface(spec)
            | DeclSpec::Object(spec)
            | DeclSpec::EnumClass(spec) => &spec.name,
            DeclSpec::Function(spec) => &spec.name,
            DeclSpec::Property(spec) => &spec.name,
            DeclSpec::TypeAlias(spec) => &spec.name,
        }
    }

    pub fn class_kind(&self) -> Option<ClassKind> {
        match self {
            DeclSpec::Class(_) => Some(ClassKind::Class),
            DeclSpec::Interface(_) => Some(ClassKind::Interface),
            DeclSpec::Object(_) => Some(ClassKind::Object),
            DeclSpec::EnumClass(_) => Some(ClassKind::EnumClass),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalitySpec {
    Final,
    Sealed,
    Open,
    Abstract,
}

impl From<ModalitySpec> for Modality {
    fn from(value: ModalitySpec) -> Self {
        match value {
            ModalitySpec::Final => Modality::Final,
            ModalitySpec::Sealed => Modality::Sealed,
            ModalitySpec::Open => Modality::Open,
            ModalitySpec::Abstract => Modality::Abstract,
        }
    }
}

/// Flags shared by every declaration kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonSpec {
    #[serde(default)]
    pub modality: Option<ModalitySpec>,
    #[serde(default)]
    pub expect: bool,
    #[serde(default)]
    pub actual: bool,
    /// Listed in the file's explicitly exported declarations.
    #[serde(default)]
    pub exported: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpec {
    pub name: String,
    #[serde(flatten)]
    pub common: CommonSpec,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub companion: bool,
    #[serde(default)]
    pub enum_entries: Vec<String>,
    #[serde(default)]
    pub members: Vec<DeclSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub name: String,
    #[serde(flatten)]
    pub common: CommonSpec,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub returns: Option<String>,
    /// Fully qualified callees (`lib.foo`, `lib.Box.get`); a property name
    /// calls its getter.
    #[serde(default)]
    pub calls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    pub name: String,
    #[serde(flatten)]
    pub common: CommonSpec,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub var: bool,
    #[serde(default)]
    pub backing_field: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAliasSpec {
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    pub expands_to: String,
}

pub fn parse_project(source: &str) -> Result<ProjectSpec> {
    let project = serde_json::from_str(source).context("failed to parse project description")?;
    Ok(project)
}

pub fn load_project(path: &Path) -> Result<ProjectSpec> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read project: {}", path.display()))?;
    parse_project(&source).with_context(|| format!("in {}", path.display()))
}

// =============================================================================
// Type strings
// =============================================================================

/// A parsed type string: a dotted path, arguments on the last segment and
/// an optional trailing `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSyntax {
    pub path: Vec<String>,
    pub arguments: Vec<TypeSyntax>,
    pub nullable: bool,
}

impl TypeSyntax {
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

pub fn parse_type(text: &str) -> Result<TypeSyntax> {
    let mut parser = TypeParser {
        text,
        chars: text.char_indices().peekable(),
    };
    let ty = parser.parse()?;
    parser.skip_whitespace();
    if let Some(&(at, c)) = parser.chars.peek() {
        bail!("unexpected '{c}' at {at} in type `{text}`");
    }
    Ok(ty)
}

struct TypeParser<'s> {
    text: &'s str,
    chars: std::iter::Peekable<std::str::CharIndices<'s>>,
}

impl TypeParser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let mut name = String::new();
        while let Some((_, c)) = self.chars.next_if(|&(_, c)| c.is_alphanumeric() || c == '_') {
            name.push(c);
        }
        if name.is_empty() {
            bail!("expected a name in type `{}`", self.text);
        }
        Ok(name)
    }

    fn parse(&mut self) -> Result<TypeSyntax> {
        let mut path = vec![self.identifier()?];
        while self.eat('.') {
            path.push(self.identifier()?);
        }
        let mut arguments = Vec::new();
        if self.eat('<') {
            loop {
                arguments.push(self.parse()?);
                if self.eat('>') {
                    break;
                }
                if !self.eat(',') {
                    bail!("expected ',' or '>' in type `{}`", self.text);
                }
            }
        }
        let nullable = self.eat('?');
        Ok(TypeSyntax {
            path,
            arguments,
            nullable,
        })
    }
}
