//! Fully qualified names.
//!
//! `FqName` is a dot-separated path (`kotlin.collections.List`). The empty
//! path is the root package. Signatures, import directives and the mangler all
//! speak in `FqName`s, so they are plain owned strings rather than interned
//! atoms: a signature must render identically no matter which interner
//! produced the declaration.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Names the language reserves for compiler-synthesized declarations.
pub struct SpecialNames;

impl SpecialNames {
    /// Name given to anonymous objects and other unnamed classes.
    pub const NO_NAME_PROVIDED: &'static str = "<no name provided>";
    /// Name of constructors.
    pub const INIT: &'static str = "<init>";
    /// Name of dispatch and extension receiver parameters.
    pub const THIS: &'static str = "<this>";
    /// Name of the implicit setter parameter.
    pub const SETTER_PARAMETER: &'static str = "<set-?>";
    /// Default name of a companion object.
    pub const DEFAULT_COMPANION: &'static str = "Companion";

    /// Whether `name` is a special (angle-bracketed) name.
    pub fn is_special(name: &str) -> bool {
        name.starts_with('<') && name.ends_with('>')
    }
}

/// A dot-separated fully qualified name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FqName(String);

impl FqName {
    /// The root package.
    pub const ROOT: FqName = FqName(String::new());

    pub fn new(path: impl Into<String>) -> Self {
        FqName(path.into())
    }

    /// Build a name from individual segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(segment.as_ref());
        }
        FqName(out)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The segments of the path, outermost first. The root has no segments.
    pub fn path_segments(&self) -> SmallVec<[&str; 4]> {
        if self.is_root() {
            return SmallVec::new();
        }
        self.0.split('.').collect()
    }

    /// Append one segment.
    pub fn child(&self, segment: &str) -> FqName {
        if self.is_root() {
            FqName(segment.to_string())
        } else {
            FqName(format!("{}.{}", self.0, segment))
        }
    }

    /// Drop the last segment. The parent of the root is the root.
    pub fn parent(&self) -> FqName {
        match self.0.rfind('.') {
            Some(pos) => FqName(self.0[..pos].to_string()),
            None => FqName::ROOT,
        }
    }

    /// Last segment, or the empty string for the root.
    pub fn short_name(&self) -> &str {
        match self.0.rfind('.') {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }

    /// Whether `self` equals `prefix` or starts with `prefix.`.
    pub fn starts_with(&self, prefix: &FqName) -> bool {
        if prefix.is_root() {
            return true;
        }
        self.0 == prefix.0
            || (self.0.starts_with(prefix.as_str())
                && self.0.as_bytes().get(prefix.0.len()) == Some(&b'.'))
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for FqName {
    fn from(value: &str) -> Self {
        FqName::new(value)
    }
}
