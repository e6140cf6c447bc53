//! Cross-module declaration identities (`IdSignature`).
//!
//! A signature names a declaration independently of any arena index, so the
//! linker can match a reference read from one library against the declaration
//! that another library provides.
//!
//! | Kind | Identity | Example render |
//! |------|----------|----------------|
//! | `Public` | package + declaration path + hash + mask | `lib/A.foo\|123[0]` |
//! | `Accessor` | the accessor's public part only | `lib/A.x.<get-x>\|9[0]` |
//! | `FileLocal` | container + per-module index | `lib/A\|null[0]:4` |
//! | `BuiltIn` | the hashed mangle only | `<ß\|operator#EQEQ@...>` |

use bitflags::bitflags;
use kirin_common::FqName;
use std::fmt;
use std::hash::{Hash, Hasher};

bitflags! {
    /// Bits stored in the mask of a public signature.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SignatureFlags: u64 {
        /// The declaration is (or is nested in) an `expect` declaration.
        const EXPECT = 1;
    }
}

/// Package of the synthetic built-in operator signatures.
pub const BUILT_IN_PACKAGE: &str = "kotlin.internal.ir";

// =============================================================================
// PublicSignature
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicSignature {
    pub package_fq_name: FqName,
    /// Path of the declaration inside its package (`Outer.Inner.member`).
    /// The root path denotes the package itself.
    pub declaration_fq_name: FqName,
    /// Hashed mangle for overloadable declarations (functions, properties).
    pub id: Option<u64>,
    pub mask: SignatureFlags,
}

impl PublicSignature {
    pub fn new(
        package_fq_name: FqName,
        declaration_fq_name: FqName,
        id: Option<u64>,
        mask: SignatureFlags,
    ) -> Self {
        Self {
            package_fq_name,
            declaration_fq_name,
            id,
            mask,
        }
    }

    pub fn package(package_fq_name: FqName) -> Self {
        Self::new(package_fq_name, FqName::ROOT, None, SignatureFlags::empty())
    }

    pub fn is_package(&self) -> bool {
        self.id.is_none() && self.declaration_fq_name.is_root()
    }

    /// The signature of the outermost declaration on the path.
    pub fn top_level(&self) -> PublicSignature {
        let segments = self.declaration_fq_name.path_segments();
        if segments.len() <= 1 {
            return self.clone();
        }
        PublicSignature::new(
            self.package_fq_name.clone(),
            FqName::new(segments[0]),
            None,
            self.mask,
        )
    }

    pub fn short_name(&self) -> &str {
        self.declaration_fq_name.short_name()
    }

    pub fn render(&self) -> String {
        let id = match self.id {
            Some(id) => id.to_string(),
            None => "null".to_string(),
        };
        format!(
            "{}/{}|{}[{:b}]",
            self.package_fq_name.as_str(),
            self.declaration_fq_name.as_str(),
            id,
            self.mask.bits()
        )
    }
}

// =============================================================================
// IdSignature
// =============================================================================

#[derive(Clone, Debug)]
pub enum IdSignature {
    Public(PublicSignature),
    /// A property accessor: identified by its own public signature, but its
    /// top level is the property's top level.
    Accessor {
        property: Box<IdSignature>,
        accessor: PublicSignature,
    },
    /// A non-exported declaration, unique only within its module.
    FileLocal {
        container: Box<IdSignature>,
        id: u64,
    },
    /// A known compiler built-in, identified by its hashed mangle.
    BuiltIn { mangle: String, id: u64 },
}

impl IdSignature {
    pub fn public(package: &str, declaration: &str, id: Option<u64>) -> Self {
        IdSignature::Public(PublicSignature::new(
            FqName::new(package),
            FqName::new(declaration),
            id,
            SignatureFlags::empty(),
        ))
    }

    pub fn as_public(&self) -> Option<&PublicSignature> {
        match self {
            IdSignature::Public(public) => Some(public),
            IdSignature::Accessor { accessor, .. } => Some(accessor),
            _ => None,
        }
    }

    /// Signatures that are comparable across modules.
    pub fn is_public(&self) -> bool {
        !self.is_local()
    }

    pub fn is_local(&self) -> bool {
        matches!(self, IdSignature::FileLocal { .. })
    }

    pub fn is_package(&self) -> bool {
        matches!(self, IdSignature::Public(public) if public.is_package())
    }

    pub fn is_built_in(&self) -> bool {
        matches!(self, IdSignature::BuiltIn { .. })
    }

    pub fn is_expect(&self) -> bool {
        self.as_public()
            .is_some_and(|public| public.mask.contains(SignatureFlags::EXPECT))
    }

    /// The signature of the top-level declaration this one is nested in.
    /// The linker enqueues and deserializes top levels, never nested members.
    pub fn top_level(&self) -> IdSignature {
        match self {
            IdSignature::Public(public) => IdSignature::Public(public.top_level()),
            IdSignature::Accessor { property, .. } => property.top_level(),
            IdSignature::FileLocal { container, .. } => {
                let top = container.top_level();
                if top.is_package() && top == **container {
                    self.clone()
                } else {
                    top
                }
            }
            IdSignature::BuiltIn { .. } => self.clone(),
        }
    }

    pub fn nearest_public(&self) -> IdSignature {
        match self {
            IdSignature::FileLocal { container, .. } => container.nearest_public(),
            _ => self.clone(),
        }
    }

    pub fn package_fq_name(&self) -> FqName {
        match self {
            IdSignature::Public(public) => public.package_fq_name.clone(),
            IdSignature::Accessor { property, .. } => property.package_fq_name(),
            IdSignature::FileLocal { container, .. } => container.package_fq_name(),
            IdSignature::BuiltIn { .. } => FqName::new(BUILT_IN_PACKAGE),
        }
    }

    pub fn render(&self) -> String {
        match self {
            IdSignature::Public(public) => public.render(),
            IdSignature::Accessor { accessor, .. } => accessor.render(),
            IdSignature::FileLocal { container, id } => format!("{}:{}", container.render(), id),
            IdSignature::BuiltIn { mangle, .. } => format!("<ß|{mangle}>"),
        }
    }
}

impl PartialEq for IdSignature {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IdSignature::BuiltIn { id: a, .. }, IdSignature::BuiltIn { id: b, .. }) => a == b,
            (
                IdSignature::FileLocal {
                    container: c1,
                    id: a,
                },
                IdSignature::FileLocal {
                    container: c2,
                    id: b,
                },
            ) => a == b && c1 == c2,
            _ => match (self.as_public(), other.as_public()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Eq for IdSignature {}

impl Hash for IdSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            // Public and accessor signatures compare by their public part,
            // so they must hash the same way.
            IdSignature::Public(public) | IdSignature::Accessor {
                accessor: public, ..
            } => public.hash(state),
            IdSignature::FileLocal { container, id } => {
                1u8.hash(state);
                container.hash(state);
                id.hash(state);
            }
            IdSignature::BuiltIn { id, .. } => {
                2u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Display for IdSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
