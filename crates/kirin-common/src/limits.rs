//! Centralized limits and thresholds for the kirin middle-end.
//!
//! The resolver and the linker are both re-entrant graph walks over data that
//! comes from outside the compiler (user code, or bytes from a library). Every
//! walk that could be driven arbitrarily deep by its input is bounded here.

// =============================================================================
// Supertype Resolution
// =============================================================================

/// Maximum number of type-alias hops followed when expanding an alias chain.
///
/// ```kotlin
/// typealias A = B
/// typealias B = C
/// // ... 64 levels ...
/// ```
///
/// Chains longer than this are reported as unresolved expansions instead of
/// overflowing the stack.
pub const MAX_ALIAS_CHAIN_DEPTH: usize = 64;

/// Maximum depth of nested type arguments resolved in one type reference
/// (`List<List<List<...>>>`).
pub const MAX_TYPE_ARGUMENT_DEPTH: usize = 128;

// =============================================================================
// Subtyping
// =============================================================================

/// Maximum depth of the supertype walk performed by the override type checker.
pub const MAX_SUBTYPE_WALK_DEPTH: usize = 256;

// =============================================================================
// Wire Format
// =============================================================================

/// Nesting limit for length-delimited messages.
///
/// Declarations nest (classes contain functions containing value parameters
/// containing types), so the default protobuf limit of 64 is far too small.
pub const MAX_MESSAGE_NESTING: usize = 65_535;

/// Largest length prefix accepted for a single length-delimited field.
pub const MAX_FIELD_LENGTH: usize = 256 * 1024 * 1024;
