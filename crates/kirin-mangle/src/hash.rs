//! Mangle hashing and the fixed names of built-in function classes.

/// High bit set on every hashed public mangle.
pub const PUBLIC_MANGLE_FLAG: u64 = 1 << 63;

const BUILT_IN_FUNCTION_MARKER: &str = "<BUILT-IN-FUNCTION>";

/// 64-bit identity of a mangled name with the public flag set.
pub fn hash_mangle(mangle: &str) -> u64 {
    let digest = blake3::hash(mangle.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_le_bytes(bytes) % PUBLIC_MANGLE_FLAG) | PUBLIC_MANGLE_FLAG
}

/// `ktype:<BUILT-IN-FUNCTION>Function2`
pub fn function_class_symbol_name(class_name: &str) -> String {
    format!("ktype:{BUILT_IN_FUNCTION_MARKER}{class_name}")
}

/// `kfun:<BUILT-IN-FUNCTION>Function2.invoke`
pub fn function_invoke_symbol_name(class_name: &str) -> String {
    format!("kfun:{BUILT_IN_FUNCTION_MARKER}{class_name}.invoke")
}
