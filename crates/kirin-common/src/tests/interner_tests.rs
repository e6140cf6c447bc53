use super::*;

#[test]
fn test_interner_deduplicates() {
    let mut interner = Interner::new();
    let a1 = interner.intern("Base");
    let a2 = interner.intern("Base");
    let a3 = interner.intern("Derived");

    assert_eq!(a1, a2);
    assert_ne!(a1, a3);
    assert_eq!(interner.resolve(a3), "Derived");
}

#[test]
fn test_interner_empty_is_none() {
    let mut interner = Interner::new();
    assert!(interner.is_empty());
    assert_eq!(interner.intern(""), Atom::NONE);
    assert!(Atom::NONE.is_none());
    assert_eq!(interner.resolve(Atom::NONE), "");
}

#[test]
fn test_interner_out_of_range_atom() {
    let interner = Interner::new();
    assert_eq!(interner.resolve(Atom(4096)), "");
    assert!(interner.try_resolve(Atom(4096)).is_none());
}

#[test]
fn test_interner_common_strings() {
    let mut interner = Interner::new();
    interner.intern_common();
    assert!(interner.lookup("Any").is_some());
    assert!(interner.lookup("<init>").is_some());
    assert!(interner.lookup("notThere").is_none());
    let before = interner.len();
    interner.intern_common();
    assert_eq!(interner.len(), before);
}

#[test]
fn test_diagnostic_bag_collects_errors() {
    use crate::diagnostics::{diagnostic_codes, format_message};

    let mut bag = DiagnosticBag::new();
    assert!(!bag.has_errors());
    let message = format_message("Loop in supertype definition for {0}", &["A"]);
    bag.error("/A", message, diagnostic_codes::LOOP_IN_SUPERTYPES);

    assert_eq!(bag.len(), 1);
    assert!(bag.has_errors());
    let diagnostic = bag.iter().next().expect("one diagnostic");
    assert_eq!(diagnostic.message_text, "Loop in supertype definition for A");
    assert_eq!(
        diagnostic.to_string(),
        "/A - error K1001: Loop in supertype definition for A"
    );

    let json = serde_json::to_string(diagnostic).expect("serialize");
    assert!(json.contains("\"category\":\"error\""));
}
