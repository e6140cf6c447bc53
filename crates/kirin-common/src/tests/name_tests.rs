use super::*;

#[test]
fn test_fq_name_segments() {
    let name = FqName::new("kotlin.collections.List");
    assert_eq!(name.path_segments().as_slice(), &["kotlin", "collections", "List"]);
    assert_eq!(name.short_name(), "List");
    assert_eq!(name.parent(), FqName::new("kotlin.collections"));
    assert!(FqName::ROOT.path_segments().is_empty());
}

#[test]
fn test_fq_name_child_of_root() {
    assert_eq!(FqName::ROOT.child("A"), FqName::new("A"));
    assert_eq!(FqName::new("a.b").child("C"), FqName::new("a.b.C"));
    assert_eq!(FqName::new("A").parent(), FqName::ROOT);
    assert_eq!(FqName::ROOT.to_string(), "<root>");
}

#[test]
fn test_fq_name_starts_with_respects_segments() {
    let name = FqName::new("kotlin.coroutines");
    assert!(name.starts_with(&FqName::new("kotlin")));
    assert!(name.starts_with(&FqName::ROOT));
    assert!(!FqName::new("kotlinx.io").starts_with(&FqName::new("kotlin")));
}

#[test]
fn test_fq_name_from_segments() {
    assert_eq!(FqName::from_segments(&["a", "b"]), FqName::new("a.b"));
    assert!(FqName::from_segments::<&str>(&[]).is_root());
}

#[test]
fn test_special_names() {
    assert!(SpecialNames::is_special(SpecialNames::INIT));
    assert!(!SpecialNames::is_special(SpecialNames::DEFAULT_COMPANION));
}
