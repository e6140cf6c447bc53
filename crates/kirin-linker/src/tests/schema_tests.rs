use super::*;
use crate::schema::{FieldSpec, MessageSchema, MessageWriter, WireType};

mod tags {
    pub const ID: u32 = 1;
    pub const NAME: u32 = 2;
    pub const CHILD: u32 = 3;
    pub const LEFT: u32 = 4;
    pub const RIGHT: u32 = 5;
}

static NODE: MessageSchema = MessageSchema {
    name: "Node",
    fields: &[
        FieldSpec::required(tags::ID, "id", WireType::Varint),
        FieldSpec::optional(tags::NAME, "name", WireType::LengthDelimited),
        FieldSpec::repeated(tags::CHILD, "child", WireType::LengthDelimited),
        FieldSpec::optional(tags::LEFT, "left", WireType::Varint),
        FieldSpec::optional(tags::RIGHT, "right", WireType::Varint),
    ],
};

fn node(id: u64) -> MessageWriter {
    let mut w = MessageWriter::new();
    w.varint(tags::ID, id);
    w
}

#[test]
fn test_reads_known_fields() {
    let mut w = node(7);
    w.string(tags::NAME, "root");
    w.message(tags::CHILD, node(1));
    w.message(tags::CHILD, node(2));
    let bytes = w.finish();

    let message = NODE.decode(&bytes).unwrap();
    assert_eq!(message.varint(tags::ID).unwrap(), 7);
    assert_eq!(message.bytes(tags::NAME).unwrap(), b"root");
    let children = message.repeated_messages(tags::CHILD, &NODE).unwrap();
    let ids: Vec<u64> = children.iter().map(|c| c.varint(tags::ID).unwrap()).collect();
    assert_eq!(ids, [1, 2]);
}

#[test]
fn test_unknown_tags_are_skipped() {
    let mut w = node(3);
    w.varint(40, 99);
    w.string(41, "from a newer writer");
    let bytes = w.finish();

    let message = NODE.decode(&bytes).unwrap();
    assert_eq!(message.varint(tags::ID).unwrap(), 3);
    assert!(!message.has(40));
}

#[test]
fn test_missing_required_field() {
    let mut w = MessageWriter::new();
    w.string(tags::NAME, "anonymous");
    let bytes = w.finish();
    assert_eq!(
        NODE.decode(&bytes).unwrap_err(),
        WireError::MissingField {
            message: "Node",
            field: "id"
        }
    );
}

#[test]
fn test_wire_type_mismatch() {
    let mut w = MessageWriter::new();
    w.string(tags::ID, "not a number");
    let bytes = w.finish();
    assert!(matches!(
        NODE.decode(&bytes),
        Err(WireError::WireTypeMismatch { field: "id", .. })
    ));
}

#[test]
fn test_unsupported_wire_type() {
    // Tag 1, wire type 3 (start group).
    let bytes = [0x0B];
    assert!(matches!(
        NODE.decode(&bytes),
        Err(WireError::UnsupportedWireType { tag: 1, wire_type: 3, .. })
    ));
}

#[test]
fn test_oneof_picks_the_present_alternative() {
    let mut w = node(1);
    w.varint(tags::RIGHT, 5);
    let bytes = w.finish();
    let message = NODE.decode(&bytes).unwrap();
    assert_eq!(message.oneof(&[tags::LEFT, tags::RIGHT]).unwrap(), tags::RIGHT);

    let bytes = node(1).finish();
    let message = NODE.decode(&bytes).unwrap();
    assert_eq!(
        message.oneof(&[tags::LEFT, tags::RIGHT]).unwrap_err(),
        WireError::EmptyOneof { message: "Node" }
    );
}

#[test]
fn test_absent_bool_and_enumeration_default() {
    let bytes = node(1).finish();
    let message = NODE.decode(&bytes).unwrap();
    assert!(!message.bool(tags::LEFT));
    let parsed = message.enumeration(tags::RIGHT, |code| (code == 0).then_some("zero"));
    assert_eq!(parsed.unwrap(), "zero");
}

#[test]
fn test_index_must_fit_u32() {
    let mut w = node(1);
    w.varint(tags::LEFT, u64::from(u32::MAX) + 1);
    let bytes = w.finish();
    let message = NODE.decode(&bytes).unwrap();
    assert!(matches!(
        message.index(tags::LEFT),
        Err(WireError::InvalidValue { field: "left", .. })
    ));
}

#[test]
fn test_last_singular_occurrence_wins() {
    let mut w = node(1);
    w.varint(tags::ID, 2);
    let bytes = w.finish();
    assert_eq!(NODE.decode(&bytes).unwrap().varint(tags::ID).unwrap(), 2);
}
