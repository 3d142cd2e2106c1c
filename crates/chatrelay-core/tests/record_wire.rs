//! Wire-format tests for message records.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chatrelay_core::{ChatError, Record, RecordKind, WireRecord};

#[test]
fn wire_record_missing_fields_default_to_empty() {
    let w: WireRecord = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
    assert_eq!(w.kind, "");
    assert_eq!(w.username, "");
    assert_eq!(w.message, "hi");
}

#[test]
fn wire_record_keeps_unknown_type_and_ignores_extra_fields() {
    let w: WireRecord =
        serde_json::from_str(r#"{"type":"shout","username":"mallory","message":"x","seq":4}"#).unwrap();
    assert_eq!(w.kind, "shout");
    assert_eq!(w.username, "mallory");
}

#[test]
fn wire_record_null_fields_read_as_empty() {
    let w: WireRecord = serde_json::from_str(r#"{"type":null,"username":"bob","message":null}"#).unwrap();
    assert_eq!(w.kind, "");
    assert_eq!(w.username, "bob");
    assert_eq!(w.message, "");
}

#[test]
fn positional_arrays_are_not_records() {
    assert!(serde_json::from_str::<WireRecord>(r#"["message","bob","hi"]"#).is_err());
    assert!(serde_json::from_str::<Record>(r#"["message","bob","hi"]"#).is_err());
    assert!(serde_json::from_str::<WireRecord>(r#""hi""#).is_err());
    assert!(serde_json::from_str::<WireRecord>(r#"{"username":7}"#).is_err());
}

#[test]
fn record_parses_known_types() {
    let r: Record = serde_json::from_str(r#"{"type":"message","username":"alice","message":"hi"}"#).unwrap();
    assert_eq!(r, Record::message("alice", "hi"));
    assert_eq!(r.kind(), RecordKind::Message);

    let r: Record = serde_json::from_str(r#"{"type":"request_username"}"#).unwrap();
    assert_eq!(r, Record::RequestUsername);

    let r: Record = serde_json::from_str(r#"{"type":"user_joined","username":"bob","message":""}"#).unwrap();
    assert_eq!(r.username(), "bob");
}

#[test]
fn record_rejects_unknown_type() {
    let err = serde_json::from_str::<Record>(r#"{"type":"shout","username":"x"}"#).unwrap_err();
    assert!(err.to_string().contains("unknown record type"));

    let err = Record::try_from(WireRecord {
        kind: "nope".into(),
        ..WireRecord::default()
    })
    .unwrap_err();
    assert!(matches!(err, ChatError::UnknownType(ref t) if t == "nope"));
    assert_eq!(err.code(), "UNKNOWN_TYPE");
}

#[test]
fn record_kind_tags_are_stable() {
    for kind in [
        RecordKind::RequestUsername,
        RecordKind::Message,
        RecordKind::UserJoined,
        RecordKind::UserLeft,
    ] {
        assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(RecordKind::UserLeft.to_string(), "user_left");
}
