use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    Binary,
    Bson,
    DateTime,
    Document,
    Timestamp,
    doc,
    error::{ErrorKind, ValueAccessErrorKind},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

fn keys(doc: &Document) -> Vec<&str> {
    doc.keys().map(String::as_str).collect()
}

#[test]
fn keys_keep_insertion_order() {
    let mut doc = Document::new();
    doc.insert("zulu", 1);
    doc.insert("alpha", "two");
    doc.insert("10", 3.0);
    doc.insert("2", Bson::Null);

    assert_eq!(keys(&doc), ["zulu", "alpha", "10", "2"]);
    assert_eq!(doc.iter().count(), doc.values().count());
}

#[test]
fn insert_existing_key_keeps_position() {
    let mut doc = doc! { "a": 1, "b": 2, "c": 3 };
    assert_eq!(doc.insert("b", "two"), Some(Bson::Int32(2)));

    assert_eq!(keys(&doc), ["a", "b", "c"]);
    assert_eq!(doc.get_str("b").unwrap(), "two");
    assert_eq!(doc.len(), 3);
}

#[test]
fn typed_getters() {
    let when = DateTime::from_millis(1_591_700_287_095);
    let id = ObjectId::from_bytes([7; 12]);
    let doc = doc! {
        "f64": 0.5,
        "str": "text",
        "array": [1, 2],
        "doc": { "inner": true },
        "bool": false,
        "i32": -3,
        "i64": 1i64 << 40,
        "ts": Timestamp { time: 9, increment: 4 },
        "bin": Binary { subtype: BinarySubtype::Generic, bytes: vec![1, 2, 3] },
        "id": id,
        "when": when,
    };

    assert_eq!(doc.get_f64("f64").unwrap(), 0.5);
    assert_eq!(doc.get_str("str").unwrap(), "text");
    assert_eq!(doc.get_array("array").unwrap(), &vec![Bson::Int32(1), Bson::Int32(2)]);
    assert_eq!(doc.get_document("doc").unwrap(), &doc! { "inner": true });
    assert!(!doc.get_bool("bool").unwrap());
    assert_eq!(doc.get_i32("i32").unwrap(), -3);
    assert_eq!(doc.get_i64("i64").unwrap(), 1 << 40);
    assert_eq!(
        doc.get_timestamp("ts").unwrap(),
        Timestamp { time: 9, increment: 4 }
    );
    assert_eq!(doc.get_binary_generic("bin").unwrap(), &vec![1, 2, 3]);
    assert_eq!(doc.get_object_id("id").unwrap(), id);
    assert_eq!(doc.get_datetime("when").unwrap(), &when);
}

#[test]
fn missing_key_is_not_present() {
    let err = doc! {}.get_i32("gone").unwrap_err();
    assert!(err.is_value_access_not_present());
    assert_eq!(err.key.as_deref(), Some("gone"));
}

#[test]
fn unexpected_type_reports_both_types() {
    let doc = doc! { "n": 1 };
    let err = doc.get_str("n").unwrap_err();
    assert!(err.is_value_access_unexpected_type());
    assert_eq!(err.key.as_deref(), Some("n"));
    assert_matches!(
        err.kind,
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType {
                actual: ElementType::Int32,
                expected: ElementType::String,
            },
            ..
        }
    );
}

#[test]
fn generic_binary_getter_rejects_other_subtypes() {
    let doc = doc! { "md5": Binary { subtype: BinarySubtype::Md5, bytes: vec![0; 16] } };
    assert!(
        doc.get_binary_generic("md5")
            .unwrap_err()
            .is_value_access_unexpected_type()
    );
}

#[test]
fn remove_shifts_later_keys() {
    let mut doc = doc! { "a": 1, "b": 2, "c": 3, "d": 4 };

    assert_eq!(doc.remove("missing"), None);
    assert_eq!(doc.remove("b"), Some(Bson::Int32(2)));
    assert_eq!(keys(&doc), ["a", "c", "d"]);

    doc.insert("b", 5);
    assert_eq!(keys(&doc), ["a", "c", "d", "b"]);
}

#[test]
fn entry_inserts_only_when_vacant() {
    let mut doc = doc! { "count": 1 };

    let count = doc.entry("count");
    assert_eq!(count.key(), "count");
    *count.or_insert_with(|| panic!("count is present")) = Bson::Int32(2);

    let seen = doc.entry("seen").or_insert(false);
    assert_eq!(seen, &mut Bson::Boolean(false));

    assert_eq!(doc, doc! { "count": 2, "seen": false });
}

#[test]
fn collects_from_pairs() {
    let doc: Document = vec![
        ("x".to_owned(), Bson::Int32(1)),
        ("y".to_owned(), Bson::Int32(2)),
        ("x".to_owned(), Bson::Int32(3)),
    ]
    .into_iter()
    .collect();

    assert_eq!(doc, doc! { "x": 3, "y": 2 });
}

#[test]
fn display_is_shell_like() {
    assert_eq!(format!("{}", doc! {}), "{}");
    assert_eq!(
        format!("{}", doc! { "a": { "b": [1, "c"] }, "d": null }),
        "{ \"a\": { \"b\": [1, \"c\"] }, \"d\": null }"
    );
}

#[test]
fn writer_and_reader_round_trip() {
    let doc = doc! {
        "x": 1,
        "nested": { "y": "z" },
    };

    let mut buf = Vec::new();
    doc.to_writer(&mut buf).unwrap();
    assert_eq!(Document::from_reader(&buf[..]).unwrap(), doc);
}
