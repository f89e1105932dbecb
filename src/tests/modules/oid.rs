use std::{collections::HashSet, sync::Arc, thread};

use crate::oid::{ObjectId, ObjectIdGenerator};

#[test]
fn string_oid() {
    let s = "123456789012123456789012";
    let oid_res = ObjectId::parse_str(s);
    assert!(oid_res.is_ok());
    let actual_s = hex::encode(oid_res.unwrap().bytes());
    assert_eq!(s.to_owned(), actual_s);
}

#[test]
fn hex_round_trip() {
    let s = "4a7067c30a57000000008ecb";
    let oid = ObjectId::parse_str(s).unwrap();
    assert_eq!(oid.to_hex(), s);
    assert_eq!(oid.to_string(), s);
    assert_eq!(ObjectId::parse_str(oid.to_hex()).unwrap(), oid);
}

#[test]
fn byte_string_oid() {
    let s = "541b1a00e8a23afa832b218e";
    let oid_res = ObjectId::parse_str(s);
    assert!(oid_res.is_ok());
    let oid = oid_res.unwrap();
    let bytes: [u8; 12] = [
        0x54u8, 0x1Bu8, 0x1Au8, 0x00u8, 0xE8u8, 0xA2u8, 0x3Au8, 0xFAu8, 0x83u8, 0x2Bu8, 0x21u8,
        0x8Eu8,
    ];

    assert_eq!(bytes, oid.bytes());
    assert_eq!(s, oid.to_string());
}

#[test]
fn invalid_hex_strings() {
    assert!(ObjectId::parse_str("4a7067c30a57000000008ec").is_err());
    assert!(ObjectId::parse_str("4a7067c30a57000000008ecb0").is_err());
    assert!(ObjectId::parse_str("").is_err());

    let err = ObjectId::parse_str("4a7067c30a57000000008ecz").unwrap_err();
    assert!(matches!(
        err.kind,
        crate::error::ErrorKind::ObjectId {
            kind: crate::error::ObjectIdErrorKind::InvalidHexStringCharacter { c: 'z', .. },
            ..
        }
    ));
}

#[test]
fn from_slice_requires_twelve_bytes() {
    assert!(ObjectId::from_slice(&[0u8; 11]).is_err());
    assert!(ObjectId::from_slice(&[0u8; 13]).is_err());
    assert_eq!(
        ObjectId::from_slice(&[7u8; 12]).unwrap(),
        ObjectId::from_bytes([7u8; 12])
    );
}

#[test]
#[allow(clippy::eq_op)]
fn oid_equals() {
    let oid = ObjectId::new();
    assert_eq!(oid, oid);
}

#[test]
fn oid_not_equals() {
    assert!(ObjectId::new() != ObjectId::new());
}

#[test]
fn fromstr_oid() {
    let s = "123456789012123456789012";
    let oid_res = s.parse::<ObjectId>();
    assert!(oid_res.is_ok(), "oid parse failed");
    let actual_s = hex::encode(oid_res.unwrap().bytes());
    assert_eq!(s, &actual_s, "parsed and expected oids differ");
}

#[test]
fn oid_ordering_is_bytewise() {
    let low = ObjectId::parse_str("000000000000000000000001").unwrap();
    let mid = ObjectId::parse_str("000000000000000000000100").unwrap();
    let high = ObjectId::parse_str("ff0000000000000000000000").unwrap();
    assert!(low < mid);
    assert!(mid < high);
}

#[test]
fn timestamp_is_created_instant() {
    let oid = ObjectId::parse_str("4a7067c30a57000000008ecb").unwrap();
    assert_eq!(oid.timestamp().timestamp_millis(), 0x4a70_67c3_i64 * 1000);

    let oid = ObjectId::from_parts(60, [1, 2, 3, 4, 5], [0, 0, 9]);
    assert_eq!(oid.timestamp().timestamp_millis(), 60_000);
    assert_eq!(oid.process_unique(), [1, 2, 3, 4, 5]);
    assert_eq!(oid.counter(), 9);
}

#[test]
fn sequential_ids_share_process_unique() {
    let generator = ObjectIdGenerator::with_counter(100);
    let first = generator.generate();
    let second = generator.generate();

    assert_eq!(first.process_unique(), second.process_unique());
    assert_eq!(first.process_unique(), generator.process_unique());
    assert_eq!(first.counter(), 100);
    assert_eq!(second.counter(), 101);
}

#[test]
fn generated_timestamp_is_current() {
    let before = crate::DateTime::now().timestamp_millis() / 1000;
    let oid = ObjectIdGenerator::new().generate();
    let after = crate::DateTime::now().timestamp_millis() / 1000;

    let created = oid.timestamp().timestamp_millis() / 1000;
    assert!(created >= before && created <= after);
}

#[test]
fn concurrent_generation_is_unique() {
    let generator = Arc::new(ObjectIdGenerator::with_counter(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || (0..1000).map(|_| generator.generate().counter()).collect::<Vec<_>>())
        })
        .collect();

    let mut counters = HashSet::new();
    for handle in handles {
        for counter in handle.join().unwrap() {
            assert!(counters.insert(counter));
        }
    }
    assert_eq!(counters.len(), 4000);
}
