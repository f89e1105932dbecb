use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    Binary,
    Bson,
    CodecOptions,
    DateTime,
    DbRef,
    Document,
    DocumentBuilder,
    JavaScriptCodeWithScope,
    ObjectBuilder,
    Reader,
    decode_document,
    doc,
    encode_to_vec,
    error::{ErrorKind, Phase, Result},
    spec::BinarySubtype,
};

fn read_with(buffer_size: usize, bytes: &[u8]) -> Result<Document> {
    let options = CodecOptions::builder().buffer_size(buffer_size).build();
    Reader::with_options(bytes, options).read_document()
}

#[test]
fn test_decode_utf8_string() {
    let src = vec![
        28, 0, 0, 0, 2, 107, 101, 121, 0, 14, 0, 0, 0, 116, 101, 115, 116, 228, 189, 160, 229,
        165, 189, 229, 144, 151, 0, 0,
    ];
    let dst = doc! { "key": "test你好吗" };

    let doc = decode_document(&src[..]).unwrap();
    assert_eq!(doc, dst);
}

#[test]
fn strings_split_across_buffer_fills() {
    // two and three byte characters, padded so they straddle every buffer boundary
    for unit in ["é", "€"] {
        for buffer_size in 4..=16 {
            for padding in 0..buffer_size {
                let prefix = "a".repeat(padding);
                for len in [buffer_size - 1, buffer_size, buffer_size + 1] {
                    let text = format!("{prefix}{}", unit.repeat(len));
                    let doc = doc! { "s": text.as_str() };
                    let bytes = encode_to_vec(&doc).unwrap();

                    let decoded = read_with(buffer_size, &bytes).unwrap_or_else(|e| {
                        panic!("buffer {buffer_size}, padding {padding}, len {len}: {e}")
                    });
                    assert_eq!(decoded, doc);
                }
            }
        }
    }
}

#[test]
fn ascii_strings_at_buffer_boundaries() {
    for buffer_size in 4..=64 {
        for len in [buffer_size - 1, buffer_size, buffer_size + 1] {
            let text = "x".repeat(len);
            let doc = doc! { "s": text.as_str() };
            let bytes = encode_to_vec(&doc).unwrap();

            let decoded = read_with(buffer_size, &bytes)
                .unwrap_or_else(|e| panic!("buffer {buffer_size}, len {len}: {e}"));
            assert_eq!(decoded.get_str("s").unwrap().len(), len);
            assert_eq!(decoded, doc);
        }
    }
}

#[test]
fn keys_split_across_buffer_fills() {
    for buffer_size in [4, 5, 6, 7, 8] {
        for padding in 0..buffer_size {
            let key = format!("{}ключ😀€", "k".repeat(padding));
            let doc = doc! { key.as_str(): 1, "regex": crate::Regex::new(key.as_str(), "i") };
            let bytes = encode_to_vec(&doc).unwrap();
            assert_eq!(read_with(buffer_size, &bytes).unwrap(), doc);
        }
    }
}

#[test]
fn invalid_utf8_is_a_parse_failure() {
    let mut bytes = encode_to_vec(&doc! { "s": "abc" }).unwrap();
    // 4 length, 1 tag, 2 key, 4 string length
    bytes[11] = 0xFF;

    let err = decode_document(&bytes[..]).unwrap_err();
    assert_matches!(err.kind, ErrorKind::Utf8Encoding);
    assert_eq!(err.key.as_deref(), Some("s"));
    assert!(err.is_parse_failure());
}

#[test]
fn every_type_round_trips() {
    let doc = doc! {
        "double": 1.5,
        "string": "s",
        "document": { "a": 1 },
        "array": [1, "two", null],
        "binary": Binary::generic(vec![1, 2, 3]),
        "general": Binary { subtype: BinarySubtype::General, bytes: vec![4, 5] },
        "uuid": Binary { subtype: BinarySubtype::Uuid, bytes: vec![0; 16] },
        "oid": crate::oid::ObjectId::from_bytes([7; 12]),
        "bool": false,
        "date": DateTime::from_millis(-1_000),
        "null": null,
        "regex": crate::Regex::new("^a", "mi"),
        "code": Bson::JavaScriptCode("f()".into()),
        "symbol": Bson::Symbol("sym".into()),
        "scope": JavaScriptCodeWithScope { code: "x".into(), scope: doc! { "x": 1 } },
        "int32": -1,
        "timestamp": crate::Timestamp { time: 10, increment: 20 },
        "int64": 1_i64 << 40,
        "min": Bson::MinKey,
        "max": Bson::MaxKey,
    };

    let bytes = encode_to_vec(&doc).unwrap();
    assert_eq!(decode_document(&bytes[..]).unwrap(), doc);
}

#[test]
fn symbols_stay_symbols() {
    let bytes = encode_to_vec(&doc! { "s": Bson::Symbol("x".into()) }).unwrap();
    let doc = decode_document(&bytes[..]).unwrap();
    assert_eq!(doc.get("s"), Some(&Bson::Symbol("x".into())));
}

#[test]
fn arrays_rebuild_from_positional_keys() {
    let doc = doc! { "a": ["a", "b", "c", "d"] };
    let bytes = encode_to_vec(&doc).unwrap();
    assert_eq!(decode_document(&bytes[..]).unwrap(), doc);
}

/// Encodes `{ "a": inner }` and relabels `inner` as an array.
fn as_array(inner: Document) -> Vec<u8> {
    let mut bytes = encode_to_vec(&doc! { "a": inner }).unwrap();
    assert_eq!(bytes[4], 0x03);
    bytes[4] = 0x04;
    bytes
}

#[test]
fn array_holes_become_null() {
    let bytes = as_array(doc! { "0": "x", "2": "y" });
    let doc = decode_document(&bytes[..]).unwrap();
    assert_eq!(
        doc.get_array("a").unwrap(),
        &vec![Bson::from("x"), Bson::Null, Bson::from("y")]
    );
}

#[test]
fn out_of_order_array_keys_land_at_their_index() {
    let bytes = as_array(doc! { "1": "y", "0": "x" });
    let doc = decode_document(&bytes[..]).unwrap();
    assert_eq!(
        doc.get_array("a").unwrap(),
        &vec![Bson::from("x"), Bson::from("y")]
    );
}

#[test]
fn non_numeric_array_key_is_malformed() {
    let bytes = as_array(doc! { "0": 1, "x": 2 });
    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.key.as_deref(), Some("x"));
    assert_eq!(err.phase, Some(Phase::Read));
}

#[test]
fn huge_array_index_is_malformed() {
    let bytes = as_array(doc! { "4194304": 1 });
    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
}

#[test]
fn array_index_is_bounded_by_encoded_length() {
    // 12 bytes hold at most two elements
    let bytes = as_array(doc! { "1": 1 });
    let doc = decode_document(&bytes[..]).unwrap();
    assert_eq!(doc.get_array("a").unwrap(), &vec![Bson::Null, Bson::Int32(1)]);

    let bytes = as_array(doc! { "2": 1 });
    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.key.as_deref(), Some("2"));

    let bytes = as_array(doc! { "4194303": 1 });
    assert_eq!(bytes.len(), 26);
    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.key.as_deref(), Some("4194303"));
    assert_eq!(err.offset, Some(7));
}

#[test]
fn empty_stream_is_an_io_error() {
    let err = decode_document(&[][..]).unwrap_err();
    assert!(err.is_io());
    assert!(!err.is_parse_failure());
    assert_matches!(
        &err.kind,
        ErrorKind::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof
    );
    assert_eq!(err.offset, Some(0));
}

#[test]
fn truncated_document_is_a_parse_failure() {
    let bytes = encode_to_vec(&doc! { "a": "some string", "b": 1 }).unwrap();
    for end in 1..bytes.len() {
        let err = decode_document(&bytes[..end]).unwrap_err();
        assert!(err.is_parse_failure(), "truncated at {end}: {err}");
        assert!(!err.is_io());
    }
}

#[test]
fn unknown_tag_reports_key_and_offset() {
    let mut bytes = encode_to_vec(&doc! { "x": 1, "a": 1 }).unwrap();
    // 4 length, then "x" element: 1 tag, 2 key, 4 value
    let tag_offset = 4 + 1 + 2 + 4;
    assert_eq!(bytes[tag_offset], 0x10);
    bytes[tag_offset] = 0x06;

    let err = decode_document(&bytes[..]).unwrap_err();
    assert_matches!(err.kind, ErrorKind::UnrecognizedElementType { tag: 0x06 });
    assert_eq!(err.key.as_deref(), Some("a"));
    assert_eq!(err.offset, Some(tag_offset as u64));
    assert!(err.is_parse_failure());
}

#[test]
fn general_binary_inner_length_must_match() {
    let doc = doc! {
        "b": Binary { subtype: BinarySubtype::General, bytes: vec![0xAA, 0xBB] },
    };
    let mut bytes = encode_to_vec(&doc).unwrap();
    // 4 length, 1 tag, 2 key, 4 outer length, 1 subtype
    assert_eq!(&bytes[12..16], &[2, 0, 0, 0]);
    bytes[12] = 3;

    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.key.as_deref(), Some("b"));
}

#[test]
fn document_length_must_match_contents() {
    let good = encode_to_vec(&doc! { "a": 1 }).unwrap();

    let mut too_long = good.clone();
    too_long[0] += 1;
    too_long.push(0);
    assert!(decode_document(&too_long[..]).unwrap_err().is_malformed_value());

    let mut too_short = good.clone();
    too_short[0] -= 1;
    assert!(decode_document(&too_short[..]).unwrap_err().is_malformed_value());

    let mut tiny = good;
    tiny[0] = 4;
    assert!(decode_document(&tiny[..]).unwrap_err().is_malformed_value());
}

#[test]
fn unterminated_cstring_is_truncated() {
    let bytes = [10, 0, 0, 0, 0x10, b'a', b'b'];
    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
}

#[test]
fn invalid_boolean_is_malformed() {
    let mut bytes = encode_to_vec(&doc! { "t": true }).unwrap();
    bytes[7] = 2;
    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.offset, Some(7));
}

#[test]
fn negative_string_length_is_malformed() {
    let mut bytes = encode_to_vec(&doc! { "s": "abc" }).unwrap();
    bytes[7..11].copy_from_slice(&(-5i32).to_le_bytes());
    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
}

#[test]
fn references_are_detected() {
    let doc = doc! { "r": DbRef::new("things", 7) };
    let bytes = encode_to_vec(&doc).unwrap();
    assert_eq!(
        bytes,
        encode_to_vec(&doc! { "r": { "$ref": "things", "$id": 7 } }).unwrap()
    );

    let decoded = decode_document(&bytes[..]).unwrap();
    assert_eq!(decoded.get("r"), Some(&Bson::DbRef(DbRef::new("things", 7))));

    // a reversed key order is an ordinary document
    let bytes = encode_to_vec(&doc! { "r": { "$id": 7, "$ref": "things" } }).unwrap();
    assert_matches!(decode_document(&bytes[..]).unwrap().get("r"), Some(Bson::Document(_)));
}

#[test]
fn reference_shaped_documents_decode_as_references() {
    let doc = doc! { "r": { "$ref": "c", "$id": 1 } };
    let bytes = encode_to_vec(&doc).unwrap();

    let decoded = decode_document(&bytes[..]).unwrap();
    assert_ne!(decoded, doc);
    assert_eq!(decoded.get("r"), Some(&Bson::DbRef(DbRef::new("c", 1))));
    assert_eq!(encode_to_vec(&decoded).unwrap(), bytes);

    // inside arrays too
    let doc = doc! { "a": [{ "$ref": "c", "$id": 1 }] };
    let bytes = encode_to_vec(&doc).unwrap();
    assert_eq!(
        decode_document(&bytes[..]).unwrap().get_array("a").unwrap(),
        &vec![Bson::DbRef(DbRef::new("c", 1))]
    );
}

#[test]
fn root_reference_reads_as_document() {
    let root = doc! { "$ref": "things", "$id": 7 };
    let bytes = encode_to_vec(&root).unwrap();
    assert_eq!(decode_document(&bytes[..]).unwrap(), root);
}

#[test]
fn documents_read_in_sequence() {
    let first = doc! { "n": 1 };
    let second = doc! { "n": "two", "nested": { "x": [1, 2] } };

    let mut bytes = encode_to_vec(&first).unwrap();
    let first_len = bytes.len() as u64;
    bytes.extend(encode_to_vec(&second).unwrap());

    let mut reader = Reader::new(&bytes[..]);
    assert_eq!(reader.read_document().unwrap(), first);
    assert_eq!(reader.position(), first_len);
    assert_eq!(reader.read_document().unwrap(), second);
    assert_eq!(reader.position(), bytes.len() as u64);

    let err = reader.read_document().unwrap_err();
    assert!(err.is_io());
    assert_eq!(err.offset, Some(bytes.len() as u64));
}

#[derive(Default)]
struct RecordingBuilder {
    inner: DocumentBuilder,
    local_flags: Vec<bool>,
    keys: Vec<String>,
}

impl ObjectBuilder for RecordingBuilder {
    type Object = Document;
    type Value = Bson;

    fn begin_object(&mut self) -> Document {
        self.inner.begin_object()
    }

    fn end_object(&mut self, object: Document) -> Result<Bson> {
        self.inner.end_object(object)
    }

    fn begin_array(&mut self) -> Document {
        self.inner.begin_array()
    }

    fn end_array(&mut self, array: Document, encoded_len: usize) -> Result<Bson> {
        self.inner.end_array(array, encoded_len)
    }

    fn begin_property(&mut self, _object: &mut Document, name: &str) {
        self.keys.push(name.to_owned());
    }

    fn end_property(&mut self, object: &mut Document, name: &str, value: Bson) -> Result<()> {
        self.inner.end_property(object, name, value)
    }

    fn datetime(&mut self, dt: DateTime, local: bool) -> Bson {
        self.local_flags.push(local);
        Bson::DateTime(dt)
    }
}

#[test]
fn builder_sees_keys_in_wire_order() {
    let doc = doc! { "b": 1, "a": { "c": [true] } };
    let bytes = encode_to_vec(&doc).unwrap();

    let mut builder = RecordingBuilder::default();
    let value = Reader::new(&bytes[..]).read_object(&mut builder).unwrap();
    assert_eq!(value, Bson::Document(doc));
    assert_eq!(builder.keys, vec!["b", "a", "c", "0"]);
}

#[test]
fn local_time_reaches_the_builder() {
    let bytes = encode_to_vec(&doc! { "d": DateTime::from_millis(5) }).unwrap();

    let mut builder = RecordingBuilder::default();
    Reader::new(&bytes[..]).read_object(&mut builder).unwrap();

    let options = CodecOptions::builder().local_time(true).build();
    Reader::with_options(&bytes[..], options)
        .read_object(&mut builder)
        .unwrap();

    assert_eq!(builder.local_flags, vec![false, true]);
}

#[test]
fn code_with_scope_length_must_match() {
    let doc = doc! {
        "c": JavaScriptCodeWithScope { code: "x".into(), scope: doc! { "x": 1 } },
    };
    let mut bytes = encode_to_vec(&doc).unwrap();
    // 4 length, 1 tag, 2 key
    assert_eq!(&bytes[7..11], &[22, 0, 0, 0]);
    bytes[7] = 23;

    let err = decode_document(&bytes[..]).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.key.as_deref(), Some("c"));
}
