use std::io::{BufReader, BufWriter, Cursor, Read, Write};

use bson_codec::{
    CodecOptions,
    Document,
    Reader,
    Writer,
    doc,
    encode_to_vec,
    oid::ObjectIdGenerator,
};

/// Hands out at most one byte per call, like a slow socket.
struct Trickle<R>(R);

impl<R: Read> Read for Trickle<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(1);
        self.0.read(&mut buf[..len])
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sample(generator: &ObjectIdGenerator, n: i32) -> Document {
    doc! {
        "_id": generator.generate(),
        "n": n,
        "name": format!("entry {n} ✓"),
        "tags": ["α", "β", "γ"],
        "nested": { "even": n % 2 == 0 },
    }
}

#[test]
fn reads_from_a_trickling_stream() {
    init_tracing();
    let generator = ObjectIdGenerator::new();
    let doc = sample(&generator, 1);
    let bytes = encode_to_vec(&doc).unwrap();

    for buffer_size in [4, 7, 256] {
        let options = CodecOptions::builder().buffer_size(buffer_size).build();
        let decoded = Reader::with_options(Trickle(Cursor::new(&bytes)), options)
            .read_document()
            .unwrap();
        assert_eq!(decoded, doc);
    }
}

#[test]
fn many_documents_through_buffered_io() {
    init_tracing();
    let generator = ObjectIdGenerator::new();
    let docs: Vec<Document> = (0..50).map(|n| sample(&generator, n)).collect();

    let mut sink = BufWriter::new(Vec::new());
    {
        let mut writer = Writer::new(&mut sink);
        for doc in &docs {
            writer.write_document(doc).unwrap();
        }
    }
    sink.flush().unwrap();
    let bytes = sink.into_inner().unwrap();

    let mut reader = Reader::new(BufReader::new(&bytes[..]));
    for doc in &docs {
        assert_eq!(&reader.read_document().unwrap(), doc);
    }
    assert_eq!(reader.position(), bytes.len() as u64);
    assert!(reader.read_document().unwrap_err().is_io());
}

#[test]
fn failed_read_reports_absolute_offset() {
    init_tracing();
    let first = encode_to_vec(&doc! { "ok": true }).unwrap();
    let mut second = encode_to_vec(&doc! { "bad": 1 }).unwrap();
    second[4] = 0x0C;

    let mut bytes = first.clone();
    bytes.extend_from_slice(&second);

    let mut reader = Reader::new(&bytes[..]);
    reader.read_document().unwrap();
    let err = reader.read_document().unwrap_err();

    assert!(err.is_parse_failure());
    assert_eq!(err.offset, Some(first.len() as u64 + 4));
    assert_eq!(err.key.as_deref(), Some("bad"));
}
