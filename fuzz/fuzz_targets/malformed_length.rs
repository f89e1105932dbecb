#![no_main]
use bson_codec::Reader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|buf: &[u8]| {
    if buf.len() >= 4 {
        // keep reading until the stream is exhausted or a document fails
        let mut reader = Reader::new(buf);
        while reader.read_document().is_ok() {}
        assert!(reader.position() <= buf.len() as u64);
    }
});
