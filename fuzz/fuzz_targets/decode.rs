#![no_main]
use bson_codec::decode_document;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|buf: &[u8]| {
    let _ = decode_document(&mut Cursor::new(&buf[..]));
});
