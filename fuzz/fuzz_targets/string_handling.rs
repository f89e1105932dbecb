#![no_main]
use bson_codec::{Bson, CodecOptions, Reader, encode_to_vec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &[u8]| {
    let Some((&size, buf)) = input.split_first() else {
        return;
    };

    // decoding must not depend on where buffer fills split multi-byte characters
    let small = CodecOptions::builder().buffer_size(size as usize).build();
    let a = Reader::with_options(buf, small).read_document();
    let b = Reader::new(buf).read_document();
    match (a, b) {
        (Ok(a), Ok(b)) => {
            assert_eq!(encode_to_vec(&a).ok(), encode_to_vec(&b).ok());
            for value in a.values() {
                if let Bson::String(s) = value {
                    let _ = s.chars().count();
                }
            }
        }
        (Err(_), Err(_)) => {}
        (a, b) => panic!("buffer size changed the outcome: {a:?} vs {b:?}"),
    }
});
