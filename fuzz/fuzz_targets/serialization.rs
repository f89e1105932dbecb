#![no_main]
use bson_codec::{decode_document, document_size, encode_to_vec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &[u8]| {
    if let Ok(doc) = decode_document(input) {
        // sparse arrays decode to dense ones, which may push a document past the size limit
        let Ok(out_bytes) = encode_to_vec(&doc) else {
            return;
        };
        assert_eq!(document_size(&doc), out_bytes.len());
        if !input.starts_with(&out_bytes) {
            let reserialized_doc = decode_document(&out_bytes[..]).unwrap();
            // the input bytes can differ from ours while decoding to the same document, so
            // compare encodings, which also keeps NaN doubles comparable
            assert_eq!(
                encode_to_vec(&reserialized_doc).unwrap(),
                out_bytes,
                "reserialization failed"
            );
        }
    }
});
