#![no_main]

use dotcil::{assembly::RawOperands, metadata::method::MethodBody, CodecConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for config in [CodecConfig::strict(), CodecConfig::lenient()] {
        let Ok(body) = MethodBody::decode_with(data, &RawOperands, &config) else {
            continue;
        };

        // Whatever decodes must encode, and decode back to the same body
        let encoded = body
            .encode(&RawOperands)
            .expect("decoded body failed to encode");
        assert_eq!(encoded.len(), body.size());

        let again = MethodBody::decode_with(&encoded, &RawOperands, &config)
            .expect("re-encoded body failed to decode");
        assert_eq!(again, body);
    }
});
